//! Connection abstraction shared by clients, pooled connections and transactions.

use crate::error::{DbError, DbResult};
use tokio_postgres::types::ToSql;
use tokio_postgres::{Row, Statement};

type Params<'a> = [&'a (dyn ToSql + Sync)];

/// Anything statements can run on.
///
/// Builders prepare before binding, since JSON values are coerced to the parameter types
/// Postgres inferred; only the prepared-statement API is needed.
pub trait GenericClient: Send + Sync {
    /// Prepare a statement on this connection.
    ///
    /// Prepared statements belong to one connection and must not be used on another.
    fn prepare_statement(
        &self,
        sql: &str,
    ) -> impl std::future::Future<Output = DbResult<Statement>> + Send;

    fn query_prepared(
        &self,
        stmt: &Statement,
        params: &Params<'_>,
    ) -> impl std::future::Future<Output = DbResult<Vec<Row>>> + Send;

    fn execute_prepared(
        &self,
        stmt: &Statement,
        params: &Params<'_>,
    ) -> impl std::future::Future<Output = DbResult<u64>> + Send;
}

/// `tokio_postgres::Client` and `Transaction` expose the same inherent methods.
macro_rules! impl_generic_client {
    ($($ty:ty),+ $(,)?) => {$(
        impl GenericClient for $ty {
            // Not `prepare_cached`: table shapes can change between requests.
            async fn prepare_statement(&self, sql: &str) -> DbResult<Statement> {
                <$ty>::prepare(self, sql).await.map_err(DbError::from_db_error)
            }

            async fn query_prepared(&self, stmt: &Statement, params: &Params<'_>) -> DbResult<Vec<Row>> {
                <$ty>::query(self, stmt, params).await.map_err(DbError::from_db_error)
            }

            async fn execute_prepared(&self, stmt: &Statement, params: &Params<'_>) -> DbResult<u64> {
                <$ty>::execute(self, stmt, params).await.map_err(DbError::from_db_error)
            }
        }
    )+};
}

impl_generic_client!(tokio_postgres::Client, tokio_postgres::Transaction<'_>);

#[cfg(feature = "pool")]
impl GenericClient for deadpool_postgres::Client {
    // ClientWrapper derefs to tokio_postgres::Client.
    async fn prepare_statement(&self, sql: &str) -> DbResult<Statement> {
        GenericClient::prepare_statement(&***self, sql).await
    }

    async fn query_prepared(&self, stmt: &Statement, params: &Params<'_>) -> DbResult<Vec<Row>> {
        GenericClient::query_prepared(&***self, stmt, params).await
    }

    async fn execute_prepared(&self, stmt: &Statement, params: &Params<'_>) -> DbResult<u64> {
        GenericClient::execute_prepared(&***self, stmt, params).await
    }
}
