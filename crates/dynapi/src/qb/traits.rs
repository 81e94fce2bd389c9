//! Trait definitions for query builders.

use serde_json::Value;
use tokio_postgres::Row;

use crate::client::GenericClient;
use crate::error::DbResult;
use crate::qb::param::{ParamList, as_refs};
use crate::row::RowExt;

/// Base trait for all query builders.
///
/// Execution always prepares the statement first, coerces the JSON parameters to the
/// types Postgres inferred, then runs the prepared statement.
pub trait SqlQb: Sync {
    /// Build the SQL string and its parameters.
    fn build(&self) -> (String, ParamList);

    /// Validate builder state before execution.
    fn validate(&self) -> DbResult<()>;

    /// Debug helper to get the SQL string.
    fn to_sql(&self) -> String {
        self.build().0
    }

    /// Execute query and return all rows.
    fn query(
        &self,
        conn: &impl GenericClient,
    ) -> impl std::future::Future<Output = DbResult<Vec<Row>>> + Send {
        async move {
            self.validate()?;
            let (sql, params) = self.build();
            let stmt = conn.prepare_statement(&sql).await?;
            let values = params.bind(stmt.params())?;
            conn.query_prepared(&stmt, &as_refs(&values)).await
        }
    }

    /// Execute query and decode every row to a JSON object.
    fn fetch_json(
        &self,
        conn: &impl GenericClient,
    ) -> impl std::future::Future<Output = DbResult<Vec<Value>>> + Send {
        async move {
            let rows = self.query(conn).await?;
            rows.iter().map(RowExt::to_json).collect()
        }
    }
}

/// Trait for mutation builders (INSERT/UPDATE/DELETE).
pub trait MutationQb: SqlQb {
    /// Execute and return affected row count.
    fn execute(
        &self,
        conn: &impl GenericClient,
    ) -> impl std::future::Future<Output = DbResult<u64>> + Send {
        async move {
            self.validate()?;
            let (sql, params) = self.build();
            let stmt = conn.prepare_statement(&sql).await?;
            let values = params.bind(stmt.params())?;
            conn.execute_prepared(&stmt, &as_refs(&values)).await
        }
    }
}
