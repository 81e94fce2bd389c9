use std::sync::Mutex;
use std::time::Instant;

use tokio_postgres::types::ToSql;
use tokio_postgres::{Row, Statement};

use super::{MonitorConfig, QueryType};
use crate::client::GenericClient;
use crate::error::DbResult;

/// A [`GenericClient`] wrapper that logs SQL on the `dynapi.sql` tracing target.
///
/// SQL text is logged at DEBUG when a statement is prepared. Executions log elapsed time
/// and row counts; those slower than [`MonitorConfig::slow_query_threshold`] are logged at
/// WARN along with the SQL.
///
/// Meant to wrap one connection for the duration of a request.
pub struct InstrumentedClient<C> {
    client: C,
    config: MonitorConfig,
    last_sql: Mutex<String>,
}

impl<C: GenericClient> InstrumentedClient<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            config: MonitorConfig::default(),
            last_sql: Mutex::new(String::new()),
        }
    }

    pub fn with_config(mut self, config: MonitorConfig) -> Self {
        self.config = config;
        self
    }

    fn remember(&self, sql: &str) {
        if let Ok(mut last) = self.last_sql.lock() {
            last.clear();
            last.push_str(sql);
        }
    }

    fn recall(&self) -> String {
        self.last_sql
            .lock()
            .map(|last| last.clone())
            .unwrap_or_default()
    }

    fn log_sql(&self, sql: &str, param_count: usize) {
        tracing::debug!(
            target: "dynapi.sql",
            query_type = ?QueryType::from_sql(sql),
            param_count,
            sql = %self.config.display_sql(sql),
        );
    }

    fn log_result<T>(&self, sql: &str, start: Instant, result: &DbResult<T>, rows: impl Fn(&T) -> u64) {
        let elapsed = start.elapsed();
        let query_type = QueryType::from_sql(sql);
        match result {
            Ok(value) => {
                let rows = rows(value);
                if self.config.is_slow(elapsed) {
                    tracing::warn!(
                        target: "dynapi.sql",
                        ?query_type,
                        ?elapsed,
                        rows,
                        sql = %self.config.display_sql(sql),
                        "slow query",
                    );
                } else {
                    tracing::debug!(target: "dynapi.sql", ?query_type, ?elapsed, rows, "query ok");
                }
            }
            Err(e) => {
                tracing::debug!(
                    target: "dynapi.sql",
                    ?query_type,
                    ?elapsed,
                    error = %e,
                    "query failed",
                );
            }
        }
    }
}

impl<C: GenericClient> GenericClient for InstrumentedClient<C> {
    async fn prepare_statement(&self, sql: &str) -> DbResult<Statement> {
        let result = self.client.prepare_statement(sql).await;
        if let Ok(stmt) = &result {
            self.log_sql(sql, stmt.params().len());
        }
        self.remember(sql);
        result
    }

    async fn query_prepared(
        &self,
        stmt: &Statement,
        params: &[&(dyn ToSql + Sync)],
    ) -> DbResult<Vec<Row>> {
        let start = Instant::now();
        let result = self.client.query_prepared(stmt, params).await;
        self.log_result(&self.recall(), start, &result, |rows| rows.len() as u64);
        result
    }

    async fn execute_prepared(
        &self,
        stmt: &Statement,
        params: &[&(dyn ToSql + Sync)],
    ) -> DbResult<u64> {
        let start = Instant::now();
        let result = self.client.execute_prepared(stmt, params).await;
        self.log_result(&self.recall(), start, &result, |n| *n);
        result
    }
}
