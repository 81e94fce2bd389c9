//! SQL logging for query execution.
//!
//! ```rust,ignore
//! use dynapi::monitor::{InstrumentedClient, MonitorConfig};
//! use std::time::Duration;
//!
//! let client = InstrumentedClient::new(pool.get().await?)
//!     .with_config(MonitorConfig::new().with_slow_query_threshold(Duration::from_millis(500)));
//! ```

mod config;
mod instrumented;

pub use config::MonitorConfig;
pub use instrumented::InstrumentedClient;

fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

/// The type of SQL operation being performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    Select,
    Insert,
    Update,
    Delete,
    Other,
}

impl QueryType {
    /// Detect the query type from the leading keyword.
    pub fn from_sql(sql: &str) -> Self {
        let keyword = sql
            .trim_start()
            .split(|c: char| !c.is_ascii_alphabetic())
            .next()
            .unwrap_or("");
        if keyword.eq_ignore_ascii_case("SELECT") {
            QueryType::Select
        } else if keyword.eq_ignore_ascii_case("INSERT") {
            QueryType::Insert
        } else if keyword.eq_ignore_ascii_case("UPDATE") {
            QueryType::Update
        } else if keyword.eq_ignore_ascii_case("DELETE") {
            QueryType::Delete
        } else {
            QueryType::Other
        }
    }
}
