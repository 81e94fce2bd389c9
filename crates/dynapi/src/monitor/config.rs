use std::time::Duration;

/// Configuration for SQL logging.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Executions slower than this are logged at WARN. `None` disables the check.
    pub slow_query_threshold: Option<Duration>,
    /// Truncate logged SQL strings (in bytes). `None` means no truncation.
    pub max_sql_length: Option<usize>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            slow_query_threshold: None,
            max_sql_length: Some(200),
        }
    }
}

impl MonitorConfig {
    /// Create a new configuration with defaults (no slow-query check, 200 byte SQL).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the slow query threshold.
    pub fn with_slow_query_threshold(mut self, threshold: Duration) -> Self {
        self.slow_query_threshold = Some(threshold);
        self
    }

    /// Set maximum SQL length to log.
    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    /// Disable SQL truncation.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    pub(crate) fn display_sql(&self, sql: &str) -> String {
        match self.max_sql_length {
            Some(max) if sql.len() > max => format!("{}...", super::truncate_sql_bytes(sql, max)),
            _ => sql.to_string(),
        }
    }

    pub(crate) fn is_slow(&self, elapsed: Duration) -> bool {
        self.slow_query_threshold.is_some_and(|t| elapsed > t)
    }
}
