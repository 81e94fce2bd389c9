//! HTTP surface for generic table CRUD.
//!
//! `{method} {base}/{table}/{type}` runs an insert, update, delete or get against
//! `table`, reading its arguments from the request body and query string, and always
//! answers with a JSON envelope.

pub mod config;
pub mod dispatch;
pub mod envelope;
pub mod error;
pub mod handlers;
pub mod request;

use std::sync::Arc;

use axum::response::Json;
use axum::routing::{any, get};
use axum::Router;
use dynapi::deadpool_postgres::{self, Pool};
use dynapi::{InstrumentedClient, MonitorConfig};
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::error::ApiResult;

pub use crate::dispatch::{Operation, TargetSpec};
pub use crate::envelope::{Envelope, Status};
pub use crate::error::ApiError;

/// Shared per-process state; cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub pool: Pool,
    /// Column returned by `INSERT ... RETURNING`.
    pub id_column: Arc<str>,
    pub monitor: MonitorConfig,
}

impl AppState {
    pub fn new(pool: Pool) -> Self {
        Self {
            pool,
            id_column: Arc::from("id"),
            monitor: MonitorConfig::default(),
        }
    }

    /// Build the pool described by `config`. No connection is opened yet.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let pool = dynapi::create_pool_with_config(&config.database.url, config.database.pool_max_size)?;
        Ok(Self::new(pool)
            .with_id_column(&config.database.id_column)
            .with_monitor(config.monitor_config()))
    }

    pub fn with_id_column(mut self, column: &str) -> Self {
        self.id_column = Arc::from(column);
        self
    }

    pub fn with_monitor(mut self, monitor: MonitorConfig) -> Self {
        self.monitor = monitor;
        self
    }

    /// Check out a pooled connection that logs its statements.
    pub async fn client(&self) -> ApiResult<InstrumentedClient<deadpool_postgres::Client>> {
        let client = self.pool.get().await?;
        Ok(InstrumentedClient::new(client).with_config(self.monitor.clone()))
    }
}

async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

/// Build the router: the endpoint under `base_path` plus `GET /health`.
///
/// `base_path` must start with `/` and must not end with one.
pub fn build_router(state: AppState, base_path: &str) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(base_path, any(dispatch::dispatch_root))
        .route(&format!("{base_path}/"), any(dispatch::dispatch_root))
        .route(&format!("{base_path}/{{*rest}}"), any(dispatch::dispatch_path))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
