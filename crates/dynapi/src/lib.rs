//! # dynapi
//!
//! A PostgreSQL query layer for tables and columns that are only known at runtime.
//!
//! ## Features
//!
//! - **Validated identifiers**: table and column names are parsed into [`Ident`]s before
//!   they reach SQL text; values are always bound as parameters
//! - **JSON in, JSON out**: parameters are `serde_json::Value`s coerced to the types
//!   Postgres infers for each placeholder, and rows decode to JSON objects
//! - **Safe defaults**: UPDATE and DELETE without conditions match no rows
//! - **Transaction-friendly**: pass a transaction anywhere a [`GenericClient`] is expected
//! - **SQL logging**: [`InstrumentedClient`] traces statements and slow queries
//!
//! ```ignore
//! use dynapi::qb;
//! use serde_json::json;
//!
//! let rows = qb::select("users")
//!     .eq("status", json!("active"))
//!     .limit(10)
//!     .fetch_json(&client)
//!     .await?;
//! ```

pub mod client;
pub mod error;
pub mod ident;
pub mod monitor;
pub mod qb;
pub mod row;
pub mod value;

pub use client::GenericClient;
pub use error::{DbError, DbResult};
pub use ident::{Ident, IdentPart, IntoIdent};
pub use monitor::{InstrumentedClient, MonitorConfig, QueryType};
pub use row::RowExt;
pub use value::SqlValue;

pub use qb::{
    DeleteQb, InsertQb, MutationQb, SelectQb, SqlQb, UpdateQb, delete, insert, select, update,
};

#[cfg(feature = "pool")]
pub mod pool;

#[cfg(feature = "pool")]
pub use pool::{create_pool, create_pool_with_config};

#[cfg(feature = "pool")]
pub use deadpool_postgres;
pub use tokio_postgres;
