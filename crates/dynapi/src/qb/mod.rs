//! Query builders over runtime table and column names.
//!
//! Every builder takes identifiers as strings, validates them into [`Ident`]s and
//! binds values as JSON parameters. Nothing from the caller is spliced into SQL
//! text except validated identifiers.
//!
//! ```ignore
//! use dynapi::qb;
//! use serde_json::json;
//!
//! let id = qb::insert("users")
//!     .set("username", json!("alice"))
//!     .returning("id")
//!     .fetch_returning(&client)
//!     .await?;
//!
//! let rows = qb::select("users")
//!     .eq("status", json!("active"))
//!     .limit(10)
//!     .fetch_json(&client)
//!     .await?;
//!
//! qb::update("users")
//!     .set("status", json!("inactive"))
//!     .eq("id", id)
//!     .execute(&client)
//!     .await?;
//! ```
//!
//! [`Ident`]: crate::Ident

mod delete;
mod expr;
mod insert;
mod param;
mod select;
mod traits;
mod update;

pub use delete::DeleteQb;
pub use expr::{EqCond, EqGroup};
pub use insert::InsertQb;
pub use param::{Param, ParamList, as_refs};
pub use select::SelectQb;
pub use traits::{MutationQb, SqlQb};
pub use update::UpdateQb;

use crate::ident::IntoIdent;

/// Create a SELECT query builder for the given table.
pub fn select(table: impl IntoIdent) -> SelectQb {
    SelectQb::new(table)
}

/// Create an INSERT query builder for the given table.
pub fn insert(table: impl IntoIdent) -> InsertQb {
    InsertQb::new(table)
}

/// Create an UPDATE query builder for the given table.
pub fn update(table: impl IntoIdent) -> UpdateQb {
    UpdateQb::new(table)
}

/// Create a DELETE query builder for the given table.
///
/// DELETE without conditions generates `WHERE 1=0`.
pub fn delete(table: impl IntoIdent) -> DeleteQb {
    DeleteQb::new(table)
}

#[cfg(test)]
mod tests;
