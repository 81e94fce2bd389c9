//! INSERT query builder.

use serde_json::Value;

use crate::client::GenericClient;
use crate::error::{DbError, DbResult};
use crate::ident::{Ident, IntoIdent};
use crate::qb::param::ParamList;
use crate::qb::traits::{MutationQb, SqlQb};
use crate::row::RowExt;

/// Single-row INSERT with JSON values.
#[derive(Clone, Debug)]
pub struct InsertQb {
    table: Option<Ident>,
    columns: Vec<Ident>,
    values: Vec<Value>,
    returning: Vec<Ident>,
    build_error: Option<String>,
}

impl InsertQb {
    /// Create a new INSERT query builder.
    pub fn new(table: impl IntoIdent) -> Self {
        let mut qb = Self {
            table: None,
            columns: Vec::new(),
            values: Vec::new(),
            returning: Vec::new(),
            build_error: None,
        };
        match table.into_ident() {
            Ok(t) => qb.table = Some(t),
            Err(e) => qb.build_error = Some(e.to_string()),
        }
        qb
    }

    /// Set a column value.
    pub fn set(mut self, column: impl IntoIdent, value: Value) -> Self {
        match column.into_ident() {
            Ok(c) => {
                self.columns.push(c);
                self.values.push(value);
            }
            Err(e) => {
                self.build_error.get_or_insert(e.to_string());
            }
        }
        self
    }

    /// Set every entry of a JSON object as a column value.
    pub fn set_map(self, row: &serde_json::Map<String, Value>) -> Self {
        row.iter()
            .fold(self, |qb, (column, value)| qb.set(column, value.clone()))
    }

    /// Add a RETURNING column.
    pub fn returning(mut self, column: impl IntoIdent) -> Self {
        match column.into_ident() {
            Ok(c) => self.returning.push(c),
            Err(e) => {
                self.build_error.get_or_insert(e.to_string());
            }
        }
        self
    }

    /// Execute and decode the first RETURNING column of the inserted row.
    ///
    /// Requires at least one [`returning`](Self::returning) column.
    pub async fn fetch_returning(&self, conn: &impl GenericClient) -> DbResult<Value> {
        if self.returning.is_empty() {
            return Err(DbError::validation(
                "InsertQb::fetch_returning requires a RETURNING column",
            ));
        }
        let rows = self.query(conn).await?;
        let row = rows
            .first()
            .ok_or_else(|| DbError::not_found("INSERT ... RETURNING produced no row"))?;
        row.column_json(0)
    }
}

impl SqlQb for InsertQb {
    fn build(&self) -> (String, ParamList) {
        let mut params = ParamList::new();
        let mut sql = String::from("INSERT INTO ");
        if let Some(table) = &self.table {
            table.write_sql(&mut sql);
        }

        if self.columns.is_empty() {
            sql.push_str(" DEFAULT VALUES");
        } else {
            let cols: Vec<String> = self.columns.iter().map(Ident::to_sql).collect();
            let placeholders: Vec<String> = self
                .columns
                .iter()
                .zip(&self.values)
                .map(|(col, value)| format!("${}", params.push(col.to_sql(), value.clone())))
                .collect();
            sql.push_str(&format!(
                " ({}) VALUES ({})",
                cols.join(", "),
                placeholders.join(", ")
            ));
        }

        if !self.returning.is_empty() {
            let cols: Vec<String> = self.returning.iter().map(Ident::to_sql).collect();
            sql.push_str(" RETURNING ");
            sql.push_str(&cols.join(", "));
        }

        (sql, params)
    }

    fn validate(&self) -> DbResult<()> {
        match &self.build_error {
            Some(e) => Err(DbError::validation(e.clone())),
            None => Ok(()),
        }
    }
}

impl MutationQb for InsertQb {}
