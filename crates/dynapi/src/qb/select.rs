//! SELECT query builder.

use serde_json::Value;

use crate::error::{DbError, DbResult};
use crate::ident::{Ident, IntoIdent};
use crate::qb::expr::Conditions;
use crate::qb::param::ParamList;
use crate::qb::traits::SqlQb;

/// `SELECT * FROM table [WHERE ...] [LIMIT $n]`.
///
/// The limit is bound as a parameter, so a non-numeric limit is rejected while
/// binding instead of being spliced into the SQL.
#[derive(Clone, Debug)]
pub struct SelectQb {
    table: Option<Ident>,
    conds: Conditions,
    limit: Option<Value>,
    build_error: Option<String>,
}

impl SelectQb {
    /// Create a new SELECT query builder.
    pub fn new(table: impl IntoIdent) -> Self {
        let mut qb = Self {
            table: None,
            conds: Conditions::default(),
            limit: None,
            build_error: None,
        };
        match table.into_ident() {
            Ok(t) => qb.table = Some(t),
            Err(e) => qb.build_error = Some(e.to_string()),
        }
        qb
    }

    pub fn eq(mut self, column: impl IntoIdent, value: Value) -> Self {
        self.conds.eq(column, value);
        self
    }

    pub fn eq_map(self, filters: &serde_json::Map<String, Value>) -> Self {
        filters
            .iter()
            .fold(self, |qb, (column, value)| qb.eq(column, value.clone()))
    }

    /// Row limit; accepts a JSON number or numeric string.
    pub fn limit(mut self, limit: impl Into<Value>) -> Self {
        self.limit = Some(limit.into());
        self
    }
}

impl SqlQb for SelectQb {
    fn build(&self) -> (String, ParamList) {
        let mut params = ParamList::new();
        let mut sql = String::from("SELECT * FROM ");
        if let Some(table) = &self.table {
            table.write_sql(&mut sql);
        }
        self.conds.group.write_where(&mut sql, &mut params);
        if let Some(limit) = &self.limit {
            let idx = params.push("LIMIT", limit.clone());
            sql.push_str(&format!(" LIMIT ${idx}"));
        }
        (sql, params)
    }

    fn validate(&self) -> DbResult<()> {
        match self.build_error.as_ref().or(self.conds.error.as_ref()) {
            Some(e) => Err(DbError::validation(e.clone())),
            None => Ok(()),
        }
    }
}
