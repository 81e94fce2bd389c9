//! DELETE query builder.

use serde_json::Value;

use crate::error::{DbError, DbResult};
use crate::ident::{Ident, IntoIdent};
use crate::qb::expr::Conditions;
use crate::qb::param::ParamList;
use crate::qb::traits::{MutationQb, SqlQb};

/// DELETE with equality conditions.
///
/// Without any condition the statement renders `WHERE 1=0` and deletes nothing.
#[derive(Clone, Debug)]
pub struct DeleteQb {
    table: Option<Ident>,
    conds: Conditions,
    build_error: Option<String>,
}

impl DeleteQb {
    /// Create a new DELETE query builder.
    pub fn new(table: impl IntoIdent) -> Self {
        let mut qb = Self {
            table: None,
            conds: Conditions::default(),
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
}

impl SqlQb for DeleteQb {
    fn build(&self) -> (String, ParamList) {
        let mut params = ParamList::new();
        let mut sql = String::from("DELETE FROM ");
        if let Some(table) = &self.table {
            table.write_sql(&mut sql);
        }
        if self.conds.group.is_empty() {
            sql.push_str(" WHERE 1=0");
        } else {
            self.conds.group.write_where(&mut sql, &mut params);
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

impl MutationQb for DeleteQb {}
