//! UPDATE query builder.

use serde_json::Value;

use crate::error::{DbError, DbResult};
use crate::ident::{Ident, IntoIdent};
use crate::qb::expr::Conditions;
use crate::qb::param::ParamList;
use crate::qb::traits::{MutationQb, SqlQb};

/// UPDATE with JSON values and equality conditions.
///
/// Without any condition the statement renders `WHERE 1=0` and touches no rows.
#[derive(Clone, Debug)]
pub struct UpdateQb {
    table: Option<Ident>,
    sets: Vec<(Ident, Value)>,
    conds: Conditions,
    build_error: Option<String>,
}

impl UpdateQb {
    /// Create a new UPDATE query builder.
    pub fn new(table: impl IntoIdent) -> Self {
        let mut qb = Self {
            table: None,
            sets: Vec::new(),
            conds: Conditions::default(),
            build_error: None,
        };
        match table.into_ident() {
            Ok(t) => qb.table = Some(t),
            Err(e) => qb.build_error = Some(e.to_string()),
        }
        qb
    }

    /// Set a column to a value.
    pub fn set(mut self, column: impl IntoIdent, value: Value) -> Self {
        match column.into_ident() {
            Ok(c) => self.sets.push((c, value)),
            Err(e) => {
                self.build_error.get_or_insert(e.to_string());
            }
        }
        self
    }

    /// Set every entry of a JSON object.
    pub fn set_map(self, data: &serde_json::Map<String, Value>) -> Self {
        data.iter()
            .fold(self, |qb, (column, value)| qb.set(column, value.clone()))
    }

    /// Add `column = value` (or `column IS NULL` for JSON null).
    pub fn eq(mut self, column: impl IntoIdent, value: Value) -> Self {
        self.conds.eq(column, value);
        self
    }

    /// Add every entry of a JSON object as an equality condition.
    pub fn eq_map(self, filters: &serde_json::Map<String, Value>) -> Self {
        filters
            .iter()
            .fold(self, |qb, (column, value)| qb.eq(column, value.clone()))
    }

    /// Whether any WHERE condition has been added.
    pub fn has_conditions(&self) -> bool {
        !self.conds.group.is_empty()
    }
}

impl SqlQb for UpdateQb {
    fn build(&self) -> (String, ParamList) {
        let mut params = ParamList::new();
        let mut sql = String::from("UPDATE ");
        if let Some(table) = &self.table {
            table.write_sql(&mut sql);
        }
        sql.push_str(" SET ");
        for (i, (col, value)) in self.sets.iter().enumerate() {
            if i > 0 {
                sql.push_str(", ");
            }
            col.write_sql(&mut sql);
            let idx = params.push(col.to_sql(), value.clone());
            sql.push_str(&format!(" = ${idx}"));
        }

        if self.conds.group.is_empty() {
            sql.push_str(" WHERE 1=0");
        } else {
            self.conds.group.write_where(&mut sql, &mut params);
        }

        (sql, params)
    }

    fn validate(&self) -> DbResult<()> {
        if let Some(e) = self.build_error.as_ref().or(self.conds.error.as_ref()) {
            return Err(DbError::validation(e.clone()));
        }
        if self.sets.is_empty() {
            return Err(DbError::validation("UPDATE requires at least one SET column"));
        }
        Ok(())
    }
}

impl MutationQb for UpdateQb {}
