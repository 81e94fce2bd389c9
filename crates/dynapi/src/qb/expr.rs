//! WHERE clauses built from column/value equality pairs.

use serde_json::Value;

use crate::ident::{Ident, IntoIdent};
use crate::qb::param::ParamList;

/// A single `column = value` condition.
///
/// JSON `null` renders as `column IS NULL`, since `= NULL` never matches.
#[derive(Debug, Clone, PartialEq)]
pub struct EqCond {
    pub column: Ident,
    pub value: Value,
}

/// Conditions combined with AND.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EqGroup {
    items: Vec<EqCond>,
}

impl EqGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, column: Ident, value: Value) {
        self.items.push(EqCond { column, value });
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Append ` WHERE a = $n AND b IS NULL ...`, numbering placeholders after those
    /// already in `params`. Appends nothing when the group is empty.
    pub fn write_where(&self, sql: &mut String, params: &mut ParamList) {
        for (i, eq) in self.items.iter().enumerate() {
            sql.push_str(if i == 0 { " WHERE " } else { " AND " });
            eq.column.write_sql(sql);
            if eq.value.is_null() {
                sql.push_str(" IS NULL");
            } else {
                let idx = params.push(eq.column.to_sql(), eq.value.clone());
                sql.push_str(&format!(" = ${idx}"));
            }
        }
    }
}

/// Shared state for builders that accept equality conditions.
///
/// Invalid identifiers are recorded rather than returned, so builder chains stay
/// infallible; the first error surfaces when the statement is validated.
#[derive(Debug, Clone, Default)]
pub(crate) struct Conditions {
    pub(crate) group: EqGroup,
    pub(crate) error: Option<String>,
}

impl Conditions {
    pub(crate) fn eq(&mut self, column: impl IntoIdent, value: Value) {
        match column.into_ident() {
            Ok(ident) => self.group.push(ident, value),
            Err(e) => {
                self.error.get_or_insert(e.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_group_writes_nothing() {
        let mut sql = String::from("SELECT * FROM t");
        let mut params = ParamList::new();
        EqGroup::new().write_where(&mut sql, &mut params);
        assert_eq!(sql, "SELECT * FROM t");
        assert!(params.is_empty());
    }

    #[test]
    fn numbering_continues_after_existing_params() {
        let mut group = EqGroup::new();
        group.push(Ident::parse("id").unwrap(), json!(7));
        group.push(Ident::parse("deleted_at").unwrap(), json!(null));
        group.push(Ident::parse("status").unwrap(), json!("active"));

        let mut sql = String::from("UPDATE t SET a = $1");
        let mut params = ParamList::new();
        params.push("a", json!(1));
        group.write_where(&mut sql, &mut params);

        assert_eq!(
            sql,
            "UPDATE t SET a = $1 WHERE id = $2 AND deleted_at IS NULL AND status = $3"
        );
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn first_identifier_error_is_kept() {
        let mut conds = Conditions::default();
        conds.eq("ok", json!(1));
        conds.eq("bad name", json!(2));
        conds.eq("1bad", json!(3));
        assert_eq!(conds.group.len(), 1);
        assert!(conds.error.unwrap().contains("bad name"));
    }
}
