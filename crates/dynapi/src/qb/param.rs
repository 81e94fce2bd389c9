//! JSON parameters collected while a statement is built.

use serde_json::Value;
use tokio_postgres::types::{ToSql, Type};

use crate::error::{DbError, DbResult};
use crate::value::SqlValue;

/// A JSON value waiting for its placeholder's type.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    /// Column (or clause, e.g. `LIMIT`) the value is bound to; used in error messages.
    pub label: String,
    pub value: Value,
}

/// Parameters in placeholder order (`$1` is index 0).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamList {
    params: Vec<Param>,
}

impl ParamList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter and return its 1-based placeholder index.
    pub fn push(&mut self, label: impl Into<String>, value: Value) -> usize {
        self.params.push(Param {
            label: label.into(),
            value,
        });
        self.params.len()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Param> {
        self.params.iter()
    }

    /// Coerce every parameter to the matching type of a prepared statement.
    pub fn bind(&self, types: &[Type]) -> DbResult<Vec<SqlValue>> {
        if types.len() != self.params.len() {
            return Err(DbError::validation(format!(
                "statement expects {} parameters, {} were bound",
                types.len(),
                self.params.len()
            )));
        }
        self.params
            .iter()
            .zip(types)
            .map(|(p, ty)| SqlValue::coerce(&p.value, ty, &p.label))
            .collect()
    }
}

/// Borrow coerced values in the shape `tokio-postgres` expects.
pub fn as_refs(values: &[SqlValue]) -> Vec<&(dyn ToSql + Sync)> {
    values.iter().map(|v| v as &(dyn ToSql + Sync)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn push_returns_placeholder_index() {
        let mut params = ParamList::new();
        assert_eq!(params.push("name", json!("a")), 1);
        assert_eq!(params.push("age", json!(3)), 2);
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn bind_uses_statement_types_in_order() {
        let mut params = ParamList::new();
        params.push("age", json!("30"));
        params.push("name", json!("alice"));

        let bound = params.bind(&[Type::INT4, Type::TEXT]).unwrap();
        assert_eq!(bound, vec![SqlValue::Int4(30), SqlValue::Text("alice".into())]);
    }

    #[test]
    fn bind_rejects_count_mismatch() {
        let mut params = ParamList::new();
        params.push("a", json!(1));
        assert!(params.bind(&[]).is_err());
    }

    #[test]
    fn bind_error_names_the_column() {
        let mut params = ParamList::new();
        params.push("age", json!("old"));
        let err = params.bind(&[Type::INT4]).unwrap_err();
        assert!(err.to_string().contains("'age'"));
    }
}
