//! One module per operation. Each validates its input before a connection is taken
//! from the pool and issues exactly one statement.

pub mod delete;
pub mod get;
pub mod insert;
pub mod update;

use serde_json::Value;

use crate::request::{RequestInput, present};

/// `primary_key_field = primary_key_value`, when both are present.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyPredicate {
    pub field: String,
    pub value: Value,
}

impl KeyPredicate {
    pub fn from_input(input: &RequestInput) -> Option<Self> {
        let field = present(input, "primary_key_field")?;
        let value = present(input, "primary_key_value")?;
        let field = match field {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        Some(Self {
            field,
            value: value.clone(),
        })
    }
}
