//! `DbError`: everything the query layer can fail with.
//!
//! The HTTP layer maps every variant to the same opaque 500, so the split below exists for
//! logs and for library callers.

use thiserror::Error;

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("Connection error: {0}")]
    Connection(String),

    /// Any server or protocol error not classified below.
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// `INSERT ... RETURNING` came back empty.
    #[error("Not found: {0}")]
    NotFound(String),

    /// SQLSTATE 23505, carrying `constraint: message`.
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    /// SQLSTATE 23503.
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// SQLSTATE 23514.
    #[error("Check constraint violation: {0}")]
    CheckViolation(String),

    /// A result cell could not be turned into JSON.
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// A JSON value does not fit the parameter type the server inferred.
    #[error("Encode error for '{column}': {message}")]
    Encode { column: String, message: String },

    /// The column or parameter type has no JSON mapping in either direction.
    #[error("Unsupported type '{type_name}' for '{column}'")]
    UnsupportedType { column: String, type_name: String },

    /// Bad identifier, or a builder asked to render something it refuses to.
    #[error("Validation error: {0}")]
    Validation(String),

    #[cfg(feature = "pool")]
    #[error("Pool error: {0}")]
    Pool(String),
}

impl DbError {
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// `column` names the placeholder's column, or a label such as `LIMIT`.
    pub fn encode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Encode {
            column: column.into(),
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Classify constraint failures by SQLSTATE; everything else stays [`DbError::Query`].
    pub fn from_db_error(err: tokio_postgres::Error) -> Self {
        let Some(db_err) = err.as_db_error() else {
            return Self::Query(err);
        };
        let detail = format!(
            "{}: {}",
            db_err.constraint().unwrap_or("unknown"),
            db_err.message()
        );
        let code = db_err.code().code().to_string();
        match code.as_str() {
            "23505" => Self::UniqueViolation(detail),
            "23503" => Self::ForeignKeyViolation(detail),
            "23514" => Self::CheckViolation(detail),
            _ => Self::Query(err),
        }
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for DbError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_error_names_the_column() {
        let err = DbError::encode("age", "expected integer, got \"abc\"");
        assert_eq!(
            err.to_string(),
            "Encode error for 'age': expected integer, got \"abc\""
        );
    }

    #[test]
    fn unsupported_type_names_both_sides() {
        let err = DbError::UnsupportedType {
            column: "blob".into(),
            type_name: "bytea".into(),
        };
        assert_eq!(err.to_string(), "Unsupported type 'bytea' for 'blob'");
    }
}
