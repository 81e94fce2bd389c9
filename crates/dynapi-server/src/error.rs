//! HTTP-facing errors.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use dynapi::DbError;
use thiserror::Error;

use crate::envelope::Envelope;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    // ==================
    // Client Errors (4xx)
    // ==================
    #[error("Table name and type are required in the URL.")]
    MissingTarget,

    #[error("Invalid action type. Use insert/update/delete/get.")]
    InvalidOperation,

    #[error("Data is required for insert operation.")]
    InsertDataRequired,

    #[error("Primary key field, value, and data are required for update operation.")]
    UpdateFieldsRequired,

    #[error("Primary key field and value are required for delete operation.")]
    DeleteFieldsRequired,

    // ==================
    // Server Errors (5xx)
    // ==================
    /// Anything the database layer reports, including invalid identifiers.
    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MissingTarget
            | ApiError::InvalidOperation
            | ApiError::InsertDataRequired
            | ApiError::UpdateFieldsRequired
            | ApiError::DeleteFieldsRequired => StatusCode::BAD_REQUEST,
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<dynapi::deadpool_postgres::PoolError> for ApiError {
    fn from(err: dynapi::deadpool_postgres::PoolError) -> Self {
        Self::Database(DbError::from(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            ApiError::Database(e) => {
                tracing::error!(error = %e, "request failed");
                Envelope::error("Internal server error.")
            }
            other => Envelope::error(other.to_string()),
        };
        (status, Json(body)).into_response()
    }
}
