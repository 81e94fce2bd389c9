//! Maps `{base}/{table}/{type}` to one of the four operation handlers.

use axum::body::Bytes;
use axum::extract::{Path, RawQuery, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::Value;

use crate::AppState;
use crate::envelope::Envelope;
use crate::error::{ApiError, ApiResult};
use crate::handlers;
use crate::request::{RequestInput, decode_input};

/// The four supported operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Insert,
    Update,
    Delete,
    Get,
}

impl Operation {
    /// Parse an operation name, ignoring ASCII case.
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "insert" => Some(Operation::Insert),
            "update" => Some(Operation::Update),
            "delete" => Some(Operation::Delete),
            "get" => Some(Operation::Get),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Insert => "insert",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::Get => "get",
        }
    }
}

/// Table and operation taken from the URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSpec {
    pub table: String,
    pub operation: Operation,
}

impl TargetSpec {
    /// Both segments must be non-empty, and the operation one of the four known names.
    pub fn parse(table: &str, operation: &str) -> ApiResult<Self> {
        if table.is_empty() || operation.is_empty() {
            return Err(ApiError::MissingTarget);
        }
        let operation = Operation::parse(operation).ok_or(ApiError::InvalidOperation)?;
        Ok(Self {
            table: table.to_string(),
            operation,
        })
    }
}

/// Split the path after the base into `(table, type)`.
///
/// One trailing slash is ignored. Returns `None` for more than two segments.
pub fn split_segments(rest: &str) -> Option<(&str, &str)> {
    let rest = rest.strip_suffix('/').unwrap_or(rest);
    if rest.is_empty() {
        return Some(("", ""));
    }
    let mut parts = rest.split('/');
    let table = parts.next().unwrap_or("");
    let operation = parts.next().unwrap_or("");
    match parts.next() {
        Some(_) => None,
        None => Some((table, operation)),
    }
}

/// Run one request against the selected handler.
///
/// The `table` field of the input is always the path segment.
pub async fn handle(state: &AppState, target: TargetSpec, mut input: RequestInput) -> ApiResult<Envelope> {
    input.insert("table".to_string(), Value::String(target.table.clone()));
    tracing::debug!(operation = target.operation.as_str(), table = %target.table, "dispatch");

    match target.operation {
        Operation::Insert => handlers::insert::handle(state, &target.table, &input).await,
        Operation::Update => handlers::update::handle(state, &target.table, &input).await,
        Operation::Delete => handlers::delete::handle(state, &target.table, &input).await,
        Operation::Get => handlers::get::handle(state, &target.table, &input).await,
    }
}

async fn respond(
    state: &AppState,
    rest: &str,
    query: Option<String>,
    headers: &HeaderMap,
    body: &[u8],
) -> Response {
    let Some((table, operation)) = split_segments(rest) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let target = match TargetSpec::parse(table, operation) {
        Ok(target) => target,
        Err(e) => return e.into_response(),
    };
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());
    let input = decode_input(query.as_deref(), content_type, body);
    handle(state, target, input).await.into_response()
}

/// `{base}` and `{base}/`: no segments.
pub(crate) async fn dispatch_root(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    respond(&state, "", query, &headers, &body).await
}

/// `{base}/{*rest}`.
pub(crate) async fn dispatch_path(
    State(state): State<AppState>,
    Path(rest): Path<String>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    respond(&state, &rest, query, &headers, &body).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_is_case_insensitive() {
        assert_eq!(Operation::parse("GET"), Some(Operation::Get));
        assert_eq!(Operation::parse("Insert"), Some(Operation::Insert));
        assert_eq!(Operation::parse("uPdAtE"), Some(Operation::Update));
        assert_eq!(Operation::parse("delete"), Some(Operation::Delete));
        assert_eq!(Operation::parse("upsert"), None);
        assert_eq!(Operation::parse(""), None);
    }

    #[test]
    fn target_requires_both_segments() {
        assert!(matches!(TargetSpec::parse("", "get"), Err(ApiError::MissingTarget)));
        assert!(matches!(TargetSpec::parse("users", ""), Err(ApiError::MissingTarget)));
        assert!(matches!(TargetSpec::parse("", ""), Err(ApiError::MissingTarget)));
    }

    #[test]
    fn missing_segment_wins_over_unknown_type() {
        assert!(matches!(TargetSpec::parse("", "upsert"), Err(ApiError::MissingTarget)));
    }

    #[test]
    fn target_rejects_unknown_type() {
        assert!(matches!(
            TargetSpec::parse("users", "truncate"),
            Err(ApiError::InvalidOperation)
        ));
    }

    #[test]
    fn target_keeps_table_verbatim() {
        let target = TargetSpec::parse("Users", "GET").unwrap();
        assert_eq!(target.table, "Users");
        assert_eq!(target.operation, Operation::Get);
    }

    #[test]
    fn segments() {
        assert_eq!(split_segments("users/get"), Some(("users", "get")));
        assert_eq!(split_segments("users/get/"), Some(("users", "get")));
        assert_eq!(split_segments("users"), Some(("users", "")));
        assert_eq!(split_segments("users/"), Some(("users", "")));
        assert_eq!(split_segments("/get"), Some(("", "get")));
        assert_eq!(split_segments(""), Some(("", "")));
        assert_eq!(split_segments("users/get/extra"), None);
    }
}
