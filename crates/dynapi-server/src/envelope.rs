//! The JSON body every endpoint response uses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

/// `{status, message}` plus the fields a particular operation reports.
///
/// Operation fields are omitted from the JSON when unset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    pub status: Status,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inserted_id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<Value>>,
}

impl Envelope {
    pub fn success(message: impl Into<String>) -> Self {
        Self::new(Status::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Status::Error, message)
    }

    fn new(status: Status, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            inserted_id: None,
            count: None,
            data: None,
        }
    }

    pub fn with_inserted_id(mut self, id: Value) -> Self {
        self.inserted_id = Some(id);
        self
    }

    /// Attach result rows; `count` always equals the number of rows.
    pub fn with_rows(mut self, rows: Vec<Value>) -> Self {
        self.count = Some(rows.len());
        self.data = Some(rows);
        self
    }
}

/// Handled outcomes, including `status: "error"` ones, are 200s.
impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn optional_fields_are_omitted() {
        let v = serde_json::to_value(Envelope::error("No record updated.")).unwrap();
        assert_eq!(v, json!({"status": "error", "message": "No record updated."}));
    }

    #[test]
    fn inserted_id_is_serialized() {
        let v = serde_json::to_value(
            Envelope::success("Data inserted successfully.").with_inserted_id(json!(42)),
        )
        .unwrap();
        assert_eq!(
            v,
            json!({"status": "success", "message": "Data inserted successfully.", "inserted_id": 42})
        );
    }

    #[test]
    fn rows_set_count_and_data() {
        let env = Envelope::success("ok").with_rows(vec![json!({"id": 1}), json!({"id": 2})]);
        assert_eq!(env.count, Some(2));
        let v = serde_json::to_value(env).unwrap();
        assert_eq!(v["count"], json!(2));
        assert_eq!(v["data"], json!([{"id": 1}, {"id": 2}]));
    }

    #[test]
    fn empty_result_still_has_count_and_data() {
        let v = serde_json::to_value(Envelope::success("ok").with_rows(Vec::new())).unwrap();
        assert_eq!(v["count"], json!(0));
        assert_eq!(v["data"], json!([]));
    }

    #[test]
    fn outcome_is_http_200() {
        let resp = Envelope::error("No record found to delete.").into_response();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
