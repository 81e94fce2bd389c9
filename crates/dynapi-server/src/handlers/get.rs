use dynapi::{SqlQb, qb};
use serde_json::{Value, json};

use crate::AppState;
use crate::envelope::Envelope;
use crate::error::ApiResult;
use crate::handlers::KeyPredicate;
use crate::request::{RequestInput, present};

pub const DEFAULT_LIMIT: i64 = 10;

/// Rows matching the optional key and `filters`, at most `limit` of them.
///
/// A non-object `filters` is ignored. `limit` is passed through as given and bound as
/// a parameter, so a non-integer limit fails in the database layer.
pub async fn handle(state: &AppState, table: &str, input: &RequestInput) -> ApiResult<Envelope> {
    let mut query = qb::select(table);
    if let Some(key) = KeyPredicate::from_input(input) {
        query = query.eq(&key.field, key.value);
    }
    if let Some(Value::Object(filters)) = present(input, "filters") {
        query = query.eq_map(filters);
    }
    let limit = present(input, "limit").cloned().unwrap_or(json!(DEFAULT_LIMIT));
    let query = query.limit(limit);

    let client = state.client().await?;
    let rows = query.fetch_json(&client).await?;

    Ok(Envelope::success("Data retrieved successfully.").with_rows(rows))
}
