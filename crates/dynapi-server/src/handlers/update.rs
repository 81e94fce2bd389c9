use dynapi::{MutationQb, qb};

use crate::AppState;
use crate::envelope::Envelope;
use crate::error::{ApiError, ApiResult};
use crate::handlers::KeyPredicate;
use crate::request::{RequestInput, present};

/// Set `data` on every row matching the key. Zero matches is a handled outcome.
pub async fn handle(state: &AppState, table: &str, input: &RequestInput) -> ApiResult<Envelope> {
    let key = KeyPredicate::from_input(input).ok_or(ApiError::UpdateFieldsRequired)?;
    let data = present(input, "data")
        .and_then(|v| v.as_object())
        .ok_or(ApiError::UpdateFieldsRequired)?;

    let client = state.client().await?;
    let affected = qb::update(table)
        .set_map(data)
        .eq(&key.field, key.value)
        .execute(&client)
        .await?;

    Ok(if affected > 0 {
        Envelope::success("Data updated successfully.")
    } else {
        Envelope::error("No record updated.")
    })
}
