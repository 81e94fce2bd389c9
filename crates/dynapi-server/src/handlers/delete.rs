use dynapi::{MutationQb, qb};

use crate::AppState;
use crate::envelope::Envelope;
use crate::error::{ApiError, ApiResult};
use crate::handlers::KeyPredicate;
use crate::request::RequestInput;

/// Delete every row matching the key. Zero matches is a handled outcome.
pub async fn handle(state: &AppState, table: &str, input: &RequestInput) -> ApiResult<Envelope> {
    let key = KeyPredicate::from_input(input).ok_or(ApiError::DeleteFieldsRequired)?;

    let client = state.client().await?;
    let affected = qb::delete(table)
        .eq(&key.field, key.value)
        .execute(&client)
        .await?;

    Ok(if affected > 0 {
        Envelope::success("Record deleted successfully.")
    } else {
        Envelope::error("No record found to delete.")
    })
}
