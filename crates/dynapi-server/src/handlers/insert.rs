use dynapi::qb;

use crate::AppState;
use crate::envelope::Envelope;
use crate::error::{ApiError, ApiResult};
use crate::request::{RequestInput, present};

/// Insert `data` as one row and report the generated key.
pub async fn handle(state: &AppState, table: &str, input: &RequestInput) -> ApiResult<Envelope> {
    let data = present(input, "data")
        .and_then(|v| v.as_object())
        .ok_or(ApiError::InsertDataRequired)?;

    let client = state.client().await?;
    let id = qb::insert(table)
        .set_map(data)
        .returning(&*state.id_column)
        .fetch_returning(&client)
        .await?;

    Ok(Envelope::success("Data inserted successfully.").with_inserted_id(id))
}
