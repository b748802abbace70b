use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;

use crate::{api_state::ApiState, error::ApiError};

/// Raw dump of everything in the vector index. Only routed when
/// `debug_endpoint_enabled` is set.
pub async fn dump_index(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    let entries = state.index.get_all().await?;
    tracing::debug!(entry_count = entries.len(), "Dumping vector index");
    Ok(Json(json!({ "stored_data": entries })))
}
