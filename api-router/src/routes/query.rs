use axum::{extract::State, Json};
use retrieval_pipeline::QueryVariant;
use serde::{Deserialize, Serialize};

use crate::{api_state::ApiState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub user_input: String,
}

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub response: String,
}

pub async fn query_documents(
    State(state): State<ApiState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, ApiError> {
    answer(&state, QueryVariant::Document, &request.user_input).await
}

pub async fn query_qa(
    State(state): State<ApiState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, ApiError> {
    answer(&state, QueryVariant::Qa, &request.user_input).await
}

async fn answer(
    state: &ApiState,
    variant: QueryVariant,
    user_input: &str,
) -> Result<Json<QueryResponse>, ApiError> {
    let response = state.query.answer(variant, user_input).await?;
    Ok(Json(QueryResponse { response }))
}
