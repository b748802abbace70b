use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use axum_typed_multipart::{FieldData, TryFromMultipart, TypedMultipart};
use bytes::Bytes;
use serde_json::json;
use tracing::info;

use crate::{api_state::ApiState, error::ApiError};

#[derive(Debug, TryFromMultipart)]
pub struct UploadParams {
    // Bounded by the route's body limit.
    #[form_data(limit = "unlimited")]
    pub file: FieldData<Bytes>,
}

pub async fn upload_file(
    State(state): State<ApiState>,
    TypedMultipart(input): TypedMultipart<UploadParams>,
) -> Result<impl IntoResponse, ApiError> {
    let filename = input.file.metadata.file_name.unwrap_or_default();
    let content_type = input.file.metadata.content_type;

    info!(
        filename = %filename,
        content_type = content_type.as_deref().unwrap_or("unknown"),
        byte_len = input.file.contents.len(),
        "Received document upload"
    );

    let report = state
        .ingestion
        .ingest_document(input.file.contents.to_vec(), &filename, content_type.as_deref())
        .await?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "message": format!("File '{filename}' processed and stored"),
            "chunk_count": report.chunk_count,
        })),
    ))
}

pub async fn upload_qa(
    State(state): State<ApiState>,
    TypedMultipart(input): TypedMultipart<UploadParams>,
) -> Result<impl IntoResponse, ApiError> {
    info!(
        filename = input.file.metadata.file_name.as_deref().unwrap_or("unnamed"),
        byte_len = input.file.contents.len(),
        "Received QA upload"
    );

    let report = state.ingestion.ingest_qa_pairs(&input.file.contents).await?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "message": "QA pairs stored successfully",
            "stored_count": report.stored_count,
            "skipped_count": report.skipped_count,
        })),
    ))
}
