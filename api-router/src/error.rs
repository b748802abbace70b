use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::error::AppError;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Serialize, Clone)]
pub enum ApiError {
    #[error("Internal server error")]
    InternalError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Unprocessable content: {0}")]
    Unprocessable(String),

    #[error("Upstream provider error: {0}")]
    BadGateway(String),

    #[error("Upstream provider timed out: {0}")]
    GatewayTimeout(String),
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::UnsupportedFormat(_)
            | AppError::MalformedInput(_)
            | AppError::Validation(_) => Self::ValidationError(err.to_string()),
            AppError::Extraction(_) => Self::Unprocessable(err.to_string()),
            AppError::ProviderTimeout(_) => {
                tracing::warn!("Provider timeout: {}", err);
                Self::GatewayTimeout(err.to_string())
            }
            AppError::Provider(_) | AppError::OpenAI(_) | AppError::Reqwest(_) => {
                tracing::error!("Provider error: {:?}", err);
                Self::BadGateway("The model provider could not complete the request".to_string())
            }
            _ => {
                tracing::error!("Internal error: {:?}", err);
                Self::InternalError("Internal server error".to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::InternalError(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
            Self::ValidationError(message) => (StatusCode::BAD_REQUEST, message),
            Self::Unprocessable(message) => (StatusCode::UNPROCESSABLE_ENTITY, message),
            Self::BadGateway(message) => (StatusCode::BAD_GATEWAY, message),
            Self::GatewayTimeout(message) => (StatusCode::GATEWAY_TIMEOUT, message),
        };

        (
            status,
            Json(ErrorResponse {
                error: message,
                status: "error".to_string(),
            }),
        )
            .into_response()
    }
}

#[derive(Serialize, Debug)]
struct ErrorResponse {
    error: String,
    status: String,
}
