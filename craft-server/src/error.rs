use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use craft_core::CraftError;
use serde_json::json;
use thiserror::Error;

/// Client errors. Model failures never get here: they answer 200 with the empty result.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Invalid request body: {0}")]
    InvalidBody(#[from] JsonRejection),
}

impl From<CraftError> for ApiError {
    fn from(err: CraftError) -> Self {
        // Handlers only see validation failures; the pipeline absorbs the rest.
        ApiError::BadRequest(match err {
            CraftError::InvalidInput(msg) => msg,
            other => other.to_string(),
        })
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidBody(rejection) => rejection.status(),
        };

        let body = Json(json!({
            "error": self.to_string(),
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
