use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::error::{HttpStatusCode, ReservoError};

/// Body of every error response: `{ "success": false, "error": "...", "code": "..." }`.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    pub code: String,
}

impl From<&ReservoError> for ErrorBody {
    fn from(err: &ReservoError) -> Self {
        Self {
            success: false,
            error: err.to_string(),
            code: err.code().to_string(),
        }
    }
}

/// Implement IntoResponse for ReservoError so handlers can return `Result<_, ReservoError>`.
impl IntoResponse for ReservoError {
    fn into_response(self) -> Response {
        let status_code =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status_code.is_server_error() {
            error!("request failed: {}", self);
        }

        (status_code, Json(ErrorBody::from(&self))).into_response()
    }
}
