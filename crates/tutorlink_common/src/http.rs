// --- File: crates/tutorlink_common/src/http.rs ---
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::error::{HttpStatusCode, TutorlinkError};

pub mod client;

/// JSON body of every error response: `{"error": {"message": ..., "code": ...}}`.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ErrorDetail {
    pub message: String,
    pub code: u16,
}

impl IntoResponse for TutorlinkError {
    fn into_response(self) -> Response {
        let status_code =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let body = ErrorBody {
            error: ErrorDetail {
                message: self.to_string(),
                code: status_code.as_u16(),
            },
        };

        (status_code, Json(body)).into_response()
    }
}

/// Result alias used by JSON handlers.
pub type ApiResult<T> = Result<Json<T>, TutorlinkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn error_response_carries_status_and_json_body() {
        let response =
            TutorlinkError::ConflictError("time slot 4 is already claimed".to_string())
                .into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["code"], 409);
        assert_eq!(
            body["error"]["message"],
            "Conflict: time slot 4 is already claimed"
        );
    }
}
