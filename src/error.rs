use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Simulated error for canary rollback testing")]
    Simulated { hostname: String },

    #[error("Internal error: {0}")]
    InternalError(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = self.to_string();

        match self {
            // Structured body so rollback tooling can tell a synthetic
            // failure apart from a genuine downstream fault.
            AppError::Simulated { hostname } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Simulated Error",
                    "message": message,
                    "type": "SimulatedError",
                    "hostname": hostname,
                })),
            )
                .into_response(),

            AppError::InternalError { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, message).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulated_maps_to_server_error() {
        let response = AppError::Simulated {
            hostname: "canary-1".to_string(),
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
