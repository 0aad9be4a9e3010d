//! HTTP responses for the relay's plain endpoints

use crate::hub::HubStats;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chat_common::{AppError, ErrorResponse};
use serde::{Deserialize, Serialize};

/// Admission failure rendered as a JSON error body
#[derive(Debug)]
pub struct Rejection(pub AppError);

impl From<AppError> for Rejection {
    fn from(error: AppError) -> Self {
        Self(error)
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(error = ?self.0, "Server error occurred");
        }

        (status, Json(ErrorResponse::from(&self.0))).into_response()
    }
}

/// Body of `GET /health`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub sessions: usize,
    pub channels: usize,
}

impl HealthResponse {
    pub fn healthy(stats: HubStats) -> Self {
        Self {
            status: "ok".to_string(),
            sessions: stats.sessions,
            channels: stats.channels,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            status: "unavailable".to_string(),
            sessions: 0,
            channels: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_status() {
        assert_eq!(
            Rejection(AppError::MissingAuth).into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            Rejection(AppError::invalid_input("no upgrade"))
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_health_body() {
        let body = HealthResponse::healthy(HubStats {
            sessions: 3,
            channels: 2,
        });
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["status"], "ok");
        assert_eq!(value["sessions"], 3);
        assert_eq!(value["channels"], 2);
    }
}
