use crate::predictor::PredictorError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Returned when a predictor could not be run at all.
pub const INVOCATION_FAILED: &str = "ML prediction failed";

/// Failures of a prediction route. Clients only ever see a fixed message;
/// the cause goes to the logs.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Predictor invocation failed: {0}")]
    Invocation(PredictorError),
    #[error("{message}: {cause}")]
    Unexpected {
        message: &'static str,
        cause: anyhow::Error,
    },
}

impl ApiError {
    /// Splits predictor failures into invocation failures and everything
    /// else, which gets the route's own `fallback` message.
    pub fn from_predictor(err: PredictorError, fallback: &'static str) -> Self {
        if err.is_invocation_failure() {
            ApiError::Invocation(err)
        } else {
            Self::unexpected(fallback, err)
        }
    }

    pub fn unexpected(message: &'static str, cause: impl Into<anyhow::Error>) -> Self {
        ApiError::Unexpected {
            message,
            cause: cause.into(),
        }
    }

    pub fn client_message(&self) -> &'static str {
        match self {
            ApiError::Invocation(_) => INVOCATION_FAILED,
            ApiError::Unexpected { message, .. } => *message,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Invocation(err) => {
                tracing::error!(error = %err, "Predictor invocation failed");
            }
            ApiError::Unexpected { message, cause } => {
                tracing::error!(error = ?cause, "Prediction handler error: {}", message);
            }
        }

        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": self.client_message() })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_invocation_failures_share_one_message() {
        let err = ApiError::from_predictor(
            PredictorError::Timeout(Duration::from_secs(1)),
            "Crop prediction failed",
        );
        assert_eq!(err.client_message(), INVOCATION_FAILED);
    }

    #[test]
    fn test_output_failures_use_fallback() {
        let err = ApiError::from_predictor(PredictorError::EmptyOutput, "Crop prediction failed");
        assert_eq!(err.client_message(), "Crop prediction failed");
    }
}
