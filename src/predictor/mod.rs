mod canned;
mod script;

pub use canned::CannedImageDiagnosis;
pub use script::ScriptPredictor;

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PredictorError {
    #[error("Failed to start predictor `{program}`: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("Failed to serialize predictor input: {0}")]
    Input(serde_json::Error),
    #[error("Predictor I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Predictor exited with {status}: {stderr}")]
    Exited { status: String, stderr: String },
    #[error("Predictor did not finish within {0:?}")]
    Timeout(Duration),
    #[error("Predictor reported an error: {0}")]
    Reported(String),
    #[error("Predictor produced no output")]
    EmptyOutput,
    #[error("Predictor output is not valid JSON: {0}")]
    MalformedOutput(#[from] serde_json::Error),
}

impl PredictorError {
    /// Whether the failure happened while running the predictor, as opposed
    /// to while interpreting what it returned.
    pub fn is_invocation_failure(&self) -> bool {
        matches!(
            self,
            PredictorError::Spawn { .. }
                | PredictorError::Input(_)
                | PredictorError::Io(_)
                | PredictorError::Exited { .. }
                | PredictorError::Timeout(_)
                | PredictorError::Reported(_)
        )
    }
}

/// Turns a feature payload into a prediction document.
///
/// Handlers only see this trait, so the transport behind it (a script, a
/// model server, or a fixed stub) can be swapped freely.
#[async_trait]
pub trait Predictor: Send + Sync + 'static {
    async fn predict(&self, request: &Value) -> Result<Value, PredictorError>;
}
