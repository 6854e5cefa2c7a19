use super::{Predictor, PredictorError};
use crate::config::PredictorConfig;
use async_trait::async_trait;
use serde_json::Value;
use std::{path::PathBuf, process::Stdio, time::Duration};
use tokio::process::Command;
use tracing::instrument;

/// Runs a predictor script once per request.
///
/// The request is passed as a single JSON argument and the first line the
/// script prints is read back as JSON. The child is killed if the call is
/// dropped or runs past its timeout.
#[derive(Debug, Clone)]
pub struct ScriptPredictor {
    program: String,
    script: PathBuf,
    timeout: Option<Duration>,
}

impl ScriptPredictor {
    pub fn new(
        program: impl Into<String>,
        script: impl Into<PathBuf>,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            program: program.into(),
            script: script.into(),
            timeout,
        }
    }

    pub fn from_config(config: &PredictorConfig, script: &str) -> Self {
        Self::new(
            config.program.clone(),
            config.get_script_path(script),
            config.get_timeout(),
        )
    }

    async fn run(&self, argument: String) -> Result<String, PredictorError> {
        let child = Command::new(&self.program)
            .arg(&self.script)
            .arg(argument)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| PredictorError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| PredictorError::Timeout(limit))??,
            None => child.wait_with_output().await?,
        };

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if !output.status.success() {
            return Err(PredictorError::Exited {
                status: output.status.to_string(),
                stderr,
            });
        }
        if !stderr.is_empty() {
            tracing::debug!(script = ?self.script, "Predictor stderr: {}", stderr);
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

fn parse_first_line(stdout: &str) -> Result<Value, PredictorError> {
    let line = stdout
        .lines()
        .next()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .ok_or(PredictorError::EmptyOutput)?;

    let value: Value = serde_json::from_str(line)?;

    // Scripts catch their own exceptions and print `{"error": "...", "details"}`.
    // Any other `error` value is ordinary prediction data.
    if let Some(error) = value.get("error").and_then(Value::as_str) {
        let message = match value.get("details") {
            Some(details) => format!("{}: {}", error, as_text(details)),
            None => error.to_string(),
        };
        return Err(PredictorError::Reported(message));
    }

    Ok(value)
}

fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl Predictor for ScriptPredictor {
    #[instrument(skip(self, request), fields(script = ?self.script))]
    async fn predict(&self, request: &Value) -> Result<Value, PredictorError> {
        let argument = serde_json::to_string(request).map_err(PredictorError::Input)?;
        let stdout = self.run(argument).await?;
        parse_first_line(&stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fixture(name: &str) -> ScriptPredictor {
        let script = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests/fixtures")
            .join(name);
        ScriptPredictor::new("sh", script, Some(Duration::from_secs(5)))
    }

    #[tokio::test]
    async fn test_predict_reads_json_line() {
        let prediction = fixture("crop_ok.sh").predict(&json!({})).await.unwrap();

        assert_eq!(
            prediction,
            json!({
                "crop": "wheat",
                "confidence": 0.9,
                "expectedYield": "3t/ha",
                "reasoning": "soil match"
            })
        );
    }

    #[tokio::test]
    async fn test_request_is_passed_as_single_argument() {
        let request = json!({ "soil": "loamy clay", "ph": 6.5, "nitrogen": 60 });
        let echoed = fixture("echo_request.sh").predict(&request).await.unwrap();

        assert_eq!(echoed, request);
    }

    #[tokio::test]
    async fn test_only_first_line_is_read() {
        let prediction = fixture("two_lines.sh").predict(&json!({})).await.unwrap();

        assert_eq!(prediction["crop"], "rice");
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_invocation_failure() {
        let err = fixture("exit_failure.sh")
            .predict(&json!({}))
            .await
            .unwrap_err();

        assert!(err.is_invocation_failure());
        match err {
            PredictorError::Exited { stderr, .. } => assert!(stderr.contains("Traceback")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_reported_error_is_invocation_failure() {
        let err = fixture("reported_error.sh")
            .predict(&json!({}))
            .await
            .unwrap_err();

        assert!(err.is_invocation_failure());
        assert!(err.to_string().contains("unknown soil"));
    }

    #[tokio::test]
    async fn test_garbage_output_is_malformed() {
        let err = fixture("garbage.sh").predict(&json!({})).await.unwrap_err();

        assert!(matches!(err, PredictorError::MalformedOutput(_)));
        assert!(!err.is_invocation_failure());
    }

    #[tokio::test]
    async fn test_silent_script_is_empty_output() {
        let err = fixture("silent.sh").predict(&json!({})).await.unwrap_err();

        assert!(matches!(err, PredictorError::EmptyOutput));
        assert!(!err.is_invocation_failure());
    }

    #[tokio::test]
    async fn test_slow_script_times_out() {
        let script = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/slow.sh");
        let predictor = ScriptPredictor::new("sh", script, Some(Duration::from_millis(100)));

        let err = predictor.predict(&json!({})).await.unwrap_err();

        assert!(matches!(err, PredictorError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_missing_program_fails_to_spawn() {
        let predictor = ScriptPredictor::new("agro-ml-no-such-program", "predict.py", None);

        let err = predictor.predict(&json!({})).await.unwrap_err();

        assert!(matches!(err, PredictorError::Spawn { .. }));
    }

    #[test]
    fn test_non_string_error_field_is_data() {
        let value = parse_first_line(r#"{"price":2275.5,"error":null}"#).unwrap();
        assert_eq!(value["price"], 2275.5);

        let value = parse_first_line(r#"{"price":2275.5,"error":42.1}"#).unwrap();
        assert_eq!(value["error"], 42.1);
    }

    #[test]
    fn test_string_error_field_is_reported() {
        let err = parse_first_line(r#"{"error":"ML prediction failed"}"#).unwrap_err();
        assert!(matches!(err, PredictorError::Reported(ref m) if m == "ML prediction failed"));
    }

    #[test]
    fn test_parse_first_line_skips_trailing_output() {
        let value = parse_first_line("{\"crop\":\"maize\"}\nWarning: ignored\n").unwrap();
        assert_eq!(value, json!({ "crop": "maize" }));
    }
}
