//! JSON summary line for scripted callers.

use std::io::{self, Write};

use serde::Serialize;
use serde_json::json;

use crate::config::ConfigError;
use crate::pipeline::{PipelineError, PipelineReport};

/// Kind of summary event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JsonEventType {
    BuildFinished,
    BuildFailed,
    CopyFailed,
    ConfigInvalid,
}

/// A JSON event written as one line to stdout.
#[derive(Debug, Clone, Serialize)]
pub struct JsonEvent {
    pub event: JsonEventType,
    pub timestamp: String,
    pub data: serde_json::Value,
}

impl JsonEvent {
    /// Create a new JSON event with the current timestamp.
    pub fn new(event: JsonEventType, data: serde_json::Value) -> Self {
        Self {
            event,
            timestamp: chrono::Utc::now().to_rfc3339(),
            data,
        }
    }

    /// Event for a completed pipeline.
    pub fn finished(report: &PipelineReport) -> Self {
        let data =
            serde_json::to_value(report).unwrap_or_else(|e| json!({ "error": e.to_string() }));
        Self::new(JsonEventType::BuildFinished, data)
    }

    /// Event for a failed pipeline.
    pub fn failed(err: &PipelineError) -> Self {
        match err {
            PipelineError::Build(run_error) => Self::new(
                JsonEventType::BuildFailed,
                json!({
                    "error": err.to_string(),
                    "failures": run_error.outcome().map(|o| &o.failures),
                }),
            ),
            PipelineError::Collect(_) | PipelineError::Aborted(_) => Self::new(
                JsonEventType::CopyFailed,
                json!({ "error": err.to_string() }),
            ),
        }
    }

    /// Event for arguments that could not be turned into a configuration.
    pub fn config_invalid(err: &ConfigError) -> Self {
        Self::new(JsonEventType::ConfigInvalid, json!({ "error": err.to_string() }))
    }

    /// Write this event as a JSON line to stdout.
    pub fn emit(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            let mut stdout = io::stdout().lock();
            let _ = writeln!(stdout, "{}", json);
            let _ = stdout.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use buildrun_core::{BuildOutcome, TaskResult, TaskStatus};
    use buildrun_runner::{CollectError, RunError};
    use chrono::Utc;

    #[test]
    fn test_build_failed_event() {
        let now = Utc::now();
        let outcome = BuildOutcome::from_results(vec![TaskResult {
            name: "client".to_string(),
            index: 0,
            command: "exit 1".to_string(),
            status: TaskStatus::Failed,
            exit_code: Some(1),
            attempts: 2,
            started_at: now,
            finished_at: now,
            error: None,
        }]);
        let err = PipelineError::Build(RunError::TasksFailed(outcome));

        let event = JsonEvent::failed(&err);
        let value = serde_json::to_value(&event).unwrap();

        assert_eq!(value["event"], "build_failed");
        assert_eq!(value["data"]["failures"][0]["name"], "client");
        assert_eq!(value["data"]["failures"][0]["status"], "FAILED");
        assert_eq!(value["data"]["failures"][0]["exit_code"], 1);
    }

    #[test]
    fn test_copy_failed_event() {
        let err = PipelineError::Collect(CollectError::SourceMissing("client/dist".into()));
        let value = serde_json::to_value(JsonEvent::failed(&err)).unwrap();
        assert_eq!(value["event"], "copy_failed");
        assert_eq!(
            value["data"]["error"],
            "Copy failed: Source directory not found: client/dist"
        );
    }
}
