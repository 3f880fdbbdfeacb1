//! Execution protocol: request/result types, error taxonomy and the executor seam.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

pub mod client;

pub use client::ExecutionClient;

/// One submission to the execution service. Built fresh per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionRequest {
    pub language_id: u32,
    #[serde(rename = "code")]
    pub source_code: String,
    pub stdin: String,
}

impl ExecutionRequest {
    pub fn new(language_id: u32, source_code: impl Into<String>, stdin: impl Into<String>) -> Self {
        Self {
            language_id,
            source_code: source_code.into(),
            stdin: stdin.into(),
        }
    }
}

/// Streams and stats of a run the service accepted. A program may write to
/// both streams; every field is absent when the service did not report it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunOutput {
    pub stdout: Option<String>,
    pub stderr: Option<String>,
    pub elapsed_ms: Option<f64>,
    pub memory_kb: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionResult {
    Success(RunOutput),
    Failure { message: String },
}

impl ExecutionResult {
    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure { message: message.into() }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

impl From<Result<RunOutput, ExecuteError>> for ExecutionResult {
    fn from(res: Result<RunOutput, ExecuteError>) -> Self {
        match res {
            Ok(output) => Self::Success(output),
            Err(e) => Self::failure(e.to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum ExecuteError {
    /// The request never produced a usable HTTP exchange.
    #[error("Network Error: {detail}\n\nMake sure the backend server is running on {base_url}")]
    Transport { detail: String, base_url: String },

    /// The service answered but reported failure, or answered ambiguously.
    #[error("{0}")]
    Service(String),
}

#[async_trait]
pub trait Executor: Send + Sync {
    /// Submit one request and wait for it to settle. Never fails: every
    /// error is folded into [`ExecutionResult::Failure`].
    async fn submit(&self, request: ExecutionRequest) -> ExecutionResult;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_shape() {
        let req = ExecutionRequest::new(71, "print(1)", "");
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(
            v,
            serde_json::json!({ "language_id": 71, "code": "print(1)", "stdin": "" })
        );
    }

    #[test]
    fn test_service_error_message_is_verbatim() {
        let res: ExecutionResult = Err(ExecuteError::Service("Compilation error".into())).into();
        assert_eq!(res, ExecutionResult::failure("Compilation error"));
    }

    #[test]
    fn test_transport_error_message_has_hint() {
        let err = ExecuteError::Transport {
            detail: "connection refused".into(),
            base_url: "http://localhost:8080".into(),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("Network Error: connection refused"));
        assert!(msg.contains("Make sure the backend server is running on http://localhost:8080"));
    }
}
