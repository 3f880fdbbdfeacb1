//! Reqwest-based client for the remote execution service.

use std::{error::Error as _, time::Duration};

use anyhow::{bail, Result};
use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, CONTENT_TYPE},
    Client, StatusCode,
};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::{ExecuteError, ExecutionRequest, ExecutionResult, Executor, RunOutput};
use crate::config::Config;

const EXECUTE_PATH: &str = "/api/v1/execute";
const HEALTH_PATH: &str = "/api/v1/health";
const GENERIC_FAILURE: &str = "Execution failed";

/// Response envelope of `POST /api/v1/execute`.
#[derive(Debug, Deserialize)]
struct ServiceReply {
    success: bool,
    #[serde(default)]
    output: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    execution_time: Option<f64>,
    #[serde(default, deserialize_with = "lenient_kb")]
    memory_kb: Option<u64>,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthReport {
    pub status: String,
    #[serde(default)]
    pub redis: Option<String>,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub judge0: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ExecutionClient {
    http: Client,
    base_url: String,
}

impl ExecutionClient {
    pub fn from_config(cfg: &Config) -> Result<Self> {
        Self::new(&cfg.api_url(), Duration::from_secs(cfg.request_timeout_secs()))
    }

    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn transport_error(&self, err: reqwest::Error) -> ExecuteError {
        ExecuteError::Transport {
            detail: error_chain(&err),
            base_url: self.base_url.clone(),
        }
    }

    /// Issue one execution request and classify the reply. No retries.
    pub async fn try_submit(&self, request: &ExecutionRequest) -> Result<RunOutput, ExecuteError> {
        let url = format!("{}{}", self.base_url, EXECUTE_PATH);
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        tracing::info!(
            language_id = request.language_id,
            code_len = request.source_code.len(),
            "submitting execution request"
        );

        let resp = self
            .http
            .post(&url)
            .headers(headers)
            .json(request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| self.transport_error(e))?;
        let outcome = classify(status, &body);

        match &outcome {
            Ok(_) => tracing::debug!(%status, "execution succeeded"),
            Err(e) => tracing::warn!(%status, error = %e, "execution reported failure"),
        }
        outcome
    }

    pub async fn health(&self) -> Result<HealthReport> {
        let url = format!("{}{}", self.base_url, HEALTH_PATH);
        let resp = self.http.get(&url).send().await?;
        match resp.status() {
            StatusCode::OK => Ok(resp.json::<HealthReport>().await?),
            status => {
                let text = resp.text().await.unwrap_or_default();
                bail!("Health check failed: {} - {}", status, text)
            }
        }
    }
}

#[async_trait]
impl Executor for ExecutionClient {
    async fn submit(&self, request: ExecutionRequest) -> ExecutionResult {
        self.try_submit(&request).await.into()
    }
}

/// Map an HTTP exchange onto the result model.
///
/// The envelope decides the outcome even on non-2xx statuses, since the
/// service reports rejections (rate limiting, validation) that way.
fn classify(status: StatusCode, body: &str) -> Result<RunOutput, ExecuteError> {
    let reply = match serde_json::from_str::<ServiceReply>(body) {
        Ok(reply) => reply,
        Err(e) if status.is_success() => {
            tracing::debug!(error = %e, "unparsable execution reply");
            return Err(ExecuteError::Service(format!(
                "{GENERIC_FAILURE}: malformed response from execution service"
            )));
        }
        Err(_) => {
            return Err(ExecuteError::Service(format!(
                "{GENERIC_FAILURE}: execution service responded with {status}"
            )));
        }
    };

    if let Some(s) = &reply.status {
        tracing::debug!(service_status = %s, "execution service status");
    }

    if !reply.success {
        return Err(ExecuteError::Service(
            reply.error.unwrap_or_else(|| GENERIC_FAILURE.to_string()),
        ));
    }

    Ok(RunOutput {
        stdout: reply.output,
        stderr: reply.error,
        elapsed_ms: reply.execution_time.map(round2),
        memory_kb: reply.memory_kb,
    })
}

/// Join an error and its sources, e.g. "error sending request: tcp connect
/// error: Connection refused (os error 111)".
fn error_chain(err: &reqwest::Error) -> String {
    let mut detail = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !detail.contains(&text) {
            detail.push_str(": ");
            detail.push_str(&text);
        }
        source = cause.source();
    }
    detail
}

// Stats are advisory; a value of the wrong shape is dropped instead of
// failing the whole reply.
fn lenient_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    Ok(value.and_then(|v| v.as_f64()).filter(|v| v.is_finite()))
}

fn lenient_kb<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    Ok(value.and_then(|v| match v.as_u64() {
        Some(kb) => Some(kb),
        None => v.as_f64().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f.round() as u64),
    }))
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn classify_ok(body: serde_json::Value) -> Result<RunOutput, ExecuteError> {
        classify(StatusCode::OK, &body.to_string())
    }

    #[test]
    fn test_success_with_stats() {
        let out = classify_ok(json!({
            "success": true, "output": "hi\n", "execution_time": 12.345, "memory_kb": 256
        }))
        .unwrap();
        assert_eq!(out.stdout.as_deref(), Some("hi\n"));
        assert_eq!(out.stderr, None);
        assert_eq!(out.elapsed_ms, Some(12.35));
        assert_eq!(out.memory_kb, Some(256));
    }

    #[test]
    fn test_success_carries_both_streams() {
        let out = classify_ok(json!({
            "success": true, "output": "partial", "error": "warning: unused variable"
        }))
        .unwrap();
        assert_eq!(out.stdout.as_deref(), Some("partial"));
        assert_eq!(out.stderr.as_deref(), Some("warning: unused variable"));
    }

    #[test]
    fn test_bare_success() {
        let out = classify_ok(json!({ "success": true })).unwrap();
        assert_eq!(out, RunOutput::default());
    }

    #[test]
    fn test_failure_uses_error_text() {
        let err = classify_ok(json!({ "success": false, "error": "Compilation error" })).unwrap_err();
        assert_eq!(err.to_string(), "Compilation error");
    }

    #[test]
    fn test_failure_without_error_text() {
        let err = classify_ok(json!({ "success": false })).unwrap_err();
        assert_eq!(err.to_string(), "Execution failed");
    }

    #[test]
    fn test_missing_success_flag_is_failure() {
        let err = classify_ok(json!({ "output": "hi" })).unwrap_err();
        assert!(matches!(err, ExecuteError::Service(_)));
        assert!(err.to_string().starts_with("Execution failed"));
    }

    #[test]
    fn test_malformed_json_is_failure() {
        let err = classify(StatusCode::OK, "<html>oops</html>").unwrap_err();
        assert!(err.to_string().contains("malformed response"));
    }

    #[test]
    fn test_error_status_with_envelope_uses_envelope() {
        let body = json!({ "success": false, "error": "Rate limit exceeded" }).to_string();
        let err = classify(StatusCode::TOO_MANY_REQUESTS, &body).unwrap_err();
        assert_eq!(err.to_string(), "Rate limit exceeded");
    }

    #[test]
    fn test_error_status_without_envelope_names_status() {
        let err = classify(StatusCode::BAD_GATEWAY, "upstream down").unwrap_err();
        assert!(err.to_string().contains("502"));
    }

    #[test]
    fn test_odd_stats_keep_the_output() {
        let out = classify_ok(json!({
            "success": true, "output": "hi", "memory_kb": 256.0, "execution_time": "fast"
        }))
        .unwrap();
        assert_eq!(out.stdout.as_deref(), Some("hi"));
        assert_eq!(out.memory_kb, Some(256));
        assert_eq!(out.elapsed_ms, None);

        let out = classify_ok(json!({ "success": true, "output": "hi", "memory_kb": -1 })).unwrap();
        assert_eq!(out.stdout.as_deref(), Some("hi"));
        assert_eq!(out.memory_kb, None);
    }

    #[test]
    fn test_null_stats_are_absent() {
        let out = classify_ok(json!({ "success": true, "execution_time": null, "memory_kb": null })).unwrap();
        assert_eq!(out, RunOutput::default());
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(0.0), 0.0);
        assert_eq!(round2(1.004), 1.0);
        assert_eq!(round2(3.14159), 3.14);
    }

    #[tokio::test]
    async fn test_submit_posts_contract_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/execute"))
            .and(header("Content-Type", "application/json"))
            .and(body_json(json!({ "language_id": 71, "code": "print('hi')", "stdin": "" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true, "output": "hi\n", "execution_time": 12.345, "memory_kb": 256
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ExecutionClient::new(&server.uri(), Duration::from_secs(5)).unwrap();
        let result = client
            .submit(ExecutionRequest::new(71, "print('hi')", ""))
            .await;

        assert_eq!(
            result,
            ExecutionResult::Success(RunOutput {
                stdout: Some("hi\n".into()),
                stderr: None,
                elapsed_ms: Some(12.35),
                memory_kb: Some(256),
            })
        );
    }

    #[tokio::test]
    async fn test_submit_trailing_slash_base_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/execute"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": false, "error": "Compilation error"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ExecutionClient::new(&format!("{}/", server.uri()), Duration::from_secs(5)).unwrap();
        let result = client.submit(ExecutionRequest::new(50, "int main(", "")).await;
        assert_eq!(result, ExecutionResult::failure("Compilation error"));
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_failure() {
        // Bind then drop to get a local port with nothing listening.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let base = format!("http://127.0.0.1:{port}");
        let client = ExecutionClient::new(&base, Duration::from_secs(5)).unwrap();

        let err = client
            .try_submit(&ExecutionRequest::new(71, "print(1)", ""))
            .await
            .unwrap_err();
        assert!(matches!(err, ExecuteError::Transport { .. }));

        match client.submit(ExecutionRequest::new(71, "print(1)", "")).await {
            ExecutionResult::Failure { message } => {
                assert!(message.starts_with("Network Error:"), "got: {message}");
                assert!(message.to_lowercase().contains("refused"), "cause missing: {message}");
                assert!(message.contains("Make sure the backend server is running"));
                assert!(message.contains(&base));
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_health_report() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "healthy", "redis": "connected", "database": "disconnected", "judge0": "unknown"
            })))
            .mount(&server)
            .await;

        let client = ExecutionClient::new(&server.uri(), Duration::from_secs(5)).unwrap();
        let report = client.health().await.unwrap();
        assert_eq!(report.status, "healthy");
        assert_eq!(report.redis.as_deref(), Some("connected"));
    }

    #[tokio::test]
    async fn test_health_non_ok_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/health"))
            .respond_with(ResponseTemplate::new(503).set_body_string("down"))
            .mount(&server)
            .await;

        let client = ExecutionClient::new(&server.uri(), Duration::from_secs(5)).unwrap();
        let err = client.health().await.unwrap_err();
        assert!(err.to_string().contains("503"));
    }
}
