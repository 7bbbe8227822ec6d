//! Remote agent runner client.
//!
//! Every remote executor exposes `POST /execute` taking
//! `{command, input}` and answering `{output}`. A single attempt is made per
//! step; there is no retry. The client carries a bounded timeout so a hung
//! runner cannot stall a mission forever.

use std::time::Duration;

use miso_core::agent_target::{remote_execute_url, DEFAULT_EXECUTOR_PORT};
use serde::{Deserialize, Serialize};

use crate::error::ExecutionError;

/// Default timeout for a single remote execution.
pub const DEFAULT_EXECUTION_TIMEOUT: Duration = Duration::from_secs(300);

/// Settings for [`RemoteExecutor`].
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Port appended to runtime hosts that do not name one.
    pub default_port: u16,
    /// Upper bound on a single `/execute` call.
    pub timeout: Duration,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            default_port: DEFAULT_EXECUTOR_PORT,
            timeout: DEFAULT_EXECUTION_TIMEOUT,
        }
    }
}

#[derive(Serialize)]
struct ExecuteRequest<'a> {
    command: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct ExecuteResponse {
    output: String,
}

/// Error body sent by runners along with a non-2xx status.
#[derive(Deserialize)]
struct RunnerFailure {
    error: String,
}

/// Upper bound on the runner output kept in an error message.
const MAX_DETAIL_CHARS: usize = 2000;

/// Extract what a failed runner reported: its `error` field when the body is
/// the usual JSON, the trimmed body otherwise.
fn failure_detail(body: &str) -> Option<String> {
    let detail = match serde_json::from_str::<RunnerFailure>(body) {
        Ok(failure) => failure.error,
        Err(_) => body.to_string(),
    };
    let detail = detail.trim();
    if detail.is_empty() {
        return None;
    }
    Some(detail.chars().take(MAX_DETAIL_CHARS).collect())
}

/// HTTP client for remote agent runners.
pub struct RemoteExecutor {
    client: reqwest::Client,
    default_port: u16,
}

impl RemoteExecutor {
    pub fn new(config: ExecutorConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            default_port: config.default_port,
        })
    }

    /// Run `command` on the runner at `host` with `input` on its stdin.
    pub async fn execute(
        &self,
        host: &str,
        command: &str,
        input: &str,
    ) -> Result<String, ExecutionError> {
        let url = remote_execute_url(host, self.default_port);

        tracing::debug!(runtime = host, %url, "Routing step to agent runner");

        let response = self
            .client
            .post(&url)
            .json(&ExecuteRequest { command, input })
            .send()
            .await
            .map_err(|source| ExecutionError::RemoteTransport {
                runtime: host.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExecutionError::RemoteStatus {
                runtime: host.to_string(),
                status: status.as_u16(),
                detail: failure_detail(&body),
            });
        }

        let body: ExecuteResponse =
            response
                .json()
                .await
                .map_err(|source| ExecutionError::RemoteResponse {
                    runtime: host.to_string(),
                    source,
                })?;
        Ok(body.output)
    }
}
