use std::str::FromStr;
use std::time::Duration;

use miso_pipeline::executor::ExecutorConfig;
use miso_pipeline::generation::{GeminiConfig, DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL};

/// An environment variable was set to a value that does not parse.
#[derive(Debug, thiserror::Error)]
#[error("{key} has an invalid value: '{value}'")]
pub struct ConfigError {
    pub key: &'static str,
    pub value: String,
}

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long shutdown waits for in-flight mission runs (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Approve missions when the policy reviewer is unavailable.
    pub policy_bypass: bool,
    /// Gemini API key. Without it there is no local generation capability
    /// and no bundled policy reviewer.
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    /// Port appended to remote runtimes that do not name one (default: `8000`).
    pub remote_executor_port: u16,
    /// Timeout of a single remote `/execute` call (default: `300`).
    pub remote_execution_timeout_secs: u64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                         | Default                    |
    /// |---------------------------------|----------------------------|
    /// | `HOST`                          | `0.0.0.0`                  |
    /// | `PORT`                          | `3000`                     |
    /// | `CORS_ORIGINS`                  | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`          | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS`         | `30`                       |
    /// | `POLICY_BYPASS`                 | `false`                    |
    /// | `GEMINI_API_KEY`                | unset                      |
    /// | `GEMINI_MODEL`                  | `gemini-1.5-pro-latest`    |
    /// | `GEMINI_BASE_URL`               | public v1beta endpoint     |
    /// | `REMOTE_EXECUTOR_PORT`          | `8000`                     |
    /// | `REMOTE_EXECUTION_TIMEOUT_SECS` | `300`                      |
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port = parse_var("PORT", 3000)?;

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs = parse_var("REQUEST_TIMEOUT_SECS", 30)?;
        let shutdown_timeout_secs = parse_var("SHUTDOWN_TIMEOUT_SECS", 30)?;
        let policy_bypass = parse_flag("POLICY_BYPASS")?;

        let gemini_api_key = std::env::var("GEMINI_API_KEY")
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
        let gemini_model =
            std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_GEMINI_MODEL.into());
        let gemini_base_url =
            std::env::var("GEMINI_BASE_URL").unwrap_or_else(|_| DEFAULT_GEMINI_BASE_URL.into());

        let remote_executor_port = parse_var("REMOTE_EXECUTOR_PORT", 8000)?;
        let remote_execution_timeout_secs = parse_var("REMOTE_EXECUTION_TIMEOUT_SECS", 300)?;

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            policy_bypass,
            gemini_api_key,
            gemini_model,
            gemini_base_url,
            remote_executor_port,
            remote_execution_timeout_secs,
        })
    }

    /// Gemini client settings, if an API key is configured.
    pub fn gemini(&self) -> Option<GeminiConfig> {
        self.gemini_api_key.as_ref().map(|key| GeminiConfig {
            api_key: key.clone(),
            model: self.gemini_model.clone(),
            base_url: self.gemini_base_url.clone(),
        })
    }

    pub fn executor(&self) -> ExecutorConfig {
        ExecutorConfig {
            default_port: self.remote_executor_port,
            timeout: Duration::from_secs(self.remote_execution_timeout_secs),
        }
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

fn parse_var<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError { key, value }),
        Err(_) => Ok(default),
    }
}

/// Boolean flags accept `true/false`, `1/0`, `yes/no` (case-insensitive).
fn parse_flag(key: &'static str) -> Result<bool, ConfigError> {
    let Ok(value) = std::env::var(key) else {
        return Ok(false);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" | "" => Ok(false),
        _ => Err(ConfigError { key, value }),
    }
}
