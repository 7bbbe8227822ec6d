//! Resolution of an agent's runtime class into an execution target.
//!
//! The `runtime` column of the `agents` table is a single string that either
//! names the in-process generation capability ([`LOCAL_RUNTIME`]) or the
//! network address of a remote executor. [`AgentTarget::resolve`] is the only
//! place that interprets it.

use std::fmt;

use crate::error::CoreError;

/// Runtime class designating the local generation capability.
pub const LOCAL_RUNTIME: &str = "MISO_AI";

/// Port appended to remote executor hosts that do not name one.
pub const DEFAULT_EXECUTOR_PORT: u16 = 8000;

/// Path of the execution endpoint exposed by every remote executor.
pub const EXECUTE_PATH: &str = "/execute";

/// Where a step bound to an agent is executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentTarget {
    /// The in-process generation capability.
    Local,
    /// A remote executor reachable at the given host (optionally `host:port`
    /// or a full `http(s)://` base URL).
    Remote(String),
}

impl AgentTarget {
    /// Resolve a runtime class string into a target.
    ///
    /// Matching against [`LOCAL_RUNTIME`] is case-insensitive; surrounding
    /// whitespace is ignored. Anything else is treated as a remote host.
    pub fn resolve(runtime: &str) -> Self {
        let runtime = runtime.trim();
        if runtime.eq_ignore_ascii_case(LOCAL_RUNTIME) {
            AgentTarget::Local
        } else {
            AgentTarget::Remote(runtime.to_string())
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, AgentTarget::Local)
    }
}

impl fmt::Display for AgentTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentTarget::Local => f.write_str(LOCAL_RUNTIME),
            AgentTarget::Remote(host) => f.write_str(host),
        }
    }
}

/// Execution URL for a remote runtime host.
pub fn remote_execute_url(host: &str, default_port: u16) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        return format!("{host}{EXECUTE_PATH}");
    }
    if has_explicit_port(host) {
        format!("http://{host}{EXECUTE_PATH}")
    } else {
        format!("http://{host}:{default_port}{EXECUTE_PATH}")
    }
}

/// `true` when the authority ends in `:<digits>`.
fn has_explicit_port(host: &str) -> bool {
    match host.rsplit_once(':') {
        Some((name, port)) => {
            !name.is_empty() && !port.is_empty() && port.chars().all(|c| c.is_ascii_digit())
        }
        None => false,
    }
}

/// Validate a runtime class string at registration time.
///
/// Rejects empty values and values containing whitespace or a path, since
/// those can never form a valid executor address.
pub fn validate_runtime(runtime: &str) -> Result<(), CoreError> {
    let runtime = runtime.trim();
    if runtime.is_empty() {
        return Err(CoreError::Validation("runtime must not be empty".to_string()));
    }
    if AgentTarget::resolve(runtime).is_local() {
        return Ok(());
    }
    let authority = runtime
        .strip_prefix("http://")
        .or_else(|| runtime.strip_prefix("https://"))
        .unwrap_or(runtime)
        .trim_end_matches('/');
    if authority.is_empty() || authority.contains(char::is_whitespace) || authority.contains('/')
    {
        return Err(CoreError::Validation(format!(
            "runtime '{runtime}' is neither {LOCAL_RUNTIME} nor a valid executor host"
        )));
    }
    Ok(())
}
