use miso_core::types::DbId;

/// Failure of the local generation capability.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The generation API returned a non-2xx status code.
    #[error("Generation API returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// The response carried no candidate text.
    #[error("Generation API returned no text")]
    EmptyResponse,
}

/// Failure to obtain a policy decision. Never a veto.
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("Policy reviewer is not configured")]
    NotConfigured,

    #[error("Policy reviewer unavailable: {0}")]
    Unavailable(#[from] GenerationError),
}

/// Failure of a single step's execution, local or remote.
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error("Local generation capability is not configured")]
    LocalUnavailable,

    #[error("Local generation failed: {0}")]
    Generation(#[from] GenerationError),

    /// `detail` is the runner's `error` field, or its raw body.
    #[error("Agent runner {runtime} failed with status {status}{}", detail_suffix(.detail))]
    RemoteStatus {
        runtime: String,
        status: u16,
        detail: Option<String>,
    },

    #[error("Agent runner {runtime} unreachable: {source}")]
    RemoteTransport {
        runtime: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Agent runner {runtime} returned an invalid response: {source}")]
    RemoteResponse {
        runtime: String,
        #[source]
        source: reqwest::Error,
    },
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail.as_deref().map(|d| format!(": {d}")).unwrap_or_default()
}

/// Why a mission halted on a step. Fatal to the mission, recorded on the
/// failing task and the mission.
#[derive(Debug, thiserror::Error)]
pub enum StepFailure {
    #[error("Agent with ID {agent_id} not found")]
    AgentNotFound { agent_id: DbId },

    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

/// Failure of a mission run itself, as opposed to one of its steps.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The mission was not `pending` when the run started (already run, or
    /// missing).
    #[error("Mission {0} is not pending")]
    NotPending(DbId),

    /// A guarded status write matched no row mid-run.
    #[error("{entity} {id} could not move to {to}")]
    TransitionRejected {
        entity: &'static str,
        id: DbId,
        to: &'static str,
    },
}

impl PipelineError {
    /// Turn the result of a guarded write into an error when it missed.
    pub(crate) fn require(
        applied: bool,
        entity: &'static str,
        id: DbId,
        to: &'static str,
    ) -> Result<(), Self> {
        if applied {
            Ok(())
        } else {
            Err(Self::TransitionRejected { entity, id, to })
        }
    }
}
