//! Agent registry models.

use miso_core::agent_target::AgentTarget;
use miso_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Default informational status for newly registered agents.
pub const AGENT_STATUS_IDLE: &str = "idle";

/// A row from the `agents` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Agent {
    pub id: DbId,
    pub name: String,
    pub purpose: Option<String>,
    pub runtime: String,
    pub command: Option<String>,
    pub status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Agent {
    /// Resolve where steps bound to this agent execute.
    pub fn target(&self) -> AgentTarget {
        AgentTarget::resolve(&self.runtime)
    }

    /// Command passed to remote executors; empty when none was registered.
    pub fn command_or_empty(&self) -> &str {
        self.command.as_deref().unwrap_or_default()
    }
}

/// DTO for registering a new agent via `POST /api/v1/agents`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAgent {
    pub name: String,
    pub purpose: Option<String>,
    pub runtime: String,
    pub command: Option<String>,
}
