//! Repository for the `agents` table.

use miso_core::types::DbId;
use sqlx::PgPool;

use crate::models::agent::{Agent, CreateAgent, AGENT_STATUS_IDLE};

/// Column list for `agents` queries.
const COLUMNS: &str = "id, name, purpose, runtime, command, status, created_at, updated_at";

/// Provides registration and lookup for agents.
pub struct AgentRepo;

impl AgentRepo {
    /// Register a new agent. The runtime is stored trimmed; the informational
    /// status starts as `idle`.
    pub async fn create(pool: &PgPool, input: &CreateAgent) -> Result<Agent, sqlx::Error> {
        let query = format!(
            "INSERT INTO agents (name, purpose, runtime, command, status) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Agent>(&query)
            .bind(input.name.trim())
            .bind(&input.purpose)
            .bind(input.runtime.trim())
            .bind(&input.command)
            .bind(AGENT_STATUS_IDLE)
            .fetch_one(pool)
            .await
    }

    /// Find an agent by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Agent>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM agents WHERE id = $1");
        sqlx::query_as::<_, Agent>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all registered agents, oldest first.
    pub async fn list(pool: &PgPool) -> Result<Vec<Agent>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM agents ORDER BY id");
        sqlx::query_as::<_, Agent>(&query).fetch_all(pool).await
    }
}
