//! Persistence seam used by the conductor and runner.
//!
//! [`PgMissionStore`] delegates to the `miso-db` repositories. The trait
//! exists so the step loop can be exercised without a database.

use async_trait::async_trait;
use miso_core::types::DbId;
use miso_db::models::agent::Agent;
use miso_db::models::mission::MissionTask;
use miso_db::repositories::{AgentRepo, MissionRepo, MissionTaskRepo};
use miso_db::DbPool;

/// Reads and guarded status writes needed to run a mission.
///
/// Every `bool`-returning write reports whether the guarded transition
/// matched a row.
#[async_trait]
pub trait MissionStore: Send + Sync {
    /// The mission's tasks in ascending `step_number` order.
    async fn tasks_ordered(&self, mission_id: DbId) -> Result<Vec<MissionTask>, sqlx::Error>;

    async fn agent(&self, agent_id: DbId) -> Result<Option<Agent>, sqlx::Error>;

    async fn start_mission(&self, mission_id: DbId) -> Result<bool, sqlx::Error>;
    async fn complete_mission(&self, mission_id: DbId) -> Result<bool, sqlx::Error>;
    async fn fail_mission(&self, mission_id: DbId, error: &str) -> Result<bool, sqlx::Error>;

    async fn start_task(&self, task_id: DbId, effective_input: &str) -> Result<bool, sqlx::Error>;
    async fn complete_task(&self, task_id: DbId, output: &str) -> Result<bool, sqlx::Error>;
    async fn fail_task(&self, task_id: DbId, error: &str) -> Result<bool, sqlx::Error>;

    /// Fail any task of the mission still left `running`.
    async fn fail_running_tasks(&self, mission_id: DbId, error: &str) -> Result<u64, sqlx::Error>;
}

/// Postgres-backed [`MissionStore`].
#[derive(Clone)]
pub struct PgMissionStore {
    pool: DbPool,
}

impl PgMissionStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MissionStore for PgMissionStore {
    async fn tasks_ordered(&self, mission_id: DbId) -> Result<Vec<MissionTask>, sqlx::Error> {
        MissionTaskRepo::list_by_mission(&self.pool, mission_id).await
    }

    async fn agent(&self, agent_id: DbId) -> Result<Option<Agent>, sqlx::Error> {
        AgentRepo::find_by_id(&self.pool, agent_id).await
    }

    async fn start_mission(&self, mission_id: DbId) -> Result<bool, sqlx::Error> {
        MissionRepo::mark_running(&self.pool, mission_id).await
    }

    async fn complete_mission(&self, mission_id: DbId) -> Result<bool, sqlx::Error> {
        MissionRepo::mark_complete(&self.pool, mission_id).await
    }

    async fn fail_mission(&self, mission_id: DbId, error: &str) -> Result<bool, sqlx::Error> {
        MissionRepo::mark_error(&self.pool, mission_id, error).await
    }

    async fn start_task(&self, task_id: DbId, effective_input: &str) -> Result<bool, sqlx::Error> {
        MissionTaskRepo::start(&self.pool, task_id, effective_input).await
    }

    async fn complete_task(&self, task_id: DbId, output: &str) -> Result<bool, sqlx::Error> {
        MissionTaskRepo::complete(&self.pool, task_id, output).await
    }

    async fn fail_task(&self, task_id: DbId, error: &str) -> Result<bool, sqlx::Error> {
        MissionTaskRepo::fail(&self.pool, task_id, error).await
    }

    async fn fail_running_tasks(&self, mission_id: DbId, error: &str) -> Result<u64, sqlx::Error> {
        MissionTaskRepo::fail_running_for_mission(&self.pool, mission_id, error).await
    }
}
