//! Repository for the `mission_tasks` table.
//!
//! Uses `TaskStatus` from `models::status` for all status transitions.
//! Each write is keyed by the task's primary key and guarded by its expected
//! current status.

use miso_core::types::DbId;
use sqlx::PgPool;

use crate::models::mission::{CreateMissionTask, MissionTask};
use crate::models::status::TaskStatus;

/// Column list for `mission_tasks` queries.
const COLUMNS: &str = "\
    id, mission_id, agent_id, step_number, status_id, \
    input_data, output_data, error_message, started_at, completed_at, \
    created_at, updated_at";

/// Provides ordered reads and status transitions for mission tasks.
pub struct MissionTaskRepo;

impl MissionTaskRepo {
    /// Insert one pending task inside the mission-creation transaction.
    pub(crate) async fn insert_in_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        mission_id: DbId,
        input: &CreateMissionTask,
    ) -> Result<MissionTask, sqlx::Error> {
        let query = format!(
            "INSERT INTO mission_tasks (mission_id, agent_id, step_number, status_id, input_data) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, MissionTask>(&query)
            .bind(mission_id)
            .bind(input.agent_id)
            .bind(input.step_number)
            .bind(TaskStatus::Pending.id())
            .bind(&input.input_data)
            .fetch_one(&mut **tx)
            .await
    }

    /// List a mission's tasks in ascending `step_number` order.
    pub async fn list_by_mission(
        pool: &PgPool,
        mission_id: DbId,
    ) -> Result<Vec<MissionTask>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM mission_tasks \
             WHERE mission_id = $1 \
             ORDER BY step_number ASC"
        );
        sqlx::query_as::<_, MissionTask>(&query)
            .bind(mission_id)
            .fetch_all(pool)
            .await
    }

    /// Find a task by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<MissionTask>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM mission_tasks WHERE id = $1");
        sqlx::query_as::<_, MissionTask>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Move a `pending` task to `running`, replacing `input_data` with the
    /// effective input it is executed with.
    pub async fn start(pool: &PgPool, id: DbId, effective_input: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE mission_tasks \
             SET status_id = $2, input_data = $3, started_at = NOW() \
             WHERE id = $1 AND status_id = $4",
        )
        .bind(id)
        .bind(TaskStatus::Running.id())
        .bind(effective_input)
        .bind(TaskStatus::Pending.id())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Move a `running` task to `complete` with its output.
    ///
    /// `output_data` is only ever written here, so it is set exactly once.
    pub async fn complete(pool: &PgPool, id: DbId, output: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE mission_tasks \
             SET status_id = $2, output_data = $3, completed_at = NOW() \
             WHERE id = $1 AND status_id = $4",
        )
        .bind(id)
        .bind(TaskStatus::Complete.id())
        .bind(output)
        .bind(TaskStatus::Running.id())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Move a `pending` or `running` task to `error` with the failure cause.
    pub async fn fail(pool: &PgPool, id: DbId, error: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE mission_tasks \
             SET status_id = $2, error_message = $3, completed_at = NOW() \
             WHERE id = $1 AND status_id IN ($4, $5)",
        )
        .bind(id)
        .bind(TaskStatus::Error.id())
        .bind(error)
        .bind(TaskStatus::Pending.id())
        .bind(TaskStatus::Running.id())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Fail whichever of a mission's tasks are still `running`.
    ///
    /// Used when a run dies without reaching its own failure path, so the
    /// interrupted step does not stay `running`. Returns the number of rows
    /// updated.
    pub async fn fail_running_for_mission(
        pool: &PgPool,
        mission_id: DbId,
        error: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE mission_tasks \
             SET status_id = $2, error_message = $3, completed_at = NOW() \
             WHERE mission_id = $1 AND status_id = $4",
        )
        .bind(mission_id)
        .bind(TaskStatus::Error.id())
        .bind(error)
        .bind(TaskStatus::Running.id())
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
