//! Repository for the `missions` table.
//!
//! Every status write is a guarded transition: the `UPDATE` only matches
//! rows whose current status is an allowed predecessor of the target status,
//! so a terminal mission is never moved again.

use miso_core::types::DbId;
use sqlx::PgPool;

use crate::models::mission::{CreateMission, Mission, MissionListQuery, MissionTask};
use crate::models::status::{MissionStatus, StatusId, TaskStatus};
use crate::repositories::MissionTaskRepo;

/// Column list for `missions` queries.
const COLUMNS: &str = "\
    id, name, status_id, error_message, started_at, completed_at, \
    created_at, updated_at";

/// Maximum page size for mission listing.
const MAX_LIMIT: i64 = 100;

/// Default page size for mission listing.
const DEFAULT_LIMIT: i64 = 50;

/// Provides creation, lookup and status transitions for missions.
pub struct MissionRepo;

impl MissionRepo {
    /// Create a mission together with its full task list.
    ///
    /// Runs in a single transaction: if any task insert fails (for example a
    /// duplicate `step_number`), neither the mission row nor any task row is
    /// committed. Tasks are returned in ascending step order.
    pub async fn create_with_tasks(
        pool: &PgPool,
        input: &CreateMission,
    ) -> Result<(Mission, Vec<MissionTask>), sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO missions (name, status_id) \
             VALUES ($1, $2) \
             RETURNING {COLUMNS}"
        );
        let mission = sqlx::query_as::<_, Mission>(&query)
            .bind(input.name.trim())
            .bind(MissionStatus::Pending.id())
            .fetch_one(&mut *tx)
            .await?;

        let mut tasks = Vec::with_capacity(input.tasks.len());
        for task in &input.tasks {
            tasks.push(MissionTaskRepo::insert_in_tx(&mut tx, mission.id, task).await?);
        }

        tx.commit().await?;

        tasks.sort_by_key(|t| t.step_number);
        Ok((mission, tasks))
    }

    /// Find a mission by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Mission>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM missions WHERE id = $1");
        sqlx::query_as::<_, Mission>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List missions, newest first, with optional status filter and pagination.
    pub async fn list(pool: &PgPool, params: &MissionListQuery) -> Result<Vec<Mission>, sqlx::Error> {
        let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let offset = params.offset.unwrap_or(0).max(0);

        let query = if params.status_id.is_some() {
            format!(
                "SELECT {COLUMNS} FROM missions \
                 WHERE status_id = $1 \
                 ORDER BY id DESC \
                 LIMIT $2 OFFSET $3"
            )
        } else {
            format!(
                "SELECT {COLUMNS} FROM missions \
                 ORDER BY id DESC \
                 LIMIT $1 OFFSET $2"
            )
        };

        let mut q = sqlx::query_as::<_, Mission>(&query);
        if let Some(sid) = params.status_id {
            q = q.bind(sid);
        }
        q.bind(limit).bind(offset).fetch_all(pool).await
    }

    /// Move a `pending` mission to `running`, stamping `started_at`.
    ///
    /// Returns `false` if the mission does not exist or was not pending.
    pub async fn mark_running(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        Self::transition(pool, id, MissionStatus::Running, None).await
    }

    /// Move a `running` mission to `complete`.
    pub async fn mark_complete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        Self::transition(pool, id, MissionStatus::Complete, None).await
    }

    /// Move a non-terminal mission to `error`, recording the halt cause.
    pub async fn mark_error(pool: &PgPool, id: DbId, error: &str) -> Result<bool, sqlx::Error> {
        Self::transition(pool, id, MissionStatus::Error, Some(error)).await
    }

    /// IDs of missions persisted but never started, oldest first.
    ///
    /// A crash between commit and launch leaves such rows behind; startup
    /// hands them back to the runner.
    pub async fn pending_ids(pool: &PgPool) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar("SELECT id FROM missions WHERE status_id = $1 ORDER BY id ASC")
            .bind(MissionStatus::Pending.id())
            .fetch_all(pool)
            .await
    }

    /// Fail every mission still marked `running`, along with its running
    /// tasks. Used at startup: no run survives a process restart, so those
    /// rows would otherwise stay `running` forever.
    ///
    /// Returns the IDs of the missions that were failed.
    pub async fn fail_orphaned_running(
        pool: &PgPool,
        error: &str,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let ids: Vec<DbId> = sqlx::query_scalar(
            "UPDATE missions \
             SET status_id = $1, error_message = $2, completed_at = NOW() \
             WHERE status_id = $3 \
             RETURNING id",
        )
        .bind(MissionStatus::Error.id())
        .bind(error)
        .bind(MissionStatus::Running.id())
        .fetch_all(&mut *tx)
        .await?;

        if !ids.is_empty() {
            sqlx::query(
                "UPDATE mission_tasks \
                 SET status_id = $1, error_message = $2, completed_at = NOW() \
                 WHERE mission_id = ANY($3) AND status_id = $4",
            )
            .bind(TaskStatus::Error.id())
            .bind(error)
            .bind(&ids)
            .bind(TaskStatus::Running.id())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(ids)
    }

    /// Guarded status write shared by the `mark_*` methods.
    async fn transition(
        pool: &PgPool,
        id: DbId,
        to: MissionStatus,
        error: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let from: Vec<StatusId> = to.allowed_predecessors().iter().map(|s| s.id()).collect();

        let result = sqlx::query(
            "UPDATE missions SET \
                 status_id = $2, \
                 error_message = COALESCE($3, error_message), \
                 started_at = CASE WHEN $2 = $5 THEN NOW() ELSE started_at END, \
                 completed_at = CASE WHEN $6 THEN NOW() ELSE completed_at END \
             WHERE id = $1 AND status_id = ANY($4)",
        )
        .bind(id)
        .bind(to.id())
        .bind(error)
        .bind(&from)
        .bind(MissionStatus::Running.id())
        .bind(to.is_terminal())
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
