//! Mission and mission task models and DTOs.

use miso_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::status::{mission_status_name, task_status_name, StatusId};

/// A row from the `missions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Mission {
    pub id: DbId,
    pub name: String,
    pub status_id: StatusId,
    pub error_message: Option<String>,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `mission_tasks` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MissionTask {
    pub id: DbId,
    pub mission_id: DbId,
    pub agent_id: DbId,
    pub step_number: i32,
    pub status_id: StatusId,
    pub input_data: Option<String>,
    pub output_data: Option<String>,
    pub error_message: Option<String>,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// One step of a mission submission.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMissionTask {
    pub agent_id: DbId,
    pub step_number: i32,
    pub input_data: Option<String>,
}

/// DTO for submitting a mission via `POST /api/v1/missions`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMission {
    pub name: String,
    #[serde(default)]
    pub tasks: Vec<CreateMissionTask>,
}

/// Query parameters for `GET /api/v1/missions`.
#[derive(Debug, Default, Deserialize)]
pub struct MissionListQuery {
    /// Filter by status ID (e.g. 2 = running, 4 = error).
    pub status_id: Option<StatusId>,
    /// Maximum number of results. Defaults to 50, capped at 100.
    pub limit: Option<i64>,
    /// Number of results to skip. Defaults to 0.
    pub offset: Option<i64>,
}

/// A mission row together with its human-readable status.
#[derive(Debug, Clone, Serialize)]
pub struct MissionSummary {
    #[serde(flatten)]
    pub mission: Mission,
    pub status: &'static str,
}

impl From<Mission> for MissionSummary {
    fn from(mission: Mission) -> Self {
        let status = mission_status_name(mission.status_id);
        Self { mission, status }
    }
}

/// A task row together with its human-readable status.
#[derive(Debug, Clone, Serialize)]
pub struct TaskSummary {
    #[serde(flatten)]
    pub task: MissionTask,
    pub status: &'static str,
}

impl From<MissionTask> for TaskSummary {
    fn from(task: MissionTask) -> Self {
        let status = task_status_name(task.status_id);
        Self { task, status }
    }
}

/// Polling view of a mission: the mission and its tasks in step order.
#[derive(Debug, Clone, Serialize)]
pub struct MissionWithTasks {
    #[serde(flatten)]
    pub mission: MissionSummary,
    pub tasks: Vec<TaskSummary>,
}

impl MissionWithTasks {
    pub fn new(mission: Mission, tasks: Vec<MissionTask>) -> Self {
        Self {
            mission: mission.into(),
            tasks: tasks.into_iter().map(TaskSummary::from).collect(),
        }
    }
}
