//! Handlers for the `/missions` resource.
//!
//! Submission validates the request, consults the policy gate, persists the
//! mission and its tasks atomically and hands the run to the background
//! runner. The response is sent before any step executes; clients poll
//! `GET /missions/{id}` for progress.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use miso_core::error::CoreError;
use miso_core::mission::{validate_name, validate_step_numbers};
use miso_core::types::DbId;
use miso_db::models::mission::{CreateMission, MissionListQuery, MissionSummary, MissionWithTasks};
use miso_db::repositories::{MissionRepo, MissionTaskRepo};

use crate::error::{AppError, AppResult};
use crate::response::{CreatedResponse, DataResponse};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Submit
// ---------------------------------------------------------------------------

/// POST /api/v1/missions
///
/// Returns 201 with the mission ID once the mission is persisted. A veto
/// answers 403 with the decision and an unavailable reviewer 503; neither
/// writes anything.
pub async fn create_mission(
    State(state): State<AppState>,
    Json(input): Json<CreateMission>,
) -> AppResult<impl IntoResponse> {
    validate_mission(&input)?;

    let decision = state.policy_gate.check(&input.name).await?;
    if !decision.approved {
        tracing::warn!(
            mission = %input.name,
            justification = %decision.justification,
            "Mission vetoed",
        );
        return Err(AppError::PolicyRejected(decision));
    }

    let (mission, tasks) = MissionRepo::create_with_tasks(&state.pool, &input).await?;

    tracing::info!(
        mission_id = mission.id,
        name = %mission.name,
        task_count = tasks.len(),
        "Mission created",
    );

    if !state.runner.launch(mission.id) {
        tracing::warn!(mission_id = mission.id, "Mission run not launched");
    }

    Ok((StatusCode::CREATED, Json(CreatedResponse { id: mission.id })))
}

fn validate_mission(input: &CreateMission) -> Result<(), CoreError> {
    validate_name("name", &input.name)?;
    validate_step_numbers(input.tasks.iter().map(|t| t.step_number))
}

// ---------------------------------------------------------------------------
// Read
// ---------------------------------------------------------------------------

/// GET /api/v1/missions
///
/// Newest first. Supports optional `status_id`, `limit`, and `offset`.
pub async fn list_missions(
    State(state): State<AppState>,
    Query(params): Query<MissionListQuery>,
) -> AppResult<impl IntoResponse> {
    let missions: Vec<MissionSummary> = MissionRepo::list(&state.pool, &params)
        .await?
        .into_iter()
        .map(MissionSummary::from)
        .collect();
    Ok(Json(DataResponse { data: missions }))
}

/// GET /api/v1/missions/{id}
///
/// The mission with its tasks in step order.
pub async fn get_mission(
    State(state): State<AppState>,
    Path(mission_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let mission = MissionRepo::find_by_id(&state.pool, mission_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Mission",
            id: mission_id,
        }))?;
    let tasks = MissionTaskRepo::list_by_mission(&state.pool, mission_id).await?;

    Ok(Json(DataResponse {
        data: MissionWithTasks::new(mission, tasks),
    }))
}
