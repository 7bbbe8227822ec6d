//! Handlers for the `/agents` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use miso_core::agent_target::validate_runtime;
use miso_core::error::CoreError;
use miso_core::mission::validate_name;
use miso_core::types::DbId;
use miso_db::models::agent::CreateAgent;
use miso_db::repositories::AgentRepo;

use crate::error::{AppError, AppResult};
use crate::response::{CreatedResponse, DataResponse};
use crate::state::AppState;

/// POST /api/v1/agents
///
/// Register an agent. Returns 201 with the new agent's ID.
pub async fn create_agent(
    State(state): State<AppState>,
    Json(input): Json<CreateAgent>,
) -> AppResult<impl IntoResponse> {
    validate_name("name", &input.name)?;
    validate_runtime(&input.runtime)?;

    let agent = AgentRepo::create(&state.pool, &input).await?;

    tracing::info!(
        agent_id = agent.id,
        runtime = %agent.runtime,
        target = %agent.target(),
        "Agent registered",
    );

    Ok((StatusCode::CREATED, Json(CreatedResponse { id: agent.id })))
}

/// GET /api/v1/agents
pub async fn list_agents(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let agents = AgentRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: agents }))
}

/// GET /api/v1/agents/{id}
pub async fn get_agent(
    State(state): State<AppState>,
    Path(agent_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let agent = AgentRepo::find_by_id(&state.pool, agent_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Agent",
            id: agent_id,
        }))?;
    Ok(Json(DataResponse { data: agent }))
}
