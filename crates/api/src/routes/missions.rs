//! Route definitions for the `/missions` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::missions;
use crate::state::AppState;

/// Routes mounted at `/missions`.
///
/// ```text
/// GET    /        -> list_missions
/// POST   /        -> create_mission
/// GET    /{id}    -> get_mission
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(missions::list_missions).post(missions::create_mission))
        .route("/{id}", get(missions::get_mission))
}
