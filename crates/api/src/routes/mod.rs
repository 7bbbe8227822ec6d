pub mod agents;
pub mod health;
pub mod missions;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /agents              list, register
/// /agents/{id}         get
/// /missions            list, submit
/// /missions/{id}       get (with tasks)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/agents", agents::router())
        .nest("/missions", missions::router())
}
