use axum::Router;

use crate::state::SharedState;

/// Start and stop endpoints.
pub mod battle;
pub mod docs;
/// Health endpoints.
pub mod health;
/// Pull endpoints.
pub mod public;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(battle::router())
        .merge(public::router());

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}
