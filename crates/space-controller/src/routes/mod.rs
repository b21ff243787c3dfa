//! HTTP routes for the Space Controller.
//!
//! Defines the Axum router and application state.

use crate::actors::SpaceActorHandle;
use crate::handlers;
use axum::routing::{delete, get, post, put};
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Handle to the session's space actor.
    pub actor: SpaceActorHandle,
}

/// Build the application routes.
///
/// - participant lifecycle and resolution queries under `/v1/participants`
/// - zone lifecycle, trigger events, and roster replication under
///   `/v1/zones`
/// - `TraceLayer` for request logging
pub fn build_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/participants", post(handlers::connect_participant))
        .route(
            "/v1/participants/:id",
            delete(handlers::disconnect_participant),
        )
        .route(
            "/v1/participants/:id/respawn",
            post(handlers::respawn_participant),
        )
        .route("/v1/participants/:id/resolved", get(handlers::get_resolved))
        .route("/v1/audibility", get(handlers::get_audibility))
        .route("/v1/zones", post(handlers::create_zone))
        .route("/v1/zones/:zone_id", delete(handlers::remove_zone))
        .route("/v1/zones/:zone_id/enter", post(handlers::zone_enter))
        .route("/v1/zones/:zone_id/exit", post(handlers::zone_exit))
        .route("/v1/zones/:zone_id/roster", put(handlers::sync_roster))
        .route("/v1/state", get(handlers::get_state))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_state_is_clone() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<AppState>();
    }
}
