pub mod cleanup;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod routes;
pub mod rpc;
pub mod state;
pub mod utils;

use axum::middleware;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the application router.
pub fn build_router(state: AppState) -> axum::Router {
    routes::rpc_routes(
        &state.config.server.api_root,
        state.config.store.max_image_size,
    )
        .layer(middleware::map_response_with_state(
            state.clone(),
            routes::stamp_signature,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
