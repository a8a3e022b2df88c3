//! Route configuration

pub mod realtime;

use std::sync::Arc;

use axum::Router;
use tower::ServiceBuilder;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the full application: the `/ws` bridge plus static assets for every other path.
pub fn create_app(state: Arc<AppState>) -> Router {
    let assets = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .service(ServeDir::new(&state.config.assets_dir));

    realtime::create_realtime_router()
        .fallback_service(assets)
        .with_state(state)
}
