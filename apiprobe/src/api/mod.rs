//! REST APIハンドラー

pub mod a2a;
pub mod error;
pub mod system;
pub mod tools;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::AppState;

/// ルーターを構築
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(system::alive))
        .route("/a2a/agent/:agent_id", post(a2a::submit_task))
        .route("/api/tests", post(tools::run_test))
        .route("/api/health-checks", post(tools::run_health_check))
        .route("/api/health-status", get(tools::health_status))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
