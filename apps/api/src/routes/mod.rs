pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::assessment::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Test Hub API
        .route("/api/v1/tests/start", post(handlers::handle_start_test))
        .route(
            "/api/v1/tests/submit-answer",
            post(handlers::handle_submit_answer),
        )
        .route("/api/v1/tests/history", get(handlers::handle_history))
        .route("/api/v1/tests/prompts", get(handlers::handle_prompt_matrix))
        .route(
            "/api/v1/tests/sessions/:id",
            get(handlers::handle_get_results).delete(handlers::handle_delete_session),
        )
        .route(
            "/api/v1/tests/sessions/:id/continue",
            get(handlers::handle_continue),
        )
        .route(
            "/api/v1/tests/sessions/:id/retake-incorrect",
            post(handlers::handle_retake_incorrect),
        )
        // Guidance Hub
        .route(
            "/api/v1/guidance/summary",
            get(handlers::handle_guidance_summary),
        )
        .with_state(state)
}
