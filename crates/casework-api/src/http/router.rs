//! Axum router configuration with middleware.
//!
//! All routes are under `/api/v1/`.
//! Middleware: CORS, tracing, request body limit.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, patch, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Upper bound for request bodies; audio uploads are the largest.
const MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Cases
        .route("/cases", get(handlers::case::list_cases))
        .route("/cases/{slug}", get(handlers::case::get_case))
        // Chats
        .route("/chat", get(handlers::chat::current_chat))
        .route("/chats", post(handlers::chat::create_chat))
        .route("/chats/case-history", get(handlers::chat::case_history))
        .route("/chats/check-status", get(handlers::chat::check_status))
        .route("/chats/{id}/messages", post(handlers::chat::append_message))
        .route(
            "/chats/{id}/generate-response",
            post(handlers::chat::generate_response),
        )
        .route("/chats/{id}/status", patch(handlers::chat::update_status))
        .route("/chats/{id}/archive", post(handlers::chat::archive_chat))
        .route("/chats/{id}/submit-case", post(handlers::chat::submit_case))
        .route("/user-case-statuses", get(handlers::chat::user_case_statuses))
        // Billing
        .route("/subscription", get(handlers::billing::get_subscription))
        .route(
            "/stripe/create-checkout",
            post(handlers::billing::create_checkout),
        )
        .route(
            "/stripe/cancel-subscription",
            post(handlers::billing::cancel_subscription),
        )
        .route("/stripe/webhook", post(handlers::billing::webhook))
        // Audio
        .route("/transcribe", post(handlers::transcribe::transcribe));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/health", get(health_check))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health - Liveness check (no auth required).
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
