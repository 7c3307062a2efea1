use axum::{routing::get, Router};

use crate::http::handlers;
use crate::AppState;

pub fn health() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health))
}

pub fn interactions() -> Router<AppState> {
    Router::new()
        .route(
            "/api/interactions",
            get(handlers::list_interactions)
                .post(handlers::toggle_interaction)
                .delete(handlers::delete_interactions),
        )
        // Demonstration path kept for existing clients.
        .route(
            "/api/interactions/test",
            get(handlers::list_interactions)
                .post(handlers::toggle_interaction)
                .delete(handlers::delete_interactions),
        )
}

pub fn articles() -> Router<AppState> {
    Router::new().route("/api/articles/:id/counters", get(handlers::article_counters))
}
