use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

use crate::{handlers, ApiState};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/api/lessons/:id", get(handlers::lessons::get_lesson))
        .route("/api/lessons/:id", put(handlers::lessons::update_lesson))
        .route(
            "/api/lessons/:id/complete",
            post(handlers::lessons::complete_lesson),
        )
}
