use axum::{
    routing::post,
    Router,
};
use std::sync::Arc;

use crate::{handlers, ApiState};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route(
            "/api/jobs/generate-lessons",
            post(handlers::jobs::generate_lessons),
        )
        .route(
            "/api/jobs/generate-billing",
            post(handlers::jobs::generate_billing),
        )
        .route("/api/jobs/mark-overdue", post(handlers::jobs::mark_overdue))
}
