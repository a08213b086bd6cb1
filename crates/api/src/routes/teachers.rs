use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

use crate::{handlers, ApiState};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route(
            "/api/teachers/:id/availability",
            get(handlers::teachers::get_availability),
        )
        .route(
            "/api/teachers/:id/availability",
            put(handlers::teachers::update_availability),
        )
        .route(
            "/api/teachers/:id/blocked-times",
            post(handlers::teachers::create_blocked_time),
        )
}
