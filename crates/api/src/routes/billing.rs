use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::{handlers, ApiState};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/api/billing/:id", get(handlers::billing::get_billing))
        .route("/api/billing/:id/bill", post(handlers::billing::mark_billed))
        .route(
            "/api/billing/:id/pay",
            post(handlers::billing::record_payment),
        )
}
