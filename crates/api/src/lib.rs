//! # LessonSync API
//!
//! The API crate provides the web server for the LessonSync lesson scheduling
//! service: booking recurring slots, materializing lesson occurrences,
//! monthly billing, and optimistic-lock lesson edits.
//!
//! ## Architecture
//!
//! This crate follows a layered architecture:
//!
//! - **Routes**: Define API endpoints and URL structure
//! - **Handlers**: Implement request processing logic
//! - **Middleware**: Provide cross-cutting concerns like error handling
//! - **Config**: Handle environment and application configuration
//!
//! The API uses Axum as the web framework and SQLx for database interactions.
//! Periodic work (lesson generation, billing) is exposed as idempotent job
//! endpoints under `/api/jobs`, intended to be hit by an external cron-like
//! invoker; the server owns no timers of its own.

/// Configuration module for API settings
pub mod config;
/// Production email collaborator
pub mod email;
/// Request handlers that implement business logic
pub mod handlers;
/// Middleware for error handling
pub mod middleware;
/// Route definitions and API endpoint structure
pub mod routes;

use std::sync::Arc;

use axum::Router;
use eyre::Result;
use lessonsync_core::clock::{Clock, SystemClock};
use lessonsync_core::conflict::BookingPolicy;
use lessonsync_core::email::EmailSender;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::FmtSubscriber;

/// Shared application state that is accessible to all request handlers
pub struct ApiState {
    /// PostgreSQL connection pool for database operations
    pub db_pool: PgPool,
    /// Injected wall-clock time, fixed in tests
    pub clock: Arc<dyn Clock>,
    /// Outbound email collaborator, fire-and-forget at call sites
    pub mailer: Arc<dyn EmailSender>,
    /// Advance-booking and minimum-notice limits
    pub policy: BookingPolicy,
    /// Forward horizon (in weeks) for lesson generation
    pub horizon_weeks: i64,
}

/// Starts the API server with the provided configuration and database connection
pub async fn start_server(config: config::ApiConfig, db_pool: PgPool) -> Result<()> {
    // Initialize tracing for logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Create shared state with dependencies
    let state = Arc::new(ApiState {
        db_pool,
        clock: Arc::new(SystemClock),
        mailer: Arc::new(email::LogMailer),
        policy: config.booking_policy(),
        horizon_weeks: config.horizon_weeks,
    });

    // Build the application router with all routes
    let app = Router::new()
        // Health check endpoints
        .merge(routes::health::routes())
        // Slot booking lifecycle
        .merge(routes::booking::routes())
        // Lesson edits and completion
        .merge(routes::lessons::routes())
        // Idempotent background jobs
        .merge(routes::jobs::routes())
        // Teacher availability management
        .merge(routes::teachers::routes())
        // Billing lifecycle transitions
        .merge(routes::billing::routes())
        // Attach shared state to all routes
        .with_state(state);

    // Apply CORS configuration if origins are specified
    let app = if let Some(origins) = &config.cors_origins {
        let cors = tower_http::cors::CorsLayer::new()
            .allow_methods([
                axum::http::Method::GET,
                axum::http::Method::POST,
                axum::http::Method::PUT,
                axum::http::Method::DELETE,
                axum::http::Method::OPTIONS,
            ])
            .allow_headers([
                axum::http::header::CONTENT_TYPE,
                axum::http::header::ACCEPT,
            ])
            .allow_origin(
                origins
                    .iter()
                    .filter_map(|origin| origin.parse().ok())
                    .collect::<Vec<_>>(),
            );

        app.layer(cors)
    } else {
        app
    };

    // Add request timeout middleware
    let app = app.layer(tower_http::timeout::TimeoutLayer::new(
        std::time::Duration::from_secs(config.request_timeout),
    ));

    // Start the HTTP server
    let addr = config.server_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
