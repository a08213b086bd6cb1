use axum::http::StatusCode;
use axum::response::IntoResponse;
use lessonsync_api::middleware::error_handling::AppError;
use lessonsync_core::conflict::DenialReason;
use lessonsync_core::errors::LessonError;

#[tokio::test]
async fn test_not_found_maps_to_404() {
    let error = AppError(LessonError::NotFound("Lesson not found".to_string()));
    let response = error.into_response();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_validation_maps_to_400() {
    let error = AppError(LessonError::Validation("Invalid input".to_string()));
    let response = error.into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_booking_conflict_maps_to_409() {
    let error = AppError(LessonError::BookingConflict {
        reason: DenialReason::NotAvailable,
        detail: "Outside the teacher's availability".to_string(),
    });
    let response = error.into_response();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_version_conflict_maps_to_409() {
    let error = AppError(LessonError::VersionConflict {
        current_version: 4,
        attempted_version: 2,
    });
    let response = error.into_response();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_database_error_maps_to_500() {
    let error = AppError(LessonError::Database(eyre::eyre!("Connection refused")));
    let response = error.into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_internal_error_maps_to_500() {
    let error = AppError(LessonError::Internal(Box::new(std::io::Error::new(
        std::io::ErrorKind::Other,
        "Internal error",
    ))));
    let response = error.into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_conflict_body_carries_reason_code() {
    let error = AppError(LessonError::BookingConflict {
        reason: DenialReason::Blocked,
        detail: "Teacher is on vacation".to_string(),
    });
    let response = error.into_response();

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    let json: serde_json::Value = serde_json::from_slice(&body).expect("json body");
    assert_eq!(json["reason"], "BLOCKED");
}

#[tokio::test]
async fn test_version_conflict_body_carries_both_counters() {
    let error = AppError(LessonError::VersionConflict {
        current_version: 7,
        attempted_version: 5,
    });
    let response = error.into_response();

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    let json: serde_json::Value = serde_json::from_slice(&body).expect("json body");
    assert_eq!(json["current_version"], 7);
    assert_eq!(json["attempted_version"], 5);
}

#[tokio::test]
async fn test_infrastructure_errors_hide_details() {
    let error = AppError(LessonError::Database(eyre::eyre!(
        "password authentication failed for user postgres"
    )));
    let response = error.into_response();

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    let json: serde_json::Value = serde_json::from_slice(&body).expect("json body");
    assert_eq!(json["error"], "Internal server error");
}
