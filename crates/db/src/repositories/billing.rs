use crate::models::DbMonthlyBilling;
use chrono::{DateTime, Utc};
use eyre::Result;
use sqlx::PgExecutor;
use uuid::Uuid;

const BILLING_COLUMNS: &str = "id, subscription_id, student_id, teacher_id, month, \
     expected_lessons, actual_lessons, rate_per_lesson_cents, total_amount_cents, \
     status, paid_at, created_at";

/// Inserts a pending billing record unless one already exists for the
/// `(subscription, month)` pair; `None` means it was already billed. The
/// unique constraint keeps the monthly job idempotent.
#[allow(clippy::too_many_arguments)]
pub async fn insert_billing_if_absent(
    executor: impl PgExecutor<'_>,
    subscription_id: Uuid,
    student_id: Uuid,
    teacher_id: Uuid,
    month: &str,
    expected_lessons: i32,
    rate_per_lesson_cents: Option<i64>,
    total_amount_cents: i64,
) -> Result<Option<DbMonthlyBilling>> {
    let id = Uuid::new_v4();

    tracing::debug!(
        "Creating billing record: subscription={}, month={}, expected={}, total={}",
        subscription_id,
        month,
        expected_lessons,
        total_amount_cents
    );

    let billing = sqlx::query_as::<_, DbMonthlyBilling>(&format!(
        r#"
        INSERT INTO monthly_billing
            (id, subscription_id, student_id, teacher_id, month,
             expected_lessons, actual_lessons, rate_per_lesson_cents,
             total_amount_cents, status)
        VALUES ($1, $2, $3, $4, $5, $6, 0, $7, $8, 'pending')
        ON CONFLICT (subscription_id, month) DO NOTHING
        RETURNING {BILLING_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(subscription_id)
    .bind(student_id)
    .bind(teacher_id)
    .bind(month)
    .bind(expected_lessons)
    .bind(rate_per_lesson_cents)
    .bind(total_amount_cents)
    .fetch_optional(executor)
    .await?;

    Ok(billing)
}

pub async fn get_billing_by_id(
    executor: impl PgExecutor<'_>,
    id: Uuid,
) -> Result<Option<DbMonthlyBilling>> {
    let billing = sqlx::query_as::<_, DbMonthlyBilling>(&format!(
        r#"
        SELECT {BILLING_COLUMNS}
        FROM monthly_billing
        WHERE id = $1
        "#
    ))
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(billing)
}

/// Guarded status transition: the row changes only when it is still in
/// `from`. `None` signals the record was not in the expected state.
pub async fn transition_status(
    executor: impl PgExecutor<'_>,
    id: Uuid,
    from: &str,
    to: &str,
) -> Result<Option<DbMonthlyBilling>> {
    let billing = sqlx::query_as::<_, DbMonthlyBilling>(&format!(
        r#"
        UPDATE monthly_billing
        SET status = $3
        WHERE id = $1 AND status = $2
        RETURNING {BILLING_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(from)
    .bind(to)
    .fetch_optional(executor)
    .await?;

    Ok(billing)
}

/// Records payment for a billed or overdue record.
pub async fn record_payment(
    executor: impl PgExecutor<'_>,
    id: Uuid,
    paid_at: DateTime<Utc>,
) -> Result<Option<DbMonthlyBilling>> {
    let billing = sqlx::query_as::<_, DbMonthlyBilling>(&format!(
        r#"
        UPDATE monthly_billing
        SET status = 'paid', paid_at = $2
        WHERE id = $1 AND status IN ('billed', 'overdue')
        RETURNING {BILLING_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(paid_at)
    .fetch_optional(executor)
    .await?;

    Ok(billing)
}

/// Flips billed records for months before the cutoff to overdue.
pub async fn mark_overdue_before(executor: impl PgExecutor<'_>, month: &str) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE monthly_billing
        SET status = 'overdue'
        WHERE status = 'billed' AND month < $1
        "#,
    )
    .bind(month)
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}

/// Cancels unpaid records for months the subscription no longer covers after
/// its end month moved, as part of the cancellation cascade.
pub async fn cancel_billing_after_month(
    executor: impl PgExecutor<'_>,
    subscription_id: Uuid,
    end_month: &str,
) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE monthly_billing
        SET status = 'cancelled'
        WHERE subscription_id = $1 AND month > $2 AND status NOT IN ('paid', 'cancelled')
        "#,
    )
    .bind(subscription_id)
    .bind(end_month)
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}

/// Removes a subscription's billing rows outright. Only used when a slot that
/// never generated a lesson is physically deleted.
pub async fn delete_billing_for_subscription(
    executor: impl PgExecutor<'_>,
    subscription_id: Uuid,
) -> Result<u64> {
    let result = sqlx::query(
        r#"
        DELETE FROM monthly_billing
        WHERE subscription_id = $1
        "#,
    )
    .bind(subscription_id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}

/// Bumps the completed-lesson counter for the month, capped at the expected
/// count. Returns 0 when the cap is reached or no record exists yet.
pub async fn increment_actual_lessons(
    executor: impl PgExecutor<'_>,
    subscription_id: Uuid,
    month: &str,
) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE monthly_billing
        SET actual_lessons = actual_lessons + 1
        WHERE subscription_id = $1 AND month = $2 AND actual_lessons < expected_lessons
        "#,
    )
    .bind(subscription_id)
    .bind(month)
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}
