use crate::models::{DbBillableSubscription, DbSlotSubscription};
use eyre::Result;
use sqlx::PgExecutor;
use uuid::Uuid;

const SUBSCRIPTION_COLUMNS: &str = "id, slot_id, student_id, start_month, end_month, \
     monthly_rate_cents, rate_per_lesson_cents, status, created_at";

pub async fn create_subscription(
    executor: impl PgExecutor<'_>,
    slot_id: Uuid,
    student_id: Uuid,
    start_month: &str,
    monthly_rate_cents: Option<i64>,
    rate_per_lesson_cents: Option<i64>,
) -> Result<DbSlotSubscription> {
    let id = Uuid::new_v4();

    tracing::debug!(
        "Creating subscription: id={}, slot={}, start_month={}",
        id,
        slot_id,
        start_month
    );

    let subscription = sqlx::query_as::<_, DbSlotSubscription>(&format!(
        r#"
        INSERT INTO slot_subscriptions
            (id, slot_id, student_id, start_month, monthly_rate_cents, rate_per_lesson_cents, status)
        VALUES ($1, $2, $3, $4, $5, $6, 'active')
        RETURNING {SUBSCRIPTION_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(slot_id)
    .bind(student_id)
    .bind(start_month)
    .bind(monthly_rate_cents)
    .bind(rate_per_lesson_cents)
    .fetch_one(executor)
    .await?;

    Ok(subscription)
}

pub async fn get_active_subscription_for_slot(
    executor: impl PgExecutor<'_>,
    slot_id: Uuid,
) -> Result<Option<DbSlotSubscription>> {
    let subscription = sqlx::query_as::<_, DbSlotSubscription>(&format!(
        r#"
        SELECT {SUBSCRIPTION_COLUMNS}
        FROM slot_subscriptions
        WHERE slot_id = $1 AND status = 'active'
        "#
    ))
    .bind(slot_id)
    .fetch_optional(executor)
    .await?;

    Ok(subscription)
}

/// Closes the active subscription for a slot. The end month is clamped to the
/// start month so a same-month cancellation keeps `start_month <= end_month`.
pub async fn close_subscription(
    executor: impl PgExecutor<'_>,
    id: Uuid,
    end_month: &str,
) -> Result<Option<DbSlotSubscription>> {
    let subscription = sqlx::query_as::<_, DbSlotSubscription>(&format!(
        r#"
        UPDATE slot_subscriptions
        SET status = 'closed', end_month = GREATEST(start_month, $2)
        WHERE id = $1 AND status = 'active'
        RETURNING {SUBSCRIPTION_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(end_month)
    .fetch_optional(executor)
    .await?;

    Ok(subscription)
}

/// The subscription (any status) whose month range covers `month`.
pub async fn get_subscription_covering(
    executor: impl PgExecutor<'_>,
    slot_id: Uuid,
    month: &str,
) -> Result<Option<DbSlotSubscription>> {
    let subscription = sqlx::query_as::<_, DbSlotSubscription>(&format!(
        r#"
        SELECT {SUBSCRIPTION_COLUMNS}
        FROM slot_subscriptions
        WHERE slot_id = $1
          AND start_month <= $2
          AND (end_month IS NULL OR end_month >= $2)
        ORDER BY created_at DESC
        LIMIT 1
        "#
    ))
    .bind(slot_id)
    .bind(month)
    .fetch_optional(executor)
    .await?;

    Ok(subscription)
}

/// Removes a slot's subscription rows outright. Only used when a slot that
/// never generated a lesson is physically deleted.
pub async fn delete_subscriptions_for_slot(
    executor: impl PgExecutor<'_>,
    slot_id: Uuid,
) -> Result<u64> {
    let result = sqlx::query(
        r#"
        DELETE FROM slot_subscriptions
        WHERE slot_id = $1
        "#,
    )
    .bind(slot_id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}

/// Active subscriptions (on active slots) covering `month` that have no
/// billing record for it yet, in stable order for chronological billing runs.
pub async fn list_billable_subscriptions(
    executor: impl PgExecutor<'_>,
    month: &str,
) -> Result<Vec<DbBillableSubscription>> {
    let subscriptions = sqlx::query_as::<_, DbBillableSubscription>(
        r#"
        SELECT sub.id, sub.slot_id, sub.student_id, s.teacher_id, s.day_of_week,
               sub.monthly_rate_cents, sub.rate_per_lesson_cents
        FROM slot_subscriptions sub
        JOIN recurring_slots s ON s.id = sub.slot_id
        WHERE sub.status = 'active'
          AND s.status = 'active'
          AND sub.start_month <= $1
          AND (sub.end_month IS NULL OR sub.end_month >= $1)
          AND NOT EXISTS (
              SELECT 1 FROM monthly_billing b
              WHERE b.subscription_id = sub.id AND b.month = $1
          )
        ORDER BY sub.created_at, sub.id
        "#,
    )
    .bind(month)
    .fetch_all(executor)
    .await?;

    Ok(subscriptions)
}
