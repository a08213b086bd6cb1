use eyre::Result;
use sqlx::{Pool, Postgres};
use tracing::info;

pub async fn initialize_database(pool: &Pool<Postgres>) -> Result<()> {
    info!("Initializing database schema...");

    // Create recurring_slots table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS recurring_slots (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            teacher_id UUID NOT NULL,
            student_id UUID NOT NULL,
            day_of_week SMALLINT NOT NULL CHECK (day_of_week BETWEEN 0 AND 6),
            start_time TIME NOT NULL,
            duration_minutes SMALLINT NOT NULL CHECK (duration_minutes IN (30, 60)),
            timezone TEXT NOT NULL DEFAULT 'UTC',
            monthly_rate_cents BIGINT NULL,
            rate_per_lesson_cents BIGINT NULL,
            status TEXT NOT NULL DEFAULT 'active',
            booked_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            cancelled_at TIMESTAMP WITH TIME ZONE NULL,
            CONSTRAINT one_rate_model CHECK ((monthly_rate_cents IS NULL) <> (rate_per_lesson_cents IS NULL))
        );
        "#,
    )
    .execute(pool)
    .await?;

    // One active slot per (teacher, weekday, start, duration) tuple; this is
    // the backstop against concurrent booking races.
    sqlx::query(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_slots_active_tuple
        ON recurring_slots(teacher_id, day_of_week, start_time, duration_minutes)
        WHERE status = 'active';
        "#,
    )
    .execute(pool)
    .await?;

    // Create slot_subscriptions table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS slot_subscriptions (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            slot_id UUID NOT NULL REFERENCES recurring_slots(id),
            student_id UUID NOT NULL,
            start_month VARCHAR(7) NOT NULL,
            end_month VARCHAR(7) NULL,
            monthly_rate_cents BIGINT NULL,
            rate_per_lesson_cents BIGINT NULL,
            status TEXT NOT NULL DEFAULT 'active',
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            CONSTRAINT one_subscription_rate CHECK ((monthly_rate_cents IS NULL) <> (rate_per_lesson_cents IS NULL)),
            CONSTRAINT month_range CHECK (end_month IS NULL OR start_month <= end_month)
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_subscriptions_one_active
        ON slot_subscriptions(slot_id)
        WHERE status = 'active';
        "#,
    )
    .execute(pool)
    .await?;

    // Create lessons table. The (slot_id, date) uniqueness is the generator's
    // idempotence guarantee.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS lessons (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            slot_id UUID NULL REFERENCES recurring_slots(id),
            teacher_id UUID NOT NULL,
            student_id UUID NOT NULL,
            date TIMESTAMP WITH TIME ZONE NOT NULL,
            duration_minutes SMALLINT NOT NULL,
            status TEXT NOT NULL DEFAULT 'scheduled',
            is_recurring BOOLEAN NOT NULL DEFAULT FALSE,
            notes TEXT NULL,
            version BIGINT NOT NULL DEFAULT 1,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            CONSTRAINT unique_slot_occurrence UNIQUE (slot_id, date)
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create monthly_billing table; one record per (subscription, month)
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS monthly_billing (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            subscription_id UUID NOT NULL REFERENCES slot_subscriptions(id),
            student_id UUID NOT NULL,
            teacher_id UUID NOT NULL,
            month VARCHAR(7) NOT NULL,
            expected_lessons INTEGER NOT NULL,
            actual_lessons INTEGER NOT NULL DEFAULT 0 CHECK (actual_lessons >= 0),
            rate_per_lesson_cents BIGINT NULL,
            total_amount_cents BIGINT NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending',
            paid_at TIMESTAMP WITH TIME ZONE NULL,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            CONSTRAINT unique_subscription_month UNIQUE (subscription_id, month)
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create teacher_availability table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS teacher_availability (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            teacher_id UUID NOT NULL,
            day_of_week SMALLINT NOT NULL CHECK (day_of_week BETWEEN 0 AND 6),
            start_time TIME NOT NULL,
            end_time TIME NOT NULL,
            is_active BOOLEAN NOT NULL DEFAULT TRUE,
            CONSTRAINT valid_window CHECK (end_time > start_time)
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create blocked_times table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS blocked_times (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            teacher_id UUID NOT NULL,
            start_time TIMESTAMP WITH TIME ZONE NOT NULL,
            end_time TIMESTAMP WITH TIME ZONE NOT NULL,
            reason TEXT NULL,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            CONSTRAINT valid_block CHECK (end_time > start_time)
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_slots_teacher_id ON recurring_slots(teacher_id);
        CREATE INDEX IF NOT EXISTS idx_slots_status ON recurring_slots(status);
        CREATE INDEX IF NOT EXISTS idx_subscriptions_slot_id ON slot_subscriptions(slot_id);
        CREATE INDEX IF NOT EXISTS idx_lessons_slot_id ON lessons(slot_id);
        CREATE INDEX IF NOT EXISTS idx_lessons_teacher_date ON lessons(teacher_id, date);
        CREATE INDEX IF NOT EXISTS idx_billing_subscription ON monthly_billing(subscription_id);
        CREATE INDEX IF NOT EXISTS idx_billing_month ON monthly_billing(month);
        CREATE INDEX IF NOT EXISTS idx_availability_teacher ON teacher_availability(teacher_id);
        CREATE INDEX IF NOT EXISTS idx_blocked_teacher ON blocked_times(teacher_id);
        "#,
    )
    .execute(pool)
    .await?;

    info!("Database schema initialized successfully.");
    Ok(())
}
