use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::reminder::{Frequency, Reminder};
use crate::repositories::RepositoryError;

/// Trait defining reminder repository operations
#[async_trait]
pub trait ReminderRepository: Send + Sync {
    /// Persist a new reminder
    async fn create(&self, reminder: Reminder) -> Result<Reminder, RepositoryError>;

    /// Find a reminder by id, only if it belongs to `user_id`
    async fn find_for_user(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Reminder>, RepositoryError>;

    /// All reminders of a user, soonest due first
    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<Reminder>, RepositoryError>;

    /// Active reminders with `next_due_date <= now`
    async fn find_due(&self, now: DateTime<Utc>) -> Result<Vec<Reminder>, RepositoryError>;

    /// Move a reminder's next due date, only while it still equals `expected`.
    /// `None` means the row is gone or was advanced by someone else.
    async fn update_next_due_date(
        &self,
        id: Uuid,
        expected: DateTime<Utc>,
        next_due_date: DateTime<Utc>,
    ) -> Result<Option<Reminder>, RepositoryError>;
}

#[derive(sqlx::FromRow)]
struct ReminderRow {
    id: Uuid,
    user_id: Uuid,
    title: String,
    amount: Option<i64>,
    frequency: String,
    next_due_date: DateTime<Utc>,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl From<ReminderRow> for Reminder {
    fn from(row: ReminderRow) -> Self {
        Reminder {
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            amount: row.amount,
            frequency: Frequency::from_tag_or_daily(&row.frequency),
            next_due_date: row.next_due_date,
            is_active: row.is_active,
            created_at: row.created_at,
        }
    }
}

const REMINDER_COLUMNS: &str =
    "id, user_id, title, amount, frequency, next_due_date, is_active, created_at";

/// PostgreSQL implementation of ReminderRepository
pub struct PostgresReminderRepository {
    pool: PgPool,
}

impl PostgresReminderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReminderRepository for PostgresReminderRepository {
    async fn create(&self, reminder: Reminder) -> Result<Reminder, RepositoryError> {
        let row = sqlx::query_as::<_, ReminderRow>(&format!(
            r#"
            INSERT INTO reminders (id, user_id, title, amount, frequency, next_due_date, is_active, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {REMINDER_COLUMNS}
            "#
        ))
        .bind(reminder.id)
        .bind(reminder.user_id)
        .bind(&reminder.title)
        .bind(reminder.amount)
        .bind(reminder.frequency.as_tag())
        .bind(reminder.next_due_date)
        .bind(reminder.is_active)
        .bind(reminder.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn find_for_user(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Reminder>, RepositoryError> {
        let row = sqlx::query_as::<_, ReminderRow>(&format!(
            r#"
            SELECT {REMINDER_COLUMNS}
            FROM reminders
            WHERE id = $1 AND user_id = $2
            "#
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Reminder::from))
    }

    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<Reminder>, RepositoryError> {
        let rows = sqlx::query_as::<_, ReminderRow>(&format!(
            r#"
            SELECT {REMINDER_COLUMNS}
            FROM reminders
            WHERE user_id = $1
            ORDER BY next_due_date ASC
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Reminder::from).collect())
    }

    async fn find_due(&self, now: DateTime<Utc>) -> Result<Vec<Reminder>, RepositoryError> {
        let rows = sqlx::query_as::<_, ReminderRow>(&format!(
            r#"
            SELECT {REMINDER_COLUMNS}
            FROM reminders
            WHERE is_active = TRUE AND next_due_date <= $1
            ORDER BY next_due_date ASC
            "#
        ))
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Reminder::from).collect())
    }

    async fn update_next_due_date(
        &self,
        id: Uuid,
        expected: DateTime<Utc>,
        next_due_date: DateTime<Utc>,
    ) -> Result<Option<Reminder>, RepositoryError> {
        let row = sqlx::query_as::<_, ReminderRow>(&format!(
            r#"
            UPDATE reminders
            SET next_due_date = $2
            WHERE id = $1 AND next_due_date = $3
            RETURNING {REMINDER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(next_due_date)
        .bind(expected)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Reminder::from))
    }
}
