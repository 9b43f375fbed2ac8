use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::reminder::{CreateReminderRequest, Reminder};
use crate::repositories::reminder_repository::ReminderRepository;
use crate::repositories::RepositoryError;
use crate::services::due_date::{next_due_date, snoozed_due_date};

/// Reminder service errors
#[derive(Debug, thiserror::Error)]
pub enum ReminderError {
    #[error("Reminder not found")]
    ReminderNotFound,

    #[error("Invalid amount: amount must not be negative")]
    InvalidAmount,

    #[error("Due date out of range")]
    DueDateOutOfRange,

    #[error("Reminder was changed concurrently")]
    Conflict,

    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// Attempts at a guarded due-date update before reporting a conflict
const MAX_UPDATE_ATTEMPTS: usize = 3;

impl From<RepositoryError> for ReminderError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => ReminderError::ReminderNotFound,
            e => ReminderError::DatabaseError(e.to_string()),
        }
    }
}

/// Trait defining reminder service operations
#[async_trait]
pub trait ReminderService: Send + Sync {
    async fn create_reminder(
        &self,
        user_id: Uuid,
        request: CreateReminderRequest,
    ) -> Result<Reminder, ReminderError>;

    /// The user's reminders, soonest first
    async fn get_reminders(&self, user_id: Uuid) -> Result<Vec<Reminder>, ReminderError>;

    /// Mark the current occurrence as paid and move to the next one
    async fn complete_reminder(&self, user_id: Uuid, id: Uuid) -> Result<Reminder, ReminderError>;

    /// Push the current occurrence back by a day
    async fn snooze_reminder(&self, user_id: Uuid, id: Uuid) -> Result<Reminder, ReminderError>;
}

/// Implementation of ReminderService
pub struct ReminderServiceImpl {
    reminder_repository: Arc<dyn ReminderRepository>,
}

impl ReminderServiceImpl {
    pub fn new(reminder_repository: Arc<dyn ReminderRepository>) -> Self {
        Self {
            reminder_repository,
        }
    }

    async fn owned(&self, user_id: Uuid, id: Uuid) -> Result<Reminder, ReminderError> {
        self.reminder_repository
            .find_for_user(id, user_id)
            .await?
            .ok_or(ReminderError::ReminderNotFound)
    }

    /// Re-reads and recomputes until the guarded update lands, so a step
    /// taken by the checker or another request in between is never lost.
    async fn move_due_date<F>(
        &self,
        user_id: Uuid,
        id: Uuid,
        step: F,
    ) -> Result<Reminder, ReminderError>
    where
        F: Fn(&Reminder) -> Option<DateTime<Utc>> + Send + Sync,
    {
        for _ in 0..MAX_UPDATE_ATTEMPTS {
            let reminder = self.owned(user_id, id).await?;
            let next = step(&reminder).ok_or(ReminderError::DueDateOutOfRange)?;

            if let Some(updated) = self
                .reminder_repository
                .update_next_due_date(id, reminder.next_due_date, next)
                .await?
            {
                return Ok(updated);
            }
            tracing::debug!("Reminder id={} moved during update, retrying", id);
        }

        tracing::warn!(
            "Giving up on reminder id={} after {} conflicting updates",
            id,
            MAX_UPDATE_ATTEMPTS
        );
        Err(ReminderError::Conflict)
    }
}

#[async_trait]
impl ReminderService for ReminderServiceImpl {
    async fn create_reminder(
        &self,
        user_id: Uuid,
        request: CreateReminderRequest,
    ) -> Result<Reminder, ReminderError> {
        if matches!(request.amount, Some(amount) if amount < 0) {
            return Err(ReminderError::InvalidAmount);
        }

        let reminder = Reminder {
            id: Uuid::new_v4(),
            user_id,
            title: request.title.trim().to_string(),
            // zero means "no amount" on the wire
            amount: request.amount.filter(|a| *a > 0),
            frequency: request.frequency,
            next_due_date: request.next_due_date,
            is_active: true,
            created_at: Utc::now(),
        };

        let reminder = self.reminder_repository.create(reminder).await?;
        tracing::info!(
            "Created {} reminder id={} for user_id={} due {}",
            reminder.frequency.as_tag(),
            reminder.id,
            user_id,
            reminder.next_due_date
        );
        Ok(reminder)
    }

    async fn get_reminders(&self, user_id: Uuid) -> Result<Vec<Reminder>, ReminderError> {
        Ok(self.reminder_repository.find_by_user(user_id).await?)
    }

    async fn complete_reminder(&self, user_id: Uuid, id: Uuid) -> Result<Reminder, ReminderError> {
        let updated = self
            .move_due_date(user_id, id, |r| next_due_date(r.next_due_date, r.frequency))
            .await?;
        tracing::info!(
            "Completed reminder id={}, next due {}",
            id,
            updated.next_due_date
        );
        Ok(updated)
    }

    async fn snooze_reminder(&self, user_id: Uuid, id: Uuid) -> Result<Reminder, ReminderError> {
        let updated = self
            .move_due_date(user_id, id, |r| snoozed_due_date(r.next_due_date))
            .await?;
        tracing::info!(
            "Snoozed reminder id={} until {}",
            id,
            updated.next_due_date
        );
        Ok(updated)
    }
}
