//! One pass over the due reminders: notify the owner, then move the
//! reminder to its next occurrence.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::models::reminder::Reminder;
use crate::repositories::reminder_repository::ReminderRepository;
use crate::repositories::RepositoryError;
use crate::services::due_date::next_due_date;
use crate::services::notification_service::NotificationService;
use crate::validation::format_toman;

pub const REMINDER_NOTIFICATION_TITLE: &str = "💰 یادآوری هزینه";

#[derive(Debug, thiserror::Error)]
pub enum CheckerError {
    #[error("Failed to load due reminders: {0}")]
    LoadFailed(String),
}

impl From<RepositoryError> for CheckerError {
    fn from(err: RepositoryError) -> Self {
        CheckerError::LoadFailed(err.to_string())
    }
}

/// Outcome of a single pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct CheckSummary {
    /// Reminders that were due when the pass started
    pub due: usize,
    /// Reminders notified and advanced
    pub processed: usize,
    pub failed: usize,
}

/// Title, body and data for the push sent when a reminder comes due
pub fn reminder_message(reminder: &Reminder) -> (String, String, Value) {
    let body = match reminder.amount {
        Some(amount) => format!(
            "یادآوری: {} - {} تومان",
            reminder.title,
            format_toman(amount)
        ),
        None => format!("یادآوری: {}", reminder.title),
    };

    let data = json!({
        "type": "reminder",
        "reminderId": reminder.id,
        "frequency": reminder.frequency.as_tag(),
    });

    (REMINDER_NOTIFICATION_TITLE.to_string(), body, data)
}

pub struct ReminderChecker {
    reminder_repository: Arc<dyn ReminderRepository>,
    notification_service: Arc<dyn NotificationService>,
}

impl ReminderChecker {
    pub fn new(
        reminder_repository: Arc<dyn ReminderRepository>,
        notification_service: Arc<dyn NotificationService>,
    ) -> Self {
        Self {
            reminder_repository,
            notification_service,
        }
    }

    /// Processes every reminder due at `now`. A failing reminder is logged
    /// and counted; only failing to load the due set aborts the pass.
    pub async fn run_pass(&self, now: DateTime<Utc>) -> Result<CheckSummary, CheckerError> {
        let due = self.reminder_repository.find_due(now).await?;
        let mut summary = CheckSummary {
            due: due.len(),
            ..CheckSummary::default()
        };

        if due.is_empty() {
            tracing::debug!("No reminders due at {}", now);
            return Ok(summary);
        }

        tracing::info!("Found {} due reminders", due.len());

        for reminder in &due {
            if self.process(reminder).await {
                summary.processed += 1;
            } else {
                summary.failed += 1;
            }
        }

        tracing::info!(
            "Reminder pass finished: due={} processed={} failed={}",
            summary.due,
            summary.processed,
            summary.failed
        );
        Ok(summary)
    }

    async fn process(&self, reminder: &Reminder) -> bool {
        let (title, body, data) = reminder_message(reminder);

        match self
            .notification_service
            .send_to_user(reminder.user_id, &title, &body, Some(data))
            .await
        {
            Ok(report) if report.failed > 0 => {
                tracing::warn!(
                    "Reminder id={} delivered to {} of {} subscriptions",
                    reminder.id,
                    report.sent,
                    report.attempted()
                );
            }
            Ok(_) => {}
            Err(err) => {
                tracing::error!("Failed to notify for reminder id={}: {}", reminder.id, err);
                return false;
            }
        }

        let Some(next) = next_due_date(reminder.next_due_date, reminder.frequency) else {
            tracing::error!(
                "Next due date for reminder id={} is out of range",
                reminder.id
            );
            return false;
        };

        match self
            .reminder_repository
            .update_next_due_date(reminder.id, reminder.next_due_date, next)
            .await
        {
            Ok(Some(_)) => {
                tracing::debug!("Reminder id={} next due {}", reminder.id, next);
                true
            }
            // completed or snoozed while we were notifying; that move wins
            Ok(None) => {
                tracing::info!(
                    "Reminder id={} was moved during the pass, keeping its new due date",
                    reminder.id
                );
                true
            }
            Err(err) => {
                tracing::error!(
                    "Failed to advance reminder id={}: {}",
                    reminder.id,
                    err
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::push::{SubscribeRequest, SubscriptionKeys};
    use crate::models::reminder::Frequency;
    use crate::services::notification_service::NotificationServiceImpl;
    use crate::test_support::{
        MockPushClient, MockPushSubscriptionRepository, MockReminderRepository,
    };
    use chrono::TimeZone;
    use uuid::Uuid;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn reminder(
        user_id: Uuid,
        frequency: Frequency,
        due: DateTime<Utc>,
        amount: Option<i64>,
    ) -> Reminder {
        Reminder {
            id: Uuid::new_v4(),
            user_id,
            title: "قبض برق".to_string(),
            amount,
            frequency,
            next_due_date: due,
            is_active: true,
            created_at: at(2023, 12, 1, 0, 0),
        }
    }

    struct Fixture {
        reminders: Arc<MockReminderRepository>,
        notifications: Arc<NotificationServiceImpl>,
        push_client: Arc<MockPushClient>,
        checker: ReminderChecker,
    }

    fn setup() -> Fixture {
        let reminders = Arc::new(MockReminderRepository::new());
        let push_client = Arc::new(MockPushClient::new());
        let notifications = Arc::new(NotificationServiceImpl::new(
            Arc::new(MockPushSubscriptionRepository::new()),
            push_client.clone(),
            "test-key".to_string(),
        ));
        let checker = ReminderChecker::new(reminders.clone(), notifications.clone());
        Fixture {
            reminders,
            notifications,
            push_client,
            checker,
        }
    }

    async fn subscribe(fixture: &Fixture, user_id: Uuid, endpoint: &str) {
        fixture
            .notifications
            .subscribe(
                user_id,
                SubscribeRequest {
                    endpoint: endpoint.to_string(),
                    keys: SubscriptionKeys {
                        p256dh: "p256dh".to_string(),
                        auth: "auth".to_string(),
                    },
                },
            )
            .await
            .unwrap();
    }

    #[test]
    fn test_message_with_amount() {
        let r = reminder(Uuid::new_v4(), Frequency::Monthly, at(2024, 1, 1, 0, 0), Some(250000));
        let (title, body, data) = reminder_message(&r);

        assert_eq!(title, "💰 یادآوری هزینه");
        assert_eq!(body, "یادآوری: قبض برق - 250,000 تومان");
        assert_eq!(data["type"], "reminder");
        assert_eq!(data["reminderId"], r.id.to_string());
        assert_eq!(data["frequency"], "monthly");
    }

    #[test]
    fn test_message_without_amount() {
        let r = reminder(Uuid::new_v4(), Frequency::Daily, at(2024, 1, 1, 0, 0), None);
        let (_, body, _) = reminder_message(&r);

        assert_eq!(body, "یادآوری: قبض برق");
    }

    #[tokio::test]
    async fn test_daily_reminder_dispatched_and_advanced() {
        let fixture = setup();
        let user_id = Uuid::new_v4();
        subscribe(&fixture, user_id, "https://push.example.com/a").await;
        let r = reminder(user_id, Frequency::Daily, at(2024, 1, 1, 0, 0), Some(50000));
        fixture.reminders.insert(r.clone());

        let summary = fixture.checker.run_pass(at(2024, 1, 2, 0, 5)).await.unwrap();

        assert_eq!(
            summary,
            CheckSummary {
                due: 1,
                processed: 1,
                failed: 0
            }
        );
        let delivered = fixture.push_client.delivered();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].1.body, "یادآوری: قبض برق - 50,000 تومان");
        assert_eq!(
            fixture.reminders.get(r.id).unwrap().next_due_date,
            at(2024, 1, 2, 0, 0)
        );
    }

    #[tokio::test]
    async fn test_only_due_active_reminders_selected() {
        let fixture = setup();
        let user_id = Uuid::new_v4();
        let now = at(2024, 6, 1, 12, 0);

        let past = reminder(user_id, Frequency::Weekly, at(2024, 5, 30, 0, 0), None);
        let future = reminder(user_id, Frequency::Weekly, at(2024, 6, 2, 0, 0), None);
        let mut inactive = reminder(user_id, Frequency::Weekly, at(2024, 5, 1, 0, 0), None);
        inactive.is_active = false;
        let exact = reminder(user_id, Frequency::Hourly, now, None);

        for r in [&past, &future, &inactive, &exact] {
            fixture.reminders.insert(r.clone());
        }

        let summary = fixture.checker.run_pass(now).await.unwrap();

        assert_eq!(summary.due, 2);
        assert_eq!(summary.processed, 2);
        assert_eq!(
            fixture.reminders.get(past.id).unwrap().next_due_date,
            at(2024, 6, 6, 0, 0)
        );
        assert_eq!(
            fixture.reminders.get(exact.id).unwrap().next_due_date,
            at(2024, 6, 1, 13, 0)
        );
        assert_eq!(fixture.reminders.get(future.id).unwrap().next_due_date, future.next_due_date);
        assert_eq!(
            fixture.reminders.get(inactive.id).unwrap().next_due_date,
            inactive.next_due_date
        );
    }

    #[tokio::test]
    async fn test_advances_without_subscriptions() {
        let fixture = setup();
        let r = reminder(Uuid::new_v4(), Frequency::Minutely, at(2024, 1, 1, 0, 0), None);
        fixture.reminders.insert(r.clone());

        let summary = fixture.checker.run_pass(at(2024, 1, 1, 0, 0)).await.unwrap();

        assert_eq!(summary.processed, 1);
        assert_eq!(
            fixture.reminders.get(r.id).unwrap().next_due_date,
            at(2024, 1, 1, 0, 1)
        );
    }

    #[tokio::test]
    async fn test_concurrent_complete_is_not_overwritten() {
        let fixture = setup();
        let user_id = Uuid::new_v4();
        let due = reminder(user_id, Frequency::Daily, at(2024, 1, 1, 9, 0), None);
        fixture.reminders.insert(due.clone());
        // the owner completes it while the notification is in flight
        fixture.reminders.interfere_once(due.id, at(2024, 1, 2, 9, 0));

        let summary = fixture.checker.run_pass(at(2024, 1, 1, 9, 30)).await.unwrap();

        assert_eq!(summary.processed, 1);
        assert_eq!(summary.failed, 0);
        assert_eq!(
            fixture.reminders.get(due.id).unwrap().next_due_date,
            at(2024, 1, 2, 9, 0)
        );
    }

    #[tokio::test]
    async fn test_failed_update_does_not_block_others() {
        let fixture = setup();
        let user_id = Uuid::new_v4();
        let broken = reminder(user_id, Frequency::Daily, at(2024, 1, 1, 0, 0), None);
        let healthy = reminder(user_id, Frequency::Daily, at(2024, 1, 1, 1, 0), None);
        fixture.reminders.insert(broken.clone());
        fixture.reminders.insert(healthy.clone());
        fixture.reminders.fail_update_for(broken.id);

        let summary = fixture.checker.run_pass(at(2024, 1, 2, 0, 0)).await.unwrap();

        assert_eq!(
            summary,
            CheckSummary {
                due: 2,
                processed: 1,
                failed: 1
            }
        );
        assert_eq!(
            fixture.reminders.get(healthy.id).unwrap().next_due_date,
            at(2024, 1, 2, 1, 0)
        );
        assert_eq!(
            fixture.reminders.get(broken.id).unwrap().next_due_date,
            broken.next_due_date
        );
    }

    #[tokio::test]
    async fn test_one_failed_delivery_still_advances() {
        let fixture = setup();
        let user_id = Uuid::new_v4();
        subscribe(&fixture, user_id, "https://push.example.com/phone").await;
        subscribe(&fixture, user_id, "https://push.example.com/laptop").await;
        fixture.push_client.fail_endpoint("https://push.example.com/phone");
        let r = reminder(user_id, Frequency::Hourly, at(2024, 1, 1, 8, 0), None);
        fixture.reminders.insert(r.clone());

        let summary = fixture.checker.run_pass(at(2024, 1, 1, 8, 30)).await.unwrap();

        assert_eq!(summary.processed, 1);
        let delivered = fixture.push_client.delivered();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].0, "https://push.example.com/laptop");
        assert_eq!(
            fixture.reminders.get(r.id).unwrap().next_due_date,
            at(2024, 1, 1, 9, 0)
        );
    }

    #[tokio::test]
    async fn test_load_failure_aborts_pass() {
        let push_client = Arc::new(MockPushClient::new());
        let notifications = Arc::new(NotificationServiceImpl::new(
            Arc::new(MockPushSubscriptionRepository::new()),
            push_client,
            String::new(),
        ));
        let checker =
            ReminderChecker::new(Arc::new(MockReminderRepository::with_failure()), notifications);

        let result = checker.run_pass(Utc::now()).await;
        assert!(matches!(result, Err(CheckerError::LoadFailed(_))));
    }

    #[tokio::test]
    async fn test_second_pass_is_idempotent() {
        let fixture = setup();
        let user_id = Uuid::new_v4();
        subscribe(&fixture, user_id, "https://push.example.com/a").await;
        fixture
            .reminders
            .insert(reminder(user_id, Frequency::Daily, at(2024, 1, 1, 0, 0), None));
        let now = at(2024, 1, 1, 12, 0);

        fixture.checker.run_pass(now).await.unwrap();
        let second = fixture.checker.run_pass(now).await.unwrap();

        assert_eq!(second.due, 0);
        assert_eq!(fixture.push_client.delivered().len(), 1);
    }
}
