use axum::{
    extract::{rejection::JsonRejection, Extension, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::handlers::{invalid_body, validation_error, ErrorResponse};
use crate::middleware::auth_middleware::AuthenticatedUser;
use crate::models::reminder::{CreateReminderRequest, Reminder};
use crate::scheduler::{ReminderScheduler, SchedulerStatus};
use crate::services::reminder_checker::{CheckSummary, CheckerError};
use crate::services::reminder_service::{ReminderError, ReminderService};

/// Convert ReminderError to HTTP response
impl IntoResponse for ReminderError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            ReminderError::ReminderNotFound => (
                StatusCode::NOT_FOUND,
                "reminder_not_found",
                "Reminder not found".to_string(),
            ),
            ReminderError::InvalidAmount => (
                StatusCode::BAD_REQUEST,
                "invalid_amount",
                "Amount must not be negative".to_string(),
            ),
            ReminderError::DueDateOutOfRange => (
                StatusCode::BAD_REQUEST,
                "due_date_out_of_range",
                "Next due date cannot be represented".to_string(),
            ),
            ReminderError::Conflict => (
                StatusCode::CONFLICT,
                "reminder_conflict",
                "Reminder was changed by another request, try again".to_string(),
            ),
            ReminderError::DatabaseError(msg) => {
                tracing::error!("Reminder database error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", msg)
            }
        };

        ErrorResponse::new(error_type, &message).with_status(status)
    }
}

impl IntoResponse for CheckerError {
    fn into_response(self) -> Response {
        tracing::error!("Manual reminder check failed: {}", self);
        ErrorResponse::new("check_failed", &self.to_string())
            .with_status(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

/// Result of a manual reminder check
#[derive(Debug, Serialize, ToSchema)]
pub struct CheckResponse {
    pub summary: CheckSummary,
    pub scheduler: SchedulerStatus,
}

/// Handler for creating a reminder
///
/// Creates a recurring payment reminder for the authenticated user. The
/// frequency must be one of minutely, hourly, daily, weekly, monthly, yearly.
#[utoipa::path(
    post,
    path = "/api/reminders",
    request_body = CreateReminderRequest,
    responses(
        (status = 201, description = "Reminder successfully created", body = Reminder),
        (status = 400, description = "Validation error or unknown frequency", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "reminders"
)]
pub async fn create_reminder_handler(
    State(reminder_service): State<Arc<dyn ReminderService>>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    payload: Result<Json<CreateReminderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Reminder>), Response> {
    let Json(request) = payload.map_err(invalid_body)?;
    let request = request.trimmed();

    if let Err(errors) = request.validate() {
        return Err(validation_error(&errors));
    }

    match reminder_service
        .create_reminder(auth_user.user_id, request)
        .await
    {
        Ok(reminder) => Ok((StatusCode::CREATED, Json(reminder))),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for listing reminders
///
/// Retrieves the authenticated user's reminders, soonest due first.
#[utoipa::path(
    get,
    path = "/api/reminders",
    responses(
        (status = 200, description = "List of reminders", body = Vec<Reminder>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "reminders"
)]
pub async fn list_reminders_handler(
    State(reminder_service): State<Arc<dyn ReminderService>>,
    Extension(auth_user): Extension<AuthenticatedUser>,
) -> Result<Json<Vec<Reminder>>, Response> {
    match reminder_service.get_reminders(auth_user.user_id).await {
        Ok(reminders) => Ok(Json(reminders)),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for completing the current occurrence of a reminder
#[utoipa::path(
    post,
    path = "/api/reminders/{id}/complete",
    params(
        ("id" = Uuid, Path, description = "Reminder ID")
    ),
    responses(
        (status = 200, description = "Reminder moved to its next occurrence", body = Reminder),
        (status = 404, description = "Reminder not found", body = ErrorResponse),
        (status = 409, description = "Reminder changed concurrently", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "reminders"
)]
pub async fn complete_reminder_handler(
    State(reminder_service): State<Arc<dyn ReminderService>>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(reminder_id): Path<Uuid>,
) -> Result<Json<Reminder>, Response> {
    match reminder_service
        .complete_reminder(auth_user.user_id, reminder_id)
        .await
    {
        Ok(reminder) => Ok(Json(reminder)),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for snoozing a reminder by 24 hours
#[utoipa::path(
    post,
    path = "/api/reminders/{id}/snooze",
    params(
        ("id" = Uuid, Path, description = "Reminder ID")
    ),
    responses(
        (status = 200, description = "Reminder postponed by a day", body = Reminder),
        (status = 404, description = "Reminder not found", body = ErrorResponse),
        (status = 409, description = "Reminder changed concurrently", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "reminders"
)]
pub async fn snooze_reminder_handler(
    State(reminder_service): State<Arc<dyn ReminderService>>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(reminder_id): Path<Uuid>,
) -> Result<Json<Reminder>, Response> {
    match reminder_service
        .snooze_reminder(auth_user.user_id, reminder_id)
        .await
    {
        Ok(reminder) => Ok(Json(reminder)),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for running a reminder check immediately
///
/// Waits for any pass already in progress, then processes every due reminder.
#[utoipa::path(
    post,
    path = "/api/reminders/check",
    responses(
        (status = 200, description = "Check completed", body = CheckResponse),
        (status = 500, description = "Due reminders could not be loaded", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "reminders"
)]
pub async fn check_reminders_handler(
    State(scheduler): State<ReminderScheduler>,
) -> Result<Json<CheckResponse>, Response> {
    let summary = scheduler.trigger_now().await.map_err(|e| e.into_response())?;

    Ok(Json(CheckResponse {
        summary,
        scheduler: scheduler.status().await,
    }))
}

/// Handler for reporting scheduler state
#[utoipa::path(
    get,
    path = "/api/reminders/scheduler",
    responses(
        (status = 200, description = "Scheduler status", body = SchedulerStatus)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "reminders"
)]
pub async fn scheduler_status_handler(
    State(scheduler): State<ReminderScheduler>,
) -> Json<SchedulerStatus> {
    Json(scheduler.status().await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::reminder::Frequency;
    use crate::services::notification_service::NotificationServiceImpl;
    use crate::services::reminder_checker::ReminderChecker;
    use crate::services::reminder_service::ReminderServiceImpl;
    use crate::test_support::{
        MockPushClient, MockPushSubscriptionRepository, MockReminderRepository,
    };
    use chrono::{Duration, TimeZone, Utc};

    fn reminder_service(repo: Arc<MockReminderRepository>) -> Arc<dyn ReminderService> {
        Arc::new(ReminderServiceImpl::new(repo))
    }

    fn scheduler(repo: Arc<MockReminderRepository>) -> ReminderScheduler {
        let notifications = Arc::new(NotificationServiceImpl::new(
            Arc::new(MockPushSubscriptionRepository::new()),
            Arc::new(MockPushClient::new()),
            String::new(),
        ));
        ReminderScheduler::new(
            Arc::new(ReminderChecker::new(repo, notifications)),
            std::time::Duration::from_secs(60),
            std::time::Duration::from_secs(2),
        )
    }

    fn auth_user() -> AuthenticatedUser {
        AuthenticatedUser {
            user_id: Uuid::new_v4(),
        }
    }

    fn request(frequency: Frequency) -> CreateReminderRequest {
        CreateReminderRequest {
            title: "شارژ ساختمان".to_string(),
            amount: Some(800000),
            frequency,
            next_due_date: Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap(),
        }
    }

    async fn create(
        service: &Arc<dyn ReminderService>,
        user: &AuthenticatedUser,
        frequency: Frequency,
    ) -> Reminder {
        let (status, Json(reminder)) = create_reminder_handler(
            State(service.clone()),
            Extension(user.clone()),
            Ok(Json(request(frequency))),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        reminder
    }

    #[tokio::test]
    async fn test_create_reminder_handler_success() {
        let service = reminder_service(Arc::new(MockReminderRepository::new()));
        let result = create_reminder_handler(
            State(service),
            Extension(auth_user()),
            Ok(Json(request(Frequency::Monthly))),
        )
        .await;

        let (status, Json(reminder)) = result.unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(reminder.frequency, Frequency::Monthly);
        assert!(reminder.is_active);
    }

    #[tokio::test]
    async fn test_create_reminder_handler_validation_error() {
        let service = reminder_service(Arc::new(MockReminderRepository::new()));
        let mut req = request(Frequency::Daily);
        req.title = String::new();

        let result =
            create_reminder_handler(State(service), Extension(auth_user()), Ok(Json(req))).await;

        assert_eq!(result.unwrap_err().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_create_reminder_handler_blank_title() {
        let repo = Arc::new(MockReminderRepository::new());
        let service = reminder_service(repo.clone());
        let mut req = request(Frequency::Daily);
        req.title = "   ".to_string();

        let result =
            create_reminder_handler(State(service.clone()), Extension(auth_user()), Ok(Json(req)))
                .await;

        assert_eq!(result.unwrap_err().status(), StatusCode::BAD_REQUEST);
        assert!(repo.is_empty());
    }

    #[tokio::test]
    async fn test_complete_and_snooze_handlers() {
        let service = reminder_service(Arc::new(MockReminderRepository::new()));
        let user = auth_user();
        let reminder = create(&service, &user, Frequency::Monthly).await;

        let Json(completed) = complete_reminder_handler(
            State(service.clone()),
            Extension(user.clone()),
            Path(reminder.id),
        )
        .await
        .unwrap();
        assert_eq!(
            completed.next_due_date,
            Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap()
        );

        let Json(snoozed) =
            snooze_reminder_handler(State(service), Extension(user), Path(reminder.id))
                .await
                .unwrap();
        assert_eq!(
            snoozed.next_due_date - completed.next_due_date,
            Duration::hours(24)
        );
    }

    #[tokio::test]
    async fn test_complete_handler_other_users_reminder() {
        let service = reminder_service(Arc::new(MockReminderRepository::new()));
        let reminder = create(&service, &auth_user(), Frequency::Daily).await;

        let result =
            complete_reminder_handler(State(service), Extension(auth_user()), Path(reminder.id))
                .await;

        assert_eq!(result.unwrap_err().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_complete_handler_conflict() {
        let repo = Arc::new(MockReminderRepository::new());
        let service = reminder_service(repo.clone());
        let user = auth_user();
        let reminder = create(&service, &user, Frequency::Daily).await;
        for days in 1..=3 {
            repo.interfere_once(reminder.id, reminder.next_due_date + Duration::days(days));
        }

        let result =
            complete_reminder_handler(State(service), Extension(user), Path(reminder.id)).await;

        assert_eq!(result.unwrap_err().status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_check_reminders_handler_processes_due() {
        let repo = Arc::new(MockReminderRepository::new());
        let service = reminder_service(repo.clone());
        let reminder = create(&service, &auth_user(), Frequency::Daily).await;

        let Json(response) = check_reminders_handler(State(scheduler(repo.clone())))
            .await
            .unwrap();

        assert_eq!(response.summary.processed, 1);
        assert!(response.scheduler.last_run_at.is_some());
        assert!(!response.scheduler.is_running);
        assert!(repo.get(reminder.id).unwrap().next_due_date > reminder.next_due_date);
    }

    #[tokio::test]
    async fn test_check_reminders_handler_load_failure() {
        let repo = Arc::new(MockReminderRepository::with_failure());

        let result = check_reminders_handler(State(scheduler(repo))).await;
        assert_eq!(
            result.unwrap_err().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_scheduler_status_handler() {
        let Json(status) =
            scheduler_status_handler(State(scheduler(Arc::new(MockReminderRepository::new()))))
                .await;

        assert!(!status.is_running);
        assert_eq!(status.interval_seconds, 60);
        assert!(status.last_summary.is_none());
    }
}
