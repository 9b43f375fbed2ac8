use axum::{
    extract::FromRef,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers::{
    auth_handlers, category_handlers, expense_handlers, push_handlers, reminder_handlers,
    ErrorResponse,
};
use crate::middleware::auth_middleware::auth_middleware;
use crate::models::{
    AuthToken, Category, CreateExpenseRequest, CreateReminderRequest, CreateUserRequest, Expense,
    Frequency, LoginRequest, PushSubscription, Reminder, SubscribeRequest, SubscriptionKeys,
    TestNotificationRequest, User,
};
use crate::scheduler::{ReminderScheduler, SchedulerStatus};
use crate::services::{
    auth_service::AuthService, category_service::CategoryService,
    expense_service::ExpenseService, notification_service::DispatchReport,
    notification_service::NotificationService, reminder_checker::CheckSummary,
    reminder_service::ReminderService,
};

/// Shared handler state; each handler extracts only the service it needs
#[derive(Clone, FromRef)]
pub struct AppState {
    pub auth_service: Arc<dyn AuthService>,
    pub category_service: Arc<dyn CategoryService>,
    pub expense_service: Arc<dyn ExpenseService>,
    pub reminder_service: Arc<dyn ReminderService>,
    pub notification_service: Arc<dyn NotificationService>,
    pub scheduler: ReminderScheduler,
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        auth_handlers::register_handler,
        auth_handlers::login_handler,
        category_handlers::list_categories_handler,
        expense_handlers::create_expense_handler,
        expense_handlers::list_expenses_handler,
        reminder_handlers::create_reminder_handler,
        reminder_handlers::list_reminders_handler,
        reminder_handlers::complete_reminder_handler,
        reminder_handlers::snooze_reminder_handler,
        reminder_handlers::check_reminders_handler,
        reminder_handlers::scheduler_status_handler,
        push_handlers::vapid_public_key_handler,
        push_handlers::subscribe_handler,
        push_handlers::unsubscribe_handler,
        push_handlers::test_notification_handler,
    ),
    components(
        schemas(
            User, CreateUserRequest, LoginRequest, AuthToken, ErrorResponse,
            Category, Expense, CreateExpenseRequest,
            Reminder, CreateReminderRequest, Frequency,
            CheckSummary, SchedulerStatus, reminder_handlers::CheckResponse,
            PushSubscription, SubscribeRequest, SubscriptionKeys, TestNotificationRequest,
            DispatchReport, push_handlers::VapidPublicKeyResponse,
            push_handlers::UnsubscribeResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Authentication endpoints"),
        (name = "categories", description = "Expense categories"),
        (name = "expenses", description = "Expense tracking"),
        (name = "reminders", description = "Recurring payment reminders"),
        (name = "push", description = "Web push subscriptions")
    ),
    info(
        title = "Expense Reminders API",
        version = "0.1.0",
        description = "Expense tracking in Toman with recurring reminders delivered by web push",
    )
)]
pub struct ApiDoc;

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route(
            "/api/categories",
            get(category_handlers::list_categories_handler),
        )
        .route(
            "/api/expenses",
            get(expense_handlers::list_expenses_handler)
                .post(expense_handlers::create_expense_handler),
        )
        .route(
            "/api/reminders",
            get(reminder_handlers::list_reminders_handler)
                .post(reminder_handlers::create_reminder_handler),
        )
        .route(
            "/api/reminders/check",
            post(reminder_handlers::check_reminders_handler),
        )
        .route(
            "/api/reminders/scheduler",
            get(reminder_handlers::scheduler_status_handler),
        )
        .route(
            "/api/reminders/{id}/complete",
            post(reminder_handlers::complete_reminder_handler),
        )
        .route(
            "/api/reminders/{id}/snooze",
            post(reminder_handlers::snooze_reminder_handler),
        )
        .route(
            "/api/push/vapid-public-key",
            get(push_handlers::vapid_public_key_handler),
        )
        .route(
            "/api/push/subscription",
            post(push_handlers::subscribe_handler).delete(push_handlers::unsubscribe_handler),
        )
        .route(
            "/api/push/test",
            post(push_handlers::test_notification_handler),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/api/auth/register", post(auth_handlers::register_handler))
        .route("/api/auth/login", post(auth_handlers::login_handler))
        .merge(protected)
        .with_state(state)
        .merge(SwaggerUi::new("/api/docs").url("/api/docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
