//! Full router wired to the crate's in-memory repositories and push client,
//! so it can be exercised without a database.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use expense_reminders::app::{build_router, AppState};
use expense_reminders::scheduler::ReminderScheduler;
use expense_reminders::services::auth_service::AuthServiceImpl;
use expense_reminders::services::category_service::CategoryServiceImpl;
use expense_reminders::services::expense_service::ExpenseServiceImpl;
use expense_reminders::services::notification_service::NotificationServiceImpl;
use expense_reminders::services::reminder_checker::ReminderChecker;
use expense_reminders::services::reminder_service::ReminderServiceImpl;
use expense_reminders::test_support::{
    MockCategoryRepository, MockExpenseRepository, MockPushClient,
    MockPushSubscriptionRepository, MockReminderRepository, MockUserRepository,
};

pub struct TestContext {
    pub app: Router,
    pub reminders: Arc<MockReminderRepository>,
    pub subscriptions: Arc<MockPushSubscriptionRepository>,
    pub push_client: Arc<MockPushClient>,
    pub scheduler: ReminderScheduler,
}

impl TestContext {
    pub fn new() -> Self {
        let reminders = Arc::new(MockReminderRepository::new());
        let subscriptions = Arc::new(MockPushSubscriptionRepository::new());
        let push_client = Arc::new(MockPushClient::new());

        let category_service = Arc::new(CategoryServiceImpl::new(Arc::new(
            MockCategoryRepository::new(),
        )));
        let notification_service = Arc::new(NotificationServiceImpl::new(
            subscriptions.clone(),
            push_client.clone(),
            "BTestVapidPublicKey".to_string(),
        ));
        let scheduler = ReminderScheduler::new(
            Arc::new(ReminderChecker::new(
                reminders.clone(),
                notification_service.clone(),
            )),
            Duration::from_secs(60),
            Duration::from_secs(2),
        );

        let state = AppState {
            auth_service: Arc::new(AuthServiceImpl::new(
                Arc::new(MockUserRepository::new()),
                "integration_secret".to_string(),
            )),
            expense_service: Arc::new(ExpenseServiceImpl::new(
                Arc::new(MockExpenseRepository::new()),
                category_service.clone(),
            )),
            category_service,
            reminder_service: Arc::new(ReminderServiceImpl::new(reminders.clone())),
            notification_service,
            scheduler: scheduler.clone(),
        };

        Self {
            app: build_router(state),
            reminders,
            subscriptions,
            push_client,
            scheduler,
        }
    }

    /// Sends a request through the router and returns status and parsed JSON
    /// (`Value::Null` for empty or non-JSON bodies).
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    pub async fn get_text(&self, uri: &str) -> (StatusCode, String) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Registers a fresh account and returns its bearer token
    pub async fn register_and_login(&self, email: &str) -> String {
        let (status, _) = self
            .send(
                "POST",
                "/api/auth/register",
                None,
                Some(serde_json::json!({
                    "name": "Test User",
                    "email": email,
                    "password": "password123"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = self
            .send(
                "POST",
                "/api/auth/login",
                None,
                Some(serde_json::json!({ "email": email, "password": "password123" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().unwrap().to_string()
    }
}
