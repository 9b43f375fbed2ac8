use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::push::{PushPayload, PushSubscription, SubscribeRequest};
use crate::repositories::push_subscription_repository::PushSubscriptionRepository;
use crate::repositories::RepositoryError;
use crate::services::push_client::{DeliveryError, PushClient};

/// Title used for ad-hoc notifications
pub const DEFAULT_NOTIFICATION_TITLE: &str = "Expense Tracker";

/// Notification service errors
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("No push subscriptions registered")]
    NoSubscriptions,

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<RepositoryError> for NotificationError {
    fn from(err: RepositoryError) -> Self {
        NotificationError::DatabaseError(err.to_string())
    }
}

/// Per-call fan-out result
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DispatchReport {
    pub sent: usize,
    pub failed: usize,
    /// Subscriptions removed because the push service reported them gone
    pub pruned: usize,
}

impl DispatchReport {
    pub fn attempted(&self) -> usize {
        self.sent + self.failed + self.pruned
    }
}

/// Trait defining push subscription management and delivery
#[async_trait]
pub trait NotificationService: Send + Sync {
    /// Register or refresh a browser subscription
    async fn subscribe(
        &self,
        user_id: Uuid,
        request: SubscribeRequest,
    ) -> Result<PushSubscription, NotificationError>;

    /// Drop every subscription of the user
    async fn unsubscribe(&self, user_id: Uuid) -> Result<u64, NotificationError>;

    /// Best-effort delivery to every subscription of the user
    async fn send_to_user(
        &self,
        user_id: Uuid,
        title: &str,
        body: &str,
        data: Option<Value>,
    ) -> Result<DispatchReport, NotificationError>;

    /// Ad-hoc message; fails when the user has nothing to deliver to
    async fn send_test(
        &self,
        user_id: Uuid,
        message: &str,
    ) -> Result<DispatchReport, NotificationError>;

    /// Application server key clients subscribe with
    fn vapid_public_key(&self) -> &str;
}

/// Implementation of NotificationService
pub struct NotificationServiceImpl {
    subscription_repository: Arc<dyn PushSubscriptionRepository>,
    push_client: Arc<dyn PushClient>,
    vapid_public_key: String,
}

impl NotificationServiceImpl {
    pub fn new(
        subscription_repository: Arc<dyn PushSubscriptionRepository>,
        push_client: Arc<dyn PushClient>,
        vapid_public_key: String,
    ) -> Self {
        Self {
            subscription_repository,
            push_client,
            vapid_public_key,
        }
    }

    async fn prune(&self, subscription: &PushSubscription) -> bool {
        match self
            .subscription_repository
            .delete(subscription.user_id, &subscription.endpoint)
            .await
        {
            Ok(()) | Err(RepositoryError::NotFound) => true,
            Err(err) => {
                tracing::warn!(
                    "Failed to remove gone subscription user_id={} endpoint={}: {}",
                    subscription.user_id,
                    subscription.endpoint,
                    err
                );
                false
            }
        }
    }
}

#[async_trait]
impl NotificationService for NotificationServiceImpl {
    async fn subscribe(
        &self,
        user_id: Uuid,
        request: SubscribeRequest,
    ) -> Result<PushSubscription, NotificationError> {
        let subscription = self
            .subscription_repository
            .upsert(
                user_id,
                &request.endpoint,
                &request.keys.p256dh,
                &request.keys.auth,
            )
            .await?;

        tracing::info!("User user_id={} subscribed to push notifications", user_id);
        Ok(subscription)
    }

    async fn unsubscribe(&self, user_id: Uuid) -> Result<u64, NotificationError> {
        let removed = self.subscription_repository.delete_by_user(user_id).await?;
        tracing::info!(
            "User user_id={} unsubscribed, removed {} subscriptions",
            user_id,
            removed
        );
        Ok(removed)
    }

    async fn send_to_user(
        &self,
        user_id: Uuid,
        title: &str,
        body: &str,
        data: Option<Value>,
    ) -> Result<DispatchReport, NotificationError> {
        let subscriptions = self.subscription_repository.find_by_user(user_id).await?;
        let mut report = DispatchReport::default();

        if subscriptions.is_empty() {
            tracing::debug!("No push subscriptions for user_id={}", user_id);
            return Ok(report);
        }

        let payload = serde_json::to_vec(&PushPayload::new(title, body, data))
            .map_err(|e| NotificationError::Internal(e.to_string()))?;

        for subscription in &subscriptions {
            match self.push_client.deliver(subscription, &payload).await {
                Ok(()) => report.sent += 1,
                Err(DeliveryError::Gone) => {
                    tracing::info!(
                        "Push endpoint gone for user_id={}, removing {}",
                        user_id,
                        subscription.endpoint
                    );
                    if self.prune(subscription).await {
                        report.pruned += 1;
                    } else {
                        report.failed += 1;
                    }
                }
                Err(err) => {
                    tracing::error!(
                        "Push delivery failed for user_id={} endpoint={}: {}",
                        user_id,
                        subscription.endpoint,
                        err
                    );
                    report.failed += 1;
                }
            }
        }

        tracing::debug!(
            "Dispatched to user_id={}: sent={} failed={} pruned={}",
            user_id,
            report.sent,
            report.failed,
            report.pruned
        );
        Ok(report)
    }

    async fn send_test(
        &self,
        user_id: Uuid,
        message: &str,
    ) -> Result<DispatchReport, NotificationError> {
        let report = self
            .send_to_user(user_id, DEFAULT_NOTIFICATION_TITLE, message, None)
            .await?;

        if report.attempted() == 0 {
            return Err(NotificationError::NoSubscriptions);
        }
        Ok(report)
    }

    fn vapid_public_key(&self) -> &str {
        &self.vapid_public_key
    }
}
