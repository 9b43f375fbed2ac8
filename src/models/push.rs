use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

pub const NOTIFICATION_ICON: &str = "/icon-192x192.png";

/// A browser push endpoint registered by a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct PushSubscription {
    pub user_id: Uuid,
    pub endpoint: String,
    pub p256dh: String,
    pub auth: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct SubscriptionKeys {
    #[validate(length(min = 1, message = "p256dh key is required"))]
    pub p256dh: String,
    #[validate(length(min = 1, message = "auth key is required"))]
    pub auth: String,
}

/// Serialized `PushSubscription` as produced by the browser's PushManager
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "endpoint": "https://fcm.googleapis.com/fcm/send/abc123",
    "keys": {"p256dh": "BNcRdreALRFXTkOOUHK1EtK2wtaz5Ry4YfYCA_0QTpQtUbVlUls0VJXg7A8u-Ts1XbjhazAkj7I99e8QcYP7DkM", "auth": "tBHItJI5svbpez7KI4CCXg"}
}))]
pub struct SubscribeRequest {
    #[validate(url(message = "Endpoint must be a valid URL"))]
    pub endpoint: String,
    #[validate(nested)]
    pub keys: SubscriptionKeys,
}

/// Request payload for a manual test notification
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct TestNotificationRequest {
    #[validate(length(min = 1, max = 500, message = "Message must be between 1 and 500 characters"))]
    pub message: String,
}

/// JSON body delivered to the service worker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PushPayload {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub data: Option<serde_json::Value>,
}

impl PushPayload {
    pub fn new(title: &str, body: &str, data: Option<serde_json::Value>) -> Self {
        Self {
            title: title.to_string(),
            body: body.to_string(),
            icon: NOTIFICATION_ICON.to_string(),
            badge: NOTIFICATION_ICON.to_string(),
            data,
        }
    }
}
