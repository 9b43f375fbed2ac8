use async_trait::async_trait;
use web_push::{
    ContentEncoding, IsahcWebPushClient, SubscriptionInfo, VapidSignatureBuilder,
    WebPushClient, WebPushError, WebPushMessageBuilder,
};

use crate::models::push::PushSubscription;

/// Seconds a push service may hold an undelivered message
const MESSAGE_TTL_SECONDS: u32 = 24 * 60 * 60;

/// Outcome of a single failed delivery attempt
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// The push service reports the endpoint no longer exists (404/410)
    #[error("Endpoint is gone")]
    Gone,

    #[error("Delivery failed: {0}")]
    Failed(String),
}

impl From<WebPushError> for DeliveryError {
    fn from(err: WebPushError) -> Self {
        match err {
            WebPushError::EndpointNotValid { .. } | WebPushError::EndpointNotFound { .. } => {
                DeliveryError::Gone
            }
            other => DeliveryError::Failed(other.to_string()),
        }
    }
}

/// Sends an already serialized payload to one subscription
#[async_trait]
pub trait PushClient: Send + Sync {
    async fn deliver(
        &self,
        subscription: &PushSubscription,
        payload: &[u8],
    ) -> Result<(), DeliveryError>;
}

/// Web Push (RFC 8030) client signing requests with a VAPID key
pub struct VapidPushClient {
    client: IsahcWebPushClient,
    private_key_pem: String,
    subject: String,
}

impl VapidPushClient {
    pub fn new(private_key_pem: String, subject: String) -> Result<Self, WebPushError> {
        Ok(Self {
            client: IsahcWebPushClient::new()?,
            private_key_pem,
            subject,
        })
    }

    fn build_message(
        &self,
        subscription: &PushSubscription,
        payload: &[u8],
    ) -> Result<web_push::WebPushMessage, WebPushError> {
        let subscription_info = SubscriptionInfo::new(
            subscription.endpoint.as_str(),
            subscription.p256dh.as_str(),
            subscription.auth.as_str(),
        );

        let mut signature_builder =
            VapidSignatureBuilder::from_pem(self.private_key_pem.as_bytes(), &subscription_info)?;
        signature_builder.add_claim("sub", self.subject.as_str());
        let signature = signature_builder.build()?;

        let mut builder = WebPushMessageBuilder::new(&subscription_info);
        builder.set_payload(ContentEncoding::Aes128Gcm, payload);
        builder.set_ttl(MESSAGE_TTL_SECONDS);
        builder.set_vapid_signature(signature);
        builder.build()
    }
}

#[async_trait]
impl PushClient for VapidPushClient {
    async fn deliver(
        &self,
        subscription: &PushSubscription,
        payload: &[u8],
    ) -> Result<(), DeliveryError> {
        let message = self.build_message(subscription, payload)?;
        self.client.send(message).await?;
        Ok(())
    }
}

/// Used when no VAPID key is configured; every delivery fails
pub struct DisabledPushClient;

#[async_trait]
impl PushClient for DisabledPushClient {
    async fn deliver(
        &self,
        _subscription: &PushSubscription,
        _payload: &[u8],
    ) -> Result<(), DeliveryError> {
        Err(DeliveryError::Failed(
            "push delivery is not configured (VAPID_PRIVATE_KEY_PEM unset)".to_string(),
        ))
    }
}
