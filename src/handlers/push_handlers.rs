use axum::{
    extract::{rejection::JsonRejection, Extension, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use validator::Validate;

use crate::handlers::{invalid_body, validation_error, ErrorResponse};
use crate::middleware::auth_middleware::AuthenticatedUser;
use crate::models::push::{PushSubscription, SubscribeRequest, TestNotificationRequest};
use crate::services::notification_service::{
    DispatchReport, NotificationError, NotificationService,
};

impl IntoResponse for NotificationError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            NotificationError::NoSubscriptions => (
                StatusCode::NOT_FOUND,
                "no_subscriptions",
                "No push subscriptions registered for this user".to_string(),
            ),
            NotificationError::DatabaseError(msg) => {
                tracing::error!("Push database error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", msg)
            }
            NotificationError::Internal(msg) => {
                tracing::error!("Push internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg)
            }
        };

        ErrorResponse::new(error_type, &message).with_status(status)
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VapidPublicKeyResponse {
    pub public_key: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UnsubscribeResponse {
    pub removed: u64,
}

/// Handler returning the application server key browsers subscribe with
#[utoipa::path(
    get,
    path = "/api/push/vapid-public-key",
    responses(
        (status = 200, description = "VAPID public key", body = VapidPublicKeyResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "push"
)]
pub async fn vapid_public_key_handler(
    State(notification_service): State<Arc<dyn NotificationService>>,
) -> Json<VapidPublicKeyResponse> {
    Json(VapidPublicKeyResponse {
        public_key: notification_service.vapid_public_key().to_string(),
    })
}

/// Handler for registering a browser push subscription
///
/// Subscribing the same endpoint again replaces its keys.
#[utoipa::path(
    post,
    path = "/api/push/subscription",
    request_body = SubscribeRequest,
    responses(
        (status = 201, description = "Subscription stored", body = PushSubscription),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "push"
)]
pub async fn subscribe_handler(
    State(notification_service): State<Arc<dyn NotificationService>>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    payload: Result<Json<SubscribeRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PushSubscription>), Response> {
    let Json(request) = payload.map_err(invalid_body)?;

    if let Err(errors) = request.validate() {
        return Err(validation_error(&errors));
    }

    match notification_service
        .subscribe(auth_user.user_id, request)
        .await
    {
        Ok(subscription) => Ok((StatusCode::CREATED, Json(subscription))),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for removing all of the user's push subscriptions
#[utoipa::path(
    delete,
    path = "/api/push/subscription",
    responses(
        (status = 200, description = "Subscriptions removed", body = UnsubscribeResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "push"
)]
pub async fn unsubscribe_handler(
    State(notification_service): State<Arc<dyn NotificationService>>,
    Extension(auth_user): Extension<AuthenticatedUser>,
) -> Result<Json<UnsubscribeResponse>, Response> {
    match notification_service.unsubscribe(auth_user.user_id).await {
        Ok(removed) => Ok(Json(UnsubscribeResponse { removed })),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for sending a test notification to the user's devices
#[utoipa::path(
    post,
    path = "/api/push/test",
    request_body = TestNotificationRequest,
    responses(
        (status = 200, description = "Delivery report", body = DispatchReport),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 404, description = "No subscriptions registered", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "push"
)]
pub async fn test_notification_handler(
    State(notification_service): State<Arc<dyn NotificationService>>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    payload: Result<Json<TestNotificationRequest>, JsonRejection>,
) -> Result<Json<DispatchReport>, Response> {
    let Json(request) = payload.map_err(invalid_body)?;

    if let Err(errors) = request.validate() {
        return Err(validation_error(&errors));
    }

    match notification_service
        .send_test(auth_user.user_id, &request.message)
        .await
    {
        Ok(report) => Ok(Json(report)),
        Err(e) => Err(e.into_response()),
    }
}
