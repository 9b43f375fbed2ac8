use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::services::auth_service::{AuthError, AuthService};

/// Extension type to store authenticated user ID in request
#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
}

/// Validates the bearer token and adds [`AuthenticatedUser`] to request extensions
pub async fn auth_middleware(
    State(auth_service): State<Arc<dyn AuthService>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthRejection> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AuthRejection::MissingToken)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AuthRejection::InvalidTokenFormat)?;

    let user_id = auth_service
        .validate_token(token)
        .await
        .map_err(|e| match e {
            AuthError::TokenExpired => AuthRejection::TokenExpired,
            _ => AuthRejection::InvalidToken,
        })?;

    request
        .extensions_mut()
        .insert(AuthenticatedUser { user_id });

    Ok(next.run(request).await)
}

/// Reasons a request is turned away before reaching a protected handler
#[derive(Debug)]
pub enum AuthRejection {
    MissingToken,
    InvalidTokenFormat,
    InvalidToken,
    TokenExpired,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let message = match self {
            AuthRejection::MissingToken => "Missing authorization token",
            AuthRejection::InvalidTokenFormat => {
                "Invalid authorization header format. Expected: Bearer <token>"
            }
            AuthRejection::InvalidToken => "Invalid or malformed token",
            AuthRejection::TokenExpired => "Token has expired",
        };
        tracing::debug!("Rejected request: {}", message);

        (StatusCode::UNAUTHORIZED, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::{AuthToken, LoginRequest};
    use crate::models::user::{CreateUserRequest, User};
    use crate::services::auth_service::AuthServiceImpl;
    use crate::test_support::MockUserRepository;
    use axum::{body::Body, http::Request, middleware, routing::get, Router};
    use chrono::{Duration, Utc};
    use jsonwebtoken::{encode, EncodingKey, Header};
    use tower::ServiceExt;

    const SECRET: &str = "test_secret";

    async fn protected_handler(
        axum::Extension(user): axum::Extension<AuthenticatedUser>,
    ) -> impl IntoResponse {
        Json(json!({
            "user_id": user.user_id.to_string(),
            "message": "Access granted"
        }))
    }

    fn auth_service() -> Arc<dyn AuthService> {
        Arc::new(AuthServiceImpl::new(
            Arc::new(MockUserRepository::new()),
            SECRET.to_string(),
        ))
    }

    fn create_test_app(auth_service: Arc<dyn AuthService>) -> Router {
        Router::new()
            .route("/protected", get(protected_handler))
            .layer(middleware::from_fn_with_state(
                auth_service.clone(),
                auth_middleware,
            ))
            .with_state(auth_service)
    }

    async fn create_test_user_and_token(auth_service: &Arc<dyn AuthService>) -> (User, AuthToken) {
        let register_request = CreateUserRequest {
            name: "Test User".to_string(),
            email: "test@example.com".to_string(),
            password: "password123".to_string(),
        };

        let user = auth_service.register(register_request).await.unwrap();

        let login_request = LoginRequest {
            email: "test@example.com".to_string(),
            password: "password123".to_string(),
        };

        let token = auth_service.login(login_request).await.unwrap();

        (user, token)
    }

    async fn call(app: Router, authorization: Option<&str>) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().uri("/protected");
        if let Some(value) = authorization {
            builder = builder.header("Authorization", value);
        }

        let response = app
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_middleware_with_valid_token() {
        let auth_service = auth_service();
        let (user, token) = create_test_user_and_token(&auth_service).await;

        let (status, body) = call(
            create_test_app(auth_service),
            Some(&format!("Bearer {}", token.token)),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user_id"], user.id.to_string());
        assert_eq!(body["message"], "Access granted");
    }

    #[tokio::test]
    async fn test_middleware_without_token() {
        let (status, body) = call(create_test_app(auth_service()), None).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["error"]
            .as_str()
            .unwrap()
            .contains("Missing authorization token"));
    }

    #[tokio::test]
    async fn test_middleware_with_invalid_token() {
        let (status, body) = call(
            create_test_app(auth_service()),
            Some("Bearer invalid_token_here"),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["error"]
            .as_str()
            .unwrap()
            .contains("Invalid or malformed token"));
    }

    #[tokio::test]
    async fn test_middleware_with_malformed_header() {
        let (status, body) = call(create_test_app(auth_service()), Some("some_token")).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["error"]
            .as_str()
            .unwrap()
            .contains("Invalid authorization header format"));
    }

    #[tokio::test]
    async fn test_middleware_with_expired_token() {
        let issued = Utc::now() - Duration::hours(48);
        let claims = json!({
            "sub": Uuid::new_v4().to_string(),
            "iat": issued.timestamp(),
            "exp": (issued + Duration::hours(24)).timestamp(),
        });
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        let (status, body) = call(
            create_test_app(auth_service()),
            Some(&format!("Bearer {}", token)),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Token has expired");
    }
}
