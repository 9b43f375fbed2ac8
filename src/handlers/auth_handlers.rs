use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use validator::Validate;

use crate::handlers::{invalid_body, validation_error, ErrorResponse};
use crate::models::auth::{AuthToken, LoginRequest};
use crate::models::user::{CreateUserRequest, User};
use crate::services::auth_service::{AuthError, AuthService};

/// Convert AuthError to HTTP response
impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            AuthError::DuplicateEmail => (
                StatusCode::CONFLICT,
                "duplicate_email",
                "Email already exists".to_string(),
            ),
            AuthError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "invalid_credentials",
                "Invalid email or password".to_string(),
            ),
            AuthError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "invalid_token",
                "Invalid authentication token".to_string(),
            ),
            AuthError::TokenExpired => (
                StatusCode::UNAUTHORIZED,
                "token_expired",
                "Authentication token has expired".to_string(),
            ),
            AuthError::DatabaseError(msg) => {
                tracing::error!("Auth database error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", msg)
            }
            AuthError::Internal(msg) => {
                tracing::error!("Auth internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg)
            }
        };

        ErrorResponse::new(error_type, &message).with_status(status)
    }
}

/// Handler for user registration
///
/// Creates a new user account with the provided credentials.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User successfully registered", body = User),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 409, description = "Email already exists", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn register_handler(
    State(auth_service): State<Arc<dyn AuthService>>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), Response> {
    let Json(request) = payload.map_err(invalid_body)?;

    if let Err(errors) = request.validate() {
        return Err(validation_error(&errors));
    }

    match auth_service.register(request).await {
        Ok(user) => Ok((StatusCode::CREATED, Json(user))),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for user login
///
/// Authenticates a user and returns a JWT token.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthToken),
        (status = 400, description = "Malformed request body", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login_handler(
    State(auth_service): State<Arc<dyn AuthService>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthToken>, Response> {
    let Json(request) = payload.map_err(invalid_body)?;

    match auth_service.login(request).await {
        Ok(token) => Ok(Json(token)),
        Err(e) => Err(e.into_response()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::auth_service::AuthServiceImpl;
    use crate::test_support::MockUserRepository;

    fn auth_service() -> Arc<dyn AuthService> {
        Arc::new(AuthServiceImpl::new(
            Arc::new(MockUserRepository::new()),
            "test_secret".to_string(),
        ))
    }

    fn register_request(email: &str) -> CreateUserRequest {
        CreateUserRequest {
            name: "Test User".to_string(),
            email: email.to_string(),
            password: "password123".to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_handler_success() {
        let result = register_handler(
            State(auth_service()),
            Ok(Json(register_request("test@example.com"))),
        )
        .await;

        let (status, Json(user)) = result.unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(user.name, "Test User");
        assert_eq!(user.email, "test@example.com");
    }

    #[tokio::test]
    async fn test_register_handler_validation_error() {
        let result = register_handler(
            State(auth_service()),
            Ok(Json(register_request("invalid-email"))),
        )
        .await;

        let response = result.unwrap_err();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_register_handler_duplicate_email() {
        let auth_service = auth_service();
        let request = register_request("test@example.com");

        let _ = register_handler(State(auth_service.clone()), Ok(Json(request.clone()))).await;
        let result = register_handler(State(auth_service), Ok(Json(request))).await;

        assert_eq!(result.unwrap_err().status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_login_handler_success() {
        let auth_service = auth_service();
        let _ = register_handler(
            State(auth_service.clone()),
            Ok(Json(register_request("test@example.com"))),
        )
        .await;

        let login_request = LoginRequest {
            email: "test@example.com".to_string(),
            password: "password123".to_string(),
        };

        let Json(token) = login_handler(State(auth_service), Ok(Json(login_request)))
            .await
            .unwrap();
        assert!(!token.token.is_empty());
        assert_eq!(token.token_type, "Bearer");
    }

    #[tokio::test]
    async fn test_login_handler_invalid_credentials() {
        let auth_service = auth_service();
        let _ = register_handler(
            State(auth_service.clone()),
            Ok(Json(register_request("test@example.com"))),
        )
        .await;

        let login_request = LoginRequest {
            email: "test@example.com".to_string(),
            password: "wrongpassword".to_string(),
        };

        let result = login_handler(State(auth_service), Ok(Json(login_request))).await;
        assert_eq!(result.unwrap_err().status(), StatusCode::UNAUTHORIZED);
    }
}
