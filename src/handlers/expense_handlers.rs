use axum::{
    extract::{rejection::JsonRejection, Extension, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use validator::Validate;

use crate::handlers::{invalid_body, validation_error, ErrorResponse};
use crate::middleware::auth_middleware::AuthenticatedUser;
use crate::models::expense::{CreateExpenseRequest, Expense};
use crate::services::expense_service::{ExpenseError, ExpenseService};

/// Convert ExpenseError to HTTP response
impl IntoResponse for ExpenseError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            ExpenseError::InvalidAmount => (
                StatusCode::BAD_REQUEST,
                "invalid_amount",
                "Amount must not be negative".to_string(),
            ),
            ExpenseError::CategoryNotFound => (
                StatusCode::NOT_FOUND,
                "category_not_found",
                "Category not found".to_string(),
            ),
            ExpenseError::DatabaseError(msg) => {
                tracing::error!("Expense database error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", msg)
            }
        };

        ErrorResponse::new(error_type, &message).with_status(status)
    }
}

/// Handler for logging an expense
///
/// Creates a new expense for the authenticated user. Without a category the
/// expense is filed under `other`.
#[utoipa::path(
    post,
    path = "/api/expenses",
    request_body = CreateExpenseRequest,
    responses(
        (status = 201, description = "Expense successfully created", body = Expense),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 404, description = "Category not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "expenses"
)]
pub async fn create_expense_handler(
    State(expense_service): State<Arc<dyn ExpenseService>>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    payload: Result<Json<CreateExpenseRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Expense>), Response> {
    let Json(request) = payload.map_err(invalid_body)?;
    let request = request.trimmed();

    if let Err(errors) = request.validate() {
        return Err(validation_error(&errors));
    }

    match expense_service
        .create_expense(auth_user.user_id, request)
        .await
    {
        Ok(expense) => Ok((StatusCode::CREATED, Json(expense))),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for listing expenses
///
/// Retrieves the authenticated user's expenses, newest first.
#[utoipa::path(
    get,
    path = "/api/expenses",
    responses(
        (status = 200, description = "List of expenses", body = Vec<Expense>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "expenses"
)]
pub async fn list_expenses_handler(
    State(expense_service): State<Arc<dyn ExpenseService>>,
    Extension(auth_user): Extension<AuthenticatedUser>,
) -> Result<Json<Vec<Expense>>, Response> {
    match expense_service.get_expenses(auth_user.user_id).await {
        Ok(expenses) => Ok(Json(expenses)),
        Err(e) => Err(e.into_response()),
    }
}
