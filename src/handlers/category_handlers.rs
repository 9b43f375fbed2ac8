use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::handlers::ErrorResponse;
use crate::models::category::Category;
use crate::services::category_service::{CategoryError, CategoryService};

impl IntoResponse for CategoryError {
    fn into_response(self) -> Response {
        match self {
            CategoryError::CategoryNotFound => {
                ErrorResponse::new("category_not_found", "Category not found")
                    .with_status(StatusCode::NOT_FOUND)
            }
            CategoryError::DatabaseError(msg) => {
                tracing::error!("Category database error: {}", msg);
                ErrorResponse::new("database_error", &msg)
                    .with_status(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }
}

/// Handler for listing expense categories
#[utoipa::path(
    get,
    path = "/api/categories",
    responses(
        (status = 200, description = "All expense categories", body = Vec<Category>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "categories"
)]
pub async fn list_categories_handler(
    State(category_service): State<Arc<dyn CategoryService>>,
) -> Result<Json<Vec<Category>>, Response> {
    match category_service.get_categories().await {
        Ok(categories) => Ok(Json(categories)),
        Err(e) => Err(e.into_response()),
    }
}
