use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::category::Category;

/// A single logged expense, amounts in Toman
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Expense {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    #[schema(minimum = 0, example = 250000)]
    pub amount: i64,
    pub description: Option<String>,
    pub category: Category,
    pub date: DateTime<Utc>,
}

/// Request payload for logging an expense
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "title": "خرید نان",
    "amount": 45000,
    "description": "نانوایی سر کوچه",
    "category_id": "food"
}))]
pub struct CreateExpenseRequest {
    #[validate(length(
        min = 1,
        max = 200,
        message = "Title must be between 1 and 200 characters"
    ))]
    pub title: String,

    #[validate(range(min = 0, message = "Amount must not be negative"))]
    #[schema(minimum = 0, example = 45000)]
    pub amount: i64,

    pub description: Option<String>,

    /// Defaults to `other` when omitted
    #[schema(example = "food")]
    pub category_id: Option<String>,
}

impl CreateExpenseRequest {
    /// Strips surrounding whitespace so length checks see the stored value
    pub fn trimmed(mut self) -> Self {
        self.title = self.title.trim().to_string();
        self.description = self
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        self
    }
}
