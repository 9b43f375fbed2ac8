use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Category used when an expense is created without one
pub const FALLBACK_CATEGORY_ID: &str = "other";

/// Built-in expense categories as `(id, display name)`
pub const DEFAULT_CATEGORIES: &[(&str, &str)] = &[
    ("food", "🍽️ غذا و نوشیدنی"),
    ("transport", "🚗 حمل و نقل"),
    ("shopping", "🛍️ خرید"),
    ("bills", "📄 قبوض"),
    ("health", "🏥 سلامت"),
    ("entertainment", "🎬 سرگرمی"),
    ("education", "📚 آموزش"),
    (FALLBACK_CATEGORY_ID, "📦 سایر"),
];

/// Expense classification shared by all users
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
#[schema(example = json!({"id": "food", "name": "🍽️ غذا و نوشیدنی"}))]
pub struct Category {
    pub id: String,
    pub name: String,
}

impl Category {
    pub fn defaults() -> Vec<Category> {
        DEFAULT_CATEGORIES
            .iter()
            .map(|(id, name)| Category {
                id: id.to_string(),
                name: name.to_string(),
            })
            .collect()
    }
}
