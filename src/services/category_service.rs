use async_trait::async_trait;
use std::sync::Arc;

use crate::models::category::{Category, FALLBACK_CATEGORY_ID};
use crate::repositories::category_repository::CategoryRepository;
use crate::repositories::RepositoryError;

/// Category service errors
#[derive(Debug, thiserror::Error)]
pub enum CategoryError {
    #[error("Category not found")]
    CategoryNotFound,

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<RepositoryError> for CategoryError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => CategoryError::CategoryNotFound,
            RepositoryError::DatabaseError(msg) => CategoryError::DatabaseError(msg),
            RepositoryError::ConstraintViolation(msg) => CategoryError::DatabaseError(msg),
        }
    }
}

/// Trait defining category service operations
#[async_trait]
pub trait CategoryService: Send + Sync {
    /// All expense categories
    async fn get_categories(&self) -> Result<Vec<Category>, CategoryError>;

    /// Look up the category for a new expense, `other` when none is given
    async fn resolve(&self, category_id: Option<&str>) -> Result<Category, CategoryError>;
}

/// Implementation of CategoryService
pub struct CategoryServiceImpl {
    category_repository: Arc<dyn CategoryRepository>,
}

impl CategoryServiceImpl {
    pub fn new(category_repository: Arc<dyn CategoryRepository>) -> Self {
        Self {
            category_repository,
        }
    }
}

#[async_trait]
impl CategoryService for CategoryServiceImpl {
    async fn get_categories(&self) -> Result<Vec<Category>, CategoryError> {
        self.category_repository.ensure_defaults().await?;
        Ok(self.category_repository.find_all().await?)
    }

    async fn resolve(&self, category_id: Option<&str>) -> Result<Category, CategoryError> {
        let id = match category_id.map(str::trim) {
            Some(id) if !id.is_empty() => id,
            _ => FALLBACK_CATEGORY_ID,
        };

        self.category_repository.ensure_defaults().await?;
        self.category_repository
            .find_by_id(id)
            .await?
            .ok_or(CategoryError::CategoryNotFound)
    }
}
