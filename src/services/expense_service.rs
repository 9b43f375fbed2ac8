use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::expense::{CreateExpenseRequest, Expense};
use crate::repositories::expense_repository::ExpenseRepository;
use crate::repositories::RepositoryError;
use crate::services::category_service::{CategoryError, CategoryService};

/// Expense service errors
#[derive(Debug, thiserror::Error)]
pub enum ExpenseError {
    #[error("Invalid amount: amount must not be negative")]
    InvalidAmount,

    #[error("Category not found")]
    CategoryNotFound,

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<RepositoryError> for ExpenseError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::ConstraintViolation(_) => ExpenseError::CategoryNotFound,
            e => ExpenseError::DatabaseError(e.to_string()),
        }
    }
}

impl From<CategoryError> for ExpenseError {
    fn from(err: CategoryError) -> Self {
        match err {
            CategoryError::CategoryNotFound => ExpenseError::CategoryNotFound,
            CategoryError::DatabaseError(msg) => ExpenseError::DatabaseError(msg),
        }
    }
}

/// Trait defining expense service operations
#[async_trait]
pub trait ExpenseService: Send + Sync {
    /// Log a new expense for the user
    async fn create_expense(
        &self,
        user_id: Uuid,
        request: CreateExpenseRequest,
    ) -> Result<Expense, ExpenseError>;

    /// The user's expenses, newest first
    async fn get_expenses(&self, user_id: Uuid) -> Result<Vec<Expense>, ExpenseError>;
}

/// Implementation of ExpenseService
pub struct ExpenseServiceImpl {
    expense_repository: Arc<dyn ExpenseRepository>,
    category_service: Arc<dyn CategoryService>,
}

impl ExpenseServiceImpl {
    pub fn new(
        expense_repository: Arc<dyn ExpenseRepository>,
        category_service: Arc<dyn CategoryService>,
    ) -> Self {
        Self {
            expense_repository,
            category_service,
        }
    }
}

#[async_trait]
impl ExpenseService for ExpenseServiceImpl {
    async fn create_expense(
        &self,
        user_id: Uuid,
        request: CreateExpenseRequest,
    ) -> Result<Expense, ExpenseError> {
        if request.amount < 0 {
            return Err(ExpenseError::InvalidAmount);
        }

        let category = self
            .category_service
            .resolve(request.category_id.as_deref())
            .await?;

        let expense = Expense {
            id: Uuid::new_v4(),
            user_id,
            title: request.title.trim().to_string(),
            amount: request.amount,
            description: request
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            category,
            date: Utc::now(),
        };

        let expense = self.expense_repository.create(expense).await?;
        tracing::debug!(
            "Created expense id={} user_id={} amount={}",
            expense.id,
            user_id,
            expense.amount
        );
        Ok(expense)
    }

    async fn get_expenses(&self, user_id: Uuid) -> Result<Vec<Expense>, ExpenseError> {
        Ok(self.expense_repository.find_by_user(user_id).await?)
    }
}
