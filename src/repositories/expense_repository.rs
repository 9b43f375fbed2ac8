use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::category::Category;
use crate::models::expense::Expense;
use crate::repositories::RepositoryError;

/// Trait defining expense repository operations
#[async_trait]
pub trait ExpenseRepository: Send + Sync {
    /// Persist a new expense
    async fn create(&self, expense: Expense) -> Result<Expense, RepositoryError>;

    /// All expenses of a user, newest first
    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<Expense>, RepositoryError>;
}

#[derive(sqlx::FromRow)]
struct ExpenseRow {
    id: Uuid,
    user_id: Uuid,
    title: String,
    amount: i64,
    description: Option<String>,
    category_id: String,
    category_name: String,
    date: DateTime<Utc>,
}

impl From<ExpenseRow> for Expense {
    fn from(row: ExpenseRow) -> Self {
        Expense {
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            amount: row.amount,
            description: row.description,
            category: Category {
                id: row.category_id,
                name: row.category_name,
            },
            date: row.date,
        }
    }
}

/// PostgreSQL implementation of ExpenseRepository
pub struct PostgresExpenseRepository {
    pool: PgPool,
}

impl PostgresExpenseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ExpenseRepository for PostgresExpenseRepository {
    async fn create(&self, expense: Expense) -> Result<Expense, RepositoryError> {
        let date: DateTime<Utc> = sqlx::query_scalar(
            r#"
            INSERT INTO expenses (id, user_id, title, amount, description, category_id, date)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING date
            "#,
        )
        .bind(expense.id)
        .bind(expense.user_id)
        .bind(&expense.title)
        .bind(expense.amount)
        .bind(&expense.description)
        .bind(&expense.category.id)
        .bind(expense.date)
        .fetch_one(&self.pool)
        .await?;

        Ok(Expense { date, ..expense })
    }

    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<Expense>, RepositoryError> {
        let rows = sqlx::query_as::<_, ExpenseRow>(
            r#"
            SELECT e.id, e.user_id, e.title, e.amount, e.description,
                   e.category_id, c.name AS category_name, e.date
            FROM expenses e
            JOIN categories c ON c.id = e.category_id
            WHERE e.user_id = $1
            ORDER BY e.date DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Expense::from).collect())
    }
}
