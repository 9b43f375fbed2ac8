use async_trait::async_trait;
use sqlx::PgPool;

use crate::models::category::{Category, DEFAULT_CATEGORIES};
use crate::repositories::RepositoryError;

/// Trait defining category repository operations
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// All categories ordered by id
    async fn find_all(&self) -> Result<Vec<Category>, RepositoryError>;

    /// Find a category by its id
    async fn find_by_id(&self, id: &str) -> Result<Option<Category>, RepositoryError>;

    /// Insert any missing built-in category, leaving existing rows untouched
    async fn ensure_defaults(&self) -> Result<(), RepositoryError>;
}

/// PostgreSQL implementation of CategoryRepository
pub struct PostgresCategoryRepository {
    pool: PgPool,
}

impl PostgresCategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CategoryRepository for PostgresCategoryRepository {
    async fn find_all(&self) -> Result<Vec<Category>, RepositoryError> {
        let categories = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, name
            FROM categories
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Category>, RepositoryError> {
        let category = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, name
            FROM categories
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    async fn ensure_defaults(&self) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        for (id, name) in DEFAULT_CATEGORIES {
            sqlx::query(
                r#"
                INSERT INTO categories (id, name)
                VALUES ($1, $2)
                ON CONFLICT (id) DO NOTHING
                "#,
            )
            .bind(*id)
            .bind(*name)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
