use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::push::PushSubscription;
use crate::repositories::RepositoryError;

/// Trait defining push subscription repository operations
#[async_trait]
pub trait PushSubscriptionRepository: Send + Sync {
    /// Insert, or replace the keys of an existing `(user_id, endpoint)` row
    async fn upsert(
        &self,
        user_id: Uuid,
        endpoint: &str,
        p256dh: &str,
        auth: &str,
    ) -> Result<PushSubscription, RepositoryError>;

    /// All subscriptions of a user
    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<PushSubscription>, RepositoryError>;

    /// Remove one subscription
    async fn delete(&self, user_id: Uuid, endpoint: &str) -> Result<(), RepositoryError>;

    /// Remove every subscription of a user, returning how many were removed
    async fn delete_by_user(&self, user_id: Uuid) -> Result<u64, RepositoryError>;
}

/// PostgreSQL implementation of PushSubscriptionRepository
pub struct PostgresPushSubscriptionRepository {
    pool: PgPool,
}

impl PostgresPushSubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PushSubscriptionRepository for PostgresPushSubscriptionRepository {
    async fn upsert(
        &self,
        user_id: Uuid,
        endpoint: &str,
        p256dh: &str,
        auth: &str,
    ) -> Result<PushSubscription, RepositoryError> {
        let subscription = sqlx::query_as::<_, PushSubscription>(
            r#"
            INSERT INTO push_subscriptions (user_id, endpoint, p256dh, auth)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, endpoint)
            DO UPDATE SET
                p256dh = EXCLUDED.p256dh,
                auth = EXCLUDED.auth
            RETURNING user_id, endpoint, p256dh, auth, created_at
            "#,
        )
        .bind(user_id)
        .bind(endpoint)
        .bind(p256dh)
        .bind(auth)
        .fetch_one(&self.pool)
        .await?;

        Ok(subscription)
    }

    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<PushSubscription>, RepositoryError> {
        let subscriptions = sqlx::query_as::<_, PushSubscription>(
            r#"
            SELECT user_id, endpoint, p256dh, auth, created_at
            FROM push_subscriptions
            WHERE user_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(subscriptions)
    }

    async fn delete(&self, user_id: Uuid, endpoint: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            DELETE FROM push_subscriptions
            WHERE user_id = $1 AND endpoint = $2
            "#,
        )
        .bind(user_id)
        .bind(endpoint)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn delete_by_user(&self, user_id: Uuid) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r#"
            DELETE FROM push_subscriptions
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
