//! Repository for account rows and account-scoped cleanup.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::UserEntity;
use crate::metrics::QueryTimer;

/// Row counts from a full account cleanup.
#[derive(Debug, Clone, Copy, Default)]
pub struct CascadeDeleteResult {
    pub rules_deleted: u64,
    pub preference_deleted: bool,
    pub user_deleted: bool,
}

/// Repository for users table operations.
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Creates a new repository instance.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Checks whether an account row exists.
    pub async fn exists(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("user_exists");
        let result = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Inserts a new account row.
    pub async fn create(&self, username: &str, email: &str) -> Result<UserEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_user");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            INSERT INTO users (username, email)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(username)
        .bind(email)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Deletes an account together with its rules and preference
    /// record, in a single transaction. The explicit child deletes
    /// produce the per-table counts the cleanup report needs.
    pub async fn delete_cascade(&self, id: Uuid) -> Result<CascadeDeleteResult, sqlx::Error> {
        let timer = QueryTimer::new("delete_user_cascade");

        let mut tx = self.pool.begin().await?;

        let rules = sqlx::query(
            r#"
            DELETE FROM notifications WHERE user_id = $1
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let preferences = sqlx::query(
            r#"
            DELETE FROM user_preferences WHERE user_id = $1
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let user = sqlx::query(
            r#"
            DELETE FROM users WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        timer.record();

        Ok(CascadeDeleteResult {
            rules_deleted: rules.rows_affected(),
            preference_deleted: preferences.rows_affected() > 0,
            user_deleted: user.rows_affected() > 0,
        })
    }
}
