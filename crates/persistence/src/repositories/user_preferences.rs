//! Repository for the per-user preference aggregate.
//!
//! The cached rule-id arrays are maintained with single-statement
//! conditional updates so each mutation is atomic at the row level.
//! Membership guards make every array operation idempotent: re-running
//! one reports zero affected rows instead of corrupting the cache.

use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use domain::models::preferences::Theme;

use crate::entities::{ThemeDb, UserPreferencesEntity};
use crate::metrics::QueryTimer;

/// Record and cached-rule totals across all preference records.
#[derive(Debug, Clone, FromRow)]
pub struct PreferenceTotalsRow {
    pub total_records: i64,
    pub total_cached_rules: i64,
}

/// One theme bucket of the records-per-theme distribution.
#[derive(Debug, Clone, FromRow)]
pub struct ThemeCountRow {
    pub theme: String,
    pub count: i64,
}

/// Repository for user_preferences table operations.
#[derive(Clone)]
pub struct UserPreferencesRepository {
    pool: PgPool,
}

impl UserPreferencesRepository {
    /// Creates a new repository instance.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Finds the preference record for an owner.
    pub async fn find_by_user_id(
        &self,
        user_id: Uuid,
    ) -> Result<Option<UserPreferencesEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_preferences_by_user_id");
        let result = sqlx::query_as::<_, UserPreferencesEntity>(
            r#"
            SELECT * FROM user_preferences WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Returns the owner's record, creating an all-defaults one when
    /// none exists. Concurrent first calls converge on a single row.
    pub async fn get_or_create(
        &self,
        user_id: Uuid,
    ) -> Result<UserPreferencesEntity, sqlx::Error> {
        if let Some(existing) = self.find_by_user_id(user_id).await? {
            return Ok(existing);
        }

        let timer = QueryTimer::new("create_default_preferences");
        let result = sqlx::query_as::<_, UserPreferencesEntity>(
            r#"
            INSERT INTO user_preferences (user_id)
            VALUES ($1)
            ON CONFLICT (user_id) DO UPDATE SET updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Appends a rule id to the full set and advances the advisory
    /// count, only when the id is not already cached. Returns the
    /// number of rows changed (zero means already present or no
    /// record).
    pub async fn add_rule_id(&self, user_id: Uuid, rule_id: Uuid) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("preferences_add_rule_id");
        let result = sqlx::query(
            r#"
            UPDATE user_preferences
            SET all_rule_ids = array_append(all_rule_ids, $2),
                rule_count = rule_count + 1,
                updated_at = NOW()
            WHERE user_id = $1 AND NOT ($2 = ANY(all_rule_ids))
            "#,
        )
        .bind(user_id)
        .bind(rule_id)
        .execute(&self.pool)
        .await;
        timer.record();
        Ok(result?.rows_affected())
    }

    /// Removes a rule id from both cached sets, decrementing the
    /// advisory count only when the id was actually in the full set.
    /// The count never drops below zero.
    pub async fn remove_rule_id(&self, user_id: Uuid, rule_id: Uuid) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("preferences_remove_rule_id");
        let result = sqlx::query(
            r#"
            UPDATE user_preferences
            SET all_rule_ids = array_remove(all_rule_ids, $2),
                active_rule_ids = array_remove(active_rule_ids, $2),
                rule_count = CASE WHEN $2 = ANY(all_rule_ids)
                             THEN GREATEST(rule_count - 1, 0)
                             ELSE rule_count END,
                updated_at = NOW()
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .bind(rule_id)
        .execute(&self.pool)
        .await;
        timer.record();
        Ok(result?.rows_affected())
    }

    /// Adds or removes a rule id from the active set. The full set and
    /// the advisory count are untouched.
    pub async fn set_active(
        &self,
        user_id: Uuid,
        rule_id: Uuid,
        is_active: bool,
    ) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("preferences_set_active");
        let result = if is_active {
            sqlx::query(
                r#"
                UPDATE user_preferences
                SET active_rule_ids = array_append(active_rule_ids, $2),
                    updated_at = NOW()
                WHERE user_id = $1 AND NOT ($2 = ANY(active_rule_ids))
                "#,
            )
            .bind(user_id)
            .bind(rule_id)
            .execute(&self.pool)
            .await
        } else {
            sqlx::query(
                r#"
                UPDATE user_preferences
                SET active_rule_ids = array_remove(active_rule_ids, $2),
                    updated_at = NOW()
                WHERE user_id = $1
                "#,
            )
            .bind(user_id)
            .bind(rule_id)
            .execute(&self.pool)
            .await
        };
        timer.record();
        Ok(result?.rows_affected())
    }

    /// Replaces both cached sets and the advisory count wholesale.
    /// Settings fields keep their stored values.
    pub async fn overwrite_sets(
        &self,
        user_id: Uuid,
        all_rule_ids: &[Uuid],
        active_rule_ids: &[Uuid],
        rule_count: i32,
    ) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("preferences_overwrite_sets");
        let result = sqlx::query(
            r#"
            UPDATE user_preferences
            SET all_rule_ids = $2,
                active_rule_ids = $3,
                rule_count = $4,
                updated_at = NOW()
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .bind(all_rule_ids)
        .bind(active_rule_ids)
        .bind(rule_count)
        .execute(&self.pool)
        .await;
        timer.record();
        Ok(result?.rows_affected())
    }

    /// Inserts a record pre-populated with cached sets, overwriting the
    /// sets of an existing record instead of failing.
    pub async fn create_with_sets(
        &self,
        user_id: Uuid,
        all_rule_ids: &[Uuid],
        active_rule_ids: &[Uuid],
        rule_count: i32,
    ) -> Result<UserPreferencesEntity, sqlx::Error> {
        let timer = QueryTimer::new("preferences_create_with_sets");
        let result = sqlx::query_as::<_, UserPreferencesEntity>(
            r#"
            INSERT INTO user_preferences (user_id, all_rule_ids, active_rule_ids, rule_count)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id) DO UPDATE
            SET all_rule_ids = EXCLUDED.all_rule_ids,
                active_rule_ids = EXCLUDED.active_rule_ids,
                rule_count = EXCLUDED.rule_count,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(all_rule_ids)
        .bind(active_rule_ids)
        .bind(rule_count)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Creates or updates the user-facing settings fields. Cached sets
    /// and the advisory count are never touched, and an absent field
    /// keeps its stored value.
    pub async fn upsert_settings(
        &self,
        user_id: Uuid,
        preferred_sensor_id: Option<&str>,
        theme: Option<Theme>,
    ) -> Result<UserPreferencesEntity, sqlx::Error> {
        let timer = QueryTimer::new("preferences_upsert_settings");
        let result = sqlx::query_as::<_, UserPreferencesEntity>(
            r#"
            INSERT INTO user_preferences (user_id, preferred_sensor_id, theme)
            VALUES ($1, $2, COALESCE($3, 'auto'::preference_theme))
            ON CONFLICT (user_id) DO UPDATE
            SET preferred_sensor_id = COALESCE(EXCLUDED.preferred_sensor_id,
                                               user_preferences.preferred_sensor_id),
                theme = COALESCE($3, user_preferences.theme),
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(preferred_sensor_id)
        .bind(theme.map(ThemeDb::from))
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Updates the user-facing settings fields of an existing record.
    /// Returns None when the owner has no record.
    pub async fn update_settings(
        &self,
        user_id: Uuid,
        preferred_sensor_id: Option<&str>,
        theme: Option<Theme>,
    ) -> Result<Option<UserPreferencesEntity>, sqlx::Error> {
        let timer = QueryTimer::new("preferences_update_settings");
        let result = sqlx::query_as::<_, UserPreferencesEntity>(
            r#"
            UPDATE user_preferences
            SET preferred_sensor_id = COALESCE($2, preferred_sensor_id),
                theme = COALESCE($3, theme),
                updated_at = NOW()
            WHERE user_id = $1
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(preferred_sensor_id)
        .bind(theme.map(ThemeDb::from))
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Deletes the owner's record. Returns the number of rows removed.
    pub async fn delete(&self, user_id: Uuid) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_preferences");
        let result = sqlx::query(
            r#"
            DELETE FROM user_preferences WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await;
        timer.record();
        Ok(result?.rows_affected())
    }

    /// One page of records, newest first.
    pub async fn list_paged(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<UserPreferencesEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_preferences_paged");
        let result = sqlx::query_as::<_, UserPreferencesEntity>(
            r#"
            SELECT * FROM user_preferences
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Total number of preference records.
    pub async fn count_all(&self) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_preferences");
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM user_preferences
            "#,
        )
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Fleet-wide totals and the records-per-theme distribution.
    pub async fn aggregate_stats(
        &self,
    ) -> Result<(PreferenceTotalsRow, Vec<ThemeCountRow>), sqlx::Error> {
        let timer = QueryTimer::new("preference_stats");

        let totals = sqlx::query_as::<_, PreferenceTotalsRow>(
            r#"
            SELECT COUNT(*) AS total_records,
                   COALESCE(SUM(rule_count), 0) AS total_cached_rules
            FROM user_preferences
            "#,
        )
        .fetch_one(&self.pool)
        .await;

        let themes = sqlx::query_as::<_, ThemeCountRow>(
            r#"
            SELECT theme::text AS theme, COUNT(*) AS count
            FROM user_preferences
            GROUP BY theme
            "#,
        )
        .fetch_all(&self.pool)
        .await;

        timer.record();
        Ok((totals?, themes?))
    }

    /// Every preference record, in stable owner order. Used by the
    /// reconciliation scan.
    pub async fn find_all(&self) -> Result<Vec<UserPreferencesEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_all_preferences");
        let result = sqlx::query_as::<_, UserPreferencesEntity>(
            r#"
            SELECT * FROM user_preferences ORDER BY user_id
            "#,
        )
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }
}
