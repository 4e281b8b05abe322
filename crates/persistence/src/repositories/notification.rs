//! Repository for alert rule operations.

use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use domain::models::notification::{Comparator, Metric, RuleStatus, Threshold};

use crate::entities::{ComparatorDb, MetricDb, NotificationEntity, RuleStatusDb};
use crate::metrics::QueryTimer;

/// Splits a threshold into its two storage columns.
fn threshold_columns(threshold: &Threshold) -> (Option<f64>, Option<String>) {
    match threshold {
        Threshold::Number(n) => (Some(*n), None),
        Threshold::Text(t) => (None, Some(t.trim().to_string())),
    }
}

/// Per-owner rule totals.
#[derive(Debug, Clone, FromRow)]
pub struct RuleTotalsRow {
    pub total: i64,
    pub active: i64,
    pub inactive: i64,
}

/// One `<metric, status>` bucket of the per-owner distribution.
#[derive(Debug, Clone, FromRow)]
pub struct MetricStatusCountRow {
    pub metric: String,
    pub status: String,
    pub count: i64,
}

/// Minimal id/activity projection used by reconciliation.
#[derive(Debug, Clone, FromRow)]
pub struct LiveRuleRow {
    pub id: Uuid,
    pub is_active: bool,
}

/// Repository for notifications table operations.
#[derive(Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    /// Creates a new repository instance.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts a new rule. New rules always start inactive.
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &self,
        user_id: Uuid,
        name: &str,
        metric: Metric,
        comparator: Comparator,
        threshold: &Threshold,
        message: Option<&str>,
        scope: &str,
    ) -> Result<NotificationEntity, sqlx::Error> {
        let (threshold_number, threshold_text) = threshold_columns(threshold);
        let timer = QueryTimer::new("create_notification");
        let result = sqlx::query_as::<_, NotificationEntity>(
            r#"
            INSERT INTO notifications (user_id, name, metric, comparator,
                                       threshold_number, threshold_text, message, scope)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(name)
        .bind(MetricDb::from(metric))
        .bind(ComparatorDb::from(comparator))
        .bind(threshold_number)
        .bind(threshold_text)
        .bind(message)
        .bind(scope)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Finds a rule by id, regardless of owner.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<NotificationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_notification_by_id");
        let result = sqlx::query_as::<_, NotificationEntity>(
            r#"
            SELECT * FROM notifications WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Finds a rule by its composite ownership key.
    pub async fn find_by_id_and_owner(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<NotificationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_notification_by_id_and_owner");
        let result = sqlx::query_as::<_, NotificationEntity>(
            r#"
            SELECT * FROM notifications WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Lists an owner's rules, newest first, with optional exact-match
    /// status and metric filters.
    pub async fn list_by_owner(
        &self,
        user_id: Uuid,
        status: Option<RuleStatus>,
        metric: Option<Metric>,
    ) -> Result<Vec<NotificationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_notifications_by_owner");
        let result = sqlx::query_as::<_, NotificationEntity>(
            r#"
            SELECT * FROM notifications
            WHERE user_id = $1
              AND ($2::notification_status IS NULL OR status = $2)
              AND ($3::notification_metric IS NULL OR metric = $3)
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(status.map(RuleStatusDb::from))
        .bind(metric.map(MetricDb::from))
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Partially updates a rule scoped to its composite ownership key.
    ///
    /// Absent fields keep their stored values. The two threshold columns
    /// are replaced together when a new threshold is provided.
    #[allow(clippy::too_many_arguments)]
    pub async fn update_partial(
        &self,
        id: Uuid,
        user_id: Uuid,
        name: Option<&str>,
        metric: Option<Metric>,
        comparator: Option<Comparator>,
        threshold: Option<&Threshold>,
        message: Option<&str>,
        scope: Option<&str>,
        status: Option<RuleStatus>,
    ) -> Result<Option<NotificationEntity>, sqlx::Error> {
        let (threshold_number, threshold_text) = match threshold {
            Some(t) => threshold_columns(t),
            None => (None, None),
        };
        let timer = QueryTimer::new("update_notification");
        let result = sqlx::query_as::<_, NotificationEntity>(
            r#"
            UPDATE notifications
            SET name = COALESCE($3, name),
                metric = COALESCE($4, metric),
                comparator = COALESCE($5, comparator),
                threshold_number = CASE WHEN $6 THEN $7 ELSE threshold_number END,
                threshold_text = CASE WHEN $6 THEN $8 ELSE threshold_text END,
                message = COALESCE($9, message),
                scope = COALESCE($10, scope),
                status = COALESCE($11, status),
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(name)
        .bind(metric.map(MetricDb::from))
        .bind(comparator.map(ComparatorDb::from))
        .bind(threshold.is_some())
        .bind(threshold_number)
        .bind(threshold_text)
        .bind(message)
        .bind(scope)
        .bind(status.map(RuleStatusDb::from))
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Sets a rule's lifecycle status, scoped to its composite ownership
    /// key. Returns None when no such rule belongs to the owner.
    pub async fn set_status(
        &self,
        id: Uuid,
        user_id: Uuid,
        status: RuleStatus,
    ) -> Result<Option<NotificationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("set_notification_status");
        let result = sqlx::query_as::<_, NotificationEntity>(
            r#"
            UPDATE notifications
            SET status = $3, updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(RuleStatusDb::from(status))
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Deletes a rule scoped to its composite ownership key, returning
    /// the deleted row.
    pub async fn delete(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<NotificationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("delete_notification");
        let result = sqlx::query_as::<_, NotificationEntity>(
            r#"
            DELETE FROM notifications
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Per-owner totals and `<metric, status>` distribution, computed
    /// from this table alone.
    pub async fn stats(
        &self,
        user_id: Uuid,
    ) -> Result<(RuleTotalsRow, Vec<MetricStatusCountRow>), sqlx::Error> {
        let timer = QueryTimer::new("notification_stats");

        let totals = sqlx::query_as::<_, RuleTotalsRow>(
            r#"
            SELECT COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE status = 'active') AS active,
                   COUNT(*) FILTER (WHERE status = 'inactive') AS inactive
            FROM notifications
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await;

        let buckets = sqlx::query_as::<_, MetricStatusCountRow>(
            r#"
            SELECT metric::text AS metric, status::text AS status, COUNT(*) AS count
            FROM notifications
            WHERE user_id = $1
            GROUP BY metric, status
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await;

        timer.record();
        Ok((totals?, buckets?))
    }

    /// Resolves a set of rule ids, oldest first. Ids with no matching
    /// row are silently absent from the result.
    pub async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<NotificationEntity>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let timer = QueryTimer::new("find_notifications_by_ids");
        let result = sqlx::query_as::<_, NotificationEntity>(
            r#"
            SELECT * FROM notifications
            WHERE id = ANY($1)
            ORDER BY created_at ASC
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Id/activity projection of one owner's rules, oldest first.
    pub async fn live_rules_for_owner(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<LiveRuleRow>, sqlx::Error> {
        let timer = QueryTimer::new("live_rules_for_owner");
        let result = sqlx::query_as::<_, LiveRuleRow>(
            r#"
            SELECT id, (status = 'active') AS is_active
            FROM notifications
            WHERE user_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Owners that have rules but no preference record yet.
    pub async fn owners_without_preferences(&self) -> Result<Vec<Uuid>, sqlx::Error> {
        let timer = QueryTimer::new("owners_without_preferences");
        let result = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT DISTINCT n.user_id
            FROM notifications n
            LEFT JOIN user_preferences p ON p.user_id = n.user_id
            WHERE p.user_id IS NULL
            "#,
        )
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Rule ids that occur more than once. Structurally empty under the
    /// primary key; reconciliation treats any hit as fatal.
    pub async fn find_duplicate_ids(&self) -> Result<Vec<Uuid>, sqlx::Error> {
        let timer = QueryTimer::new("find_duplicate_notification_ids");
        let result = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id FROM notifications GROUP BY id HAVING COUNT(*) > 1
            "#,
        )
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_columns_split() {
        assert_eq!(
            threshold_columns(&Threshold::Number(21.5)),
            (Some(21.5), None)
        );
        assert_eq!(
            threshold_columns(&Threshold::Text(" on ".to_string())),
            (None, Some("on".to_string()))
        );
    }
}
