//! Alert rule database entity.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::notification::{Comparator, Metric, RuleScope, RuleStatus, Threshold};

/// Database enum for the watched metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "notification_metric", rename_all = "snake_case")]
pub enum MetricDb {
    Temperature,
    Humidity,
    Actuator,
    Status,
}

impl From<Metric> for MetricDb {
    fn from(m: Metric) -> Self {
        match m {
            Metric::Temperature => Self::Temperature,
            Metric::Humidity => Self::Humidity,
            Metric::Actuator => Self::Actuator,
            Metric::Status => Self::Status,
        }
    }
}

impl From<MetricDb> for Metric {
    fn from(m: MetricDb) -> Self {
        match m {
            MetricDb::Temperature => Self::Temperature,
            MetricDb::Humidity => Self::Humidity,
            MetricDb::Actuator => Self::Actuator,
            MetricDb::Status => Self::Status,
        }
    }
}

/// Database enum for the threshold comparator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "notification_comparator", rename_all = "snake_case")]
pub enum ComparatorDb {
    GreaterThan,
    LessThan,
    EqualTo,
    ChangesTo,
}

impl From<Comparator> for ComparatorDb {
    fn from(c: Comparator) -> Self {
        match c {
            Comparator::GreaterThan => Self::GreaterThan,
            Comparator::LessThan => Self::LessThan,
            Comparator::EqualTo => Self::EqualTo,
            Comparator::ChangesTo => Self::ChangesTo,
        }
    }
}

impl From<ComparatorDb> for Comparator {
    fn from(c: ComparatorDb) -> Self {
        match c {
            ComparatorDb::GreaterThan => Self::GreaterThan,
            ComparatorDb::LessThan => Self::LessThan,
            ComparatorDb::EqualTo => Self::EqualTo,
            ComparatorDb::ChangesTo => Self::ChangesTo,
        }
    }
}

/// Database enum for the rule lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "notification_status", rename_all = "snake_case")]
pub enum RuleStatusDb {
    Inactive,
    Active,
}

impl From<RuleStatus> for RuleStatusDb {
    fn from(s: RuleStatus) -> Self {
        match s {
            RuleStatus::Inactive => Self::Inactive,
            RuleStatus::Active => Self::Active,
        }
    }
}

impl From<RuleStatusDb> for RuleStatus {
    fn from(s: RuleStatusDb) -> Self {
        match s {
            RuleStatusDb::Inactive => Self::Inactive,
            RuleStatusDb::Active => Self::Active,
        }
    }
}

/// Database entity for the notifications table.
///
/// The threshold is stored across two nullable columns; a CHECK
/// constraint guarantees exactly one is set.
#[derive(Debug, Clone, FromRow)]
pub struct NotificationEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub metric: MetricDb,
    pub comparator: ComparatorDb,
    pub threshold_number: Option<f64>,
    pub threshold_text: Option<String>,
    pub message: Option<String>,
    pub scope: String,
    pub status: RuleStatusDb,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<NotificationEntity> for domain::models::NotificationRule {
    fn from(entity: NotificationEntity) -> Self {
        let threshold = match (entity.threshold_number, entity.threshold_text) {
            (Some(n), _) => Threshold::Number(n),
            (None, Some(t)) => Threshold::Text(t),
            // Unreachable under the table CHECK constraint.
            (None, None) => Threshold::Text(String::new()),
        };
        Self {
            id: entity.id,
            user_id: entity.user_id,
            name: entity.name,
            metric: entity.metric.into(),
            comparator: entity.comparator.into(),
            threshold,
            message: entity.message,
            scope: RuleScope::from(entity.scope),
            status: entity.status.into(),
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity() -> NotificationEntity {
        NotificationEntity {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "Freezer".to_string(),
            metric: MetricDb::Temperature,
            comparator: ComparatorDb::GreaterThan,
            threshold_number: Some(-10.0),
            threshold_text: None,
            message: None,
            scope: "all".to_string(),
            status: RuleStatusDb::Inactive,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_numeric_threshold_conversion() {
        let rule: domain::models::NotificationRule = entity().into();
        assert_eq!(rule.threshold, Threshold::Number(-10.0));
        assert_eq!(rule.metric, Metric::Temperature);
        assert_eq!(rule.scope, RuleScope::All);
        assert_eq!(rule.status, RuleStatus::Inactive);
    }

    #[test]
    fn test_text_threshold_conversion() {
        let mut e = entity();
        e.metric = MetricDb::Actuator;
        e.comparator = ComparatorDb::ChangesTo;
        e.threshold_number = None;
        e.threshold_text = Some("on".to_string());
        e.scope = "Greenhouse 3".to_string();

        let rule: domain::models::NotificationRule = e.into();
        assert_eq!(rule.threshold, Threshold::Text("on".to_string()));
        assert_eq!(rule.scope, RuleScope::Location("Greenhouse 3".to_string()));
    }

    #[test]
    fn test_enum_round_trips() {
        for metric in [
            Metric::Temperature,
            Metric::Humidity,
            Metric::Actuator,
            Metric::Status,
        ] {
            assert_eq!(Metric::from(MetricDb::from(metric)), metric);
        }
        for comparator in [
            Comparator::GreaterThan,
            Comparator::LessThan,
            Comparator::EqualTo,
            Comparator::ChangesTo,
        ] {
            assert_eq!(Comparator::from(ComparatorDb::from(comparator)), comparator);
        }
    }
}
