//! Alert rule domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;
use validator::Validate;

use shared::validation;

/// Sensor metric an alert rule watches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Temperature,
    Humidity,
    Actuator,
    Status,
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Temperature => write!(f, "temperature"),
            Self::Humidity => write!(f, "humidity"),
            Self::Actuator => write!(f, "actuator"),
            Self::Status => write!(f, "status"),
        }
    }
}

/// Comparison applied between a reading and the rule threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparator {
    GreaterThan,
    LessThan,
    EqualTo,
    ChangesTo,
}

impl std::fmt::Display for Comparator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GreaterThan => write!(f, "greater_than"),
            Self::LessThan => write!(f, "less_than"),
            Self::EqualTo => write!(f, "equal_to"),
            Self::ChangesTo => write!(f, "changes_to"),
        }
    }
}

/// Lifecycle state of an alert rule. New rules always start inactive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleStatus {
    #[default]
    Inactive,
    Active,
}

impl std::fmt::Display for RuleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Inactive => write!(f, "inactive"),
            Self::Active => write!(f, "active"),
        }
    }
}

/// Threshold a rule compares readings against.
///
/// Numeric for range comparisons, textual for state-change comparisons.
/// Serialized as a bare JSON number or string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Threshold {
    Number(f64),
    Text(String),
}

impl std::fmt::Display for Threshold {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Location scope of a rule: every location, or one named location.
///
/// JSON form is the string `"all"` or the location name, so the literal
/// name "all" cannot denote a location.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RuleScope {
    #[default]
    All,
    Location(String),
}

impl From<String> for RuleScope {
    fn from(value: String) -> Self {
        let trimmed = value.trim();
        if trimmed.eq_ignore_ascii_case("all") {
            Self::All
        } else {
            Self::Location(trimmed.to_string())
        }
    }
}

impl From<RuleScope> for String {
    fn from(scope: RuleScope) -> Self {
        match scope {
            RuleScope::All => "all".to_string(),
            RuleScope::Location(name) => name,
        }
    }
}

impl std::fmt::Display for RuleScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Location(name) => write!(f, "{}", name),
        }
    }
}

/// An alert rule owned by a dashboard account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRule {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub metric: Metric,
    pub comparator: Comparator,
    pub threshold: Threshold,
    pub message: Option<String>,
    pub scope: RuleScope,
    pub status: RuleStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request payload for creating an alert rule.
///
/// Carries no id, owner or status fields: the id is generated, the owner
/// comes from the authenticated caller and new rules always start
/// inactive.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateNotificationRuleRequest {
    #[validate(custom(function = "validate_rule_name"))]
    pub name: String,

    pub metric: Metric,

    pub comparator: Comparator,

    pub threshold: Threshold,

    #[validate(length(max = 500, message = "Message must be at most 500 characters"))]
    pub message: Option<String>,

    #[serde(default)]
    pub scope: RuleScope,
}

/// Request payload for updating an alert rule (partial update).
///
/// Carries no id or owner fields; a status change through here fires
/// the same aggregate hook as the dedicated activate/deactivate
/// operations.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNotificationRuleRequest {
    #[validate(custom(function = "validate_rule_name"))]
    pub name: Option<String>,

    pub metric: Option<Metric>,

    pub comparator: Option<Comparator>,

    pub threshold: Option<Threshold>,

    #[validate(length(max = 500, message = "Message must be at most 500 characters"))]
    pub message: Option<String>,

    pub scope: Option<RuleScope>,

    pub status: Option<RuleStatus>,
}

impl UpdateNotificationRuleRequest {
    /// Returns true when no field is present in the patch.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.metric.is_none()
            && self.comparator.is_none()
            && self.threshold.is_none()
            && self.message.is_none()
            && self.scope.is_none()
            && self.status.is_none()
    }
}

/// Validates a rule name: non-blank after trimming, at most 100 characters.
fn validate_rule_name(name: &str) -> Result<(), validator::ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        let mut err = validator::ValidationError::new("name_blank");
        err.message = Some("Name must not be blank".into());
        return Err(err);
    }
    if trimmed.chars().count() > 100 {
        let mut err = validator::ValidationError::new("name_length");
        err.message = Some("Name must be at most 100 characters".into());
        return Err(err);
    }
    Ok(())
}

/// Checks a (metric, comparator, threshold) combination.
///
/// Returns the list of problems found; empty means the combination is
/// acceptable. Range limits follow the sensor hardware: temperature
/// -50..=100 °C, humidity 0..=100 %.
pub fn validate_threshold(
    metric: Metric,
    comparator: Comparator,
    threshold: &Threshold,
) -> Vec<String> {
    let mut errors = Vec::new();

    let push = |errors: &mut Vec<String>, err: validator::ValidationError| {
        if let Some(message) = err.message {
            errors.push(format!("threshold: {}", message));
        } else {
            errors.push(format!("threshold: {}", err.code));
        }
    };

    match (comparator, threshold) {
        (Comparator::GreaterThan | Comparator::LessThan, Threshold::Text(_)) => {
            errors.push(format!(
                "threshold: comparator {} requires a numeric threshold",
                comparator
            ));
        }
        (Comparator::ChangesTo, Threshold::Number(_)) => {
            errors.push("threshold: comparator changes_to requires a string threshold".to_string());
        }
        (_, Threshold::Number(value)) => {
            if let Err(err) = validation::validate_finite(*value) {
                push(&mut errors, err);
            } else {
                let range_check = match metric {
                    Metric::Temperature => Some(validation::validate_temperature(*value)),
                    Metric::Humidity => Some(validation::validate_humidity(*value)),
                    Metric::Actuator | Metric::Status => None,
                };
                if let Some(Err(err)) = range_check {
                    push(&mut errors, err);
                }
            }
        }
        (_, Threshold::Text(value)) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                errors.push("threshold: string threshold must not be blank".to_string());
            } else if trimmed.chars().count() > 100 {
                errors.push("threshold: string threshold must be at most 100 characters".to_string());
            }
        }
    }

    errors
}

/// Checks a rule scope. Returns the list of problems found.
pub fn validate_scope(scope: &RuleScope) -> Vec<String> {
    match scope {
        RuleScope::All => Vec::new(),
        RuleScope::Location(name) => match validation::validate_location_name(name) {
            Ok(()) => Vec::new(),
            Err(err) => {
                let message = err
                    .message
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| err.code.to_string());
                vec![format!("scope: {}", message)]
            }
        },
    }
}

/// Response payload for alert rule operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRuleResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub metric: Metric,
    pub comparator: Comparator,
    pub threshold: Threshold,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub scope: RuleScope,
    pub status: RuleStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<NotificationRule> for NotificationRuleResponse {
    fn from(r: NotificationRule) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            name: r.name,
            metric: r.metric,
            comparator: r.comparator,
            threshold: r.threshold,
            message: r.message,
            scope: r.scope,
            status: r.status,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// Response for listing an owner's alert rules.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListNotificationRulesResponse {
    pub notifications: Vec<NotificationRuleResponse>,
    pub total: usize,
}

/// Query parameters for listing alert rules.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListNotificationRulesQuery {
    /// Filter by lifecycle status (exact match)
    pub status: Option<RuleStatus>,
    /// Filter by watched metric (exact match)
    pub metric: Option<Metric>,
}

/// Per-owner rule statistics, computed from the rule store alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationStatsResponse {
    pub total: i64,
    pub active: i64,
    pub inactive: i64,
    /// Counts keyed by `<metric>_<status>`, e.g. `temperature_active`.
    pub by_metric: BTreeMap<String, i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_deserialization() {
        let json = r#"{
            "name": "Freezer too warm",
            "metric": "temperature",
            "comparator": "greater_than",
            "threshold": -10.5
        }"#;

        let request: CreateNotificationRuleRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.name, "Freezer too warm");
        assert_eq!(request.metric, Metric::Temperature);
        assert_eq!(request.comparator, Comparator::GreaterThan);
        assert_eq!(request.threshold, Threshold::Number(-10.5));
        assert_eq!(request.scope, RuleScope::All); // default
        assert!(request.message.is_none());
    }

    #[test]
    fn test_create_request_with_all_fields() {
        let json = r#"{
            "name": "Pump state",
            "metric": "actuator",
            "comparator": "changes_to",
            "threshold": "on",
            "message": "The pump switched on",
            "scope": "Greenhouse 3"
        }"#;

        let request: CreateNotificationRuleRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.threshold, Threshold::Text("on".to_string()));
        assert_eq!(request.scope, RuleScope::Location("Greenhouse 3".to_string()));
        assert_eq!(request.message, Some("The pump switched on".to_string()));
    }

    #[test]
    fn test_create_request_ignores_status_field() {
        // Status is not part of the create surface; new rules start
        // inactive no matter what the payload claims.
        let json = r#"{
            "name": "x",
            "metric": "humidity",
            "comparator": "less_than",
            "threshold": 30,
            "status": "active"
        }"#;
        let request: CreateNotificationRuleRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.threshold, Threshold::Number(30.0));
    }

    #[test]
    fn test_scope_all_is_case_insensitive() {
        assert_eq!(RuleScope::from("all".to_string()), RuleScope::All);
        assert_eq!(RuleScope::from("ALL".to_string()), RuleScope::All);
        assert_eq!(RuleScope::from(" All ".to_string()), RuleScope::All);
        assert_eq!(
            RuleScope::from("Warehouse".to_string()),
            RuleScope::Location("Warehouse".to_string())
        );
    }

    #[test]
    fn test_scope_serializes_to_bare_string() {
        let json = serde_json::to_string(&RuleScope::All).unwrap();
        assert_eq!(json, "\"all\"");

        let json = serde_json::to_string(&RuleScope::Location("Lab".to_string())).unwrap();
        assert_eq!(json, "\"Lab\"");
    }

    #[test]
    fn test_validate_rule_name_rules() {
        assert!(validate_rule_name("Sensor alert").is_ok());
        assert!(validate_rule_name("  ").is_err());
        assert!(validate_rule_name(&"x".repeat(101)).is_err());
        assert!(validate_rule_name(&"x".repeat(100)).is_ok());
    }

    #[test]
    fn test_threshold_numeric_comparators_reject_text() {
        let errors = validate_threshold(
            Metric::Temperature,
            Comparator::GreaterThan,
            &Threshold::Text("warm".to_string()),
        );
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("requires a numeric threshold"));

        let errors = validate_threshold(
            Metric::Humidity,
            Comparator::LessThan,
            &Threshold::Text("dry".to_string()),
        );
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_threshold_changes_to_rejects_number() {
        let errors = validate_threshold(
            Metric::Actuator,
            Comparator::ChangesTo,
            &Threshold::Number(1.0),
        );
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("requires a string threshold"));
    }

    #[test]
    fn test_threshold_temperature_range() {
        assert!(validate_threshold(
            Metric::Temperature,
            Comparator::GreaterThan,
            &Threshold::Number(100.0)
        )
        .is_empty());

        let errors = validate_threshold(
            Metric::Temperature,
            Comparator::GreaterThan,
            &Threshold::Number(150.0),
        );
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("between -50 and 100"));
    }

    #[test]
    fn test_threshold_humidity_range() {
        let errors = validate_threshold(
            Metric::Humidity,
            Comparator::LessThan,
            &Threshold::Number(-5.0),
        );
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("between 0 and 100"));
    }

    #[test]
    fn test_threshold_rejects_non_finite() {
        let errors = validate_threshold(
            Metric::Status,
            Comparator::EqualTo,
            &Threshold::Number(f64::NAN),
        );
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("finite"));
    }

    #[test]
    fn test_threshold_equal_to_accepts_both_kinds() {
        assert!(validate_threshold(
            Metric::Status,
            Comparator::EqualTo,
            &Threshold::Text("online".to_string())
        )
        .is_empty());
        assert!(validate_threshold(
            Metric::Actuator,
            Comparator::EqualTo,
            &Threshold::Number(1.0)
        )
        .is_empty());
    }

    #[test]
    fn test_threshold_text_rules() {
        let errors = validate_threshold(
            Metric::Status,
            Comparator::ChangesTo,
            &Threshold::Text("  ".to_string()),
        );
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("must not be blank"));

        let errors = validate_threshold(
            Metric::Status,
            Comparator::ChangesTo,
            &Threshold::Text("x".repeat(101)),
        );
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("at most 100 characters"));
    }

    #[test]
    fn test_validate_scope() {
        assert!(validate_scope(&RuleScope::All).is_empty());
        assert!(validate_scope(&RuleScope::Location("Greenhouse".to_string())).is_empty());

        let errors = validate_scope(&RuleScope::Location("".to_string()));
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("scope:"));
    }

    #[test]
    fn test_update_request_partial() {
        let json = r#"{"name": "Renamed"}"#;
        let request: UpdateNotificationRuleRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.name, Some("Renamed".to_string()));
        assert!(request.metric.is_none());
        assert!(request.threshold.is_none());
        assert!(request.status.is_none());
        assert!(!request.is_empty());
    }

    #[test]
    fn test_update_request_carries_status() {
        let json = r#"{"status": "active"}"#;
        let request: UpdateNotificationRuleRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.status, Some(RuleStatus::Active));
        assert!(!request.is_empty());
    }

    #[test]
    fn test_update_request_empty_patch() {
        let request: UpdateNotificationRuleRequest = serde_json::from_str("{}").unwrap();
        assert!(request.is_empty());
    }

    #[test]
    fn test_rule_response_serialization() {
        let response = NotificationRuleResponse {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "Cold room".to_string(),
            metric: Metric::Temperature,
            comparator: Comparator::LessThan,
            threshold: Threshold::Number(4.0),
            message: None,
            scope: RuleScope::All,
            status: RuleStatus::Inactive,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"metric\":\"temperature\""));
        assert!(json.contains("\"comparator\":\"less_than\""));
        assert!(json.contains("\"threshold\":4.0"));
        assert!(json.contains("\"scope\":\"all\""));
        assert!(json.contains("\"status\":\"inactive\""));
        // Should skip None message
        assert!(!json.contains("\"message\""));
    }

    #[test]
    fn test_list_query_deserialization() {
        let query: ListNotificationRulesQuery =
            serde_json::from_str(r#"{"status": "active", "metric": "humidity"}"#).unwrap();
        assert_eq!(query.status, Some(RuleStatus::Active));
        assert_eq!(query.metric, Some(Metric::Humidity));

        let query: ListNotificationRulesQuery = serde_json::from_str("{}").unwrap();
        assert!(query.status.is_none());
        assert!(query.metric.is_none());
    }

    #[test]
    fn test_display_forms_match_wire_names() {
        assert_eq!(Metric::Temperature.to_string(), "temperature");
        assert_eq!(Comparator::GreaterThan.to_string(), "greater_than");
        assert_eq!(RuleStatus::Active.to_string(), "active");
        assert_eq!(RuleStatus::default(), RuleStatus::Inactive);
    }
}
