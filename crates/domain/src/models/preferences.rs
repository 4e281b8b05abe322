//! User preference domain model.
//!
//! The preference record is the denormalized per-owner aggregate: the
//! user-controlled dashboard settings plus a cached view of that owner's
//! alert-rule ids. The cached sets and counter are owned by the
//! consistency machinery, never by API clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;
use validator::Validate;

use shared::pagination::PageMeta;

use super::notification::NotificationRuleResponse;

/// Dashboard color theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    Auto,
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Light => write!(f, "light"),
            Self::Dark => write!(f, "dark"),
            Self::Auto => write!(f, "auto"),
        }
    }
}

/// Per-owner preference record.
///
/// `all_rule_ids` and `active_rule_ids` have set semantics; `rule_count`
/// is an advisory cached cardinality of `all_rule_ids`. All three are
/// derived data repaired by reconciliation when they drift.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceRecord {
    pub user_id: Uuid,
    pub preferred_sensor_id: Option<String>,
    pub all_rule_ids: Vec<Uuid>,
    pub active_rule_ids: Vec<Uuid>,
    pub rule_count: i32,
    pub theme: Theme,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request payload for creating-or-replacing preference settings.
///
/// Only the user-controlled fields are accepted; cached rule-id sets and
/// the counter are structurally absent from the write surface.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpsertPreferencesRequest {
    #[validate(length(
        max = 100,
        message = "Preferred sensor id must be at most 100 characters"
    ))]
    pub preferred_sensor_id: Option<String>,

    pub theme: Option<Theme>,
}

/// Request payload for partially updating preference settings.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePreferencesRequest {
    #[validate(length(
        max = 100,
        message = "Preferred sensor id must be at most 100 characters"
    ))]
    pub preferred_sensor_id: Option<String>,

    pub theme: Option<Theme>,
}

impl UpdatePreferencesRequest {
    /// Returns true when no field is present in the patch.
    pub fn is_empty(&self) -> bool {
        self.preferred_sensor_id.is_none() && self.theme.is_none()
    }
}

/// Response payload for preference operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceResponse {
    pub user_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_sensor_id: Option<String>,
    pub all_rule_ids: Vec<Uuid>,
    pub active_rule_ids: Vec<Uuid>,
    pub rule_count: i32,
    pub theme: Theme,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PreferenceRecord> for PreferenceResponse {
    fn from(r: PreferenceRecord) -> Self {
        Self {
            user_id: r.user_id,
            preferred_sensor_id: r.preferred_sensor_id,
            all_rule_ids: r.all_rule_ids,
            active_rule_ids: r.active_rule_ids,
            rule_count: r.rule_count,
            theme: r.theme,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// Cached rule ids resolved into full rule objects.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedRuleSets {
    pub all: Vec<NotificationRuleResponse>,
    pub active: Vec<NotificationRuleResponse>,
}

/// Preference record expanded with the resolved rule objects.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesExpandedResponse {
    pub preferences: PreferenceResponse,
    pub rules: ResolvedRuleSets,
}

/// Response for the admin preference listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPreferencesResponse {
    pub preferences: Vec<PreferenceResponse>,
    pub pagination: PageMeta,
}

/// Aggregate statistics over all preference records.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceStatsResponse {
    pub total_records: i64,
    /// Sum of the cached rule counters (advisory values).
    pub total_cached_rules: i64,
    pub avg_rules_per_record: f64,
    /// Record counts keyed by theme name.
    pub themes: BTreeMap<String, i64>,
}

/// Preferred-sensor lookup response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferredSensorResponse {
    pub user_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_sensor_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_defaults_to_auto() {
        assert_eq!(Theme::default(), Theme::Auto);
        assert_eq!(Theme::Auto.to_string(), "auto");
    }

    #[test]
    fn test_upsert_request_deserialization() {
        let json = r#"{"preferredSensorId": "sensor-42", "theme": "dark"}"#;
        let request: UpsertPreferencesRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.preferred_sensor_id, Some("sensor-42".to_string()));
        assert_eq!(request.theme, Some(Theme::Dark));
    }

    #[test]
    fn test_upsert_request_ignores_cached_set_fields() {
        // Clients may still send the legacy cache fields; they are not
        // part of the write surface and must not round-trip.
        let json = r#"{
            "theme": "light",
            "allRuleIds": ["550e8400-e29b-41d4-a716-446655440000"],
            "ruleCount": 99
        }"#;
        let request: UpsertPreferencesRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.theme, Some(Theme::Light));
        assert!(request.preferred_sensor_id.is_none());
    }

    #[test]
    fn test_update_request_empty_patch() {
        let request: UpdatePreferencesRequest = serde_json::from_str("{}").unwrap();
        assert!(request.is_empty());

        let request: UpdatePreferencesRequest =
            serde_json::from_str(r#"{"theme": "auto"}"#).unwrap();
        assert!(!request.is_empty());
    }

    #[test]
    fn test_preference_response_serialization() {
        let rule_id = Uuid::new_v4();
        let response = PreferenceResponse {
            user_id: Uuid::new_v4(),
            preferred_sensor_id: None,
            all_rule_ids: vec![rule_id],
            active_rule_ids: vec![],
            rule_count: 1,
            theme: Theme::Auto,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"allRuleIds\""));
        assert!(json.contains("\"activeRuleIds\":[]"));
        assert!(json.contains("\"ruleCount\":1"));
        assert!(json.contains("\"theme\":\"auto\""));
        // Should skip None preferred sensor
        assert!(!json.contains("\"preferredSensorId\""));
    }

    #[test]
    fn test_stats_response_serialization() {
        let mut themes = BTreeMap::new();
        themes.insert("auto".to_string(), 7i64);
        themes.insert("dark".to_string(), 3i64);

        let response = PreferenceStatsResponse {
            total_records: 10,
            total_cached_rules: 25,
            avg_rules_per_record: 2.5,
            themes,
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"totalRecords\":10"));
        assert!(json.contains("\"avgRulesPerRecord\":2.5"));
        assert!(json.contains("\"dark\":3"));
    }
}
