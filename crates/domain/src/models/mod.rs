//! Domain models for Sensor Dash.

pub mod notification;
pub mod preferences;
pub mod response;

pub use notification::{
    Comparator, CreateNotificationRuleRequest, ListNotificationRulesQuery,
    ListNotificationRulesResponse, Metric, NotificationRule, NotificationRuleResponse,
    NotificationStatsResponse, RuleScope, RuleStatus, Threshold, UpdateNotificationRuleRequest,
};
pub use preferences::{
    ListPreferencesResponse, PreferenceRecord, PreferenceResponse, PreferenceStatsResponse,
    PreferencesExpandedResponse, PreferredSensorResponse, ResolvedRuleSets, Theme,
    UpdatePreferencesRequest, UpsertPreferencesRequest,
};
pub use response::ApiResponse;
