//! User preference endpoint handlers.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use persistence::repositories::{NotificationRepository, UserPreferencesRepository};
use std::collections::{BTreeMap, HashMap};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::{validation_errors, ApiError};
use crate::extractors::AuthenticatedOwner;
use domain::models::notification::{NotificationRule, NotificationRuleResponse};
use domain::models::preferences::{
    ListPreferencesResponse, PreferenceRecord, PreferenceResponse, PreferenceStatsResponse,
    PreferencesExpandedResponse, PreferredSensorResponse, ResolvedRuleSets,
    UpdatePreferencesRequest, UpsertPreferencesRequest,
};
use domain::models::response::ApiResponse;
use shared::pagination::{Page, PageMeta, PageParams};

/// Get an owner's preferences, expanded with the resolved rule objects.
///
/// GET /api/v1/preferences/:owner_id
///
/// A missing record is created on the fly with defaults; an unknown
/// account surfaces as 404 through the foreign-key check.
pub async fn get_preferences(
    State(state): State<AppState>,
    _auth: AuthenticatedOwner,
    Path(owner_id): Path<Uuid>,
) -> Result<Json<ApiResponse<PreferencesExpandedResponse>>, ApiError> {
    let repo = UserPreferencesRepository::new(state.pool.clone());
    let record: PreferenceRecord = repo.get_or_create(owner_id).await?.into();

    // Resolve both cached sets with one id-batch lookup. Stale cached
    // ids resolve to nothing and are dropped from the expanded arrays;
    // reconciliation removes them from the record itself.
    let mut ids = record.all_rule_ids.clone();
    for id in &record.active_rule_ids {
        if !ids.contains(id) {
            ids.push(*id);
        }
    }

    let notification_repo = NotificationRepository::new(state.pool.clone());
    let by_id: HashMap<Uuid, NotificationRuleResponse> = notification_repo
        .find_by_ids(&ids)
        .await?
        .into_iter()
        .map(|e| {
            let rule: NotificationRule = e.into();
            (rule.id, NotificationRuleResponse::from(rule))
        })
        .collect();

    let all: Vec<NotificationRuleResponse> = record
        .all_rule_ids
        .iter()
        .filter_map(|id| by_id.get(id).cloned())
        .collect();
    let active: Vec<NotificationRuleResponse> = record
        .active_rule_ids
        .iter()
        .filter_map(|id| by_id.get(id).cloned())
        .collect();

    Ok(Json(ApiResponse::ok(
        "Preferences retrieved",
        PreferencesExpandedResponse {
            preferences: record.into(),
            rules: ResolvedRuleSets { all, active },
        },
    )))
}

/// Create or replace the caller's preference settings.
///
/// POST /api/v1/preferences
///
/// Only the user-controlled settings fields are writable; the cached
/// rule-id sets and counter are structurally absent from the payload.
pub async fn upsert_preferences(
    State(state): State<AppState>,
    auth: AuthenticatedOwner,
    Json(request): Json<UpsertPreferencesRequest>,
) -> Result<Json<ApiResponse<PreferenceResponse>>, ApiError> {
    if let Err(e) = request.validate() {
        return Err(ApiError::Validation(validation_errors(&e)));
    }

    let repo = UserPreferencesRepository::new(state.pool.clone());
    let record: PreferenceRecord = repo
        .upsert_settings(
            auth.owner_id,
            request.preferred_sensor_id.as_deref(),
            request.theme,
        )
        .await?
        .into();

    info!(owner_id = %record.user_id, "Preferences saved");

    Ok(Json(ApiResponse::ok(
        "Preferences saved",
        PreferenceResponse::from(record),
    )))
}

/// Partially update an owner's preference settings.
///
/// PUT /api/v1/preferences/:owner_id
pub async fn update_preferences(
    State(state): State<AppState>,
    auth: AuthenticatedOwner,
    Path(owner_id): Path<Uuid>,
    Json(request): Json<UpdatePreferencesRequest>,
) -> Result<Json<ApiResponse<PreferenceResponse>>, ApiError> {
    // A mismatched owner gets the same 404 as a missing record
    if owner_id != auth.owner_id {
        return Err(ApiError::NotFound("Preferences not found".to_string()));
    }

    if request.is_empty() {
        return Err(ApiError::Validation(vec![
            "At least one field must be provided".to_string(),
        ]));
    }
    if let Err(e) = request.validate() {
        return Err(ApiError::Validation(validation_errors(&e)));
    }

    let repo = UserPreferencesRepository::new(state.pool.clone());
    let record: PreferenceRecord = repo
        .update_settings(
            owner_id,
            request.preferred_sensor_id.as_deref(),
            request.theme,
        )
        .await?
        .ok_or_else(|| ApiError::NotFound("Preferences not found".to_string()))?
        .into();

    info!(owner_id = %record.user_id, "Preferences updated");

    Ok(Json(ApiResponse::ok(
        "Preferences updated",
        PreferenceResponse::from(record),
    )))
}

/// Delete an owner's preference record.
///
/// DELETE /api/v1/preferences/:owner_id
pub async fn delete_preferences(
    State(state): State<AppState>,
    auth: AuthenticatedOwner,
    Path(owner_id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    if owner_id != auth.owner_id {
        return Err(ApiError::NotFound("Preferences not found".to_string()));
    }

    let repo = UserPreferencesRepository::new(state.pool.clone());
    let rows_affected = repo.delete(owner_id).await?;

    if rows_affected == 0 {
        return Err(ApiError::NotFound("Preferences not found".to_string()));
    }

    info!(owner_id = %owner_id, "Preferences deleted");

    Ok(Json(ApiResponse::ok_message("Preferences deleted")))
}

/// List all preference records, paged.
///
/// GET /api/v1/preferences?page=<n>&limit=<n>
pub async fn list_preferences(
    State(state): State<AppState>,
    _auth: AuthenticatedOwner,
    Query(params): Query<PageParams>,
) -> Result<Json<ApiResponse<ListPreferencesResponse>>, ApiError> {
    let page = Page::from_params(params);

    let repo = UserPreferencesRepository::new(state.pool.clone());
    let entities = repo.list_paged(i64::from(page.limit), page.offset()).await?;
    let total = repo.count_all().await?;

    let preferences: Vec<PreferenceResponse> = entities
        .into_iter()
        .map(|e| {
            let record: PreferenceRecord = e.into();
            record.into()
        })
        .collect();

    Ok(Json(ApiResponse::ok(
        "Preferences retrieved",
        ListPreferencesResponse {
            preferences,
            pagination: PageMeta::new(page, total),
        },
    )))
}

/// Aggregate statistics over all preference records.
///
/// GET /api/v1/preferences/stats
pub async fn preference_stats(
    State(state): State<AppState>,
    _auth: AuthenticatedOwner,
) -> Result<Json<ApiResponse<PreferenceStatsResponse>>, ApiError> {
    let repo = UserPreferencesRepository::new(state.pool.clone());
    let (totals, theme_rows) = repo.aggregate_stats().await?;

    let avg_rules_per_record = if totals.total_records > 0 {
        totals.total_cached_rules as f64 / totals.total_records as f64
    } else {
        0.0
    };

    let themes: BTreeMap<String, i64> = theme_rows
        .into_iter()
        .map(|row| (row.theme, row.count))
        .collect();

    Ok(Json(ApiResponse::ok(
        "Preference statistics retrieved",
        PreferenceStatsResponse {
            total_records: totals.total_records,
            total_cached_rules: totals.total_cached_rules,
            avg_rules_per_record,
            themes,
        },
    )))
}

/// Look up an owner's preferred sensor.
///
/// GET /api/v1/preferences/:owner_id/sensor
pub async fn preferred_sensor(
    State(state): State<AppState>,
    _auth: AuthenticatedOwner,
    Path(owner_id): Path<Uuid>,
) -> Result<Json<ApiResponse<PreferredSensorResponse>>, ApiError> {
    let repo = UserPreferencesRepository::new(state.pool.clone());
    let record: PreferenceRecord = repo
        .find_by_user_id(owner_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Preferences not found".to_string()))?
        .into();

    Ok(Json(ApiResponse::ok(
        "Preferred sensor retrieved",
        PreferredSensorResponse {
            user_id: record.user_id,
            preferred_sensor_id: record.preferred_sensor_id,
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use domain::models::preferences::Theme;

    fn sample_record() -> PreferenceRecord {
        PreferenceRecord {
            user_id: Uuid::new_v4(),
            preferred_sensor_id: Some("sensor-7".to_string()),
            all_rule_ids: vec![],
            active_rule_ids: vec![],
            rule_count: 0,
            theme: Theme::Dark,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_expanded_response_serialization() {
        let response = PreferencesExpandedResponse {
            preferences: PreferenceResponse::from(sample_record()),
            rules: ResolvedRuleSets {
                all: vec![],
                active: vec![],
            },
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"preferences\""));
        assert!(json.contains("\"rules\":{\"all\":[],\"active\":[]}"));
    }

    #[test]
    fn test_preferred_sensor_response_skips_none() {
        let response = PreferredSensorResponse {
            user_id: Uuid::new_v4(),
            preferred_sensor_id: None,
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("preferredSensorId"));
    }

    #[test]
    fn test_avg_rules_math_guards_empty_fleet() {
        let total_records = 0i64;
        let total_cached_rules = 0i64;
        let avg = if total_records > 0 {
            total_cached_rules as f64 / total_records as f64
        } else {
            0.0
        };
        assert_eq!(avg, 0.0);
    }

    #[test]
    fn test_union_keeps_order_and_dedupes() {
        let (a, b, phantom) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let all = vec![a, b];
        let active = vec![b, phantom];

        let mut ids = all.clone();
        for id in &active {
            if !ids.contains(id) {
                ids.push(*id);
            }
        }
        assert_eq!(ids, vec![a, b, phantom]);
    }
}
