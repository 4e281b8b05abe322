//! Alert rule endpoint handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use persistence::repositories::{NotificationRepository, UserRepository};
use std::collections::BTreeMap;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::{validation_errors, ApiError};
use crate::extractors::AuthenticatedOwner;
use crate::services::ConsistencyCoordinator;
use domain::models::notification::{
    validate_scope, validate_threshold, CreateNotificationRuleRequest, ListNotificationRulesQuery,
    ListNotificationRulesResponse, NotificationRule, NotificationRuleResponse,
    NotificationStatsResponse, RuleStatus, UpdateNotificationRuleRequest,
};
use domain::models::response::ApiResponse;

/// Create a new alert rule.
///
/// POST /api/v1/notifications
pub async fn create_rule(
    State(state): State<AppState>,
    auth: AuthenticatedOwner,
    Json(request): Json<CreateNotificationRuleRequest>,
) -> Result<(StatusCode, Json<ApiResponse<NotificationRuleResponse>>), ApiError> {
    // Collect every validation problem before rejecting
    let mut errors = match request.validate() {
        Ok(()) => Vec::new(),
        Err(e) => validation_errors(&e),
    };
    errors.extend(validate_threshold(
        request.metric,
        request.comparator,
        &request.threshold,
    ));
    errors.extend(validate_scope(&request.scope));
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let user_repo = UserRepository::new(state.pool.clone());
    if !user_repo.exists(auth.owner_id).await? {
        return Err(ApiError::NotFound("User account not found".to_string()));
    }

    let repo = NotificationRepository::new(state.pool.clone());
    let scope = String::from(request.scope.clone());
    let entity = repo
        .create(
            auth.owner_id,
            request.name.trim(),
            request.metric,
            request.comparator,
            &request.threshold,
            request.message.as_deref().map(str::trim),
            &scope,
        )
        .await?;

    let rule: NotificationRule = entity.into();

    // Cache hook runs strictly after the rule insert has committed
    ConsistencyCoordinator::new(state.pool.clone())
        .on_rule_created(rule.user_id, rule.id)
        .await;

    info!(
        rule_id = %rule.id,
        owner_id = %rule.user_id,
        metric = %rule.metric,
        "Notification rule created"
    );

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            "Notification rule created",
            NotificationRuleResponse::from(rule),
        )),
    ))
}

/// Get a single alert rule by ID.
///
/// GET /api/v1/notifications/:rule_id
pub async fn get_rule(
    State(state): State<AppState>,
    _auth: AuthenticatedOwner,
    Path(rule_id): Path<Uuid>,
) -> Result<Json<ApiResponse<NotificationRuleResponse>>, ApiError> {
    let repo = NotificationRepository::new(state.pool.clone());
    let entity = repo
        .find_by_id(rule_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Notification rule not found".to_string()))?;

    let rule: NotificationRule = entity.into();
    Ok(Json(ApiResponse::ok(
        "Notification rule retrieved",
        NotificationRuleResponse::from(rule),
    )))
}

/// List an owner's alert rules, newest first.
///
/// GET /api/v1/notifications/user/:owner_id?status=<status>&metric=<metric>
pub async fn list_rules(
    State(state): State<AppState>,
    _auth: AuthenticatedOwner,
    Path(owner_id): Path<Uuid>,
    Query(query): Query<ListNotificationRulesQuery>,
) -> Result<Json<ApiResponse<ListNotificationRulesResponse>>, ApiError> {
    let repo = NotificationRepository::new(state.pool.clone());
    let entities = repo
        .list_by_owner(owner_id, query.status, query.metric)
        .await?;

    let notifications: Vec<NotificationRuleResponse> = entities
        .into_iter()
        .map(|e| {
            let rule: NotificationRule = e.into();
            rule.into()
        })
        .collect();
    let total = notifications.len();

    Ok(Json(ApiResponse::ok(
        "Notification rules retrieved",
        ListNotificationRulesResponse {
            notifications,
            total,
        },
    )))
}

/// List an owner's active alert rules.
///
/// GET /api/v1/notifications/user/:owner_id/active
pub async fn list_active_rules(
    State(state): State<AppState>,
    _auth: AuthenticatedOwner,
    Path(owner_id): Path<Uuid>,
) -> Result<Json<ApiResponse<ListNotificationRulesResponse>>, ApiError> {
    let repo = NotificationRepository::new(state.pool.clone());
    let entities = repo
        .list_by_owner(owner_id, Some(RuleStatus::Active), None)
        .await?;

    let notifications: Vec<NotificationRuleResponse> = entities
        .into_iter()
        .map(|e| {
            let rule: NotificationRule = e.into();
            rule.into()
        })
        .collect();
    let total = notifications.len();

    Ok(Json(ApiResponse::ok(
        "Active notification rules retrieved",
        ListNotificationRulesResponse {
            notifications,
            total,
        },
    )))
}

/// Per-owner rule statistics, computed from the rule store alone.
///
/// GET /api/v1/notifications/user/:owner_id/stats
pub async fn rule_stats(
    State(state): State<AppState>,
    _auth: AuthenticatedOwner,
    Path(owner_id): Path<Uuid>,
) -> Result<Json<ApiResponse<NotificationStatsResponse>>, ApiError> {
    let repo = NotificationRepository::new(state.pool.clone());
    let (totals, buckets) = repo.stats(owner_id).await?;

    let by_metric: BTreeMap<String, i64> = buckets
        .into_iter()
        .map(|row| (format!("{}_{}", row.metric, row.status), row.count))
        .collect();

    Ok(Json(ApiResponse::ok(
        "Notification statistics retrieved",
        NotificationStatsResponse {
            total: totals.total,
            active: totals.active,
            inactive: totals.inactive,
            by_metric,
        },
    )))
}

/// Update an alert rule (partial update).
///
/// PUT /api/v1/notifications/:rule_id
pub async fn update_rule(
    State(state): State<AppState>,
    auth: AuthenticatedOwner,
    Path(rule_id): Path<Uuid>,
    Json(request): Json<UpdateNotificationRuleRequest>,
) -> Result<Json<ApiResponse<NotificationRuleResponse>>, ApiError> {
    if request.is_empty() {
        return Err(ApiError::Validation(vec![
            "At least one field must be provided".to_string(),
        ]));
    }

    let mut errors = match request.validate() {
        Ok(()) => Vec::new(),
        Err(e) => validation_errors(&e),
    };

    let repo = NotificationRepository::new(state.pool.clone());
    let current: NotificationRule = repo
        .find_by_id_and_owner(rule_id, auth.owner_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Notification rule not found".to_string()))?
        .into();

    // The combination checks apply to the rule as it will be after the
    // patch, so absent fields fall back to the stored values
    let metric = request.metric.unwrap_or(current.metric);
    let comparator = request.comparator.unwrap_or(current.comparator);
    let threshold = request.threshold.as_ref().unwrap_or(&current.threshold);
    errors.extend(validate_threshold(metric, comparator, threshold));
    if let Some(ref scope) = request.scope {
        errors.extend(validate_scope(scope));
    }
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let scope = request.scope.clone().map(String::from);
    let entity = repo
        .update_partial(
            rule_id,
            auth.owner_id,
            request.name.as_deref().map(str::trim),
            request.metric,
            request.comparator,
            request.threshold.as_ref(),
            request.message.as_deref().map(str::trim),
            scope.as_deref(),
            request.status,
        )
        .await?
        .ok_or_else(|| ApiError::NotFound("Notification rule not found".to_string()))?;

    let rule: NotificationRule = entity.into();

    // A patch that actually flips the status runs the same cache hook as
    // the dedicated activate/deactivate endpoints. Re-asserting the
    // stored status is a no-op for the aggregate.
    if let Some(new_status) = request.status {
        if new_status != current.status {
            ConsistencyCoordinator::new(state.pool.clone())
                .on_status_changed(rule.user_id, rule.id, new_status)
                .await;
        }
    }

    info!(rule_id = %rule.id, owner_id = %rule.user_id, "Notification rule updated");

    Ok(Json(ApiResponse::ok(
        "Notification rule updated",
        NotificationRuleResponse::from(rule),
    )))
}

/// Activate an alert rule.
///
/// PUT /api/v1/notifications/:rule_id/activate
pub async fn activate_rule(
    State(state): State<AppState>,
    auth: AuthenticatedOwner,
    Path(rule_id): Path<Uuid>,
) -> Result<Json<ApiResponse<NotificationRuleResponse>>, ApiError> {
    set_rule_status(state, auth, rule_id, RuleStatus::Active).await
}

/// Deactivate an alert rule.
///
/// PUT /api/v1/notifications/:rule_id/deactivate
pub async fn deactivate_rule(
    State(state): State<AppState>,
    auth: AuthenticatedOwner,
    Path(rule_id): Path<Uuid>,
) -> Result<Json<ApiResponse<NotificationRuleResponse>>, ApiError> {
    set_rule_status(state, auth, rule_id, RuleStatus::Inactive).await
}

/// Shared body of the activate/deactivate handlers.
///
/// The status write is scoped to the verified owner, so a mismatched
/// owner gets the same 404 as a missing rule.
async fn set_rule_status(
    state: AppState,
    auth: AuthenticatedOwner,
    rule_id: Uuid,
    status: RuleStatus,
) -> Result<Json<ApiResponse<NotificationRuleResponse>>, ApiError> {
    let repo = NotificationRepository::new(state.pool.clone());
    let entity = repo
        .set_status(rule_id, auth.owner_id, status)
        .await?
        .ok_or_else(|| ApiError::NotFound("Notification rule not found".to_string()))?;

    let rule: NotificationRule = entity.into();

    ConsistencyCoordinator::new(state.pool.clone())
        .on_status_changed(rule.user_id, rule.id, status)
        .await;

    info!(
        rule_id = %rule.id,
        owner_id = %rule.user_id,
        status = %status,
        "Notification rule status changed"
    );

    let message = match status {
        RuleStatus::Active => "Notification rule activated",
        RuleStatus::Inactive => "Notification rule deactivated",
    };

    Ok(Json(ApiResponse::ok(
        message,
        NotificationRuleResponse::from(rule),
    )))
}

/// Delete an alert rule.
///
/// DELETE /api/v1/notifications/:rule_id
pub async fn delete_rule(
    State(state): State<AppState>,
    auth: AuthenticatedOwner,
    Path(rule_id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let repo = NotificationRepository::new(state.pool.clone());
    let entity = repo
        .delete(rule_id, auth.owner_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Notification rule not found".to_string()))?;

    ConsistencyCoordinator::new(state.pool.clone())
        .on_rule_deleted(entity.user_id, entity.id)
        .await;

    info!(rule_id = %entity.id, owner_id = %entity.user_id, "Notification rule deleted");

    Ok(Json(ApiResponse::ok_message("Notification rule deleted")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::models::notification::{Comparator, Metric, RuleScope, Threshold};

    #[test]
    fn test_created_envelope_serialization() {
        let response = ApiResponse::ok(
            "Notification rule created",
            NotificationRuleResponse {
                id: Uuid::new_v4(),
                user_id: Uuid::new_v4(),
                name: "Greenhouse humidity".to_string(),
                metric: Metric::Humidity,
                comparator: Comparator::LessThan,
                threshold: Threshold::Number(40.0),
                message: None,
                scope: RuleScope::All,
                status: RuleStatus::Inactive,
                created_at: chrono::Utc::now(),
                updated_at: chrono::Utc::now(),
            },
        );

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"success\":true"));
        assert!(json.contains("\"status\":\"inactive\""));
        assert!(json.contains("\"threshold\":40.0"));
    }

    #[test]
    fn test_stats_bucket_key_format() {
        let row = persistence::repositories::MetricStatusCountRow {
            metric: "temperature".to_string(),
            status: "active".to_string(),
            count: 3,
        };
        assert_eq!(format!("{}_{}", row.metric, row.status), "temperature_active");
    }

    #[test]
    fn test_list_response_total_matches_len() {
        let response = ListNotificationRulesResponse {
            notifications: Vec::new(),
            total: 0,
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"notifications\":[]"));
        assert!(json.contains("\"total\":0"));
    }

    #[test]
    fn test_empty_patch_is_detected_before_validation() {
        let request: UpdateNotificationRuleRequest = serde_json::from_str("{}").unwrap();
        assert!(request.is_empty());
    }
}
