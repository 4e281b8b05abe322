//! Administrative endpoint handlers.

use axum::{
    extract::{Path, State},
    Json,
};
use persistence::repositories::UserRepository;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::AuthenticatedOwner;
use crate::services::{ReconciliationError, ReconciliationService};
use domain::models::response::ApiResponse;
use domain::services::reconciliation::ReconciliationReport;

/// Summary of an account cascade delete.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountCleanupReport {
    pub owner_id: Uuid,
    pub rules_deleted: u64,
    pub preference_deleted: bool,
}

/// Trigger a reconciliation run immediately.
///
/// POST /api/v1/admin/reconciliation/run
pub async fn run_reconciliation(
    State(state): State<AppState>,
    _auth: AuthenticatedOwner,
) -> Result<Json<ApiResponse<ReconciliationReport>>, ApiError> {
    let report = ReconciliationService::new(state.pool.clone())
        .run()
        .await
        .map_err(|e| match e {
            ReconciliationError::DuplicateRuleIds(_) => ApiError::Internal(e.to_string()),
            ReconciliationError::Database(db) => ApiError::from(db),
        })?;

    Ok(Json(ApiResponse::ok("Reconciliation completed", report)))
}

/// Delete a user account with its rules and preferences.
///
/// DELETE /api/v1/admin/accounts/:owner_id
pub async fn delete_account(
    State(state): State<AppState>,
    _auth: AuthenticatedOwner,
    Path(owner_id): Path<Uuid>,
) -> Result<Json<ApiResponse<AccountCleanupReport>>, ApiError> {
    let repo = UserRepository::new(state.pool.clone());
    let result = repo.delete_cascade(owner_id).await?;

    if !result.user_deleted {
        return Err(ApiError::NotFound("User account not found".to_string()));
    }

    info!(
        owner_id = %owner_id,
        rules_deleted = result.rules_deleted,
        preference_deleted = result.preference_deleted,
        "User account deleted"
    );

    Ok(Json(ApiResponse::ok(
        "User account deleted",
        AccountCleanupReport {
            owner_id,
            rules_deleted: result.rules_deleted,
            preference_deleted: result.preference_deleted,
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cleanup_report_serialization() {
        let report = AccountCleanupReport {
            owner_id: Uuid::new_v4(),
            rules_deleted: 4,
            preference_deleted: true,
        };
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"rulesDeleted\":4"));
        assert!(json.contains("\"preferenceDeleted\":true"));
    }

    #[test]
    fn test_duplicate_ids_error_names_the_ids() {
        let id = Uuid::new_v4();
        let err = ReconciliationError::DuplicateRuleIds(vec![id]);
        assert!(err.to_string().contains(&id.to_string()));
    }
}
