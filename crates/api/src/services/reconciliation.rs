//! Preference cache reconciliation.
//!
//! Periodically recomputes every owner's canonical rule-id sets from
//! the authoritative notifications table and overwrites drifted cache
//! fields. Runs are idempotent: a second pass over a repaired database
//! changes nothing.

use std::time::Instant;

use sqlx::PgPool;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use domain::models::preferences::PreferenceRecord;
use domain::services::reconciliation::{compute_repair, LiveRule, ReconciliationReport};
use persistence::repositories::{NotificationRepository, UserPreferencesRepository};

use crate::middleware::metrics::record_reconciliation_run;

/// Reconciliation errors.
#[derive(Error, Debug)]
pub enum ReconciliationError {
    /// The authoritative store holds the same rule id more than once.
    /// Repair cannot proceed because no cached set has a well-defined
    /// canonical form.
    #[error("Duplicate rule ids detected in authoritative store: {0:?}")]
    DuplicateRuleIds(Vec<Uuid>),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Service that scans and repairs the preference aggregate.
#[derive(Clone)]
pub struct ReconciliationService {
    notifications: NotificationRepository,
    preferences: UserPreferencesRepository,
}

impl ReconciliationService {
    /// Creates a service over the shared connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            notifications: NotificationRepository::new(pool.clone()),
            preferences: UserPreferencesRepository::new(pool),
        }
    }

    /// Runs one full reconciliation pass.
    ///
    /// The duplicate-id scan runs before any repair so a corrupted
    /// store never has a winner picked silently. After it passes, every
    /// preference record is diffed against the owner's live rules and
    /// overwritten when drifted, then records are created for owners
    /// that have rules but no record. Rule data is never modified.
    pub async fn run(&self) -> Result<ReconciliationReport, ReconciliationError> {
        let start = Instant::now();

        let duplicates = self.notifications.find_duplicate_ids().await?;
        if !duplicates.is_empty() {
            return Err(ReconciliationError::DuplicateRuleIds(duplicates));
        }

        let mut report = ReconciliationReport::default();

        for entity in self.preferences.find_all().await? {
            let record = PreferenceRecord::from(entity);
            let owner_id = record.user_id;

            let live: Vec<LiveRule> = self
                .notifications
                .live_rules_for_owner(owner_id)
                .await?
                .into_iter()
                .map(|row| LiveRule {
                    id: row.id,
                    is_active: row.is_active,
                })
                .collect();

            let outcome = compute_repair(&record, &live);
            report.records_scanned += 1;
            report.anomalies += outcome.anomalies.len() as u64;

            if outcome.needs_overwrite() {
                warn!(
                    owner_id = %owner_id,
                    anomalies = ?outcome.anomalies,
                    "Repairing drifted preference cache"
                );
                self.preferences
                    .overwrite_sets(
                        owner_id,
                        &outcome.all_rule_ids,
                        &outcome.active_rule_ids,
                        outcome.rule_count,
                    )
                    .await?;
                report.records_repaired += 1;
            }
        }

        for owner_id in self.notifications.owners_without_preferences().await? {
            let live = self.notifications.live_rules_for_owner(owner_id).await?;
            let all_rule_ids: Vec<Uuid> = live.iter().map(|r| r.id).collect();
            let active_rule_ids: Vec<Uuid> =
                live.iter().filter(|r| r.is_active).map(|r| r.id).collect();

            self.preferences
                .create_with_sets(
                    owner_id,
                    &all_rule_ids,
                    &active_rule_ids,
                    all_rule_ids.len() as i32,
                )
                .await?;
            report.records_created += 1;
        }

        report.duration_ms = start.elapsed().as_millis() as u64;

        info!(
            records_scanned = report.records_scanned,
            records_repaired = report.records_repaired,
            records_created = report.records_created,
            anomalies = report.anomalies,
            duration_ms = report.duration_ms,
            "Reconciliation run completed"
        );
        record_reconciliation_run(&report);

        Ok(report)
    }
}
