//! Cache repair computation for preference reconciliation.
//!
//! [`compute_repair`] compares one preference record against the live
//! rules of its owner and produces the recomputed canonical sets plus
//! the anomalies found. The recomputed truth always wins; callers
//! overwrite the cached fields whenever any anomaly is reported. Rule
//! data itself is never touched.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

use crate::models::preferences::PreferenceRecord;

/// Minimal projection of a live rule, ordered by creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiveRule {
    pub id: Uuid,
    pub is_active: bool,
}

/// A single cache defect detected during repair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anomaly {
    /// An id appears more than once within a cached array.
    DuplicateCachedId { id: Uuid },
    /// Cached in the full set but the rule no longer exists.
    StaleAllId { id: Uuid },
    /// The rule exists but is missing from the cached full set.
    MissingAllId { id: Uuid },
    /// Cached as active but the rule is gone or inactive.
    StaleActiveId { id: Uuid },
    /// The rule is active but missing from the cached active set.
    MissingActiveId { id: Uuid },
    /// The advisory counter disagrees with the recomputed cardinality.
    CountMismatch { cached: i32, actual: usize },
}

/// Result of comparing a record against its owner's live rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairOutcome {
    /// Canonical full set, in rule creation order.
    pub all_rule_ids: Vec<Uuid>,
    /// Canonical active set, in rule creation order.
    pub active_rule_ids: Vec<Uuid>,
    /// Canonical counter: the cardinality of the full set.
    pub rule_count: i32,
    pub anomalies: Vec<Anomaly>,
}

impl RepairOutcome {
    /// True when the cached fields must be overwritten.
    ///
    /// Set comparison is order-insensitive: a record whose arrays hold
    /// the right members in a different order is not drifted.
    pub fn needs_overwrite(&self) -> bool {
        !self.anomalies.is_empty()
    }
}

/// Recomputes the canonical cache for one record and diffs it against
/// the stored one.
///
/// `live` must contain every rule currently owned by the record's owner;
/// the output sets preserve its order.
pub fn compute_repair(record: &PreferenceRecord, live: &[LiveRule]) -> RepairOutcome {
    let all_rule_ids: Vec<Uuid> = live.iter().map(|r| r.id).collect();
    let active_rule_ids: Vec<Uuid> = live.iter().filter(|r| r.is_active).map(|r| r.id).collect();

    let live_all: HashSet<Uuid> = all_rule_ids.iter().copied().collect();
    let live_active: HashSet<Uuid> = active_rule_ids.iter().copied().collect();

    let mut anomalies = Vec::new();

    let cached_all = distinct_with_duplicates(&record.all_rule_ids, &mut anomalies);
    let cached_active = distinct_with_duplicates(&record.active_rule_ids, &mut anomalies);

    for id in &cached_all {
        if !live_all.contains(id) {
            anomalies.push(Anomaly::StaleAllId { id: *id });
        }
    }
    for id in &all_rule_ids {
        if !cached_all.contains(id) {
            anomalies.push(Anomaly::MissingAllId { id: *id });
        }
    }

    for id in &cached_active {
        if !live_active.contains(id) {
            anomalies.push(Anomaly::StaleActiveId { id: *id });
        }
    }
    for id in &active_rule_ids {
        if !cached_active.contains(id) {
            anomalies.push(Anomaly::MissingActiveId { id: *id });
        }
    }

    if record.rule_count < 0 || record.rule_count as usize != all_rule_ids.len() {
        anomalies.push(Anomaly::CountMismatch {
            cached: record.rule_count,
            actual: all_rule_ids.len(),
        });
    }

    RepairOutcome {
        rule_count: all_rule_ids.len() as i32,
        all_rule_ids,
        active_rule_ids,
        anomalies,
    }
}

/// Collects the distinct ids of a cached array, reporting each id that
/// occurs more than once exactly once.
fn distinct_with_duplicates(ids: &[Uuid], anomalies: &mut Vec<Anomaly>) -> HashSet<Uuid> {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    for id in ids {
        if !seen.insert(*id) && reported.insert(*id) {
            anomalies.push(Anomaly::DuplicateCachedId { id: *id });
        }
    }
    seen
}

/// Summary of one reconciliation run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationReport {
    /// Preference records examined.
    pub records_scanned: u64,
    /// Records whose cached fields were overwritten.
    pub records_repaired: u64,
    /// Records created for owners that had rules but no record.
    pub records_created: u64,
    /// Total anomalies detected across all records.
    pub anomalies: u64,
    pub duration_ms: u64,
}
