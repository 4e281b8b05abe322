//! Coordination plan between rule mutations and the preference aggregate.
//!
//! Every mutating rule operation produces a [`RuleEvent`]; [`plan`] maps
//! it to the ordered aggregate operations that keep the cached rule-id
//! sets in step. Plans are executed strictly after the authoritative
//! rule-store write has committed, and execution stops at the first
//! failed step; the resulting drift is repaired by reconciliation, never
//! by retrying here.

use uuid::Uuid;

use crate::models::notification::RuleStatus;

/// A mutation that happened in the authoritative rule store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleEvent {
    /// A rule was inserted (always inactive).
    Created { owner_id: Uuid, rule_id: Uuid },
    /// A rule's lifecycle status flipped.
    StatusChanged {
        owner_id: Uuid,
        rule_id: Uuid,
        to: RuleStatus,
    },
    /// A rule was removed.
    Deleted { owner_id: Uuid, rule_id: Uuid },
}

impl RuleEvent {
    pub fn owner_id(&self) -> Uuid {
        match self {
            Self::Created { owner_id, .. }
            | Self::StatusChanged { owner_id, .. }
            | Self::Deleted { owner_id, .. } => *owner_id,
        }
    }

    pub fn rule_id(&self) -> Uuid {
        match self {
            Self::Created { rule_id, .. }
            | Self::StatusChanged { rule_id, .. }
            | Self::Deleted { rule_id, .. } => *rule_id,
        }
    }
}

/// A single aggregate mutation, applied to the event's `(owner, rule)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateOp {
    /// Create the owner's preference record if it does not exist yet.
    EnsureRecord,
    /// Idempotently add the rule id to the full set, bumping the counter
    /// only when the id is newly inserted.
    AddRuleId,
    /// Add to (true) or remove from (false) the active set.
    SetActive(bool),
    /// Remove the rule id from both sets, decrementing the counter only
    /// when the id was present in the full set.
    RemoveRuleId,
}

/// Ordered aggregate operations for one rule event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatePlan {
    pub owner_id: Uuid,
    pub rule_id: Uuid,
    pub ops: Vec<AggregateOp>,
}

/// Maps a rule event to its aggregate plan.
///
/// The plan depends only on the event, not on the current cache state:
/// an activation always re-adds the id before marking it active, which
/// is a no-op against a consistent cache and heals a drifted one.
pub fn plan(event: &RuleEvent) -> AggregatePlan {
    let ops = match event {
        RuleEvent::Created { .. } => vec![AggregateOp::EnsureRecord, AggregateOp::AddRuleId],
        RuleEvent::StatusChanged {
            to: RuleStatus::Active,
            ..
        } => vec![AggregateOp::AddRuleId, AggregateOp::SetActive(true)],
        RuleEvent::StatusChanged {
            to: RuleStatus::Inactive,
            ..
        } => vec![AggregateOp::SetActive(false)],
        RuleEvent::Deleted { .. } => vec![AggregateOp::RemoveRuleId],
    };

    AggregatePlan {
        owner_id: event.owner_id(),
        rule_id: event.rule_id(),
        ops,
    }
}
