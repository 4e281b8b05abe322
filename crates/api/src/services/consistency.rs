//! Synchronous aggregate upkeep after rule mutations.
//!
//! Every mutating rule handler calls one of the hooks here after its
//! authoritative write has committed. The hooks execute the aggregate
//! plan for the event against the preference cache and never fail the
//! caller: a failed step is logged and counted, the remaining steps are
//! skipped, and the resulting drift is left for the reconciliation job.

use sqlx::PgPool;
use tracing::error;
use uuid::Uuid;

use domain::models::notification::RuleStatus;
use domain::services::coordination::{self, AggregateOp, RuleEvent};
use persistence::repositories::UserPreferencesRepository;

use crate::middleware::metrics::record_aggregate_hook_failure;

/// Executes aggregate plans for rule events against the preference cache.
#[derive(Clone)]
pub struct ConsistencyCoordinator {
    preferences: UserPreferencesRepository,
}

impl ConsistencyCoordinator {
    /// Creates a coordinator over the shared connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            preferences: UserPreferencesRepository::new(pool),
        }
    }

    /// Hook for a freshly inserted rule.
    pub async fn on_rule_created(&self, owner_id: Uuid, rule_id: Uuid) {
        self.apply(RuleEvent::Created { owner_id, rule_id }).await;
    }

    /// Hook for an activation or deactivation.
    pub async fn on_status_changed(&self, owner_id: Uuid, rule_id: Uuid, to: RuleStatus) {
        self.apply(RuleEvent::StatusChanged {
            owner_id,
            rule_id,
            to,
        })
        .await;
    }

    /// Hook for a removed rule.
    pub async fn on_rule_deleted(&self, owner_id: Uuid, rule_id: Uuid) {
        self.apply(RuleEvent::Deleted { owner_id, rule_id }).await;
    }

    /// Runs the plan for one event, stopping at the first failed step.
    ///
    /// A step that affects zero rows is a success: the membership guards
    /// in the repository make re-applied operations no-ops. Only a
    /// database error aborts the plan, and it is swallowed after
    /// logging so the rule write that triggered the event still
    /// succeeds from the client's point of view.
    pub async fn apply(&self, event: RuleEvent) {
        let plan = coordination::plan(&event);

        for op in &plan.ops {
            let result = match op {
                AggregateOp::EnsureRecord => self
                    .preferences
                    .get_or_create(plan.owner_id)
                    .await
                    .map(|_| ()),
                AggregateOp::AddRuleId => self
                    .preferences
                    .add_rule_id(plan.owner_id, plan.rule_id)
                    .await
                    .map(|_| ()),
                AggregateOp::SetActive(active) => self
                    .preferences
                    .set_active(plan.owner_id, plan.rule_id, *active)
                    .await
                    .map(|_| ()),
                AggregateOp::RemoveRuleId => self
                    .preferences
                    .remove_rule_id(plan.owner_id, plan.rule_id)
                    .await
                    .map(|_| ()),
            };

            if let Err(e) = result {
                error!(
                    owner_id = %plan.owner_id,
                    rule_id = %plan.rule_id,
                    op = ?op,
                    error = %e,
                    "Aggregate update failed after rule write; leaving drift for reconciliation"
                );
                record_aggregate_hook_failure();
                return;
            }
        }
    }
}
