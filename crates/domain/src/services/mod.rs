//! Domain services for Sensor Dash.
//!
//! Services contain business logic that operates on domain models.

pub mod coordination;
pub mod reconciliation;

pub use coordination::{plan, AggregateOp, AggregatePlan, RuleEvent};

pub use reconciliation::{
    compute_repair, Anomaly, LiveRule, ReconciliationReport, RepairOutcome,
};
