//! Cache coordination and repair services.

pub mod consistency;
pub mod reconciliation;

pub use consistency::ConsistencyCoordinator;
pub use reconciliation::{ReconciliationError, ReconciliationService};
