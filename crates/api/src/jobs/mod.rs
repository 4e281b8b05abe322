//! Background job scheduler and job implementations.

mod pool_metrics;
mod reconcile_preferences;
mod scheduler;

pub use pool_metrics::PoolMetricsJob;
pub use reconcile_preferences::ReconcilePreferencesJob;
pub use scheduler::JobScheduler;
