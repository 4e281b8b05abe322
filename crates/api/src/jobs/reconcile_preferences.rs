//! Periodic preference cache reconciliation job.

use sqlx::PgPool;

use super::scheduler::{Job, JobFrequency};
use crate::services::ReconciliationService;

/// Background job that repairs drift in the preference aggregate.
pub struct ReconcilePreferencesJob {
    service: ReconciliationService,
    interval_secs: u64,
}

impl ReconcilePreferencesJob {
    /// Create a new reconciliation job running every `interval_secs`.
    pub fn new(pool: PgPool, interval_secs: u64) -> Self {
        Self {
            service: ReconciliationService::new(pool),
            interval_secs,
        }
    }
}

#[async_trait::async_trait]
impl Job for ReconcilePreferencesJob {
    fn name(&self) -> &'static str {
        "reconcile_preferences"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Seconds(self.interval_secs)
    }

    async fn execute(&self) -> Result<(), String> {
        self.service
            .run()
            .await
            .map(|_| ())
            .map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frequency_follows_configured_interval() {
        let freq = JobFrequency::Seconds(900);
        assert_eq!(freq.duration(), std::time::Duration::from_secs(900));
    }
}
