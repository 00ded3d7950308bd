//! Per-run outcome aggregation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::reconciler::ReconcileAction;

/// One artist whose sub-pipeline failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistFailure {
    pub external_id: String,
    pub reason: String,
}

/// Structured outcome of a multi-artist run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub run_id: String,
    pub user_id: Option<String>,
    /// Committed artists in processing order
    pub succeeded: Vec<(String, ReconcileAction)>,
    pub failed: Vec<ArtistFailure>,
    /// Never attempted because an earlier artist stopped the run
    pub skipped: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl SyncReport {
    pub fn new(run_id: impl Into<String>, user_id: Option<String>, started_at: DateTime<Utc>) -> Self {
        Self {
            run_id: run_id.into(),
            user_id,
            succeeded: Vec::new(),
            failed: Vec::new(),
            skipped: Vec::new(),
            started_at,
            finished_at: started_at,
        }
    }

    pub fn record_success(&mut self, external_id: impl Into<String>, action: ReconcileAction) {
        self.succeeded.push((external_id.into(), action));
    }

    pub fn record_failure(&mut self, external_id: impl Into<String>, reason: impl Into<String>) {
        self.failed.push(ArtistFailure {
            external_id: external_id.into(),
            reason: reason.into(),
        });
    }

    pub fn record_skipped(&mut self, external_id: impl Into<String>) {
        self.skipped.push(external_id.into());
    }

    pub fn finish(&mut self, at: DateTime<Utc>) {
        self.finished_at = at.max(self.started_at);
    }

    /// No failures and nothing skipped
    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty() && self.skipped.is_empty()
    }

    pub fn duration_ms(&self) -> u64 {
        u64::try_from((self.finished_at - self.started_at).num_milliseconds()).unwrap_or(0)
    }

    pub fn succeeded_ids(&self) -> impl Iterator<Item = &str> {
        self.succeeded.iter().map(|(id, _)| id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_report_accumulates_outcomes() {
        let start = Utc::now();
        let mut report = SyncReport::new("run-1", Some("user-1".to_string()), start);
        report.record_success("a", ReconcileAction::Created);
        report.record_failure("b", "store error");
        report.record_skipped("c");
        report.finish(start + Duration::milliseconds(250));

        assert_eq!(report.succeeded_ids().collect::<Vec<_>>(), vec!["a"]);
        assert_eq!(report.failed[0].external_id, "b");
        assert_eq!(report.skipped, vec!["c".to_string()]);
        assert_eq!(report.duration_ms(), 250);
        assert!(!report.is_complete_success());
    }

    #[test]
    fn test_finish_never_precedes_start() {
        let start = Utc::now();
        let mut report = SyncReport::new("run", None, start);
        report.finish(start - Duration::seconds(5));

        assert_eq!(report.duration_ms(), 0);
        assert!(report.is_complete_success());
    }

    #[test]
    fn test_report_serializes() {
        let mut report = SyncReport::new("run", None, Utc::now());
        report.record_success("a", ReconcileAction::Updated);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["succeeded"][0][1], "updated");
    }
}
