use super::ReviewRecord;
use chrono::{DateTime, Utc};
use harvest_errors::CrawlError;
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    TargetReached,
    ContentExhausted,
    /// Step or wall-clock cap hit. Treated as normal completion.
    BudgetExhausted,
    /// Fatal error after the crawl started; records gathered so far are kept.
    Failed(CrawlError),
}

impl StopReason {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub run_id: Uuid,
    pub site: String,
    pub started_at: DateTime<Utc>,
    pub records: Vec<ReviewRecord>,
    pub target: usize,
    pub steps: usize,
    pub stop_reason: StopReason,
    pub elapsed: Duration,
}

impl CrawlReport {
    pub fn collected(&self) -> usize {
        self.records.len()
    }

    pub fn summary(&self) -> String {
        let reason = match &self.stop_reason {
            StopReason::TargetReached => "target reached".to_string(),
            StopReason::ContentExhausted => "no more content".to_string(),
            StopReason::BudgetExhausted => "budget exhausted".to_string(),
            StopReason::Failed(e) => format!("failed: {}", e),
        };
        format!(
            "{}: collected {}/{} reviews in {} steps ({:.1}s, {})",
            self.site,
            self.collected(),
            self.target,
            self.steps,
            self.elapsed.as_secs_f32(),
            reason
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_reports_collected_versus_target() {
        let report = CrawlReport {
            run_id: Uuid::new_v4(),
            site: "klook".into(),
            started_at: Utc::now(),
            records: vec![ReviewRecord::new("a"), ReviewRecord::new("b")],
            target: 500,
            steps: 4,
            stop_reason: StopReason::ContentExhausted,
            elapsed: Duration::from_millis(2500),
        };

        assert_eq!(
            report.summary(),
            "klook: collected 2/500 reviews in 4 steps (2.5s, no more content)"
        );
        assert!(!report.stop_reason.is_failure());
    }

    #[test]
    fn test_summary_for_budget_stop() {
        let report = CrawlReport {
            run_id: Uuid::new_v4(),
            site: "kakaomap".into(),
            started_at: Utc::now(),
            records: Vec::new(),
            target: 500,
            steps: 300,
            stop_reason: StopReason::BudgetExhausted,
            elapsed: Duration::from_secs(60),
        };

        assert_eq!(
            report.summary(),
            "kakaomap: collected 0/500 reviews in 300 steps (60.0s, budget exhausted)"
        );
    }
}
