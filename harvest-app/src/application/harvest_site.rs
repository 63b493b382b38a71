use super::IncrementalCollector;
use crate::domain::{CrawlReport, SiteConfig};
use crate::infrastructure::browser::{BrowserSession, SessionLauncher};
use chrono::Utc;
use harvest_errors::CrawlError;
use std::time::Instant;
use uuid::Uuid;

/// Crawls one site: open a browser, collect, close it.
///
/// Returns `Err` only when the crawl could not start (bad configuration,
/// launch or navigation failure). Once collecting, the result is always a
/// report, partial if the browser died.
pub struct HarvestSite<L: SessionLauncher> {
    launcher: L,
}

impl<L: SessionLauncher> HarvestSite<L> {
    pub fn new(launcher: L) -> Self {
        Self { launcher }
    }

    pub fn execute(&self, site: &SiteConfig) -> Result<CrawlReport, CrawlError> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("crawl", site = %site.name, %run_id);
        let _guard = span.enter();

        let started_at = Utc::now();
        let started = Instant::now();
        let collector = IncrementalCollector::new(site)?;

        tracing::info!("Starting crawl of {} (target {})", site.url, site.target_count);
        let mut session = self.launcher.open(&site.url, &site.settle)?;
        let collection = collector.collect(&mut session);
        session.close();

        let report = CrawlReport {
            run_id,
            site: site.name.clone(),
            started_at,
            records: collection.records,
            target: site.target_count,
            steps: collection.steps,
            stop_reason: collection.stop_reason,
            elapsed: started.elapsed(),
        };
        tracing::info!("{}", report.summary());
        Ok(report)
    }
}
