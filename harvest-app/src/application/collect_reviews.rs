use crate::domain::{AdvanceAction, ReviewBatch, ReviewRecord, SiteConfig, StopReason};
use crate::infrastructure::browser::{AdvanceOutcome, BrowserSession};
use crate::infrastructure::extractor::{count_matches, ReviewExtractor};
use harvest_errors::CrawlError;
use std::time::Instant;

/// What one collection run produced. Partial batches are valid output.
#[derive(Debug)]
pub struct Collection {
    pub records: Vec<ReviewRecord>,
    pub steps: usize,
    pub stop_reason: StopReason,
}

/// Drives a browser session through a site's review listing until the
/// target count is met, the content runs out, or the step budget is spent.
///
/// Advances are at-least-once: the same page may be extracted repeatedly,
/// and only the dedup key keeps the output clean.
pub struct IncrementalCollector<'a> {
    site: &'a SiteConfig,
    extractor: ReviewExtractor,
}

struct CollectionRun {
    batch: ReviewBatch,
    steps: usize,
    started: Instant,
}

impl<'a> IncrementalCollector<'a> {
    pub fn new(site: &'a SiteConfig) -> Result<Self, CrawlError> {
        site.validate()?;
        let extractor = ReviewExtractor::new(&site.selectors)?;
        if let Some(filters) = &site.filters {
            count_matches("", filters)?;
        }
        Ok(Self { site, extractor })
    }

    pub fn collect<S: BrowserSession + ?Sized>(&self, session: &mut S) -> Collection {
        let mut run = CollectionRun {
            batch: ReviewBatch::new(self.site.dedup),
            steps: 0,
            started: Instant::now(),
        };

        let stop_reason = match self.drive(session, &mut run) {
            Ok(reason) => reason,
            Err(e) => {
                tracing::error!(
                    "Crawl of {} aborted after {} reviews: {}",
                    self.site.name,
                    run.batch.len(),
                    e
                );
                StopReason::Failed(e)
            }
        };

        Collection {
            records: run.batch.into_records(),
            steps: run.steps,
            stop_reason,
        }
    }

    fn drive<S: BrowserSession + ?Sized>(
        &self,
        session: &mut S,
        run: &mut CollectionRun,
    ) -> Result<StopReason, CrawlError> {
        self.run_setup(session)?;

        let Some(landing) = read_page(session)? else {
            return Ok(StopReason::ContentExhausted);
        };

        let Some(filter_selector) = &self.site.filters else {
            return Ok(self
                .paginate(session, run, None, landing)?
                .unwrap_or(StopReason::ContentExhausted));
        };

        let filter_count = count_matches(&landing, filter_selector)?;
        if filter_count == 0 {
            tracing::warn!("No filter controls match '{}', collecting unfiltered", filter_selector);
            return Ok(self
                .paginate(session, run, None, landing)?
                .unwrap_or(StopReason::ContentExhausted));
        }

        tracing::info!("Iterating {} review filters", filter_count);
        for index in 0..filter_count {
            let action = AdvanceAction::SelectFilter {
                selector: filter_selector.clone(),
                index,
            };
            let previous =
                read_page(session)?.and_then(|page| self.extractor.trailing_text(&page));
            match advance(session, &action)? {
                AdvanceOutcome::Advanced => {
                    tracing::info!("Selected filter {}", index);
                }
                AdvanceOutcome::Exhausted => {
                    tracing::info!("Filter {} is inactive, skipping", index);
                    continue;
                }
                AdvanceOutcome::Failed(e) => {
                    tracing::warn!("Selecting filter {} failed, skipping: {}", index, e);
                    continue;
                }
            }

            // Unchanged after the timeout: the tab already showed this listing.
            let page = match self.wait_for_change(session, previous.as_deref())? {
                Some(page) => page,
                None => match read_page(session)? {
                    Some(page) => page,
                    None => continue,
                },
            };
            if let Some(reason) = self.paginate(session, run, Some(index), page)? {
                return Ok(reason);
            }
        }

        Ok(StopReason::ContentExhausted)
    }

    /// Best-effort; a failed step abandons the rest of the setup sequence.
    fn run_setup<S: BrowserSession + ?Sized>(&self, session: &mut S) -> Result<(), CrawlError> {
        for action in &self.site.setup {
            match advance(session, action)? {
                AdvanceOutcome::Advanced => tracing::info!("Setup step {} done", action),
                AdvanceOutcome::Exhausted => {
                    tracing::warn!("Setup step {} had no effect", action);
                }
                AdvanceOutcome::Failed(e) => {
                    tracing::warn!("Setup step {} failed, continuing without it: {}", action, e);
                    break;
                }
            }
        }
        Ok(())
    }

    /// Collects one filter's pages. `None` means this pass ran out of
    /// content and the next filter may continue.
    fn paginate<S: BrowserSession + ?Sized>(
        &self,
        session: &mut S,
        run: &mut CollectionRun,
        filter: Option<usize>,
        mut page: String,
    ) -> Result<Option<StopReason>, CrawlError> {
        loop {
            run.steps += 1;
            let extraction = self.extractor.extract(&page);
            let before = run.batch.len();

            for record in extraction.records {
                if run.batch.len() >= self.site.target_count {
                    break;
                }
                run.batch.offer(record.with_filter_tag(filter));
            }

            tracing::info!(
                "[step {}] {} new reviews ({} candidates, {} dropped), {} total",
                run.steps,
                run.batch.len() - before,
                extraction.candidates,
                extraction.dropped,
                run.batch.len()
            );

            if run.batch.len() >= self.site.target_count {
                return Ok(Some(StopReason::TargetReached));
            }

            if extraction.candidates == 0 {
                tracing::warn!("No review containers on page; check the container selector");
                return Ok(None);
            }

            if run.steps >= self.site.max_steps {
                tracing::warn!("Step budget of {} exhausted", self.site.max_steps);
                return Ok(Some(StopReason::BudgetExhausted));
            }

            if let Some(limit) = self.site.max_duration() {
                if run.started.elapsed() >= limit {
                    tracing::warn!("Time budget of {:?} exhausted", limit);
                    return Ok(Some(StopReason::BudgetExhausted));
                }
            }

            let Some(action) = &self.site.pagination else {
                return Ok(None);
            };

            match advance(session, action)? {
                AdvanceOutcome::Advanced => {}
                AdvanceOutcome::Exhausted => {
                    tracing::info!("No further pages");
                    return Ok(None);
                }
                AdvanceOutcome::Failed(e) => {
                    tracing::warn!("{} failed, ending this pass: {}", action, e);
                    return Ok(None);
                }
            }

            match self.wait_for_change(session, extraction.trailing_text.as_deref())? {
                Some(next) => page = next,
                None => {
                    tracing::info!("No new content appeared after {}", action);
                    return Ok(None);
                }
            }
        }
    }

    /// Polls the page until its last review differs from `previous` or the
    /// change timeout passes.
    fn wait_for_change<S: BrowserSession + ?Sized>(
        &self,
        session: &mut S,
        previous: Option<&str>,
    ) -> Result<Option<String>, CrawlError> {
        let settle = &self.site.settle;
        let deadline = Instant::now() + settle.change_timeout();

        loop {
            let Some(page) = read_page(session)? else {
                return Ok(None);
            };

            let trailing = self.extractor.trailing_text(&page);
            if trailing.is_some() && trailing.as_deref() != previous {
                return Ok(Some(page));
            }

            if Instant::now() >= deadline {
                return Ok(None);
            }
            std::thread::sleep(settle.poll_interval());
        }
    }
}

fn advance<S: BrowserSession + ?Sized>(
    session: &mut S,
    action: &AdvanceAction,
) -> Result<AdvanceOutcome, CrawlError> {
    match session.advance(action) {
        Err(e) if !e.is_fatal() => Ok(AdvanceOutcome::Failed(e)),
        other => other,
    }
}

fn read_page<S: BrowserSession + ?Sized>(session: &mut S) -> Result<Option<String>, CrawlError> {
    match session.read() {
        Ok(page) => Ok(Some(page)),
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            tracing::warn!("Could not read page: {}", e);
            Ok(None)
        }
    }
}
