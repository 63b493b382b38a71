use crate::domain::{AdvanceAction, SettleTimings};
use harvest_errors::CrawlError;

/// Result of one advance action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvanceOutcome {
    Advanced,
    /// The page says there is nothing more, e.g. a disabled "next" control.
    Exhausted,
    /// The step failed but the browser is still usable.
    Failed(CrawlError),
}

/// A live, exclusively owned browser page.
///
/// `Err` from any method means the session itself is gone
/// (`CrawlError::SessionCrash`); step-level problems are reported through
/// `AdvanceOutcome::Failed`.
pub trait BrowserSession {
    fn advance(&mut self, action: &AdvanceAction) -> Result<AdvanceOutcome, CrawlError>;

    /// Current rendered markup.
    fn read(&mut self) -> Result<String, CrawlError>;

    /// Releases the browser. Safe to call more than once.
    fn close(&mut self);
}

pub trait SessionLauncher {
    type Session: BrowserSession;

    /// Launches a browser, loads `url` and waits for it to settle.
    fn open(&self, url: &str, settle: &SettleTimings) -> Result<Self::Session, CrawlError>;
}
