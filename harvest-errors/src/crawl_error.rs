use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum CrawlError {
    #[error("Failed to launch browser: {0}")]
    BrowserLaunch(String),

    #[error("Failed to load page: {0}")]
    Navigation(String),

    #[error("Browser action failed: {0}")]
    ActionFailed(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Review field missing: {0}")]
    ExtractionFieldMissing(String),

    #[error("Browser session crashed: {0}")]
    SessionCrash(String),

    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    #[error("Invalid site configuration: {0}")]
    Config(String),
}

impl CrawlError {
    /// Fatal errors end the crawl; everything else is absorbed by the
    /// collector and only ends the current step, filter or record.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::BrowserLaunch(_)
                | Self::Navigation(_)
                | Self::SessionCrash(_)
                | Self::InvalidSelector(_)
                | Self::Config(_)
        )
    }

    pub fn user_message(&self) -> &str {
        match self {
            Self::BrowserLaunch(_) => "Could not start Chrome. Is it installed?",
            Self::Navigation(_) => "The review page could not be loaded.",
            Self::ActionFailed(_) => "A page interaction failed.",
            Self::ElementNotFound(_) => "An expected page element was missing.",
            Self::ExtractionFieldMissing(_) => "A review was missing a required field.",
            Self::SessionCrash(_) => "The browser died mid-crawl; partial results kept.",
            Self::InvalidSelector(_) | Self::Config(_) => "The site configuration is invalid.",
        }
    }
}
