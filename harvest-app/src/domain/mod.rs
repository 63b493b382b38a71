mod crawl_report;
mod dedup;
mod review;
mod review_batch;
mod site;

pub use crawl_report::{CrawlReport, StopReason};
pub use dedup::{DedupKey, DedupStrategy};
pub use review::{Rating, ReviewRecord};
pub use review_batch::ReviewBatch;
pub use site::{
    AdvanceAction, BrowserOptions, DateRewrite, FieldLocator, Locator, RatingLocator,
    SelectorConfig, SettleTimings, SiteConfig, TextTake,
};
