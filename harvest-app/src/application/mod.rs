mod collect_reviews;
mod harvest_site;

pub use collect_reviews::{Collection, IncrementalCollector};
pub use harvest_site::HarvestSite;
