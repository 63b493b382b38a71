mod review_extractor;

pub use review_extractor::{count_matches, Extraction, ReviewExtractor};
