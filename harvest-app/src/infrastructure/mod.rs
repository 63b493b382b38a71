pub mod browser;
pub mod config;
pub mod extractor;
pub mod sink;
