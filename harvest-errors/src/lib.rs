mod crawl_error;
mod sink_error;

pub use crawl_error::CrawlError;
pub use sink_error::SinkError;
