mod csv_sink;
mod jsonl_sink;

pub use csv_sink::CsvSink;
pub use jsonl_sink::JsonLinesSink;

use crate::domain::ReviewRecord;
use harvest_errors::SinkError;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Durable destination for a finished review batch.
pub trait ReviewSink {
    /// Writes the whole batch for `site` and returns where it went. Readers
    /// never observe a partially written batch.
    fn store(&self, site: &str, records: &[ReviewRecord]) -> Result<PathBuf, SinkError>;
}

/// `KakaoMap` -> `kakaomap`, `trip.com` -> `trip_com`.
fn file_stem(site: &str) -> String {
    site.trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Temp file inside the output directory so the final rename stays on one
/// filesystem.
fn staging_file(dir: &Path) -> Result<NamedTempFile, SinkError> {
    std::fs::create_dir_all(dir)?;
    Ok(NamedTempFile::new_in(dir)?)
}

fn commit(staged: NamedTempFile, target: &Path) -> Result<(), SinkError> {
    staged
        .persist(target)
        .map_err(|e| SinkError::Io(format!("{}: {}", target.display(), e)))?;
    Ok(())
}
