use super::{commit, file_stem, staging_file, ReviewSink};
use crate::domain::ReviewRecord;
use harvest_errors::SinkError;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// One JSON document per review in `reviews_<site>.jsonl`, ready for bulk
/// import into a document store.
pub struct JsonLinesSink {
    output_dir: PathBuf,
}

impl JsonLinesSink {
    pub fn new(output_dir: impl AsRef<Path>) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
        }
    }
}

impl ReviewSink for JsonLinesSink {
    fn store(&self, site: &str, records: &[ReviewRecord]) -> Result<PathBuf, SinkError> {
        let path = self.output_dir.join(format!("reviews_{}.jsonl", file_stem(site)));

        let staged = staging_file(&self.output_dir)?;
        {
            let mut writer = BufWriter::new(staged.as_file());
            for record in records {
                serde_json::to_writer(&mut writer, record)
                    .map_err(|e| SinkError::Encode(e.to_string()))?;
                writer.write_all(b"\n")?;
            }
            writer.flush()?;
        }
        commit(staged, &path)?;

        tracing::info!("Saved {} reviews to {}", records.len(), path.display());
        Ok(path)
    }
}
