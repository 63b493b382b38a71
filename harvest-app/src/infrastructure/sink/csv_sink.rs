use super::{commit, file_stem, staging_file, ReviewSink};
use crate::domain::ReviewRecord;
use harvest_errors::SinkError;
use std::path::{Path, PathBuf};

/// Writes `reviews_<site>.csv` with columns `rating,date,content`, plus
/// `filter_tag` when the batch was collected through filters.
pub struct CsvSink {
    output_dir: PathBuf,
}

impl CsvSink {
    pub fn new(output_dir: impl AsRef<Path>) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
        }
    }
}

impl ReviewSink for CsvSink {
    fn store(&self, site: &str, records: &[ReviewRecord]) -> Result<PathBuf, SinkError> {
        let path = self.output_dir.join(format!("reviews_{}.csv", file_stem(site)));
        let with_filter_tag = records.iter().any(|r| r.filter_tag.is_some());

        let staged = staging_file(&self.output_dir)?;
        {
            let mut writer = csv::Writer::from_writer(staged.as_file());

            let mut header = vec!["rating", "date", "content"];
            if with_filter_tag {
                header.push("filter_tag");
            }
            writer.write_record(&header).map_err(encode_error)?;

            for record in records {
                let mut row = vec![
                    record.rating.as_ref().map(ToString::to_string).unwrap_or_default(),
                    record.date.clone().unwrap_or_default(),
                    record.content.clone(),
                ];
                if with_filter_tag {
                    row.push(record.filter_tag.map(|t| t.to_string()).unwrap_or_default());
                }
                writer.write_record(&row).map_err(encode_error)?;
            }

            writer.flush()?;
        }
        commit(staged, &path)?;

        tracing::info!("Saved {} reviews to {}", records.len(), path.display());
        Ok(path)
    }
}

fn encode_error(e: csv::Error) -> SinkError {
    SinkError::Encode(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Rating;

    #[test]
    fn test_writes_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let sink = CsvSink::new(dir.path());
        let records = vec![
            ReviewRecord::new("야경이 예뻐요, 또 올게요")
                .with_rating(Some(Rating::Stars(5)))
                .with_date(Some("2024.05.01.".into())),
            ReviewRecord::new("줄이 \"너무\" 길어요"),
        ];

        let path = sink.store("KakaoMap", &records).unwrap();

        assert_eq!(path, dir.path().join("reviews_kakaomap.csv"));
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            written,
            "rating,date,content\n5,2024.05.01.,\"야경이 예뻐요, 또 올게요\"\n,,\"줄이 \"\"너무\"\" 길어요\"\n"
        );
    }

    #[test]
    fn test_filter_tag_column_when_present() {
        let dir = tempfile::tempdir().unwrap();
        let sink = CsvSink::new(dir.path());
        let records = vec![
            ReviewRecord::new("fun")
                .with_rating(Some(Rating::Text("4.5".into())))
                .with_date(Some("2024.03.05".into()))
                .with_filter_tag(Some(2)),
        ];

        let path = sink.store("tripdotcom", &records).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(headers, ["rating", "date", "content", "filter_tag"]);
        let row = reader.records().next().unwrap().unwrap();
        assert_eq!(row.iter().collect::<Vec<_>>(), ["4.5", "2024.03.05", "fun", "2"]);
    }

    #[test]
    fn test_creates_missing_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("database").join("raw");
        let sink = CsvSink::new(&nested);

        let path = sink.store("klook", &[]).unwrap();

        assert_eq!(std::fs::read_to_string(path).unwrap(), "rating,date,content\n");
    }

    #[test]
    fn test_replaces_previous_batch() {
        let dir = tempfile::tempdir().unwrap();
        let sink = CsvSink::new(dir.path());
        sink.store("klook", &[ReviewRecord::new("old")]).unwrap();

        let path = sink.store("klook", &[ReviewRecord::new("new")]).unwrap();

        assert_eq!(
            std::fs::read_to_string(path).unwrap(),
            "rating,date,content\n,,new\n"
        );
    }
}
