use super::{Rating, ReviewRecord};
use serde::{Deserialize, Serialize};

/// How a site decides that two records are the same review.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupStrategy {
    /// Body text alone. Survives re-renders that change rating or date
    /// formatting between pages.
    #[default]
    Content,
    /// Exact `(rating, date, content)` tuple, for sites where short texts
    /// like "좋아요" repeat across genuinely different reviews.
    Record,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DedupKey {
    Content(String),
    Record {
        rating: Option<Rating>,
        date: Option<String>,
        content: String,
    },
}

impl DedupKey {
    pub fn for_record(record: &ReviewRecord, strategy: DedupStrategy) -> Self {
        match strategy {
            DedupStrategy::Content => Self::Content(record.content.clone()),
            DedupStrategy::Record => Self::Record {
                rating: record.rating.clone(),
                date: record.date.clone(),
                content: record.content.clone(),
            },
        }
    }
}
