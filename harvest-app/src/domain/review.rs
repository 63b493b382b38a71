use serde::{Deserialize, Serialize};
use std::fmt;

/// Rating as shown on the page. Sites render either a row of star icons
/// (counted) or a printed score; neither is normalized at scrape time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Rating {
    Stars(u32),
    Text(String),
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stars(count) => write!(f, "{}", count),
            Self::Text(text) => f.write_str(text),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub rating: Option<Rating>,
    pub date: Option<String>,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_tag: Option<usize>,
}

impl ReviewRecord {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            rating: None,
            date: None,
            content: content.into().trim().to_string(),
            filter_tag: None,
        }
    }

    pub fn with_rating(mut self, rating: Option<Rating>) -> Self {
        self.rating = rating;
        self
    }

    pub fn with_date(mut self, date: Option<String>) -> Self {
        self.date = date;
        self
    }

    pub fn with_filter_tag(mut self, filter_tag: Option<usize>) -> Self {
        self.filter_tag = filter_tag;
        self
    }

    /// Records without body text are never stored.
    pub fn is_usable(&self) -> bool {
        !self.content.is_empty()
    }
}
