use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum SinkError {
    #[error("Failed to write review batch: {0}")]
    Io(String),

    #[error("Failed to encode review: {0}")]
    Encode(String),
}

impl From<std::io::Error> for SinkError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
