use std::path::PathBuf;

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum JournalError {
    #[error("journal entry {0} not found")]
    EntryNotFound(Uuid),
    #[error("style span {start}..{end} is not valid for text of length {len}")]
    InvalidSpan { start: usize, end: usize, len: usize },
    #[error("font size {0} is not one of the supported sizes")]
    InvalidFontSize(u16),
    #[error("invalid month {year}-{month:02}")]
    InvalidMonth { year: i32, month: u32 },
    #[error("store i/o failed for `{}`", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("store contents could not be (de)serialized")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, JournalError>;
