pub mod calendar;
pub mod clock;
pub mod config;
pub mod entry;
pub mod error;
pub mod events;
pub mod rich_text;
pub mod service;
pub mod store;
pub mod streak;

pub use crate::error::{JournalError, Result};
pub use crate::service::{JournalService, JournalServiceBuilder, SaveOutcome};
