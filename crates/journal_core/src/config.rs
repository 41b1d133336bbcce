use std::path::PathBuf;

use chrono::Weekday;
use tracing::{info, warn};

use crate::calendar::{DEFAULT_TRAILING_DAYS, MAX_TRAILING_DAYS};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JournalConfig {
    pub data_path: PathBuf,
    pub trailing_days: u32,
    pub first_weekday: Weekday,
}

impl JournalConfig {
    /// Reads `JOURNAL_DATA`, `JOURNAL_TRAILING_DAYS` and `JOURNAL_FIRST_WEEKDAY`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(path) = lookup("JOURNAL_DATA") {
            let path = path.trim();
            if !path.is_empty() {
                info!(path, "using journal data path from environment");
                config.data_path = PathBuf::from(path);
            }
        }
        if let Some(days) = lookup("JOURNAL_TRAILING_DAYS") {
            match days.trim().parse::<u32>() {
                Ok(value) if value > MAX_TRAILING_DAYS => {
                    warn!(value, max = MAX_TRAILING_DAYS, "capping JOURNAL_TRAILING_DAYS");
                    config.trailing_days = MAX_TRAILING_DAYS;
                }
                Ok(value) if value > 0 => config.trailing_days = value,
                _ => warn!(value = %days, "ignoring JOURNAL_TRAILING_DAYS"),
            }
        }
        if let Some(day) = lookup("JOURNAL_FIRST_WEEKDAY") {
            match day.trim().parse::<Weekday>() {
                Ok(weekday) => config.first_weekday = weekday,
                Err(_) => warn!(value = %day, "ignoring JOURNAL_FIRST_WEEKDAY"),
            }
        }
        config
    }
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("voice_journal.json"),
            trailing_days: DEFAULT_TRAILING_DAYS,
            first_weekday: Weekday::Sun,
        }
    }
}
