use std::fmt;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{calendar::day_of, rich_text::RichText};

pub type EntryId = Uuid;

pub const PREVIEW_CHARS: usize = 150;

/// An emoji describing how the author felt when writing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Mood(String);

impl Mood {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self(symbol.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Mood {
    fn default() -> Self {
        Self::new("😊")
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Moods offered to the author. Starts with a fixed set and grows with custom picks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MoodPalette {
    moods: Vec<Mood>,
}

impl MoodPalette {
    pub const DEFAULTS: [&'static str; 8] = ["😊", "🤩", "🥰", "😐", "😢", "😠", "🤔", "😎"];

    /// Returns `false` when the mood was already offered or is blank.
    pub fn add(&mut self, mood: Mood) -> bool {
        if mood.as_str().is_empty() || self.contains(&mood) {
            return false;
        }
        self.moods.push(mood);
        true
    }

    pub fn contains(&self, mood: &Mood) -> bool {
        self.moods.contains(mood)
    }

    pub fn moods(&self) -> &[Mood] {
        &self.moods
    }
}

impl Default for MoodPalette {
    fn default() -> Self {
        Self {
            moods: Self::DEFAULTS.iter().map(|symbol| Mood::new(*symbol)).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum ColorTag {
    VibrantPurple,
    VibrantOrange,
    VibrantGold,
    VibrantTeal,
}

impl ColorTag {
    pub const ALL: [ColorTag; 4] = [
        ColorTag::VibrantPurple,
        ColorTag::VibrantOrange,
        ColorTag::VibrantGold,
        ColorTag::VibrantTeal,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ColorTag::VibrantPurple => "vibrantPurple",
            ColorTag::VibrantOrange => "vibrantOrange",
            ColorTag::VibrantGold => "vibrantGold",
            ColorTag::VibrantTeal => "vibrantTeal",
        }
    }

    /// Unknown names fall back to purple.
    pub fn from_name(name: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|tag| tag.name().eq_ignore_ascii_case(name.trim()))
            .unwrap_or(ColorTag::VibrantPurple)
    }

    pub fn random() -> Self {
        Self::ALL
            .choose(&mut rand::rng())
            .copied()
            .unwrap_or(ColorTag::VibrantPurple)
    }
}

impl fmt::Display for ColorTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What the editor hands over when a new entry is saved.
#[derive(Debug, Clone, Default)]
pub struct EntryDraft {
    pub title: String,
    pub content: RichText,
    pub mood: Mood,
    pub color: Option<ColorTag>,
}

impl EntryDraft {
    /// Draft for a finished transcription with the default mood and no title.
    pub fn from_transcript(transcript: impl Into<String>) -> Self {
        Self {
            content: RichText::plain(transcript),
            ..Self::default()
        }
    }
}

/// Fields changed by an edit. `None` leaves the field as it is.
#[derive(Debug, Clone, Default)]
pub struct EntryPatch {
    pub title: Option<String>,
    pub content: Option<RichText>,
    pub mood: Option<Mood>,
    pub color: Option<ColorTag>,
}

impl EntryPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.mood.is_none() && self.color.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JournalEntry {
    pub id: EntryId,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    pub title: String,
    pub content: RichText,
    pub mood: Mood,
    pub color: ColorTag,
}

impl JournalEntry {
    pub fn from_draft(draft: EntryDraft, now: DateTime<Utc>) -> Self {
        let title = resolve_title(draft.title, &draft.content);
        Self {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: None,
            title,
            content: draft.content,
            mood: draft.mood,
            color: draft.color.unwrap_or_else(ColorTag::random),
        }
    }

    /// Edits keep `created_at`, so an entry never moves to another day.
    pub fn apply_patch(&mut self, patch: EntryPatch, now: DateTime<Utc>) {
        if let Some(content) = patch.content {
            self.content = content;
        }
        if let Some(title) = patch.title {
            self.title = resolve_title(title, &self.content);
        }
        if let Some(mood) = patch.mood {
            self.mood = mood;
        }
        if let Some(color) = patch.color {
            self.color = color;
        }
        self.updated_at = Some(now);
    }

    pub fn plain_text_preview(&self) -> String {
        self.content.preview(PREVIEW_CHARS)
    }

    pub fn day<Tz: TimeZone>(&self, tz: &Tz) -> NaiveDate {
        day_of(&self.created_at, tz)
    }
}

fn resolve_title(title: String, content: &RichText) -> String {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        content.smart_title()
    } else {
        trimmed.to_string()
    }
}
