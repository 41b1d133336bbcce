use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::entry::{EntryId, JournalEntry, MoodPalette};
use crate::error::{JournalError, Result};
use crate::streak::StreakState;

/// Everything a journal persists.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct JournalSnapshot {
    #[serde(default)]
    pub entries: Vec<JournalEntry>,
    #[serde(default)]
    pub streak: Option<StreakState>,
    #[serde(default)]
    pub moods: MoodPalette,
}

impl JournalSnapshot {
    pub fn entry(&self, id: EntryId) -> Option<&JournalEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// Applies every change or none of them.
    pub fn apply(&mut self, commit: Commit) -> Result<()> {
        if let Some(missing) = commit
            .deletions
            .iter()
            .find(|id| self.entry(**id).is_none())
        {
            return Err(JournalError::EntryNotFound(*missing));
        }

        for entry in commit.upserts {
            match self.entries.iter_mut().find(|existing| existing.id == entry.id) {
                Some(existing) => *existing = entry,
                None => self.entries.push(entry),
            }
        }
        self.entries.retain(|entry| !commit.deletions.contains(&entry.id));
        if let Some(streak) = commit.streak {
            self.streak = Some(streak);
        }
        if let Some(moods) = commit.moods {
            self.moods = moods;
        }
        Ok(())
    }
}

/// A unit of change: entry writes and the streak record they imply land together.
#[derive(Debug, Clone, Default)]
pub struct Commit {
    pub upserts: Vec<JournalEntry>,
    pub deletions: Vec<EntryId>,
    pub streak: Option<StreakState>,
    pub moods: Option<MoodPalette>,
}

impl Commit {
    pub fn upsert(mut self, entry: JournalEntry) -> Self {
        self.upserts.push(entry);
        self
    }

    pub fn delete(mut self, id: EntryId) -> Self {
        self.deletions.push(id);
        self
    }

    pub fn with_streak(mut self, streak: StreakState) -> Self {
        self.streak = Some(streak);
        self
    }

    pub fn with_moods(mut self, moods: MoodPalette) -> Self {
        self.moods = Some(moods);
        self
    }
}

/// Persistence boundary. Implementations must apply a [`Commit`] atomically.
pub trait JournalStore: Send + Sync {
    fn load(&self) -> Result<JournalSnapshot>;
    fn commit(&self, commit: Commit) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<JournalSnapshot>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: JournalSnapshot) -> Self {
        Self {
            state: RwLock::new(snapshot),
        }
    }
}

impl JournalStore for MemoryStore {
    fn load(&self) -> Result<JournalSnapshot> {
        Ok(self.state.read().clone())
    }

    fn commit(&self, commit: Commit) -> Result<()> {
        let mut state = self.state.write();
        let mut next = state.clone();
        next.apply(commit)?;
        *state = next;
        Ok(())
    }
}

/// Keeps the whole journal in one JSON file, replaced on every commit.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    state: RwLock<JournalSnapshot>,
}

impl FileStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let snapshot = if path.exists() {
            let raw = fs::read(&path).map_err(|source| JournalError::Io {
                path: path.clone(),
                source,
            })?;
            if raw.iter().all(u8::is_ascii_whitespace) {
                warn!(path = %path.display(), "journal file is empty, starting fresh");
                JournalSnapshot::default()
            } else {
                let snapshot: JournalSnapshot = serde_json::from_slice(&raw)?;
                info!(path = %path.display(), entries = snapshot.entries.len(), "journal loaded");
                snapshot
            }
        } else {
            info!(path = %path.display(), "starting a new journal");
            JournalSnapshot::default()
        };
        Ok(Self {
            path,
            state: RwLock::new(snapshot),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, snapshot: &JournalSnapshot) -> Result<()> {
        let io_err = |source: std::io::Error| JournalError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(io_err)?;
            }
        }
        let payload = serde_json::to_vec_pretty(snapshot)?;
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, payload).map_err(io_err)?;
        fs::rename(&staging, &self.path).map_err(io_err)?;
        debug!(path = %self.path.display(), "journal written");
        Ok(())
    }
}

impl JournalStore for FileStore {
    fn load(&self) -> Result<JournalSnapshot> {
        Ok(self.state.read().clone())
    }

    fn commit(&self, commit: Commit) -> Result<()> {
        let mut state = self.state.write();
        let mut next = state.clone();
        next.apply(commit)?;
        self.persist(&next)?;
        *state = next;
        Ok(())
    }
}
