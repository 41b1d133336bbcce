use chrono::{NaiveDate, TimeZone};
use parking_lot::Mutex;
use tracing::{debug, info, instrument};

use crate::{
    calendar::{CalendarIndex, MonthCell, YearMonth},
    clock::{Clock, SystemClock},
    config::JournalConfig,
    entry::{EntryDraft, EntryId, EntryPatch, JournalEntry, Mood, MoodPalette},
    error::{JournalError, Result},
    events::{EventSink, JournalEvent},
    store::{Commit, FileStore, JournalSnapshot, JournalStore},
    streak::{StreakState, StreakTracker},
};

/// Result of saving a new entry.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveOutcome {
    pub entry: JournalEntry,
    pub streak: StreakState,
    /// True when the entry is the first one written on its day.
    pub first_today: bool,
}

/// A timeline row holding its entries, newest first.
#[derive(Debug, Clone, PartialEq)]
pub struct DayEntries {
    pub date: NaiveDate,
    pub entries: Vec<JournalEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarCell {
    pub cell: MonthCell,
    pub entry_count: usize,
}

pub struct JournalService<Tz: TimeZone> {
    store: Box<dyn JournalStore>,
    /// Held from load to commit by every mutation.
    writer: Mutex<()>,
    clock: Box<dyn Clock>,
    sinks: Vec<Box<dyn EventSink>>,
    tracker: StreakTracker<Tz>,
    calendar: CalendarIndex<Tz>,
}

pub struct JournalServiceBuilder<Tz: TimeZone> {
    tz: Tz,
    config: JournalConfig,
    store: Option<Box<dyn JournalStore>>,
    clock: Option<Box<dyn Clock>>,
    sinks: Vec<Box<dyn EventSink>>,
}

impl<Tz: TimeZone> JournalServiceBuilder<Tz> {
    pub fn new(tz: Tz) -> Self {
        Self {
            tz,
            config: JournalConfig::default(),
            store: None,
            clock: None,
            sinks: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: JournalConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_store(mut self, store: impl JournalStore + 'static) -> Self {
        self.store = Some(Box::new(store));
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Box::new(clock));
        self
    }

    pub fn add_sink(mut self, sink: impl EventSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    /// Opens a [`FileStore`] at the configured data path unless a store was supplied.
    pub fn build(self) -> Result<JournalService<Tz>> {
        let store = match self.store {
            Some(store) => store,
            None => Box::new(FileStore::open(&self.config.data_path)?),
        };
        let calendar = CalendarIndex::new(self.tz.clone())
            .with_first_weekday(self.config.first_weekday)
            .with_trailing_days(self.config.trailing_days);
        Ok(JournalService {
            store,
            writer: Mutex::new(()),
            clock: self.clock.unwrap_or_else(|| Box::new(SystemClock)),
            sinks: self.sinks,
            tracker: StreakTracker::new(self.tz),
            calendar,
        })
    }
}

impl<Tz: TimeZone> JournalService<Tz> {
    pub fn builder(tz: Tz) -> JournalServiceBuilder<Tz> {
        JournalServiceBuilder::new(tz)
    }

    pub fn calendar(&self) -> &CalendarIndex<Tz> {
        &self.calendar
    }

    pub fn today(&self) -> NaiveDate {
        self.calendar.day_of(&self.clock.now())
    }

    pub fn current_month(&self) -> YearMonth {
        YearMonth::containing(self.today())
    }

    /// Saves a new entry and the streak it produces in one commit. A mood missing from the
    /// palette is added by the same commit.
    #[instrument(skip(self, draft))]
    pub fn create_entry(&self, draft: EntryDraft) -> Result<SaveOutcome> {
        let _writer = self.writer.lock();
        let now = self.clock.now();
        let snapshot = self.store.load()?;
        let previous = snapshot.streak.unwrap_or_default();
        let streak = self.tracker.on_entry_created(&previous, now);
        let first_today = !self
            .calendar
            .has_entries(self.calendar.day_of(&now), &snapshot.entries);

        let mut commit = Commit::default();
        let mut moods = snapshot.moods;
        if moods.add(draft.mood.clone()) {
            debug!(mood = %draft.mood, "custom mood added with entry");
            commit = commit.with_moods(moods);
        }
        let entry = JournalEntry::from_draft(draft, now);
        self.store
            .commit(commit.upsert(entry.clone()).with_streak(streak))?;
        info!(
            id = %entry.id,
            current = streak.current_streak,
            longest = streak.longest_streak,
            "journal entry saved"
        );

        self.publish(JournalEvent::EntrySaved {
            entry_id: entry.id,
            streak: streak.summary(),
            first_today,
        });
        Ok(SaveOutcome {
            entry,
            streak,
            first_today,
        })
    }

    /// Edits leave the streak alone and keep the entry on its original day.
    #[instrument(skip(self, patch))]
    pub fn update_entry(&self, id: EntryId, patch: EntryPatch) -> Result<JournalEntry> {
        let _writer = self.writer.lock();
        let snapshot = self.store.load()?;
        let mut entry = snapshot
            .entry(id)
            .cloned()
            .ok_or(JournalError::EntryNotFound(id))?;
        if patch.is_empty() {
            debug!(%id, "empty edit ignored");
            return Ok(entry);
        }
        entry.apply_patch(patch, self.clock.now());
        self.store.commit(Commit::default().upsert(entry.clone()))?;
        info!(%id, "journal entry updated");
        self.publish(JournalEvent::EntryUpdated { entry_id: id });
        Ok(entry)
    }

    #[instrument(skip(self))]
    pub fn delete_entry(&self, id: EntryId) -> Result<StreakState> {
        let _writer = self.writer.lock();
        let snapshot = self.store.load()?;
        if snapshot.entry(id).is_none() {
            return Err(JournalError::EntryNotFound(id));
        }
        let streak = self
            .tracker
            .on_entry_deleted(&snapshot.streak.unwrap_or_default());
        self.store
            .commit(Commit::default().delete(id).with_streak(streak))?;
        info!(%id, entries = streak.number_of_entries, "journal entry deleted");
        self.publish(JournalEvent::EntryDeleted {
            entry_id: id,
            streak: streak.summary(),
        });
        Ok(streak)
    }

    /// All entries, newest first.
    pub fn entries(&self) -> Result<Vec<JournalEntry>> {
        let mut entries = self.store.load()?.entries;
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(entries)
    }

    pub fn entry(&self, id: EntryId) -> Result<JournalEntry> {
        self.store
            .load()?
            .entry(id)
            .cloned()
            .ok_or(JournalError::EntryNotFound(id))
    }

    pub fn streak(&self) -> Result<StreakState> {
        Ok(self.store.load()?.streak.unwrap_or_default())
    }

    pub fn has_entries(&self, date: NaiveDate) -> Result<bool> {
        let snapshot = self.store.load()?;
        Ok(self.calendar.has_entries(date, &snapshot.entries))
    }

    pub fn entries_for_date(&self, date: NaiveDate) -> Result<Vec<JournalEntry>> {
        let snapshot = self.store.load()?;
        Ok(self
            .calendar
            .entries_for_date(date, &snapshot.entries)
            .into_iter()
            .cloned()
            .collect())
    }

    pub fn timeline(&self) -> Result<Vec<DayEntries>> {
        let snapshot = self.store.load()?;
        let now = self.clock.now();
        Ok(self
            .calendar
            .timeline(&snapshot.entries, now)
            .into_iter()
            .map(|day| DayEntries {
                date: day.date,
                entries: day.entries.into_iter().cloned().collect(),
            })
            .collect())
    }

    /// Month grid with the number of entries written on each day.
    pub fn month_grid(&self, month: YearMonth) -> Result<Vec<CalendarCell>> {
        let JournalSnapshot { entries, .. } = self.store.load()?;
        Ok(self
            .calendar
            .days_in_month_grid(month)
            .into_iter()
            .map(|cell| CalendarCell {
                cell,
                entry_count: cell
                    .date()
                    .map(|date| self.calendar.entry_count(date, &entries))
                    .unwrap_or(0),
            })
            .collect())
    }

    pub fn moods(&self) -> Result<MoodPalette> {
        Ok(self.store.load()?.moods)
    }

    /// Returns `false` when the mood was already on offer.
    pub fn add_mood(&self, mood: Mood) -> Result<bool> {
        let _writer = self.writer.lock();
        let mut moods = self.store.load()?.moods;
        if !moods.add(mood) {
            return Ok(false);
        }
        self.store.commit(Commit::default().with_moods(moods))?;
        Ok(true)
    }

    fn publish(&self, event: JournalEvent) {
        for sink in &self.sinks {
            sink.publish(&event);
        }
    }
}
