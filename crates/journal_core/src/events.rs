use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::entry::EntryId;
use crate::streak::StreakSummary;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JournalEvent {
    /// `first_today` is set when this entry is the first one of its calendar day.
    EntrySaved {
        entry_id: EntryId,
        streak: StreakSummary,
        first_today: bool,
    },
    EntryUpdated {
        entry_id: EntryId,
    },
    EntryDeleted {
        entry_id: EntryId,
        streak: StreakSummary,
    },
}

impl JournalEvent {
    pub fn streak(&self) -> Option<StreakSummary> {
        match self {
            JournalEvent::EntrySaved { streak, .. } | JournalEvent::EntryDeleted { streak, .. } => {
                Some(*streak)
            }
            JournalEvent::EntryUpdated { .. } => None,
        }
    }
}

/// Front ends implement this to react to journal changes.
pub trait EventSink: Send + Sync {
    fn publish(&self, event: &JournalEvent);
}

impl<S: EventSink + ?Sized> EventSink for std::sync::Arc<S> {
    fn publish(&self, event: &JournalEvent) {
        (**self).publish(event)
    }
}

/// Keeps every published event until drained.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<JournalEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&self) -> Vec<JournalEvent> {
        std::mem::take(&mut *self.events.lock())
    }
}

impl EventSink for RecordingSink {
    fn publish(&self, event: &JournalEvent) {
        self.events.lock().push(event.clone());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ActivityState {
    summary: StreakSummary,
    ends_at: Option<DateTime<Utc>>,
}

/// Streak figures for a glanceable surface that is started, updated and ended.
#[derive(Debug, Default)]
pub struct StreakActivity {
    state: Mutex<Option<ActivityState>>,
}

impl StreakActivity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&self, summary: StreakSummary) {
        *self.state.lock() = Some(ActivityState {
            summary,
            ends_at: None,
        });
    }

    /// Missing figures keep their last shown value. Does nothing unless started.
    pub fn update(&self, current: Option<u32>, longest: Option<u32>) {
        if let Some(state) = self.state.lock().as_mut() {
            if let Some(current) = current {
                state.summary.current = current;
            }
            if let Some(longest) = longest {
                state.summary.longest = longest;
            }
        }
    }

    pub fn end_at(&self, when: DateTime<Utc>) {
        if let Some(state) = self.state.lock().as_mut() {
            state.ends_at = Some(when);
        }
    }

    /// What the surface shows at `now`, if it is still up.
    pub fn displayed(&self, now: DateTime<Utc>) -> Option<StreakSummary> {
        let mut guard = self.state.lock();
        match *guard {
            Some(ActivityState {
                ends_at: Some(ends_at),
                ..
            }) if ends_at <= now => {
                *guard = None;
                None
            }
            Some(state) => Some(state.summary),
            None => None,
        }
    }
}

impl EventSink for StreakActivity {
    fn publish(&self, event: &JournalEvent) {
        let Some(summary) = event.streak() else {
            return;
        };
        let mut guard = self.state.lock();
        match guard.as_mut() {
            Some(state) => state.summary = summary,
            None => {
                *guard = Some(ActivityState {
                    summary,
                    ends_at: None,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use uuid::Uuid;

    fn summary(current: u32, longest: u32) -> StreakSummary {
        StreakSummary {
            current,
            longest,
            entries: 7,
        }
    }

    #[test]
    fn activity_tracks_saved_events_and_ends() {
        let activity = StreakActivity::new();
        let now = Utc.with_ymd_and_hms(2025, 10, 3, 9, 0, 0).unwrap();
        assert!(activity.displayed(now).is_none());

        activity.publish(&JournalEvent::EntrySaved {
            entry_id: Uuid::new_v4(),
            streak: summary(3, 5),
            first_today: true,
        });
        assert_eq!(activity.displayed(now), Some(summary(3, 5)));

        activity.update(Some(4), None);
        assert_eq!(activity.displayed(now), Some(summary(4, 5)));

        activity.end_at(now + Duration::seconds(10));
        assert!(activity.displayed(now + Duration::seconds(5)).is_some());
        assert!(activity.displayed(now + Duration::seconds(10)).is_none());
        assert!(activity.displayed(now).is_none());
    }

    #[test]
    fn updates_are_ignored_by_activity_and_recorded_by_sink() {
        let activity = StreakActivity::new();
        let sink = RecordingSink::new();
        let event = JournalEvent::EntryUpdated {
            entry_id: Uuid::new_v4(),
        };
        activity.publish(&event);
        sink.publish(&event);
        assert!(activity
            .displayed(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap())
            .is_none());
        assert_eq!(sink.drain(), vec![event]);
        assert!(sink.drain().is_empty());
    }
}
