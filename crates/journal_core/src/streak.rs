use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::calendar::day_of;

/// Running writing statistics. One record exists per journal.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StreakState {
    pub number_of_entries: u32,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_entry_date: Option<DateTime<Utc>>,
}

/// What a home-screen widget or live activity shows.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct StreakSummary {
    pub current: u32,
    pub longest: u32,
    pub entries: u32,
}

impl StreakState {
    pub fn summary(&self) -> StreakSummary {
        StreakSummary {
            current: self.current_streak,
            longest: self.longest_streak,
            entries: self.number_of_entries,
        }
    }

    /// Current streak as a fraction of the best one, in `0.0..=1.0`.
    pub fn progress(&self) -> f64 {
        let longest = self.longest_streak.max(1);
        (f64::from(self.current_streak) / f64::from(longest)).min(1.0)
    }
}

/// Advances a [`StreakState`] as entries are created, counting calendar days in `tz`.
#[derive(Debug, Clone)]
pub struct StreakTracker<Tz: TimeZone> {
    tz: Tz,
}

impl<Tz: TimeZone> StreakTracker<Tz> {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    pub fn on_entry_created(&self, state: &StreakState, now: DateTime<Utc>) -> StreakState {
        let mut next = *state;
        next.number_of_entries = next.number_of_entries.saturating_add(1);

        let today = day_of(&now, &self.tz);
        next.current_streak = match state.last_entry_date {
            None => 1,
            Some(last) => {
                let last_day = day_of(&last, &self.tz);
                if last_day == today {
                    state.current_streak
                } else if today.pred_opt() == Some(last_day) {
                    state.current_streak.saturating_add(1)
                } else {
                    // A gap, or a last entry dated after today because the clock moved back.
                    1
                }
            }
        };
        next.last_entry_date = Some(now);
        next.longest_streak = next.longest_streak.max(next.current_streak);
        next
    }

    /// Only the entry count moves; streaks are never recomputed backwards.
    pub fn on_entry_deleted(&self, state: &StreakState) -> StreakState {
        StreakState {
            number_of_entries: state.number_of_entries.saturating_sub(1),
            ..*state
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, FixedOffset};

    fn at(month: u32, day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, month, day, hour, 0, 0).unwrap()
    }

    fn tracker() -> StreakTracker<Utc> {
        StreakTracker::new(Utc)
    }

    fn replay(times: &[DateTime<Utc>]) -> StreakState {
        let tracker = tracker();
        times.iter().fold(StreakState::default(), |state, now| {
            tracker.on_entry_created(&state, *now)
        })
    }

    #[test]
    fn first_entry_starts_a_streak() {
        let state = tracker().on_entry_created(&StreakState::default(), at(10, 1, 9));
        assert_eq!(state.number_of_entries, 1);
        assert_eq!(state.current_streak, 1);
        assert_eq!(state.longest_streak, 1);
        assert_eq!(state.last_entry_date, Some(at(10, 1, 9)));
    }

    #[test]
    fn same_day_entries_do_not_advance() {
        let state = replay(&[at(10, 1, 6), at(10, 1, 12), at(10, 1, 23)]);
        assert_eq!(state.number_of_entries, 3);
        assert_eq!(state.current_streak, 1);
        assert_eq!(state.last_entry_date, Some(at(10, 1, 23)));
    }

    #[test]
    fn consecutive_days_count_up() {
        let tracker = tracker();
        let mut state = StreakState::default();
        for offset in 0..10 {
            state = tracker.on_entry_created(&state, at(10, 1, 20) + Duration::days(offset));
            assert_eq!(state.current_streak, offset as u32 + 1);
            assert_eq!(state.longest_streak, state.current_streak);
        }
    }

    #[test]
    fn gap_resets_to_one() {
        let state = replay(&[at(10, 1, 9), at(10, 2, 9), at(10, 3, 9), at(10, 6, 9)]);
        assert_eq!(state.current_streak, 1);
        assert_eq!(state.longest_streak, 3);
    }

    #[test]
    fn missed_day_scenario() {
        let state = replay(&[at(10, 1, 9), at(10, 1, 21), at(10, 2, 8), at(10, 4, 8)]);
        assert_eq!(state.number_of_entries, 4);
        assert_eq!(state.current_streak, 1);
        assert_eq!(state.longest_streak, 2);
    }

    #[test]
    fn clock_moving_backwards_resets() {
        let state = replay(&[at(10, 5, 9), at(10, 6, 9), at(10, 3, 9)]);
        assert_eq!(state.current_streak, 1);
        assert_eq!(state.longest_streak, 2);
    }

    #[test]
    fn day_boundary_uses_tracker_timezone() {
        // 22:00 UTC and 02:00 UTC next day are the same day at UTC-5.
        let west = StreakTracker::new(FixedOffset::west_opt(5 * 3600).unwrap());
        let first = west.on_entry_created(&StreakState::default(), at(10, 1, 22));
        let second = west.on_entry_created(&first, at(10, 2, 2));
        assert_eq!(second.current_streak, 1);

        let utc_second = tracker().on_entry_created(&first, at(10, 2, 2));
        assert_eq!(utc_second.current_streak, 2);
    }

    #[test]
    fn longest_never_drops_below_current() {
        // Deterministic pseudo-random gaps of 0..=3 days.
        let tracker = tracker();
        let mut state = StreakState::default();
        let mut now = at(1, 1, 12);
        let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
        for _ in 0..500 {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            now += Duration::hours((seed % 4) as i64 * 24 + (seed % 5) as i64);
            state = tracker.on_entry_created(&state, now);
            assert!(state.longest_streak >= state.current_streak);
            assert!(state.current_streak >= 1);
        }
        assert_eq!(state.number_of_entries, 500);
    }

    #[test]
    fn delete_only_decrements_count() {
        let tracker = tracker();
        let state = replay(&[at(10, 1, 9), at(10, 2, 9)]);
        let after = tracker.on_entry_deleted(&state);
        assert_eq!(after.number_of_entries, 1);
        assert_eq!(after.current_streak, 2);
        assert_eq!(after.longest_streak, 2);

        let floor = tracker.on_entry_deleted(&StreakState::default());
        assert_eq!(floor.number_of_entries, 0);
    }

    #[test]
    fn progress_is_clamped() {
        let state = StreakState {
            current_streak: 3,
            longest_streak: 6,
            ..StreakState::default()
        };
        assert!((state.progress() - 0.5).abs() < f64::EPSILON);
        assert_eq!(StreakState::default().progress(), 0.0);
        assert_eq!(state.summary().longest, 6);
    }
}
