use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use journal_core::{
    calendar::MonthCell,
    clock::{Clock, ManualClock},
    config::JournalConfig,
    entry::{ColorTag, EntryDraft, EntryPatch, Mood},
    events::{EventSink, JournalEvent, RecordingSink, StreakActivity},
    rich_text::{RichText, TextStyle},
    store::MemoryStore,
    JournalService,
};
use tempfile::tempdir;

fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 10, day, hour, 0, 0).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn missed_day_resets_streak_and_survives_reopen() {
    let temp = tempdir().expect("tempdir");
    let config = JournalConfig {
        data_path: temp.path().join("journal.json"),
        ..JournalConfig::default()
    };
    let clock = Arc::new(ManualClock::new(at(1, 9)));
    let sink = Arc::new(RecordingSink::new());

    {
        let service = JournalService::builder(Utc)
            .with_config(config.clone())
            .with_clock(clock.clone())
            .add_sink(sink.clone())
            .build()
            .expect("build journal service");

        for now in [at(1, 9), at(1, 21), at(2, 8), at(4, 8)] {
            clock.set(now);
            service
                .create_entry(EntryDraft::from_transcript(format!("written at {now}")))
                .expect("create entry");
        }

        let streak = service.streak().expect("streak");
        assert_eq!(streak.number_of_entries, 4);
        assert_eq!(streak.current_streak, 1);
        assert_eq!(streak.longest_streak, 2);
    }

    let first_today: Vec<bool> = sink
        .drain()
        .into_iter()
        .filter_map(|event| match event {
            JournalEvent::EntrySaved { first_today, .. } => Some(first_today),
            _ => None,
        })
        .collect();
    assert_eq!(first_today, vec![true, false, true, true]);

    let reopened = JournalService::builder(Utc)
        .with_config(config)
        .with_clock(clock)
        .build()
        .expect("reopen journal service");
    let streak = reopened.streak().expect("streak");
    assert_eq!(streak.longest_streak, 2);
    assert_eq!(streak.last_entry_date, Some(at(4, 8)));

    let timeline = reopened.timeline().expect("timeline");
    assert_eq!(timeline.len(), 91);
    assert_eq!(timeline[0].date, date(2025, 10, 4));
    let counts: Vec<usize> = timeline[..4].iter().map(|day| day.entries.len()).collect();
    assert_eq!(counts, vec![1, 0, 1, 2]);
    assert!(!reopened.has_entries(date(2025, 10, 3)).unwrap());
}

#[test]
fn editing_keeps_day_and_streak() {
    let clock = Arc::new(ManualClock::new(at(1, 9)));
    let service = JournalService::builder(Utc)
        .with_store(MemoryStore::new())
        .with_clock(clock.clone())
        .build()
        .expect("build journal service");

    let saved = service
        .create_entry(EntryDraft {
            title: String::new(),
            content: RichText::plain("Morning pages\nslept well"),
            mood: Mood::new("😎"),
            color: Some(ColorTag::VibrantOrange),
        })
        .expect("create entry");
    assert_eq!(saved.entry.title, "Morning pages");

    clock.advance(Duration::days(2));
    let mut content = saved.entry.content.clone();
    content.apply(0..7, TextStyle::Bold).expect("bold");
    let edited = service
        .update_entry(
            saved.entry.id,
            EntryPatch {
                content: Some(content),
                ..EntryPatch::default()
            },
        )
        .expect("update entry");

    assert_eq!(edited.created_at, at(1, 9));
    assert_eq!(edited.updated_at, Some(at(3, 9)));
    assert!(edited.content.is_active(0..7, TextStyle::Bold));
    assert_eq!(service.entries_for_date(date(2025, 10, 1)).unwrap().len(), 1);
    assert_eq!(service.streak().unwrap(), saved.streak);
}

#[test]
fn activity_follows_service_events() {
    let clock = Arc::new(ManualClock::new(at(1, 9)));
    let activity = Arc::new(StreakActivity::new());
    let service = JournalService::builder(Utc)
        .with_store(MemoryStore::new())
        .with_clock(clock.clone())
        .add_sink(activity.clone())
        .build()
        .expect("build journal service");

    service
        .create_entry(EntryDraft::from_transcript("one"))
        .expect("create");
    clock.advance(Duration::days(1));
    let second = service
        .create_entry(EntryDraft::from_transcript("two"))
        .expect("create");
    let shown = activity.displayed(clock.now()).expect("activity up");
    assert_eq!(shown.current, 2);
    assert_eq!(shown.entries, 2);

    service.delete_entry(second.entry.id).expect("delete");
    let shown = activity.displayed(at(2, 10)).expect("activity up");
    assert_eq!(shown.entries, 1);
    assert_eq!(shown.current, 2);

    activity.publish(&JournalEvent::EntryUpdated {
        entry_id: second.entry.id,
    });
    assert_eq!(activity.displayed(at(2, 10)), Some(shown));
}

#[test]
fn april_grid_lines_up_under_wednesday() {
    let service = JournalService::builder(Utc)
        .with_store(MemoryStore::new())
        .with_clock(ManualClock::new(Utc.with_ymd_and_hms(2026, 4, 15, 12, 0, 0).unwrap()))
        .build()
        .expect("build journal service");
    let grid = service.month_grid(service.current_month()).expect("grid");
    assert_eq!(grid.len(), 35);
    assert_eq!(
        grid.iter()
            .take_while(|cell| cell.cell == MonthCell::Blank)
            .count(),
        3
    );
}
