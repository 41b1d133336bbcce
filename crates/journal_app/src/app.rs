use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate, TimeZone, Weekday};
use clap::{Parser, Subcommand};
use journal_core::{
    calendar::{MonthCell, YearMonth},
    config::JournalConfig,
    entry::{ColorTag, EntryDraft, EntryId, EntryPatch, JournalEntry, Mood},
    rich_text::RichText,
    service::{CalendarCell, DayEntries},
    streak::StreakState,
    JournalService,
};
use tracing::{debug, info};

#[derive(Debug, Parser)]
#[command(name = "voice_journal", about = "Daily journal with streak tracking")]
pub struct Cli {
    /// Journal file; overrides JOURNAL_DATA.
    #[arg(long, global = true)]
    pub data: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Save a transcript as a new entry.
    Add {
        #[arg(long)]
        text: String,
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long)]
        mood: Option<String>,
        #[arg(long)]
        color: Option<String>,
    },
    Edit {
        id: EntryId,
        #[arg(long)]
        text: Option<String>,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        mood: Option<String>,
        #[arg(long)]
        color: Option<String>,
    },
    Delete {
        id: EntryId,
    },
    /// Entries for one day (default: today).
    List {
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
    Timeline {
        #[arg(long, default_value_t = 14)]
        limit: usize,
    },
    /// Calendar for YYYY-MM (default: this month).
    Month {
        #[arg(value_parser = parse_month)]
        month: Option<YearMonth>,
    },
    Streak,
    Moods {
        #[arg(long)]
        add: Option<String>,
    },
}

pub fn run(cli: Cli, out: &mut impl Write) -> Result<()> {
    let mut config = JournalConfig::from_env();
    if let Some(path) = cli.data {
        config.data_path = path;
    }
    info!(path = %config.data_path.display(), "opening journal");
    let service = JournalService::builder(Local)
        .with_config(config)
        .build()
        .context("unable to open journal")?;
    execute(&service, cli.command, out)
}

pub fn execute<Tz: TimeZone>(
    service: &JournalService<Tz>,
    command: Command,
    out: &mut impl Write,
) -> Result<()>
where
    Tz::Offset: std::fmt::Display,
{
    debug!(?command, "dispatching");
    match command {
        Command::Add {
            text,
            title,
            mood,
            color,
        } => {
            let outcome = service.create_entry(EntryDraft {
                title,
                content: RichText::plain(text),
                mood: mood.map(Mood::new).unwrap_or_default(),
                color: color.as_deref().map(ColorTag::from_name),
            })?;
            writeln!(out, "saved {} \"{}\"", outcome.entry.id, outcome.entry.title)?;
            if outcome.first_today {
                writeln!(
                    out,
                    "🔥 {} day streak! (best {})",
                    outcome.streak.current_streak, outcome.streak.longest_streak
                )?;
            }
        }
        Command::Edit {
            id,
            text,
            title,
            mood,
            color,
        } => {
            let entry = service
                .update_entry(
                    id,
                    EntryPatch {
                        title,
                        content: text.map(RichText::plain),
                        mood: mood.map(Mood::new),
                        color: color.as_deref().map(ColorTag::from_name),
                    },
                )
                .with_context(|| format!("unable to edit entry {id}"))?;
            writeln!(out, "updated {} \"{}\"", entry.id, entry.title)?;
        }
        Command::Delete { id } => {
            let streak = service
                .delete_entry(id)
                .with_context(|| format!("unable to delete entry {id}"))?;
            writeln!(out, "deleted {id}; {} entries left", streak.number_of_entries)?;
        }
        Command::List { date } => {
            let date = date.unwrap_or_else(|| service.today());
            let entries = service.entries_for_date(date)?;
            writeln!(out, "{}", format_day_heading(date, service.today()))?;
            if entries.is_empty() {
                writeln!(out, "  no entries")?;
            }
            for entry in &entries {
                write!(out, "{}", format_entry(entry, service.calendar().timezone()))?;
            }
        }
        Command::Timeline { limit } => {
            let timeline = service.timeline()?;
            write!(out, "{}", render_timeline(&timeline, service.today(), limit))?;
        }
        Command::Month { month } => {
            let month = month.unwrap_or_else(|| service.current_month());
            let grid = service.month_grid(month)?;
            let headers = service.calendar().weekday_headers();
            write!(out, "{}", render_month(month, &headers, &grid))?;
        }
        Command::Streak => {
            write!(out, "{}", render_streak(&service.streak()?))?;
        }
        Command::Moods { add } => {
            if let Some(symbol) = add {
                let mood = Mood::new(symbol);
                if !service.add_mood(mood.clone())? {
                    writeln!(out, "{mood} is already available")?;
                }
            }
            let moods = service.moods()?;
            let line: Vec<&str> = moods.moods().iter().map(Mood::as_str).collect();
            writeln!(out, "{}", line.join(" "))?;
        }
    }
    Ok(())
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .with_context(|| format!("`{raw}` is not a YYYY-MM-DD date"))
}

fn parse_month(raw: &str) -> Result<YearMonth> {
    let (year, month) = raw
        .trim()
        .split_once('-')
        .with_context(|| format!("`{raw}` is not a YYYY-MM month"))?;
    let year: i32 = year.parse().context("invalid year")?;
    let month: u32 = month.parse().context("invalid month")?;
    Ok(YearMonth::new(year, month)?)
}

fn format_day_heading(date: NaiveDate, today: NaiveDate) -> String {
    let label = date.format("%a %b %-d, %Y").to_string();
    match (today - date).num_days() {
        0 => format!("Today · {label}"),
        1 => format!("Yesterday · {label}"),
        _ => label,
    }
}

fn format_entry<Tz: TimeZone>(entry: &JournalEntry, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let time = entry.created_at.with_timezone(tz).format("%H:%M");
    let mut preview = entry.plain_text_preview().replace('\n', " ");
    if entry.content.text().chars().count() > preview.chars().count() {
        preview.push('…');
    }
    format!(
        "  {time} {} [{}] {}\n    {preview}\n    id {}\n",
        entry.mood, entry.color, entry.title, entry.id
    )
}

fn render_timeline(days: &[DayEntries], today: NaiveDate, limit: usize) -> String {
    let mut rendered = String::new();
    for day in days.iter().take(limit) {
        let marker = if day.entries.is_empty() { "○" } else { "●" };
        rendered.push_str(&format!("{marker} {}", format_day_heading(day.date, today)));
        if !day.entries.is_empty() {
            let titles: Vec<&str> = day.entries.iter().map(|entry| entry.title.as_str()).collect();
            rendered.push_str(&format!(": {}", titles.join(", ")));
        }
        rendered.push('\n');
    }
    rendered
}

fn render_month(month: YearMonth, headers: &[Weekday; 7], grid: &[CalendarCell]) -> String {
    let mut rendered = format!("{month}\n");
    let header: Vec<String> = headers
        .iter()
        .map(|day| day.to_string()[..2].to_string())
        .collect();
    rendered.push_str(&header.join("  "));
    rendered.push('\n');
    for week in grid.chunks(7) {
        let cells: Vec<String> = week
            .iter()
            .map(|cell| match cell.cell {
                MonthCell::Blank => "  ".to_string(),
                MonthCell::Day(date) => {
                    let day = date.format("%e").to_string();
                    if cell.entry_count > 0 {
                        format!("{day}*")
                    } else {
                        format!("{day} ")
                    }
                }
            })
            .collect();
        rendered.push_str(cells.join(" ").trim_end());
        rendered.push('\n');
    }
    rendered
}

fn render_streak(streak: &StreakState) -> String {
    let filled = (streak.progress() * 10.0).round() as usize;
    format!(
        "🔥 Day streak  {}\n⭐ Longest     {}\n📖 Entries     {}\n[{}{}]\n",
        streak.current_streak,
        streak.longest_streak,
        streak.number_of_entries,
        "#".repeat(filled),
        "-".repeat(10 - filled)
    )
}
