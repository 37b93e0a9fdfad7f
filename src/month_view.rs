use chrono::{Datelike, NaiveDate};
use std::collections::BTreeSet;

use crate::calendar::Calendar;
use crate::entry::{Entry, EntryType};

const CELL_WIDTH: usize = 5;
const DAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// One line of the month listing, e.g.
/// `[2] November 05, 2024 04:00 PM: Essay (Goal) - 3 hours/week`.
pub fn describe_entry(position: usize, entry: &Entry) -> String {
    let when = entry
        .timestamp()
        .map(|ts| ts.format("%B %d, %Y %I:%M %p").to_string())
        .unwrap_or_else(|_| entry.date.clone());
    let mut line = format!(
        "[{position}] {when}: {} ({})",
        entry.description, entry.entry_type
    );
    if entry.entry_type == EntryType::Goal {
        if let Some(hours) = entry.weekly_hours() {
            line.push_str(&format!(" - {hours} hours/week"));
        }
    }
    line
}

fn render_grid(first: NaiveDate, marked: &BTreeSet<NaiveDate>) -> String {
    let mut out = String::new();
    out.push_str(&format!("{} {}\n", first.format("%B"), first.year()));
    for name in DAY_NAMES {
        out.push_str(&format!("{name:<CELL_WIDTH$}"));
    }
    out.push('\n');

    let lead = first.weekday().num_days_from_sunday() as usize;
    let mut column = 0;
    for _ in 0..lead {
        out.push_str(&" ".repeat(CELL_WIDTH));
        column += 1;
    }

    let mut day = first;
    while day.month() == first.month() {
        let mark = if marked.contains(&day) { "*" } else { "" };
        out.push_str(&format!("{:>3}{:<2}", day.day(), mark));
        column += 1;
        if column == 7 {
            out.push('\n');
            column = 0;
        }
        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }
    if column != 0 {
        out.push('\n');
    }
    out
}

/// Sunday-first month grid, days with entries marked `*`, followed by the
/// entries of that month. `None` for an invalid year/month.
pub fn render_month(year: i32, month: u32, calendar: &Calendar) -> Option<String> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let marked = calendar.days_with_entries(year, month);
    let mut out = render_grid(first, &marked);

    out.push('\n');
    let entries = calendar.entries_in_month(year, month);
    if entries.is_empty() {
        out.push_str("No entries for this month.\n");
    } else {
        out.push_str("Entries for this Month:\n");
        for (position, entry) in entries {
            out.push_str(&describe_entry(position, entry));
            out.push('\n');
        }
    }
    Some(out)
}
