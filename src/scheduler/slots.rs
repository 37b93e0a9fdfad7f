use chrono::{Datelike, NaiveDate, NaiveDateTime, Weekday};

use crate::availability::{WeeklyAvailability, next_monday};
use crate::config::SchedulerConfig;
use crate::entry::Entry;

/// Walks the days between a start instant and a deadline, handing out
/// one-hour slots for a single goal.
///
/// The walk is the hour-by-hour one: the first day is entered at the weekday
/// window start, every later day at the hour handed over by the day before
/// it (see [`WeeklyAvailability::rollover_hour`]), and the weekly count is
/// reset whenever a Monday is entered. Instead of stepping through every
/// hour, each visited day contributes its contiguous run of eligible hours,
/// and days that cannot contribute (Sundays, weeks whose quota is spent)
/// are skipped with date arithmetic.
pub struct SlotPlanner {
    availability: WeeklyAvailability,
    daily_cap: u32,
}

impl SlotPlanner {
    pub fn new(config: &SchedulerConfig) -> Self {
        Self {
            availability: config.availability(),
            daily_cap: config.daily_cap,
        }
    }

    pub fn plan(
        &self,
        label: &str,
        start: NaiveDateTime,
        deadline: NaiveDateTime,
        weekly_quota: u32,
    ) -> Vec<Entry> {
        let start_day = start.date();
        let mut slots = Vec::new();
        let mut week_count: u32 = 0;
        let mut sequence: u64 = 1;
        let mut day = start_day;

        loop {
            let entry_hour = self.availability.entry_hour(start_day, day);
            let Some(first_visit) = day.and_hms_opt(entry_hour, 0, 0) else {
                break;
            };
            if first_visit > deadline {
                break;
            }

            // Every date is visited once, so its slot count starts at zero.
            let mut day_count: u32 = 0;
            if let Some(window) = self.availability.window_for(day) {
                let first = window.start().max(entry_hour);
                for hour in first..window.end() {
                    if day_count >= self.daily_cap || week_count >= weekly_quota {
                        break;
                    }
                    let Some(slot) = day.and_hms_opt(hour, 0, 0) else {
                        break;
                    };
                    if slot > deadline {
                        return slots;
                    }
                    slots.push(Entry::sub_goal(slot, format!("{label}_{sequence}")));
                    day_count += 1;
                    week_count += 1;
                    sequence += 1;
                }
            }

            let next = if week_count >= weekly_quota {
                next_monday(day)
            } else {
                day.succ_opt()
            };
            let Some(next) = next else {
                break;
            };
            if next.weekday() == Weekday::Mon {
                week_count = 0;
            }
            day = next;
        }

        slots
    }
}

/// Expand one goal into sub-goal entries labelled `"{label}_{n}"`.
///
/// `start` supplies only the date of the first visited day; its time of day
/// is ignored. `deadline` is inclusive.
pub fn generate_slots(
    label: &str,
    start: NaiveDateTime,
    deadline: NaiveDateTime,
    weekly_quota: u32,
    config: &SchedulerConfig,
) -> Vec<Entry> {
    SlotPlanner::new(config).plan(label, start, deadline, weekly_quota)
}

/// Last instant of the horizon that starts on `start_day`, or `None` when the
/// horizon is disabled or runs past the end of the calendar.
pub(crate) fn horizon_end(start_day: NaiveDate, max_horizon_days: Option<i64>) -> Option<NaiveDateTime> {
    let days = u64::try_from(max_horizon_days?).ok()?;
    start_day
        .checked_add_days(chrono::Days::new(days))
        .and_then(|last_day| last_day.and_hms_opt(23, 59, 59))
}
