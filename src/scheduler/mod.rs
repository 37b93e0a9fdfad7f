//! Goal expansion: turns every `Goal` entry into dated `Sub-Goal` slots.

use chrono::NaiveDateTime;
use rayon::prelude::*;
use serde::Serialize;

use crate::calendar::{Calendar, CalendarCollection};
use crate::config::SchedulerConfig;
use crate::goal_validation::{GoalError, goal_spec};

pub mod slots;

pub use slots::{SlotPlanner, generate_slots};

/// Identifies a goal entry inside a collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GoalRef {
    pub calendar: String,
    pub position: usize,
    pub description: String,
}

/// A goal that was left unexpanded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoalSkip {
    pub goal: GoalRef,
    pub error: GoalError,
}

#[derive(Debug, Clone)]
pub struct ExpansionReport {
    pub collection: CalendarCollection,
    pub goals_expanded: usize,
    pub generated: usize,
    pub skipped: Vec<GoalSkip>,
    pub clamped: Vec<GoalRef>,
}

impl ExpansionReport {
    pub fn to_cli_summary(&self) -> String {
        let mut parts = vec![
            format!("calendars={}", self.collection.len()),
            format!("goals={}", self.goals_expanded),
            format!("sub_goals={}", self.generated),
        ];
        if !self.skipped.is_empty() {
            parts.push(format!("skipped={}", self.skipped.len()));
        }
        if !self.clamped.is_empty() {
            parts.push(format!("clamped={}", self.clamped.len()));
        }
        parts.join(", ")
    }
}

struct CalendarExpansion {
    name: String,
    calendar: Calendar,
    goals_expanded: usize,
    generated: usize,
    skipped: Vec<GoalSkip>,
    clamped: Vec<GoalRef>,
}

/// Expand every goal of every calendar, starting at `now`.
///
/// The returned collection is a copy of `collection` where each calendar's
/// generated sub-goals follow its existing entries, in goal order then slot
/// order. Malformed goals are skipped and reported; they never abort the run.
pub fn expand(
    collection: &CalendarCollection,
    config: &SchedulerConfig,
    now: NaiveDateTime,
) -> ExpansionReport {
    let planner = SlotPlanner::new(config);
    let calendars: Vec<(&str, &Calendar)> = collection.iter().collect();

    let expansions: Vec<CalendarExpansion> = calendars
        .into_par_iter()
        .map(|(name, calendar)| expand_calendar(&planner, name, calendar, config, now))
        .collect();

    let mut report = ExpansionReport {
        collection: CalendarCollection::new(),
        goals_expanded: 0,
        generated: 0,
        skipped: Vec::new(),
        clamped: Vec::new(),
    };
    for expansion in expansions {
        report.goals_expanded += expansion.goals_expanded;
        report.generated += expansion.generated;
        report.skipped.extend(expansion.skipped);
        report.clamped.extend(expansion.clamped);
        report.collection.insert(expansion.name, expansion.calendar);
    }

    tracing::info!(
        calendars = report.collection.len(),
        goals = report.goals_expanded,
        sub_goals = report.generated,
        skipped = report.skipped.len(),
        "goal expansion finished"
    );
    report
}

fn expand_calendar(
    planner: &SlotPlanner,
    name: &str,
    calendar: &Calendar,
    config: &SchedulerConfig,
    now: NaiveDateTime,
) -> CalendarExpansion {
    let mut expanded = calendar.clone();
    let mut expansion = CalendarExpansion {
        name: name.to_string(),
        calendar: Calendar::new(),
        goals_expanded: 0,
        generated: 0,
        skipped: Vec::new(),
        clamped: Vec::new(),
    };
    let horizon = slots::horizon_end(now.date(), config.max_horizon_days);

    for (position, entry) in calendar.goals() {
        let goal = GoalRef {
            calendar: name.to_string(),
            position,
            description: entry.description.clone(),
        };
        let spec = match goal_spec(entry) {
            Ok(spec) => spec,
            Err(error) => {
                tracing::warn!(
                    calendar = name,
                    position,
                    goal = %entry.description,
                    error = %error,
                    "skipping malformed goal"
                );
                expansion.skipped.push(GoalSkip { goal, error });
                continue;
            }
        };

        let deadline = match horizon {
            Some(limit) if spec.deadline > limit => {
                tracing::warn!(
                    calendar = name,
                    goal = %spec.label,
                    deadline = %spec.deadline,
                    horizon = %limit,
                    "goal deadline beyond horizon, expanding up to the horizon only"
                );
                expansion.clamped.push(goal);
                limit
            }
            _ => spec.deadline,
        };

        let sub_goals = planner.plan(&spec.label, now, deadline, spec.weekly_quota);
        tracing::debug!(
            calendar = name,
            goal = %spec.label,
            quota = spec.weekly_quota,
            sub_goals = sub_goals.len(),
            "goal expanded"
        );
        expansion.goals_expanded += 1;
        expansion.generated += sub_goals.len();
        expanded.extend(sub_goals);
    }

    expansion.calendar = expanded;
    expansion
}
