//! Calendar search read model -- merge resolved schedules with concrete events.
//!
//! Concrete events come from an external store and are taken as-is when they
//! overlap the window. Schedules contribute their Pseudo instances, rendered
//! with the schedule's own title, description and duration. Persisted
//! instances are left out: their replacement events are already part of the
//! concrete list.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, ScheduleError};
use crate::resolver::Resolve;
use crate::schedule::Schedule;

/// A stored, standalone calendar event (possibly linked to a schedule).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConcreteEvent {
    pub id: Uuid,
    pub calendar_id: Uuid,
    #[serde(default)]
    pub schedule_id: Option<Uuid>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    #[serde(default)]
    pub is_all_day: bool,
    #[serde(default)]
    pub time_zone: Option<String>,
}

/// Where a [`CalendarEntry`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntrySource {
    CalendarEvent,
    Schedule,
}

/// One row of a calendar search.
///
/// `id` is the event id for concrete events and the schedule id for
/// occurrences rendered from a schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEntry {
    pub id: Uuid,
    pub calendar_id: Uuid,
    pub source: EntrySource,
    pub title: String,
    pub description: Option<String>,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub is_all_day: bool,
    pub time_zone: Option<String>,
}

impl From<&ConcreteEvent> for CalendarEntry {
    fn from(e: &ConcreteEvent) -> Self {
        CalendarEntry {
            id: e.id,
            calendar_id: e.calendar_id,
            source: EntrySource::CalendarEvent,
            title: e.title.clone(),
            description: e.description.clone(),
            start: e.start,
            end: e.end,
            is_all_day: e.is_all_day,
            time_zone: e.time_zone.clone(),
        }
    }
}

/// Render the schedule's occurrence at `occurs_at` as a search entry.
///
/// # Errors
/// Returns `ScheduleError::DateOverflow` when the occurrence would end past
/// the representable calendar range.
pub fn render_occurrence(schedule: &Schedule, occurs_at: NaiveDateTime) -> Result<CalendarEntry> {
    let end = occurs_at
        .checked_add_signed(schedule.duration())
        .ok_or(ScheduleError::DateOverflow)?;
    Ok(CalendarEntry {
        id: schedule.id(),
        calendar_id: schedule.calendar_id(),
        source: EntrySource::Schedule,
        title: schedule.title().to_string(),
        description: schedule.description().map(str::to_string),
        start: occurs_at,
        end,
        is_all_day: schedule.is_all_day(),
        time_zone: schedule.time_zone().map(str::to_string),
    })
}

/// Everything on the calendar between `from` and `to`, ordered by start.
///
/// An entry is included when it overlaps the window (`start <= to` and
/// `end >= from`). Entries with equal starts keep concrete events first.
///
/// # Errors
/// Returns `ScheduleError::InvalidWindow` unless `from < to`, and propagates
/// resolver and rendering failures.
pub fn search_entries<R: Resolve + ?Sized>(
    resolver: &R,
    schedules: &[Schedule],
    events: &[ConcreteEvent],
    from: NaiveDateTime,
    to: NaiveDateTime,
) -> Result<Vec<CalendarEntry>> {
    if from >= to {
        return Err(ScheduleError::InvalidWindow { from, to });
    }

    let overlaps = |start: NaiveDateTime, end: NaiveDateTime| start <= to && end >= from;

    let mut entries: Vec<CalendarEntry> = events
        .iter()
        .filter(|e| overlaps(e.start, e.end))
        .map(CalendarEntry::from)
        .collect();

    for schedule in schedules {
        for instance in resolver.resolve(schedule, from, to)? {
            if !instance.is_pseudo() {
                continue;
            }
            let entry = render_occurrence(schedule, instance.occurs_at)?;
            if overlaps(entry.start, entry.end) {
                entries.push(entry);
            }
        }
    }

    entries.sort_by_key(|e| e.start);
    Ok(entries)
}
