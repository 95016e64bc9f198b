//! Next-occurrence calculation -- one step of a recurrence.
//!
//! All arithmetic happens on wall-clock (`NaiveDateTime`) values: the result
//! keeps the input's time-of-day and is always strictly later than the input.
//! [`next_occurrence_in`] applies the same step to a timezone-tagged value and
//! re-attaches the original zone.

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, NaiveDateTime, TimeZone};

use crate::error::{Result, ScheduleError};
use crate::pattern::{Frequency, RecurrencePattern};
use crate::weekdays::Weekdays;

/// Compute the occurrence that follows `current` under `pattern`.
///
/// - Daily: `current + interval` days.
/// - Weekly: the first flagged weekday strictly after `current`; with
///   `interval > 1` a single-day mask always strides `interval - 1` extra
///   weeks, while a multi-day mask only strides when the next flagged day
///   falls outside the Sunday-aligned week of `current`.
/// - Monthly: `interval` months ahead, pinned to `day_of_month` (clamped to
///   the last day of shorter months).
/// - Yearly: `interval` years ahead, pinned to `(month, day_of_month)` when
///   both are set (clamped the same way).
///
/// # Errors
/// Returns `ScheduleError::IntervalOutOfRange` if the interval is below 1,
/// `ScheduleError::UnsupportedFrequency` for non-repeating patterns, and
/// `ScheduleError::DateOverflow` when the result is not representable.
pub fn next_occurrence(
    current: NaiveDateTime,
    pattern: &RecurrencePattern,
) -> Result<NaiveDateTime> {
    let interval = pattern.interval();
    if interval < 1 {
        return Err(ScheduleError::IntervalOutOfRange(interval));
    }

    match pattern.frequency() {
        Frequency::Daily => current
            .checked_add_days(Days::new(u64::from(interval)))
            .ok_or(ScheduleError::DateOverflow),
        Frequency::Weekly => next_weekly(current, pattern),
        Frequency::Monthly => next_monthly(current, pattern),
        Frequency::Yearly => next_yearly(current, pattern),
        Frequency::None => Err(ScheduleError::UnsupportedFrequency(
            Frequency::None.as_str(),
        )),
    }
}

/// [`next_occurrence`] for a timezone-tagged instant.
///
/// The step is computed on the local wall-clock time, and the result carries
/// the same timezone as `current`. Ambiguous local times resolve to the
/// earliest mapping.
///
/// # Errors
/// Everything [`next_occurrence`] returns, plus
/// `ScheduleError::NonexistentLocalTime` when the stepped wall-clock time falls
/// into a gap of the zone.
pub fn next_occurrence_in<Tz: TimeZone>(
    current: &DateTime<Tz>,
    pattern: &RecurrencePattern,
) -> Result<DateTime<Tz>> {
    let next = next_occurrence(current.naive_local(), pattern)?;
    current
        .timezone()
        .from_local_datetime(&next)
        .earliest()
        .ok_or(ScheduleError::NonexistentLocalTime(next))
}

fn next_weekly(current: NaiveDateTime, pattern: &RecurrencePattern) -> Result<NaiveDateTime> {
    let days = pattern
        .day_of_week()
        .filter(|d| !d.is_empty())
        .ok_or_else(|| {
            ScheduleError::InvalidPattern("weekly recurrence has no days of the week".to_string())
        })?;

    let baseline = next_flagged_day(current, days)?;
    let interval = pattern.interval();
    if interval == 1 {
        return Ok(baseline);
    }

    let same_week = start_of_week(baseline.date()) == start_of_week(current.date());
    if days.len() > 1 && same_week {
        return Ok(baseline);
    }

    let stride = 7 * u64::from(interval - 1);
    baseline
        .checked_add_days(Days::new(stride))
        .ok_or(ScheduleError::DateOverflow)
}

/// Earliest flagged day in `current + 1 ..= current + 7` days, same time-of-day.
fn next_flagged_day(current: NaiveDateTime, days: Weekdays) -> Result<NaiveDateTime> {
    for offset in 1..=7 {
        let candidate = current
            .checked_add_days(Days::new(offset))
            .ok_or(ScheduleError::DateOverflow)?;
        if days.contains(candidate.weekday()) {
            return Ok(candidate);
        }
    }
    // A non-empty mask always matches within seven days.
    Err(ScheduleError::InvalidPattern(
        "weekly recurrence has no days of the week".to_string(),
    ))
}

/// Sunday that opens the week containing `date`.
fn start_of_week(date: NaiveDate) -> Option<NaiveDate> {
    let offset = date.weekday().num_days_from_sunday();
    date.checked_sub_days(Days::new(u64::from(offset)))
}

fn next_monthly(current: NaiveDateTime, pattern: &RecurrencePattern) -> Result<NaiveDateTime> {
    let advanced = current
        .checked_add_months(Months::new(pattern.interval()))
        .ok_or(ScheduleError::DateOverflow)?;

    match pattern.day_of_month() {
        Some(day) => pin_day(advanced.year(), advanced.month(), day, current),
        None => Ok(advanced),
    }
}

fn next_yearly(current: NaiveDateTime, pattern: &RecurrencePattern) -> Result<NaiveDateTime> {
    match (pattern.month(), pattern.day_of_month()) {
        (Some(month), Some(day)) => {
            let year = i32::try_from(pattern.interval())
                .ok()
                .and_then(|interval| current.year().checked_add(interval))
                .ok_or(ScheduleError::DateOverflow)?;
            pin_day(year, month, day, current)
        }
        _ => {
            let months = pattern
                .interval()
                .checked_mul(12)
                .ok_or(ScheduleError::DateOverflow)?;
            current
                .checked_add_months(Months::new(months))
                .ok_or(ScheduleError::DateOverflow)
        }
    }
}

/// Build `year-month-day` at `time_of`'s time, clamping `day` to the month length.
fn pin_day(year: i32, month: u32, day: u32, time_of: NaiveDateTime) -> Result<NaiveDateTime> {
    let last = last_day_of_month(year, month).ok_or(ScheduleError::DateOverflow)?;
    NaiveDate::from_ymd_opt(year, month, day.min(last))
        .map(|date| date.and_time(time_of.time()))
        .ok_or(ScheduleError::DateOverflow)
}

/// Number of days in `month` of `year`.
pub(crate) fn last_day_of_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next_first = first.checked_add_months(Months::new(1))?;
    next_first.pred_opt().map(|d| d.day())
}

/// First occurrence of a series starting at `start`.
///
/// Weekly series step forward until they land on a flagged weekday; every
/// other frequency starts at `start` itself.
pub fn first_occurrence(start: NaiveDateTime, pattern: &RecurrencePattern) -> Result<NaiveDateTime> {
    let mut current = start;
    if let (Frequency::Weekly, Some(days)) = (pattern.frequency(), pattern.day_of_week()) {
        while !days.contains(current.weekday()) {
            current = next_occurrence(current, pattern)?;
        }
    }
    Ok(current)
}

/// The `n`-th occurrence (1-based) of a series starting at `start`.
///
/// Occurrence #1 is [`first_occurrence`]; each further one applies
/// [`next_occurrence`] once. A non-repeating pattern only has its start.
///
/// # Errors
/// Returns `ScheduleError::InvalidOccurrenceCount` for `n == 0`, and
/// propagates stepping failures.
pub fn nth_occurrence(
    start: NaiveDateTime,
    pattern: &RecurrencePattern,
    n: u32,
) -> Result<NaiveDateTime> {
    if n == 0 {
        return Err(ScheduleError::InvalidOccurrenceCount);
    }
    if pattern.frequency() == Frequency::None {
        return Ok(start);
    }

    let mut current = first_occurrence(start, pattern)?;
    for _ in 1..n {
        current = next_occurrence(current, pattern)?;
    }
    Ok(current)
}
