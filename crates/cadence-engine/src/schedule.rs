//! The schedule aggregate -- a recurring series and the exceptions it owns.
//!
//! Every change to a [`Schedule`] goes through one of its named methods, each
//! of which validates first and mutates only on success. Persistence and
//! per-id serialization of writers belong to the caller; [`ScheduleRecord`]
//! is the snapshot exchanged with a store.

use chrono::{NaiveDateTime, NaiveTime, TimeDelta};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::calculator::nth_occurrence;
use crate::error::{Result, ScheduleError};
use crate::exception::{ExceptionKind, ScheduleException};
use crate::pattern::{Frequency, PatternFields, RecurrencePattern};
use crate::weekdays::Weekdays;

/// An ordered `(start, end)` pair; `end` may equal `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSpan {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl ScheduleSpan {
    /// # Errors
    /// Returns `ScheduleError::InvalidSpan` when `end < start`.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self> {
        if end < start {
            return Err(ScheduleError::InvalidSpan);
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    pub fn duration(&self) -> TimeDelta {
        self.end - self.start
    }
}

/// A combined series edit, applied all-or-nothing by [`Schedule::edit_series`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesEdit {
    pub span: ScheduleSpan,
    pub is_all_day: bool,
    pub time_zone: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub pattern: PatternFields,
    pub recurrence_end_date: Option<NaiveDateTime>,
}

/// A recurring series of occurrences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ScheduleRecord", into = "ScheduleRecord")]
pub struct Schedule {
    id: Uuid,
    calendar_id: Uuid,
    title: String,
    description: Option<String>,
    start_date: NaiveDateTime,
    end_date: NaiveDateTime,
    is_all_day: bool,
    time_zone: Option<String>,
    recurrence_pattern: RecurrencePattern,
    recurrence_end_date: Option<NaiveDateTime>,
    exceptions: Vec<ScheduleException>,
}

impl Schedule {
    /// Create a new series.
    ///
    /// The pattern is installed through [`Schedule::set_recurrence_pattern`],
    /// so an occurrence count on `pattern` resolves the recurrence end date.
    ///
    /// # Errors
    /// Returns `ScheduleError::EmptyTitle` for a blank title, or the first
    /// failure reported while installing the pattern.
    #[allow(clippy::too_many_arguments)]
    pub fn create(
        calendar_id: Uuid,
        title: impl Into<String>,
        description: Option<String>,
        span: ScheduleSpan,
        is_all_day: bool,
        time_zone: Option<String>,
        pattern: RecurrencePattern,
        recurrence_end_date: Option<NaiveDateTime>,
    ) -> Result<Self> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(ScheduleError::EmptyTitle);
        }

        let mut schedule = Self {
            id: Uuid::new_v4(),
            calendar_id,
            title,
            description,
            start_date: span.start(),
            end_date: span.end(),
            is_all_day,
            time_zone,
            recurrence_pattern: RecurrencePattern::once(),
            recurrence_end_date: None,
            exceptions: Vec::new(),
        };

        schedule.install_pattern(pattern, recurrence_end_date)?;
        debug!(
            schedule_id = %schedule.id,
            calendar_id = %schedule.calendar_id,
            frequency = %schedule.recurrence_pattern.frequency(),
            start = %schedule.start_date,
            "schedule created"
        );
        Ok(schedule)
    }

    /// Replace the recurrence pattern and recompute the recurrence end date.
    ///
    /// With `occurrence_count = N` the end date becomes the N-th occurrence
    /// counted from the series' aligned start; otherwise it is
    /// `recurrence_end_date` (or unbounded when `None`). Nothing changes on
    /// failure.
    ///
    /// # Errors
    /// - `ScheduleError::CountAndEndDate` when both a count and an end date are given
    /// - `ScheduleError::InvalidOccurrenceCount` for a zero count
    /// - `ScheduleError::EndBeforeStart` when the end date precedes the series start
    /// - any [`RecurrencePattern::create`] failure, unchanged
    #[allow(clippy::too_many_arguments)]
    pub fn set_recurrence_pattern(
        &mut self,
        frequency: Frequency,
        interval: u32,
        day_of_week: Option<Weekdays>,
        day_of_month: Option<u32>,
        month: Option<u32>,
        occurrence_count: Option<u32>,
        recurrence_end_date: Option<NaiveDateTime>,
    ) -> Result<()> {
        if occurrence_count.is_some() && recurrence_end_date.is_some() {
            return Err(ScheduleError::CountAndEndDate);
        }
        if occurrence_count == Some(0) {
            return Err(ScheduleError::InvalidOccurrenceCount);
        }
        if let Some(end) = recurrence_end_date {
            if end < self.start_date {
                return Err(ScheduleError::EndBeforeStart(end));
            }
        }

        let pattern = RecurrencePattern::create(
            frequency,
            interval,
            day_of_week,
            day_of_month,
            month,
            occurrence_count,
        )?;

        let end = match occurrence_count {
            Some(n) => Some(nth_occurrence(self.start_date, &pattern, n)?),
            None => recurrence_end_date,
        };

        self.recurrence_pattern = pattern;
        self.recurrence_end_date = end;

        debug!(
            schedule_id = %self.id,
            frequency = %frequency,
            interval,
            occurrence_count = ?occurrence_count,
            recurrence_end = ?end,
            "recurrence pattern replaced"
        );
        Ok(())
    }

    fn install_pattern(
        &mut self,
        pattern: RecurrencePattern,
        recurrence_end_date: Option<NaiveDateTime>,
    ) -> Result<()> {
        self.set_recurrence_pattern(
            pattern.frequency(),
            pattern.interval(),
            pattern.day_of_week(),
            pattern.day_of_month(),
            pattern.month(),
            pattern.occurrence_count(),
            recurrence_end_date,
        )
    }

    /// Move the series to a new start/end and reset its all-day flag and
    /// timezone. The recurrence pattern is left alone.
    ///
    /// All-day series are normalized to midnight on both ends.
    ///
    /// # Errors
    /// Returns `ScheduleError::InvalidSpan` unless `start < end`.
    pub fn update_series(
        &mut self,
        span: ScheduleSpan,
        is_all_day: bool,
        time_zone: Option<String>,
    ) -> Result<()> {
        if span.start() >= span.end() {
            return Err(ScheduleError::InvalidSpan);
        }

        let (start, end) = if is_all_day {
            (date_only(span.start()), date_only(span.end()))
        } else {
            (span.start(), span.end())
        };

        self.start_date = start;
        self.end_date = end;
        self.is_all_day = is_all_day;
        self.time_zone = time_zone;

        debug!(schedule_id = %self.id, %start, %end, is_all_day, "series updated");
        Ok(())
    }

    /// Record that the occurrence at `occurrence_date` does not happen.
    pub fn skip(&mut self, occurrence_date: NaiveDateTime) -> Result<()> {
        self.append_exception(occurrence_date, ExceptionKind::Skipped)
    }

    /// Record that the occurrence at `occurrence_date` moved to `event_id`.
    pub fn reschedule(&mut self, occurrence_date: NaiveDateTime, event_id: Uuid) -> Result<()> {
        self.append_exception(occurrence_date, ExceptionKind::Rescheduled { event_id })
    }

    /// Record that the occurrence at `occurrence_date` was materialized as
    /// `event_id`.
    pub fn set_series_event(&mut self, occurrence_date: NaiveDateTime, event_id: Uuid) -> Result<()> {
        self.append_exception(occurrence_date, ExceptionKind::Materialized { event_id })
    }

    fn append_exception(&mut self, occurrence_date: NaiveDateTime, kind: ExceptionKind) -> Result<()> {
        if occurrence_date < self.start_date {
            return Err(ScheduleError::OccurrenceBeforeStart(occurrence_date));
        }
        if self
            .exceptions
            .iter()
            .any(|e| e.original_date() == occurrence_date)
        {
            return Err(ScheduleError::DuplicateException(occurrence_date));
        }

        self.exceptions
            .push(ScheduleException::new(self.id, occurrence_date, kind));

        debug!(
            schedule_id = %self.id,
            occurrence = %occurrence_date,
            kind = kind.code(),
            event_id = ?kind.event_id(),
            "exception appended"
        );
        Ok(())
    }

    /// # Errors
    /// Returns `ScheduleError::EmptyTitle` for a blank title.
    pub fn update_details(
        &mut self,
        title: impl Into<String>,
        description: Option<String>,
    ) -> Result<()> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(ScheduleError::EmptyTitle);
        }
        self.title = title;
        self.description = description;
        debug!(schedule_id = %self.id, "details updated");
        Ok(())
    }

    /// Apply series, details and pattern changes together. Either all three
    /// succeed or the schedule is left untouched.
    pub fn edit_series(&mut self, edit: SeriesEdit) -> Result<()> {
        let mut draft = self.clone();
        draft.update_series(edit.span, edit.is_all_day, edit.time_zone)?;
        draft.update_details(edit.title, edit.description)?;

        let p = edit.pattern;
        // A non-repeating edit carries no meaningful interval.
        let interval = if p.frequency == Frequency::None { 1 } else { p.interval };
        draft.set_recurrence_pattern(
            p.frequency,
            interval,
            p.day_of_week,
            p.day_of_month,
            p.month,
            p.occurrence_count,
            edit.recurrence_end_date,
        )?;

        *self = draft;
        Ok(())
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn calendar_id(&self) -> Uuid {
        self.calendar_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn start_date(&self) -> NaiveDateTime {
        self.start_date
    }

    pub fn end_date(&self) -> NaiveDateTime {
        self.end_date
    }

    /// Length of every occurrence.
    pub fn duration(&self) -> TimeDelta {
        self.end_date - self.start_date
    }

    pub fn is_all_day(&self) -> bool {
        self.is_all_day
    }

    /// The stored timezone name, echoed verbatim.
    pub fn time_zone(&self) -> Option<&str> {
        self.time_zone.as_deref()
    }

    pub fn recurrence_pattern(&self) -> &RecurrencePattern {
        &self.recurrence_pattern
    }

    /// Last date the series may generate an occurrence on; `None` is unbounded.
    pub fn recurrence_end_date(&self) -> Option<NaiveDateTime> {
        self.recurrence_end_date
    }

    /// Exceptions in insertion order.
    pub fn exceptions(&self) -> &[ScheduleException] {
        &self.exceptions
    }

    pub fn to_record(&self) -> ScheduleRecord {
        ScheduleRecord::from(self.clone())
    }
}

fn date_only(at: NaiveDateTime) -> NaiveDateTime {
    at.date().and_time(NaiveTime::MIN)
}

/// Storage snapshot of a [`Schedule`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRecord {
    pub id: Uuid,
    pub calendar_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub start_date: NaiveDateTime,
    pub end_date: NaiveDateTime,
    #[serde(default)]
    pub is_all_day: bool,
    #[serde(default)]
    pub time_zone: Option<String>,
    pub recurrence_pattern: RecurrencePattern,
    #[serde(default)]
    pub recurrence_end_date: Option<NaiveDateTime>,
    #[serde(default)]
    pub exceptions: Vec<ScheduleException>,
}

impl TryFrom<ScheduleRecord> for Schedule {
    type Error = ScheduleError;

    /// Rebuild an aggregate from storage. Stored exceptions are kept exactly
    /// as loaded.
    fn try_from(r: ScheduleRecord) -> Result<Self> {
        if r.title.trim().is_empty() {
            return Err(ScheduleError::EmptyTitle);
        }
        let span = ScheduleSpan::new(r.start_date, r.end_date)?;
        if let Some(end) = r.recurrence_end_date {
            if end < span.start() {
                return Err(ScheduleError::EndBeforeStart(end));
            }
        }

        Ok(Schedule {
            id: r.id,
            calendar_id: r.calendar_id,
            title: r.title,
            description: r.description,
            start_date: span.start(),
            end_date: span.end(),
            is_all_day: r.is_all_day,
            time_zone: r.time_zone,
            recurrence_pattern: r.recurrence_pattern,
            recurrence_end_date: r.recurrence_end_date,
            exceptions: r.exceptions,
        })
    }
}

impl From<Schedule> for ScheduleRecord {
    fn from(s: Schedule) -> Self {
        ScheduleRecord {
            id: s.id,
            calendar_id: s.calendar_id,
            title: s.title,
            description: s.description,
            start_date: s.start_date,
            end_date: s.end_date,
            is_all_day: s.is_all_day,
            time_zone: s.time_zone,
            recurrence_pattern: s.recurrence_pattern,
            recurrence_end_date: s.recurrence_end_date,
            exceptions: s.exceptions,
        }
    }
}
