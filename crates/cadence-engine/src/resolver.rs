//! Occurrence resolution -- expand a schedule over a window and apply its
//! exceptions.
//!
//! The resolver walks the series from its start date with
//! [`next_occurrence`](crate::calculator::next_occurrence), so every instance
//! it emits is the start or a generated occurrence. Exceptions are matched on their
//! original date:
//!
//! - Skipped -- nothing is emitted.
//! - Rescheduled / Materialized -- a [`InstanceKind::Persisted`] instance at the
//!   original date, pointing at the replacement event.
//! - no exception -- a [`InstanceKind::Pseudo`] instance.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};
use uuid::Uuid;

use crate::calculator::next_occurrence;
use crate::config::ResolverConfig;
use crate::error::{Result, ScheduleError};
use crate::exception::ExceptionKind;
use crate::pattern::{Frequency, RecurrencePattern};
use crate::schedule::Schedule;

/// Whether an instance is computed from the schedule or backed by a stored event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InstanceKind {
    /// Rendered from the schedule's own title and duration.
    Pseudo,
    /// Overridden by an exception; the concrete event is `event_id`.
    Persisted { event_id: Uuid },
}

/// One resolved occurrence. Never stored; recomputed on every resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledEventInstance {
    pub occurs_at: NaiveDateTime,
    #[serde(flatten)]
    pub kind: InstanceKind,
}

impl ScheduledEventInstance {
    pub fn pseudo(occurs_at: NaiveDateTime) -> Self {
        Self {
            occurs_at,
            kind: InstanceKind::Pseudo,
        }
    }

    pub fn persisted(occurs_at: NaiveDateTime, event_id: Uuid) -> Self {
        Self {
            occurs_at,
            kind: InstanceKind::Persisted { event_id },
        }
    }

    pub fn is_pseudo(&self) -> bool {
        self.kind == InstanceKind::Pseudo
    }

    pub fn event_id(&self) -> Option<Uuid> {
        match self.kind {
            InstanceKind::Pseudo => None,
            InstanceKind::Persisted { event_id } => Some(event_id),
        }
    }
}

/// Expands a schedule into the instances that fall inside `[from, to]`.
pub trait Resolve {
    /// Instances in ascending `occurs_at` order, all within
    /// `[from, min(to, recurrence_end_date)]`.
    fn resolve(
        &self,
        schedule: &Schedule,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> Result<Vec<ScheduledEventInstance>>;
}

/// The standard [`Resolve`] implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScheduledEventResolver {
    config: ResolverConfig,
}

impl ScheduledEventResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ResolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }
}

impl Resolve for ScheduledEventResolver {
    fn resolve(
        &self,
        schedule: &Schedule,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> Result<Vec<ScheduledEventInstance>> {
        if to < from {
            return Err(ScheduleError::InvalidWindow { from, to });
        }

        let recurrence_end = schedule.recurrence_end_date();
        if recurrence_end.is_some_and(|end| from > end) {
            trace!(schedule_id = %schedule.id(), %from, "window starts after recurrence end");
            return Ok(Vec::new());
        }
        let effective_to = recurrence_end.map_or(to, |end| to.min(end));

        let pattern = schedule.recurrence_pattern();
        let mut budget = Budget::new(self.config.max_iterations);

        // Align: first generated occurrence at or after `from`.
        let mut current = Some(schedule.start_date());
        while let Some(at) = current {
            if at >= from {
                break;
            }
            budget.spend(schedule)?;
            current = step(at, pattern)?;
        }
        let aligned = current;

        // Later entries overwrite earlier ones for the same date.
        let exceptions: HashMap<NaiveDateTime, ExceptionKind> = schedule
            .exceptions()
            .iter()
            .map(|e| (e.original_date(), e.kind()))
            .collect();

        let mut instances = Vec::new();
        while let Some(at) = current {
            if at > effective_to {
                break;
            }

            match exceptions.get(&at) {
                Some(ExceptionKind::Skipped) => {}
                Some(ExceptionKind::Rescheduled { event_id })
                | Some(ExceptionKind::Materialized { event_id }) => {
                    instances.push(ScheduledEventInstance::persisted(at, *event_id));
                }
                None => instances.push(ScheduledEventInstance::pseudo(at)),
            }

            budget.spend(schedule)?;
            current = step(at, pattern)?;
        }

        trace!(
            schedule_id = %schedule.id(),
            %from,
            %effective_to,
            aligned = ?aligned,
            emitted = instances.len(),
            steps = budget.used,
            "schedule resolved"
        );
        Ok(instances)
    }
}

/// Resolve with the default (unbounded) resolver.
pub fn resolve(
    schedule: &Schedule,
    from: NaiveDateTime,
    to: NaiveDateTime,
) -> Result<Vec<ScheduledEventInstance>> {
    ScheduledEventResolver::new().resolve(schedule, from, to)
}

/// Confirm that `at` is a generated, not-yet-overridden occurrence of
/// `schedule` -- the check run before skipping or rescheduling it.
///
/// # Errors
/// - `ScheduleError::OccurrenceBeforeStart` when `at` precedes the series start
/// - `ScheduleError::OccurrenceAfterEnd` when `at` is past the recurrence end
/// - `ScheduleError::NotAnOccurrence` when no Pseudo instance exists at `at`
pub fn check_occurrence<R: Resolve + ?Sized>(
    resolver: &R,
    schedule: &Schedule,
    at: NaiveDateTime,
) -> Result<()> {
    if at < schedule.start_date() {
        return Err(ScheduleError::OccurrenceBeforeStart(at));
    }
    if schedule.recurrence_end_date().is_some_and(|end| at > end) {
        return Err(ScheduleError::OccurrenceAfterEnd(at));
    }

    let found = resolver
        .resolve(schedule, at, at)?
        .iter()
        .any(|i| i.occurs_at == at && i.is_pseudo());
    if !found {
        return Err(ScheduleError::NotAnOccurrence(at));
    }
    Ok(())
}

/// One step along the series; `None` once a non-repeating series is exhausted
/// or no later occurrence is representable.
fn step(at: NaiveDateTime, pattern: &RecurrencePattern) -> Result<Option<NaiveDateTime>> {
    if pattern.frequency() == Frequency::None {
        return Ok(None);
    }
    match next_occurrence(at, pattern) {
        Ok(next) => Ok(Some(next)),
        Err(ScheduleError::DateOverflow) => Ok(None),
        Err(e) => Err(e),
    }
}

struct Budget {
    limit: Option<usize>,
    used: usize,
}

impl Budget {
    fn new(limit: Option<usize>) -> Self {
        Self { limit, used: 0 }
    }

    fn spend(&mut self, schedule: &Schedule) -> Result<()> {
        self.used += 1;
        match self.limit {
            Some(limit) if self.used > limit => {
                warn!(schedule_id = %schedule.id(), limit, "resolve iteration limit reached");
                Err(ScheduleError::TooManyIterations(limit))
            }
            _ => Ok(()),
        }
    }
}
