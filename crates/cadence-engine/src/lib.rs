//! # cadence-engine
//!
//! Recurring-schedule resolution for calendar services.
//!
//! A [`Schedule`] holds a compact [`RecurrencePattern`] (frequency, interval,
//! anchor fields) and an append-only list of per-date exceptions. The engine
//! expands it into concrete occurrences over any window, applies skip /
//! reschedule / materialize overrides deterministically, and back-solves a
//! recurrence end date from an occurrence count.
//!
//! Everything here is synchronous and free of I/O. Loading and persisting
//! schedules, and serializing concurrent writers to one schedule, belong to
//! the embedding application.
//!
//! ## Modules
//!
//! - [`pattern`] -- validated recurrence rules and frequencies
//! - [`weekdays`] -- weekday bitmask for weekly rules
//! - [`calculator`] -- one recurrence step, occurrence-count back-solving
//! - [`schedule`] -- the schedule aggregate and its storage record
//! - [`exception`] -- skip / reschedule / materialize overrides
//! - [`resolver`] -- window expansion with exceptions applied
//! - [`search`] -- merge resolved schedules with concrete events
//! - [`config`] -- resolver configuration
//! - [`error`] -- Error types

pub mod calculator;
pub mod config;
pub mod error;
pub mod exception;
pub mod pattern;
pub mod resolver;
pub mod schedule;
pub mod search;
pub mod weekdays;

pub use calculator::{first_occurrence, next_occurrence, next_occurrence_in, nth_occurrence};
pub use config::ResolverConfig;
pub use error::{ErrorKind, ScheduleError};
pub use exception::{ExceptionKind, ScheduleException};
pub use pattern::{Frequency, PatternFields, RecurrencePattern};
pub use resolver::{
    check_occurrence, resolve, InstanceKind, Resolve, ScheduledEventInstance,
    ScheduledEventResolver,
};
pub use schedule::{Schedule, ScheduleRecord, ScheduleSpan, SeriesEdit};
pub use search::{search_entries, CalendarEntry, ConcreteEvent, EntrySource};
pub use weekdays::Weekdays;
