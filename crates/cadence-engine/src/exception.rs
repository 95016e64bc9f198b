//! Per-date overrides of generated occurrences.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What happened to the occurrence at an exception's original date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExceptionKind {
    /// The occurrence does not happen.
    Skipped,
    /// The occurrence moved; the replacement lives in the event store.
    Rescheduled { event_id: Uuid },
    /// The occurrence was turned into its own concrete event.
    Materialized { event_id: Uuid },
}

impl ExceptionKind {
    /// The backing concrete event, for the kinds that have one.
    pub fn event_id(&self) -> Option<Uuid> {
        match self {
            ExceptionKind::Skipped => None,
            ExceptionKind::Rescheduled { event_id } | ExceptionKind::Materialized { event_id } => {
                Some(*event_id)
            }
        }
    }

    /// Stored integer code (Skipped=1, Rescheduled=2, Materialized=3).
    pub fn code(&self) -> u8 {
        match self {
            ExceptionKind::Skipped => 1,
            ExceptionKind::Rescheduled { .. } => 2,
            ExceptionKind::Materialized { .. } => 3,
        }
    }
}

/// An override recorded against one generated occurrence of a schedule.
///
/// Exceptions are created by the owning [`Schedule`](crate::Schedule) and are
/// never edited afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleException {
    schedule_id: Uuid,
    original_date: NaiveDateTime,
    #[serde(flatten)]
    kind: ExceptionKind,
}

impl ScheduleException {
    pub(crate) fn new(schedule_id: Uuid, original_date: NaiveDateTime, kind: ExceptionKind) -> Self {
        Self {
            schedule_id,
            original_date,
            kind,
        }
    }

    pub fn schedule_id(&self) -> Uuid {
        self.schedule_id
    }

    /// The generated occurrence date this exception overrides.
    pub fn original_date(&self) -> NaiveDateTime {
        self.original_date
    }

    pub fn kind(&self) -> ExceptionKind {
        self.kind
    }

    pub fn event_id(&self) -> Option<Uuid> {
        self.kind.event_id()
    }
}
