//! Recurrence patterns -- the validated rule a schedule repeats by.
//!
//! A [`RecurrencePattern`] can only be obtained through
//! [`RecurrencePattern::create`] (or deserialization, which routes through the
//! same checks), so every value in circulation satisfies the frequency-specific
//! anchor requirements.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScheduleError};
use crate::weekdays::Weekdays;

/// How often a schedule repeats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    /// Does not repeat; the series is its start occurrence only.
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    /// Stored integer code (None=0 .. Yearly=4).
    pub fn code(self) -> u8 {
        match self {
            Frequency::None => 0,
            Frequency::Daily => 1,
            Frequency::Weekly => 2,
            Frequency::Monthly => 3,
            Frequency::Yearly => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Frequency::None => "none",
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Yearly => "yearly",
        }
    }
}

impl TryFrom<u8> for Frequency {
    type Error = ScheduleError;

    fn try_from(code: u8) -> Result<Self> {
        match code {
            0 => Ok(Frequency::None),
            1 => Ok(Frequency::Daily),
            2 => Ok(Frequency::Weekly),
            3 => Ok(Frequency::Monthly),
            4 => Ok(Frequency::Yearly),
            other => Err(ScheduleError::InvalidPattern(format!(
                "unknown frequency code {other}"
            ))),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw pattern fields as they arrive from storage or a request, before
/// validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternFields {
    pub frequency: Frequency,
    #[serde(default = "default_interval")]
    pub interval: u32,
    #[serde(default)]
    pub day_of_week: Option<Weekdays>,
    #[serde(default)]
    pub day_of_month: Option<u32>,
    #[serde(default)]
    pub month: Option<u32>,
    #[serde(default)]
    pub occurrence_count: Option<u32>,
}

fn default_interval() -> u32 {
    1
}

/// An immutable, validated recurrence rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PatternFields", into = "PatternFields")]
pub struct RecurrencePattern {
    frequency: Frequency,
    interval: u32,
    day_of_week: Option<Weekdays>,
    day_of_month: Option<u32>,
    month: Option<u32>,
    occurrence_count: Option<u32>,
}

impl RecurrencePattern {
    /// Validate the fields and build a pattern.
    ///
    /// # Errors
    /// Returns `ScheduleError::InvalidPattern` when:
    /// - `interval` is 0
    /// - `occurrence_count` is present and 0
    /// - Weekly without a non-empty `day_of_week`
    /// - Monthly without `day_of_month` in 1..=31
    /// - Yearly without `month` in 1..=12
    pub fn create(
        frequency: Frequency,
        interval: u32,
        day_of_week: Option<Weekdays>,
        day_of_month: Option<u32>,
        month: Option<u32>,
        occurrence_count: Option<u32>,
    ) -> Result<Self> {
        if interval == 0 {
            return Err(ScheduleError::InvalidPattern(
                "interval must be greater than 0".to_string(),
            ));
        }

        if occurrence_count == Some(0) {
            return Err(ScheduleError::InvalidPattern(
                "occurrence count must be greater than 0".to_string(),
            ));
        }

        match frequency {
            Frequency::None | Frequency::Daily => {}
            Frequency::Weekly => {
                if day_of_week.is_none_or(Weekdays::is_empty) {
                    return Err(ScheduleError::InvalidPattern(
                        "weekly recurrence requires at least one day of the week".to_string(),
                    ));
                }
            }
            Frequency::Monthly => {
                if !day_of_month.is_some_and(|d| (1..=31).contains(&d)) {
                    return Err(ScheduleError::InvalidPattern(
                        "monthly recurrence requires a day of month between 1 and 31".to_string(),
                    ));
                }
            }
            Frequency::Yearly => {
                if !month.is_some_and(|m| (1..=12).contains(&m)) {
                    return Err(ScheduleError::InvalidPattern(
                        "yearly recurrence requires a month between 1 and 12".to_string(),
                    ));
                }
                if day_of_month.is_some_and(|d| !(1..=31).contains(&d)) {
                    return Err(ScheduleError::InvalidPattern(
                        "day of month must be between 1 and 31".to_string(),
                    ));
                }
            }
        }

        Ok(Self {
            frequency,
            interval,
            day_of_week,
            day_of_month,
            month,
            occurrence_count,
        })
    }

    /// Every `interval` days.
    pub fn daily(interval: u32) -> Result<Self> {
        Self::create(Frequency::Daily, interval, None, None, None, None)
    }

    /// Every `interval` weeks on the flagged days.
    pub fn weekly(interval: u32, days: Weekdays) -> Result<Self> {
        Self::create(Frequency::Weekly, interval, Some(days), None, None, None)
    }

    /// Every `interval` months on `day_of_month`.
    pub fn monthly(interval: u32, day_of_month: u32) -> Result<Self> {
        Self::create(
            Frequency::Monthly,
            interval,
            None,
            Some(day_of_month),
            None,
            None,
        )
    }

    /// Every `interval` years in `month`, optionally pinned to `day_of_month`.
    pub fn yearly(interval: u32, month: u32, day_of_month: Option<u32>) -> Result<Self> {
        Self::create(
            Frequency::Yearly,
            interval,
            None,
            day_of_month,
            Some(month),
            None,
        )
    }

    /// A single, non-repeating occurrence.
    pub fn once() -> Self {
        Self {
            frequency: Frequency::None,
            interval: 1,
            day_of_week: None,
            day_of_month: None,
            month: None,
            occurrence_count: None,
        }
    }

    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    pub fn interval(&self) -> u32 {
        self.interval
    }

    pub fn day_of_week(&self) -> Option<Weekdays> {
        self.day_of_week
    }

    pub fn day_of_month(&self) -> Option<u32> {
        self.day_of_month
    }

    pub fn month(&self) -> Option<u32> {
        self.month
    }

    pub fn occurrence_count(&self) -> Option<u32> {
        self.occurrence_count
    }

    pub fn fields(&self) -> PatternFields {
        PatternFields::from(*self)
    }
}

impl TryFrom<PatternFields> for RecurrencePattern {
    type Error = ScheduleError;

    fn try_from(f: PatternFields) -> Result<Self> {
        RecurrencePattern::create(
            f.frequency,
            f.interval,
            f.day_of_week,
            f.day_of_month,
            f.month,
            f.occurrence_count,
        )
    }
}

impl From<RecurrencePattern> for PatternFields {
    fn from(p: RecurrencePattern) -> Self {
        PatternFields {
            frequency: p.frequency,
            interval: p.interval,
            day_of_week: p.day_of_week,
            day_of_month: p.day_of_month,
            month: p.month,
            occurrence_count: p.occurrence_count,
        }
    }
}
