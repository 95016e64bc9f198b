//! Weekday bitmask used by weekly recurrence patterns.
//!
//! Bit layout follows the stored representation: Sunday is bit 0 (value 1)
//! through Saturday at bit 6 (value 64).

use std::fmt;
use std::ops::BitOr;

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScheduleError};
use crate::pattern::Frequency;

/// A set of weekdays, stored as a 7-bit mask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Weekdays(u8);

impl Weekdays {
    pub const NONE: Weekdays = Weekdays(0);
    pub const SUNDAY: Weekdays = Weekdays(1);
    pub const MONDAY: Weekdays = Weekdays(1 << 1);
    pub const TUESDAY: Weekdays = Weekdays(1 << 2);
    pub const WEDNESDAY: Weekdays = Weekdays(1 << 3);
    pub const THURSDAY: Weekdays = Weekdays(1 << 4);
    pub const FRIDAY: Weekdays = Weekdays(1 << 5);
    pub const SATURDAY: Weekdays = Weekdays(1 << 6);
    pub const ALL: Weekdays = Weekdays(0x7F);

    /// Build a mask from raw bits. Bits above Saturday are rejected.
    pub fn from_bits(bits: u8) -> Result<Self> {
        if bits & !Self::ALL.0 != 0 {
            return Err(ScheduleError::InvalidPattern(format!(
                "weekday mask {bits:#04x} has bits outside Sunday..Saturday"
            )));
        }
        Ok(Weekdays(bits))
    }

    /// Build a mask from one boolean per day, Sunday first.
    pub fn from_flags(
        sunday: bool,
        monday: bool,
        tuesday: bool,
        wednesday: bool,
        thursday: bool,
        friday: bool,
        saturday: bool,
    ) -> Self {
        let flags = [sunday, monday, tuesday, wednesday, thursday, friday, saturday];
        let bits = flags
            .iter()
            .enumerate()
            .fold(0u8, |acc, (i, &on)| if on { acc | (1 << i) } else { acc });
        Weekdays(bits)
    }

    /// Like [`Weekdays::from_flags`], but only yields a mask for weekly
    /// frequency; every other frequency carries no weekday set.
    pub fn for_frequency(frequency: Frequency, flags: [bool; 7]) -> Option<Self> {
        if frequency != Frequency::Weekly {
            return None;
        }
        let [sun, mon, tue, wed, thu, fri, sat] = flags;
        Some(Self::from_flags(sun, mon, tue, wed, thu, fri, sat))
    }

    /// The single-day mask for a chrono weekday.
    pub fn of(day: Weekday) -> Self {
        Weekdays(1 << day.num_days_from_sunday())
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn contains(self, day: Weekday) -> bool {
        self.0 & Self::of(day).0 != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of flagged days.
    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Flagged days in Sunday-first order.
    pub fn iter(self) -> impl Iterator<Item = Weekday> {
        let mut day = Weekday::Sun;
        (0..7).filter_map(move |_| {
            let current = day;
            day = day.succ();
            self.contains(current).then_some(current)
        })
    }
}

impl BitOr for Weekdays {
    type Output = Weekdays;

    fn bitor(self, rhs: Weekdays) -> Weekdays {
        Weekdays(self.0 | rhs.0)
    }
}

impl FromIterator<Weekday> for Weekdays {
    fn from_iter<I: IntoIterator<Item = Weekday>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Weekdays::NONE, |acc, day| acc | Weekdays::of(day))
    }
}

impl TryFrom<u8> for Weekdays {
    type Error = ScheduleError;

    fn try_from(bits: u8) -> Result<Self> {
        Weekdays::from_bits(bits)
    }
}

impl From<Weekdays> for u8 {
    fn from(days: Weekdays) -> u8 {
        days.0
    }
}

impl fmt::Display for Weekdays {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.iter().map(|d| d.to_string()).collect();
        write!(f, "{}", names.join(","))
    }
}
