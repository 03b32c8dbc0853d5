//! Weekly availability templates and slot checks.
//!
//! Times are wall-clock only; no timezone is attached or normalized.

use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use thiserror::Error;

use crate::contract::{DayAvailability, WeeklyAvailability};

const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AvailabilityError {
    #[error("{} appears more than once", weekday_name(*.0))]
    DuplicateDay(Weekday),
    #[error(
        "{}: start {} must be before end {}",
        weekday_name(*day),
        format_slot(*start),
        format_slot(*end)
    )]
    EmptyWindow {
        day: Weekday,
        start: NaiveTime,
        end: NaiveTime,
    },
}

/// Why a requested slot cannot be booked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SlotRejection {
    #[error("doctor does not work on {}", weekday_name(*.0))]
    DayUnavailable(Weekday),
    #[error("outside working hours {} - {}", format_slot(*start), format_slot(*end))]
    OutsideWindow { start: NaiveTime, end: NaiveTime },
}

fn hm(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap_or(NaiveTime::MIN)
}

fn default_start() -> NaiveTime {
    hm(9, 0)
}

fn default_end() -> NaiveTime {
    hm(18, 0)
}

impl WeeklyAvailability {
    /// Monday to Friday 9:00 AM - 6:00 PM; weekends off.
    pub fn standard() -> Self {
        let days = WEEK
            .into_iter()
            .map(|day| DayAvailability {
                day,
                start: default_start(),
                end: default_end(),
                is_available: !matches!(day, Weekday::Sat | Weekday::Sun),
            })
            .collect();
        Self { days }
    }

    /// Build a template from caller-supplied entries in any order.
    /// Omitted days become unavailable; repeated days and empty windows are rejected.
    pub fn from_entries(entries: Vec<DayAvailability>) -> Result<Self, AvailabilityError> {
        let mut slots: [Option<DayAvailability>; 7] = [None; 7];
        for entry in entries {
            let idx = entry.day.num_days_from_monday() as usize;
            if slots[idx].is_some() {
                return Err(AvailabilityError::DuplicateDay(entry.day));
            }
            if entry.is_available && entry.start >= entry.end {
                return Err(AvailabilityError::EmptyWindow {
                    day: entry.day,
                    start: entry.start,
                    end: entry.end,
                });
            }
            slots[idx] = Some(entry);
        }

        let days = WEEK
            .into_iter()
            .zip(slots)
            .map(|(day, slot)| {
                slot.unwrap_or(DayAvailability {
                    day,
                    start: default_start(),
                    end: default_end(),
                    is_available: false,
                })
            })
            .collect();
        Ok(Self { days })
    }

    /// `Ok` when `date` falls on an available day and `start <= slot < end`.
    pub fn check_slot(&self, date: NaiveDate, slot: NaiveTime) -> Result<(), SlotRejection> {
        let entry = self.day(date.weekday());
        if !entry.is_available {
            return Err(SlotRejection::DayUnavailable(entry.day));
        }
        if slot < entry.start || slot >= entry.end {
            return Err(SlotRejection::OutsideWindow {
                start: entry.start,
                end: entry.end,
            });
        }
        Ok(())
    }
}

/// Parse a wall-clock slot: "10:00 AM", "10:00am", "9:30 pm", "14:30" or "14:30:00".
pub fn parse_slot(raw: &str) -> Option<NaiveTime> {
    let compact: String = raw
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_uppercase();
    if compact.is_empty() {
        return None;
    }
    ["%I:%M%p", "%H:%M", "%H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(&compact, fmt).ok())
}

/// Render a slot the way the client shows it: "9:00 AM", "10:30 PM".
pub fn format_slot(t: NaiveTime) -> String {
    t.format("%-I:%M %p").to_string()
}

/// Lower-case English day name, as used on the wire.
pub fn weekday_name(d: Weekday) -> &'static str {
    match d {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}

/// Accepts full or three-letter names, any case.
pub fn parse_weekday(raw: &str) -> Option<Weekday> {
    raw.trim().parse::<Weekday>().ok()
}
