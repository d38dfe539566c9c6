use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

pub const DAY_NAMES_SHORT: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
pub const DAY_NAMES_FULL: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// A scheduling poll: candidate weekdays plus a daily time window.
/// Immutable once created; a new poll replaces the old one wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Poll {
    pub id: String,
    pub title: String,
    /// Ascending, deduplicated weekday indices (0 = Sunday).
    pub days: Vec<u8>,
    /// Minutes since midnight, inclusive start of the daily window.
    pub start_time: u16,
    /// Minutes since midnight, exclusive end of the daily window.
    pub end_time: u16,
    pub created_at: DateTime<Utc>,
    /// Display label only; no conversion is ever performed.
    pub creator_timezone: String,
}

impl Poll {
    /// Validates and creates a poll. Days are sorted and deduplicated;
    /// the title is trimmed. Nothing is mutated on rejection.
    pub fn create(
        title: &str,
        days: &[u8],
        start_time: u16,
        end_time: u16,
        creator_timezone: &str,
    ) -> Result<Poll, ValidationError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if days.is_empty() {
            return Err(ValidationError::NoDaysSelected);
        }
        if let Some(&bad) = days.iter().find(|&&d| d > 6) {
            return Err(ValidationError::DayOutOfRange(bad));
        }
        if start_time >= end_time {
            return Err(ValidationError::WindowOrder {
                start: start_time,
                end: end_time,
            });
        }

        let mut days = days.to_vec();
        days.sort_unstable();
        days.dedup();

        Ok(Poll {
            id: generate_poll_id(),
            title: title.to_string(),
            days,
            start_time,
            end_time,
            created_at: Utc::now(),
            creator_timezone: creator_timezone.to_string(),
        })
    }

    pub fn day_name(day: u8) -> &'static str {
        DAY_NAMES_FULL[day as usize % 7]
    }

    pub fn day_name_short(day: u8) -> &'static str {
        DAY_NAMES_SHORT[day as usize % 7]
    }
}

/// Parses a day given as an index ("1"), a short name ("Mon") or a full
/// name ("Monday"), case-insensitive.
pub fn parse_day(value: &str) -> Option<u8> {
    let value = value.trim();
    if let Ok(idx) = value.parse::<u8>() {
        return (idx <= 6).then_some(idx);
    }
    let lower = value.to_lowercase();
    DAY_NAMES_FULL
        .iter()
        .position(|name| name.to_lowercase() == lower)
        .or_else(|| {
            DAY_NAMES_SHORT
                .iter()
                .position(|name| name.to_lowercase() == lower)
        })
        .map(|idx| idx as u8)
}

const ID_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const ID_LENGTH: usize = 9;

/// Short opaque id for shareable poll links. Collisions are treated as
/// statistically negligible.
fn generate_poll_id() -> String {
    let mut rng = rand::thread_rng();
    (0..ID_LENGTH)
        .map(|_| ID_CHARSET[rng.gen_range(0..ID_CHARSET.len())] as char)
        .collect()
}
