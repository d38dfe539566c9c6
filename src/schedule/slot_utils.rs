use crate::error::PreconditionError;
use crate::poll::Poll;

/// Slot granularity in minutes.
pub const SLOT_MINUTES: u16 = 15;

/// Generates the ordered slot sequence for a daily window: `start_time`,
/// then every 15 minutes while strictly below `end_time`. A window that is
/// not a multiple of 15 simply stops short of `end_time`.
///
/// Poll creation already validates the window, but the function rejects an
/// inverted range itself so it stays safe standalone.
pub fn generate_slots(start_time: u16, end_time: u16) -> Result<Vec<u16>, PreconditionError> {
    if start_time >= end_time {
        return Err(PreconditionError::InvalidRange {
            start: start_time,
            end: end_time,
        });
    }
    Ok((start_time..end_time).step_by(SLOT_MINUTES as usize).collect())
}

/// Slot sequence for a poll's window. Valid polls always have a valid
/// window, so this cannot fail for a `Poll` built through `Poll::create`.
pub fn poll_slots(poll: &Poll) -> Vec<u16> {
    generate_slots(poll.start_time, poll.end_time).unwrap_or_default()
}

/// Formats a minute-of-day on the 12-hour clock: 0 -> "12:00 AM",
/// 720 -> "12:00 PM", 1125 -> "6:45 PM". No timezone conversion.
pub fn format_slot(minute_of_day: u16) -> String {
    let hour = minute_of_day / 60;
    let minute = minute_of_day % 60;
    let period = if hour >= 12 { "PM" } else { "AM" };
    let display_hour = match hour {
        0 => 12,
        h if h > 12 => h - 12,
        h => h,
    };
    format!("{}:{:02} {}", display_hour, minute, period)
}

/// Parses a time string (HH:MM) to minutes since midnight.
pub fn parse_time_to_minutes(time_str: &str) -> Option<u16> {
    let parts: Vec<&str> = time_str.trim().split(':').collect();
    if parts.len() != 2 {
        return None;
    }
    let hours: u16 = parts[0].parse().ok()?;
    let minutes: u16 = parts[1].parse().ok()?;
    if hours >= 24 || minutes >= 60 {
        return None;
    }
    Some(hours * 60 + minutes)
}

/// Formats minutes since midnight as 24-hour HH:MM, for CSV round-trips.
pub fn minutes_to_time_string(minute_of_day: u16) -> String {
    format!("{:02}:{:02}", minute_of_day / 60, minute_of_day % 60)
}
