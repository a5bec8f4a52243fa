use serde::Serialize;
use thiserror::Error;
use time::{Duration, OffsetDateTime, Time};

use crate::store::Medication;

/// Fixed deferral period; an elapsed snooze makes the medication due
/// again regardless of its base schedule.
pub const SNOOZE_WINDOW: Duration = Duration::minutes(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    Daily,
    Alternate,
    Weekly,
}

impl Frequency {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "daily" => Some(Self::Daily),
            "alternate" => Some(Self::Alternate),
            "weekly" => Some(Self::Weekly),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Alternate => "alternate",
            Self::Weekly => "weekly",
        }
    }

    /// Spacing between scheduled occurrences.
    pub fn interval(self) -> Duration {
        match self {
            Self::Daily => Duration::days(1),
            Self::Alternate => Duration::days(2),
            Self::Weekly => Duration::days(7),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimeParseError {
    #[error("expected \"H:MM AM\" or \"H:MM PM\"")]
    Malformed,
    #[error("hour must be 1-12")]
    HourOutOfRange,
    #[error("minute must be 0-59")]
    MinuteOutOfRange,
}

/// Parses a 12-hour clock string, case-insensitive on the AM/PM
/// suffix. Returns the canonical uppercase form ("8:30 pm" becomes
/// "8:30 PM", digits kept as typed) together with the wall-clock time.
pub fn parse_time_12h(input: &str) -> Result<(String, Time), TimeParseError> {
    let trimmed = input.trim();
    let (clock, period) = trimmed
        .split_once(char::is_whitespace)
        .ok_or(TimeParseError::Malformed)?;
    let period = period.trim();

    let suffix = if period.eq_ignore_ascii_case("am") {
        "AM"
    } else if period.eq_ignore_ascii_case("pm") {
        "PM"
    } else {
        return Err(TimeParseError::Malformed);
    };

    let (hours, minutes) = clock.split_once(':').ok_or(TimeParseError::Malformed)?;
    let hour: u8 = hours.parse().map_err(|_| TimeParseError::Malformed)?;
    let minute: u8 = minutes.parse().map_err(|_| TimeParseError::Malformed)?;
    if !(1..=12).contains(&hour) {
        return Err(TimeParseError::HourOutOfRange);
    }
    if minute > 59 {
        return Err(TimeParseError::MinuteOutOfRange);
    }

    let hour24 = match (suffix, hour) {
        ("AM", 12) => 0,
        ("AM", h) => h,
        (_, 12) => 12,
        (_, h) => h + 12,
    };
    let time = Time::from_hms(hour24, minute, 0).map_err(|_| TimeParseError::Malformed)?;

    Ok((format!("{clock} {suffix}"), time))
}

/// Derived per-medication state. Never persisted; a pure function of
/// the two optional timestamps plus the current time, so it cannot
/// desynchronize from them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Idle,
    Taken,
    Snoozed,
}

pub fn classify(
    last_taken_at: Option<OffsetDateTime>,
    snooze_until: Option<OffsetDateTime>,
    now: OffsetDateTime,
) -> Status {
    if matches!(snooze_until, Some(until) if now < until) {
        return Status::Snoozed;
    }
    if last_taken_at.is_some() {
        Status::Taken
    } else {
        Status::Idle
    }
}

/// Whether the next reminder occurrence has arrived and is not
/// suppressed by an active snooze. All calendar math is UTC:
/// - active snooze suppresses; an elapsed snooze is due outright
/// - taken: due again at the scheduled time-of-day, one frequency
///   interval after the date of the last take
/// - idle: due once today's scheduled time-of-day has passed
///
/// An unparseable stored time or frequency never panics; the
/// medication is simply not due.
pub fn is_due(medication: &Medication, now: OffsetDateTime) -> bool {
    if let Some(until) = medication.snooze_until {
        return now >= until;
    }

    let Ok((_, at)) = parse_time_12h(&medication.time_12h) else {
        return false;
    };
    let Some(frequency) = Frequency::parse(&medication.frequency) else {
        return false;
    };

    match medication.last_taken_at {
        None => now >= now.replace_time(at),
        Some(taken) => now >= taken.replace_time(at) + frequency.interval(),
    }
}
