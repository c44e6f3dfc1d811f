use std::fmt;

use chrono::{DateTime, TimeDelta, TimeZone};
use serde::{Deserialize, Serialize};

use crate::booking::BookingEvent;
use crate::error::CoreError;

pub const NO_DATE_LABEL: &str = "No date set";
pub const PAST_LABEL: &str = "Past";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Critical,
    Warning,
    Future,
    Past,
    Unknown,
}

impl Tier {
    /// Sort key for booking lists: most pressing first, undated last.
    pub fn rank(self) -> u8 {
        match self {
            Self::Critical => 0,
            Self::Warning => 1,
            Self::Future => 2,
            Self::Past => 3,
            Self::Unknown => 4,
        }
    }

    pub fn as_key(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Warning => "warning",
            Self::Future => "future",
            Self::Past => "past",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_key())
    }
}

impl std::str::FromStr for Tier {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "critical" => Ok(Self::Critical),
            "warning" => Ok(Self::Warning),
            "future" => Ok(Self::Future),
            "past" => Ok(Self::Past),
            "unknown" => Ok(Self::Unknown),
            other => Err(CoreError::invalid(format!("unknown urgency tier: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Urgency {
    pub remaining_label: String,
    pub tier: Tier,
}

impl Urgency {
    fn new(remaining_label: String, tier: Tier) -> Self {
        Self {
            remaining_label,
            tier,
        }
    }

    pub fn unknown() -> Self {
        Self::new(NO_DATE_LABEL.to_string(), Tier::Unknown)
    }
}

/// Countdown label and tier for a booking, evaluated against `now`.
///
/// The event's wall-clock start is read in `now`'s timezone. A booking
/// without a usable date gets the `Unknown` tier instead of an error.
pub fn classify_urgency<Tz: TimeZone>(event: &BookingEvent, now: &DateTime<Tz>) -> Urgency {
    match event.event_instant(&now.timezone()) {
        Ok(instant) => classify_delta(instant.signed_duration_since(now)),
        Err(_) => Urgency::unknown(),
    }
}

/// Buckets the signed time left until an event.
///
/// Bounds are strict and counts are floored: 23h59m is `23h` critical,
/// exactly 24h is already `1d` warning.
pub fn classify_delta(delta: TimeDelta) -> Urgency {
    if delta < TimeDelta::zero() {
        return Urgency::new(PAST_LABEL.to_string(), Tier::Past);
    }

    let hours = delta.num_hours();
    let days = delta.num_days();

    if delta < TimeDelta::hours(24) {
        Urgency::new(format!("{hours}h"), Tier::Critical)
    } else if delta < TimeDelta::days(7) {
        Urgency::new(format!("{days}d"), Tier::Warning)
    } else {
        Urgency::new(format!("{days}d"), Tier::Future)
    }
}
