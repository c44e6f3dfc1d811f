use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use serde::{Deserialize, Serialize};
use stayboard_wire::BookingDto;

use crate::datetime::{parse_calendar_date, parse_time_of_day, resolve_local};
use crate::error::{CoreError, CoreResult};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingKind {
    Inspection,
    Stay,
}

impl fmt::Display for BookingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inspection => f.write_str("inspection"),
            Self::Stay => f.write_str("stay"),
        }
    }
}

/// The part of a booking that decides how urgent it is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BookingEvent {
    pub kind: BookingKind,
    #[serde(default)]
    pub inspection_date: Option<NaiveDate>,
    #[serde(default)]
    pub inspection_time: Option<NaiveTime>,
    #[serde(default)]
    pub check_in_date: Option<NaiveDate>,
}

impl BookingEvent {
    pub fn inspection(date: Option<NaiveDate>, time: Option<NaiveTime>) -> Self {
        Self {
            kind: BookingKind::Inspection,
            inspection_date: date,
            inspection_time: time,
            check_in_date: None,
        }
    }

    pub fn stay(check_in: Option<NaiveDate>) -> Self {
        Self {
            kind: BookingKind::Stay,
            inspection_date: None,
            inspection_time: None,
            check_in_date: check_in,
        }
    }

    /// Wall-clock start of the event. Stays and untimed inspections start at midnight.
    pub fn local_start(&self) -> CoreResult<NaiveDateTime> {
        match self.kind {
            BookingKind::Inspection => {
                let date = self.inspection_date.ok_or(CoreError::MissingDate)?;
                Ok(date.and_time(self.inspection_time.unwrap_or(NaiveTime::MIN)))
            }
            BookingKind::Stay => {
                let date = self.check_in_date.ok_or(CoreError::MissingDate)?;
                Ok(date.and_time(NaiveTime::MIN))
            }
        }
    }

    /// The event start as an instant in `tz`. Computed on each call.
    pub fn event_instant<Tz: TimeZone>(&self, tz: &Tz) -> CoreResult<DateTime<Tz>> {
        Ok(resolve_local(tz, self.local_start()?))
    }
}

impl TryFrom<&BookingDto> for BookingEvent {
    type Error = CoreError;

    fn try_from(dto: &BookingDto) -> Result<Self, Self::Error> {
        let inspection_date = parse_optional(dto.inspection_date.as_deref(), parse_calendar_date)?;
        let inspection_time = parse_optional(dto.inspection_time.as_deref(), parse_time_of_day)?;
        let check_in_date = parse_optional(dto.check_in_date.as_deref(), parse_calendar_date)?;

        let kind = match dto
            .booking_type
            .as_deref()
            .map(|raw| raw.trim().to_ascii_lowercase())
            .filter(|raw| !raw.is_empty())
        {
            Some(raw) => match raw.as_str() {
                "inspection" | "viewing" => BookingKind::Inspection,
                "stay" | "booking" | "rental" => BookingKind::Stay,
                other => {
                    return Err(CoreError::invalid(format!("unknown booking type: {other}")));
                }
            },
            None if inspection_date.is_some() => BookingKind::Inspection,
            None => BookingKind::Stay,
        };

        Ok(Self {
            kind,
            inspection_date,
            inspection_time,
            check_in_date,
        })
    }
}

fn parse_optional<T>(
    raw: Option<&str>,
    parse: fn(&str) -> CoreResult<T>,
) -> CoreResult<Option<T>> {
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        Some(value) => parse(value).map(Some),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Timelike};
    use stayboard_wire::BookingDto;

    use super::*;

    #[test]
    fn infers_kind_from_fields_when_type_missing() {
        let dto = BookingDto {
            inspection_date: Some("2024-05-01".to_string()),
            inspection_time: Some("10:30".to_string()),
            ..BookingDto::default()
        };
        let event = BookingEvent::try_from(&dto).expect("valid booking");
        assert_eq!(event.kind, BookingKind::Inspection);

        let start = event.local_start().expect("has start");
        assert_eq!(start.hour(), 10);
        assert_eq!(start.minute(), 30);

        let dto = BookingDto {
            check_in_date: Some("2024-05-03".to_string()),
            ..BookingDto::default()
        };
        let event = BookingEvent::try_from(&dto).expect("valid booking");
        assert_eq!(event.kind, BookingKind::Stay);
    }

    #[test]
    fn stay_starts_at_midnight() {
        let event = BookingEvent::stay(NaiveDate::from_ymd_opt(2024, 5, 3));
        let start = event.local_start().expect("has start");
        assert_eq!(start.time(), NaiveTime::MIN);
    }

    #[test]
    fn missing_relevant_date_is_reported() {
        let event = BookingEvent {
            kind: BookingKind::Stay,
            inspection_date: NaiveDate::from_ymd_opt(2024, 5, 3),
            inspection_time: None,
            check_in_date: None,
        };
        assert_eq!(event.local_start(), Err(CoreError::MissingDate));
    }

    #[test]
    fn rejects_bad_fields() {
        let dto = BookingDto {
            booking_type: Some("party".to_string()),
            ..BookingDto::default()
        };
        assert!(BookingEvent::try_from(&dto).is_err());

        let dto = BookingDto {
            inspection_date: Some("2024-05-01".to_string()),
            inspection_time: Some("25:00".to_string()),
            ..BookingDto::default()
        };
        assert!(BookingEvent::try_from(&dto).is_err());
    }
}
