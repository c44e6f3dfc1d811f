use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use stayboard_wire::AvailabilityDto;

use crate::datetime::parse_calendar_date;
use crate::error::CoreError;

/// Why a property is not free on a given day.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityReason {
    Booking,
    Maintenance,
    OwnerBlocked,
    AdminBlocked,
    Unavailable,
}

impl AvailabilityReason {
    pub fn as_key(self) -> &'static str {
        match self {
            Self::Booking => "booking",
            Self::Maintenance => "maintenance",
            Self::OwnerBlocked => "owner_blocked",
            Self::AdminBlocked => "admin_blocked",
            Self::Unavailable => "unavailable",
        }
    }
}

impl fmt::Display for AvailabilityReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_key())
    }
}

impl FromStr for AvailabilityReason {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "booking" | "booked" => Ok(Self::Booking),
            "maintenance" => Ok(Self::Maintenance),
            "owner_blocked" => Ok(Self::OwnerBlocked),
            "admin_blocked" => Ok(Self::AdminBlocked),
            "unavailable" => Ok(Self::Unavailable),
            other => Err(CoreError::invalid(format!(
                "unknown availability reason: {other}"
            ))),
        }
    }
}

/// One calendar day entry for a property.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AvailabilityRecord {
    pub date: NaiveDate,
    pub reason: AvailabilityReason,
    pub is_active: bool,
    #[serde(default)]
    pub booking_guest_name: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl AvailabilityRecord {
    pub fn new(date: NaiveDate, reason: AvailabilityReason) -> Self {
        Self {
            date,
            reason,
            is_active: true,
            booking_guest_name: None,
            notes: None,
        }
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }
}

impl TryFrom<&AvailabilityDto> for AvailabilityRecord {
    type Error = CoreError;

    fn try_from(dto: &AvailabilityDto) -> Result<Self, Self::Error> {
        Ok(Self {
            date: parse_calendar_date(&dto.date)?,
            reason: dto.reason.parse()?,
            is_active: dto.is_active,
            booking_guest_name: non_blank(dto.booking_guest_name.as_deref()),
            notes: non_blank(dto.notes.as_deref()),
        })
    }
}

/// Validates a whole snapshot, reporting the first bad row by index.
#[tracing::instrument(skip_all, fields(rows = dtos.len()))]
pub fn records_from_dtos(dtos: &[AvailabilityDto]) -> Result<Vec<AvailabilityRecord>, CoreError> {
    let mut records = Vec::with_capacity(dtos.len());
    for (idx, dto) in dtos.iter().enumerate() {
        let record = AvailabilityRecord::try_from(dto).map_err(|err| match err {
            CoreError::InvalidArgument(msg) => {
                CoreError::invalid(format!("availability row {idx}: {msg}"))
            }
            other => other,
        })?;
        records.push(record);
    }

    tracing::debug!(
        active = records.iter().filter(|r| r.is_active).count(),
        "validated availability snapshot"
    );
    Ok(records)
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
