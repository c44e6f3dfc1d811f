//! Month grid for a property's availability calendar.
//!
//! Columns run Sunday to Saturday. The grid starts with blank cells so that
//! day 1 lands under its weekday, then one cell per day of the month.

use std::collections::BTreeMap;

use chrono::{
  Datelike,
  NaiveDate
};
use serde::{
  Deserialize,
  Serialize
};

use crate::availability::{
  AvailabilityReason,
  AvailabilityRecord
};
use crate::error::{
  CoreError,
  CoreResult
};

#[derive(
  Debug,
  Clone,
  Copy,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  Hash,
)]
#[serde(rename_all = "snake_case")]
pub enum CellStatus {
  Past,
  Booking,
  Maintenance,
  OwnerBlocked,
  AdminBlocked,
  Unavailable,
  Available
}

impl CellStatus {
  pub fn as_key(self) -> &'static str {
    match self {
      | CellStatus::Past => "past",
      | CellStatus::Booking => "booking",
      | CellStatus::Maintenance => {
        "maintenance"
      }
      | CellStatus::OwnerBlocked => {
        "owner_blocked"
      }
      | CellStatus::AdminBlocked => {
        "admin_blocked"
      }
      | CellStatus::Unavailable => {
        "unavailable"
      }
      | CellStatus::Available => {
        "available"
      }
    }
  }

  /// Badge text shown in the legend and day tooltips.
  pub fn label(self) -> &'static str {
    match self {
      | CellStatus::Past => "Past",
      | CellStatus::Booking => "Booked",
      | CellStatus::Maintenance => {
        "Maintenance"
      }
      | CellStatus::OwnerBlocked => {
        "Owner blocked"
      }
      | CellStatus::AdminBlocked => {
        "Admin blocked"
      }
      | CellStatus::Unavailable => {
        "Unavailable"
      }
      | CellStatus::Available => {
        "Available"
      }
    }
  }
}

impl From<AvailabilityReason>
  for CellStatus
{
  fn from(
    reason: AvailabilityReason
  ) -> Self {
    match reason {
      | AvailabilityReason::Booking => {
        CellStatus::Booking
      }
      | AvailabilityReason::Maintenance => {
        CellStatus::Maintenance
      }
      | AvailabilityReason::OwnerBlocked => {
        CellStatus::OwnerBlocked
      }
      | AvailabilityReason::AdminBlocked => {
        CellStatus::AdminBlocked
      }
      | AvailabilityReason::Unavailable => {
        CellStatus::Unavailable
      }
    }
  }
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub struct DayCell {
  pub day:        u32,
  pub date:       NaiveDate,
  pub status:     CellStatus,
  pub is_today:   bool,
  #[serde(default)]
  pub guest_name: Option<String>,
  #[serde(default)]
  pub notes:      Option<String>
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
#[serde(
  tag = "kind",
  rename_all = "snake_case"
)]
pub enum CalendarCell {
  Blank,
  Day(DayCell)
}

impl CalendarCell {
  pub fn as_day(
    &self
  ) -> Option<&DayCell> {
    match self {
      | CalendarCell::Blank => None,
      | CalendarCell::Day(day) => {
        Some(day)
      }
    }
  }
}

/// Day counts per badge, for the legend under the grid.
#[derive(
  Debug,
  Clone,
  Default,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub struct MonthSummary {
  pub available:   u32,
  pub booked:      u32,
  pub maintenance: u32,
  pub blocked:     u32,
  pub unavailable: u32,
  pub past:        u32
}

/// Builds the grid for `month` (zero-based, 0 = January) of `year`.
///
/// A day before `today` is `Past` whatever the records say. Otherwise the
/// first active record for the date decides the status, and days without
/// one are `Available`. `is_today` is set independently of the status.
pub fn build_month_grid(
  year: i32,
  month: u32,
  availability: &[AvailabilityRecord],
  today: NaiveDate
) -> CoreResult<Vec<CalendarCell>> {
  let first =
    first_day_of_month(year, month)?;
  let day_count =
    days_in_month(year, month)?;
  let blanks =
    first.weekday().num_days_from_sunday();

  let mut by_date: BTreeMap<
    NaiveDate,
    &AvailabilityRecord
  > = BTreeMap::new();
  for record in
    availability.iter().filter(|r| {
      r.is_active
        && r.date.year() == year
        && r.date.month0() == month
    })
  {
    by_date
      .entry(record.date)
      .or_insert(record);
  }

  let mut cells = Vec::with_capacity(
    (blanks + day_count) as usize
  );
  cells.extend(
    (0..blanks)
      .map(|_| CalendarCell::Blank)
  );

  for day in 1..=day_count {
    let date =
      first.with_day(day).ok_or_else(
        || {
          CoreError::invalid(format!(
            "day {day} out of range \
             for {year}-{:02}",
            month + 1
          ))
        }
      )?;

    let record = if date < today {
      None
    } else {
      by_date.get(&date).copied()
    };
    let status = if date < today {
      CellStatus::Past
    } else {
      record
        .map(|r| {
          CellStatus::from(r.reason)
        })
        .unwrap_or(
          CellStatus::Available
        )
    };

    cells.push(CalendarCell::Day(
      DayCell {
        day,
        date,
        status,
        is_today: date == today,
        guest_name: record.and_then(
          |r| {
            r.booking_guest_name
              .clone()
          }
        ),
        notes: record
          .and_then(|r| r.notes.clone())
      }
    ));
  }

  Ok(cells)
}

pub fn first_day_of_month(
  year: i32,
  month: u32
) -> CoreResult<NaiveDate> {
  if month > 11 {
    return Err(CoreError::invalid(
      format!(
        "month index must be 0-11, \
         got {month}"
      )
    ));
  }

  NaiveDate::from_ymd_opt(
    year,
    month + 1,
    1
  )
  .ok_or_else(|| {
    CoreError::invalid(format!(
      "year {year} is outside the \
       supported calendar range"
    ))
  })
}

pub fn days_in_month(
  year: i32,
  month: u32
) -> CoreResult<u32> {
  let first =
    first_day_of_month(year, month)?;
  let (next_year, next_month) =
    if month == 11 {
      (year.checked_add(1), 1_u32)
    } else {
      (Some(year), month + 2)
    };

  let next_first = next_year
    .and_then(|y| {
      NaiveDate::from_ymd_opt(
        y, next_month, 1
      )
    })
    .ok_or_else(|| {
      CoreError::invalid(format!(
        "month after {year}-{:02} is \
         outside the supported \
         calendar range",
        month + 1
      ))
    })?;

  Ok(
    next_first
      .signed_duration_since(first)
      .num_days() as u32
  )
}

/// Number of blank cells before day 1 (0 = month starts on a Sunday).
pub fn leading_blanks(
  year: i32,
  month: u32
) -> CoreResult<u32> {
  Ok(
    first_day_of_month(year, month)?
      .weekday()
      .num_days_from_sunday()
  )
}

/// Moves `step` months forward (negative steps go back), crossing years.
pub fn shift_month(
  year: i32,
  month: u32,
  step: i32
) -> CoreResult<(i32, u32)> {
  first_day_of_month(year, month)?;

  let total = i64::from(year) * 12
    + i64::from(month)
    + i64::from(step);
  let shifted_year = i32::try_from(
    total.div_euclid(12)
  )
  .map_err(|_| {
    CoreError::invalid(format!(
      "cannot shift {year}-{:02} by \
       {step} months",
      month + 1
    ))
  })?;
  let shifted_month =
    total.rem_euclid(12) as u32;

  first_day_of_month(
    shifted_year,
    shifted_month
  )?;
  Ok((shifted_year, shifted_month))
}

pub fn weekday_labels()
-> [&'static str; 7] {
  [
    "Sun", "Mon", "Tue", "Wed", "Thu",
    "Fri", "Sat"
  ]
}

pub fn summarize(
  cells: &[CalendarCell]
) -> MonthSummary {
  let mut summary =
    MonthSummary::default();
  for day in cells
    .iter()
    .filter_map(CalendarCell::as_day)
  {
    match day.status {
      | CellStatus::Past => {
        summary.past += 1
      }
      | CellStatus::Booking => {
        summary.booked += 1
      }
      | CellStatus::Maintenance => {
        summary.maintenance += 1
      }
      | CellStatus::OwnerBlocked
      | CellStatus::AdminBlocked => {
        summary.blocked += 1
      }
      | CellStatus::Unavailable => {
        summary.unavailable += 1
      }
      | CellStatus::Available => {
        summary.available += 1
      }
    }
  }
  summary
}
