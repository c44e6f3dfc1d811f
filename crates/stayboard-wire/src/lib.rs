//! JSON shapes returned by the rental platform API.
//!
//! Everything here is deliberately loose: dates and times stay strings and
//! enumerations stay free text. `stayboard_core` validates these into its
//! own types before any calendar or urgency logic sees them.

use serde::{
  Deserialize,
  Serialize
};

/// One row of `GET /properties/{id}/availability`.
#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityDto {
  pub date:               String,
  pub reason:             String,
  #[serde(default = "default_true")]
  pub is_active:          bool,
  #[serde(default)]
  pub booking_guest_name: Option<String>,
  #[serde(default)]
  pub notes:              Option<String>
}

/// A booking as listed on the admin bookings page.
#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  Default,
)]
#[serde(rename_all = "camelCase")]
pub struct BookingDto {
  #[serde(default, alias = "_id")]
  pub id:              Option<String>,
  #[serde(default)]
  pub guest_name:      Option<String>,
  #[serde(default)]
  pub property_title:  Option<String>,
  #[serde(default, alias = "type")]
  pub booking_type:    Option<String>,
  #[serde(default)]
  pub status:          Option<String>,
  #[serde(default)]
  pub inspection_date: Option<String>,
  #[serde(default)]
  pub inspection_time: Option<String>,
  #[serde(default)]
  pub check_in_date:   Option<String>,
  #[serde(default)]
  pub check_out_date:  Option<String>
}

/// List endpoints answer either with a bare array or with `{ "data": [...] }`.
#[derive(
  Debug, Clone, Serialize, Deserialize,
)]
#[serde(untagged)]
pub enum ApiList<T> {
  Bare(Vec<T>),
  Envelope { data: Vec<T> }
}

impl<T> ApiList<T> {
  pub fn into_items(self) -> Vec<T> {
    match self {
      | ApiList::Bare(items) => items,
      | ApiList::Envelope { data } => data
    }
  }
}

fn default_true() -> bool {
  true
}

#[cfg(test)]
mod tests {
  use super::{
    ApiList,
    AvailabilityDto,
    BookingDto
  };

  #[test]
  fn availability_defaults_to_active() {
    let dto: AvailabilityDto =
      serde_json::from_str(
        r#"{"date":"2024-03-05","reason":"maintenance"}"#
      )
      .expect("parse availability");
    assert!(dto.is_active);
    assert_eq!(dto.notes, None);
  }

  #[test]
  fn booking_accepts_underscore_id_and_type_alias() {
    let dto: BookingDto =
      serde_json::from_str(
        r#"{"_id":"b-1","type":"inspection","inspectionDate":"2024-03-05","inspectionTime":"14:30"}"#
      )
      .expect("parse booking");
    assert_eq!(dto.id.as_deref(), Some("b-1"));
    assert_eq!(
      dto.booking_type.as_deref(),
      Some("inspection")
    );
    assert_eq!(
      dto.inspection_time.as_deref(),
      Some("14:30")
    );
  }

  #[test]
  fn list_accepts_envelope_and_bare_array() {
    let wrapped: ApiList<AvailabilityDto> =
      serde_json::from_str(
        r#"{"data":[{"date":"2024-03-05","reason":"booking","isActive":false}]}"#
      )
      .expect("parse envelope");
    let items = wrapped.into_items();
    assert_eq!(items.len(), 1);
    assert!(!items[0].is_active);

    let bare: ApiList<BookingDto> =
      serde_json::from_str(
        r#"[{"guestName":"Ada"},{}]"#
      )
      .expect("parse bare list");
    assert_eq!(bare.into_items().len(), 2);
  }
}
