use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use stayboard_core::availability::{AvailabilityReason, AvailabilityRecord};
use stayboard_core::booking::BookingEvent;
use stayboard_core::calendar::{CalendarCell, CellStatus, build_month_grid, days_in_month, leading_blanks};
use stayboard_core::urgency::{Tier, classify_urgency};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).single().expect("valid instant")
}

fn status_on(cells: &[CalendarCell], day: u32) -> CellStatus {
    cells
        .iter()
        .filter_map(CalendarCell::as_day)
        .find(|cell| cell.day == day)
        .map(|cell| cell.status)
        .expect("day in grid")
}

/// Event starting exactly `offset` after `now`, as an inspection with a time.
fn inspection_in(now: DateTime<Utc>, offset: Duration) -> BookingEvent {
    let start = (now + offset).naive_utc();
    BookingEvent::inspection(Some(start.date()), Some(start.time()))
}

#[test]
fn cell_count_is_blanks_plus_days_for_every_month() {
    let today = date(2000, 1, 1);
    for year in [1900, 1999, 2000, 2023, 2024, 2100, 2400] {
        for month in 0..12 {
            let cells = build_month_grid(year, month, &[], today).expect("grid");
            let blanks = leading_blanks(year, month).expect("blanks");
            let days = days_in_month(year, month).expect("days");

            assert!(blanks <= 6, "{year}-{month}: {blanks} blanks");
            assert!((28..=31).contains(&days));
            assert_eq!(cells.len() as u32, blanks + days);
            assert!(
                cells[..blanks as usize]
                    .iter()
                    .all(|cell| matches!(cell, CalendarCell::Blank))
            );
            let first_day = cells[blanks as usize].as_day().expect("day 1 cell");
            assert_eq!(first_day.day, 1);
        }
    }
}

#[test]
fn february_follows_leap_years() {
    assert_eq!(days_in_month(2024, 1).expect("feb 2024"), 29);
    assert_eq!(days_in_month(2023, 1).expect("feb 2023"), 28);
    let cells = build_month_grid(2024, 1, &[], date(2024, 1, 1)).expect("grid");
    assert_eq!(cells.iter().filter_map(CalendarCell::as_day).count(), 29);
}

#[test]
fn inactive_record_is_same_as_no_record() {
    let today = date(2024, 3, 1);
    let inactive = vec![AvailabilityRecord::new(date(2024, 3, 12), AvailabilityReason::Booking).inactive()];

    let with_inactive = build_month_grid(2024, 2, &inactive, today).expect("grid");
    let without = build_month_grid(2024, 2, &[], today).expect("grid");

    assert_eq!(status_on(&with_inactive, 12), CellStatus::Available);
    assert_eq!(with_inactive, without);
}

#[test]
fn past_days_ignore_records() {
    let today = date(2024, 3, 15);
    let records = vec![
        AvailabilityRecord::new(date(2024, 3, 14), AvailabilityReason::Booking),
        AvailabilityRecord::new(date(2024, 3, 1), AvailabilityReason::AdminBlocked),
        AvailabilityRecord::new(date(2024, 3, 16), AvailabilityReason::OwnerBlocked),
    ];
    let cells = build_month_grid(2024, 2, &records, today).expect("grid");

    assert_eq!(status_on(&cells, 14), CellStatus::Past);
    assert_eq!(status_on(&cells, 1), CellStatus::Past);
    assert_eq!(status_on(&cells, 15), CellStatus::Available);
    assert_eq!(status_on(&cells, 16), CellStatus::OwnerBlocked);
}

#[test]
fn grid_is_referentially_transparent() {
    let today = date(2024, 3, 15);
    let records = vec![
        AvailabilityRecord::new(date(2024, 3, 20), AvailabilityReason::Maintenance),
        AvailabilityRecord::new(date(2024, 3, 20), AvailabilityReason::Booking),
    ];
    let first = build_month_grid(2024, 2, &records, today).expect("grid");
    let second = build_month_grid(2024, 2, &records, today).expect("grid");
    assert_eq!(first, second);
}

#[test]
fn just_under_a_day_is_critical() {
    let now = at(2024, 5, 1, 9, 0);
    let urgency = classify_urgency(&inspection_in(now, Duration::hours(23) + Duration::minutes(59)), &now);
    assert_eq!(urgency.tier, Tier::Critical);
    assert_eq!(urgency.remaining_label, "23h");
}

#[test]
fn thirty_hours_is_warning_in_days() {
    let now = at(2024, 5, 1, 9, 0);
    let urgency = classify_urgency(&inspection_in(now, Duration::hours(30)), &now);
    assert_eq!(urgency.tier, Tier::Warning);
    assert_eq!(urgency.remaining_label, "1d");
}

#[test]
fn an_hour_ago_is_past() {
    let now = at(2024, 5, 1, 9, 0);
    let urgency = classify_urgency(&inspection_in(now, -Duration::hours(1)), &now);
    assert_eq!(urgency.tier, Tier::Past);
    assert_eq!(urgency.remaining_label, "Past");
}

#[test]
fn missing_dates_are_unknown() {
    let now = at(2024, 5, 1, 9, 0);
    for event in [BookingEvent::inspection(None, None), BookingEvent::stay(None)] {
        let urgency = classify_urgency(&event, &now);
        assert_eq!(urgency.tier, Tier::Unknown);
        assert_eq!(urgency.remaining_label, "No date set");
    }
}

#[test]
fn stays_count_from_midnight_in_the_callers_timezone() {
    let tz = chrono_tz::Europe::Oslo;
    let now = tz.with_ymd_and_hms(2024, 5, 1, 22, 0, 0).single().expect("valid now");
    let urgency = classify_urgency(&BookingEvent::stay(Some(date(2024, 5, 2))), &now);
    assert_eq!(urgency.tier, Tier::Critical);
    assert_eq!(urgency.remaining_label, "2h");
}

#[test]
fn tiers_only_move_toward_past_as_time_passes() {
    let event = BookingEvent::inspection(Some(date(2024, 6, 10)), NaiveTime::from_hms_opt(14, 30, 0));
    let order = |tier: Tier| match tier {
        Tier::Future => 0,
        Tier::Warning => 1,
        Tier::Critical => 2,
        Tier::Past => 3,
        Tier::Unknown => panic!("dated event classified unknown"),
    };

    let mut now = at(2024, 5, 20, 0, 0);
    let end = at(2024, 6, 11, 0, 0);
    let mut last = order(classify_urgency(&event, &now).tier);
    let mut last_label = classify_urgency(&event, &now).remaining_label;
    while now < end {
        now += Duration::minutes(30);
        let urgency = classify_urgency(&event, &now);
        let current = order(urgency.tier);
        assert!(current >= last, "tier went back at {now}: {last_label} -> {}", urgency.remaining_label);
        last = current;
        last_label = urgency.remaining_label;
    }
    assert_eq!(last, 3);
}
