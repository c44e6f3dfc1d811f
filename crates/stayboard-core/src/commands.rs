use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use anyhow::{Context, anyhow};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use serde::de::DeserializeOwned;
use stayboard_wire::{ApiList, AvailabilityDto, BookingDto};
use tracing::{debug, info, instrument, warn};

use crate::availability::records_from_dtos;
use crate::booking::{BookingEvent, BookingKind};
use crate::calendar::{CalendarCell, MonthSummary, build_month_grid, first_day_of_month, shift_month, summarize};
use crate::cli::{CalendarArgs, Command, UrgencyArgs};
use crate::config::{Config, UrgencySort};
use crate::datetime::{parse_calendar_date, parse_instant, parse_year_month, resolve_timezone, to_project_date};
use crate::render::Renderer;
use crate::urgency::{Tier, Urgency, classify_urgency};

/// One line of the bookings urgency list.
#[derive(Debug, Clone, Serialize)]
pub struct UrgencyRow {
    pub id: Option<String>,
    pub guest: Option<String>,
    pub property: Option<String>,
    pub status: Option<String>,
    pub kind: BookingKind,
    pub event_local: Option<NaiveDateTime>,
    pub urgency: Urgency,
}

#[derive(Debug, Serialize)]
struct CalendarView<'a> {
    year: i32,
    month_index: u32,
    month: String,
    today: NaiveDate,
    cells: &'a [CalendarCell],
    summary: &'a MonthSummary,
}

#[instrument(skip_all)]
pub fn dispatch(cfg: &Config, renderer: &Renderer, command: Command) -> anyhow::Result<()> {
    let tz = resolve_timezone(cfg.timezone().as_deref());
    debug!(timezone = %tz, "resolved project timezone");

    let mut out = io::stdout().lock();
    match command {
        Command::Calendar(args) => cmd_calendar(&mut out, renderer, tz, args),
        Command::Urgency(args) => cmd_urgency(&mut out, cfg, renderer, tz, args),
    }
}

#[instrument(skip(out, renderer, args), fields(file = %args.availability.display()))]
fn cmd_calendar<W: Write>(out: &mut W, renderer: &Renderer, tz: Tz, args: CalendarArgs) -> anyhow::Result<()> {
    let today = match args.today.as_deref() {
        Some(raw) => parse_calendar_date(raw).context("invalid --today")?,
        None => to_project_date(Utc::now(), tz),
    };

    let (year, month) = match args.month.as_deref() {
        Some(raw) => parse_year_month(raw).context("invalid --month")?,
        None => (today.year(), today.month0()),
    };
    let (year, month) = shift_month(year, month, args.shift)
        .with_context(|| format!("cannot shift by {} months", args.shift))?;

    let dtos: Vec<AvailabilityDto> = read_snapshot(&args.availability)?;
    let records = records_from_dtos(&dtos)
        .with_context(|| format!("invalid availability snapshot {}", args.availability.display()))?;

    let cells = build_month_grid(year, month, &records, today)?;
    let summary = summarize(&cells);
    info!(year, month = month + 1, cells = cells.len(), "built month grid");

    if args.json {
        let view = CalendarView {
            year,
            month_index: month,
            month: format!("{year:04}-{:02}", month + 1),
            today,
            cells: &cells,
            summary: &summary,
        };
        serde_json::to_writer_pretty(&mut *out, &view)?;
        writeln!(out)?;
        return Ok(());
    }

    let first = first_day_of_month(year, month)?;
    renderer.print_month_grid(out, first, &cells, &summary)
}

#[instrument(skip(out, cfg, renderer, args), fields(file = %args.bookings.display()))]
fn cmd_urgency<W: Write>(
    out: &mut W,
    cfg: &Config,
    renderer: &Renderer,
    tz: Tz,
    args: UrgencyArgs,
) -> anyhow::Result<()> {
    let now = match args.now.as_deref() {
        Some(raw) => parse_instant(raw, tz).context("invalid --now")?,
        None => Utc::now().with_timezone(&tz),
    };
    let sort = cfg.urgency_sort()?;

    let dtos: Vec<BookingDto> = read_snapshot(&args.bookings)?;
    let rows = build_urgency_rows(&dtos, &now, &args.tiers, sort);
    info!(bookings = dtos.len(), shown = rows.len(), "classified bookings");

    if args.json {
        serde_json::to_writer_pretty(&mut *out, &rows)?;
        writeln!(out)?;
        return Ok(());
    }

    renderer.print_urgency_table(out, &rows)
}

/// Classifies every valid booking, keeps the requested tiers and sorts.
///
/// Rows that fail validation are logged and skipped.
pub fn build_urgency_rows<Z: TimeZone>(
    dtos: &[BookingDto],
    now: &DateTime<Z>,
    tiers: &[Tier],
    sort: UrgencySort,
) -> Vec<UrgencyRow> {
    let mut rows: Vec<UrgencyRow> = dtos
        .iter()
        .enumerate()
        .filter_map(|(idx, dto)| match BookingEvent::try_from(dto) {
            Ok(event) => Some(UrgencyRow {
                id: dto.id.clone(),
                guest: dto.guest_name.clone(),
                property: dto.property_title.clone(),
                status: dto.status.clone(),
                kind: event.kind,
                event_local: event.local_start().ok(),
                urgency: classify_urgency(&event, now),
            }),
            Err(err) => {
                warn!(row = idx, id = ?dto.id, error = %err, "skipping invalid booking");
                None
            }
        })
        .filter(|row| tiers.is_empty() || tiers.contains(&row.urgency.tier))
        .collect();

    match sort {
        UrgencySort::Urgency => {
            rows.sort_by(|a, b| {
                a.urgency
                    .tier
                    .rank()
                    .cmp(&b.urgency.tier.rank())
                    .then_with(|| a.event_local.cmp(&b.event_local))
            });
        }
        UrgencySort::Date => {
            rows.sort_by_key(|row| (row.event_local.is_none(), row.event_local));
        }
        UrgencySort::None => {}
    }

    rows
}

fn read_snapshot<T: DeserializeOwned>(path: &Path) -> anyhow::Result<Vec<T>> {
    let raw = if path.as_os_str() == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read snapshot from stdin")?;
        buf
    } else {
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?
    };

    if raw.trim().is_empty() {
        return Err(anyhow!("snapshot {} is empty", path.display()));
    }

    let list: ApiList<T> = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse snapshot {}", path.display()))?;
    let items = list.into_items();
    debug!(file = %path.display(), rows = items.len(), "loaded snapshot");
    Ok(items)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use chrono::TimeZone;
    use stayboard_wire::BookingDto;
    use tempfile::tempdir;

    use super::*;

    fn booking(id: &str, check_in: Option<&str>) -> BookingDto {
        BookingDto {
            id: Some(id.to_string()),
            booking_type: Some("stay".to_string()),
            check_in_date: check_in.map(str::to_string),
            ..BookingDto::default()
        }
    }

    #[test]
    fn urgency_rows_sort_filter_and_skip_invalid() {
        let now = Utc
            .with_ymd_and_hms(2024, 5, 1, 12, 0, 0)
            .single()
            .expect("valid now");
        let dtos = vec![
            booking("far", Some("2024-06-01")),
            booking("none", None),
            booking("soon", Some("2024-05-02")),
            booking("done", Some("2024-04-01")),
            booking("broken", Some("01/05/2024")),
        ];

        let rows = build_urgency_rows(&dtos, &now, &[], UrgencySort::Urgency);
        let ids: Vec<_> = rows.iter().filter_map(|r| r.id.as_deref()).collect();
        assert_eq!(ids, vec!["soon", "far", "done", "none"]);
        assert_eq!(rows[0].urgency.tier, Tier::Critical);
        assert_eq!(rows[0].urgency.remaining_label, "12h");

        let rows = build_urgency_rows(&dtos, &now, &[], UrgencySort::Date);
        let ids: Vec<_> = rows.iter().filter_map(|r| r.id.as_deref()).collect();
        assert_eq!(ids, vec!["done", "soon", "far", "none"]);

        let rows = build_urgency_rows(&dtos, &now, &[Tier::Future, Tier::Unknown], UrgencySort::None);
        let ids: Vec<_> = rows.iter().filter_map(|r| r.id.as_deref()).collect();
        assert_eq!(ids, vec!["far", "none"]);
    }

    #[test]
    fn calendar_command_writes_json_view() {
        let dir = tempdir().expect("tempdir");
        let snapshot = dir.path().join("availability.json");
        fs::write(
            &snapshot,
            r#"{"data":[{"date":"2024-02-29","reason":"maintenance","notes":"boiler"}]}"#,
        )
        .expect("write snapshot");

        let args = CalendarArgs {
            availability: snapshot,
            month: Some("2024-03".to_string()),
            shift: -1,
            today: Some("2024-02-10".to_string()),
            json: true,
        };
        let mut out = Vec::new();
        cmd_calendar(&mut out, &Renderer::plain(), chrono_tz::UTC, args).expect("calendar command");

        let view: serde_json::Value = serde_json::from_slice(&out).expect("json output");
        assert_eq!(view["month"], "2024-02");
        assert_eq!(view["month_index"], 1);
        // Feb 2024 starts on a Thursday: 4 blanks + 29 days.
        let cells = view["cells"].as_array().expect("cells array");
        assert_eq!(cells.len(), 33);
        assert_eq!(cells[0]["kind"], "blank");
        let last = &cells[32];
        assert_eq!(last["day"], 29);
        assert_eq!(last["status"], "maintenance");
        assert_eq!(last["notes"], "boiler");
        assert_eq!(view["summary"]["past"], 9);
    }

    #[test]
    fn calendar_command_reports_bad_rows() {
        let dir = tempdir().expect("tempdir");
        let snapshot = dir.path().join("availability.json");
        fs::write(&snapshot, r#"[{"date":"2024-02-30","reason":"booking"}]"#).expect("write snapshot");

        let args = CalendarArgs {
            availability: snapshot,
            month: Some("2024-02".to_string()),
            shift: 0,
            today: None,
            json: false,
        };
        let mut out = Vec::new();
        let err = cmd_calendar(&mut out, &Renderer::plain(), chrono_tz::UTC, args).expect_err("invalid date");
        assert!(format!("{err:#}").contains("availability row 0"));
    }
}
