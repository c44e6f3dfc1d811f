use std::fs;
use std::path::PathBuf;

use chrono::{
  DateTime,
  Duration,
  LocalResult,
  NaiveDate,
  NaiveDateTime,
  NaiveTime,
  TimeZone,
  Utc
};
use chrono_tz::Tz;
use regex::Regex;
use serde::Deserialize;

use crate::error::{
  CoreError,
  CoreResult
};

const TIMEZONE_CONFIG_FILE: &str =
  "stayboard-time.toml";
const TIMEZONE_ENV_VAR: &str =
  "STAYBOARD_TIMEZONE";
const TIMEZONE_CONFIG_ENV_VAR: &str =
  "STAYBOARD_TIME_CONFIG";
const DEFAULT_PROJECT_TIMEZONE: &str =
  "UTC";

#[derive(Debug, Deserialize)]
struct TimezoneConfig {
  timezone: Option<String>,
  time:     Option<TimezoneSection>
}

#[derive(Debug, Deserialize)]
struct TimezoneSection {
  timezone: Option<String>
}

/// Picks the dashboard timezone: an explicit rc value first, then
/// `STAYBOARD_TIMEZONE`, then `stayboard-time.toml`, then UTC.
pub fn resolve_timezone(
  configured: Option<&str>
) -> Tz {
  if let Some(raw) = configured
    && let Some(tz) =
      parse_timezone(raw, "rc:timezone")
  {
    return tz;
  }

  if let Ok(raw) =
    std::env::var(TIMEZONE_ENV_VAR)
    && let Some(tz) = parse_timezone(
      &raw,
      TIMEZONE_ENV_VAR
    )
  {
    return tz;
  }

  if let Some(path) =
    timezone_config_path()
    && let Some(tz) =
      load_timezone_from_file(&path)
  {
    return tz;
  }

  parse_timezone(
    DEFAULT_PROJECT_TIMEZONE,
    "DEFAULT_PROJECT_TIMEZONE"
  )
  .unwrap_or(chrono_tz::UTC)
}

#[must_use]
pub fn to_project_date(
  dt: DateTime<Utc>,
  tz: Tz
) -> NaiveDate {
  dt.with_timezone(&tz).date_naive()
}

fn timezone_config_path()
-> Option<PathBuf> {
  if let Ok(raw) = std::env::var(
    TIMEZONE_CONFIG_ENV_VAR
  ) {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
      return Some(PathBuf::from(
        trimmed
      ));
    }
  }

  std::env::current_dir().ok().map(
    |dir| {
      dir.join(TIMEZONE_CONFIG_FILE)
    }
  )
}

fn load_timezone_from_file(
  path: &PathBuf
) -> Option<Tz> {
  if !path.exists() {
    tracing::debug!(
      file = %path.display(),
      "timezone config file not found"
    );
    return None;
  }

  let raw = match fs::read_to_string(
    path
  ) {
    | Ok(raw) => raw,
    | Err(err) => {
      tracing::error!(
        file = %path.display(),
        error = %err,
        "failed reading timezone config file"
      );
      return None;
    }
  };

  let parsed = match toml::from_str::<
    TimezoneConfig
  >(&raw)
  {
    | Ok(parsed) => parsed,
    | Err(err) => {
      tracing::error!(
        file = %path.display(),
        error = %err,
        "failed parsing timezone config file"
      );
      return None;
    }
  };

  let timezone =
    parsed.timezone.or_else(|| {
      parsed.time.and_then(|section| {
        section.timezone
      })
    });
  let Some(timezone) = timezone else {
    tracing::warn!(
      file = %path.display(),
      "timezone config had no timezone field"
    );
    return None;
  };

  parse_timezone(
    timezone.as_str(),
    &format!("file:{}", path.display())
  )
}

fn parse_timezone(
  raw: &str,
  source: &str
) -> Option<Tz> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    tracing::warn!(
      source,
      "timezone source was empty"
    );
    return None;
  }

  match trimmed.parse::<Tz>() {
    | Ok(tz) => {
      tracing::info!(
        source,
        timezone = %trimmed,
        "configured project timezone"
      );
      Some(tz)
    }
    | Err(err) => {
      tracing::error!(
        source,
        timezone = %trimmed,
        error = %err,
        "failed to parse timezone id"
      );
      None
    }
  }
}

/// Maps a wall-clock time onto `tz`.
///
/// Ambiguous times (clocks going back) resolve to the earliest instant.
/// Times inside a spring-forward gap are pushed one hour later.
pub fn resolve_local<Z: TimeZone>(
  tz: &Z,
  local_naive: NaiveDateTime
) -> DateTime<Z> {
  match tz.from_local_datetime(
    &local_naive
  ) {
    | LocalResult::Single(dt) => dt,
    | LocalResult::Ambiguous(
      first,
      second
    ) => {
      if first <= second {
        first
      } else {
        second
      }
    }
    | LocalResult::None => {
      let shifted =
        local_naive + Duration::hours(1);
      tz.from_local_datetime(&shifted)
        .earliest()
        .unwrap_or_else(|| {
          tz.from_utc_datetime(
            &local_naive
          )
        })
    }
  }
}

/// Accepts `YYYY-MM-DD`, or an ISO timestamp whose date part is used as is.
pub fn parse_calendar_date(
  raw: &str
) -> CoreResult<NaiveDate> {
  let token = raw.trim();
  let date_part = match token
    .char_indices()
    .nth(10)
  {
    | Some((idx, 'T' | 't' | ' ')) => {
      &token[..idx]
    }
    | _ => token
  };

  NaiveDate::parse_from_str(
    date_part, "%Y-%m-%d"
  )
  .map_err(|err| {
    CoreError::invalid(format!(
      "invalid calendar date \
       {raw:?}: {err}"
    ))
  })
}

/// Accepts `HH:MM`, `HH:MM:SS` and 12-hour `h:MM am/pm`.
pub fn parse_time_of_day(
  raw: &str
) -> CoreResult<NaiveTime> {
  let (hour, minute, second) =
    parse_clock_time(raw).ok_or_else(
      || {
        CoreError::invalid(format!(
          "invalid time of day {raw:?}"
        ))
      }
    )?;

  NaiveTime::from_hms_opt(
    hour, minute, second
  )
  .ok_or_else(|| {
    CoreError::invalid(format!(
      "time of day out of range \
       {raw:?}"
    ))
  })
}

/// Parses `YYYY-MM` into a year and a zero-based month index.
pub fn parse_year_month(
  raw: &str
) -> CoreResult<(i32, u32)> {
  let token = raw.trim();
  let (year, month) = token
    .split_once('-')
    .ok_or_else(|| {
      CoreError::invalid(format!(
        "expected YYYY-MM, got \
         {raw:?}"
      ))
    })?;

  let year: i32 =
    year.parse().map_err(|_| {
      CoreError::invalid(format!(
        "invalid year in {raw:?}"
      ))
    })?;
  let month: u32 =
    month.parse().map_err(|_| {
      CoreError::invalid(format!(
        "invalid month in {raw:?}"
      ))
    })?;

  if !(1..=12).contains(&month) {
    return Err(CoreError::invalid(
      format!(
        "month must be 01-12, got \
         {month}"
      )
    ));
  }

  Ok((year, month - 1))
}

/// Parses a reference instant: RFC3339, or a local `YYYY-MM-DDTHH:MM`
/// / `YYYY-MM-DD HH:MM` read in `tz`.
pub fn parse_instant(
  raw: &str,
  tz: Tz
) -> CoreResult<DateTime<Tz>> {
  let token = raw.trim();

  if let Ok(dt) =
    DateTime::parse_from_rfc3339(token)
  {
    return Ok(dt.with_timezone(&tz));
  }

  for fmt in
    ["%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"]
  {
    if let Ok(ndt) =
      NaiveDateTime::parse_from_str(
        token, fmt
      )
    {
      return Ok(resolve_local(
        &tz, ndt
      ));
    }
  }

  Err(CoreError::invalid(format!(
    "unrecognized instant {raw:?}; \
     expected RFC3339 or \
     YYYY-MM-DDTHH:MM"
  )))
}

fn parse_clock_time(
  token: &str
) -> Option<(u32, u32, u32)> {
  let clock_re = Regex::new(
    r"(?i)^(?P<hour>\d{1,2}):(?P<minute>\d{2})(?::(?P<second>\d{2}))?\s*(?P<ampm>[ap]m)?$",
  )
  .ok()?;
  let captures =
    clock_re.captures(token.trim())?;

  let raw_hour = captures
    .name("hour")?
    .as_str()
    .parse::<u32>()
    .ok()?;
  let minute = captures
    .name("minute")?
    .as_str()
    .parse::<u32>()
    .ok()?;
  let second = match captures
    .name("second")
  {
    | Some(m) => {
      m.as_str().parse::<u32>().ok()?
    }
    | None => 0
  };
  if minute > 59 || second > 59 {
    return None;
  }

  let hour = if let Some(ampm_match) =
    captures.name("ampm")
  {
    let ampm = ampm_match
      .as_str()
      .to_ascii_lowercase();
    if raw_hour == 0 || raw_hour > 12 {
      return None;
    }
    match ampm.as_str() {
      | "am" => {
        if raw_hour == 12 {
          0
        } else {
          raw_hour
        }
      }
      | "pm" => {
        if raw_hour == 12 {
          12
        } else {
          raw_hour + 12
        }
      }
      | _ => return None
    }
  } else {
    if raw_hour > 23 {
      return None;
    }
    raw_hour
  };

  Some((hour, minute, second))
}
