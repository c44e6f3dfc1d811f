pub mod availability;
pub mod booking;
pub mod calendar;
pub mod cli;
pub mod commands;
pub mod config;
pub mod datetime;
pub mod error;
pub mod render;
pub mod urgency;

use std::ffi::OsString;

use clap::Parser;
use tracing::{
  debug,
  info
};

pub use availability::{
  AvailabilityReason,
  AvailabilityRecord
};
pub use booking::{
  BookingEvent,
  BookingKind
};
pub use calendar::{
  CalendarCell,
  CellStatus,
  DayCell,
  build_month_grid
};
pub use error::CoreError;
pub use urgency::{
  Tier,
  Urgency,
  classify_urgency
};

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let pre =
    cli::preprocess_args(&raw_args)?;
  let cli = cli::GlobalCli::parse_from(
    pre.cleaned_args
  );

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting stayboard"
  );
  debug!(?pre.rc_overrides, "preprocessed rc overrides");

  let mut cfg = config::Config::load(
    cli.stayboardrc.as_deref()
  )?;
  cfg.apply_overrides(
    pre.rc_overrides.into_iter().chain(
      cli
        .rc_overrides
        .into_iter()
        .map(|kv| (kv.key, kv.value))
    )
  );

  let renderer =
    render::Renderer::new(&cfg)?;

  commands::dispatch(
    &cfg,
    &renderer,
    cli.command
  )?;

  info!("done");
  Ok(())
}
