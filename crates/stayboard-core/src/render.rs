use std::io::{self, IsTerminal, Write};

use chrono::NaiveDate;
use unicode_width::UnicodeWidthStr;

use crate::calendar::{CalendarCell, CellStatus, MonthSummary, weekday_labels};
use crate::commands::UrgencyRow;
use crate::config::Config;
use crate::urgency::Tier;

const CELL_WIDTH: usize = 5;

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
    legend: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            color: cfg.color_enabled()? && io::stdout().is_terminal(),
            legend: cfg.show_legend()?,
        })
    }

    pub fn plain() -> Self {
        Self {
            color: false,
            legend: true,
        }
    }

    #[tracing::instrument(skip(self, out, cells, summary))]
    pub fn print_month_grid<W: Write>(
        &self,
        out: &mut W,
        first: NaiveDate,
        cells: &[CalendarCell],
        summary: &MonthSummary,
    ) -> anyhow::Result<()> {
        writeln!(out, "{}", first.format("%B %Y"))?;

        for label in weekday_labels() {
            write!(out, "{label:<width$}", width = CELL_WIDTH)?;
        }
        writeln!(out)?;

        for week in cells.chunks(7) {
            for cell in week {
                let text = match cell {
                    CalendarCell::Blank => String::new(),
                    CalendarCell::Day(day) => {
                        let mut text = format!("{:>2}{}", day.day, badge_marker(day.status));
                        if day.is_today {
                            text.push('*');
                        }
                        let text = self.paint(&text, badge_color(day.status));
                        if day.is_today {
                            self.paint(&text, "1")
                        } else {
                            text
                        }
                    }
                };
                let visible = UnicodeWidthStr::width(strip_ansi(&text).as_str());
                write!(out, "{}{}", text, " ".repeat(CELL_WIDTH.saturating_sub(visible)))?;
            }
            writeln!(out)?;
        }

        if self.legend {
            writeln!(out)?;
            let entries = [
                (CellStatus::Available, summary.available),
                (CellStatus::Booking, summary.booked),
                (CellStatus::Maintenance, summary.maintenance),
                (CellStatus::OwnerBlocked, summary.blocked),
                (CellStatus::Unavailable, summary.unavailable),
                (CellStatus::Past, summary.past),
            ];
            let parts = entries
                .iter()
                .map(|(status, count)| {
                    let label = if *status == CellStatus::OwnerBlocked {
                        "Blocked"
                    } else {
                        status.label()
                    };
                    let marker = match badge_marker(*status) {
                        ' ' => "  ".to_string(),
                        m => format!("{m} "),
                    };
                    format!("{}{label}: {count}", self.paint(&marker, badge_color(*status)))
                })
                .collect::<Vec<_>>()
                .join("  ");
            writeln!(out, "{parts}")?;
            writeln!(out, "* today")?;
        }

        Ok(())
    }

    #[tracing::instrument(skip(self, out, rows))]
    pub fn print_urgency_table<W: Write>(&self, out: &mut W, rows: &[UrgencyRow]) -> anyhow::Result<()> {
        let headers = vec![
            "ID".to_string(),
            "Guest".to_string(),
            "Property".to_string(),
            "Kind".to_string(),
            "Event".to_string(),
            "Left".to_string(),
            "Tier".to_string(),
        ];

        let table_rows = rows
            .iter()
            .map(|row| {
                let code = tier_color(row.urgency.tier);
                vec![
                    row.id.clone().unwrap_or_else(|| "-".to_string()),
                    row.guest.clone().unwrap_or_default(),
                    row.property.clone().unwrap_or_default(),
                    row.kind.to_string(),
                    row.event_local
                        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
                        .unwrap_or_else(|| "-".to_string()),
                    self.paint(&row.urgency.remaining_label, code),
                    self.paint(row.urgency.tier.as_key(), code),
                ]
            })
            .collect();

        write_table(out, headers, table_rows)?;
        Ok(())
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn badge_marker(status: CellStatus) -> char {
    match status {
        CellStatus::Available => ' ',
        CellStatus::Booking => 'B',
        CellStatus::Maintenance => 'M',
        CellStatus::OwnerBlocked | CellStatus::AdminBlocked => 'X',
        CellStatus::Unavailable => 'U',
        CellStatus::Past => '-',
    }
}

fn badge_color(status: CellStatus) -> &'static str {
    match status {
        CellStatus::Available => "32",
        CellStatus::Booking => "31",
        CellStatus::Maintenance => "33",
        CellStatus::OwnerBlocked => "35",
        CellStatus::AdminBlocked => "34",
        CellStatus::Unavailable => "37",
        CellStatus::Past => "90",
    }
}

fn tier_color(tier: Tier) -> &'static str {
    match tier {
        Tier::Critical => "31",
        Tier::Warning => "33",
        Tier::Future => "32",
        Tier::Past | Tier::Unknown => "90",
    }
}

fn write_table<W: Write>(
    writer: &mut W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for (header, width) in headers.iter().zip(widths.iter().copied()) {
        write!(writer, "{header:width$} ")?;
    }
    writeln!(writer)?;

    for &width in &widths {
        write!(writer, "{:-<width$} ", "")?;
    }
    writeln!(writer)?;

    for row in rows {
        for (cell, width) in row.iter().zip(widths.iter().copied()) {
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = width.saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}
