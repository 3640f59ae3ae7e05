use std::io::{self, IsTerminal, Write};

use anyhow::anyhow;
use chrono_tz::Tz;
use unicode_width::UnicodeWidthStr;

use crate::config::Config;
use crate::daycode::date_from_epoch_seconds;
use crate::event::Event;
use crate::grid::{COLUMN_COUNT, MonthDay, ROW_COUNT};

const WEEKDAY_HEADER: &str = "Mo Tu We Th Fr Sa Su";

/// Terminal output for the month view. Callers hand it a finished
/// grid; it never computes calendar data itself.
#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color_cfg = cfg.get("color").unwrap_or_else(|| "on".to_string());
        let color = match color_cfg.to_ascii_lowercase().as_str() {
            "on" | "yes" | "true" | "1" => true,
            "off" | "no" | "false" | "0" => false,
            other => return Err(anyhow!("invalid color setting: {other}")),
        };

        Ok(Self { color })
    }

    /// Prints the 6x7 grid. `has_events` marks whether the grid has
    /// been through the event-attachment pass; a bare skeleton is
    /// printed without event markers.
    #[tracing::instrument(skip(self, days))]
    pub fn print_month(
        &mut self,
        label: &str,
        days: &[MonthDay],
        has_events: bool,
        show_weeks: bool,
    ) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        let indent = if show_weeks { "   " } else { "" };
        writeln!(out, "{indent}{label}")?;
        writeln!(out, "{indent}{WEEKDAY_HEADER}")?;

        for row in 0..ROW_COUNT {
            let mut line = String::new();
            if show_weeks {
                let week = days[row * COLUMN_COUNT].week_of_year;
                line.push_str(&self.paint(&format!("{week:>2}"), "36"));
                line.push(' ');
            }

            for col in 0..COLUMN_COUNT {
                let day = &days[row * COLUMN_COUNT + col];
                let cell = format!("{:>2}", day.value);

                let cell = if day.is_today {
                    self.paint(&cell, "7")
                } else if !day.is_this_month {
                    self.paint(&cell, "2")
                } else {
                    cell
                };

                line.push_str(&cell);
                let marker = if has_events && !day.events.is_empty() {
                    '.'
                } else {
                    ' '
                };
                line.push(marker);
            }

            writeln!(out, "{}", line.trim_end())?;
        }

        Ok(())
    }

    /// Lists the events attached to the grid, one row per occurrence
    /// per day, in grid order.
    #[tracing::instrument(skip(self, days))]
    pub fn print_day_events(&mut self, days: &[MonthDay]) -> anyhow::Result<()> {
        let mut rows = Vec::new();
        for day in days {
            for event in &day.events {
                let date = day.code.to_date().format("%Y-%m-%d").to_string();
                let date = if day.is_today {
                    self.paint(&date, "33")
                } else {
                    date
                };
                rows.push(vec![date, event.title.clone()]);
            }
        }

        if rows.is_empty() {
            return Ok(());
        }

        let mut out = io::stdout().lock();
        writeln!(out)?;
        write_table(&mut out, &["Date", "Event"], rows)?;
        Ok(())
    }

    /// Flat event listing for `kalends events`.
    #[tracing::instrument(skip(self, events))]
    pub fn print_event_list(&mut self, events: &[Event], tz: Tz) -> anyhow::Result<()> {
        let mut rows = Vec::with_capacity(events.len());
        for event in events {
            let id = event
                .id
                .map(|value| value.to_string())
                .unwrap_or_else(|| "-".to_string());
            let start = date_from_epoch_seconds(event.start_ts, tz)
                .format("%Y-%m-%d %H:%M")
                .to_string();
            let end = date_from_epoch_seconds(event.end_ts, tz)
                .format("%Y-%m-%d %H:%M")
                .to_string();
            rows.push(vec![self.paint(&id, "33"), start, end, event.title.clone()]);
        }

        let mut out = io::stdout().lock();
        write_table(&mut out, &["ID", "Start", "End", "Event"], rows)?;
        Ok(())
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color || !io::stdout().is_terminal() {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn write_table<W: Write>(
    mut writer: W,
    headers: &[&str],
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths: Vec<usize> = headers
        .iter()
        .map(|header| UnicodeWidthStr::width(*header))
        .collect();

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for idx in 0..column_count {
        write!(writer, "{:width$} ", headers[idx], width = widths[idx])?;
    }
    writeln!(writer)?;

    for &width in widths.iter().take(column_count) {
        write!(writer, "{:-<width$} ", "")?;
    }
    writeln!(writer)?;

    for row in rows {
        for idx in 0..column_count {
            let cell = &row[idx];
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
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
