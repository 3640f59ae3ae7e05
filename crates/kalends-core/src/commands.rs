use anyhow::anyhow;
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use tracing::{debug, info};

use crate::cli::Command;
use crate::config::Config;
use crate::event::Event;
use crate::grid;
use crate::monthexpr;
use crate::render::Renderer;
use crate::store::EventStore;
use crate::timezone;

/// Runs one command. "Now" is captured here, once, so everything
/// downstream (today-detection, month resolution) sees a single
/// consistent instant.
#[tracing::instrument(skip_all, fields(command = ?std::mem::discriminant(&command)))]
pub fn dispatch(
    store: &EventStore,
    cfg: &Config,
    renderer: &mut Renderer,
    command: Command,
) -> anyhow::Result<()> {
    let tz = *timezone::working_timezone();
    let today = timezone::today_in(tz, Utc::now());

    match command {
        Command::Show { expr, bare, weeks } => {
            show_month(store, cfg, renderer, expr.as_deref(), bare, weeks, tz, today)
        }
        Command::Add {
            title,
            start,
            end,
            color,
        } => add_event(store, title, &start, end.as_deref(), color, tz),
        Command::Events { expr } => list_events(store, renderer, expr.as_deref(), tz, today),
    }
}

#[allow(clippy::too_many_arguments)]
fn show_month(
    store: &EventStore,
    cfg: &Config,
    renderer: &mut Renderer,
    expr: Option<&str>,
    bare: bool,
    weeks: bool,
    tz: Tz,
    today: NaiveDate,
) -> anyhow::Result<()> {
    let target = monthexpr::parse_month_expr(expr.unwrap_or("today"), today)?;
    let label = grid::month_label(target, today);
    let skeleton = grid::build_skeleton(target, today);
    let show_weeks = weeks || cfg.get_bool("show.weeks").unwrap_or(false);

    if bare {
        info!(%label, "rendering skeleton without event data");
        return renderer.print_month(&label, &skeleton, false, show_weeks);
    }

    let (start_ts, end_ts) = grid::fetch_range(target, tz);
    let events = store.events_between(start_ts, end_ts)?;
    debug!(
        count = events.len(),
        start_ts, end_ts, "fetched events for the visible window"
    );

    let days = grid::attach_events(&skeleton, &events, tz);
    renderer.print_month(&label, &days, true, show_weeks)?;
    renderer.print_day_events(&days)?;
    Ok(())
}

fn add_event(
    store: &EventStore,
    title: String,
    start: &str,
    end: Option<&str>,
    color: Option<u32>,
    tz: Tz,
) -> anyhow::Result<()> {
    let start_ts = monthexpr::parse_event_time(start, tz)?;
    let end_ts = match end {
        Some(raw) => monthexpr::parse_event_time(raw, tz)?,
        None => start_ts,
    };
    if end_ts < start_ts {
        return Err(anyhow!(
            "event end {end_ts} precedes start {start_ts}"
        ));
    }

    let color = color.unwrap_or(crate::event::DEFAULT_EVENT_COLOR);
    let event = store.add_event(Event::new(title, start_ts, end_ts, color))?;
    info!(id = ?event.id, title = %event.title, "added event");
    Ok(())
}

fn list_events(
    store: &EventStore,
    renderer: &mut Renderer,
    expr: Option<&str>,
    tz: Tz,
    today: NaiveDate,
) -> anyhow::Result<()> {
    let target = monthexpr::parse_month_expr(expr.unwrap_or("today"), today)?;
    let (start_ts, end_ts) = grid::fetch_range(target, tz);
    let events = store.events_between(start_ts, end_ts)?;
    renderer.print_event_list(&events, tz)
}
