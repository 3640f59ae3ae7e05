use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::event::Event;

/// JSON-lines event store, one `Event` per line in `events.data`.
///
/// This is the `fetch_events(start, end)` collaborator of the grid:
/// the month view asks it for every event overlapping the visible
/// window and never touches storage otherwise.
#[derive(Debug)]
pub struct EventStore {
    pub data_dir: PathBuf,
    pub events_path: PathBuf,
}

impl EventStore {
    #[tracing::instrument(skip(data_dir))]
    pub fn open(data_dir: &Path) -> anyhow::Result<Self> {
        let data_dir = data_dir.to_path_buf();
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create {}", data_dir.display()))?;

        let events_path = data_dir.join("events.data");
        if !events_path.exists() {
            fs::write(&events_path, "")?;
        }

        info!(
            data_dir = %data_dir.display(),
            events = %events_path.display(),
            "opened event store"
        );

        Ok(Self {
            data_dir,
            events_path,
        })
    }

    #[tracing::instrument(skip(self))]
    pub fn load_events(&self) -> anyhow::Result<Vec<Event>> {
        load_jsonl(&self.events_path).context("failed to load events.data")
    }

    /// Events overlapping the half-open instant range, sorted by
    /// start time. Overlap means `start_ts <= range_end` and
    /// `end_ts >= range_start`, so multi-day events whose edges cross
    /// the window are included.
    #[tracing::instrument(skip(self))]
    pub fn events_between(&self, range_start: i64, range_end: i64) -> anyhow::Result<Vec<Event>> {
        let mut events: Vec<Event> = self
            .load_events()?
            .into_iter()
            .filter(|e| e.start_ts <= range_end && e.end_ts >= range_start)
            .collect();
        events.sort_by_key(|e| (e.start_ts, e.end_ts));
        debug!(count = events.len(), "events in range");
        Ok(events)
    }

    #[tracing::instrument(skip(self, events))]
    pub fn save_events(&self, events: &[Event]) -> anyhow::Result<()> {
        save_jsonl_atomic(&self.events_path, events).context("failed to save events.data")
    }

    #[tracing::instrument(skip(self, event), fields(title = %event.title))]
    pub fn add_event(&self, mut event: Event) -> anyhow::Result<Event> {
        let mut events = self.load_events()?;
        event.id = Some(next_id(&events));
        events.push(event.clone());
        events.sort_by_key(|e| (e.start_ts, e.end_ts));
        self.save_events(&events)?;
        Ok(event)
    }
}

fn next_id(events: &[Event]) -> i64 {
    events.iter().filter_map(|e| e.id).max().unwrap_or(0) + 1
}

#[tracing::instrument(skip(path))]
fn load_jsonl(path: &Path) -> anyhow::Result<Vec<Event>> {
    debug!(file = %path.display(), "loading jsonl");
    let file = fs::File::open(path)?;
    let reader = BufReader::new(file);

    let mut out = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let event: Event = serde_json::from_str(trimmed)
            .with_context(|| format!("failed parsing {} line {}", path.display(), idx + 1))?;
        out.push(event);
    }

    debug!(count = out.len(), "loaded events from jsonl");
    Ok(out)
}

#[tracing::instrument(skip(path, events))]
fn save_jsonl_atomic(path: &Path, events: &[Event]) -> anyhow::Result<()> {
    debug!(file = %path.display(), count = events.len(), "saving jsonl atomically");

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut temp = NamedTempFile::new_in(dir)?;
    for event in events {
        let serialized = serde_json::to_string(event)?;
        writeln!(temp, "{serialized}")?;
    }
    temp.flush()?;

    temp.persist(path)
        .map_err(|err| anyhow!("failed to persist {}: {}", path.display(), err))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn event(title: &str, start_ts: i64, end_ts: i64) -> Event {
        Event::new(title.to_string(), start_ts, end_ts, 0)
    }

    #[test]
    fn open_creates_the_events_file() {
        let temp = tempdir().expect("tempdir");
        let store = EventStore::open(temp.path()).expect("open store");
        assert!(store.events_path.exists());
        assert!(store.load_events().expect("load").is_empty());
    }

    #[test]
    fn add_assigns_increasing_ids_and_persists() {
        let temp = tempdir().expect("tempdir");
        let store = EventStore::open(temp.path()).expect("open store");

        let first = store.add_event(event("First", 100, 200)).expect("add");
        let second = store.add_event(event("Second", 300, 400)).expect("add");
        assert_eq!(first.id, Some(1));
        assert_eq!(second.id, Some(2));

        let reopened = EventStore::open(temp.path()).expect("reopen");
        let events = reopened.load_events().expect("load");
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].title, "First");
    }

    #[test]
    fn events_between_keeps_overlapping_edges() {
        let temp = tempdir().expect("tempdir");
        let store = EventStore::open(temp.path()).expect("open store");
        store.add_event(event("Before", 0, 99)).expect("add");
        store.add_event(event("CrossesStart", 50, 150)).expect("add");
        store.add_event(event("Inside", 120, 180)).expect("add");
        store.add_event(event("CrossesEnd", 180, 400)).expect("add");
        store.add_event(event("After", 500, 600)).expect("add");

        let hits = store.events_between(100, 200).expect("query");
        let titles: Vec<&str> = hits.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["CrossesStart", "Inside", "CrossesEnd"]);
    }

    #[test]
    fn blank_lines_are_ignored() {
        let temp = tempdir().expect("tempdir");
        let store = EventStore::open(temp.path()).expect("open store");
        store.add_event(event("Kept", 1, 2)).expect("add");

        let mut raw = fs::read_to_string(&store.events_path).expect("read");
        raw.push_str("\n\n");
        fs::write(&store.events_path, raw).expect("write");

        assert_eq!(store.load_events().expect("load").len(), 1);
    }
}
