use chrono::NaiveDate;
use kalends_core::event::Event;
use kalends_core::grid;
use kalends_core::store::EventStore;
use tempfile::tempdir;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

#[test]
fn store_fetch_build_attach_round_trip() {
    let temp = tempdir().expect("tempdir");
    let store = EventStore::open(temp.path()).expect("open event store");

    // 2024-03-05 09:00..10:00 UTC, a three-day offsite starting the
    // same day, and one event far outside the March window.
    store
        .add_event(Event::new(
            "Dentist".to_string(),
            1_709_629_200,
            1_709_632_800,
            0xFF_0000,
        ))
        .expect("add dentist");
    store
        .add_event(Event::new(
            "Offsite".to_string(),
            1_709_596_800,
            1_709_812_800,
            0x00_FF00,
        ))
        .expect("add offsite");
    store
        .add_event(Event::new(
            "New year".to_string(),
            1_735_689_600,
            1_735_693_200,
            0,
        ))
        .expect("add new year");

    let target = date(2024, 3, 1);
    let today = date(2024, 3, 15);

    let (start_ts, end_ts) = grid::fetch_range(target, chrono_tz::UTC);
    let events = store.events_between(start_ts, end_ts).expect("fetch window");
    let titles: Vec<&str> = events.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, vec!["Offsite", "Dentist"]);

    let skeleton = grid::build_skeleton(target, today);
    assert_eq!(skeleton.len(), grid::DAYS_CNT);
    assert!(skeleton.iter().all(|d| d.events.is_empty()));

    let days = grid::attach_events(&skeleton, &events, chrono_tz::UTC);

    let march_5 = days
        .iter()
        .find(|d| d.code.as_str() == "20240305")
        .expect("march 5 cell");
    let titles: Vec<&str> = march_5.events.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, vec!["Offsite", "Dentist"]);

    for code in ["20240306", "20240307"] {
        let day = days
            .iter()
            .find(|d| d.code.as_str() == code)
            .expect("offsite cell");
        let titles: Vec<&str> = day.events.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Offsite"], "cell {code}");
    }

    let busy = days.iter().filter(|d| !d.events.is_empty()).count();
    assert_eq!(busy, 3);

    let todays: Vec<_> = days.iter().filter(|d| d.is_today).collect();
    assert_eq!(todays.len(), 1);
    assert_eq!(todays[0].code.as_str(), "20240315");

    assert_eq!(grid::month_label(target, today), "March");
}

#[test]
fn reopened_store_feeds_an_identical_grid() {
    let temp = tempdir().expect("tempdir");
    let target = date(2024, 3, 1);
    let today = date(2024, 3, 15);

    {
        let store = EventStore::open(temp.path()).expect("open event store");
        store
            .add_event(Event::new(
                "Persisted".to_string(),
                1_709_596_800,
                1_709_596_800,
                0,
            ))
            .expect("add");
    }

    let store = EventStore::open(temp.path()).expect("reopen event store");
    let (start_ts, end_ts) = grid::fetch_range(target, chrono_tz::UTC);
    let events = store.events_between(start_ts, end_ts).expect("fetch window");
    assert_eq!(events.len(), 1);

    let first = grid::attach_events(&grid::build_skeleton(target, today), &events, chrono_tz::UTC);
    let second = grid::attach_events(&grid::build_skeleton(target, today), &events, chrono_tz::UTC);
    assert_eq!(first, second);

    let busy: Vec<&str> = first
        .iter()
        .filter(|d| !d.events.is_empty())
        .map(|d| d.code.as_str())
        .collect();
    assert_eq!(busy, vec!["20240305"]);
}
