use chrono::Utc;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::daycode::{DayCode, day_code_from_epoch_seconds};

pub const DEFAULT_EVENT_COLOR: u32 = 0x5C6B_C0;

/// A calendar event with already-resolved occurrence times.
///
/// Start and end are epoch seconds interpreted in the working
/// timezone. Repeat fields are carried metadata only: the grid never
/// expands recurrence, it expects the caller to have materialized
/// every occurrence in the queried range as its own `Event`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    #[serde(default)]
    pub id: Option<i64>,

    pub title: String,

    pub start_ts: i64,

    pub end_ts: i64,

    #[serde(default)]
    pub color: u32,

    #[serde(default)]
    pub repeat_interval: i64,

    #[serde(default)]
    pub repeat_limit: i64,

    #[serde(default)]
    pub repeat_rule: i32,

    #[serde(default)]
    pub import_id: String,
}

impl Event {
    pub fn new(title: String, start_ts: i64, end_ts: i64, color: u32) -> Self {
        Self {
            id: None,
            title,
            start_ts,
            end_ts,
            color,
            repeat_interval: 0,
            repeat_limit: 0,
            repeat_rule: 0,
            import_id: generate_import_id(),
        }
    }

    pub fn start_day_code(&self, tz: Tz) -> DayCode {
        day_code_from_epoch_seconds(self.start_ts, tz)
    }

    pub fn end_day_code(&self, tz: Tz) -> DayCode {
        day_code_from_epoch_seconds(self.end_ts, tz)
    }
}

/// Unique import identifier: a dashless v4 uuid suffixed with the
/// current epoch milliseconds.
pub fn generate_import_id() -> String {
    format!(
        "{}{}",
        Uuid::new_v4().simple(),
        Utc::now().timestamp_millis()
    )
}
