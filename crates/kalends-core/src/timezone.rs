//! Working-timezone resolution.
//!
//! Event timestamps are stored as epoch seconds and interpreted in a
//! single working timezone, resolved once per process: the
//! `KALENDS_TIMEZONE` env var wins, then a `kalends-time.toml` config
//! file, then the built-in default.

use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::Deserialize;

const TIMEZONE_CONFIG_FILE: &str = "kalends-time.toml";
const TIMEZONE_ENV_VAR: &str = "KALENDS_TIMEZONE";
const TIMEZONE_CONFIG_ENV_VAR: &str = "KALENDS_TIME_CONFIG";
const DEFAULT_WORKING_TIMEZONE: &str = "Europe/London";

#[derive(Debug, Deserialize)]
struct TimezoneConfig {
    timezone: Option<String>,
    time: Option<TimezoneSection>,
}

#[derive(Debug, Deserialize)]
struct TimezoneSection {
    timezone: Option<String>,
}

pub fn working_timezone() -> &'static Tz {
    static WORKING_TZ: OnceLock<Tz> = OnceLock::new();
    WORKING_TZ.get_or_init(resolve_working_timezone)
}

/// The calendar date of `now` in the given zone; callers capture this
/// once per grid build.
#[must_use]
pub fn today_in(tz: Tz, now: DateTime<Utc>) -> NaiveDate {
    now.with_timezone(&tz).date_naive()
}

fn resolve_working_timezone() -> Tz {
    if let Ok(raw) = std::env::var(TIMEZONE_ENV_VAR)
        && let Some(tz) = parse_timezone(&raw, TIMEZONE_ENV_VAR)
    {
        return tz;
    }

    if let Some(path) = timezone_config_path()
        && let Some(tz) = load_timezone_from_file(&path)
    {
        return tz;
    }

    parse_timezone(DEFAULT_WORKING_TIMEZONE, "DEFAULT_WORKING_TIMEZONE").unwrap_or_else(|| {
        tracing::error!("failed to parse fallback timezone; using UTC");
        chrono_tz::UTC
    })
}

fn timezone_config_path() -> Option<PathBuf> {
    if let Ok(raw) = std::env::var(TIMEZONE_CONFIG_ENV_VAR) {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }

    std::env::current_dir()
        .ok()
        .map(|dir| dir.join(TIMEZONE_CONFIG_FILE))
}

fn load_timezone_from_file(path: &PathBuf) -> Option<Tz> {
    if !path.exists() {
        tracing::debug!(file = %path.display(), "timezone config file not found");
        return None;
    }

    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) => {
            tracing::error!(
                file = %path.display(),
                error = %err,
                "failed reading timezone config file"
            );
            return None;
        }
    };

    let parsed = match toml::from_str::<TimezoneConfig>(&raw) {
        Ok(parsed) => parsed,
        Err(err) => {
            tracing::error!(
                file = %path.display(),
                error = %err,
                "failed parsing timezone config file"
            );
            return None;
        }
    };

    let timezone = parsed
        .timezone
        .or_else(|| parsed.time.and_then(|section| section.timezone));
    let Some(timezone) = timezone else {
        tracing::warn!(
            file = %path.display(),
            "timezone config had no timezone field"
        );
        return None;
    };

    parse_timezone(timezone.as_str(), &format!("file:{}", path.display()))
}

fn parse_timezone(raw: &str, source: &str) -> Option<Tz> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        tracing::warn!(source, "timezone source was empty");
        return None;
    }

    match trimmed.parse::<Tz>() {
        Ok(tz) => {
            tracing::info!(source, timezone = %trimmed, "configured working timezone");
            Some(tz)
        }
        Err(err) => {
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

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn today_follows_the_zone() {
        let now = Utc
            .with_ymd_and_hms(2024, 3, 5, 23, 30, 0)
            .single()
            .expect("valid now");
        assert_eq!(
            today_in(chrono_tz::UTC, now),
            NaiveDate::from_ymd_opt(2024, 3, 5).expect("valid date")
        );
        let kathmandu: Tz = "Asia/Kathmandu".parse().expect("known zone");
        assert_eq!(
            today_in(kathmandu, now),
            NaiveDate::from_ymd_opt(2024, 3, 6).expect("valid date")
        );
    }

    #[test]
    fn parse_timezone_accepts_known_ids() {
        assert_eq!(
            parse_timezone("Europe/London", "test"),
            Some(chrono_tz::Europe::London)
        );
        assert_eq!(parse_timezone("  ", "test"), None);
        assert_eq!(parse_timezone("Mars/Olympus", "test"), None);
    }
}
