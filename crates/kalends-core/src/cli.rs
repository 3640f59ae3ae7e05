use std::ffi::OsString;
use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::{ArgAction, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
pub struct PreprocessedArgs {
    pub cleaned_args: Vec<OsString>,
    pub rc_overrides: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct KeyVal {
    pub key: String,
    pub value: String,
}

impl std::str::FromStr for KeyVal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (k, v) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got: {s}"))?;
        Ok(Self {
            key: k.trim().to_string(),
            value: v.trim().to_string(),
        })
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "kalends",
    version,
    about = "Month-grid calendar for the terminal",
    disable_help_subcommand = true
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count)]
    pub quiet: u8,

    #[arg(
        long = "rc",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<KeyVal>()),
        action = ArgAction::Append
    )]
    pub rc_overrides: Vec<KeyVal>,

    #[arg(long = "rc-file")]
    pub rc_file: Option<PathBuf>,

    #[arg(long = "data")]
    pub data: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Show the month grid (the default command).
    Show {
        /// Month to show: today, next, prev, a month name, YYYY-MM.
        expr: Option<String>,

        /// Print the skeleton only, without loading events.
        #[arg(long)]
        bare: bool,

        /// Prefix each row with its ISO week number.
        #[arg(long)]
        weeks: bool,
    },

    /// Add an event to the store.
    Add {
        title: String,

        /// Start time: epoch seconds, RFC3339, YYYY-MM-DD [HH:MM].
        #[arg(long)]
        start: String,

        /// End time; defaults to the start time.
        #[arg(long)]
        end: Option<String>,

        /// Display color as a 24-bit RGB integer.
        #[arg(long)]
        color: Option<u32>,
    },

    /// List events overlapping a month's visible window.
    Events {
        /// Month expression, as for show.
        expr: Option<String>,
    },
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_level(true)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}

/// Pulls `rc.key=value` (or `rc.key:value`) overrides out of the raw
/// argument list before clap sees it.
#[tracing::instrument(skip_all)]
pub fn preprocess_args(raw: &[OsString]) -> anyhow::Result<PreprocessedArgs> {
    let mut cleaned = Vec::with_capacity(raw.len());
    let mut overrides: Vec<(String, String)> = Vec::new();

    let mut iter = raw.iter().cloned();
    if let Some(bin) = iter.next() {
        cleaned.push(bin);
    }

    for arg in iter {
        let s = arg.to_string_lossy();
        if let Some(rest) = s.strip_prefix("rc.") {
            let parsed = if let Some((k, v)) = rest.split_once('=') {
                Some((format!("rc.{k}"), v.to_string()))
            } else if let Some((k, v)) = rest.split_once(':') {
                Some((format!("rc.{k}"), v.to_string()))
            } else {
                None
            };

            if let Some((key, value)) = parsed {
                debug!(key = %key, value = %value, "extracted rc override");
                overrides.push((key, value));
                continue;
            }
        }
        cleaned.push(arg);
    }

    Ok(PreprocessedArgs {
        cleaned_args: cleaned,
        rc_overrides: overrides,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn os(args: &[&str]) -> Vec<OsString> {
        args.iter().map(OsString::from).collect()
    }

    #[test]
    fn keyval_parses_and_trims() {
        let kv: KeyVal = " color = off ".parse().expect("parse");
        assert_eq!(kv.key, "color");
        assert_eq!(kv.value, "off");
        assert!("no-equals".parse::<KeyVal>().is_err());
    }

    #[test]
    fn preprocess_extracts_rc_args() {
        let pre = preprocess_args(&os(&["kalends", "rc.color=off", "show", "rc.show.weeks:on"]))
            .expect("preprocess");
        assert_eq!(pre.cleaned_args, os(&["kalends", "show"]));
        assert_eq!(
            pre.rc_overrides,
            vec![
                ("rc.color".to_string(), "off".to_string()),
                ("rc.show.weeks".to_string(), "on".to_string()),
            ]
        );
    }

    #[test]
    fn bare_rc_token_is_left_alone() {
        let pre = preprocess_args(&os(&["kalends", "rc.dangling"])).expect("preprocess");
        assert_eq!(pre.cleaned_args, os(&["kalends", "rc.dangling"]));
        assert!(pre.rc_overrides.is_empty());
    }

    #[test]
    fn cli_parses_show_with_expr() {
        let cli = GlobalCli::parse_from(["kalends", "-v", "show", "2024-03", "--weeks"]);
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Some(Command::Show { expr, bare, weeks }) => {
                assert_eq!(expr.as_deref(), Some("2024-03"));
                assert!(!bare);
                assert!(weeks);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn cli_defaults_to_no_command() {
        let cli = GlobalCli::parse_from(["kalends"]);
        assert!(cli.command.is_none());
    }
}
