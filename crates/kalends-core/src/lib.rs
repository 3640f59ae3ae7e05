pub mod cli;
pub mod commands;
pub mod config;
pub mod daycode;
pub mod error;
pub mod event;
pub mod grid;
pub mod monthexpr;
pub mod render;
pub mod store;
pub mod timezone;
pub mod weekday;

use std::ffi::OsString;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info};

#[tracing::instrument(skip_all)]
pub fn run(raw_args: Vec<OsString>) -> anyhow::Result<()> {
    let pre = cli::preprocess_args(&raw_args)?;
    let parsed = cli::GlobalCli::parse_from(pre.cleaned_args);

    cli::init_tracing(parsed.verbose, parsed.quiet)?;

    info!(
        verbose = parsed.verbose,
        quiet = parsed.quiet,
        "starting kalends CLI"
    );
    debug!(?pre.rc_overrides, "preprocessed rc overrides");

    let mut cfg = config::Config::load(parsed.rc_file.as_deref())?;
    cfg.apply_overrides(
        pre.rc_overrides.into_iter().chain(
            parsed
                .rc_overrides
                .into_iter()
                .map(|kv| (kv.key, kv.value)),
        ),
    );

    let data_dir = config::resolve_data_dir(&cfg, parsed.data.as_deref())
        .context("failed to resolve data directory")?;

    let store = store::EventStore::open(&data_dir)
        .with_context(|| format!("failed to open event store at {}", data_dir.display()))?;

    let mut renderer = render::Renderer::new(&cfg)?;
    let command = parsed.command.unwrap_or(cli::Command::Show {
        expr: None,
        bare: false,
        weeks: false,
    });

    commands::dispatch(&store, &cfg, &mut renderer, command)?;

    info!("done");
    Ok(())
}
