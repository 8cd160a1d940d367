pub mod cli;
pub mod commands;
pub mod config;
pub mod gateway;
pub mod render;
pub mod repo;
pub mod screen;
pub mod session;
pub mod sort;
pub mod task;
pub mod toast;
pub mod validate;

use std::ffi::OsString;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info};

#[tracing::instrument(skip_all)]
pub fn run(raw_args: Vec<OsString>) -> anyhow::Result<()> {
    let cli = cli::GlobalCli::parse_from(raw_args);

    cli::init_tracing(cli.verbose, cli.quiet)?;

    info!(verbose = cli.verbose, quiet = cli.quiet, "starting priorlist CLI");

    let mut cfg = config::Config::load(cli.rcfile.as_deref())?;
    cfg.apply_overrides(cli.rc_overrides.into_iter().map(|kv| (kv.key, kv.value)));

    let data_dir = config::resolve_data_dir(&cfg, cli.data.as_deref())
        .context("failed to resolve data directory")?;
    debug!(data_dir = %data_dir.display(), "resolved data directory");

    let store = Arc::new(
        gateway::local::LocalStore::open(&data_dir)
            .with_context(|| format!("failed to open local store at {}", data_dir.display()))?,
    );

    let mut session = session::Session::restore(store.clone());
    let mut renderer = render::Renderer::new(&cfg)?;

    commands::dispatch(store, &mut renderer, &mut session, &data_dir, cli.command)?;

    info!("done");
    Ok(())
}
