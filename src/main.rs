//! CLI Entry Point for nzyme-dashboard
//!
//! Provides a headless front end for the dashboard core:
//! - Watching one page: the shell follows backend connectivity and prints every frame
//! - Checking the backend once: ping plus one fetch per collection
//!
//! # Usage
//!
//! Watch the tracker list:
//! ```bash
//! nzyme-dashboard watch --route /bandits/trackers
//! ```
//!
//! Check a backend that is not the configured one:
//! ```bash
//! nzyme-dashboard check --backend http://10.0.0.5:22900
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use nzyme_dashboard::backend::resolve_address;
use nzyme_dashboard::config::DashboardConfig;
use nzyme_dashboard::context::AppContext;
use nzyme_dashboard::fetch::{Fetcher, HttpFetcher};
use nzyme_dashboard::logging;
use nzyme_dashboard::shell::Shell;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "nzyme-dashboard")]
#[command(about = "Headless nzyme dashboard", long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Backend URL, overrides the configuration
    #[arg(long, global = true)]
    backend: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mount a page and print every frame until Ctrl-C
    Watch {
        /// Page path, e.g. `/bandits/trackers/show/t1`
        #[arg(long, default_value = "/")]
        route: String,
    },

    /// Ping the backend and load every collection once
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => DashboardConfig::load_from(path),
        None => DashboardConfig::load(),
    }
    .context("loading configuration")?;
    config.validate().context("validating configuration")?;
    logging::init_from_config(&config)?;

    let address = resolve_address(cli.backend.as_deref(), Some(&config.backend.url));
    tracing::info!("{} using backend {}", config.application.name, address);
    let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new(address, config.request_timeout())?);
    let ctx = AppContext::from_config(fetcher, &config);

    match cli.command {
        Commands::Watch { route } => watch(ctx, &route).await,
        Commands::Check => check(ctx).await,
    }
}

async fn watch(ctx: AppContext, route: &str) -> Result<()> {
    let mut connectivity = ctx.connectivity().subscribe();
    let _ping = ctx.start_connectivity_poller();
    let mut shell = Shell::for_context(&ctx, route);
    let redraw = Arc::clone(ctx.redraw());

    println!("{}", shell.frame());
    loop {
        tokio::select! {
            changed = connectivity.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = *connectivity.borrow_and_update();
                shell.apply(state);
            }
            () = redraw.notified() => {}
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, shutting down");
                break;
            }
        }
        println!("{}", shell.frame());
    }

    Ok(())
}

async fn check(ctx: AppContext) -> Result<()> {
    let state = ctx.connectivity().ping().await;
    println!("Backend: {state}");
    if !state.is_connected() {
        anyhow::bail!(
            "backend unreachable: {}",
            ctx.connectivity()
                .health()
                .last_error_message
                .unwrap_or_default()
        );
    }

    let refresh = ctx.refresh_collections().await;
    println!("Trackers: {:?}", refresh.trackers);
    println!("Reports: {:?}", refresh.reports);
    println!("System status: {:?}", refresh.system_status);

    if let Some(status) = ctx.stores().system_status.get(&nzyme_dashboard::store::Collection) {
        println!("Active states: {}", status.active().join(", "));
    }
    Ok(())
}
