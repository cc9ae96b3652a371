use std::path::PathBuf;
use std::sync::Arc;

use anomos_tracker_lib::{app, bootstrap};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about = "An anonymizing BitTorrent tracker.")]
struct Args {
    /// Path of the TOML configuration file.
    #[arg(short, long, env = "ANOMOS_TRACKER_CONFIG_PATH")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let (config, app_container) = bootstrap::app::setup(args.config);
    let app_container = Arc::new(app_container);

    let jobs = app::start(&config, &app_container).await;

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");

    app::save_state_once(&app_container).await;

    for job in jobs {
        job.abort();
    }

    Ok(())
}
