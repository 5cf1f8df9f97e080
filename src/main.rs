use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use freelance_bridge::config::{Cli, Settings};
use freelance_bridge::invoker::ProcessRunner;
use freelance_bridge::web::WebServer;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present; system environment still wins
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    setup_logging(cli.debug);

    let mut settings = Settings::load(cli.config.as_ref())?;
    settings.apply_env();
    settings.merge_cli(&cli);
    settings.ensure_paths()?;

    tracing::info!(
        time_tracker = %settings.time_tracker_path.display(),
        invoice_gen = %settings.invoice_gen_path.display(),
        python = %settings.python_path.display(),
        "configured tool paths"
    );

    WebServer::new(settings, Arc::new(ProcessRunner)).run().await
}

fn setup_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("freelance_bridge=debug,tower_http=debug")
    } else {
        EnvFilter::new("freelance_bridge=info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}
