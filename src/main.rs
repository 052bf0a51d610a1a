use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, error, info, warn};

use courtbook::auth::{self, Credentials, LoginStatus};
use courtbook::booking::RunController;
use courtbook::config as cfg;
use courtbook::surface::ChromiumSurface;

/// Courtbook CLI
#[derive(Debug, Parser)]
#[command(
    name = courtbook::PKG_NAME,
    version = courtbook::PKG_VERSION,
    about = "Books a court slot a fixed number of days ahead through a remote browser"
)]
struct Args {
    /// Path to the JSON configuration file
    #[arg(short = 'c', long = "config", default_value = "config/default.json")]
    config: PathBuf,

    /// Walk the whole wizard but stop before the final submit
    #[arg(long = "dry-run")]
    dry_run: bool,

    /// Set log level (e.g., trace, debug, info, warn, error). Overrides RUST_LOG.
    #[arg(long = "log-level")]
    log_level: Option<String>,

    /// Append logs to this file instead of stderr
    #[arg(long = "log-file")]
    log_file: Option<PathBuf>,

    /// Print the JSON Schema for the configuration and exit
    #[arg(long = "print-schema")]
    print_schema: bool,

    /// Show the browser window regardless of the configured driver mode
    #[arg(long = "headed")]
    headed: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.log_level.is_none() && args.log_file.is_none() {
        courtbook::init_tracing();
    } else {
        let level = args
            .log_level
            .as_deref()
            .and_then(courtbook::parse_level)
            .unwrap_or(tracing::Level::INFO);
        courtbook::init_tracing_with(level, args.log_file.as_deref())?;
    }

    if args.print_schema {
        let stdout = std::io::stdout();
        cfg::write_schema_to_writer(stdout.lock())?;
        return Ok(());
    }

    info!(
        version = courtbook::PKG_VERSION,
        config = %args.config.display(),
        dry_run = args.dry_run,
        "Starting courtbook"
    );

    let mut config = cfg::load_from_path_async(&args.config).await?;
    debug!(target: "courtbook", "Configuration loaded successfully");
    if args.headed {
        config.driver.headless = false;
    }

    let credentials = Credentials::from_env(&config.credentials)
        .context("Credentials must be provided through the environment")?;

    let mut surface = ChromiumSurface::launch(&config.driver).await?;

    match auth::authenticate(
        &mut surface,
        &config.site,
        &config.selectors,
        &config.timing,
        &credentials,
    )
    .await
    {
        Ok(LoginStatus::Confirmed) => {}
        Ok(LoginStatus::FormStillVisible) => {
            warn!(account = credentials.account(), "Continuing although login was not confirmed");
        }
        Err(err) => {
            error!(error = %err, "Login failed; aborting run");
            if let Err(close) = surface.shutdown().await {
                warn!(error = %close, "Failed to close browser");
            }
            return Err(err.into());
        }
    }

    let controller = RunController::new(&config, args.dry_run);
    let report = tokio::select! {
        report = controller.run(&mut surface, &config.booking.categories, config.booking.attempts) => Some(report),
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
            None
        }
    };

    if let Some(report) = &report {
        for (attempt, outcome) in report.outcomes().iter().enumerate() {
            info!(
                attempt = attempt + 1,
                success = outcome.success,
                category = %outcome.category_used,
                slot = outcome.slot_used.as_deref().unwrap_or("-"),
                failure = ?outcome.failure_stage,
                submitted = outcome.submitted,
                "Attempt summary"
            );
        }
        debug!(target: "courtbook", report = %serde_json::to_string(report)?, "Run report");
    }

    if let Err(err) = surface.shutdown().await {
        warn!(error = %err, "Failed to close browser");
    }
    info!("Courtbook exited");
    Ok(())
}
