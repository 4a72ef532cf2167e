use anyhow::Context;
use clap::Parser;
use setlist_harvest::app::harvest_use_case::{HarvestRequest, HarvestUseCase};
use setlist_harvest::config::Config;
use setlist_harvest::envelope::ScrapeResponse;
use setlist_harvest::infra::chromium_session::ChromiumLauncher;
use setlist_harvest::logging;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "setlist_harvest")]
#[command(about = "Collects a setlist.fm attendance history into an xlsx report")]
#[command(version = "0.1.0")]
struct Cli {
    /// setlist.fm profile name
    #[arg(long)]
    profile: String,

    /// Show the browser window instead of running headless
    #[arg(long)]
    headed: bool,

    /// Config file (defaults to ./config.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Give up crawling after this many seconds and report what was collected
    #[arg(long)]
    deadline_secs: Option<u64>,
}

fn load_config(path: Option<&PathBuf>) -> setlist_harvest::error::Result<Config> {
    match path {
        Some(path) => {
            let mut config = Config::from_path(path)?;
            config.apply_env();
            config.validate()?;
            Ok(config)
        }
        None => Config::load(),
    }
}

/// Write the one and only stdout payload.
fn emit(response: &ScrapeResponse) -> anyhow::Result<()> {
    let json = response.to_json().context("serializing response")?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", json).context("writing response")?;
    stdout.flush().context("flushing response")?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let _log_guard = logging::init_logging();

    let cli = Cli::parse();

    let config = match load_config(cli.config.as_ref()) {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration failed: {}", e);
            return emit(&ScrapeResponse::failure(format!("Configuration error: {}", e)));
        }
    };

    let request = HarvestRequest {
        profile: cli.profile,
        headless: !cli.headed,
        deadline: cli.deadline_secs.map(Duration::from_secs),
    };

    let launcher = ChromiumLauncher::new(config.browser.clone());
    let use_case = HarvestUseCase::new(launcher, config);
    let outcome = use_case.run(&request).await;

    info!(
        success = outcome.response.success,
        collected = outcome.collected,
        termination = ?outcome.termination,
        "Harvest finished"
    );
    emit(&outcome.response)
}
