// FPL mini-league dashboard entry point.
//
// Parses the CLI, sets up file logging and config, spawns the app task and
// hands the terminal to the TUI. On quit the app task gets five seconds to
// wind down.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use fpl_dashboard::app;
use fpl_dashboard::config;
use fpl_dashboard::fpl::client::FplClient;
use fpl_dashboard::llm::client::LlmClient;
use fpl_dashboard::protocol::UserCommand;
use fpl_dashboard::tui;

use anyhow::Context;
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Terminal dashboard for a Fantasy Premier League classic mini-league.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// League to load on startup; overrides `league.default_league_id`.
    #[arg(short, long)]
    league: Option<u64>,

    /// Directory holding `defaults/` and `config/`. Defaults to the cwd.
    #[arg(long)]
    base_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let base_dir = match cli.base_dir {
        Some(dir) => dir,
        None => std::env::current_dir().context("failed to resolve working directory")?,
    };
    init_tracing(&base_dir)?;
    info!(base_dir = %base_dir.display(), "FPL dashboard starting up");

    let config = config::load_config_at(&base_dir).context("failed to load configuration")?;
    info!(
        api_base = %config.fpl.api_base,
        relay = !config.fpl.relay_prefix.is_empty(),
        model = %config.llm.model,
        "Config loaded"
    );

    let source = FplClient::new(&config.fpl).context("failed to build FPL client")?;

    let llm_client = LlmClient::from_config(&config);
    match &llm_client {
        LlmClient::Active(_) => info!("LLM client initialized (API key configured)"),
        LlmClient::Disabled => info!("LLM client disabled (no API key)"),
    }

    let (llm_tx, llm_rx) = mpsc::channel(256);
    let (cmd_tx, cmd_rx) = mpsc::channel(64);
    let (ui_tx, ui_rx) = mpsc::channel(256);

    let startup_league = cli.league.or(config.league.default_league_id);
    let tick_rate = Duration::from_millis(config.ui.tick_rate_ms);

    let app_state = app::AppState::new(config, Arc::new(source), llm_client, llm_tx);

    let app_task = tokio::spawn(async move {
        if let Err(e) = app::run(cmd_rx, llm_rx, ui_tx, app_state).await {
            error!(error = %e, "app loop failed");
        }
    });

    if let Some(league_id) = startup_league {
        info!(league_id, "Loading startup league");
        cmd_tx
            .send(UserCommand::SubmitLeague(league_id))
            .await
            .context("application loop exited before startup")?;
    }

    // Blocks until the user quits.
    if let Err(e) = tui::run(ui_rx, cmd_tx, tick_rate).await {
        error!(error = %e, "TUI exited with an error");
    }

    let _ = tokio::time::timeout(Duration::from_secs(5), async {
        let _ = app_task.await;
    })
    .await;

    info!("FPL dashboard shut down cleanly");
    Ok(())
}

/// File logging under `<base>/logs`; the terminal belongs to the TUI.
fn init_tracing(base_dir: &Path) -> anyhow::Result<()> {
    let log_dir = base_dir.join("logs");
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create {}", log_dir.display()))?;
    let log_file = std::fs::File::create(log_dir.join("fpl-dashboard.log"))?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("fpl_dashboard=info,warn"));

    tracing::subscriber::set_global_default(file_subscriber(log_file, filter))
        .context("failed to set tracing subscriber")
}

fn file_subscriber(
    log_file: File,
    filter: EnvFilter,
) -> impl tracing::Subscriber + Send + Sync + 'static {
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(log_file))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish()
}
