mod app;
mod event;
mod terminal;
mod ui;

use app::{App, AppActions};
use clap::Parser;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use guardwatch_tui::cli::CliArgs;
use guardwatch_tui::config::AppConfig;
use guardwatch_tui::http::HttpFetcher;
use guardwatch_tui::logging;

#[tokio::main]
async fn main() -> Result<()> {
    // Setup error handling
    color_eyre::install()?;

    let args = CliArgs::parse();
    args.apply_env_overrides();

    let config = AppConfig::load()?;
    let headless = args.headless || !is_terminal();
    let _log_guard = logging::init(&config, headless);

    let fetcher = HttpFetcher::new(&config)
        .map_err(|e| eyre!("Failed to build HTTP client: {e}"))?
        .shared();
    let (actions, mut outcomes) = AppActions::new(fetcher);
    let mut app = App::with_account(&config.account);

    tracing::info!(base_url = %config.base_url, headless, "starting guardwatch");

    if headless {
        return event::run_headless(&mut app, &actions, args.json).await;
    }

    let mut terminal = terminal::setup()?;
    let result = event::run(&mut terminal, &mut app, &actions, &mut outcomes).await;
    terminal::cleanup(true, true);

    result
}

// Check if we're running in a terminal
fn is_terminal() -> bool {
    atty::is(atty::Stream::Stdout)
}
