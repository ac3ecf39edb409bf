use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, warn};

use emolens::app::App;
use emolens::config::{Config, DatabaseConfig};
use emolens::dashboard::DashboardState;
use emolens::db::Store;
use emolens::logging::{self, LogTarget};
use emolens::warehouse::{ViewOutcome, WarehouseService};
use emolens::PipelineError;

/// Read-only emotion analysis dashboard over the data warehouse.
#[derive(Debug, Parser)]
#[command(name = "emolens", version, after_help = ENV_HELP)]
struct Args {
    /// Path to the settings file
    #[arg(short, long, env = "EMOLENS_CONFIG")]
    config: Option<PathBuf>,

    /// Print the dashboard aggregates as JSON instead of opening the UI
    #[arg(long)]
    report: bool,

    /// Maximum number of warehouse rows to read
    #[arg(long)]
    limit: Option<usize>,
}

const ENV_HELP: &str = "ENVIRONMENT:
    DB_USER, DB_PASSWORD, DB_HOST, DB_PORT, DB_NAME   PostgreSQL connection (required)
    DB_BACKEND=sqlite, DB_SQLITE_PATH                 use a SQLite file instead
    EMOLENS_LOG                                       log filter (trace, debug, info, warn, error)

A .env file in the working directory is read first.";

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let target = if args.report {
        LogTarget::Console
    } else {
        LogTarget::Background { log_dir: None }
    };
    if let Err(e) = logging::init(target) {
        eprintln!("Warning: logging unavailable: {:#}", e);
    }

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{:#}", err);
            eprintln!("Error: {:#}", err);
            let code = err
                .downcast_ref::<PipelineError>()
                .map(|e| e.exit_code())
                .unwrap_or(1);
            ExitCode::from(code)
        }
    }
}

fn run(args: Args) -> Result<()> {
    // Pre-flight: everything is validated before the store is touched
    let mut config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(limit) = args.limit {
        config.dashboard.row_limit = limit;
    }
    let database = DatabaseConfig::from_env()?;

    let state = load_dashboard(&config, &database);

    if args.report {
        println!("{}", serde_json::to_string_pretty(&state)?);
        return Ok(());
    }

    let app = App::new(state).with_source(database.describe());
    run_terminal(app)
}

/// Query the warehouse. Connection and query failures both end up as an
/// empty view with a warning, never as an error.
fn load_dashboard(config: &Config, database: &DatabaseConfig) -> DashboardState {
    let store = match Store::open(database) {
        Ok(store) => store,
        Err(e) => {
            warn!("Cannot connect to the data warehouse: {}", e);
            let outcome = ViewOutcome {
                view: Vec::new(),
                error: Some(PipelineError::query(e)),
            };
            return DashboardState::from_outcome(&outcome);
        }
    };

    let mut service = WarehouseService::new(&store, config.dashboard.row_limit);
    let outcome = service.load_view();
    if outcome.is_degraded() {
        warn!("Showing an empty dashboard: the warehouse query failed");
    }
    DashboardState::from_outcome(&outcome)
}

fn run_terminal(mut app: App) -> Result<()> {
    enable_raw_mode().context("cannot enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = app.run(&mut terminal);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}
