use std::process::ExitCode;

use clap::{Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use census_sync::census::CensusHttpClient;
use census_sync::config::{ConfigLoader, ConfigOverrides};
use census_sync::download::HttpDownloader;
use census_sync::error::SyncError;
use census_sync::output::{HumanOutput, IncomeReport, JsonOutput, OutputMode, RunReport, ShapeReport};
use census_sync::sync::Coordinator;

#[derive(Parser)]
#[command(name = "census-sync")]
#[command(about = "Incrementally load ACS income brackets and county-subdivision shapes")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    config: Option<String>,

    #[arg(long, global = true)]
    database_url: Option<String>,

    #[arg(long, global = true)]
    data_dir: Option<String>,

    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Clone, Copy)]
enum Commands {
    #[command(about = "Fetch missing years of ACS income brackets")]
    Income,
    #[command(about = "Load county-subdivision shapes if the table is empty")]
    Shapes,
    #[command(about = "Run income and shapes (default)")]
    All,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<SyncError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &SyncError) -> u8 {
    match error {
        SyncError::UnsupportedStore(_)
        | SyncError::InvalidConnection(_)
        | SyncError::ConfigRead(_)
        | SyncError::ConfigParse(_) => 2,
        SyncError::Transport(_) | SyncError::TransportStatus { .. } => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Human
    };

    let config = ConfigLoader::resolve(
        cli.config.as_deref(),
        ConfigOverrides {
            database_url: cli.database_url,
            data_dir: cli.data_dir,
        },
    )?;

    let store = config.store.open()?;
    let census = CensusHttpClient::new(
        &config.census_base_url,
        &config.state_fips,
        config.timeout,
        config.verify_tls,
    )?;
    let downloader = HttpDownloader::new(config.timeout, config.verify_tls)?;
    let mut coordinator = Coordinator::new(config, census, downloader, store)?;

    let command = cli.command.unwrap_or(Commands::All);
    let mut report = RunReport::default();
    if matches!(command, Commands::Income | Commands::All) {
        report.income = Some(IncomeReport::from(coordinator.synchronize()?));
    }
    if matches!(command, Commands::Shapes | Commands::All) {
        report.shapes = Some(ShapeReport::from(coordinator.load_shapes_if_empty()?));
    }

    match output_mode {
        OutputMode::Json => JsonOutput::print_report(&report).into_diagnostic()?,
        OutputMode::Human => HumanOutput::print_report(&report).into_diagnostic()?,
    }
    Ok(())
}
