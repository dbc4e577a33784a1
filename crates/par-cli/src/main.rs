use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use par_client::{FbrefCompetition, ScraperTableReader, polite_client};
use par_core::config::{FetchConfig, parse_seasons};
use par_core::error::AppError;
use par_core::output::{
    write_player_header, write_player_rows, write_standings_header, write_standings_rows,
};
use par_core::season::{RunSummary, SeasonFailure, SeasonRunner, TracingRunReporter};
use par_core::{PlayerMetricsService, StandingsService};

const PLAYERS_OUT: &str = "data/player_metrics_fbref.csv";
const STANDINGS_OUT: &str = "data/team_outcomes.csv";

/// Exit status when at least one season failed or the run aborted.
const EXIT_RUN_FAILED: u8 = 1;
/// Exit status for invalid configuration or an unusable output path.
const EXIT_CONFIG: u8 = 2;

#[derive(Parser)]
#[command(
    name = "par",
    version,
    about = "Fetch football stats from FBref and football-data.org into PAR backtester CSVs"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Player standard + shooting metrics from FBref
    Players(PlayersArgs),

    /// Final league standings from football-data.org
    Standings(StandingsArgs),
}

#[derive(Args)]
struct PlayersArgs {
    #[command(flatten)]
    run: RunArgs,

    #[command(flatten)]
    http: HttpArgs,

    /// League the players are measured in
    #[arg(long, default_value = "EPL")]
    dest_league: String,

    /// League the players came from
    #[arg(long, default_value = "EPL")]
    from_league: String,

    /// FBref competition id
    #[arg(long, default_value_t = 9)]
    comp_id: u32,

    /// FBref competition slug used in page names
    #[arg(long, default_value = "Premier-League")]
    comp_slug: String,
}

#[derive(Args)]
struct StandingsArgs {
    #[command(flatten)]
    run: RunArgs,

    #[command(flatten)]
    http: HttpArgs,

    /// football-data.org API base URL
    #[arg(
        long,
        env = "FOOTBALL_DATA_API_BASE",
        default_value = "https://api.football-data.org/v4"
    )]
    api_base: String,

    /// API token (reads from FOOTBALL_DATA_API_KEY if not provided)
    #[arg(long, env = "FOOTBALL_DATA_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Competition code
    #[arg(long, default_value = "PL")]
    competition: String,
}

/// Options shared by every run.
#[derive(Args)]
struct RunArgs {
    /// Comma-separated season start years
    #[arg(long, env = "PAR_SEASONS", default_value = "2020,2021,2022,2023,2024")]
    seasons: String,

    /// Output CSV path
    #[arg(long, env = "PAR_OUT")]
    out: Option<PathBuf>,

    /// Stop at the first failed season
    #[arg(long, default_value_t = false)]
    fail_fast: bool,
}

/// HTTP politeness settings. Unset values keep the subcommand's defaults.
#[derive(Args, Default)]
struct HttpArgs {
    /// Sustained requests per second
    #[arg(long, env = "PAR_RPS")]
    rps: Option<f64>,

    /// Requests allowed back to back before throttling starts
    #[arg(long, env = "PAR_BURST")]
    burst: Option<u32>,

    /// Per-request timeout in seconds
    #[arg(long, env = "PAR_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    /// Maximum response body size in bytes
    #[arg(long, env = "PAR_MAX_BODY")]
    max_body: Option<u64>,

    /// User-Agent header sent with every request
    #[arg(long, env = "PAR_USER_AGENT")]
    user_agent: Option<String>,
}

impl HttpArgs {
    fn apply(self, base: FetchConfig) -> FetchConfig {
        FetchConfig {
            requests_per_second: self.rps.unwrap_or(base.requests_per_second),
            burst: self.burst.unwrap_or(base.burst),
            timeout: self.timeout_secs.map(Duration::from_secs).unwrap_or(base.timeout),
            max_body_bytes: self.max_body.unwrap_or(base.max_body_bytes),
            user_agent: self.user_agent.unwrap_or(base.user_agent),
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("par=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Players(args) => cmd_players(args).await,
        Commands::Standings(args) => cmd_standings(args).await,
    };

    match outcome {
        Ok((summary, out)) => {
            print_summary(&summary, &out);
            Ok(ExitCode::from(exit_status(&summary)))
        }
        Err(AppError::ConfigError(msg)) => {
            tracing::error!("Configuration error: {}", msg);
            eprintln!("error: {msg}");
            Ok(ExitCode::from(EXIT_CONFIG))
        }
        Err(e) => Err(e.into()),
    }
}

async fn cmd_players(args: PlayersArgs) -> Result<(RunSummary, PathBuf), AppError> {
    let years = parse_seasons(&args.run.seasons)?;
    let client = polite_client(&args.http.apply(FetchConfig::default()))?;
    let out = args.run.out.unwrap_or_else(|| PathBuf::from(PLAYERS_OUT));
    let mut writer = open_output(&out)?;
    write_player_header(&mut writer)?;

    let comp = FbrefCompetition::new(args.comp_id, args.comp_slug);
    let service = PlayerMetricsService::new(
        client,
        ScraperTableReader::new(),
        args.dest_league,
        args.from_league,
    );

    tracing::info!(
        seasons = ?years,
        competition = %comp.slug,
        out = %out.display(),
        "Fetching FBref player metrics"
    );

    let reporter = TracingRunReporter;
    let summary = SeasonRunner::new(&reporter, args.run.fail_fast)
        .run(
            &years,
            |year| {
                let target = comp.target(year);
                let service = &service;
                async move { service.fetch_season(&target).await }
            },
            |rows| write_player_rows(&mut writer, rows),
        )
        .await;

    Ok((summary, out))
}

async fn cmd_standings(args: StandingsArgs) -> Result<(RunSummary, PathBuf), AppError> {
    let api_key = require_api_key(args.api_key)?;
    let years = parse_seasons(&args.run.seasons)?;
    let client = polite_client(&args.http.apply(FetchConfig::football_data()))?;
    let out = args.run.out.unwrap_or_else(|| PathBuf::from(STANDINGS_OUT));
    let mut writer = open_output(&out)?;
    write_standings_header(&mut writer)?;

    let service = StandingsService::new(client, &args.api_base, api_key, args.competition);

    tracing::info!(
        seasons = ?years,
        out = %out.display(),
        "Fetching football-data.org standings"
    );

    let reporter = TracingRunReporter;
    let summary = SeasonRunner::new(&reporter, args.run.fail_fast)
        .run(
            &years,
            |year| {
                let service = &service;
                async move { service.fetch_season(year).await }
            },
            |rows| write_standings_rows(&mut writer, rows),
        )
        .await;

    Ok((summary, out))
}

fn require_api_key(api_key: Option<String>) -> Result<String, AppError> {
    match api_key {
        Some(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(AppError::ConfigError(
            "FOOTBALL_DATA_API_KEY is not set (pass --api-key or set it in .env)".into(),
        )),
    }
}

/// Create the parent directory and open `path` for writing.
fn open_output(path: &Path) -> Result<csv::Writer<std::fs::File>, AppError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| {
            AppError::ConfigError(format!("cannot create {}: {e}", parent.display()))
        })?;
    }
    csv::Writer::from_path(path)
        .map_err(|e| AppError::ConfigError(format!("cannot write {}: {e}", path.display())))
}

fn exit_status(summary: &RunSummary) -> u8 {
    if summary.is_success() { 0 } else { EXIT_RUN_FAILED }
}

/// One summary line per failed season. Remote-side failures are flagged as
/// worth a rerun.
fn failure_line(failure: &SeasonFailure) -> String {
    if failure.error.is_transient() {
        format!("  FAILED {failure} (remote error, a rerun may succeed)")
    } else {
        format!("  FAILED {failure}")
    }
}

fn print_summary(summary: &RunSummary, out: &Path) {
    println!(
        "Wrote {} rows for {} season(s) to {}",
        summary.total_rows(),
        summary.completed.len(),
        out.display()
    );
    for failure in &summary.failures {
        println!("{}", failure_line(failure));
    }
    if summary.aborted {
        println!("Run aborted before all seasons were processed");
    }
}
