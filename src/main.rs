//! Entry point: parse CLI and dispatch to the update jobs and the engine.

use anyhow::Result;
use clap::{Parser, Subcommand};
use puckcast::{
    config::Config,
    copilot::format,
    ingest::{
        bulk::{pending_seasons, run_bulk, BulkConfig},
        UpdateService,
    },
    progress::ProgressLedger,
    sources::SourceClient,
    PredictionEngine, Season, StatKind, StatsDatabase,
};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[clap(name = "puckcast", about = "Hockey analytics and prediction engine")]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the startup update job: seed-if-empty, schedule, game-log
    /// catch-up, injuries, team/goalie stats, rosters, advanced stats.
    Startup,

    /// Run the daily update job: full refresh of schedule, logs,
    /// injuries, team/goalie stats, and rosters.
    Daily,

    /// Backfill advanced stats across a season range.
    Bulk {
        /// First season start year.
        #[clap(long, default_value_t = puckcast::season::FIRST_TRACKED_SEASON)]
        start: u16,

        /// Last season start year (defaults to the current season).
        #[clap(long)]
        end: Option<u16>,

        /// Re-ingest seasons already marked complete.
        #[clap(long)]
        force: bool,

        /// Ingest one specific season start year.
        #[clap(long)]
        season: Option<u16>,

        /// Print pending seasons and exit.
        #[clap(long)]
        status: bool,
    },

    /// Predict scoring for a matchup.
    Predict {
        /// Home team code (e.g. TOR).
        #[clap(long)]
        home: String,

        /// Away team code (e.g. BOS).
        #[clap(long)]
        away: String,

        /// Game date, YYYY-MM-DD (defaults to today).
        #[clap(long)]
        date: Option<String>,

        /// Players per team.
        #[clap(long, default_value_t = 10)]
        top_n: usize,
    },

    /// League leaders by a stat.
    Leaders {
        /// One of: goals, assists, points, xg, corsi_for_pct.
        #[clap(long, default_value = "points")]
        stat: String,

        /// Season start year (defaults to the latest with data).
        #[clap(long)]
        season: Option<u16>,
    },

    /// Current injuries, league-wide or for one team.
    Injuries {
        /// Team code (e.g. TOR).
        #[clap(long)]
        team: Option<String>,
    },

    /// Recent game logs for a player.
    Logs {
        /// Player name (substring match).
        #[clap(long)]
        player: String,

        /// Games to show.
        #[clap(long, default_value_t = 10)]
        limit: usize,
    },

    /// Show store counts and ledger markers.
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let config = Arc::new(Config::from_env());
    let ledger = Arc::new(ProgressLedger::new(config.progress_path()));
    let today = chrono::Local::now().date_naive();

    match cli.command {
        Commands::Startup => {
            if !config.auto_update_enabled {
                println!("Auto-update is disabled (PUCKCAST_AUTO_UPDATE=0).");
                return Ok(());
            }
            let service = UpdateService::new(config, ledger);
            let summary = service.run_startup(today).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }

        Commands::Daily => {
            let service = UpdateService::new(config, ledger);
            let summary = service.run_daily(today).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }

        Commands::Bulk {
            start,
            end,
            force,
            season,
            status,
        } => {
            let end = end.unwrap_or_else(|| Season::current(today).start_year());
            let mut bulk = match season {
                Some(year) => BulkConfig::new(year, year),
                None => BulkConfig::new(start, end),
            };
            bulk.skip_completed = !force;

            if status {
                let progress = ledger.load();
                let pending = pending_seasons(&ledger, &bulk);
                println!("Completed seasons: {}", progress.completed_seasons.len());
                println!("Pending seasons: {}", pending.len());
                println!(
                    "Last update: {}",
                    progress.last_update.as_deref().unwrap_or("never")
                );
                return Ok(());
            }

            let db = StatsDatabase::open(&config)?;
            let client = SourceClient::new(&config);
            let results = run_bulk(&db, &client, &config, &ledger, &bulk).await?;
            for result in &results {
                let status = if result.success {
                    "OK".to_string()
                } else {
                    format!("FAILED: {}", result.error.as_deref().unwrap_or("unknown"))
                };
                println!("  {}: {} records - {}", result.season, result.records, status);
            }
        }

        Commands::Predict {
            home,
            away,
            date,
            top_n,
        } => {
            let game_date = match date {
                Some(raw) => raw
                    .parse()
                    .map_err(|_| puckcast::PuckError::InvalidDate { value: raw })?,
                None => today,
            };
            let home = puckcast::teams::normalize_team(&home)
                .ok_or(puckcast::PuckError::UnknownTeam { team: home })?;
            let away = puckcast::teams::normalize_team(&away)
                .ok_or(puckcast::PuckError::UnknownTeam { team: away })?;
            let db = StatsDatabase::open(&config)?;
            let engine = PredictionEngine::new();
            let prediction = engine.matchup_prediction(&db, &home, &away, game_date, top_n)?;
            println!("{}", format::format_matchup_prediction(&prediction));
        }

        Commands::Leaders { stat, season } => {
            let stat: StatKind = stat.parse()?;
            let db = StatsDatabase::open(&config)?;
            let season_code = season.map(|year| Season::new(year).code());
            let rows = db.league_leaders(stat, season_code.as_deref(), 10)?;
            match format::format_leaders(&rows, stat.label(), 10) {
                Some(text) => println!("{}", text),
                None => println!("No season data loaded."),
            }
        }

        Commands::Injuries { team } => {
            let db = StatsDatabase::open(&config)?;
            let team = team.map(|t| t.to_uppercase());
            let rows = db.active_injuries(team.as_deref())?;
            match format::format_injuries(&rows) {
                Some(text) => println!("{}", text),
                None => println!("No active injuries on record."),
            }
        }

        Commands::Logs { player, limit } => {
            let db = StatsDatabase::open(&config)?;
            let logs = db.game_logs_for_player_name(&player, limit)?;
            if logs.is_empty() {
                return Err(puckcast::PuckError::PlayerNotFound { name: player }.into());
            }
            for log in &logs {
                println!(
                    "{}  {} {} {}  {}G {}A {}P  {} shots, {:.1} TOI",
                    log.game_date,
                    log.team.as_deref().unwrap_or("-"),
                    if log.home_away.as_deref() == Some("home") { "vs" } else { "@" },
                    log.opponent.as_deref().unwrap_or("-"),
                    log.goals,
                    log.assists,
                    log.points,
                    log.shots,
                    log.toi_minutes,
                );
            }
        }

        Commands::Status => {
            let db = StatsDatabase::open(&config)?;
            let status = db.data_status()?;
            println!("{}", serde_json::to_string_pretty(&status)?);
            let progress = ledger.load();
            println!("{}", serde_json::to_string_pretty(&progress)?);
        }
    }

    Ok(())
}
