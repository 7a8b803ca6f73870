//! Bulk multi-season backfill of advanced stats.
//!
//! Seasons are processed serially with an inter-season delay. A season is
//! marked complete in the ledger only after its writes land, so a crash
//! mid-season leaves it pending and repeatable.

use super::ingest_advanced_stats;
use crate::config::Config;
use crate::error::Result;
use crate::progress::ProgressLedger;
use crate::season::{seasons_in_range, Season};
use crate::sources::{stats_api, SourceClient};
use crate::storage::StatsDatabase;
use chrono::Utc;
use serde::Serialize;
use std::time::Duration;
use tracing::{error, info};

/// Parameters for one bulk run.
#[derive(Debug, Clone)]
pub struct BulkConfig {
    pub start_year: u16,
    pub end_year: u16,
    /// Skip seasons already recorded as complete in the ledger.
    pub skip_completed: bool,
    /// Delay between seasons, in milliseconds.
    pub rate_limit_delay_ms: u64,
}

impl BulkConfig {
    pub fn new(start_year: u16, end_year: u16) -> Self {
        Self {
            start_year,
            end_year,
            skip_completed: true,
            rate_limit_delay_ms: 500,
        }
    }
}

/// Per-season outcome of a bulk run.
#[derive(Debug, Clone, Serialize)]
pub struct SeasonResult {
    pub season: String,
    pub records: usize,
    pub success: bool,
    pub error: Option<String>,
}

/// The seasons a bulk run still has to process.
pub fn pending_seasons(ledger: &ProgressLedger, bulk: &BulkConfig) -> Vec<Season> {
    let all = seasons_in_range(bulk.start_year, bulk.end_year);
    if !bulk.skip_completed {
        return all;
    }
    all.into_iter()
        .filter(|s| !ledger.is_season_complete(&s.start_year().to_string()))
        .collect()
}

/// Run the backfill: seed the teams table from current standings, then
/// ingest each pending season's advanced stats.
pub async fn run_bulk(
    db: &StatsDatabase,
    client: &SourceClient,
    config: &Config,
    ledger: &ProgressLedger,
    bulk: &BulkConfig,
) -> Result<Vec<SeasonResult>> {
    let seasons = pending_seasons(ledger, bulk);
    if seasons.is_empty() {
        info!("no_seasons_to_process");
        return Ok(Vec::new());
    }
    info!(total_seasons = seasons.len(), "starting_bulk_ingestion");

    ingest_teams(db, client, config).await?;

    let mut results = Vec::with_capacity(seasons.len());
    for (i, season) in seasons.iter().enumerate() {
        info!(season = %season, step = i + 1, total = seasons.len(), "processing_season");
        results.push(ingest_single_season(db, client, config, ledger, *season).await);

        if i + 1 < seasons.len() {
            tokio::time::sleep(Duration::from_millis(bulk.rate_limit_delay_ms)).await;
        }
    }

    let successful = results.iter().filter(|r| r.success).count();
    let total_records: usize = results.iter().map(|r| r.records).sum();
    info!(
        successful_seasons = successful,
        total_seasons = results.len(),
        total_records,
        "bulk_ingestion_complete"
    );
    Ok(results)
}

/// Seed the teams table from the standings feed.
pub async fn ingest_teams(
    db: &StatsDatabase,
    client: &SourceClient,
    config: &Config,
) -> Result<usize> {
    let teams = stats_api::fetch_standings_teams(client, config).await?;
    for team in &teams {
        db.upsert_team(team)?;
    }
    info!(count = teams.len(), "teams_ingested");
    Ok(teams.len())
}

/// Ingest one season; failures are captured in the result, not raised.
/// Roster data rarely exists for historical seasons, so the backfill
/// ingests stats only.
pub async fn ingest_single_season(
    db: &StatsDatabase,
    client: &SourceClient,
    config: &Config,
    ledger: &ProgressLedger,
    season: Season,
) -> SeasonResult {
    let year = season.start_year().to_string();
    match ingest_advanced_stats(db, client, config, season).await {
        Ok(records) if records > 0 => {
            if let Err(e) = ledger.mark_season_complete(&year, Utc::now()) {
                error!(season = %season, error = %e, "season_marker_write_failed");
            }
            SeasonResult {
                season: year,
                records,
                success: true,
                error: None,
            }
        }
        Ok(_) => SeasonResult {
            season: year,
            records: 0,
            success: false,
            error: Some("no records in feed".to_string()),
        },
        Err(e) => {
            error!(season = %season, error = %e, "season_ingestion_failed");
            SeasonResult {
                season: year,
                records: 0,
                success: false,
                error: Some(e.to_string()),
            }
        }
    }
}
