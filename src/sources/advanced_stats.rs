//! Advanced-stats CSV adapter (xG, Corsi, Fenwick).
//!
//! The feed publishes one season-summary CSV per season, addressed by the
//! season's starting year. Column names and units drifted over the years;
//! the projection normalizes both known formats.

use crate::config::Config;
use crate::error::Result;
use crate::season::Season;
use crate::sources::SourceClient;
use csv::StringRecord;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// One skater's season line as projected from the CSV.
#[derive(Debug, Clone)]
pub struct SkaterSeasonRecord {
    pub player_ext_id: i64,
    pub name: String,
    pub team: String,
    pub games_played: i64,
    pub goals: i64,
    pub assists: i64,
    pub points: i64,
    pub shots: i64,
    pub toi_per_game: f64,
    pub xg: f64,
    pub xg_per_60: f64,
    pub corsi_for_pct: f64,
    pub fenwick_for_pct: f64,
}

/// Ice-time totals above this are season seconds; below, season minutes.
const SECONDS_FORMAT_THRESHOLD: f64 = 5000.0;

/// Download a season's skater CSV, caching the raw body under
/// `data/raw/moneypuck_{year}.csv`. Empty string on source failure.
pub async fn download_season_csv(
    client: &SourceClient,
    config: &Config,
    season: Season,
) -> Result<String> {
    let url = format!(
        "{}/seasonSummary/{}/regular/skaters.csv",
        config.advanced_stats_base,
        season.start_year()
    );
    info!(season = %season, url = %url, "downloading_advanced_stats");
    let body = match client.get_text(&url).await {
        Ok(body) => body,
        Err(e) => {
            warn!(season = %season, error = %e, "advanced_stats_download_failed");
            return Ok(String::new());
        }
    };

    let cache_path = config.advanced_stats_cache_path(season.start_year());
    if let Err(e) = write_cache(&cache_path, &body) {
        warn!(path = %cache_path.display(), error = %e, "advanced_stats_cache_write_failed");
    }
    Ok(body)
}

fn write_cache(path: &Path, body: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, body)
}

/// Parse a skater CSV into season records, keeping only all-situation rows
/// for players with at least one game.
pub fn parse_skater_csv(body: &str) -> Result<Vec<SkaterSeasonRecord>> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    let mut reader = csv::Reader::from_reader(body.as_bytes());
    let headers = reader.headers()?.clone();
    let col = |name: &str| headers.iter().position(|h| h == name);

    let situation = col("situation");
    let player_id = col("playerId");
    let name = col("name");
    let team = col("team");
    let games = col("games_played").or_else(|| col("GP"));
    let icetime = col("icetime").or_else(|| col("iceTime")).or_else(|| col("TOI"));
    let goals = col("I_F_goals");
    let primary_assists = col("I_F_primaryAssists");
    let secondary_assists = col("I_F_secondaryAssists");
    let points = col("I_F_points");
    let shots = col("I_F_shotsOnGoal").or_else(|| col("I_F_shots"));
    let xg = col("I_F_xGoals");
    let corsi = col("onIce_corsiPercentage");
    let fenwick = col("onIce_fenwickPercentage");

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        if let Some(idx) = situation {
            if row.get(idx) != Some("all") {
                continue;
            }
        }
        if let Some(record) = project_row(
            &row,
            player_id,
            name,
            team,
            games,
            icetime,
            goals,
            primary_assists,
            secondary_assists,
            points,
            shots,
            xg,
            corsi,
            fenwick,
        ) {
            records.push(record);
        }
    }
    Ok(records)
}

#[allow(clippy::too_many_arguments)]
fn project_row(
    row: &StringRecord,
    player_id: Option<usize>,
    name: Option<usize>,
    team: Option<usize>,
    games: Option<usize>,
    icetime: Option<usize>,
    goals: Option<usize>,
    primary_assists: Option<usize>,
    secondary_assists: Option<usize>,
    points: Option<usize>,
    shots: Option<usize>,
    xg: Option<usize>,
    corsi: Option<usize>,
    fenwick: Option<usize>,
) -> Option<SkaterSeasonRecord> {
    let int = |idx: Option<usize>| -> i64 {
        idx.and_then(|i| row.get(i))
            .and_then(|v| v.parse::<f64>().ok())
            .map(|v| v as i64)
            .unwrap_or(0)
    };
    let float = |idx: Option<usize>| -> f64 {
        idx.and_then(|i| row.get(i))
            .and_then(|v| v.parse().ok())
            .unwrap_or(0.0)
    };

    let games_played = int(games);
    if games_played == 0 {
        return None;
    }

    let icetime_total = float(icetime);
    let toi_per_game = if icetime_total > 0.0 {
        if icetime_total > SECONDS_FORMAT_THRESHOLD {
            round2(icetime_total / games_played as f64 / 60.0)
        } else {
            round2(icetime_total / games_played as f64)
        }
    } else {
        0.0
    };

    let xg_total = float(xg);
    let xg_per_60 = if icetime_total > 0.0 {
        let hours = if icetime_total > SECONDS_FORMAT_THRESHOLD {
            icetime_total / 3600.0
        } else {
            icetime_total / 60.0
        };
        round3(xg_total / hours)
    } else {
        0.0
    };

    Some(SkaterSeasonRecord {
        player_ext_id: int(player_id),
        name: name.and_then(|i| row.get(i)).unwrap_or("").to_string(),
        team: team.and_then(|i| row.get(i)).unwrap_or("").to_string(),
        games_played,
        goals: int(goals),
        assists: int(primary_assists) + int(secondary_assists),
        points: int(points),
        shots: int(shots),
        toi_per_game,
        xg: round2(xg_total),
        xg_per_60,
        corsi_for_pct: round2(as_percentage(float(corsi))),
        fenwick_for_pct: round2(as_percentage(float(fenwick))),
    })
}

/// Possession shares arrive as 0-1 decimals or 0-100 percentages.
fn as_percentage(value: f64) -> f64 {
    if value <= 1.0 {
        value * 100.0
    } else {
        value
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
