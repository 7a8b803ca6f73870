//! League stats API adapter: goalie and team season summaries, plus the
//! standings feed used to seed the teams table.

use crate::config::Config;
use crate::error::Result;
use crate::season::Season;
use crate::sources::SourceClient;
use crate::teams;
use serde_json::Value;
use tracing::warn;

/// A goalie's season line from the stats API.
#[derive(Debug, Clone)]
pub struct GoalieSeasonRecord {
    pub player_ext_id: i64,
    pub name: String,
    pub team: Option<String>,
    pub games_played: i64,
    pub games_started: i64,
    pub wins: i64,
    pub losses: i64,
    pub ot_losses: i64,
    pub save_pct: Option<f64>,
    pub goals_against_avg: Option<f64>,
    pub shutouts: i64,
    pub shots_against: Option<i64>,
    pub saves: Option<i64>,
    pub time_on_ice: Option<i64>,
}

/// A team's season line, with the derived combined pace metric.
#[derive(Debug, Clone)]
pub struct TeamSeasonRecord {
    pub team: String,
    pub games_played: i64,
    pub wins: i64,
    pub losses: i64,
    pub ot_losses: i64,
    pub points: i64,
    pub goals_for: i64,
    pub goals_for_per_game: Option<f64>,
    pub shots_for_per_game: Option<f64>,
    pub power_play_pct: Option<f64>,
    pub goals_against: i64,
    pub goals_against_per_game: Option<f64>,
    pub shots_against_per_game: Option<f64>,
    pub penalty_kill_pct: Option<f64>,
    pub total_goals_per_game: f64,
}

/// A franchise row from the standings feed.
#[derive(Debug, Clone)]
pub struct StandingsTeam {
    pub code: String,
    pub name: String,
    pub conference: Option<String>,
    pub division: Option<String>,
}

/// Fetch all goalie season summaries. Empty on source failure.
pub async fn fetch_goalie_stats(
    client: &SourceClient,
    config: &Config,
    season: Season,
) -> Result<Vec<GoalieSeasonRecord>> {
    let url = format!("{}/goalie/summary", config.stats_api_base);
    let cayenne = format!("seasonId={} and gameTypeId=2", season.code());
    let payload = match client
        .get_json_with_params(
            &url,
            &[
                ("cayenneExp", cayenne.as_str()),
                ("limit", "200"),
                ("sort", "wins"),
                ("direction", "DESC"),
            ],
        )
        .await
    {
        Ok(payload) => payload,
        Err(e) => {
            warn!(season = %season, error = %e, "goalie_stats_fetch_failed");
            return Ok(Vec::new());
        }
    };
    Ok(payload
        .get("data")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(parse_goalie)
        .collect())
}

fn parse_goalie(row: &Value) -> Option<GoalieSeasonRecord> {
    let player_ext_id = row.get("playerId").and_then(Value::as_i64)?;
    let int = |key: &str| row.get(key).and_then(Value::as_i64).unwrap_or(0);

    // Traded goalies arrive with comma-separated team lists; keep the first.
    let team = row
        .get("teamAbbrevs")
        .and_then(Value::as_str)
        .and_then(|s| s.split(',').next())
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    Some(GoalieSeasonRecord {
        player_ext_id,
        name: row
            .get("goalieFullName")
            .and_then(Value::as_str)
            .unwrap_or("Unknown")
            .to_string(),
        team,
        games_played: int("gamesPlayed"),
        games_started: int("gamesStarted"),
        wins: int("wins"),
        losses: int("losses"),
        ot_losses: int("otLosses"),
        save_pct: row.get("savePct").and_then(Value::as_f64),
        goals_against_avg: row.get("goalsAgainstAverage").and_then(Value::as_f64),
        shutouts: int("shutouts"),
        shots_against: row.get("shotsAgainst").and_then(Value::as_i64),
        saves: row.get("saves").and_then(Value::as_i64),
        time_on_ice: row.get("timeOnIce").and_then(Value::as_i64),
    })
}

/// Fetch all team season summaries. Teams whose display name is not in the
/// franchise table are dropped with a warning. Empty on source failure.
pub async fn fetch_team_stats(
    client: &SourceClient,
    config: &Config,
    season: Season,
) -> Result<Vec<TeamSeasonRecord>> {
    let url = format!("{}/team/summary", config.stats_api_base);
    let cayenne = format!("seasonId={} and gameTypeId=2", season.code());
    let payload = match client
        .get_json_with_params(&url, &[("cayenneExp", cayenne.as_str()), ("limit", "50")])
        .await
    {
        Ok(payload) => payload,
        Err(e) => {
            warn!(season = %season, error = %e, "team_stats_fetch_failed");
            return Ok(Vec::new());
        }
    };
    Ok(payload
        .get("data")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(parse_team)
        .collect())
}

pub fn parse_team(row: &Value) -> Option<TeamSeasonRecord> {
    let name = row.get("teamFullName").and_then(Value::as_str).unwrap_or("");
    let Some(code) = teams::code_for_display_name(name) else {
        warn!(team_name = name, "unknown_team_in_summary");
        return None;
    };
    let int = |key: &str| row.get(key).and_then(Value::as_i64).unwrap_or(0);
    let float = |key: &str| row.get(key).and_then(Value::as_f64);

    let games_played = int("gamesPlayed").max(1);
    let goals_for = int("goalsFor");
    let goals_against = int("goalsAgainst");

    Some(TeamSeasonRecord {
        team: code.to_string(),
        games_played,
        wins: int("wins"),
        losses: int("losses"),
        ot_losses: int("otLosses"),
        points: int("points"),
        goals_for,
        goals_for_per_game: float("goalsForPerGame"),
        shots_for_per_game: float("shotsForPerGame"),
        power_play_pct: float("powerPlayPct"),
        goals_against,
        goals_against_per_game: float("goalsAgainstPerGame"),
        shots_against_per_game: float("shotsAgainstPerGame"),
        penalty_kill_pct: float("penaltyKillPct"),
        total_goals_per_game: (goals_for + goals_against) as f64 / games_played as f64,
    })
}

/// Fetch current standings and project the franchise rows. Empty on failure.
pub async fn fetch_standings_teams(
    client: &SourceClient,
    config: &Config,
) -> Result<Vec<StandingsTeam>> {
    let url = format!("{}/standings/now", config.league_api_base);
    let payload = match client.get_json(&url).await {
        Ok(payload) => payload,
        Err(e) => {
            warn!(error = %e, "standings_fetch_failed");
            return Ok(Vec::new());
        }
    };
    Ok(payload
        .get("standings")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|row| {
            let code = row.pointer("/teamAbbrev/default").and_then(Value::as_str)?;
            Some(StandingsTeam {
                code: code.to_string(),
                name: row
                    .pointer("/teamName/default")
                    .and_then(Value::as_str)
                    .unwrap_or(code)
                    .to_string(),
                conference: row
                    .get("conferenceName")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                division: row
                    .get("divisionName")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            })
        })
        .collect())
}
