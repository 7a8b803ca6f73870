//! League schedule adapter.

use crate::config::Config;
use crate::error::Result;
use crate::sources::SourceClient;
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;
use tracing::warn;

/// A scheduled or completed game as projected from the schedule feed.
#[derive(Debug, Clone)]
pub struct GameRecord {
    pub game_id: i64,
    pub season: String,
    pub game_type: i64,
    pub game_date: NaiveDate,
    pub start_time_utc: Option<NaiveDateTime>,
    pub venue: Option<String>,
    pub home_team: String,
    pub away_team: String,
    pub home_score: Option<i64>,
    pub away_score: Option<i64>,
    pub game_state: String,
    pub is_completed: bool,
}

/// Fetch the schedule week containing `date` and project every game.
///
/// The feed returns a `gameWeek` of per-day buckets; the bucket's own date
/// is the game date in the league's local calendar and takes precedence
/// over the date derived from the UTC start time (evening games land on
/// the next UTC day). Returns an empty list when the source is down.
pub async fn fetch_schedule_for_date(
    client: &SourceClient,
    config: &Config,
    date: NaiveDate,
) -> Result<Vec<GameRecord>> {
    let url = format!("{}/schedule/{}", config.league_api_base, date.format("%Y-%m-%d"));
    let payload = match client.get_json(&url).await {
        Ok(payload) => payload,
        Err(e) => {
            warn!(%date, error = %e, "schedule_fetch_failed");
            return Ok(Vec::new());
        }
    };

    let mut games = Vec::new();
    for day in payload
        .get("gameWeek")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
    {
        let day_date = day
            .get("date")
            .and_then(Value::as_str)
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok());
        for game in day.get("games").and_then(Value::as_array).into_iter().flatten() {
            if let Some(record) = parse_game(game, day_date) {
                games.push(record);
            }
        }
    }
    Ok(games)
}

/// Project one schedule entry. Returns `None` when the entry is missing
/// its id, teams, or any usable date.
pub fn parse_game(game: &Value, day_date: Option<NaiveDate>) -> Option<GameRecord> {
    let game_id = game.get("id").and_then(Value::as_i64)?;
    let home = game.pointer("/homeTeam/abbrev").and_then(Value::as_str)?;
    let away = game.pointer("/awayTeam/abbrev").and_then(Value::as_str)?;

    let start_time_utc = game
        .get("startTimeUTC")
        .and_then(Value::as_str)
        .and_then(parse_utc_timestamp);

    let game_date = day_date.or_else(|| start_time_utc.map(|t| t.date()))?;

    let game_state = game
        .get("gameState")
        .and_then(Value::as_str)
        .unwrap_or("FUT")
        .to_string();
    let is_completed = matches!(game_state.as_str(), "FINAL" | "OFF");

    Some(GameRecord {
        game_id,
        season: game
            .get("season")
            .and_then(Value::as_i64)
            .map(|s| s.to_string())
            .unwrap_or_default(),
        game_type: game.get("gameType").and_then(Value::as_i64).unwrap_or(2),
        game_date,
        start_time_utc,
        venue: game
            .pointer("/venue/default")
            .or_else(|| game.get("venue"))
            .and_then(Value::as_str)
            .map(str::to_string),
        home_team: home.to_string(),
        away_team: away.to_string(),
        home_score: game.pointer("/homeTeam/score").and_then(Value::as_i64),
        away_score: game.pointer("/awayTeam/score").and_then(Value::as_i64),
        game_state,
        is_completed,
    })
}

fn parse_utc_timestamp(raw: &str) -> Option<NaiveDateTime> {
    chrono::DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.naive_utc())
}
