//! Player game-log adapter.

use crate::config::Config;
use crate::error::Result;
use crate::season::Season;
use crate::sources::SourceClient;
use chrono::NaiveDate;
use serde_json::Value;
use tracing::warn;

/// Regular-season games.
const GAME_TYPE_REGULAR: u8 = 2;

/// Which side of the ice the player's team was on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HomeAway {
    Home,
    Away,
}

impl HomeAway {
    pub fn as_str(&self) -> &'static str {
        match self {
            HomeAway::Home => "home",
            HomeAway::Away => "away",
        }
    }
}

/// One game from a player's season log.
#[derive(Debug, Clone)]
pub struct GameLogEntry {
    pub game_id: i64,
    pub game_date: NaiveDate,
    pub team: Option<String>,
    pub opponent: Option<String>,
    pub home_away: HomeAway,
    pub goals: i64,
    pub assists: i64,
    pub points: i64,
    pub shots: i64,
    pub toi_minutes: f64,
    pub plus_minus: i64,
    pub pim: i64,
    pub powerplay_goals: i64,
    pub powerplay_points: i64,
    pub shorthanded_goals: i64,
    pub shorthanded_points: i64,
    pub game_winning_goals: i64,
    pub overtime_goals: i64,
    pub shifts: Option<i64>,
}

/// Fetch a player's full regular-season game log. Any HTTP error yields an
/// empty list; the caller treats that as "nothing new this run".
pub async fn fetch_player_game_log(
    client: &SourceClient,
    config: &Config,
    player_ext_id: i64,
    season: Season,
) -> Result<Vec<GameLogEntry>> {
    let url = format!(
        "{}/player/{}/game-log/{}/{}",
        config.league_api_base,
        player_ext_id,
        season.code(),
        GAME_TYPE_REGULAR
    );
    let payload = match client.get_json(&url).await {
        Ok(payload) => payload,
        Err(e) => {
            warn!(player_ext_id, error = %e, "game_log_fetch_failed");
            return Ok(Vec::new());
        }
    };
    Ok(payload
        .get("gameLog")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(parse_entry)
        .collect())
}

/// Project one game-log entry; entries without a game id or date are dropped.
pub fn parse_entry(entry: &Value) -> Option<GameLogEntry> {
    let game_id = entry.get("gameId").and_then(Value::as_i64)?;
    let game_date = entry
        .get("gameDate")
        .and_then(Value::as_str)
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())?;

    let int = |key: &str| entry.get(key).and_then(Value::as_i64).unwrap_or(0);
    let home_away = match entry.get("homeRoadFlag").and_then(Value::as_str) {
        Some("H") => HomeAway::Home,
        _ => HomeAway::Away,
    };

    Some(GameLogEntry {
        game_id,
        game_date,
        team: entry
            .get("teamAbbrev")
            .and_then(Value::as_str)
            .map(str::to_string),
        opponent: entry
            .get("opponentAbbrev")
            .and_then(Value::as_str)
            .map(str::to_string),
        home_away,
        goals: int("goals"),
        assists: int("assists"),
        points: int("points"),
        shots: int("shots"),
        toi_minutes: parse_toi(entry.get("toi").and_then(Value::as_str).unwrap_or("0:00")),
        plus_minus: int("plusMinus"),
        pim: int("pim"),
        powerplay_goals: int("powerPlayGoals"),
        powerplay_points: int("powerPlayPoints"),
        shorthanded_goals: int("shorthandedGoals"),
        shorthanded_points: int("shorthandedPoints"),
        game_winning_goals: int("gameWinningGoals"),
        overtime_goals: int("otGoals"),
        shifts: entry.get("shifts").and_then(Value::as_i64),
    })
}

/// Parse a `MM:SS` time-on-ice string into decimal minutes, rounded to two
/// decimals. Malformed input parses to 0.0.
pub fn parse_toi(toi: &str) -> f64 {
    let mut parts = toi.split(':');
    let minutes: u32 = match parts.next().and_then(|m| m.parse().ok()) {
        Some(m) => m,
        None => return 0.0,
    };
    let seconds: u32 = parts.next().and_then(|s| s.parse().ok()).unwrap_or(0);
    ((minutes as f64 + seconds as f64 / 60.0) * 100.0).round() / 100.0
}
