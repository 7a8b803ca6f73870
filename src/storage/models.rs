//! Row types returned by the storage gateway.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

/// A player row.
#[derive(Debug, Clone, Serialize)]
pub struct Player {
    pub id: i64,
    pub nhl_id: i64,
    pub name: String,
    pub position: Option<String>,
    pub team: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub cap_hit_cents: Option<i64>,
}

/// A scheduled or completed game row.
#[derive(Debug, Clone, Serialize)]
pub struct GameRow {
    pub nhl_game_id: i64,
    pub season: String,
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

/// One game from a player's stored log, joined with the player's name.
#[derive(Debug, Clone, Serialize)]
pub struct GameLogRow {
    pub player_name: String,
    pub game_date: NaiveDate,
    pub team: Option<String>,
    pub opponent: Option<String>,
    pub home_away: Option<String>,
    pub goals: i64,
    pub assists: i64,
    pub points: i64,
    pub shots: i64,
    pub toi_minutes: f64,
}

/// A player's stat line for display (latest season row).
#[derive(Debug, Clone, Serialize)]
pub struct PlayerStatLine {
    pub name: String,
    pub position: Option<String>,
    pub team: Option<String>,
    pub season: Option<String>,
    pub games_played: Option<i64>,
    pub goals: Option<i64>,
    pub assists: Option<i64>,
    pub points: Option<i64>,
    pub xg: Option<f64>,
    pub corsi_for_pct: Option<f64>,
    pub toi_per_game: Option<f64>,
}

/// One row of a leaders table.
#[derive(Debug, Clone, Serialize)]
pub struct LeaderRow {
    pub rank: i64,
    pub name: String,
    pub position: Option<String>,
    pub team: Option<String>,
    pub season: String,
    pub games_played: i64,
    pub goals: i64,
    pub assists: i64,
    pub points: i64,
    pub xg: Option<f64>,
    pub corsi_for_pct: Option<f64>,
    /// The value of the stat the table is ranked by.
    pub stat_value: f64,
}

/// Aggregated recent form over a player's last N games.
#[derive(Debug, Clone, Default)]
pub struct RecentForm {
    pub games: i64,
    pub ppg: f64,
    pub gpg: f64,
    pub avg_shots: f64,
    pub goal_ratio: f64,
}

/// A player's season baseline aggregate.
#[derive(Debug, Clone, Default)]
pub struct SeasonBaseline {
    pub games: i64,
    pub ppg: f64,
    pub gpg: f64,
    pub xg_per_game: f64,
}

/// Career aggregate against one opponent.
#[derive(Debug, Clone, Default)]
pub struct H2hAggregate {
    pub games: i64,
    pub ppg: f64,
    pub gpg: f64,
}

/// Career points-per-game split by side.
#[derive(Debug, Clone, Default)]
pub struct HomeAwaySplits {
    pub home_ppg: f64,
    pub away_ppg: f64,
}

impl HomeAwaySplits {
    /// Difference between the requested side and the player's two-side mean.
    pub fn adjustment(&self, is_home: bool) -> f64 {
        let total = self.home_ppg + self.away_ppg;
        let avg = if total > 0.0 { total / 2.0 } else { 0.0 };
        if is_home {
            self.home_ppg - avg
        } else {
            self.away_ppg - avg
        }
    }
}

/// A team's starting goalie (most games started) for a season.
#[derive(Debug, Clone, Serialize)]
pub struct GoalieSummary {
    pub name: String,
    pub save_pct: f64,
    pub gaa: f64,
    pub games_started: i64,
    pub wins: i64,
    pub losses: i64,
    pub shutouts: i64,
}

/// A team's pace metrics for a season.
#[derive(Debug, Clone, Serialize)]
pub struct TeamPace {
    pub goals_for_per_game: f64,
    pub goals_against_per_game: f64,
    pub total_goals_per_game: f64,
    pub shots_for_per_game: f64,
    pub shots_against_per_game: f64,
    pub power_play_pct: f64,
    pub penalty_kill_pct: f64,
}

/// An active injury joined with the player's name.
#[derive(Debug, Clone, Serialize)]
pub struct InjuryReportRow {
    pub player_name: String,
    pub player_nhl_id: i64,
    pub team: Option<String>,
    pub status: String,
    pub description: Option<String>,
    pub reported_date: Option<NaiveDate>,
}

/// Outcome of writing one injury report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjuryWrite {
    Updated,
    Inserted,
    PlayerUnknown,
}

/// A trade-value line for one player.
#[derive(Debug, Clone, Serialize)]
pub struct TradeValue {
    pub name: String,
    pub team: Option<String>,
    pub games_played: i64,
    pub points: i64,
    pub xg: f64,
    pub corsi_for_pct: f64,
    pub value: f64,
}

/// A document returned from similarity search.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentHit {
    pub id: i64,
    pub title: Option<String>,
    pub source: Option<String>,
    pub content: String,
    pub url: Option<String>,
    pub similarity: f64,
}

/// Table counts plus the most recent season with data.
#[derive(Debug, Clone, Serialize)]
pub struct DataStatus {
    pub players: i64,
    pub season_stats: i64,
    pub game_logs: i64,
    pub goalie_stats: i64,
    pub team_stats: i64,
    pub games: i64,
    pub active_injuries: i64,
    pub documents: i64,
    pub latest_season: Option<String>,
}
