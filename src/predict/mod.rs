//! Player-scoring prediction engine.
//!
//! A weighted blend of recent form, season baseline, and head-to-head
//! history, adjusted for home/away splits, opposing goalie quality, and
//! expected game pace. Missing data drops components out of the blend
//! instead of failing the request.

pub mod context;

pub use context::{matchup_context, MatchupContext};

use crate::error::Result;
use crate::season::Season;
use crate::storage::{analysis::DEFAULT_AVG_SHOTS, StatsDatabase};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

// Model weights. The three production components are renormalized over
// whichever of them pass their minimum-games gates; the three adjustments
// are additive modifiers scaled by their weights.
pub const WEIGHT_RECENT_FORM: f64 = 0.30;
pub const WEIGHT_SEASON_BASELINE: f64 = 0.25;
pub const WEIGHT_H2H_HISTORY: f64 = 0.15;
pub const WEIGHT_HOME_AWAY: f64 = 0.10;
pub const WEIGHT_GOALIE_MATCHUP: f64 = 0.10;
pub const WEIGHT_TEAM_PACE: f64 = 0.10;

// Minimum sample sizes for a component to enter the blend.
pub const MIN_GAMES_RECENT: i64 = 3;
pub const MIN_GAMES_SEASON: i64 = 10;
pub const MIN_GAMES_H2H: i64 = 3;

// League averages used for normalization.
pub const LEAGUE_AVG_SAVE_PCT: f64 = 0.905;
pub const LEAGUE_AVG_GOALS_PER_GAME: f64 = 3.10;

/// Games in the recent-form window.
const RECENT_WINDOW: i64 = 5;

/// Confidence tier of a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Low => "low",
        }
    }

    fn from_score(score: f64) -> Self {
        if score >= 0.7 {
            Confidence::High
        } else if score >= 0.4 {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }
}

/// Expected scoring environment of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PaceRating {
    High,
    Average,
    Low,
}

impl PaceRating {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaceRating::High => "high",
            PaceRating::Average => "average",
            PaceRating::Low => "low",
        }
    }

    pub fn from_expected_total(expected_total: f64) -> Self {
        if expected_total >= 6.5 {
            PaceRating::High
        } else if expected_total <= 5.5 {
            PaceRating::Low
        } else {
            PaceRating::Average
        }
    }
}

/// Prediction for a single player in a game.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerPrediction {
    pub player_name: String,
    pub player_id: i64,
    pub team: String,
    pub opponent: String,
    pub is_home: bool,

    pub prob_goal: f64,
    pub prob_point: f64,
    pub prob_multi_point: f64,

    pub expected_goals: f64,
    pub expected_assists: f64,
    pub expected_points: f64,
    pub expected_shots: f64,

    pub recent_form_ppg: f64,
    pub season_avg_ppg: f64,
    pub h2h_ppg: Option<f64>,
    pub home_away_adjustment: f64,
    pub goalie_adjustment: f64,
    pub pace_adjustment: f64,
    pub opponent_goalie: Option<String>,
    pub opponent_goalie_sv_pct: Option<f64>,

    pub confidence: Confidence,
    pub confidence_score: f64,
    pub games_analyzed: i64,
    pub factors: Vec<String>,
}

/// Prediction for a full game matchup.
#[derive(Debug, Clone, Serialize)]
pub struct MatchupPrediction {
    pub game_id: Option<i64>,
    pub game_date: NaiveDate,
    pub home_team: String,
    pub away_team: String,
    pub venue: Option<String>,
    pub start_time: Option<String>,

    pub home_players: Vec<PlayerPrediction>,
    pub away_players: Vec<PlayerPrediction>,
    pub top_scorers: Vec<PlayerPrediction>,

    pub expected_total_goals: f64,
    pub home_expected_goals: f64,
    pub away_expected_goals: f64,
    pub home_goalie: Option<crate::storage::GoalieSummary>,
    pub away_goalie: Option<crate::storage::GoalieSummary>,
    pub pace_rating: PaceRating,
}

/// The engine. Stateless; every call reads through the store gateway.
pub struct PredictionEngine;

impl PredictionEngine {
    pub fn new() -> Self {
        Self
    }

    /// Predictions for both sides of a matchup plus the merged top-5,
    /// ranked by goal probability. Unknown teams yield empty player lists.
    pub fn matchup_prediction(
        &self,
        db: &StatsDatabase,
        home_team: &str,
        away_team: &str,
        game_date: NaiveDate,
        top_n: usize,
    ) -> Result<MatchupPrediction> {
        let season = db
            .latest_season()?
            .unwrap_or_else(|| Season::current(game_date).code());
        let ctx = matchup_context(db, home_team, away_team, &season);
        let game = db.find_game(home_team, away_team, game_date)?;

        let home_players =
            self.team_predictions(db, home_team, away_team, true, game_date, top_n, &ctx, &season)?;
        let away_players =
            self.team_predictions(db, away_team, home_team, false, game_date, top_n, &ctx, &season)?;

        let mut top_scorers: Vec<PlayerPrediction> = home_players
            .iter()
            .chain(away_players.iter())
            .cloned()
            .collect();
        top_scorers.sort_by(|a, b| {
            b.prob_goal
                .partial_cmp(&a.prob_goal)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        top_scorers.truncate(5);

        Ok(MatchupPrediction {
            game_id: game.as_ref().map(|g| g.nhl_game_id),
            game_date,
            home_team: home_team.to_string(),
            away_team: away_team.to_string(),
            venue: game.as_ref().and_then(|g| g.venue.clone()),
            start_time: game
                .as_ref()
                .and_then(|g| g.start_time_utc)
                .map(|t| t.format("%Y-%m-%dT%H:%M:%S").to_string()),
            home_players,
            away_players,
            top_scorers,
            expected_total_goals: ctx.expected_total_goals,
            home_expected_goals: ctx.home_expected_goals,
            away_expected_goals: ctx.away_expected_goals,
            home_goalie: ctx.home.goalie.clone(),
            away_goalie: ctx.away.goalie.clone(),
            pace_rating: PaceRating::from_expected_total(ctx.expected_total_goals),
        })
    }

    /// Prediction for one player, looked up by name fragment. `None` when
    /// no player matches.
    pub fn player_prediction(
        &self,
        db: &StatsDatabase,
        player_name: &str,
        opponent: &str,
        is_home: bool,
        game_date: NaiveDate,
    ) -> Result<Option<PlayerPrediction>> {
        let Some(player) = db.find_player_by_name(player_name)? else {
            return Ok(None);
        };
        let team = player.team.clone().unwrap_or_default();
        let season = db
            .latest_season()?
            .unwrap_or_else(|| Season::current(game_date).code());
        let (home_team, away_team) = if is_home {
            (team.as_str(), opponent)
        } else {
            (opponent, team.as_str())
        };
        let ctx = matchup_context(db, home_team, away_team, &season);
        let prediction = self.calculate(
            db,
            player.id,
            &player.name,
            &team,
            opponent,
            is_home,
            game_date,
            Some(&ctx),
        )?;
        Ok(Some(prediction))
    }

    #[allow(clippy::too_many_arguments)]
    fn team_predictions(
        &self,
        db: &StatsDatabase,
        team: &str,
        opponent: &str,
        is_home: bool,
        game_date: NaiveDate,
        limit: usize,
        ctx: &MatchupContext,
        season: &str,
    ) -> Result<Vec<PlayerPrediction>> {
        let players = db.top_players_by_points(team, season, limit)?;
        let mut predictions = Vec::with_capacity(players.len());
        for (player_id, name) in players {
            let prediction = self.calculate(
                db, player_id, &name, team, opponent, is_home, game_date, Some(ctx),
            )?;
            predictions.push(prediction);
        }
        Ok(predictions)
    }

    /// The weighted model for one player.
    #[allow(clippy::too_many_arguments)]
    pub fn calculate(
        &self,
        db: &StatsDatabase,
        player_id: i64,
        player_name: &str,
        team: &str,
        opponent: &str,
        is_home: bool,
        game_date: NaiveDate,
        ctx: Option<&MatchupContext>,
    ) -> Result<PlayerPrediction> {
        let mut factors = Vec::new();

        let recent = db.recent_form(player_id, game_date, RECENT_WINDOW)?;
        let season = db.season_baseline(player_id)?;
        let h2h = db.h2h_stats(player_id, opponent)?;
        let splits = db.home_away_splits(player_id)?;

        let recent_ppg = (recent.games >= MIN_GAMES_RECENT).then_some(recent.ppg);
        let season_ppg = (season.games >= MIN_GAMES_SEASON).then_some(season.ppg);
        let h2h_ppg = (h2h.games >= MIN_GAMES_H2H).then_some(h2h.ppg);

        if let Some(ppg) = recent_ppg {
            let baseline = season_ppg.unwrap_or(0.0);
            if ppg > baseline * 1.2 {
                factors.push(format!(
                    "Hot streak: {:.2} PPG in last {} games",
                    ppg, recent.games
                ));
            } else if ppg < baseline * 0.8 {
                factors.push(format!(
                    "Cold streak: {:.2} PPG in last {} games",
                    ppg, recent.games
                ));
            }
        }

        if let Some(ppg) = h2h_ppg {
            let baseline = season_ppg.unwrap_or(0.0);
            if ppg > baseline * 1.3 {
                factors.push(format!(
                    "Strong history vs {}: {:.2} PPG in {} games",
                    opponent, ppg, h2h.games
                ));
            } else if ppg < baseline * 0.7 {
                factors.push(format!(
                    "Struggles vs {}: {:.2} PPG in {} games",
                    opponent, ppg, h2h.games
                ));
            }
        }

        let home_away_adjustment = splits.adjustment(is_home);
        if home_away_adjustment.abs() > 0.1 {
            let side = if is_home { "home" } else { "away" };
            let direction = if home_away_adjustment > 0.0 {
                "better"
            } else {
                "worse"
            };
            factors.push(format!(
                "Plays {} {}: {:+.2} PPG adjustment",
                direction, side, home_away_adjustment
            ));
        }

        // Opposing goalie: positive adjustment against weaker netminders.
        let mut goalie_adjustment = 0.0;
        let mut opponent_goalie = None;
        let mut opponent_goalie_sv_pct = None;
        if let Some(ctx) = ctx {
            let opp_goalie = if is_home {
                ctx.away.goalie.as_ref()
            } else {
                ctx.home.goalie.as_ref()
            };
            if let Some(goalie) = opp_goalie {
                opponent_goalie = Some(goalie.name.clone());
                opponent_goalie_sv_pct = Some(goalie.save_pct);
                let sv_diff = LEAGUE_AVG_SAVE_PCT - goalie.save_pct;
                goalie_adjustment = sv_diff * 5.0;
                if sv_diff > 0.01 {
                    factors.push(format!(
                        "Favorable goalie matchup: {} ({:.3} SV%)",
                        goalie.name, goalie.save_pct
                    ));
                } else if sv_diff < -0.01 {
                    factors.push(format!(
                        "Tough goalie matchup: {} ({:.3} SV%)",
                        goalie.name, goalie.save_pct
                    ));
                }
            }
        }

        // Game environment: each half-goal of expected pace moves PPG a bit.
        let mut pace_adjustment = 0.0;
        if let Some(ctx) = ctx {
            let league_avg_total = LEAGUE_AVG_GOALS_PER_GAME * 2.0;
            let pace_diff = ctx.expected_total_goals - league_avg_total;
            pace_adjustment = pace_diff * 0.10;
            if pace_diff > 0.5 {
                factors.push(format!(
                    "High-scoring game expected: {:.1} total goals",
                    ctx.expected_total_goals
                ));
            } else if pace_diff < -0.5 {
                factors.push(format!(
                    "Low-scoring game expected: {:.1} total goals",
                    ctx.expected_total_goals
                ));
            }
        }

        let expected_points = blend_expected_points(
            recent_ppg,
            season_ppg,
            h2h_ppg,
            home_away_adjustment,
            goalie_adjustment,
            pace_adjustment,
        );

        let goal_ratio = if recent.games > 0 {
            recent.goal_ratio
        } else {
            crate::storage::analysis::DEFAULT_GOAL_RATIO
        };
        let expected_goals = expected_points * goal_ratio;
        let expected_assists = expected_points * (1.0 - goal_ratio);

        let prob_goal = if expected_goals > 0.0 {
            1.0 - (-expected_goals).exp()
        } else {
            0.05
        };
        let prob_point = if expected_points > 0.0 {
            1.0 - (-expected_points).exp()
        } else {
            0.10
        };
        let prob_multi_point = if expected_points > 0.0 {
            1.0 - (-expected_points).exp() - expected_points * (-expected_points).exp()
        } else {
            0.02
        };

        let games_analyzed = recent.games + season.games + h2h.games;
        let mut confidence_score = (games_analyzed as f64 / 50.0).min(1.0);
        if ctx.is_some_and(MatchupContext::has_both_goalies) {
            confidence_score = (confidence_score + 0.1).min(1.0);
        }
        let confidence = Confidence::from_score(confidence_score);
        if confidence == Confidence::Low {
            factors.push("Limited data - prediction less reliable".to_string());
        }

        debug!(
            player = player_name,
            opponent,
            expected_points,
            confidence = confidence.as_str(),
            "player_prediction"
        );

        Ok(PlayerPrediction {
            player_name: player_name.to_string(),
            player_id,
            team: team.to_string(),
            opponent: opponent.to_string(),
            is_home,
            prob_goal: round3(prob_goal),
            prob_point: round3(prob_point),
            prob_multi_point: round3(prob_multi_point),
            expected_goals: round2(expected_goals),
            expected_assists: round2(expected_assists),
            expected_points: round2(expected_points),
            expected_shots: round1(if recent.games > 0 {
                recent.avg_shots
            } else {
                DEFAULT_AVG_SHOTS
            }),
            recent_form_ppg: round2(recent_ppg.unwrap_or(0.0)),
            season_avg_ppg: round2(season_ppg.unwrap_or(0.0)),
            h2h_ppg: h2h_ppg.map(round2),
            home_away_adjustment: round2(home_away_adjustment),
            goalie_adjustment: round2(goalie_adjustment),
            pace_adjustment: round2(pace_adjustment),
            opponent_goalie,
            opponent_goalie_sv_pct: opponent_goalie_sv_pct.map(round3),
            confidence,
            confidence_score: round2(confidence_score),
            games_analyzed,
            factors,
        })
    }
}

impl Default for PredictionEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Blend the gated production components (weights renormalized over the
/// available subset), then apply the weighted additive adjustments and
/// clamp at zero.
pub fn blend_expected_points(
    recent_ppg: Option<f64>,
    season_ppg: Option<f64>,
    h2h_ppg: Option<f64>,
    home_away_adjustment: f64,
    goalie_adjustment: f64,
    pace_adjustment: f64,
) -> f64 {
    let components = [
        (recent_ppg, WEIGHT_RECENT_FORM),
        (season_ppg, WEIGHT_SEASON_BASELINE),
        (h2h_ppg, WEIGHT_H2H_HISTORY),
    ];
    let total_weight: f64 = components
        .iter()
        .filter(|(value, _)| value.is_some())
        .map(|(_, weight)| weight)
        .sum();

    let mut expected_points = 0.0;
    if total_weight > 0.0 {
        for (value, weight) in components {
            if let Some(value) = value {
                expected_points += value * (weight / total_weight);
            }
        }
    }

    expected_points += home_away_adjustment * WEIGHT_HOME_AWAY;
    expected_points += goalie_adjustment * WEIGHT_GOALIE_MATCHUP;
    expected_points += pace_adjustment * WEIGHT_TEAM_PACE;
    expected_points.max(0.0)
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
