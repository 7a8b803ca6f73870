//! Matchup context: team pace and goalie summaries feeding the model's
//! goalie and pace adjustments.

use crate::error::Result;
use crate::storage::{GoalieSummary, StatsDatabase, TeamPace};
use serde::Serialize;
use tracing::warn;

/// League-average total goals per game when pace data is missing.
pub const DEFAULT_EXPECTED_TOTAL: f64 = 6.0;

/// League-average goals per team when pace data is missing.
pub const DEFAULT_TEAM_EXPECTED: f64 = 3.0;

/// Pace and goalie context for one side of a matchup.
#[derive(Debug, Clone, Serialize)]
pub struct TeamContext {
    pub team: String,
    pub pace: Option<TeamPace>,
    pub goalie: Option<GoalieSummary>,
}

/// Full matchup context for a game.
#[derive(Debug, Clone, Serialize)]
pub struct MatchupContext {
    pub home: TeamContext,
    pub away: TeamContext,
    pub expected_total_goals: f64,
    pub home_expected_goals: f64,
    pub away_expected_goals: f64,
}

impl MatchupContext {
    /// League-average defaults for when context collection fails.
    pub fn default_for(home_team: &str, away_team: &str) -> Self {
        Self {
            home: TeamContext {
                team: home_team.to_string(),
                pace: None,
                goalie: None,
            },
            away: TeamContext {
                team: away_team.to_string(),
                pace: None,
                goalie: None,
            },
            expected_total_goals: DEFAULT_EXPECTED_TOTAL,
            home_expected_goals: DEFAULT_TEAM_EXPECTED,
            away_expected_goals: DEFAULT_TEAM_EXPECTED,
        }
    }

    pub fn has_both_goalies(&self) -> bool {
        self.home.goalie.is_some() && self.away.goalie.is_some()
    }
}

/// Build the matchup context from stored team and goalie stats. Missing
/// pace rows fall back to league averages; a store error degrades to the
/// default context rather than failing the prediction.
pub fn matchup_context(
    db: &StatsDatabase,
    home_team: &str,
    away_team: &str,
    season: &str,
) -> MatchupContext {
    match build_context(db, home_team, away_team, season) {
        Ok(ctx) => ctx,
        Err(e) => {
            warn!(home_team, away_team, error = %e, "matchup_context_unavailable");
            MatchupContext::default_for(home_team, away_team)
        }
    }
}

fn build_context(
    db: &StatsDatabase,
    home_team: &str,
    away_team: &str,
    season: &str,
) -> Result<MatchupContext> {
    let home_pace = db.team_pace(home_team, season)?;
    let away_pace = db.team_pace(away_team, season)?;
    let home_goalie = db.starting_goalie(home_team, season)?;
    let away_goalie = db.starting_goalie(away_team, season)?;

    let (expected_total, home_expected, away_expected) = match (&home_pace, &away_pace) {
        (Some(home), Some(away)) => (
            (home.total_goals_per_game + away.total_goals_per_game) / 2.0,
            (home.goals_for_per_game + away.goals_against_per_game) / 2.0,
            (away.goals_for_per_game + home.goals_against_per_game) / 2.0,
        ),
        _ => (
            DEFAULT_EXPECTED_TOTAL,
            DEFAULT_TEAM_EXPECTED,
            DEFAULT_TEAM_EXPECTED,
        ),
    };

    Ok(MatchupContext {
        home: TeamContext {
            team: home_team.to_string(),
            pace: home_pace,
            goalie: home_goalie,
        },
        away: TeamContext {
            team: away_team.to_string(),
            pace: away_pace,
            goalie: away_goalie,
        },
        expected_total_goals: round2(expected_total),
        home_expected_goals: round2(home_expected),
        away_expected_goals: round2(away_expected),
    })
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
