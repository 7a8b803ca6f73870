//! Markdown renderers for the context sections handed to the generator.

use crate::predict::{MatchupPrediction, PlayerPrediction};
use crate::storage::{GameRow, InjuryReportRow, LeaderRow, PlayerStatLine};
use chrono::NaiveDate;
use std::collections::BTreeMap;

use super::trade::TradeComparison;

/// Title-case a stat name the way report headers expect ("xg" -> "Xg",
/// "expected goals" -> "Expected Goals").
pub fn title_case(raw: &str) -> String {
    raw.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render an 8-digit season code for display: "20152016" -> "2015-16".
pub fn display_season(code: &str) -> String {
    if code.len() == 8 {
        format!("{}-{}", &code[..4], &code[6..8])
    } else {
        code.to_string()
    }
}

/// Long-form date: "February 03, 2026".
pub fn long_date(date: NaiveDate) -> String {
    date.format("%B %d, %Y").to_string()
}

/// League leaders table.
pub fn format_leaders(rows: &[LeaderRow], stat_label: &str, limit: usize) -> Option<String> {
    if rows.is_empty() {
        return None;
    }
    let season = display_season(&rows[0].season);
    let mut lines = vec![format!(
        "**Top {} players by {} ({} season):**\n",
        limit, stat_label, season
    )];
    for row in rows {
        lines.push(format!(
            "{}. **{}** ({}, {}):\n   GP: {}, G: {}, A: {}, P: {}, xG: {:.1}, CF%: {:.1}",
            row.rank,
            row.name,
            row.position.as_deref().unwrap_or("F"),
            row.team.as_deref().unwrap_or("-"),
            row.games_played,
            row.goals,
            row.assists,
            row.points,
            row.xg.unwrap_or(0.0),
            row.corsi_for_pct.unwrap_or(0.0),
        ));
    }
    Some(lines.join("\n"))
}

/// Roster ranking for one or more named teams.
pub fn format_team_players(
    team_codes: &[String],
    rows: &[LeaderRow],
    stat_label: &str,
) -> Option<String> {
    if rows.is_empty() {
        return None;
    }
    let season = display_season(&rows[0].season);
    let mut lines = vec![format!(
        "**{} players ranked by {} ({} season):**\n",
        team_codes.join(", "),
        stat_label,
        season
    )];
    for row in rows {
        lines.push(format!(
            "{}. **{}** ({}, {}):\n   GP: {}, G: {}, A: {}, P: {}, xG: {:.1}",
            row.rank,
            row.name,
            row.position.as_deref().unwrap_or("F"),
            row.team.as_deref().unwrap_or("-"),
            row.games_played,
            row.goals,
            row.assists,
            row.points,
            row.xg.unwrap_or(0.0),
        ));
    }
    Some(lines.join("\n"))
}

/// Per-team top-N breakdown across the league.
pub fn format_all_teams_breakdown(
    rows: &[LeaderRow],
    stat_label: &str,
    top_n: usize,
) -> Option<String> {
    if rows.is_empty() {
        return None;
    }
    let season = display_season(&rows[0].season);
    let mut by_team: BTreeMap<&str, Vec<&LeaderRow>> = BTreeMap::new();
    for row in rows {
        by_team
            .entry(row.team.as_deref().unwrap_or("-"))
            .or_default()
            .push(row);
    }

    let mut sections = vec![format!(
        "**Top {} players by {} on each team ({} season):**\n",
        top_n, stat_label, season
    )];
    for (team, players) in by_team {
        let mut lines = vec![format!("\n**{}:**", team)];
        for row in players {
            lines.push(format!(
                "  {}. {}: {} {}",
                row.rank,
                row.name,
                trim_stat_value(row.stat_value),
                stat_label.to_lowercase()
            ));
        }
        sections.push(lines.join("\n"));
    }
    Some(sections.join("\n"))
}

/// Integer stats print clean; rate stats keep a decimal.
fn trim_stat_value(value: f64) -> String {
    if (value.fract()).abs() < f64::EPSILON {
        format!("{}", value as i64)
    } else {
        format!("{:.1}", value)
    }
}

/// Per-player stat lines for direct lookups.
pub fn format_player_stats(lines: &[PlayerStatLine]) -> Option<String> {
    if lines.is_empty() {
        return None;
    }
    let mut sections = Vec::new();
    for line in lines {
        sections.push(format!(
            "**{}** ({}, {}) - {}:\n  GP: {}, G: {}, A: {}, P: {}\n  xG: {:.1}, CF%: {:.1}, TOI/G: {:.1}",
            line.name,
            line.position.as_deref().unwrap_or("F"),
            line.team.as_deref().unwrap_or("-"),
            line.season
                .as_deref()
                .map(display_season)
                .unwrap_or_else(|| "Career".to_string()),
            line.games_played.unwrap_or(0),
            line.goals.unwrap_or(0),
            line.assists.unwrap_or(0),
            line.points.unwrap_or(0),
            line.xg.unwrap_or(0.0),
            line.corsi_for_pct.unwrap_or(0.0),
            line.toi_per_game.unwrap_or(0.0),
        ));
    }
    Some(sections.join("\n\n"))
}

/// Full matchup prediction narrative.
pub fn format_matchup_prediction(prediction: &MatchupPrediction) -> String {
    let mut lines = vec![format!(
        "**{} @ {}** - {}",
        prediction.away_team,
        prediction.home_team,
        long_date(prediction.game_date)
    )];

    if let Some(venue) = &prediction.venue {
        lines.push(format!("*{}*", venue));
    }

    lines.push(format!(
        "\n**Game Environment:** Expected {:.1} total goals ({} pace)",
        prediction.expected_total_goals,
        prediction.pace_rating.as_str()
    ));

    if prediction.home_goalie.is_some() || prediction.away_goalie.is_some() {
        lines.push("\n**Goalie Matchup:**".to_string());
        if let Some(goalie) = &prediction.home_goalie {
            lines.push(format!(
                "- {}: {} ({:.3} SV%, {:.2} GAA)",
                prediction.home_team, goalie.name, goalie.save_pct, goalie.gaa
            ));
        }
        if let Some(goalie) = &prediction.away_goalie {
            lines.push(format!(
                "- {}: {} ({:.3} SV%, {:.2} GAA)",
                prediction.away_team, goalie.name, goalie.save_pct, goalie.gaa
            ));
        }
    }

    lines.push("\n**Most Likely Scorers:**".to_string());
    for (i, player) in prediction.top_scorers.iter().take(5).enumerate() {
        lines.push(format!(
            "{}. **{}** ({}) - {}% goal probability, {}% point probability",
            i + 1,
            player.player_name,
            player.team,
            pct(player.prob_goal),
            pct(player.prob_point)
        ));
        lines.push(format!(
            "   Expected: {:.2}G, {:.2}A, {:.2}P",
            player.expected_goals, player.expected_assists, player.expected_points
        ));
        if !player.factors.is_empty() {
            lines.push(format!(
                "   _{}_",
                player
                    .factors
                    .iter()
                    .take(2)
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(" | ")
            ));
        }
        lines.push(format!(
            "   Confidence: {} ({}%)",
            player.confidence.as_str(),
            pct(player.confidence_score)
        ));
    }

    lines.push(format!("\n**{} (Home) Key Players:**", prediction.home_team));
    for player in prediction.home_players.iter().take(3) {
        lines.push(key_player_line(player));
    }
    lines.push(format!("\n**{} (Away) Key Players:**", prediction.away_team));
    for player in prediction.away_players.iter().take(3) {
        lines.push(key_player_line(player));
    }

    lines.join("\n")
}

fn key_player_line(player: &PlayerPrediction) -> String {
    let goalie_note = player
        .opponent_goalie
        .as_deref()
        .map(|g| format!(" (vs {})", g))
        .unwrap_or_default();
    format!(
        "- {}: {}% goal, {:.2} expected points{}",
        player.player_name,
        pct(player.prob_goal),
        player.expected_points,
        goalie_note
    )
}

/// A slate of games with their top scorers and overall best bets.
pub fn format_slate(
    date: NaiveDate,
    today: NaiveDate,
    games: &[GameRow],
    matchups: &[MatchupPrediction],
) -> String {
    let date_label = if date == today {
        "Tonight's".to_string()
    } else {
        date.format("%A, %B %d").to_string()
    };
    let mut lines = vec![format!("**{} Games - {}**\n", date_label, long_date(date))];

    let mut all_top_scorers: Vec<&PlayerPrediction> = Vec::new();
    for matchup in matchups {
        all_top_scorers.extend(matchup.top_scorers.iter());
        lines.push(format!("\n### {} @ {}", matchup.away_team, matchup.home_team));
        if let Some(venue) = games
            .iter()
            .find(|g| g.home_team == matchup.home_team && g.away_team == matchup.away_team)
            .and_then(|g| g.venue.as_deref())
        {
            lines.push(format!("*{}*", venue));
        }
        lines.push("\n**Top Goal Scorers:**".to_string());
        for (i, player) in matchup.top_scorers.iter().take(3).enumerate() {
            lines.push(format!(
                "{}. **{}** ({}) - {}% chance to score",
                i + 1,
                player.player_name,
                player.team,
                pct(player.prob_goal)
            ));
            if let Some(factor) = player.factors.first() {
                lines.push(format!("   _{}_", factor));
            }
        }
    }

    all_top_scorers.sort_by(|a, b| {
        b.prob_goal
            .partial_cmp(&a.prob_goal)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    if !all_top_scorers.is_empty() {
        lines.push("\n### Overall Best Bets".to_string());
        for (i, player) in all_top_scorers.iter().take(5).enumerate() {
            let matchup_str = if player.is_home {
                format!("vs {}", player.opponent)
            } else {
                format!("@ {}", player.opponent)
            };
            lines.push(format!(
                "{}. **{}** ({} {}) - {}% goal, {}% point",
                i + 1,
                player.player_name,
                player.team,
                matchup_str,
                pct(player.prob_goal),
                pct(player.prob_point)
            ));
        }
    }

    lines.join("\n")
}

/// Current injuries, grouped under their team codes.
pub fn format_injuries(rows: &[InjuryReportRow]) -> Option<String> {
    if rows.is_empty() {
        return None;
    }
    let mut by_team: BTreeMap<&str, Vec<&InjuryReportRow>> = BTreeMap::new();
    for row in rows {
        by_team
            .entry(row.team.as_deref().unwrap_or("-"))
            .or_default()
            .push(row);
    }
    let mut sections = Vec::new();
    for (team, injuries) in by_team {
        let mut lines = vec![format!("**{}:**", team)];
        for injury in injuries {
            let detail = injury
                .description
                .as_deref()
                .map(|d| format!(" - {}", d))
                .unwrap_or_default();
            lines.push(format!(
                "- {} ({}){}",
                injury.player_name, injury.status, detail
            ));
        }
        sections.push(lines.join("\n"));
    }
    Some(sections.join("\n\n"))
}

/// Trade-value comparison table.
pub fn format_trade(comparison: &TradeComparison) -> String {
    let mut lines = vec!["**Trade Value Assessment:**\n".to_string()];
    for input in &comparison.inputs {
        lines.push(format!(
            "- **{}** ({}): value {:.1} ({} P in {} GP, {:.1} xG, {:.1} CF%)",
            input.name,
            input.team.as_deref().unwrap_or("-"),
            input.value,
            input.points,
            input.games_played,
            input.xg,
            input.corsi_for_pct
        ));
    }
    lines.push(format!(
        "\nCombined value: {:.1} (fair-return band {:.1} - {:.1})",
        comparison.total_value, comparison.band_low, comparison.band_high
    ));
    if comparison.candidates.is_empty() {
        lines.push("\nNo comparable players found in the current season.".to_string());
    } else {
        lines.push("\n**Comparable Value Players:**".to_string());
        for (i, candidate) in comparison.candidates.iter().enumerate() {
            lines.push(format!(
                "{}. {} ({}): value {:.1} ({} P in {} GP)",
                i + 1,
                candidate.name,
                candidate.team.as_deref().unwrap_or("-"),
                candidate.value,
                candidate.points,
                candidate.games_played
            ));
        }
    }
    lines.join("\n")
}

fn pct(probability: f64) -> i64 {
    (probability * 100.0) as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_case_matches_report_style() {
        assert_eq!(title_case("xg"), "Xg");
        assert_eq!(title_case("goals"), "Goals");
        assert_eq!(title_case("expected goals"), "Expected Goals");
    }

    #[test]
    fn season_display() {
        assert_eq!(display_season("20152016"), "2015-16");
        assert_eq!(display_season("20232024"), "2023-24");
        assert_eq!(display_season("career"), "career");
    }

    #[test]
    fn leaders_header_names_stat_and_season() {
        let rows = vec![LeaderRow {
            rank: 1,
            name: "Connor McDavid".into(),
            position: Some("C".into()),
            team: Some("EDM".into()),
            season: "20152016".into(),
            games_played: 45,
            goals: 16,
            assists: 32,
            points: 48,
            xg: Some(14.2),
            corsi_for_pct: Some(53.1),
            stat_value: 14.2,
        }];
        let text = format_leaders(&rows, "Xg", 10).unwrap();
        assert!(text.starts_with("**Top 10 players by Xg (2015-16 season):**"));
        assert!(text.contains("1. **Connor McDavid** (C, EDM)"));
    }

    #[test]
    fn empty_rows_render_nothing() {
        assert!(format_leaders(&[], "Points", 10).is_none());
        assert!(format_player_stats(&[]).is_none());
        assert!(format_injuries(&[]).is_none());
    }
}
