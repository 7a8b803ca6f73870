//! Integration tests for the prediction engine against a seeded store.

use chrono::NaiveDate;
use puckcast::predict::{Confidence, MatchupContext, PaceRating, PredictionEngine};
use puckcast::sources::game_log::{GameLogEntry, HomeAway};
use puckcast::sources::stats_api::{GoalieSeasonRecord, TeamSeasonRecord};
use puckcast::storage::StatsDatabase;

const SEASON: &str = "20252026";

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn game_date() -> NaiveDate {
    d(2026, 2, 1)
}

fn test_db() -> StatsDatabase {
    StatsDatabase::open_in_memory().unwrap()
}

fn log_entry(
    game_id: i64,
    date: NaiveDate,
    opponent: &str,
    home_away: HomeAway,
    goals: i64,
    assists: i64,
) -> GameLogEntry {
    GameLogEntry {
        game_id,
        game_date: date,
        team: Some("TOR".to_string()),
        opponent: Some(opponent.to_string()),
        home_away,
        goals,
        assists,
        points: goals + assists,
        shots: 3,
        toi_minutes: 19.0,
        plus_minus: 0,
        pim: 0,
        powerplay_goals: 0,
        powerplay_points: 0,
        shorthanded_goals: 0,
        shorthanded_points: 0,
        game_winning_goals: 0,
        overtime_goals: 0,
        shifts: Some(21),
    }
}

fn seed_player(
    db: &StatsDatabase,
    nhl_id: i64,
    name: &str,
    team: &str,
    games: i64,
    points: i64,
) -> i64 {
    let id = db.upsert_player(nhl_id, name, Some(team), Some("F")).unwrap();
    db.upsert_season_stats(
        id,
        SEASON,
        team,
        games,
        points / 2,
        points - points / 2,
        points,
        150,
        18.0,
        points as f64 * 0.3,
        1.0,
        51.0,
        50.0,
    )
    .unwrap();
    id
}

fn seed_goalie(db: &StatsDatabase, nhl_id: i64, name: &str, team: &str, save_pct: f64) {
    let record = GoalieSeasonRecord {
        player_ext_id: nhl_id,
        name: name.to_string(),
        team: Some(team.to_string()),
        games_played: 40,
        games_started: 38,
        wins: 20,
        losses: 15,
        ot_losses: 3,
        save_pct: Some(save_pct),
        goals_against_avg: Some(2.8),
        shutouts: 2,
        shots_against: None,
        saves: None,
        time_on_ice: None,
    };
    db.upsert_goalie_stats(SEASON, &record).unwrap();
}

fn seed_team_stats(db: &StatsDatabase, team: &str, gf_pg: f64, ga_pg: f64) {
    let record = TeamSeasonRecord {
        team: team.to_string(),
        games_played: 50,
        wins: 28,
        losses: 17,
        ot_losses: 5,
        points: 61,
        goals_for: (gf_pg * 50.0) as i64,
        goals_for_per_game: Some(gf_pg),
        shots_for_per_game: Some(30.0),
        power_play_pct: Some(22.0),
        goals_against: (ga_pg * 50.0) as i64,
        goals_against_per_game: Some(ga_pg),
        shots_against_per_game: Some(29.0),
        penalty_kill_pct: Some(80.0),
        total_goals_per_game: gf_pg + ga_pg,
    };
    db.upsert_team_season_stats(SEASON, &record).unwrap();
}

/// Balanced recent games: equal points home and away so the home/away
/// adjustment stays at zero.
fn seed_balanced_logs(db: &StatsDatabase, player_id: i64, n: usize, points_each: i64) {
    for i in 0..n {
        let side = if i % 2 == 0 { HomeAway::Home } else { HomeAway::Away };
        let entry = log_entry(
            1000 + i as i64,
            d(2026, 1, 1) + chrono::Duration::days(i as i64),
            "MTL",
            side,
            points_each,
            0,
        );
        db.upsert_game_log(player_id, SEASON, &entry).unwrap();
    }
}

#[test]
fn degraded_prediction_falls_back_to_the_season_baseline() {
    let db = test_db();
    let engine = PredictionEngine::new();
    // 40-game season at a point per game, but only two recent games: the
    // recent-form component misses its gate and drops out.
    let id = seed_player(&db, 1, "Sample Short", "TOR", 40, 40);
    seed_balanced_logs(&db, id, 2, 1);

    let pred = engine
        .calculate(&db, id, "Sample Short", "TOR", "BOS", true, game_date(), None)
        .unwrap();

    assert_eq!(pred.recent_form_ppg, 0.0);
    assert_eq!(pred.season_avg_ppg, 1.0);
    assert_eq!(pred.h2h_ppg, None);
    // Base = season alone at full weight; no adjustments apply.
    assert!((pred.expected_points - 1.0).abs() < 1e-9);
    // games_analyzed = 2 recent + 40 season = 42 -> 0.84 -> high.
    assert_eq!(pred.games_analyzed, 42);
    assert!((pred.confidence_score - 0.84).abs() < 1e-9);
    assert_eq!(pred.confidence, Confidence::High);
}

#[test]
fn renormalized_blend_over_recent_and_season() {
    let db = test_db();
    let engine = PredictionEngine::new();
    let id = seed_player(&db, 1, "Hot Hand", "TOR", 40, 40);
    // Five recent games at two points each vs MTL (no h2h vs BOS).
    seed_balanced_logs(&db, id, 5, 2);

    let pred = engine
        .calculate(&db, id, "Hot Hand", "TOR", "BOS", true, game_date(), None)
        .unwrap();

    // recent 2.0 and season 1.0 renormalized over 0.30 + 0.25.
    let expected = 2.0 * (0.30 / 0.55) + 1.0 * (0.25 / 0.55);
    assert!((pred.expected_points - expected).abs() < 0.01);
    assert!(pred
        .factors
        .iter()
        .any(|f| f.starts_with("Hot streak: 2.00 PPG in last 5 games")));
}

#[test]
fn probability_outputs_stay_in_bounds() {
    let db = test_db();
    let engine = PredictionEngine::new();
    for (i, (games, points, recent_points)) in
        [(82i64, 120i64, 3i64), (40, 10, 0), (5, 2, 1), (0, 0, 0)].iter().enumerate()
    {
        let nhl_id = 100 + i as i64;
        let id = db
            .upsert_player(nhl_id, &format!("Bounds {}", i), Some("TOR"), Some("F"))
            .unwrap();
        if *games > 0 {
            db.upsert_season_stats(
                id, SEASON, "TOR", *games, points / 2, points - points / 2, *points, 100,
                17.0, 10.0, 1.0, 50.0, 50.0,
            )
            .unwrap();
            seed_balanced_logs(&db, id, 6, *recent_points);
        }

        let pred = engine
            .calculate(&db, id, "Bounds", "TOR", "BOS", i % 2 == 0, game_date(), None)
            .unwrap();

        for p in [pred.prob_goal, pred.prob_point, pred.prob_multi_point] {
            assert!((0.0..=1.0).contains(&p), "probability out of bounds: {p}");
        }
        assert!(pred.prob_multi_point <= pred.prob_point + 1e-9);
        assert!(pred.expected_points >= 0.0);
        // Goals + assists re-compose to points within rounding slack.
        assert!(
            (pred.expected_goals + pred.expected_assists - pred.expected_points).abs() <= 0.011,
            "split drifted: {} + {} vs {}",
            pred.expected_goals,
            pred.expected_assists,
            pred.expected_points
        );
    }
}

#[test]
fn confidence_grows_with_sample_and_saturates() {
    let db = test_db();
    let engine = PredictionEngine::new();
    let mut last_score = 0.0;
    for (i, games) in [5i64, 15, 30, 50, 70].iter().enumerate() {
        let nhl_id = 200 + i as i64;
        let id = seed_player(&db, nhl_id, &format!("Sample {}", games), "TOR", *games, *games);
        let pred = engine
            .calculate(&db, id, "Sample", "TOR", "BOS", true, game_date(), None)
            .unwrap();
        assert!(pred.confidence_score >= last_score);
        assert!(pred.confidence_score <= 1.0);
        last_score = pred.confidence_score;
    }
    // Saturated at fifty games analyzed.
    assert!((last_score - 1.0).abs() < 1e-9);
}

#[test]
fn goalie_quality_moves_the_adjustment_both_ways() {
    let db = test_db();
    let engine = PredictionEngine::new();
    let id = seed_player(&db, 1, "Shooter", "TOR", 40, 40);

    // Weak opposing goalie: sv% well under league average.
    seed_goalie(&db, 50, "Sieve Netminder", "BOS", 0.880);
    seed_goalie(&db, 51, "Tor Goalie", "TOR", 0.905);
    let season = db.latest_season().unwrap().unwrap();
    let ctx = puckcast::predict::matchup_context(&db, "TOR", "BOS", &season);
    let pred = engine
        .calculate(&db, id, "Shooter", "TOR", "BOS", true, game_date(), Some(&ctx))
        .unwrap();
    assert_eq!(pred.opponent_goalie.as_deref(), Some("Sieve Netminder"));
    // (0.905 - 0.880) * 5 = 0.125, rounded.
    assert!((pred.goalie_adjustment - 0.13).abs() < 0.011);
    assert!(pred.factors.iter().any(|f| f.starts_with("Favorable goalie matchup: Sieve Netminder")));
    // Both goalies known buys the confidence boost.
    assert!((pred.confidence_score - (0.8 + 0.1)).abs() < 0.011);

    // Strong opposing goalie flips the sign.
    let db = test_db();
    let id = seed_player(&db, 1, "Shooter", "TOR", 40, 40);
    seed_goalie(&db, 50, "Brick Wall", "BOS", 0.930);
    let season = db.latest_season().unwrap().unwrap();
    let ctx = puckcast::predict::matchup_context(&db, "TOR", "BOS", &season);
    let pred = engine
        .calculate(&db, id, "Shooter", "TOR", "BOS", true, game_date(), Some(&ctx))
        .unwrap();
    assert!(pred.goalie_adjustment < 0.0);
    assert!(pred.factors.iter().any(|f| f.starts_with("Tough goalie matchup: Brick Wall")));
}

#[test]
fn pace_context_shifts_expectations() {
    let db = test_db();
    let engine = PredictionEngine::new();
    let id = seed_player(&db, 1, "Pace Rider", "TOR", 40, 40);
    // Both teams play high-event hockey: totals 7.0 and 7.4.
    seed_team_stats(&db, "TOR", 3.8, 3.2);
    seed_team_stats(&db, "BOS", 3.9, 3.5);

    let season = db.latest_season().unwrap().unwrap();
    let ctx = puckcast::predict::matchup_context(&db, "TOR", "BOS", &season);
    assert!((ctx.expected_total_goals - 7.2).abs() < 1e-9);

    let pred = engine
        .calculate(&db, id, "Pace Rider", "TOR", "BOS", true, game_date(), Some(&ctx))
        .unwrap();
    // (7.2 - 6.2) * 0.10 = 0.10
    assert!((pred.pace_adjustment - 0.10).abs() < 0.011);
    assert!(pred
        .factors
        .iter()
        .any(|f| f.starts_with("High-scoring game expected: 7.2 total goals")));
}

#[test]
fn matchup_prediction_aggregates_both_sides() {
    let db = test_db();
    let engine = PredictionEngine::new();
    for (i, name) in ["Tor A", "Tor B", "Tor C"].iter().enumerate() {
        let id = seed_player(&db, 10 + i as i64, name, "TOR", 50, 60 - i as i64 * 10);
        seed_balanced_logs(&db, id, 6, 1);
    }
    for (i, name) in ["Bos A", "Bos B", "Bos C"].iter().enumerate() {
        let id = seed_player(&db, 20 + i as i64, name, "BOS", 50, 55 - i as i64 * 10);
        seed_balanced_logs(&db, id, 6, 1);
    }
    seed_goalie(&db, 30, "Tor Goalie", "TOR", 0.910);
    seed_goalie(&db, 31, "Bos Goalie", "BOS", 0.900);
    seed_team_stats(&db, "TOR", 3.5, 3.2);
    seed_team_stats(&db, "BOS", 3.4, 3.1);

    let matchup = engine
        .matchup_prediction(&db, "TOR", "BOS", game_date(), 5)
        .unwrap();

    assert_eq!(matchup.home_players.len(), 3);
    assert_eq!(matchup.away_players.len(), 3);
    assert_eq!(matchup.top_scorers.len(), 5);
    // Merged list is sorted by goal probability.
    for pair in matchup.top_scorers.windows(2) {
        assert!(pair[0].prob_goal >= pair[1].prob_goal);
    }
    // Every prediction names the other side as the opponent.
    assert!(matchup.home_players.iter().all(|p| p.opponent == "BOS" && p.is_home));
    assert!(matchup.away_players.iter().all(|p| p.opponent == "TOR" && !p.is_home));
    // Home shooters face the away goalie and vice versa.
    assert!(matchup
        .home_players
        .iter()
        .all(|p| p.opponent_goalie.as_deref() == Some("Bos Goalie")));
    assert!(matchup
        .away_players
        .iter()
        .all(|p| p.opponent_goalie.as_deref() == Some("Tor Goalie")));
    // Totals 6.7 and 6.5 average to 6.6: a high-pace game.
    assert_eq!(matchup.pace_rating, PaceRating::High);
    assert!(matchup.home_goalie.is_some());
    assert!(matchup.away_goalie.is_some());
}

#[test]
fn unknown_team_pair_yields_empty_lists() {
    let db = test_db();
    let engine = PredictionEngine::new();
    seed_player(&db, 1, "Somebody", "TOR", 40, 40);

    let matchup = engine
        .matchup_prediction(&db, "XXX", "YYY", game_date(), 5)
        .unwrap();
    assert!(matchup.home_players.is_empty());
    assert!(matchup.away_players.is_empty());
    assert!(matchup.top_scorers.is_empty());
}

#[test]
fn unknown_player_yields_none() {
    let db = test_db();
    let engine = PredictionEngine::new();
    let result = engine
        .player_prediction(&db, "Ghost Player", "BOS", true, game_date())
        .unwrap();
    assert!(result.is_none());
}

#[test]
fn player_prediction_resolves_by_name_fragment() {
    let db = test_db();
    let engine = PredictionEngine::new();
    let id = seed_player(&db, 1, "Auston Matthews", "TOR", 45, 70);
    seed_balanced_logs(&db, id, 6, 2);

    let pred = engine
        .player_prediction(&db, "matthews", "BOS", true, game_date())
        .unwrap()
        .unwrap();
    assert_eq!(pred.player_name, "Auston Matthews");
    assert_eq!(pred.team, "TOR");
    assert_eq!(pred.opponent, "BOS");
    assert!(pred.prob_point > 0.0);
}

#[test]
fn low_confidence_appends_the_reliability_factor() {
    let db = test_db();
    let engine = PredictionEngine::new();
    // Twelve season games only: score 12/50 = 0.24 -> low.
    let id = seed_player(&db, 1, "Rookie", "TOR", 12, 8);

    let pred = engine
        .calculate(&db, id, "Rookie", "TOR", "BOS", false, game_date(), None)
        .unwrap();
    assert_eq!(pred.confidence, Confidence::Low);
    assert!(pred
        .factors
        .iter()
        .any(|f| f == "Limited data - prediction less reliable"));
}

#[test]
fn default_context_carries_league_averages() {
    let ctx = MatchupContext::default_for("TOR", "BOS");
    assert_eq!(ctx.expected_total_goals, 6.0);
    assert_eq!(ctx.home_expected_goals, 3.0);
    assert_eq!(ctx.away_expected_goals, 3.0);
    assert!(!ctx.has_both_goalies());
}
