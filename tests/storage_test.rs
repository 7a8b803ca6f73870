//! Integration tests for the store gateway: upsert idempotence, merge
//! semantics, and the read helpers behind the engine and router.

use chrono::NaiveDate;
use puckcast::sources::game_log::{GameLogEntry, HomeAway};
use puckcast::sources::injuries::{InjuryReport, InjuryStatus};
use puckcast::sources::schedule::GameRecord;
use puckcast::sources::stats_api::{GoalieSeasonRecord, StandingsTeam, TeamSeasonRecord};
use puckcast::storage::analysis::trade_value_score;
use puckcast::storage::{InjuryWrite, StatKind, StatsDatabase};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
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
    shots: i64,
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
        shots,
        toi_minutes: 18.5,
        plus_minus: 0,
        pim: 0,
        powerplay_goals: 0,
        powerplay_points: 0,
        shorthanded_goals: 0,
        shorthanded_points: 0,
        game_winning_goals: 0,
        overtime_goals: 0,
        shifts: Some(22),
    }
}

fn game_record(game_id: i64, date: NaiveDate, home: &str, away: &str) -> GameRecord {
    GameRecord {
        game_id,
        season: "20252026".to_string(),
        game_type: 2,
        game_date: date,
        start_time_utc: None,
        venue: Some("Test Arena".to_string()),
        home_team: home.to_string(),
        away_team: away.to_string(),
        home_score: None,
        away_score: None,
        game_state: "FUT".to_string(),
        is_completed: false,
    }
}

fn seed_skater(
    db: &StatsDatabase,
    nhl_id: i64,
    name: &str,
    team: &str,
    season: &str,
    games: i64,
    goals: i64,
    assists: i64,
    xg: f64,
) -> i64 {
    let id = db.upsert_player(nhl_id, name, Some(team), Some("F")).unwrap();
    db.upsert_season_stats(
        id,
        season,
        team,
        games,
        goals,
        assists,
        goals + assists,
        (goals * 8).max(20),
        18.0,
        xg,
        1.0,
        51.0,
        50.5,
    )
    .unwrap();
    id
}

#[test]
fn player_upsert_is_idempotent() {
    let db = test_db();
    let first = db.upsert_player(8478402, "Connor McDavid", Some("EDM"), Some("C")).unwrap();
    let second = db.upsert_player(8478402, "Connor McDavid", Some("EDM"), Some("C")).unwrap();
    assert_eq!(first, second);

    let player = db.find_player_by_name("mcdavid").unwrap().unwrap();
    assert_eq!(player.nhl_id, 8478402);
    assert_eq!(player.team.as_deref(), Some("EDM"));
}

#[test]
fn player_upsert_keeps_team_when_source_has_none() {
    let db = test_db();
    db.upsert_player(1, "Test Player", Some("BOS"), None).unwrap();
    db.upsert_player(1, "Test Player", None, None).unwrap();
    let player = db.find_player_by_name("Test Player").unwrap().unwrap();
    assert_eq!(player.team.as_deref(), Some("BOS"));
}

#[test]
fn roster_update_moves_traded_players() {
    let db = test_db();
    db.upsert_player(1, "Traded Guy", Some("TOR"), Some("F")).unwrap();
    let found = db
        .update_player_from_roster(1, "BOS", Some("C"), "Traded Guy", Some(d(1998, 3, 1)))
        .unwrap();
    assert!(found);
    let player = db.find_player_by_name("Traded Guy").unwrap().unwrap();
    assert_eq!(player.team.as_deref(), Some("BOS"));
    assert_eq!(player.birth_date, Some(d(1998, 3, 1)));

    // Unknown players are reported, not created.
    let found = db
        .update_player_from_roster(999, "BOS", None, "Ghost", None)
        .unwrap();
    assert!(!found);
}

#[test]
fn season_stats_upsert_is_idempotent() {
    let db = test_db();
    let id = seed_skater(&db, 1, "Scorer", "TOR", "20252026", 50, 30, 40, 25.0);
    // Same season again with updated numbers: one row, new values.
    db.upsert_season_stats(id, "20252026", "TOR", 51, 31, 40, 71, 260, 18.5, 26.0, 1.1, 52.0, 51.0)
        .unwrap();

    assert_eq!(db.count_season_stats().unwrap(), 1);
    let line = &db.player_stat_lines(&["Scorer".to_string()], 10).unwrap()[0];
    assert_eq!(line.games_played, Some(51));
    assert_eq!(line.points, Some(71));
}

#[test]
fn latest_season_is_max() {
    let db = test_db();
    seed_skater(&db, 1, "Old Timer", "TOR", "20152016", 70, 20, 30, 15.0);
    let id = db.find_player_by_name("Old Timer").unwrap().unwrap().id;
    db.upsert_season_stats(id, "20252026", "TOR", 40, 10, 20, 30, 120, 17.0, 9.0, 0.8, 50.0, 49.0)
        .unwrap();
    assert_eq!(db.latest_season().unwrap().as_deref(), Some("20252026"));
}

#[test]
fn game_log_upsert_is_idempotent() {
    let db = test_db();
    let id = db.upsert_player(1, "Logger", Some("TOR"), None).unwrap();
    let entry = log_entry(100, d(2026, 1, 10), "BOS", HomeAway::Home, 1, 1, 4);
    db.upsert_game_log(id, "20252026", &entry).unwrap();
    db.upsert_game_log(id, "20252026", &entry).unwrap();

    let logs = db.game_logs_for_player_name("Logger", 10).unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].points, 2);

    // Corrected stats flow through on re-ingest.
    let corrected = log_entry(100, d(2026, 1, 10), "BOS", HomeAway::Home, 2, 1, 5);
    db.upsert_game_log(id, "20252026", &corrected).unwrap();
    let logs = db.game_logs_for_player_name("Logger", 10).unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].points, 3);
}

#[test]
fn game_upsert_preserves_scores_against_null_feeds() {
    let db = test_db();
    let mut game = game_record(555, d(2026, 2, 1), "TOR", "BOS");
    game.home_score = Some(4);
    game.away_score = Some(2);
    game.game_state = "FINAL".to_string();
    game.is_completed = true;
    db.upsert_game(&game).unwrap();

    // A later fetch returns the same game with null scores; the recorded
    // result must survive.
    let stale = game_record(555, d(2026, 2, 1), "TOR", "BOS");
    db.upsert_game(&stale).unwrap();

    let stored = db.find_game("TOR", "BOS", d(2026, 2, 1)).unwrap().unwrap();
    assert_eq!(stored.home_score, Some(4));
    assert_eq!(stored.away_score, Some(2));

    let games = db.games_on_date(d(2026, 2, 1)).unwrap();
    assert_eq!(games.len(), 1);
}

#[test]
fn game_lookup_by_team_checks_both_sides() {
    let db = test_db();
    db.upsert_game(&game_record(1, d(2026, 2, 1), "TOR", "BOS")).unwrap();
    assert!(db.game_for_team_on("TOR", d(2026, 2, 1)).unwrap().is_some());
    assert!(db.game_for_team_on("BOS", d(2026, 2, 1)).unwrap().is_some());
    assert!(db.game_for_team_on("EDM", d(2026, 2, 1)).unwrap().is_none());
    assert!(db.game_for_team_on("TOR", d(2026, 2, 2)).unwrap().is_none());
}

#[test]
fn goalie_upsert_creates_the_player() {
    let db = test_db();
    let record = GoalieSeasonRecord {
        player_ext_id: 8479361,
        name: "Joseph Woll".to_string(),
        team: Some("TOR".to_string()),
        games_played: 40,
        games_started: 38,
        wins: 22,
        losses: 12,
        ot_losses: 4,
        save_pct: Some(0.912),
        goals_against_avg: Some(2.65),
        shutouts: 3,
        shots_against: Some(1100),
        saves: Some(1003),
        time_on_ice: Some(2300),
    };
    db.upsert_goalie_stats("20252026", &record).unwrap();
    db.upsert_goalie_stats("20252026", &record).unwrap();

    let player = db.find_player_by_name("Woll").unwrap().unwrap();
    assert_eq!(player.position.as_deref(), Some("G"));

    let starter = db.starting_goalie("TOR", "20252026").unwrap().unwrap();
    assert_eq!(starter.name, "Joseph Woll");
    assert_eq!(starter.save_pct, 0.912);
}

#[test]
fn starting_goalie_is_the_one_with_most_starts() {
    let db = test_db();
    for (nhl_id, name, starts) in [(1, "Backup Goalie", 10), (2, "Starter Goalie", 45)] {
        let record = GoalieSeasonRecord {
            player_ext_id: nhl_id,
            name: name.to_string(),
            team: Some("BOS".to_string()),
            games_played: starts + 2,
            games_started: starts,
            wins: 20,
            losses: 10,
            ot_losses: 2,
            save_pct: Some(0.905),
            goals_against_avg: Some(2.8),
            shutouts: 1,
            shots_against: None,
            saves: None,
            time_on_ice: None,
        };
        db.upsert_goalie_stats("20252026", &record).unwrap();
    }
    let starter = db.starting_goalie("BOS", "20252026").unwrap().unwrap();
    assert_eq!(starter.name, "Starter Goalie");
}

#[test]
fn team_stats_round_trip_to_pace() {
    let db = test_db();
    let record = TeamSeasonRecord {
        team: "TOR".to_string(),
        games_played: 50,
        wins: 30,
        losses: 15,
        ot_losses: 5,
        points: 65,
        goals_for: 175,
        goals_for_per_game: Some(3.5),
        shots_for_per_game: Some(31.0),
        power_play_pct: Some(24.0),
        goals_against: 150,
        goals_against_per_game: Some(3.0),
        shots_against_per_game: Some(28.5),
        penalty_kill_pct: Some(80.0),
        total_goals_per_game: 6.5,
    };
    db.upsert_team_season_stats("20252026", &record).unwrap();
    db.upsert_team_season_stats("20252026", &record).unwrap();

    let pace = db.team_pace("TOR", "20252026").unwrap().unwrap();
    assert_eq!(pace.total_goals_per_game, 6.5);
    assert_eq!(pace.goals_for_per_game, 3.5);
    assert!(db.team_pace("BOS", "20252026").unwrap().is_none());
}

#[test]
fn team_upsert_is_keyed_by_code() {
    let db = test_db();
    let team = StandingsTeam {
        code: "TOR".to_string(),
        name: "Toronto Maple Leafs".to_string(),
        conference: Some("Eastern".to_string()),
        division: Some("Atlantic".to_string()),
    };
    db.upsert_team(&team).unwrap();
    db.upsert_team(&team).unwrap();
    // Second upsert did not create a second row (unique on the code).
    let status = db.data_status().unwrap();
    assert_eq!(status.players, 0);
}

fn injury(player_name: &str, last_name: &str, team: &str, status: InjuryStatus) -> InjuryReport {
    InjuryReport {
        player_name: player_name.to_string(),
        last_name: Some(last_name.to_string()),
        team: team.to_string(),
        status,
        description: Some("Lower body".to_string()),
        reported_date: Some(d(2026, 1, 10)),
        position: Some("C".to_string()),
    }
}

#[test]
fn injury_ingest_has_current_view_semantics() {
    let db = test_db();
    db.upsert_player(1, "Auston Matthews", Some("TOR"), Some("C")).unwrap();
    db.upsert_player(2, "David Pastrnak", Some("BOS"), Some("R")).unwrap();

    // Day one: both hurt.
    let write = db.record_injury(&injury("Auston Matthews", "Matthews", "TOR", InjuryStatus::DayToDay)).unwrap();
    assert_eq!(write, InjuryWrite::Inserted);
    db.record_injury(&injury("David Pastrnak", "Pastrnak", "BOS", InjuryStatus::Out)).unwrap();
    assert_eq!(db.active_injuries(None).unwrap().len(), 2);

    // Day two: the feed only lists Pastrnak; Matthews drops off.
    db.clear_active_injuries().unwrap();
    let write = db.record_injury(&injury("David Pastrnak", "Pastrnak", "BOS", InjuryStatus::Ir)).unwrap();
    assert_eq!(write, InjuryWrite::Updated);

    let active = db.active_injuries(None).unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].player_name, "David Pastrnak");
    assert_eq!(active[0].status, "IR");

    // At most one active row per player, ever.
    db.record_injury(&injury("David Pastrnak", "Pastrnak", "BOS", InjuryStatus::Ltir)).unwrap();
    assert_eq!(db.active_injuries(Some("BOS")).unwrap().len(), 1);
    assert!(db.active_injuries(Some("TOR")).unwrap().is_empty());
}

#[test]
fn injuries_for_unknown_players_are_dropped() {
    let db = test_db();
    let write = db.record_injury(&injury("Nobody Known", "Known", "TOR", InjuryStatus::Out)).unwrap();
    assert_eq!(write, InjuryWrite::PlayerUnknown);
    assert!(db.active_injuries(None).unwrap().is_empty());
}

#[test]
fn league_leaders_rank_by_the_chosen_stat() {
    let db = test_db();
    seed_skater(&db, 1, "Goal Machine", "EDM", "20252026", 50, 40, 20, 30.0);
    seed_skater(&db, 2, "Playmaker", "COL", "20252026", 50, 15, 55, 12.0);
    seed_skater(&db, 3, "Grinder", "STL", "20252026", 50, 8, 10, 5.0);

    let by_points = db.league_leaders(StatKind::Points, None, 10).unwrap();
    assert_eq!(by_points[0].name, "Playmaker");
    assert_eq!(by_points[0].rank, 1);

    let by_goals = db.league_leaders(StatKind::Goals, None, 2).unwrap();
    assert_eq!(by_goals.len(), 2);
    assert_eq!(by_goals[0].name, "Goal Machine");

    let by_xg = db.league_leaders(StatKind::Xg, None, 10).unwrap();
    assert_eq!(by_xg[0].name, "Goal Machine");
}

#[test]
fn league_leaders_honor_an_explicit_season() {
    let db = test_db();
    seed_skater(&db, 1, "Modern Star", "EDM", "20252026", 50, 40, 30, 28.0);
    seed_skater(&db, 2, "Vintage Star", "CHI", "20152016", 78, 46, 40, 22.0);

    let rows = db.league_leaders(StatKind::Xg, Some("20152016"), 10).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name, "Vintage Star");
    assert_eq!(rows[0].season, "20152016");
}

#[test]
fn per_team_leaders_partition_by_team() {
    let db = test_db();
    seed_skater(&db, 1, "Tor One", "TOR", "20252026", 50, 30, 30, 20.0);
    seed_skater(&db, 2, "Tor Two", "TOR", "20252026", 50, 25, 20, 18.0);
    seed_skater(&db, 3, "Tor Three", "TOR", "20252026", 50, 20, 15, 15.0);
    seed_skater(&db, 4, "Bos One", "BOS", "20252026", 50, 35, 25, 24.0);
    seed_skater(&db, 5, "Bos Two", "BOS", "20252026", 50, 22, 22, 17.0);

    let rows = db.per_team_leaders(StatKind::Goals, 2).unwrap();
    // Two per team, ranked inside each team.
    assert_eq!(rows.len(), 4);
    let bos: Vec<_> = rows.iter().filter(|r| r.team.as_deref() == Some("BOS")).collect();
    assert_eq!(bos.len(), 2);
    assert_eq!(bos[0].name, "Bos One");
    assert_eq!(bos[0].rank, 1);
    assert_eq!(bos[1].rank, 2);
    assert!(rows.iter().all(|r| r.rank <= 2));
}

#[test]
fn top_players_by_points_scopes_to_team_and_season() {
    let db = test_db();
    seed_skater(&db, 1, "Tor Star", "TOR", "20252026", 50, 30, 40, 20.0);
    seed_skater(&db, 2, "Bos Star", "BOS", "20252026", 50, 35, 40, 24.0);
    seed_skater(&db, 3, "Tor Depth", "TOR", "20252026", 50, 5, 10, 4.0);

    let top = db.top_players_by_points("TOR", "20252026", 5).unwrap();
    assert_eq!(top.len(), 2);
    assert_eq!(top[0].1, "Tor Star");
}

#[test]
fn trade_value_and_band_retrieval() {
    // value = ppg*50 + (xG/games)*30 + corsi*0.5
    let score = trade_value_score(82, 82, 20.5, 52.0);
    assert!((score - (50.0 + 7.5 + 26.0)).abs() < 1e-9);

    let db = test_db();
    seed_skater(&db, 1, "Anchor Star", "TOR", "20252026", 50, 30, 40, 20.0);
    seed_skater(&db, 2, "Fair Return", "BOS", "20252026", 50, 28, 40, 19.0);
    seed_skater(&db, 3, "Depth Piece", "STL", "20252026", 50, 3, 4, 2.0);
    // Below the games floor, never a candidate.
    seed_skater(&db, 4, "Small Sample", "COL", "20252026", 10, 9, 9, 6.0);

    let anchor = db.trade_value_for("Anchor Star").unwrap().unwrap();
    let candidates = db
        .trade_candidates(anchor.value * 0.8, anchor.value * 1.2, &["Anchor Star".to_string()], 10)
        .unwrap();
    let names: Vec<_> = candidates.iter().map(|c| c.name.as_str()).collect();
    assert!(names.contains(&"Fair Return"));
    assert!(!names.contains(&"Anchor Star"));
    assert!(!names.contains(&"Depth Piece"));
    assert!(!names.contains(&"Small Sample"));
}

#[test]
fn recent_form_windows_and_ratios() {
    let db = test_db();
    let id = db.upsert_player(1, "Former", Some("TOR"), None).unwrap();
    // Six games; the window of five must exclude the oldest (3-point) game.
    for (i, (g, a)) in [(3, 0), (1, 0), (0, 1), (1, 1), (0, 0), (2, 0)].iter().enumerate() {
        let entry = log_entry(
            100 + i as i64,
            d(2026, 1, 1) + chrono::Duration::days(i as i64),
            "BOS",
            HomeAway::Home,
            *g,
            *a,
            3,
        );
        db.upsert_game_log(id, "20252026", &entry).unwrap();
    }

    let form = db.recent_form(id, d(2026, 1, 10), 5).unwrap();
    assert_eq!(form.games, 5);
    // Last five games: 1+1+2+0+2 = 6 points, 4 goals.
    assert!((form.ppg - 1.2).abs() < 1e-9);
    assert!((form.goal_ratio - 4.0 / 6.0).abs() < 1e-9);

    // Games on/after the cutoff are excluded.
    let form = db.recent_form(id, d(2026, 1, 2), 5).unwrap();
    assert_eq!(form.games, 1);
    assert_eq!(form.ppg, 3.0);
}

#[test]
fn h2h_and_home_away_aggregates() {
    let db = test_db();
    let id = db.upsert_player(1, "Splitter", Some("TOR"), None).unwrap();
    // Two home games vs BOS with 2 points each, two away vs MTL with none.
    db.upsert_game_log(id, "20252026", &log_entry(1, d(2026, 1, 1), "BOS", HomeAway::Home, 1, 1, 3)).unwrap();
    db.upsert_game_log(id, "20252026", &log_entry(2, d(2026, 1, 3), "BOS", HomeAway::Home, 2, 0, 4)).unwrap();
    db.upsert_game_log(id, "20252026", &log_entry(3, d(2026, 1, 5), "MTL", HomeAway::Away, 0, 0, 2)).unwrap();
    db.upsert_game_log(id, "20252026", &log_entry(4, d(2026, 1, 7), "MTL", HomeAway::Away, 0, 0, 1)).unwrap();

    let h2h = db.h2h_stats(id, "BOS").unwrap();
    assert_eq!(h2h.games, 2);
    assert_eq!(h2h.ppg, 2.0);
    assert_eq!(db.h2h_stats(id, "EDM").unwrap().games, 0);

    let splits = db.home_away_splits(id).unwrap();
    assert_eq!(splits.home_ppg, 2.0);
    assert_eq!(splits.away_ppg, 0.0);
    // Home adjustment is +1 over the two-side mean of 1.0.
    assert!((splits.adjustment(true) - 1.0).abs() < 1e-9);
    assert!((splits.adjustment(false) + 1.0).abs() < 1e-9);
}

#[test]
fn document_search_applies_the_similarity_floor() {
    let db = test_db();
    let mut close = vec![0.0f32; 384];
    close[0] = 1.0;
    let mut also_close = vec![0.0f32; 384];
    also_close[0] = 0.9;
    also_close[1] = 0.436; // still mostly aligned with axis 0
    let mut far = vec![0.0f32; 384];
    far[10] = 1.0;

    db.insert_document(Some("close"), Some("test"), "close doc", None, &close, None).unwrap();
    db.insert_document(Some("also close"), Some("test"), "nearby doc", None, &also_close, None).unwrap();
    db.insert_document(Some("far"), Some("test"), "unrelated doc", None, &far, None).unwrap();

    let mut query = vec![0.0f32; 384];
    query[0] = 1.0;
    let hits = db.search_documents(&query, 10, 0.3).unwrap();

    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].title.as_deref(), Some("close"));
    assert!(hits.iter().all(|h| h.similarity >= 0.3));
    // Ranked by similarity, best first.
    assert!(hits[0].similarity >= hits[1].similarity);

    // The limit truncates after the floor is applied.
    let hits = db.search_documents(&query, 1, 0.3).unwrap();
    assert_eq!(hits.len(), 1);
}

#[test]
fn data_status_counts_every_table() {
    let db = test_db();
    seed_skater(&db, 1, "Counted", "TOR", "20252026", 50, 10, 10, 8.0);
    db.upsert_game(&game_record(1, d(2026, 2, 1), "TOR", "BOS")).unwrap();

    let status = db.data_status().unwrap();
    assert_eq!(status.players, 1);
    assert_eq!(status.season_stats, 1);
    assert_eq!(status.games, 1);
    assert_eq!(status.latest_season.as_deref(), Some("20252026"));
}
