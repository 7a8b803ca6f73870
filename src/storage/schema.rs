//! Database connection and schema management.

use crate::config::Config;
use crate::error::Result;
use rusqlite::Connection;
use std::fs;
use std::path::Path;

/// Connection wrapper owning every read and write against the store.
pub struct StatsDatabase {
    pub(crate) conn: Connection,
}

impl StatsDatabase {
    /// Open (creating if needed) the database at the configured path.
    pub fn open(config: &Config) -> Result<Self> {
        let path = config.database_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Self::open_path(&path)
    }

    /// Open a database at an explicit path.
    pub fn open_path(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.initialize_schema()?;
        Ok(db)
    }

    /// In-memory database for tests and scratch work.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.initialize_schema()?;
        Ok(db)
    }

    fn initialize_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS players (
                id INTEGER PRIMARY KEY,
                nhl_id INTEGER NOT NULL UNIQUE,
                name TEXT NOT NULL,
                position TEXT,
                team TEXT,
                birth_date TEXT,
                shoots_catches TEXT,
                height_inches INTEGER,
                weight_lbs INTEGER,
                cap_hit_cents INTEGER,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS teams (
                abbrev TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                conference TEXT,
                division TEXT,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS player_season_stats (
                id INTEGER PRIMARY KEY,
                player_id INTEGER NOT NULL REFERENCES players(id),
                season TEXT NOT NULL,
                team TEXT,
                games_played INTEGER,
                goals INTEGER,
                assists INTEGER,
                points INTEGER,
                shots INTEGER,
                toi_per_game REAL,
                xg REAL,
                xg_per_60 REAL,
                corsi_for_pct REAL,
                fenwick_for_pct REAL,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now')),
                UNIQUE(player_id, season)
            );
            CREATE INDEX IF NOT EXISTS idx_season_stats_season
                ON player_season_stats(season);
            CREATE INDEX IF NOT EXISTS idx_season_stats_team
                ON player_season_stats(team, season);

            CREATE TABLE IF NOT EXISTS game_logs (
                id INTEGER PRIMARY KEY,
                player_id INTEGER NOT NULL REFERENCES players(id),
                game_id INTEGER NOT NULL,
                game_date TEXT NOT NULL,
                season TEXT,
                team TEXT,
                opponent TEXT,
                home_away TEXT,
                goals INTEGER DEFAULT 0,
                assists INTEGER DEFAULT 0,
                points INTEGER DEFAULT 0,
                shots INTEGER DEFAULT 0,
                toi REAL,
                plus_minus INTEGER DEFAULT 0,
                pim INTEGER DEFAULT 0,
                powerplay_goals INTEGER DEFAULT 0,
                powerplay_points INTEGER DEFAULT 0,
                shorthanded_goals INTEGER DEFAULT 0,
                shorthanded_points INTEGER DEFAULT 0,
                game_winning_goals INTEGER DEFAULT 0,
                overtime_goals INTEGER DEFAULT 0,
                shifts INTEGER,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now')),
                UNIQUE(player_id, game_id)
            );
            CREATE INDEX IF NOT EXISTS idx_game_logs_date ON game_logs(game_date);
            CREATE INDEX IF NOT EXISTS idx_game_logs_player_date
                ON game_logs(player_id, game_date);
            CREATE INDEX IF NOT EXISTS idx_game_logs_opponent
                ON game_logs(player_id, opponent);

            CREATE TABLE IF NOT EXISTS goalie_stats (
                id INTEGER PRIMARY KEY,
                player_id INTEGER NOT NULL REFERENCES players(id),
                season TEXT NOT NULL,
                team TEXT,
                games_played INTEGER DEFAULT 0,
                games_started INTEGER DEFAULT 0,
                wins INTEGER DEFAULT 0,
                losses INTEGER DEFAULT 0,
                ot_losses INTEGER DEFAULT 0,
                save_pct REAL,
                goals_against_avg REAL,
                shutouts INTEGER DEFAULT 0,
                shots_against INTEGER,
                saves INTEGER,
                time_on_ice INTEGER,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now')),
                UNIQUE(player_id, season)
            );
            CREATE INDEX IF NOT EXISTS idx_goalie_stats_team
                ON goalie_stats(team, season);

            CREATE TABLE IF NOT EXISTS team_season_stats (
                id INTEGER PRIMARY KEY,
                team TEXT NOT NULL,
                season TEXT NOT NULL,
                games_played INTEGER DEFAULT 0,
                wins INTEGER DEFAULT 0,
                losses INTEGER DEFAULT 0,
                ot_losses INTEGER DEFAULT 0,
                points INTEGER DEFAULT 0,
                goals_for INTEGER DEFAULT 0,
                goals_for_per_game REAL,
                shots_for_per_game REAL,
                power_play_pct REAL,
                goals_against INTEGER DEFAULT 0,
                goals_against_per_game REAL,
                shots_against_per_game REAL,
                penalty_kill_pct REAL,
                total_goals_per_game REAL,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now')),
                UNIQUE(team, season)
            );

            CREATE TABLE IF NOT EXISTS injuries (
                id INTEGER PRIMARY KEY,
                player_id INTEGER NOT NULL REFERENCES players(id),
                team TEXT,
                status TEXT NOT NULL,
                injury_type TEXT,
                description TEXT,
                reported_date TEXT,
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            CREATE UNIQUE INDEX IF NOT EXISTS idx_injuries_one_active
                ON injuries(player_id) WHERE is_active = 1;
            CREATE INDEX IF NOT EXISTS idx_injuries_team ON injuries(team);

            CREATE TABLE IF NOT EXISTS games (
                id INTEGER PRIMARY KEY,
                nhl_game_id INTEGER NOT NULL UNIQUE,
                season TEXT NOT NULL,
                game_type INTEGER DEFAULT 2,
                game_date TEXT NOT NULL,
                start_time_utc TEXT,
                venue TEXT,
                home_team TEXT NOT NULL,
                away_team TEXT NOT NULL,
                home_score INTEGER,
                away_score INTEGER,
                game_state TEXT NOT NULL DEFAULT 'FUT',
                is_completed INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            CREATE INDEX IF NOT EXISTS idx_games_date ON games(game_date);
            CREATE INDEX IF NOT EXISTS idx_games_teams ON games(home_team, away_team);

            CREATE TABLE IF NOT EXISTS documents (
                id INTEGER PRIMARY KEY,
                title TEXT,
                source TEXT,
                content TEXT NOT NULL,
                url TEXT,
                embedding BLOB,
                metadata TEXT,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            ",
        )?;
        Ok(())
    }
}
