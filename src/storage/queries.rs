//! Upserts and simple lookups.
//!
//! Every write is an `INSERT ... ON CONFLICT DO UPDATE` restricted to the
//! mutable columns, so re-running any ingest pipeline is idempotent.

use super::{models::*, schema::StatsDatabase};
use crate::error::Result;
use crate::sources::game_log::GameLogEntry;
use crate::sources::injuries::InjuryReport;
use crate::sources::schedule::GameRecord;
use crate::sources::stats_api::{GoalieSeasonRecord, StandingsTeam, TeamSeasonRecord};
use chrono::{NaiveDate, NaiveDateTime};
use rayon::prelude::*;
use rusqlite::{params, OptionalExtension, Row};

pub(crate) fn date_to_sql(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub(crate) fn sql_to_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

pub(crate) fn datetime_to_sql(dt: NaiveDateTime) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S").to_string()
}

pub(crate) fn sql_to_datetime(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S").ok()
}

/// Embeddings are stored as little-endian f32 blobs.
pub(crate) fn embedding_to_blob(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|v| v.to_le_bytes()).collect()
}

pub(crate) fn blob_to_embedding(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b) {
        dot += (*x as f64) * (*y as f64);
        norm_a += (*x as f64) * (*x as f64);
        norm_b += (*y as f64) * (*y as f64);
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

impl StatsDatabase {
    // ---------------------------------------------------------------------
    // Players and teams
    // ---------------------------------------------------------------------

    /// Insert or refresh a player by external id, returning the internal id.
    /// An existing team assignment is kept when the source has none.
    pub fn upsert_player(
        &self,
        nhl_id: i64,
        name: &str,
        team: Option<&str>,
        position: Option<&str>,
    ) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO players (nhl_id, name, team, position)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(nhl_id) DO UPDATE SET
                 name = excluded.name,
                 team = COALESCE(excluded.team, team),
                 position = COALESCE(excluded.position, position),
                 updated_at = datetime('now')",
            params![nhl_id, name, team, position],
        )?;
        let id = self.conn.query_row(
            "SELECT id FROM players WHERE nhl_id = ?1",
            params![nhl_id],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    /// Point a player at their current team and refresh bio fields from a
    /// roster entry. Returns false when the player is not in the store.
    pub fn update_player_from_roster(
        &self,
        nhl_id: i64,
        team: &str,
        position: Option<&str>,
        name: &str,
        birth_date: Option<NaiveDate>,
    ) -> Result<bool> {
        let updated = self.conn.execute(
            "UPDATE players SET
                 team = ?1,
                 position = COALESCE(?2, position),
                 birth_date = COALESCE(?3, birth_date),
                 name = COALESCE(NULLIF(?4, ''), name),
                 updated_at = datetime('now')
             WHERE nhl_id = ?5",
            params![
                team,
                position,
                birth_date.map(date_to_sql),
                name,
                nhl_id
            ],
        )?;
        Ok(updated > 0)
    }

    pub fn upsert_team(&self, team: &StandingsTeam) -> Result<()> {
        self.conn.execute(
            "INSERT INTO teams (abbrev, name, conference, division)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(abbrev) DO UPDATE SET
                 name = excluded.name,
                 conference = excluded.conference,
                 division = excluded.division,
                 updated_at = datetime('now')",
            params![team.code, team.name, team.conference, team.division],
        )?;
        Ok(())
    }

    pub fn find_player_by_name(&self, name: &str) -> Result<Option<Player>> {
        let pattern = format!("%{}%", name);
        let player = self
            .conn
            .query_row(
                "SELECT p.id, p.nhl_id, p.name, p.position, p.team, p.birth_date,
                        p.cap_hit_cents
                 FROM players p
                 LEFT JOIN player_season_stats s ON s.player_id = p.id
                 WHERE p.name LIKE ?1 COLLATE NOCASE
                 ORDER BY s.season DESC
                 LIMIT 1",
                params![pattern],
                row_to_player,
            )
            .optional()?;
        Ok(player)
    }

    // ---------------------------------------------------------------------
    // Season stats and game logs
    // ---------------------------------------------------------------------

    /// Upsert a skater's season line keyed on (player, season).
    #[allow(clippy::too_many_arguments)]
    pub fn upsert_season_stats(
        &self,
        player_id: i64,
        season: &str,
        team: &str,
        games_played: i64,
        goals: i64,
        assists: i64,
        points: i64,
        shots: i64,
        toi_per_game: f64,
        xg: f64,
        xg_per_60: f64,
        corsi_for_pct: f64,
        fenwick_for_pct: f64,
    ) -> Result<()> {
        self.conn.execute(
            "INSERT INTO player_season_stats (
                 player_id, season, team, games_played, goals, assists, points,
                 shots, toi_per_game, xg, xg_per_60, corsi_for_pct, fenwick_for_pct
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
             ON CONFLICT(player_id, season) DO UPDATE SET
                 team = excluded.team,
                 games_played = excluded.games_played,
                 goals = excluded.goals,
                 assists = excluded.assists,
                 points = excluded.points,
                 shots = excluded.shots,
                 toi_per_game = excluded.toi_per_game,
                 xg = excluded.xg,
                 xg_per_60 = excluded.xg_per_60,
                 corsi_for_pct = excluded.corsi_for_pct,
                 fenwick_for_pct = excluded.fenwick_for_pct,
                 updated_at = datetime('now')",
            params![
                player_id,
                season,
                team,
                games_played,
                goals,
                assists,
                points,
                shots,
                toi_per_game,
                xg,
                xg_per_60,
                corsi_for_pct,
                fenwick_for_pct
            ],
        )?;
        Ok(())
    }

    /// Upsert one game of a player's log keyed on (player, game).
    pub fn upsert_game_log(
        &self,
        player_id: i64,
        season: &str,
        entry: &GameLogEntry,
    ) -> Result<()> {
        self.conn.execute(
            "INSERT INTO game_logs (
                 player_id, game_id, game_date, season, team, opponent, home_away,
                 goals, assists, points, shots, toi, plus_minus, pim,
                 powerplay_goals, powerplay_points, shorthanded_goals,
                 shorthanded_points, game_winning_goals, overtime_goals, shifts
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
                       ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21)
             ON CONFLICT(player_id, game_id) DO UPDATE SET
                 goals = excluded.goals,
                 assists = excluded.assists,
                 points = excluded.points,
                 shots = excluded.shots,
                 toi = excluded.toi,
                 plus_minus = excluded.plus_minus,
                 pim = excluded.pim,
                 powerplay_goals = excluded.powerplay_goals,
                 powerplay_points = excluded.powerplay_points,
                 shorthanded_goals = excluded.shorthanded_goals,
                 shorthanded_points = excluded.shorthanded_points,
                 game_winning_goals = excluded.game_winning_goals,
                 overtime_goals = excluded.overtime_goals,
                 shifts = excluded.shifts,
                 updated_at = datetime('now')",
            params![
                player_id,
                entry.game_id,
                date_to_sql(entry.game_date),
                season,
                entry.team,
                entry.opponent,
                entry.home_away.as_str(),
                entry.goals,
                entry.assists,
                entry.points,
                entry.shots,
                entry.toi_minutes,
                entry.plus_minus,
                entry.pim,
                entry.powerplay_goals,
                entry.powerplay_points,
                entry.shorthanded_goals,
                entry.shorthanded_points,
                entry.game_winning_goals,
                entry.overtime_goals,
                entry.shifts
            ],
        )?;
        Ok(())
    }

    /// Upsert a goalie's season line, creating the player row when the
    /// goalie has never been seen (stats feeds cover players the roster
    /// sync has not).
    pub fn upsert_goalie_stats(&self, season: &str, record: &GoalieSeasonRecord) -> Result<()> {
        let player_id = self.upsert_player(
            record.player_ext_id,
            &record.name,
            record.team.as_deref(),
            Some("G"),
        )?;
        self.conn.execute(
            "INSERT INTO goalie_stats (
                 player_id, season, team, games_played, games_started, wins,
                 losses, ot_losses, save_pct, goals_against_avg, shutouts,
                 shots_against, saves, time_on_ice
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
             ON CONFLICT(player_id, season) DO UPDATE SET
                 team = excluded.team,
                 games_played = excluded.games_played,
                 games_started = excluded.games_started,
                 wins = excluded.wins,
                 losses = excluded.losses,
                 ot_losses = excluded.ot_losses,
                 save_pct = excluded.save_pct,
                 goals_against_avg = excluded.goals_against_avg,
                 shutouts = excluded.shutouts,
                 shots_against = excluded.shots_against,
                 saves = excluded.saves,
                 time_on_ice = excluded.time_on_ice,
                 updated_at = datetime('now')",
            params![
                player_id,
                season,
                record.team,
                record.games_played,
                record.games_started,
                record.wins,
                record.losses,
                record.ot_losses,
                record.save_pct,
                record.goals_against_avg,
                record.shutouts,
                record.shots_against,
                record.saves,
                record.time_on_ice
            ],
        )?;
        Ok(())
    }

    pub fn upsert_team_season_stats(&self, season: &str, record: &TeamSeasonRecord) -> Result<()> {
        self.conn.execute(
            "INSERT INTO team_season_stats (
                 team, season, games_played, wins, losses, ot_losses, points,
                 goals_for, goals_for_per_game, shots_for_per_game, power_play_pct,
                 goals_against, goals_against_per_game, shots_against_per_game,
                 penalty_kill_pct, total_goals_per_game
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
             ON CONFLICT(team, season) DO UPDATE SET
                 games_played = excluded.games_played,
                 wins = excluded.wins,
                 losses = excluded.losses,
                 ot_losses = excluded.ot_losses,
                 points = excluded.points,
                 goals_for = excluded.goals_for,
                 goals_for_per_game = excluded.goals_for_per_game,
                 shots_for_per_game = excluded.shots_for_per_game,
                 power_play_pct = excluded.power_play_pct,
                 goals_against = excluded.goals_against,
                 goals_against_per_game = excluded.goals_against_per_game,
                 shots_against_per_game = excluded.shots_against_per_game,
                 penalty_kill_pct = excluded.penalty_kill_pct,
                 total_goals_per_game = excluded.total_goals_per_game,
                 updated_at = datetime('now')",
            params![
                record.team,
                season,
                record.games_played,
                record.wins,
                record.losses,
                record.ot_losses,
                record.points,
                record.goals_for,
                record.goals_for_per_game,
                record.shots_for_per_game,
                record.power_play_pct,
                record.goals_against,
                record.goals_against_per_game,
                record.shots_against_per_game,
                record.penalty_kill_pct,
                record.total_goals_per_game
            ],
        )?;
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Games
    // ---------------------------------------------------------------------

    /// Upsert a game keyed on its external id. Scores merge through
    /// COALESCE so a feed that has dropped back to null never clears a
    /// recorded result.
    pub fn upsert_game(&self, game: &GameRecord) -> Result<()> {
        self.conn.execute(
            "INSERT INTO games (
                 nhl_game_id, season, game_type, game_date, start_time_utc,
                 venue, home_team, away_team, home_score, away_score,
                 game_state, is_completed
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
             ON CONFLICT(nhl_game_id) DO UPDATE SET
                 home_score = COALESCE(excluded.home_score, home_score),
                 away_score = COALESCE(excluded.away_score, away_score),
                 game_state = excluded.game_state,
                 is_completed = excluded.is_completed,
                 updated_at = datetime('now')",
            params![
                game.game_id,
                game.season,
                game.game_type,
                date_to_sql(game.game_date),
                game.start_time_utc.map(datetime_to_sql),
                game.venue,
                game.home_team,
                game.away_team,
                game.home_score,
                game.away_score,
                game.game_state,
                game.is_completed
            ],
        )?;
        Ok(())
    }

    pub fn games_on_date(&self, date: NaiveDate) -> Result<Vec<GameRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT nhl_game_id, season, game_date, start_time_utc, venue,
                    home_team, away_team, home_score, away_score, game_state,
                    is_completed
             FROM games
             WHERE game_date = ?1
             ORDER BY start_time_utc",
        )?;
        let rows = stmt.query_map(params![date_to_sql(date)], row_to_game)?;
        collect_rows(rows)
    }

    pub fn find_game(
        &self,
        home_team: &str,
        away_team: &str,
        date: NaiveDate,
    ) -> Result<Option<GameRow>> {
        let game = self
            .conn
            .query_row(
                "SELECT nhl_game_id, season, game_date, start_time_utc, venue,
                        home_team, away_team, home_score, away_score, game_state,
                        is_completed
                 FROM games
                 WHERE home_team = ?1 AND away_team = ?2 AND game_date = ?3
                 LIMIT 1",
                params![home_team, away_team, date_to_sql(date)],
                row_to_game,
            )
            .optional()?;
        Ok(game)
    }

    /// The game a team plays on a date, from either side of the ice.
    pub fn game_for_team_on(&self, team: &str, date: NaiveDate) -> Result<Option<GameRow>> {
        let game = self
            .conn
            .query_row(
                "SELECT nhl_game_id, season, game_date, start_time_utc, venue,
                        home_team, away_team, home_score, away_score, game_state,
                        is_completed
                 FROM games
                 WHERE game_date = ?1 AND (home_team = ?2 OR away_team = ?2)
                 LIMIT 1",
                params![date_to_sql(date), team],
                row_to_game,
            )
            .optional()?;
        Ok(game)
    }

    // ---------------------------------------------------------------------
    // Injuries
    // ---------------------------------------------------------------------

    /// Deactivate every active injury; the feed re-asserts current truth.
    pub fn clear_active_injuries(&self) -> Result<usize> {
        Ok(self
            .conn
            .execute("UPDATE injuries SET is_active = 0 WHERE is_active = 1", [])?)
    }

    /// Record one injury report, matching the player by last name first,
    /// then full name.
    pub fn record_injury(&self, report: &InjuryReport) -> Result<InjuryWrite> {
        let mut player_id: Option<i64> = None;
        if let Some(last_name) = &report.last_name {
            player_id = self.player_id_by_name_like(last_name)?;
        }
        if player_id.is_none() {
            player_id = self.player_id_by_name_like(&report.player_name)?;
        }
        let Some(player_id) = player_id else {
            return Ok(InjuryWrite::PlayerUnknown);
        };

        let existing: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM injuries WHERE player_id = ?1 LIMIT 1",
                params![player_id],
                |row| row.get(0),
            )
            .optional()?;

        let reported_date = report.reported_date.map(date_to_sql);
        if let Some(id) = existing {
            self.conn.execute(
                "UPDATE injuries SET
                     status = ?1,
                     injury_type = ?2,
                     description = ?3,
                     team = ?4,
                     reported_date = COALESCE(?5, reported_date),
                     is_active = 1,
                     updated_at = datetime('now')
                 WHERE id = ?6",
                params![
                    report.status.as_str(),
                    report.position,
                    report.description,
                    report.team,
                    reported_date,
                    id
                ],
            )?;
            Ok(InjuryWrite::Updated)
        } else {
            self.conn.execute(
                "INSERT INTO injuries (
                     player_id, team, status, injury_type, description,
                     reported_date, is_active
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1)",
                params![
                    player_id,
                    report.team,
                    report.status.as_str(),
                    report.position,
                    report.description,
                    reported_date
                ],
            )?;
            Ok(InjuryWrite::Inserted)
        }
    }

    /// Internal id for a player's external id.
    pub fn player_id_by_nhl_id(&self, nhl_id: i64) -> Result<Option<i64>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id FROM players WHERE nhl_id = ?1",
                params![nhl_id],
                |row| row.get(0),
            )
            .optional()?)
    }

    fn player_id_by_name_like(&self, name: &str) -> Result<Option<i64>> {
        let pattern = format!("%{}%", name);
        Ok(self
            .conn
            .query_row(
                "SELECT id FROM players WHERE name LIKE ?1 COLLATE NOCASE LIMIT 1",
                params![pattern],
                |row| row.get(0),
            )
            .optional()?)
    }

    /// Active injuries, optionally scoped to one team, newest first.
    pub fn active_injuries(&self, team: Option<&str>) -> Result<Vec<InjuryReportRow>> {
        let mut sql = String::from(
            "SELECT p.name, p.nhl_id, i.team, i.status, i.description, i.reported_date
             FROM injuries i
             JOIN players p ON i.player_id = p.id
             WHERE i.is_active = 1",
        );
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
        if let Some(team) = team {
            sql.push_str(" AND i.team = ?1");
            params_vec.push(Box::new(team.to_string()));
        }
        sql.push_str(" ORDER BY i.team, i.reported_date DESC");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(
            rusqlite::params_from_iter(params_vec.iter().map(|p| p.as_ref())),
            |row| {
                Ok(InjuryReportRow {
                    player_name: row.get(0)?,
                    player_nhl_id: row.get(1)?,
                    team: row.get(2)?,
                    status: row.get(3)?,
                    description: row.get(4)?,
                    reported_date: row
                        .get::<_, Option<String>>(5)?
                        .as_deref()
                        .and_then(sql_to_date),
                })
            },
        )?;
        collect_rows(rows)
    }

    // ---------------------------------------------------------------------
    // Documents
    // ---------------------------------------------------------------------

    pub fn insert_document(
        &self,
        title: Option<&str>,
        source: Option<&str>,
        content: &str,
        url: Option<&str>,
        embedding: &[f32],
        metadata: Option<&serde_json::Value>,
    ) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO documents (title, source, content, url, embedding, metadata)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                title,
                source,
                content,
                url,
                embedding_to_blob(embedding),
                metadata.map(|m| m.to_string())
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Nearest documents by cosine similarity, dropping anything under the
    /// floor. The scan is in-process and parallel.
    pub fn search_documents(
        &self,
        query_embedding: &[f32],
        limit: usize,
        min_similarity: f64,
    ) -> Result<Vec<DocumentHit>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, source, content, url, embedding
             FROM documents
             WHERE embedding IS NOT NULL",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, Vec<u8>>(5)?,
            ))
        })?;
        let loaded: Vec<_> = collect_rows(rows)?;

        let mut hits: Vec<DocumentHit> = loaded
            .into_par_iter()
            .map(|(id, title, source, content, url, blob)| {
                let embedding = blob_to_embedding(&blob);
                let similarity = cosine_similarity(query_embedding, &embedding);
                DocumentHit {
                    id,
                    title,
                    source,
                    content,
                    url,
                    similarity: (similarity * 1000.0).round() / 1000.0,
                }
            })
            .filter(|hit| hit.similarity >= min_similarity)
            .collect();
        hits.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(limit);
        Ok(hits)
    }

    // ---------------------------------------------------------------------
    // Status
    // ---------------------------------------------------------------------

    pub fn latest_season(&self) -> Result<Option<String>> {
        Ok(self
            .conn
            .query_row("SELECT MAX(season) FROM player_season_stats", [], |row| {
                row.get::<_, Option<String>>(0)
            })?)
    }

    pub fn count_season_stats(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM player_season_stats", [], |row| {
                row.get(0)
            })?)
    }

    /// External ids of players with a season-stat row for the season,
    /// the "active" set whose logs the catch-up re-ingests.
    pub fn active_player_ids(&self, season: &str) -> Result<Vec<(i64, String)>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT p.nhl_id, p.name
             FROM players p
             JOIN player_season_stats s ON s.player_id = p.id
             WHERE s.season = ?1
             ORDER BY p.nhl_id",
        )?;
        let rows = stmt.query_map(params![season], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })?;
        collect_rows(rows)
    }

    pub fn data_status(&self) -> Result<DataStatus> {
        let count = |sql: &str| -> Result<i64> {
            Ok(self.conn.query_row(sql, [], |row| row.get(0))?)
        };
        Ok(DataStatus {
            players: count("SELECT COUNT(*) FROM players")?,
            season_stats: count("SELECT COUNT(*) FROM player_season_stats")?,
            game_logs: count("SELECT COUNT(*) FROM game_logs")?,
            goalie_stats: count("SELECT COUNT(*) FROM goalie_stats")?,
            team_stats: count("SELECT COUNT(*) FROM team_season_stats")?,
            games: count("SELECT COUNT(*) FROM games")?,
            active_injuries: count("SELECT COUNT(*) FROM injuries WHERE is_active = 1")?,
            documents: count("SELECT COUNT(*) FROM documents")?,
            latest_season: self.latest_season()?,
        })
    }

    /// Recent games for a player looked up by name, newest first.
    pub fn game_logs_for_player_name(&self, name: &str, limit: usize) -> Result<Vec<GameLogRow>> {
        let pattern = format!("%{}%", name);
        let mut stmt = self.conn.prepare(
            "SELECT p.name, g.game_date, g.team, g.opponent, g.home_away,
                    g.goals, g.assists, g.points, g.shots, g.toi
             FROM game_logs g
             JOIN players p ON g.player_id = p.id
             WHERE p.name LIKE ?1 COLLATE NOCASE
             ORDER BY g.game_date DESC
             LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![pattern, limit as i64], |row| {
            Ok(GameLogRow {
                player_name: row.get(0)?,
                game_date: sql_to_date(&row.get::<_, String>(1)?).unwrap_or_default(),
                team: row.get(2)?,
                opponent: row.get(3)?,
                home_away: row.get(4)?,
                goals: row.get(5)?,
                assists: row.get(6)?,
                points: row.get(7)?,
                shots: row.get(8)?,
                toi_minutes: row.get::<_, Option<f64>>(9)?.unwrap_or(0.0),
            })
        })?;
        collect_rows(rows)
    }
}

fn row_to_player(row: &Row) -> rusqlite::Result<Player> {
    Ok(Player {
        id: row.get(0)?,
        nhl_id: row.get(1)?,
        name: row.get(2)?,
        position: row.get(3)?,
        team: row.get(4)?,
        birth_date: row
            .get::<_, Option<String>>(5)?
            .as_deref()
            .and_then(sql_to_date),
        cap_hit_cents: row.get(6)?,
    })
}

fn row_to_game(row: &Row) -> rusqlite::Result<GameRow> {
    Ok(GameRow {
        nhl_game_id: row.get(0)?,
        season: row.get(1)?,
        game_date: sql_to_date(&row.get::<_, String>(2)?).unwrap_or_default(),
        start_time_utc: row
            .get::<_, Option<String>>(3)?
            .as_deref()
            .and_then(sql_to_datetime),
        venue: row.get(4)?,
        home_team: row.get(5)?,
        away_team: row.get(6)?,
        home_score: row.get(7)?,
        away_score: row.get(8)?,
        game_state: row.get(9)?,
        is_completed: row.get(10)?,
    })
}

pub(crate) fn collect_rows<T>(
    rows: impl Iterator<Item = rusqlite::Result<T>>,
) -> Result<Vec<T>> {
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}
