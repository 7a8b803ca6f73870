//! Aggregate queries feeding the prediction engine and the router's
//! leaders, breakdown, and trade-value paths.

use super::queries::{collect_rows, date_to_sql};
use super::{models::*, schema::StatsDatabase, StatKind};
use crate::error::Result;
use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension};

/// Default goal share of a skater's points when recent form is absent.
pub const DEFAULT_GOAL_RATIO: f64 = 0.4;

/// Default shot volume when recent form is absent.
pub const DEFAULT_AVG_SHOTS: f64 = 2.5;

impl StatsDatabase {
    /// A player's last `n` games strictly before `before_date`, aggregated.
    pub fn recent_form(
        &self,
        player_id: i64,
        before_date: NaiveDate,
        n_games: i64,
    ) -> Result<RecentForm> {
        let row = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(goals), 0), COALESCE(SUM(points), 0),
                    COALESCE(AVG(shots), 0)
             FROM (
                 SELECT goals, points, shots
                 FROM game_logs
                 WHERE player_id = ?1 AND game_date < ?2
                 ORDER BY game_date DESC
                 LIMIT ?3
             )",
            params![player_id, date_to_sql(before_date), n_games],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, f64>(3)?,
                ))
            },
        )?;
        let (games, goals, points, avg_shots) = row;
        if games == 0 {
            return Ok(RecentForm {
                goal_ratio: DEFAULT_GOAL_RATIO,
                ..RecentForm::default()
            });
        }
        Ok(RecentForm {
            games,
            ppg: points as f64 / games as f64,
            gpg: goals as f64 / games as f64,
            avg_shots: if avg_shots > 0.0 {
                avg_shots
            } else {
                DEFAULT_AVG_SHOTS
            },
            goal_ratio: if points > 0 {
                goals as f64 / points as f64
            } else {
                DEFAULT_GOAL_RATIO
            },
        })
    }

    /// The player's most recent season line, reduced to per-game rates.
    pub fn season_baseline(&self, player_id: i64) -> Result<SeasonBaseline> {
        let row = self
            .conn
            .query_row(
                "SELECT games_played, goals, points, xg
                 FROM player_season_stats
                 WHERE player_id = ?1
                 ORDER BY season DESC
                 LIMIT 1",
                params![player_id],
                |row| {
                    Ok((
                        row.get::<_, Option<i64>>(0)?,
                        row.get::<_, Option<i64>>(1)?,
                        row.get::<_, Option<i64>>(2)?,
                        row.get::<_, Option<f64>>(3)?,
                    ))
                },
            )
            .optional()?;
        let Some((games, goals, points, xg)) = row else {
            return Ok(SeasonBaseline::default());
        };
        let games = games.unwrap_or(0);
        if games == 0 {
            return Ok(SeasonBaseline::default());
        }
        Ok(SeasonBaseline {
            games,
            ppg: points.unwrap_or(0) as f64 / games as f64,
            gpg: goals.unwrap_or(0) as f64 / games as f64,
            xg_per_game: xg.unwrap_or(0.0) / games as f64,
        })
    }

    /// Career aggregate of every game against one opponent.
    pub fn h2h_stats(&self, player_id: i64, opponent: &str) -> Result<H2hAggregate> {
        let (games, goals, points) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(goals), 0), COALESCE(SUM(points), 0)
             FROM game_logs
             WHERE player_id = ?1 AND opponent = ?2",
            params![player_id, opponent],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            },
        )?;
        if games == 0 {
            return Ok(H2hAggregate::default());
        }
        Ok(H2hAggregate {
            games,
            ppg: points as f64 / games as f64,
            gpg: goals as f64 / games as f64,
        })
    }

    /// Career points-per-game grouped by side of the ice.
    pub fn home_away_splits(&self, player_id: i64) -> Result<HomeAwaySplits> {
        let mut stmt = self.conn.prepare(
            "SELECT home_away, COUNT(*), COALESCE(SUM(points), 0)
             FROM game_logs
             WHERE player_id = ?1
             GROUP BY home_away",
        )?;
        let rows = stmt.query_map(params![player_id], |row| {
            Ok((
                row.get::<_, Option<String>>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })?;
        let mut splits = HomeAwaySplits::default();
        for row in rows {
            let (side, games, points) = row?;
            if games == 0 {
                continue;
            }
            let ppg = points as f64 / games as f64;
            match side.as_deref() {
                Some("home") => splits.home_ppg = ppg,
                Some("away") => splits.away_ppg = ppg,
                _ => {}
            }
        }
        Ok(splits)
    }

    /// A team's top scorers for a season: (internal id, name) by points.
    pub fn top_players_by_points(
        &self,
        team: &str,
        season: &str,
        limit: usize,
    ) -> Result<Vec<(i64, String)>> {
        let mut stmt = self.conn.prepare(
            "SELECT p.id, p.name
             FROM players p
             JOIN player_season_stats s ON s.player_id = p.id
             WHERE s.team = ?1 AND s.season = ?2
             ORDER BY s.points DESC
             LIMIT ?3",
        )?;
        let rows = stmt.query_map(params![team, season, limit as i64], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })?;
        collect_rows(rows)
    }

    /// League-wide top-N by a stat, optionally pinned to one season
    /// (defaults to the most recent season with data).
    pub fn league_leaders(
        &self,
        stat: StatKind,
        season: Option<&str>,
        limit: usize,
    ) -> Result<Vec<LeaderRow>> {
        let season = match season {
            Some(s) => Some(s.to_string()),
            None => self.latest_season()?,
        };
        let Some(season) = season else {
            return Ok(Vec::new());
        };
        let sql = format!(
            "SELECT p.name, p.position, s.team, s.season, s.games_played,
                    s.goals, s.assists, s.points, s.xg, s.corsi_for_pct,
                    s.{col}
             FROM players p
             JOIN player_season_stats s ON s.player_id = p.id
             WHERE s.season = ?1 AND s.{col} IS NOT NULL
             ORDER BY s.{col} DESC
             LIMIT ?2",
            col = stat.column()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![season, limit as i64], row_to_leader)?;
        let mut leaders = collect_rows(rows)?;
        for (i, row) in leaders.iter_mut().enumerate() {
            row.rank = i as i64 + 1;
        }
        Ok(leaders)
    }

    /// Top scorers on each of the given teams for the latest season.
    pub fn team_players_by_stat(
        &self,
        teams: &[String],
        stat: StatKind,
        limit: usize,
    ) -> Result<Vec<LeaderRow>> {
        if teams.is_empty() {
            return Ok(Vec::new());
        }
        let Some(season) = self.latest_season()? else {
            return Ok(Vec::new());
        };
        let placeholders = (0..teams.len())
            .map(|i| format!("?{}", i + 1))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT p.name, p.position, s.team, s.season, s.games_played,
                    s.goals, s.assists, s.points, s.xg, s.corsi_for_pct,
                    s.{col}
             FROM players p
             JOIN player_season_stats s ON s.player_id = p.id
             WHERE s.team IN ({placeholders}) AND s.season = ?{n}
               AND s.{col} IS NOT NULL
             ORDER BY s.{col} DESC
             LIMIT ?{m}",
            col = stat.column(),
            n = teams.len() + 1,
            m = teams.len() + 2,
        );
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = teams
            .iter()
            .map(|t| Box::new(t.clone()) as Box<dyn rusqlite::ToSql>)
            .collect();
        params_vec.push(Box::new(season));
        params_vec.push(Box::new(limit as i64));

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(
            rusqlite::params_from_iter(params_vec.iter().map(|p| p.as_ref())),
            row_to_leader,
        )?;
        let mut leaders = collect_rows(rows)?;
        for (i, row) in leaders.iter_mut().enumerate() {
            row.rank = i as i64 + 1;
        }
        Ok(leaders)
    }

    /// Top-N per team across the whole league, ranked inside each team by
    /// the chosen stat (window query).
    pub fn per_team_leaders(&self, stat: StatKind, top_n: usize) -> Result<Vec<LeaderRow>> {
        let Some(season) = self.latest_season()? else {
            return Ok(Vec::new());
        };
        let sql = format!(
            "WITH ranked AS (
                 SELECT p.name, p.position, s.team, s.season, s.games_played,
                        s.goals, s.assists, s.points, s.xg, s.corsi_for_pct,
                        s.{col} AS stat_value,
                        ROW_NUMBER() OVER (
                            PARTITION BY s.team ORDER BY s.{col} DESC
                        ) AS team_rank
                 FROM players p
                 JOIN player_season_stats s ON s.player_id = p.id
                 WHERE s.season = ?1 AND s.{col} IS NOT NULL
             )
             SELECT name, position, team, season, games_played, goals, assists,
                    points, xg, corsi_for_pct, stat_value, team_rank
             FROM ranked
             WHERE team_rank <= ?2
             ORDER BY team, team_rank",
            col = stat.column()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![season, top_n as i64], |row| {
            Ok(LeaderRow {
                rank: row.get(11)?,
                name: row.get(0)?,
                position: row.get(1)?,
                team: row.get(2)?,
                season: row.get(3)?,
                games_played: row.get::<_, Option<i64>>(4)?.unwrap_or(0),
                goals: row.get::<_, Option<i64>>(5)?.unwrap_or(0),
                assists: row.get::<_, Option<i64>>(6)?.unwrap_or(0),
                points: row.get::<_, Option<i64>>(7)?.unwrap_or(0),
                xg: row.get(8)?,
                corsi_for_pct: row.get(9)?,
                stat_value: row.get::<_, Option<f64>>(10)?.unwrap_or(0.0),
            })
        })?;
        collect_rows(rows)
    }

    /// Latest stat lines for players matched by name fragments.
    pub fn player_stat_lines(&self, names: &[String], limit: usize) -> Result<Vec<PlayerStatLine>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }
        let clauses = (0..names.len())
            .map(|i| format!("p.name LIKE ?{} COLLATE NOCASE", i + 1))
            .collect::<Vec<_>>()
            .join(" OR ");
        let sql = format!(
            "SELECT p.name, p.position, p.team, s.season, s.games_played,
                    s.goals, s.assists, s.points, s.xg, s.corsi_for_pct,
                    s.toi_per_game
             FROM players p
             LEFT JOIN player_season_stats s ON s.player_id = p.id
             WHERE {clauses}
             ORDER BY s.season DESC
             LIMIT ?{n}",
            n = names.len() + 1
        );
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = names
            .iter()
            .map(|n| Box::new(format!("%{}%", n)) as Box<dyn rusqlite::ToSql>)
            .collect();
        params_vec.push(Box::new(limit as i64));

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(
            rusqlite::params_from_iter(params_vec.iter().map(|p| p.as_ref())),
            |row| {
                Ok(PlayerStatLine {
                    name: row.get(0)?,
                    position: row.get(1)?,
                    team: row.get(2)?,
                    season: row.get(3)?,
                    games_played: row.get(4)?,
                    goals: row.get(5)?,
                    assists: row.get(6)?,
                    points: row.get(7)?,
                    xg: row.get(8)?,
                    corsi_for_pct: row.get(9)?,
                    toi_per_game: row.get(10)?,
                })
            },
        )?;
        collect_rows(rows)
    }

    /// The starter for a team in a season: the goalie with the most starts.
    pub fn starting_goalie(&self, team: &str, season: &str) -> Result<Option<GoalieSummary>> {
        let goalie = self
            .conn
            .query_row(
                "SELECT p.name, g.save_pct, g.goals_against_avg, g.games_started,
                        g.wins, g.losses, g.shutouts
                 FROM goalie_stats g
                 JOIN players p ON g.player_id = p.id
                 WHERE g.team = ?1 AND g.season = ?2
                 ORDER BY g.games_started DESC
                 LIMIT 1",
                params![team, season],
                |row| {
                    Ok(GoalieSummary {
                        name: row.get(0)?,
                        save_pct: row.get::<_, Option<f64>>(1)?.unwrap_or(0.900),
                        gaa: row.get::<_, Option<f64>>(2)?.unwrap_or(3.0),
                        games_started: row.get::<_, Option<i64>>(3)?.unwrap_or(0),
                        wins: row.get::<_, Option<i64>>(4)?.unwrap_or(0),
                        losses: row.get::<_, Option<i64>>(5)?.unwrap_or(0),
                        shutouts: row.get::<_, Option<i64>>(6)?.unwrap_or(0),
                    })
                },
            )
            .optional()?;
        Ok(goalie)
    }

    pub fn team_pace(&self, team: &str, season: &str) -> Result<Option<TeamPace>> {
        let pace = self
            .conn
            .query_row(
                "SELECT goals_for_per_game, goals_against_per_game,
                        total_goals_per_game, shots_for_per_game,
                        shots_against_per_game, power_play_pct, penalty_kill_pct
                 FROM team_season_stats
                 WHERE team = ?1 AND season = ?2",
                params![team, season],
                |row| {
                    let f = |i: usize| -> rusqlite::Result<f64> {
                        Ok(row.get::<_, Option<f64>>(i)?.unwrap_or(0.0))
                    };
                    Ok(TeamPace {
                        goals_for_per_game: f(0)?,
                        goals_against_per_game: f(1)?,
                        total_goals_per_game: f(2)?,
                        shots_for_per_game: f(3)?,
                        shots_against_per_game: f(4)?,
                        power_play_pct: f(5)?,
                        penalty_kill_pct: f(6)?,
                    })
                },
            )
            .optional()?;
        Ok(pace)
    }

    // ---------------------------------------------------------------------
    // Trade value
    // ---------------------------------------------------------------------

    /// A player's trade-value line from their most recent season row.
    pub fn trade_value_for(&self, name: &str) -> Result<Option<TradeValue>> {
        let pattern = format!("%{}%", name);
        let value = self
            .conn
            .query_row(
                "SELECT p.name, s.team, s.games_played, s.points, s.xg,
                        s.corsi_for_pct
                 FROM players p
                 JOIN player_season_stats s ON s.player_id = p.id
                 WHERE p.name LIKE ?1 COLLATE NOCASE AND s.games_played > 0
                 ORDER BY s.season DESC
                 LIMIT 1",
                params![pattern],
                row_to_trade_value,
            )
            .optional()?;
        Ok(value)
    }

    /// Players in the current season whose value lands inside the band,
    /// excluding the named inputs. Minimum 20 games for a stable line.
    pub fn trade_candidates(
        &self,
        band_low: f64,
        band_high: f64,
        exclude_names: &[String],
        limit: usize,
    ) -> Result<Vec<TradeValue>> {
        let Some(season) = self.latest_season()? else {
            return Ok(Vec::new());
        };
        let mut stmt = self.conn.prepare(
            "SELECT p.name, s.team, s.games_played, s.points, s.xg,
                    s.corsi_for_pct
             FROM players p
             JOIN player_season_stats s ON s.player_id = p.id
             WHERE s.season = ?1 AND s.games_played >= 20",
        )?;
        let rows = stmt.query_map(params![season], row_to_trade_value)?;
        let all: Vec<TradeValue> = collect_rows(rows)?;

        let excluded: Vec<String> = exclude_names.iter().map(|n| n.to_lowercase()).collect();
        let mut candidates: Vec<TradeValue> = all
            .into_iter()
            .filter(|c| c.value >= band_low && c.value <= band_high)
            .filter(|c| {
                let name = c.name.to_lowercase();
                !excluded.iter().any(|e| name.contains(e) || e.contains(&name))
            })
            .collect();
        candidates.sort_by(|a, b| {
            b.value
                .partial_cmp(&a.value)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        candidates.truncate(limit);
        Ok(candidates)
    }
}

/// Scoring value of a season line: per-game production dominates, shot
/// quality and possession round it out.
pub fn trade_value_score(points: i64, games: i64, xg: f64, corsi_for_pct: f64) -> f64 {
    if games == 0 {
        return 0.0;
    }
    let ppg = points as f64 / games as f64;
    let xg_per_game = xg / games as f64;
    ppg * 50.0 + xg_per_game * 30.0 + corsi_for_pct * 0.5
}

fn row_to_trade_value(row: &rusqlite::Row) -> rusqlite::Result<TradeValue> {
    let name: String = row.get(0)?;
    let team: Option<String> = row.get(1)?;
    let games_played: i64 = row.get::<_, Option<i64>>(2)?.unwrap_or(0);
    let points: i64 = row.get::<_, Option<i64>>(3)?.unwrap_or(0);
    let xg: f64 = row.get::<_, Option<f64>>(4)?.unwrap_or(0.0);
    let corsi_for_pct: f64 = row.get::<_, Option<f64>>(5)?.unwrap_or(0.0);
    Ok(TradeValue {
        value: trade_value_score(points, games_played, xg, corsi_for_pct),
        name,
        team,
        games_played,
        points,
        xg,
        corsi_for_pct,
    })
}

fn row_to_leader(row: &rusqlite::Row) -> rusqlite::Result<LeaderRow> {
    Ok(LeaderRow {
        rank: 0,
        name: row.get(0)?,
        position: row.get(1)?,
        team: row.get(2)?,
        season: row.get(3)?,
        games_played: row.get::<_, Option<i64>>(4)?.unwrap_or(0),
        goals: row.get::<_, Option<i64>>(5)?.unwrap_or(0),
        assists: row.get::<_, Option<i64>>(6)?.unwrap_or(0),
        points: row.get::<_, Option<i64>>(7)?.unwrap_or(0),
        xg: row.get(8)?,
        corsi_for_pct: row.get(9)?,
        stat_value: row.get::<_, Option<f64>>(10)?.unwrap_or(0.0),
    })
}
