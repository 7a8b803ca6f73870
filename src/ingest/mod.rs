//! Ingestion orchestrator: startup, daily, and bulk multi-season jobs.
//!
//! Sub-tasks run serially in a fixed order. Each one is throttled by its
//! freshness marker in the progress ledger, and a failure is captured into
//! the run summary so the remaining sub-tasks still execute. A latch on
//! the service prevents overlapping runs.

pub mod bulk;
pub mod catchup;

use crate::config::Config;
use crate::error::{PuckError, Result};
use crate::progress::{hours_since, ProgressLedger};
use crate::season::Season;
use crate::sources::{
    advanced_stats, injuries, roster, schedule, stats_api, SourceClient,
};
use crate::storage::{InjuryWrite, StatsDatabase};
use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Freshness thresholds, in hours.
const INJURY_REFRESH_HOURS: f64 = 4.0;
const TEAM_STATS_REFRESH_HOURS: f64 = 12.0;
const ADVANCED_STATS_REFRESH_HOURS: f64 = 12.0;
const ROSTER_SYNC_HOURS: f64 = 24.0;

/// The season-stats table is considered unseeded below this row count.
const SEED_THRESHOLD: i64 = 100;

/// A sub-task that either ran or was skipped for freshness.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum TaskStatus<T: Serialize> {
    Done(T),
    Skipped { skipped: bool, reason: &'static str },
}

impl<T: Serialize> TaskStatus<T> {
    fn skipped(reason: &'static str) -> Self {
        TaskStatus::Skipped {
            skipped: true,
            reason,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SeedOutcome {
    pub loaded: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestCounts {
    pub players_processed: usize,
    pub logs_ingested: usize,
    pub errors: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct InjurySyncStats {
    pub fetched: usize,
    pub matched: usize,
    pub updated: usize,
    pub inserted: usize,
    pub cleared: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RosterSyncStats {
    pub teams_processed: usize,
    pub players_updated: usize,
    pub players_not_found: usize,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TeamStatsRefresh {
    pub goalies: usize,
    pub teams: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdvancedStatsRefresh {
    pub updated: usize,
    pub season: String,
}

/// Summary of one startup or daily run.
#[derive(Debug, Default, Serialize)]
pub struct UpdateSummary {
    pub seed: Option<TaskStatus<SeedOutcome>>,
    pub schedule: Option<usize>,
    pub game_logs: Option<catchup::CatchupStats>,
    pub injuries: Option<TaskStatus<InjurySyncStats>>,
    pub team_stats: Option<TaskStatus<TeamStatsRefresh>>,
    pub rosters: Option<TaskStatus<RosterSyncStats>>,
    pub advanced_stats: Option<TaskStatus<AdvancedStatsRefresh>>,
    pub errors: Vec<String>,
}

/// Orchestrates update jobs. One instance per process; the latch makes a
/// second concurrent trigger return `UpdateInProgress` instead of queueing.
pub struct UpdateService {
    config: Arc<Config>,
    ledger: Arc<ProgressLedger>,
    running: AtomicBool,
}

impl UpdateService {
    pub fn new(config: Arc<Config>, ledger: Arc<ProgressLedger>) -> Self {
        Self {
            config,
            ledger,
            running: AtomicBool::new(false),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// The startup job: seed-if-empty, today's schedule, game-log
    /// catch-up, injuries, team/goalie stats, roster sync, advanced-stats
    /// refresh. Non-blocking to serving when spawned as a background task.
    pub async fn run_startup(&self, today: NaiveDate) -> Result<UpdateSummary> {
        self.acquire()?;
        let result = self.startup_inner(today).await;
        self.running.store(false, Ordering::SeqCst);
        result
    }

    /// The daily job: schedule for the coming week, then an unconditional
    /// refresh of logs, injuries, team/goalie stats, and rosters.
    pub async fn run_daily(&self, today: NaiveDate) -> Result<UpdateSummary> {
        self.acquire()?;
        let result = self.daily_inner(today).await;
        self.running.store(false, Ordering::SeqCst);
        result
    }

    fn acquire(&self) -> Result<()> {
        self.running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| PuckError::UpdateInProgress)?;
        Ok(())
    }

    async fn startup_inner(&self, today: NaiveDate) -> Result<UpdateSummary> {
        let mut summary = UpdateSummary::default();
        let season = Season::current(today);
        info!(season = %season, "starting_startup_updates");

        let db = StatsDatabase::open(&self.config)?;
        let client = SourceClient::new(&self.config);

        match self.seed_if_empty(&db, &client, season).await {
            Ok(seed) => summary.seed = Some(seed),
            Err(e) => {
                error!(error = %e, "seed_failed");
                summary.errors.push(format!("seed: {}", e));
            }
        }

        match ingest_schedule_for_date(&db, &client, &self.config, today).await {
            Ok(games) => summary.schedule = Some(games),
            Err(e) => {
                error!(error = %e, "schedule_refresh_failed");
                summary.errors.push(format!("schedule: {}", e));
            }
        }

        match catchup::catchup_game_logs(
            &db,
            &client,
            &self.config,
            &self.ledger,
            season,
            today,
        )
        .await
        {
            Ok(stats) => summary.game_logs = Some(stats),
            Err(e) => {
                error!(error = %e, "game_log_catchup_failed");
                summary.errors.push(format!("game_logs: {}", e));
            }
        }

        match self.update_injuries(&db, &client).await {
            Ok(stats) => summary.injuries = Some(stats),
            Err(e) => {
                error!(error = %e, "injury_update_failed");
                summary.errors.push(format!("injuries: {}", e));
            }
        }

        match self.update_team_goalie_stats(&db, &client, season).await {
            Ok(stats) => summary.team_stats = Some(stats),
            Err(e) => {
                error!(error = %e, "team_stats_update_failed");
                summary.errors.push(format!("team_stats: {}", e));
            }
        }

        match self.update_rosters(&db, &client, season).await {
            Ok(stats) => summary.rosters = Some(stats),
            Err(e) => {
                error!(error = %e, "roster_sync_failed");
                summary.errors.push(format!("rosters: {}", e));
            }
        }

        match self.refresh_advanced_stats(&db, &client, season).await {
            Ok(stats) => summary.advanced_stats = Some(stats),
            Err(e) => {
                error!(error = %e, "advanced_stats_refresh_failed");
                summary.errors.push(format!("advanced_stats: {}", e));
            }
        }

        info!(errors = summary.errors.len(), "startup_updates_complete");
        Ok(summary)
    }

    async fn daily_inner(&self, today: NaiveDate) -> Result<UpdateSummary> {
        let mut summary = UpdateSummary::default();
        let season = Season::current(today);
        info!(season = %season, "starting_daily_updates");

        let db = StatsDatabase::open(&self.config)?;
        let client = SourceClient::new(&self.config);

        match ingest_schedule_range(
            &db,
            &client,
            &self.config,
            today,
            today + ChronoDuration::days(7),
        )
        .await
        {
            Ok(games) => summary.schedule = Some(games),
            Err(e) => summary.errors.push(format!("schedule: {}", e)),
        }

        match ingest_all_player_game_logs(&db, &client, &self.config, season).await {
            Ok(counts) => {
                self.ledger.set_last_game_log_date(today)?;
                summary.game_logs = Some(catchup::CatchupStats {
                    logs_updated: counts.logs_ingested,
                    ..Default::default()
                });
            }
            Err(e) => summary.errors.push(format!("game_logs: {}", e)),
        }

        match ingest_injuries(&db, &client, &self.config).await {
            Ok(stats) => {
                self.ledger.set_last_injury_update(Utc::now())?;
                summary.injuries = Some(TaskStatus::Done(stats));
            }
            Err(e) => summary.errors.push(format!("injuries: {}", e)),
        }

        match refresh_team_goalie_stats(&db, &client, &self.config, season).await {
            Ok(stats) => {
                self.ledger.set_last_team_stats_update(Utc::now())?;
                summary.team_stats = Some(TaskStatus::Done(stats));
            }
            Err(e) => summary.errors.push(format!("team_stats: {}", e)),
        }

        match sync_rosters(&db, &client, &self.config, season).await {
            Ok(stats) => {
                self.ledger.set_last_roster_sync(Utc::now())?;
                summary.rosters = Some(TaskStatus::Done(stats));
            }
            Err(e) => summary.errors.push(format!("rosters: {}", e)),
        }

        match self.refresh_advanced_stats(&db, &client, season).await {
            Ok(stats) => summary.advanced_stats = Some(stats),
            Err(e) => summary.errors.push(format!("advanced_stats: {}", e)),
        }

        info!(errors = summary.errors.len(), "daily_updates_complete");
        Ok(summary)
    }

    /// Seed advanced stats when the store looks freshly deployed.
    async fn seed_if_empty(
        &self,
        db: &StatsDatabase,
        client: &SourceClient,
        season: Season,
    ) -> Result<TaskStatus<SeedOutcome>> {
        let existing = db.count_season_stats()?;
        if existing >= SEED_THRESHOLD {
            info!(count = existing, "season_stats_already_seeded");
            return Ok(TaskStatus::skipped("already_seeded"));
        }
        info!(count = existing, season = %season, "seeding_season_stats");
        let loaded = ingest_advanced_stats(db, client, &self.config, season).await?;
        Ok(TaskStatus::Done(SeedOutcome { loaded }))
    }

    async fn update_injuries(
        &self,
        db: &StatsDatabase,
        client: &SourceClient,
    ) -> Result<TaskStatus<InjurySyncStats>> {
        let now = Utc::now();
        if let Some(hours) = hours_since(self.ledger.last_injury_update(), now) {
            if hours < INJURY_REFRESH_HOURS {
                info!(hours_ago = hours, "injuries_recently_updated");
                return Ok(TaskStatus::skipped("recently_updated"));
            }
        }
        let stats = ingest_injuries(db, client, &self.config).await?;
        self.ledger.set_last_injury_update(now)?;
        Ok(TaskStatus::Done(stats))
    }

    async fn update_team_goalie_stats(
        &self,
        db: &StatsDatabase,
        client: &SourceClient,
        season: Season,
    ) -> Result<TaskStatus<TeamStatsRefresh>> {
        let now = Utc::now();
        if let Some(hours) = hours_since(self.ledger.last_team_stats_update(), now) {
            if hours < TEAM_STATS_REFRESH_HOURS {
                info!(hours_ago = hours, "team_stats_recently_updated");
                return Ok(TaskStatus::skipped("recently_updated"));
            }
        }
        let stats = refresh_team_goalie_stats(db, client, &self.config, season).await?;
        self.ledger.set_last_team_stats_update(now)?;
        Ok(TaskStatus::Done(stats))
    }

    async fn update_rosters(
        &self,
        db: &StatsDatabase,
        client: &SourceClient,
        season: Season,
    ) -> Result<TaskStatus<RosterSyncStats>> {
        let now = Utc::now();
        if let Some(hours) = hours_since(self.ledger.last_roster_sync(), now) {
            if hours < ROSTER_SYNC_HOURS {
                info!(hours_ago = hours, "rosters_recently_synced");
                return Ok(TaskStatus::skipped("recently_updated"));
            }
        }
        let stats = sync_rosters(db, client, &self.config, season).await?;
        self.ledger.set_last_roster_sync(now)?;
        Ok(TaskStatus::Done(stats))
    }

    /// The advanced-stats feed republishes during the season; re-download
    /// to pick up moving xG and possession numbers.
    async fn refresh_advanced_stats(
        &self,
        db: &StatsDatabase,
        client: &SourceClient,
        season: Season,
    ) -> Result<TaskStatus<AdvancedStatsRefresh>> {
        let now = Utc::now();
        if let Some(hours) = hours_since(self.ledger.last_moneypuck_update(), now) {
            if hours < ADVANCED_STATS_REFRESH_HOURS {
                info!(hours_ago = hours, "advanced_stats_recently_updated");
                return Ok(TaskStatus::skipped("recently_updated"));
            }
        }
        let updated = ingest_advanced_stats(db, client, &self.config, season).await?;
        self.ledger.set_last_moneypuck_update(now)?;
        Ok(TaskStatus::Done(AdvancedStatsRefresh {
            updated,
            season: season.code(),
        }))
    }
}

// -------------------------------------------------------------------------
// Shared sub-task pipelines
// -------------------------------------------------------------------------

/// Fetch and upsert the schedule week containing one date.
pub async fn ingest_schedule_for_date(
    db: &StatsDatabase,
    client: &SourceClient,
    config: &Config,
    date: NaiveDate,
) -> Result<usize> {
    let games = schedule::fetch_schedule_for_date(client, config, date).await?;
    let mut upserted = 0;
    for game in &games {
        db.upsert_game(game)?;
        upserted += 1;
    }
    info!(%date, games = upserted, "ingested_schedule");
    Ok(upserted)
}

/// Fetch and upsert the schedule across a date range. The source returns
/// a week per call, so the cursor advances seven days at a time.
pub async fn ingest_schedule_range(
    db: &StatsDatabase,
    client: &SourceClient,
    config: &Config,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<usize> {
    let mut total = 0;
    let mut cursor = start;
    while cursor <= end {
        total += ingest_schedule_for_date(db, client, config, cursor).await?;
        cursor += ChronoDuration::days(7);
        tokio::time::sleep(Duration::from_millis(config.team_fetch_delay_ms)).await;
    }
    Ok(total)
}

/// Re-ingest the full season game log of every active player (one with a
/// season-stat row). Per-player failures count toward the summary and the
/// batch continues.
pub async fn ingest_all_player_game_logs(
    db: &StatsDatabase,
    client: &SourceClient,
    config: &Config,
    season: Season,
) -> Result<IngestCounts> {
    let players = db.active_player_ids(&season.code())?;
    let total = players.len();
    let mut counts = IngestCounts::default();

    for (nhl_id, name) in players {
        match ingest_player_game_logs(db, client, config, nhl_id, season).await {
            Ok(logs) => {
                counts.logs_ingested += logs;
                counts.players_processed += 1;
            }
            Err(e) => {
                warn!(player = %name, error = %e, "player_game_log_error");
                counts.errors += 1;
            }
        }
        if counts.players_processed % 50 == 0 && counts.players_processed > 0 {
            info!(
                processed = counts.players_processed,
                total,
                logs = counts.logs_ingested,
                "game_log_ingestion_progress"
            );
        }
        tokio::time::sleep(Duration::from_millis(config.rate_limit_ms)).await;
    }

    info!(
        players = counts.players_processed,
        logs = counts.logs_ingested,
        errors = counts.errors,
        "game_log_ingestion_complete"
    );
    Ok(counts)
}

/// Fetch and upsert one player's season log.
pub async fn ingest_player_game_logs(
    db: &StatsDatabase,
    client: &SourceClient,
    config: &Config,
    player_nhl_id: i64,
    season: Season,
) -> Result<usize> {
    let Some(player_id) = db.player_id_by_nhl_id(player_nhl_id)? else {
        warn!(nhl_id = player_nhl_id, "player_not_found");
        return Ok(0);
    };
    let entries =
        crate::sources::game_log::fetch_player_game_log(client, config, player_nhl_id, season)
            .await?;
    let season_code = season.code();
    for entry in &entries {
        db.upsert_game_log(player_id, &season_code, entry)?;
    }
    Ok(entries.len())
}

/// Ingest the league-wide injury feed with current-view semantics: all
/// active rows are cleared, then the feed re-asserts current truth. An
/// empty fetch leaves the existing view untouched.
pub async fn ingest_injuries(
    db: &StatsDatabase,
    client: &SourceClient,
    config: &Config,
) -> Result<InjurySyncStats> {
    let reports = injuries::fetch_injuries(client, config).await?;
    let mut stats = InjurySyncStats {
        fetched: reports.len(),
        ..Default::default()
    };
    if reports.is_empty() {
        return Ok(stats);
    }

    db.clear_active_injuries()?;
    stats.cleared = true;

    for report in &reports {
        match db.record_injury(report)? {
            InjuryWrite::Updated => {
                stats.matched += 1;
                stats.updated += 1;
            }
            InjuryWrite::Inserted => {
                stats.matched += 1;
                stats.inserted += 1;
            }
            InjuryWrite::PlayerUnknown => {}
        }
    }

    info!(
        fetched = stats.fetched,
        matched = stats.matched,
        "injuries_ingested"
    );
    Ok(stats)
}

/// Refresh goalie and team season summaries.
pub async fn refresh_team_goalie_stats(
    db: &StatsDatabase,
    client: &SourceClient,
    config: &Config,
    season: Season,
) -> Result<TeamStatsRefresh> {
    let season_code = season.code();

    let goalies = stats_api::fetch_goalie_stats(client, config, season).await?;
    for goalie in &goalies {
        db.upsert_goalie_stats(&season_code, goalie)?;
    }

    let team_rows = stats_api::fetch_team_stats(client, config, season).await?;
    for team in &team_rows {
        db.upsert_team_season_stats(&season_code, team)?;
    }

    info!(
        goalies = goalies.len(),
        teams = team_rows.len(),
        season = %season,
        "team_goalie_stats_refreshed"
    );
    Ok(TeamStatsRefresh {
        goalies: goalies.len(),
        teams: team_rows.len(),
    })
}

/// Walk every franchise roster and point players at their current teams.
/// Players the store has never seen are counted, not created; stats
/// ingestion owns player creation.
pub async fn sync_rosters(
    db: &StatsDatabase,
    client: &SourceClient,
    config: &Config,
    season: Season,
) -> Result<RosterSyncStats> {
    let mut stats = RosterSyncStats::default();

    for team in crate::teams::TEAM_CODES {
        let players = match roster::fetch_roster(client, config, team, season).await {
            Ok(players) => players,
            Err(e) => {
                warn!(team, error = %e, "roster_sync_team_error");
                stats.errors.push(format!("{}: {}", team, e));
                continue;
            }
        };
        for player in players {
            let found = db.update_player_from_roster(
                player.player_id,
                team,
                Some(&player.position),
                &player.name,
                player.birth_date,
            )?;
            if found {
                stats.players_updated += 1;
            } else {
                stats.players_not_found += 1;
            }
        }
        stats.teams_processed += 1;
        tokio::time::sleep(Duration::from_millis(config.team_fetch_delay_ms)).await;
    }

    info!(
        teams = stats.teams_processed,
        updated = stats.players_updated,
        "roster_sync_complete"
    );
    Ok(stats)
}

/// Download, project, and upsert one season of advanced skater stats.
/// Returns the number of season lines written.
pub async fn ingest_advanced_stats(
    db: &StatsDatabase,
    client: &SourceClient,
    config: &Config,
    season: Season,
) -> Result<usize> {
    let body = advanced_stats::download_season_csv(client, config, season).await?;
    let records = advanced_stats::parse_skater_csv(&body)?;
    let season_code = season.code();

    let mut updated = 0;
    for record in &records {
        let player_id = db.upsert_player(
            record.player_ext_id,
            &record.name,
            Some(&record.team),
            None,
        )?;
        db.upsert_season_stats(
            player_id,
            &season_code,
            &record.team,
            record.games_played,
            record.goals,
            record.assists,
            record.points,
            record.shots,
            record.toi_per_game,
            record.xg,
            record.xg_per_60,
            record.corsi_for_pct,
            record.fenwick_for_pct,
        )?;
        updated += 1;
    }

    info!(season = %season, count = updated, "advanced_stats_ingested");
    Ok(updated)
}
