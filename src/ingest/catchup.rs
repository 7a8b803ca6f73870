//! Game-log catch-up: fill the gap between the last successful ingest and
//! today, bounded by a maximum look-back window.

use super::{ingest_all_player_game_logs, ingest_schedule_range};
use crate::config::Config;
use crate::error::Result;
use crate::progress::ProgressLedger;
use crate::season::Season;
use crate::sources::SourceClient;
use crate::storage::StatsDatabase;
use chrono::{Duration, NaiveDate};
use serde::Serialize;
use tracing::info;

/// Never look back further than this on a first-ever run.
pub const MAX_CATCHUP_DAYS: i64 = 14;

/// Outcome of one catch-up pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CatchupStats {
    pub days_missed: i64,
    pub games_found: usize,
    pub logs_updated: usize,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// The date window a catch-up run must cover, or `None` when the store is
/// already current. With no marker, the window opens at the later of the
/// season start and `today - MAX_CATCHUP_DAYS`; otherwise the day after
/// the marker. The window always closes at yesterday.
pub fn catchup_window(
    last_ingested: Option<NaiveDate>,
    today: NaiveDate,
    season: Season,
) -> Option<(NaiveDate, NaiveDate)> {
    let start = match last_ingested {
        Some(last) => last + Duration::days(1),
        None => {
            let earliest_allowed = today - Duration::days(MAX_CATCHUP_DAYS);
            season.start_date().max(earliest_allowed)
        }
    };
    if start >= today {
        return None;
    }
    Some((start, today - Duration::days(1)))
}

/// Catch up on missed game logs: refresh the schedule across the gap,
/// re-ingest every active player's season log (idempotent per-game
/// upserts), and advance the ledger marker to yesterday.
pub async fn catchup_game_logs(
    db: &StatsDatabase,
    client: &SourceClient,
    config: &Config,
    ledger: &ProgressLedger,
    season: Season,
    today: NaiveDate,
) -> Result<CatchupStats> {
    let last = ledger.last_game_log_date();
    let Some((start, end)) = catchup_window(last, today, season) else {
        info!(last_update = ?last, "game_logs_up_to_date");
        return Ok(CatchupStats::default());
    };

    let mut stats = CatchupStats {
        days_missed: (today - start).num_days(),
        start_date: Some(start),
        end_date: Some(end),
        ..Default::default()
    };

    info!(
        start = %start,
        end = %end,
        days_missed = stats.days_missed,
        "catching_up_game_logs"
    );

    stats.games_found = ingest_schedule_range(db, client, config, start, end).await?;

    if stats.days_missed > 0 {
        info!(season = %season, "refreshing_player_game_logs");
        let counts = ingest_all_player_game_logs(db, client, config, season).await?;
        stats.logs_updated = counts.logs_ingested;
    }

    ledger.set_last_game_log_date(today - Duration::days(1))?;

    info!(
        days_missed = stats.days_missed,
        games = stats.games_found,
        logs = stats.logs_updated,
        "game_log_catchup_complete"
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn first_run_is_bounded_by_the_lookback_window() {
        // Mid-season first run: the season started long ago, so the window
        // opens MAX_CATCHUP_DAYS back.
        let today = date(2026, 1, 20);
        let (start, end) = catchup_window(None, today, Season::new(2025)).unwrap();
        assert_eq!(start, date(2026, 1, 6));
        assert_eq!(end, date(2026, 1, 19));
        assert!((today - start).num_days() <= MAX_CATCHUP_DAYS);
    }

    #[test]
    fn first_run_early_in_the_season_starts_at_opening_day() {
        let today = date(2025, 10, 5);
        let (start, end) = catchup_window(None, today, Season::new(2025)).unwrap();
        assert_eq!(start, date(2025, 10, 1));
        assert_eq!(end, date(2025, 10, 4));
    }

    #[test]
    fn resumes_the_day_after_the_marker() {
        // Three-day outage: marker at D-4, today D, window covers [D-3, D-1].
        let today = date(2026, 1, 20);
        let (start, end) =
            catchup_window(Some(date(2026, 1, 16)), today, Season::new(2025)).unwrap();
        assert_eq!(start, date(2026, 1, 17));
        assert_eq!(end, date(2026, 1, 19));
    }

    #[test]
    fn current_marker_means_no_work() {
        let today = date(2026, 1, 20);
        assert!(catchup_window(Some(date(2026, 1, 19)), today, Season::new(2025)).is_none());
        assert!(catchup_window(Some(date(2026, 1, 20)), today, Season::new(2025)).is_none());
        // A marker in the future (clock skew) also yields no work.
        assert!(catchup_window(Some(date(2026, 1, 25)), today, Season::new(2025)).is_none());
    }
}
