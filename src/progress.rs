//! Durable ingestion progress ledger.
//!
//! A small JSON file records per-task last-success markers so interrupted
//! or restarted processes resume where they left off. Writes are full-file
//! rewrites through a temp file + rename, under an in-process lock.

use crate::error::Result;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::warn;

/// On-disk ledger contents. Timestamps and dates are ISO-8601 strings;
/// malformed values read back as unset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Progress {
    #[serde(default)]
    pub completed_seasons: Vec<String>,
    #[serde(default)]
    pub last_update: Option<String>,
    #[serde(default)]
    pub current_season_last_update: Option<String>,
    #[serde(default)]
    pub last_game_log_date: Option<String>,
    #[serde(default)]
    pub last_injury_update: Option<String>,
    #[serde(default)]
    pub last_team_stats_update: Option<String>,
    #[serde(default)]
    pub last_roster_sync: Option<String>,
    #[serde(default)]
    pub last_moneypuck_update: Option<String>,
}

/// File-backed ledger handle.
pub struct ProgressLedger {
    path: PathBuf,
    lock: Mutex<()>,
}

impl ProgressLedger {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    /// Read the ledger, defaulting on a missing or corrupt file.
    pub fn load(&self) -> Progress {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        self.load_unlocked()
    }

    fn load_unlocked(&self) -> Progress {
        match fs::read_to_string(&self.path) {
            Ok(body) => serde_json::from_str(&body).unwrap_or_else(|e| {
                warn!(path = %self.path.display(), error = %e, "progress_file_corrupt");
                Progress::default()
            }),
            Err(_) => Progress::default(),
        }
    }

    fn save_unlocked(&self, progress: &Progress) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let body = serde_json::to_string_pretty(progress)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, body)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Read-modify-write a single marker under the lock.
    pub fn update<F>(&self, mutate: F) -> Result<()>
    where
        F: FnOnce(&mut Progress),
    {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut progress = self.load_unlocked();
        mutate(&mut progress);
        self.save_unlocked(&progress)
    }

    // ---------------------------------------------------------------------
    // Typed marker accessors
    // ---------------------------------------------------------------------

    pub fn last_game_log_date(&self) -> Option<NaiveDate> {
        parse_date(self.load().last_game_log_date.as_deref())
    }

    pub fn set_last_game_log_date(&self, date: NaiveDate) -> Result<()> {
        self.update(|p| p.last_game_log_date = Some(date.format("%Y-%m-%d").to_string()))
    }

    pub fn last_injury_update(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(self.load().last_injury_update.as_deref())
    }

    pub fn set_last_injury_update(&self, now: DateTime<Utc>) -> Result<()> {
        self.update(|p| p.last_injury_update = Some(now.to_rfc3339()))
    }

    pub fn last_team_stats_update(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(self.load().last_team_stats_update.as_deref())
    }

    pub fn set_last_team_stats_update(&self, now: DateTime<Utc>) -> Result<()> {
        self.update(|p| p.last_team_stats_update = Some(now.to_rfc3339()))
    }

    pub fn last_roster_sync(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(self.load().last_roster_sync.as_deref())
    }

    pub fn set_last_roster_sync(&self, now: DateTime<Utc>) -> Result<()> {
        self.update(|p| p.last_roster_sync = Some(now.to_rfc3339()))
    }

    pub fn last_moneypuck_update(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(self.load().last_moneypuck_update.as_deref())
    }

    pub fn set_last_moneypuck_update(&self, now: DateTime<Utc>) -> Result<()> {
        self.update(|p| p.last_moneypuck_update = Some(now.to_rfc3339()))
    }

    pub fn is_season_complete(&self, season_year: &str) -> bool {
        self.load()
            .completed_seasons
            .iter()
            .any(|s| s == season_year)
    }

    /// Mark a season fully ingested and stamp the overall last-update.
    pub fn mark_season_complete(&self, season_year: &str, now: DateTime<Utc>) -> Result<()> {
        self.update(|p| {
            if !p.completed_seasons.iter().any(|s| s == season_year) {
                p.completed_seasons.push(season_year.to_string());
            }
            p.last_update = Some(now.to_rfc3339());
        })
    }
}

fn parse_date(raw: Option<&str>) -> Option<NaiveDate> {
    let raw = raw?;
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| raw.parse::<DateTime<Utc>>().ok().map(|dt| dt.date_naive()))
}

fn parse_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw?)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Hours elapsed since a marker, or `None` when it has never been set.
pub fn hours_since(marker: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Option<f64> {
    marker.map(|m| (now - m).num_seconds() as f64 / 3600.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn temp_ledger() -> (tempfile::TempDir, ProgressLedger) {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ProgressLedger::new(dir.path().join("nested").join("progress.json"));
        (dir, ledger)
    }

    #[test]
    fn missing_file_reads_as_default() {
        let (_dir, ledger) = temp_ledger();
        let progress = ledger.load();
        assert!(progress.completed_seasons.is_empty());
        assert!(progress.last_game_log_date.is_none());
    }

    #[test]
    fn markers_survive_reopen() {
        let (dir, ledger) = temp_ledger();
        let date = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
        ledger.set_last_game_log_date(date).unwrap();
        ledger.mark_season_complete("2023", Utc.with_ymd_and_hms(2026, 1, 16, 0, 0, 0).unwrap())
            .unwrap();

        // A fresh handle reads what the previous one wrote.
        let reopened = ProgressLedger::new(dir.path().join("nested").join("progress.json"));
        assert_eq!(reopened.last_game_log_date(), Some(date));
        assert!(reopened.is_season_complete("2023"));
        assert!(!reopened.is_season_complete("2024"));
    }

    #[test]
    fn latest_write_wins() {
        let (_dir, ledger) = temp_ledger();
        for day in 1..=5 {
            let date = NaiveDate::from_ymd_opt(2026, 1, day).unwrap();
            ledger.set_last_game_log_date(date).unwrap();
        }
        assert_eq!(
            ledger.last_game_log_date(),
            NaiveDate::from_ymd_opt(2026, 1, 5)
        );
    }

    #[test]
    fn corrupt_file_reads_as_default() {
        let (_dir, ledger) = temp_ledger();
        ledger.set_last_game_log_date(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap())
            .unwrap();
        fs::write(&ledger.path, "{not json").unwrap();
        assert!(ledger.last_game_log_date().is_none());
    }

    #[test]
    fn malformed_marker_values_read_as_unset() {
        let (_dir, ledger) = temp_ledger();
        ledger.update(|p| p.last_game_log_date = Some("not-a-date".into()))
            .unwrap();
        ledger.update(|p| p.last_injury_update = Some("yesterday-ish".into()))
            .unwrap();
        assert!(ledger.last_game_log_date().is_none());
        assert!(ledger.last_injury_update().is_none());
    }

    #[test]
    fn marking_a_season_twice_is_idempotent() {
        let (_dir, ledger) = temp_ledger();
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        ledger.mark_season_complete("2020", now).unwrap();
        ledger.mark_season_complete("2020", now).unwrap();
        assert_eq!(ledger.load().completed_seasons, vec!["2020".to_string()]);
    }

    #[test]
    fn hours_since_marker() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        let three_hours_ago = Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap();
        assert_eq!(hours_since(Some(three_hours_ago), now), Some(3.0));
        assert_eq!(hours_since(None, now), None);
    }
}
