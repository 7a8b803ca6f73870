//! Runtime settings, resolved once from the environment.

use std::path::PathBuf;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV_VAR: &str = "PUCKCAST_DATA_DIR";

/// Application settings with environment overrides.
///
/// Construct once at startup and share by reference; every service that
/// needs a URL, path, or pacing knob receives it explicitly.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the database, the ingestion ledger, and raw CSVs.
    pub data_dir: PathBuf,

    /// League web API (schedule, rosters, game logs, standings).
    pub league_api_base: String,

    /// League stats API (goalie/team summaries).
    pub stats_api_base: String,

    /// Advanced-stats CSV host.
    pub advanced_stats_base: String,

    /// Injury feed endpoint.
    pub injuries_url: String,

    /// Run the startup update job automatically.
    pub auto_update_enabled: bool,

    /// Attempts per HTTP request before giving up.
    pub max_retries: u32,

    /// Delay between per-player fetches inside a sub-task, in milliseconds.
    pub rate_limit_ms: u64,

    /// Delay between per-team and per-week fetches, in milliseconds.
    pub team_fetch_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            league_api_base: "https://api-web.nhle.com/v1".to_string(),
            stats_api_base: "https://api.nhle.com/stats/rest/en".to_string(),
            advanced_stats_base: "https://moneypuck.com/moneypuck/playerData".to_string(),
            injuries_url: "https://site.api.espn.com/apis/site/v2/sports/hockey/nhl/injuries"
                .to_string(),
            auto_update_enabled: true,
            max_retries: 3,
            rate_limit_ms: 200,
            team_fetch_delay_ms: 300,
        }
    }
}

impl Config {
    /// Build settings from the environment, falling back to defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(dir) = std::env::var(DATA_DIR_ENV_VAR) {
            config.data_dir = PathBuf::from(dir);
        }
        if let Ok(base) = std::env::var("NHL_API_BASE") {
            config.league_api_base = base;
        }
        if let Ok(base) = std::env::var("NHL_STATS_API_BASE") {
            config.stats_api_base = base;
        }
        if let Ok(base) = std::env::var("MONEYPUCK_BASE") {
            config.advanced_stats_base = base;
        }
        if let Ok(url) = std::env::var("INJURIES_URL") {
            config.injuries_url = url;
        }
        if let Ok(flag) = std::env::var("PUCKCAST_AUTO_UPDATE") {
            config.auto_update_enabled = !matches!(flag.as_str(), "0" | "false" | "no");
        }
        config
    }

    /// Path to the SQLite database file.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("puckcast.db")
    }

    /// Path to the ingestion progress ledger.
    pub fn progress_path(&self) -> PathBuf {
        self.data_dir.join("ingestion_progress.json")
    }

    /// Cache path for a season's raw advanced-stats CSV.
    pub fn advanced_stats_cache_path(&self, year: u16) -> PathBuf {
        self.data_dir.join("raw").join(format!("moneypuck_{}.csv", year))
    }
}
