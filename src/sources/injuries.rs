//! Injury feed adapter.

use crate::config::Config;
use crate::error::Result;
use crate::sources::SourceClient;
use crate::teams;
use chrono::NaiveDate;
use serde_json::Value;
use std::fmt;
use tracing::warn;

/// Normalized injury designations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjuryStatus {
    Ir,
    Ltir,
    DayToDay,
    Out,
    Questionable,
    Probable,
    Suspended,
    Scratch,
    Unknown,
}

impl InjuryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InjuryStatus::Ir => "IR",
            InjuryStatus::Ltir => "LTIR",
            InjuryStatus::DayToDay => "Day-to-Day",
            InjuryStatus::Out => "Out",
            InjuryStatus::Questionable => "Questionable",
            InjuryStatus::Probable => "Probable",
            InjuryStatus::Suspended => "Suspended",
            InjuryStatus::Scratch => "Scratch",
            InjuryStatus::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for InjuryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One league-wide injury report entry.
#[derive(Debug, Clone)]
pub struct InjuryReport {
    pub player_name: String,
    pub last_name: Option<String>,
    pub team: String,
    pub status: InjuryStatus,
    pub description: Option<String>,
    pub reported_date: Option<NaiveDate>,
    pub position: Option<String>,
}

/// Normalize the feed's free-text status. LTIR is matched before IR so that
/// "Long-Term Injured Reserve" does not land in the IR bucket.
pub fn normalize_status(raw: &str) -> InjuryStatus {
    let lower = raw.trim().to_lowercase();
    if lower.is_empty() {
        return InjuryStatus::Unknown;
    }
    if lower.contains("long-term") || lower.contains("long term") || lower.contains("ltir") {
        InjuryStatus::Ltir
    } else if lower.contains("injured reserve") || lower == "ir" {
        InjuryStatus::Ir
    } else if lower.contains("day-to-day") || lower.contains("day to day") || lower.contains("dtd")
    {
        InjuryStatus::DayToDay
    } else if lower.contains("out") {
        InjuryStatus::Out
    } else if lower.contains("questionable") {
        InjuryStatus::Questionable
    } else if lower.contains("probable") {
        InjuryStatus::Probable
    } else if lower.contains("suspen") {
        InjuryStatus::Suspended
    } else if lower.contains("scratch") {
        InjuryStatus::Scratch
    } else {
        InjuryStatus::Unknown
    }
}

/// Fetch the league-wide injury list, grouped by team display name and
/// mapped to franchise codes. Empty on source failure; entries for unknown
/// teams are dropped with a warning.
pub async fn fetch_injuries(client: &SourceClient, config: &Config) -> Result<Vec<InjuryReport>> {
    let payload = match client.get_json(&config.injuries_url).await {
        Ok(payload) => payload,
        Err(e) => {
            warn!(error = %e, "injuries_fetch_failed");
            return Ok(Vec::new());
        }
    };
    Ok(parse_injuries(&payload))
}

pub fn parse_injuries(payload: &Value) -> Vec<InjuryReport> {
    let mut reports = Vec::new();
    for team_block in payload
        .get("injuries")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
    {
        let display_name = team_block
            .get("displayName")
            .and_then(Value::as_str)
            .unwrap_or("");
        let Some(team) = teams::code_for_display_name(display_name) else {
            warn!(team_name = display_name, "unknown_team_in_injury_feed");
            continue;
        };

        for injury in team_block
            .get("injuries")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
        {
            let athlete = injury.get("athlete").cloned().unwrap_or(Value::Null);
            let Some(player_name) = athlete.get("displayName").and_then(Value::as_str) else {
                continue;
            };
            let reported_date = injury
                .get("date")
                .and_then(Value::as_str)
                .and_then(parse_feed_date);
            reports.push(InjuryReport {
                player_name: player_name.to_string(),
                last_name: athlete
                    .get("lastName")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                team: team.to_string(),
                status: normalize_status(
                    injury.get("status").and_then(Value::as_str).unwrap_or(""),
                ),
                description: injury
                    .get("longComment")
                    .or_else(|| injury.get("shortComment"))
                    .and_then(Value::as_str)
                    .map(str::to_string),
                reported_date,
                position: athlete
                    .pointer("/position/abbreviation")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            });
        }
    }
    reports
}

fn parse_feed_date(raw: &str) -> Option<NaiveDate> {
    chrono::DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.date_naive())
        .or_else(|| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok())
}
