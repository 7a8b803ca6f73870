//! Team roster adapter.

use crate::config::Config;
use crate::error::Result;
use crate::season::Season;
use crate::sources::SourceClient;
use chrono::NaiveDate;
use serde_json::Value;
use tracing::warn;

/// One player on a team's current roster.
#[derive(Debug, Clone)]
pub struct RosterPlayer {
    pub player_id: i64,
    pub name: String,
    pub position: String,
    pub birth_date: Option<NaiveDate>,
}

/// Fetch a team's roster, flattening the three position-group buckets into
/// one list. Position falls back to the bucket's default (F/D/G) when the
/// entry carries no explicit code. Empty on source failure.
pub async fn fetch_roster(
    client: &SourceClient,
    config: &Config,
    team: &str,
    season: Season,
) -> Result<Vec<RosterPlayer>> {
    let url = format!("{}/roster/{}/{}", config.league_api_base, team, season.code());
    let payload = match client.get_json(&url).await {
        Ok(payload) => payload,
        Err(e) => {
            warn!(team, error = %e, "roster_fetch_failed");
            return Ok(Vec::new());
        }
    };
    Ok(flatten_roster(&payload))
}

/// Flatten `forwards` / `defensemen` / `goalies` buckets.
pub fn flatten_roster(payload: &Value) -> Vec<RosterPlayer> {
    let mut players = Vec::new();
    for (bucket, default_position) in
        [("forwards", "F"), ("defensemen", "D"), ("goalies", "G")]
    {
        for entry in payload
            .get(bucket)
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
        {
            let Some(player_id) = entry.get("id").and_then(Value::as_i64) else {
                continue;
            };
            let name = full_name(entry);
            let position = entry
                .get("positionCode")
                .and_then(Value::as_str)
                .unwrap_or(default_position)
                .to_string();
            let birth_date = entry
                .get("birthDate")
                .and_then(Value::as_str)
                .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok());
            players.push(RosterPlayer {
                player_id,
                name,
                position,
                birth_date,
            });
        }
    }
    players
}

/// Names arrive as `{"default": "..."}` objects (or plain strings on some
/// historical payloads).
fn name_part(value: Option<&Value>) -> &str {
    match value {
        Some(Value::Object(map)) => map.get("default").and_then(Value::as_str).unwrap_or(""),
        Some(Value::String(s)) => s,
        _ => "",
    }
}

fn full_name(entry: &Value) -> String {
    let first = name_part(entry.get("firstName"));
    let last = name_part(entry.get("lastName"));
    format!("{} {}", first, last).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flattens_all_three_buckets_with_default_positions() {
        let payload = json!({
            "forwards": [
                {"id": 1, "firstName": {"default": "Auston"}, "lastName": {"default": "Matthews"}, "positionCode": "C"}
            ],
            "defensemen": [
                {"id": 2, "firstName": {"default": "Morgan"}, "lastName": {"default": "Rielly"}}
            ],
            "goalies": [
                {"id": 3, "firstName": {"default": "Joseph"}, "lastName": {"default": "Woll"}}
            ]
        });
        let players = flatten_roster(&payload);
        assert_eq!(players.len(), 3);
        assert_eq!(players[0].position, "C");
        assert_eq!(players[1].position, "D");
        assert_eq!(players[2].position, "G");
        assert_eq!(players[0].name, "Auston Matthews");
    }

    #[test]
    fn entries_without_ids_are_skipped() {
        let payload = json!({"forwards": [{"firstName": {"default": "No"}, "lastName": {"default": "Id"}}]});
        assert!(flatten_roster(&payload).is_empty());
    }

    #[test]
    fn plain_string_names_are_accepted() {
        let payload = json!({"forwards": [{"id": 7, "firstName": "Plain", "lastName": "Name"}]});
        let players = flatten_roster(&payload);
        assert_eq!(players[0].name, "Plain Name");
    }
}
