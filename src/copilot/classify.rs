//! Query classification: prompt construction and tolerant parsing of the
//! generator's JSON reply.

use serde::Deserialize;

/// Recognized query intents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryIntent {
    StatsLookup,
    Comparison,
    TrendAnalysis,
    Explainer,
    Prediction,
    Leaders,
    TeamBreakdown,
    MatchupPrediction,
    TonightPrediction,
    TradeSuggestion,
    #[serde(other)]
    Unknown,
}

impl QueryIntent {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryIntent::StatsLookup => "stats_lookup",
            QueryIntent::Comparison => "comparison",
            QueryIntent::TrendAnalysis => "trend_analysis",
            QueryIntent::Explainer => "explainer",
            QueryIntent::Prediction => "prediction",
            QueryIntent::Leaders => "leaders",
            QueryIntent::TeamBreakdown => "team_breakdown",
            QueryIntent::MatchupPrediction => "matchup_prediction",
            QueryIntent::TonightPrediction => "tonight_prediction",
            QueryIntent::TradeSuggestion => "trade_suggestion",
            QueryIntent::Unknown => "unknown",
        }
    }
}

impl Default for QueryIntent {
    fn default() -> Self {
        QueryIntent::Unknown
    }
}

/// Entities and flags extracted from a query.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Classification {
    #[serde(rename = "type", default)]
    pub intent: QueryIntent,
    #[serde(default)]
    pub players: Vec<String>,
    #[serde(default)]
    pub teams: Vec<String>,
    #[serde(default)]
    pub stats: Vec<String>,
    #[serde(default)]
    pub timeframe: Option<String>,
    #[serde(default)]
    pub is_leaders_query: bool,
    #[serde(default)]
    pub is_all_teams_query: bool,
    #[serde(default)]
    pub is_prediction_query: bool,
    #[serde(default)]
    pub is_tonight_query: bool,
    #[serde(default)]
    pub is_trade_query: bool,
    #[serde(default)]
    pub top_n: Option<usize>,
}

impl Classification {
    /// The fallback when classification fails: unknown type, no entities.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn wants_prediction(&self) -> bool {
        self.is_prediction_query
            || matches!(
                self.intent,
                QueryIntent::MatchupPrediction | QueryIntent::TonightPrediction
            )
    }

    pub fn wants_trade(&self) -> bool {
        self.is_trade_query || self.intent == QueryIntent::TradeSuggestion
    }

    pub fn wants_leaders(&self) -> bool {
        self.is_leaders_query || self.intent == QueryIntent::Leaders
    }
}

/// Build the classification prompt sent to the generator.
pub fn classification_prompt(query: &str) -> String {
    format!(
        r#"Classify this hockey analytics query and extract key entities.

Query: "{query}"

Respond with JSON only:
{{
    "type": "stats_lookup" | "comparison" | "trend_analysis" | "explainer" | "prediction" | "leaders" | "team_breakdown" | "matchup_prediction" | "tonight_prediction" | "trade_suggestion",
    "players": ["player names mentioned"],
    "teams": ["team names or abbreviations - convert full names to abbreviations like TOR, BOS, EDM"],
    "stats": ["specific stats mentioned like goals, xG, corsi"],
    "timeframe": "current season" | "career" | "specific dates" | "tonight" | "tomorrow" | "monday" | "this week" | null,
    "is_leaders_query": true if asking about league leaders/top players/who leads in a stat,
    "is_all_teams_query": true if asking about all teams or each team (e.g. "top 3 on each team", "best player per team"),
    "is_prediction_query": true if asking who will score, predictions, who to start, fantasy advice for upcoming games,
    "is_tonight_query": true if asking about tonight's, today's, tomorrow's, or upcoming games without specific teams,
    "is_trade_query": true if asking for trade targets or fair-value comparisons for named players,
    "top_n": number if asking for top N players (e.g. "top 3" = 3, "top 5" = 5)
}}

Examples:
- "Who will score in TOR vs BOS tonight?" -> type: "matchup_prediction", teams: ["TOR", "BOS"], is_prediction_query: true
- "Who should I start tonight?" -> type: "tonight_prediction", is_prediction_query: true, is_tonight_query: true
- "Who is going to score in the leafs game tomorrow?" -> type: "matchup_prediction", teams: ["TOR"], is_prediction_query: true, timeframe: "tomorrow"
- "Best bets for Monday's games" -> type: "tonight_prediction", is_prediction_query: true, is_tonight_query: true, timeframe: "monday"
- "Who could we get for Marner?" -> type: "trade_suggestion", players: ["Marner"], is_trade_query: true"#
    )
}

/// Parse the generator's reply. Fenced code blocks are stripped; any parse
/// failure yields the empty classification so the router can fall through
/// to document search alone.
pub fn parse_classification(raw: &str) -> Classification {
    let body = strip_code_fence(raw);
    serde_json::from_str(body.trim()).unwrap_or_else(|_| Classification::empty())
}

/// Pull the contents out of a ```json ... ``` fence if one is present.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(open) = trimmed.find("```") else {
        return trimmed;
    };
    let after_fence = &trimmed[open + 3..];
    // Skip an optional language tag on the fence line.
    let body_start = after_fence.find('\n').map(|i| i + 1).unwrap_or(0);
    let body = &after_fence[body_start..];
    match body.find("```") {
        Some(close) => &body[..close],
        None => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_full_classification() {
        let raw = r#"{
            "type": "matchup_prediction",
            "players": [],
            "teams": ["TOR", "BOS"],
            "stats": [],
            "timeframe": "tonight",
            "is_prediction_query": true,
            "top_n": 5
        }"#;
        let c = parse_classification(raw);
        assert_eq!(c.intent, QueryIntent::MatchupPrediction);
        assert_eq!(c.teams, vec!["TOR", "BOS"]);
        assert!(c.wants_prediction());
        assert_eq!(c.top_n, Some(5));
    }

    #[test]
    fn strips_fenced_code_blocks() {
        let raw = "```json\n{\"type\": \"leaders\", \"is_leaders_query\": true}\n```";
        let c = parse_classification(raw);
        assert_eq!(c.intent, QueryIntent::Leaders);
        assert!(c.wants_leaders());
    }

    #[test]
    fn garbage_falls_back_to_empty() {
        let c = parse_classification("I think this is about goals, probably?");
        assert_eq!(c.intent, QueryIntent::Unknown);
        assert!(c.players.is_empty());
        assert!(c.teams.is_empty());
        assert!(c.stats.is_empty());
    }

    #[test]
    fn unknown_intent_string_maps_to_unknown() {
        let c = parse_classification(r#"{"type": "haiku_request"}"#);
        assert_eq!(c.intent, QueryIntent::Unknown);
    }

    #[test]
    fn missing_fields_default() {
        let c = parse_classification(r#"{"type": "stats_lookup", "players": ["McDavid"]}"#);
        assert_eq!(c.intent, QueryIntent::StatsLookup);
        assert_eq!(c.players, vec!["McDavid"]);
        assert!(!c.is_prediction_query);
        assert_eq!(c.top_n, None);
    }

    #[test]
    fn trade_flag_routes() {
        let c = parse_classification(r#"{"type": "trade_suggestion", "players": ["Marner"]}"#);
        assert!(c.wants_trade());
    }
}
