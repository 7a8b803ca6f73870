//! Query router: classifies a free-text question, pulls the right data
//! (tabular, prediction, trade value, document search), composes a
//! Markdown context, and hands it to the generator for the final answer.

pub mod classify;
pub mod format;
pub mod timeframe;
pub mod trade;

pub use classify::{Classification, QueryIntent};

use crate::error::Result;
use crate::llm::TextGenerator;
use crate::predict::PredictionEngine;
use crate::rag::RagService;
use crate::season::Season;
use crate::storage::{StatKind, StatsDatabase};
use crate::teams;
use chrono::NaiveDate;
use lru::LruCache;
use serde::Serialize;
use serde_json::json;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

/// Bound on the classification cache.
const CLASSIFICATION_CACHE_SIZE: usize = 256;

const SYSTEM_PROMPT: &str = "You are an expert hockey analytics assistant. You help users \
understand league statistics, player performance, and make data-driven insights for fantasy \
hockey and predictions.

You have access to:
1. **Structured Stats Database**: Player stats, game logs, standings (via SQL)
2. **Analytics Knowledge Base**: Articles and analysis about hockey analytics (via document search)

When answering questions:
- Always cite your data sources
- Distinguish between raw stats and advanced metrics (xG, Corsi, WAR)
- Be clear about the limitations of the data
- If you're uncertain, say so rather than making up stats

For player comparisons:
- Use per-60 or per-game stats to normalize for ice time
- Consider sample size (games played)
- Account for team effects and usage

Key hockey analytics concepts you understand:
- Expected Goals (xG): Probability a shot becomes a goal based on location, type, etc.
- Corsi: Shot attempt differential (shots + missed + blocked)
- Fenwick: Like Corsi but excludes blocked shots
- PDO: Shooting% + Save% (luck indicator, regresses to 100)

You will receive context from database queries and document searches. Use this information to \
provide accurate, data-backed responses.";

/// Where a context section came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Sql,
    Prediction,
    Trade,
    Rag,
}

/// A tagged record of one dispatched retrieval.
#[derive(Debug, Clone, Serialize)]
pub struct SourceRef {
    #[serde(rename = "type")]
    pub kind: SourceKind,
    pub data: serde_json::Value,
}

/// The router's answer: generated prose plus the sources behind it.
#[derive(Debug, Clone, Serialize)]
pub struct QueryOutcome {
    pub response: String,
    pub sources: Vec<SourceRef>,
    pub query_type: String,
}

/// The router service. Holds the generator and retrieval seams; all stats
/// reads go through the store gateway passed per call.
pub struct Copilot {
    generator: Arc<dyn TextGenerator>,
    rag: Arc<RagService>,
    engine: PredictionEngine,
    classification_cache: Mutex<LruCache<String, Classification>>,
}

impl Copilot {
    pub fn new(generator: Arc<dyn TextGenerator>, rag: Arc<RagService>) -> Self {
        Self {
            generator,
            rag,
            engine: PredictionEngine::new(),
            classification_cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(CLASSIFICATION_CACHE_SIZE).expect("nonzero cache size"),
            )),
        }
    }

    /// Answer a free-text query. A failed dispatch is logged and skipped;
    /// the next dispatch still runs.
    pub async fn query(
        &self,
        db: &StatsDatabase,
        user_query: &str,
        include_rag: bool,
        today: NaiveDate,
    ) -> Result<QueryOutcome> {
        let classification = self.classify(user_query).await;
        let preview: String = user_query.chars().take(50).collect();
        info!(
            query = %preview,
            intent = classification.intent.as_str(),
            "query_classified"
        );

        let mut context_parts: Vec<String> = Vec::new();
        let mut sources: Vec<SourceRef> = Vec::new();

        if classification.wants_prediction() {
            match self.fetch_predictions(db, &classification, today) {
                Ok(Some((text, data))) => {
                    context_parts.push(format!("## Scoring Predictions\n{}", text));
                    sources.push(SourceRef {
                        kind: SourceKind::Prediction,
                        data,
                    });
                }
                Ok(None) => {}
                Err(e) => warn!(error = %e, "prediction_dispatch_failed"),
            }
        } else if classification.wants_trade() && !classification.players.is_empty() {
            match trade::trade_comparison(db, &classification.players) {
                Ok(Some(comparison)) => {
                    context_parts.push(format!(
                        "## Trade Value Comparison\n{}",
                        format::format_trade(&comparison)
                    ));
                    sources.push(SourceRef {
                        kind: SourceKind::Trade,
                        data: json!({
                            "total_value": comparison.total_value,
                            "candidates": comparison.candidates.len(),
                        }),
                    });
                }
                Ok(None) => {}
                Err(e) => warn!(error = %e, "trade_dispatch_failed"),
            }
        } else if classification.is_all_teams_query {
            let (stat, label) = pick_stat(&classification.stats, StatKind::Goals);
            let top_n = classification.top_n.unwrap_or(3);
            match db.per_team_leaders(stat, top_n) {
                Ok(rows) => {
                    if let Some(text) = format::format_all_teams_breakdown(&rows, &label, top_n) {
                        context_parts.push(format!("## All Teams Breakdown\n{}", text));
                        sources.push(SourceRef {
                            kind: SourceKind::Sql,
                            data: json!("all_teams_breakdown"),
                        });
                    }
                }
                Err(e) => warn!(error = %e, "breakdown_dispatch_failed"),
            }
        } else if !classification.teams.is_empty() {
            let team_codes = teams::normalize_teams(&classification.teams);
            let (stat, label) = pick_stat(&classification.stats, StatKind::Points);
            match db.team_players_by_stat(&team_codes, stat, 15) {
                Ok(rows) => {
                    if let Some(text) = format::format_team_players(&team_codes, &rows, &label) {
                        context_parts.push(format!("## Team Statistics\n{}", text));
                        sources.push(SourceRef {
                            kind: SourceKind::Sql,
                            data: json!("team_stats"),
                        });
                    }
                }
                Err(e) => warn!(error = %e, "team_dispatch_failed"),
            }
        } else if classification.wants_leaders() {
            let (stat, label) = pick_stat(&classification.stats, StatKind::Points);
            // "in 2015-16?" pins the leaders table to that season.
            let season = classification
                .timeframe
                .as_deref()
                .and_then(timeframe::extract_year)
                .map(|year| Season::new(year).code());
            match db.league_leaders(stat, season.as_deref(), 10) {
                Ok(rows) => {
                    if let Some(text) = format::format_leaders(&rows, &label, 10) {
                        context_parts.push(format!("## League Leaders\n{}", text));
                        sources.push(SourceRef {
                            kind: SourceKind::Sql,
                            data: json!("league_leaders"),
                        });
                    }
                }
                Err(e) => warn!(error = %e, "leaders_dispatch_failed"),
            }
        }

        if !classification.players.is_empty() {
            match db.player_stat_lines(&classification.players, 10) {
                Ok(lines) => {
                    if let Some(text) = format::format_player_stats(&lines) {
                        context_parts.push(format!("## Player Statistics\n{}", text));
                        sources.push(SourceRef {
                            kind: SourceKind::Sql,
                            data: json!("player_stats"),
                        });
                    }
                }
                Err(e) => warn!(error = %e, "player_stats_dispatch_failed"),
            }
        }

        if include_rag {
            match self.rag.search(db, user_query, 3) {
                Ok(hits) if !hits.is_empty() => {
                    let text = hits
                        .iter()
                        .map(|hit| {
                            let preview: String = hit.content.chars().take(500).collect();
                            format!(
                                "### {} (source: {})\n{}...",
                                hit.title.as_deref().unwrap_or("Document"),
                                hit.source.as_deref().unwrap_or("unknown"),
                                preview
                            )
                        })
                        .collect::<Vec<_>>()
                        .join("\n\n");
                    context_parts.push(format!("## Related Analysis\n{}", text));
                    sources.push(SourceRef {
                        kind: SourceKind::Rag,
                        data: serde_json::to_value(&hits)?,
                    });
                }
                Ok(_) => {}
                Err(e) => warn!(error = %e, "rag_dispatch_failed"),
            }
        }

        let context = if context_parts.is_empty() {
            "No specific data found in database.".to_string()
        } else {
            context_parts.join("\n\n")
        };

        let response = self.generate_response(user_query, &context).await?;
        Ok(QueryOutcome {
            response,
            sources,
            query_type: classification.intent.as_str().to_string(),
        })
    }

    /// Classify through the generator, with an LRU cache keyed on the raw
    /// query. Generation or parse failure yields the empty classification.
    async fn classify(&self, query: &str) -> Classification {
        if let Some(cached) = self
            .classification_cache
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(query)
        {
            return cached.clone();
        }

        let classification = match self
            .generator
            .complete(None, &classify::classification_prompt(query), 500)
            .await
        {
            Ok(raw) => classify::parse_classification(&raw),
            Err(e) => {
                warn!(error = %e, "classification_failed");
                Classification::empty()
            }
        };

        self.classification_cache
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .put(query.to_string(), classification.clone());
        classification
    }

    /// Prediction dispatch: a named matchup, a single team's game, or the
    /// whole slate for the target date.
    fn fetch_predictions(
        &self,
        db: &StatsDatabase,
        classification: &Classification,
        today: NaiveDate,
    ) -> Result<Option<(String, serde_json::Value)>> {
        let target_date =
            timeframe::resolve_target_date(classification.timeframe.as_deref(), today);
        let team_codes = teams::normalize_teams(&classification.teams);

        if team_codes.len() >= 2 {
            let prediction = self.engine.matchup_prediction(
                db,
                &team_codes[0],
                &team_codes[1],
                target_date,
                8,
            )?;
            let text = format::format_matchup_prediction(&prediction);
            return Ok(Some((text, json!("scoring_predictions"))));
        }

        if team_codes.len() == 1 {
            let team = &team_codes[0];
            return match db.game_for_team_on(team, target_date)? {
                Some(game) => {
                    let prediction = self.engine.matchup_prediction(
                        db,
                        &game.home_team,
                        &game.away_team,
                        target_date,
                        8,
                    )?;
                    let text = format::format_matchup_prediction(&prediction);
                    Ok(Some((text, json!("scoring_predictions"))))
                }
                None => Ok(Some((
                    format!(
                        "No game scheduled for {} on {}.",
                        team,
                        format::long_date(target_date)
                    ),
                    json!({"games": []}),
                ))),
            };
        }

        // No teams named: predict the whole slate for the date.
        let games = db.games_on_date(target_date)?;
        if games.is_empty() {
            return Ok(Some((
                format!("No games scheduled for {}.", format::long_date(target_date)),
                json!({"games": []}),
            )));
        }

        let mut matchups = Vec::new();
        for game in games.iter().take(10) {
            match self
                .engine
                .matchup_prediction(db, &game.home_team, &game.away_team, target_date, 5)
            {
                Ok(matchup) => matchups.push(matchup),
                Err(e) => {
                    warn!(
                        home = %game.home_team,
                        away = %game.away_team,
                        error = %e,
                        "game_prediction_failed"
                    );
                }
            }
        }

        let text = format::format_slate(target_date, today, &games, &matchups);
        Ok(Some((text, json!({"games": games.len()}))))
    }

    async fn generate_response(&self, query: &str, context: &str) -> Result<String> {
        let user = format!(
            "Context from database and knowledge base:\n\n{context}\n\n---\n\n\
             User question: {query}\n\n\
             Provide a helpful, accurate response based on the context above.\n\n\
             IMPORTANT:\n\
             - Base your answer ONLY on the context provided above.\n\
             - If the context contains scoring predictions, present them clearly with \
             percentages and player names.\n\
             - Always end your response with a \"Sources:\" section listing where the data \
             came from."
        );
        self.generator
            .complete(Some(SYSTEM_PROMPT), &user, 1500)
            .await
    }
}

/// Pick the first recognizable stat from the extracted list, with its
/// display label; fall back to the given default.
fn pick_stat(stats: &[String], default: StatKind) -> (StatKind, String) {
    for raw in stats {
        if let Some(stat) = StatKind::parse_synonym(raw) {
            return (stat, format::title_case(raw));
        }
    }
    (default, default.label().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stat_picking_uses_the_query_wording() {
        let (stat, label) = pick_stat(&["xg".to_string()], StatKind::Points);
        assert_eq!(stat, StatKind::Xg);
        assert_eq!(label, "Xg");

        let (stat, label) = pick_stat(&[], StatKind::Points);
        assert_eq!(stat, StatKind::Points);
        assert_eq!(label, "Points");

        let (stat, label) =
            pick_stat(&["vibes".to_string(), "goals".to_string()], StatKind::Points);
        assert_eq!(stat, StatKind::Goals);
        assert_eq!(label, "Goals");
    }
}
