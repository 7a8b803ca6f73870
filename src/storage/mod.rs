//! Relational store gateway.
//!
//! Owns every write to the store and the typed read helpers used by the
//! prediction engine and the query router:
//! - `models`: row types
//! - `schema`: connection + schema management
//! - `queries`: upserts and simple lookups
//! - `analysis`: aggregates, leaders, and value queries

pub mod analysis;
pub mod models;
pub mod queries;
pub mod schema;

pub use models::*;
pub use schema::StatsDatabase;

use crate::error::{PuckError, Result};
use std::str::FromStr;

/// A rankable player stat, mapped to its season-stats column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatKind {
    Goals,
    Assists,
    Points,
    Xg,
    CorsiForPct,
    ToiPerGame,
}

impl StatKind {
    /// Resolve router synonyms ("g", "expected goals", "cf%", "ice time").
    pub fn parse_synonym(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "goals" | "g" => Some(StatKind::Goals),
            "assists" | "a" => Some(StatKind::Assists),
            "points" | "p" => Some(StatKind::Points),
            "xg" | "expected goals" => Some(StatKind::Xg),
            "corsi" | "cf%" | "corsi_for_pct" => Some(StatKind::CorsiForPct),
            "toi" | "ice time" | "toi_per_game" => Some(StatKind::ToiPerGame),
            _ => None,
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            StatKind::Goals => "goals",
            StatKind::Assists => "assists",
            StatKind::Points => "points",
            StatKind::Xg => "xg",
            StatKind::CorsiForPct => "corsi_for_pct",
            StatKind::ToiPerGame => "toi_per_game",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StatKind::Goals => "Goals",
            StatKind::Assists => "Assists",
            StatKind::Points => "Points",
            StatKind::Xg => "xG",
            StatKind::CorsiForPct => "Corsi For %",
            StatKind::ToiPerGame => "TOI/GP",
        }
    }
}

impl FromStr for StatKind {
    type Err = PuckError;

    /// The strict form accepted by the leaders surface: exact column names
    /// only, no display synonyms.
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "goals" => Ok(StatKind::Goals),
            "assists" => Ok(StatKind::Assists),
            "points" => Ok(StatKind::Points),
            "xg" => Ok(StatKind::Xg),
            "corsi_for_pct" => Ok(StatKind::CorsiForPct),
            _ => Err(PuckError::InvalidStat {
                stat: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synonyms_resolve() {
        assert_eq!(StatKind::parse_synonym("G"), Some(StatKind::Goals));
        assert_eq!(
            StatKind::parse_synonym("expected goals"),
            Some(StatKind::Xg)
        );
        assert_eq!(StatKind::parse_synonym("cf%"), Some(StatKind::CorsiForPct));
        assert_eq!(StatKind::parse_synonym("ice time"), Some(StatKind::ToiPerGame));
        assert_eq!(StatKind::parse_synonym("pdo"), None);
    }

    #[test]
    fn strict_form_rejects_synonyms() {
        assert!("xg".parse::<StatKind>().is_ok());
        assert!("g".parse::<StatKind>().is_err());
        assert!("toi_per_game".parse::<StatKind>().is_err());
    }
}
