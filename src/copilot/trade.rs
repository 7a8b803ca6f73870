//! Trade-value comparison: score the named players, then retrieve
//! comparable players inside a fair-value band.

use crate::error::Result;
use crate::storage::{StatsDatabase, TradeValue};

/// Band around the combined value considered a fair return.
const BAND_LOW: f64 = 0.8;
const BAND_HIGH: f64 = 1.2;

/// Maximum comparable players returned.
const MAX_CANDIDATES: usize = 10;

/// A trade comparison: the valued inputs and comparable-return candidates.
#[derive(Debug, Clone)]
pub struct TradeComparison {
    pub inputs: Vec<TradeValue>,
    pub total_value: f64,
    pub band_low: f64,
    pub band_high: f64,
    pub candidates: Vec<TradeValue>,
}

/// Value the named players and find current-season comparables whose
/// combined-value band covers a fair return. Names that match no player
/// are silently skipped; no matches at all yields `None`.
pub fn trade_comparison(
    db: &StatsDatabase,
    player_names: &[String],
) -> Result<Option<TradeComparison>> {
    let mut inputs = Vec::new();
    for name in player_names {
        if let Some(value) = db.trade_value_for(name)? {
            inputs.push(value);
        }
    }
    if inputs.is_empty() {
        return Ok(None);
    }

    let total_value: f64 = inputs.iter().map(|v| v.value).sum();
    let band_low = total_value * BAND_LOW;
    let band_high = total_value * BAND_HIGH;

    let exclude: Vec<String> = inputs.iter().map(|v| v.name.clone()).collect();
    let candidates = db.trade_candidates(band_low, band_high, &exclude, MAX_CANDIDATES)?;

    Ok(Some(TradeComparison {
        inputs,
        total_value,
        band_low,
        band_high,
        candidates,
    }))
}
