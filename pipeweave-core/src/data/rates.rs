//! Cross-rate resolution through the USD pivot.
//!
//! Pure arithmetic over a [`RateTable`]; no I/O. The returned value is
//! `1 / raw`, i.e. "units of `to` per unit of `from`" — the convention the
//! downstream formatting stage expects, not the raw pivot ratio.

use super::quote::RateTable;
use thiserror::Error;
use tracing::warn;

/// The common currency through which indirect cross-rates are computed.
pub const PIVOT: &str = "USD";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RateError {
    #[error("pivot rate {pair} missing from table")]
    MissingPivotRate { pair: String },
}

/// Exchange rate between two currency codes.
///
/// Branches:
/// - equal currencies → 1.0;
/// - `to == "USD"` → `"USD/{from}"` lookup, substituting 1 with a warning
///   when the pair is absent;
/// - anything else → cross rate through the USD pivot, where a missing pair
///   is an error.
///
/// The missing-key asymmetry between the last two branches is deliberate and
/// load-bearing: changing it changes observable behavior.
pub fn cross_rate(from: &str, to: &str, table: &RateTable) -> Result<f64, RateError> {
    let raw = if from == to {
        1.0
    } else if to == PIVOT {
        let pair = RateTable::pair(PIVOT, from);
        match table.get(&pair) {
            Some(rate) => rate,
            None => {
                warn!(pair = %pair, "rate not found in table, substituting 1");
                1.0
            }
        }
    } else {
        let usd_to_from = lookup_pivot(table, from)?;
        let usd_to_quote = lookup_pivot(table, to)?;
        usd_to_from * (1.0 / usd_to_quote)
    };

    Ok(1.0 / raw)
}

fn lookup_pivot(table: &RateTable, code: &str) -> Result<f64, RateError> {
    let pair = RateTable::pair(PIVOT, code);
    table
        .get(&pair)
        .ok_or(RateError::MissingPivotRate { pair })
}
