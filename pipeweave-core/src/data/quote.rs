//! Quote payload schema and the rate table it parses into.
//!
//! Both the remote service and the bundled snapshot use the same nested
//! shape: `list.resources[].resource.fields.{name, price}`, where `name` is
//! a `"BASE/QUOTE"` pair code and `price` arrives as a number or a numeric
//! string. Malformed records are skipped, never fatal — a payload is only an
//! error when the envelope itself does not parse.

use super::source::FetchError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

/// `"BASE/QUOTE"` pair code → positive price.
///
/// USD-pivot tables carry the self-pair `"USD/USD" = 1`; every other pair is
/// expressed relative to USD.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RateTable {
    pairs: BTreeMap<String, f64>,
}

impl RateTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// `"BASE/QUOTE"` key for a currency pair.
    pub fn pair(base: &str, quote: &str) -> String {
        format!("{base}/{quote}")
    }

    pub fn insert(&mut self, pair: impl Into<String>, price: f64) {
        self.pairs.insert(pair.into(), price);
    }

    pub fn get(&self, pair: &str) -> Option<f64> {
        self.pairs.get(pair).copied()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl FromIterator<(String, f64)> for RateTable {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self {
            pairs: iter.into_iter().collect(),
        }
    }
}

// ── Wire schema ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct QuotePayload {
    list: ResourceList,
}

#[derive(Debug, Deserialize)]
struct ResourceList {
    // Kept as raw values so one malformed record is skipped instead of
    // failing the whole payload.
    #[serde(default)]
    resources: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct ResourceEntry {
    resource: ResourceBody,
}

#[derive(Debug, Deserialize)]
struct ResourceBody {
    fields: QuoteFields,
}

#[derive(Debug, Deserialize)]
struct QuoteFields {
    name: Option<String>,
    price: Option<PriceField>,
}

/// Prices arrive as numbers or numeric strings depending on the source.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PriceField {
    Number(f64),
    Text(String),
}

impl PriceField {
    fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// Flatten a quote payload into a rate table, skipping malformed records.
pub fn parse_quote_payload(raw: &Value) -> Result<RateTable, FetchError> {
    let payload: QuotePayload = serde_json::from_value(raw.clone())
        .map_err(|e| FetchError::Parse(format!("quote envelope: {e}")))?;

    let mut table = RateTable::new();
    for record in payload.list.resources {
        let entry: ResourceEntry = match serde_json::from_value(record) {
            Ok(entry) => entry,
            Err(e) => {
                debug!(error = %e, "skipping malformed quote record");
                continue;
            }
        };

        let fields = entry.resource.fields;
        let (Some(name), Some(price)) = (fields.name, fields.price.and_then(|p| p.as_f64()))
        else {
            debug!("skipping quote record without name/price");
            continue;
        };

        if !price.is_finite() || price <= 0.0 {
            debug!(pair = %name, price, "skipping quote record with non-positive price");
            continue;
        }

        table.insert(name, price);
    }

    Ok(table)
}

/// Parse raw JSON text (snapshot file contents) into a rate table.
pub fn parse_quote_json(raw: &str) -> Result<RateTable, FetchError> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| FetchError::Parse(format!("quote payload is not JSON: {e}")))?;
    parse_quote_payload(&value)
}
