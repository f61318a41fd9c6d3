//! Per-item dispatch split.
//!
//! For each incoming item the dispatcher resolves the stage's configured
//! value field and pass flag into a [`SplitPair`]. The split is total: a
//! field that cannot be resolved (after defaults) degrades to pass-through
//! instead of failing the item. Output order always matches input order.

use crate::domain::{FieldSpec, Item};
use serde_json::Value;
use tracing::debug;

/// The resolved per-item value plus the "forward as-is" flag.
///
/// Computed once per item, never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitPair {
    pub value: Value,
    pub pass_through: bool,
}

/// What the dispatcher resolves per item: the value field, the pass flag,
/// and whether scalars are coerced to 1-element sequences.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitSpec {
    pub value: FieldSpec,
    pub pass: FieldSpec,
    pub listize: bool,
}

impl SplitSpec {
    /// Spec with the conventional defaults: pass flag false, no listize.
    pub fn new(value: FieldSpec) -> Self {
        Self {
            value,
            pass: FieldSpec::Literal(Value::Bool(false)),
            listize: false,
        }
    }

    pub fn with_pass(mut self, pass: FieldSpec) -> Self {
        self.pass = pass;
        self
    }

    pub fn with_listize(mut self, listize: bool) -> Self {
        self.listize = listize;
        self
    }
}

/// Split a single item. Total — never fails.
pub fn split_item(item: &Item, spec: &SplitSpec) -> SplitPair {
    let value = match spec.value.resolve(item) {
        Ok(value) => value,
        Err(e) => {
            debug!(error = %e, "value field unresolved, degrading to pass-through");
            return SplitPair {
                value: Value::Null,
                pass_through: true,
            };
        }
    };

    let pass_through = spec
        .pass
        .resolve(item)
        .ok()
        .and_then(|v| value_as_bool(&v))
        .unwrap_or(false);

    let value = if spec.listize && !value.is_array() {
        Value::Array(vec![value])
    } else {
        value
    };

    SplitPair { value, pass_through }
}

/// Split a whole stream, pairing each item with its split. Lazy and
/// order-preserving.
pub fn split_stream<'a, I>(
    items: I,
    spec: &'a SplitSpec,
) -> impl Iterator<Item = (Item, SplitPair)> + 'a
where
    I: IntoIterator<Item = Item>,
    I::IntoIter: 'a,
{
    items.into_iter().map(move |item| {
        let pair = split_item(&item, spec);
        (item, pair)
    })
}

fn value_as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0),
        Value::String(s) => match s.trim() {
            "1" | "true" | "True" => Some(true),
            "0" | "false" | "False" | "" => Some(false),
            _ => None,
        },
        _ => None,
    }
}
