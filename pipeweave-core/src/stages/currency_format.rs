//! Currency-format stage — renders a per-item number as a currency string.
//!
//! Formatting itself is delegated to the [`LocaleFormatter`] collaborator;
//! this stage only dispatches and forwards. It needs no reference data, so
//! neither strategy ever suspends — the executor contract degenerates
//! cleanly to a pure per-item map.
//!
//! Config: `currency` (code handed to the formatter, default USD), optional
//! `amount` (item-derived value spec) and `pass`.

use crate::data::PIVOT;
use crate::domain::{FieldSpec, Item, StageConfig};
use crate::engine::{BlockingStage, SplitPair, SplitSpec, StageError, StageKernel, SuspendableStage};
use crate::services::LocaleFormatter;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

pub struct CurrencyFormat {
    config: StageConfig,
    currency: String,
    formatter: Arc<dyn LocaleFormatter>,
}

impl CurrencyFormat {
    pub fn new(config: StageConfig, formatter: Arc<dyn LocaleFormatter>) -> Self {
        let currency = config
            .literal_str("currency")
            .unwrap_or_else(|| PIVOT.to_string());
        Self {
            config,
            currency,
            formatter,
        }
    }
}

impl StageKernel for CurrencyFormat {
    type Reference = ();
    type Out = Value;

    fn name(&self) -> &str {
        "currency_format"
    }

    fn dispatch_spec(&self) -> SplitSpec {
        let value = self
            .config
            .spec("amount")
            .cloned()
            .unwrap_or_else(|| FieldSpec::derived("amount"));
        let mut spec = SplitSpec::new(value);
        if let Some(pass) = self.config.spec("pass") {
            spec = spec.with_pass(pass.clone());
        }
        spec
    }

    fn transform(&self, _item: &Item, pair: SplitPair, _: &()) -> Result<Value, StageError> {
        if pair.pass_through {
            return Ok(pair.value);
        }
        let Some(amount) = value_as_f64(&pair.value) else {
            debug!(stage = self.name(), "non-numeric amount, forwarding value");
            return Ok(pair.value);
        };
        Ok(Value::String(self.formatter.format(amount, &self.currency)))
    }
}

impl BlockingStage for CurrencyFormat {
    fn fetch_reference(&self) -> Result<(), StageError> {
        Ok(())
    }
}

#[async_trait]
impl SuspendableStage for CurrencyFormat {
    async fn fetch_reference(&self) -> Result<(), StageError> {
        Ok(())
    }
}

fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
