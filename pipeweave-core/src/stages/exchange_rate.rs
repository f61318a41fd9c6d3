//! Exchange-rate stage — resolves a per-item base currency to its rate
//! against the configured quote currency.
//!
//! Config: `quote` (target currency, default USD), `default` (base currency
//! when the item carries none), `offline` (serve the bundled snapshot
//! without touching the remote), optional `base` (item-derived value spec)
//! and `pass`.

use crate::data::{cross_rate, RateService, RateTable, PIVOT};
use crate::domain::{FieldSpec, Item, StageConfig};
use crate::engine::{BlockingStage, SplitPair, SplitSpec, StageError, StageKernel, SuspendableStage};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

pub struct ExchangeRate {
    config: StageConfig,
    quote: String,
    offline: bool,
    rates: Arc<RateService>,
}

impl ExchangeRate {
    pub fn new(config: StageConfig, rates: Arc<RateService>) -> Self {
        let quote = config
            .literal_str("quote")
            .unwrap_or_else(|| PIVOT.to_string());
        let offline = config.literal_bool("offline");
        Self {
            config,
            quote,
            offline,
            rates,
        }
    }
}

impl StageKernel for ExchangeRate {
    type Reference = RateTable;
    type Out = Value;

    fn name(&self) -> &str {
        "exchange_rate"
    }

    fn dispatch_spec(&self) -> SplitSpec {
        let value = self.config.spec("base").cloned().unwrap_or_else(|| {
            FieldSpec::Derived {
                path: "currency".into(),
                default: self.config.literal("default"),
            }
        });
        let mut spec = SplitSpec::new(value);
        if let Some(pass) = self.config.spec("pass") {
            spec = spec.with_pass(pass.clone());
        }
        spec
    }

    fn transform(
        &self,
        _item: &Item,
        pair: SplitPair,
        table: &RateTable,
    ) -> Result<Value, StageError> {
        if pair.pass_through {
            return Ok(pair.value);
        }
        let Some(base) = pair.value.as_str() else {
            debug!(stage = self.name(), "non-string base currency, forwarding value");
            return Ok(pair.value);
        };
        let rate = cross_rate(base, &self.quote, table)?;
        Ok(Value::from(rate))
    }
}

impl BlockingStage for ExchangeRate {
    fn fetch_reference(&self) -> Result<RateTable, StageError> {
        Ok(self.rates.table_blocking(self.offline)?)
    }
}

#[async_trait]
impl SuspendableStage for ExchangeRate {
    async fn fetch_reference(&self) -> Result<RateTable, StageError> {
        Ok(self.rates.table(self.offline).await?)
    }
}
