//! Dual-mode stage executor.
//!
//! Orchestration per invocation: fetch reference data (the suspendable
//! strategy's only suspension point) → dispatch split → map transform →
//! output stream. A reference-fetch failure aborts the invocation before a
//! single item is emitted. Dispatch and transform are fused per item and run
//! without suspension; the phase distinction survives in the stream's
//! observable [`Phase`].
//!
//! Both strategies funnel into the same [`drive`] core, so for identical
//! input and identical reference data their output streams are identical,
//! item for item.

use super::dispatch::split_item;
use super::{BlockingStage, StageError, SuspendableStage};
use crate::domain::Item;
use tracing::{debug, warn};

/// Executor state, advanced as the output stream is consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    FetchingReference,
    Dispatching,
    Transforming,
    Done,
    Failed,
}

/// Lazy, single-pass stream of transformed outputs.
///
/// Consuming it drives dispatch and transform; it cannot be restarted, and
/// iteration ends permanently after `Done` or `Failed`.
pub struct OutputStream<'a, T> {
    inner: Box<dyn Iterator<Item = Result<T, StageError>> + 'a>,
    phase: Phase,
}

impl<'a, T> OutputStream<'a, T> {
    fn new(inner: impl Iterator<Item = Result<T, StageError>> + 'a) -> Self {
        Self {
            inner: Box::new(inner),
            phase: Phase::Dispatching,
        }
    }

    /// Where the invocation currently stands.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Drain the stream, failing on the first transform error.
    pub fn collect_ok(self) -> Result<Vec<T>, StageError> {
        self.collect()
    }
}

impl<'a, T> Iterator for OutputStream<'a, T> {
    type Item = Result<T, StageError>;

    fn next(&mut self) -> Option<Self::Item> {
        if matches!(self.phase, Phase::Done | Phase::Failed) {
            return None;
        }
        match self.inner.next() {
            Some(Ok(out)) => {
                self.phase = Phase::Transforming;
                Some(Ok(out))
            }
            Some(Err(e)) => {
                self.phase = Phase::Failed;
                Some(Err(e))
            }
            None => {
                self.phase = Phase::Done;
                None
            }
        }
    }
}

/// Run a stage under the blocking strategy.
///
/// Every wait, including the reference fetch, happens on the caller's
/// thread. Must not be invoked from an async runtime worker.
pub fn run_blocking<'a, S, I>(stage: &'a S, input: I) -> Result<OutputStream<'a, S::Out>, StageError>
where
    S: BlockingStage,
    I: IntoIterator<Item = Item>,
    I::IntoIter: 'a,
    S::Reference: 'a,
{
    debug!(stage = stage.name(), "fetching reference data");
    let reference = stage.fetch_reference().map_err(|e| {
        warn!(stage = stage.name(), error = %e, "reference fetch failed, aborting invocation");
        e
    })?;
    Ok(drive(stage, reference, input))
}

/// Run a stage under the suspendable strategy.
///
/// The reference fetch is the only await; once it resolves, the returned
/// stream is consumed synchronously exactly like the blocking one.
pub async fn run_suspendable<'a, S, I>(
    stage: &'a S,
    input: I,
) -> Result<OutputStream<'a, S::Out>, StageError>
where
    S: SuspendableStage,
    I: IntoIterator<Item = Item>,
    I::IntoIter: 'a,
    S::Reference: 'a,
{
    debug!(stage = stage.name(), "fetching reference data");
    let reference = stage.fetch_reference().await.map_err(|e| {
        warn!(stage = stage.name(), error = %e, "reference fetch failed, aborting invocation");
        e
    })?;
    Ok(drive(stage, reference, input))
}

/// The shared dispatch + transform core. Strategy-agnostic by construction:
/// everything after the reference fetch lives here.
fn drive<'a, S, I>(stage: &'a S, reference: S::Reference, input: I) -> OutputStream<'a, S::Out>
where
    S: super::StageKernel,
    I: IntoIterator<Item = Item>,
    I::IntoIter: 'a,
    S::Reference: 'a,
{
    let spec = stage.dispatch_spec();
    let iter = input.into_iter().map(move |item| {
        let pair = split_item(&item, &spec);
        stage.transform(&item, pair, &reference)
    });
    OutputStream::new(iter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FieldSpec;
    use crate::engine::{SplitPair, SplitSpec, StageKernel};
    use async_trait::async_trait;
    use serde_json::Value;

    /// Doubles the resolved number; reference data is a fixed offset.
    struct OffsetDouble {
        offset: f64,
        fail_fetch: bool,
    }

    impl StageKernel for OffsetDouble {
        type Reference = f64;
        type Out = Value;

        fn name(&self) -> &str {
            "offset_double"
        }

        fn dispatch_spec(&self) -> SplitSpec {
            SplitSpec::new(FieldSpec::derived("n"))
        }

        fn transform(
            &self,
            _item: &Item,
            pair: SplitPair,
            reference: &f64,
        ) -> Result<Value, StageError> {
            if pair.pass_through {
                return Ok(pair.value);
            }
            let n = pair.value.as_f64().unwrap_or(0.0);
            Ok(Value::from(n * 2.0 + reference))
        }
    }

    impl BlockingStage for OffsetDouble {
        fn fetch_reference(&self) -> Result<f64, StageError> {
            if self.fail_fetch {
                return Err(StageError::Fetch(crate::data::FetchError::Network(
                    "down".into(),
                )));
            }
            Ok(self.offset)
        }
    }

    #[async_trait]
    impl SuspendableStage for OffsetDouble {
        async fn fetch_reference(&self) -> Result<f64, StageError> {
            BlockingStage::fetch_reference(self)
        }
    }

    fn numbered_items(n: usize) -> Vec<Item> {
        (0..n).map(|i| Item::new().with("n", i as f64)).collect()
    }

    #[test]
    fn output_order_matches_input_order() {
        let stage = OffsetDouble {
            offset: 1.0,
            fail_fetch: false,
        };
        let out = run_blocking(&stage, numbered_items(3))
            .unwrap()
            .collect_ok()
            .unwrap();
        assert_eq!(out, vec![Value::from(1.0), Value::from(3.0), Value::from(5.0)]);
    }

    #[test]
    fn fetch_failure_aborts_before_emitting() {
        let stage = OffsetDouble {
            offset: 0.0,
            fail_fetch: true,
        };
        assert!(matches!(
            run_blocking(&stage, numbered_items(3)),
            Err(StageError::Fetch(_))
        ));
    }

    #[test]
    fn phase_advances_while_consuming() {
        let stage = OffsetDouble {
            offset: 0.0,
            fail_fetch: false,
        };
        let mut out = run_blocking(&stage, numbered_items(2)).unwrap();
        assert_eq!(out.phase(), Phase::Dispatching);

        assert!(out.next().is_some());
        assert_eq!(out.phase(), Phase::Transforming);

        assert!(out.next().is_some());
        assert!(out.next().is_none());
        assert_eq!(out.phase(), Phase::Done);

        // Single-pass: exhausted for good.
        assert!(out.next().is_none());
    }

    #[test]
    fn missing_field_items_pass_through() {
        let stage = OffsetDouble {
            offset: 5.0,
            fail_fetch: false,
        };
        let items = vec![Item::new().with("other", "x")];
        let out = run_blocking(&stage, items).unwrap().collect_ok().unwrap();
        assert_eq!(out, vec![Value::Null]);
    }

    #[tokio::test]
    async fn suspendable_matches_blocking_output() {
        let stage = OffsetDouble {
            offset: 2.5,
            fail_fetch: false,
        };

        let blocking = run_blocking(&stage, numbered_items(4))
            .unwrap()
            .collect_ok()
            .unwrap();
        let suspendable = run_suspendable(&stage, numbered_items(4))
            .await
            .unwrap()
            .collect_ok()
            .unwrap();

        assert_eq!(blocking, suspendable);
    }
}
