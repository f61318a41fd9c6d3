//! Stage execution contract — dispatch split and the dual-mode executor.
//!
//! A stage is written once as a [`StageKernel`] (dispatch spec + per-item
//! transform) and gains its two execution strategies by implementing
//! [`BlockingStage`] and/or [`SuspendableStage`], which differ only in how
//! the reference data is fetched. The executor drives both through the same
//! dispatch/transform core, which is what makes their outputs identical.

pub mod dispatch;
pub mod executor;

pub use dispatch::{split_item, split_stream, SplitPair, SplitSpec};
pub use executor::{run_blocking, run_suspendable, OutputStream, Phase};

use crate::data::{FetchError, RateError};
use crate::domain::{Item, ResolveError};
use crate::services::ServiceError;
use async_trait::async_trait;
use thiserror::Error;

/// Errors a stage invocation can surface.
///
/// Transient external-source failures never reach here — they are absorbed
/// by the cache/fallback layers. What remains is an unrecoverable reference
/// fetch (fails the invocation before anything is emitted), a pivot lookup
/// miss (fails one item's transform), a collaborator failure, or missing
/// required config.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("reference data unavailable: {0}")]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Rate(#[from] RateError),

    #[error("collaborator failure: {0}")]
    Service(#[from] ServiceError),

    #[error("stage misconfigured: {0}")]
    Config(#[from] ResolveError),
}

/// The strategy-independent core of a stage: what to dispatch on and how to
/// transform each split pair given the reference data.
pub trait StageKernel: Send + Sync {
    /// Reference data fetched once per invocation (use `()` when the stage
    /// needs none).
    type Reference;

    /// What the stage emits per input item.
    type Out;

    /// Human-readable name (e.g. "exchange_rate").
    fn name(&self) -> &str;

    /// The dispatch split this stage wants applied to every item.
    fn dispatch_spec(&self) -> SplitSpec;

    /// Transform one item's split pair. Receives the original item so
    /// pass-through stages can forward it untouched.
    fn transform(
        &self,
        item: &Item,
        pair: SplitPair,
        reference: &Self::Reference,
    ) -> Result<Self::Out, StageError>;
}

/// Blocking strategy: the reference fetch runs on the caller's thread.
pub trait BlockingStage: StageKernel {
    fn fetch_reference(&self) -> Result<Self::Reference, StageError>;
}

/// Suspendable strategy: the reference fetch is the only point at which the
/// executing task may suspend.
#[async_trait]
pub trait SuspendableStage: StageKernel {
    async fn fetch_reference(&self) -> Result<Self::Reference, StageError>;
}
