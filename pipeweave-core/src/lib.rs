//! Pipeweave Core — stage engine for a dataflow-style feed processor.
//!
//! This crate contains the shared execution contract every pipeline stage
//! satisfies:
//! - Items and literal/item-derived stage configuration
//! - Per-item dispatch split (value vs pass-through)
//! - Dual-mode executor: blocking and suspendable strategies with
//!   byte-identical output streams
//! - Memoized reference-data fetch: TTL cache, serve-stale-on-error,
//!   remote-with-snapshot fallback
//! - USD-pivot cross-rate resolution
//! - The exchange-rate, currency-format, and fetch-site-feed stages

pub mod data;
pub mod domain;
pub mod engine;
pub mod services;
pub mod stages;
