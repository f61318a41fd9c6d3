//! Concrete stages built on the shared execution contract.
//!
//! Each stage implements [`StageKernel`](crate::engine::StageKernel) once
//! and both execution strategies on top of it:
//! - exchange rate: consults the memoized rate service, computes cross rates
//! - currency format: delegates rendering to the locale collaborator
//! - fetch site feed: delegates discovery/parsing to the feed collaborator

pub mod currency_format;
pub mod exchange_rate;
pub mod fetch_site_feed;

pub use currency_format::CurrencyFormat;
pub use exchange_rate::ExchangeRate;
pub use fetch_site_feed::FetchSiteFeed;
