//! Reference-data layer: quote parsing, fetch sources, fallback, caching.

pub mod cache;
pub mod clock;
pub mod fallback;
pub mod quote;
pub mod rates;
pub mod remote;
pub mod service;
pub mod snapshot;
pub mod source;

pub use cache::{DataCache, HALF_DAY};
pub use clock::{Clock, ManualClock, SystemClock};
pub use fallback::{FallbackFetcher, RateOrigin, TableFetch};
pub use quote::{parse_quote_json, parse_quote_payload, RateTable};
pub use rates::{cross_rate, RateError, PIVOT};
pub use remote::{RemoteQuoteSource, RATE_ENDPOINT};
pub use service::{RateService, OFFLINE_RATES_KEY, REMOTE_RATES_KEY};
pub use snapshot::{SnapshotSource, BUNDLED_QUOTES};
pub use source::{FetchError, QuoteSource};
