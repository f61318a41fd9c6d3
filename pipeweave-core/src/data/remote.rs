//! Remote quote source — HTTP GET against the exchange-rate service.
//!
//! One request, no retries: a failure here is handled by the snapshot
//! fallback layer, not by hammering the remote again. The endpoint is
//! queried with `format=json` and returns the nested resource-list payload
//! parsed by [`crate::data::quote`].

use super::quote::{parse_quote_payload, RateTable};
use super::source::{FetchError, QuoteSource};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// Default exchange-rate endpoint.
pub const RATE_ENDPOINT: &str =
    "https://finance.yahoo.com/webservice/v1/symbols/allcurrencies/quote";

const USER_AGENT: &str = concat!("pipeweave/", env!("CARGO_PKG_VERSION"));

/// Remote quote source over HTTP.
pub struct RemoteQuoteSource {
    endpoint: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl RemoteQuoteSource {
    pub fn new() -> Self {
        Self::with_endpoint(RATE_ENDPOINT)
    }

    /// Point at a non-default endpoint (tests, mirrors).
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        let timeout = Duration::from_secs(30);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .expect("failed to build HTTP client");

        Self {
            endpoint: endpoint.into(),
            timeout,
            client,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request_error(&self, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout(e.to_string())
        } else {
            FetchError::Network(e.to_string())
        }
    }

    fn status_error(&self, status: reqwest::StatusCode) -> FetchError {
        FetchError::Status {
            status: status.as_u16(),
            url: self.endpoint.clone(),
        }
    }
}

impl Default for RemoteQuoteSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QuoteSource for RemoteQuoteSource {
    fn name(&self) -> &str {
        "remote_quotes"
    }

    fn fetch_blocking(&self) -> Result<RateTable, FetchError> {
        // The blocking client cannot live alongside the async one inside a
        // runtime, so it is built per call on the synchronous path.
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let resp = client
            .get(&self.endpoint)
            .query(&[("format", "json")])
            .send()
            .map_err(|e| self.request_error(e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(self.status_error(status));
        }

        let raw: Value = resp
            .json()
            .map_err(|e| FetchError::Parse(e.to_string()))?;
        parse_quote_payload(&raw)
    }

    async fn fetch(&self) -> Result<RateTable, FetchError> {
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[("format", "json")])
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(self.status_error(status));
        }

        let raw: Value = resp
            .json()
            .await
            .map_err(|e| FetchError::Parse(e.to_string()))?;
        parse_quote_payload(&raw)
    }
}
