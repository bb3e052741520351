//! Quote provider abstraction and the Yahoo Finance implementation.
//!
//! Yahoo's `v7/finance/quote` endpoint only answers requests that carry a
//! crumb issued to the same cookie session, so the client performs a one-off
//! handshake:
//!   1. GET the cookie URL (any status) to obtain the session cookie
//!   2. GET the crumb URL for the token
//!   3. pass `crumb=` on every quote request
//!
//! The crumb is cached once obtained. A 401 on a quote request drops it so
//! the next batch repeats the handshake.

pub mod enricher;
#[cfg(test)]
pub(crate) mod testing;

use crate::config::QuoteConfig;
use crate::models::QuoteRecord;
use crate::scraper::http_client::HttpClient;
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use url::Url;

pub use self::enricher::QuoteEnricher;

/// Fields requested from the provider for every symbol.
pub const QUOTE_FIELDS: [&str; 4] = [
    "symbol",
    "regularMarketPrice",
    "dividendYield",
    "trailingAnnualDividendYield",
];

// ── Provider trait ────────────────────────────────────────────────────────────

/// Batched quote lookup. Symbols are already in provider syntax.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    async fn quote(&self, symbols: &[String], fields: &[&str]) -> Result<Vec<QuoteRecord>>;
}

// ── Yahoo wire format ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteEnvelope {
    quote_response: QuoteResponse,
}

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    result: Option<Vec<YahooQuote>>,
    error: Option<Value>,
}

/// Values are kept loose: anything that is not a JSON number counts as absent.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooQuote {
    symbol: Option<String>,
    regular_market_price: Option<Value>,
    dividend_yield: Option<Value>,
    trailing_annual_dividend_yield: Option<Value>,
}

fn numeric(v: Option<&Value>) -> Option<f64> {
    v.and_then(Value::as_f64)
}

impl YahooQuote {
    fn into_record(self) -> Option<QuoteRecord> {
        Some(QuoteRecord {
            regular_market_price: numeric(self.regular_market_price.as_ref()),
            dividend_yield: numeric(self.dividend_yield.as_ref()),
            trailing_annual_dividend_yield: numeric(self.trailing_annual_dividend_yield.as_ref()),
            symbol: self.symbol?,
        })
    }
}

/// Decode a `v7/finance/quote` body into records, dropping entries without a symbol.
pub fn parse_quote_response(body: &str) -> Result<Vec<QuoteRecord>> {
    let envelope: QuoteEnvelope =
        serde_json::from_str(body).context("Malformed quote response")?;

    if let Some(err) = envelope.quote_response.error.filter(|e| !e.is_null()) {
        bail!("Quote provider error: {}", err);
    }

    Ok(envelope
        .quote_response
        .result
        .unwrap_or_default()
        .into_iter()
        .filter_map(YahooQuote::into_record)
        .collect())
}

// ── Yahoo client ──────────────────────────────────────────────────────────────

pub struct YahooQuoteClient {
    client: HttpClient,
    config: QuoteConfig,
    crumb: Mutex<Option<String>>,
}

impl YahooQuoteClient {
    pub fn new(client: HttpClient, config: QuoteConfig) -> Self {
        Self {
            client,
            config,
            crumb: Mutex::new(None),
        }
    }

    async fn crumb(&self) -> Result<String> {
        let mut cached = self.crumb.lock().await;
        if let Some(crumb) = cached.as_ref() {
            return Ok(crumb.clone());
        }

        self.client.touch(&self.config.cookie_url).await?;
        let crumb = self.client.get_text(&self.config.crumb_url).await?;
        let crumb = crumb.trim().to_string();
        if crumb.is_empty() || crumb.contains('<') {
            bail!("Unusable crumb from {}", self.config.crumb_url);
        }

        debug!("Obtained Yahoo crumb");
        *cached = Some(crumb.clone());
        Ok(crumb)
    }

    fn quote_url(&self, symbols: &[String], fields: &[&str], crumb: &str) -> Result<Url> {
        let endpoint = format!("{}/v7/finance/quote", self.config.base_url.trim_end_matches('/'));
        Url::parse_with_params(
            &endpoint,
            &[
                ("symbols", symbols.join(",")),
                ("fields", fields.join(",")),
                ("crumb", crumb.to_string()),
            ],
        )
        .with_context(|| format!("Invalid quote endpoint {}", endpoint))
    }
}

#[async_trait]
impl QuoteProvider for YahooQuoteClient {
    async fn quote(&self, symbols: &[String], fields: &[&str]) -> Result<Vec<QuoteRecord>> {
        let crumb = self.crumb().await.context("Yahoo crumb handshake failed")?;
        let url = self.quote_url(symbols, fields, &crumb)?;

        let body = match self.client.get_text(url.as_str()).await {
            Ok(body) => body,
            Err(e) => {
                if e.status() == Some(401) {
                    warn!("Yahoo rejected the crumb, renewing before the next batch");
                    *self.crumb.lock().await = None;
                }
                return Err(e.into());
            }
        };
        let records = parse_quote_response(&body)?;
        debug!("Quote batch: {} requested, {} returned", symbols.len(), records.len());
        Ok(records)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
