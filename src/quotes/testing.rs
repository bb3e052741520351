//! In-memory quote provider for tests.

use super::QuoteProvider;
use crate::models::QuoteRecord;
use anyhow::{Result, bail};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// Answers from a fixed table keyed by provider symbol. Symbols without an
/// entry are silently dropped, like Yahoo does for unknown tickers.
#[derive(Default)]
pub struct StubProvider {
    quotes: HashMap<String, QuoteRecord>,
    fail_on: Option<String>,
    /// Returned with every successful batch regardless of the request.
    pub extra: Vec<QuoteRecord>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl StubProvider {
    pub fn with_quote(
        mut self,
        symbol: &str,
        price: Option<f64>,
        dividend_yield: Option<f64>,
        trailing_yield: Option<f64>,
    ) -> Self {
        self.quotes.insert(
            symbol.to_string(),
            QuoteRecord {
                symbol: symbol.to_string(),
                regular_market_price: price,
                dividend_yield,
                trailing_annual_dividend_yield: trailing_yield,
            },
        );
        self
    }

    /// Fail any batch that contains `symbol`.
    pub fn failing_on(mut self, symbol: &str) -> Self {
        self.fail_on = Some(symbol.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl QuoteProvider for StubProvider {
    async fn quote(&self, symbols: &[String], _fields: &[&str]) -> Result<Vec<QuoteRecord>> {
        self.calls.lock().unwrap().push(symbols.to_vec());

        if let Some(bad) = &self.fail_on {
            if symbols.contains(bad) {
                bail!("provider unavailable");
            }
        }

        Ok(symbols
            .iter()
            .filter_map(|s| self.quotes.get(s).cloned())
            .chain(self.extra.iter().cloned())
            .collect())
    }
}
