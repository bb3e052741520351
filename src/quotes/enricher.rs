use crate::error::ExportError;
use crate::models::{Quote, QuoteTable};
use crate::scraper::cleaner::to_provider_symbol;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::{QUOTE_FIELDS, QuoteProvider};

/// Resolves price and dividend yield for symbols in sequential, bounded
/// batches. A failing batch degrades to empty quotes, it never fails the run.
pub struct QuoteEnricher<P> {
    provider: P,
    batch_size: usize,
    batch_delay: Duration,
}

impl<P: QuoteProvider> QuoteEnricher<P> {
    pub fn new(provider: P, batch_size: usize, batch_delay: Duration) -> Self {
        Self {
            provider,
            batch_size: batch_size.max(1),
            batch_delay,
        }
    }

    /// Every input symbol gets an entry in the result, even when the
    /// provider failed or silently dropped it.
    pub async fn enrich(&self, symbols: &[String]) -> QuoteTable {
        let mut quotes = QuoteTable::with_capacity(symbols.len());
        if symbols.is_empty() {
            return quotes;
        }

        let batches = symbols.len().div_ceil(self.batch_size);
        info!("Fetching quotes for {} symbols in {} batches", symbols.len(), batches);

        for (n, batch) in symbols.chunks(self.batch_size).enumerate() {
            if n > 0 && !self.batch_delay.is_zero() {
                sleep(self.batch_delay).await;
            }
            self.enrich_batch(batch, &mut quotes).await;
            debug!("Batch {}/{} done", n + 1, batches);
        }

        let priced = quotes.values().filter(|q| q.price.is_some()).count();
        info!("Quotes resolved: {} priced of {}", priced, quotes.len());
        quotes
    }

    async fn enrich_batch(&self, batch: &[String], quotes: &mut QuoteTable) {
        // Provider symbol -> original, built by position before the call
        let provider_symbols: Vec<String> = batch.iter().map(|s| to_provider_symbol(s)).collect();
        let lookup: HashMap<&str, &String> = provider_symbols
            .iter()
            .map(String::as_str)
            .zip(batch.iter())
            .collect();

        match self.provider.quote(&provider_symbols, &QUOTE_FIELDS).await {
            Ok(records) => {
                for record in &records {
                    match lookup.get(record.symbol.as_str()) {
                        Some(original) => {
                            quotes.insert((*original).clone(), Quote::from_record(record));
                        }
                        None => debug!("Ignoring unrequested quote {}", record.symbol),
                    }
                }
            }
            Err(e) => {
                let err = ExportError::QuoteBatch {
                    first: batch.first().cloned().unwrap_or_default(),
                    size: batch.len(),
                    reason: format!("{e:#}"),
                };
                warn!("{}", err);
            }
        }

        for symbol in batch {
            quotes.entry(symbol.clone()).or_default();
        }
    }
}

#[cfg(test)]
impl<P> QuoteEnricher<P> {
    pub fn provider(&self) -> &P {
        &self.provider
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
