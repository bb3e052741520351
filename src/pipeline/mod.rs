//! Pipeline orchestrator: ties scraper → quotes → CSV together.
//!
//! ## Steps
//!
//!   1. Fetch both index pages concurrently and extract their constituent
//!      tables. Either one failing aborts the run.
//!   2. Enrich every scraped symbol with price and dividend yield. Quote
//!      failures only blank out the affected batch.
//!   3. Join rows with quotes and write the CSV.
//!
//! Symbols listed in both indices are kept twice, once per source row.

use crate::config::{AppConfig, IndexSource};
use crate::models::{Constituent, RawRow};
use crate::quotes::{QuoteEnricher, QuoteProvider, YahooQuoteClient};
use crate::scraper::cleaner::row_to_constituent;
use crate::scraper::http_client::HttpClient;
use crate::scraper::{IndexPageSource, WikiTableScraper};
use crate::storage::write_constituents;
use anyhow::{Context, Result};
use std::path::Path;
use std::time::Duration;
use tracing::info;

// ── Builder ───────────────────────────────────────────────────────────────────

/// Scrapes both indices and joins them with quotes.
pub struct ConstituentBuilder<S, P> {
    source: S,
    enricher: QuoteEnricher<P>,
    indices: [IndexSource; 2],
}

impl<S: IndexPageSource, P: QuoteProvider> ConstituentBuilder<S, P> {
    pub fn new(source: S, enricher: QuoteEnricher<P>, indices: [IndexSource; 2]) -> Self {
        Self { source, enricher, indices }
    }

    pub async fn build(&self) -> Result<Vec<Constituent>> {
        let [first, second] = &self.indices;

        info!("=== Step 1: Fetching {} and {} ===", first.name, second.name);
        let (mut rows, second_rows) = tokio::try_join!(
            self.fetch(first),
            self.fetch(second),
        )?;
        rows.extend(second_rows);

        info!("=== Step 2: Fetching quotes ({} rows) ===", rows.len());
        let symbols: Vec<String> = rows.iter().map(|r| r.symbol.clone()).collect();
        let quotes = self.enricher.enrich(&symbols).await;

        Ok(rows.iter().map(|row| row_to_constituent(row, &quotes)).collect())
    }

    async fn fetch(&self, index: &IndexSource) -> Result<Vec<RawRow>> {
        self.source
            .fetch_constituent_rows(&index.url)
            .await
            .with_context(|| format!("{} constituents unavailable", index.name))
    }
}

// ── Pipeline ──────────────────────────────────────────────────────────────────

pub struct Pipeline {
    config: AppConfig,
}

impl Pipeline {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub async fn run(&self, output: &Path) -> Result<ExportStats> {
        let client = HttpClient::new(&self.config.scraper)?;
        let quotes = &self.config.quotes;

        let builder = ConstituentBuilder::new(
            WikiTableScraper::new(client.clone()),
            QuoteEnricher::new(
                YahooQuoteClient::new(client, quotes.clone()),
                quotes.batch_size,
                Duration::from_millis(quotes.batch_delay_ms),
            ),
            [self.config.indices.sp500.clone(), self.config.indices.midcap.clone()],
        );

        export(&builder, output).await
    }
}

/// Build the constituent list and write it to `output`.
pub async fn export<S, P>(builder: &ConstituentBuilder<S, P>, output: &Path) -> Result<ExportStats>
where
    S: IndexPageSource,
    P: QuoteProvider,
{
    let constituents = builder.build().await?;

    info!("=== Step 3: Writing {} rows ===", constituents.len());
    let rows_written = write_constituents(&constituents, output)?;

    let stats = ExportStats {
        rows_written,
        priced: constituents.iter().filter(|c| c.price.is_some()).count(),
        with_yield: constituents.iter().filter(|c| c.dividend_yield.is_some()).count(),
    };

    info!(
        "=== Done: {} rows | {} priced | {} with dividend yield ===",
        stats.rows_written, stats.priced, stats.with_yield,
    );

    Ok(stats)
}

#[derive(Debug, PartialEq)]
pub struct ExportStats {
    pub rows_written: usize,
    pub priced: usize,
    pub with_yield: usize,
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExportError;
    use crate::quotes::testing::StubProvider;
    use crate::scraper::parsers::extract_constituent_table;
    use async_trait::async_trait;
    use std::collections::HashMap;

    const SP500_URL: &str = "https://wiki.test/sp500";
    const MIDCAP_URL: &str = "https://wiki.test/midcap";

    /// Serves fixture HTML per URL; unknown URLs fail like a 404.
    struct FixturePages {
        pages: HashMap<&'static str, String>,
    }

    #[async_trait]
    impl IndexPageSource for FixturePages {
        async fn fetch_constituent_rows(&self, url: &str) -> Result<Vec<RawRow>> {
            let html = self.pages.get(url).ok_or_else(|| ExportError::Fetch {
                url: url.to_string(),
                reason: "HTTP 404 Not Found".to_string(),
                status: Some(404),
            })?;
            Ok(extract_constituent_table(html)?)
        }
    }

    fn page(header: &str, rows: &[(&str, &str, &str)]) -> String {
        let body: String = rows
            .iter()
            .map(|(s, n, sec)| format!("<tr><td>{s}</td><td>{n}</td><td>{sec}</td></tr>"))
            .collect();
        format!(
            "<html><body><table><tr><th>Symbol</th><th>{header}</th><th>Sector</th></tr>{body}</table></body></html>"
        )
    }

    fn indices() -> [IndexSource; 2] {
        [
            IndexSource { name: "S&P 500".into(), url: SP500_URL.into() },
            IndexSource { name: "S&P MidCap 400".into(), url: MIDCAP_URL.into() },
        ]
    }

    fn fixtures() -> FixturePages {
        let mut pages = HashMap::new();
        pages.insert(
            SP500_URL,
            page("Security", &[("AAA", "Aaa Corp", "Energy"), ("BBB", "Bbb Inc", "Utilities")]),
        );
        pages.insert(
            MIDCAP_URL,
            page("Company", &[("CCC", "Ccc Ltd", "Materials"), ("DDD", "Ddd plc", "Financials")]),
        );
        FixturePages { pages }
    }

    fn builder(
        source: FixturePages,
        provider: StubProvider,
        batch_size: usize,
    ) -> ConstituentBuilder<FixturePages, StubProvider> {
        ConstituentBuilder::new(
            source,
            QuoteEnricher::new(provider, batch_size, Duration::ZERO),
            indices(),
        )
    }

    fn priced_provider() -> StubProvider {
        StubProvider::default()
            .with_quote("AAA", Some(12.5), Some(0.015), Some(0.02))
            .with_quote("CCC", Some(40.0), None, Some(0.03))
    }

    #[tokio::test]
    async fn test_end_to_end_with_dropped_quotes() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("index_constituents.csv");

        let b = builder(fixtures(), priced_provider(), 50);
        let stats = export(&b, &out).await.unwrap();

        assert_eq!(stats, ExportStats { rows_written: 4, priced: 2, with_yield: 2 });

        let csv = std::fs::read_to_string(&out).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Symbol,Name,Sector,Price,Dividend Yield",
                "AAA,Aaa Corp,Energy,12.5,1.5",
                "BBB,Bbb Inc,Utilities,,",
                "CCC,Ccc Ltd,Materials,40.0,3.0",
                "DDD,Ddd plc,Financials,,",
            ]
        );
    }

    #[tokio::test]
    async fn test_end_to_end_with_failing_batch() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.csv");

        // batches: [AAA, BBB] fails, [CCC, DDD] succeeds
        let b = builder(fixtures(), priced_provider().failing_on("BBB"), 2);
        let stats = export(&b, &out).await.unwrap();
        assert_eq!(stats.rows_written, 4);

        let mut rdr = csv::Reader::from_path(&out).unwrap();
        let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
        let symbols: Vec<&str> = rows.iter().map(|r| &r[0]).collect();
        assert_eq!(symbols, ["AAA", "BBB", "CCC", "DDD"]);
        assert_eq!(&rows[0][3], "");
        assert_eq!(&rows[1][3], "");
        assert_eq!(&rows[2][3], "40.0");
        assert_eq!(&rows[3][4], "");
    }

    #[tokio::test]
    async fn test_single_enrich_call_with_all_symbols() {
        let b = builder(fixtures(), StubProvider::default(), 50);
        let constituents = b.build().await.unwrap();

        assert_eq!(constituents.len(), 4);
        assert_eq!(constituents[0].name, "Aaa Corp");
        assert_eq!(constituents[2].name, "Ccc Ltd");
        assert_eq!(constituents[3].sector, "Financials");
        assert_eq!(
            b.enricher_provider().calls(),
            vec![vec!["AAA".to_string(), "BBB".into(), "CCC".into(), "DDD".into()]]
        );
    }

    #[tokio::test]
    async fn test_duplicates_across_indices_are_kept() {
        let mut source = fixtures();
        source.pages.insert(
            MIDCAP_URL,
            page("Name", &[("AAA", "Aaa Corp", "Energy")]),
        );
        let b = builder(source, priced_provider(), 50);

        let constituents = b.build().await.unwrap();

        assert_eq!(constituents.len(), 3);
        assert_eq!(constituents[0].symbol, "AAA");
        assert_eq!(constituents[2].symbol, "AAA");
        assert_eq!(constituents[2].price, Some(12.5));
    }

    #[tokio::test]
    async fn test_fetch_failure_aborts_without_output() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.csv");

        let mut source = fixtures();
        source.pages.remove(MIDCAP_URL);
        let b = builder(source, priced_provider(), 50);

        let err = export(&b, &out).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ExportError>(),
            Some(ExportError::Fetch { .. })
        ));
        assert!(format!("{err:#}").contains("S&P MidCap 400"));
        assert!(!out.exists());
        assert_eq!(b.enricher_provider().call_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_table_aborts() {
        let mut source = fixtures();
        source
            .pages
            .insert(SP500_URL, "<table><tr><th>Ticker</th></tr></table>".to_string());
        let b = builder(source, priced_provider(), 50);

        let err = b.build().await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ExportError>(),
            Some(ExportError::NoTableFound)
        ));
    }

    impl<S, P> ConstituentBuilder<S, P> {
        fn enricher_provider(&self) -> &P {
            self.enricher.provider()
        }
    }
}
