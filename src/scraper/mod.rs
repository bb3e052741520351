pub mod cleaner;
pub mod http_client;
pub mod parsers;
#[cfg(test)]
pub(crate) mod testing;

use crate::models::RawRow;
use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, info};

use self::http_client::HttpClient;
use self::parsers::extract_constituent_table;

// ── Source trait ──────────────────────────────────────────────────────────────

/// Swappable source of index constituent rows.
#[async_trait]
pub trait IndexPageSource: Send + Sync {
    async fn fetch_constituent_rows(&self, url: &str) -> Result<Vec<RawRow>>;
}

// ── Wikipedia scraper ─────────────────────────────────────────────────────────

pub struct WikiTableScraper {
    client: HttpClient,
}

impl WikiTableScraper {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl IndexPageSource for WikiTableScraper {
    async fn fetch_constituent_rows(&self, url: &str) -> Result<Vec<RawRow>> {
        debug!("Fetching constituent page: {}", url);

        let html = self.client.get_text(url).await?;
        let rows = extract_constituent_table(&html)
            .with_context(|| format!("Failed to read constituents from {}", url))?;

        info!("{}: {} constituents", url, rows.len());
        Ok(rows)
    }
}
