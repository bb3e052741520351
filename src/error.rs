use std::path::PathBuf;
use thiserror::Error;

/// Failures the exporter distinguishes between.
///
/// Everything except `QuoteBatch` is fatal for a run. `QuoteBatch` is only
/// ever logged by the enricher and degrades the batch to empty quotes.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to fetch {url}: {reason}")]
    Fetch {
        url: String,
        reason: String,
        status: Option<u16>,
    },

    #[error("no table with a Symbol column found")]
    NoTableFound,

    #[error("quote batch starting at {first} ({size} symbols) failed: {reason}")]
    QuoteBatch {
        first: String,
        size: usize,
        reason: String,
    },

    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("invalid CSS selector {0}")]
    Selector(String),
}

impl ExportError {
    /// HTTP status behind a `Fetch` error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ExportError::Fetch { status, .. } => *status,
            _ => None,
        }
    }
}
