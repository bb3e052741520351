use std::collections::HashMap;

// ── Constituent ───────────────────────────────────────────────────────────────

/// One output row: an index member with its market data.
#[derive(Debug, Clone, PartialEq)]
pub struct Constituent {
    pub symbol: String,        // display form, e.g. "BRK.B"
    pub name: String,
    pub sector: String,
    pub price: Option<f64>,
    pub dividend_yield: Option<f64>, // percent, 1.5 == 1.5%
}

// ── Quotes ────────────────────────────────────────────────────────────────────

/// Price and yield resolved for one symbol. Missing data stays `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Quote {
    pub price: Option<f64>,
    pub dividend_yield: Option<f64>,
}

impl Quote {
    /// Resolve a provider record. `dividendYield` wins over the trailing
    /// annual yield; the fraction is scaled to a percentage.
    pub fn from_record(record: &QuoteRecord) -> Self {
        Self {
            price: record.regular_market_price,
            dividend_yield: record
                .dividend_yield
                .or(record.trailing_annual_dividend_yield)
                .map(|y| y * 100.0),
        }
    }
}

/// Quote lookup keyed by the original (display form) symbol.
pub type QuoteTable = HashMap<String, Quote>;

/// A single answer from the quote provider, in provider symbol syntax.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuoteRecord {
    pub symbol: String,
    pub regular_market_price: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub trailing_annual_dividend_yield: Option<f64>,
}

// ── Raw scraped rows ──────────────────────────────────────────────────────────

/// A row from an index table: header -> cell text. Header names depend on
/// the source page ("Security" vs "Company" vs "Name").
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    pub symbol: String,
    pub cells: HashMap<String, String>,
}

impl RawRow {
    pub fn get(&self, header: &str) -> Option<&str> {
        self.cells.get(header).map(String::as_str)
    }
}
