use crate::models::{Constituent, Quote, QuoteTable, RawRow};

/// Column names that may carry the company name, in precedence order.
pub const NAME_HEADERS: [&str; 3] = ["Security", "Company", "Name"];

/// Column names that may carry the sector, in precedence order.
pub const SECTOR_HEADERS: [&str; 2] = ["GICS Sector", "Sector"];

/// Display form of a ticker: trimmed and upper-cased, dots kept.
/// " brk.b " → "BRK.B"
pub fn normalise_symbol(s: &str) -> String {
    s.trim().to_uppercase()
}

/// Yahoo uses dashes for share classes. "BRK.B" → "BRK-B"
pub fn to_provider_symbol(symbol: &str) -> String {
    symbol.replace('.', "-")
}

/// First non-empty cell among `headers`, or "".
pub fn resolve_field(row: &RawRow, headers: &[&str]) -> String {
    headers
        .iter()
        .filter_map(|h| row.get(h))
        .map(str::trim)
        .find(|v| !v.is_empty())
        .unwrap_or_default()
        .to_string()
}

// ── RawRow → Constituent ──────────────────────────────────────────────────────

pub fn row_to_constituent(row: &RawRow, quotes: &QuoteTable) -> Constituent {
    let quote = quotes.get(&row.symbol).copied().unwrap_or_default();
    to_constituent(row, quote)
}

fn to_constituent(row: &RawRow, quote: Quote) -> Constituent {
    Constituent {
        symbol: row.symbol.clone(),
        name: resolve_field(row, &NAME_HEADERS),
        sector: resolve_field(row, &SECTOR_HEADERS),
        price: quote.price,
        dividend_yield: quote.dividend_yield,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
