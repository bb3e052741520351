//! CSV export of the joined constituent list.

use crate::error::ExportError;
use crate::models::Constituent;
use serde::Serialize;
use std::io;
use std::path::Path;
use tracing::info;

/// Output columns, in order.
pub const CSV_HEADERS: [&str; 5] = ["Symbol", "Name", "Sector", "Price", "Dividend Yield"];

/// One CSV line. `None` serializes as an empty field.
#[derive(Serialize)]
struct CsvRow<'a> {
    symbol: &'a str,
    name: &'a str,
    sector: &'a str,
    price: Option<f64>,
    dividend_yield: Option<f64>,
}

impl<'a> From<&'a Constituent> for CsvRow<'a> {
    fn from(c: &'a Constituent) -> Self {
        Self {
            symbol: &c.symbol,
            name: &c.name,
            sector: &c.sector,
            price: c.price,
            dividend_yield: c.dividend_yield,
        }
    }
}

/// Write header + rows to any writer. The header is written even when
/// there are no rows.
pub fn write_to<W: io::Write>(constituents: &[Constituent], out: W) -> csv::Result<()> {
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(out);

    wtr.write_record(CSV_HEADERS)?;
    for c in constituents {
        wtr.serialize(CsvRow::from(c))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write the constituents to `path`, replacing any existing file.
pub fn write_constituents(constituents: &[Constituent], path: &Path) -> Result<usize, ExportError> {
    let io_err = |source: csv::Error| ExportError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = std::fs::File::create(path).map_err(|e| io_err(e.into()))?;
    write_to(constituents, file).map_err(io_err)?;

    info!("Wrote {} rows to {:?}", constituents.len(), path);
    Ok(constituents.len())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
