use crate::error::ExportError;
use crate::models::RawRow;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use tracing::debug;

use super::cleaner::normalise_symbol;

// ── Constituent table ─────────────────────────────────────────────────────────

/// Extract the rows of the first table that has a "Symbol" header and at
/// least one row with a non-empty symbol.
///
/// The header row is the first row of the table, `th` or `td` cells alike.
/// A Symbol table without usable rows is skipped rather than returned empty.
pub fn extract_constituent_table(html: &str) -> Result<Vec<RawRow>, ExportError> {
    let doc = Html::parse_document(html);
    let table_sel =
        Selector::parse("table").map_err(|e| ExportError::Selector(format!("table: {e:?}")))?;

    for (n, table) in doc.select(&table_sel).enumerate() {
        let rows = table_rows(table);
        let Some((header_row, body)) = rows.split_first() else { continue };

        let headers = row_cells(*header_row);
        let Some(symbol_idx) = headers.iter().position(|h| h.eq_ignore_ascii_case("symbol")) else {
            continue;
        };

        let parsed: Vec<RawRow> = body
            .iter()
            .filter_map(|tr| build_row(&headers, symbol_idx, row_cells(*tr)))
            .collect();

        if parsed.is_empty() {
            debug!("Table {} has a Symbol column but no rows, skipping", n);
            continue;
        }

        debug!("Table {}: {} rows, headers {:?}", n, parsed.len(), headers);
        return Ok(parsed);
    }

    Err(ExportError::NoTableFound)
}

/// Rows that belong to this table, in document order. Rows of nested
/// tables are left out.
fn table_rows(table: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    let mut rows = Vec::new();
    for child in table.children().filter_map(ElementRef::wrap) {
        match child.value().name() {
            "tr" => rows.push(child),
            "thead" | "tbody" | "tfoot" => rows.extend(
                child
                    .children()
                    .filter_map(ElementRef::wrap)
                    .filter(|el| el.value().name() == "tr"),
            ),
            _ => {}
        }
    }
    rows
}

fn row_cells(tr: ElementRef<'_>) -> Vec<String> {
    tr.children()
        .filter_map(ElementRef::wrap)
        .filter(|el| matches!(el.value().name(), "th" | "td"))
        .map(cell_text)
        .collect()
}

/// Cell text with surrounding whitespace trimmed and inner runs collapsed.
fn cell_text(el: ElementRef<'_>) -> String {
    el.text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn build_row(headers: &[String], symbol_idx: usize, cells: Vec<String>) -> Option<RawRow> {
    let symbol = cells.get(symbol_idx).map(|s| normalise_symbol(s))?;
    if symbol.is_empty() {
        return None;
    }

    let mut map = HashMap::with_capacity(cells.len());
    for (i, cell) in cells.into_iter().enumerate() {
        let header = match headers.get(i) {
            Some(h) => h.clone(),
            None => format!("column_{i}"),
        };
        // first cell wins on duplicate header names
        map.entry(header).or_insert(cell);
    }

    Some(RawRow { symbol, cells: map })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
