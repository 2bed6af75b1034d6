//! CSV rendering of the export rows.
//!
//! Semicolon separators, CRLF line endings, Brazilian decimal comma. Text is
//! always quoted; numbers never are.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::io::Write;

use super::{COLUMNS, Cell, export_row};
use crate::core::{FiscalError, NormalizedRecord};

/// Header line plus one line per record.
pub fn to_csv(records: &[NormalizedRecord], today: NaiveDate) -> String {
    let mut out = String::new();
    for (i, column) in COLUMNS.iter().enumerate() {
        if i > 0 {
            out.push(';');
        }
        csv_field_str(&mut out, column);
    }
    out.push_str("\r\n");

    for record in records {
        for (i, cell) in export_row(record, today).iter().enumerate() {
            if i > 0 {
                out.push(';');
            }
            match cell {
                Cell::Text(s) => csv_field_str(&mut out, s),
                Cell::Number(d) => csv_field_decimal(&mut out, *d),
                Cell::Empty => {}
            }
        }
        out.push_str("\r\n");
    }
    out
}

/// [`to_csv`] into a writer, UTF-8 with a byte-order mark so spreadsheet
/// software picks the right encoding.
pub fn write_csv<W: Write>(
    writer: &mut W,
    records: &[NormalizedRecord],
    today: NaiveDate,
) -> Result<(), FiscalError> {
    writer
        .write_all("\u{FEFF}".as_bytes())
        .and_then(|_| writer.write_all(to_csv(records, today).as_bytes()))
        .and_then(|_| writer.flush())
        .map_err(|e| FiscalError::Export(format!("CSV write failed: {e}")))
}

fn csv_field_str(out: &mut String, value: &str) {
    out.push('"');
    for ch in value.chars() {
        if ch == '"' {
            out.push_str("\"\"");
        } else {
            out.push(ch);
        }
    }
    out.push('"');
}

// Unit prices carry more than two decimals; keep up to four.
fn csv_field_decimal(out: &mut String, d: Decimal) {
    let s = d.round_dp(4).normalize().to_string();
    out.push_str(&s.replace('.', ","));
}
