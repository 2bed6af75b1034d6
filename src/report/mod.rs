//! Tabular export of extracted records.
//!
//! Each record becomes one row of [`COLUMNS`]. Text is upper-cased, a missing
//! emission date is replaced by the export date, and manual-fill numbers that
//! are still zero are left blank so they read as "to be filled".
//!
//! ```
//! use chrono::NaiveDate;
//! use notafiscal::core::{DocumentKind, NormalizedRecord};
//! use notafiscal::report::{COLUMNS, Cell, export_row};
//!
//! let mut record = NormalizedRecord::empty(DocumentKind::Invoice);
//! record.customer = "Cliente Ltda".into();
//! let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
//!
//! let row = export_row(&record, today);
//! assert_eq!(row.len(), COLUMNS.len());
//! assert_eq!(row[0], Cell::Text("15/06/2024".into()));
//! assert_eq!(row[8], Cell::Text("CLIENTE LTDA".into()));
//! ```

mod csv_export;

pub use csv_export::{to_csv, write_csv};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::core::{DocumentKind, NormalizedRecord};

/// Export header, in output order.
pub const COLUMNS: [&str; 36] = [
    "DATA",
    "EMPRESA",
    "VENDEDOR",
    "REPRESENTANTE",
    "SEGMENTO",
    "CTE",
    "TRANSPORTADORA",
    "VALOR DO FRETE",
    "CLIENTE",
    "UF",
    "DANFE",
    "MATRIZ/MC NF",
    "PRODUTO",
    "TIPOMAT",
    "FORNECEDOR",
    "LOTE",
    "PESO",
    "$ KG - (COMPRA)",
    "$ KG - (COMPRA) S/IPI",
    "R$ COMPRA",
    "$ KG - (VENDA)",
    "$ KG VENDA - S/IPI",
    "R$ - VENDA",
    "CUSTO FRETE KG",
    "NOME",
    "COM. REPRESENTANTE",
    "COMISSÃO VENDEDOR",
    "COMISSAO MATRIZ/MC NF",
    "CMV",
    "RESULTADO",
    "MARGEM",
    "TIPO",
    "ESTADO",
    "VENDA",
    "LUCRO",
    "EMPRESA (XML)",
];

/// One exported cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cell {
    Text(String),
    Number(Decimal),
    Empty,
}

/// Upper-cased text, blank when empty.
fn upper(value: &str) -> Cell {
    if value.is_empty() {
        Cell::Empty
    } else {
        Cell::Text(value.to_uppercase())
    }
}

/// Identifiers (CT-e and NF-e numbers) keep their case.
fn verbatim(value: &str) -> Cell {
    if value.is_empty() {
        Cell::Empty
    } else {
        Cell::Text(value.to_string())
    }
}

/// Manual-fill number: zero means "not filled".
fn filled(value: Decimal) -> Cell {
    if value.is_zero() {
        Cell::Empty
    } else {
        Cell::Number(value)
    }
}

/// The export row of one record, aligned with [`COLUMNS`].
pub fn export_row(record: &NormalizedRecord, today: NaiveDate) -> Vec<Cell> {
    let date = if record.date.is_empty() {
        Cell::Text(today.format("%d/%m/%Y").to_string())
    } else {
        Cell::Text(record.date.clone())
    };

    vec![
        date,
        upper(&record.company),
        upper(&record.seller),
        upper(&record.representative),
        upper(&record.segment),
        verbatim(&record.freight_document),
        upper(&record.carrier),
        filled(record.freight_value),
        upper(&record.customer),
        upper(&record.state),
        verbatim(&record.invoice_number),
        upper(&record.head_office),
        upper(&record.product),
        upper(&record.material_type),
        upper(&record.supplier),
        upper(&record.lot),
        Cell::Number(record.quantity),
        filled(record.purchase_unit_price),
        filled(record.purchase_unit_price_ex_ipi),
        filled(record.purchase_total),
        Cell::Number(record.sale_unit_price),
        Cell::Number(record.sale_unit_price_ex_ipi),
        Cell::Number(record.sale_total),
        filled(record.freight_cost_per_kg),
        upper(&record.name),
        filled(record.representative_commission),
        filled(record.seller_commission),
        filled(record.head_office_commission),
        filled(record.cost_of_goods),
        filled(record.result),
        filled(record.margin),
        upper(&record.category),
        upper(&record.region),
        filled(record.sale),
        filled(record.profit),
        upper(&record.issuer_name),
    ]
}

/// Totals shown next to an export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// Distinct non-empty access keys.
    pub documents: usize,
    pub rows: usize,
    /// Σ quantity.
    pub total_quantity: Decimal,
    /// Σ quantity × uplifted sale unit price.
    pub total_sale_value: Decimal,
    pub invoice_rows: usize,
    pub manifest_rows: usize,
}

impl Summary {
    /// Totals over `records`. Rows without an access key, such as invoices
    /// whose key was malformed, still count as rows but not as documents.
    pub fn from_records(records: &[NormalizedRecord]) -> Self {
        let documents: HashSet<&str> = records
            .iter()
            .map(|r| r.access_key.as_str())
            .filter(|k| !k.is_empty())
            .collect();
        let invoice_rows = records
            .iter()
            .filter(|r| r.kind == DocumentKind::Invoice)
            .count();
        Self {
            documents: documents.len(),
            rows: records.len(),
            total_quantity: records
                .iter()
                .fold(Decimal::ZERO, |acc, r| acc.saturating_add(r.quantity)),
            total_sale_value: records
                .iter()
                .fold(Decimal::ZERO, |acc, r| acc.saturating_add(r.sale_value())),
            invoice_rows,
            manifest_rows: records.len() - invoice_rows,
        }
    }
}
