//! # notafiscal
//!
//! Extraction engine for Brazilian electronic fiscal documents: NF-e (goods
//! invoices) and CT-e (freight manifests). Raw XML from heterogeneous issuer
//! software goes in; flat rows come out, one per invoice product line or one
//! per manifest, with document-level tax aggregates, operation direction and
//! authorization status attached.
//!
//! All monetary values, quantities and rates use [`rust_decimal::Decimal`],
//! never floating point.
//!
//! ## Quick Start
//!
//! ```rust
//! use notafiscal::core::*;
//! use notafiscal::parse::parse_fiscal_xml;
//! use rust_decimal_macros::dec;
//!
//! let xml = r#"<nfeProc xmlns="http://www.portalfiscal.inf.br/nfe">
//!   <NFe><infNFe Id="NFe35230512345678000164550010000001234567890123">
//!     <ide><nNF>123</nNF><dhEmi>2023-05-10T10:00:00-03:00</dhEmi><tpNF>1</tpNF></ide>
//!     <emit><CNPJ>05255986000164</CNPJ><xNome>Metais SA</xNome></emit>
//!     <dest><CNPJ>11222333000181</CNPJ><xNome>Cliente Ltda</xNome><enderDest><UF>PR</UF></enderDest></dest>
//!     <det nItem="1">
//!       <prod><xProd>Chapa</xProd><qCom>10</qCom><vUnCom>100</vUnCom></prod>
//!       <imposto><IPI><IPITrib><vBC>1000</vBC><pIPI>5</pIPI><vIPI>50</vIPI></IPITrib></IPI></imposto>
//!     </det>
//!   </infNFe></NFe>
//! </nfeProc>"#;
//!
//! let config = EngineConfig::default().with_own_company("05.255.986/0001-64");
//! let rows = parse_fiscal_xml(xml, "nota.xml", &config).unwrap();
//!
//! assert_eq!(rows.len(), 1);
//! assert_eq!(rows[0].invoice_number, "123");
//! assert_eq!(rows[0].date, "10/05/2023");
//! assert_eq!(rows[0].sale_unit_price, dec!(105));
//! assert_eq!(rows[0].extension.operation, Some(Operation::Outbound));
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `core` (default) | Record types, configuration, classifiers, numeric helpers |
//! | `parse` (default) | XML cleaning, DOM, tax aggregation, NF-e/CT-e parsers |
//! | `report` | 36-column export rows, summary, CSV |
//! | `all` | Everything |

#[cfg(feature = "core")]
pub mod core;

#[cfg(feature = "parse")]
pub mod parse;

#[cfg(feature = "report")]
pub mod report;

// Re-export core types at crate root for convenience
#[cfg(feature = "core")]
pub use crate::core::*;
