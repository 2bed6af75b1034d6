//! XML side of the engine: cleaning, DOM, tax aggregation, extractors and
//! the per-kind parsers behind [`parse_fiscal_xml`].

pub mod dom;

mod clean;
mod dispatch;
mod header;
mod invoice;
mod manifest;
mod products;
mod references;
mod taxes;

pub use clean::clean_xml_content;
pub use dispatch::{parse_batch, parse_fiscal_xml, try_parse_fiscal_xml};
pub use invoice::parse_invoice;
pub use manifest::parse_manifest;
pub use products::{extract_material, extract_products};
pub use references::{
    DocumentReference, ProtocolOutcome, extract_protocol, invoice_reference, manifest_reference,
};
pub use taxes::{
    Contribution, aggregate_contribution, aggregate_difal, aggregate_icms, aggregate_ipi,
    reconcile,
};
