//! Core record types, configuration, classifiers and numeric helpers.
//!
//! Everything here is independent of the XML layer: the parsers in
//! [`crate::parse`] fill these types, and [`crate::report`] renders them.

mod access_key;
mod batch;
mod builder;
mod classify;
mod config;
mod error;
pub mod numeric;
mod types;

pub use access_key::*;
pub use batch::*;
pub use builder::*;
pub use classify::*;
pub use config::*;
pub use error::*;
pub use numeric::{amounts_close, format_date, format_tax_id, truncate_to_four_decimals};
pub use types::*;
