//! Human-readable identifiers
//!
//! SKU IDs and product codes are derived from the catalog abbreviations. Transaction and
//! customer codes are sequence numbers scoped by a prefix. All functions are pure: the
//! caller supplies the existing codes and the current date.

mod product_code;
mod sequence;
mod sku;

pub use product_code::*;
pub use sequence::*;
pub use sku::*;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodeError {
    /// A stored quotation code that does not parse means the data is corrupted
    #[error("invalid last quotation code format: {0}")]
    InvalidQuotationCode(String),
}
