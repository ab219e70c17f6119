//! Shared types and models for the Goodpack inventory platform
//!
//! This crate contains the domain models, the stock/price ledger and the code
//! generators shared between the backend and the frontend (via WASM).

pub mod codegen;
pub mod ledger;
pub mod models;
pub mod types;
pub mod validation;

pub use codegen::*;
pub use ledger::*;
pub use models::*;
pub use types::*;
pub use validation::*;
