//! Domain models for the inventory, purchasing and sales platform

mod catalog;
mod customer;
mod product;
mod purchase;
mod quotation;
mod sale;
mod stock_adjustment;
mod transaction;

pub use catalog::*;
pub use customer::*;
pub use product::*;
pub use purchase::*;
pub use quotation::*;
pub use sale::*;
pub use stock_adjustment::*;
pub use transaction::*;
