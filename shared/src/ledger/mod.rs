//! Stock and price ledger
//!
//! Pure functions over a borrowed [`Product`](crate::models::Product). Every operation
//! mutates the product in place through `&mut` and leaves persistence to the caller.
//! Nothing here reads the clock: the observation date is passed in.

mod audit;
mod price;
mod stock;

pub use audit::*;
pub use price::*;
pub use stock::*;
