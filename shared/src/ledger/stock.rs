//! Stock counter mutations

use thiserror::Error;

use crate::models::{AdjustmentType, Product, Stock, StockChange, StockType};

/// A stock change that cannot be applied
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StockError {
    #[error("stock counter {0} is out of range")]
    Overflow(&'static str),
}

fn shift(counter: i32, delta: i32, name: &'static str) -> Result<i32, StockError> {
    counter.checked_add(delta).ok_or(StockError::Overflow(name))
}

/// Apply one stock change to `product`
///
/// `actualstock` only moves the on-hand count. `vat`/`nonvat` move the track counters and
/// the on-hand count together. Counters may go negative; that is how over-selling shows up.
/// A change that would overflow any counter leaves the product untouched.
pub fn apply_stock_adjustment(product: &mut Product, change: StockChange) -> Result<(), StockError> {
    let stock = &mut product.stock;
    let delta = match change.adjustment_type {
        AdjustmentType::Add => change.quantity,
        AdjustmentType::Reduce => change
            .quantity
            .checked_neg()
            .ok_or(StockError::Overflow("quantity"))?,
    };
    let actual_stock = shift(stock.actual_stock, delta, "actualStock")?;

    let info = match change.stock_type {
        StockType::ActualStock => {
            stock.actual_stock = actual_stock;
            return Ok(());
        }
        StockType::Vat => &mut stock.vat,
        StockType::NonVat => &mut stock.non_vat,
    };

    let remaining = shift(info.remaining, delta, "remaining")?;
    match change.adjustment_type {
        AdjustmentType::Add => info.purchased = shift(info.purchased, change.quantity, "purchased")?,
        AdjustmentType::Reduce => info.sold = shift(info.sold, change.quantity, "sold")?,
    }
    info.remaining = remaining;
    stock.actual_stock = actual_stock;
    Ok(())
}

/// Undo `change` by applying its opposite
///
/// This is re-application, not restoration: a reversed `add` bumps `sold` instead of
/// lowering `purchased`, so lifetime counters drift.
pub fn reverse_stock_adjustment(product: &mut Product, change: StockChange) -> Result<(), StockError> {
    apply_stock_adjustment(product, change.reversed())
}

/// Raise negative counters to zero (CSV sale import only)
pub fn clamp_negative_stock(stock: &mut Stock) {
    for info in [&mut stock.vat, &mut stock.non_vat] {
        info.remaining = info.remaining.max(0);
    }
    stock.actual_stock = stock.actual_stock.max(0);
}
