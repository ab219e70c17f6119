//! Before/after snapshots around a stock change

use chrono::{DateTime, Utc};

use super::{apply_stock_adjustment, StockError};
use crate::models::{AdjustmentSource, Product, StockAdjustment, StockChange, StockSnapshot};

pub fn capture_before(product: &Product) -> StockSnapshot {
    StockSnapshot::capture(&product.stock)
}

pub fn capture_after(product: &Product) -> StockSnapshot {
    StockSnapshot::capture(&product.stock)
}

/// Apply `change` to `product` and build the audit record describing it
///
/// The record is not persisted here.
pub fn apply_and_record(
    product: &mut Product,
    change: StockChange,
    source: AdjustmentSource,
    notes: Option<String>,
    now: DateTime<Utc>,
) -> Result<StockAdjustment, StockError> {
    let before = capture_before(product);
    apply_stock_adjustment(product, change)?;
    Ok(StockAdjustment::record(product, change, before, source, notes, now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AdjustmentType, ProductRequest, SourceType, StockType};
    use uuid::Uuid;

    #[test]
    fn test_record_links_source_and_snapshots() {
        let mut product = Product::from_request(
            ProductRequest {
                name: "Bag".into(),
                category: "Bag".into(),
                ..Default::default()
            },
            "BAG-0001".into(),
            "BAG-/".into(),
            Utc::now(),
        );
        product.stock.vat.remaining = 2;
        product.stock.actual_stock = 2;

        let purchase_id = Uuid::new_v4();
        let record = apply_and_record(
            &mut product,
            StockChange::new(AdjustmentType::Add, StockType::Vat, 5),
            AdjustmentSource::transaction(SourceType::Purchase, purchase_id, "PUR-VAT-6701-0001"),
            Some("ซื้อจากรายการ PUR-VAT-6701-0001".into()),
            Utc::now(),
        )
        .unwrap();

        assert_eq!(record.before().vat_remaining, 2);
        assert_eq!(record.after().vat_remaining, 7);
        assert_eq!(record.after(), capture_after(&product));
        assert_eq!(record.source_id, Some(purchase_id.to_string()));
        assert_eq!(record.source_code.as_deref(), Some("PUR-VAT-6701-0001"));
        assert_eq!(record.sku_id, "BAG-0001");
    }
}
