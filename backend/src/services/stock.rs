//! Stock postings, manual adjustments, history and reversal
//!
//! Every stock change goes through [`StockService::post`]: the price ledger (when a unit
//! price is given), the stock ledger and the before/after audit record. The product
//! write is primary and fails loud; the audit write is best-effort.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::Deserialize;
use shared::{
    apply_stock_adjustment, clamp_negative_stock, reverse_stock_adjustment, update_price,
    AdjustmentSource, AdjustmentType, DateRange, Paging, Product, SourceType, StockAdjustment,
    StockAdjustmentRequest, StockChange, StockSnapshot, StockType,
};
use uuid::Uuid;

use super::{mutate_product, record_adjustment, require_product, today};
use crate::error::{AppError, AppResult};
use crate::repositories::Repositories;

/// Default number of records returned by the per-product history
pub const DEFAULT_HISTORY_LIMIT: i64 = 50;

/// Audit link written with a posting
#[derive(Debug, Clone)]
pub struct AuditLink {
    pub source: AdjustmentSource,
    pub notes: Option<String>,
}

/// One stock mutation of one product
#[derive(Debug, Clone)]
pub struct Posting {
    pub change: StockChange,
    /// Fed to the price ledger: purchase bucket for `add`, sale bucket for `reduce`
    pub unit_price: Option<f64>,
    /// Clamp remaining and actual stock at zero after the change
    pub clamp_negative: bool,
    /// `None` changes stock without an audit record
    pub audit: Option<AuditLink>,
}

impl Posting {
    /// Goods received on a purchase
    pub fn purchase(is_vat: bool, quantity: i32, unit_price: f64, id: Uuid, code: &str) -> Self {
        Self {
            change: StockChange::new(AdjustmentType::Add, StockType::for_vat(is_vat), quantity),
            unit_price: Some(unit_price),
            clamp_negative: false,
            audit: Some(AuditLink {
                source: AdjustmentSource::transaction(SourceType::Purchase, id, code),
                notes: Some(format!("ซื้อจากรายการ {}", code)),
            }),
        }
    }

    /// Goods leaving on a sale
    pub fn sale(is_vat: bool, quantity: i32, unit_price: f64, id: Uuid, code: &str) -> Self {
        Self {
            change: StockChange::new(AdjustmentType::Reduce, StockType::for_vat(is_vat), quantity),
            unit_price: Some(unit_price),
            clamp_negative: false,
            audit: Some(AuditLink {
                source: AdjustmentSource::transaction(SourceType::Sale, id, code),
                notes: Some(format!("ขายจากรายการ {}", code)),
            }),
        }
    }

    /// Put back the stock of a sale line being edited or deleted
    pub fn restore_sale(is_vat: bool, quantity: i32) -> Self {
        Self {
            change: StockChange::new(AdjustmentType::Add, StockType::for_vat(is_vat), quantity),
            unit_price: None,
            clamp_negative: false,
            audit: None,
        }
    }

    /// Take the stock of an edited sale line, without price or audit
    pub fn resell(is_vat: bool, quantity: i32) -> Self {
        Self {
            change: StockChange::new(AdjustmentType::Reduce, StockType::for_vat(is_vat), quantity),
            unit_price: None,
            clamp_negative: false,
            audit: None,
        }
    }

    /// Same change, recorded as a CSV import
    pub fn migrated(mut self, id: Uuid, code: &str) -> Self {
        self.audit = Some(AuditLink {
            source: AdjustmentSource::transaction(SourceType::Migration, id, code),
            notes: Some(format!("นำเข้าข้อมูลจากรายการ {}", code)),
        });
        self
    }

    pub fn clamped(mut self) -> Self {
        self.clamp_negative = true;
        self
    }
}

/// Query of the per-product history endpoint
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    pub limit: Option<i64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl HistoryQuery {
    /// Range to filter on, `None` when neither date parses
    ///
    /// A missing start is 2000-01-01, a missing end is `now`; the end date covers the
    /// whole day up to 23:59:59.
    pub fn range(&self, now: DateTime<Utc>) -> Option<DateRange> {
        let parse = |s: &Option<String>| {
            s.as_deref()
                .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
        };
        let start = parse(&self.start_date).and_then(|d| d.and_hms_opt(0, 0, 0));
        let end = parse(&self.end_date).and_then(|d| d.and_hms_opt(23, 59, 59));

        if start.is_none() && end.is_none() {
            return None;
        }

        let history_start = || NaiveDate::from_ymd_opt(2000, 1, 1)?.and_hms_opt(0, 0, 0);
        let start = Utc.from_utc_datetime(&start.or_else(history_start)?);
        let end = end.map(|e| Utc.from_utc_datetime(&e)).unwrap_or(now);
        Some(DateRange { start, end })
    }

    pub fn limit(&self) -> i64 {
        self.limit.filter(|l| *l > 0).unwrap_or(DEFAULT_HISTORY_LIMIT)
    }
}

/// Query of the all-products history endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PagingQuery {
    pub limit: Option<i64>,
    pub skip: Option<i64>,
}

impl PagingQuery {
    pub fn paging(&self) -> Paging {
        let defaults = Paging::default();
        Paging {
            limit: self.limit.filter(|l| *l > 0).unwrap_or(defaults.limit),
            skip: self.skip.filter(|s| *s >= 0).unwrap_or(defaults.skip),
        }
    }
}

/// Query of the by-source history endpoint
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceQuery {
    pub source_type: Option<String>,
    pub source_id: Option<String>,
}

#[derive(Clone)]
pub struct StockService {
    repos: Repositories,
}

impl StockService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    /// Apply `posting` to product `id` and record it
    #[tracing::instrument(skip(self, posting), fields(
        adjustment = posting.change.adjustment_type.as_str(),
        stock = posting.change.stock_type.as_str(),
        quantity = posting.change.quantity,
    ))]
    pub async fn post(&self, id: Uuid, posting: &Posting) -> AppResult<Product> {
        let on = today();
        let now = Utc::now();

        let (product, record) = mutate_product(self.repos.products.as_ref(), id, |product| {
            if let Some(price) = posting.unit_price {
                let is_purchase = posting.change.adjustment_type == AdjustmentType::Add;
                let is_vat = posting.change.stock_type == StockType::Vat;
                update_price(product, price, is_vat, is_purchase, on);
            }

            let before = StockSnapshot::capture(&product.stock);
            apply_stock_adjustment(product, posting.change)?;
            if posting.clamp_negative {
                clamp_negative_stock(&mut product.stock);
            }
            product.updated_at = now;

            Ok(posting.audit.as_ref().map(|link| {
                StockAdjustment::record(
                    product,
                    posting.change,
                    before,
                    link.source.clone(),
                    link.notes.clone(),
                    now,
                )
            }))
        })
        .await?;

        if let Some(record) = record {
            record_adjustment(self.repos.adjustments.as_ref(), &record).await;
        }

        Ok(product)
    }

    /// Manual adjustment of a product found by id or SKU
    #[tracing::instrument(skip(self, request))]
    pub async fn adjust(&self, key: &str, request: StockAdjustmentRequest) -> AppResult<Product> {
        let product = require_product(self.repos.products.as_ref(), key).await?;
        let change = request.to_change().map_err(AppError::validation)?;

        let posting = Posting {
            change,
            unit_price: None,
            clamp_negative: false,
            audit: Some(AuditLink {
                source: AdjustmentSource::manual(),
                notes: request.notes.filter(|n| !n.is_empty()),
            }),
        };
        let product = self.post(product.id, &posting).await?;

        tracing::info!(
            sku_id = %product.sku_id,
            actual_stock = product.stock.actual_stock,
            "Stock adjusted"
        );
        Ok(product)
    }

    /// Newest first
    pub async fn history(&self, key: &str, query: &HistoryQuery) -> AppResult<Vec<StockAdjustment>> {
        let product = require_product(self.repos.products.as_ref(), key).await?;
        self.repos
            .adjustments
            .by_product(&product.id.to_string(), query.range(Utc::now()), query.limit())
            .await
    }

    pub async fn all_history(&self, paging: Paging) -> AppResult<Vec<StockAdjustment>> {
        self.repos.adjustments.all(paging).await
    }

    pub async fn history_by_source(&self, query: &SourceQuery) -> AppResult<Vec<StockAdjustment>> {
        let (Some(source_type), Some(source_id)) = (
            query.source_type.as_deref().filter(|s| !s.is_empty()),
            query.source_id.as_deref().filter(|s| !s.is_empty()),
        ) else {
            return Err(AppError::validation("sourceType and sourceId are required"));
        };
        let source_type: SourceType = source_type.parse().map_err(AppError::validation)?;
        self.repos.adjustments.by_source(source_type, source_id).await
    }

    /// Undo an adjustment on top of the product's current stock and drop the record
    #[tracing::instrument(skip(self))]
    pub async fn reverse(&self, adjustment_id: Uuid) -> AppResult<Product> {
        let adjustment = self
            .repos
            .adjustments
            .get_by_id(adjustment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Stock adjustment".to_string()))?;

        let product_id = Uuid::parse_str(&adjustment.product_id)
            .map_err(|_| AppError::NotFound("Product".to_string()))?;
        let change = adjustment.change();
        let now = Utc::now();

        let (product, ()) = mutate_product(self.repos.products.as_ref(), product_id, |p| {
            reverse_stock_adjustment(p, change)?;
            p.updated_at = now;
            Ok(())
        })
        .await?;

        self.repos.adjustments.delete(adjustment_id).await?;
        tracing::info!(%adjustment_id, sku_id = %product.sku_id, "Stock adjustment reversed");

        Ok(product)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_history_range_defaults() {
        let now = Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap();

        assert!(HistoryQuery::default().range(now).is_none());

        let only_end = HistoryQuery {
            end_date: Some("2024-05-01".into()),
            ..Default::default()
        };
        let range = only_end.range(now).unwrap();
        assert_eq!(range.start.year(), 2000);
        assert_eq!((range.end.day(), range.end.hour(), range.end.second()), (1, 23, 59));

        let only_start = HistoryQuery {
            start_date: Some("2024-04-01".into()),
            ..Default::default()
        };
        assert_eq!(only_start.range(now).unwrap().end, now);

        let garbage = HistoryQuery {
            start_date: Some("01/04/2024".into()),
            ..Default::default()
        };
        assert!(garbage.range(now).is_none());
    }

    #[test]
    fn test_limits() {
        assert_eq!(HistoryQuery::default().limit(), 50);
        let paging = PagingQuery {
            limit: Some(-1),
            skip: Some(5),
        }
        .paging();
        assert_eq!((paging.limit, paging.skip), (100, 5));
    }

    #[test]
    fn test_postings() {
        let id = Uuid::new_v4();
        let purchase = Posting::purchase(true, 5, 10.0, id, "PUR-VAT-6701-0001");
        assert_eq!(purchase.change.stock_type, StockType::Vat);
        assert_eq!(
            purchase.audit.as_ref().unwrap().notes.as_deref(),
            Some("ซื้อจากรายการ PUR-VAT-6701-0001")
        );

        let sale = Posting::sale(false, 2, 15.0, id, "NV-6701-0001")
            .migrated(id, "NV-6701-0001")
            .clamped();
        assert_eq!(sale.change.adjustment_type, AdjustmentType::Reduce);
        assert_eq!(sale.audit.unwrap().source.source_type, SourceType::Migration);
        assert!(sale.clamp_negative);

        assert!(Posting::restore_sale(true, 1).audit.is_none());
    }
}
