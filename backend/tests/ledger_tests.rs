//! Stock and price ledger tests
//!
//! Tests for the ledger and its audit trail including:
//! - Property 1: Round-half-up on cents
//! - Property 2: Price bucket independence
//! - Property 3: YTD/MTD period reset
//! - Property 4: Stock symmetry for add
//! - Property 5: Negative remaining allowed
//! - Property 6: Audit snapshot completeness
//! - Stock counters reject overflow instead of wrapping
//! - Stock adjustments, history and reversal through the stock service
//! - Version conflicts on product writes: reload, re-apply, give up after three attempts
//! - Audit write failures never fail the stock change

use chrono::{NaiveDate, Utc};
use proptest::prelude::*;
use shared::{
    apply_and_record, apply_stock_adjustment, reverse_stock_adjustment, round2, update_price,
    AdjustmentSource, AdjustmentType, PriceInfo, Product, ProductRequest, StockChange, StockError,
    StockType,
};

fn blank_product() -> Product {
    Product::from_request(
        ProductRequest {
            name: "กล่องลูกฟูก".into(),
            category: "Box".into(),
            ..Default::default()
        },
        "BOX-0001".into(),
        "BOX-l/WH".into(),
        Utc::now(),
    )
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Round-half-up on scaled cents, floating-point edges included
    #[test]
    fn test_round2_known_values() {
        assert_eq!(round2(0.125), 0.13);
        assert_eq!(round2(0.375), 0.38);
        assert_eq!(round2(-0.125), -0.12);
        assert_eq!(round2(150.0), 150.0);
        // 2.005 is stored as 2.00499999..., so it rounds down
        assert_eq!(round2(2.005), (2.005f64 * 100.0 + 0.5).floor() / 100.0);
        assert_eq!(round2(2.005), 2.0);
    }

    /// Scenario A: empty history, then two purchases in the same bucket
    #[test]
    fn test_first_and_second_price_observation() {
        let mut product = blank_product();
        let on = date(2024, 3, 10);

        update_price(&mut product, 100.0, true, true, on);
        let info = product.price.purchase_vat;
        assert_eq!(info.latest, 100.0);
        assert_eq!(info.min, 100.0);
        assert_eq!(info.max, 100.0);
        assert_eq!(info.average, 100.0);
        assert_eq!(info.ytd_count, 1);
        assert_eq!(info.average_ytd, 100.0);
        assert_eq!(info.mtd_count, 1);
        assert_eq!(info.average_mtd, 100.0);

        update_price(&mut product, 200.0, true, true, on);
        let info = product.price.purchase_vat;
        assert_eq!(info.latest, 200.0);
        assert_eq!(info.average, 150.0);
        assert_eq!(info.max, 200.0);
        assert_eq!(info.min, 100.0);
        assert_eq!(info.ytd_count, 2);
        assert_eq!(info.average_ytd, 150.0);
    }

    /// The average is a two-point decaying average, not a running mean
    #[test]
    fn test_average_is_decaying() {
        let mut product = blank_product();
        let on = date(2024, 3, 10);
        for price in [100.0, 200.0, 300.0] {
            update_price(&mut product, price, false, false, on);
        }
        let info = product.price.sale_non_vat;
        // (150 + 300) / 2, where the true mean would be 200
        assert_eq!(info.average, 225.0);
        assert_eq!(info.average_ytd, 200.0);
    }

    /// A new month resets MTD but keeps accumulating YTD
    #[test]
    fn test_month_rollover() {
        let mut product = blank_product();
        update_price(&mut product, 10.0, false, true, date(2024, 1, 31));
        update_price(&mut product, 20.0, false, true, date(2024, 2, 1));

        let info = product.price.purchase_non_vat;
        assert_eq!(info.mtd_count, 1);
        assert_eq!(info.mtd_month, 2);
        assert_eq!(info.average_mtd, 20.0);
        assert_eq!(info.ytd_count, 2);
        assert_eq!(info.average_ytd, 15.0);
    }

    /// Scenario B: over-selling drives the counters negative
    #[test]
    fn test_oversell_goes_negative() {
        let mut product = blank_product();
        apply_stock_adjustment(
            &mut product,
            StockChange::new(AdjustmentType::Add, StockType::Vat, 10),
        )
        .unwrap();
        apply_stock_adjustment(
            &mut product,
            StockChange::new(AdjustmentType::Reduce, StockType::Vat, 15),
        )
        .unwrap();

        let stock = product.stock;
        assert_eq!(stock.vat.remaining, -5);
        assert_eq!(stock.actual_stock, -5);
        assert_eq!(stock.vat.purchased, 10);
        assert_eq!(stock.vat.sold, 15);
    }

    #[test]
    fn test_counter_overflow_is_rejected() {
        let mut product = blank_product();
        product.stock.vat.remaining = i32::MAX - 1;
        product.stock.actual_stock = i32::MAX - 1;

        let result = apply_stock_adjustment(
            &mut product,
            StockChange::new(AdjustmentType::Add, StockType::Vat, 2),
        );
        assert_eq!(result, Err(StockError::Overflow("actualStock")));
        assert_eq!(product.stock.vat.remaining, i32::MAX - 1);
        assert_eq!(product.stock.vat.purchased, 0);
    }

    /// Actual stock adjustments leave the track counters alone
    #[test]
    fn test_actual_stock_only() {
        let mut product = blank_product();
        apply_stock_adjustment(
            &mut product,
            StockChange::new(AdjustmentType::Reduce, StockType::ActualStock, 3),
        )
        .unwrap();
        assert_eq!(product.stock.actual_stock, -3);
        assert_eq!(product.stock.vat, Default::default());
        assert_eq!(product.stock.non_vat, Default::default());
    }

    /// Reversal re-applies the opposite change, so lifetime counters drift
    #[test]
    fn test_reversal_drifts_lifetime_counters() {
        let mut product = blank_product();
        let change = StockChange::new(AdjustmentType::Add, StockType::NonVat, 4);
        apply_stock_adjustment(&mut product, change).unwrap();
        reverse_stock_adjustment(&mut product, change).unwrap();

        assert_eq!(product.stock.non_vat.remaining, 0);
        assert_eq!(product.stock.actual_stock, 0);
        assert_eq!(product.stock.non_vat.purchased, 4);
        assert_eq!(product.stock.non_vat.sold, 4);
    }

    /// A zero price is indistinguishable from "no observation" for min and average
    #[test]
    fn test_zero_is_unset_sentinel() {
        let mut info = PriceInfo::default();
        info.observe(0.0, date(2024, 1, 1));
        info.observe(50.0, date(2024, 1, 2));
        assert_eq!(info.min, 50.0);
        assert_eq!(info.average, 50.0);
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn price_strategy() -> impl Strategy<Value = f64> {
        (1u32..10_000_000u32).prop_map(|cents| f64::from(cents) / 100.0)
    }

    fn quantity_strategy() -> impl Strategy<Value = i32> {
        1i32..10_000
    }

    fn stock_type_strategy() -> impl Strategy<Value = StockType> {
        prop_oneof![
            Just(StockType::Vat),
            Just(StockType::NonVat),
            Just(StockType::ActualStock),
        ]
    }

    fn adjustment_type_strategy() -> impl Strategy<Value = AdjustmentType> {
        prop_oneof![Just(AdjustmentType::Add), Just(AdjustmentType::Reduce)]
    }

    /// Indexes into `StockSnapshot::as_array` a change may touch
    fn touched_fields(change: StockChange) -> Vec<usize> {
        match (change.stock_type, change.adjustment_type) {
            (StockType::Vat, AdjustmentType::Add) => vec![0, 2, 6],
            (StockType::Vat, AdjustmentType::Reduce) => vec![1, 2, 6],
            (StockType::NonVat, AdjustmentType::Add) => vec![3, 5, 6],
            (StockType::NonVat, AdjustmentType::Reduce) => vec![4, 5, 6],
            (StockType::ActualStock, _) => vec![6],
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// **Property 1: Round-half-up on cents**
        #[test]
        fn prop_round2_matches_cent_formula(x in -1.0e6f64..1.0e6f64) {
            prop_assert_eq!(round2(x), (x * 100.0 + 0.5).floor() / 100.0);
        }

        /// **Property 2: Price bucket independence**
        #[test]
        fn prop_purchase_non_vat_touches_only_its_bucket(
            seed in price_strategy(),
            price in price_strategy(),
        ) {
            let mut product = blank_product();
            let on = date(2024, 6, 1);
            for (is_vat, is_purchase) in [(true, true), (false, true), (true, false), (false, false)] {
                update_price(&mut product, seed, is_vat, is_purchase, on);
            }
            let before = product.price.clone();

            update_price(&mut product, price, false, true, on);

            prop_assert_eq!(product.price.sale_vat, before.sale_vat);
            prop_assert_eq!(product.price.sale_non_vat, before.sale_non_vat);
            prop_assert_eq!(product.price.purchase_vat, before.purchase_vat);
            prop_assert_eq!(product.price.purchase_non_vat.latest, price);
        }

        /// **Property 3: YTD/MTD period reset**
        #[test]
        fn prop_new_year_resets_ytd(
            old_count in 1i32..500,
            old_total in price_strategy(),
            price in price_strategy(),
        ) {
            let mut info = PriceInfo {
                ytd_year: 2023,
                ytd_count: old_count,
                ytd_total: old_total,
                average_ytd: 1.0,
                mtd_year: 2023,
                mtd_month: 12,
                mtd_count: old_count,
                mtd_total: old_total,
                ..Default::default()
            };
            info.observe(price, date(2024, 1, 5));

            prop_assert_eq!(info.ytd_year, 2024);
            prop_assert_eq!(info.ytd_count, 1);
            prop_assert_eq!(info.average_ytd, price);
            prop_assert_eq!(info.mtd_count, 1);
            prop_assert_eq!(info.average_mtd, price);
        }

        /// **Property 4: Stock symmetry for add**
        #[test]
        fn prop_vat_add_moves_three_counters(q in quantity_strategy(), start in 0i32..1000) {
            let mut product = blank_product();
            product.stock.vat.purchased = start;
            product.stock.vat.remaining = start;
            product.stock.actual_stock = start;

            apply_stock_adjustment(&mut product, StockChange::new(AdjustmentType::Add, StockType::Vat, q)).unwrap();

            prop_assert_eq!(product.stock.vat.purchased, start + q);
            prop_assert_eq!(product.stock.vat.remaining, start + q);
            prop_assert_eq!(product.stock.actual_stock, start + q);
            prop_assert_eq!(product.stock.vat.sold, 0);
        }

        /// **Property 5: Negative remaining allowed**
        #[test]
        fn prop_reduce_past_zero_is_not_clamped(remaining in 0i32..100, extra in 1i32..100) {
            let mut product = blank_product();
            product.stock.non_vat.remaining = remaining;
            product.stock.actual_stock = remaining;

            let q = remaining + extra;
            apply_stock_adjustment(&mut product, StockChange::new(AdjustmentType::Reduce, StockType::NonVat, q)).unwrap();

            prop_assert_eq!(product.stock.non_vat.remaining, -extra);
            prop_assert_eq!(product.stock.actual_stock, -extra);
        }

        /// **Property 6: Audit snapshot completeness**
        #[test]
        fn prop_snapshots_differ_only_in_touched_fields(
            adjustment_type in adjustment_type_strategy(),
            stock_type in stock_type_strategy(),
            q in quantity_strategy(),
            seed in prop::array::uniform7(-500i32..500),
        ) {
            let mut product = blank_product();
            product.stock.vat.purchased = seed[0];
            product.stock.vat.sold = seed[1];
            product.stock.vat.remaining = seed[2];
            product.stock.non_vat.purchased = seed[3];
            product.stock.non_vat.sold = seed[4];
            product.stock.non_vat.remaining = seed[5];
            product.stock.actual_stock = seed[6];

            let change = StockChange::new(adjustment_type, stock_type, q);
            let record = apply_and_record(&mut product, change, AdjustmentSource::manual(), None, Utc::now()).unwrap();

            let before = record.before().as_array();
            let after = record.after().as_array();
            prop_assert_eq!(before, seed);
            let touched = touched_fields(change);
            for i in 0..7 {
                if touched.contains(&i) {
                    prop_assert_eq!((after[i] - before[i]).abs(), q);
                } else {
                    prop_assert_eq!(after[i], before[i]);
                }
            }
        }
    }
}

// ============================================================================
// Stock Service Tests
// ============================================================================

#[cfg(test)]
mod service_tests {
    use async_trait::async_trait;
    use goodpack_backend::error::{AppError, AppResult};
    use goodpack_backend::repositories::{ProductRepository, Repositories, StockAdjustmentRepository};
    use goodpack_backend::services::stock::{HistoryQuery, SourceQuery};
    use goodpack_backend::services::{
        mutate_product, CustomerService, ProductService, PurchaseService, StockService,
        MAX_WRITE_ATTEMPTS,
    };
    use shared::{
        Catalog, CustomerRequest, DateRange, Paging, Product, ProductRequest, PurchaseRequest,
        SourceType, StockAdjustment, StockAdjustmentRequest,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use uuid::Uuid;

    /// Product store where another writer bumps the product just before each of our
    /// next `pending` writes
    struct ContendedProducts {
        inner: Arc<dyn ProductRepository>,
        pending: AtomicUsize,
    }

    impl ContendedProducts {
        fn wrap(repos: &mut Repositories) -> Arc<Self> {
            let contended = Arc::new(Self {
                inner: repos.products.clone(),
                pending: AtomicUsize::new(0),
            });
            repos.products = contended.clone();
            contended
        }

        fn interfere(&self, times: usize) {
            self.pending.store(times, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl ProductRepository for ContendedProducts {
        async fn create(&self, product: &Product) -> AppResult<()> {
            self.inner.create(product).await
        }
        async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Product>> {
            self.inner.get_by_id(id).await
        }
        async fn get_by_sku(&self, sku_id: &str) -> AppResult<Option<Product>> {
            self.inner.get_by_sku(sku_id).await
        }
        async fn get_by_code(&self, code: &str) -> AppResult<Option<Product>> {
            self.inner.get_by_code(code).await
        }
        async fn get_all(&self) -> AppResult<Vec<Product>> {
            self.inner.get_all().await
        }
        async fn get_by_category(&self, category: &str) -> AppResult<Vec<Product>> {
            self.inner.get_by_category(category).await
        }
        async fn sku_ids(&self) -> AppResult<Vec<String>> {
            self.inner.sku_ids().await
        }
        async fn update(&self, product: &Product) -> AppResult<Product> {
            let interfere = self
                .pending
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if interfere {
                if let Some(mut other) = self.inner.get_by_id(product.id).await? {
                    other.stock.actual_stock += 100;
                    self.inner.update(&other).await?;
                }
            }
            self.inner.update(product).await
        }
        async fn delete(&self, id: Uuid) -> AppResult<bool> {
            self.inner.delete(id).await
        }
        async fn count(&self) -> AppResult<i64> {
            self.inner.count().await
        }
    }

    /// Audit store that is always down
    struct OfflineAudit;

    #[async_trait]
    impl StockAdjustmentRepository for OfflineAudit {
        async fn create(&self, _adjustment: &StockAdjustment) -> AppResult<()> {
            Err(AppError::StorageError("audit store offline".into()))
        }
        async fn get_by_id(&self, _id: Uuid) -> AppResult<Option<StockAdjustment>> {
            Ok(None)
        }
        async fn by_product(
            &self,
            _product_id: &str,
            _range: Option<DateRange>,
            _limit: i64,
        ) -> AppResult<Vec<StockAdjustment>> {
            Ok(Vec::new())
        }
        async fn all(&self, _paging: Paging) -> AppResult<Vec<StockAdjustment>> {
            Ok(Vec::new())
        }
        async fn by_source(
            &self,
            _source_type: SourceType,
            _source_id: &str,
        ) -> AppResult<Vec<StockAdjustment>> {
            Ok(Vec::new())
        }
        async fn delete(&self, _id: Uuid) -> AppResult<bool> {
            Ok(false)
        }
    }

    async fn seed(repos: &Repositories) -> shared::Product {
        ProductService::new(repos.clone(), Arc::new(Catalog::default()))
            .create(ProductRequest {
                name: "เทปใส".into(),
                category: "Tape".into(),
                size: "2 inch".into(),
                color: "Clear".into(),
                ..Default::default()
            })
            .await
            .unwrap()
    }

    fn adjustment(kind: &str, stock_type: &str, quantity: i32) -> StockAdjustmentRequest {
        StockAdjustmentRequest {
            adjustment_type: kind.into(),
            stock_type: stock_type.into(),
            quantity,
            notes: Some("นับสต็อก".into()),
        }
    }

    #[tokio::test]
    async fn test_adjust_records_before_and_after() {
        let repos = Repositories::memory();
        let product = seed(&repos).await;
        let service = StockService::new(repos.clone());

        let updated = service
            .adjust(&product.sku_id, adjustment("add", "vat", 12))
            .await
            .unwrap();
        assert_eq!(updated.stock.vat.remaining, 12);
        assert_eq!(updated.stock.actual_stock, 12);
        assert_eq!(updated.version, product.version + 1);

        let history = service
            .history(&product.id.to_string(), &HistoryQuery::default())
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
        let record = &history[0];
        assert_eq!(record.source_type, SourceType::Adjustment);
        assert_eq!(record.before_vat_remaining, 0);
        assert_eq!(record.after_vat_remaining, 12);
        assert_eq!(record.after_actual_stock, 12);
        assert_eq!(record.notes.as_deref(), Some("นับสต็อก"));
    }

    #[tokio::test]
    async fn test_adjust_rejects_bad_input() {
        let repos = Repositories::memory();
        let product = seed(&repos).await;
        let service = StockService::new(repos);

        let zero = service.adjust(&product.sku_id, adjustment("add", "vat", 0)).await;
        assert!(matches!(zero, Err(AppError::Validation(_))));

        let bad_type = service.adjust(&product.sku_id, adjustment("remove", "vat", 1)).await;
        assert!(matches!(bad_type, Err(AppError::Validation(_))));

        let bad_stock = service.adjust(&product.sku_id, adjustment("add", "box", 1)).await;
        assert!(matches!(bad_stock, Err(AppError::Validation(_))));

        let missing = service.adjust("NOPE-0001", adjustment("add", "vat", 1)).await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_reverse_applies_on_current_state_and_drops_record() {
        let repos = Repositories::memory();
        let product = seed(&repos).await;
        let service = StockService::new(repos.clone());

        service
            .adjust(&product.sku_id, adjustment("add", "nonvat", 10))
            .await
            .unwrap();
        service
            .adjust(&product.sku_id, adjustment("reduce", "nonvat", 4))
            .await
            .unwrap();

        let all = service.all_history(Paging::default()).await.unwrap();
        let add = all
            .iter()
            .find(|a| a.adjustment_type == shared::AdjustmentType::Add)
            .unwrap();

        let reversed = service.reverse(add.id).await.unwrap();
        assert_eq!(reversed.stock.non_vat.remaining, -4);
        assert_eq!(reversed.stock.actual_stock, -4);
        assert_eq!(reversed.stock.non_vat.sold, 14);

        assert_eq!(service.all_history(Paging::default()).await.unwrap().len(), 1);
        assert!(matches!(
            service.reverse(add.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_history_by_source_requires_both_keys() {
        let repos = Repositories::memory();
        let service = StockService::new(repos);

        let missing = service
            .history_by_source(&SourceQuery {
                source_type: Some("purchase".into()),
                source_id: None,
            })
            .await;
        assert!(matches!(missing, Err(AppError::Validation(_))));

        let invalid = service
            .history_by_source(&SourceQuery {
                source_type: Some("gift".into()),
                source_id: Some("x".into()),
            })
            .await;
        assert!(matches!(invalid, Err(AppError::Validation(_))));

        let empty = service
            .history_by_source(&SourceQuery {
                source_type: Some("sale".into()),
                source_id: Some("nothing".into()),
            })
            .await
            .unwrap();
        assert!(empty.is_empty());
    }

    #[tokio::test]
    async fn test_history_limit_and_range() {
        let repos = Repositories::memory();
        let product = seed(&repos).await;
        let service = StockService::new(repos);

        for _ in 0..3 {
            service
                .adjust(&product.sku_id, adjustment("add", "actualstock", 1))
                .await
                .unwrap();
        }

        let limited = service
            .history(
                &product.sku_id,
                &HistoryQuery {
                    limit: Some(2),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(limited.len(), 2);

        let before_records = service
            .history(
                &product.sku_id,
                &HistoryQuery {
                    end_date: Some("2001-01-01".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(before_records.is_empty());
    }

    #[tokio::test]
    async fn test_overflowing_adjustment_is_rejected_without_writing() {
        let repos = Repositories::memory();
        let product = seed(&repos).await;
        let mut stock = product.stock;
        stock.vat.remaining = i32::MAX - 10;
        stock.actual_stock = i32::MAX - 10;
        ProductService::new(repos.clone(), Arc::new(Catalog::default()))
            .update_stock(&product.sku_id, stock)
            .await
            .unwrap();
        let service = StockService::new(repos.clone());

        let result = service.adjust(&product.sku_id, adjustment("add", "vat", 11)).await;
        assert!(matches!(result, Err(AppError::Validation(_))));

        let stored = repos.products.get_by_id(product.id).await.unwrap().unwrap();
        assert_eq!(stored.stock.vat.remaining, i32::MAX - 10);
        assert!(service.all_history(Paging::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stale_version_is_a_conflict() {
        let repos = Repositories::memory();
        let product = seed(&repos).await;

        let mut fresh = product.clone();
        fresh.stock.actual_stock = 5;
        repos.products.update(&fresh).await.unwrap();

        let mut stale = product.clone();
        stale.stock.actual_stock = 9;
        let result = repos.products.update(&stale).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));

        let stored = repos.products.get_by_id(product.id).await.unwrap().unwrap();
        assert_eq!(stored.stock.actual_stock, 5);
        assert_eq!(stored.version, product.version + 1);
    }

    #[tokio::test]
    async fn test_conflicting_write_is_reapplied_on_fresh_state() {
        let mut repos = Repositories::memory();
        let contended = ContendedProducts::wrap(&mut repos);
        let product = seed(&repos).await;

        contended.interfere(MAX_WRITE_ATTEMPTS - 1);
        let mut calls = 0;
        let (stored, ()) = mutate_product(repos.products.as_ref(), product.id, |p| {
            calls += 1;
            p.stock.actual_stock += 1;
            Ok(())
        })
        .await
        .unwrap();

        assert_eq!(calls, MAX_WRITE_ATTEMPTS);
        // both interfering writes survive and ours lands once on top of them
        assert_eq!(stored.stock.actual_stock, 201);
    }

    #[tokio::test]
    async fn test_adjustment_survives_contention() {
        let mut repos = Repositories::memory();
        let contended = ContendedProducts::wrap(&mut repos);
        let product = seed(&repos).await;
        let service = StockService::new(repos.clone());

        contended.interfere(2);
        let updated = service
            .adjust(&product.sku_id, adjustment("add", "vat", 5))
            .await
            .unwrap();
        assert_eq!(updated.stock.vat.remaining, 5);
        assert_eq!(updated.stock.actual_stock, 205);

        let history = service.all_history(Paging::default()).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].before_actual_stock, 200);
    }

    #[tokio::test]
    async fn test_conflict_after_three_attempts() {
        let mut repos = Repositories::memory();
        let contended = ContendedProducts::wrap(&mut repos);
        let product = seed(&repos).await;
        let service = StockService::new(repos.clone());

        contended.interfere(MAX_WRITE_ATTEMPTS);
        let result = service.adjust(&product.sku_id, adjustment("add", "vat", 5)).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));

        let stored = repos.products.get_by_id(product.id).await.unwrap().unwrap();
        assert_eq!(stored.stock.vat.remaining, 0);
        assert_eq!(stored.stock.actual_stock, 300);
        assert!(service.all_history(Paging::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_audit_failure_does_not_fail_adjustment() {
        let mut repos = Repositories::memory();
        repos.adjustments = Arc::new(OfflineAudit);
        let product = seed(&repos).await;

        let updated = StockService::new(repos.clone())
            .adjust(&product.sku_id, adjustment("add", "nonvat", 3))
            .await
            .unwrap();
        assert_eq!(updated.stock.non_vat.remaining, 3);

        let stored = repos.products.get_by_id(product.id).await.unwrap().unwrap();
        assert_eq!(stored.stock.non_vat.remaining, 3);
        assert_eq!(stored.stock.actual_stock, 3);
    }

    #[tokio::test]
    async fn test_audit_failure_does_not_fail_purchase() {
        let mut repos = Repositories::memory();
        repos.adjustments = Arc::new(OfflineAudit);
        let product = seed(&repos).await;
        let customer = CustomerService::new(repos.clone())
            .create(CustomerRequest {
                company_name: "บริษัท เทปดี จำกัด".into(),
                ..Default::default()
            })
            .await
            .unwrap();

        let request: PurchaseRequest = serde_json::from_value(serde_json::json!({
            "purchaseDate": "2024-03-15",
            "customerId": customer.id.to_string(),
            "items": [{
                "productId": product.id.to_string(),
                "quantity": 6,
                "unitPrice": 25,
                "totalPrice": 150,
            }],
            "isVAT": true,
        }))
        .unwrap();
        let purchase = PurchaseService::new(repos.clone(), Arc::new(Catalog::default()))
            .create(request)
            .await
            .unwrap();
        assert!(purchase.purchase_code.starts_with("PUR-VAT-"));

        let stored = repos.products.get_by_id(product.id).await.unwrap().unwrap();
        assert_eq!(stored.stock.vat.remaining, 6);
        assert_eq!(stored.price.purchase_vat.latest, 25.0);
    }
}
