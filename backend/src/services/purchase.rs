//! Purchase orchestration
//!
//! A purchase is stored first; the price and stock postings of its lines follow and a
//! failing line is logged and skipped, never failing the purchase.

use chrono::Utc;
use shared::{
    format_sequence_code, next_sequence_number, Catalog, Purchase, PurchaseRequest,
    TransactionKind,
};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use super::stock::{Posting, StockService};
use super::{
    as_price, customers_by_id, customer_snapshot, enrich_transaction, lookup_customer, today,
    MAX_WRITE_ATTEMPTS,
};
use crate::error::{AppError, AppResult};
use crate::repositories::Repositories;

#[derive(Clone)]
pub struct PurchaseService {
    repos: Repositories,
    catalog: Arc<Catalog>,
}

impl PurchaseService {
    pub fn new(repos: Repositories, catalog: Arc<Catalog>) -> Self {
        Self { repos, catalog }
    }

    /// `PUR-VAT-YYMM-NNNN` / `PUR-NV-YYMM-NNNN` for the current month
    pub async fn generate_code(&self, is_vat: bool) -> AppResult<String> {
        let prefix = TransactionKind::Purchase.prefix(is_vat, &today());
        let codes = self.repos.purchases.codes_with_prefix(&prefix).await?;
        let sequence = next_sequence_number(TransactionKind::Purchase, &prefix, &codes);
        Ok(format_sequence_code(&prefix, sequence))
    }

    #[tracing::instrument(skip(self, request), fields(customer_id = %request.customer_id))]
    pub async fn create(&self, request: PurchaseRequest) -> AppResult<Purchase> {
        request.validate()?;

        let customer = lookup_customer(self.repos.customers.as_ref(), &request.customer_id)
            .await?
            .ok_or_else(|| AppError::validation("Customer not found"))?;
        let snapshot = customer_snapshot(&customer);

        let mut attempt = 0;
        let purchase = loop {
            attempt += 1;
            let code = self.generate_code(request.is_vat).await?;
            let purchase =
                Purchase::from_request(request.clone(), code, snapshot.clone(), Utc::now());
            match self.repos.purchases.create(&purchase).await {
                Ok(()) => break purchase,
                Err(AppError::DuplicateEntry(what)) if attempt < MAX_WRITE_ATTEMPTS => {
                    tracing::warn!("Purchase code collision on {}, regenerating", what);
                }
                Err(e) => return Err(e),
            }
        };

        tracing::info!(code = %purchase.purchase_code, items = purchase.items.len(), "Purchase created");
        self.post_items(&purchase).await;

        Ok(purchase)
    }

    /// Price and stock postings for every line, best-effort
    async fn post_items(&self, purchase: &Purchase) {
        let stock = StockService::new(self.repos.clone());

        for item in &purchase.items {
            let Ok(product_id) = Uuid::parse_str(&item.product_id) else {
                tracing::warn!(product_id = %item.product_id, "Skipping purchase line with invalid product id");
                continue;
            };
            let posting = Posting::purchase(
                purchase.is_vat,
                item.quantity,
                as_price(item.unit_price),
                purchase.id,
                &purchase.purchase_code,
            );
            if let Err(e) = stock.post(product_id, &posting).await {
                tracing::warn!(
                    product_id = %item.product_id,
                    code = %purchase.purchase_code,
                    "Failed to update product from purchase: {}",
                    e
                );
            }
        }
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Purchase> {
        let mut purchase = self
            .repos
            .purchases
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Purchase".to_string()))?;
        let customer = lookup_customer(self.repos.customers.as_ref(), &purchase.customer_id).await?;
        enrich_transaction(
            &mut purchase.customer,
            &mut purchase.payment,
            customer.as_ref(),
            &self.catalog,
        );
        Ok(purchase)
    }

    pub async fn list(&self) -> AppResult<Vec<Purchase>> {
        let customers = customers_by_id(self.repos.customers.as_ref()).await?;
        let mut purchases = self.repos.purchases.get_all().await?;
        for purchase in &mut purchases {
            enrich_transaction(
                &mut purchase.customer,
                &mut purchase.payment,
                customers.get(&purchase.customer_id),
                &self.catalog,
            );
        }
        Ok(purchases)
    }

    /// Replace the purchase and post its lines again
    ///
    /// The lines of the previous version are not reversed.
    #[tracing::instrument(skip(self, request))]
    pub async fn update(&self, id: Uuid, request: PurchaseRequest) -> AppResult<Purchase> {
        request.validate()?;

        let mut purchase = self
            .repos
            .purchases
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Purchase".to_string()))?;
        let customer = lookup_customer(self.repos.customers.as_ref(), &request.customer_id)
            .await?
            .ok_or_else(|| AppError::validation("Customer not found"))?;

        purchase.apply_request(request, Utc::now());
        purchase.customer = customer_snapshot(&customer);
        self.repos.purchases.update(&purchase).await?;

        self.post_items(&purchase).await;
        Ok(purchase)
    }

    /// Delete the purchase record; product stock is left as is
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        if !self.repos.purchases.delete(id).await? {
            return Err(AppError::NotFound("Purchase".to_string()));
        }
        tracing::info!(%id, "Purchase deleted");
        Ok(())
    }
}
