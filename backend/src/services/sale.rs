//! Sale orchestration

use chrono::Utc;
use shared::{
    format_sequence_code, next_sequence_number, Catalog, Sale, SaleItem, SaleRequest,
    SourceType, TransactionKind,
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
pub struct SaleService {
    repos: Repositories,
    catalog: Arc<Catalog>,
}

impl SaleService {
    pub fn new(repos: Repositories, catalog: Arc<Catalog>) -> Self {
        Self { repos, catalog }
    }

    /// `INV-YYMM-NNNN` / `NV-YYMM-NNNN` for the current month
    pub async fn generate_code(&self, is_vat: bool) -> AppResult<String> {
        let prefix = TransactionKind::Sale.prefix(is_vat, &today());
        let codes = self.repos.sales.codes_with_prefix(&prefix).await?;
        let sequence = next_sequence_number(TransactionKind::Sale, &prefix, &codes);
        Ok(format_sequence_code(&prefix, sequence))
    }

    /// Every line must reference an existing product
    async fn require_products(&self, items: &[SaleItem]) -> AppResult<Vec<Uuid>> {
        let mut ids = Vec::with_capacity(items.len());
        for item in items {
            let missing = || AppError::validation(format!("Product not found: {}", item.product_id));
            let id = Uuid::parse_str(&item.product_id).map_err(|_| missing())?;
            if self.repos.products.get_by_id(id).await?.is_none() {
                return Err(missing());
            }
            ids.push(id);
        }
        Ok(ids)
    }

    /// Take the stock of every line and record the sale prices, then store the sale
    ///
    /// A failed line puts back the stock of the lines already posted and drops their
    /// audit records, so a failed create leaves no sale and no stock taken. Price
    /// statistics already folded in are not unwound.
    #[tracing::instrument(skip(self, request), fields(customer_id = %request.customer_id))]
    pub async fn create(&self, request: SaleRequest) -> AppResult<Sale> {
        request.validate()?;

        let snapshot = lookup_customer(self.repos.customers.as_ref(), &request.customer_id)
            .await?
            .map(|c| customer_snapshot(&c))
            .unwrap_or_default();
        let product_ids = self.require_products(&request.items).await?;

        let mut attempt = 0;
        let sale = loop {
            attempt += 1;
            let code = self.generate_code(request.is_vat).await?;
            let sale = Sale::from_request(request.clone(), code, snapshot.clone(), Utc::now());
            self.post_lines(&sale, &product_ids).await?;

            match self.repos.sales.create(&sale).await {
                Ok(()) => break sale,
                Err(e) => {
                    self.undo_lines(&sale, &product_ids).await;
                    match e {
                        AppError::DuplicateEntry(what) if attempt < MAX_WRITE_ATTEMPTS => {
                            tracing::warn!("Sale code collision on {}, regenerating", what);
                        }
                        e => return Err(e),
                    }
                }
            }
        };

        if let Some(quotation_code) = sale.quotation_code.as_deref().filter(|c| !c.is_empty()) {
            if let Err(e) = self.link_quotation(quotation_code, &sale.sale_code).await {
                tracing::warn!(
                    "Failed to update quotation {} with sale code {}: {}",
                    quotation_code,
                    sale.sale_code,
                    e
                );
            }
        }

        tracing::info!(code = %sale.sale_code, items = sale.items.len(), "Sale created");
        Ok(sale)
    }

    /// Post every line of `sale`; on failure the posted lines are undone first
    async fn post_lines(&self, sale: &Sale, product_ids: &[Uuid]) -> AppResult<()> {
        let stock = StockService::new(self.repos.clone());
        for (posted, (item, product_id)) in sale.items.iter().zip(product_ids).enumerate() {
            let posting = Posting::sale(
                sale.is_vat,
                item.quantity,
                as_price(item.unit_price),
                sale.id,
                &sale.sale_code,
            );
            if let Err(e) = stock.post(*product_id, &posting).await {
                self.undo_lines(sale, &product_ids[..posted]).await;
                return Err(e);
            }
        }
        Ok(())
    }

    /// Put back the stock of the first `product_ids.len()` lines and drop their audit records
    async fn undo_lines(&self, sale: &Sale, product_ids: &[Uuid]) {
        let stock = StockService::new(self.repos.clone());
        for (item, product_id) in sale.items.iter().zip(product_ids) {
            let posting = Posting::restore_sale(sale.is_vat, item.quantity);
            if let Err(e) = stock.post(*product_id, &posting).await {
                tracing::error!(
                    %product_id,
                    code = %sale.sale_code,
                    "Failed to put back stock of an unsaved sale: {}",
                    e
                );
            }
        }

        let records = match self
            .repos
            .adjustments
            .by_source(SourceType::Sale, &sale.id.to_string())
            .await
        {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(code = %sale.sale_code, "Failed to load sale history: {}", e);
                return;
            }
        };
        for record in records {
            if let Err(e) = self.repos.adjustments.delete(record.id).await {
                tracing::warn!(code = %sale.sale_code, "Failed to drop stock change history: {}", e);
            }
        }
    }

    async fn link_quotation(&self, quotation_code: &str, sale_code: &str) -> AppResult<()> {
        let mut quotation = self
            .repos
            .quotations
            .get_by_code(quotation_code)
            .await?
            .ok_or_else(|| AppError::NotFound("Quotation".to_string()))?;
        quotation.sale_code = Some(sale_code.to_string());
        quotation.updated_at = Utc::now();
        self.repos.quotations.update(&quotation).await
    }

    /// Put back the stock of every line; a missing product is skipped
    async fn restore_stock(&self, sale: &Sale) {
        let stock = StockService::new(self.repos.clone());
        for item in &sale.items {
            let Ok(product_id) = Uuid::parse_str(&item.product_id) else {
                continue;
            };
            let posting = Posting::restore_sale(sale.is_vat, item.quantity);
            if let Err(e) = stock.post(product_id, &posting).await {
                tracing::warn!(
                    product_id = %item.product_id,
                    code = %sale.sale_code,
                    "Failed to restore stock: {}",
                    e
                );
            }
        }
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Sale> {
        let mut sale = self
            .repos
            .sales
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Sale".to_string()))?;
        let customer = lookup_customer(self.repos.customers.as_ref(), &sale.customer_id).await?;
        enrich_transaction(&mut sale.customer, &mut sale.payment, customer.as_ref(), &self.catalog);
        Ok(sale)
    }

    pub async fn list(&self) -> AppResult<Vec<Sale>> {
        let customers = customers_by_id(self.repos.customers.as_ref()).await?;
        let mut sales = self.repos.sales.get_all().await?;
        for sale in &mut sales {
            enrich_transaction(
                &mut sale.customer,
                &mut sale.payment,
                customers.get(&sale.customer_id),
                &self.catalog,
            );
        }
        Ok(sales)
    }

    /// Restore the old lines, apply the request and take stock for the new lines
    ///
    /// Price statistics are not touched and no audit records are written.
    #[tracing::instrument(skip(self, request))]
    pub async fn update(&self, id: Uuid, request: SaleRequest) -> AppResult<Sale> {
        request.validate()?;

        let mut sale = self
            .repos
            .sales
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Sale".to_string()))?;

        self.restore_stock(&sale).await;

        sale.apply_request(request, Utc::now());
        if let Some(customer) =
            lookup_customer(self.repos.customers.as_ref(), &sale.customer_id).await?
        {
            sale.customer = customer_snapshot(&customer);
        }

        let product_ids = self.require_products(&sale.items).await?;
        let stock = StockService::new(self.repos.clone());
        for (item, product_id) in sale.items.iter().zip(product_ids) {
            stock
                .post(product_id, &Posting::resell(sale.is_vat, item.quantity))
                .await?;
        }

        self.repos.sales.update(&sale).await?;
        Ok(sale)
    }

    /// Restore the stock of every line, then delete
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let sale = self
            .repos
            .sales
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Sale".to_string()))?;

        self.restore_stock(&sale).await;
        self.repos.sales.delete(id).await?;
        tracing::info!(code = %sale.sale_code, "Sale deleted");
        Ok(())
    }
}
