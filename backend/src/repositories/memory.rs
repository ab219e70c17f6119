//! In-memory store used by tests and the `memory` database backend

use async_trait::async_trait;
use shared::{
    Customer, DateRange, Paging, Product, Purchase, Quotation, Sale, SourceType, StockAdjustment,
};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    CustomerRepository, ProductRepository, PurchaseRepository, QuotationRepository,
    SaleRepository, StockAdjustmentRepository,
};
use crate::error::{AppError, AppResult};

/// Collections kept in insertion order
#[derive(Default)]
pub struct MemoryStore {
    products: RwLock<Vec<Product>>,
    customers: RwLock<Vec<Customer>>,
    purchases: RwLock<Vec<Purchase>>,
    sales: RwLock<Vec<Sale>>,
    quotations: RwLock<Vec<Quotation>>,
    adjustments: RwLock<Vec<StockAdjustment>>,
}

fn remove_where<T>(items: &mut Vec<T>, pred: impl Fn(&T) -> bool) -> bool {
    let before = items.len();
    items.retain(|item| !pred(item));
    items.len() != before
}

fn replace_where<T: Clone>(items: &mut [T], value: &T, pred: impl Fn(&T) -> bool) -> bool {
    match items.iter_mut().find(|item| pred(item)) {
        Some(slot) => {
            *slot = value.clone();
            true
        }
        None => false,
    }
}

fn matching_codes<'a>(codes: impl Iterator<Item = &'a str>, prefix: &str) -> Vec<String> {
    let prefix = prefix.to_lowercase();
    codes
        .filter(|code| code.to_lowercase().starts_with(&prefix))
        .map(str::to_string)
        .collect()
}

fn newest_first(mut items: Vec<StockAdjustment>) -> Vec<StockAdjustment> {
    items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    items
}

#[async_trait]
impl ProductRepository for MemoryStore {
    async fn create(&self, product: &Product) -> AppResult<()> {
        let mut products = self.products.write().await;
        if products.iter().any(|p| p.sku_id == product.sku_id) {
            return Err(AppError::DuplicateEntry(format!("skuId {}", product.sku_id)));
        }
        products.push(product.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Product>> {
        Ok(self.products.read().await.iter().find(|p| p.id == id).cloned())
    }

    async fn get_by_sku(&self, sku_id: &str) -> AppResult<Option<Product>> {
        Ok(self
            .products
            .read()
            .await
            .iter()
            .find(|p| p.sku_id == sku_id)
            .cloned())
    }

    async fn get_by_code(&self, code: &str) -> AppResult<Option<Product>> {
        Ok(self
            .products
            .read()
            .await
            .iter()
            .find(|p| p.code == code)
            .cloned())
    }

    async fn get_all(&self) -> AppResult<Vec<Product>> {
        Ok(self.products.read().await.clone())
    }

    async fn get_by_category(&self, category: &str) -> AppResult<Vec<Product>> {
        Ok(self
            .products
            .read()
            .await
            .iter()
            .filter(|p| p.category == category)
            .cloned()
            .collect())
    }

    async fn sku_ids(&self) -> AppResult<Vec<String>> {
        Ok(self
            .products
            .read()
            .await
            .iter()
            .map(|p| p.sku_id.clone())
            .collect())
    }

    async fn update(&self, product: &Product) -> AppResult<Product> {
        let mut products = self.products.write().await;
        let slot = products
            .iter_mut()
            .find(|p| p.id == product.id)
            .ok_or_else(|| AppError::NotFound("Product".to_string()))?;
        if slot.version != product.version {
            return Err(AppError::Conflict(format!(
                "product {} was modified concurrently",
                product.sku_id
            )));
        }
        let mut stored = product.clone();
        stored.version += 1;
        *slot = stored.clone();
        Ok(stored)
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        Ok(remove_where(&mut *self.products.write().await, |p| p.id == id))
    }

    async fn count(&self) -> AppResult<i64> {
        Ok(self.products.read().await.len() as i64)
    }
}

#[async_trait]
impl CustomerRepository for MemoryStore {
    async fn create(&self, customer: &Customer) -> AppResult<()> {
        let mut customers = self.customers.write().await;
        if customers
            .iter()
            .any(|c| c.customer_code == customer.customer_code)
        {
            return Err(AppError::DuplicateEntry(format!(
                "customerCode {}",
                customer.customer_code
            )));
        }
        customers.push(customer.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Customer>> {
        Ok(self.customers.read().await.iter().find(|c| c.id == id).cloned())
    }

    async fn get_by_code(&self, code: &str) -> AppResult<Option<Customer>> {
        Ok(self
            .customers
            .read()
            .await
            .iter()
            .find(|c| c.customer_code == code)
            .cloned())
    }

    async fn get_all(&self) -> AppResult<Vec<Customer>> {
        Ok(self.customers.read().await.clone())
    }

    async fn customer_codes(&self) -> AppResult<Vec<String>> {
        Ok(self
            .customers
            .read()
            .await
            .iter()
            .map(|c| c.customer_code.clone())
            .collect())
    }

    async fn update(&self, customer: &Customer) -> AppResult<()> {
        let mut customers = self.customers.write().await;
        if !replace_where(&mut customers, customer, |c| c.id == customer.id) {
            return Err(AppError::NotFound("Customer".to_string()));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        Ok(remove_where(&mut *self.customers.write().await, |c| c.id == id))
    }

    async fn count(&self) -> AppResult<i64> {
        Ok(self.customers.read().await.len() as i64)
    }
}

#[async_trait]
impl PurchaseRepository for MemoryStore {
    async fn create(&self, purchase: &Purchase) -> AppResult<()> {
        let mut purchases = self.purchases.write().await;
        if purchases
            .iter()
            .any(|p| p.purchase_code == purchase.purchase_code)
        {
            return Err(AppError::DuplicateEntry(format!(
                "purchaseCode {}",
                purchase.purchase_code
            )));
        }
        purchases.push(purchase.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Purchase>> {
        Ok(self.purchases.read().await.iter().find(|p| p.id == id).cloned())
    }

    async fn get_all(&self) -> AppResult<Vec<Purchase>> {
        Ok(self.purchases.read().await.clone())
    }

    async fn codes_with_prefix(&self, prefix: &str) -> AppResult<Vec<String>> {
        let purchases = self.purchases.read().await;
        Ok(matching_codes(
            purchases.iter().map(|p| p.purchase_code.as_str()),
            prefix,
        ))
    }

    async fn update(&self, purchase: &Purchase) -> AppResult<()> {
        let mut purchases = self.purchases.write().await;
        if !replace_where(&mut purchases, purchase, |p| p.id == purchase.id) {
            return Err(AppError::NotFound("Purchase".to_string()));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        Ok(remove_where(&mut *self.purchases.write().await, |p| p.id == id))
    }
}

#[async_trait]
impl SaleRepository for MemoryStore {
    async fn create(&self, sale: &Sale) -> AppResult<()> {
        let mut sales = self.sales.write().await;
        if sales.iter().any(|s| s.sale_code == sale.sale_code) {
            return Err(AppError::DuplicateEntry(format!("saleCode {}", sale.sale_code)));
        }
        sales.push(sale.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Sale>> {
        Ok(self.sales.read().await.iter().find(|s| s.id == id).cloned())
    }

    async fn get_all(&self) -> AppResult<Vec<Sale>> {
        Ok(self.sales.read().await.clone())
    }

    async fn codes_with_prefix(&self, prefix: &str) -> AppResult<Vec<String>> {
        let sales = self.sales.read().await;
        Ok(matching_codes(sales.iter().map(|s| s.sale_code.as_str()), prefix))
    }

    async fn update(&self, sale: &Sale) -> AppResult<()> {
        let mut sales = self.sales.write().await;
        if !replace_where(&mut sales, sale, |s| s.id == sale.id) {
            return Err(AppError::NotFound("Sale".to_string()));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        Ok(remove_where(&mut *self.sales.write().await, |s| s.id == id))
    }
}

#[async_trait]
impl QuotationRepository for MemoryStore {
    async fn create(&self, quotation: &Quotation) -> AppResult<()> {
        let mut quotations = self.quotations.write().await;
        if quotations
            .iter()
            .any(|q| q.quotation_code == quotation.quotation_code)
        {
            return Err(AppError::DuplicateEntry(format!(
                "quotationCode {}",
                quotation.quotation_code
            )));
        }
        quotations.push(quotation.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Quotation>> {
        Ok(self.quotations.read().await.iter().find(|q| q.id == id).cloned())
    }

    async fn get_by_code(&self, code: &str) -> AppResult<Option<Quotation>> {
        Ok(self
            .quotations
            .read()
            .await
            .iter()
            .find(|q| q.quotation_code == code)
            .cloned())
    }

    async fn get_all(&self) -> AppResult<Vec<Quotation>> {
        Ok(self.quotations.read().await.clone())
    }

    async fn last_quotation_code(&self) -> AppResult<Option<String>> {
        Ok(self
            .quotations
            .read()
            .await
            .iter()
            .map(|q| q.quotation_code.clone())
            .max())
    }

    async fn update(&self, quotation: &Quotation) -> AppResult<()> {
        let mut quotations = self.quotations.write().await;
        if !replace_where(&mut quotations, quotation, |q| q.id == quotation.id) {
            return Err(AppError::NotFound("Quotation".to_string()));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        Ok(remove_where(&mut *self.quotations.write().await, |q| q.id == id))
    }
}

#[async_trait]
impl StockAdjustmentRepository for MemoryStore {
    async fn create(&self, adjustment: &StockAdjustment) -> AppResult<()> {
        self.adjustments.write().await.push(adjustment.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<StockAdjustment>> {
        Ok(self
            .adjustments
            .read()
            .await
            .iter()
            .find(|a| a.id == id)
            .cloned())
    }

    async fn by_product(
        &self,
        product_id: &str,
        range: Option<DateRange>,
        limit: i64,
    ) -> AppResult<Vec<StockAdjustment>> {
        let matching = self
            .adjustments
            .read()
            .await
            .iter()
            .filter(|a| a.product_id == product_id)
            .filter(|a| range.map_or(true, |r| r.contains(a.created_at)))
            .cloned()
            .collect();
        Ok(newest_first(matching)
            .into_iter()
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn all(&self, paging: Paging) -> AppResult<Vec<StockAdjustment>> {
        let all = self.adjustments.read().await.clone();
        Ok(newest_first(all)
            .into_iter()
            .skip(paging.skip.max(0) as usize)
            .take(paging.limit.max(0) as usize)
            .collect())
    }

    async fn by_source(
        &self,
        source_type: SourceType,
        source_id: &str,
    ) -> AppResult<Vec<StockAdjustment>> {
        let matching = self
            .adjustments
            .read()
            .await
            .iter()
            .filter(|a| a.source_type == source_type && a.source_id.as_deref() == Some(source_id))
            .cloned()
            .collect();
        Ok(newest_first(matching))
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        Ok(remove_where(&mut *self.adjustments.write().await, |a| a.id == id))
    }
}
