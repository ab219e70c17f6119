//! Business logic services for the Goodpack inventory server
//!
//! Services are constructed per request from `AppState` and orchestrate the shared
//! ledger and code generators over the repositories.

pub mod customer;
pub mod image;
pub mod migration;
pub mod product;
pub mod purchase;
pub mod quotation;
pub mod sale;
pub mod stock;

pub use customer::CustomerService;
pub use migration::MigrationService;
pub use product::ProductService;
pub use purchase::PurchaseService;
pub use quotation::QuotationService;
pub use sale::SaleService;
pub use stock::StockService;

use chrono::{Local, NaiveDate};
use rust_decimal::{prelude::ToPrimitive, Decimal};
use shared::{Catalog, Customer, CustomerSnapshot, PaymentInfo, Product, StockAdjustment};
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::repositories::{CustomerRepository, ProductRepository, StockAdjustmentRepository};

/// Attempts for a product write or a code insert before the error is returned
pub const MAX_WRITE_ATTEMPTS: usize = 3;

/// Calendar date used for codes and price periods
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Find a product by id, falling back to SKU
pub async fn find_product(
    products: &dyn ProductRepository,
    key: &str,
) -> AppResult<Option<Product>> {
    if let Ok(id) = Uuid::parse_str(key) {
        if let Some(product) = products.get_by_id(id).await? {
            return Ok(Some(product));
        }
    }
    products.get_by_sku(key).await
}

/// Like [`find_product`] but a missing product is `NotFound`
pub async fn require_product(products: &dyn ProductRepository, key: &str) -> AppResult<Product> {
    find_product(products, key)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))
}

/// Load `id`, apply `mutate` and write it back
///
/// A version conflict reloads the product and applies `mutate` again on the fresh state.
/// An error from `mutate` is returned without writing.
pub async fn mutate_product<F, T>(
    products: &dyn ProductRepository,
    id: Uuid,
    mut mutate: F,
) -> AppResult<(Product, T)>
where
    F: FnMut(&mut Product) -> AppResult<T> + Send,
    T: Send,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        let mut product = products
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        let output = mutate(&mut product)?;

        match products.update(&product).await {
            Ok(stored) => return Ok((stored, output)),
            Err(AppError::Conflict(reason)) if attempt < MAX_WRITE_ATTEMPTS => {
                tracing::debug!(%id, attempt, "Retrying product write: {}", reason);
            }
            Err(e) => return Err(e),
        }
    }
}

/// Persist an audit record; failure is logged and swallowed
pub async fn record_adjustment(
    adjustments: &dyn StockAdjustmentRepository,
    adjustment: &StockAdjustment,
) {
    if let Err(e) = adjustments.create(adjustment).await {
        tracing::warn!(
            product_id = %adjustment.product_id,
            source = adjustment.source_type.as_str(),
            "Failed to record stock change history: {}",
            e
        );
    }
}

/// Customer details for a transaction; company name falls back to the contact name
pub fn customer_snapshot(customer: &Customer) -> CustomerSnapshot {
    let mut snapshot = CustomerSnapshot::from(customer);
    if snapshot.customer_name.is_empty() {
        snapshot.customer_name = customer.contact_name.clone();
    }
    snapshot
}

/// Decimal money handed to the price ledger
pub fn as_price(value: Decimal) -> f64 {
    value.to_f64().unwrap_or_default()
}

/// Refresh the customer snapshot and resolve `ourAccount` against the catalog
pub fn enrich_transaction(
    snapshot: &mut CustomerSnapshot,
    payment: &mut PaymentInfo,
    customer: Option<&Customer>,
    catalog: &Catalog,
) {
    if let Some(customer) = customer {
        *snapshot = customer_snapshot(customer);
    }
    if let Some(account) = payment
        .our_account
        .as_deref()
        .filter(|a| !a.is_empty())
        .and_then(|a| catalog.find_account(a))
    {
        payment.our_account_info = Some(account.clone());
    }
}

/// Parse a transaction's customer id; anything unparsable resolves to no customer
pub async fn lookup_customer(
    customers: &dyn CustomerRepository,
    customer_id: &str,
) -> AppResult<Option<Customer>> {
    match Uuid::parse_str(customer_id) {
        Ok(id) => customers.get_by_id(id).await,
        Err(_) => Ok(None),
    }
}

/// All customers keyed by id, for enriching lists
pub async fn customers_by_id(
    customers: &dyn CustomerRepository,
) -> AppResult<HashMap<String, Customer>> {
    Ok(customers
        .get_all()
        .await?
        .into_iter()
        .map(|c| (c.id.to_string(), c))
        .collect())
}
