//! Product catalogue service: CRUD, stock/price replacement, inventory views and images

use chrono::Utc;
use serde::Serialize;
use shared::{
    Catalog, InventorySummary, Price, Product, ProductCodeGenerator, ProductRequest,
    SkuGenerator, StandardCodeGenerator, Stock, LOW_STOCK_THRESHOLD,
};
use std::sync::Arc;
use validator::Validate;

use super::image::ImageStore;
use super::{mutate_product, require_product, MAX_WRITE_ATTEMPTS};
use crate::error::{AppError, AppResult};
use crate::repositories::Repositories;

/// Payload encoded into a product QR code
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QrCodeData {
    pub qr_code_data: String,
    pub sku_id: String,
    pub product_id: String,
    pub product_name: String,
    pub product_code: String,
}

/// Result of an image upload or removal
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageResponse {
    pub success: bool,
    pub message: String,
    pub image_url: Option<String>,
}

#[derive(Clone)]
pub struct ProductService {
    repos: Repositories,
    catalog: Arc<Catalog>,
}

impl ProductService {
    pub fn new(repos: Repositories, catalog: Arc<Catalog>) -> Self {
        Self { repos, catalog }
    }

    /// Create a product with a fresh SKU and standard product code
    #[tracing::instrument(skip(self, request), fields(category = %request.category))]
    pub async fn create(&self, request: ProductRequest) -> AppResult<Product> {
        request.validate()?;

        let skus = SkuGenerator::new(&self.catalog);
        let code = StandardCodeGenerator::new(&self.catalog).product_code(
            &request.category,
            &request.size,
            &request.color,
        );

        let mut attempt = 0;
        loop {
            attempt += 1;
            let existing = self.repos.products.sku_ids().await?;
            let last = skus.next_sku_number(&request.category, &existing);
            let sku_id = skus.generate_sku_id(&request.category, last);

            let product = Product::from_request(request.clone(), sku_id, code.clone(), Utc::now());
            match self.repos.products.create(&product).await {
                Ok(()) => {
                    tracing::info!(sku_id = %product.sku_id, code = %product.code, "Product created");
                    return Ok(product);
                }
                Err(AppError::DuplicateEntry(what)) if attempt < MAX_WRITE_ATTEMPTS => {
                    tracing::warn!("SKU collision on {}, regenerating", what);
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Get by id or SKU
    pub async fn get(&self, key: &str) -> AppResult<Product> {
        require_product(self.repos.products.as_ref(), key).await
    }

    pub async fn list(&self) -> AppResult<Vec<Product>> {
        self.repos.products.get_all().await
    }

    /// Replace descriptive, price and stock fields; SKU and code are kept
    pub async fn update(&self, key: &str, request: ProductRequest) -> AppResult<Product> {
        request.validate()?;
        let existing = self.get(key).await?;
        let (product, ()) = mutate_product(self.repos.products.as_ref(), existing.id, |p| {
            p.apply_request(request.clone(), Utc::now());
            Ok(())
        })
        .await?;
        Ok(product)
    }

    pub async fn delete(&self, key: &str) -> AppResult<()> {
        let existing = self.get(key).await?;
        if !self.repos.products.delete(existing.id).await? {
            return Err(AppError::NotFound("Product".to_string()));
        }
        tracing::info!(sku_id = %existing.sku_id, "Product deleted");
        Ok(())
    }

    pub async fn update_stock(&self, key: &str, stock: Stock) -> AppResult<Product> {
        let existing = self.get(key).await?;
        let (product, ()) = mutate_product(self.repos.products.as_ref(), existing.id, |p| {
            p.stock = stock;
            p.updated_at = Utc::now();
            Ok(())
        })
        .await?;
        Ok(product)
    }

    pub async fn update_price(&self, key: &str, price: Price) -> AppResult<Product> {
        let existing = self.get(key).await?;
        let (product, ()) = mutate_product(self.repos.products.as_ref(), existing.id, |p| {
            p.price = price.clone();
            p.updated_at = Utc::now();
            Ok(())
        })
        .await?;
        Ok(product)
    }

    pub async fn by_category(&self, category: &str) -> AppResult<Vec<Product>> {
        self.repos.products.get_by_category(category).await
    }

    /// Distinct categories in use, sorted
    pub async fn categories(&self) -> AppResult<Vec<String>> {
        let mut categories: Vec<String> = self
            .repos
            .products
            .get_all()
            .await?
            .into_iter()
            .map(|p| p.category)
            .collect();
        categories.sort();
        categories.dedup();
        Ok(categories)
    }

    /// Products whose actual stock is at or below `threshold` (default 10)
    pub async fn low_stock(&self, threshold: Option<i32>) -> AppResult<Vec<Product>> {
        let threshold = threshold.unwrap_or(LOW_STOCK_THRESHOLD);
        Ok(self
            .repos
            .products
            .get_all()
            .await?
            .into_iter()
            .filter(|p| p.stock.actual_stock <= threshold)
            .collect())
    }

    pub async fn inventory_summary(&self) -> AppResult<InventorySummary> {
        let products = self.repos.products.get_all().await?;
        Ok(InventorySummary::from_products(products))
    }

    pub async fn qr_data(&self, key: &str, base_url: &str) -> AppResult<QrCodeData> {
        let product = self.get(key).await?;
        Ok(QrCodeData {
            qr_code_data: format!("{}/product/{}", base_url.trim_end_matches('/'), product.sku_id),
            sku_id: product.sku_id,
            product_id: product.id.to_string(),
            product_name: product.name,
            product_code: product.code,
        })
    }

    /// Store a new image for the product and point `imageUrl` at it
    ///
    /// The previous file is removed best-effort; if the product write fails the new file
    /// is removed again.
    #[tracing::instrument(skip(self, store, bytes), fields(size = bytes.len()))]
    pub async fn upload_image(
        &self,
        key: &str,
        store: &ImageStore,
        filename: &str,
        bytes: &[u8],
    ) -> AppResult<ImageResponse> {
        store.check(bytes)?;
        let product = self.get(key).await?;

        let image_url = store.save(&product.id.to_string(), filename, bytes).await?;

        if let Some(old) = product.image_url.as_deref().filter(|u| !u.is_empty()) {
            store.remove(old).await;
        }

        let url = image_url.clone();
        let written = mutate_product(self.repos.products.as_ref(), product.id, move |p| {
            p.image_url = Some(url.clone());
            p.updated_at = Utc::now();
            Ok(())
        })
        .await;

        if let Err(e) = written {
            store.remove(&image_url).await;
            return Err(e);
        }

        Ok(ImageResponse {
            success: true,
            message: "Image uploaded successfully".to_string(),
            image_url: Some(image_url),
        })
    }

    pub async fn delete_image(&self, key: &str, store: &ImageStore) -> AppResult<ImageResponse> {
        let product = self.get(key).await?;
        let Some(old) = product.image_url.clone().filter(|u| !u.is_empty()) else {
            return Err(AppError::validation("Product has no image to delete"));
        };

        store.remove(&old).await;

        mutate_product(self.repos.products.as_ref(), product.id, |p| {
            p.image_url = None;
            p.updated_at = Utc::now();
            Ok(())
        })
        .await?;

        Ok(ImageResponse {
            success: true,
            message: "Image deleted successfully".to_string(),
            image_url: None,
        })
    }
}
