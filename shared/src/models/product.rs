//! Product, price statistics and stock counters

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Products at or below this actual stock are reported as low stock
pub const LOW_STOCK_THRESHOLD: i32 = 10;

/// Running price statistics for one price bucket
///
/// `min` and `average` use zero as "no observation yet".
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PriceInfo {
    pub latest: f64,
    pub min: f64,
    pub max: f64,
    pub average: f64,
    #[serde(rename = "averageYTD")]
    pub average_ytd: f64,
    #[serde(rename = "averageMTD")]
    pub average_mtd: f64,

    pub ytd_count: i32,
    pub ytd_total: f64,
    pub ytd_year: i32,

    pub mtd_count: i32,
    pub mtd_total: f64,
    pub mtd_month: u32,
    pub mtd_year: i32,
}

/// Quantity tier for wholesale pricing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierPrice {
    pub min_quantity: i32,
    /// None means unbounded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_quantity: Option<i32>,
    #[serde(default)]
    pub price: PriceInfo,
    #[serde(default)]
    pub wholesale_price: f64,
}

/// The four price buckets plus sales tiers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Price {
    #[serde(rename = "purchaseVAT")]
    pub purchase_vat: PriceInfo,
    #[serde(rename = "purchaseNonVAT")]
    pub purchase_non_vat: PriceInfo,
    #[serde(rename = "saleVAT")]
    pub sale_vat: PriceInfo,
    #[serde(rename = "saleNonVAT")]
    pub sale_non_vat: PriceInfo,
    #[serde(rename = "salesTiers")]
    pub sales_tiers: Vec<TierPrice>,
}

/// Selector for one of the four price buckets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceBucket {
    PurchaseVat,
    PurchaseNonVat,
    SaleVat,
    SaleNonVat,
}

impl PriceBucket {
    pub fn select(is_purchase: bool, is_vat: bool) -> Self {
        match (is_purchase, is_vat) {
            (true, true) => PriceBucket::PurchaseVat,
            (true, false) => PriceBucket::PurchaseNonVat,
            (false, true) => PriceBucket::SaleVat,
            (false, false) => PriceBucket::SaleNonVat,
        }
    }
}

impl Price {
    pub fn bucket(&self, bucket: PriceBucket) -> &PriceInfo {
        match bucket {
            PriceBucket::PurchaseVat => &self.purchase_vat,
            PriceBucket::PurchaseNonVat => &self.purchase_non_vat,
            PriceBucket::SaleVat => &self.sale_vat,
            PriceBucket::SaleNonVat => &self.sale_non_vat,
        }
    }

    pub fn bucket_mut(&mut self, bucket: PriceBucket) -> &mut PriceInfo {
        match bucket {
            PriceBucket::PurchaseVat => &mut self.purchase_vat,
            PriceBucket::PurchaseNonVat => &mut self.purchase_non_vat,
            PriceBucket::SaleVat => &mut self.sale_vat,
            PriceBucket::SaleNonVat => &mut self.sale_non_vat,
        }
    }
}

/// Cumulative counters for one stock track
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StockInfo {
    pub purchased: i32,
    pub sold: i32,
    /// Negative means over-sold
    pub remaining: i32,
}

/// Stock of a product
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stock {
    pub vat: StockInfo,
    #[serde(rename = "nonVAT")]
    pub non_vat: StockInfo,
    #[serde(rename = "actualStock")]
    pub actual_stock: i32,
}

/// Product record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    /// `<category abbrev>-<4 digit sequence>`
    pub sku_id: String,
    /// `<category abbrev>-<size>/<color abbrev>`
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub size: String,
    pub category: String,
    #[serde(default)]
    pub qr_data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub price: Price,
    #[serde(default)]
    pub stock: Stock,
    /// Incremented by every successful write
    #[serde(default)]
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating or replacing a product
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductRequest {
    #[validate(length(min = 1, message = "Product name is required"))]
    pub name: String,
    pub description: String,
    pub color: String,
    pub size: String,
    #[validate(length(min = 1, message = "Category is required"))]
    pub category: String,
    pub image_url: Option<String>,
    pub price: Price,
    pub stock: Stock,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StockUpdateRequest {
    pub stock: Stock,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PriceUpdateRequest {
    pub price: Price,
}

/// Inventory overview over all products
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventorySummary {
    pub products: Vec<Product>,
    pub total_products: usize,
    pub total_stock: i64,
    pub low_stock_products: usize,
    pub out_of_stock_products: usize,
}

impl InventorySummary {
    pub fn from_products(products: Vec<Product>) -> Self {
        let mut total_stock = 0i64;
        let mut low_stock_products = 0;
        let mut out_of_stock_products = 0;
        for product in &products {
            total_stock += i64::from(product.total_stock());
            if product.total_stock() == 0 {
                out_of_stock_products += 1;
            }
            if product.is_low_stock() {
                low_stock_products += 1;
            }
        }

        Self {
            total_products: products.len(),
            products,
            total_stock,
            low_stock_products,
            out_of_stock_products,
        }
    }
}

impl Product {
    /// Build a new product; identifiers come from the code generator
    pub fn from_request(
        request: ProductRequest,
        sku_id: String,
        code: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            qr_data: sku_id.clone(),
            sku_id,
            code,
            name: request.name,
            description: request.description,
            color: request.color,
            size: request.size,
            category: request.category,
            image_url: request.image_url,
            price: request.price,
            stock: request.stock,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace editable fields; identifiers are kept
    pub fn apply_request(&mut self, request: ProductRequest, now: DateTime<Utc>) {
        self.name = request.name;
        self.description = request.description;
        self.color = request.color;
        self.size = request.size;
        self.category = request.category;
        self.image_url = request.image_url;
        self.price = request.price;
        self.stock = request.stock;
        self.updated_at = now;
    }

    pub fn total_stock(&self) -> i32 {
        self.stock.actual_stock
    }

    /// In stock but at or below the threshold
    pub fn is_low_stock(&self) -> bool {
        let stock = self.total_stock();
        stock > 0 && stock <= LOW_STOCK_THRESHOLD
    }

    /// Latest VAT purchase price, falling back to the non-VAT one
    pub fn display_price(&self) -> f64 {
        if self.price.purchase_vat.latest > 0.0 {
            self.price.purchase_vat.latest
        } else {
            self.price.purchase_non_vat.latest
        }
    }

    pub fn formatted_price(&self) -> String {
        format!("฿{:.2}", self.display_price())
    }
}
