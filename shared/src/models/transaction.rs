//! Pieces shared by purchases, sales and quotations

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{BankAccount, Customer};

/// VAT rate applied to VAT transactions (7%)
pub fn vat_rate() -> Decimal {
    Decimal::new(7, 2)
}

/// One product line of a purchase, sale or quotation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    #[validate(length(min = 1, message = "Product is required"))]
    pub product_id: String,
    #[serde(default)]
    pub product_name: String,
    #[serde(default)]
    pub product_code: String,
    #[validate(range(min = 1, max = 1_000_000, message = "Quantity must be between 1 and 1000000"))]
    pub quantity: i32,
    #[serde(default)]
    pub unit_price: Decimal,
    #[serde(default)]
    pub total_price: Decimal,
}

pub type PurchaseItem = LineItem;
pub type SaleItem = LineItem;
pub type QuotationItem = LineItem;

/// Payment details of a transaction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaymentInfo {
    pub is_paid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub our_account: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub our_account_info: Option<BankAccount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_account: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<DateTime<Utc>>,
}

/// Warehouse handling of a transaction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WarehouseInfo {
    pub is_updated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub actual_shipping: Decimal,
    pub items: Vec<WarehouseItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WarehouseItem {
    pub product_id: String,
    pub product_name: String,
    pub quantity: i32,
    pub boxes: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Customer details copied onto a transaction at creation time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomerSnapshot {
    pub customer_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl From<&Customer> for CustomerSnapshot {
    fn from(customer: &Customer) -> Self {
        Self {
            customer_name: customer.company_name.clone(),
            contact_name: Some(customer.contact_name.clone()),
            customer_code: Some(customer.customer_code.clone()),
            tax_id: Some(customer.tax_id.clone()),
            address: Some(customer.address.clone()),
            phone: Some(customer.phone.clone()),
        }
    }
}

/// Money totals of a transaction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub total_amount: Decimal,
    #[serde(rename = "totalVAT")]
    pub total_vat: Decimal,
    pub grand_total: Decimal,
}

impl Totals {
    /// Sum of line totals, plus 7% VAT when `is_vat`, plus `extra` (shipping where it counts)
    pub fn compute(items: &[LineItem], is_vat: bool, extra: Decimal) -> Self {
        let total_amount: Decimal = items.iter().map(|i| i.total_price).sum();
        let total_vat = if is_vat {
            total_amount * vat_rate()
        } else {
            Decimal::ZERO
        };
        Self {
            total_amount,
            total_vat,
            grand_total: total_amount + total_vat + extra,
        }
    }
}
