//! Sale transactions

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{CustomerSnapshot, PaymentInfo, SaleItem, Totals, WarehouseInfo};
use crate::types::flexible_datetime;

/// Bank account printed on an invoice or quotation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InvoiceBank {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_account_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_account_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_account_number: Option<String>,
}

/// Sale record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: Uuid,
    /// `INV-YYMM-NNNN` or `NV-YYMM-NNNN`
    pub sale_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quotation_code: Option<String>,
    pub sale_date: DateTime<Utc>,
    pub customer_id: String,
    #[serde(flatten)]
    pub customer: CustomerSnapshot,
    pub items: Vec<SaleItem>,
    #[serde(rename = "isVAT")]
    pub is_vat: bool,
    #[serde(default)]
    pub shipping_cost: Decimal,
    #[serde(default)]
    pub payment: PaymentInfo,
    #[serde(default)]
    pub warehouse: WarehouseInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(flatten)]
    pub bank: InvoiceBank,
    #[serde(flatten)]
    pub totals: Totals,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating or replacing a sale
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SaleRequest {
    #[serde(with = "flexible_datetime")]
    pub sale_date: DateTime<Utc>,
    #[serde(default)]
    pub customer_id: String,
    #[validate]
    pub items: Vec<SaleItem>,
    #[serde(rename = "isVAT", default)]
    pub is_vat: bool,
    #[serde(default)]
    pub shipping_cost: Decimal,
    #[serde(default)]
    pub payment: PaymentInfo,
    #[serde(default)]
    pub warehouse: WarehouseInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quotation_code: Option<String>,
    #[serde(flatten)]
    pub bank: InvoiceBank,
}

impl Sale {
    /// Build a sale; the code and customer snapshot are filled by the caller
    pub fn from_request(
        request: SaleRequest,
        sale_code: String,
        customer: CustomerSnapshot,
        now: DateTime<Utc>,
    ) -> Self {
        let totals = Totals::compute(&request.items, request.is_vat, Decimal::ZERO);
        Self {
            id: Uuid::new_v4(),
            sale_code,
            quotation_code: request.quotation_code,
            sale_date: request.sale_date,
            customer_id: request.customer_id,
            customer,
            items: request.items,
            is_vat: request.is_vat,
            shipping_cost: request.shipping_cost,
            payment: request.payment,
            warehouse: request.warehouse,
            notes: request.notes,
            bank: request.bank,
            totals,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply_request(&mut self, request: SaleRequest, now: DateTime<Utc>) {
        self.totals = Totals::compute(&request.items, request.is_vat, Decimal::ZERO);
        self.sale_date = request.sale_date;
        self.customer_id = request.customer_id;
        self.items = request.items;
        self.is_vat = request.is_vat;
        self.shipping_cost = request.shipping_cost;
        self.payment = request.payment;
        self.warehouse = request.warehouse;
        self.notes = request.notes;
        self.quotation_code = request.quotation_code;
        self.bank = request.bank;
        self.updated_at = now;
    }
}
