//! Quotations and their conversion into sales

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{
    CustomerSnapshot, InvoiceBank, PaymentInfo, QuotationItem, SaleRequest, Totals, WarehouseInfo,
};
use crate::types::flexible_datetime;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuotationStatus {
    #[default]
    Draft,
    Sent,
    Accepted,
    Rejected,
    Expired,
}

/// Quotation record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quotation {
    pub id: Uuid,
    /// `QU-YYMM-NNNN`
    pub quotation_code: String,
    pub quotation_date: DateTime<Utc>,
    pub customer_id: String,
    #[serde(flatten)]
    pub customer: CustomerSnapshot,
    pub items: Vec<QuotationItem>,
    #[serde(rename = "isVAT")]
    pub is_vat: bool,
    #[serde(default)]
    pub shipping_cost: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: QuotationStatus,
    /// Sale created from this quotation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sale_code: Option<String>,
    #[serde(flatten)]
    pub bank: InvoiceBank,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct QuotationRequest {
    #[serde(with = "flexible_datetime")]
    pub quotation_date: DateTime<Utc>,
    #[validate(length(min = 1, message = "Customer is required"))]
    pub customer_id: String,
    #[validate]
    pub items: Vec<QuotationItem>,
    #[serde(rename = "isVAT", default)]
    pub is_vat: bool,
    #[serde(default)]
    pub shipping_cost: Decimal,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default, with = "flexible_datetime::option")]
    pub valid_until: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: QuotationStatus,
    #[serde(flatten)]
    pub bank: InvoiceBank,
}

impl Quotation {
    pub fn from_request(
        request: QuotationRequest,
        quotation_code: String,
        customer: CustomerSnapshot,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            quotation_code,
            quotation_date: request.quotation_date,
            customer_id: request.customer_id,
            customer,
            items: request.items,
            is_vat: request.is_vat,
            shipping_cost: request.shipping_cost,
            notes: request.notes,
            valid_until: request.valid_until,
            status: request.status,
            sale_code: None,
            bank: request.bank,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply_request(&mut self, request: QuotationRequest, now: DateTime<Utc>) {
        self.quotation_date = request.quotation_date;
        self.customer_id = request.customer_id;
        self.items = request.items;
        self.is_vat = request.is_vat;
        self.shipping_cost = request.shipping_cost;
        self.notes = request.notes;
        self.valid_until = request.valid_until;
        self.status = request.status;
        self.bank = request.bank;
        self.updated_at = now;
    }

    /// Items, VAT and shipping
    pub fn grand_total(&self) -> Decimal {
        Totals::compute(&self.items, self.is_vat, self.shipping_cost).grand_total
    }

    /// Prefill a sale from this quotation: unpaid, dated `today`
    pub fn to_sale_request(&self, today: DateTime<Utc>) -> SaleRequest {
        SaleRequest {
            sale_date: today,
            customer_id: self.customer_id.clone(),
            items: self.items.clone(),
            is_vat: self.is_vat,
            shipping_cost: self.shipping_cost,
            payment: PaymentInfo {
                is_paid: false,
                ..Default::default()
            },
            warehouse: WarehouseInfo {
                is_updated: false,
                notes: None,
                actual_shipping: self.shipping_cost,
                items: Vec::new(),
            },
            notes: self.notes.clone(),
            quotation_code: Some(self.quotation_code.clone()),
            bank: self.bank.clone(),
        }
    }
}
