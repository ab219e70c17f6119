//! Purchase transactions

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{CustomerSnapshot, PaymentInfo, PurchaseItem, Totals, WarehouseInfo};
use crate::types::flexible_datetime;

/// Purchase record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Purchase {
    pub id: Uuid,
    /// `PUR-VAT-YYMM-NNNN` or `PUR-NV-YYMM-NNNN`
    pub purchase_code: String,
    pub purchase_date: DateTime<Utc>,
    pub customer_id: String,
    #[serde(flatten)]
    pub customer: CustomerSnapshot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub items: Vec<PurchaseItem>,
    #[serde(rename = "isVAT")]
    pub is_vat: bool,
    #[serde(default)]
    pub shipping_cost: Decimal,
    #[serde(default)]
    pub payment: PaymentInfo,
    #[serde(default)]
    pub warehouse: WarehouseInfo,
    #[serde(flatten)]
    pub totals: Totals,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating or replacing a purchase
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRequest {
    #[serde(with = "flexible_datetime")]
    pub purchase_date: DateTime<Utc>,
    #[validate(length(min = 1, message = "Customer is required"))]
    pub customer_id: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[validate]
    pub items: Vec<PurchaseItem>,
    #[serde(rename = "isVAT", default)]
    pub is_vat: bool,
    #[serde(default)]
    pub shipping_cost: Decimal,
    #[serde(default)]
    pub payment: PaymentInfo,
    #[serde(default)]
    pub warehouse: WarehouseInfo,
}

impl Purchase {
    /// Build a purchase; the code and customer snapshot are filled by the caller
    pub fn from_request(
        request: PurchaseRequest,
        purchase_code: String,
        customer: CustomerSnapshot,
        now: DateTime<Utc>,
    ) -> Self {
        let totals = Totals::compute(&request.items, request.is_vat, Decimal::ZERO);
        Self {
            id: Uuid::new_v4(),
            purchase_code,
            purchase_date: request.purchase_date,
            customer_id: request.customer_id,
            customer,
            notes: request.notes,
            items: request.items,
            is_vat: request.is_vat,
            shipping_cost: request.shipping_cost,
            payment: request.payment,
            warehouse: request.warehouse,
            totals,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace editable fields and recompute totals
    pub fn apply_request(&mut self, request: PurchaseRequest, now: DateTime<Utc>) {
        self.totals = Totals::compute(&request.items, request.is_vat, Decimal::ZERO);
        self.purchase_date = request.purchase_date;
        self.customer_id = request.customer_id;
        self.notes = request.notes;
        self.items = request.items;
        self.is_vat = request.is_vat;
        self.shipping_cost = request.shipping_cost;
        self.payment = request.payment;
        self.warehouse = request.warehouse;
        self.updated_at = now;
    }
}
