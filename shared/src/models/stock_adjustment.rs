//! Stock adjustment audit records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use super::{Product, Stock};

/// Direction of a stock change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustmentType {
    Add,
    Reduce,
}

impl AdjustmentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdjustmentType::Add => "add",
            AdjustmentType::Reduce => "reduce",
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            AdjustmentType::Add => AdjustmentType::Reduce,
            AdjustmentType::Reduce => AdjustmentType::Add,
        }
    }
}

impl FromStr for AdjustmentType {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add" => Ok(AdjustmentType::Add),
            "reduce" => Ok(AdjustmentType::Reduce),
            _ => Err("Invalid adjustment type. Must be 'add' or 'reduce'"),
        }
    }
}

/// Which counters a stock change touches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockType {
    Vat,
    #[serde(rename = "nonvat")]
    NonVat,
    #[serde(rename = "actualstock")]
    ActualStock,
}

impl StockType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockType::Vat => "vat",
            StockType::NonVat => "nonvat",
            StockType::ActualStock => "actualstock",
        }
    }

    /// Track used by a purchase or sale
    pub fn for_vat(is_vat: bool) -> Self {
        if is_vat {
            StockType::Vat
        } else {
            StockType::NonVat
        }
    }
}

impl FromStr for StockType {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vat" => Ok(StockType::Vat),
            "nonvat" => Ok(StockType::NonVat),
            "actualstock" => Ok(StockType::ActualStock),
            _ => Err("Invalid stock type. Must be 'vat', 'nonvat', or 'actualstock'"),
        }
    }
}

/// Kind of event that caused a stock change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Purchase,
    Sale,
    Adjustment,
    Migration,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Purchase => "purchase",
            SourceType::Sale => "sale",
            SourceType::Adjustment => "adjustment",
            SourceType::Migration => "migration",
        }
    }
}

impl FromStr for SourceType {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "purchase" => Ok(SourceType::Purchase),
            "sale" => Ok(SourceType::Sale),
            "adjustment" => Ok(SourceType::Adjustment),
            "migration" => Ok(SourceType::Migration),
            _ => Err("Invalid source type"),
        }
    }
}

/// One stock mutation: direction, track and quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockChange {
    pub adjustment_type: AdjustmentType,
    pub stock_type: StockType,
    pub quantity: i32,
}

impl StockChange {
    pub fn new(adjustment_type: AdjustmentType, stock_type: StockType, quantity: i32) -> Self {
        Self {
            adjustment_type,
            stock_type,
            quantity,
        }
    }

    pub fn reversed(self) -> Self {
        Self {
            adjustment_type: self.adjustment_type.flipped(),
            ..self
        }
    }
}

/// Link from an audit record to the transaction that caused it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdjustmentSource {
    pub source_type: SourceType,
    pub source_id: Option<String>,
    pub source_code: Option<String>,
}

impl AdjustmentSource {
    pub fn manual() -> Self {
        Self {
            source_type: SourceType::Adjustment,
            source_id: None,
            source_code: None,
        }
    }

    pub fn transaction(source_type: SourceType, id: Uuid, code: &str) -> Self {
        Self {
            source_type,
            source_id: Some(id.to_string()),
            source_code: Some(code.to_string()),
        }
    }
}

/// The seven stock counters of a product at one point in time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockSnapshot {
    pub vat_purchased: i32,
    pub vat_sold: i32,
    pub vat_remaining: i32,
    pub non_vat_purchased: i32,
    pub non_vat_sold: i32,
    pub non_vat_remaining: i32,
    pub actual_stock: i32,
}

impl StockSnapshot {
    pub fn capture(stock: &Stock) -> Self {
        Self {
            vat_purchased: stock.vat.purchased,
            vat_sold: stock.vat.sold,
            vat_remaining: stock.vat.remaining,
            non_vat_purchased: stock.non_vat.purchased,
            non_vat_sold: stock.non_vat.sold,
            non_vat_remaining: stock.non_vat.remaining,
            actual_stock: stock.actual_stock,
        }
    }

    pub fn as_array(&self) -> [i32; 7] {
        [
            self.vat_purchased,
            self.vat_sold,
            self.vat_remaining,
            self.non_vat_purchased,
            self.non_vat_sold,
            self.non_vat_remaining,
            self.actual_stock,
        ]
    }
}

/// Immutable audit record of a single stock mutation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockAdjustment {
    pub id: Uuid,
    pub product_id: String,
    pub product_name: String,
    pub sku_id: String,

    pub adjustment_type: AdjustmentType,
    pub stock_type: StockType,
    pub quantity: i32,

    #[serde(rename = "beforeVATPurchased")]
    pub before_vat_purchased: i32,
    #[serde(rename = "beforeVATSold")]
    pub before_vat_sold: i32,
    #[serde(rename = "beforeVATRemaining")]
    pub before_vat_remaining: i32,
    #[serde(rename = "beforeNonVATPurchased")]
    pub before_non_vat_purchased: i32,
    #[serde(rename = "beforeNonVATSold")]
    pub before_non_vat_sold: i32,
    #[serde(rename = "beforeNonVATRemaining")]
    pub before_non_vat_remaining: i32,
    pub before_actual_stock: i32,

    #[serde(rename = "afterVATPurchased")]
    pub after_vat_purchased: i32,
    #[serde(rename = "afterVATSold")]
    pub after_vat_sold: i32,
    #[serde(rename = "afterVATRemaining")]
    pub after_vat_remaining: i32,
    #[serde(rename = "afterNonVATPurchased")]
    pub after_non_vat_purchased: i32,
    #[serde(rename = "afterNonVATSold")]
    pub after_non_vat_sold: i32,
    #[serde(rename = "afterNonVATRemaining")]
    pub after_non_vat_remaining: i32,
    pub after_actual_stock: i32,

    pub source_type: SourceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl StockAdjustment {
    /// Build the record for a mutation already applied to `product`
    pub fn record(
        product: &Product,
        change: StockChange,
        before: StockSnapshot,
        source: AdjustmentSource,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let mut adjustment = Self {
            id: Uuid::new_v4(),
            product_id: product.id.to_string(),
            product_name: product.name.clone(),
            sku_id: product.sku_id.clone(),
            adjustment_type: change.adjustment_type,
            stock_type: change.stock_type,
            quantity: change.quantity,
            before_vat_purchased: 0,
            before_vat_sold: 0,
            before_vat_remaining: 0,
            before_non_vat_purchased: 0,
            before_non_vat_sold: 0,
            before_non_vat_remaining: 0,
            before_actual_stock: 0,
            after_vat_purchased: 0,
            after_vat_sold: 0,
            after_vat_remaining: 0,
            after_non_vat_purchased: 0,
            after_non_vat_sold: 0,
            after_non_vat_remaining: 0,
            after_actual_stock: 0,
            source_type: source.source_type,
            source_id: source.source_id,
            source_code: source.source_code,
            notes,
            created_by: None,
            created_at: now,
        };
        adjustment.set_before(&before);
        adjustment.set_after(&StockSnapshot::capture(&product.stock));
        adjustment
    }

    pub fn change(&self) -> StockChange {
        StockChange::new(self.adjustment_type, self.stock_type, self.quantity)
    }

    pub fn before(&self) -> StockSnapshot {
        StockSnapshot {
            vat_purchased: self.before_vat_purchased,
            vat_sold: self.before_vat_sold,
            vat_remaining: self.before_vat_remaining,
            non_vat_purchased: self.before_non_vat_purchased,
            non_vat_sold: self.before_non_vat_sold,
            non_vat_remaining: self.before_non_vat_remaining,
            actual_stock: self.before_actual_stock,
        }
    }

    pub fn after(&self) -> StockSnapshot {
        StockSnapshot {
            vat_purchased: self.after_vat_purchased,
            vat_sold: self.after_vat_sold,
            vat_remaining: self.after_vat_remaining,
            non_vat_purchased: self.after_non_vat_purchased,
            non_vat_sold: self.after_non_vat_sold,
            non_vat_remaining: self.after_non_vat_remaining,
            actual_stock: self.after_actual_stock,
        }
    }

    pub fn set_before(&mut self, snapshot: &StockSnapshot) {
        self.before_vat_purchased = snapshot.vat_purchased;
        self.before_vat_sold = snapshot.vat_sold;
        self.before_vat_remaining = snapshot.vat_remaining;
        self.before_non_vat_purchased = snapshot.non_vat_purchased;
        self.before_non_vat_sold = snapshot.non_vat_sold;
        self.before_non_vat_remaining = snapshot.non_vat_remaining;
        self.before_actual_stock = snapshot.actual_stock;
    }

    pub fn set_after(&mut self, snapshot: &StockSnapshot) {
        self.after_vat_purchased = snapshot.vat_purchased;
        self.after_vat_sold = snapshot.vat_sold;
        self.after_vat_remaining = snapshot.vat_remaining;
        self.after_non_vat_purchased = snapshot.non_vat_purchased;
        self.after_non_vat_sold = snapshot.non_vat_sold;
        self.after_non_vat_remaining = snapshot.non_vat_remaining;
        self.after_actual_stock = snapshot.actual_stock;
    }
}

/// Body of the manual adjustment endpoint
///
/// Enum fields stay strings so bad values map to a 400 with a readable message.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StockAdjustmentRequest {
    pub adjustment_type: String,
    pub stock_type: String,
    pub quantity: i32,
    pub notes: Option<String>,
}

impl StockAdjustmentRequest {
    /// Parse into a typed change, checking quantity and enum values
    pub fn to_change(&self) -> Result<StockChange, &'static str> {
        crate::validation::validate_quantity(self.quantity)?;
        let adjustment_type = self.adjustment_type.parse()?;
        let stock_type = self.stock_type.parse()?;
        Ok(StockChange::new(adjustment_type, stock_type, self.quantity))
    }
}
