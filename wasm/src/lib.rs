//! WebAssembly module for the Goodpack inventory platform
//!
//! Lets product and transaction forms preview the values the server will compute:
//! product codes, SKU IDs, rounded prices and transaction totals.

use rust_decimal::Decimal;
use serde::Deserialize;
use shared::{
    round2, Catalog, LineItem, MigrationCodeGenerator, ProductCodeGenerator, SkuGenerator,
    StandardCodeGenerator, Totals,
};
use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::validation::*;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    // Set up panic hook for better error messages in browser console
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

fn parse_catalog(catalog_json: &str) -> Result<Catalog, JsValue> {
    if catalog_json.trim().is_empty() {
        return Ok(Catalog::default());
    }
    serde_json::from_str(catalog_json).map_err(|e| {
        let message = format!("Invalid catalog JSON: {}", e);
        log_warning(&message);
        JsValue::from_str(&message)
    })
}

#[cfg(target_arch = "wasm32")]
fn log_warning(message: &str) {
    web_sys::console::warn_1(&JsValue::from_str(message));
}

#[cfg(not(target_arch = "wasm32"))]
fn log_warning(_message: &str) {}

/// Product code as assigned when a product is created
#[wasm_bindgen]
pub fn preview_product_code(
    category: &str,
    size: &str,
    color: &str,
    catalog_json: &str,
) -> Result<String, JsValue> {
    let catalog = parse_catalog(catalog_json)?;
    Ok(StandardCodeGenerator::new(&catalog).product_code(category, size, color))
}

/// Product code as assigned by the CSV product import
#[wasm_bindgen]
pub fn preview_migration_code(category: &str, size: &str, color: &str) -> String {
    MigrationCodeGenerator.product_code(category, size, color)
}

/// SKU ID following `last_number` in the category
#[wasm_bindgen]
pub fn preview_sku_id(category: &str, last_number: u32, catalog_json: &str) -> Result<String, JsValue> {
    let catalog = parse_catalog(catalog_json)?;
    Ok(SkuGenerator::new(&catalog).generate_sku_id(category, last_number))
}

/// Price rounded half up to two decimals, as stored in price statistics
#[wasm_bindgen]
pub fn round_price(x: f64) -> f64 {
    round2(x)
}

/// A form line; the line total defaults to quantity times unit price
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PreviewLine {
    #[serde(default)]
    product_id: String,
    quantity: i32,
    #[serde(default)]
    unit_price: Decimal,
    total_price: Option<Decimal>,
}

/// Totals of a transaction as JSON `{totalAmount, totalVAT, grandTotal}`
///
/// `shipping` is added to the grand total; pass 0 for purchases and sales.
#[wasm_bindgen]
pub fn calculate_totals(items_json: &str, is_vat: bool, shipping: f64) -> Result<String, JsValue> {
    let lines: Vec<PreviewLine> = serde_json::from_str(items_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid items JSON: {}", e)))?;
    let shipping = Decimal::try_from(shipping)
        .map_err(|e| JsValue::from_str(&format!("Invalid shipping cost: {}", e)))?;

    let items: Vec<LineItem> = lines
        .into_iter()
        .map(|line| LineItem {
            total_price: line
                .total_price
                .unwrap_or(line.unit_price * Decimal::from(line.quantity)),
            product_id: line.product_id,
            product_name: String::new(),
            product_code: String::new(),
            quantity: line.quantity,
            unit_price: line.unit_price,
        })
        .collect();

    let totals = Totals::compute(&items, is_vat, shipping);
    serde_json::to_string(&totals).map_err(|e| JsValue::from_str(&e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"{"categories":[{"name":"กล่อง","english":"Box","abbreviation":"BX"}],
        "colors":[{"name":"ขาว","english":"White","abbreviation":"WH"}]}"#;

    #[test]
    fn test_preview_product_code() {
        assert_eq!(
            preview_product_code("Box", "10 x 20", "White", CATALOG).unwrap(),
            "BX-10x20/WH"
        );
        assert_eq!(preview_product_code("Tape", "L", "Red", "").unwrap(), "TAP-l/RE");
    }

    #[test]
    fn test_preview_migration_code() {
        assert_eq!(preview_migration_code("box", "l", ""), "BO-LX/XX");
    }

    #[test]
    fn test_preview_sku_id() {
        assert_eq!(preview_sku_id("กล่อง", 41, CATALOG).unwrap(), "BX-0042");
        assert_eq!(preview_sku_id("Tape", 0, "").unwrap(), "TAP-0001");
    }

    #[test]
    fn test_round_price() {
        assert_eq!(round_price(0.125), 0.13);
        assert_eq!(round_price(3.14159), 3.14);
    }

    #[test]
    fn test_calculate_totals() {
        let json = calculate_totals(
            r#"[{"quantity":2,"unitPrice":"50"},{"quantity":1,"unitPrice":"10","totalPrice":"12"}]"#,
            true,
            20.0,
        )
        .unwrap();
        let totals: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(totals["totalAmount"], "112");
        assert_eq!(totals["totalVAT"], "7.84");
        assert_eq!(totals["grandTotal"], "139.84");
    }
}
