//! CSV import tests
//!
//! Tests the migration service against the in-memory store:
//! - Customer and product imports with per-row error reporting
//! - Transaction rows grouped by code, else by date and customer
//! - Imported purchases and sales post stock with migration audit records
//! - Imported sales clamp negative stock at zero
//! - Header and shape errors reject the whole file

use goodpack_backend::error::AppError;
use goodpack_backend::repositories::Repositories;
use goodpack_backend::services::migration::MigrationEntity;
use goodpack_backend::services::MigrationService;
use rust_decimal::Decimal;
use shared::{Catalog, SourceType};
use std::sync::Arc;

const CUSTOMERS: &str = "\
customerCode,companyName,contactName,taxId,phone,address,contactMethod
C-0001,บริษัท กล่องดี จำกัด,คุณเอ,,,กรุงเทพฯ,line
,ร้านเทปใส,คุณบี,,,,phone
C-0001,ซ้ำ,คุณซี,,,,
,,คุณดี,,,,
";

const PRODUCTS: &str = "\
skuId,name,description,color,size,category,purchasePriceVAT,purchasePriceNonVAT,salePriceVAT,salePriceNonVAT,stockVAT,stockNonVAT,actualStock
,กล่องใหญ่,,White,Large,Box,0,0,0,0,0,0,0
,เทปกาว,,Clear,2in,Tape,25.50,20,35,30,40,10,
TAP-0001,ซ้ำ,,,,Tape,,,,,,,
,,,,,Box,,,,,,,
";

fn service(repos: &Repositories) -> MigrationService {
    MigrationService::new(repos.clone(), Arc::new(Catalog::default()))
}

async fn seeded() -> Repositories {
    let repos = Repositories::memory();
    let migration = service(&repos);
    migration.import_customers(CUSTOMERS.as_bytes()).await.unwrap();
    migration.import_products(PRODUCTS.as_bytes()).await.unwrap();
    repos
}

// ============================================================================
// Customers and products
// ============================================================================

#[tokio::test]
async fn test_customer_import_reports_rows() {
    let repos = Repositories::memory();
    let result = service(&repos)
        .import_customers(CUSTOMERS.as_bytes())
        .await
        .unwrap();

    assert_eq!(result.total_rows, 4);
    assert_eq!(result.success_rows, 2);
    assert_eq!(result.failed_rows, 2);
    assert_eq!(
        result.errors,
        vec![
            "Row 4: Customer code 'C-0001' already exists".to_string(),
            "Row 5: Company name is required".to_string(),
        ]
    );

    let generated = repos.customers.get_by_code("C-0002").await.unwrap().unwrap();
    assert_eq!(generated.company_name, "ร้านเทปใส");
}

#[tokio::test]
async fn test_product_import() {
    let repos = Repositories::memory();
    let result = service(&repos)
        .import_products(PRODUCTS.as_bytes())
        .await
        .unwrap();

    assert_eq!(result.success_rows, 2);
    assert_eq!(
        result.errors,
        vec![
            "Row 4: SKU ID 'TAP-0001' already exists".to_string(),
            "Row 5: Product name is required".to_string(),
        ]
    );

    let box_product = repos.products.get_by_sku("BOX-0001").await.unwrap().unwrap();
    assert_eq!(box_product.code, "BO-LA/WH");

    let tape = repos.products.get_by_code("TA-2I/CL").await.unwrap().unwrap();
    assert_eq!(tape.sku_id, "TAP-0001");
    assert_eq!(tape.price.purchase_vat.latest, 25.5);
    assert_eq!(tape.price.sale_non_vat.latest, 30.0);
    assert_eq!(tape.stock.vat.remaining, 40);
    assert_eq!(tape.stock.non_vat.remaining, 10);
    assert_eq!(tape.stock.actual_stock, 50);
}

#[tokio::test]
async fn test_opening_stock_overflow_is_a_row_error() {
    let repos = Repositories::memory();
    let csv = "\
name,category,stockVAT,stockNonVAT,actualStock
กล่องใหญ่,Box,2147483647,1,
กล่องเล็ก,Box,2147483647,1,5
";
    let result = service(&repos).import_products(csv.as_bytes()).await.unwrap();
    assert_eq!(result.success_rows, 1);
    assert_eq!(result.errors, vec!["Row 2: Stock is out of range".to_string()]);
}

#[tokio::test]
async fn test_status_counts() {
    let repos = seeded().await;
    let status = service(&repos).status().await.unwrap();
    assert_eq!(status.total_customers, 2);
    assert_eq!(status.total_products, 2);
}

// ============================================================================
// Transactions
// ============================================================================

#[tokio::test]
async fn test_purchase_import_groups_rows() {
    let repos = seeded().await;
    let csv = "\
purchaseCode,purchaseDate,customerCode,productCode,quantity,unitPrice,isVAT,shippingCost,notes
P-001,2024-01-15,C-0001,BO-LA/WH,10,100.00,true,50.00,ล็อตแรก
P-001,2024-01-15,C-0001,BO-LA/WH,5,100,true,,
,2024-01-16,C-0002,BO-LA/WH,3,90,false,,
,2024-01-16,C-0002,BO-LA/WH,2,90,false,,
P-002,2024-01-17,C-9999,BO-LA/WH,1,1,true,,
";
    let result = service(&repos).import_purchases(csv.as_bytes()).await.unwrap();

    assert_eq!(result.total_rows, 5);
    assert_eq!(result.success_rows, 2);
    assert_eq!(result.failed_rows, 1);
    assert_eq!(result.errors, vec!["Group P-002: customer not found: C-9999".to_string()]);

    let purchases = repos.purchases.get_all().await.unwrap();
    assert_eq!(purchases.len(), 2);

    let first = purchases.iter().find(|p| p.purchase_code == "P-001").unwrap();
    assert_eq!(first.items.len(), 2);
    assert_eq!(first.notes.as_deref(), Some("ล็อตแรก"));
    // 1500 + 7% VAT + 50 shipping
    assert_eq!(first.totals.grand_total, Decimal::from(1655));
    assert_eq!(first.warehouse.actual_shipping, Decimal::from(50));

    let generated = purchases.iter().find(|p| p.purchase_code != "P-001").unwrap();
    assert!(generated.purchase_code.starts_with("PUR-NV-"));
    assert!(!generated.is_vat);

    let product = repos.products.get_by_code("BO-LA/WH").await.unwrap().unwrap();
    assert_eq!(product.stock.vat.remaining, 15);
    assert_eq!(product.stock.non_vat.remaining, 5);
    assert_eq!(product.stock.actual_stock, 20);
    assert_eq!(product.price.purchase_vat.latest, 100.0);
    assert_eq!(product.price.purchase_non_vat.latest, 90.0);

    let audit = repos
        .adjustments
        .by_source(SourceType::Migration, &first.id.to_string())
        .await
        .unwrap();
    assert_eq!(audit.len(), 2);
    assert!(audit.iter().all(|a| a.source_code.as_deref() == Some("P-001")));
}

#[tokio::test]
async fn test_sale_import_clamps_stock() {
    let repos = seeded().await;
    let purchases = "\
purchaseCode,purchaseDate,customerCode,productCode,quantity,unitPrice,isVAT,shippingCost,notes
P-001,2024-01-15,C-0001,BO-LA/WH,10,100,true,,
";
    service(&repos).import_purchases(purchases.as_bytes()).await.unwrap();

    let sales = "\
saleCode,saleDate,customerCode,productCode,quantity,unitPrice,isVAT,shippingCost,notes
S-001,2024-01-20,C-0001,BO-LA/WH,25,150,true,30,
";
    let result = service(&repos).import_sales(sales.as_bytes()).await.unwrap();
    assert_eq!(result.success_rows, 1);
    assert!(result.errors.is_empty());

    let product = repos.products.get_by_code("BO-LA/WH").await.unwrap().unwrap();
    assert_eq!(product.stock.vat.remaining, 0);
    assert_eq!(product.stock.actual_stock, 0);
    assert_eq!(product.stock.vat.sold, 25);
    assert_eq!(product.price.sale_vat.latest, 150.0);

    let sale = repos.sales.get_all().await.unwrap().pop().unwrap();
    assert_eq!(sale.sale_code, "S-001");
    assert_eq!(sale.totals.grand_total, Decimal::new(404250, 2));
}

#[tokio::test]
async fn test_bad_cells_reject_group() {
    let repos = seeded().await;
    let csv = "\
saleCode,saleDate,customerCode,productCode,quantity,unitPrice,isVAT
S-001,2024-01-20,C-0001,BO-LA/WH,many,150,true
S-002,2024-01-20,C-0001,XX-XX/XX,1,150,true
S-003,2024-01-20,C-0001,BO-LA/WH,1,cheap,true
";
    let result = service(&repos).import_sales(csv.as_bytes()).await.unwrap();
    assert_eq!(result.failed_rows, 3);
    assert_eq!(
        result.errors,
        vec![
            "Group S-001: invalid quantity: many".to_string(),
            "Group S-002: product not found: XX-XX/XX".to_string(),
            "Group S-003: invalid unit price: cheap".to_string(),
        ]
    );
    assert!(repos.sales.get_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_oversized_quantity_rejects_group() {
    let repos = seeded().await;
    let csv = "\
purchaseCode,purchaseDate,customerCode,productCode,quantity,unitPrice
P-009,2024-01-15,C-0001,BO-LA/WH,2000000,1
";
    let result = service(&repos).import_purchases(csv.as_bytes()).await.unwrap();
    assert_eq!(result.errors, vec!["Group P-009: invalid quantity: 2000000".to_string()]);
    let product = repos.products.get_by_code("BO-LA/WH").await.unwrap().unwrap();
    assert_eq!(product.stock.vat.remaining, 0);
}

// ============================================================================
// File-level errors
// ============================================================================

#[tokio::test]
async fn test_missing_header_rejects_file() {
    let repos = seeded().await;
    let csv = "purchaseDate,customerCode,productCode,unitPrice\n2024-01-15,C-0001,BO-LA/WH,1\n";
    let result = service(&repos).import_purchases(csv.as_bytes()).await;
    assert!(matches!(result, Err(AppError::Validation(msg)) if msg == "missing required header: quantity"));
}

#[tokio::test]
async fn test_header_only_file_is_rejected() {
    let repos = Repositories::memory();
    let result = service(&repos)
        .import_customers(b"companyName,contactName\n")
        .await;
    assert!(matches!(
        result,
        Err(AppError::Validation(msg)) if msg == "CSV file must have at least a header row and one data row"
    ));
}

#[test]
fn test_templates_name_their_entity() {
    for (name, file) in [
        ("customers", "customer_template.csv"),
        ("products", "product_template.csv"),
        ("purchases", "purchase_template.csv"),
        ("sales", "sale_template.csv"),
    ] {
        let entity: MigrationEntity = name.parse().unwrap();
        assert_eq!(entity.template_file_name(), file);
        assert!(entity.template().lines().count() >= 2);
    }
    assert!(matches!(
        "suppliers".parse::<MigrationEntity>(),
        Err(AppError::NotFound(_))
    ));
}
