//! CSV import of customers, products, purchases and sales
//!
//! Headers are matched case-insensitively. A bad row (or, for transactions, a bad group
//! of rows) is reported in the result and skipped; only an unreadable file or a missing
//! required header fails the whole import.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use csv::{ReaderBuilder, StringRecord, Trim};
use rust_decimal::Decimal;
use serde::Serialize;
use shared::{
    Catalog, Customer, CustomerRequest, LineItem, MigrationCodeGenerator, PaymentInfo, Price,
    MAX_QUANTITY,
    Product, ProductCodeGenerator, ProductRequest, Purchase, PurchaseRequest, Sale, SaleRequest,
    SkuGenerator, Stock, Totals, TransactionKind, WarehouseInfo,
};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::stock::{Posting, StockService};
use super::{as_price, customer_snapshot, CustomerService, PurchaseService, SaleService};
use crate::error::{AppError, AppResult};
use crate::repositories::Repositories;

/// Outcome of one import
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationResult {
    pub total_rows: usize,
    pub success_rows: usize,
    pub failed_rows: usize,
    pub errors: Vec<String>,
    pub processed_at: DateTime<Utc>,
}

impl MigrationResult {
    fn new(total_rows: usize) -> Self {
        Self {
            total_rows,
            success_rows: 0,
            failed_rows: 0,
            errors: Vec::new(),
            processed_at: Utc::now(),
        }
    }

    fn fail(&mut self, message: String) {
        self.failed_rows += 1;
        self.errors.push(message);
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationStatus {
    pub total_customers: i64,
    pub total_products: i64,
    pub last_checked: DateTime<Utc>,
}

/// Importable collections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationEntity {
    Customers,
    Products,
    Purchases,
    Sales,
}

impl MigrationEntity {
    /// Download name of the CSV template
    pub fn template_file_name(&self) -> &'static str {
        match self {
            MigrationEntity::Customers => "customer_template.csv",
            MigrationEntity::Products => "product_template.csv",
            MigrationEntity::Purchases => "purchase_template.csv",
            MigrationEntity::Sales => "sale_template.csv",
        }
    }

    /// Example CSV with the accepted headers
    pub fn template(&self) -> &'static str {
        match self {
            MigrationEntity::Customers => concat!(
                "customerCode,companyName,contactName,taxId,phone,address,contactMethod\n",
                "C-0001,บริษัทตัวอย่าง จำกัด,นายสมชาย ใจดี,1234567890123,02-123-4567,123 ถนนสุขุมวิท กรุงเทพฯ 10110,email\n",
                ",บริษัททดสอบ จำกัด,นางสมหญิง รักดี,9876543210987,02-987-6543,456 ถนนรัชดาภิเษก กรุงเทพฯ 10400,phone\n",
                "C-0003,บริษัทสินค้าดี จำกัด,นายวิชัย เก่งมาก,1111111111111,02-111-2222,789 ถนนพหลโยธิน กรุงเทพฯ 10900,line\n",
            ),
            MigrationEntity::Products => concat!(
                "skuId,name,description,color,size,category,purchasePriceVAT,purchasePriceNonVAT,salePriceVAT,salePriceNonVAT,stockVAT,stockNonVAT,actualStock\n",
                "SH-0001,เสื้อเชิ้ต,เสื้อเชิ้ตผ้าฝ้าย,ขาว,L,เสื้อผ้า,299.00,250.00,399.00,350.00,50,30,80\n",
                ",กางเกงยีนส์,กางเกงยีนส์สไตล์สตรีท,น้ำเงิน,32,กางเกง,599.00,500.00,799.00,650.00,25,15,40\n",
                "AC-0001,กระเป๋า,กระเป๋าหนังแท้,ดำ,One Size,กระเป๋า,1299.00,1100.00,1799.00,1500.00,10,5,15\n",
            ),
            MigrationEntity::Purchases => concat!(
                "purchaseCode,purchaseDate,customerCode,productCode,quantity,unitPrice,isVAT,shippingCost,notes\n",
                "P-001,2024-01-15,C-0001,เ-l/WH,10,299.00,true,50.00,ซื้อเสื้อเชิ้ต\n",
                ",2024-01-15,C-0001,ก-32/BL,5,599.00,true,,ซื้อกางเกงยีนส์\n",
                "P-002,2024-01-16,C-0002,ก-onesize/BK,2,1299.00,false,100.00,ซื้อกระเป๋า\n",
            ),
            MigrationEntity::Sales => concat!(
                "saleCode,saleDate,customerCode,productCode,quantity,unitPrice,isVAT,shippingCost,notes\n",
                "S-001,2024-01-20,C-0001,เ-l/WH,5,399.00,true,30.00,ขายเสื้อเชิ้ต\n",
                ",2024-01-20,C-0001,ก-32/BL,2,799.00,true,,ขายกางเกงยีนส์\n",
                "S-002,2024-01-21,C-0002,ก-onesize/BK,1,1799.00,false,50.00,ขายกระเป๋า\n",
            ),
        }
    }
}

impl std::str::FromStr for MigrationEntity {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customers" => Ok(MigrationEntity::Customers),
            "products" => Ok(MigrationEntity::Products),
            "purchases" => Ok(MigrationEntity::Purchases),
            "sales" => Ok(MigrationEntity::Sales),
            other => Err(AppError::NotFound(format!("Migration '{}'", other))),
        }
    }
}

/// A parsed CSV upload: lowercased header index plus data rows
#[derive(Debug)]
pub struct CsvTable {
    headers: HashMap<String, usize>,
    rows: Vec<StringRecord>,
}

impl CsvTable {
    pub fn parse(bytes: &[u8]) -> AppResult<Self> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(bytes);

        let mut records = reader
            .records()
            .collect::<Result<Vec<StringRecord>, csv::Error>>()?
            .into_iter();

        let header = records.next();
        let rows: Vec<StringRecord> = records.collect();
        let header = match header {
            Some(header) if !rows.is_empty() => header,
            _ => {
                return Err(AppError::validation(
                    "CSV file must have at least a header row and one data row",
                ))
            }
        };

        let headers = header
            .iter()
            .enumerate()
            .map(|(i, name)| (name.trim().to_lowercase(), i))
            .collect();

        Ok(Self { headers, rows })
    }

    pub fn require(&self, names: &[&str]) -> AppResult<()> {
        match names.iter().find(|name| !self.headers.contains_key(**name)) {
            Some(missing) => Err(AppError::validation(format!(
                "missing required header: {}",
                missing
            ))),
            None => Ok(()),
        }
    }

    pub fn rows(&self) -> &[StringRecord] {
        &self.rows
    }

    /// Cell of `row` under `name`, empty when the column or cell is absent
    pub fn field<'a>(&self, row: &'a StringRecord, name: &str) -> &'a str {
        self.headers
            .get(name)
            .and_then(|i| row.get(*i))
            .map(str::trim)
            .unwrap_or("")
    }
}

/// Rows numbered as in the file (the header is row 1)
type NumberedRow<'a> = (usize, &'a StringRecord);

/// Column names of a transaction import
#[derive(Debug, Clone, Copy)]
struct TransactionColumns {
    kind: TransactionKind,
    code: &'static str,
    date: &'static str,
}

impl TransactionColumns {
    fn of(kind: TransactionKind) -> Self {
        match kind {
            TransactionKind::Purchase => Self {
                kind,
                code: "purchasecode",
                date: "purchasedate",
            },
            TransactionKind::Sale => Self {
                kind,
                code: "salecode",
                date: "saledate",
            },
        }
    }

    fn required(&self) -> [&'static str; 5] {
        [self.date, "customercode", "productcode", "quantity", "unitprice"]
    }

    fn noun(&self) -> &'static str {
        match self.kind {
            TransactionKind::Purchase => "purchase",
            TransactionKind::Sale => "sale",
        }
    }
}

/// Why a transaction group was rejected
#[derive(Debug)]
enum GroupError {
    CustomerNotFound(String),
    ProductNotFound(String),
    InvalidQuantity(String),
    InvalidUnitPrice(String),
    Storage(AppError),
}

impl fmt::Display for GroupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupError::CustomerNotFound(code) => write!(f, "customer not found: {}", code),
            GroupError::ProductNotFound(code) => write!(f, "product not found: {}", code),
            GroupError::InvalidQuantity(value) => write!(f, "invalid quantity: {}", value),
            GroupError::InvalidUnitPrice(value) => write!(f, "invalid unit price: {}", value),
            GroupError::Storage(e) => write!(f, "{}", e),
        }
    }
}

impl From<AppError> for GroupError {
    fn from(err: AppError) -> Self {
        GroupError::Storage(err)
    }
}

/// One transaction assembled from a group of rows
struct ParsedGroup {
    code: Option<String>,
    date: DateTime<Utc>,
    customer: Customer,
    is_vat: bool,
    shipping_cost: Decimal,
    notes: Option<String>,
    items: Vec<LineItem>,
}

/// Rows sharing a code, else the same `date-customerCode`, in first-seen order
fn group_rows<'a>(
    table: &'a CsvTable,
    columns: TransactionColumns,
) -> Vec<(String, Vec<NumberedRow<'a>>)> {
    let mut groups: Vec<(String, Vec<NumberedRow<'a>>)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for (i, row) in table.rows().iter().enumerate() {
        let code = table.field(row, columns.code);
        let key = if code.is_empty() {
            format!(
                "{}-{}",
                table.field(row, columns.date),
                table.field(row, "customercode")
            )
        } else {
            code.to_string()
        };

        let slot = *index.entry(key.clone()).or_insert_with(|| {
            groups.push((key, Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push((i + 2, row));
    }

    groups
}

/// `YYYY-MM-DD` at midnight UTC, `now` when unparsable
fn parse_date(value: &str, now: DateTime<Utc>) -> DateTime<Utc> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| Utc.from_utc_datetime(&dt))
        .unwrap_or(now)
}

/// Empty is zero; anything else must parse
fn parse_or_zero<T: std::str::FromStr + Default>(value: &str) -> Option<T> {
    if value.is_empty() {
        Some(T::default())
    } else {
        value.parse().ok()
    }
}

#[derive(Clone)]
pub struct MigrationService {
    repos: Repositories,
    catalog: Arc<Catalog>,
}

impl MigrationService {
    pub fn new(repos: Repositories, catalog: Arc<Catalog>) -> Self {
        Self { repos, catalog }
    }

    #[tracing::instrument(skip(self, bytes), fields(bytes = bytes.len()))]
    pub async fn import_customers(&self, bytes: &[u8]) -> AppResult<MigrationResult> {
        let table = CsvTable::parse(bytes)?;
        table.require(&["companyname", "contactname"])?;

        let customers = CustomerService::new(self.repos.clone());
        let mut result = MigrationResult::new(table.rows().len());

        for (i, row) in table.rows().iter().enumerate() {
            let row_num = i + 2;
            let request = CustomerRequest {
                company_name: table.field(row, "companyname").to_string(),
                contact_name: table.field(row, "contactname").to_string(),
                tax_id: table.field(row, "taxid").to_string(),
                phone: table.field(row, "phone").to_string(),
                address: table.field(row, "address").to_string(),
                contact_method: table.field(row, "contactmethod").to_string(),
            };

            if request.company_name.is_empty() {
                result.fail(format!("Row {}: Company name is required", row_num));
                continue;
            }
            if request.contact_name.is_empty() {
                result.fail(format!("Row {}: Contact name is required", row_num));
                continue;
            }

            let code = match table.field(row, "customercode") {
                "" => match customers.generate_code().await {
                    Ok(code) => code,
                    Err(e) => {
                        result.fail(format!(
                            "Row {}: Failed to generate customer code - {}",
                            row_num, e
                        ));
                        continue;
                    }
                },
                code => {
                    if self.repos.customers.get_by_code(code).await?.is_some() {
                        result.fail(format!(
                            "Row {}: Customer code '{}' already exists",
                            row_num, code
                        ));
                        continue;
                    }
                    code.to_string()
                }
            };

            let customer = Customer::from_request(request, code, Utc::now());
            match self.repos.customers.create(&customer).await {
                Ok(()) => result.success_rows += 1,
                Err(e) => result.fail(format!("Row {}: Failed to save customer - {}", row_num, e)),
            }
        }

        tracing::info!(
            success = result.success_rows,
            failed = result.failed_rows,
            "Customer import finished"
        );
        Ok(result)
    }

    #[tracing::instrument(skip(self, bytes), fields(bytes = bytes.len()))]
    pub async fn import_products(&self, bytes: &[u8]) -> AppResult<MigrationResult> {
        let table = CsvTable::parse(bytes)?;
        table.require(&["name", "category"])?;

        let skus = SkuGenerator::new(&self.catalog);
        let codes = MigrationCodeGenerator;
        let mut result = MigrationResult::new(table.rows().len());

        for (i, row) in table.rows().iter().enumerate() {
            let row_num = i + 2;
            let Some(stock) = Self::row_stock(&table, row) else {
                result.fail(format!("Row {}: Stock is out of range", row_num));
                continue;
            };
            let request = ProductRequest {
                name: table.field(row, "name").to_string(),
                description: table.field(row, "description").to_string(),
                color: table.field(row, "color").to_string(),
                size: table.field(row, "size").to_string(),
                category: table.field(row, "category").to_string(),
                image_url: None,
                price: Self::row_price(&table, row),
                stock,
            };

            if request.name.is_empty() {
                result.fail(format!("Row {}: Product name is required", row_num));
                continue;
            }
            if request.category.is_empty() {
                result.fail(format!("Row {}: Category is required", row_num));
                continue;
            }

            let sku_id = match table.field(row, "skuid") {
                "" => {
                    let existing = self.repos.products.sku_ids().await?;
                    let last = skus.next_sku_number(&request.category, &existing);
                    skus.generate_sku_id(&request.category, last)
                }
                sku_id => {
                    if self.repos.products.get_by_sku(sku_id).await?.is_some() {
                        result.fail(format!("Row {}: SKU ID '{}' already exists", row_num, sku_id));
                        continue;
                    }
                    sku_id.to_string()
                }
            };

            let code = codes.product_code(&request.category, &request.size, &request.color);
            let product = Product::from_request(request, sku_id, code, Utc::now());
            match self.repos.products.create(&product).await {
                Ok(()) => result.success_rows += 1,
                Err(e) => result.fail(format!("Row {}: Failed to save product - {}", row_num, e)),
            }
        }

        tracing::info!(
            success = result.success_rows,
            failed = result.failed_rows,
            "Product import finished"
        );
        Ok(result)
    }

    /// Prices land in each bucket's `latest`; unparsable cells are ignored
    fn row_price(table: &CsvTable, row: &StringRecord) -> Price {
        let cell = |name: &str| table.field(row, name).parse::<f64>().unwrap_or(0.0);
        let mut price = Price::default();
        price.purchase_vat.latest = cell("purchasepricevat");
        price.purchase_non_vat.latest = cell("purchasepricenonvat");
        price.sale_vat.latest = cell("salepricevat");
        price.sale_non_vat.latest = cell("salepricenonvat");
        price
    }

    /// Opening stock in `remaining`; actual stock defaults to their sum
    fn row_stock(table: &CsvTable, row: &StringRecord) -> Option<Stock> {
        let cell = |name: &str| table.field(row, name).parse::<i32>().unwrap_or(0);
        let mut stock = Stock::default();
        stock.vat.remaining = cell("stockvat");
        stock.non_vat.remaining = cell("stocknonvat");
        stock.actual_stock = match table.field(row, "actualstock") {
            "" => stock.vat.remaining.checked_add(stock.non_vat.remaining)?,
            _ => cell("actualstock"),
        };
        Some(stock)
    }

    pub async fn import_purchases(&self, bytes: &[u8]) -> AppResult<MigrationResult> {
        self.import_transactions(bytes, TransactionColumns::of(TransactionKind::Purchase))
            .await
    }

    pub async fn import_sales(&self, bytes: &[u8]) -> AppResult<MigrationResult> {
        self.import_transactions(bytes, TransactionColumns::of(TransactionKind::Sale))
            .await
    }

    #[tracing::instrument(skip(self, bytes, columns), fields(kind = columns.noun()))]
    async fn import_transactions(
        &self,
        bytes: &[u8],
        columns: TransactionColumns,
    ) -> AppResult<MigrationResult> {
        let table = CsvTable::parse(bytes)?;
        table.require(&columns.required())?;

        let mut result = MigrationResult::new(table.rows().len());

        for (key, rows) in group_rows(&table, columns) {
            let row_num = rows.first().map(|(n, _)| *n).unwrap_or(2);

            let group = match self.parse_group(&table, columns, &rows).await {
                Ok(group) => group,
                Err(e) => {
                    result.fail(format!("Group {}: {}", key, e));
                    continue;
                }
            };

            let stored = match columns.kind {
                TransactionKind::Purchase => self.store_purchase(group).await,
                TransactionKind::Sale => self.store_sale(group).await,
            };
            match stored {
                Ok(Ok(())) => result.success_rows += 1,
                Ok(Err(e)) => {
                    result.success_rows += 1;
                    result
                        .errors
                        .push(format!("Row {}: Failed to update products - {}", row_num, e));
                }
                Err(e) => result.fail(format!(
                    "Row {}: Failed to save {} - {}",
                    row_num,
                    columns.noun(),
                    e
                )),
            }
        }

        tracing::info!(
            success = result.success_rows,
            failed = result.failed_rows,
            "{} import finished",
            columns.noun()
        );
        Ok(result)
    }

    async fn parse_group(
        &self,
        table: &CsvTable,
        columns: TransactionColumns,
        rows: &[NumberedRow<'_>],
    ) -> Result<ParsedGroup, GroupError> {
        let Some((_, first)) = rows.first() else {
            return Err(GroupError::Storage(AppError::validation("no records in group")));
        };

        let customer_code = table.field(first, "customercode");
        let customer = self
            .repos
            .customers
            .get_by_code(customer_code)
            .await?
            .ok_or_else(|| GroupError::CustomerNotFound(customer_code.to_string()))?;

        let mut items = Vec::with_capacity(rows.len());
        for (_, row) in rows {
            let product_code = table.field(row, "productcode");
            let product = self
                .repos
                .products
                .get_by_code(product_code)
                .await?
                .ok_or_else(|| GroupError::ProductNotFound(product_code.to_string()))?;

            let quantity_cell = table.field(row, "quantity");
            let quantity: i32 = parse_or_zero(quantity_cell)
                .filter(|q: &i32| *q <= MAX_QUANTITY)
                .ok_or_else(|| GroupError::InvalidQuantity(quantity_cell.to_string()))?;
            let price_cell = table.field(row, "unitprice");
            let unit_price: Decimal = parse_or_zero(price_cell)
                .ok_or_else(|| GroupError::InvalidUnitPrice(price_cell.to_string()))?;

            items.push(LineItem {
                product_id: product.id.to_string(),
                product_name: product.name,
                product_code: product.code,
                quantity,
                unit_price,
                total_price: unit_price * Decimal::from(quantity),
            });
        }

        let code = table.field(first, columns.code);
        let notes = table.field(first, "notes");
        Ok(ParsedGroup {
            code: (!code.is_empty()).then(|| code.to_string()),
            date: parse_date(table.field(first, columns.date), Utc::now()),
            customer,
            is_vat: table.field(first, "isvat").eq_ignore_ascii_case("true"),
            shipping_cost: parse_or_zero(table.field(first, "shippingcost")).unwrap_or_default(),
            notes: (!notes.is_empty()).then(|| notes.to_string()),
            items,
        })
    }

    /// Outer error: the purchase was not stored. Inner error: a product posting failed.
    async fn store_purchase(&self, group: ParsedGroup) -> AppResult<AppResult<()>> {
        let code = match group.code {
            Some(code) => code,
            None => {
                PurchaseService::new(self.repos.clone(), self.catalog.clone())
                    .generate_code(group.is_vat)
                    .await?
            }
        };

        let request = PurchaseRequest {
            purchase_date: group.date,
            customer_id: group.customer.id.to_string(),
            notes: group.notes,
            items: group.items,
            is_vat: group.is_vat,
            shipping_cost: group.shipping_cost,
            payment: PaymentInfo::default(),
            warehouse: WarehouseInfo {
                actual_shipping: group.shipping_cost,
                ..Default::default()
            },
        };
        let mut purchase =
            Purchase::from_request(request, code, customer_snapshot(&group.customer), Utc::now());
        purchase.totals = Totals::compute(&purchase.items, purchase.is_vat, purchase.shipping_cost);

        self.repos.purchases.create(&purchase).await?;

        let stock = StockService::new(self.repos.clone());
        for item in &purchase.items {
            let posting = Posting::purchase(
                purchase.is_vat,
                item.quantity,
                as_price(item.unit_price),
                purchase.id,
                &purchase.purchase_code,
            )
            .migrated(purchase.id, &purchase.purchase_code);
            if let Err(e) = self.post_line(&stock, &item.product_id, &posting).await {
                return Ok(Err(e));
            }
        }
        Ok(Ok(()))
    }

    /// Like [`Self::store_purchase`]; stock counters are clamped at zero after the reduce
    async fn store_sale(&self, group: ParsedGroup) -> AppResult<AppResult<()>> {
        let code = match group.code {
            Some(code) => code,
            None => {
                SaleService::new(self.repos.clone(), self.catalog.clone())
                    .generate_code(group.is_vat)
                    .await?
            }
        };

        let request = SaleRequest {
            sale_date: group.date,
            customer_id: group.customer.id.to_string(),
            items: group.items,
            is_vat: group.is_vat,
            shipping_cost: group.shipping_cost,
            payment: PaymentInfo::default(),
            warehouse: WarehouseInfo {
                actual_shipping: group.shipping_cost,
                ..Default::default()
            },
            notes: group.notes,
            quotation_code: None,
            bank: Default::default(),
        };
        let mut sale = Sale::from_request(request, code, customer_snapshot(&group.customer), Utc::now());
        sale.totals = Totals::compute(&sale.items, sale.is_vat, sale.shipping_cost);

        self.repos.sales.create(&sale).await?;

        let stock = StockService::new(self.repos.clone());
        for item in &sale.items {
            let posting = Posting::sale(
                sale.is_vat,
                item.quantity,
                as_price(item.unit_price),
                sale.id,
                &sale.sale_code,
            )
            .migrated(sale.id, &sale.sale_code)
            .clamped();
            if let Err(e) = self.post_line(&stock, &item.product_id, &posting).await {
                return Ok(Err(e));
            }
        }
        Ok(Ok(()))
    }

    async fn post_line(&self, stock: &StockService, product_id: &str, posting: &Posting) -> AppResult<()> {
        let id = uuid::Uuid::parse_str(product_id)
            .map_err(|_| AppError::NotFound(format!("Product {}", product_id)))?;
        stock.post(id, posting).await.map(|_| ())
    }

    pub async fn status(&self) -> AppResult<MigrationStatus> {
        Ok(MigrationStatus {
            total_customers: self.repos.customers.count().await?,
            total_products: self.repos.products.count().await?,
            last_checked: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headers_are_case_insensitive_and_trimmed() {
        let table = CsvTable::parse(b" CompanyName ,contactName\nACME , Somchai\n").unwrap();
        assert!(table.require(&["companyname", "contactname"]).is_ok());
        let row = &table.rows()[0];
        assert_eq!(table.field(row, "companyname"), "ACME");
        assert_eq!(table.field(row, "contactname"), "Somchai");
        assert_eq!(table.field(row, "phone"), "");
    }

    #[test]
    fn test_header_only_file_is_rejected() {
        let err = CsvTable::parse(b"companyName,contactName\n").unwrap_err();
        assert_eq!(
            err.to_string(),
            "CSV file must have at least a header row and one data row"
        );
    }

    #[test]
    fn test_missing_required_header() {
        let table = CsvTable::parse(b"companyName\nACME\n").unwrap();
        assert_eq!(
            table.require(&["companyname", "contactname"]).unwrap_err().to_string(),
            "missing required header: contactname"
        );
    }

    #[test]
    fn test_short_rows_are_allowed() {
        let table = CsvTable::parse(b"name,category,size\nBox,Box\n").unwrap();
        assert_eq!(table.field(&table.rows()[0], "size"), "");
    }

    #[test]
    fn test_grouping_by_code_then_date_and_customer() {
        let csv = b"saleCode,saleDate,customerCode\n\
            S-1,2024-01-20,C-0001\n\
            ,2024-01-20,C-0001\n\
            S-1,2024-01-21,C-0002\n\
            ,2024-01-20,C-0001\n";
        let table = CsvTable::parse(csv).unwrap();
        let groups = group_rows(&table, TransactionColumns::of(TransactionKind::Sale));

        let keys: Vec<&str> = groups.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["S-1", "2024-01-20-C-0001"]);
        let rows: Vec<usize> = groups[1].1.iter().map(|(n, _)| *n).collect();
        assert_eq!(rows, vec![3, 5]);
    }

    #[test]
    fn test_parse_date_falls_back_to_now() {
        let now = Utc::now();
        assert_eq!(parse_date("15/01/2024", now), now);
        assert_eq!(
            parse_date("2024-01-15", now),
            Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_parse_or_zero() {
        assert_eq!(parse_or_zero::<i32>(""), Some(0));
        assert_eq!(parse_or_zero::<i32>("7"), Some(7));
        assert_eq!(parse_or_zero::<i32>("seven"), None);
        assert_eq!(parse_or_zero::<Decimal>("12.50"), Some(Decimal::new(1250, 2)));
    }

    #[test]
    fn test_entity_templates() {
        let entity: MigrationEntity = "purchases".parse().unwrap();
        assert!(entity.template().starts_with("purchaseCode,purchaseDate"));
        assert_eq!(entity.template_file_name(), "purchase_template.csv");
        assert!("lots".parse::<MigrationEntity>().is_err());
    }
}
