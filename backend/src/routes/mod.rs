//! Route definitions for the Goodpack inventory API

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, patch, post},
    Router,
};

use crate::{handlers, AppState, Config};

/// Multipart framing on top of the file itself
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Create API routes
pub fn api_routes(config: &Config) -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/products", product_routes(config))
        .nest("/stock-adjustments", stock_adjustment_routes())
        .route("/categories", get(handlers::list_categories))
        .nest("/config", config_routes())
        .nest("/customers", customer_routes())
        .nest("/purchases", purchase_routes())
        .nest("/sales", sale_routes())
        .nest("/quotations", quotation_routes())
        .nest("/migration", migration_routes(config))
}

/// Product routes; `:id` accepts a product id or a SKU
fn product_routes(config: &Config) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_products).post(handlers::create_product),
        )
        .route("/inventory", get(handlers::get_inventory_summary))
        .route("/low-stock", get(handlers::get_low_stock_products))
        .route("/category/:category", get(handlers::get_products_by_category))
        .route(
            "/:id",
            get(handlers::get_product)
                .put(handlers::update_product)
                .delete(handlers::delete_product),
        )
        .route("/:id/stock", patch(handlers::update_product_stock))
        .route("/:id/price", patch(handlers::update_product_price))
        .route(
            "/:id/image",
            post(handlers::upload_product_image)
                .delete(handlers::delete_product_image)
                .layer(DefaultBodyLimit::max(
                    config.uploads.max_image_bytes + MULTIPART_OVERHEAD,
                )),
        )
        .route("/:id/qr", get(handlers::get_product_qr))
        .route("/:id/stock-adjustments", post(handlers::adjust_stock))
        .route("/:id/stock-history", get(handlers::get_stock_history))
}

/// Stock audit trail routes
fn stock_adjustment_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_stock_adjustments))
        .route("/source", get(handlers::get_stock_adjustments_by_source))
        .route("/:id", delete(handlers::reverse_stock_adjustment))
}

/// Catalog tables
fn config_routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(handlers::get_config_categories))
        .route("/colors", get(handlers::get_config_colors))
        .route("/accounts", get(handlers::get_config_accounts))
}

fn customer_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_customers).post(handlers::create_customer),
        )
        .route(
            "/:id",
            get(handlers::get_customer)
                .put(handlers::update_customer)
                .delete(handlers::delete_customer),
        )
}

fn purchase_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_purchases).post(handlers::create_purchase),
        )
        .route(
            "/:id",
            get(handlers::get_purchase)
                .put(handlers::update_purchase)
                .delete(handlers::delete_purchase),
        )
}

fn sale_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_sales).post(handlers::create_sale))
        .route(
            "/:id",
            get(handlers::get_sale)
                .put(handlers::update_sale)
                .delete(handlers::delete_sale),
        )
}

fn quotation_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_quotations).post(handlers::create_quotation),
        )
        .route(
            "/:id",
            get(handlers::get_quotation)
                .put(handlers::update_quotation)
                .delete(handlers::delete_quotation),
        )
        .route("/:id/copy-to-sale", get(handlers::copy_quotation_to_sale))
}

/// CSV import routes; `:entity` is customers, products, purchases or sales
fn migration_routes(config: &Config) -> Router<AppState> {
    Router::new()
        .route("/status", get(handlers::get_migration_status))
        .route(
            "/:entity/csv",
            post(handlers::import_csv).layer(DefaultBodyLimit::max(
                config.migration.max_csv_bytes + MULTIPART_OVERHEAD,
            )),
        )
        .route("/:entity/template", get(handlers::get_csv_template))
}
