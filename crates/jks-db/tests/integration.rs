//! Offline unit tests for jks-db pool configuration and row conversion.
//! These tests do not require a live database connection.

use chrono::Utc;
use jks_core::{AppConfig, Category, Environment, Product};
use jks_db::{DbError, PoolConfig, ProductRow};
use rust_decimal::Decimal;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

fn row(category: Option<&str>) -> ProductRow {
    ProductRow {
        id: 11,
        name: "Kanchi Pattu".to_string(),
        price: 8000,
        min_qty: Some(1),
        category: category.map(str::to_string),
        image_url: Some("https://cdn.example.com/p.jpg".to_string()),
        image_path: Some("product-1-p.jpg".to_string()),
        discount_percent: Some(Decimal::new(1250, 2)),
        countdown_enabled: true,
        countdown_time: Some("01:00:00".to_string()),
        sale_end_date: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let app_config = AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000),
        log_level: "info".to_string(),
        public_base_url: "http://localhost:3000".to_string(),
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        storage_url: None,
        storage_key: None,
        storage_bucket: "product-images".to_string(),
        http_timeout_secs: 30,
        offer_sweep_cron: "0 * * * * *".to_string(),
    };

    let pool_config = PoolConfig::from_app_config(&app_config);
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

#[test]
fn product_row_converts_to_domain_product() {
    let product = Product::try_from(row(Some("Pattu"))).expect("convert");
    assert_eq!(product.id, 11);
    assert_eq!(product.category, Some(Category::Pattu));
    assert_eq!(product.discounted_price(), 7000);
    assert!(product.created_at.is_some());
}

#[test]
fn product_row_with_unknown_category_is_invalid() {
    let err = Product::try_from(row(Some("Linen"))).unwrap_err();
    assert!(matches!(err, DbError::InvalidRow(_)), "got {err:?}");
}

#[test]
fn product_row_without_category_is_accepted() {
    let product = Product::try_from(row(None)).expect("convert");
    assert_eq!(product.category, None);
}
