//! Live integration tests for jks-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness. The `migrations` path is relative to the crate root
//! (`crates/jks-db/`), so `"../../migrations"` resolves to the workspace
//! migration directory.

use chrono::{Duration, Utc};
use jks_core::{Category, OrderDraft, OrderLine, ValidProduct};
use jks_db::{
    create_product, delete_product, expire_lapsed_offers, expire_offer, get_order, get_product,
    get_whatsapp_number, health_check, insert_order, list_products_by_price,
    list_products_newest_first, set_whatsapp_number, update_product, DbError,
};
use rust_decimal::Decimal;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn valid_product(name: &str, price: i64) -> ValidProduct {
    ValidProduct {
        name: name.to_string(),
        price,
        min_qty: 1,
        category: Category::Cotton,
        image_url: Some(format!("https://cdn.example.com/{price}.jpg")),
        image_path: Some(format!("product-{price}.jpg")),
        discount_percent: Decimal::ZERO,
        countdown_enabled: false,
        countdown_time: None,
        sale_end_date: None,
    }
}

fn on_sale(mut product: ValidProduct, ends_in: Duration) -> ValidProduct {
    product.discount_percent = Decimal::from(20);
    product.countdown_enabled = true;
    product.countdown_time = Some("01:00:00".to_string());
    product.sale_end_date = Some(Utc::now() + ends_in);
    product
}

fn draft() -> OrderDraft {
    OrderDraft {
        items: vec![OrderLine {
            product_id: 1,
            name: "Gadwal Silk".to_string(),
            unit_price: 1080,
            quantity: 5,
            image_url: Some("https://cdn.example.com/1.jpg".to_string()),
            line_total: 5400,
        }],
        subtotal: 5400,
        gst: 270,
        total: 5670,
    }
}

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn health_check_passes(pool: sqlx::PgPool) {
    health_check(&pool).await.expect("health check");
}

#[sqlx::test(migrations = "../../migrations")]
async fn create_then_get_round_trips_fields(pool: sqlx::PgPool) {
    let mut input = valid_product("Mangalagiri Cotton", 1500);
    input.discount_percent = Decimal::new(1250, 2);
    let created = create_product(&pool, &input).await.expect("create");

    let fetched = get_product(&pool, created.id)
        .await
        .expect("get")
        .expect("product exists");
    assert_eq!(fetched.name, "Mangalagiri Cotton");
    assert_eq!(fetched.category, Some(Category::Cotton));
    assert_eq!(fetched.discount_percent, Some(Decimal::new(1250, 2)));
    assert_eq!(fetched.image_path.as_deref(), Some("product-1500.jpg"));
}

#[sqlx::test(migrations = "../../migrations")]
async fn list_orders_differ_for_catalog_and_admin(pool: sqlx::PgPool) {
    let a = create_product(&pool, &valid_product("A", 3000)).await.unwrap();
    let b = create_product(&pool, &valid_product("B", 1000)).await.unwrap();
    let c = create_product(&pool, &valid_product("C", 2000)).await.unwrap();

    let by_price: Vec<i64> = list_products_by_price(&pool)
        .await
        .unwrap()
        .iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(by_price, vec![b.id, c.id, a.id]);

    let newest: Vec<i64> = list_products_newest_first(&pool)
        .await
        .unwrap()
        .iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(newest, vec![c.id, b.id, a.id]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn update_without_image_keeps_stored_image(pool: sqlx::PgPool) {
    let created = create_product(&pool, &valid_product("Fancy", 1200)).await.unwrap();

    let mut edit = valid_product("Fancy Party Wear", 1300);
    edit.category = Category::Fancy;
    edit.image_url = None;
    edit.image_path = None;
    let updated = update_product(&pool, created.id, &edit).await.expect("update");
    assert_eq!(updated.replaced_image_path, None);
    let updated = updated.product;

    assert_eq!(updated.name, "Fancy Party Wear");
    assert_eq!(updated.price, 1300);
    assert_eq!(updated.category, Some(Category::Fancy));
    assert_eq!(updated.image_url, created.image_url);
    assert_eq!(updated.image_path, created.image_path);
}

#[sqlx::test(migrations = "../../migrations")]
async fn update_with_new_image_reports_the_replaced_path(pool: sqlx::PgPool) {
    let created = create_product(&pool, &valid_product("Gadwal", 3100)).await.unwrap();

    let mut edit = valid_product("Gadwal", 3100);
    edit.image_url = Some("https://cdn.example.com/new.jpg".to_string());
    edit.image_path = Some("product-new.jpg".to_string());
    let updated = update_product(&pool, created.id, &edit).await.expect("update");

    assert_eq!(updated.replaced_image_path.as_deref(), Some("product-3100.jpg"));
    assert_eq!(updated.product.image_path.as_deref(), Some("product-new.jpg"));
    assert_eq!(
        updated.product.image_url.as_deref(),
        Some("https://cdn.example.com/new.jpg")
    );

    // Re-saving the same image replaces nothing.
    let again = update_product(&pool, created.id, &edit).await.expect("update");
    assert_eq!(again.replaced_image_path, None);
}

#[sqlx::test(migrations = "../../migrations")]
async fn update_missing_product_is_not_found(pool: sqlx::PgPool) {
    let err = update_product(&pool, 9999, &valid_product("X", 100))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::NotFound), "got {err:?}");
}

#[sqlx::test(migrations = "../../migrations")]
async fn delete_returns_image_path(pool: sqlx::PgPool) {
    let created = create_product(&pool, &valid_product("Silk", 6000)).await.unwrap();

    let deleted = delete_product(&pool, created.id).await.expect("delete");
    assert_eq!(deleted.image_path.as_deref(), Some("product-6000.jpg"));
    assert!(get_product(&pool, created.id).await.unwrap().is_none());

    let again = delete_product(&pool, created.id).await.unwrap_err();
    assert!(matches!(again, DbError::NotFound));
}

#[sqlx::test(migrations = "../../migrations")]
async fn expire_offer_clears_discount_and_countdown(pool: sqlx::PgPool) {
    let created = create_product(
        &pool,
        &on_sale(valid_product("Pattu", 8000), Duration::hours(1)),
    )
    .await
    .unwrap();

    assert!(expire_offer(&pool, created.id).await.unwrap());
    let p = get_product(&pool, created.id).await.unwrap().unwrap();
    assert_eq!(p.discount_percent, Some(Decimal::ZERO));
    assert!(!p.countdown_enabled);
    assert!(p.countdown_time.is_none());
    assert!(p.sale_end_date.is_none());
    assert_eq!(p.discounted_price(), 8000);

    // Idempotent.
    assert!(expire_offer(&pool, created.id).await.unwrap());
    assert!(!expire_offer(&pool, 424_242).await.unwrap());
}

#[sqlx::test(migrations = "../../migrations")]
async fn sweep_clears_only_lapsed_offers(pool: sqlx::PgPool) {
    let lapsed = create_product(
        &pool,
        &on_sale(valid_product("Lapsed", 1000), Duration::minutes(-5)),
    )
    .await
    .unwrap();
    let running = create_product(
        &pool,
        &on_sale(valid_product("Running", 2000), Duration::hours(2)),
    )
    .await
    .unwrap();

    let cleared = expire_lapsed_offers(&pool, Utc::now()).await.unwrap();
    assert_eq!(cleared, vec![lapsed.id]);

    let still = get_product(&pool, running.id).await.unwrap().unwrap();
    assert_eq!(still.discount_percent, Some(Decimal::from(20)));
    assert!(still.countdown_enabled);

    assert!(expire_lapsed_offers(&pool, Utc::now()).await.unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn insert_order_then_get(pool: sqlx::PgPool) {
    let order = insert_order(&pool, &draft()).await.expect("insert");
    assert_eq!(order.total, 5670);

    let fetched = get_order(&pool, order.id)
        .await
        .expect("get")
        .expect("order exists");
    assert_eq!(fetched.items, draft().items);
    assert_eq!(fetched.subtotal, 5400);
    assert_eq!(fetched.gst, 270);
}

#[sqlx::test(migrations = "../../migrations")]
async fn unknown_order_is_none(pool: sqlx::PgPool) {
    assert!(get_order(&pool, Uuid::new_v4()).await.unwrap().is_none());
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn whatsapp_number_starts_empty_and_updates(pool: sqlx::PgPool) {
    assert_eq!(get_whatsapp_number(&pool).await.unwrap(), "");

    set_whatsapp_number(&pool, "919876543210").await.unwrap();
    assert_eq!(get_whatsapp_number(&pool).await.unwrap(), "919876543210");

    set_whatsapp_number(&pool, "918888888888").await.unwrap();
    assert_eq!(get_whatsapp_number(&pool).await.unwrap(), "918888888888");
}
