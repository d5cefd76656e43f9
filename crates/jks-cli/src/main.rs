mod api;
mod countdown;
mod storefront;

use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use jks_core::{
    format_hms, render_invoice, CategoryFilter, Countdown, Product, QuantityChange, SortOption,
};
use jks_platform::LinkShortener;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::api::StoreApi;
use crate::countdown::CountdownEvent;
use crate::storefront::Storefront;

#[derive(Debug, Parser)]
#[command(name = "jks-cli")]
#[command(about = "JKS sarees storefront client")]
struct Cli {
    /// Storefront API base URL (overrides `JKS_API_URL`)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Browse the catalog
    Catalog {
        /// Case-insensitive name search
        #[arg(long, default_value = "")]
        search: String,
        /// `All` or one of Cotton, Fancy, Gadwal, Silk, Pattu
        #[arg(long, default_value = "All")]
        category: CategoryFilter,
        /// default, price-low, price-high, offer, or range-MIN-MAX
        #[arg(long, default_value = "default")]
        sort: SortOption,
        /// 1-based page number
        #[arg(long, default_value = "1")]
        page: usize,
    },
    /// Build a cart and place the order
    Checkout {
        /// Product to add, as `ID` or `IDxN` for N minimum-quantity steps
        #[arg(long = "item", value_name = "ID[xN]", required = true)]
        items: Vec<CartItem>,
        /// Print the priced cart without placing an order
        #[arg(long)]
        quote: bool,
    },
    /// Print the invoice for an order
    Invoice {
        /// Order id
        id: Uuid,
    },
    /// Follow live offer countdowns on a catalog page until they end
    Watch {
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long, default_value = "All")]
        category: CategoryFilter,
        #[arg(long, default_value = "1")]
        page: usize,
    },
}

/// One `--item` argument: a product id and how many quantity steps to buy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CartItem {
    product_id: i64,
    steps: u32,
}

impl std::str::FromStr for CartItem {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (id, steps) = match s.split_once('x') {
            Some((id, steps)) => (id, steps),
            None => (s, "1"),
        };
        let product_id = id
            .trim()
            .parse::<i64>()
            .map_err(|_| format!("invalid product id in {s:?}"))?;
        let steps = steps
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|n| *n >= 1)
            .ok_or_else(|| format!("step count in {s:?} must be a positive integer"))?;
        Ok(Self { product_id, steps })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut config = jks_core::load_client_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Some(url) = cli.api_url {
        config.api_url = url;
    }
    let api = StoreApi::with_base_url(&config.api_url, config.http_timeout_secs)?;

    match cli.command {
        Commands::Catalog {
            search,
            category,
            sort,
            page,
        } => run_catalog(&api, &search, category, sort, page).await,
        Commands::Checkout { items, quote } => {
            let shortener = LinkShortener::new(config.http_timeout_secs)?;
            run_checkout(&api, &shortener, &items, quote).await
        }
        Commands::Invoice { id } => run_invoice(&api, id).await,
        Commands::Watch {
            search,
            category,
            page,
        } => run_watch(api, &search, category, page).await,
    }
}

async fn run_catalog(
    api: &StoreApi,
    search: &str,
    category: CategoryFilter,
    sort: SortOption,
    page: usize,
) -> anyhow::Result<()> {
    let mut store = Storefront::new();
    store.refresh(api).await.context("failed to load catalog")?;
    if store.products().is_empty() {
        println!("the catalog is empty");
        return Ok(());
    }
    store.set_search(search);
    store.set_category(category);
    store.set_sort(sort);
    store.set_page(page);

    let page = store.visible();
    if page.items.is_empty() {
        println!("no products match");
        return Ok(());
    }

    let now = Utc::now();
    for product in &page.items {
        println!("{}", catalog_row(product, now));
    }
    println!(
        "page {} of {} ({} products)",
        page.page, page.total_pages, page.total_items
    );
    Ok(())
}

fn catalog_row(product: &Product, now: chrono::DateTime<Utc>) -> String {
    let category = product.category.map_or("-", |c| c.as_str());
    let mut row = format!(
        "{:>5}  {:<32} {:<7} ₹{:>7}",
        product.id,
        product.name,
        category,
        product.discounted_price()
    );
    if let Some(discount) = product.discount_percent.filter(|_| product.has_offer()) {
        row.push_str(&format!("  (was ₹{}, {}% off)", product.price, discount.normalize()));
    }
    let countdown = Countdown::start(product, now);
    if countdown.is_running() {
        row.push_str(&format!(
            "  ends in {}",
            format_hms(i64::try_from(countdown.remaining()).unwrap_or(i64::MAX))
        ));
    }
    row
}

async fn run_checkout(
    api: &StoreApi,
    shortener: &LinkShortener,
    items: &[CartItem],
    quote: bool,
) -> anyhow::Result<()> {
    let mut store = Storefront::new();
    store.refresh(api).await.context("failed to load catalog")?;

    for item in items {
        store.add_to_cart(item.product_id)?;
        for _ in 1..item.steps {
            store.update_quantity(item.product_id, QuantityChange::Increase);
        }
    }

    if quote {
        let draft = store.quote()?;
        for line in &draft.items {
            println!(
                "{:<32} {:>4} x ₹{:>7} = ₹{:>8}",
                line.name, line.quantity, line.unit_price, line.line_total
            );
        }
        println!("Subtotal:    ₹{}", draft.subtotal);
        println!("GST:         ₹{}", draft.gst);
        println!("Grand Total: ₹{}", draft.total);
        return Ok(());
    }

    match store.checkout(api, shortener).await? {
        Some(receipt) => {
            println!("order {} placed, total ₹{}", receipt.order.id, receipt.order.total);
            println!("invoice: {}", receipt.invoice_link);
            println!("send on WhatsApp: {}", receipt.whatsapp_url);
        }
        None => println!("cart is empty; nothing to order"),
    }
    Ok(())
}

async fn run_invoice(api: &StoreApi, id: Uuid) -> anyhow::Result<()> {
    let order = match api.get_order(id).await {
        Ok(order) => order,
        Err(e) if e.is_not_found() => anyhow::bail!("order {id} not found"),
        Err(e) => return Err(e.into()),
    };
    print!("{}", render_invoice(&order));
    Ok(())
}

async fn run_watch(
    api: StoreApi,
    search: &str,
    category: CategoryFilter,
    page: usize,
) -> anyhow::Result<()> {
    let api = Arc::new(api);
    let mut store = Storefront::new();
    store.refresh(&api).await.context("failed to load catalog")?;
    store.set_search(search);
    store.set_category(category);
    store.set_page(page);

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    if store.start_countdowns(&api, &tx, Utc::now()) == 0 {
        println!("no running offers on this page");
        return Ok(());
    }

    loop {
        tokio::select! {
            Some(event) = rx.recv() => match event {
                CountdownEvent::Tick { product_id, remaining } => {
                    let name = store.product(product_id).map_or("?", |p| p.name.as_str());
                    println!(
                        "{name}: {}",
                        format_hms(i64::try_from(remaining).unwrap_or(i64::MAX))
                    );
                }
                CountdownEvent::Expired { product_id, cleared } => {
                    store.finish_countdown(product_id);
                    println!("offer on product {product_id} ended (cleared: {cleared})");
                    if let Err(e) = store.refresh(&api).await {
                        tracing::warn!(error = %e, "catalog refresh after expiry failed");
                    }
                    if store.start_countdowns(&api, &tx, Utc::now()) == 0 {
                        println!("no running offers left");
                        break;
                    }
                }
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted; stopping countdowns");
                break;
            }
        }
    }

    store.stop_countdowns();
    Ok(())
}
