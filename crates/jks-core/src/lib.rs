pub mod app_config;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod countdown;
pub mod invoice;
pub mod messaging;
pub mod orders;
pub mod pricing;
pub mod products;
pub mod records;

pub use app_config::{AppConfig, ClientConfig, Environment};
pub use cart::{Cart, CartLine, QuantityChange};
pub use catalog::{
    filter_and_sort, paginate, total_pages, CatalogQuery, CategoryFilter, Page, SortOption,
    PAGE_SIZE,
};
pub use config::{
    load_app_config, load_app_config_from_env, load_client_config, load_client_config_from_env,
};
pub use countdown::{
    format_hms, parse_duration, validate_countdown_time, Countdown, CountdownState, Tick,
};
pub use invoice::render_invoice;
pub use messaging::{encode_component, invoice_url, order_message, whatsapp_link};
pub use orders::{CheckoutError, Order, OrderDraft, OrderLine, MIN_ORDER_TOTAL};
pub use pricing::{discount_percent_from_amount, discounted_price, surcharge};
pub use products::{Category, Product, ProductDraft, ValidProduct, MAX_IMAGE_BYTES};
pub use records::{normalize_product, LooseNumber, ProductRecord};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("invalid category: {0}")]
    InvalidCategory(String),
    #[error("invalid sort option: {0}")]
    InvalidSortOption(String),
    #[error("invalid countdown duration \"{0}\"")]
    InvalidDuration(String),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("malformed product record {id}: {reason}")]
    MalformedRecord { id: String, reason: String },
}
