use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::countdown::validate_countdown_time;
use crate::pricing::{discount_percent_from_amount, discounted_price};
use crate::CoreError;

/// Largest product image the admin surface accepts (1 MiB).
pub const MAX_IMAGE_BYTES: usize = 1024 * 1024;

/// The fixed set of saree categories the shop sells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Cotton,
    Fancy,
    Gadwal,
    Silk,
    Pattu,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Cotton,
        Category::Fancy,
        Category::Gadwal,
        Category::Silk,
        Category::Pattu,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Cotton => "Cotton",
            Category::Fancy => "Fancy",
            Category::Gadwal => "Gadwal",
            Category::Silk => "Silk",
            Category::Pattu => "Pattu",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| CoreError::InvalidCategory(s.to_string()))
    }
}

/// A product as listed in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    /// Whole rupees.
    pub price: i64,
    /// Minimum order quantity, also the step the cart moves in.
    pub min_qty: Option<i64>,
    pub category: Option<Category>,
    pub image_url: Option<String>,
    /// Object-storage path of the uploaded image, used to delete it.
    pub image_path: Option<String>,
    pub discount_percent: Option<Decimal>,
    pub countdown_enabled: bool,
    /// Sale duration as `HH:MM:SS`.
    pub countdown_time: Option<String>,
    pub sale_end_date: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Product {
    /// Unit price after the product's discount.
    #[must_use]
    pub fn discounted_price(&self) -> i64 {
        discounted_price(self.price, self.discount_percent)
    }

    /// `true` when the product carries a positive discount.
    #[must_use]
    pub fn has_offer(&self) -> bool {
        self.discount_percent.is_some_and(|d| d > Decimal::ZERO)
    }

    /// Quantity step for the cart; unset or non-positive minimums count as 1.
    #[must_use]
    pub fn quantity_step(&self) -> i64 {
        self.min_qty.filter(|q| *q > 0).unwrap_or(1)
    }
}

/// Admin input for creating or replacing a product.
///
/// The discount may be given either as a percentage or as an absolute
/// "customer saves" amount; the amount wins when both are present.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductDraft {
    pub name: String,
    pub price: i64,
    pub min_qty: i64,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub image_path: Option<String>,
    pub discount_percent: Option<Decimal>,
    pub discount_amount: Option<Decimal>,
    #[serde(default)]
    pub countdown_enabled: bool,
    pub countdown_time: Option<String>,
    pub sale_end_date: Option<DateTime<Utc>>,
}

/// A draft that passed validation, ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidProduct {
    pub name: String,
    pub price: i64,
    pub min_qty: i64,
    pub category: Category,
    pub image_url: Option<String>,
    pub image_path: Option<String>,
    pub discount_percent: Decimal,
    pub countdown_enabled: bool,
    pub countdown_time: Option<String>,
    pub sale_end_date: Option<DateTime<Utc>>,
}

impl ProductDraft {
    /// Validates the draft. `require_image` is set for creates; updates may
    /// keep the existing image.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] or [`CoreError::InvalidCategory`]
    /// describing the first problem found.
    pub fn validate(self, require_image: bool) -> Result<ValidProduct, CoreError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(CoreError::Validation("name is required".into()));
        }
        if self.price <= 0 {
            return Err(CoreError::Validation("price must be greater than 0".into()));
        }
        if self.min_qty <= 0 {
            return Err(CoreError::Validation(
                "minimum quantity must be greater than 0".into(),
            ));
        }
        let category = match self.category.as_deref().map(str::trim) {
            None | Some("") => {
                return Err(CoreError::Validation("category is required".into()));
            }
            Some(raw) => raw.parse::<Category>()?,
        };

        let image_url = self
            .image_url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());
        let image_path = self
            .image_path
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());
        // The path is what a later delete removes, so it must describe the URL.
        if image_url.is_some() != image_path.is_some() {
            return Err(CoreError::Validation(
                "image_url and image_path must be given together".into(),
            ));
        }
        if require_image && image_url.is_none() {
            return Err(CoreError::Validation("an image is required".into()));
        }

        let countdown_time = self
            .countdown_time
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        if let Some(ref t) = countdown_time {
            validate_countdown_time(t)?;
        }

        let discount_percent = match (self.discount_amount, self.discount_percent) {
            (Some(amount), _) => discount_percent_from_amount(self.price, amount),
            (None, Some(pct)) => pct,
            (None, None) => Decimal::ZERO,
        };
        if discount_percent < Decimal::ZERO || discount_percent > Decimal::ONE_HUNDRED {
            return Err(CoreError::Validation(format!(
                "discount percent must be between 0 and 100, got {discount_percent}"
            )));
        }

        Ok(ValidProduct {
            name,
            price: self.price,
            min_qty: self.min_qty,
            category,
            image_url,
            image_path,
            discount_percent,
            countdown_enabled: self.countdown_enabled,
            countdown_time,
            sale_end_date: self.sale_end_date,
        })
    }
}
