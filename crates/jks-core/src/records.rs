//! Loose wire records and their normalization into [`Product`].
//!
//! Product rows arrive as JSON from the API (and, historically, from the
//! hosted table API), where numeric columns are sometimes strings. The raw
//! record accepts either form; [`normalize_product`] turns it into the strict
//! domain type or explains what is wrong with it.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::products::{Category, Product};
use crate::CoreError;

/// A JSON number that may also arrive as a string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum LooseNumber {
    Int(i64),
    Float(f64),
    Text(String),
}

impl LooseNumber {
    #[must_use]
    pub fn to_decimal(&self) -> Option<Decimal> {
        match self {
            LooseNumber::Int(n) => Some(Decimal::from(*n)),
            LooseNumber::Float(f) => Decimal::try_from(*f).ok(),
            LooseNumber::Text(s) => s.trim().parse::<Decimal>().ok(),
        }
    }

    /// Whole-number value; `"1200.00"` is accepted, `"12.5"` is not.
    #[must_use]
    pub fn to_i64(&self) -> Option<i64> {
        if let LooseNumber::Int(n) = self {
            return Some(*n);
        }
        let d = self.to_decimal()?;
        if d.fract().is_zero() {
            d.to_i64()
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductRecord {
    pub id: LooseNumber,
    pub name: Option<String>,
    pub price: LooseNumber,
    pub min_qty: Option<LooseNumber>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub image_path: Option<String>,
    pub discount_percent: Option<LooseNumber>,
    pub countdown_enabled: Option<bool>,
    pub countdown_time: Option<String>,
    pub sale_end_date: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Normalizes a raw [`ProductRecord`] into a [`Product`].
///
/// Empty strings count as absent for optional text columns.
///
/// # Errors
///
/// Returns [`CoreError::MalformedRecord`] if the id or price is not a whole
/// number, the discount is not numeric, the category is unknown, or the sale
/// end date is not RFC 3339.
pub fn normalize_product(record: ProductRecord) -> Result<Product, CoreError> {
    let raw_id = match &record.id {
        LooseNumber::Int(n) => n.to_string(),
        LooseNumber::Float(f) => f.to_string(),
        LooseNumber::Text(s) => s.clone(),
    };
    let malformed = |reason: String| CoreError::MalformedRecord {
        id: raw_id.clone(),
        reason,
    };

    let id = record
        .id
        .to_i64()
        .ok_or_else(|| malformed("id is not a whole number".into()))?;
    let price = record
        .price
        .to_i64()
        .ok_or_else(|| malformed(format!("price {:?} is not a whole number", record.price)))?;

    let min_qty = match record.min_qty {
        None => None,
        Some(ref q) => Some(
            q.to_i64()
                .ok_or_else(|| malformed(format!("min_qty {q:?} is not a whole number")))?,
        ),
    };

    let discount_percent = match record.discount_percent {
        None => None,
        Some(ref d) => Some(
            d.to_decimal()
                .ok_or_else(|| malformed(format!("discount_percent {d:?} is not numeric")))?,
        ),
    };

    let category = match non_empty(record.category) {
        None => None,
        Some(raw) => Some(
            raw.parse::<Category>()
                .map_err(|_| malformed(format!("unknown category {raw:?}")))?,
        ),
    };

    let sale_end_date = match non_empty(record.sale_end_date) {
        None => None,
        Some(raw) => Some(
            DateTime::parse_from_rfc3339(&raw)
                .map_err(|e| malformed(format!("sale_end_date {raw:?}: {e}")))?
                .with_timezone(&Utc),
        ),
    };

    Ok(Product {
        id,
        name: record.name.unwrap_or_default(),
        price,
        min_qty,
        category,
        image_url: non_empty(record.image_url),
        image_path: non_empty(record.image_path),
        discount_percent,
        countdown_enabled: record.countdown_enabled.unwrap_or(false),
        countdown_time: non_empty(record.countdown_time),
        sale_end_date,
        created_at: record.created_at,
        updated_at: record.updated_at,
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(json: &str) -> ProductRecord {
        serde_json::from_str(json).expect("record json")
    }

    #[test]
    fn numbers_as_strings_are_accepted() {
        let product = normalize_product(record(
            r#"{"id":"12","name":"Silk","price":"1200.00","min_qty":"3",
                "category":"Silk","discount_percent":"12.50"}"#,
        ))
        .expect("normalize");
        assert_eq!(product.id, 12);
        assert_eq!(product.price, 1200);
        assert_eq!(product.min_qty, Some(3));
        assert_eq!(product.category, Some(Category::Silk));
        assert_eq!(product.discount_percent, Some(Decimal::new(1250, 2)));
    }

    #[test]
    fn plain_numbers_are_accepted() {
        let product = normalize_product(record(
            r#"{"id":4,"name":"Cotton","price":900,"discount_percent":7.5,
                "countdown_enabled":true,"countdown_time":"00:30:00",
                "sale_end_date":"2026-03-01T10:00:00Z"}"#,
        ))
        .expect("normalize");
        assert_eq!(product.price, 900);
        assert_eq!(product.discount_percent, Some(Decimal::new(75, 1)));
        assert!(product.countdown_enabled);
        assert!(product.sale_end_date.is_some());
        assert_eq!(product.category, None);
    }

    #[test]
    fn empty_strings_become_absent() {
        let product = normalize_product(record(
            r#"{"id":1,"name":"Fancy","price":500,"category":"","image_url":"",
                "countdown_time":"","sale_end_date":""}"#,
        ))
        .expect("normalize");
        assert_eq!(product.category, None);
        assert_eq!(product.image_url, None);
        assert_eq!(product.countdown_time, None);
        assert_eq!(product.sale_end_date, None);
        assert!(!product.countdown_enabled);
    }

    #[test]
    fn fractional_price_is_malformed() {
        let err = normalize_product(record(r#"{"id":9,"name":"x","price":"12.5"}"#)).unwrap_err();
        assert!(
            matches!(err, CoreError::MalformedRecord { ref id, .. } if id == "9"),
            "got {err:?}"
        );
    }

    #[test]
    fn garbage_discount_is_malformed() {
        let err = normalize_product(record(
            r#"{"id":9,"name":"x","price":100,"discount_percent":"ten"}"#,
        ))
        .unwrap_err();
        assert!(matches!(err, CoreError::MalformedRecord { .. }));
    }

    #[test]
    fn unknown_category_is_malformed() {
        let err = normalize_product(record(
            r#"{"id":9,"name":"x","price":100,"category":"Linen"}"#,
        ))
        .unwrap_err();
        assert!(matches!(err, CoreError::MalformedRecord { .. }));
    }

    #[test]
    fn loose_number_conversions() {
        assert_eq!(LooseNumber::Int(5).to_i64(), Some(5));
        assert_eq!(LooseNumber::Float(5.0).to_i64(), Some(5));
        assert_eq!(LooseNumber::Float(5.5).to_i64(), None);
        assert_eq!(LooseNumber::Text(" 42 ".into()).to_i64(), Some(42));
        assert_eq!(LooseNumber::Text("n/a".into()).to_decimal(), None);
    }
}
