//! # Domain Types
//!
//! Types shared by the cart, the persisted payload and the UI bindings.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   NewLineItem   │   │    LineItem     │   │     Price       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │──►│  id             │   │  f64, finite    │       │
//! │  │  title          │   │  title          │   │  opaque to the  │       │
//! │  │  image_url      │   │  image_url      │   │  cart           │       │
//! │  │  price          │   │  price          │   └─────────────────┘       │
//! │  │                 │   │  quantity >= 1  │                              │
//! │  └─────────────────┘   └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Names
//! Fields serialize in snake_case (`image_url`). The camelCase spelling
//! `imageUrl` is accepted on input so payloads written by older clients
//! still hydrate.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;

// =============================================================================
// Price
// =============================================================================

/// Unit price of a product.
///
/// The cart never computes with prices; it stores whatever number the
/// catalog handed it. The only rule is that the number is finite, because
/// JSON cannot carry NaN or infinity.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize, TS)]
#[serde(transparent)]
#[ts(export)]
pub struct Price(f64);

impl Price {
    /// Creates a price, rejecting NaN and infinities.
    pub fn new(value: f64) -> Result<Self, ValidationError> {
        if !value.is_finite() {
            return Err(ValidationError::MustBeFinite {
                field: "price".to_string(),
            });
        }
        Ok(Price(value))
    }

    /// Returns the raw value.
    #[inline]
    pub const fn value(&self) -> f64 {
        self.0
    }

    /// Checks the invariant for prices that arrived through deserialization.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.0.is_finite()
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Line Item
// =============================================================================

/// One product currently in the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineItem {
    /// Product identifier; at most one line per id.
    pub id: String,

    /// Display name.
    pub title: String,

    /// Display image reference.
    #[serde(alias = "imageUrl")]
    pub image_url: String,

    /// Unit price at the time the product was first added.
    pub price: Price,

    /// Always at least 1 while the line is in the cart.
    pub quantity: u32,
}

impl LineItem {
    /// Creates the line for a product added for the first time.
    pub fn from_new(item: NewLineItem) -> Self {
        LineItem {
            id: item.id,
            title: item.title,
            image_url: item.image_url,
            price: item.price,
            quantity: 1,
        }
    }
}

// =============================================================================
// New Line Item
// =============================================================================

/// Input to `add_to_cart`: a product without a quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewLineItem {
    pub id: String,
    pub title: String,
    #[serde(alias = "imageUrl")]
    pub image_url: String,
    pub price: Price,
}

impl NewLineItem {
    /// Creates a new product entry.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        image_url: impl Into<String>,
        price: Price,
    ) -> Self {
        NewLineItem {
            id: id.into(),
            title: title.into(),
            image_url: image_url.into(),
            price,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_rejects_non_finite() {
        assert!(Price::new(10.0).is_ok());
        assert!(Price::new(0.0).is_ok());
        assert!(Price::new(f64::NAN).is_err());
        assert!(Price::new(f64::INFINITY).is_err());
    }

    #[test]
    fn test_new_line_starts_at_one() {
        let item = NewLineItem::new("A", "Shoe", "u", Price::new(10.0).unwrap());
        let line = LineItem::from_new(item);

        assert_eq!(line.id, "A");
        assert_eq!(line.quantity, 1);
        assert_eq!(line.price.value(), 10.0);
    }

    #[test]
    fn test_line_item_wire_names() {
        let line = LineItem::from_new(NewLineItem::new(
            "A",
            "Shoe",
            "https://cdn/shoe.png",
            Price::new(10.5).unwrap(),
        ));
        let json = serde_json::to_value(&line).unwrap();

        assert_eq!(json["image_url"], "https://cdn/shoe.png");
        assert_eq!(json["price"], 10.5);
        assert_eq!(json["quantity"], 1);
    }

    #[test]
    fn test_camel_case_image_url_accepted() {
        let json = r#"{"id":"A","title":"Shoe","imageUrl":"u","price":10,"quantity":2}"#;
        let line: LineItem = serde_json::from_str(json).unwrap();

        assert_eq!(line.image_url, "u");
        assert_eq!(line.quantity, 2);
    }
}
