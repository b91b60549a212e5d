//! # Persisted Payload
//!
//! Encoding and decoding of the value stored under the cart key.
//!
//! ## Format
//! A JSON array of line objects, in display order:
//!
//! ```json
//! [
//!   { "id": "A", "title": "Shoe", "image_url": "u", "price": 10, "quantity": 2 },
//!   { "id": "B", "title": "Hat",  "image_url": "v", "price": 5,  "quantity": 1 }
//! ]
//! ```
//!
//! There is no version field. A payload whose shape does not match is
//! rejected as a whole with [`CoreError::MalformedPayload`]; the caller
//! decides what that means (hydration starts with an empty cart).

use crate::error::{CoreError, CoreResult};
use crate::types::LineItem;
use crate::validation::validate_items;

/// Serializes lines into the persisted JSON array.
pub fn encode_items(items: &[LineItem]) -> CoreResult<String> {
    Ok(serde_json::to_string(items)?)
}

/// Parses and validates a persisted JSON array.
///
/// ## Errors
/// `MalformedPayload` when the text is not JSON, is not an array, has a line
/// with a missing or mistyped field, or has a line that fails
/// [`validate_items`].
pub fn decode_items(raw: &str) -> CoreResult<Vec<LineItem>> {
    let items: Vec<LineItem> = serde_json::from_str(raw)?;

    validate_items(&items)
        .map_err(|(index, err)| CoreError::MalformedPayload(format!("line {index}: {err}")))?;

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NewLineItem, Price};

    fn sample() -> Vec<LineItem> {
        let mut a = LineItem::from_new(NewLineItem::new(
            "A",
            "Shoe",
            "u",
            Price::new(10.0).unwrap(),
        ));
        a.quantity = 2;
        let b = LineItem::from_new(NewLineItem::new("B", "Hat", "v", Price::new(5.25).unwrap()));
        vec![a, b]
    }

    #[test]
    fn test_encode_then_decode_preserves_order_and_fields() {
        let items = sample();

        let raw = encode_items(&items).unwrap();
        let decoded = decode_items(&raw).unwrap();

        assert_eq!(decoded, items);
    }

    #[test]
    fn test_decode_payload_written_by_storefront_app() {
        let raw = r#"[
            {"id":"1","title":"Camiseta","image_url":"https://cdn/1.png","price":119.99,"quantity":3},
            {"id":"2","title":"Caneca","imageUrl":"https://cdn/2.png","price":49,"quantity":1}
        ]"#;

        let items = decode_items(raw).unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].quantity, 3);
        assert_eq!(items[1].image_url, "https://cdn/2.png");
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            decode_items("{not json"),
            Err(CoreError::MalformedPayload(_))
        ));
        assert!(matches!(
            decode_items(r#"{"id":"A"}"#),
            Err(CoreError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_decode_rejects_missing_or_mistyped_fields() {
        let missing_price = r#"[{"id":"A","title":"Shoe","image_url":"u","quantity":1}]"#;
        let string_quantity = r#"[{"id":"A","title":"Shoe","image_url":"u","price":1,"quantity":"1"}]"#;
        let negative_quantity = r#"[{"id":"A","title":"Shoe","image_url":"u","price":1,"quantity":-1}]"#;

        assert!(decode_items(missing_price).is_err());
        assert!(decode_items(string_quantity).is_err());
        assert!(decode_items(negative_quantity).is_err());
    }

    #[test]
    fn test_decode_rejects_invalid_lines() {
        let zero = r#"[{"id":"A","title":"Shoe","image_url":"u","price":1,"quantity":0}]"#;
        let dup = r#"[
            {"id":"A","title":"Shoe","image_url":"u","price":1,"quantity":1},
            {"id":"A","title":"Shoe","image_url":"u","price":1,"quantity":2}
        ]"#;

        let err = decode_items(zero).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Malformed cart payload: line 0: quantity must be positive"
        );
        assert!(decode_items(dup).is_err());
    }

    #[test]
    fn test_blank_id_round_trips() {
        let mut cart = crate::Cart::new();
        cart.add(NewLineItem::new("A", "Shoe", "u", Price::new(1.0).unwrap()));
        cart.add(NewLineItem::new("", "Gift card", "u", Price::new(5.0).unwrap()));

        let decoded = decode_items(&encode_items(cart.items()).unwrap()).unwrap();

        assert_eq!(decoded, cart.items());
    }

    #[test]
    fn test_empty_array_is_valid() {
        assert_eq!(decode_items("[]").unwrap(), Vec::<LineItem>::new());
    }
}
