//! # Cart
//!
//! The ordered collection of line items and its mutations.
//!
//! ## Mutation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Cart Mutations                                   │
//! │                                                                         │
//! │  add(item) ──────┬── id present? ──► quantity += 1 (fields untouched)  │
//! │                  └── id absent?  ──► push LineItem { quantity: 1 }     │
//! │                                                                         │
//! │  increment(id) ──┬── found ──────► quantity += 1                       │
//! │                  └── missing ────► Err(ItemNotFound)                   │
//! │                                                                         │
//! │  decrement(id) ──┬── qty > 1 ────► quantity -= 1                       │
//! │                  ├── qty == 1 ───► line removed                        │
//! │                  └── missing ────► Err(ItemNotFound)                   │
//! │                                                                         │
//! │  Order: insertion order, never reshuffled by a quantity change.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::{CoreError, CoreResult};
use crate::types::{LineItem, NewLineItem};

/// What a successful mutation did to its line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineChange {
    /// A new line was appended with quantity 1.
    Added,

    /// An existing line now has this quantity.
    Quantity(u32),

    /// The line was removed.
    Removed,
}

/// The shopping cart.
///
/// ## Invariants
/// - Lines are unique by `id` (adding the same product increases quantity)
/// - Every line has `quantity >= 1`; decrementing from 1 removes the line
/// - Lines keep insertion order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cart {
    items: Vec<LineItem>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart { items: Vec::new() }
    }

    /// Builds a cart from lines that already passed
    /// [`validate_items`](crate::validation::validate_items).
    pub fn from_items(items: Vec<LineItem>) -> Self {
        Cart { items }
    }

    /// Adds a product, or bumps its quantity if it is already in the cart.
    ///
    /// ## Behavior
    /// - Product already in cart: same as [`Cart::increment`]; the title,
    ///   image and price passed here are ignored
    /// - Product not in cart: appended at the end with quantity 1
    pub fn add(&mut self, item: NewLineItem) -> LineChange {
        if let Some(line) = self.items.iter_mut().find(|l| l.id == item.id) {
            line.quantity = line.quantity.saturating_add(1);
            return LineChange::Quantity(line.quantity);
        }

        self.items.push(LineItem::from_new(item));
        LineChange::Added
    }

    /// Increases the quantity of a line by one.
    pub fn increment(&mut self, id: &str) -> CoreResult<LineChange> {
        let line = self
            .items
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or_else(|| CoreError::ItemNotFound(id.to_string()))?;

        line.quantity = line.quantity.saturating_add(1);
        Ok(LineChange::Quantity(line.quantity))
    }

    /// Decreases the quantity of a line by one, removing it at zero.
    pub fn decrement(&mut self, id: &str) -> CoreResult<LineChange> {
        let (index, line) = self
            .items
            .iter_mut()
            .enumerate()
            .find(|(_, l)| l.id == id)
            .ok_or_else(|| CoreError::ItemNotFound(id.to_string()))?;

        if line.quantity > 1 {
            line.quantity -= 1;
            return Ok(LineChange::Quantity(line.quantity));
        }

        self.items.remove(index);
        Ok(LineChange::Removed)
    }

    /// Removes every line.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Returns the line for a product id.
    pub fn get(&self, id: &str) -> Option<&LineItem> {
        self.items.iter().find(|l| l.id == id)
    }

    /// Returns the display position of a product id.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|l| l.id == id)
    }

    /// Lines in display order.
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Consumes the cart, returning its lines.
    pub fn into_items(self) -> Vec<LineItem> {
        self.items
    }

    /// Returns the number of distinct lines.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Returns the sum of all quantities.
    pub fn total_quantity(&self) -> u64 {
        self.items.iter().map(|l| u64::from(l.quantity)).sum()
    }

    /// Checks if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
