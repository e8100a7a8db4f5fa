//! # Cart State
//!
//! The current checkout cart.
//!
//! ## Thread Safety
//! The cart is wrapped in `Arc<Mutex<T>>` because:
//! 1. Multiple service calls may access/modify the cart
//! 2. Only one call should modify the cart at a time
//! 3. The UI layer may invoke concurrently
//!
//! The engine itself holds no state between calls: the cart is the
//! orchestrator's snapshot source, and pricing always runs over an
//! immutable copy of its lines.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use officine_core::{CartLine, PricingCategory, Product, MAX_CART_LINES, MAX_LINE_QUANTITY};

/// An item in the checkout cart.
///
/// ## Price Freezing
/// Prices and rates are captured when the item is added. If the catalog
/// changes afterwards, this cart item keeps displaying and pricing the
/// values the cashier saw.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Product ID (UUID)
    pub product_id: String,

    /// CIP at time of adding (frozen)
    pub cip: String,

    /// Product name at time of adding (frozen)
    pub name: String,

    /// Unit HT price in minor units at time of adding (frozen)
    pub unit_price_ht_cents: i64,

    /// Unit TTC price in minor units at time of adding (frozen)
    pub unit_price_ttc_cents: i64,

    /// TVA rate in basis points at time of adding (frozen)
    pub vat_rate_bps: u32,

    /// Centime additionnel rate in basis points at time of adding (frozen)
    pub centime_rate_bps: u32,

    /// Quantity in cart
    pub quantity: i64,

    /// When this item was added to the cart
    pub added_at: DateTime<Utc>,
}

impl CartItem {
    /// Creates a cart item from a product, its category and a quantity.
    pub fn from_product(product: &Product, category: &PricingCategory, quantity: i64) -> Self {
        CartItem {
            product_id: product.id.clone(),
            cip: product.cip.clone(),
            name: product.name.clone(),
            unit_price_ht_cents: product.price_ht_cents,
            unit_price_ttc_cents: product.price_ttc_cents,
            vat_rate_bps: category.vat_rate_bps,
            centime_rate_bps: category.centime_rate_bps,
            quantity,
            added_at: Utc::now(),
        }
    }

    /// The pricing-engine view of this item.
    pub fn to_line(&self) -> CartLine {
        CartLine {
            product_id: self.product_id.clone(),
            quantity: self.quantity,
            unit_price_ht_cents: self.unit_price_ht_cents,
            unit_price_ttc_cents: self.unit_price_ttc_cents,
            vat_rate_bps: self.vat_rate_bps,
            centime_rate_bps: self.centime_rate_bps,
        }
    }

    /// Line total including taxes (display preview).
    pub fn line_total_ttc_cents(&self) -> i64 {
        self.to_line().line_total_ttc().cents()
    }
}

/// The checkout cart.
///
/// ## Invariants
/// - Items are unique by `product_id` (adding the same product again
///   increases the quantity)
/// - Quantity is always > 0 (setting it to 0 removes the item)
/// - Size caps come from officine-core
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    /// Items in the cart
    pub items: Vec<CartItem>,

    /// When the cart was created/last cleared
    pub created_at: DateTime<Utc>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart {
            items: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Adds a product to the cart or increases quantity if already present.
    pub fn add_item(
        &mut self,
        product: &Product,
        category: &PricingCategory,
        quantity: i64,
    ) -> Result<(), String> {
        if quantity <= 0 {
            return Err("Quantity must be positive".to_string());
        }

        if let Some(item) = self.items.iter_mut().find(|i| i.product_id == product.id) {
            let new_qty = item.quantity + quantity;
            if new_qty > MAX_LINE_QUANTITY {
                return Err(format!("Quantity would exceed maximum of {}", MAX_LINE_QUANTITY));
            }
            item.quantity = new_qty;
            return Ok(());
        }

        if self.items.len() >= MAX_CART_LINES {
            return Err(format!("Cart cannot have more than {} items", MAX_CART_LINES));
        }

        self.items.push(CartItem::from_product(product, category, quantity));
        Ok(())
    }

    /// Updates the quantity of an item. Zero removes the item.
    pub fn update_quantity(&mut self, product_id: &str, quantity: i64) -> Result<(), String> {
        if quantity == 0 {
            return self.remove_item(product_id);
        }

        if quantity < 0 {
            return Err("Quantity must be positive".to_string());
        }

        if quantity > MAX_LINE_QUANTITY {
            return Err(format!("Quantity cannot exceed {}", MAX_LINE_QUANTITY));
        }

        if let Some(item) = self.items.iter_mut().find(|i| i.product_id == product_id) {
            item.quantity = quantity;
            Ok(())
        } else {
            Err(format!("Product {} not in cart", product_id))
        }
    }

    /// Removes an item from the cart by product ID.
    pub fn remove_item(&mut self, product_id: &str) -> Result<(), String> {
        let initial_len = self.items.len();
        self.items.retain(|i| i.product_id != product_id);

        if self.items.len() == initial_len {
            Err(format!("Product {} not in cart", product_id))
        } else {
            Ok(())
        }
    }

    /// Clears all items from the cart.
    pub fn clear(&mut self) {
        self.items.clear();
        self.created_at = Utc::now();
    }

    /// Number of distinct items.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Total quantity across all items.
    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Checks if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The immutable pricing snapshot: one CartLine per item.
    ///
    /// Everything downstream (pricing, allocation, commit) works on this
    /// copy, never on the live cart.
    pub fn lines(&self) -> Vec<CartLine> {
        self.items.iter().map(CartItem::to_line).collect()
    }

    /// Display preview of the TTC total, before payer splits.
    pub fn preview_total_ttc_cents(&self) -> i64 {
        self.items.iter().map(|i| i.line_total_ttc_cents()).sum()
    }
}

/// Shared cart state.
///
/// ## Why Not RwLock?
/// Cart operations are quick and most of them write; a Mutex keeps it
/// simple.
#[derive(Debug, Clone, Default)]
pub struct CartState {
    cart: Arc<Mutex<Cart>>,
}

impl CartState {
    /// Creates a new empty cart state.
    pub fn new() -> Self {
        CartState {
            cart: Arc::new(Mutex::new(Cart::new())),
        }
    }

    /// Executes a function with read access to the cart.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let lines = cart_state.with_cart(|cart| cart.lines());
    /// ```
    pub fn with_cart<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Cart) -> R,
    {
        let cart = self.cart.lock().expect("Cart mutex poisoned");
        f(&cart)
    }

    /// Executes a function with write access to the cart.
    pub fn with_cart_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Cart) -> R,
    {
        let mut cart = self.cart.lock().expect("Cart mutex poisoned");
        f(&mut cart)
    }
}
