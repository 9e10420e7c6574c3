//! Cart and wishlist state.
//!
//! Both lists live in the browser session and are the only entities this
//! codebase owns. They are key-unique and insertion-ordered: adding an item
//! whose product is already present never creates a second entry, and the
//! display order is the order items were first added.
//!
//! Prices stored here are what the customer saw when adding the item. The
//! checkout total always comes from the backend's `calculate-order`.

use serde::{Deserialize, Serialize};

use crate::schema::{OrderLineRequest, Product};
use crate::types::{Price, ProductId};

/// Largest quantity a single cart line can hold.
pub const MAX_LINE_QUANTITY: u32 = 99;

/// An entry that can live in an [`ItemList`].
pub trait ListItem {
    /// Key that must be unique within the list.
    fn key(&self) -> ProductId;
}

/// A key-unique, insertion-ordered list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemList<T> {
    items: Vec<T>,
}

impl<T> Default for ItemList<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: ListItem> ItemList<T> {
    /// Create an empty list.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Iterate items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Number of distinct items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether an item with this key exists.
    #[must_use]
    pub fn contains(&self, key: ProductId) -> bool {
        self.items.iter().any(|item| item.key() == key)
    }

    /// Look up an item by key.
    #[must_use]
    pub fn get(&self, key: ProductId) -> Option<&T> {
        self.items.iter().find(|item| item.key() == key)
    }

    fn get_mut(&mut self, key: ProductId) -> Option<&mut T> {
        self.items.iter_mut().find(|item| item.key() == key)
    }

    /// Insert the item, or merge it into the existing entry with the same key.
    ///
    /// Returns `true` if a new entry was appended.
    pub fn upsert(&mut self, item: T, merge: impl FnOnce(&mut T, T)) -> bool {
        if let Some(existing) = self.get_mut(item.key()) {
            merge(existing, item);
            false
        } else {
            self.items.push(item);
            true
        }
    }

    /// Remove the item with this key. Returns the removed item.
    pub fn remove(&mut self, key: ProductId) -> Option<T> {
        let pos = self.items.iter().position(|item| item.key() == key)?;
        Some(self.items.remove(pos))
    }

    /// Remove everything.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

// =============================================================================
// Cart
// =============================================================================

/// A product in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    pub price: Price,
    pub quantity: u32,
    pub image: Option<String>,
}

impl CartItem {
    /// Build a cart line (quantity 1) from a catalog product.
    #[must_use]
    pub fn from_product(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            slug: product.slug.clone(),
            price: product.effective_price(),
            quantity: 1,
            image: product.image.clone(),
        }
    }

    /// Price × quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.times(self.quantity)
    }
}

impl ListItem for CartItem {
    fn key(&self) -> ProductId {
        self.id
    }
}

/// The shopping cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    lines: ItemList<CartItem>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            lines: ItemList::new(),
        }
    }

    /// Add `quantity` of an item. An existing line has its quantity increased
    /// and keeps its position. A quantity of zero counts as one.
    pub fn add_item(&mut self, mut item: CartItem, quantity: u32) {
        let quantity = quantity.clamp(1, MAX_LINE_QUANTITY);
        item.quantity = quantity;
        self.lines.upsert(item, |existing, added| {
            existing.quantity = existing
                .quantity
                .saturating_add(added.quantity)
                .min(MAX_LINE_QUANTITY);
            // Keep display data fresh.
            existing.name = added.name;
            existing.price = added.price;
            existing.image = added.image;
        });
    }

    /// Set the quantity of a line. Zero removes it; unknown ids are ignored.
    pub fn update_quantity(&mut self, id: ProductId, quantity: u32) {
        if quantity == 0 {
            self.lines.remove(id);
            return;
        }
        if let Some(line) = self.lines.get_mut(id) {
            line.quantity = quantity.min(MAX_LINE_QUANTITY);
        }
    }

    /// Remove a line. Returns whether anything was removed.
    pub fn remove_item(&mut self, id: ProductId) -> bool {
        self.lines.remove(id).is_some()
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Lines in the order they were added.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        self.lines.items()
    }

    /// Look up a line.
    #[must_use]
    pub fn get_item(&self, id: ProductId) -> Option<&CartItem> {
        self.lines.get(id)
    }

    /// Whether the product is in the cart.
    #[must_use]
    pub fn in_cart(&self, id: ProductId) -> bool {
        self.lines.contains(id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of distinct products.
    #[must_use]
    pub fn total_unique_items(&self) -> usize {
        self.lines.len()
    }

    /// Sum of quantities.
    #[must_use]
    pub fn total_items(&self) -> u32 {
        self.items().iter().map(|line| line.quantity).sum()
    }

    /// Sum of line totals at the prices seen when adding.
    #[must_use]
    pub fn cart_total(&self) -> Price {
        self.items().iter().map(CartItem::line_total).sum()
    }

    /// Lines in the shape `calculate-order` and `create-order` expect.
    #[must_use]
    pub fn order_lines(&self) -> Vec<OrderLineRequest> {
        self.items()
            .iter()
            .map(|line| OrderLineRequest {
                product_id: line.id,
                quantity: line.quantity,
            })
            .collect()
    }
}

// =============================================================================
// Wishlist
// =============================================================================

/// A product on the wishlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishlistItem {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    pub price: Price,
    pub image: Option<String>,
}

impl WishlistItem {
    /// Build a wishlist entry from a catalog product.
    #[must_use]
    pub fn from_product(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            slug: product.slug.clone(),
            price: product.effective_price(),
            image: product.image.clone(),
        }
    }
}

impl ListItem for WishlistItem {
    fn key(&self) -> ProductId {
        self.id
    }
}

/// Saved-for-later products.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Wishlist {
    entries: ItemList<WishlistItem>,
}

impl Wishlist {
    /// Create an empty wishlist.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: ItemList::new(),
        }
    }

    /// Add an item. Returns `false` if it was already present.
    pub fn add(&mut self, item: WishlistItem) -> bool {
        self.entries.upsert(item, |existing, added| *existing = added)
    }

    /// Remove an item. Returns whether anything was removed.
    pub fn remove(&mut self, id: ProductId) -> bool {
        self.entries.remove(id).is_some()
    }

    /// Add the item if absent, remove it if present.
    ///
    /// Returns whether the item is on the wishlist afterwards.
    pub fn toggle(&mut self, item: WishlistItem) -> bool {
        if self.entries.remove(item.id).is_some() {
            false
        } else {
            self.entries.upsert(item, |_, _| {});
            true
        }
    }

    #[must_use]
    pub fn contains(&self, id: ProductId) -> bool {
        self.entries.contains(id)
    }

    #[must_use]
    pub fn items(&self) -> &[WishlistItem] {
        self.entries.items()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn item(id: i64, price: i64) -> CartItem {
        CartItem {
            id: ProductId::new(id),
            name: format!("Lodër {id}"),
            slug: format!("loder-{id}"),
            price: Price::from_lek(price),
            quantity: 1,
            image: None,
        }
    }

    fn wish(id: i64) -> WishlistItem {
        WishlistItem {
            id: ProductId::new(id),
            name: format!("Lodër {id}"),
            slug: format!("loder-{id}"),
            price: Price::from_lek(100),
            image: None,
        }
    }

    #[test]
    fn test_add_new_item_increases_unique_count() {
        let mut cart = Cart::new();
        cart.add_item(item(1, 500), 1);
        assert_eq!(cart.total_unique_items(), 1);
        cart.add_item(item(2, 300), 2);
        assert_eq!(cart.total_unique_items(), 2);
        assert_eq!(cart.total_items(), 3);
    }

    #[test]
    fn test_add_existing_item_merges_quantity() {
        let mut cart = Cart::new();
        cart.add_item(item(1, 500), 1);
        cart.add_item(item(2, 300), 1);
        cart.add_item(item(1, 500), 2);

        assert_eq!(cart.total_unique_items(), 2);
        assert_eq!(cart.get_item(ProductId::new(1)).unwrap().quantity, 3);
        // Insertion order is preserved.
        assert_eq!(cart.items()[0].id, ProductId::new(1));
    }

    #[test]
    fn test_add_zero_quantity_counts_as_one() {
        let mut cart = Cart::new();
        cart.add_item(item(1, 500), 0);
        assert_eq!(cart.total_items(), 1);
    }

    #[test]
    fn test_quantity_is_capped() {
        let mut cart = Cart::new();
        cart.add_item(item(1, 10), 90);
        cart.add_item(item(1, 10), 20);
        assert_eq!(cart.total_items(), MAX_LINE_QUANTITY);
        cart.update_quantity(ProductId::new(1), 500);
        assert_eq!(cart.total_items(), MAX_LINE_QUANTITY);
    }

    #[test]
    fn test_update_quantity_zero_removes() {
        let mut cart = Cart::new();
        cart.add_item(item(1, 500), 1);
        cart.update_quantity(ProductId::new(1), 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_update_unknown_item_is_noop() {
        let mut cart = Cart::new();
        cart.add_item(item(1, 500), 1);
        cart.update_quantity(ProductId::new(9), 4);
        assert_eq!(cart.total_items(), 1);
    }

    #[test]
    fn test_remove_and_clear() {
        let mut cart = Cart::new();
        cart.add_item(item(1, 500), 1);
        cart.add_item(item(2, 500), 1);
        assert!(cart.remove_item(ProductId::new(1)));
        assert!(!cart.remove_item(ProductId::new(1)));
        assert!(!cart.in_cart(ProductId::new(1)));
        cart.clear();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_cart_total() {
        let mut cart = Cart::new();
        cart.add_item(item(1, 1200), 2);
        cart.add_item(item(2, 350), 1);
        assert_eq!(cart.cart_total(), Price::from_lek(2750));
    }

    #[test]
    fn test_order_lines() {
        let mut cart = Cart::new();
        cart.add_item(item(4, 1200), 2);
        let lines = cart.order_lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].product_id, ProductId::new(4));
        assert_eq!(lines[0].quantity, 2);
    }

    #[test]
    fn test_cart_serializes_as_plain_array() {
        let mut cart = Cart::new();
        cart.add_item(item(1, 500), 1);
        let json = serde_json::to_value(&cart).unwrap();
        assert!(json.is_array());
        let back: Cart = serde_json::from_value(json).unwrap();
        assert_eq!(back, cart);
    }

    #[test]
    fn test_wishlist_add_is_key_unique() {
        let mut list = Wishlist::new();
        assert!(list.add(wish(1)));
        assert!(!list.add(wish(1)));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_wishlist_toggle() {
        let mut list = Wishlist::new();
        assert!(list.toggle(wish(1)));
        assert!(list.contains(ProductId::new(1)));
        assert!(!list.toggle(wish(1)));
        assert!(list.is_empty());
    }
}
