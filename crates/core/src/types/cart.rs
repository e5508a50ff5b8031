//! Shopping cart types.
//!
//! A [`Cart`] holds product references and quantities only. Titles and prices
//! are looked up from the catalog when the cart is displayed or turned into an
//! order, producing a [`ResolvedCart`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::Price;
use super::product::Product;

/// A single cart entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// A customer's cart.
///
/// Invariants: product ids are unique and every quantity is at least 1.
/// Items keep the order in which they were first added.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<CartItem>", into = "Vec<CartItem>")]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Build a cart from raw items, merging duplicate product ids and dropping
    /// zero quantities.
    #[must_use]
    pub fn from_items(items: impl IntoIterator<Item = CartItem>) -> Self {
        let mut cart = Self::new();
        for item in items {
            if item.quantity > 0 {
                cart.add_quantity(item.product_id, item.quantity);
            }
        }
        cart
    }

    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Add one unit of `product_id`, returning the new quantity for it.
    pub fn add(&mut self, product_id: ProductId) -> u32 {
        self.add_quantity(product_id, 1)
    }

    fn add_quantity(&mut self, product_id: ProductId, quantity: u32) -> u32 {
        if let Some(item) = self.items.iter_mut().find(|i| i.product_id == product_id) {
            item.quantity = item.quantity.saturating_add(quantity);
            item.quantity
        } else {
            self.items.push(CartItem {
                product_id,
                quantity,
            });
            quantity
        }
    }

    /// Remove the entry for `product_id` entirely. Returns `false` if the
    /// product was not in the cart.
    pub fn remove(&mut self, product_id: ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.product_id != product_id);
        self.items.len() != before
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of distinct products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn product_ids(&self) -> Vec<ProductId> {
        self.items.iter().map(|i| i.product_id).collect()
    }

    /// Join the cart against catalog products.
    ///
    /// Products that no longer exist in `products` are reported in
    /// [`ResolvedCart::missing`] rather than failing the whole cart.
    #[must_use]
    pub fn resolve(&self, products: &[Product]) -> ResolvedCart {
        let by_id: HashMap<ProductId, &Product> = products.iter().map(|p| (p.id, p)).collect();
        let mut lines = Vec::with_capacity(self.items.len());
        let mut missing = Vec::new();

        for item in &self.items {
            match by_id.get(&item.product_id) {
                Some(product) => lines.push(CartLine {
                    product: (*product).clone(),
                    quantity: item.quantity,
                }),
                None => missing.push(item.product_id),
            }
        }

        ResolvedCart { lines, missing }
    }
}

impl From<Vec<CartItem>> for Cart {
    fn from(items: Vec<CartItem>) -> Self {
        Self::from_items(items)
    }
}

impl From<Cart> for Vec<CartItem> {
    fn from(cart: Cart) -> Self {
        cart.items
    }
}

/// A cart entry joined with its catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartLine {
    pub product: Product,
    pub quantity: u32,
}

impl CartLine {
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.product.price.times(self.quantity)
    }
}

/// A cart with product details filled in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolvedCart {
    pub lines: Vec<CartLine>,
    /// Product ids in the cart that are no longer in the catalog.
    pub missing: Vec<ProductId>,
}

impl ResolvedCart {
    #[must_use]
    pub fn total(&self) -> Price {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Number of units across all lines, shown in the cart summary.
    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.quantity)).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn product(id: i32, dollars: i64) -> Product {
        Product {
            id: ProductId::new(id),
            title: format!("Product {id}"),
            price: Price::new(Decimal::from(dollars)).unwrap(),
            description: String::new(),
            image_url: String::new(),
        }
    }

    #[test]
    fn test_add_same_product_twice_increments() {
        let mut cart = Cart::new();
        assert_eq!(cart.add(ProductId::new(1)), 1);
        assert_eq!(cart.add(ProductId::new(1)), 2);
        assert_eq!(cart.len(), 1);
        assert_eq!(
            cart.items(),
            &[CartItem {
                product_id: ProductId::new(1),
                quantity: 2,
            }]
        );
    }

    #[test]
    fn test_add_preserves_insertion_order() {
        let mut cart = Cart::new();
        cart.add(ProductId::new(3));
        cart.add(ProductId::new(1));
        cart.add(ProductId::new(3));
        assert_eq!(cart.product_ids(), vec![ProductId::new(3), ProductId::new(1)]);
        assert_eq!(cart.items().first().map(|i| i.quantity), Some(2));
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut cart = Cart::new();
        cart.add(ProductId::new(1));
        let before = cart.clone();
        assert!(!cart.remove(ProductId::new(2)));
        assert_eq!(cart, before);
    }

    #[test]
    fn test_remove_drops_whole_entry() {
        let mut cart = Cart::new();
        cart.add(ProductId::new(1));
        cart.add(ProductId::new(1));
        assert!(cart.remove(ProductId::new(1)));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut cart = Cart::new();
        cart.add(ProductId::new(1));
        cart.add(ProductId::new(2));
        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.len(), 0);
    }

    #[test]
    fn test_from_items_merges_and_drops_zero() {
        let cart = Cart::from_items([
            CartItem {
                product_id: ProductId::new(1),
                quantity: 2,
            },
            CartItem {
                product_id: ProductId::new(2),
                quantity: 0,
            },
            CartItem {
                product_id: ProductId::new(1),
                quantity: 1,
            },
        ]);
        assert_eq!(cart.len(), 1);
        assert_eq!(
            cart.items(),
            &[CartItem {
                product_id: ProductId::new(1),
                quantity: 3,
            }]
        );
    }

    #[test]
    fn test_deserialize_normalizes() {
        let json = r#"[{"product_id":5,"quantity":1},{"product_id":5,"quantity":4}]"#;
        let cart: Cart = serde_json::from_str(json).unwrap();
        assert_eq!(cart.items().first().map(|i| i.quantity), Some(5));
        assert_eq!(
            serde_json::to_string(&cart).unwrap(),
            r#"[{"product_id":5,"quantity":5}]"#
        );
    }

    #[test]
    fn test_resolve_total() {
        let mut cart = Cart::new();
        cart.add(ProductId::new(1));
        cart.add(ProductId::new(1));
        cart.add(ProductId::new(2));

        let resolved = cart.resolve(&[product(1, 10), product(2, 5)]);
        assert_eq!(resolved.lines.len(), 2);
        assert_eq!(resolved.total_quantity(), 3);
        assert_eq!(resolved.total(), Price::new(Decimal::from(25)).unwrap());
        assert!(resolved.missing.is_empty());
    }

    #[test]
    fn test_resolve_reports_missing_products() {
        let mut cart = Cart::new();
        cart.add(ProductId::new(1));
        cart.add(ProductId::new(9));

        let resolved = cart.resolve(&[product(1, 10)]);
        assert_eq!(resolved.lines.len(), 1);
        assert_eq!(resolved.missing, vec![ProductId::new(9)]);
        assert_eq!(resolved.total(), Price::new(Decimal::from(10)).unwrap());
    }

    #[test]
    fn test_empty_cart_total_is_zero() {
        let resolved = Cart::new().resolve(&[]);
        assert!(resolved.is_empty());
        assert_eq!(resolved.total(), Price::ZERO);
    }
}
