use crate::domain::order::{Order, OrderId};
use crate::domain::product::{Product, ProductId};

/// Optional inclusive price bounds applied on top of a text query.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SearchFilter {
    pub min_price: Option<u64>,
    pub max_price: Option<u64>,
}

/// Read-only product collection, loaded once at startup.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    pub fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    pub fn find(&self, product_id: &ProductId) -> Option<&Product> {
        self.products.iter().find(|product| &product.id == product_id)
    }

    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.find(product_id).is_some()
    }

    /// Case-insensitive substring match against the title or any tag, then
    /// the price filter. A query matching nothing is an empty result, not an
    /// error.
    pub fn search(&self, query: &str, filter: SearchFilter) -> Vec<Product> {
        let needle = query.to_lowercase();
        self.products
            .iter()
            .filter(|product| {
                let matches_text = product.title.to_lowercase().contains(&needle)
                    || product.tags.iter().any(|tag| tag.to_lowercase().contains(&needle));
                let matches_min = filter.min_price.map_or(true, |min| product.price >= min);
                let matches_max = filter.max_price.map_or(true, |max| product.price <= max);
                matches_text && matches_min && matches_max
            })
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

/// Read-only order collection.
#[derive(Clone, Debug, Default)]
pub struct Ledger {
    orders: Vec<Order>,
}

impl Ledger {
    pub fn new(orders: Vec<Order>) -> Self {
        Self { orders }
    }

    pub fn find(&self, order_id: &OrderId) -> Option<&Order> {
        self.orders.iter().find(|order| &order.order_id == order_id)
    }
}
