use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::product::ProductId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub qty: u32,
}

/// Process-lifetime shopping cart. Starts empty and is only ever mutated by
/// the add-to-cart operation; an absent product id means quantity zero, a
/// present one always has quantity >= 1.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    lines: BTreeMap<ProductId, CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulates `qty` onto any existing quantity for the product.
    /// Repeated calls are intentionally not idempotent.
    pub fn add(&mut self, product_id: ProductId, qty: u32) {
        let line = self.lines.entry(product_id).or_insert(CartLine { qty: 0 });
        line.qty = line.qty.saturating_add(qty);
    }

    pub fn qty(&self, product_id: &ProductId) -> u32 {
        self.lines.get(product_id).map(|line| line.qty).unwrap_or(0)
    }

    pub fn total_items(&self) -> u64 {
        self.lines.values().map(|line| u64::from(line.qty)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
