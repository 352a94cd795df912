//! Deterministic demo datasets served when no product/order files are
//! configured, and shared by tests across the workspace.

use std::path::Path;

use thiserror::Error;

use crate::domain::order::{Order, OrderId, OrderItem};
use crate::domain::product::{Product, ProductId};

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("could not read dataset file `{path}`: {source}")]
    ReadFile { path: String, source: std::io::Error },
    #[error("could not parse dataset file `{path}`: {source}")]
    ParseFile { path: String, source: serde_json::Error },
}

fn product(id: &str, title: &str, price: u64, tags: &[&str]) -> Product {
    Product {
        id: ProductId(id.to_owned()),
        title: title.to_owned(),
        price,
        tags: tags.iter().map(|tag| (*tag).to_owned()).collect(),
    }
}

pub fn demo_products() -> Vec<Product> {
    vec![
        product("p1", "Charcoal Hoodie", 45, &["apparel", "hoodie", "unisex"]),
        product("p2", "Slate Beanie", 18, &["apparel", "winter"]),
        product("p3", "Cedar Beard Oil", 22, &["grooming", "oil"]),
        product("p4", "Walnut Comb", 12, &["grooming", "accessory"]),
        product("p5", "Canvas Tote", 25, &["bags", "everyday"]),
        product("p6", "Trail Water Bottle", 30, &["outdoor", "hydration"]),
    ]
}

pub fn demo_orders() -> Vec<Order> {
    vec![
        Order {
            order_id: OrderId("ORD-1001".to_owned()),
            email: "alice@example.com".to_owned(),
            status: "Shipped".to_owned(),
            eta: "2026-09-03".to_owned(),
            items: vec![
                OrderItem { id: ProductId("p1".to_owned()), qty: 1 },
                OrderItem { id: ProductId("p3".to_owned()), qty: 2 },
            ],
        },
        Order {
            order_id: OrderId("ORD-1002".to_owned()),
            email: "bob@example.com".to_owned(),
            status: "Processing".to_owned(),
            eta: "2026-09-08".to_owned(),
            items: vec![OrderItem { id: ProductId("p2".to_owned()), qty: 1 }],
        },
        // ORD-1003 references a product that was retired from the catalog;
        // lookups fall back to the "Unknown Product" title for that line.
        Order {
            order_id: OrderId("ORD-1003".to_owned()),
            email: "carol@example.com".to_owned(),
            status: "Delivered".to_owned(),
            eta: "2026-08-21".to_owned(),
            items: vec![
                OrderItem { id: ProductId("p5".to_owned()), qty: 1 },
                OrderItem { id: ProductId("p9".to_owned()), qty: 1 },
            ],
        },
    ]
}

pub fn load_products(path: &Path) -> Result<Vec<Product>, DatasetError> {
    load_json(path)
}

pub fn load_orders(path: &Path) -> Result<Vec<Order>, DatasetError> {
    load_json(path)
}

fn load_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, DatasetError> {
    let raw = std::fs::read_to_string(path).map_err(|source| DatasetError::ReadFile {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| DatasetError::ParseFile {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::{demo_orders, demo_products, load_products};

    #[test]
    fn demo_catalog_has_unique_ids() {
        let products = demo_products();
        let mut ids: Vec<_> = products.iter().map(|p| p.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), products.len());
    }

    #[test]
    fn demo_orders_use_the_expected_id_format() {
        for order in demo_orders() {
            assert!(order.order_id.as_str().starts_with("ORD-"));
            assert_eq!(order.order_id.as_str().len(), 8);
        }
    }

    #[test]
    fn loads_products_from_a_json_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(
            file,
            r#"[{{"id": "x1", "title": "Test Widget", "price": 5, "tags": ["test"]}}]"#
        )
        .expect("write dataset");

        let products = load_products(file.path()).expect("dataset should load");
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].title, "Test Widget");
    }

    #[test]
    fn unreadable_dataset_is_a_structured_error() {
        let result = load_products(std::path::Path::new("no-such-file.json"));
        assert!(result.is_err());
    }
}
