use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Per-endpoint request counters. Each is incremented exactly once at handler
/// entry, before validation or lookup can fail.
#[derive(Debug, Default)]
pub struct MetricsCounters {
    searches: AtomicU64,
    adds_to_cart: AtomicU64,
    order_lookups: AtomicU64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub searches: u64,
    pub adds_to_cart: u64,
    pub order_lookups: u64,
}

impl MetricsCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_search(&self) {
        self.searches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_add_to_cart(&self) {
        self.adds_to_cart.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_order_lookup(&self) {
        self.order_lookups.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            searches: self.searches.load(Ordering::Relaxed),
            adds_to_cart: self.adds_to_cart.load(Ordering::Relaxed),
            order_lookups: self.order_lookups.load(Ordering::Relaxed),
        }
    }
}
