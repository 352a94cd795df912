pub mod audit;
pub mod catalog;
pub mod config;
pub mod domain;
pub mod errors;
pub mod fixtures;
pub mod metrics;
pub mod rate_limit;
pub mod validation;

pub use audit::{mask_email, AuditRecord, AuditSink, InMemoryAuditSink, ResultSummary};
pub use catalog::{Catalog, Ledger, SearchFilter};
pub use domain::cart::Cart;
pub use domain::order::{Order, OrderId, OrderItem};
pub use domain::product::{Product, ProductId};
pub use errors::{ApiError, FieldErrors};
pub use metrics::{MetricsCounters, MetricsSnapshot};
pub use rate_limit::{FixedWindowLimiter, RateLimitDecision};
pub use validation::{AddToCartPayload, OrderStatusPayload};
