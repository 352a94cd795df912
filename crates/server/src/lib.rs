pub mod audit_layer;
pub mod bootstrap;
pub mod health;
pub mod storefront;

pub use bootstrap::{build_application, Application, BootstrapError};
pub use storefront::{router, AppState};
