use storebot_core::config::AppConfig;
use storebot_core::fixtures::{self, DatasetError};
use storebot_core::{Catalog, FixedWindowLimiter, Ledger};
use thiserror::Error;
use tracing::info;

use crate::audit_layer::AuditHandle;
use crate::storefront::AppState;

pub struct Application {
    pub config: AppConfig,
    pub state: AppState,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Dataset(#[from] DatasetError),
}

/// Loads the injected datasets (demo fixtures when none are configured),
/// starts the audit writer, and assembles the shared state.
pub async fn build_application(config: AppConfig) -> Result<Application, BootstrapError> {
    let products = match &config.data.products_path {
        Some(path) => fixtures::load_products(path)?,
        None => fixtures::demo_products(),
    };
    let orders = match &config.data.orders_path {
        Some(path) => fixtures::load_orders(path)?,
        None => fixtures::demo_orders(),
    };
    info!(
        event_name = "system.bootstrap.datasets_loaded",
        products = products.len(),
        orders = orders.len(),
        "catalog and ledger loaded"
    );

    let limiter =
        FixedWindowLimiter::new(config.rate_limit.window_secs, config.rate_limit.max_requests);
    let audit = AuditHandle::file(config.audit.log_path.clone());
    let state = AppState::new(Catalog::new(products), Ledger::new(orders), limiter, audit);

    Ok(Application { config, state })
}
