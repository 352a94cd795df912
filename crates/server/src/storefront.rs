//! Storefront API routes.
//!
//! Endpoints:
//! - `GET  /health`       — liveness probe
//! - `GET  /metrics`      — request counter snapshot
//! - `GET  /search`       — product search (`q` required, `minPrice`/`maxPrice` optional)
//! - `POST /cart/add`     — accumulate a product quantity into the shared cart
//! - `POST /order/status` — order lookup gated by owner email, rate limited per client
//!
//! All shared mutable state (cart, metrics, rate-limit windows) lives in
//! [`AppState`] and is passed into handlers by extraction; there are no
//! module-level globals. The runtime is multi-threaded, so the cart and the
//! limiter sit behind mutexes and the counters are atomics.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{ConnectInfo, Query, Request, State},
    http::{HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use storebot_core::{
    validation, ApiError, Cart, Catalog, FixedWindowLimiter, Ledger, MetricsCounters, Product,
    ProductId, SearchFilter,
};
use tracing::info;

use crate::audit_layer::{self, AuditHandle};
use crate::health;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub ledger: Arc<Ledger>,
    pub cart: Arc<Mutex<Cart>>,
    pub metrics: Arc<MetricsCounters>,
    pub limiter: Arc<Mutex<FixedWindowLimiter>>,
    pub audit: AuditHandle,
}

impl AppState {
    pub fn new(
        catalog: Catalog,
        ledger: Ledger,
        limiter: FixedWindowLimiter,
        audit: AuditHandle,
    ) -> Self {
        Self {
            catalog: Arc::new(catalog),
            ledger: Arc::new(ledger),
            cart: Arc::new(Mutex::new(Cart::new())),
            metrics: Arc::new(MetricsCounters::new()),
            limiter: Arc::new(Mutex::new(limiter)),
            audit,
        }
    }

    fn lock_cart(&self) -> std::sync::MutexGuard<'_, Cart> {
        match self.cart.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn lock_limiter(&self) -> std::sync::MutexGuard<'_, FixedWindowLimiter> {
        match self.limiter.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    #[serde(rename = "minPrice")]
    pub min_price: Option<String>,
    #[serde(rename = "maxPrice")]
    pub max_price: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartAddResponse {
    pub cart: Cart,
    pub total_items: u64,
}

#[derive(Debug, Serialize)]
pub struct EnrichedOrderItem {
    pub id: ProductId,
    pub qty: u32,
    pub title: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusResponse {
    pub order_id: String,
    pub email: String,
    pub status: String,
    pub eta: String,
    pub items: Vec<EnrichedOrderItem>,
}

/// Local wrapper so the core error taxonomy can become an axum response.
pub struct ErrorResponse(pub ApiError);

impl From<ApiError> for ErrorResponse {
    fn from(error: ApiError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut response = (status, Json(self.0.body())).into_response();
        if let ApiError::RateLimited { retry_after_secs } = self.0 {
            if let Ok(value) = HeaderValue::from_str(&retry_after_secs.to_string()) {
                response.headers_mut().insert("Retry-After", value);
            }
        }
        response
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn router(state: AppState) -> Router {
    let rate_limited = Router::new()
        .route("/order/status", post(order_status))
        .route_layer(middleware::from_fn_with_state(state.clone(), enforce_order_status_limit));

    Router::new()
        .merge(health::router())
        .route("/search", get(search))
        .route("/cart/add", post(cart_add))
        .merge(rate_limited)
        .layer(middleware::from_fn_with_state(state.clone(), audit_layer::capture))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Product>>, ErrorResponse> {
    state.metrics.record_search();

    let query = match params.q.as_deref().map(str::trim) {
        Some(query) if !query.is_empty() => query.to_lowercase(),
        _ => return Err(ApiError::missing_query("q").into()),
    };

    let filter = SearchFilter {
        min_price: params.min_price.as_deref().and_then(|raw| raw.parse().ok()),
        max_price: params.max_price.as_deref().and_then(|raw| raw.parse().ok()),
    };
    let results = state.catalog.search(&query, filter);

    info!(
        event_name = "api.search.completed",
        query = %query,
        result_count = results.len(),
        "search completed"
    );
    Ok(Json(results))
}

async fn cart_add(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<Json<CartAddResponse>, ErrorResponse> {
    state.metrics.record_add_to_cart();

    let parsed = validation::parse_add_to_cart(&payload).map_err(ApiError::Validation)?;
    if !state.catalog.contains(&parsed.product_id) {
        return Err(ApiError::NotFound { resource: "Product" }.into());
    }

    // Lookup and increment happen under one guard so concurrent adds to the
    // same product never lose updates.
    let (cart, total_items) = {
        let mut cart = state.lock_cart();
        cart.add(parsed.product_id.clone(), parsed.qty);
        ((*cart).clone(), cart.total_items())
    };

    info!(
        event_name = "api.cart.item_added",
        product_id = %parsed.product_id,
        qty = parsed.qty,
        total_items,
        "cart updated"
    );
    Ok(Json(CartAddResponse { cart, total_items }))
}

async fn order_status(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<Json<OrderStatusResponse>, ErrorResponse> {
    state.metrics.record_order_lookup();

    let parsed = validation::parse_order_status(&payload).map_err(ApiError::Validation)?;
    let order = state
        .ledger
        .find(&parsed.order_id)
        .ok_or(ApiError::NotFound { resource: "Order" })?;

    if !order.email.eq_ignore_ascii_case(&parsed.email) {
        return Err(ApiError::Unauthorized.into());
    }

    let items = order
        .items
        .iter()
        .map(|item| EnrichedOrderItem {
            id: item.id.clone(),
            qty: item.qty,
            title: state
                .catalog
                .find(&item.id)
                .map(|product| product.title.clone())
                .unwrap_or_else(|| "Unknown Product".to_owned()),
        })
        .collect();

    info!(
        event_name = "api.order.status_served",
        order_id = %order.order_id,
        status = %order.status,
        "order status served"
    );
    Ok(Json(OrderStatusResponse {
        order_id: order.order_id.as_str().to_owned(),
        email: order.email.clone(),
        status: order.status.clone(),
        eta: order.eta.clone(),
        items,
    }))
}

// ---------------------------------------------------------------------------
// Rate limiting
// ---------------------------------------------------------------------------

/// Gate in front of the order-status handler. A rejected request is answered
/// here and never reaches the handler (so its lookup counter stays
/// untouched). Quota headers go out on both outcomes.
async fn enforce_order_status_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let key = client_key(&request);
    let decision = state.lock_limiter().check(&key, Utc::now());

    let mut response = if decision.allowed {
        next.run(request).await
    } else {
        info!(
            event_name = "api.order.rate_limited",
            client = %key,
            retry_after_secs = decision.reset_after_secs,
            "order status request rejected by rate limiter"
        );
        ErrorResponse(ApiError::RateLimited { retry_after_secs: decision.reset_after_secs })
            .into_response()
    };

    let headers = response.headers_mut();
    for (name, value) in [
        ("RateLimit-Limit", decision.limit.to_string()),
        ("RateLimit-Remaining", decision.remaining.to_string()),
        ("RateLimit-Reset", decision.reset_after_secs.to_string()),
    ] {
        if let Ok(value) = HeaderValue::from_str(&value) {
            headers.insert(name, value);
        }
    }
    response
}

/// Client identity as seen at the network layer. Requests served without
/// connect info (in-process tests) share one bucket.
fn client_key(request: &Request) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_owned())
}
