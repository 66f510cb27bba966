use std::sync::Arc;
use std::time::Instant;

use axum::extract::{DefaultBodyLimit, Request};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::{
    Router,
    routing::{delete, get, patch, post, put},
};

use super::imports::MAX_UPLOAD_SIZE;
use super::{business_lines, cost_centers, entries, imports, reports};
use crate::store::Store;

pub struct AppState {
    pub store: Arc<dyn Store>,
}

async fn health() -> &'static str {
    "OK"
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status();

    tracing::info!(
        "{} {} {} {}ms",
        method,
        uri.path(),
        status.as_u16(),
        latency.as_millis()
    );

    response
}

fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        // Business lines
        .route("/business-lines", get(business_lines::list_business_lines))
        .route("/business-lines", post(business_lines::create_business_line))
        .route("/business-lines/{id}", get(business_lines::get_business_line))
        .route(
            "/business-lines/{id}",
            patch(business_lines::update_business_line),
        )
        .route(
            "/business-lines/{id}",
            delete(business_lines::delete_business_line),
        )
        // Cost centers
        .route("/cost-centers", get(cost_centers::list_cost_centers))
        .route("/cost-centers", post(cost_centers::create_cost_center))
        .route("/cost-centers/{id}", get(cost_centers::get_cost_center))
        .route("/cost-centers/{id}", patch(cost_centers::update_cost_center))
        .route("/cost-centers/{id}", delete(cost_centers::delete_cost_center))
        // Cost center <-> business line associations (many-to-many)
        .route(
            "/cost-centers/{id}/business-lines",
            get(cost_centers::list_associated_business_lines),
        )
        .route(
            "/cost-centers/{id}/business-lines",
            post(cost_centers::add_association),
        )
        .route(
            "/cost-centers/{id}/business-lines",
            put(cost_centers::set_associations),
        )
        .route(
            "/cost-centers/{id}/business-lines/{business_line_id}",
            delete(cost_centers::remove_association),
        )
        // Ledger entries, one route set per destination table
        .route("/budgets", get(entries::list_budgets))
        .route("/budgets", post(entries::create_budget))
        .route("/budgets/{id}", get(entries::get_budget))
        .route("/budgets/{id}", patch(entries::update_budget))
        .route("/budgets/{id}", delete(entries::delete_budget))
        .route("/expenses", get(entries::list_expenses))
        .route("/expenses", post(entries::create_expense))
        .route("/expenses/{id}", get(entries::get_expense))
        .route("/expenses/{id}", patch(entries::update_expense))
        .route("/expenses/{id}", delete(entries::delete_expense))
        // Bulk import
        .route("/imports", post(imports::upload_import))
        // Chart data
        .route("/reports/summary", get(reports::summary))
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api_router())
        .layer(middleware::from_fn(log_request))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE + 16 * 1024))
        .with_state(state)
}
