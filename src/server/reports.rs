use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use chrono::{Datelike, Utc};
use serde::Serialize;

use crate::server::AppState;
use crate::server::dto::SummaryParams;
use crate::server::response::{ApiError, ApiResponse, StoreResultExt};
use crate::types::{LedgerKind, MonthlyTotal, NamedTotal};

/// Aggregate chart data for one year: planned vs. actual per month with the
/// CAPEX/OPEX split, plus totals attributed to each dimension.
#[derive(Debug, Serialize)]
pub struct SummaryReport {
    pub year: i32,
    pub budget_months: Vec<MonthlyTotal>,
    pub expense_months: Vec<MonthlyTotal>,
    pub budget_by_business_line: Vec<NamedTotal>,
    pub expense_by_business_line: Vec<NamedTotal>,
    pub budget_by_cost_center: Vec<NamedTotal>,
    pub expense_by_cost_center: Vec<NamedTotal>,
}

pub async fn summary(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SummaryParams>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    let year = params.year.unwrap_or_else(|| Utc::now().year());

    let report = SummaryReport {
        year,
        budget_months: store
            .monthly_totals(LedgerKind::Budget, year)
            .api_err("Failed to aggregate budgets")?,
        expense_months: store
            .monthly_totals(LedgerKind::Expense, year)
            .api_err("Failed to aggregate expenses")?,
        budget_by_business_line: store
            .totals_by_business_line(LedgerKind::Budget, year)
            .api_err("Failed to aggregate budgets by business line")?,
        expense_by_business_line: store
            .totals_by_business_line(LedgerKind::Expense, year)
            .api_err("Failed to aggregate expenses by business line")?,
        budget_by_cost_center: store
            .totals_by_cost_center(LedgerKind::Budget, year)
            .api_err("Failed to aggregate budgets by cost center")?,
        expense_by_cost_center: store
            .totals_by_cost_center(LedgerKind::Expense, year)
            .api_err("Failed to aggregate expenses by cost center")?,
    };

    Ok::<_, ApiError>(Json(ApiResponse::success(report)))
}
