use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use uuid::Uuid;

use crate::server::AppState;
use crate::server::dto::{CreateEntryRequest, ListEntriesParams, UpdateEntryRequest};
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt, StoreResultExt};
use crate::store::Store;
use crate::types::{LedgerEntry, LedgerKind};

/// Enforces the LedgerEntry invariants plus the association business rule:
/// an entry may pair a cost center only with a business line they are
/// associated with. One-sided references are always allowed.
fn validate_entry(
    store: &dyn Store,
    description: &str,
    amount: f64,
    year: i32,
    month: i32,
    business_line_id: Option<&str>,
    cost_center_id: Option<&str>,
) -> Result<(), ApiError> {
    if description.trim().is_empty() {
        return Err(ApiError::bad_request("Description cannot be empty"));
    }
    if amount <= 0.0 {
        return Err(ApiError::bad_request("Amount must be positive"));
    }
    if !(1900..=2100).contains(&year) {
        return Err(ApiError::bad_request("Year must be between 1900 and 2100"));
    }
    if !(1..=12).contains(&month) {
        return Err(ApiError::bad_request("Month must be between 1 and 12"));
    }

    if let Some(bl_id) = business_line_id {
        store
            .get_business_line(bl_id)
            .api_err("Failed to get business line")?
            .or_not_found("Business line not found")?;
    }
    if let Some(cc_id) = cost_center_id {
        store
            .get_cost_center(cc_id)
            .api_err("Failed to get cost center")?
            .or_not_found("Cost center not found")?;
    }
    if let (Some(bl_id), Some(cc_id)) = (business_line_id, cost_center_id) {
        if !store
            .association_exists(cc_id, bl_id)
            .api_err("Failed to check association")?
        {
            return Err(ApiError::bad_request(
                "Cost center is not associated with that business line",
            ));
        }
    }

    Ok(())
}

async fn list_entries(
    state: Arc<AppState>,
    kind: LedgerKind,
    params: ListEntriesParams,
) -> Result<impl IntoResponse, ApiError> {
    let entries = state
        .store
        .list_entries(kind, params.year, params.month)
        .api_err("Failed to list entries")?;

    Ok(Json(ApiResponse::success(entries)))
}

async fn create_entry(
    state: Arc<AppState>,
    kind: LedgerKind,
    req: CreateEntryRequest,
) -> Result<impl IntoResponse, ApiError> {
    let store = state.store.as_ref();

    validate_entry(
        store,
        &req.description,
        req.amount,
        req.year,
        req.month,
        req.business_line_id.as_deref(),
        req.cost_center_id.as_deref(),
    )?;

    let now = Utc::now();
    let entry = LedgerEntry {
        id: Uuid::new_v4().to_string(),
        description: req.description.trim().to_string(),
        amount: req.amount,
        year: req.year,
        month: req.month,
        entry_type: req.entry_type,
        business_line_id: req.business_line_id,
        cost_center_id: req.cost_center_id,
        created_at: now,
        updated_at: now,
    };

    store
        .create_entry(kind, &entry)
        .api_err("Failed to create entry")?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(entry))))
}

async fn get_entry(
    state: Arc<AppState>,
    kind: LedgerKind,
    id: String,
) -> Result<impl IntoResponse, ApiError> {
    let entry = state
        .store
        .get_entry(kind, &id)
        .api_err("Failed to get entry")?
        .or_not_found("Entry not found")?;

    Ok(Json(ApiResponse::success(entry)))
}

async fn update_entry(
    state: Arc<AppState>,
    kind: LedgerKind,
    id: String,
    req: UpdateEntryRequest,
) -> Result<impl IntoResponse, ApiError> {
    let store = state.store.as_ref();

    let mut entry = store
        .get_entry(kind, &id)
        .api_err("Failed to get entry")?
        .or_not_found("Entry not found")?;

    if let Some(description) = req.description {
        entry.description = description;
    }
    if let Some(amount) = req.amount {
        entry.amount = amount;
    }
    if let Some(year) = req.year {
        entry.year = year;
    }
    if let Some(month) = req.month {
        entry.month = month;
    }
    if let Some(entry_type) = req.entry_type {
        entry.entry_type = entry_type;
    }
    if let Some(business_line_id) = req.business_line_id {
        entry.business_line_id = Some(business_line_id);
    }
    if let Some(cost_center_id) = req.cost_center_id {
        entry.cost_center_id = Some(cost_center_id);
    }

    validate_entry(
        store,
        &entry.description,
        entry.amount,
        entry.year,
        entry.month,
        entry.business_line_id.as_deref(),
        entry.cost_center_id.as_deref(),
    )?;

    entry.updated_at = Utc::now();
    store
        .update_entry(kind, &entry)
        .api_err("Failed to update entry")?;

    Ok(Json(ApiResponse::success(entry)))
}

async fn delete_entry(
    state: Arc<AppState>,
    kind: LedgerKind,
    id: String,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = state
        .store
        .delete_entry(kind, &id)
        .api_err("Failed to delete entry")?;

    if !deleted {
        return Err(ApiError::not_found("Entry not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}

// Budgets

pub async fn list_budgets(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListEntriesParams>,
) -> impl IntoResponse {
    list_entries(state, LedgerKind::Budget, params).await
}

pub async fn create_budget(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateEntryRequest>,
) -> impl IntoResponse {
    create_entry(state, LedgerKind::Budget, req).await
}

pub async fn get_budget(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    get_entry(state, LedgerKind::Budget, id).await
}

pub async fn update_budget(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateEntryRequest>,
) -> impl IntoResponse {
    update_entry(state, LedgerKind::Budget, id, req).await
}

pub async fn delete_budget(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    delete_entry(state, LedgerKind::Budget, id).await
}

// Expenses

pub async fn list_expenses(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListEntriesParams>,
) -> impl IntoResponse {
    list_entries(state, LedgerKind::Expense, params).await
}

pub async fn create_expense(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateEntryRequest>,
) -> impl IntoResponse {
    create_entry(state, LedgerKind::Expense, req).await
}

pub async fn get_expense(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    get_entry(state, LedgerKind::Expense, id).await
}

pub async fn update_expense(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateEntryRequest>,
) -> impl IntoResponse {
    update_entry(state, LedgerKind::Expense, id, req).await
}

pub async fn delete_expense(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    delete_entry(state, LedgerKind::Expense, id).await
}
