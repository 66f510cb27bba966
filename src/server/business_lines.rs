use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use uuid::Uuid;

use crate::server::AppState;
use crate::server::dto::{CreateNamedRequest, UpdateNamedRequest};
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt, StoreResultExt};
use crate::server::validation::validate_name;
use crate::types::BusinessLine;

pub async fn list_business_lines(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let lines = state
        .store
        .list_business_lines()
        .api_err("Failed to list business lines")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(lines)))
}

pub async fn create_business_line(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateNamedRequest>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    let name = req.name.trim().to_string();

    validate_name(&name, "Business line")?;

    if store
        .get_business_line_by_name(&name)
        .api_err("Failed to check business line")?
        .is_some()
    {
        return Err(ApiError::conflict("Business line already exists"));
    }

    let line = BusinessLine {
        id: Uuid::new_v4().to_string(),
        name,
        created_at: Utc::now(),
    };

    store
        .create_business_line(&line)
        .api_err("Failed to create business line")?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(line))))
}

pub async fn get_business_line(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let line = state
        .store
        .get_business_line(&id)
        .api_err("Failed to get business line")?
        .or_not_found("Business line not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(line)))
}

pub async fn update_business_line(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateNamedRequest>,
) -> impl IntoResponse {
    let store = state.store.as_ref();

    let mut line = store
        .get_business_line(&id)
        .api_err("Failed to get business line")?
        .or_not_found("Business line not found")?;

    if let Some(name) = req.name {
        let name = name.trim().to_string();
        validate_name(&name, "Business line")?;

        if !name.eq_ignore_ascii_case(&line.name)
            && store
                .get_business_line_by_name(&name)
                .api_err("Failed to check business line name")?
                .is_some()
        {
            return Err(ApiError::conflict("Business line name already exists"));
        }
        line.name = name;
    }

    store
        .update_business_line(&line)
        .api_err("Failed to update business line")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(line)))
}

pub async fn delete_business_line(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    // Associations cascade away; ledger entries are detached, not deleted
    let deleted = state
        .store
        .delete_business_line(&id)
        .api_err("Failed to delete business line")?;

    if !deleted {
        return Err(ApiError::not_found("Business line not found"));
    }

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
