use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use uuid::Uuid;

use crate::error::Error;
use crate::server::AppState;
use crate::server::dto::{AddAssociationRequest, CreateNamedRequest, SetAssociationsRequest, UpdateNamedRequest};
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt, StoreResultExt};
use crate::server::validation::validate_name;
use crate::store::Store;
use crate::types::CostCenter;

pub async fn list_cost_centers(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let centers = state
        .store
        .list_cost_centers()
        .api_err("Failed to list cost centers")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(centers)))
}

pub async fn create_cost_center(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateNamedRequest>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    let name = req.name.trim().to_string();

    validate_name(&name, "Cost center")?;

    if store
        .get_cost_center_by_name(&name)
        .api_err("Failed to check cost center")?
        .is_some()
    {
        return Err(ApiError::conflict("Cost center already exists"));
    }

    let center = CostCenter {
        id: Uuid::new_v4().to_string(),
        name,
        created_at: Utc::now(),
    };

    store
        .create_cost_center(&center)
        .api_err("Failed to create cost center")?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(center))))
}

pub async fn get_cost_center(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let center = state
        .store
        .get_cost_center(&id)
        .api_err("Failed to get cost center")?
        .or_not_found("Cost center not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(center)))
}

pub async fn update_cost_center(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateNamedRequest>,
) -> impl IntoResponse {
    let store = state.store.as_ref();

    let mut center = store
        .get_cost_center(&id)
        .api_err("Failed to get cost center")?
        .or_not_found("Cost center not found")?;

    if let Some(name) = req.name {
        let name = name.trim().to_string();
        validate_name(&name, "Cost center")?;

        if !name.eq_ignore_ascii_case(&center.name)
            && store
                .get_cost_center_by_name(&name)
                .api_err("Failed to check cost center name")?
                .is_some()
        {
            return Err(ApiError::conflict("Cost center name already exists"));
        }
        center.name = name;
    }

    store
        .update_cost_center(&center)
        .api_err("Failed to update cost center")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(center)))
}

pub async fn delete_cost_center(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let deleted = state
        .store
        .delete_cost_center(&id)
        .api_err("Failed to delete cost center")?;

    if !deleted {
        return Err(ApiError::not_found("Cost center not found"));
    }

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}

// Association handlers

fn require_cost_center(store: &dyn Store, id: &str) -> Result<(), ApiError> {
    store
        .get_cost_center(id)
        .api_err("Failed to get cost center")?
        .or_not_found("Cost center not found")?;
    Ok(())
}

pub async fn list_associated_business_lines(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    require_cost_center(store, &id)?;

    let lines = store
        .list_cost_center_business_lines(&id)
        .api_err("Failed to list associated business lines")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(lines)))
}

pub async fn add_association(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<AddAssociationRequest>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    require_cost_center(store, &id)?;

    store
        .get_business_line(&req.business_line_id)
        .api_err("Failed to get business line")?
        .or_not_found("Business line not found")?;

    match store.add_association(&id, &req.business_line_id) {
        Ok(()) => {}
        Err(Error::AlreadyExists) => {
            return Err(ApiError::conflict("Association already exists"));
        }
        Err(_) => return Err(ApiError::internal("Failed to add association")),
    }

    let lines = store
        .list_cost_center_business_lines(&id)
        .api_err("Failed to list associated business lines")?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(lines))))
}

pub async fn set_associations(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<SetAssociationsRequest>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    require_cost_center(store, &id)?;

    for business_line_id in &req.business_line_ids {
        if store
            .get_business_line(business_line_id)
            .api_err("Failed to get business line")?
            .is_none()
        {
            return Err(ApiError::bad_request(format!(
                "Unknown business line: {business_line_id}"
            )));
        }
    }

    store
        .set_cost_center_business_lines(&id, &req.business_line_ids)
        .api_err("Failed to set associations")?;

    let lines = store
        .list_cost_center_business_lines(&id)
        .api_err("Failed to list associated business lines")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(lines)))
}

pub async fn remove_association(
    State(state): State<Arc<AppState>>,
    Path((id, business_line_id)): Path<(String, String)>,
) -> impl IntoResponse {
    let removed = state
        .store
        .remove_association(&id, &business_line_id)
        .api_err("Failed to remove association")?;

    if !removed {
        return Err(ApiError::not_found("Association not found"));
    }

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
