use std::sync::Arc;

use axum::{
    Json,
    extract::{Multipart, State},
    response::IntoResponse,
};

use crate::import::{ImportOutcome, import_file};
use crate::server::AppState;
use crate::server::response::ApiError;

pub const MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;

/// POST /imports - bulk import ledger entries from an uploaded CSV/XLSX file.
///
/// Validation failures are not HTTP errors: the pipeline's uniform
/// `{success, message}` result is returned with 200 either way, and the
/// caller displays the message. Only a malformed request (no file field,
/// oversized payload) maps to an error status.
pub async fn upload_import(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Failed to read multipart: {e}")))?
    {
        if field.name() == Some("file") {
            let filename = field.file_name().unwrap_or("upload").to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::bad_request(format!("Failed to read file: {e}")))?;
            if data.len() > MAX_UPLOAD_SIZE {
                return Err(ApiError::payload_too_large(format!(
                    "File size ({} bytes) exceeds maximum allowed size ({MAX_UPLOAD_SIZE} bytes)",
                    data.len()
                )));
            }
            file = Some((filename, data.to_vec()));
        }
    }

    let (filename, data) = file.ok_or_else(|| ApiError::bad_request("File field is required"))?;

    let outcome: ImportOutcome = import_file(state.store.as_ref(), &filename, &data);

    Ok(Json(outcome))
}
