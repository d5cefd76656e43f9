use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    Extension, Json,
};
use jks_core::MAX_IMAGE_BYTES;
use jks_platform::{object_path_for, PlatformError, UploadedImage};
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{validation_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct UploadQuery {
    pub filename: Option<String>,
}

/// POST /api/v1/admin/images?filename=
///
/// Raw image body, at most 1 MiB.
pub(super) async fn upload_image(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<UploadQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<ApiResponse<UploadedImage>>), ApiError> {
    let rid = &req_id.0;

    let filename = query.filename.unwrap_or_default();
    if filename.trim().is_empty() {
        return Err(validation_error(rid, "filename is required"));
    }
    if body.is_empty() {
        return Err(validation_error(rid, "image body is empty"));
    }
    if body.len() > MAX_IMAGE_BYTES {
        return Err(validation_error(
            rid,
            format!("image must be 1 MiB or smaller (got {} bytes)", body.len()),
        ));
    }

    let Some(storage) = state.storage.as_deref() else {
        tracing::error!("image upload attempted without storage configured");
        return Err(ApiError::new(
            rid,
            "bad_gateway",
            "image storage is not configured",
        ));
    };

    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();
    let path = object_path_for(&filename, chrono::Utc::now().timestamp_millis());

    let uploaded = storage
        .upload(&path, body.to_vec(), &content_type)
        .await
        .map_err(|e| map_platform_error(rid, &e))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(uploaded, req_id.0)),
    ))
}

fn map_platform_error(req_id: &str, error: &PlatformError) -> ApiError {
    match error {
        PlatformError::ImageTooLarge { .. } | PlatformError::EmptyUpload => {
            validation_error(req_id, error.to_string())
        }
        _ => {
            tracing::error!(error = %error, "image upload failed");
            ApiError::new(req_id, "bad_gateway", "image upload failed")
        }
    }
}
