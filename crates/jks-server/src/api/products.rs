//! Catalog listing and admin product CRUD.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use jks_core::{CoreError, Product, ProductDraft};
use serde::Serialize;

use crate::middleware::RequestId;

use super::{map_db_error, validation_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub(super) struct DeletedProductResponse {
    id: i64,
    image_removed: bool,
}

fn map_core_error(req_id: &str, error: &CoreError) -> ApiError {
    validation_error(req_id, error.to_string())
}

/// GET /api/v1/products
///
/// The public catalog, cheapest first.
pub(super) async fn list_catalog(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<Product>>>, ApiError> {
    let products = jks_db::list_products_by_price(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(Json(ApiResponse::new(products, req_id.0)))
}

/// GET /api/v1/admin/products (newest first)
pub(super) async fn list_admin(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<Product>>>, ApiError> {
    let products = jks_db::list_products_newest_first(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(Json(ApiResponse::new(products, req_id.0)))
}

/// POST /api/v1/admin/products
pub(super) async fn create_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(draft): Json<ProductDraft>,
) -> Result<(StatusCode, Json<ApiResponse<Product>>), ApiError> {
    let rid = &req_id.0;
    let valid = draft
        .validate(true)
        .map_err(|e| map_core_error(rid, &e))?;

    let product = jks_db::create_product(&state.pool, &valid)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    tracing::info!(product_id = product.id, name = %product.name, "product created");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(product, req_id.0)),
    ))
}

/// PATCH /api/v1/admin/products/{id}
///
/// Replaces the editable fields. The stored image is kept when the body
/// carries none; a replaced image is removed from storage best effort.
pub(super) async fn update_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
    Json(draft): Json<ProductDraft>,
) -> Result<Json<ApiResponse<Product>>, ApiError> {
    let rid = &req_id.0;
    let valid = draft
        .validate(false)
        .map_err(|e| map_core_error(rid, &e))?;

    let updated = jks_db::update_product(&state.pool, id, &valid)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    let old_image_removed = match updated.replaced_image_path.as_deref() {
        Some(path) => remove_image(&state, id, path).await,
        None => false,
    };

    tracing::info!(product_id = id, old_image_removed, "product updated");
    Ok(Json(ApiResponse::new(updated.product, req_id.0)))
}

/// DELETE /api/v1/admin/products/{id}
///
/// The row is removed first. Removing the stored image is best effort: a
/// storage failure is logged and the delete still succeeds.
pub(super) async fn delete_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<DeletedProductResponse>>, ApiError> {
    let deleted = jks_db::delete_product(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let image_removed = match deleted.image_path.as_deref() {
        Some(path) => remove_image(&state, id, path).await,
        None => false,
    };

    tracing::info!(product_id = id, image_removed, "product deleted");
    Ok(Json(ApiResponse::new(
        DeletedProductResponse { id, image_removed },
        req_id.0,
    )))
}

/// Removes a stored product image. Failures are logged, not returned.
async fn remove_image(state: &AppState, product_id: i64, path: &str) -> bool {
    let Some(storage) = state.storage.as_deref() else {
        tracing::warn!(product_id, path, "storage not configured; image left in place");
        return false;
    };
    match storage.remove(path).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(product_id, path, error = %e, "failed to remove product image");
            false
        }
    }
}
