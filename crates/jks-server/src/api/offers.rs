use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct ExpireOfferRequest {
    id: i64,
}

#[derive(Debug, Serialize)]
pub(super) struct ExpiredOffer {
    id: i64,
}

/// POST /api/v1/offers/expire
///
/// Called by a storefront whose countdown hit zero. Clearing an already
/// cleared offer succeeds.
pub(super) async fn expire_offer(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<ExpireOfferRequest>,
) -> Result<Json<ApiResponse<ExpiredOffer>>, ApiError> {
    let rid = &req_id.0;
    let found = jks_db::expire_offer(&state.pool, body.id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    if !found {
        return Err(ApiError::new(
            rid,
            "not_found",
            format!("product {} not found", body.id),
        ));
    }

    tracing::info!(product_id = body.id, "offer expired");
    Ok(Json(ApiResponse::new(ExpiredOffer { id: body.id }, req_id.0)))
}
