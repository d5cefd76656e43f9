use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use jks_core::{invoice_url, CheckoutError, Order, OrderDraft};
use serde::Serialize;
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{map_db_error, validation_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub(super) struct CreatedOrder {
    #[serde(flatten)]
    order: Order,
    invoice_url: String,
}

/// POST /api/v1/orders
///
/// Stores a priced cart after re-checking its totals.
pub(super) async fn create_order(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(draft): Json<OrderDraft>,
) -> Result<(StatusCode, Json<ApiResponse<CreatedOrder>>), ApiError> {
    let rid = &req_id.0;

    if let Err(e) = draft.validate() {
        let code = match e {
            CheckoutError::EmptyCart | CheckoutError::BelowMinimum { .. } => "validation_error",
            CheckoutError::InconsistentTotals(_) => "bad_request",
        };
        tracing::info!(error = %e, "order rejected");
        return Err(ApiError::new(rid, code, e.to_string()));
    }

    let order = jks_db::insert_order(&state.pool, &draft)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    let invoice_url = invoice_url(&state.public_base_url, order.id);
    tracing::info!(order_id = %order.id, total = order.total, items = order.items.len(), "order created");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(CreatedOrder { order, invoice_url }, req_id.0)),
    ))
}

/// GET /api/v1/orders/{id}
pub(super) async fn get_order(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Order>>, ApiError> {
    let rid = &req_id.0;
    let id = Uuid::parse_str(&id).map_err(|_| validation_error(rid, "order id must be a UUID"))?;

    let order = jks_db::get_order(&state.pool, id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| ApiError::new(rid, "not_found", format!("order {id} not found")))?;

    Ok(Json(ApiResponse::new(order, req_id.0)))
}
