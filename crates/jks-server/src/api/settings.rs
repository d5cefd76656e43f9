use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_db_error, validation_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Serialize, Deserialize)]
pub(super) struct Settings {
    whatsapp_number: String,
}

/// GET /api/v1/settings
pub(super) async fn get_settings(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Settings>>, ApiError> {
    let whatsapp_number = jks_db::get_whatsapp_number(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(Json(ApiResponse::new(Settings { whatsapp_number }, req_id.0)))
}

/// PUT /api/v1/admin/settings
pub(super) async fn update_settings(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<Settings>,
) -> Result<Json<ApiResponse<Settings>>, ApiError> {
    let rid = &req_id.0;
    let number = body.whatsapp_number.trim().to_string();
    if number.is_empty() {
        return Err(validation_error(rid, "whatsapp_number must not be empty"));
    }

    jks_db::set_whatsapp_number(&state.pool, &number)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    tracing::info!("whatsapp number updated");
    Ok(Json(ApiResponse::new(
        Settings {
            whatsapp_number: number,
        },
        req_id.0,
    )))
}
