use axum::{extract::Query, Extension, Json};
use mjprice_core::{compute_dial_setting, DialSetting, DoseLevel};
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse};

/// Raw query values; parsed by hand so bad input gets the JSON error envelope.
#[derive(Debug, Deserialize)]
pub(super) struct DoseQuery {
    pub pen: Option<String>,
    pub dose: Option<String>,
}

fn parse_mg(req_id: &str, field: &str, value: Option<&str>) -> Result<f64, ApiError> {
    let value = value.map(str::trim).filter(|v| !v.is_empty()).ok_or_else(|| {
        ApiError::new(req_id, "validation_error", format!("'{field}' is required"))
    })?;
    value.parse::<f64>().map_err(|_| {
        ApiError::new(
            req_id,
            "validation_error",
            format!("'{field}' must be a number of mg, got '{value}'"),
        )
    })
}

/// GET /api/v1/dose: dial clicks and uses per pen for a dose.
pub(super) async fn compute_dose(
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<DoseQuery>,
) -> Result<Json<ApiResponse<DialSetting>>, ApiError> {
    let rid = &req_id.0;

    let pen_mg = parse_mg(rid, "pen", query.pen.as_deref())?;
    let dose_mg = parse_mg(rid, "dose", query.dose.as_deref())?;

    let pen = DoseLevel::try_from(pen_mg)
        .map_err(|e| ApiError::new(rid, "validation_error", e.to_string()))?;
    let setting = compute_dial_setting(pen, dose_mg)
        .map_err(|e| ApiError::new(rid, "validation_error", e.to_string()))?;

    Ok(Json(ApiResponse::new(setting, req_id.0)))
}
