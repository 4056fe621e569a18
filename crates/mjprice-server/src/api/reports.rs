//! Report submission handlers. Every accepted report lands in a review table
//! with status `pending`; nothing here changes the published prices.

use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::Local;
use mjprice_core::{
    CorrectionEdits, ErrorReport, ErrorReportInput, NewPriceReport, NewPriceReportInput,
    PriceCorrectionReport, RecordId, ReportError,
};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_store_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct CorrectionRequest {
    pub id: RecordId,
    #[serde(flatten)]
    pub edits: CorrectionEdits,
}

#[derive(Debug, Serialize)]
pub(super) struct ReportReceipt {
    kind: &'static str,
    status: &'static str,
}

type Created = (StatusCode, Json<ApiResponse<ReportReceipt>>);

fn created(kind: &'static str, request_id: String) -> Created {
    (
        StatusCode::CREATED,
        Json(ApiResponse::new(
            ReportReceipt {
                kind,
                status: mjprice_core::report::PENDING_STATUS,
            },
            request_id,
        )),
    )
}

fn validation_error(req_id: &str, error: &ReportError) -> ApiError {
    ApiError::new(req_id, "validation_error", error.to_string())
}

/// POST /api/v1/reports/corrections: propose changes to a published record.
pub(super) async fn submit_correction(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CorrectionRequest>,
) -> Result<Created, ApiError> {
    let rid = &req_id.0;

    let target = state
        .store
        .fetch_price_record(&body.id)
        .await
        .map_err(|e| map_store_error(rid.clone(), &e))?
        .ok_or_else(|| {
            ApiError::new(
                rid,
                "not_found",
                format!("price record '{}' not found", body.id),
            )
        })?;

    let today = Local::now().date_naive();
    let report = PriceCorrectionReport::new(&target, &body.edits, today);
    state
        .store
        .submit_price_correction(&report)
        .await
        .map_err(|e| map_store_error(rid.clone(), &e))?;

    tracing::info!(record_id = %body.id, "price correction submitted");
    Ok(created("correction", req_id.0))
}

/// POST /api/v1/reports/prices: report a price, possibly for a new facility.
pub(super) async fn submit_price_report(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<NewPriceReportInput>,
) -> Result<Created, ApiError> {
    let rid = &req_id.0;

    let report = NewPriceReport::try_from(body).map_err(|e| validation_error(rid, &e))?;
    state
        .store
        .submit_price_report(&report)
        .await
        .map_err(|e| map_store_error(rid.clone(), &e))?;

    tracing::info!(city = %report.city, "price report submitted");
    Ok(created("price", req_id.0))
}

/// POST /api/v1/reports/errors: flag wrong data anywhere on the site.
pub(super) async fn submit_error_report(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<ErrorReportInput>,
) -> Result<Created, ApiError> {
    let rid = &req_id.0;

    let report = ErrorReport::try_from(body).map_err(|e| validation_error(rid, &e))?;
    state
        .store
        .submit_error_report(&report)
        .await
        .map_err(|e| map_store_error(rid.clone(), &e))?;

    tracing::info!(source_type = %report.source_type, "error report submitted");
    Ok(created("error", req_id.0))
}
