use axum::{
    extract::{Query, State},
    Extension, Json,
};
use mjprice_core::{
    city_options, format_last_updated, format_price, DoseColumns, DoseLevel, PriceRecord,
    RecordFilter, RecordId, ALL, CITY_DICTIONARY, TYPE_DICTIONARY,
};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_store_error, ApiError, ApiResponse, AppState};

const ALL_LABEL: &str = "全部";

#[derive(Debug, Deserialize)]
pub(super) struct PriceQuery {
    pub city: Option<String>,
    #[serde(rename = "type")]
    pub facility_type: Option<String>,
    pub q: Option<String>,
    pub doses: Option<DoseColumns>,
}

#[derive(Debug, Serialize)]
pub(super) struct PriceCell {
    dose: DoseLevel,
    price: Option<u32>,
    display: String,
}

#[derive(Debug, Serialize)]
pub(super) struct PriceRow {
    id: RecordId,
    city: Option<String>,
    city_label: String,
    district: Option<String>,
    clinic: Option<String>,
    #[serde(rename = "type")]
    facility_type: String,
    type_label: &'static str,
    is_cosmetic: bool,
    prices: Vec<PriceCell>,
    note: Option<String>,
    last_updated: String,
}

#[derive(Debug, Serialize)]
pub(super) struct PriceListing {
    count: usize,
    doses: &'static [DoseLevel],
    items: Vec<PriceRow>,
}

#[derive(Debug, Serialize)]
pub(super) struct FilterOption {
    value: String,
    label: String,
}

#[derive(Debug, Serialize)]
pub(super) struct FilterOptions {
    cities: Vec<FilterOption>,
    types: Vec<FilterOption>,
}

impl PriceRow {
    fn from_record(record: &PriceRecord, levels: &[DoseLevel]) -> Self {
        Self {
            id: record.id.clone(),
            city: record.city.clone(),
            city_label: record.city_label(),
            district: record.district.clone(),
            clinic: record.clinic.clone(),
            facility_type: record.canonical_type_code().to_owned(),
            type_label: record.type_label(),
            is_cosmetic: record.is_cosmetic.unwrap_or(false),
            prices: levels
                .iter()
                .map(|&dose| {
                    let price = record.price_at(dose);
                    PriceCell {
                        dose,
                        price,
                        display: format_price(price),
                    }
                })
                .collect(),
            note: record.note.clone(),
            last_updated: format_last_updated(record.last_updated),
        }
    }
}

/// GET /api/v1/prices: filtered listing, fetched fresh from the store.
pub(super) async fn list_prices(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<PriceQuery>,
) -> Result<Json<ApiResponse<PriceListing>>, ApiError> {
    let records = state
        .store
        .fetch_price_records()
        .await
        .map_err(|e| map_store_error(req_id.0.clone(), &e))?;

    let filter = RecordFilter::new(
        query.city.as_deref().unwrap_or(ALL),
        query.facility_type.as_deref().unwrap_or(ALL),
        query.q.as_deref().unwrap_or_default(),
    );
    let levels = query.doses.unwrap_or_default().levels();
    let items: Vec<PriceRow> = filter
        .apply(&records)
        .into_iter()
        .map(|record| PriceRow::from_record(record, levels))
        .collect();

    tracing::debug!(
        total = records.len(),
        matched = items.len(),
        "price listing filtered"
    );

    Ok(Json(ApiResponse::new(
        PriceListing {
            count: items.len(),
            doses: levels,
            items,
        },
        req_id.0,
    )))
}

/// GET /api/v1/filters: city options present in the data plus every type.
pub(super) async fn list_filters(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<FilterOptions>>, ApiError> {
    let records = state
        .store
        .fetch_price_records()
        .await
        .map_err(|e| map_store_error(req_id.0.clone(), &e))?;

    let cities = city_options(&records)
        .into_iter()
        .map(|value| {
            let label = if value == ALL {
                ALL_LABEL.to_owned()
            } else {
                CITY_DICTIONARY
                    .resolve(&value)
                    .map_or_else(|| value.clone(), |entry| entry.label.to_owned())
            };
            FilterOption { value, label }
        })
        .collect();

    let types = std::iter::once(FilterOption {
        value: ALL.to_owned(),
        label: ALL_LABEL.to_owned(),
    })
    .chain(TYPE_DICTIONARY.entries().iter().map(|entry| FilterOption {
        value: entry.code.to_owned(),
        label: entry.label.to_owned(),
    }))
    .collect();

    Ok(Json(ApiResponse::new(FilterOptions { cities, types }, req_id.0)))
}
