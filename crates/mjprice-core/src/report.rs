//! Write-only report payloads submitted to the pending-review tables.
//!
//! Three kinds exist: a correction to an existing price record, a brand-new
//! price report (possibly for a facility not yet listed), and a free-form
//! data-error report. Each has an input type as received from a form or API
//! body and an output type matching the row the store expects.

use std::ops::RangeInclusive;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::dictionary::{CITY_DICTIONARY, DEFAULT_TYPE_CODE, TYPE_DICTIONARY};
use crate::record::{DoseLevel, PriceRecord, RecordId};

/// Review status attached to every correction.
pub const PENDING_STATUS: &str = "pending";

/// Error type assumed when the reporter does not pick one.
pub const DEFAULT_ERROR_TYPE: &str = "資料有誤";

pub const DEFAULT_SOURCE_TYPE: &str = "other";

pub const PRICE_5MG_RANGE: RangeInclusive<u32> = 1_000..=13_000;
pub const PRICE_10MG_RANGE: RangeInclusive<u32> = 1_000..=16_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReportError {
    #[error("city is required")]
    MissingCity,

    #[error("unknown city code: {0}")]
    UnknownCity(String),

    #[error("clinic, hospital or pharmacy name is required")]
    MissingClinic,

    #[error("unknown facility type: {0}")]
    UnknownType(String),

    #[error("at least one of the 5 mg or 10 mg prices is required")]
    MissingPrice,

    #[error("{dose} price must be between {min} and {max}, got {price}")]
    PriceOutOfRange {
        dose: DoseLevel,
        price: u32,
        min: u32,
        max: u32,
    },

    #[error("description is required")]
    MissingDescription,
}

/// Parses a form value into a price: empty or non-numeric text is `None`.
#[must_use]
pub fn to_nullable_int(value: &str) -> Option<u32> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    let n = value.parse::<f64>().ok()?;
    if !n.is_finite() || n < 0.0 || n > f64::from(u32::MAX) {
        return None;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let price = n.round() as u32;
    Some(price)
}

/// Form fields arrive either as JSON numbers or as the raw text of an input.
fn deserialize_form_int<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum FormInt {
        Int(u32),
        Text(String),
    }

    Ok(match Option::<FormInt>::deserialize(deserializer)? {
        None => None,
        Some(FormInt::Int(n)) => Some(n),
        Some(FormInt::Text(s)) => to_nullable_int(&s),
    })
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// ---------------------------------------------------------------------------
// Price correction
// ---------------------------------------------------------------------------

/// Changes a visitor proposes to an existing record.
///
/// Every field overlays the target: `None` keeps the target's value. A price
/// of `0` clears it, and an empty note clears the note.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CorrectionEdits {
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default, deserialize_with = "deserialize_form_int")]
    pub price2_5mg: Option<u32>,
    #[serde(default, deserialize_with = "deserialize_form_int")]
    pub price5mg: Option<u32>,
    #[serde(default, deserialize_with = "deserialize_form_int")]
    pub price7_5mg: Option<u32>,
    #[serde(default, deserialize_with = "deserialize_form_int")]
    pub price10mg: Option<u32>,
    #[serde(default, deserialize_with = "deserialize_form_int")]
    pub price12_5mg: Option<u32>,
    #[serde(default, deserialize_with = "deserialize_form_int")]
    pub price15mg: Option<u32>,
    #[serde(default)]
    pub note: Option<String>,
}

impl CorrectionEdits {
    fn price(&self, level: DoseLevel) -> Option<u32> {
        match level {
            DoseLevel::Mg2_5 => self.price2_5mg,
            DoseLevel::Mg5 => self.price5mg,
            DoseLevel::Mg7_5 => self.price7_5mg,
            DoseLevel::Mg10 => self.price10mg,
            DoseLevel::Mg12_5 => self.price12_5mg,
            DoseLevel::Mg15 => self.price15mg,
        }
    }
}

/// A proposed correction, written to the `mounjaro_reports` table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceCorrectionReport {
    pub city: Option<String>,
    pub district: Option<String>,
    pub clinic: Option<String>,
    #[serde(rename = "type")]
    pub facility_type: String,
    pub is_cosmetic: bool,
    pub price2_5mg: Option<u32>,
    pub price5mg: Option<u32>,
    pub price7_5mg: Option<u32>,
    pub price10mg: Option<u32>,
    pub price12_5mg: Option<u32>,
    pub price15mg: Option<u32>,
    pub note: Option<String>,
    pub last_updated: NaiveDate,
    pub status: &'static str,
}

impl PriceCorrectionReport {
    /// Builds a correction of `target`, dated `today`.
    #[must_use]
    pub fn new(target: &PriceRecord, edits: &CorrectionEdits, today: NaiveDate) -> Self {
        let price = |level: DoseLevel| match edits.price(level) {
            Some(0) => None,
            Some(p) => Some(p),
            None => target.price_at(level),
        };

        let note = match &edits.note {
            Some(note) => trimmed(Some(note.clone())),
            None => trimmed(target.note.clone()),
        };

        Self {
            city: target.city.clone(),
            district: trimmed(edits.district.clone()).or_else(|| trimmed(target.district.clone())),
            clinic: target.clinic.clone(),
            facility_type: trimmed(target.facility_type.clone())
                .unwrap_or_else(|| DEFAULT_TYPE_CODE.to_string()),
            is_cosmetic: target.is_cosmetic.unwrap_or(false),
            price2_5mg: price(DoseLevel::Mg2_5),
            price5mg: price(DoseLevel::Mg5),
            price7_5mg: price(DoseLevel::Mg7_5),
            price10mg: price(DoseLevel::Mg10),
            price12_5mg: price(DoseLevel::Mg12_5),
            price15mg: price(DoseLevel::Mg15),
            note,
            last_updated: today,
            status: PENDING_STATUS,
        }
    }
}

// ---------------------------------------------------------------------------
// New price report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NewPriceReportInput {
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub clinic: String,
    #[serde(default, rename = "type")]
    pub facility_type: Option<String>,
    #[serde(default, deserialize_with = "deserialize_form_int")]
    pub price5mg: Option<u32>,
    #[serde(default, deserialize_with = "deserialize_form_int")]
    pub price10mg: Option<u32>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// A validated price report, written to the `price_reports` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewPriceReport {
    pub city: String,
    pub district: Option<String>,
    pub clinic: String,
    #[serde(rename = "type")]
    pub facility_type: String,
    pub price5mg: Option<u32>,
    pub price10mg: Option<u32>,
    pub note: Option<String>,
    pub email: Option<String>,
}

impl TryFrom<NewPriceReportInput> for NewPriceReport {
    type Error = ReportError;

    fn try_from(input: NewPriceReportInput) -> Result<Self, Self::Error> {
        let city = input.city.trim();
        if city.is_empty() {
            return Err(ReportError::MissingCity);
        }
        let city = CITY_DICTIONARY
            .get(city)
            .ok_or_else(|| ReportError::UnknownCity(city.to_string()))?
            .code;

        let clinic = input.clinic.trim();
        if clinic.is_empty() {
            return Err(ReportError::MissingClinic);
        }

        let facility_type = match trimmed(input.facility_type) {
            None => DEFAULT_TYPE_CODE,
            Some(t) => TYPE_DICTIONARY.get(&t).ok_or(ReportError::UnknownType(t))?.code,
        };

        if input.price5mg.is_none() && input.price10mg.is_none() {
            return Err(ReportError::MissingPrice);
        }
        check_range(DoseLevel::Mg5, input.price5mg, &PRICE_5MG_RANGE)?;
        check_range(DoseLevel::Mg10, input.price10mg, &PRICE_10MG_RANGE)?;

        Ok(Self {
            city: city.to_string(),
            district: trimmed(input.district),
            clinic: clinic.to_string(),
            facility_type: facility_type.to_string(),
            price5mg: input.price5mg,
            price10mg: input.price10mg,
            note: trimmed(input.note),
            email: trimmed(input.email),
        })
    }
}

fn check_range(
    dose: DoseLevel,
    price: Option<u32>,
    range: &RangeInclusive<u32>,
) -> Result<(), ReportError> {
    match price {
        Some(price) if !range.contains(&price) => Err(ReportError::PriceOutOfRange {
            dose,
            price,
            min: *range.start(),
            max: *range.end(),
        }),
        _ => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Data-error report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ErrorReportInput {
    #[serde(default)]
    pub source_type: Option<String>,
    #[serde(default)]
    pub source_id: Option<RecordId>,
    #[serde(default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub suggested_value: Option<String>,
    #[serde(default)]
    pub contact: Option<String>,
}

/// A validated data-error report, written to the `error_reports` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    pub source_type: String,
    pub source_id: Option<RecordId>,
    pub error_type: String,
    pub description: String,
    pub suggested_value: Option<String>,
    pub contact: Option<String>,
}

impl TryFrom<ErrorReportInput> for ErrorReport {
    type Error = ReportError;

    fn try_from(input: ErrorReportInput) -> Result<Self, Self::Error> {
        let description = input.description.trim();
        if description.is_empty() {
            return Err(ReportError::MissingDescription);
        }

        Ok(Self {
            source_type: trimmed(input.source_type)
                .unwrap_or_else(|| DEFAULT_SOURCE_TYPE.to_string()),
            source_id: input.source_id,
            error_type: trimmed(input.error_type)
                .unwrap_or_else(|| DEFAULT_ERROR_TYPE.to_string()),
            description: description.to_string(),
            suggested_value: trimmed(input.suggested_value),
            contact: trimmed(input.contact),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    fn target() -> PriceRecord {
        let mut r = PriceRecord::new("17");
        r.city = Some("taichung".to_string());
        r.district = Some("西屯區".to_string());
        r.clinic = Some("Fit Clinic".to_string());
        r.price5mg = Some(5500);
        r.price10mg = Some(9900);
        r.note = Some("含諮詢費".to_string());
        r
    }

    fn valid_price_input() -> NewPriceReportInput {
        NewPriceReportInput {
            city: "tainan".to_string(),
            clinic: "  府城診所 ".to_string(),
            price5mg: Some(5200),
            ..NewPriceReportInput::default()
        }
    }

    #[test]
    fn to_nullable_int_handles_form_text() {
        assert_eq!(to_nullable_int(""), None);
        assert_eq!(to_nullable_int("   "), None);
        assert_eq!(to_nullable_int("abc"), None);
        assert_eq!(to_nullable_int(" 6200 "), Some(6200));
        assert_eq!(to_nullable_int("0"), Some(0));
        assert_eq!(to_nullable_int("-5"), None);
    }

    #[test]
    fn correction_without_edits_copies_target() {
        let report = PriceCorrectionReport::new(&target(), &CorrectionEdits::default(), today());
        assert_eq!(report.city.as_deref(), Some("taichung"));
        assert_eq!(report.district.as_deref(), Some("西屯區"));
        assert_eq!(report.facility_type, "clinic");
        assert!(!report.is_cosmetic);
        assert_eq!(report.price5mg, Some(5500));
        assert_eq!(report.price10mg, Some(9900));
        assert_eq!(report.price15mg, None);
        assert_eq!(report.note.as_deref(), Some("含諮詢費"));
        assert_eq!(report.last_updated, today());
        assert_eq!(report.status, "pending");
    }

    #[test]
    fn correction_edits_overlay_target() {
        let edits = CorrectionEdits {
            district: Some("  ".to_string()),
            price5mg: Some(0),
            price15mg: Some(15_800),
            note: Some(String::new()),
            ..CorrectionEdits::default()
        };
        let report = PriceCorrectionReport::new(&target(), &edits, today());
        assert_eq!(
            report.district.as_deref(),
            Some("西屯區"),
            "blank district falls back to the target's"
        );
        assert_eq!(report.price5mg, None, "zero clears a price");
        assert_eq!(report.price10mg, Some(9900));
        assert_eq!(report.price15mg, Some(15_800));
        assert_eq!(report.note, None, "empty note clears it");
    }

    #[test]
    fn correction_serializes_store_columns() {
        let report = PriceCorrectionReport::new(&target(), &CorrectionEdits::default(), today());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["type"], "clinic");
        assert_eq!(json["last_updated"], "2025-06-01");
        assert_eq!(json["status"], "pending");
        assert!(json["price2_5mg"].is_null());
    }

    #[test]
    fn correction_edits_accept_text_and_numbers() {
        let edits: CorrectionEdits = serde_json::from_value(serde_json::json!({
            "price5mg": "5600",
            "price10mg": 10200,
            "price15mg": ""
        }))
        .unwrap();
        assert_eq!(edits.price5mg, Some(5600));
        assert_eq!(edits.price10mg, Some(10200));
        assert_eq!(edits.price15mg, None);
    }

    #[test]
    fn new_price_report_normalizes_fields() {
        let mut input = valid_price_input();
        input.city = " Tainan ".to_string();
        input.email = Some("   ".to_string());
        let report = NewPriceReport::try_from(input).expect("valid report");
        assert_eq!(report.city, "tainan");
        assert_eq!(report.clinic, "府城診所");
        assert_eq!(report.facility_type, "clinic");
        assert_eq!(report.email, None);
    }

    #[test]
    fn new_price_report_requires_city_first() {
        let input = NewPriceReportInput::default();
        assert_eq!(
            NewPriceReport::try_from(input),
            Err(ReportError::MissingCity)
        );
    }

    #[test]
    fn new_price_report_rejects_unknown_city_and_type() {
        let mut input = valid_price_input();
        input.city = "tokyo".to_string();
        assert_eq!(
            NewPriceReport::try_from(input),
            Err(ReportError::UnknownCity("tokyo".to_string()))
        );

        let mut input = valid_price_input();
        input.facility_type = Some("spa".to_string());
        assert_eq!(
            NewPriceReport::try_from(input),
            Err(ReportError::UnknownType("spa".to_string()))
        );
    }

    #[test]
    fn new_price_report_requires_clinic() {
        let mut input = valid_price_input();
        input.clinic = "   ".to_string();
        assert_eq!(
            NewPriceReport::try_from(input),
            Err(ReportError::MissingClinic)
        );
    }

    #[test]
    fn new_price_report_requires_a_common_dose_price() {
        let mut input = valid_price_input();
        input.price5mg = None;
        assert_eq!(
            NewPriceReport::try_from(input),
            Err(ReportError::MissingPrice)
        );
    }

    #[test]
    fn new_price_report_checks_ranges() {
        let mut input = valid_price_input();
        input.price5mg = Some(999);
        assert!(matches!(
            NewPriceReport::try_from(input),
            Err(ReportError::PriceOutOfRange { dose: DoseLevel::Mg5, price: 999, .. })
        ));

        let mut input = valid_price_input();
        input.price10mg = Some(16_001);
        assert!(matches!(
            NewPriceReport::try_from(input),
            Err(ReportError::PriceOutOfRange { dose: DoseLevel::Mg10, max: 16_000, .. })
        ));

        let mut input = valid_price_input();
        input.price5mg = Some(13_000);
        input.price10mg = Some(1_000);
        assert!(NewPriceReport::try_from(input).is_ok(), "bounds are inclusive");
    }

    #[test]
    fn error_report_defaults() {
        let input = ErrorReportInput {
            description: "  地址錯誤 ".to_string(),
            contact: Some(String::new()),
            ..ErrorReportInput::default()
        };
        let report = ErrorReport::try_from(input).unwrap();
        assert_eq!(report.source_type, "other");
        assert_eq!(report.error_type, "資料有誤");
        assert_eq!(report.description, "地址錯誤");
        assert_eq!(report.contact, None);
    }

    #[test]
    fn error_report_requires_description() {
        let input = ErrorReportInput {
            description: " \n ".to_string(),
            ..ErrorReportInput::default()
        };
        assert_eq!(
            ErrorReport::try_from(input),
            Err(ReportError::MissingDescription)
        );
    }

    #[test]
    fn error_report_accepts_numeric_source_id() {
        let input: ErrorReportInput = serde_json::from_value(serde_json::json!({
            "source_type": "price",
            "source_id": 17,
            "description": "closed"
        }))
        .unwrap();
        let report = ErrorReport::try_from(input).unwrap();
        assert_eq!(report.source_id, Some(RecordId("17".to_string())));
        assert_eq!(report.source_type, "price");
    }
}
