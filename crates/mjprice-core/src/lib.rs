//! Domain core for the self-pay price comparison service: price records,
//! city/type dictionaries, the record filter, the dose calculator, and the
//! report payloads submitted for review.

mod app_config;
mod config;
pub mod dictionary;
pub mod display;
pub mod dose;
pub mod filter;
pub mod record;
pub mod report;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use dictionary::{DictionaryEntry, LabelDictionary, CITY_DICTIONARY, TYPE_DICTIONARY};
pub use display::{format_last_updated, format_price, DoseColumns};
pub use dose::{compute_dial_setting, DialSetting, DoseError, DOSES_PER_PEN, TOTAL_CLICKS};
pub use filter::{city_options, filter_records, RecordFilter, ALL};
pub use record::{DoseLevel, PriceRecord, RecordId};
pub use report::{
    to_nullable_int, CorrectionEdits, ErrorReport, ErrorReportInput, NewPriceReport,
    NewPriceReportInput, PriceCorrectionReport, ReportError,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unsupported pen strength: {0} mg")]
    UnsupportedPenStrength(f64),
}
