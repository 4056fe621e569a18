//! Presentation helpers shared by the API and the CLI.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::record::DoseLevel;

/// Formats a price for display. Absent (or zero) prices render as empty text.
#[must_use]
pub fn format_price(price: Option<u32>) -> String {
    match price {
        Some(p) if p > 0 => p.to_string(),
        _ => String::new(),
    }
}

/// Renders a date as `YYYY/MM/DD`, or empty text when unknown.
#[must_use]
pub fn format_last_updated(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y/%m/%d").to_string())
        .unwrap_or_default()
}

/// Which price columns a listing shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DoseColumns {
    /// The two most requested strengths, 5 mg and 10 mg.
    #[default]
    Common,
    All,
}

impl DoseColumns {
    #[must_use]
    pub fn levels(self) -> &'static [DoseLevel] {
        match self {
            DoseColumns::Common => &[DoseLevel::Mg5, DoseLevel::Mg10],
            DoseColumns::All => &DoseLevel::ALL,
        }
    }
}
