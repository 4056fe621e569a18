use chrono::NaiveDate;
use serde::{de::IgnoredAny, Deserialize, Deserializer, Serialize};

use crate::dictionary::{
    normalize, DictionaryEntry, CITY_DICTIONARY, DEFAULT_TYPE_CODE, TYPE_DICTIONARY,
};
use crate::CoreError;

/// One of the six labeled strengths a pen is sold in. Doubles as the set of
/// price columns on a [`PriceRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DoseLevel {
    #[serde(rename = "2.5")]
    Mg2_5,
    #[serde(rename = "5")]
    Mg5,
    #[serde(rename = "7.5")]
    Mg7_5,
    #[serde(rename = "10")]
    Mg10,
    #[serde(rename = "12.5")]
    Mg12_5,
    #[serde(rename = "15")]
    Mg15,
}

impl DoseLevel {
    pub const ALL: [DoseLevel; 6] = [
        DoseLevel::Mg2_5,
        DoseLevel::Mg5,
        DoseLevel::Mg7_5,
        DoseLevel::Mg10,
        DoseLevel::Mg12_5,
        DoseLevel::Mg15,
    ];

    #[must_use]
    pub fn mg(self) -> f64 {
        match self {
            DoseLevel::Mg2_5 => 2.5,
            DoseLevel::Mg5 => 5.0,
            DoseLevel::Mg7_5 => 7.5,
            DoseLevel::Mg10 => 10.0,
            DoseLevel::Mg12_5 => 12.5,
            DoseLevel::Mg15 => 15.0,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            DoseLevel::Mg2_5 => "2.5 mg",
            DoseLevel::Mg5 => "5 mg",
            DoseLevel::Mg7_5 => "7.5 mg",
            DoseLevel::Mg10 => "10 mg",
            DoseLevel::Mg12_5 => "12.5 mg",
            DoseLevel::Mg15 => "15 mg",
        }
    }

    /// Column name used by the hosted price tables.
    #[must_use]
    pub fn price_field(self) -> &'static str {
        match self {
            DoseLevel::Mg2_5 => "price2_5mg",
            DoseLevel::Mg5 => "price5mg",
            DoseLevel::Mg7_5 => "price7_5mg",
            DoseLevel::Mg10 => "price10mg",
            DoseLevel::Mg12_5 => "price12_5mg",
            DoseLevel::Mg15 => "price15mg",
        }
    }

    /// Match a milligram value against the supported strengths.
    #[must_use]
    pub fn from_mg(mg: f64) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|level| (level.mg() - mg).abs() < 1e-9)
    }
}

impl TryFrom<f64> for DoseLevel {
    type Error = CoreError;

    fn try_from(mg: f64) -> Result<Self, Self::Error> {
        Self::from_mg(mg).ok_or(CoreError::UnsupportedPenStrength(mg))
    }
}

impl std::fmt::Display for DoseLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Opaque record identifier. The store hands out numeric or string ids; both
/// are kept as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RecordId(pub String);

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Int(i64),
            Text(String),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Int(n) => RecordId(n.to_string()),
            RawId::Text(s) => RecordId(s),
        })
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One facility's self-pay pricing entry, as stored in the hosted table.
///
/// Text fields are kept exactly as stored; defaulting (missing type means
/// clinic, zero price means absent) happens in the accessors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub id: RecordId,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub clinic: Option<String>,
    #[serde(default, rename = "type")]
    pub facility_type: Option<String>,
    #[serde(default, deserialize_with = "deserialize_price")]
    pub price2_5mg: Option<u32>,
    #[serde(default, deserialize_with = "deserialize_price")]
    pub price5mg: Option<u32>,
    #[serde(default, deserialize_with = "deserialize_price")]
    pub price7_5mg: Option<u32>,
    #[serde(default, deserialize_with = "deserialize_price")]
    pub price10mg: Option<u32>,
    #[serde(default, deserialize_with = "deserialize_price")]
    pub price12_5mg: Option<u32>,
    #[serde(default, deserialize_with = "deserialize_price")]
    pub price15mg: Option<u32>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default, deserialize_with = "deserialize_date_prefix")]
    pub last_updated: Option<NaiveDate>,
    #[serde(default)]
    pub is_cosmetic: Option<bool>,
}

impl PriceRecord {
    /// Creates an empty record with the given id; mostly useful for building
    /// fixtures field by field.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: RecordId(id.into()),
            city: None,
            district: None,
            clinic: None,
            facility_type: None,
            price2_5mg: None,
            price5mg: None,
            price7_5mg: None,
            price10mg: None,
            price12_5mg: None,
            price15mg: None,
            note: None,
            last_updated: None,
            is_cosmetic: None,
        }
    }

    /// Price at `level`, with zero treated as "not offered".
    #[must_use]
    pub fn price_at(&self, level: DoseLevel) -> Option<u32> {
        let raw = match level {
            DoseLevel::Mg2_5 => self.price2_5mg,
            DoseLevel::Mg5 => self.price5mg,
            DoseLevel::Mg7_5 => self.price7_5mg,
            DoseLevel::Mg10 => self.price10mg,
            DoseLevel::Mg12_5 => self.price12_5mg,
            DoseLevel::Mg15 => self.price15mg,
        };
        raw.filter(|&p| p > 0)
    }

    /// Normalized facility type, with a missing or blank type read as clinic.
    #[must_use]
    pub fn type_code(&self) -> String {
        let normalized = normalize(self.facility_type.as_deref().unwrap_or_default());
        if normalized.is_empty() {
            DEFAULT_TYPE_CODE.to_string()
        } else {
            normalized
        }
    }

    /// Display label for the city: the dictionary label when the stored value
    /// is known, otherwise the stored value as-is.
    #[must_use]
    pub fn city_label(&self) -> String {
        let raw = self.city.as_deref().unwrap_or_default();
        CITY_DICTIONARY
            .resolve(raw)
            .map_or_else(|| raw.trim().to_string(), |e| e.label.to_string())
    }

    /// Dictionary entry for the facility type. A type the dictionary cannot
    /// resolve reads as clinic.
    fn type_entry(&self) -> Option<&'static DictionaryEntry> {
        TYPE_DICTIONARY
            .resolve(&self.type_code())
            .or_else(|| TYPE_DICTIONARY.get(DEFAULT_TYPE_CODE))
    }

    /// Canonical facility type code, always one of the dictionary's codes.
    #[must_use]
    pub fn canonical_type_code(&self) -> &'static str {
        self.type_entry().map_or(DEFAULT_TYPE_CODE, |e| e.code)
    }

    /// Display label for the facility type. Anything that is not a known
    /// hospital or pharmacy displays as a clinic.
    #[must_use]
    pub fn type_label(&self) -> &'static str {
        self.type_entry().map_or("", |e| e.label)
    }
}

/// Accepts integers, floats, or numeric strings; anything non-positive or
/// unparseable becomes `None` instead of failing the whole listing.
fn deserialize_price<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawPrice {
        Int(i64),
        Float(f64),
        Text(String),
        Other(IgnoredAny),
    }

    let raw = Option::<RawPrice>::deserialize(deserializer)?;
    Ok(match raw {
        None => None,
        Some(RawPrice::Int(n)) => u32::try_from(n).ok(),
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Some(RawPrice::Float(f)) => {
            (f.is_finite() && f >= 0.0 && f <= f64::from(u32::MAX)).then(|| f.round() as u32)
        }
        Some(RawPrice::Text(s)) => s.trim().parse::<u32>().ok(),
        Some(RawPrice::Other(_)) => None,
    }
    .filter(|&p| p > 0))
}

/// Keeps only the `YYYY-MM-DD` prefix of a date or timestamp string. Values
/// that are not strings are dropped.
fn deserialize_date_prefix<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawDate {
        Text(String),
        Other(IgnoredAny),
    }

    Ok(match Option::<RawDate>::deserialize(deserializer)? {
        Some(RawDate::Text(s)) => parse_date_prefix(&s),
        Some(RawDate::Other(_)) | None => None,
    })
}

#[must_use]
pub(crate) fn parse_date_prefix(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    let prefix = s.get(..10).unwrap_or(s);
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}
