//! City / facility-type / keyword filtering over an in-memory record list.
//!
//! Filter inputs are compiled once into a [`RecordFilter`]; evaluating it
//! against a record is a pure function of the two, so the same inputs always
//! select the same records in the same order.

use crate::dictionary::{normalize, LabelDictionary, CITY_DICTIONARY, TYPE_DICTIONARY};
use crate::record::PriceRecord;

/// Sentinel filter value that matches every record.
pub const ALL: &str = "all";

/// Compiled form of the three filter inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFilter {
    /// Normalized city filter; `None` for [`ALL`].
    city: Option<String>,
    /// Normalized type filter; `None` for [`ALL`].
    facility_type: Option<String>,
    /// Keyword plus its alias expansions; empty when there is no keyword.
    keyword_variants: Vec<String>,
}

impl RecordFilter {
    #[must_use]
    pub fn new(city: &str, facility_type: &str, keyword: &str) -> Self {
        Self {
            city: selector(city),
            facility_type: selector(facility_type),
            keyword_variants: keyword_variants(keyword),
        }
    }

    /// A filter that selects every record.
    #[must_use]
    pub fn everything() -> Self {
        Self::new(ALL, ALL, "")
    }

    #[must_use]
    pub fn keyword_variants(&self) -> &[String] {
        &self.keyword_variants
    }

    #[must_use]
    pub fn matches(&self, record: &PriceRecord) -> bool {
        self.city_matches(record) && self.type_matches(record) && self.keyword_matches(record)
    }

    /// Applies the filter, preserving input order.
    #[must_use]
    pub fn apply<'a>(&self, records: &'a [PriceRecord]) -> Vec<&'a PriceRecord> {
        records.iter().filter(|r| self.matches(r)).collect()
    }

    fn city_matches(&self, record: &PriceRecord) -> bool {
        let Some(filter) = self.city.as_deref() else {
            return true;
        };
        let city = normalize(record.city.as_deref().unwrap_or_default());
        value_matches(&CITY_DICTIONARY, &city, filter)
    }

    fn type_matches(&self, record: &PriceRecord) -> bool {
        let Some(filter) = self.facility_type.as_deref() else {
            return true;
        };
        value_matches(&TYPE_DICTIONARY, &record.type_code(), filter)
    }

    fn keyword_matches(&self, record: &PriceRecord) -> bool {
        if self.keyword_variants.is_empty() {
            return true;
        }
        let fields = searchable_fields(record);
        self.keyword_variants
            .iter()
            .any(|variant| fields.iter().any(|field| field.contains(variant.as_str())))
    }
}

impl Default for RecordFilter {
    fn default() -> Self {
        Self::everything()
    }
}

/// Returns the records matching all three filters, in input order.
///
/// `city` and `facility_type` are either [`ALL`] or a canonical code;
/// an empty `keyword` matches everything. Never fails: no match is an empty
/// vector.
#[must_use]
pub fn filter_records<'a>(
    records: &'a [PriceRecord],
    city: &str,
    facility_type: &str,
    keyword: &str,
) -> Vec<&'a PriceRecord> {
    RecordFilter::new(city, facility_type, keyword).apply(records)
}

/// City filter options drawn from the data: [`ALL`] followed by each distinct
/// non-empty city value in first-seen order.
#[must_use]
pub fn city_options(records: &[PriceRecord]) -> Vec<String> {
    let mut options = vec![ALL.to_string()];
    for city in records
        .iter()
        .filter_map(|r| r.city.as_deref())
        .map(str::trim)
        .filter(|c| !c.is_empty())
    {
        if !options.iter().any(|o| o == city) {
            options.push(city.to_string());
        }
    }
    options
}

fn selector(filter: &str) -> Option<String> {
    let normalized = normalize(filter);
    (normalized != ALL).then_some(normalized)
}

/// Direct equality first, then the filter code's alias list. Unknown filter
/// codes only ever match by equality.
fn value_matches(dictionary: &LabelDictionary, value: &str, filter: &str) -> bool {
    value == filter
        || dictionary
            .get(filter)
            .is_some_and(|entry| entry.is_named(value))
}

/// The normalized keyword plus, for every city or type entry that lists it
/// as an alias, that entry's code and all of its aliases.
///
/// A keyword that is an alias of several entries expands to all of them.
fn keyword_variants(keyword: &str) -> Vec<String> {
    let keyword = normalize(keyword);
    if keyword.is_empty() {
        return Vec::new();
    }

    let mut variants = vec![keyword.clone()];
    let mut push = |value: String| {
        if !value.is_empty() && !variants.contains(&value) {
            variants.push(value);
        }
    };

    for entry in CITY_DICTIONARY
        .entries_with_alias(&keyword)
        .chain(TYPE_DICTIONARY.entries_with_alias(&keyword))
    {
        push(entry.code.to_string());
        for alias in entry.aliases {
            push(normalize(alias));
        }
    }

    variants
}

/// Facility name, district, city code and label, type code and label, all
/// normalized. Missing values are empty strings.
fn searchable_fields(record: &PriceRecord) -> [String; 6] {
    let city = normalize(record.city.as_deref().unwrap_or_default());
    let (city_code, city_label) = match CITY_DICTIONARY.resolve(&city) {
        Some(entry) => (entry.code.to_string(), normalize(entry.label)),
        None => (city, String::new()),
    };

    [
        normalize(record.clinic.as_deref().unwrap_or_default()),
        normalize(record.district.as_deref().unwrap_or_default()),
        city_code,
        city_label,
        record.canonical_type_code().to_string(),
        normalize(record.type_label()),
    ]
}
