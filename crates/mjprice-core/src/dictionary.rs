//! Compiled-in label/alias dictionaries for cities and facility types.
//!
//! Each entry pairs a canonical code with a display label and the alternate
//! spellings that should be treated as the same code during matching. Alias
//! lists always include the display label itself.

use serde::Serialize;

/// Trim and case-fold a value for comparison.
#[must_use]
pub fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DictionaryEntry {
    pub code: &'static str,
    pub label: &'static str,
    pub aliases: &'static [&'static str],
}

impl DictionaryEntry {
    /// `true` if any alias equals `normalized` after case-folding the alias.
    #[must_use]
    pub fn has_alias(&self, normalized: &str) -> bool {
        self.aliases.iter().any(|alias| normalize(alias) == normalized)
    }

    /// `true` if `normalized` is this entry's code or one of its aliases.
    #[must_use]
    pub fn is_named(&self, normalized: &str) -> bool {
        self.code == normalized || self.has_alias(normalized)
    }
}

/// A closed, read-only list of [`DictionaryEntry`] values.
#[derive(Debug, Clone, Copy)]
pub struct LabelDictionary {
    entries: &'static [DictionaryEntry],
}

impl LabelDictionary {
    #[must_use]
    pub const fn new(entries: &'static [DictionaryEntry]) -> Self {
        Self { entries }
    }

    #[must_use]
    pub fn entries(&self) -> &'static [DictionaryEntry] {
        self.entries
    }

    /// Look up an entry by canonical code. Input is normalized first.
    #[must_use]
    pub fn get(&self, code: &str) -> Option<&'static DictionaryEntry> {
        let code = normalize(code);
        self.entries.iter().find(|e| e.code == code)
    }

    /// Resolve a stored value to its entry, by code first and then by alias.
    ///
    /// Returns `None` for values the dictionary does not know about.
    #[must_use]
    pub fn resolve(&self, value: &str) -> Option<&'static DictionaryEntry> {
        let normalized = normalize(value);
        if normalized.is_empty() {
            return None;
        }
        self.entries
            .iter()
            .find(|e| e.code == normalized)
            .or_else(|| self.entries.iter().find(|e| e.has_alias(&normalized)))
    }

    /// Entries whose alias list contains the already-normalized `value`.
    pub fn entries_with_alias<'a>(
        &self,
        value: &'a str,
    ) -> impl Iterator<Item = &'static DictionaryEntry> + 'a {
        let entries: &'static [DictionaryEntry] = self.entries;
        entries.iter().filter(move |e| e.has_alias(value))
    }
}

pub static CITY_DICTIONARY: LabelDictionary = LabelDictionary::new(&[
    DictionaryEntry {
        code: "taipei",
        label: "台北",
        aliases: &["台北", "臺北", "台北市", "臺北市", "taipei city"],
    },
    DictionaryEntry {
        code: "new_taipei",
        label: "新北",
        aliases: &["新北", "新北市", "new taipei", "new taipei city"],
    },
    DictionaryEntry {
        code: "taoyuan",
        label: "桃園",
        aliases: &["桃園", "桃園市"],
    },
    DictionaryEntry {
        code: "taichung",
        label: "台中",
        aliases: &["台中", "臺中", "台中市", "臺中市"],
    },
    DictionaryEntry {
        code: "tainan",
        label: "台南",
        aliases: &["台南", "臺南", "台南市", "臺南市"],
    },
    DictionaryEntry {
        code: "kaohsiung",
        label: "高雄",
        aliases: &["高雄", "高雄市"],
    },
    DictionaryEntry {
        code: "keelung",
        label: "基隆",
        aliases: &["基隆", "基隆市"],
    },
    DictionaryEntry {
        code: "hsinchu",
        label: "新竹",
        aliases: &["新竹", "新竹市"],
    },
    DictionaryEntry {
        code: "hsinchu_county",
        label: "新竹縣",
        aliases: &["新竹縣", "竹北"],
    },
    DictionaryEntry {
        code: "miaoli",
        label: "苗栗國",
        aliases: &["苗栗國", "苗栗", "苗栗縣"],
    },
    DictionaryEntry {
        code: "changhua",
        label: "彰化",
        aliases: &["彰化", "彰化縣"],
    },
    DictionaryEntry {
        code: "nantou",
        label: "南投",
        aliases: &["南投", "南投縣"],
    },
    DictionaryEntry {
        code: "yunlin",
        label: "雲林",
        aliases: &["雲林", "雲林縣"],
    },
    DictionaryEntry {
        code: "chiayi",
        label: "嘉義",
        aliases: &["嘉義", "嘉義市"],
    },
    DictionaryEntry {
        code: "chiayi_county",
        label: "嘉義縣",
        aliases: &["嘉義縣"],
    },
    DictionaryEntry {
        code: "pingtung",
        label: "屏東",
        aliases: &["屏東", "屏東縣"],
    },
    DictionaryEntry {
        code: "taitung",
        label: "台東",
        aliases: &["台東", "臺東", "台東縣", "臺東縣"],
    },
    DictionaryEntry {
        code: "hualien",
        label: "花蓮",
        aliases: &["花蓮", "花蓮縣"],
    },
    DictionaryEntry {
        code: "yilan",
        label: "宜蘭",
        aliases: &["宜蘭", "宜蘭縣"],
    },
    DictionaryEntry {
        code: "penghu",
        label: "澎湖",
        aliases: &["澎湖", "澎湖縣"],
    },
    DictionaryEntry {
        code: "kinmen",
        label: "金門",
        aliases: &["金門", "金門縣"],
    },
    DictionaryEntry {
        code: "lienchiang",
        label: "馬祖",
        aliases: &["馬祖", "連江", "連江縣"],
    },
]);

/// Canonical code for a record with no facility type.
pub const DEFAULT_TYPE_CODE: &str = "clinic";

pub static TYPE_DICTIONARY: LabelDictionary = LabelDictionary::new(&[
    DictionaryEntry {
        code: "clinic",
        label: "診所",
        aliases: &["診所"],
    },
    DictionaryEntry {
        code: "hospital",
        label: "醫院",
        aliases: &["醫院"],
    },
    DictionaryEntry {
        code: "pharmacy",
        label: "藥局",
        aliases: &["藥局", "藥房"],
    },
]);
