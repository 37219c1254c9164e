//! Word entries, API normalization and the per-poem word index

use crate::i18n::{t, Language, Text};
use crate::tokens::{clean_key, Script};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

pub type WordId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Masculine,
    Feminine,
    Neuter,
}

impl Gender {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_lowercase().as_str() {
            "m" | "masculine" => Some(Gender::Masculine),
            "f" | "feminine" => Some(Gender::Feminine),
            "n" | "neuter" => Some(Gender::Neuter),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Gender::Masculine => "m",
            Gender::Feminine => "f",
            Gender::Neuter => "n",
        }
    }

    pub fn label(self, language: Language) -> &'static str {
        match self {
            Gender::Masculine => t(language, Text::GenderMasculine),
            Gender::Feminine => t(language, Text::GenderFeminine),
            Gender::Neuter => t(language, Text::GenderNeuter),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordMetadata {
    pub synonyms: Vec<String>,
    pub antonyms: Vec<String>,
}

impl WordMetadata {
    pub fn is_empty(&self) -> bool {
        self.synonyms.is_empty() && self.antonyms.is_empty()
    }
}

/// Canonical dictionary record for one word.
///
/// Deserializing goes through [`RawWord`], so every legacy field name the
/// backend has used ends up in one shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawWord")]
pub struct WordEntry {
    pub id: WordId,
    pub devnagri: String,
    pub alternate_script: Option<String>,
    pub gender: Option<Gender>,
    /// Marathi definition
    pub definition_primary: Option<String>,
    /// English definition
    pub definition_secondary: Option<String>,
    pub pronunciation: Option<String>,
    pub metadata: Option<WordMetadata>,
}

impl WordEntry {
    pub fn new(id: WordId, devnagri: impl Into<String>) -> Self {
        Self {
            id,
            devnagri: devnagri.into(),
            alternate_script: None,
            gender: None,
            definition_primary: None,
            definition_secondary: None,
            pronunciation: None,
            metadata: None,
        }
    }

    pub fn has_definition(&self) -> bool {
        self.definition_primary.is_some() || self.definition_secondary.is_some()
    }
}

/// Word as it arrives from the API, before normalization.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawWord {
    pub id: WordId,
    pub devnagri: String,
    #[serde(default)]
    pub alternate_script: Option<String>,
    #[serde(default)]
    pub roman: Option<String>,
    #[serde(default)]
    pub inscript: Option<String>,
    #[serde(default)]
    pub gender_code: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub definition_primary: Option<String>,
    #[serde(default)]
    pub definition_mr: Option<String>,
    #[serde(default)]
    pub definition_secondary: Option<String>,
    #[serde(default)]
    pub definition_en: Option<String>,
    #[serde(default)]
    pub pronunciation: Option<String>,
    #[serde(default)]
    pub metadata: Option<Value>,
    #[serde(default)]
    pub metadata_json: Option<Value>,
}

impl From<RawWord> for WordEntry {
    fn from(raw: RawWord) -> Self {
        let gender = first_present([raw.gender_code, raw.gender])
            .and_then(|code| Gender::from_code(&code));
        let metadata = [raw.metadata, raw.metadata_json]
            .into_iter()
            .flatten()
            .find_map(|value| parse_metadata(&value))
            .filter(|m| !m.is_empty());

        Self {
            id: raw.id,
            devnagri: raw.devnagri.trim().to_string(),
            alternate_script: first_present([raw.alternate_script, raw.roman, raw.inscript]),
            gender,
            definition_primary: first_present([raw.definition_primary, raw.definition_mr]),
            definition_secondary: first_present([raw.definition_secondary, raw.definition_en]),
            pronunciation: first_present([raw.pronunciation]),
            metadata,
        }
    }
}

fn first_present<const N: usize>(candidates: [Option<String>; N]) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .map(|s| s.trim().to_string())
        .find(|s| !s.is_empty())
}

/// Metadata is stored either as an object or as a JSON-encoded string of one.
fn parse_metadata(value: &Value) -> Option<WordMetadata> {
    match value {
        Value::Object(map) => Some(WordMetadata {
            synonyms: string_list(map.get("synonyms")),
            antonyms: string_list(map.get("antonyms")),
        }),
        Value::String(s) => serde_json::from_str::<Value>(s)
            .ok()
            .and_then(|inner| match inner {
                Value::Object(_) => parse_metadata(&inner),
                _ => None,
            }),
        _ => None,
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

/// Pre-loaded words of one poem, keyed by both scripts.
///
/// Duplicate keys keep the first entry in list order.
#[derive(Debug, Clone, Default)]
pub struct WordIndex {
    entries: Vec<WordEntry>,
    by_devanagari: HashMap<String, usize>,
    by_roman: HashMap<String, usize>,
}

impl WordIndex {
    pub fn new(entries: Vec<WordEntry>) -> Self {
        let mut by_devanagari = HashMap::new();
        let mut by_roman = HashMap::new();

        for (idx, entry) in entries.iter().enumerate() {
            if let Some(key) = clean_key(&entry.devnagri, Script::Devanagari) {
                by_devanagari.entry(key).or_insert(idx);
            }
            if let Some(key) = entry
                .alternate_script
                .as_deref()
                .and_then(roman_key)
            {
                by_roman.entry(key).or_insert(idx);
            }
        }

        Self {
            entries,
            by_devanagari,
            by_roman,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[WordEntry] {
        &self.entries
    }

    pub fn find_devanagari(&self, key: &str) -> Option<&WordEntry> {
        self.by_devanagari.get(key).map(|&idx| &self.entries[idx])
    }

    /// Case-insensitive match against the entries' alternate-script form.
    pub fn find_alternate(&self, key: &str) -> Option<&WordEntry> {
        roman_key(key)
            .and_then(|k| self.by_roman.get(&k))
            .map(|&idx| &self.entries[idx])
    }
}

fn roman_key(text: &str) -> Option<String> {
    clean_key(text, Script::Roman).map(|k| k.to_lowercase())
}
