use indexmap::IndexMap;
use phf::phf_map;
use serde::{Deserialize, Serialize};

use crate::core::expression::ExpressionMapping;

/// Display names for the languages the backend usually offers.
static LANGUAGE_NAMES: phf::Map<&'static str, &'static str> = phf_map! {
    "ru" => "Russian",
    "en" => "English",
    "de" => "German",
    "es" => "Spanish",
    "fr" => "French",
};

/// Human-readable name for a language code; unknown codes are shown as-is.
pub fn language_name(code: &str) -> &str {
    LANGUAGE_NAMES.get(code).copied().unwrap_or(code)
}

// =============================================================================
// Models
// =============================================================================

/// One avatar model offered by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelEntry {
    /// Display name
    pub name: String,

    /// Model description URL handed to the loader
    pub url: String,

    /// Per-model expression mapping, when the backend supplies one
    #[serde(default)]
    pub expressions: Option<ExpressionMapping>,
}

impl ModelEntry {
    /// The entry's mapping, or an empty one.
    pub fn mapping(&self) -> ExpressionMapping {
        self.expressions.clone().unwrap_or_default()
    }
}

/// `GET {api}/models`: model key to entry, in catalog order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelCatalog(IndexMap<String, ModelEntry>);

impl ModelCatalog {
    pub fn get(&self, key: &str) -> Option<&ModelEntry> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ModelEntry)> {
        self.0.iter().map(|(key, entry)| (key.as_str(), entry))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, ModelEntry)> for ModelCatalog {
    fn from_iter<I: IntoIterator<Item = (String, ModelEntry)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

// =============================================================================
// Voices
// =============================================================================

/// A language and speaker pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceSelection {
    pub language: String,
    pub speaker: String,
}

/// `GET {api}/voices`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceCatalog {
    /// Language code to its speakers
    pub available: IndexMap<String, Vec<String>>,

    /// Selection currently active on the backend
    pub current: VoiceSelection,
}

impl VoiceCatalog {
    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.available.keys().map(String::as_str)
    }

    /// Speakers for a language; empty for unknown languages.
    pub fn speakers(&self, language: &str) -> &[String] {
        self.available
            .get(language)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

// =============================================================================
// LLMs
// =============================================================================

/// `GET {api}/llm`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmCatalog {
    pub available: Vec<String>,
    #[serde(default)]
    pub current: Option<String>,
}
