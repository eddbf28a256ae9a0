use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::protocol::ExpressionId;

static EXPRESSION_FILE_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.exp3?\.json$").expect("valid suffix pattern"));

/// Human-readable expression name to engine expression id, per model.
///
/// Insertion order is preserved so the panel lists expressions the way the
/// catalog declares them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpressionMapping(IndexMap<String, ExpressionId>);

impl ExpressionMapping {
    /// Empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when the mapping has no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of mapped names.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Mapped id for a name.
    pub fn get(&self, name: &str) -> Option<&ExpressionId> {
        self.0.get(name)
    }

    /// Iterate `(name, id)` pairs in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ExpressionId)> {
        self.0.iter().map(|(name, id)| (name.as_str(), id))
    }

    /// Resolve an inbound expression to the id the engine receives.
    ///
    /// A name present in the mapping resolves to its mapped id; anything else
    /// is returned unchanged.
    pub fn resolve(&self, value: &ExpressionId) -> ExpressionId {
        value
            .as_name()
            .and_then(|name| self.0.get(name))
            .unwrap_or(value)
            .clone()
    }
}

impl<K: Into<String>, V: Into<ExpressionId>> FromIterator<(K, V)> for ExpressionMapping {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, id)| (name.into(), id.into()))
                .collect(),
        )
    }
}

/// Expression entry embedded in a model description.
///
/// Cubism 3/4 descriptions use `Name`/`File`, Cubism 2 uses `name`/`file`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpressionDefinition {
    #[serde(default, rename = "Name", alias = "name")]
    pub name: Option<String>,
    #[serde(default, rename = "File", alias = "file")]
    pub file: Option<String>,
}

impl ExpressionDefinition {
    /// Definition with only a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            file: None,
        }
    }

    /// The name shown for this definition: its `Name`, else its file name
    /// without the expression suffix.
    pub fn display_name(&self) -> Option<String> {
        if let Some(name) = self.name.as_deref().filter(|n| !n.is_empty()) {
            return Some(name.to_string());
        }
        let file = self.file.as_deref()?;
        let stem = file.rsplit('/').next().unwrap_or(file);
        let stem = EXPRESSION_FILE_SUFFIX.replace(stem, "");
        (!stem.is_empty()).then(|| stem.into_owned())
    }
}
