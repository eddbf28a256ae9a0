//! Settings selectors: model, voice language, voice speaker and LLM.
//!
//! A selector holds its options, the chosen value and a disabled flag that is
//! set while a change is being pushed to the backend.

use std::fmt;

use crate::core::catalog::{LlmCatalog, ModelCatalog, VoiceCatalog, language_name};

/// Which selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectorKind {
    Model,
    Language,
    Speaker,
    Llm,
}

impl fmt::Display for SelectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectorKind::Model => write!(f, "model"),
            SelectorKind::Language => write!(f, "language"),
            SelectorKind::Speaker => write!(f, "speaker"),
            SelectorKind::Llm => write!(f, "llm"),
        }
    }
}

/// One choice in a selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorOption {
    pub value: String,
    pub label: String,
}

impl SelectorOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }

    /// Option labelled with its own value.
    pub fn plain(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            label: value.clone(),
            value,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selector {
    options: Vec<SelectorOption>,
    value: Option<String>,
    disabled: bool,
}

impl Selector {
    pub fn options(&self) -> &[SelectorOption] {
        &self.options
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    pub fn contains(&self, value: &str) -> bool {
        self.options.iter().any(|option| option.value == value)
    }

    /// Replace the options. The value is kept only if still offered.
    pub fn set_options(&mut self, options: Vec<SelectorOption>) {
        self.options = options;
        if let Some(value) = &self.value
            && !self.contains(value)
        {
            self.value = None;
        }
    }

    /// Choose a value. Values that are not offered are still recorded, the
    /// backend decides what it accepts.
    pub fn select(&mut self, value: impl Into<String>) {
        self.value = Some(value.into());
    }
}

/// All settings selectors of a session.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub model: Selector,
    pub language: Selector,
    pub speaker: Selector,
    pub llm: Selector,
}

impl Settings {
    pub fn get(&self, kind: SelectorKind) -> &Selector {
        match kind {
            SelectorKind::Model => &self.model,
            SelectorKind::Language => &self.language,
            SelectorKind::Speaker => &self.speaker,
            SelectorKind::Llm => &self.llm,
        }
    }

    /// Fill the model selector from the catalog, labelled by display name.
    pub fn apply_models(&mut self, catalog: &ModelCatalog) {
        self.model.set_options(
            catalog
                .iter()
                .map(|(key, entry)| SelectorOption::new(key, &entry.name))
                .collect(),
        );
    }

    /// Fill both voice selectors and select the backend's current voice.
    pub fn apply_voices(&mut self, catalog: &VoiceCatalog) {
        self.language.set_options(
            catalog
                .languages()
                .map(|code| SelectorOption::new(code, language_name(code)))
                .collect(),
        );
        self.language.select(&catalog.current.language);
        self.set_speakers(catalog.speakers(&catalog.current.language));
        if !catalog.current.speaker.is_empty() {
            self.speaker.select(&catalog.current.speaker);
        }
    }

    /// Replace the speaker options.
    pub fn set_speakers(&mut self, speakers: &[String]) {
        self.speaker
            .set_options(speakers.iter().map(SelectorOption::plain).collect());
    }

    /// Fill the LLM selector and select the backend's current model.
    pub fn apply_llms(&mut self, catalog: &LlmCatalog) {
        self.llm
            .set_options(catalog.available.iter().map(SelectorOption::plain).collect());
        if let Some(current) = &catalog.current {
            self.llm.select(current);
        }
    }

    /// Disable or enable both voice selectors.
    pub fn set_voice_disabled(&mut self, disabled: bool) {
        self.language.set_disabled(disabled);
        self.speaker.set_disabled(disabled);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voices() -> VoiceCatalog {
        serde_json::from_str(
            r#"{"available": {"ru": ["aidar", "baya"], "xx": ["x1"]},
                "current": {"language": "ru", "speaker": "baya"}}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_apply_voices() {
        let mut settings = Settings::default();
        settings.apply_voices(&voices());

        let labels: Vec<_> = settings
            .language
            .options()
            .iter()
            .map(|o| o.label.as_str())
            .collect();
        assert_eq!(labels, vec!["Russian", "xx"]);
        assert_eq!(settings.language.value(), Some("ru"));
        assert_eq!(settings.speaker.options().len(), 2);
        assert_eq!(settings.speaker.value(), Some("baya"));
    }

    #[test]
    fn test_set_options_drops_stale_value() {
        let mut settings = Settings::default();
        settings.apply_voices(&voices());
        settings.set_speakers(&["x1".to_string()]);
        assert_eq!(settings.speaker.value(), None);
    }

    #[test]
    fn test_voice_disable_covers_both() {
        let mut settings = Settings::default();
        settings.set_voice_disabled(true);
        assert!(settings.get(SelectorKind::Language).is_disabled());
        assert!(settings.get(SelectorKind::Speaker).is_disabled());
        assert!(!settings.get(SelectorKind::Llm).is_disabled());
    }

    #[test]
    fn test_apply_llms() {
        let mut settings = Settings::default();
        settings.apply_llms(&LlmCatalog {
            available: vec!["a".to_string(), "b".to_string()],
            current: Some("b".to_string()),
        });
        assert!(settings.llm.contains("a"));
        assert_eq!(settings.llm.value(), Some("b"));
    }
}
