use super::mapping::{ExpressionDefinition, ExpressionMapping};
use crate::core::protocol::ExpressionId;

/// Placeholder shown when a model exposes no expressions.
pub const NO_EXPRESSIONS_LABEL: &str = "No expressions available";

/// One selectable expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpressionControl {
    /// Text shown to the user
    pub label: String,
    /// Human-readable expression name
    pub name: String,
    /// Id passed to the engine when the control is used
    pub id: ExpressionId,
}

impl ExpressionControl {
    fn matches(&self, value: &str) -> bool {
        self.name == value || self.id.matches(value)
    }
}

/// The list of expression controls plus the single active marker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpressionPanel {
    controls: Vec<ExpressionControl>,
    active: Option<usize>,
}

impl ExpressionPanel {
    /// Panel with no controls.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build controls from a catalog mapping, labels capitalized.
    pub fn from_mapping(mapping: &ExpressionMapping) -> Self {
        let controls = mapping
            .iter()
            .map(|(name, id)| ExpressionControl {
                label: capitalize(name),
                name: name.to_string(),
                id: id.clone(),
            })
            .collect();
        Self {
            controls,
            active: None,
        }
    }

    /// Build controls from the model's own definitions; unnamed ones are skipped.
    pub fn from_definitions(definitions: &[ExpressionDefinition]) -> Self {
        let controls = definitions
            .iter()
            .filter_map(ExpressionDefinition::display_name)
            .map(|name| ExpressionControl {
                label: name.clone(),
                id: ExpressionId::Name(name.clone()),
                name,
            })
            .collect();
        Self {
            controls,
            active: None,
        }
    }

    /// Mapping wins entirely when present; definitions are the fallback.
    pub fn derive(mapping: &ExpressionMapping, definitions: &[ExpressionDefinition]) -> Self {
        if mapping.is_empty() {
            Self::from_definitions(definitions)
        } else {
            Self::from_mapping(mapping)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }

    pub fn controls(&self) -> &[ExpressionControl] {
        &self.controls
    }

    /// Control with the given name.
    pub fn find(&self, name: &str) -> Option<&ExpressionControl> {
        self.controls.iter().find(|c| c.name == name)
    }

    /// The control currently marked active.
    pub fn active(&self) -> Option<&ExpressionControl> {
        self.active.and_then(|i| self.controls.get(i))
    }

    /// Move the active marker to the first control whose name or id equals
    /// `value`. Clears the marker when nothing matches.
    pub fn mark_active(&mut self, value: &str) -> Option<&ExpressionControl> {
        self.active = self.controls.iter().position(|c| c.matches(value));
        self.active()
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
