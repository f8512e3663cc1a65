// ── Capability descriptors ──

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Language used when the requested translation is missing.
pub const FALLBACK_LANGUAGE: &str = "en";

/// Text that is either a single string or a set of translations keyed by
/// language code (`{"en": "Temperature", "nl": "Temperatuur"}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LocalizedText {
    Plain(String),
    Translations(BTreeMap<String, String>),
}

impl LocalizedText {
    /// Resolve the text for `language`, falling back to English.
    ///
    /// Translation sets with neither language resolve to an
    /// `Untranslated string: ...` marker listing what is available.
    pub fn resolve(&self, language: &str) -> String {
        match self {
            Self::Plain(text) => text.clone(),
            Self::Translations(map) => map
                .get(language)
                .or_else(|| map.get(FALLBACK_LANGUAGE))
                .cloned()
                .unwrap_or_else(|| {
                    let available: Vec<&str> = map.keys().map(String::as_str).collect();
                    format!("Untranslated string: [{}]", available.join(", "))
                }),
        }
    }
}

impl From<&str> for LocalizedText {
    fn from(text: &str) -> Self {
        Self::Plain(text.to_owned())
    }
}

/// Value type of a capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CapabilityType {
    Boolean,
    Number,
    String,
    Enum,
}

/// A capability an entity exposes to the host platform.
///
/// Only these seven fields are carried; anything else in a manifest is
/// ignored on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityDescriptor {
    pub title: LocalizedText,
    #[serde(rename = "type")]
    pub kind: CapabilityType,
    #[serde(default = "default_true")]
    pub getable: bool,
    #[serde(default = "default_true")]
    pub setable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ui_component: Option<String>,
}

fn default_true() -> bool {
    true
}
