//! Per-language field values

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::forms::ChoiceOption;

/// A value keyed by language code.
///
/// Every editable text on a form is one of these. A document keeps an entry
/// for every configured language; [`LocalizedValue::normalize`] fills the gaps
/// when data arrives from the backend with fewer languages than configured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalizedValue<T> {
    values: BTreeMap<String, T>,
}

/// Free text per language (headline, description, regex, ...)
pub type LocalizedText = LocalizedValue<Option<String>>;

/// Ordered choice options per language
pub type LocalizedOptions = LocalizedValue<Option<Vec<ChoiceOption>>>;

/// Set of answer values per language, used by visibility rules
pub type LocalizedValueSet = LocalizedValue<Option<Vec<String>>>;

impl<T> Default for LocalizedValue<T> {
    fn default() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }
}

impl<T: Clone> LocalizedValue<T> {
    /// Same value for every language
    pub fn uniform(languages: &[String], value: T) -> Self {
        Self {
            values: languages
                .iter()
                .map(|lang| (lang.clone(), value.clone()))
                .collect(),
        }
    }
}

impl<T: Default> LocalizedValue<T> {
    /// Empty (default) value for every language
    pub fn empty(languages: &[String]) -> Self {
        Self {
            values: languages
                .iter()
                .map(|lang| (lang.clone(), T::default()))
                .collect(),
        }
    }

    /// Insert a default entry for each configured language that is missing
    pub fn normalize(&mut self, languages: &[String]) {
        for lang in languages {
            self.values.entry(lang.clone()).or_default();
        }
    }

    /// Mutable access to a language entry, creating it if absent
    pub fn entry_mut(&mut self, language: &str) -> &mut T {
        self.values.entry(language.to_string()).or_default()
    }
}

impl<T> LocalizedValue<T> {
    pub fn get(&self, language: &str) -> Option<&T> {
        self.values.get(language)
    }

    /// Replace the value for one language, leaving the others untouched
    pub fn set(&mut self, language: &str, value: T) {
        self.values.insert(language.to_string(), value);
    }

    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.values.iter().map(|(lang, value)| (lang.as_str(), value))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut T)> {
        self.values
            .iter_mut()
            .map(|(lang, value)| (lang.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl LocalizedText {
    /// Text for a language, empty when missing or null
    pub fn text(&self, language: &str) -> &str {
        self.get(language)
            .and_then(|v| v.as_deref())
            .unwrap_or_default()
    }

    /// True when no language carries non-whitespace text
    pub fn is_blank(&self) -> bool {
        self.values
            .values()
            .all(|v| v.as_deref().map_or(true, |s| s.trim().is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn langs() -> Vec<String> {
        vec!["en".to_string(), "fr".to_string()]
    }

    #[test]
    fn test_empty_has_entry_per_language() {
        let value = LocalizedText::empty(&langs());
        assert_eq!(value.len(), 2);
        assert_eq!(value.get("en"), Some(&None));
        assert_eq!(value.get("fr"), Some(&None));
    }

    #[test]
    fn test_set_leaves_other_languages_untouched() {
        let mut value = LocalizedText::uniform(&langs(), Some("Name".to_string()));
        value.set("fr", Some("Nom".to_string()));
        assert_eq!(value.text("en"), "Name");
        assert_eq!(value.text("fr"), "Nom");
    }

    #[test]
    fn test_normalize_fills_missing_languages() {
        let mut value: LocalizedText = serde_json::from_str(r#"{"en": "Hello"}"#).unwrap();
        value.normalize(&langs());
        assert_eq!(value.text("en"), "Hello");
        assert_eq!(value.get("fr"), Some(&None));
    }

    #[test]
    fn test_normalize_keeps_extra_languages() {
        let mut value: LocalizedText = serde_json::from_str(r#"{"pt": "Olá"}"#).unwrap();
        value.normalize(&langs());
        assert_eq!(value.len(), 3);
        assert_eq!(value.text("pt"), "Olá");
    }

    #[test]
    fn test_text_of_missing_language_is_empty() {
        let value = LocalizedText::default();
        assert_eq!(value.text("en"), "");
    }

    #[test]
    fn test_is_blank() {
        let mut value = LocalizedText::empty(&langs());
        assert!(value.is_blank());
        value.set("en", Some("   ".to_string()));
        assert!(value.is_blank());
        value.set("fr", Some("Section".to_string()));
        assert!(!value.is_blank());
    }

    #[test]
    fn test_serializes_as_plain_map() {
        let value = LocalizedText::uniform(&langs(), Some("x".to_string()));
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, r#"{"en":"x","fr":"x"}"#);
    }

    #[test]
    fn test_entry_mut_creates_default() {
        let mut sets = LocalizedValueSet::default();
        sets.entry_mut("en")
            .get_or_insert_with(Vec::new)
            .push("yes".to_string());
        assert_eq!(sets.get("en"), Some(&Some(vec!["yes".to_string()])));
    }
}
