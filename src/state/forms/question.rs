//! Question definitions

use serde::{Deserialize, Serialize};
use std::fmt;

use super::identity::{DisplayId, NodeIdentity};
use crate::state::{LocalizedOptions, LocalizedText, LocalizedValueSet};

/// Kinds of form field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionType {
    ShortText,
    #[serde(alias = "long_text")]
    LongText,
    Markdown,
    SingleChoice,
    MultiChoice,
    MultiCheckbox,
    File,
    MultiFile,
    Date,
    Reference,
    Information,
}

impl QuestionType {
    pub const ALL: [QuestionType; 11] = [
        Self::ShortText,
        Self::LongText,
        Self::Markdown,
        Self::SingleChoice,
        Self::MultiChoice,
        Self::MultiCheckbox,
        Self::File,
        Self::MultiFile,
        Self::Date,
        Self::Reference,
        Self::Information,
    ];

    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ShortText => "short-text",
            Self::LongText => "long-text",
            Self::Markdown => "markdown",
            Self::SingleChoice => "single-choice",
            Self::MultiChoice => "multi-choice",
            Self::MultiCheckbox => "multi-checkbox",
            Self::File => "file",
            Self::MultiFile => "multi-file",
            Self::Date => "date",
            Self::Reference => "reference",
            Self::Information => "information",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::ShortText => "Short Text",
            Self::LongText => "Long Text",
            Self::Markdown => "Markdown",
            Self::SingleChoice => "Single Choice",
            Self::MultiChoice => "Multi Choice",
            Self::MultiCheckbox => "Multi Checkbox",
            Self::File => "File",
            Self::MultiFile => "Multi File",
            Self::Date => "Date",
            Self::Reference => "Reference",
            Self::Information => "Information",
        }
    }

    /// Answers are option tokens rather than free values
    pub fn is_choice(&self) -> bool {
        matches!(
            self,
            Self::SingleChoice | Self::MultiChoice | Self::MultiCheckbox
        )
    }

    /// Editors show a placeholder input for these
    pub fn has_placeholder(&self) -> bool {
        matches!(
            self,
            Self::ShortText | Self::LongText | Self::Markdown | Self::MultiChoice
        )
    }

    pub fn is_file(&self) -> bool {
        matches!(self, Self::File | Self::MultiFile)
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One selectable answer of a choice question.
///
/// `id` is a process-local key; it is neither sent nor read, and equality
/// ignores it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChoiceOption {
    #[serde(skip)]
    pub id: DisplayId,
    pub value: String,
    #[serde(default)]
    pub label: String,
}

impl ChoiceOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: DisplayId::new(),
            value: value.into(),
            label: label.into(),
        }
    }
}

impl PartialEq for ChoiceOption {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value && self.label == other.label
    }
}

/// Localized text fields that can be edited one language at a time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    Name,
    Description,
    Headline,
    Placeholder,
    ValidationRegex,
    ValidationText,
}

impl fmt::Display for TextField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Name => "name",
            Self::Description => "description",
            Self::Headline => "headline",
            Self::Placeholder => "placeholder",
            Self::ValidationRegex => "validation_regex",
            Self::ValidationText => "validation_text",
        })
    }
}

/// A single form field definition
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionNode {
    pub display_id: DisplayId,
    /// Changes only through [`Self::assign_backend_id`]
    pub(crate) identity: NodeIdentity,
    /// Unset until the author picks a type
    pub question_type: Option<QuestionType>,
    pub headline: LocalizedText,
    pub description: LocalizedText,
    pub placeholder: LocalizedText,
    pub options: LocalizedOptions,
    pub validation_regex: LocalizedText,
    pub validation_text: LocalizedText,
    pub required: bool,
    pub order: u32,
    pub depends_on_question_id: Option<i64>,
    pub show_for_values: LocalizedValueSet,
    /// Review forms only
    pub weight: f64,
    /// Review forms only: the application question an information node echoes
    pub question_id: Option<i64>,
    pub key: Option<String>,
}

impl QuestionNode {
    pub fn identity(&self) -> NodeIdentity {
        self.identity
    }

    /// Record the backend id issued for this node on save
    pub fn assign_backend_id(&mut self, backend_id: i64) -> bool {
        self.identity.promote(backend_id)
    }

    /// Untyped question with every localized field empty
    pub fn blank(identity: NodeIdentity, order: u32, languages: &[String]) -> Self {
        Self {
            display_id: DisplayId::new(),
            identity,
            question_type: None,
            headline: LocalizedText::empty(languages),
            description: LocalizedText::empty(languages),
            placeholder: LocalizedText::empty(languages),
            options: LocalizedOptions::empty(languages),
            validation_regex: LocalizedText::empty(languages),
            validation_text: LocalizedText::empty(languages),
            required: false,
            order,
            depends_on_question_id: None,
            show_for_values: LocalizedValueSet::empty(languages),
            weight: 0.0,
            question_id: None,
            key: None,
        }
    }

    /// Unbound information question, waiting for an application question
    pub fn information(identity: NodeIdentity, order: u32, languages: &[String]) -> Self {
        Self {
            question_type: Some(QuestionType::Information),
            ..Self::blank(identity, order, languages)
        }
    }

    pub fn is_information(&self) -> bool {
        self.question_type == Some(QuestionType::Information)
    }

    /// Options for a language, empty when unset
    pub fn options_for(&self, language: &str) -> &[ChoiceOption] {
        self.options
            .get(language)
            .and_then(|opts| opts.as_deref())
            .unwrap_or_default()
    }

    pub(crate) fn text_field_mut(&mut self, field: TextField) -> Option<&mut LocalizedText> {
        match field {
            TextField::Headline => Some(&mut self.headline),
            TextField::Description => Some(&mut self.description),
            TextField::Placeholder => Some(&mut self.placeholder),
            TextField::ValidationRegex => Some(&mut self.validation_regex),
            TextField::ValidationText => Some(&mut self.validation_text),
            TextField::Name => None,
        }
    }

    /// Copy with fresh display ids for the node and its options
    pub(crate) fn duplicate(&self, identity: NodeIdentity) -> Self {
        let mut copy = self.clone();
        copy.display_id = DisplayId::new();
        copy.identity = identity;
        for (_, options) in copy.options.iter_mut() {
            for option in options.iter_mut().flatten() {
                option.id = DisplayId::new();
            }
        }
        copy
    }
}
