//! Sections: ordered groups of questions

use super::identity::{DisplayId, NodeIdentity};
use super::question::{QuestionNode, TextField};
use crate::state::{LocalizedText, LocalizedValueSet};

/// Name given to sections created in the editor
pub const UNTITLED_SECTION: &str = "Untitled Section";

#[derive(Debug, Clone, PartialEq)]
pub struct SectionNode {
    pub display_id: DisplayId,
    /// Changes only through [`Self::assign_backend_id`]
    pub(crate) identity: NodeIdentity,
    pub name: LocalizedText,
    pub description: LocalizedText,
    pub order: u32,
    pub depends_on_question_id: Option<i64>,
    pub show_for_values: LocalizedValueSet,
    pub key: Option<String>,
    pub questions: Vec<QuestionNode>,
}

impl SectionNode {
    pub fn identity(&self) -> NodeIdentity {
        self.identity
    }

    /// Record the backend id issued for this node on save
    pub fn assign_backend_id(&mut self, backend_id: i64) -> bool {
        self.identity.promote(backend_id)
    }

    /// Empty section named "Untitled Section" in every language
    pub fn untitled(identity: NodeIdentity, order: u32, languages: &[String]) -> Self {
        Self {
            display_id: DisplayId::new(),
            identity,
            name: LocalizedText::uniform(languages, Some(UNTITLED_SECTION.to_string())),
            description: LocalizedText::empty(languages),
            order,
            depends_on_question_id: None,
            show_for_values: LocalizedValueSet::empty(languages),
            key: None,
            questions: Vec::new(),
        }
    }

    pub fn question(&self, id: DisplayId) -> Option<&QuestionNode> {
        self.questions.iter().find(|q| q.display_id == id)
    }

    pub fn question_position(&self, id: DisplayId) -> Option<usize> {
        self.questions.iter().position(|q| q.display_id == id)
    }

    /// Reassign `order` from position (1-based)
    pub fn renumber(&mut self) {
        for (index, question) in self.questions.iter_mut().enumerate() {
            question.order = index as u32 + 1;
        }
    }

    pub(crate) fn text_field_mut(&mut self, field: TextField) -> Option<&mut LocalizedText> {
        match field {
            TextField::Name => Some(&mut self.name),
            TextField::Description => Some(&mut self.description),
            _ => None,
        }
    }
}
