//! Form documents and the operations that edit them

use chrono::{DateTime, Utc};
use std::fmt;
use tracing::debug;

use super::identity::{DisplayId, IdentityAssigner, NodeIdentity};
use super::question::{ChoiceOption, QuestionNode, QuestionType, TextField};
use super::section::SectionNode;
use crate::error::{FormError, NodeKind};

/// Surrogate id of the question every new document starts with
pub const SEED_SURROGATE_ID: i64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    Application,
    Review,
}

impl fmt::Display for FormKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Application => "application",
            Self::Review => "review",
        })
    }
}

/// Settings only review forms carry
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewSettings {
    pub stage: u32,
    pub deadline: Option<DateTime<Utc>>,
    pub active: bool,
    /// Application form whose answers the review form annotates
    pub application_form_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormVariant {
    Application { nominations_allowed: bool },
    Review(ReviewSettings),
}

/// Position of a node inside the document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeLocation {
    Section(usize),
    Question(usize, usize),
}

/// An application or review form being authored
#[derive(Debug, Clone, PartialEq)]
pub struct FormDocument {
    /// Absent until the backend has created the form
    pub identity: Option<NodeIdentity>,
    pub event_id: i64,
    /// Languages every localized value carries
    pub languages: Vec<String>,
    pub is_open: bool,
    pub variant: FormVariant,
    pub sections: Vec<SectionNode>,
}

impl FormDocument {
    /// New application form with one default section and question
    pub fn new_application(event_id: i64, languages: Vec<String>) -> Self {
        let mut doc = Self {
            identity: None,
            event_id,
            languages,
            is_open: true,
            variant: FormVariant::Application {
                nominations_allowed: false,
            },
            sections: Vec::new(),
        };
        doc.seed();
        doc
    }

    /// New review form with one default section and question
    pub fn new_review(event_id: i64, languages: Vec<String>, settings: ReviewSettings) -> Self {
        let mut doc = Self {
            identity: None,
            event_id,
            languages,
            is_open: true,
            variant: FormVariant::Review(settings),
            sections: Vec::new(),
        };
        doc.seed();
        doc
    }

    fn seed(&mut self) {
        let section_identity = NodeIdentity::Local(IdentityAssigner::next(self));
        let mut section = SectionNode::untitled(section_identity, 1, &self.languages);
        section.questions.push(QuestionNode::blank(
            NodeIdentity::Local(SEED_SURROGATE_ID),
            1,
            &self.languages,
        ));
        self.sections.push(section);
    }

    pub fn kind(&self) -> FormKind {
        match self.variant {
            FormVariant::Application { .. } => FormKind::Application,
            FormVariant::Review(_) => FormKind::Review,
        }
    }

    /// The form's backend id, if it has been created
    pub fn backend_id(&self) -> Option<i64> {
        self.identity.and_then(NodeIdentity::backend_id)
    }

    pub fn nominations_allowed(&self) -> bool {
        matches!(
            self.variant,
            FormVariant::Application {
                nominations_allowed: true
            }
        )
    }

    pub fn set_nominations_allowed(&mut self, allowed: bool) -> Result<(), FormError> {
        match &mut self.variant {
            FormVariant::Application {
                nominations_allowed,
            } => {
                *nominations_allowed = allowed;
                Ok(())
            }
            FormVariant::Review(_) => Err(FormError::WrongVariant {
                expected: FormKind::Application,
            }),
        }
    }

    pub fn review_settings(&self) -> Option<&ReviewSettings> {
        match &self.variant {
            FormVariant::Review(settings) => Some(settings),
            FormVariant::Application { .. } => None,
        }
    }

    /// Identities of every section and question
    pub fn node_identities(&self) -> impl Iterator<Item = NodeIdentity> + '_ {
        self.sections.iter().flat_map(|section| {
            std::iter::once(section.identity).chain(section.questions.iter().map(|q| q.identity))
        })
    }

    /// Every question in document order
    pub fn questions(&self) -> impl Iterator<Item = &QuestionNode> + '_ {
        self.sections.iter().flat_map(|s| s.questions.iter())
    }

    pub fn section(&self, id: DisplayId) -> Option<&SectionNode> {
        self.sections.iter().find(|s| s.display_id == id)
    }

    pub fn question(&self, id: DisplayId) -> Option<&QuestionNode> {
        self.questions().find(|q| q.display_id == id)
    }

    /// Question whose backend or surrogate id is `raw_id`, with its
    /// position as (section index, question index)
    pub fn question_by_raw_id(&self, raw_id: i64) -> Option<(usize, usize, &QuestionNode)> {
        self.sections.iter().enumerate().find_map(|(s, section)| {
            section
                .questions
                .iter()
                .enumerate()
                .find(|(_, q)| q.identity.raw() == raw_id)
                .map(|(q, question)| (s, q, question))
        })
    }

    pub fn locate(&self, id: DisplayId) -> Result<NodeLocation, FormError> {
        for (s, section) in self.sections.iter().enumerate() {
            if section.display_id == id {
                return Ok(NodeLocation::Section(s));
            }
            if let Some(q) = section.question_position(id) {
                return Ok(NodeLocation::Question(s, q));
            }
        }
        Err(FormError::NotFound {
            kind: NodeKind::Node,
            id,
        })
    }

    fn section_index(&self, id: DisplayId) -> Result<usize, FormError> {
        self.sections
            .iter()
            .position(|s| s.display_id == id)
            .ok_or(FormError::NotFound {
                kind: NodeKind::Section,
                id,
            })
    }

    fn question_index(&self, id: DisplayId) -> Result<(usize, usize), FormError> {
        self.sections
            .iter()
            .enumerate()
            .find_map(|(s, section)| section.question_position(id).map(|q| (s, q)))
            .ok_or(FormError::NotFound {
                kind: NodeKind::Question,
                id,
            })
    }

    fn question_mut(&mut self, id: DisplayId) -> Result<&mut QuestionNode, FormError> {
        let (s, q) = self.question_index(id)?;
        Ok(&mut self.sections[s].questions[q])
    }

    fn ensure_language(&self, language: &str) -> Result<(), FormError> {
        if self.languages.iter().any(|l| l == language) {
            Ok(())
        } else {
            Err(FormError::UnknownLanguage(language.to_string()))
        }
    }

    fn ensure_review(&self) -> Result<(), FormError> {
        match self.kind() {
            FormKind::Review => Ok(()),
            FormKind::Application => Err(FormError::WrongVariant {
                expected: FormKind::Review,
            }),
        }
    }

    /// Append an "Untitled Section" holding one blank question
    pub fn add_section(&mut self) -> DisplayId {
        let section_identity = NodeIdentity::Local(IdentityAssigner::next(self));
        let order = self.sections.len() as u32 + 1;
        let section = SectionNode::untitled(section_identity, order, &self.languages);
        let section_id = section.display_id;
        self.sections.push(section);

        let question_identity = NodeIdentity::Local(IdentityAssigner::next(self));
        let question = QuestionNode::blank(question_identity, 1, &self.languages);
        if let Some(section) = self.sections.last_mut() {
            section.questions.push(question);
        }
        debug!(%section_identity, order, "added section");
        section_id
    }

    /// Append a blank question to a section
    pub fn add_question(&mut self, section: DisplayId) -> Result<DisplayId, FormError> {
        let s = self.section_index(section)?;
        let identity = NodeIdentity::Local(IdentityAssigner::next(self));
        let languages = self.languages.clone();
        let section = &mut self.sections[s];
        let question = QuestionNode::blank(identity, section.questions.len() as u32 + 1, &languages);
        let id = question.display_id;
        section.questions.push(question);
        Ok(id)
    }

    /// Append an unbound information question (review forms only)
    pub fn add_answer_from_app_form(&mut self, section: DisplayId) -> Result<DisplayId, FormError> {
        self.ensure_review()?;
        let s = self.section_index(section)?;
        let identity = NodeIdentity::Local(IdentityAssigner::next(self));
        let languages = self.languages.clone();
        let section = &mut self.sections[s];
        let question =
            QuestionNode::information(identity, section.questions.len() as u32 + 1, &languages);
        let id = question.display_id;
        section.questions.push(question);
        Ok(id)
    }

    /// Replace one language's value of a text field
    pub fn edit_field(
        &mut self,
        node: DisplayId,
        field: TextField,
        language: &str,
        value: Option<String>,
    ) -> Result<(), FormError> {
        self.ensure_language(language)?;
        let target = match self.locate(node)? {
            NodeLocation::Section(s) => self.sections[s]
                .text_field_mut(field)
                .ok_or(FormError::InvalidField {
                    field,
                    kind: NodeKind::Section,
                })?,
            NodeLocation::Question(s, q) => self.sections[s].questions[q]
                .text_field_mut(field)
                .ok_or(FormError::InvalidField {
                    field,
                    kind: NodeKind::Question,
                })?,
        };
        target.set(language, value);
        Ok(())
    }

    pub fn set_required(&mut self, question: DisplayId, required: bool) -> Result<(), FormError> {
        self.question_mut(question)?.required = required;
        Ok(())
    }

    /// Change a question's type. Options, placeholder and validation survive
    /// so switching back restores them.
    pub fn set_type(&mut self, question: DisplayId, kind: QuestionType) -> Result<(), FormError> {
        self.question_mut(question)?.question_type = Some(kind);
        Ok(())
    }

    /// Scoring weight; review forms only
    pub fn set_weight(&mut self, question: DisplayId, weight: f64) -> Result<(), FormError> {
        self.ensure_review()?;
        self.question_mut(question)?.weight = weight;
        Ok(())
    }

    /// Point an information question at an application-form question
    pub fn bind_app_question(
        &mut self,
        question: DisplayId,
        app_question_id: Option<i64>,
    ) -> Result<(), FormError> {
        self.ensure_review()?;
        self.question_mut(question)?.question_id = app_question_id;
        Ok(())
    }

    /// Set or clear the visibility dependency of a section or question
    pub fn set_dependency(
        &mut self,
        node: DisplayId,
        question_id: Option<i64>,
    ) -> Result<(), FormError> {
        match self.locate(node)? {
            NodeLocation::Section(s) => self.sections[s].depends_on_question_id = question_id,
            NodeLocation::Question(s, q) => {
                self.sections[s].questions[q].depends_on_question_id = question_id
            }
        }
        Ok(())
    }

    pub fn set_show_for_values(
        &mut self,
        node: DisplayId,
        language: &str,
        values: Option<Vec<String>>,
    ) -> Result<(), FormError> {
        self.ensure_language(language)?;
        let target = match self.locate(node)? {
            NodeLocation::Section(s) => &mut self.sections[s].show_for_values,
            NodeLocation::Question(s, q) => &mut self.sections[s].questions[q].show_for_values,
        };
        target.set(language, values);
        Ok(())
    }

    pub fn set_key(&mut self, node: DisplayId, key: Option<String>) -> Result<(), FormError> {
        match self.locate(node)? {
            NodeLocation::Section(s) => self.sections[s].key = key,
            NodeLocation::Question(s, q) => self.sections[s].questions[q].key = key,
        }
        Ok(())
    }

    /// Prepend an option for one language; returns its id
    pub fn add_option(
        &mut self,
        question: DisplayId,
        language: &str,
        value: impl Into<String>,
        label: impl Into<String>,
    ) -> Result<DisplayId, FormError> {
        self.ensure_language(language)?;
        let option = ChoiceOption::new(value, label);
        let id = option.id;
        self.question_mut(question)?
            .options
            .entry_mut(language)
            .get_or_insert_with(Vec::new)
            .insert(0, option);
        Ok(id)
    }

    pub fn delete_option(
        &mut self,
        question: DisplayId,
        language: &str,
        option: DisplayId,
    ) -> Result<(), FormError> {
        self.ensure_language(language)?;
        let options = self
            .question_mut(question)?
            .options
            .entry_mut(language)
            .as_mut()
            .ok_or(FormError::NotFound {
                kind: NodeKind::Option,
                id: option,
            })?;
        let position = options
            .iter()
            .position(|o| o.id == option)
            .ok_or(FormError::NotFound {
                kind: NodeKind::Option,
                id: option,
            })?;
        options.remove(position);
        Ok(())
    }

    /// Move the dragged section to the target's position
    pub fn reorder_sections(&mut self, dragged: DisplayId, target: DisplayId) -> Result<(), FormError> {
        let from = self.section_index(dragged)?;
        let to = self.section_index(target)?;
        if from == to {
            return Ok(());
        }
        move_item(&mut self.sections, from, to);
        self.renumber_sections();
        Ok(())
    }

    /// Move the dragged question to the target's position within one section
    pub fn reorder_questions(
        &mut self,
        section: DisplayId,
        dragged: DisplayId,
        target: DisplayId,
    ) -> Result<(), FormError> {
        let s = self.section_index(section)?;
        let section = &mut self.sections[s];
        let from = section.question_position(dragged).ok_or(FormError::NotFound {
            kind: NodeKind::Question,
            id: dragged,
        })?;
        let to = section.question_position(target).ok_or(FormError::NotFound {
            kind: NodeKind::Question,
            id: target,
        })?;
        if from == to {
            return Ok(());
        }
        move_item(&mut section.questions, from, to);
        section.renumber();
        Ok(())
    }

    pub fn delete_section(&mut self, section: DisplayId) -> Result<SectionNode, FormError> {
        let s = self.section_index(section)?;
        let removed = self.sections.remove(s);
        self.renumber_sections();
        debug!(identity = %removed.identity, "deleted section");
        Ok(removed)
    }

    pub fn delete_question(&mut self, question: DisplayId) -> Result<QuestionNode, FormError> {
        let (s, q) = self.question_index(question)?;
        let section = &mut self.sections[s];
        let removed = section.questions.remove(q);
        section.renumber();
        Ok(removed)
    }

    /// Insert a copy right after the question, with a fresh surrogate
    pub fn duplicate_question(&mut self, question: DisplayId) -> Result<DisplayId, FormError> {
        let (s, q) = self.question_index(question)?;
        let identity = NodeIdentity::Local(IdentityAssigner::next(self));
        let section = &mut self.sections[s];
        let copy = section.questions[q].duplicate(identity);
        let id = copy.display_id;
        section.questions.insert(q + 1, copy);
        section.renumber();
        Ok(id)
    }

    fn renumber_sections(&mut self) {
        for (index, section) in self.sections.iter_mut().enumerate() {
            section.order = index as u32 + 1;
        }
    }
}

/// Remove the item at `from` and reinsert it at `to`
pub(crate) fn move_item<T>(items: &mut Vec<T>, from: usize, to: usize) {
    if from == to || from >= items.len() || to >= items.len() {
        return;
    }
    let item = items.remove(from);
    items.insert(to, item);
}
