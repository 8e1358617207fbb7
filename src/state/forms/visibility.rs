//! Conditional visibility, answer validation and save readiness

use regex::Regex;
use std::collections::HashMap;
use std::fmt;

use super::document::FormDocument;
use super::identity::DisplayId;
use super::question::QuestionNode;
use super::section::SectionNode;
use crate::state::{AnswerValue, LocalizedValueSet};

/// Message used when a pattern mismatch has no validation text
pub const DEFAULT_MISMATCH_MESSAGE: &str = "Answer does not match the expected format";

/// A node that may be shown only for certain answers of another question
pub trait Conditional {
    fn depends_on(&self) -> Option<i64>;
    fn show_for(&self) -> &LocalizedValueSet;
}

impl Conditional for SectionNode {
    fn depends_on(&self) -> Option<i64> {
        self.depends_on_question_id
    }

    fn show_for(&self) -> &LocalizedValueSet {
        &self.show_for_values
    }
}

impl Conditional for QuestionNode {
    fn depends_on(&self) -> Option<i64> {
        self.depends_on_question_id
    }

    fn show_for(&self) -> &LocalizedValueSet {
        &self.show_for_values
    }
}

/// Whether a node is shown given the answers recorded so far, keyed by
/// question id.
///
/// A list-valued answer satisfies the rule when any of its entries does.
pub fn is_visible(
    node: &impl Conditional,
    answers: &HashMap<i64, AnswerValue>,
    language: &str,
) -> bool {
    let Some(question_id) = node.depends_on() else {
        return true;
    };
    let Some(allowed) = node.show_for().get(language).and_then(|v| v.as_ref()) else {
        return false;
    };
    answers
        .get(&question_id)
        .map(|answer| answer.scalars().iter().any(|v| allowed.contains(v)))
        .unwrap_or(false)
}

/// Result of checking one answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerCheck {
    Valid,
    MissingRequired,
    Mismatch(String),
}

impl AnswerCheck {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// Check an answer against the question's required flag and the language's
/// validation pattern. The pattern must match the whole answer.
pub fn check_answer(question: &QuestionNode, answer: &AnswerValue, language: &str) -> AnswerCheck {
    if question.is_information() {
        return AnswerCheck::Valid;
    }
    if answer.is_empty() {
        return if question.required {
            AnswerCheck::MissingRequired
        } else {
            AnswerCheck::Valid
        };
    }

    let pattern = question.validation_regex.text(language).trim();
    if pattern.is_empty() {
        return AnswerCheck::Valid;
    }
    // Unparseable patterns are reported by readiness_issues, not here
    let Ok(regex) = Regex::new(&format!("^(?:{pattern})$")) else {
        return AnswerCheck::Valid;
    };

    if answer.scalars().iter().all(|value| regex.is_match(value)) {
        AnswerCheck::Valid
    } else {
        let message = question.validation_text.text(language).trim();
        AnswerCheck::Mismatch(if message.is_empty() {
            DEFAULT_MISMATCH_MESSAGE.to_string()
        } else {
            message.to_string()
        })
    }
}

/// Every visible question whose answer fails [`check_answer`]
pub fn invalid_answers(
    document: &FormDocument,
    answers: &HashMap<i64, AnswerValue>,
    language: &str,
) -> Vec<(DisplayId, AnswerCheck)> {
    let empty = AnswerValue::Null;
    document
        .sections
        .iter()
        .filter(|section| is_visible(*section, answers, language))
        .flat_map(|section| section.questions.iter())
        .filter(|question| is_visible(*question, answers, language))
        .filter_map(|question| {
            let answer = answers.get(&question.identity.raw()).unwrap_or(&empty);
            match check_answer(question, answer, language) {
                AnswerCheck::Valid => None,
                failed => Some((question.display_id, failed)),
            }
        })
        .collect()
}

/// Something that keeps a document from being saved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadinessIssue {
    UntypedQuestion {
        section: u32,
        question: u32,
        id: DisplayId,
    },
    UnnamedSection {
        section: u32,
        id: DisplayId,
    },
    InvalidRegex {
        id: DisplayId,
        language: String,
        error: String,
    },
    /// The referenced question is not in the document
    DanglingDependency {
        id: DisplayId,
        target: i64,
    },
    /// The referenced question comes later in the same section, or is the
    /// node itself or one of its own questions
    ForwardDependency {
        id: DisplayId,
        target: i64,
    },
}

impl fmt::Display for ReadinessIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UntypedQuestion { section, question, .. } => {
                write!(f, "question {question} of section {section} has no type")
            }
            Self::UnnamedSection { section, .. } => write!(f, "section {section} has no name"),
            Self::InvalidRegex {
                language, error, ..
            } => write!(f, "validation pattern ({language}) does not compile: {error}"),
            Self::DanglingDependency { target, .. } => {
                write!(f, "depends on question {target}, which does not exist")
            }
            Self::ForwardDependency { target, .. } => {
                write!(f, "depends on question {target}, which is not shown before it")
            }
        }
    }
}

/// Everything that must be fixed before the document can be saved.
/// An empty list means the document is ready.
pub fn readiness_issues(document: &FormDocument) -> Vec<ReadinessIssue> {
    let mut issues = Vec::new();

    for (s, section) in document.sections.iter().enumerate() {
        if section.name.is_blank() {
            issues.push(ReadinessIssue::UnnamedSection {
                section: section.order,
                id: section.display_id,
            });
        }
        if let Some(target) = section.depends_on_question_id {
            match document.question_by_raw_id(target) {
                None => issues.push(ReadinessIssue::DanglingDependency {
                    id: section.display_id,
                    target,
                }),
                Some((ts, _, _)) if ts == s => issues.push(ReadinessIssue::ForwardDependency {
                    id: section.display_id,
                    target,
                }),
                Some(_) => {}
            }
        }

        for (q, question) in section.questions.iter().enumerate() {
            if question.question_type.is_none() {
                issues.push(ReadinessIssue::UntypedQuestion {
                    section: section.order,
                    question: question.order,
                    id: question.display_id,
                });
            }
            for (language, pattern) in question.validation_regex.iter() {
                let Some(pattern) = pattern.as_deref().filter(|p| !p.trim().is_empty()) else {
                    continue;
                };
                if let Err(err) = Regex::new(pattern) {
                    issues.push(ReadinessIssue::InvalidRegex {
                        id: question.display_id,
                        language: language.to_string(),
                        error: err.to_string(),
                    });
                }
            }
            if let Some(target) = question.depends_on_question_id {
                match document.question_by_raw_id(target) {
                    None => issues.push(ReadinessIssue::DanglingDependency {
                        id: question.display_id,
                        target,
                    }),
                    Some((ts, tq, _)) if ts == s && tq >= q => {
                        issues.push(ReadinessIssue::ForwardDependency {
                            id: question.display_id,
                            target,
                        })
                    }
                    Some(_) => {}
                }
            }
        }
    }

    issues
}
