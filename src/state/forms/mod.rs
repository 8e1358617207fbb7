//! Form document model
//!
//! A form is a tree of sections and questions whose text is kept per
//! language. Nodes are addressed by [`DisplayId`]; their persisted identity
//! is a [`NodeIdentity`].

mod document;
mod identity;
mod question;
mod section;
mod visibility;

pub use document::{
    FormDocument, FormKind, FormVariant, NodeLocation, ReviewSettings, SEED_SURROGATE_ID,
};
pub use identity::{DisplayId, IdentityAssigner, NodeIdentity};
pub use question::{ChoiceOption, QuestionNode, QuestionType, TextField};
pub use section::{SectionNode, UNTITLED_SECTION};
pub use visibility::{
    check_answer, invalid_answers, is_visible, readiness_issues, AnswerCheck, Conditional,
    ReadinessIssue,
};
