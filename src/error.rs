//! Error types for document operations and backend calls

use std::fmt;
use thiserror::Error;

use crate::state::{DisplayId, FormKind, TextField};

/// What kind of node an operation tried to address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Section,
    Question,
    Option,
    Node,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Section => "section",
            Self::Question => "question",
            Self::Option => "option",
            Self::Node => "node",
        })
    }
}

/// Failures of document mutations. None of them change the document.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormError {
    #[error("no {kind} with display id {id}")]
    NotFound { kind: NodeKind, id: DisplayId },

    #[error("field `{field}` does not exist on a {kind}")]
    InvalidField { field: TextField, kind: NodeKind },

    #[error("language `{0}` is not configured for this form")]
    UnknownLanguage(String),

    #[error("operation is only available on {expected} forms")]
    WrongVariant { expected: FormKind },
}

/// Failures reported by the backend collaborator
#[derive(Debug, Error)]
pub enum BackendError {
    /// Nothing exists yet; callers switch to create mode
    #[error("not found")]
    NotFound,

    /// Structured rejection keyed by field, shown to the user verbatim
    #[error("{field}: {message}")]
    Validation { field: String, message: String },

    /// Already exists (e.g. a guest that was invited before)
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("unexpected status {0}")]
    UnexpectedStatus(u16),

    #[error("transport error: {0}")]
    Transport(String),
}

impl BackendError {
    /// Message for the user: the bare validation text when the backend sent
    /// one, otherwise the full error
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) if status == reqwest::StatusCode::NOT_FOUND => Self::NotFound,
            Some(status) => Self::UnexpectedStatus(status.as_u16()),
            None => Self::Transport(err.to_string()),
        }
    }
}

impl From<url::ParseError> for BackendError {
    fn from(err: url::ParseError) -> Self {
        Self::Transport(format!("invalid URL: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_user_message_is_verbatim() {
        let err = BackendError::Validation {
            field: "event_id".to_string(),
            message: "A review form already exists for this stage".to_string(),
        };
        assert_eq!(
            err.user_message(),
            "A review form already exists for this stage"
        );
        assert_eq!(
            err.to_string(),
            "event_id: A review form already exists for this stage"
        );
    }

    #[test]
    fn test_transport_user_message_is_full_error() {
        let err = BackendError::Transport("connection refused".to_string());
        assert_eq!(err.user_message(), "transport error: connection refused");
    }

    #[test]
    fn test_form_error_messages() {
        let err = FormError::InvalidField {
            field: TextField::Placeholder,
            kind: NodeKind::Section,
        };
        assert_eq!(err.to_string(), "field `placeholder` does not exist on a section");

        let err = FormError::WrongVariant {
            expected: FormKind::Review,
        };
        assert_eq!(err.to_string(), "operation is only available on review forms");
    }

    #[test]
    fn test_url_error_becomes_transport() {
        let err: BackendError = url::Url::parse("not a url").unwrap_err().into();
        assert!(matches!(err, BackendError::Transport(_)));
    }
}
