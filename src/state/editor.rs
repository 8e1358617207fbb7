//! Editing session for one form document

use tracing::warn;

use super::forms::{readiness_issues, FormDocument, NodeIdentity, ReadinessIssue};
use crate::error::FormError;

/// Where the document stands relative to the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SaveState {
    #[default]
    Unsaved,
    Saving,
    Saved,
}

impl SaveState {
    /// Label for the save action
    pub fn label(&self) -> &'static str {
        match self {
            Self::Unsaved => "Save",
            Self::Saving => "Saving...",
            Self::Saved => "Saved",
        }
    }
}

/// Owns a document together with its save state and the last error shown
/// to the user
#[derive(Debug, Clone)]
pub struct FormEditor {
    document: FormDocument,
    save_state: SaveState,
    error: Option<String>,
    navigate_away: bool,
}

impl FormEditor {
    /// Editor for a document that does not exist on the backend yet
    pub fn new(document: FormDocument) -> Self {
        Self {
            document,
            save_state: SaveState::Unsaved,
            error: None,
            navigate_away: false,
        }
    }

    /// Editor for a document as the backend returned it
    pub fn loaded(document: FormDocument) -> Self {
        Self {
            save_state: SaveState::Saved,
            ..Self::new(document)
        }
    }

    pub fn document(&self) -> &FormDocument {
        &self.document
    }

    pub fn save_state(&self) -> SaveState {
        self.save_state
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Raised after a successful save; the caller leaves the editor
    pub fn should_navigate_away(&self) -> bool {
        self.navigate_away
    }

    pub fn is_new(&self) -> bool {
        self.document.identity.is_none()
    }

    /// Apply a document operation. A successful edit marks the document
    /// unsaved; a failed one leaves everything as it was.
    pub fn edit<R>(
        &mut self,
        op: impl FnOnce(&mut FormDocument) -> Result<R, FormError>,
    ) -> Result<R, FormError> {
        let result = op(&mut self.document)?;
        self.save_state = SaveState::Unsaved;
        self.navigate_away = false;
        Ok(result)
    }

    pub fn readiness_issues(&self) -> Vec<ReadinessIssue> {
        readiness_issues(&self.document)
    }

    /// Whether the save action is enabled
    pub fn can_save(&self) -> bool {
        self.save_state == SaveState::Unsaved && self.readiness_issues().is_empty()
    }

    pub(crate) fn begin_save(&mut self) {
        self.save_state = SaveState::Saving;
        self.error = None;
    }

    /// Record a successful save. `created` is the form identity the backend
    /// assigned when the form did not exist yet.
    pub(crate) fn finish_save(&mut self, created: Option<NodeIdentity>) {
        if let Some(identity) = created {
            self.document.identity = Some(identity);
        }
        self.save_state = SaveState::Saved;
        self.navigate_away = true;
    }

    pub(crate) fn fail_save(&mut self, message: String) {
        warn!(%message, "save failed");
        self.save_state = SaveState::Unsaved;
        self.error = Some(message);
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::QuestionType;
    use pretty_assertions::assert_eq;

    fn editor() -> FormEditor {
        FormEditor::new(FormDocument::new_application(5, vec!["en".to_string()]))
    }

    #[test]
    fn test_new_editor_is_unsaved() {
        let editor = editor();
        assert_eq!(editor.save_state(), SaveState::Unsaved);
        assert!(editor.is_new());
        assert!(!editor.should_navigate_away());
    }

    #[test]
    fn test_loaded_editor_is_saved() {
        let mut doc = FormDocument::new_application(5, vec!["en".to_string()]);
        doc.identity = Some(NodeIdentity::Backend(3));
        let editor = FormEditor::loaded(doc);
        assert_eq!(editor.save_state(), SaveState::Saved);
        assert!(!editor.is_new());
    }

    #[test]
    fn test_edit_marks_unsaved() {
        let mut editor = FormEditor::loaded(FormDocument::new_application(5, vec!["en".to_string()]));
        editor.edit(|doc| Ok(doc.add_section())).unwrap();
        assert_eq!(editor.save_state(), SaveState::Unsaved);
        assert_eq!(editor.document().sections.len(), 2);
    }

    #[test]
    fn test_failed_edit_keeps_state() {
        let mut editor = FormEditor::loaded(FormDocument::new_application(5, vec!["en".to_string()]));
        let missing = crate::state::DisplayId::new();
        assert!(editor.edit(|doc| doc.add_question(missing)).is_err());
        assert_eq!(editor.save_state(), SaveState::Saved);
    }

    #[test]
    fn test_can_save_requires_ready_document() {
        let mut editor = editor();
        assert!(!editor.can_save());

        let question = editor.document().sections[0].questions[0].display_id;
        editor
            .edit(|doc| doc.set_type(question, QuestionType::LongText))
            .unwrap();
        assert!(editor.can_save());
    }

    #[test]
    fn test_save_cycle() {
        let mut editor = editor();
        editor.begin_save();
        assert_eq!(editor.save_state(), SaveState::Saving);
        assert_eq!(editor.save_state().label(), "Saving...");

        editor.finish_save(Some(NodeIdentity::Backend(12)));
        assert_eq!(editor.save_state(), SaveState::Saved);
        assert_eq!(editor.document().backend_id(), Some(12));
        assert!(editor.should_navigate_away());
    }

    #[test]
    fn test_failed_save_surfaces_error() {
        let mut editor = editor();
        editor.begin_save();
        editor.fail_save("event_id already has a form".to_string());
        assert_eq!(editor.save_state(), SaveState::Unsaved);
        assert_eq!(editor.error(), Some("event_id already has a form"));

        editor.begin_save();
        assert_eq!(editor.error(), None);
    }
}
