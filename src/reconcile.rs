//! Translation between the authoring model and the backend's JSON shape

use tracing::debug;

use crate::backend::wire::{
    ApplicationFormSubmission, FormSpec, QuestionDetail, QuestionPayload, ReviewFormSubmission,
    SectionDetail, SectionPayload, WireIdentity,
};
use crate::state::{
    DisplayId, FormDocument, FormKind, FormVariant, LocalizedText, NodeIdentity, QuestionNode,
    ReviewSettings, SectionNode,
};

/// Stage assumed when a review form comes back without one
const DEFAULT_STAGE: u32 = 1;

/// Form-level body for a create or update call
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    Application(ApplicationFormSubmission),
    Review(ReviewFormSubmission),
}

fn wire_identity(identity: NodeIdentity) -> WireIdentity {
    match identity {
        NodeIdentity::Backend(id) => WireIdentity::Id(id),
        NodeIdentity::Local(id) => WireIdentity::SurrogateId(id),
    }
}

fn question_payload(question: &QuestionNode, kind: FormKind) -> QuestionPayload {
    let information = question.is_information();
    let unless_information = |value: &LocalizedText| (!information).then(|| value.clone());
    QuestionPayload {
        identity: wire_identity(question.identity),
        question_type: question.question_type,
        headline: question.headline.clone(),
        description: question.description.clone(),
        placeholder: unless_information(&question.placeholder),
        options: (!information).then(|| question.options.clone()),
        validation_regex: unless_information(&question.validation_regex),
        validation_text: unless_information(&question.validation_text),
        is_required: question.required,
        order: question.order,
        depends_on_question_id: question.depends_on_question_id,
        show_for_values: question.show_for_values.clone(),
        weight: (kind == FormKind::Review).then_some(question.weight),
        question_id: if information { question.question_id } else { None },
        key: question.key.clone(),
    }
}

fn section_payload(section: &SectionNode, kind: FormKind) -> SectionPayload {
    SectionPayload {
        identity: wire_identity(section.identity),
        name: section.name.clone(),
        description: section.description.clone(),
        order: section.order,
        depends_on_question_id: section.depends_on_question_id,
        show_for_values: section.show_for_values.clone(),
        key: section.key.clone(),
        questions: section
            .questions
            .iter()
            .map(|q| question_payload(q, kind))
            .collect(),
    }
}

/// Sections as the backend expects them on create and update
pub fn to_backend_shape(document: &FormDocument) -> Vec<SectionPayload> {
    let kind = document.kind();
    document
        .sections
        .iter()
        .map(|s| section_payload(s, kind))
        .collect()
}

/// Complete create/update body for the document
pub fn submission(document: &FormDocument) -> Submission {
    let sections = to_backend_shape(document);
    debug!(
        sections = sections.len(),
        form_id = ?document.backend_id(),
        "built form submission"
    );
    match &document.variant {
        FormVariant::Application {
            nominations_allowed,
        } => Submission::Application(ApplicationFormSubmission {
            id: document.backend_id(),
            event_id: document.event_id,
            is_open: document.is_open,
            nominations: *nominations_allowed,
            sections,
        }),
        FormVariant::Review(settings) => Submission::Review(ReviewFormSubmission {
            id: document.backend_id(),
            event_id: document.event_id,
            is_open: document.is_open,
            application_form_id: settings.application_form_id,
            stage: settings.stage,
            deadline: settings.deadline,
            active: settings.active,
            sections,
        }),
    }
}

fn question_node(detail: QuestionDetail, languages: &[String]) -> QuestionNode {
    let mut question = QuestionNode {
        display_id: DisplayId::new(),
        identity: NodeIdentity::Backend(detail.id),
        question_type: detail.question_type,
        headline: detail.headline,
        description: detail.description,
        placeholder: detail.placeholder,
        options: detail.options,
        validation_regex: detail.validation_regex,
        validation_text: detail.validation_text,
        required: detail.is_required,
        order: detail.order,
        depends_on_question_id: detail.depends_on_question_id,
        show_for_values: detail.show_for_values,
        weight: detail.weight,
        question_id: detail.question_id,
        key: detail.key,
    };
    question.headline.normalize(languages);
    question.description.normalize(languages);
    question.placeholder.normalize(languages);
    question.options.normalize(languages);
    question.validation_regex.normalize(languages);
    question.validation_text.normalize(languages);
    question.show_for_values.normalize(languages);
    question
}

fn section_node(detail: SectionDetail, languages: &[String]) -> SectionNode {
    let mut questions: Vec<QuestionNode> = detail
        .questions
        .into_iter()
        .map(|q| question_node(q, languages))
        .collect();
    questions.sort_by_key(|q| q.order);

    let mut section = SectionNode {
        display_id: DisplayId::new(),
        identity: NodeIdentity::Backend(detail.id),
        name: detail.name,
        description: detail.description,
        order: detail.order,
        depends_on_question_id: detail.depends_on_question_id,
        show_for_values: detail.show_for_values,
        key: detail.key,
        questions,
    };
    section.name.normalize(languages);
    section.description.normalize(languages);
    section.show_for_values.normalize(languages);
    section
}

/// Build an editable document from a form the backend returned
pub fn from_backend_shape(spec: FormSpec, kind: FormKind, languages: &[String]) -> FormDocument {
    let variant = match kind {
        FormKind::Application => FormVariant::Application {
            nominations_allowed: spec.nominations,
        },
        FormKind::Review => FormVariant::Review(ReviewSettings {
            stage: spec.stage.unwrap_or(DEFAULT_STAGE),
            deadline: spec.deadline,
            active: spec.active.unwrap_or(false),
            application_form_id: spec.application_form_id,
        }),
    };

    let mut sections: Vec<SectionNode> = spec
        .sections
        .into_iter()
        .map(|s| section_node(s, languages))
        .collect();
    sections.sort_by_key(|s| s.order);

    debug!(form_id = spec.id, %kind, sections = sections.len(), "loaded form");
    FormDocument {
        identity: Some(NodeIdentity::Backend(spec.id)),
        event_id: spec.event_id,
        languages: languages.to_vec(),
        is_open: spec.is_open,
        variant,
        sections,
    }
}
