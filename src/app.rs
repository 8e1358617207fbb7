//! Session object: loads forms into editors, saves them and runs the
//! response and guest pages against the backend

use regex::Regex;
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::backend::wire::{
    EventDetails, FormSpec, InvitedGuest, ReviewHistory, ReviewScore, ReviewSubmission,
    ReviewerAssignment, TagItem,
};
use crate::backend::BackendClientTrait;
use crate::config::AppConfig;
use crate::error::BackendError;
use crate::reconcile::{from_backend_shape, submission, Submission};
use crate::render::{render_response, AnswerRenderer, ResponseView};
use crate::state::{
    invalid_answers, AnswerCheck, AnswerValue, DisplayId, FetchTicket, FormDocument, FormEditor,
    FormKind, LoadState, NodeIdentity, ReadinessIssue, ReviewSettings, SaveState, StageTracker,
};

const EMAIL_PATTERN: &str = r"^[^@\s]+@[^@\s]+\.[^@\s]+$";

/// Stage whose review form starts out inactive when created
const FIRST_STAGE: u32 = 1;

/// Result of a save request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Nothing changed since the last save; no call was made
    AlreadySaved,
    /// A save is already running; no call was made
    InFlight,
    NotReady(Vec<ReadinessIssue>),
    Created(i64),
    Updated,
    Failed(String),
}

/// Result of inviting a guest
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InviteOutcome {
    Added,
    UserNotFound,
    AlreadyInvited,
    /// Rejected before any call was made
    Invalid(String),
    Failed(String),
}

/// Result of handing responses to a reviewer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignmentOutcome {
    Assigned,
    ReviewerNotFound,
    /// Rejected before any call was made
    Invalid(String),
    Failed(String),
}

/// Result of saving or submitting a reviewer's scores
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewOutcome {
    /// Stored as a draft
    Saved,
    Submitted,
    /// Submission refused; nothing was sent
    Incomplete(Vec<(DisplayId, AnswerCheck)>),
    Failed(String),
}

/// Reviewers of an event and the responses nobody has been given yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewerOverview {
    pub reviewers: Vec<ReviewerAssignment>,
    pub unallocated: u32,
}

fn is_valid_email(email: &str) -> bool {
    Regex::new(EMAIL_PATTERN)
        .map(|re| re.is_match(email))
        .unwrap_or(false)
}

/// State of the review form page for one event
#[derive(Debug)]
pub struct ReviewSession {
    pub event_id: i64,
    pub tracker: StageTracker,
    pub editor: Option<FormEditor>,
    pub event: Option<EventDetails>,
    /// Application form whose questions information questions can echo
    pub application_form: Option<FormDocument>,
}

impl ReviewSession {
    fn new(event_id: i64) -> Self {
        Self {
            event_id,
            tracker: StageTracker::new(),
            editor: None,
            event: None,
            application_form: None,
        }
    }

    /// Application questions as (id, headline) for binding information
    /// questions
    pub fn application_questions(&self, language: &str) -> Vec<(i64, String)> {
        self.application_form
            .iter()
            .flat_map(|form| form.questions())
            .filter_map(|q| {
                q.identity
                    .backend_id()
                    .map(|id| (id, q.headline.text(language).to_string()))
            })
            .collect()
    }
}

/// Main application struct
pub struct App<B: BackendClientTrait> {
    backend: B,
    config: AppConfig,
    renderer: AnswerRenderer,
}

impl<B: BackendClientTrait> App<B> {
    pub fn new(backend: B, config: AppConfig) -> Result<Self, BackendError> {
        let renderer = AnswerRenderer::new(&config.api_url(), config.no_answer_text())?;
        Ok(Self {
            backend,
            config,
            renderer,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn renderer(&self) -> &AnswerRenderer {
        &self.renderer
    }

    fn languages(&self) -> Vec<String> {
        self.config.language_codes()
    }

    /// Load the event's application form, or a seeded one in create mode
    /// when none exists yet
    pub async fn load_application_form(&self, event_id: i64) -> LoadState<FormEditor> {
        let (form, event) = tokio::join!(
            self.backend.get_application_form(event_id),
            self.backend.get_event(event_id)
        );
        match form {
            Ok(spec) => LoadState::Ready(FormEditor::loaded(from_backend_shape(
                spec,
                FormKind::Application,
                &self.languages(),
            ))),
            Err(BackendError::NotFound) => {
                debug!(event_id, "no application form yet, entering create mode");
                let mut document = FormDocument::new_application(event_id, self.languages());
                if let Ok(event) = event {
                    document.is_open = event.is_application_open;
                }
                LoadState::Ready(FormEditor::new(document))
            }
            Err(err) => {
                warn!(event_id, error = %err, "failed to load application form");
                LoadState::Error(err.user_message())
            }
        }
    }

    /// Read the current review stage and load its form
    pub async fn open_review_session(&self, event_id: i64) -> ReviewSession {
        let mut session = ReviewSession::new(event_id);
        let (stage, event, app_form) = tokio::join!(
            self.backend.get_review_stage(event_id),
            self.backend.get_event(event_id),
            self.backend.get_application_form(event_id)
        );

        session.event = event.ok();
        session.application_form = app_form
            .ok()
            .map(|spec| from_backend_shape(spec, FormKind::Application, &self.languages()));

        match stage {
            Ok(stage) => {
                if let Some(total) = stage.total_stages {
                    session.tracker.set_total_stages(total);
                }
                self.select_stage(&mut session, stage.current_stage).await;
            }
            Err(err) => {
                warn!(event_id, error = %err, "failed to read review stage");
                session.tracker.fail_unstaged(err.user_message());
            }
        }
        session
    }

    /// Switch the session to a stage and load its form
    pub async fn select_stage(&self, session: &mut ReviewSession, stage: u32) -> bool {
        let ticket = session.tracker.select(stage);
        let result = self.fetch_review_form(session.event_id, ticket).await;
        self.apply_review_form(session, ticket, result)
    }

    pub async fn fetch_review_form(
        &self,
        event_id: i64,
        ticket: FetchTicket,
    ) -> Result<FormSpec, BackendError> {
        self.backend.get_review_form(event_id, ticket.stage).await
    }

    /// Apply a finished fetch. Completions for superseded tickets are
    /// dropped and false is returned.
    pub fn apply_review_form(
        &self,
        session: &mut ReviewSession,
        ticket: FetchTicket,
        result: Result<FormSpec, BackendError>,
    ) -> bool {
        if !session.tracker.is_current(ticket) {
            warn!(stage = ticket.stage, "discarding review form for a superseded stage");
            return false;
        }
        match result {
            Ok(spec) => {
                let document = from_backend_shape(spec, FormKind::Review, &self.languages());
                session.editor = Some(FormEditor::loaded(document));
                session.tracker.complete(ticket)
            }
            Err(BackendError::NotFound) => {
                debug!(stage = ticket.stage, "no review form yet, entering create mode");
                let event = session.event.as_ref();
                let settings = ReviewSettings {
                    stage: ticket.stage,
                    deadline: event.and_then(|e| e.review_close),
                    active: ticket.stage != FIRST_STAGE,
                    application_form_id: session
                        .application_form
                        .as_ref()
                        .and_then(FormDocument::backend_id),
                };
                let mut document =
                    FormDocument::new_review(session.event_id, self.languages(), settings);
                if let Some(event) = event {
                    document.is_open = event.is_review_open;
                }
                session.editor = Some(FormEditor::new(document));
                session.tracker.complete(ticket)
            }
            Err(err) => {
                warn!(stage = ticket.stage, error = %err, "failed to load review form");
                session.tracker.fail(ticket, err.user_message())
            }
        }
    }

    /// Persist the editor's document, creating the form when it has no
    /// backend identity yet
    pub async fn save(&self, editor: &mut FormEditor) -> SaveOutcome {
        match editor.save_state() {
            SaveState::Saved => return SaveOutcome::AlreadySaved,
            SaveState::Saving => return SaveOutcome::InFlight,
            SaveState::Unsaved => {}
        }
        let issues = editor.readiness_issues();
        if !issues.is_empty() {
            return SaveOutcome::NotReady(issues);
        }

        editor.begin_save();
        let result = match submission(editor.document()) {
            Submission::Application(body) if body.id.is_some() => self
                .backend
                .update_application_form(body)
                .await
                .map(|()| None),
            Submission::Application(body) => {
                self.backend.create_application_form(body).await.map(Some)
            }
            Submission::Review(body) if body.id.is_some() => {
                self.backend.update_review_form(body).await.map(|()| None)
            }
            Submission::Review(body) => self.backend.create_review_form(body).await.map(Some),
        };

        match result {
            Ok(Some(id)) => {
                info!(form_id = id, "form created");
                editor.finish_save(Some(NodeIdentity::Backend(id)));
                SaveOutcome::Created(id)
            }
            Ok(None) => {
                info!(form_id = ?editor.document().backend_id(), "form updated");
                editor.finish_save(None);
                SaveOutcome::Updated
            }
            Err(err) => {
                let message = err.user_message();
                editor.fail_save(message.clone());
                SaveOutcome::Failed(message)
            }
        }
    }

    /// Fetch a response and render it against the event's application form
    pub async fn load_response(&self, event_id: i64, response_id: i64) -> LoadState<ResponseView> {
        let (form, data) = tokio::join!(
            self.backend.get_application_form(event_id),
            self.backend.fetch_response(response_id)
        );
        match (form, data) {
            (Ok(spec), Ok(data)) => {
                let form = from_backend_shape(spec, FormKind::Application, &self.languages());
                LoadState::Ready(render_response(
                    &self.renderer,
                    &form,
                    &data,
                    &self.config.display_language(),
                ))
            }
            (Err(err), _) | (_, Err(err)) => {
                warn!(response_id, error = %err, "failed to load response");
                LoadState::Error(err.user_message())
            }
        }
    }

    pub async fn guest_list(&self, event_id: i64) -> LoadState<Vec<InvitedGuest>> {
        self.backend.get_invited_guests(event_id).await.into()
    }

    /// Invite a registered user. Email and role are checked before any call.
    pub async fn invite_guest(&self, event_id: i64, email: &str, role: &str) -> InviteOutcome {
        let email = email.trim();
        if !is_valid_email(email) {
            return InviteOutcome::Invalid(format!("`{email}` is not a valid email address"));
        }
        let role = role.trim();
        if role.is_empty() {
            return InviteOutcome::Invalid("a role is required".to_string());
        }

        match self.backend.add_invited_guest(email, event_id, role).await {
            Ok(()) => {
                info!(event_id, role, "guest invited");
                InviteOutcome::Added
            }
            Err(BackendError::NotFound) => InviteOutcome::UserNotFound,
            Err(BackendError::Conflict(_)) => InviteOutcome::AlreadyInvited,
            Err(err) => InviteOutcome::Failed(err.user_message()),
        }
    }

    /// Reviewers with their allocated and completed counts, plus the number
    /// of responses still unallocated
    pub async fn reviewer_overview(&self, event_id: i64) -> LoadState<ReviewerOverview> {
        let (reviewers, summary) = tokio::join!(
            self.backend.get_review_assignments(event_id),
            self.backend.get_review_summary(event_id)
        );
        match (reviewers, summary) {
            (Ok(reviewers), Ok(summary)) => LoadState::Ready(ReviewerOverview {
                reviewers,
                unallocated: summary.reviews_unallocated,
            }),
            (Err(err), _) | (_, Err(err)) => {
                warn!(event_id, error = %err, "failed to load reviewer assignments");
                LoadState::Error(err.user_message())
            }
        }
    }

    /// Give a reviewer more responses to review
    pub async fn assign_reviewer(
        &self,
        event_id: i64,
        email: &str,
        num_reviews: u32,
    ) -> AssignmentOutcome {
        let email = email.trim();
        if !is_valid_email(email) {
            return AssignmentOutcome::Invalid(format!("`{email}` is not a valid email address"));
        }
        if num_reviews == 0 {
            return AssignmentOutcome::Invalid("at least one review must be assigned".to_string());
        }

        match self.backend.assign_reviews(event_id, email, num_reviews).await {
            Ok(()) => {
                info!(event_id, num_reviews, "reviews assigned");
                AssignmentOutcome::Assigned
            }
            Err(BackendError::NotFound) => AssignmentOutcome::ReviewerNotFound,
            Err(err) => AssignmentOutcome::Failed(err.user_message()),
        }
    }

    /// Assign several reviewers in turn; one failure does not stop the rest
    pub async fn assign_reviewers(
        &self,
        event_id: i64,
        assignments: &[(String, u32)],
    ) -> Vec<(String, AssignmentOutcome)> {
        let mut outcomes = Vec::with_capacity(assignments.len());
        for (email, count) in assignments {
            let outcome = self.assign_reviewer(event_id, email, *count).await;
            outcomes.push((email.clone(), outcome));
        }
        outcomes
    }

    pub async fn review_history(
        &self,
        event_id: i64,
        page: u32,
        limit: u32,
    ) -> LoadState<ReviewHistory> {
        self.backend
            .get_review_history(event_id, page, limit)
            .await
            .into()
    }

    /// Save a reviewer's scores, or submit them once every visible review
    /// question passes its checks. `answers` is keyed by question id.
    pub async fn submit_review(
        &self,
        form: &FormDocument,
        response_id: i64,
        answers: &HashMap<i64, AnswerValue>,
        submit: bool,
    ) -> ReviewOutcome {
        let Some(review_form_id) = form.backend_id().filter(|_| form.kind() == FormKind::Review)
        else {
            return ReviewOutcome::Failed("review form has not been saved".to_string());
        };
        let language = self.config.display_language();
        if submit {
            let problems = invalid_answers(form, answers, &language);
            if !problems.is_empty() {
                return ReviewOutcome::Incomplete(problems);
            }
        }

        let scores = form
            .questions()
            .filter(|q| !q.is_information())
            .filter_map(|q| {
                let id = q.identity().backend_id()?;
                let value = answers.get(&id).filter(|v| !v.is_empty())?;
                Some(ReviewScore {
                    review_question_id: id,
                    value: value.clone(),
                })
            })
            .collect();
        let submission = ReviewSubmission {
            response_id,
            review_form_id,
            scores,
            language,
            is_submitted: submit,
        };

        match self.backend.submit_review(submission).await {
            Ok(()) if submit => {
                info!(response_id, "review submitted");
                ReviewOutcome::Submitted
            }
            Ok(()) => ReviewOutcome::Saved,
            Err(err) => {
                warn!(response_id, error = %err, "failed to store review");
                ReviewOutcome::Failed(err.user_message())
            }
        }
    }

    pub async fn tag_list(&self, event_id: i64) -> LoadState<Vec<TagItem>> {
        self.backend.get_tag_list(event_id).await.into()
    }
}
