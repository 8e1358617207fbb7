//! Trait abstraction for the backend client to enable mocking in tests

use async_trait::async_trait;

use super::wire::{
    ApplicationData, ApplicationFormSubmission, EventDetails, FormSpec, InvitedGuest,
    ReviewFormSubmission, ReviewHistory, ReviewStage, ReviewSubmission, ReviewSummary,
    ReviewerAssignment, TagItem,
};
use crate::error::BackendError;

/// Backend operations the form model depends on
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BackendClientTrait: Send + Sync {
    /// Application form of an event; `NotFound` when none exists yet
    async fn get_application_form(&self, event_id: i64) -> Result<FormSpec, BackendError>;

    /// Create an application form, returning its id
    async fn create_application_form(
        &self,
        submission: ApplicationFormSubmission,
    ) -> Result<i64, BackendError>;

    async fn update_application_form(
        &self,
        submission: ApplicationFormSubmission,
    ) -> Result<(), BackendError>;

    async fn get_review_stage(&self, event_id: i64) -> Result<ReviewStage, BackendError>;

    /// Review form of one stage; `NotFound` when none exists yet
    async fn get_review_form(&self, event_id: i64, stage: u32) -> Result<FormSpec, BackendError>;

    /// Create a review form, returning its id
    async fn create_review_form(
        &self,
        submission: ReviewFormSubmission,
    ) -> Result<i64, BackendError>;

    async fn update_review_form(
        &self,
        submission: ReviewFormSubmission,
    ) -> Result<(), BackendError>;

    async fn get_event(&self, event_id: i64) -> Result<EventDetails, BackendError>;

    /// One applicant's response
    async fn fetch_response(&self, response_id: i64) -> Result<ApplicationData, BackendError>;

    async fn get_invited_guests(&self, event_id: i64) -> Result<Vec<InvitedGuest>, BackendError>;

    /// `NotFound` when no user has the email, `Conflict` when already invited
    async fn add_invited_guest(
        &self,
        email: &str,
        event_id: i64,
        role: &str,
    ) -> Result<(), BackendError>;

    async fn get_review_assignments(
        &self,
        event_id: i64,
    ) -> Result<Vec<ReviewerAssignment>, BackendError>;

    /// Give a reviewer `num_reviews` more responses; `NotFound` when no user
    /// has the email
    async fn assign_reviews(
        &self,
        event_id: i64,
        reviewer_email: &str,
        num_reviews: u32,
    ) -> Result<(), BackendError>;

    async fn get_review_summary(&self, event_id: i64) -> Result<ReviewSummary, BackendError>;

    /// One page of the signed-in reviewer's past reviews
    async fn get_review_history(
        &self,
        event_id: i64,
        page: u32,
        limit: u32,
    ) -> Result<ReviewHistory, BackendError>;

    /// Save or submit a reviewer's scores for one response
    async fn submit_review(&self, submission: ReviewSubmission) -> Result<(), BackendError>;

    async fn get_tag_list(&self, event_id: i64) -> Result<Vec<TagItem>, BackendError>;
}
