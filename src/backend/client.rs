//! HTTP client for the event backend
//!
//! Speaks JSON to the REST API under `{api_url}/api/v1/` and maps response
//! statuses onto [`BackendError`].

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use url::Url;

use super::traits::BackendClientTrait;
use super::wire::{
    ApplicationData, ApplicationFormSubmission, AssignmentRequest, ErrorBody, EventDetails,
    FormSpec, InviteRequest, InvitedGuest, MutationResponse, ReviewFormSubmission, ReviewHistory,
    ReviewStage, ReviewSubmission, ReviewSummary, ReviewerAssignment, TagItem,
};
use crate::error::BackendError;

/// Default backend address
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:5000";

/// Column the review history is ordered by
const HISTORY_SORT_COLUMN: &str = "review_response_id";

/// Field whose validation message is preferred when the backend reports several
const PRIMARY_FIELD: &str = "event_id";

/// Client for the backend REST API
#[derive(Debug, Clone)]
pub struct HttpBackend {
    http: Client,
    /// `{api_url}/api/v1/`, always with a trailing slash so joins append
    base: Url,
}

impl HttpBackend {
    pub fn new(api_url: &str) -> Result<Self, BackendError> {
        Self::with_client(api_url, Client::new())
    }

    pub fn with_client(api_url: &str, http: Client) -> Result<Self, BackendError> {
        let root = Url::parse(&format!("{}/", api_url.trim_end_matches('/')))?;
        Ok(Self {
            http,
            base: root.join("api/v1/")?,
        })
    }

    /// Root of the API, e.g. for building file links
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str, query: &[(&str, String)]) -> Result<Url, BackendError> {
        let mut url = self.base.join(path)?;
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, BackendError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(response.json::<T>().await?)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(classify(status, &body))
        }
    }

    /// Send a mutation that succeeds only with `expected`. Any other status,
    /// including other 2xx codes, is classified from its body.
    async fn submit(
        &self,
        request: RequestBuilder,
        expected: StatusCode,
    ) -> Result<String, BackendError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if status == expected {
            Ok(body)
        } else {
            Err(classify(status, &body))
        }
    }

    /// POST a new form and return the id the backend assigned
    async fn create(&self, path: &str, body: &impl Serialize) -> Result<i64, BackendError> {
        let url = self.endpoint(path, &[])?;
        debug!(%url, "POST");
        let text = self
            .submit(self.http.post(url).json(body), StatusCode::CREATED)
            .await?;
        let created: MutationResponse = serde_json::from_str(&text)
            .map_err(|err| BackendError::Transport(format!("invalid create response: {err}")))?;
        created
            .id
            .ok_or_else(|| BackendError::Transport("create response carried no id".to_string()))
    }

    async fn update(&self, path: &str, body: &impl Serialize) -> Result<(), BackendError> {
        let url = self.endpoint(path, &[])?;
        debug!(%url, "PUT");
        self.submit(self.http.put(url).json(body), StatusCode::OK)
            .await
            .map(|_| ())
    }

    /// Send a request whose response body is not needed
    async fn execute(&self, request: RequestBuilder) -> Result<(), BackendError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(classify(status, &body))
        }
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, BackendError> {
        let url = self.endpoint(path, query)?;
        debug!(%url, "GET");
        self.fetch(self.http.get(url)).await
    }
}

/// Map an unsuccessful status and its body onto the error taxonomy
pub(crate) fn classify(status: StatusCode, body: &str) -> BackendError {
    match status {
        StatusCode::NOT_FOUND => BackendError::NotFound,
        StatusCode::CONFLICT => BackendError::Conflict(body.trim().to_string()),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => validation_error(body)
            .unwrap_or(BackendError::UnexpectedStatus(status.as_u16())),
        // a success code other than the expected one may still carry a message
        other if other.is_success() => validation_error(body)
            .unwrap_or(BackendError::UnexpectedStatus(other.as_u16())),
        other => BackendError::UnexpectedStatus(other.as_u16()),
    }
}

/// `{"message": {"field": "text"}}` or `{"message": "text"}`
fn validation_error(body: &str) -> Option<BackendError> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    match parsed.message? {
        serde_json::Value::String(message) => Some(BackendError::Validation {
            field: "message".to_string(),
            message,
        }),
        serde_json::Value::Object(fields) => {
            let (field, message) = match fields.get(PRIMARY_FIELD) {
                Some(message) => (PRIMARY_FIELD.to_string(), message),
                None => fields.iter().next().map(|(k, v)| (k.clone(), v))?,
            };
            let message = match message {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            Some(BackendError::Validation { field, message })
        }
        _ => None,
    }
}

/// Invitations may report their outcome in a `msg` field with a 200 status
fn invite_outcome(body: &ErrorBody) -> Result<(), BackendError> {
    match body.msg.as_deref() {
        Some("404") => Err(BackendError::NotFound),
        Some("409") => Err(BackendError::Conflict("already invited".to_string())),
        _ => Ok(()),
    }
}

#[async_trait]
impl BackendClientTrait for HttpBackend {
    async fn get_application_form(&self, event_id: i64) -> Result<FormSpec, BackendError> {
        self.get("applicationformdetail", &[("event_id", event_id.to_string())])
            .await
    }

    async fn create_application_form(
        &self,
        submission: ApplicationFormSubmission,
    ) -> Result<i64, BackendError> {
        self.create("applicationformdetail", &submission).await
    }

    async fn update_application_form(
        &self,
        submission: ApplicationFormSubmission,
    ) -> Result<(), BackendError> {
        self.update("applicationformdetail", &submission).await
    }

    async fn get_review_stage(&self, event_id: i64) -> Result<ReviewStage, BackendError> {
        self.get("reviewstage", &[("event_id", event_id.to_string())])
            .await
    }

    async fn get_review_form(&self, event_id: i64, stage: u32) -> Result<FormSpec, BackendError> {
        self.get(
            "reviewformdetail",
            &[("event_id", event_id.to_string()), ("stage", stage.to_string())],
        )
        .await
    }

    async fn create_review_form(
        &self,
        submission: ReviewFormSubmission,
    ) -> Result<i64, BackendError> {
        self.create("reviewformdetail", &submission).await
    }

    async fn update_review_form(
        &self,
        submission: ReviewFormSubmission,
    ) -> Result<(), BackendError> {
        self.update("reviewformdetail", &submission).await
    }

    async fn get_event(&self, event_id: i64) -> Result<EventDetails, BackendError> {
        self.get("event", &[("id", event_id.to_string())]).await
    }

    async fn fetch_response(&self, response_id: i64) -> Result<ApplicationData, BackendError> {
        self.get("response", &[("id", response_id.to_string())])
            .await
    }

    async fn get_invited_guests(&self, event_id: i64) -> Result<Vec<InvitedGuest>, BackendError> {
        self.get("invitedGuest", &[("event_id", event_id.to_string())])
            .await
    }

    async fn add_invited_guest(
        &self,
        email: &str,
        event_id: i64,
        role: &str,
    ) -> Result<(), BackendError> {
        let url = self.endpoint("invitedGuest", &[])?;
        let request = InviteRequest {
            email: email.to_string(),
            event_id,
            role: role.to_string(),
        };
        let body: ErrorBody = self.fetch(self.http.post(url).json(&request)).await?;
        invite_outcome(&body)
    }

    async fn get_review_assignments(
        &self,
        event_id: i64,
    ) -> Result<Vec<ReviewerAssignment>, BackendError> {
        self.get("reviewassignment", &[("event_id", event_id.to_string())])
            .await
    }

    async fn assign_reviews(
        &self,
        event_id: i64,
        reviewer_email: &str,
        num_reviews: u32,
    ) -> Result<(), BackendError> {
        let url = self.endpoint("reviewassignment", &[])?;
        let request = AssignmentRequest {
            event_id,
            reviewer_user_email: reviewer_email.to_string(),
            num_reviews,
        };
        self.execute(self.http.post(url).json(&request)).await
    }

    async fn get_review_summary(&self, event_id: i64) -> Result<ReviewSummary, BackendError> {
        self.get(
            "reviewassignment/summary",
            &[("event_id", event_id.to_string())],
        )
        .await
    }

    async fn get_review_history(
        &self,
        event_id: i64,
        page: u32,
        limit: u32,
    ) -> Result<ReviewHistory, BackendError> {
        self.get(
            "reviewhistory",
            &[
                ("event_id", event_id.to_string()),
                ("page_number", page.to_string()),
                ("limit", limit.to_string()),
                ("sort_column", HISTORY_SORT_COLUMN.to_string()),
            ],
        )
        .await
    }

    async fn submit_review(&self, submission: ReviewSubmission) -> Result<(), BackendError> {
        let url = self.endpoint("reviewresponse", &[])?;
        debug!(%url, response_id = submission.response_id, "POST");
        self.submit(self.http.post(url).json(&submission), StatusCode::CREATED)
            .await
            .map(|_| ())
    }

    async fn get_tag_list(&self, event_id: i64) -> Result<Vec<TagItem>, BackendError> {
        self.get("tags", &[("event_id", event_id.to_string())])
            .await
    }
}
