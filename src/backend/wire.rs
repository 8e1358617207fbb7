//! JSON shapes exchanged with the backend

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::state::{
    AnswerValue, ChoiceOption, LocalizedOptions, LocalizedText, LocalizedValueSet, QuestionType,
};

/// Treat an explicit `null` like a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// The backend writes `0` for "no dependency"
fn zero_as_none<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<i64>::deserialize(deserializer)?.filter(|id| *id != 0))
}

/// Timestamps as the backend writes them: RFC 3339, or a naive ISO 8601
/// date-time taken as UTC
pub mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

    pub fn parse(s: &str) -> Option<DateTime<Utc>> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.with_timezone(&Utc));
        }
        NAIVE_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
            .map(|naive| naive.and_utc())
    }

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(dt) => serializer.serialize_str(&dt.to_rfc3339()),
            None => serializer.serialize_none(),
        }
    }

    /// Unparseable values read as absent
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<String>::deserialize(deserializer)?
            .as_deref()
            .and_then(parse))
    }
}

/// A form as the backend returns it, application or review
#[derive(Debug, Clone, Deserialize)]
pub struct FormSpec {
    pub id: i64,
    pub event_id: i64,
    #[serde(default)]
    pub is_open: bool,
    #[serde(default)]
    pub nominations: bool,
    #[serde(default)]
    pub application_form_id: Option<i64>,
    #[serde(default)]
    pub stage: Option<u32>,
    #[serde(default, with = "timestamp")]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sections: Vec<SectionDetail>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SectionDetail {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: LocalizedText,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: LocalizedText,
    #[serde(default)]
    pub order: u32,
    #[serde(default, deserialize_with = "zero_as_none")]
    pub depends_on_question_id: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub show_for_values: LocalizedValueSet,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub questions: Vec<QuestionDetail>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuestionDetail {
    pub id: i64,
    #[serde(rename = "type", default)]
    pub question_type: Option<QuestionType>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub headline: LocalizedText,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: LocalizedText,
    #[serde(default, deserialize_with = "null_as_default")]
    pub placeholder: LocalizedText,
    #[serde(default, deserialize_with = "null_as_default")]
    pub options: LocalizedOptions,
    #[serde(default, deserialize_with = "null_as_default")]
    pub validation_regex: LocalizedText,
    #[serde(default, deserialize_with = "null_as_default")]
    pub validation_text: LocalizedText,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default)]
    pub order: u32,
    #[serde(default, deserialize_with = "zero_as_none")]
    pub depends_on_question_id: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub show_for_values: LocalizedValueSet,
    #[serde(default, deserialize_with = "null_as_default")]
    pub weight: f64,
    #[serde(default)]
    pub question_id: Option<i64>,
    #[serde(default)]
    pub key: Option<String>,
}

/// Either the node's backend id or its surrogate, never both
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WireIdentity {
    Id(i64),
    SurrogateId(i64),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionPayload {
    #[serde(flatten)]
    pub identity: WireIdentity,
    pub name: LocalizedText,
    pub description: LocalizedText,
    pub order: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depends_on_question_id: Option<i64>,
    pub show_for_values: LocalizedValueSet,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub questions: Vec<QuestionPayload>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionPayload {
    #[serde(flatten)]
    pub identity: WireIdentity,
    #[serde(rename = "type")]
    pub question_type: Option<QuestionType>,
    pub headline: LocalizedText,
    pub description: LocalizedText,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<LocalizedText>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<LocalizedOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_regex: Option<LocalizedText>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_text: Option<LocalizedText>,
    pub is_required: bool,
    pub order: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depends_on_question_id: Option<i64>,
    pub show_for_values: LocalizedValueSet,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplicationFormSubmission {
    /// Absent on create
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub event_id: i64,
    pub is_open: bool,
    pub nominations: bool,
    pub sections: Vec<SectionPayload>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewFormSubmission {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub event_id: i64,
    pub is_open: bool,
    pub application_form_id: Option<i64>,
    pub stage: u32,
    #[serde(with = "timestamp")]
    pub deadline: Option<DateTime<Utc>>,
    pub active: bool,
    pub sections: Vec<SectionPayload>,
}

/// Body returned by create and update calls
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MutationResponse {
    #[serde(default)]
    pub id: Option<i64>,
}

/// Structured error body: `{"message": {"event_id": "..."}}`
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<serde_json::Value>,
    #[serde(default)]
    pub msg: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ReviewStage {
    pub current_stage: u32,
    #[serde(default)]
    pub total_stages: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EventDetails {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub is_application_open: bool,
    #[serde(default)]
    pub is_review_open: bool,
    #[serde(default, with = "timestamp")]
    pub review_close: Option<DateTime<Utc>>,
}

/// One applicant's submission
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ApplicationData {
    pub id: i64,
    #[serde(default)]
    pub user_title: Option<String>,
    #[serde(default)]
    pub firstname: Option<String>,
    #[serde(default)]
    pub lastname: Option<String>,
    #[serde(default)]
    pub is_submitted: bool,
    #[serde(default)]
    pub is_withdrawn: bool,
    #[serde(default, with = "timestamp")]
    pub started_timestamp: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp")]
    pub submitted_timestamp: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp")]
    pub withdrawn_timestamp: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub answers: Vec<Answer>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Answer {
    pub question_id: i64,
    #[serde(default)]
    pub value: AnswerValue,
    #[serde(rename = "type", default)]
    pub question_type: Option<QuestionType>,
    /// Options of the question in the applicant's language
    #[serde(default)]
    pub options: Option<Vec<ChoiceOption>>,
    #[serde(default)]
    pub headline: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub headline: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GuestUser {
    #[serde(default)]
    pub firstname: String,
    #[serde(default)]
    pub lastname: String,
    pub email: String,
    #[serde(default)]
    pub affiliation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InvitedGuest {
    pub role: String,
    pub user: GuestUser,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InviteRequest {
    pub email: String,
    pub event_id: i64,
    pub role: String,
}

/// A reviewer's share of an event's responses
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReviewerAssignment {
    pub email: String,
    #[serde(default)]
    pub user_title: Option<String>,
    #[serde(default)]
    pub firstname: Option<String>,
    #[serde(default)]
    pub lastname: Option<String>,
    #[serde(default)]
    pub reviews_allocated: u32,
    #[serde(default)]
    pub reviews_completed: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssignmentRequest {
    pub event_id: i64,
    pub reviewer_user_email: String,
    pub num_reviews: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub struct ReviewSummary {
    /// Submitted responses no reviewer has been given yet
    #[serde(default)]
    pub reviews_unallocated: u32,
}

/// One page of the reviews the signed-in reviewer has written
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ReviewHistory {
    #[serde(default, deserialize_with = "null_as_default")]
    pub reviews: Vec<ReviewHistoryEntry>,
    #[serde(default)]
    pub num_entries: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReviewHistoryEntry {
    pub review_response_id: i64,
    /// Sent as a string
    #[serde(default)]
    pub reviewed_user_id: Option<String>,
    #[serde(default, with = "timestamp")]
    pub submitted_timestamp: Option<DateTime<Utc>>,
}

/// A reviewer's answer to one review question
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewScore {
    pub review_question_id: i64,
    pub value: AnswerValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewSubmission {
    pub response_id: i64,
    pub review_form_id: i64,
    pub scores: Vec<ReviewScore>,
    pub language: String,
    /// False saves a draft
    pub is_submitted: bool,
}

/// A tag that can be attached to responses
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TagItem {
    pub id: i64,
    #[serde(alias = "headline")]
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    mod timestamps {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_parse_rfc3339() {
            let dt = timestamp::parse("2026-03-01T10:00:00+02:00").unwrap();
            assert_eq!(dt, Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap());
        }

        #[test]
        fn test_parse_naive_as_utc() {
            let dt = timestamp::parse("2026-03-01T10:00:00").unwrap();
            assert_eq!(dt, Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap());
            let dt = timestamp::parse("2026-03-01 10:00:00.250").unwrap();
            assert_eq!(dt.timestamp_subsec_millis(), 250);
        }

        #[test]
        fn test_parse_garbage_is_none() {
            assert_eq!(timestamp::parse(""), None);
            assert_eq!(timestamp::parse("yesterday"), None);
        }
    }

    mod form_spec {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_deserialize_application_form() {
            let json = r#"{
                "id": 4,
                "event_id": 9,
                "is_open": true,
                "nominations": false,
                "sections": [{
                    "id": 11,
                    "name": {"en": "About you"},
                    "description": null,
                    "order": 1,
                    "depends_on_question_id": 0,
                    "show_for_values": null,
                    "questions": [{
                        "id": 40,
                        "type": "long_text",
                        "headline": {"en": "Why?"},
                        "options": null,
                        "is_required": true,
                        "order": 1,
                        "depends_on_question_id": 0,
                        "key": "motivation"
                    }]
                }]
            }"#;
            let spec: FormSpec = serde_json::from_str(json).unwrap();
            assert_eq!(spec.id, 4);
            let section = &spec.sections[0];
            assert_eq!(section.depends_on_question_id, None);
            assert!(section.description.is_empty());
            let question = &section.questions[0];
            assert_eq!(question.question_type, Some(QuestionType::LongText));
            assert_eq!(question.depends_on_question_id, None);
            assert!(question.is_required);
            assert_eq!(question.key.as_deref(), Some("motivation"));
        }

        #[test]
        fn test_deserialize_review_form() {
            let json = r#"{
                "id": 2,
                "event_id": 9,
                "is_open": false,
                "application_form_id": 4,
                "stage": 2,
                "deadline": "2026-05-01T00:00:00",
                "active": true,
                "sections": []
            }"#;
            let spec: FormSpec = serde_json::from_str(json).unwrap();
            assert_eq!(spec.stage, Some(2));
            assert_eq!(spec.active, Some(true));
            assert_eq!(
                spec.deadline,
                Some(Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).unwrap())
            );
        }

        #[test]
        fn test_untyped_question() {
            let json = r#"{"id": 1, "type": null}"#;
            let question: QuestionDetail = serde_json::from_str(json).unwrap();
            assert_eq!(question.question_type, None);
        }
    }

    mod payloads {
        use super::*;
        use pretty_assertions::assert_eq;

        fn question(identity: WireIdentity) -> QuestionPayload {
            QuestionPayload {
                identity,
                question_type: Some(QuestionType::Information),
                headline: LocalizedText::default(),
                description: LocalizedText::default(),
                placeholder: None,
                options: None,
                validation_regex: None,
                validation_text: None,
                is_required: false,
                order: 1,
                depends_on_question_id: None,
                show_for_values: LocalizedValueSet::default(),
                weight: Some(1.5),
                question_id: Some(40),
                key: None,
            }
        }

        #[test]
        fn test_identity_flattens_to_one_key() {
            let backend = serde_json::to_value(question(WireIdentity::Id(7))).unwrap();
            assert_eq!(backend["id"], 7);
            assert!(backend.get("surrogate_id").is_none());

            let local = serde_json::to_value(question(WireIdentity::SurrogateId(3))).unwrap();
            assert_eq!(local["surrogate_id"], 3);
            assert!(local.get("id").is_none());
        }

        #[test]
        fn test_omitted_fields_are_absent() {
            let value = serde_json::to_value(question(WireIdentity::Id(7))).unwrap();
            for field in ["options", "placeholder", "validation_regex", "validation_text"] {
                assert!(value.get(field).is_none(), "{field} should be omitted");
            }
            assert_eq!(value["type"], "information");
            assert_eq!(value["question_id"], 40);
        }

        #[test]
        fn test_review_submission_deadline() {
            let submission = ReviewFormSubmission {
                id: None,
                event_id: 9,
                is_open: true,
                application_form_id: Some(4),
                stage: 1,
                deadline: Some(Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).unwrap()),
                active: false,
                sections: Vec::new(),
            };
            let value = serde_json::to_value(submission).unwrap();
            assert_eq!(value["deadline"], "2026-05-01T00:00:00+00:00");
            assert!(value.get("id").is_none());
        }
    }

    mod records {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_application_data() {
            let json = r#"{
                "id": 31,
                "firstname": "Ada",
                "lastname": "Lovelace",
                "is_submitted": true,
                "is_withdrawn": false,
                "started_timestamp": "2026-01-02T09:00:00",
                "submitted_timestamp": "2026-01-03T09:00:00",
                "withdrawn_timestamp": null,
                "answers": [
                    {"question_id": 40, "value": "yes", "type": "single-choice",
                     "options": [{"value": "yes", "label": "Yes please"}]},
                    {"question_id": 41, "value": ["a.pdf", null], "type": "multi-file"}
                ],
                "tags": [{"id": 1, "headline": "Shortlist"}]
            }"#;
            let data: ApplicationData = serde_json::from_str(json).unwrap();
            assert!(data.is_submitted);
            assert!(data.withdrawn_timestamp.is_none());
            assert_eq!(data.answers.len(), 2);
            assert_eq!(data.answers[0].options.as_ref().unwrap()[0].label, "Yes please");
            assert_eq!(
                data.answers[1].value,
                AnswerValue::List(vec![Some("a.pdf".to_string()), None])
            );
            assert_eq!(data.tags[0].headline, "Shortlist");
        }

        #[test]
        fn test_invited_guest() {
            let json = r#"{"role": "Speaker", "user": {"firstname": "Grace",
                "lastname": "Hopper", "email": "grace@example.org"}}"#;
            let guest: InvitedGuest = serde_json::from_str(json).unwrap();
            assert_eq!(guest.user.email, "grace@example.org");
            assert_eq!(guest.user.affiliation, None);
        }
    }

    mod reviewing {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_assignments_and_summary() {
            let json = r#"[
                {"email": "r2@r.com", "firstname": "Grace", "reviews_allocated": 4, "reviews_completed": 3},
                {"email": "r4@r.com", "reviews_allocated": 1, "reviews_completed": 0}
            ]"#;
            let reviewers: Vec<ReviewerAssignment> = serde_json::from_str(json).unwrap();
            assert_eq!(reviewers[0].reviews_allocated, 4);
            assert_eq!(reviewers[1].firstname, None);

            let summary: ReviewSummary =
                serde_json::from_str(r#"{"reviews_unallocated": 2}"#).unwrap();
            assert_eq!(summary.reviews_unallocated, 2);
        }

        #[test]
        fn test_history_page() {
            let json = r#"{
                "reviews": [{"review_response_id": 5, "reviewed_user_id": "12",
                             "submitted_timestamp": "2026-02-01T10:00:00"}],
                "num_entries": 3
            }"#;
            let history: ReviewHistory = serde_json::from_str(json).unwrap();
            assert_eq!(history.num_entries, 3);
            assert_eq!(history.reviews[0].reviewed_user_id.as_deref(), Some("12"));
            assert!(history.reviews[0].submitted_timestamp.is_some());
        }

        #[test]
        fn test_review_submission_body() {
            let body = ReviewSubmission {
                response_id: 1,
                review_form_id: 3,
                scores: vec![ReviewScore {
                    review_question_id: 8,
                    value: AnswerValue::text("4"),
                }],
                language: "en".to_string(),
                is_submitted: false,
            };
            assert_eq!(
                serde_json::to_value(&body).unwrap(),
                serde_json::json!({
                    "response_id": 1,
                    "review_form_id": 3,
                    "scores": [{"review_question_id": 8, "value": "4"}],
                    "language": "en",
                    "is_submitted": false
                })
            );
        }

        #[test]
        fn test_tag_accepts_headline() {
            let tag: TagItem = serde_json::from_str(r#"{"id": 2, "headline": "Shortlist"}"#).unwrap();
            assert_eq!(tag.name, "Shortlist");
        }
    }
}
