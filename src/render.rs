//! Turning submitted answers into display values

use chrono::{DateTime, Utc};
use std::fmt;
use url::Url;

use crate::backend::wire::{Answer, ApplicationData};
use crate::state::{AnswerValue, ChoiceOption, FormDocument, QuestionType};

/// Shown where an answer is missing, unless configured otherwise
pub const DEFAULT_NO_ANSWER_TEXT: &str = "No answer provided.";

const FILE_ENDPOINT: &str = "api/v1/file";

/// A link to an uploaded file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileLink {
    pub name: String,
    pub url: Url,
}

/// What an answer looks like once rendered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayValue {
    /// Nothing is shown (information questions)
    Empty,
    NoAnswer(String),
    Text(String),
    Labels(Vec<String>),
    Files(Vec<FileLink>),
}

impl fmt::Display for DisplayValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::NoAnswer(text) | Self::Text(text) => f.write_str(text),
            Self::Labels(labels) => f.write_str(&labels.join(", ")),
            Self::Files(links) => {
                for (i, link) in links.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{} <{}>", link.name, link.url)?;
                }
                Ok(())
            }
        }
    }
}

/// Renders answers for reviewers and response pages
#[derive(Debug, Clone)]
pub struct AnswerRenderer {
    file_endpoint: Url,
    no_answer_text: String,
}

impl AnswerRenderer {
    pub fn new(base_url: &str, no_answer_text: impl Into<String>) -> Result<Self, url::ParseError> {
        let root = Url::parse(&format!("{}/", base_url.trim_end_matches('/')))?;
        Ok(Self {
            file_endpoint: root.join(FILE_ENDPOINT)?,
            no_answer_text: no_answer_text.into(),
        })
    }

    /// `{base_url}/api/v1/file?filename={name}`
    pub fn file_link(&self, name: &str) -> FileLink {
        let mut url = self.file_endpoint.clone();
        url.query_pairs_mut().append_pair("filename", name);
        FileLink {
            name: name.to_string(),
            url,
        }
    }

    /// Render one answer. `options` are the question's options in the
    /// reader's language; when empty the options embedded in the answer are
    /// used.
    pub fn render(
        &self,
        answer: Option<&Answer>,
        question_type: Option<QuestionType>,
        options: &[ChoiceOption],
    ) -> DisplayValue {
        let answer_type = answer.and_then(|a| a.question_type);
        if answer_type == Some(QuestionType::Information)
            || question_type == Some(QuestionType::Information)
        {
            return DisplayValue::Empty;
        }
        let Some(answer) = answer.filter(|a| !a.value.is_empty()) else {
            return DisplayValue::NoAnswer(self.no_answer_text.clone());
        };

        match question_type.or(answer_type) {
            Some(kind) if kind.is_choice() => {
                let options = if options.is_empty() {
                    answer.options.as_deref().unwrap_or_default()
                } else {
                    options
                };
                render_choice(&answer.value, options)
            }
            Some(QuestionType::File) => DisplayValue::Files(
                answer
                    .value
                    .scalars()
                    .iter()
                    .map(|name| self.file_link(name))
                    .collect(),
            ),
            Some(QuestionType::MultiFile) => {
                let names = file_names(&answer.value);
                if names.is_empty() {
                    return DisplayValue::NoAnswer(self.no_answer_text.clone());
                }
                DisplayValue::Files(names.iter().map(|name| self.file_link(name)).collect())
            }
            _ => DisplayValue::Text(answer.value.scalars().join(", ")),
        }
    }
}

fn label_for(value: &str, options: &[ChoiceOption]) -> String {
    options
        .iter()
        .find(|o| o.value == value)
        .map(|o| o.label.clone())
        .unwrap_or_else(|| value.to_string())
}

fn render_choice(value: &AnswerValue, options: &[ChoiceOption]) -> DisplayValue {
    match value {
        AnswerValue::List(_) => DisplayValue::Labels(
            value
                .scalars()
                .iter()
                .map(|v| label_for(v, options))
                .collect(),
        ),
        other => DisplayValue::Text(
            other
                .scalars()
                .first()
                .map(|v| label_for(v, options))
                .unwrap_or_default(),
        ),
    }
}

/// Multi-file answers are sometimes stored as a JSON array inside a string
fn file_names(value: &AnswerValue) -> Vec<String> {
    match value {
        AnswerValue::Text(s) => match serde_json::from_str::<Vec<Option<String>>>(s) {
            Ok(names) => names.into_iter().flatten().collect(),
            Err(_) => vec![s.clone()],
        },
        other => other.scalars(),
    }
}

/// Where an application stands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplicationStatus {
    Unsubmitted(Option<DateTime<Utc>>),
    Submitted(Option<DateTime<Utc>>),
    Withdrawn(Option<DateTime<Utc>>),
}

impl ApplicationStatus {
    pub fn of(data: &ApplicationData) -> Self {
        if data.is_submitted {
            Self::Submitted(data.submitted_timestamp)
        } else if data.is_withdrawn {
            Self::Withdrawn(data.withdrawn_timestamp)
        } else {
            Self::Unsubmitted(data.started_timestamp)
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (label, at) = match self {
            Self::Unsubmitted(at) => ("unsubmitted", at),
            Self::Submitted(at) => ("submitted", at),
            Self::Withdrawn(at) => ("withdrawn", at),
        };
        match at {
            Some(at) => write!(f, "{label} {}", at.format("%Y-%m-%d %H:%M UTC")),
            None => f.write_str(label),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseItem {
    pub headline: String,
    pub value: DisplayValue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseSection {
    pub name: String,
    pub items: Vec<ResponseItem>,
}

/// A printable application response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseView {
    pub applicant: String,
    pub status: ApplicationStatus,
    pub tags: Vec<String>,
    pub sections: Vec<ResponseSection>,
}

impl fmt::Display for ResponseView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.applicant)?;
        writeln!(f, "Status: {}", self.status)?;
        if !self.tags.is_empty() {
            writeln!(f, "Tags: {}", self.tags.join(", "))?;
        }
        for section in &self.sections {
            writeln!(f)?;
            writeln!(f, "## {}", section.name)?;
            for item in &section.items {
                writeln!(f, "{}", item.headline)?;
                writeln!(f, "  {}", item.value)?;
            }
        }
        Ok(())
    }
}

/// Walk the application form in order and render the applicant's answers
pub fn render_response(
    renderer: &AnswerRenderer,
    form: &FormDocument,
    application: &ApplicationData,
    language: &str,
) -> ResponseView {
    let applicant = [
        application.user_title.as_deref(),
        application.firstname.as_deref(),
        application.lastname.as_deref(),
    ]
    .into_iter()
    .flatten()
    .filter(|part| !part.trim().is_empty())
    .collect::<Vec<_>>()
    .join(" ");

    let sections = form
        .sections
        .iter()
        .map(|section| ResponseSection {
            name: section.name.text(language).to_string(),
            items: section
                .questions
                .iter()
                .map(|question| {
                    let answer = application
                        .answers
                        .iter()
                        .find(|a| a.question_id == question.identity.raw());
                    ResponseItem {
                        headline: question.headline.text(language).to_string(),
                        value: renderer.render(
                            answer,
                            question.question_type,
                            question.options_for(language),
                        ),
                    }
                })
                .collect(),
        })
        .collect();

    ResponseView {
        applicant,
        status: ApplicationStatus::of(application),
        tags: application.tags.iter().map(|t| t.headline.clone()).collect(),
        sections,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::wire::Tag;
    use crate::state::{NodeIdentity, TextField};
    use chrono::TimeZone;

    fn renderer() -> AnswerRenderer {
        AnswerRenderer::new("https://api.example.org", DEFAULT_NO_ANSWER_TEXT).unwrap()
    }

    fn answer(value: AnswerValue, kind: Option<QuestionType>) -> Answer {
        Answer {
            question_id: 1,
            value,
            question_type: kind,
            options: None,
            headline: None,
        }
    }

    fn yes_no() -> Vec<ChoiceOption> {
        vec![ChoiceOption::new("y", "Yes"), ChoiceOption::new("n", "No")]
    }

    mod answers {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_information_renders_nothing() {
            let a = answer("hello".into(), Some(QuestionType::Information));
            assert_eq!(
                renderer().render(Some(&a), Some(QuestionType::ShortText), &[]),
                DisplayValue::Empty
            );
            assert_eq!(
                renderer().render(None, Some(QuestionType::Information), &[]),
                DisplayValue::Empty
            );
        }

        #[test]
        fn test_missing_answer() {
            let expected = DisplayValue::NoAnswer(DEFAULT_NO_ANSWER_TEXT.to_string());
            assert_eq!(
                renderer().render(None, Some(QuestionType::ShortText), &[]),
                expected
            );
            let blank = answer("".into(), None);
            assert_eq!(
                renderer().render(Some(&blank), Some(QuestionType::ShortText), &[]),
                expected
            );
            let empty_list = answer(AnswerValue::List(Vec::new()), None);
            assert_eq!(
                renderer().render(Some(&empty_list), Some(QuestionType::MultiFile), &[]),
                expected
            );
        }

        #[test]
        fn test_null_entries_are_no_answer() {
            let expected = DisplayValue::NoAnswer(DEFAULT_NO_ANSWER_TEXT.to_string());
            let nulls = answer(AnswerValue::List(vec![None]), None);
            assert_eq!(
                renderer().render(Some(&nulls), Some(QuestionType::MultiFile), &[]),
                expected
            );
            let encoded = answer("[null]".into(), None);
            assert_eq!(
                renderer().render(Some(&encoded), Some(QuestionType::MultiFile), &[]),
                expected
            );
            let null = answer(AnswerValue::Null, None);
            assert_eq!(
                renderer().render(Some(&null), Some(QuestionType::ShortText), &[]),
                expected
            );
        }

        #[test]
        fn test_multi_choice_label_lookup() {
            let options = vec![ChoiceOption::new("opt1", "First")];
            let chosen = answer("opt1".into(), None);
            assert_eq!(
                renderer().render(Some(&chosen), Some(QuestionType::MultiChoice), &options),
                DisplayValue::Text("First".to_string())
            );
            let unmatched = answer("opt1".into(), None);
            assert_eq!(
                renderer().render(Some(&unmatched), Some(QuestionType::MultiChoice), &[]),
                DisplayValue::Text("opt1".to_string())
            );
        }

        #[test]
        fn test_choice_uses_label() {
            let a = answer("y".into(), None);
            assert_eq!(
                renderer().render(Some(&a), Some(QuestionType::SingleChoice), &yes_no()),
                DisplayValue::Text("Yes".to_string())
            );
        }

        #[test]
        fn test_choice_falls_back_to_raw_value() {
            let a = answer("maybe".into(), None);
            assert_eq!(
                renderer().render(Some(&a), Some(QuestionType::SingleChoice), &yes_no()),
                DisplayValue::Text("maybe".to_string())
            );
        }

        #[test]
        fn test_choice_uses_embedded_options() {
            let mut a = answer("n".into(), Some(QuestionType::MultiChoice));
            a.options = Some(yes_no());
            assert_eq!(
                renderer().render(Some(&a), None, &[]),
                DisplayValue::Text("No".to_string())
            );
        }

        #[test]
        fn test_checkbox_list_maps_each_value() {
            let a = answer(AnswerValue::list(["y", "n", "x"]), None);
            assert_eq!(
                renderer().render(Some(&a), Some(QuestionType::MultiCheckbox), &yes_no()),
                DisplayValue::Labels(vec!["Yes".into(), "No".into(), "x".into()])
            );
        }

        #[test]
        fn test_file_link() {
            let a = answer("cv.pdf".into(), None);
            let rendered = renderer().render(Some(&a), Some(QuestionType::File), &[]);
            let DisplayValue::Files(links) = rendered else {
                panic!("expected files");
            };
            assert_eq!(
                links[0].url.as_str(),
                "https://api.example.org/api/v1/file?filename=cv.pdf"
            );
        }

        #[test]
        fn test_multi_file_skips_nulls() {
            let a = answer(
                AnswerValue::List(vec![Some("a.pdf".into()), None, Some("b.pdf".into())]),
                None,
            );
            let rendered = renderer().render(Some(&a), Some(QuestionType::MultiFile), &[]);
            let DisplayValue::Files(links) = rendered else {
                panic!("expected files");
            };
            let names: Vec<&str> = links.iter().map(|l| l.name.as_str()).collect();
            assert_eq!(names, vec!["a.pdf", "b.pdf"]);
        }

        #[test]
        fn test_multi_file_decodes_json_string() {
            let a = answer(r#"["a.pdf", null]"#.into(), None);
            let rendered = renderer().render(Some(&a), Some(QuestionType::MultiFile), &[]);
            assert_eq!(rendered.to_string(), "a.pdf <https://api.example.org/api/v1/file?filename=a.pdf>");
        }

        #[test]
        fn test_default_joins_lists() {
            let a = answer(AnswerValue::list(["one", "two"]), None);
            assert_eq!(
                renderer().render(Some(&a), Some(QuestionType::ShortText), &[]),
                DisplayValue::Text("one, two".to_string())
            );
        }

        #[test]
        fn test_custom_no_answer_text() {
            let renderer = AnswerRenderer::new("http://localhost", "n/a").unwrap();
            assert_eq!(
                renderer.render(None, None, &[]).to_string(),
                "n/a".to_string()
            );
        }
    }

    mod responses {
        use super::*;
        use pretty_assertions::assert_eq;

        fn application(submitted: bool, withdrawn: bool) -> ApplicationData {
            ApplicationData {
                id: 31,
                user_title: Some("Dr".to_string()),
                firstname: Some("Ada".to_string()),
                lastname: Some("Lovelace".to_string()),
                is_submitted: submitted,
                is_withdrawn: withdrawn,
                started_timestamp: Some(Utc.with_ymd_and_hms(2026, 1, 2, 9, 0, 0).unwrap()),
                submitted_timestamp: Some(Utc.with_ymd_and_hms(2026, 1, 3, 9, 0, 0).unwrap()),
                withdrawn_timestamp: None,
                answers: vec![Answer {
                    question_id: 40,
                    value: "y".into(),
                    question_type: None,
                    options: None,
                    headline: None,
                }],
                tags: vec![Tag {
                    id: 1,
                    headline: "Shortlist".to_string(),
                }],
            }
        }

        fn form() -> FormDocument {
            let mut doc = FormDocument::new_application(9, vec!["en".to_string()]);
            let question = doc.sections[0].questions[0].display_id;
            doc.sections[0].questions[0].identity = NodeIdentity::Backend(40);
            doc.set_type(question, QuestionType::SingleChoice).unwrap();
            doc.edit_field(question, TextField::Headline, "en", Some("Student?".to_string()))
                .unwrap();
            doc.add_option(question, "en", "y", "Yes").unwrap();
            let section = doc.sections[0].display_id;
            doc.add_question(section).unwrap();
            doc
        }

        #[test]
        fn test_status_precedence() {
            assert!(matches!(
                ApplicationStatus::of(&application(false, false)),
                ApplicationStatus::Unsubmitted(Some(_))
            ));
            assert!(matches!(
                ApplicationStatus::of(&application(true, false)),
                ApplicationStatus::Submitted(Some(_))
            ));
            assert_eq!(
                ApplicationStatus::of(&application(false, true)),
                ApplicationStatus::Withdrawn(None)
            );
            assert_eq!(
                ApplicationStatus::of(&application(true, false)).to_string(),
                "submitted 2026-01-03 09:00 UTC"
            );
        }

        #[test]
        fn test_render_response_walks_form() {
            let view = render_response(&renderer(), &form(), &application(true, false), "en");
            assert_eq!(view.applicant, "Dr Ada Lovelace");
            assert_eq!(view.tags, vec!["Shortlist".to_string()]);
            assert_eq!(view.sections.len(), 1);

            let items = &view.sections[0].items;
            assert_eq!(items[0].headline, "Student?");
            assert_eq!(items[0].value, DisplayValue::Text("Yes".to_string()));
            assert_eq!(
                items[1].value,
                DisplayValue::NoAnswer(DEFAULT_NO_ANSWER_TEXT.to_string())
            );
        }

        #[test]
        fn test_response_view_prints() {
            let view = render_response(&renderer(), &form(), &application(true, false), "en");
            let printed = view.to_string();
            assert!(printed.starts_with("Dr Ada Lovelace\nStatus: submitted"));
            assert!(printed.contains("## Untitled Section\nStudent?\n  Yes\n"));
        }
    }
}
