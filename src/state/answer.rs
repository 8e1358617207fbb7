//! Submitted answer values

use serde::{Deserialize, Serialize};

/// The stored value of one answer, as the backend returns it
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    #[default]
    Null,
    Text(String),
    List(Vec<Option<String>>),
    /// Numbers, booleans or objects the form model has no type for
    Other(serde_json::Value),
}

impl AnswerValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn list<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::List(values.into_iter().map(|v| Some(v.into())).collect())
    }

    /// Null, a blank string, or a list without a single non-blank entry
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(s) => s.trim().is_empty(),
            Self::List(items) => items
                .iter()
                .all(|item| item.as_deref().map_or(true, |s| s.trim().is_empty())),
            Self::Other(value) => value.is_null(),
        }
    }

    /// Every non-null scalar the answer holds, as strings
    pub fn scalars(&self) -> Vec<String> {
        match self {
            Self::Null => Vec::new(),
            Self::Text(s) => vec![s.clone()],
            Self::List(items) => items.iter().flatten().cloned().collect(),
            Self::Other(serde_json::Value::String(s)) => vec![s.clone()],
            Self::Other(serde_json::Value::Null) => Vec::new(),
            Self::Other(value) => vec![value.to_string()],
        }
    }
}

impl From<&str> for AnswerValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for AnswerValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_deserialize_shapes() {
        let null: AnswerValue = serde_json::from_str("null").unwrap();
        assert_eq!(null, AnswerValue::Null);

        let text: AnswerValue = serde_json::from_str(r#""yes""#).unwrap();
        assert_eq!(text, AnswerValue::text("yes"));

        let list: AnswerValue = serde_json::from_str(r#"["a", null, "b"]"#).unwrap();
        assert_eq!(
            list,
            AnswerValue::List(vec![Some("a".to_string()), None, Some("b".to_string())])
        );

        let number: AnswerValue = serde_json::from_str("42").unwrap();
        assert_eq!(number, AnswerValue::Other(serde_json::json!(42)));
    }

    #[test]
    fn test_is_empty() {
        assert!(AnswerValue::Null.is_empty());
        assert!(AnswerValue::text("  ").is_empty());
        assert!(AnswerValue::List(Vec::new()).is_empty());
        assert!(!AnswerValue::text("x").is_empty());
        assert!(!AnswerValue::Other(serde_json::json!(false)).is_empty());
    }

    #[test]
    fn test_scalars_skip_nulls() {
        let value = AnswerValue::List(vec![Some("a".to_string()), None]);
        assert_eq!(value.scalars(), vec!["a".to_string()]);
        assert_eq!(
            AnswerValue::Other(serde_json::json!(3)).scalars(),
            vec!["3".to_string()]
        );
    }

    #[test]
    fn test_list_of_nulls_is_empty() {
        let nulls: AnswerValue = serde_json::from_str("[null, null]").unwrap();
        assert!(nulls.is_empty());
        assert!(AnswerValue::List(vec![Some(" ".to_string()), None]).is_empty());
        assert!(!AnswerValue::List(vec![None, Some("cv.pdf".to_string())]).is_empty());
    }
}
