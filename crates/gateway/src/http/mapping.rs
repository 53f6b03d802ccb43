use quiz_core::model::{
    AnswerOption, OptionId, QuestionDraft, QuestionId, QuestionKind, QuizDraft, QuizId,
};
use serde::Deserialize;

use crate::repository::GatewayError;

/// `GET /quizzes/{id}` body.
#[derive(Debug, Deserialize)]
pub(crate) struct QuizDto {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Minutes, nullable.
    #[serde(default)]
    pub time_limit: Option<i64>,
    pub questions: Vec<QuestionDto>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QuestionDto {
    pub id: String,
    pub question_text: String,
    #[serde(default)]
    pub question_type: Option<String>,
    pub options: Vec<OptionDto>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OptionDto {
    pub id: String,
    pub text: String,
}

/// Error body; `detail` is a string in most responses but may be a validation list.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBodyDto {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

pub(crate) fn parse_question_kind(
    tag: Option<&str>,
    options: Vec<OptionDto>,
) -> Result<QuestionKind, GatewayError> {
    let options = options
        .into_iter()
        .map(|o| AnswerOption::new(OptionId::new(o.id), o.text))
        .collect();

    match tag.map(str::trim) {
        None | Some("") => Ok(QuestionKind::MultipleChoice { options }),
        Some(tag) if tag.eq_ignore_ascii_case("multiple_choice")
            || tag.eq_ignore_ascii_case("multiple-choice") =>
        {
            Ok(QuestionKind::MultipleChoice { options })
        }
        Some(other) => Err(GatewayError::Decode(format!(
            "unsupported question type: {other}"
        ))),
    }
}

impl QuizDto {
    pub(crate) fn into_draft(self) -> Result<QuizDraft, GatewayError> {
        let questions = self
            .questions
            .into_iter()
            .map(|q| {
                Ok(QuestionDraft {
                    id: QuestionId::new(q.id),
                    prompt: q.question_text,
                    kind: parse_question_kind(q.question_type.as_deref(), q.options)?,
                })
            })
            .collect::<Result<Vec<_>, GatewayError>>()?;

        Ok(QuizDraft {
            id: QuizId::new(self.id),
            title: self.title,
            description: self.description.unwrap_or_default(),
            time_limit_minutes: self.time_limit,
            questions,
        })
    }
}

/// Extract a readable `detail` from an error response body, if any.
pub(crate) fn error_detail(body: &str) -> Option<String> {
    let parsed: ErrorBodyDto = serde_json::from_str(body).ok()?;
    match parsed.detail? {
        serde_json::Value::String(detail) => Some(detail),
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}
