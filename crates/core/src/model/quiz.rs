use std::collections::HashSet;

use thiserror::Error;

use crate::model::ids::{QuestionId, QuizId};
use crate::model::question::{Question, QuestionDraft, QuestionKind};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizDefinitionError {
    #[error("quiz has no questions")]
    NoQuestions,

    #[error("duplicate question id: {0}")]
    DuplicateQuestion(QuestionId),

    #[error("question {question} has duplicate option id: {option}")]
    DuplicateOption { question: QuestionId, option: String },

    #[error("question {0} has no options")]
    NoOptions(QuestionId),

    #[error("time limit must not be negative: {minutes}")]
    NegativeTimeLimit { minutes: i64 },

    #[error("time limit is too large: {minutes} minutes")]
    TimeLimitOverflow { minutes: i64 },
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// Quiz definition as fetched, before its invariants are checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizDraft {
    pub id: QuizId,
    pub title: String,
    pub description: String,
    /// Minutes; `None` or `Some(0)` means untimed.
    pub time_limit_minutes: Option<i64>,
    pub questions: Vec<QuestionDraft>,
}

impl QuizDraft {
    /// Validate the draft into an immutable `Quiz`.
    ///
    /// # Errors
    ///
    /// Returns `QuizDefinitionError` when the question list is empty, ids repeat,
    /// a multiple-choice question has no options, or the time limit is negative.
    pub fn validate(self) -> Result<Quiz, QuizDefinitionError> {
        let time_limit_minutes = match self.time_limit_minutes {
            None | Some(0) => None,
            Some(minutes) if minutes < 0 => {
                return Err(QuizDefinitionError::NegativeTimeLimit { minutes });
            }
            Some(minutes) => {
                let minutes = u32::try_from(minutes)
                    .ok()
                    .filter(|m| m.checked_mul(60).is_some())
                    .ok_or(QuizDefinitionError::TimeLimitOverflow { minutes })?;
                Some(minutes)
            }
        };

        if self.questions.is_empty() {
            return Err(QuizDefinitionError::NoQuestions);
        }

        let mut seen = HashSet::with_capacity(self.questions.len());
        for question in &self.questions {
            if !seen.insert(&question.id) {
                return Err(QuizDefinitionError::DuplicateQuestion(question.id.clone()));
            }
            check_options(question)?;
        }

        Ok(Quiz {
            id: self.id,
            title: self.title,
            description: self.description,
            time_limit_minutes,
            questions: self.questions.into_iter().map(Question::from_draft).collect(),
        })
    }
}

fn check_options(question: &QuestionDraft) -> Result<(), QuizDefinitionError> {
    match &question.kind {
        QuestionKind::MultipleChoice { options } => {
            if options.is_empty() {
                return Err(QuizDefinitionError::NoOptions(question.id.clone()));
            }
            let mut seen = HashSet::with_capacity(options.len());
            for option in options {
                if !seen.insert(option.id()) {
                    return Err(QuizDefinitionError::DuplicateOption {
                        question: question.id.clone(),
                        option: option.id().to_string(),
                    });
                }
            }
            Ok(())
        }
    }
}

//
// ─── QUIZ ──────────────────────────────────────────────────────────────────────
//

/// A fully fetched, validated quiz. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quiz {
    id: QuizId,
    title: String,
    description: String,
    time_limit_minutes: Option<u32>,
    questions: Vec<Question>,
}

impl Quiz {
    #[must_use]
    pub fn id(&self) -> &QuizId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn time_limit_minutes(&self) -> Option<u32> {
        self.time_limit_minutes
    }

    /// Time limit in seconds, or `None` for an untimed quiz.
    #[must_use]
    pub fn time_limit_secs(&self) -> Option<u32> {
        self.time_limit_minutes.map(|m| m * 60)
    }

    /// Questions in navigation order. Never empty.
    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn question(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    #[must_use]
    pub fn question_by_id(&self, id: &QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id() == id)
    }

    #[must_use]
    pub fn index_of(&self, id: &QuestionId) -> Option<usize> {
        self.questions.iter().position(|q| q.id() == id)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnswerOption, OptionId};

    fn mc(id: &str, options: &[&str]) -> QuestionDraft {
        QuestionDraft {
            id: QuestionId::new(id),
            prompt: format!("prompt {id}"),
            kind: QuestionKind::MultipleChoice {
                options: options
                    .iter()
                    .map(|o| AnswerOption::new(OptionId::new(*o), o.to_uppercase()))
                    .collect(),
            },
        }
    }

    fn draft(time_limit_minutes: Option<i64>, questions: Vec<QuestionDraft>) -> QuizDraft {
        QuizDraft {
            id: QuizId::new("quiz-1"),
            title: "Fractions".into(),
            description: "Warm-up".into(),
            time_limit_minutes,
            questions,
        }
    }

    #[test]
    fn valid_quiz_keeps_question_order() {
        let quiz = draft(Some(2), vec![mc("q1", &["a", "b"]), mc("q2", &["a"])])
            .validate()
            .unwrap();
        assert_eq!(quiz.question_count(), 2);
        assert_eq!(quiz.question(1).unwrap().id(), &QuestionId::new("q2"));
        assert_eq!(quiz.index_of(&QuestionId::new("q2")), Some(1));
        assert_eq!(quiz.time_limit_secs(), Some(120));
    }

    #[test]
    fn zero_or_missing_time_limit_is_untimed() {
        let quiz = draft(Some(0), vec![mc("q1", &["a"])]).validate().unwrap();
        assert_eq!(quiz.time_limit_secs(), None);
        let quiz = draft(None, vec![mc("q1", &["a"])]).validate().unwrap();
        assert_eq!(quiz.time_limit_minutes(), None);
    }

    #[test]
    fn negative_time_limit_is_rejected() {
        let err = draft(Some(-5), vec![mc("q1", &["a"])]).validate().unwrap_err();
        assert_eq!(err, QuizDefinitionError::NegativeTimeLimit { minutes: -5 });
    }

    #[test]
    fn empty_quiz_is_rejected() {
        let err = draft(Some(1), Vec::new()).validate().unwrap_err();
        assert_eq!(err, QuizDefinitionError::NoQuestions);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let err = draft(None, vec![mc("q1", &["a"]), mc("q1", &["b"])])
            .validate()
            .unwrap_err();
        assert!(matches!(err, QuizDefinitionError::DuplicateQuestion(_)));

        let err = draft(None, vec![mc("q1", &["a", "a"])])
            .validate()
            .unwrap_err();
        assert!(matches!(err, QuizDefinitionError::DuplicateOption { .. }));
    }

    #[test]
    fn question_without_options_is_rejected() {
        let err = draft(None, vec![mc("q1", &[])]).validate().unwrap_err();
        assert_eq!(err, QuizDefinitionError::NoOptions(QuestionId::new("q1")));
    }
}
