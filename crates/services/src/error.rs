//! Shared error types for the services crate.

use thiserror::Error;

use gateway::GatewayError;
use quiz_core::CountdownError;
use quiz_core::model::{OptionId, QuestionId, QuizDefinitionError, QuizId};

/// Guard violations. Callers treat most of these as no-ops.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationError {
    #[error("no quiz has been loaded for this attempt")]
    NotLoaded,
    #[error("a quiz is already loaded for this attempt")]
    AlreadyLoaded,
    #[error("session is not active")]
    NotActive,
    #[error("submission already in progress")]
    AlreadySubmitting,
    #[error("quiz already submitted")]
    AlreadySubmitted,
    #[error("countdown was already started or stopped")]
    CountdownNotIdle,
    #[error("question {0} is not part of this quiz")]
    UnknownQuestion(QuestionId),
    #[error("option {option} does not belong to question {question}")]
    UnknownOption {
        question: QuestionId,
        option: OptionId,
    },
    #[error("question index {index} is out of range (quiz has {len})")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Errors emitted by quiz session services.
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("quiz {quiz_id} not found")]
    NotFound { quiz_id: QuizId },
    #[error("network error: {detail}")]
    Network { detail: String },
    #[error("countdown duration must be > 0 seconds, got {seconds}")]
    InvalidDuration { seconds: i64 },
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    InvalidQuiz(#[from] QuizDefinitionError),
}

impl SessionError {
    /// Map a collaborator failure for `quiz_id` into the session taxonomy.
    #[must_use]
    pub fn from_gateway(quiz_id: &QuizId, err: GatewayError) -> Self {
        match err {
            GatewayError::NotFound => SessionError::NotFound {
                quiz_id: quiz_id.clone(),
            },
            GatewayError::InvalidDefinition(def) => SessionError::InvalidQuiz(def),
            other => SessionError::Network {
                detail: other.detail(),
            },
        }
    }

    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, SessionError::Validation(_))
    }
}

impl From<CountdownError> for SessionError {
    fn from(err: CountdownError) -> Self {
        match err {
            CountdownError::InvalidDuration { seconds } => SessionError::InvalidDuration { seconds },
            _ => SessionError::Validation(ValidationError::CountdownNotIdle),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_errors_map_to_session_kinds() {
        let id = QuizId::new("quiz-9");
        assert_eq!(
            SessionError::from_gateway(&id, GatewayError::NotFound),
            SessionError::NotFound { quiz_id: id.clone() }
        );
        assert_eq!(
            SessionError::from_gateway(
                &id,
                GatewayError::Status {
                    status: 503,
                    detail: Some("maintenance".into())
                }
            ),
            SessionError::Network {
                detail: "maintenance".into()
            }
        );
        assert!(matches!(
            SessionError::from_gateway(&id, GatewayError::Decode("bad json".into())),
            SessionError::Network { .. }
        ));
        assert!(matches!(
            SessionError::from_gateway(
                &id,
                GatewayError::InvalidDefinition(QuizDefinitionError::NoQuestions)
            ),
            SessionError::InvalidQuiz(_)
        ));
    }

    #[test]
    fn countdown_errors_keep_the_duration() {
        let err: SessionError = CountdownError::InvalidDuration { seconds: 0 }.into();
        assert_eq!(err, SessionError::InvalidDuration { seconds: 0 });
        assert!(!err.is_validation());
    }
}
