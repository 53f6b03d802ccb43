use async_trait::async_trait;
use quiz_core::model::{AnswerMap, Quiz, QuizDefinitionError, QuizId, QuizResult, Submission};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by backend adapters.
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum GatewayError {
    #[error("not found")]
    NotFound,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("request failed with status {status}")]
    Status { status: u16, detail: Option<String> },

    #[error("decode error: {0}")]
    Decode(String),

    #[error(transparent)]
    InvalidDefinition(#[from] QuizDefinitionError),
}

impl GatewayError {
    /// Human-readable description, preferring the server's `detail` field.
    #[must_use]
    pub fn detail(&self) -> String {
        match self {
            GatewayError::Status {
                detail: Some(detail),
                ..
            } => detail.clone(),
            other => other.to_string(),
        }
    }
}

/// Read side of the quiz content store.
#[async_trait]
pub trait QuizSource: Send + Sync {
    /// Fetch and validate a quiz definition.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::NotFound` if the id does not resolve, or other
    /// gateway errors for transport, decoding, or invalid definitions.
    async fn fetch_quiz(&self, id: &QuizId) -> Result<Quiz, GatewayError>;
}

/// The scoring endpoint.
#[async_trait]
pub trait GradingService: Send + Sync {
    /// Submit the full answer payload for grading.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` if the request fails or is rejected.
    async fn submit(
        &self,
        quiz_id: &QuizId,
        submission: &Submission,
    ) -> Result<QuizResult, GatewayError>;
}

/// Bundles the collaborator contracts, like a storage handle bundles repositories.
#[derive(Clone)]
pub struct Backend {
    pub quizzes: Arc<dyn QuizSource>,
    pub grading: Arc<dyn GradingService>,
}

impl Backend {
    #[must_use]
    pub fn in_memory(backend: InMemoryBackend) -> Self {
        Self {
            quizzes: Arc::new(backend.clone()),
            grading: Arc::new(backend),
        }
    }
}

/// In-memory backend for tests and offline demos.
///
/// Grades against an optional answer key and records every submission it receives.
#[derive(Clone, Default)]
pub struct InMemoryBackend {
    quizzes: Arc<Mutex<HashMap<QuizId, Quiz>>>,
    answer_keys: Arc<Mutex<HashMap<QuizId, AnswerMap>>>,
    fetch_failures: Arc<Mutex<VecDeque<GatewayError>>>,
    submit_failures: Arc<Mutex<VecDeque<GatewayError>>>,
    submissions: Arc<Mutex<Vec<(QuizId, Submission)>>>,
    submit_delay: Option<Duration>,
}

impl InMemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every grading response, so submissions stay in flight for a while.
    #[must_use]
    pub fn with_submit_delay(mut self, delay: Duration) -> Self {
        self.submit_delay = Some(delay);
        self
    }

    pub fn insert_quiz(&self, quiz: Quiz) {
        lock(&self.quizzes).insert(quiz.id().clone(), quiz);
    }

    pub fn set_answer_key(&self, quiz_id: QuizId, key: AnswerMap) {
        lock(&self.answer_keys).insert(quiz_id, key);
    }

    /// Queue an error for the next fetch.
    pub fn fail_next_fetch(&self, error: GatewayError) {
        lock(&self.fetch_failures).push_back(error);
    }

    /// Queue an error for the next submission. The failed call is still recorded.
    pub fn fail_next_submit(&self, error: GatewayError) {
        lock(&self.submit_failures).push_back(error);
    }

    /// Every submission received so far, failed ones included, in arrival order.
    #[must_use]
    pub fn submissions(&self) -> Vec<(QuizId, Submission)> {
        lock(&self.submissions).clone()
    }

    fn grade(&self, quiz: &Quiz, submission: &Submission) -> QuizResult {
        let keys = lock(&self.answer_keys);
        let correct = keys.get(quiz.id()).map_or(0, |key| {
            submission
                .answers
                .iter()
                .filter(|(question, option)| key.get(question) == Some(*option))
                .count()
        });
        let total = u32::try_from(quiz.question_count()).unwrap_or(u32::MAX);
        let correct_answers = u32::try_from(correct).unwrap_or(u32::MAX);
        let score = if total == 0 {
            0.0
        } else {
            f64::from(correct_answers) * 100.0 / f64::from(total)
        };

        QuizResult {
            score,
            correct_answers,
            total_questions: total,
            time_taken: submission.time_taken,
            category_scores: None,
            question_results: None,
        }
    }
}

#[async_trait]
impl QuizSource for InMemoryBackend {
    async fn fetch_quiz(&self, id: &QuizId) -> Result<Quiz, GatewayError> {
        if let Some(error) = lock(&self.fetch_failures).pop_front() {
            return Err(error);
        }
        lock(&self.quizzes)
            .get(id)
            .cloned()
            .ok_or(GatewayError::NotFound)
    }
}

#[async_trait]
impl GradingService for InMemoryBackend {
    async fn submit(
        &self,
        quiz_id: &QuizId,
        submission: &Submission,
    ) -> Result<QuizResult, GatewayError> {
        lock(&self.submissions).push((quiz_id.clone(), submission.clone()));

        if let Some(delay) = self.submit_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = lock(&self.submit_failures).pop_front() {
            return Err(error);
        }

        let quiz = lock(&self.quizzes)
            .get(quiz_id)
            .cloned()
            .ok_or(GatewayError::NotFound)?;
        Ok(self.grade(&quiz, submission))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
