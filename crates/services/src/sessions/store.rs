use std::sync::{Arc, Mutex, PoisonError};

use gateway::QuizSource;
use quiz_core::Clock;
use quiz_core::model::{OptionId, QuestionId, Quiz, QuizId};
use tokio::sync::watch;

use crate::error::{SessionError, ValidationError};
use super::progress::{Progress, SessionSnapshot};
use super::session::{QuizSession, SessionStatus};

/// Single source of truth for one attempt.
///
/// Clones share the same session. The lock is never held across an await, so the
/// countdown task, the submission pipeline and UI handlers observe each other's
/// writes in order.
#[derive(Clone)]
pub struct SessionStore {
    quizzes: Arc<dyn QuizSource>,
    clock: Clock,
    slot: Arc<Mutex<Option<QuizSession>>>,
    status: Arc<watch::Sender<SessionStatus>>,
}

impl SessionStore {
    #[must_use]
    pub fn new(quizzes: Arc<dyn QuizSource>, clock: Clock) -> Self {
        let (status, _) = watch::channel(SessionStatus::Loading);
        Self {
            quizzes,
            clock,
            slot: Arc::new(Mutex::new(None)),
            status: Arc::new(status),
        }
    }

    /// Fetch `quiz_id` and create the session for it.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotFound` or `SessionError::Network` when the fetch
    /// fails, `SessionError::InvalidQuiz` for a malformed definition, and
    /// `ValidationError::AlreadyLoaded` if this store already holds a session.
    pub async fn load_quiz(&self, quiz_id: &QuizId) -> Result<Arc<Quiz>, SessionError> {
        let already_loaded = self.lock().is_some();
        if already_loaded {
            return Err(ValidationError::AlreadyLoaded.into());
        }

        let quiz = self
            .quizzes
            .fetch_quiz(quiz_id)
            .await
            .map_err(|e| SessionError::from_gateway(quiz_id, e))?;
        let quiz = Arc::new(quiz);

        let attempt = {
            let mut slot = self.lock();
            if slot.is_some() {
                return Err(ValidationError::AlreadyLoaded.into());
            }
            let session = QuizSession::new(Arc::clone(&quiz), self.clock.now());
            let attempt = session.attempt_id();
            *slot = Some(session);
            self.publish(SessionStatus::Active);
            attempt
        };

        tracing::info!(
            %attempt,
            quiz = %quiz_id,
            questions = quiz.question_count(),
            time_limit_secs = ?quiz.time_limit_secs(),
            "quiz loaded"
        );
        Ok(quiz)
    }

    /// `Loading` until a quiz has been loaded.
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.lock()
            .as_ref()
            .map_or(SessionStatus::Loading, QuizSession::status)
    }

    /// Receiver that observes every status transition.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.status.subscribe()
    }

    #[must_use]
    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// # Errors
    ///
    /// See [`QuizSession::select_answer`]; also `ValidationError::NotLoaded`.
    pub fn select_answer(
        &self,
        question: &QuestionId,
        option: &OptionId,
    ) -> Result<bool, SessionError> {
        self.write(|s| s.select_answer(question, option))?
    }

    /// # Errors
    ///
    /// See [`QuizSession::select_current`]; also `ValidationError::NotLoaded`.
    pub fn select_current(&self, option: &OptionId) -> Result<bool, SessionError> {
        self.write(|s| s.select_current(option))?
    }

    /// # Errors
    ///
    /// Returns `ValidationError::IndexOutOfRange` or `ValidationError::NotLoaded`.
    pub fn go_to(&self, index: usize) -> Result<(), SessionError> {
        self.write(|s| s.go_to(index))?
    }

    pub fn next(&self) -> bool {
        self.write(QuizSession::next).unwrap_or(false)
    }

    pub fn previous(&self) -> bool {
        self.write(QuizSession::previous).unwrap_or(false)
    }

    /// # Errors
    ///
    /// Returns `ValidationError::NotLoaded` before the quiz arrives.
    pub fn progress(&self) -> Result<Progress, SessionError> {
        self.read(QuizSession::progress)
    }

    /// # Errors
    ///
    /// Returns `ValidationError::NotLoaded` before the quiz arrives.
    pub fn snapshot(&self, low_time_threshold_secs: u32) -> Result<SessionSnapshot, SessionError> {
        self.read(|s| s.snapshot(low_time_threshold_secs))
    }

    /// Run `f` against the session.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::NotLoaded` before the quiz arrives.
    pub fn read<R>(&self, f: impl FnOnce(&QuizSession) -> R) -> Result<R, SessionError> {
        let slot = self.lock();
        let session = slot.as_ref().ok_or(ValidationError::NotLoaded)?;
        Ok(f(session))
    }

    /// Mutate the session under the lock and publish any status change.
    ///
    /// The status is published before the lock is released, so watchers see
    /// transitions in the order they were applied.
    pub(crate) fn write<R>(
        &self,
        f: impl FnOnce(&mut QuizSession) -> R,
    ) -> Result<R, SessionError> {
        let mut slot = self.lock();
        let session = slot.as_mut().ok_or(ValidationError::NotLoaded)?;
        let out = f(session);
        self.publish(session.status());
        Ok(out)
    }

    /// Callers hold the slot lock.
    fn publish(&self, status: SessionStatus) {
        self.status.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status;
                true
            }
        });
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<QuizSession>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
