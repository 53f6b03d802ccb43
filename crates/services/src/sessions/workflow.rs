use std::sync::Arc;
use std::time::Duration;

use gateway::Backend;
use quiz_core::model::{OptionId, QuestionId, QuizId, QuizResult};
use tokio::sync::watch;

use crate::Clock;
use crate::context::{AttemptContext, CurrentUser};
use crate::error::SessionError;
use super::countdown::CountdownController;
use super::progress::{Progress, QuestionMapEntry, SessionSnapshot};
use super::session::{QuizSession, SessionStatus};
use super::store::SessionStore;
use super::submission::{SubmissionPipeline, can_submit};

/// Tunables for a quiz attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptConfig {
    pub tick_interval: Duration,
    pub low_time_threshold_secs: u32,
}

impl Default for AttemptConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(1),
            low_time_threshold_secs: 60,
        }
    }
}

impl AttemptConfig {
    #[must_use]
    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval;
        self
    }

    #[must_use]
    pub fn with_low_time_threshold(mut self, secs: u32) -> Self {
        self.low_time_threshold_secs = secs;
        self
    }
}

/// Opens quiz attempts: load, wire the countdown and submission pipeline.
#[derive(Clone)]
pub struct QuizAttemptService {
    clock: Clock,
    backend: Backend,
    context: AttemptContext,
    config: AttemptConfig,
}

impl QuizAttemptService {
    #[must_use]
    pub fn new(clock: Clock, backend: Backend, context: AttemptContext) -> Self {
        Self {
            clock,
            backend,
            context,
            config: AttemptConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: AttemptConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn config(&self) -> AttemptConfig {
        self.config
    }

    /// Load `quiz_id` and start its countdown when the quiz is timed.
    ///
    /// On a load failure the navigator is sent back to the listing with a message
    /// before the error is returned.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotFound`, `SessionError::Network` or
    /// `SessionError::InvalidQuiz` when the quiz cannot be opened.
    pub async fn begin(&self, quiz_id: &QuizId) -> Result<QuizAttempt, SessionError> {
        let store = SessionStore::new(Arc::clone(&self.backend.quizzes), self.clock.clone());
        let quiz = match store.load_quiz(quiz_id).await {
            Ok(quiz) => quiz,
            Err(err) => {
                tracing::warn!(quiz = %quiz_id, error = %err, "could not open quiz");
                self.context.navigator().to_listing(&listing_message(&err));
                return Err(err);
            }
        };

        let pipeline = SubmissionPipeline::new(
            Arc::clone(&self.backend.grading),
            self.context.clone(),
        );
        let mut countdown =
            CountdownController::new(store.clone(), pipeline.clone(), self.config.tick_interval);
        if let Some(limit) = quiz.time_limit_secs() {
            countdown.start(i64::from(limit))?;
        }

        Ok(QuizAttempt {
            store,
            pipeline,
            countdown,
            config: self.config,
            context: self.context.clone(),
        })
    }
}

fn listing_message(err: &SessionError) -> String {
    match err {
        SessionError::NotFound { .. } => "Quiz not found".to_owned(),
        SessionError::Network { detail } => {
            format!("Could not load the quiz ({detail}). Please try again.")
        }
        other => format!("Could not open the quiz: {other}"),
    }
}

/// A live attempt. Dropping it stops the countdown.
pub struct QuizAttempt {
    store: SessionStore,
    pipeline: SubmissionPipeline,
    countdown: CountdownController,
    config: AttemptConfig,
    context: AttemptContext,
}

impl QuizAttempt {
    #[must_use]
    pub fn user(&self) -> &CurrentUser {
        self.context.user()
    }

    #[must_use]
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.store.status()
    }

    /// Receiver notified on every status transition, including auto-submit.
    #[must_use]
    pub fn status_updates(&self) -> watch::Receiver<SessionStatus> {
        self.store.subscribe()
    }

    /// # Errors
    ///
    /// Returns a validation error for ids outside the quiz.
    pub fn select_answer(
        &self,
        question: &QuestionId,
        option: &OptionId,
    ) -> Result<bool, SessionError> {
        self.store.select_answer(question, option)
    }

    /// # Errors
    ///
    /// Returns a validation error if the option is not offered.
    pub fn select_current(&self, option: &OptionId) -> Result<bool, SessionError> {
        self.store.select_current(option)
    }

    /// # Errors
    ///
    /// Returns `ValidationError::IndexOutOfRange`.
    pub fn go_to(&self, index: usize) -> Result<(), SessionError> {
        self.store.go_to(index)
    }

    pub fn next(&self) -> bool {
        self.store.next()
    }

    pub fn previous(&self) -> bool {
        self.store.previous()
    }

    #[must_use]
    pub fn progress(&self) -> Progress {
        self.store.progress().unwrap_or(Progress {
            answered: 0,
            total: 0,
        })
    }

    #[must_use]
    pub fn question_map(&self) -> Vec<QuestionMapEntry> {
        self.store.read(QuizSession::question_map).unwrap_or_default()
    }

    #[must_use]
    pub fn unanswered(&self) -> Vec<usize> {
        self.store.read(QuizSession::unanswered).unwrap_or_default()
    }

    /// # Errors
    ///
    /// Returns `ValidationError::NotLoaded` only if the session was never created.
    pub fn snapshot(&self) -> Result<SessionSnapshot, SessionError> {
        self.store.snapshot(self.config.low_time_threshold_secs)
    }

    #[must_use]
    pub fn result(&self) -> Option<QuizResult> {
        self.store.read(|s| s.result().cloned()).ok().flatten()
    }

    #[must_use]
    pub fn can_submit(&self) -> bool {
        self.store.read(can_submit).unwrap_or(false)
    }

    /// Submit manually.
    ///
    /// Returns `Ok(None)` when another trigger already owns the submission; the
    /// guard violation is not an error for the caller.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Network` when grading fails. The attempt is then
    /// `Failed` and [`QuizAttempt::retry`] resubmits the same payload.
    pub async fn submit(&self) -> Result<Option<QuizResult>, SessionError> {
        match self.pipeline.submit(&self.store).await {
            Ok(result) => Ok(Some(result)),
            Err(err) if err.is_validation() => {
                tracing::debug!(error = %err, "submit ignored");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Resubmit after a failed submission. A no-op unless the attempt is `Failed`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Network` if grading fails again.
    pub async fn retry(&self) -> Result<Option<QuizResult>, SessionError> {
        if self.status() != SessionStatus::Failed {
            return Ok(None);
        }
        self.submit().await
    }

    /// Stop the countdown without submitting.
    pub fn stop_timer(&mut self) -> bool {
        self.countdown.stop()
    }

    #[must_use]
    pub fn timer_running(&self) -> bool {
        self.countdown.is_running()
    }

    /// Leave the quiz. The countdown is stopped before the attempt is discarded.
    pub fn leave(mut self) {
        self.countdown.stop();
        tracing::info!(status = ?self.store.status(), "left quiz attempt");
    }
}

impl std::fmt::Debug for QuizAttempt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuizAttempt")
            .field("status", &self.store.status())
            .field("countdown", &self.countdown)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
