use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::error::SessionError;
use super::session::{QuizSession, TickOutcome};
use super::store::SessionStore;
use super::submission::SubmissionPipeline;

/// Drives the session countdown from a single repeating timer task.
///
/// Stopping or dropping the controller aborts the timer; no tick or auto-submit
/// fires afterwards. A submission already handed to the pipeline keeps running on
/// its own task.
pub struct CountdownController {
    store: SessionStore,
    pipeline: SubmissionPipeline,
    period: Duration,
    task: Option<JoinHandle<()>>,
}

impl CountdownController {
    #[must_use]
    pub fn new(store: SessionStore, pipeline: SubmissionPipeline, period: Duration) -> Self {
        Self {
            store,
            pipeline,
            period,
            task: None,
        }
    }

    /// Start counting down from `seconds`. Must be called within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidDuration` if `seconds <= 0`, and a validation
    /// error if the countdown already ran or the session is not active.
    pub fn start(&mut self, seconds: i64) -> Result<(), SessionError> {
        self.store.write(|s| s.start_countdown(seconds))??;

        let store = self.store.clone();
        let pipeline = self.pipeline.clone();
        let period = self.period;
        self.task = Some(tokio::spawn(run(store, pipeline, period)));
        tracing::debug!(seconds, ?period, "countdown started");
        Ok(())
    }

    /// Cancel the timer. Returns true if a countdown was stopped by this call.
    pub fn stop(&mut self) -> bool {
        let stopped = self
            .store
            .write(QuizSession::stop_countdown)
            .unwrap_or(false);
        if let Some(task) = self.task.take() {
            task.abort();
        }
        if stopped {
            tracing::debug!("countdown stopped");
        }
        stopped
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.store
            .read(QuizSession::countdown_running)
            .unwrap_or(false)
    }
}

impl Drop for CountdownController {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for CountdownController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CountdownController")
            .field("period", &self.period)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

async fn run(store: SessionStore, pipeline: SubmissionPipeline, period: Duration) {
    let mut ticks = tokio::time::interval_at(Instant::now() + period, period);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticks.tick().await;
        let now = store.clock().now();
        match store.write(|s| s.tick(now)) {
            Ok(TickOutcome::Running { remaining }) => {
                tracing::trace!(remaining, "countdown tick");
            }
            Ok(TickOutcome::Expired(submission)) => {
                tracing::info!("time is up, submitting automatically");
                // The timer task ends here; grading runs detached so stopping the
                // controller cannot cancel it.
                tokio::spawn(async move {
                    if let Err(err) = pipeline.dispatch(&store, submission).await {
                        tracing::debug!(error = %err, "auto-submit did not complete");
                    }
                });
                return;
            }
            Ok(TickOutcome::Inactive) | Err(_) => return,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{AttemptContext, CurrentUser};
    use crate::sessions::SessionStatus;
    use gateway::InMemoryBackend;
    use quiz_core::model::{
        AnswerOption, OptionId, QuestionDraft, QuestionId, QuestionKind, QuizDraft, QuizId,
    };
    use quiz_core::time::fixed_clock;
    use std::sync::Arc;

    async fn controller(minutes: i64) -> (InMemoryBackend, SessionStore, CountdownController) {
        let backend = InMemoryBackend::new();
        backend.insert_quiz(
            QuizDraft {
                id: QuizId::new("quiz-1"),
                title: "Timed".into(),
                description: String::new(),
                time_limit_minutes: Some(minutes),
                questions: vec![QuestionDraft {
                    id: QuestionId::new("q1"),
                    prompt: "Pick one".into(),
                    kind: QuestionKind::MultipleChoice {
                        options: vec![AnswerOption::new(OptionId::new("a"), "A")],
                    },
                }],
            }
            .validate()
            .unwrap(),
        );
        let store = SessionStore::new(Arc::new(backend.clone()), fixed_clock());
        store.load_quiz(&QuizId::new("quiz-1")).await.unwrap();
        let pipeline = SubmissionPipeline::new(
            Arc::new(backend.clone()),
            AttemptContext::silent(CurrentUser::new("Ada")),
        );
        let controller = CountdownController::new(store.clone(), pipeline, Duration::from_secs(1));
        (backend, store, controller)
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_once_per_period() {
        let (_backend, store, mut countdown) = controller(1).await;
        countdown.start(60).unwrap();
        assert!(countdown.is_running());

        tokio::time::sleep(Duration::from_millis(10_500)).await;
        assert_eq!(store.read(QuizSession::remaining_secs).unwrap(), Some(50));
    }

    #[tokio::test(start_paused = true)]
    async fn rejects_non_positive_duration() {
        let (_backend, _store, mut countdown) = controller(1).await;
        assert_eq!(
            countdown.start(0).unwrap_err(),
            SessionError::InvalidDuration { seconds: 0 }
        );
        assert_eq!(
            countdown.start(-5).unwrap_err(),
            SessionError::InvalidDuration { seconds: -5 }
        );
        assert!(!countdown.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_is_idempotent_and_silences_the_timer() {
        let (backend, store, mut countdown) = controller(1).await;
        countdown.start(60).unwrap();
        tokio::time::sleep(Duration::from_millis(5_500)).await;

        assert!(countdown.stop());
        assert!(!countdown.stop());
        assert!(!countdown.is_running());

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(store.read(QuizSession::remaining_secs).unwrap(), Some(55));
        assert_eq!(store.status(), SessionStatus::Active);
        assert!(backend.submissions().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_before_start_keeps_the_full_limit() {
        let (backend, store, mut countdown) = controller(1).await;
        assert!(countdown.stop());
        assert_eq!(store.read(QuizSession::remaining_secs).unwrap(), Some(60));

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(store.snapshot(30).unwrap().remaining_secs, Some(60));
        assert!(backend.submissions().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn expiry_submits_exactly_once() {
        let (backend, store, mut countdown) = controller(1).await;
        countdown.start(60).unwrap();

        tokio::time::sleep(Duration::from_millis(59_500)).await;
        assert_eq!(store.read(QuizSession::remaining_secs).unwrap(), Some(1));
        assert!(backend.submissions().is_empty());

        tokio::time::sleep(Duration::from_secs(30)).await;
        let calls = backend.submissions();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1.time_taken, 60);
        assert!(calls[0].1.answers.is_empty());
        assert_eq!(store.status(), SessionStatus::Submitted);
    }
}
