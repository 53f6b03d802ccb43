use std::sync::Arc;

use gateway::GradingService;
use quiz_core::model::{QuizResult, Submission};

use crate::context::{AttemptContext, NoticeLevel};
use crate::error::SessionError;
use super::session::{QuizSession, SessionStatus};
use super::store::SessionStore;

/// Packages a session's answers and elapsed time and sends them for grading.
#[derive(Clone)]
pub struct SubmissionPipeline {
    grading: Arc<dyn GradingService>,
    context: AttemptContext,
}

impl SubmissionPipeline {
    #[must_use]
    pub fn new(grading: Arc<dyn GradingService>, context: AttemptContext) -> Self {
        Self { grading, context }
    }

    /// Guard, freeze the payload and grade it.
    ///
    /// The session is `Submitting` before the grading call is issued, so a second
    /// trigger arriving while this one is in flight fails the guard.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Validation` when the guard rejects the call (already
    /// submitting or submitted, or nothing loaded), and `SessionError::Network`
    /// when grading fails. On failure the session is `Failed` with its answers
    /// and elapsed time preserved.
    pub async fn submit(&self, store: &SessionStore) -> Result<QuizResult, SessionError> {
        let now = store.clock().now();
        let submission = store.write(|s| s.begin_submission(now))??;
        self.dispatch(store, submission).await
    }

    /// Issue the grading call for a payload that already passed the guard.
    pub(crate) async fn dispatch(
        &self,
        store: &SessionStore,
        submission: Submission,
    ) -> Result<QuizResult, SessionError> {
        let (quiz_id, attempt) = store.read(|s| (s.quiz().id().clone(), s.attempt_id()))?;
        tracing::info!(
            %attempt,
            quiz = %quiz_id,
            answered = submission.answers.len(),
            time_taken = submission.time_taken,
            "submitting attempt"
        );

        match self.grading.submit(&quiz_id, &submission).await {
            Ok(result) => {
                store.write(|s| s.complete_submission(result.clone()))?;
                tracing::info!(
                    %attempt,
                    score = result.score,
                    correct = result.correct_answers,
                    total = result.total_questions,
                    "attempt graded"
                );
                self.context.results().present(&quiz_id, &result);
                self.context.navigator().to_results(&quiz_id);
                Ok(result)
            }
            Err(err) => {
                let err = SessionError::from_gateway(&quiz_id, err);
                let detail = err.to_string();
                store.write(|s| s.fail_submission(detail.clone()))?;
                tracing::warn!(%attempt, error = %detail, "submission failed");
                self.context.notifier().notify(
                    NoticeLevel::Error,
                    &format!("Submission failed: {detail}. Your answers are saved; retry when ready."),
                );
                Err(err)
            }
        }
    }
}

impl std::fmt::Debug for SubmissionPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmissionPipeline")
            .field("user", self.context.user())
            .finish_non_exhaustive()
    }
}

/// Whether `session` would pass the submission guard right now.
pub(crate) fn can_submit(session: &QuizSession) -> bool {
    matches!(
        session.status(),
        SessionStatus::Active | SessionStatus::Failed
    )
}
