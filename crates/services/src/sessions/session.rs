use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;

use quiz_core::model::{
    AnswerMap, AttemptId, OptionId, Question, QuestionId, Quiz, QuizResult, Submission,
};
use quiz_core::{Countdown, Tick};

use crate::error::{SessionError, ValidationError};
use super::progress::{Progress, QuestionMapEntry, SessionSnapshot};

//
// ─── STATUS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// The quiz definition has not arrived yet; no session exists.
    Loading,
    Active,
    Submitting,
    Submitted,
    /// The last submission failed; answers and elapsed time are kept for a retry.
    Failed,
}

/// What a countdown tick did to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TickOutcome {
    Running { remaining: u32 },
    /// Time ran out. The session is already `Submitting` with this payload frozen.
    Expired(Submission),
    Inactive,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One student's in-progress attempt at a quiz.
///
/// Holds navigation, answers and the countdown. Performs no I/O; the store,
/// countdown controller and submission pipeline drive it.
pub struct QuizSession {
    attempt_id: AttemptId,
    quiz: Arc<Quiz>,
    current: usize,
    answers: AnswerMap,
    countdown: Countdown,
    status: SessionStatus,
    started_at: DateTime<Utc>,
    submitted_at: Option<DateTime<Utc>>,
    frozen: Option<Submission>,
    result: Option<QuizResult>,
    last_error: Option<String>,
}

impl QuizSession {
    /// Create an active session for a fully fetched quiz.
    #[must_use]
    pub fn new(quiz: Arc<Quiz>, started_at: DateTime<Utc>) -> Self {
        Self {
            attempt_id: AttemptId::random(),
            quiz,
            current: 0,
            answers: AnswerMap::new(),
            countdown: Countdown::new(),
            status: SessionStatus::Active,
            started_at,
            submitted_at: None,
            frozen: None,
            result: None,
            last_error: None,
        }
    }

    #[must_use]
    pub fn attempt_id(&self) -> AttemptId {
        self.attempt_id
    }

    #[must_use]
    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_question(&self) -> &Question {
        // `current` is always a valid index and quizzes are never empty.
        &self.quiz.questions()[self.current]
    }

    #[must_use]
    pub fn answers(&self) -> &AnswerMap {
        &self.answers
    }

    #[must_use]
    pub fn answer_for(&self, question: &QuestionId) -> Option<&OptionId> {
        self.answers.get(question)
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn submitted_at(&self) -> Option<DateTime<Utc>> {
        self.submitted_at
    }

    #[must_use]
    pub fn result(&self) -> Option<&QuizResult> {
        self.result.as_ref()
    }

    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Remaining seconds for a timed quiz; `None` when untimed.
    ///
    /// The full limit until the countdown has actually started.
    #[must_use]
    pub fn remaining_secs(&self) -> Option<u32> {
        let limit = self.quiz.time_limit_secs()?;
        if self.countdown.has_started() {
            Some(self.countdown.remaining())
        } else {
            Some(limit)
        }
    }

    //
    // ─── ANSWERS ──────────────────────────────────────────────────────────────
    //

    /// Select `option` for `question`, overwriting any earlier choice.
    ///
    /// Returns `Ok(false)` without touching the answers when the session is not
    /// active.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::UnknownQuestion` / `UnknownOption` if the ids do not
    /// belong to this quiz.
    pub fn select_answer(
        &mut self,
        question: &QuestionId,
        option: &OptionId,
    ) -> Result<bool, SessionError> {
        if self.status != SessionStatus::Active {
            tracing::debug!(
                attempt = %self.attempt_id,
                status = ?self.status,
                "ignoring answer outside an active session"
            );
            return Ok(false);
        }

        let q = self
            .quiz
            .question_by_id(question)
            .ok_or_else(|| ValidationError::UnknownQuestion(question.clone()))?;
        if !q.accepts(option) {
            return Err(ValidationError::UnknownOption {
                question: question.clone(),
                option: option.clone(),
            }
            .into());
        }

        self.answers.select(question.clone(), option.clone());
        Ok(true)
    }

    /// Select `option` for the question currently shown.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::UnknownOption` if the option is not offered.
    pub fn select_current(&mut self, option: &OptionId) -> Result<bool, SessionError> {
        let question = self.current_question().id().clone();
        self.select_answer(&question, option)
    }

    //
    // ─── NAVIGATION ───────────────────────────────────────────────────────────
    //

    /// Jump directly to `index`.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::IndexOutOfRange` and leaves the index unchanged.
    pub fn go_to(&mut self, index: usize) -> Result<(), SessionError> {
        let len = self.quiz.question_count();
        if index >= len {
            return Err(ValidationError::IndexOutOfRange { index, len }.into());
        }
        self.current = index;
        Ok(())
    }

    /// Move forward; no-op on the last question. Returns true if the index moved.
    pub fn next(&mut self) -> bool {
        if self.current + 1 < self.quiz.question_count() {
            self.current += 1;
            true
        } else {
            false
        }
    }

    /// Move back; no-op on the first question. Returns true if the index moved.
    pub fn previous(&mut self) -> bool {
        if self.current > 0 {
            self.current -= 1;
            true
        } else {
            false
        }
    }

    //
    // ─── DERIVED VIEWS ────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn progress(&self) -> Progress {
        Progress {
            answered: self.answers.answered_in(&self.quiz),
            total: self.quiz.question_count(),
        }
    }

    /// Indices of questions without an answer, in navigation order.
    #[must_use]
    pub fn unanswered(&self) -> Vec<usize> {
        self.quiz
            .questions()
            .iter()
            .enumerate()
            .filter(|(_, q)| !self.answers.contains(q.id()))
            .map(|(i, _)| i)
            .collect()
    }

    #[must_use]
    pub fn question_map(&self) -> Vec<QuestionMapEntry> {
        self.quiz
            .questions()
            .iter()
            .enumerate()
            .map(|(index, q)| QuestionMapEntry {
                index,
                question_id: q.id().clone(),
                answered: self.answers.contains(q.id()),
                current: index == self.current,
            })
            .collect()
    }

    #[must_use]
    pub fn snapshot(&self, low_time_threshold_secs: u32) -> SessionSnapshot {
        let question = self.current_question();
        let remaining_secs = self.remaining_secs();
        SessionSnapshot {
            attempt_id: self.attempt_id,
            quiz_title: self.quiz.title().to_owned(),
            status: self.status,
            current_index: self.current,
            question: question.clone(),
            selected: self.answers.get(question.id()).cloned(),
            progress: self.progress(),
            remaining_secs,
            running_low: self.status == SessionStatus::Active
                && remaining_secs.is_some_and(|r| r <= low_time_threshold_secs),
            last_error: self.last_error.clone(),
        }
    }

    //
    // ─── COUNTDOWN ────────────────────────────────────────────────────────────
    //

    pub(crate) fn start_countdown(&mut self, seconds: i64) -> Result<(), SessionError> {
        if self.status != SessionStatus::Active {
            return Err(ValidationError::NotActive.into());
        }
        self.countdown.start(seconds)?;
        Ok(())
    }

    pub(crate) fn stop_countdown(&mut self) -> bool {
        self.countdown.stop()
    }

    pub(crate) fn countdown_running(&self) -> bool {
        self.countdown.is_running()
    }

    /// Apply one countdown tick. Decrements only while active; the tick that reaches
    /// zero moves the session to `Submitting` before returning.
    pub(crate) fn tick(&mut self, now: DateTime<Utc>) -> TickOutcome {
        if self.status != SessionStatus::Active {
            self.countdown.stop();
            return TickOutcome::Inactive;
        }

        match self.countdown.tick() {
            Tick::Running { remaining } => TickOutcome::Running { remaining },
            Tick::Expired => match self.begin_submission(now) {
                Ok(submission) => TickOutcome::Expired(submission),
                Err(_) => TickOutcome::Inactive,
            },
            Tick::Inactive => TickOutcome::Inactive,
        }
    }

    //
    // ─── SUBMISSION ───────────────────────────────────────────────────────────
    //

    /// Guard and freeze the submission payload.
    ///
    /// Allowed from `Active` and `Failed`. A retry after failure reuses the payload
    /// frozen by the first attempt.
    pub(crate) fn begin_submission(
        &mut self,
        now: DateTime<Utc>,
    ) -> Result<Submission, SessionError> {
        match self.status {
            SessionStatus::Active | SessionStatus::Failed => {}
            SessionStatus::Submitting => return Err(ValidationError::AlreadySubmitting.into()),
            SessionStatus::Submitted => return Err(ValidationError::AlreadySubmitted.into()),
            SessionStatus::Loading => return Err(ValidationError::NotLoaded.into()),
        }

        let submission = match &self.frozen {
            Some(frozen) => frozen.clone(),
            None => {
                let submission = Submission {
                    answers: self.answers.clone(),
                    time_taken: self.elapsed_secs(now),
                };
                self.frozen = Some(submission.clone());
                self.submitted_at = Some(now);
                submission
            }
        };
        self.countdown.stop();

        self.status = SessionStatus::Submitting;
        self.last_error = None;
        Ok(submission)
    }

    pub(crate) fn complete_submission(&mut self, result: QuizResult) {
        self.status = SessionStatus::Submitted;
        self.result = Some(result);
    }

    pub(crate) fn fail_submission(&mut self, detail: String) {
        self.status = SessionStatus::Failed;
        self.last_error = Some(detail);
    }

    fn elapsed_secs(&self, now: DateTime<Utc>) -> u32 {
        match self.quiz.time_limit_secs() {
            Some(limit) => limit.saturating_sub(self.remaining_secs().unwrap_or(limit)),
            None => {
                let secs = (now - self.started_at).num_seconds().max(0);
                u32::try_from(secs).unwrap_or(u32::MAX)
            }
        }
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("attempt_id", &self.attempt_id)
            .field("quiz_id", self.quiz.id())
            .field("current", &self.current)
            .field("answers_len", &self.answers.len())
            .field("status", &self.status)
            .field("remaining_secs", &self.remaining_secs())
            .field("started_at", &self.started_at)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
