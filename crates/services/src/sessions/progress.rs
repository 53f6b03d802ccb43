use quiz_core::model::{AttemptId, OptionId, Question, QuestionId};

use super::session::SessionStatus;

/// Answered versus total questions, derived on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub answered: usize,
    pub total: usize,
}

impl Progress {
    /// Completion in `[0, 1]`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.answered as f64 / self.total as f64
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.answered >= self.total
    }
}

/// One cell of the question map used for jump navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionMapEntry {
    pub index: usize,
    pub question_id: QuestionId,
    pub answered: bool,
    pub current: bool,
}

/// Owned copy of everything a quiz screen renders.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub attempt_id: AttemptId,
    pub quiz_title: String,
    pub status: SessionStatus,
    pub current_index: usize,
    pub question: Question,
    pub selected: Option<OptionId>,
    pub progress: Progress,
    pub remaining_secs: Option<u32>,
    pub running_low: bool,
    pub last_error: Option<String>,
}
