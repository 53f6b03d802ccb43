use std::sync::Arc;

use quiz_core::model::{QuizId, QuizResult};

/// The signed-in student, as reported by the identity provider. Display only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    display_name: String,
}

impl CurrentUser {
    #[must_use]
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
        }
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// Invoked on terminal states.
pub trait Navigator: Send + Sync {
    /// The attempt was graded; show its results.
    fn to_results(&self, quiz_id: &QuizId);
    /// The quiz could not be opened; go back to the listing with `message`.
    fn to_listing(&self, message: &str);
}

/// Receives the grading result exactly as returned by the backend.
pub trait ResultsDisplay: Send + Sync {
    fn present(&self, quiz_id: &QuizId, result: &QuizResult);
}

/// User-visible notices (toasts, banners, console lines).
pub trait Notifier: Send + Sync {
    fn notify(&self, level: NoticeLevel, message: &str);
}

/// Collaborators handed to an attempt explicitly instead of living in globals.
#[derive(Clone)]
pub struct AttemptContext {
    user: CurrentUser,
    navigator: Arc<dyn Navigator>,
    results: Arc<dyn ResultsDisplay>,
    notifier: Arc<dyn Notifier>,
}

impl AttemptContext {
    #[must_use]
    pub fn new(
        user: CurrentUser,
        navigator: Arc<dyn Navigator>,
        results: Arc<dyn ResultsDisplay>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            user,
            navigator,
            results,
            notifier,
        }
    }

    /// Context whose collaborators discard everything.
    #[must_use]
    pub fn silent(user: CurrentUser) -> Self {
        let silent = Arc::new(Silent);
        Self::new(user, silent.clone(), silent.clone(), silent)
    }

    #[must_use]
    pub fn user(&self) -> &CurrentUser {
        &self.user
    }

    #[must_use]
    pub fn navigator(&self) -> &dyn Navigator {
        self.navigator.as_ref()
    }

    #[must_use]
    pub fn results(&self) -> &dyn ResultsDisplay {
        self.results.as_ref()
    }

    #[must_use]
    pub fn notifier(&self) -> &dyn Notifier {
        self.notifier.as_ref()
    }
}

/// No-op collaborator for headless runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl Navigator for Silent {
    fn to_results(&self, _quiz_id: &QuizId) {}
    fn to_listing(&self, _message: &str) {}
}

impl ResultsDisplay for Silent {
    fn present(&self, _quiz_id: &QuizId, _result: &QuizResult) {}
}

impl Notifier for Silent {
    fn notify(&self, _level: NoticeLevel, _message: &str) {}
}
