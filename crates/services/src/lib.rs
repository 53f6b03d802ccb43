#![forbid(unsafe_code)]

pub mod context;
pub mod error;
pub mod sessions;

pub use quiz_core::Clock;

pub use context::{
    AttemptContext, CurrentUser, Navigator, NoticeLevel, Notifier, ResultsDisplay, Silent,
};
pub use error::{SessionError, ValidationError};

pub use sessions::{
    AttemptConfig, CountdownController, Progress, QuestionMapEntry, QuizAttempt,
    QuizAttemptService, QuizSession, SessionSnapshot, SessionStatus, SessionStore,
    SubmissionPipeline,
};
