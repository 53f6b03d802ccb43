mod countdown;
mod progress;
mod session;
mod store;
mod submission;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use countdown::CountdownController;
pub use progress::{Progress, QuestionMapEntry, SessionSnapshot};
pub use session::{QuizSession, SessionStatus};
pub use store::SessionStore;
pub use submission::SubmissionPipeline;
pub use workflow::{AttemptConfig, QuizAttempt, QuizAttemptService};
