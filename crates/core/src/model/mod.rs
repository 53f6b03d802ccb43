mod answer;
mod ids;
mod question;
mod quiz;
mod result;

pub use answer::{AnswerMap, Submission};
pub use ids::{AttemptId, OptionId, ParseIdError, QuestionId, QuizId};
pub use question::{AnswerOption, Question, QuestionDraft, QuestionKind};
pub use quiz::{Quiz, QuizDefinitionError, QuizDraft};
pub use result::QuizResult;
