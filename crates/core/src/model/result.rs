use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Grading outcome returned by the scoring endpoint.
///
/// Passed to the results display as received; the optional breakdowns are not
/// interpreted here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizResult {
    pub score: f64,
    pub correct_answers: u32,
    pub total_questions: u32,
    /// Seconds, as accepted by the backend.
    pub time_taken: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_scores: Option<BTreeMap<String, f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_results: Option<Vec<serde_json::Value>>,
}

impl QuizResult {
    /// Share of correct answers in `[0, 100]`; zero for an empty quiz.
    #[must_use]
    pub fn percentage(&self) -> f64 {
        if self.total_questions == 0 {
            return 0.0;
        }
        f64::from(self.correct_answers) * 100.0 / f64::from(self.total_questions)
    }
}
