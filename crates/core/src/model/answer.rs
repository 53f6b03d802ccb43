use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::ids::{OptionId, QuestionId};
use crate::model::quiz::Quiz;

/// Question → selected option associations for one attempt.
///
/// One entry per question; answering again overwrites.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerMap(BTreeMap<QuestionId, OptionId>);

impl AnswerMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `option` for `question`, returning the previously selected option.
    pub fn select(&mut self, question: QuestionId, option: OptionId) -> Option<OptionId> {
        self.0.insert(question, option)
    }

    #[must_use]
    pub fn get(&self, question: &QuestionId) -> Option<&OptionId> {
        self.0.get(question)
    }

    #[must_use]
    pub fn contains(&self, question: &QuestionId) -> bool {
        self.0.contains_key(question)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&QuestionId, &OptionId)> {
        self.0.iter()
    }

    /// Number of distinct answered questions that belong to `quiz`.
    #[must_use]
    pub fn answered_in(&self, quiz: &Quiz) -> usize {
        self.0
            .keys()
            .filter(|id| quiz.question_by_id(id).is_some())
            .count()
    }
}

impl<const N: usize> From<[(QuestionId, OptionId); N]> for AnswerMap {
    fn from(entries: [(QuestionId, OptionId); N]) -> Self {
        Self(BTreeMap::from(entries))
    }
}

/// Scoring request body: `{ answers: { [questionId]: optionId }, time_taken }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub answers: AnswerMap,
    /// Seconds.
    pub time_taken: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_overwrites_previous_answer() {
        let mut answers = AnswerMap::new();
        assert_eq!(answers.select(QuestionId::new("q1"), OptionId::new("a")), None);
        let previous = answers.select(QuestionId::new("q1"), OptionId::new("c"));
        assert_eq!(previous, Some(OptionId::new("a")));
        assert_eq!(answers.len(), 1);
        assert_eq!(answers.get(&QuestionId::new("q1")), Some(&OptionId::new("c")));
    }

    #[test]
    fn submission_serializes_to_wire_shape() {
        let submission = Submission {
            answers: AnswerMap::from([
                (QuestionId::new("q1"), OptionId::new("b")),
                (QuestionId::new("q2"), OptionId::new("a")),
            ]),
            time_taken: 20,
        };
        let value = serde_json::to_value(&submission).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "answers": { "q1": "b", "q2": "a" }, "time_taken": 20 })
        );
    }
}
