use crate::model::ids::{OptionId, QuestionId};

//
// ─── OPTIONS ───────────────────────────────────────────────────────────────────
//

/// A selectable answer for a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOption {
    id: OptionId,
    text: String,
}

impl AnswerOption {
    #[must_use]
    pub fn new(id: OptionId, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn id(&self) -> &OptionId {
        &self.id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}

//
// ─── QUESTION KINDS ────────────────────────────────────────────────────────────
//

/// How a question is answered.
///
/// New kinds get a variant here rather than a string tag checked at call sites.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionKind {
    /// Exactly one option is selected out of an ordered list.
    MultipleChoice { options: Vec<AnswerOption> },
}

impl QuestionKind {
    /// Wire tag used by the quiz backend.
    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            QuestionKind::MultipleChoice { .. } => "multiple_choice",
        }
    }
}

//
// ─── QUESTIONS ─────────────────────────────────────────────────────────────────
//

/// Unvalidated question, as received from the quiz content store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionDraft {
    pub id: QuestionId,
    pub prompt: String,
    pub kind: QuestionKind,
}

/// A question inside a validated [`Quiz`](crate::model::Quiz).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    prompt: String,
    kind: QuestionKind,
}

impl Question {
    pub(crate) fn from_draft(draft: QuestionDraft) -> Self {
        Self {
            id: draft.id,
            prompt: draft.prompt,
            kind: draft.kind,
        }
    }

    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn kind(&self) -> &QuestionKind {
        &self.kind
    }

    /// Options in display order.
    #[must_use]
    pub fn options(&self) -> &[AnswerOption] {
        match &self.kind {
            QuestionKind::MultipleChoice { options } => options,
        }
    }

    #[must_use]
    pub fn option(&self, id: &OptionId) -> Option<&AnswerOption> {
        self.options().iter().find(|option| option.id() == id)
    }

    /// Returns true if `option` is one of this question's options.
    #[must_use]
    pub fn accepts(&self, option: &OptionId) -> bool {
        self.option(option).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn multiple_choice() -> Question {
        Question::from_draft(QuestionDraft {
            id: QuestionId::new("q1"),
            prompt: "2 + 2?".into(),
            kind: QuestionKind::MultipleChoice {
                options: vec![
                    AnswerOption::new(OptionId::new("a"), "3"),
                    AnswerOption::new(OptionId::new("b"), "4"),
                ],
            },
        })
    }

    #[test]
    fn accepts_only_own_options() {
        let question = multiple_choice();
        assert!(question.accepts(&OptionId::new("b")));
        assert!(!question.accepts(&OptionId::new("z")));
    }

    #[test]
    fn options_keep_display_order() {
        let question = multiple_choice();
        let texts: Vec<_> = question.options().iter().map(AnswerOption::text).collect();
        assert_eq!(texts, ["3", "4"]);
        assert_eq!(question.kind().tag(), "multiple_choice");
    }
}
