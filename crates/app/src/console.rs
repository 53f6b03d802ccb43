//! Terminal implementations of the attempt collaborators and screen rendering.

use quiz_core::countdown::format_clock;
use quiz_core::model::{QuizId, QuizResult};
use services::{
    Navigator, NoticeLevel, Notifier, QuestionMapEntry, ResultsDisplay, SessionSnapshot,
    SessionStatus,
};

pub struct ConsoleNavigator;

impl Navigator for ConsoleNavigator {
    fn to_results(&self, quiz_id: &QuizId) {
        println!("--- results for {quiz_id} ---");
    }

    fn to_listing(&self, message: &str) {
        println!("{message}");
        println!("Returning to the quiz list.");
    }
}

pub struct ConsoleResults;

impl ResultsDisplay for ConsoleResults {
    fn present(&self, _quiz_id: &QuizId, result: &QuizResult) {
        println!();
        println!(
            "Score: {:.1}  ({} of {} correct, {:.0}%)",
            result.score,
            result.correct_answers,
            result.total_questions,
            result.percentage()
        );
        println!("Time taken: {}", format_clock(result.time_taken));
        if let Some(categories) = &result.category_scores {
            println!("By category:");
            for (name, score) in categories {
                println!("  {name}: {score:.1}");
            }
        }
        if let Some(details) = &result.question_results {
            println!("{} question results available.", details.len());
        }
    }
}

pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, level: NoticeLevel, message: &str) {
        let tag = match level {
            NoticeLevel::Info => "info",
            NoticeLevel::Warning => "warning",
            NoticeLevel::Error => "error",
        };
        eprintln!("[{tag}] {message}");
    }
}

pub fn render_question(snapshot: &SessionSnapshot) {
    println!();
    let clock = snapshot
        .remaining_secs
        .map(|secs| format!("  [{}]", format_clock(secs)))
        .unwrap_or_default();
    println!(
        "{}  question {}/{}  answered {}/{}{clock}",
        snapshot.quiz_title,
        snapshot.current_index + 1,
        snapshot.progress.total,
        snapshot.progress.answered,
        snapshot.progress.total,
    );
    println!("{}", snapshot.question.prompt());
    for (letter, option) in ('a'..='z').zip(snapshot.question.options()) {
        let marker = if snapshot.selected.as_ref() == Some(option.id()) {
            '*'
        } else {
            ' '
        };
        println!(" {marker}{letter}) {}", option.text());
    }
    match snapshot.status {
        SessionStatus::Failed => {
            if let Some(error) = &snapshot.last_error {
                println!("Last submission failed: {error}");
            }
            println!("Type r to retry.");
        }
        SessionStatus::Submitting => println!("Submitting..."),
        _ => {}
    }
}

pub fn render_map(map: &[QuestionMapEntry]) {
    let cells: Vec<String> = map
        .iter()
        .map(|entry| {
            let mark = if entry.answered { 'x' } else { ' ' };
            if entry.current {
                format!(">{}[{mark}]", entry.index + 1)
            } else {
                format!("{}[{mark}]", entry.index + 1)
            }
        })
        .collect();
    println!("{}", cells.join(" "));
}

pub fn print_help() {
    println!("a-z answer  n next  p previous  g <n> jump  m map  s submit  r retry  q quit");
}
