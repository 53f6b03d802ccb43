use std::fmt;
use std::sync::Arc;

use gateway::{Backend, HttpBackend, HttpBackendConfig};
use quiz_core::model::{OptionId, QuizId};
use services::{
    AttemptContext, Clock, CurrentUser, QuizAttempt, QuizAttemptService, SessionStatus,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

mod console;

use console::{ConsoleNavigator, ConsoleNotifier, ConsoleResults};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    MissingQuiz,
    InvalidQuizId { raw: String },
    HelpRequested,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::MissingQuiz => write!(f, "no quiz given (use --quiz or QUIZ_ID)"),
            ArgsError::InvalidQuizId { raw } => write!(f, "invalid --quiz value: {raw:?}"),
            ArgsError::HelpRequested => write!(f, "help requested"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- take --quiz <id> [--api <url>] [--token <token>] [--user <name>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --api http://localhost:8000");
    eprintln!("  --user Student");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_ID, QUIZ_API_URL, QUIZ_API_TOKEN, QUIZ_API_TIMEOUT_SECS, QUIZ_USER, RUST_LOG");
}

#[derive(Debug)]
struct Args {
    quiz_id: QuizId,
    api_url: Option<String>,
    token: Option<String>,
    user: String,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut quiz = std::env::var("QUIZ_ID").ok();
        let mut api_url = None;
        let mut token = None;
        let mut user = std::env::var("QUIZ_USER").unwrap_or_else(|_| "Student".into());

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--quiz" => quiz = Some(require_value(args, "--quiz")?),
                "--api" => api_url = Some(require_value(args, "--api")?),
                "--token" => token = Some(require_value(args, "--token")?),
                "--user" => user = require_value(args, "--user")?,
                "--help" | "-h" => return Err(ArgsError::HelpRequested),
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        let raw = quiz.ok_or(ArgsError::MissingQuiz)?;
        let quiz_id = raw
            .parse::<QuizId>()
            .map_err(|_| ArgsError::InvalidQuizId { raw: raw.clone() })?;
        Ok(Self {
            quiz_id,
            api_url,
            token,
            user,
        })
    }
}

/// One line typed during an attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Input {
    Answer(usize),
    Next,
    Previous,
    Jump(usize),
    Map,
    Submit,
    Retry,
    Quit,
    Help,
}

fn parse_input(line: &str) -> Option<Input> {
    let line = line.trim();
    let mut parts = line.split_whitespace();
    let head = parts.next()?;
    let input = match head {
        "n" => Input::Next,
        "p" => Input::Previous,
        "m" => Input::Map,
        "s" => Input::Submit,
        "r" => Input::Retry,
        "q" => Input::Quit,
        "h" | "?" => Input::Help,
        "g" => {
            let position: usize = parts.next()?.parse().ok()?;
            Input::Jump(position.checked_sub(1)?)
        }
        letter if letter.len() == 1 => {
            let c = letter.chars().next()?;
            if !c.is_ascii_lowercase() {
                return None;
            }
            Input::Answer(usize::from(c as u8 - b'a'))
        }
        _ => return None,
    };
    if parts.next().is_some() {
        return None;
    }
    Some(input)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();
    let first = argv.first().cloned();
    match first.as_deref() {
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some("take") => {
            argv.remove(0);
        }
        Some(first) if !first.starts_with("--") => {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            return Err(Box::new(ArgsError::UnknownArg(first.to_owned())));
        }
        _ => {}
    }

    let parsed = match Args::parse(&mut argv.into_iter()) {
        Ok(parsed) => parsed,
        Err(ArgsError::HelpRequested) => {
            print_usage();
            return Ok(());
        }
        Err(e) => {
            eprintln!("{e}");
            print_usage();
            return Err(Box::new(e));
        }
    };

    let config = match &parsed.api_url {
        Some(url) => HttpBackendConfig::new(url)?.with_env_overrides()?,
        None => HttpBackendConfig::from_env()?,
    };
    let config = match &parsed.token {
        Some(token) => config.with_token(Some(token.clone())),
        None => config,
    };
    tracing::info!(api = %config.base_url, quiz = %parsed.quiz_id, "starting attempt");
    let backend = Backend::http(HttpBackend::new(config)?);

    let context = AttemptContext::new(
        CurrentUser::new(parsed.user.clone()),
        Arc::new(ConsoleNavigator),
        Arc::new(ConsoleResults),
        Arc::new(ConsoleNotifier),
    );
    let service = QuizAttemptService::new(Clock::default(), backend, context);

    // Load failures were already reported through the navigator.
    let Ok(attempt) = service.begin(&parsed.quiz_id).await else {
        std::process::exit(1);
    };
    println!("Welcome, {}.", attempt.user().display_name());
    console::print_help();

    drive(attempt).await
}

async fn drive(attempt: QuizAttempt) -> Result<(), Box<dyn std::error::Error>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut updates = attempt.status_updates();
    let mut clock = tokio::time::interval(std::time::Duration::from_secs(1));
    let mut warned_low = false;

    console::render_question(&attempt.snapshot()?);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if !handle_input(&attempt, &line).await? {
                    break;
                }
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let status = *updates.borrow_and_update();
                match status {
                    SessionStatus::Submitted => break,
                    SessionStatus::Failed => console::render_question(&attempt.snapshot()?),
                    _ => {}
                }
            }
            _ = clock.tick() => {
                let snapshot = attempt.snapshot()?;
                if snapshot.running_low && !warned_low {
                    warned_low = true;
                    if let Some(secs) = snapshot.remaining_secs {
                        println!("{} left!", quiz_core::countdown::format_clock(secs));
                    }
                }
            }
        }
    }

    attempt.leave();
    Ok(())
}

/// Returns false when the attempt is over.
async fn handle_input(
    attempt: &QuizAttempt,
    line: &str,
) -> Result<bool, Box<dyn std::error::Error>> {
    let Some(input) = parse_input(line) else {
        if !line.trim().is_empty() {
            println!("Unrecognised input. Type h for help.");
        }
        return Ok(true);
    };

    match input {
        Input::Answer(index) => {
            let snapshot = attempt.snapshot()?;
            match snapshot.question.options().get(index) {
                Some(option) => {
                    let option: OptionId = option.id().clone();
                    if !attempt.select_current(&option)? {
                        println!("Answers can no longer be changed.");
                    }
                }
                None => println!("No such option."),
            }
        }
        Input::Next => {
            attempt.next();
        }
        Input::Previous => {
            attempt.previous();
        }
        Input::Jump(index) => {
            if let Err(err) = attempt.go_to(index) {
                println!("{err}");
            }
        }
        Input::Map => {
            console::render_map(&attempt.question_map());
            return Ok(true);
        }
        Input::Submit => {
            let unanswered = attempt.unanswered();
            if !unanswered.is_empty() {
                let list: Vec<String> = unanswered.iter().map(|i| (i + 1).to_string()).collect();
                println!("Unanswered: {}", list.join(", "));
            }
            return Ok(!matches!(attempt.submit().await, Ok(Some(_))));
        }
        Input::Retry => {
            return Ok(!matches!(attempt.retry().await, Ok(Some(_))));
        }
        Input::Quit => return Ok(false),
        Input::Help => {
            console::print_help();
            return Ok(true);
        }
    }

    console::render_question(&attempt.snapshot()?);
    Ok(true)
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_key_commands() {
        assert_eq!(parse_input("n"), Some(Input::Next));
        assert_eq!(parse_input(" p "), Some(Input::Previous));
        assert_eq!(parse_input("s"), Some(Input::Submit));
        assert_eq!(parse_input("a"), Some(Input::Answer(0)));
        assert_eq!(parse_input("d"), Some(Input::Answer(3)));
        assert_eq!(parse_input("A"), None);
        assert_eq!(parse_input(""), None);
    }

    #[test]
    fn jump_is_one_based() {
        assert_eq!(parse_input("g 3"), Some(Input::Jump(2)));
        assert_eq!(parse_input("g 0"), None);
        assert_eq!(parse_input("g x"), None);
        assert_eq!(parse_input("g 1 2"), None);
    }

    #[test]
    fn help_flag_is_reported_not_handled() {
        let mut args = vec!["--quiz".to_owned(), "7".to_owned(), "--help".to_owned()].into_iter();
        assert!(matches!(
            Args::parse(&mut args),
            Err(ArgsError::HelpRequested)
        ));

        let mut args = vec!["-h".to_owned()].into_iter();
        assert!(matches!(
            Args::parse(&mut args),
            Err(ArgsError::HelpRequested)
        ));
    }

    #[test]
    fn args_require_a_quiz() {
        let mut args = vec!["--quiz".to_owned()].into_iter();
        assert!(matches!(
            Args::parse(&mut args),
            Err(ArgsError::MissingValue { flag: "--quiz" })
        ));

        let mut args = vec!["--quiz".to_owned(), "  ".to_owned()].into_iter();
        assert!(matches!(
            Args::parse(&mut args),
            Err(ArgsError::InvalidQuizId { .. })
        ));

        let mut args = vec![
            "--quiz".to_owned(),
            "42".to_owned(),
            "--user".to_owned(),
            "Ada".to_owned(),
        ]
        .into_iter();
        let parsed = Args::parse(&mut args).unwrap();
        assert_eq!(parsed.quiz_id, QuizId::new("42"));
        assert_eq!(parsed.user, "Ada");
    }
}
