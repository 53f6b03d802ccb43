use gateway::{GatewayError, GradingService, HttpBackend, HttpBackendConfig, QuizSource};
use mockito::Matcher;
use quiz_core::model::{AnswerMap, OptionId, QuestionId, QuizId, Submission};
use serde_json::json;

const QUIZ_BODY: &str = r#"{
    "id": "quiz-1",
    "title": "Photosynthesis",
    "description": "Chapter 3",
    "time_limit": 1,
    "questions": [
        {"id": "q1", "question_text": "Where does it happen?", "question_type": "multiple_choice",
         "options": [{"id": "a", "text": "Roots"}, {"id": "b", "text": "Chloroplast"}]},
        {"id": "q2", "question_text": "Main output?", "question_type": "multiple_choice",
         "options": [{"id": "a", "text": "Oxygen"}, {"id": "b", "text": "Nitrogen"}]}
    ]
}"#;

fn backend(url: &str, token: Option<&str>) -> HttpBackend {
    let config = HttpBackendConfig::new(url)
        .unwrap()
        .with_token(token.map(str::to_owned));
    HttpBackend::new(config).unwrap()
}

#[tokio::test]
async fn fetch_quiz_decodes_definition_and_sends_token() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/quizzes/quiz-1")
        .match_header("authorization", "Bearer secret")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(QUIZ_BODY)
        .create_async()
        .await;

    let quiz = backend(&server.url(), Some("secret"))
        .fetch_quiz(&QuizId::new("quiz-1"))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(quiz.title(), "Photosynthesis");
    assert_eq!(quiz.question_count(), 2);
    assert_eq!(quiz.time_limit_secs(), Some(60));
}

#[tokio::test]
async fn fetch_quiz_maps_404_to_not_found() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/quizzes/missing")
        .with_status(404)
        .with_body(r#"{"detail": "Quiz not found"}"#)
        .create_async()
        .await;

    let err = backend(&server.url(), None)
        .fetch_quiz(&QuizId::new("missing"))
        .await
        .unwrap_err();
    assert_eq!(err, GatewayError::NotFound);
}

#[tokio::test]
async fn fetch_quiz_rejects_invalid_definitions() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/quizzes/empty")
        .with_status(200)
        .with_body(r#"{"id": "empty", "title": "Empty", "time_limit": 5, "questions": []}"#)
        .create_async()
        .await;

    let err = backend(&server.url(), None)
        .fetch_quiz(&QuizId::new("empty"))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::InvalidDefinition(_)));
}

#[tokio::test]
async fn submit_posts_answers_and_time_taken() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/quizzes/quiz-1/submit")
        .match_body(Matcher::Json(json!({
            "answers": {"q1": "b", "q2": "a"},
            "time_taken": 20
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"score": 100, "correct_answers": 2, "total_questions": 2, "time_taken": 20,
                "category_scores": {"biology": 100.0}}"#,
        )
        .create_async()
        .await;

    let submission = Submission {
        answers: AnswerMap::from([
            (QuestionId::new("q1"), OptionId::new("b")),
            (QuestionId::new("q2"), OptionId::new("a")),
        ]),
        time_taken: 20,
    };
    let result = backend(&server.url(), None)
        .submit(&QuizId::new("quiz-1"), &submission)
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(result.correct_answers, 2);
    assert!(result.category_scores.is_some());
}

#[tokio::test]
async fn submit_surfaces_server_detail() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/quizzes/quiz-1/submit")
        .with_status(500)
        .with_body(r#"{"detail": "Failed to grade quiz: upstream timeout"}"#)
        .create_async()
        .await;

    let submission = Submission {
        answers: AnswerMap::new(),
        time_taken: 60,
    };
    let err = backend(&server.url(), None)
        .submit(&QuizId::new("quiz-1"), &submission)
        .await
        .unwrap_err();

    assert_eq!(
        err,
        GatewayError::Status {
            status: 500,
            detail: Some("Failed to grade quiz: upstream timeout".into()),
        }
    );
}

#[tokio::test]
async fn unreachable_backend_is_a_transport_error() {
    // Port 9 (discard) on localhost is not expected to accept HTTP.
    let err = backend("http://127.0.0.1:9", None)
        .fetch_quiz(&QuizId::new("quiz-1"))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Transport(_)));
}
