//! Assistant round trips against a real SQLite database.

use super::common::{music_db, ALBUM_ROWS, ARTIST_ROWS};
use db_chat::assistant::{SqlAssistant, TurnError, GENERIC_ERROR_MESSAGE};
use db_chat::connection::Connector;
use db_chat::llm::{Conversation, FailingLlmClient, MockLlmClient};
use pretty_assertions::assert_eq;

fn ask(question: &str) -> Conversation {
    let mut history = Conversation::new();
    history.add_assistant("Hello!");
    history.add_user(question);
    history
}

fn digits(text: &str) -> String {
    text.chars().filter(char::is_ascii_digit).collect()
}

#[tokio::test]
async fn test_row_count_round_trip() {
    let (_dir, config) = music_db().await;
    let handle = Connector::new().connect(&config).await.unwrap();
    let assistant = SqlAssistant::new(Box::new(MockLlmClient::new()));

    for (question, expected) in [
        ("How many rows are in the album table?", ALBUM_ROWS),
        ("How many rows are in the artist table?", ARTIST_ROWS),
    ] {
        let answer = assistant
            .generate_response(question, &handle, &ask(question))
            .await
            .unwrap();
        assert_eq!(digits(&answer), expected.to_string(), "answer: {answer}");
    }
}

#[tokio::test]
async fn test_generated_sql_names_the_table() {
    let (_dir, config) = music_db().await;
    let handle = Connector::new().connect(&config).await.unwrap();
    let assistant = SqlAssistant::new(Box::new(MockLlmClient::new()));

    let sql = assistant
        .generate_sql(&handle, &ask("Show me the artist names"))
        .await
        .unwrap();
    assert_eq!(sql, "SELECT * FROM artist LIMIT 10");
}

#[tokio::test]
async fn test_bad_sql_is_an_execution_failure() {
    let (_dir, config) = music_db().await;
    let handle = Connector::new().connect(&config).await.unwrap();
    let llm = MockLlmClient::new().with_response("write only the sql", "SELEC nonsense");
    let assistant = SqlAssistant::new(Box::new(llm));

    let question = "anything";
    let err = assistant
        .generate_response(question, &handle, &ask(question))
        .await
        .unwrap_err();

    match err {
        TurnError::Execution { ref sql, .. } => assert_eq!(sql, "SELEC nonsense"),
        other => panic!("expected execution failure, got {other:?}"),
    }
    assert_eq!(err.cause().category(), "Query Error");

    let answer = assistant.answer(question, &handle, &ask(question)).await;
    assert_eq!(answer, GENERIC_ERROR_MESSAGE);
}

#[tokio::test]
async fn test_model_failure_yields_generic_message() {
    let (_dir, config) = music_db().await;
    let handle = Connector::new().connect(&config).await.unwrap();

    for llm in [FailingLlmClient::always(), FailingLlmClient::after(1)] {
        let assistant = SqlAssistant::new(Box::new(llm));
        let answer = assistant
            .answer("How many albums?", &handle, &ask("How many albums?"))
            .await;
        assert_eq!(answer, GENERIC_ERROR_MESSAGE);
    }
}
