//! Session behavior driven through the orchestrator.

use super::common::music_db;
use db_chat::app::{Orchestrator, TurnOutcome};
use db_chat::llm::{FailingLlmClient, MockLlmClient, Role};
use db_chat::session::{Session, GREETING};
use pretty_assertions::assert_eq;

#[tokio::test]
async fn test_log_grows_by_two_per_turn() {
    let (_dir, config) = music_db().await;
    let orchestrator = Orchestrator::new(Box::new(MockLlmClient::new()));
    let mut session = Session::new();
    orchestrator.connect(&mut session, &config).await;

    let questions = [
        "How many rows are in the album table?",
        "Show me the artist table",
        "How many artist rows are there?",
    ];
    for question in questions {
        orchestrator.handle_input(&mut session, question).await;
    }

    let messages = session.messages();
    assert_eq!(messages.len(), 1 + 2 * questions.len());
    assert_eq!(messages[0].content, GREETING);
    for (i, question) in questions.iter().enumerate() {
        assert_eq!(messages[1 + 2 * i].role, Role::User);
        assert_eq!(&messages[1 + 2 * i].content, question);
        assert_eq!(messages[2 + 2 * i].role, Role::Assistant);
    }
}

#[tokio::test]
async fn test_no_handle_skips_the_assistant() {
    let llm = FailingLlmClient::always();
    let calls = llm.call_counter();
    let orchestrator = Orchestrator::new(Box::new(llm));
    let mut session = Session::new();

    let outcome = orchestrator.handle_input(&mut session, "How many albums?").await;

    assert!(matches!(outcome, TurnOutcome::NotConnected));
    assert_eq!(session.messages().len(), 2);
    assert_eq!(session.messages()[1].content, "How many albums?");
    assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_failed_turns_still_grow_the_log() {
    let (_dir, config) = music_db().await;
    let orchestrator = Orchestrator::new(Box::new(FailingLlmClient::always()));
    let mut session = Session::new();
    orchestrator.connect(&mut session, &config).await;

    orchestrator.handle_input(&mut session, "first").await;
    orchestrator.handle_input(&mut session, "second").await;

    assert_eq!(session.messages().len(), 5);
    assert_eq!(session.messages()[3].content, "second");
}

#[tokio::test]
async fn test_reconnect_replaces_handle() {
    let (_dir_a, first) = music_db().await;
    let (_dir_b, second) = music_db().await;
    let orchestrator = Orchestrator::new(Box::new(MockLlmClient::new()));
    let mut session = Session::new();

    orchestrator.connect(&mut session, &first).await;
    orchestrator.connect(&mut session, &second).await;

    assert_eq!(
        session.handle().unwrap().display_string(),
        second.display_string()
    );
    orchestrator.shutdown(&mut session).await;
    assert!(!session.is_connected());
}
