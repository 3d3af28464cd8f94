//! End-to-end conversation tests
//!
//! Drives conversations and whole practice sessions against mock providers,
//! so nothing here touches the network.

use agnes_core::{Role, RubricStore, Scenario, Scorer};
use agnes_llm::MockProvider;
use agnes_roleplay::{
    Coach, Conversation, ConversationError, PracticeConfig, PracticeSession, ReplyGenerator,
    ScriptedReplies, SessionError, Speaker, Submission, TextSource, TurnOutcome, TurnStart,
    DEFAULT_REPLY_BANK,
};
use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;

fn roof_store() -> RubricStore {
    RubricStore::new(vec![Scenario::new(
        "roof-1",
        Role::Homeowner,
        "I'm not sure my roof is actually damaged.",
        &["deductible", "insurance covers this", "no out of pocket"],
    )])
    .unwrap()
}

fn config(turns: u32) -> PracticeConfig {
    PracticeConfig::default().with_max_turns(turns)
}

/// Three answers to a three-turn scenario conclude it; a fourth is refused
#[tokio::test]
async fn test_three_turns_then_concluded() {
    let mut session = PracticeSession::start(&roof_store(), Role::Homeowner, &config(3), None)
        .unwrap();

    for answer in ["Your insurance covers this.", "You pay the deductible."] {
        assert!(matches!(
            session.submit(answer).await.unwrap(),
            TurnOutcome::Continue { .. }
        ));
    }

    let outcome = session
        .submit("So there is no out of pocket beyond that.")
        .await
        .unwrap();
    match outcome {
        TurnOutcome::Concluded { result, .. } => {
            assert_eq!(result.score, 100);
            assert!(result.passed);
        }
        other => panic!("expected conclusion, got {:?}", other),
    }

    let refused = session.submit("One more thing").await;
    assert!(matches!(
        refused,
        Err(SessionError::Conversation(ConversationError::NotAwaitingResponse))
    ));
    assert_eq!(session.conversation().unwrap().user_turns(), 3);
}

/// A provider that never answers in time still yields a full conversation
#[tokio::test]
async fn test_stalled_provider_uses_fallback_lines() {
    let provider = Arc::new(MockProvider::stalled(Duration::from_secs(5)));
    let replies = ReplyGenerator::generative(provider, Duration::from_millis(20));
    let mut session = PracticeSession::with_components(
        &roof_store(),
        Role::Homeowner,
        &config(3),
        replies,
        Coach::template_only(),
    )
    .unwrap();

    let mut sources = Vec::new();
    for answer in ["first", "second"] {
        match session.submit(answer).await.unwrap() {
            TurnOutcome::Continue { reply, .. } => sources.push((reply.source, reply.text)),
            other => panic!("expected reply, got {:?}", other),
        }
    }
    assert_eq!(
        sources,
        vec![
            (TextSource::Scripted, DEFAULT_REPLY_BANK[0].to_string()),
            (TextSource::Scripted, DEFAULT_REPLY_BANK[1].to_string()),
        ]
    );

    assert!(matches!(
        session.submit("third").await.unwrap(),
        TurnOutcome::Concluded { .. }
    ));

    let counterpart_lines = session
        .conversation()
        .unwrap()
        .history()
        .iter()
        .filter(|m| m.speaker == Speaker::Counterpart)
        .count();
    // Opening prompt plus two follow-ups
    assert_eq!(counterpart_lines, 3);
}

/// Failing providers never surface an error to the caller
#[tokio::test]
async fn test_failing_provider_completes_every_scenario() {
    let store = RubricStore::builtin().unwrap();
    let provider = Arc::new(MockProvider::failing());
    let mut session = PracticeSession::start(
        &store,
        Role::Adjuster,
        &config(2).with_reply_timeout(Duration::from_secs(1)),
        Some(provider.clone()),
    )
    .unwrap();

    while !session.is_complete() {
        session.submit("The code requires drip edge.").await.unwrap();
        match session.submit("Here are the photos.").await.unwrap() {
            TurnOutcome::Concluded { feedback, .. } => {
                assert_eq!(feedback.source, TextSource::Scripted);
            }
            other => panic!("expected conclusion, got {:?}", other),
        }
        session.next().unwrap();
    }

    assert_eq!(session.summary().count, store.list_for_role(Role::Adjuster).unwrap().len());
    assert!(provider.call_count() > 0);
}

/// Generated replies are used when the provider answers
#[tokio::test]
async fn test_generated_reply_reaches_transcript() {
    let provider = Arc::new(MockProvider::constant("Agnes: And who pays for the tarp?"));
    let mut session = PracticeSession::start(
        &roof_store(),
        Role::Homeowner,
        &config(2),
        Some(provider.clone()),
    )
    .unwrap();

    match session.submit("We can inspect today.").await.unwrap() {
        TurnOutcome::Continue { reply, turn } => {
            assert_eq!(turn, 2);
            assert_eq!(reply.text, "And who pays for the tarp?");
            assert_eq!(reply.source, TextSource::Generated);
        }
        other => panic!("expected reply, got {:?}", other),
    }

    let prompt = &provider.requests()[0].prompt;
    assert!(prompt.contains("Scenario: roof-1"));
    assert!(prompt.contains("We can inspect today."));
    assert!(session
        .conversation()
        .unwrap()
        .transcript_text()
        .ends_with("Agnes: And who pays for the tarp?"));
}

/// A reply generated for an attempt that was retried must be discarded
#[tokio::test]
async fn test_reply_after_retry_is_stale() {
    let mut session = PracticeSession::start(&roof_store(), Role::Homeowner, &config(3), None)
        .unwrap();

    let pending = match session.begin_turn("first answer").unwrap() {
        TurnStart::AwaitReply(pending) => pending,
        other => panic!("expected pending reply, got {:?}", other),
    };
    let late = session.replies().next_reply(&pending.context).await;

    session.retry().unwrap();
    let err = session.complete_turn(pending.ticket, late).unwrap_err();
    assert!(matches!(
        err,
        SessionError::Conversation(ConversationError::StaleReply { turn: 1 })
    ));

    let conversation = session.conversation().unwrap();
    assert_eq!(conversation.history().len(), 1);
    assert_eq!(conversation.current_turn(), 1);
}

/// Retried attempts are not recorded; archived ones are
#[tokio::test]
async fn test_retry_then_next_records_once() {
    let mut session = PracticeSession::start(&roof_store(), Role::Homeowner, &config(1), None)
        .unwrap();

    session.submit("no idea").await.unwrap();
    session.retry().unwrap();
    session.submit("the deductible").await.unwrap();
    assert!(session.next().unwrap().is_none());

    let attempts = session.tracker().attempts();
    assert_eq!(attempts.len(), 1);
    assert_eq!(attempts[0].response, "the deductible");
    assert_eq!(attempts[0].transcript.len(), 2);

    let first = session.summary();
    assert_eq!(first, session.summary());
    assert_eq!(first.count, 1);
}

#[tokio::test]
async fn test_unknown_role_is_distinct_failure() {
    let err = PracticeSession::start(&roof_store(), Role::SalesRep, &config(3), None).unwrap_err();
    assert_eq!(err.to_string(), "No scenarios available for role: sales-rep");
}

proptest! {
    /// Never more user turns than the bound; the final turn always concludes
    #[test]
    fn prop_turn_bound(
        max_turns in 1u32..=10,
        inputs in prop::collection::vec(prop_oneof![
            Just(String::new()),
            Just("   ".to_string()),
            "[a-z ]{1,40}",
        ], 0..30),
    ) {
        let scenario = Arc::new(Scenario::new("p", Role::Homeowner, "Go", &["roof"]));
        let scorer = Scorer::default();
        let scripted = ScriptedReplies;
        let mut conversation = Conversation::start(Arc::clone(&scenario), max_turns);
        let mut accepted = 0u32;

        for input in &inputs {
            match conversation.submit(input, &scorer) {
                Ok(Submission::ReplyNeeded(ticket)) => {
                    accepted += 1;
                    prop_assert!(ticket.turn < max_turns);
                    let line = scripted.line(&scenario, ticket.turn);
                    conversation.resolve_reply(ticket, &line).unwrap();
                }
                Ok(Submission::Concluded(result)) => {
                    accepted += 1;
                    prop_assert_eq!(accepted, max_turns);
                    prop_assert!(result.score <= 100);
                }
                Err(ConversationError::EmptySubmission) => {
                    prop_assert!(input.trim().is_empty());
                }
                Err(ConversationError::NotAwaitingResponse) => {
                    prop_assert!(conversation.is_concluded());
                }
                Err(other) => prop_assert!(false, "unexpected error {:?}", other),
            }
            prop_assert!(conversation.user_turns() as u32 <= max_turns);
        }

        prop_assert_eq!(conversation.is_concluded(), accepted == max_turns);
    }
}
