//! Bounded multi-turn conversation
//!
//! A conversation opens with the scenario prompt as the counterpart's first
//! line. Each user submission either asks for a counterpart reply (while turns
//! remain) or concludes the attempt by scoring every user turn together.
//!
//! Replies are produced asynchronously, so a submission hands out a
//! [`ReplyTicket`]. Only a reply presented with the ticket of the current
//! attempt and turn is accepted; anything else is stale and discarded.

use agnes_core::{ScoreResult, Scenario, Scorer};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::persona::COUNTERPART_NAME;

/// Who said a line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Counterpart,
}

/// One line of the transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub speaker: Speaker,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    fn now(speaker: Speaker, text: &str) -> Self {
        Self {
            speaker,
            text: text.to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// Where the conversation stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum Phase {
    /// Waiting for the user's response on this turn
    AwaitingResponse { turn: u32 },
    /// The user answered this turn; the counterpart's reply is outstanding
    AwaitingReply { turn: u32 },
    /// Scored; no further input accepted
    Concluded,
}

/// Claim on the reply for one turn of one attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReplyTicket {
    pub attempt: Uuid,
    pub turn: u32,
}

/// What a submission led to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// A counterpart reply is needed before the next turn
    ReplyNeeded(ReplyTicket),
    /// The final turn was answered and the attempt scored
    Concluded(ScoreResult),
}

/// Conversation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversationError {
    #[error("Response is empty")]
    EmptySubmission,
    #[error("Conversation is not awaiting a response")]
    NotAwaitingResponse,
    #[error("Reply for turn {turn} is stale")]
    StaleReply { turn: u32 },
    #[error("Counterpart reply is empty")]
    EmptyReply,
}

/// One attempt at one scenario
#[derive(Debug, Clone)]
pub struct Conversation {
    attempt: Uuid,
    scenario: Arc<Scenario>,
    history: Vec<Message>,
    phase: Phase,
    max_turns: u32,
    started_at: DateTime<Utc>,
    concluded_at: Option<DateTime<Utc>>,
    result: Option<ScoreResult>,
}

impl Conversation {
    /// Open a new attempt; `max_turns` is raised to at least 1
    pub fn start(scenario: Arc<Scenario>, max_turns: u32) -> Self {
        let opening = Message::now(Speaker::Counterpart, &scenario.prompt);
        let attempt = Uuid::new_v4();
        tracing::debug!(%attempt, scenario = %scenario.id, max_turns, "Conversation started");
        Self {
            attempt,
            scenario,
            history: vec![opening],
            phase: Phase::AwaitingResponse { turn: 1 },
            max_turns: max_turns.max(1),
            started_at: Utc::now(),
            concluded_at: None,
            result: None,
        }
    }

    pub fn attempt_id(&self) -> Uuid {
        self.attempt
    }

    pub fn scenario(&self) -> &Arc<Scenario> {
        &self.scenario
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn max_turns(&self) -> u32 {
        self.max_turns
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn concluded_at(&self) -> Option<DateTime<Utc>> {
        self.concluded_at
    }

    /// Score of a concluded attempt
    pub fn result(&self) -> Option<&ScoreResult> {
        self.result.as_ref()
    }

    pub fn is_concluded(&self) -> bool {
        self.phase == Phase::Concluded
    }

    /// Turn currently in play (the last one once concluded)
    pub fn current_turn(&self) -> u32 {
        match self.phase {
            Phase::AwaitingResponse { turn } | Phase::AwaitingReply { turn } => turn,
            Phase::Concluded => self.max_turns,
        }
    }

    /// Number of user submissions so far
    pub fn user_turns(&self) -> usize {
        self.history
            .iter()
            .filter(|m| m.speaker == Speaker::User)
            .count()
    }

    /// Every user turn joined with single spaces
    pub fn user_text(&self) -> String {
        self.history
            .iter()
            .filter(|m| m.speaker == Speaker::User)
            .map(|m| m.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Record the user's response for the current turn
    ///
    /// Blank input and input outside `AwaitingResponse` are rejected without
    /// touching the conversation.
    pub fn submit(&mut self, text: &str, scorer: &Scorer) -> Result<Submission, ConversationError> {
        let turn = match self.phase {
            Phase::AwaitingResponse { turn } => turn,
            _ => return Err(ConversationError::NotAwaitingResponse),
        };
        let text = text.trim();
        if text.is_empty() {
            return Err(ConversationError::EmptySubmission);
        }

        self.history.push(Message::now(Speaker::User, text));

        if turn < self.max_turns {
            self.phase = Phase::AwaitingReply { turn };
            return Ok(Submission::ReplyNeeded(ReplyTicket {
                attempt: self.attempt,
                turn,
            }));
        }

        let result = scorer.score_scenario(&self.user_text(), &self.scenario);
        tracing::info!(
            attempt = %self.attempt,
            scenario = %self.scenario.id,
            score = result.score,
            passed = result.passed,
            "Conversation concluded"
        );
        self.phase = Phase::Concluded;
        self.concluded_at = Some(Utc::now());
        self.result = Some(result.clone());
        Ok(Submission::Concluded(result))
    }

    /// Append the counterpart's reply and open the next turn
    pub fn resolve_reply(&mut self, ticket: ReplyTicket, text: &str) -> Result<(), ConversationError> {
        let expected = match self.phase {
            Phase::AwaitingReply { turn } => turn,
            _ => return Err(ConversationError::StaleReply { turn: ticket.turn }),
        };
        if ticket.attempt != self.attempt || ticket.turn != expected {
            tracing::debug!(
                attempt = %self.attempt,
                ticket_attempt = %ticket.attempt,
                ticket_turn = ticket.turn,
                "Discarding stale reply"
            );
            return Err(ConversationError::StaleReply { turn: ticket.turn });
        }
        let text = text.trim();
        if text.is_empty() {
            return Err(ConversationError::EmptyReply);
        }

        self.history.push(Message::now(Speaker::Counterpart, text));
        self.phase = Phase::AwaitingResponse { turn: expected + 1 };
        Ok(())
    }

    /// Plain-text transcript, one line per message
    pub fn transcript_text(&self) -> String {
        self.history
            .iter()
            .map(|m| match m.speaker {
                Speaker::Counterpart => format!("{}: {}", COUNTERPART_NAME, m.text),
                Speaker::User => format!("You: {}", m.text),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Transcript export as pretty JSON
    pub fn transcript_json(&self) -> serde_json::Result<String> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Export<'a> {
            scenario_id: &'a str,
            attempt: Uuid,
            started_at: DateTime<Utc>,
            concluded_at: Option<DateTime<Utc>>,
            messages: &'a [Message],
            result: Option<&'a ScoreResult>,
        }

        serde_json::to_string_pretty(&Export {
            scenario_id: &self.scenario.id,
            attempt: self.attempt,
            started_at: self.started_at,
            concluded_at: self.concluded_at,
            messages: &self.history,
            result: self.result.as_ref(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agnes_core::Role;

    fn scenario() -> Arc<Scenario> {
        Arc::new(Scenario::new(
            "t1",
            Role::Homeowner,
            "Why should I file a claim?",
            &["storm damage", "free inspection"],
        ))
    }

    fn reply_needed(submission: Submission) -> ReplyTicket {
        match submission {
            Submission::ReplyNeeded(ticket) => ticket,
            other => panic!("expected reply, got {:?}", other),
        }
    }

    #[test]
    fn test_opens_with_prompt() {
        let conv = Conversation::start(scenario(), 3);
        assert_eq!(conv.history().len(), 1);
        assert_eq!(conv.history()[0].speaker, Speaker::Counterpart);
        assert_eq!(conv.history()[0].text, "Why should I file a claim?");
        assert_eq!(conv.phase(), Phase::AwaitingResponse { turn: 1 });
    }

    #[test]
    fn test_empty_submission_leaves_state_alone() {
        let scorer = Scorer::default();
        let mut conv = Conversation::start(scenario(), 3);
        assert_eq!(
            conv.submit("   ", &scorer),
            Err(ConversationError::EmptySubmission)
        );
        assert_eq!(conv.history().len(), 1);
        assert_eq!(conv.phase(), Phase::AwaitingResponse { turn: 1 });
    }

    #[test]
    fn test_turn_cycle() {
        let scorer = Scorer::default();
        let mut conv = Conversation::start(scenario(), 2);

        let ticket = reply_needed(conv.submit("There was storm damage", &scorer).unwrap());
        assert_eq!(ticket.turn, 1);
        assert_eq!(conv.phase(), Phase::AwaitingReply { turn: 1 });
        assert_eq!(
            conv.submit("again", &scorer),
            Err(ConversationError::NotAwaitingResponse)
        );

        conv.resolve_reply(ticket, "And what would that cost me?").unwrap();
        assert_eq!(conv.phase(), Phase::AwaitingResponse { turn: 2 });

        match conv.submit("The inspection is free", &scorer).unwrap() {
            Submission::Concluded(result) => {
                assert_eq!(result.score, 100);
                assert!(result.passed);
            }
            other => panic!("expected conclusion, got {:?}", other),
        }
        assert!(conv.is_concluded());
        assert_eq!(conv.user_turns(), 2);
        assert_eq!(
            conv.user_text(),
            "There was storm damage The inspection is free"
        );
    }

    #[test]
    fn test_single_turn_concludes_immediately() {
        let scorer = Scorer::default();
        let mut conv = Conversation::start(scenario(), 0);
        assert_eq!(conv.max_turns(), 1);
        assert!(matches!(
            conv.submit("storm damage", &scorer).unwrap(),
            Submission::Concluded(_)
        ));
        assert_eq!(conv.history().len(), 2);
    }

    #[test]
    fn test_stale_tickets_rejected() {
        let scorer = Scorer::default();
        let mut conv = Conversation::start(scenario(), 3);
        let ticket = reply_needed(conv.submit("hello", &scorer).unwrap());

        let wrong_turn = ReplyTicket { turn: 2, ..ticket };
        assert_eq!(
            conv.resolve_reply(wrong_turn, "late"),
            Err(ConversationError::StaleReply { turn: 2 })
        );

        let other = Conversation::start(scenario(), 3);
        let foreign = ReplyTicket {
            attempt: other.attempt_id(),
            turn: 1,
        };
        assert!(conv.resolve_reply(foreign, "late").is_err());

        assert_eq!(
            conv.resolve_reply(ticket, "  "),
            Err(ConversationError::EmptyReply)
        );
        conv.resolve_reply(ticket, "ok").unwrap();
        // Same ticket twice
        assert!(conv.resolve_reply(ticket, "again").is_err());
        assert_eq!(conv.history().len(), 3);
    }

    #[test]
    fn test_transcript_exports() {
        let scorer = Scorer::default();
        let mut conv = Conversation::start(scenario(), 2);
        let ticket = reply_needed(conv.submit("storm damage", &scorer).unwrap());
        conv.resolve_reply(ticket, "Go on.").unwrap();

        assert_eq!(
            conv.transcript_text(),
            "Agnes: Why should I file a claim?\nYou: storm damage\nAgnes: Go on."
        );

        let json: serde_json::Value =
            serde_json::from_str(&conv.transcript_json().unwrap()).unwrap();
        assert_eq!(json["scenarioId"], "t1");
        assert_eq!(json["messages"].as_array().unwrap().len(), 3);
        assert_eq!(json["messages"][1]["speaker"], "user");
        assert!(json["result"].is_null());
    }
}
