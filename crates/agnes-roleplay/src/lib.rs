//! # Agnes Role-play
//!
//! Bounded-turn role-play conversations against a simulated counterpart.
//! Replies come from an LLM when one is configured and from a scripted bank
//! otherwise, or whenever the LLM fails or is too slow.

pub mod coach;
pub mod config;
pub mod conversation;
pub mod persona;
pub mod reply;
pub mod session;
pub mod tracker;

pub use coach::{Coach, CoachFeedback};
pub use config::PracticeConfig;
pub use conversation::{
    Conversation, ConversationError, Message, Phase, ReplyTicket, Speaker, Submission,
};
pub use persona::{Persona, UnknownPersona, COUNTERPART_NAME};
pub use reply::{
    CounterpartReply, GenerativeReplies, ReplyContext, ReplyGenerator, ReplyStrategy,
    ScriptedReplies, TextSource, DEFAULT_REPLY_BANK,
};
pub use session::{PendingReply, PracticeSession, SessionError, TurnOutcome, TurnStart};
pub use tracker::{AttemptRecord, SessionSummary, SessionTracker};
