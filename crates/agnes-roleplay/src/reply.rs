//! Counterpart replies
//!
//! A [`ReplyGenerator`] asks its primary [`ReplyStrategy`] for the next line
//! and falls back to the scripted bank when the strategy errors, returns
//! nothing usable, or misses the deadline. The caller always gets a reply.

use agnes_core::{Role, Scenario};
use agnes_llm::{LlmError, LlmProvider, LlmRequest};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use crate::conversation::{Message, Speaker};
use crate::persona::{Persona, COUNTERPART_NAME};

/// Lines used when a scenario carries no replies of its own
pub const DEFAULT_REPLY_BANK: [&str; 5] = [
    "That's interesting. Can you tell me more about how that would work?",
    "I'm still a bit concerned about the costs. What exactly would I be paying?",
    "How long does this whole process usually take?",
    "What if the insurance company denies the claim?",
    "Okay, I think I understand. What are the next steps?",
];

const LAST_RESORT_REPLY: &str =
    "I see. Let me think about that for a moment. Is there anything else you can tell me?";

/// Max tokens for one counterpart line
const REPLY_MAX_TOKENS: u32 = 200;

/// Everything a strategy may look at to produce a reply
#[derive(Debug, Clone)]
pub struct ReplyContext {
    pub scenario: Arc<Scenario>,
    pub history: Vec<Message>,
    /// Turn the user just answered
    pub turn: u32,
    pub max_turns: u32,
    pub persona: Persona,
}

impl ReplyContext {
    /// Most recent user line, if any
    pub fn last_user_text(&self) -> Option<&str> {
        self.history
            .iter()
            .rev()
            .find(|m| m.speaker == Speaker::User)
            .map(|m| m.text.as_str())
    }

    /// Whether the next line should start wrapping the conversation up
    pub fn is_closing(&self) -> bool {
        self.turn + 1 >= self.max_turns
    }
}

/// Where a line of text came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextSource {
    Scripted,
    Generated,
}

/// A reply ready to append to the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterpartReply {
    pub text: String,
    pub source: TextSource,
}

/// A way of producing the counterpart's next line
#[async_trait]
pub trait ReplyStrategy: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &str;

    fn source(&self) -> TextSource;

    async fn next_reply(&self, ctx: &ReplyContext) -> Result<String, LlmError>;
}

/// Fixed reply bank indexed by turn
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptedReplies;

impl ScriptedReplies {
    /// Line for the turn just answered; the last entry repeats once the bank runs out
    pub fn line(&self, scenario: &Scenario, turn: u32) -> String {
        let index = turn.saturating_sub(1) as usize;
        let line = if scenario.replies.iter().any(|r| !r.trim().is_empty()) {
            pick(&scenario.replies, index)
        } else {
            pick(&DEFAULT_REPLY_BANK, index)
        };
        line.unwrap_or_else(|| LAST_RESORT_REPLY.to_string())
    }
}

fn pick<S: AsRef<str>>(bank: &[S], index: usize) -> Option<String> {
    let usable: Vec<&str> = bank
        .iter()
        .map(AsRef::as_ref)
        .filter(|line| !line.trim().is_empty())
        .collect();
    usable
        .get(index)
        .or_else(|| usable.last())
        .map(|line| line.trim().to_string())
}

#[async_trait]
impl ReplyStrategy for ScriptedReplies {
    fn name(&self) -> &str {
        "scripted"
    }

    fn source(&self) -> TextSource {
        TextSource::Scripted
    }

    async fn next_reply(&self, ctx: &ReplyContext) -> Result<String, LlmError> {
        Ok(self.line(&ctx.scenario, ctx.turn))
    }
}

/// Replies produced by an LLM playing the counterpart
#[derive(Debug, Clone)]
pub struct GenerativeReplies {
    provider: Arc<dyn LlmProvider>,
}

impl GenerativeReplies {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }

    /// Build the request for one reply
    pub fn build_request(ctx: &ReplyContext) -> LlmRequest {
        let system = format!(
            "You are {}, {} in a roofing insurance sales training role-play. \
             Stay in character and never break the fourth wall.",
            COUNTERPART_NAME,
            counterpart_description(ctx.scenario.role)
        );

        let user_label = user_label(ctx.scenario.role);
        let mut prompt = String::new();
        let _ = writeln!(prompt, "Scenario: {}", ctx.scenario.id);
        let _ = writeln!(prompt, "Personality: {}", ctx.persona.display_name());
        let _ = writeln!(prompt, "Current Turn: {} of {}", ctx.turn, ctx.max_turns);
        let _ = writeln!(prompt, "Personality Instructions: {}", ctx.persona.instruction());
        let _ = writeln!(prompt, "\nConversation so far:");
        for message in &ctx.history {
            let who = match message.speaker {
                Speaker::Counterpart => COUNTERPART_NAME,
                Speaker::User => user_label,
            };
            let _ = writeln!(prompt, "{}: {}", who, message.text);
        }
        if let Some(last) = ctx.last_user_text() {
            let _ = writeln!(prompt, "\nLatest {} Response: \"{}\"", user_label, last);
        }

        let direction = if ctx.is_closing() {
            "Move toward either acceptance or a final objection"
        } else {
            "Raise a new concern or ask a follow-up question"
        };
        let _ = writeln!(
            prompt,
            "\nGenerate {name}'s natural follow-up response (1-3 sentences). Your response should:\n\
             1. React naturally to what was just said\n\
             2. {direction}\n\
             3. Stay in character with the {persona} personality\n\
             4. Keep it conversational and realistic\n\
             5. Do not give feedback, just respond as {name} would\n\n\
             Response (plain text only, no JSON):",
            name = COUNTERPART_NAME,
            direction = direction,
            persona = ctx.persona.display_name(),
        );

        LlmRequest::with_role(&system, &prompt)
            .temperature(ctx.persona.temperature())
            .max_tokens(REPLY_MAX_TOKENS)
    }
}

/// Strip quoting and speaker labels the model sometimes adds
fn clean_reply(raw: &str) -> Result<String, LlmError> {
    let mut text = raw.trim();
    let label = format!("{}:", COUNTERPART_NAME);
    if let Some(rest) = text.strip_prefix(&label) {
        text = rest.trim();
    }
    let text = text.trim_matches('"').trim();

    if text.is_empty() {
        return Err(LlmError::InvalidResponse("empty reply".to_string()));
    }
    if text.starts_with('{') {
        return Err(LlmError::InvalidResponse(
            "expected plain text, got JSON".to_string(),
        ));
    }
    Ok(text.to_string())
}

#[async_trait]
impl ReplyStrategy for GenerativeReplies {
    fn name(&self) -> &str {
        self.provider.name()
    }

    fn source(&self) -> TextSource {
        TextSource::Generated
    }

    async fn next_reply(&self, ctx: &ReplyContext) -> Result<String, LlmError> {
        let response = self.provider.complete(Self::build_request(ctx)).await?;
        tracing::debug!(
            provider = %self.provider.name(),
            latency_ms = response.latency_ms,
            tokens = ?response.tokens_used,
            "Generated counterpart reply"
        );
        clean_reply(&response.content)
    }
}

fn counterpart_description(role: Role) -> &'static str {
    match role {
        Role::Homeowner => "a homeowner whose roof may have storm damage",
        Role::Adjuster => "an insurance adjuster reviewing a roofing claim",
        Role::SalesRep => "a newer roofing sales rep asking an experienced colleague for help",
    }
}

fn user_label(role: Role) -> &'static str {
    match role {
        Role::SalesRep => "Mentor",
        Role::Homeowner | Role::Adjuster => "Sales Rep",
    }
}

/// Primary strategy with a bounded wait and scripted fallback
#[derive(Debug, Clone)]
pub struct ReplyGenerator {
    strategy: Arc<dyn ReplyStrategy>,
    fallback: ScriptedReplies,
    timeout: Duration,
}

impl ReplyGenerator {
    /// Scripted replies only
    pub fn scripted() -> Self {
        Self::with_strategy(Arc::new(ScriptedReplies), Duration::from_secs(1))
    }

    /// LLM replies bounded by `timeout`, scripted when that fails
    pub fn generative(provider: Arc<dyn LlmProvider>, timeout: Duration) -> Self {
        Self::with_strategy(Arc::new(GenerativeReplies::new(provider)), timeout)
    }

    pub fn with_strategy(strategy: Arc<dyn ReplyStrategy>, timeout: Duration) -> Self {
        Self {
            strategy,
            fallback: ScriptedReplies,
            timeout,
        }
    }

    /// Name of the primary strategy
    pub fn strategy_name(&self) -> &str {
        self.strategy.name()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Next counterpart line; never fails
    pub async fn next_reply(&self, ctx: &ReplyContext) -> CounterpartReply {
        let outcome = tokio::time::timeout(self.timeout, self.strategy.next_reply(ctx)).await;

        match outcome {
            Ok(Ok(text)) if !text.trim().is_empty() => {
                return CounterpartReply {
                    text,
                    source: self.strategy.source(),
                };
            }
            Ok(Ok(_)) => {
                tracing::warn!(strategy = %self.strategy.name(), "Empty reply, using scripted line");
            }
            Ok(Err(e)) => {
                tracing::warn!(strategy = %self.strategy.name(), error = %e, "Reply failed, using scripted line");
            }
            Err(_) => {
                tracing::warn!(
                    strategy = %self.strategy.name(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Reply timed out, using scripted line"
                );
            }
        }

        CounterpartReply {
            text: self.fallback.line(&ctx.scenario, ctx.turn),
            source: TextSource::Scripted,
        }
    }
}

impl Default for ReplyGenerator {
    fn default() -> Self {
        Self::scripted()
    }
}
