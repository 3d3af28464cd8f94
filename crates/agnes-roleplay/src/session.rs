//! Practice session controller
//!
//! Owns the scenario sequence for one role, the active conversation, and the
//! record of archived attempts. A UI drives it through [`PracticeSession::submit`],
//! [`PracticeSession::retry`], [`PracticeSession::next`] and
//! [`PracticeSession::hint`], or through the split
//! [`begin_turn`](PracticeSession::begin_turn) /
//! [`complete_turn`](PracticeSession::complete_turn) pair when it runs reply
//! generation itself.

use agnes_core::{
    analyze_live, LiveFeedback, Role, RubricStore, ScoreResult, Scenario, Scorer, StoreError,
};
use agnes_llm::LlmProvider;
use rand::seq::IndexedRandom;
use std::sync::Arc;
use thiserror::Error;

use crate::coach::{Coach, CoachFeedback};
use crate::config::PracticeConfig;
use crate::conversation::{Conversation, ConversationError, ReplyTicket, Submission};
use crate::persona::Persona;
use crate::reply::{CounterpartReply, ReplyContext, ReplyGenerator};
use crate::tracker::{AttemptRecord, SessionSummary, SessionTracker};

/// Session errors
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Conversation(#[from] ConversationError),
    #[error("No active scenario; the session is complete")]
    NoActiveScenario,
    #[error("Current attempt has not concluded yet")]
    AttemptInProgress,
    #[error("Session is already complete")]
    SessionComplete,
}

/// A reply the caller must produce and hand back through `complete_turn`
#[derive(Debug, Clone)]
pub struct PendingReply {
    pub ticket: ReplyTicket,
    pub context: ReplyContext,
}

/// First half of a turn
#[derive(Debug, Clone)]
pub enum TurnStart {
    AwaitReply(PendingReply),
    Concluded(ScoreResult),
}

/// What the user sees after a submission
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// Counterpart replied; `turn` is the turn now awaiting the user
    Continue { reply: CounterpartReply, turn: u32 },
    Concluded {
        result: ScoreResult,
        feedback: CoachFeedback,
    },
}

/// One user's run through the scenarios of a role
#[derive(Debug)]
pub struct PracticeSession {
    role: Role,
    persona: Persona,
    max_turns: u32,
    scenarios: Vec<Arc<Scenario>>,
    index: usize,
    conversation: Option<Conversation>,
    feedback: Option<CoachFeedback>,
    tracker: SessionTracker,
    replies: ReplyGenerator,
    coach: Coach,
    scorer: Scorer,
    hints_used: u32,
}

impl PracticeSession {
    /// Start a session, using `provider` for replies and coaching when the
    /// config allows generation
    pub fn start(
        store: &RubricStore,
        role: Role,
        config: &PracticeConfig,
        provider: Option<Arc<dyn LlmProvider>>,
    ) -> Result<Self, SessionError> {
        let (replies, coach) = match provider.filter(|_| config.generative) {
            Some(provider) => (
                ReplyGenerator::generative(provider.clone(), config.reply_timeout),
                Coach::generative(provider, config.reply_timeout),
            ),
            None => (ReplyGenerator::scripted(), Coach::template_only()),
        };
        Self::with_components(store, role, config, replies, coach)
    }

    /// Start a session with explicit reply and coaching components
    pub fn with_components(
        store: &RubricStore,
        role: Role,
        config: &PracticeConfig,
        replies: ReplyGenerator,
        coach: Coach,
    ) -> Result<Self, SessionError> {
        let scenarios = store.list_for_role(role)?;
        let config = config.clone().normalized();

        tracing::info!(
            %role,
            persona = %config.persona,
            scenarios = scenarios.len(),
            replies = %replies.strategy_name(),
            "Practice session started"
        );

        let mut session = Self {
            role,
            persona: config.persona,
            max_turns: config.max_turns,
            scenarios,
            index: 0,
            conversation: None,
            feedback: None,
            tracker: SessionTracker::new(),
            replies,
            coach,
            scorer: Scorer::new(config.scoring),
            hints_used: 0,
        };
        session.load_current();
        Ok(session)
    }

    fn load_current(&mut self) {
        self.feedback = None;
        self.conversation = self
            .scenarios
            .get(self.index)
            .map(|s| Conversation::start(Arc::clone(s), self.max_turns));
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn persona(&self) -> Persona {
        self.persona
    }

    pub fn max_turns(&self) -> u32 {
        self.max_turns
    }

    /// Scenario in play, `None` once every scenario is done
    pub fn current_scenario(&self) -> Option<&Arc<Scenario>> {
        self.conversation.as_ref().map(Conversation::scenario)
    }

    pub fn conversation(&self) -> Option<&Conversation> {
        self.conversation.as_ref()
    }

    /// (1-based position, total scenarios)
    pub fn position(&self) -> (usize, usize) {
        ((self.index + 1).min(self.scenarios.len()), self.scenarios.len())
    }

    pub fn is_complete(&self) -> bool {
        self.conversation.is_none()
    }

    pub fn tracker(&self) -> &SessionTracker {
        &self.tracker
    }

    pub fn hints_used(&self) -> u32 {
        self.hints_used
    }

    /// Reply generator, for callers driving replies themselves
    pub fn replies(&self) -> &ReplyGenerator {
        &self.replies
    }

    fn active_mut(&mut self) -> Result<&mut Conversation, SessionError> {
        self.conversation
            .as_mut()
            .ok_or(SessionError::NoActiveScenario)
    }

    /// Record the user's response and say what must happen next
    pub fn begin_turn(&mut self, text: &str) -> Result<TurnStart, SessionError> {
        let persona = self.persona;
        let scorer = self.scorer.clone();
        let conversation = self.active_mut()?;

        match conversation.submit(text, &scorer)? {
            Submission::ReplyNeeded(ticket) => {
                tracing::debug!(
                    scenario_id = %conversation.scenario().id,
                    turn = ticket.turn,
                    "Awaiting counterpart reply"
                );
                let context = ReplyContext {
                    scenario: Arc::clone(conversation.scenario()),
                    history: conversation.history().to_vec(),
                    turn: ticket.turn,
                    max_turns: conversation.max_turns(),
                    persona,
                };
                Ok(TurnStart::AwaitReply(PendingReply { ticket, context }))
            }
            Submission::Concluded(result) => Ok(TurnStart::Concluded(result)),
        }
    }

    /// Apply a reply produced for `ticket`; stale tickets are rejected
    pub fn complete_turn(
        &mut self,
        ticket: ReplyTicket,
        reply: CounterpartReply,
    ) -> Result<TurnOutcome, SessionError> {
        let conversation = self.active_mut()?;
        conversation.resolve_reply(ticket, &reply.text)?;
        let turn = conversation.current_turn();
        Ok(TurnOutcome::Continue { reply, turn })
    }

    /// Coaching feedback for the concluded attempt, produced once and cached
    pub async fn feedback(&mut self) -> Result<CoachFeedback, SessionError> {
        if let Some(feedback) = &self.feedback {
            return Ok(feedback.clone());
        }
        let conversation = self
            .conversation
            .as_ref()
            .ok_or(SessionError::NoActiveScenario)?;
        let result = conversation
            .result()
            .ok_or(SessionError::AttemptInProgress)?;

        let feedback = self
            .coach
            .feedback(conversation.scenario(), &conversation.user_text(), result)
            .await;
        self.feedback = Some(feedback.clone());
        Ok(feedback)
    }

    /// Submit a response and run the counterpart reply or final scoring
    pub async fn submit(&mut self, text: &str) -> Result<TurnOutcome, SessionError> {
        match self.begin_turn(text)? {
            TurnStart::AwaitReply(pending) => {
                let reply = self.replies.next_reply(&pending.context).await;
                self.complete_turn(pending.ticket, reply)
            }
            TurnStart::Concluded(result) => {
                let feedback = self.feedback().await?;
                Ok(TurnOutcome::Concluded { result, feedback })
            }
        }
    }

    /// Restart the current scenario; the discarded attempt is not recorded
    pub fn retry(&mut self) -> Result<(), SessionError> {
        let scenario = self
            .current_scenario()
            .cloned()
            .ok_or(SessionError::NoActiveScenario)?;
        tracing::debug!(scenario_id = %scenario.id, "Attempt discarded");
        self.feedback = None;
        self.conversation = Some(Conversation::start(scenario, self.max_turns));
        Ok(())
    }

    /// Archive the concluded attempt and move on
    ///
    /// Returns the next scenario, or `None` when the session is complete.
    pub fn next(&mut self) -> Result<Option<Arc<Scenario>>, SessionError> {
        let conversation = self
            .conversation
            .as_ref()
            .ok_or(SessionError::SessionComplete)?;
        let record = AttemptRecord::from_conversation(conversation, self.feedback.take())
            .ok_or(SessionError::AttemptInProgress)?;

        tracing::info!(
            scenario_id = %record.scenario_id,
            score = record.result.score,
            passed = record.result.passed,
            "Attempt archived"
        );
        self.tracker.record_attempt(record);

        self.index += 1;
        self.load_current();
        Ok(self.current_scenario().cloned())
    }

    /// Random coaching hint for the current scenario
    ///
    /// `None` when the scenario has no hints or the session is complete.
    pub fn hint(&mut self) -> Option<String> {
        let hint = self
            .current_scenario()?
            .follow_ups
            .choose(&mut rand::rng())
            .cloned()?;
        self.hints_used += 1;
        Some(hint)
    }

    /// Score a draft without submitting it
    pub fn live_feedback(&self, draft: &str) -> Option<LiveFeedback> {
        let scenario = self.current_scenario()?;
        analyze_live(draft, scenario, &self.scorer)
    }

    pub fn summary(&self) -> SessionSummary {
        self.tracker.summary()
    }

    /// Clear the record and start again from the first scenario
    pub fn restart(&mut self) {
        tracing::info!(role = %self.role, "Practice session restarted");
        self.tracker.clear();
        self.hints_used = 0;
        self.index = 0;
        self.load_current();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> RubricStore {
        RubricStore::new(vec![
            Scenario::new(
                "h1",
                Role::Homeowner,
                "Why file a claim?",
                &["storm damage", "free inspection"],
            )
            .with_follow_ups(&["Mention the inspection is free"]),
            Scenario::new("h2", Role::Homeowner, "What about my deductible?", &["deductible"]),
        ])
        .unwrap()
    }

    fn session(turns: u32) -> PracticeSession {
        let config = PracticeConfig::default().with_max_turns(turns).scripted();
        PracticeSession::start(&store(), Role::Homeowner, &config, None).unwrap()
    }

    #[test]
    fn test_no_scenarios_for_role() {
        let err = PracticeSession::start(
            &store(),
            Role::Adjuster,
            &PracticeConfig::default(),
            None,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            SessionError::Store(StoreError::NoScenariosForRole(Role::Adjuster))
        ));
    }

    #[tokio::test]
    async fn test_submit_continue_then_conclude() {
        let mut session = session(2);

        match session.submit("there is storm damage").await.unwrap() {
            TurnOutcome::Continue { reply, turn } => {
                assert_eq!(turn, 2);
                assert!(!reply.text.is_empty());
            }
            other => panic!("expected reply, got {:?}", other),
        }

        match session.submit("and a free inspection").await.unwrap() {
            TurnOutcome::Concluded { result, feedback } => {
                assert_eq!(result.score, 100);
                assert_eq!(feedback.strengths[0], "You scored 100/100");
            }
            other => panic!("expected conclusion, got {:?}", other),
        }

        assert!(matches!(
            session.submit("more").await,
            Err(SessionError::Conversation(
                ConversationError::NotAwaitingResponse
            ))
        ));
    }

    #[tokio::test]
    async fn test_next_requires_conclusion() {
        let mut session = session(1);
        assert!(matches!(
            session.next(),
            Err(SessionError::AttemptInProgress)
        ));

        session.submit("storm damage").await.unwrap();
        let next = session.next().unwrap().unwrap();
        assert_eq!(next.id, "h2");
        assert_eq!(session.position(), (2, 2));
        assert_eq!(session.summary().count, 1);
        assert_eq!(session.tracker().attempts()[0].result.score, 50);
    }

    #[tokio::test]
    async fn test_retry_discards_attempt() {
        let mut session = session(1);
        session.submit("nothing useful").await.unwrap();
        session.retry().unwrap();

        let conversation = session.conversation().unwrap();
        assert_eq!(conversation.history().len(), 1);
        assert!(!conversation.is_concluded());
        assert!(session.tracker().is_empty());
    }

    #[tokio::test]
    async fn test_session_completes() {
        let mut session = session(1);
        session.submit("storm damage and a free inspection").await.unwrap();
        session.next().unwrap();
        session.submit("the deductible").await.unwrap();
        assert!(session.next().unwrap().is_none());

        assert!(session.is_complete());
        assert!(matches!(session.next(), Err(SessionError::SessionComplete)));
        assert!(matches!(
            session.submit("late").await,
            Err(SessionError::NoActiveScenario)
        ));
        assert!(session.hint().is_none());

        let summary = session.summary();
        assert_eq!(summary.count, 2);
        assert_eq!(summary.average, 100);
        assert_eq!(summary.pass_count, 2);

        session.restart();
        assert!(session.tracker().is_empty());
        assert_eq!(session.current_scenario().unwrap().id, "h1");
    }

    #[test]
    fn test_hints_counted() {
        let mut session = session(2);
        assert_eq!(
            session.hint().as_deref(),
            Some("Mention the inspection is free")
        );
        assert_eq!(session.hints_used(), 1);
    }

    #[test]
    fn test_live_feedback_for_draft() {
        let session = session(2);
        let live = session.live_feedback("storm damage").unwrap();
        assert_eq!(live.score.score, 50);
        assert!(session.live_feedback("   ").is_none());
    }
}
