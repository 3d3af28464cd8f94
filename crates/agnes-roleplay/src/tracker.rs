//! Per-session record of completed attempts

use agnes_core::ScoreResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::coach::CoachFeedback;
use crate::conversation::{Conversation, Message};

/// One archived attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptRecord {
    pub scenario_id: String,
    pub result: ScoreResult,
    /// Text that was scored
    pub response: String,
    pub transcript: Vec<Message>,
    pub feedback: Option<CoachFeedback>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl AttemptRecord {
    /// Archive a concluded conversation; `None` if it has not concluded
    pub fn from_conversation(
        conversation: &Conversation,
        feedback: Option<CoachFeedback>,
    ) -> Option<Self> {
        let result = conversation.result()?.clone();
        Some(Self {
            scenario_id: conversation.scenario().id.clone(),
            result,
            response: conversation.user_text(),
            transcript: conversation.history().to_vec(),
            feedback,
            started_at: conversation.started_at(),
            completed_at: conversation.concluded_at().unwrap_or_else(Utc::now),
        })
    }
}

/// Aggregate over every recorded attempt
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub count: usize,
    /// Mean score, rounded half up
    pub average: u8,
    pub max: u8,
    pub pass_count: usize,
}

/// Ordered list of completed attempts
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionTracker {
    attempts: Vec<AttemptRecord>,
}

impl SessionTracker {
    /// Empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a bare score with no transcript
    pub fn record(&mut self, scenario_id: &str, result: ScoreResult, response: &str) {
        let now = Utc::now();
        self.record_attempt(AttemptRecord {
            scenario_id: scenario_id.to_string(),
            result,
            response: response.to_string(),
            transcript: Vec::new(),
            feedback: None,
            started_at: now,
            completed_at: now,
        });
    }

    /// Append a completed attempt
    pub fn record_attempt(&mut self, attempt: AttemptRecord) {
        tracing::debug!(
            scenario = %attempt.scenario_id,
            score = attempt.result.score,
            "Attempt recorded"
        );
        self.attempts.push(attempt);
    }

    /// Completed attempts, oldest first
    pub fn attempts(&self) -> &[AttemptRecord] {
        &self.attempts
    }

    /// Number of completed attempts
    pub fn len(&self) -> usize {
        self.attempts.len()
    }

    /// Whether nothing has been recorded yet
    pub fn is_empty(&self) -> bool {
        self.attempts.is_empty()
    }

    /// Forget every attempt
    pub fn clear(&mut self) {
        self.attempts.clear();
    }

    /// Recomputed from the records on every call
    pub fn summary(&self) -> SessionSummary {
        let count = self.attempts.len();
        if count == 0 {
            return SessionSummary::default();
        }

        let total: u64 = self.attempts.iter().map(|a| u64::from(a.result.score)).sum();
        let n = count as u64;
        let average = ((2 * total + n) / (2 * n)) as u8;

        SessionSummary {
            count,
            average,
            max: self
                .attempts
                .iter()
                .map(|a| a.result.score)
                .max()
                .unwrap_or(0),
            pass_count: self.attempts.iter().filter(|a| a.result.passed).count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(score: u8, passed: bool) -> ScoreResult {
        ScoreResult {
            score,
            matched_points: Vec::new(),
            missed_points: Vec::new(),
            keyword_hits: Vec::new(),
            passed,
        }
    }

    #[test]
    fn test_empty_summary() {
        assert_eq!(SessionTracker::new().summary(), SessionSummary::default());
    }

    #[test]
    fn test_summary_rounds_average() {
        let mut tracker = SessionTracker::new();
        tracker.record("a", result(70, true), "x");
        tracker.record("b", result(85, true), "y");
        tracker.record("c", result(50, false), "z");

        let summary = tracker.summary();
        assert_eq!(summary.count, 3);
        // 205 / 3 = 68.33
        assert_eq!(summary.average, 68);
        assert_eq!(summary.max, 85);
        assert_eq!(summary.pass_count, 2);
        assert_eq!(tracker.summary(), summary);

        tracker.record("d", result(66, false), "w");
        // 271 / 4 = 67.75
        assert_eq!(tracker.summary().average, 68);
    }

    #[test]
    fn test_half_rounds_up() {
        let mut tracker = SessionTracker::new();
        tracker.record("a", result(70, true), "");
        tracker.record("b", result(71, true), "");
        assert_eq!(tracker.summary().average, 71);
    }

    #[test]
    fn test_attempts_keep_order_until_cleared() {
        let mut tracker = SessionTracker::new();
        assert!(tracker.is_empty());

        tracker.record("first", result(40, false), "a");
        tracker.record("second", result(90, true), "b");
        assert_eq!(tracker.len(), 2);
        let ids: Vec<_> = tracker.attempts().iter().map(|a| a.scenario_id.as_str()).collect();
        assert_eq!(ids, ["first", "second"]);

        tracker.clear();
        assert!(tracker.is_empty());
        assert_eq!(tracker.summary(), SessionSummary::default());
    }
}
