//! Post-attempt coaching feedback
//!
//! Generated feedback is optional. Without a provider, or when the provider
//! fails or returns something unparseable, the template built from the score
//! is used instead.

use agnes_core::{ScoreResult, Scenario};
use agnes_llm::{LlmProvider, LlmRequest};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::reply::TextSource;

const COACH_SYSTEM: &str = "You are an expert roofing sales trainer. \
    You give short, specific, encouraging feedback on role-play answers.";

/// Strengths and improvements for one concluded attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoachFeedback {
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub source: TextSource,
}

impl CoachFeedback {
    /// Feedback derived from the score alone
    pub fn template(result: &ScoreResult) -> Self {
        let strengths = vec![
            format!("You scored {}/100", result.score),
            format!("Matched {} key points", result.matched_points.len()),
        ];

        let mut improvements = Vec::new();
        if !result.missed_points.is_empty() {
            let missing: Vec<&str> = result
                .missed_points
                .iter()
                .take(2)
                .map(String::as_str)
                .collect();
            improvements.push(format!("Try to include: {}", missing.join(", ")));
        }
        improvements.push("Practice using clear, professional language".to_string());

        Self {
            strengths,
            improvements,
            source: TextSource::Scripted,
        }
    }
}

/// Shape the model is asked to answer in
#[derive(Debug, Deserialize)]
struct GeneratedFeedback {
    #[serde(default)]
    strengths: Vec<String>,
    #[serde(default)]
    improvements: Vec<String>,
}

/// Produces [`CoachFeedback`], optionally with an LLM
#[derive(Debug, Clone, Default)]
pub struct Coach {
    provider: Option<Arc<dyn LlmProvider>>,
    timeout: Duration,
}

impl Coach {
    /// Template feedback only
    pub fn template_only() -> Self {
        Self::default()
    }

    pub fn generative(provider: Arc<dyn LlmProvider>, timeout: Duration) -> Self {
        Self {
            provider: Some(provider),
            timeout,
        }
    }

    pub fn is_generative(&self) -> bool {
        self.provider.is_some()
    }

    fn build_request(scenario: &Scenario, response: &str, result: &ScoreResult) -> LlmRequest {
        let prompt = format!(
            "Scenario: {prompt}\n\
             Expected key points: {expected}\n\
             Rep's answer: \"{response}\"\n\
             Score: {score}/100 (matched: {matched}; missed: {missed})\n\n\
             Reply with JSON only, in this shape:\n\
             {{\"strengths\": [\"...\"], \"improvements\": [\"...\"]}}\n\
             Give two or three items in each list.",
            prompt = scenario.prompt,
            expected = scenario.expected_key_points.join("; "),
            response = response,
            score = result.score,
            matched = result.matched_points.join("; "),
            missed = result.missed_points.join("; "),
        );
        LlmRequest::with_role(COACH_SYSTEM, &prompt)
            .temperature(0.4)
            .max_tokens(400)
    }

    /// Feedback for a concluded attempt; falls back to the template
    pub async fn feedback(
        &self,
        scenario: &Scenario,
        response: &str,
        result: &ScoreResult,
    ) -> CoachFeedback {
        let Some(provider) = &self.provider else {
            return CoachFeedback::template(result);
        };

        let request = Self::build_request(scenario, response, result);
        match tokio::time::timeout(self.timeout, provider.complete(request)).await {
            Ok(Ok(raw)) => match parse_feedback(&raw.content) {
                Some(feedback) => return feedback,
                None => tracing::warn!("Unusable coach feedback, using template"),
            },
            Ok(Err(e)) => tracing::warn!(error = %e, "Coach feedback failed, using template"),
            Err(_) => tracing::warn!(
                timeout_ms = self.timeout.as_millis() as u64,
                "Coach feedback timed out, using template"
            ),
        }
        CoachFeedback::template(result)
    }
}

/// Pull the JSON object out of a model answer that may wrap it in prose or fences
fn parse_feedback(raw: &str) -> Option<CoachFeedback> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }

    let parsed: GeneratedFeedback = match serde_json::from_str(&raw[start..=end]) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::debug!(error = %e, "Coach feedback was not valid JSON");
            return None;
        }
    };

    let clean = |items: Vec<String>| -> Vec<String> {
        items
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    };
    let strengths = clean(parsed.strengths);
    let improvements = clean(parsed.improvements);
    if strengths.is_empty() && improvements.is_empty() {
        return None;
    }

    Some(CoachFeedback {
        strengths,
        improvements,
        source: TextSource::Generated,
    })
}
