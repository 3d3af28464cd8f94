//! Practice session configuration

use agnes_core::ScoringConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use crate::persona::Persona;

/// Allowed range for turns per conversation
pub const MAX_TURNS_RANGE: std::ops::RangeInclusive<u32> = 1..=10;

/// Knobs for a practice session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PracticeConfig {
    /// User turns per conversation (env: AGNES_MAX_TURNS)
    pub max_turns: u32,
    /// Deadline for a generated reply (env: AGNES_REPLY_TIMEOUT_MS)
    pub reply_timeout: Duration,
    /// Counterpart behaviour (env: AGNES_PERSONA)
    pub persona: Persona,
    /// Use the LLM for replies and coaching when one is configured (env: AGNES_GENERATIVE)
    pub generative: bool,
    pub scoring: ScoringConfig,
}

impl Default for PracticeConfig {
    fn default() -> Self {
        Self {
            max_turns: 5,
            reply_timeout: Duration::from_millis(8_000),
            persona: Persona::default(),
            generative: true,
            scoring: ScoringConfig::default(),
        }
    }
}

impl PracticeConfig {
    /// Defaults overridden by whatever is set in the environment
    ///
    /// Unparseable values are logged and ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(turns) = parse_var::<u32>("AGNES_MAX_TURNS") {
            config.max_turns = turns;
        }
        if let Some(ms) = parse_var::<u64>("AGNES_REPLY_TIMEOUT_MS") {
            config.reply_timeout = Duration::from_millis(ms);
        }
        if let Some(persona) = parse_var::<Persona>("AGNES_PERSONA") {
            config.persona = persona;
        }
        if let Ok(raw) = env::var("AGNES_GENERATIVE") {
            config.generative = !matches!(
                raw.trim().to_lowercase().as_str(),
                "0" | "false" | "off" | "no"
            );
        }

        config.normalized()
    }

    /// Clamp values into their allowed ranges
    pub fn normalized(mut self) -> Self {
        self.max_turns = self
            .max_turns
            .clamp(*MAX_TURNS_RANGE.start(), *MAX_TURNS_RANGE.end());
        self
    }

    pub fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = max_turns;
        self.normalized()
    }

    pub fn with_persona(mut self, persona: Persona) -> Self {
        self.persona = persona;
        self
    }

    pub fn with_reply_timeout(mut self, timeout: Duration) -> Self {
        self.reply_timeout = timeout;
        self
    }

    pub fn scripted(mut self) -> Self {
        self.generative = false;
        self
    }
}

fn parse_var<T>(name: &str) -> Option<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(var = name, value = %raw, error = %e, "Ignoring invalid setting");
            None
        }
    }
}
