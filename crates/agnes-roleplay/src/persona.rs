//! Counterpart personas
//!
//! A persona is the behavioural directive handed to the generative delegate.
//! Scripted replies ignore it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Name the counterpart goes by in every scenario
pub const COUNTERPART_NAME: &str = "Agnes";

/// How the simulated counterpart behaves
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Persona {
    Supportive,
    #[default]
    Realistic,
    Skeptical,
    Rushed,
    FinalBoss,
}

/// Error returned when parsing an unknown persona name
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown persona: {0}")]
pub struct UnknownPersona(pub String);

impl Persona {
    /// All personas, easiest first
    pub const ALL: [Persona; 5] = [
        Persona::Supportive,
        Persona::Realistic,
        Persona::Skeptical,
        Persona::Rushed,
        Persona::FinalBoss,
    ];

    /// Stable identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Persona::Supportive => "supportive",
            Persona::Realistic => "realistic",
            Persona::Skeptical => "skeptical",
            Persona::Rushed => "rushed",
            Persona::FinalBoss => "final-boss",
        }
    }

    /// Difficulty from 1 (beginner) to 5 (master)
    pub fn difficulty(&self) -> u8 {
        match self {
            Persona::Supportive => 1,
            Persona::Realistic => 2,
            Persona::Skeptical => 3,
            Persona::Rushed => 4,
            Persona::FinalBoss => 5,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Persona::Supportive => "Agnes the Supportive Coach",
            Persona::Realistic => "Agnes the Real Homeowner",
            Persona::Skeptical => "Agnes the Skeptical Buyer",
            Persona::Rushed => "Agnes the Rushed Decision-Maker",
            Persona::FinalBoss => "Agnes the Final Boss",
        }
    }

    /// Behavioural directive for the generative delegate
    pub fn instruction(&self) -> &'static str {
        match self {
            Persona::Supportive => "Respond warmly and positively, showing genuine interest. Ask follow-up questions that help the rep demonstrate their skills.",
            Persona::Realistic => "Respond with typical homeowner concerns. Be reasonable but skeptical. Require solid information before agreeing.",
            Persona::Skeptical => "Challenge their response with tough objections. Be critical but fair. Make them work for the close.",
            Persona::Rushed => "Act busy and impatient. Give short responses. Push back on time commitments. Be somewhat dismissive.",
            Persona::FinalBoss => "Combine multiple objections. Switch between concerns rapidly. Test their ability to handle complex, multilayered objections.",
        }
    }

    /// Sampling temperature; harder personas get a little more variety
    pub fn temperature(&self) -> f32 {
        match self {
            Persona::Supportive | Persona::Realistic => 0.7,
            Persona::Skeptical | Persona::Rushed => 0.8,
            Persona::FinalBoss => 0.9,
        }
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Persona {
    type Err = UnknownPersona;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('_', "-");
        Persona::ALL
            .into_iter()
            .find(|p| p.as_str() == wanted)
            .ok_or_else(|| UnknownPersona(s.to_string()))
    }
}
