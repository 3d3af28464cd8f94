//! Scenario and rubric types
//!
//! A [`Scenario`] is created once when the catalog loads and never mutated.
//! Engines hold it behind an `Arc` and only ever read it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Pass threshold applied when a rubric omits one
pub const DEFAULT_PASS_THRESHOLD: u8 = 70;

/// The counterpart role a scenario exercises
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    /// A homeowner at the door or on the phone
    Homeowner,
    /// The insurance company's field adjuster
    Adjuster,
    /// Another sales rep (ride-alongs, peer coaching)
    #[serde(alias = "rep", alias = "sales_rep")]
    SalesRep,
}

impl Role {
    /// All roles, in display order
    pub const ALL: [Role; 3] = [Role::Homeowner, Role::Adjuster, Role::SalesRep];

    /// Stable identifier used in catalogs and on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Homeowner => "homeowner",
            Role::Adjuster => "adjuster",
            Role::SalesRep => "sales-rep",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown role name
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "homeowner" => Ok(Role::Homeowner),
            "adjuster" => Ok(Role::Adjuster),
            "sales-rep" | "sales_rep" | "rep" => Ok(Role::SalesRep),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// Scoring configuration attached to a scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rubric {
    /// Lexical cues counted for the keyword bonus
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Score at or above which the attempt passes (0-100)
    #[serde(default = "default_pass_threshold")]
    pub pass_threshold: u8,
    /// Accepted alternative phrasings, keyed by the key point they stand for
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub variants: BTreeMap<String, Vec<String>>,
}

fn default_pass_threshold() -> u8 {
    DEFAULT_PASS_THRESHOLD
}

impl Default for Rubric {
    fn default() -> Self {
        Self {
            keywords: Vec::new(),
            pass_threshold: DEFAULT_PASS_THRESHOLD,
            variants: BTreeMap::new(),
        }
    }
}

/// A single rubric-bearing practice case
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    /// Unique identifier
    pub id: String,
    /// Counterpart role
    pub role: Role,
    /// Opening line spoken by the counterpart
    pub prompt: String,
    /// Concepts a correct response should touch on, in display order
    pub expected_key_points: Vec<String>,
    /// Scoring configuration
    #[serde(default)]
    pub rubric: Rubric,
    /// Hints surfaced on demand; never affect scoring
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub follow_ups: Vec<String>,
    /// Canned counterpart lines, indexed by turn
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub replies: Vec<String>,
}

impl Scenario {
    /// Create a scenario with an empty rubric
    pub fn new(id: &str, role: Role, prompt: &str, expected_key_points: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            role,
            prompt: prompt.to_string(),
            expected_key_points: expected_key_points.iter().map(|p| p.to_string()).collect(),
            rubric: Rubric::default(),
            follow_ups: Vec::new(),
            replies: Vec::new(),
        }
    }

    /// Set the rubric keywords
    pub fn with_keywords(mut self, keywords: &[&str]) -> Self {
        self.rubric.keywords = keywords.iter().map(|k| k.to_string()).collect();
        self
    }

    /// Set the pass threshold
    pub fn with_pass_threshold(mut self, threshold: u8) -> Self {
        self.rubric.pass_threshold = threshold;
        self
    }

    /// Set the canned reply bank
    pub fn with_replies(mut self, replies: &[&str]) -> Self {
        self.replies = replies.iter().map(|r| r.to_string()).collect();
        self
    }

    /// Set the hint bank
    pub fn with_follow_ups(mut self, hints: &[&str]) -> Self {
        self.follow_ups = hints.iter().map(|h| h.to_string()).collect();
        self
    }

    /// Check structural invariants, returning the first violation
    pub fn check(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("id must not be blank".to_string());
        }
        if self.prompt.trim().is_empty() {
            return Err("prompt must not be blank".to_string());
        }
        if self.rubric.pass_threshold > 100 {
            return Err(format!(
                "passThreshold {} is outside 0-100",
                self.rubric.pass_threshold
            ));
        }
        if let Some(idx) = self
            .expected_key_points
            .iter()
            .position(|p| p.trim().is_empty())
        {
            return Err(format!("expectedKeyPoints[{}] is blank", idx));
        }
        if let Some(point) = self
            .rubric
            .variants
            .keys()
            .find(|k| !self.expected_key_points.contains(k))
        {
            return Err(format!("variants given for unknown key point '{}'", point));
        }
        Ok(())
    }
}
