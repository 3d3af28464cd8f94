//! Response scoring against a rubric
//!
//! Scoring is lexical and deterministic: the same response and rubric always
//! produce the same [`ScoreResult`]. The scorer never fails; degenerate input
//! (empty, numeric-only, very long) simply scores low.
//!
//! A key point matches when any of these hold, checked in order:
//! 1. The normalized point appears in the normalized response.
//! 2. The response's tokens appear as a whole-token run inside the point,
//!    and every significant stem of the response is a stem of the point at
//!    least [`MIN_REVERSE_STEM_CHARS`] characters long.
//! 3. One of the point's configured variants appears in the response.
//! 4. At least [`ScoringConfig::token_overlap`] of the point's significant
//!    stems appear among the response's stems.
//!
//! The base score is the matched fraction of key points, rounded half-up. A
//! keyword bonus is then added, capped, and the total clamped to 100.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::lexical::{normalize, significant_stems, tokens};
use crate::scenario::Scenario;

/// Shortest stem that may match a key point from inside it
pub const MIN_REVERSE_STEM_CHARS: usize = 3;

/// Tunable scoring parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Points added per distinct keyword found in the response
    pub keyword_bonus_per_hit: u32,
    /// Maximum total keyword bonus
    pub keyword_bonus_cap: u32,
    /// Fraction of a key point's significant stems that must appear (0.0-1.0)
    pub token_overlap: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            keyword_bonus_per_hit: 2,
            keyword_bonus_cap: 10,
            token_overlap: 0.75,
        }
    }
}

impl ScoringConfig {
    /// Exact-phrase matching only: no stem overlap, no keyword bonus
    pub fn strict() -> Self {
        Self {
            keyword_bonus_per_hit: 0,
            keyword_bonus_cap: 0,
            token_overlap: 1.1,
        }
    }
}

/// Outcome of scoring one response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResult {
    /// Final score (0-100)
    pub score: u8,
    /// Key points the response covered, in rubric order
    pub matched_points: Vec<String>,
    /// Key points the response missed, in rubric order
    pub missed_points: Vec<String>,
    /// Distinct rubric keywords found in the response
    pub keyword_hits: Vec<String>,
    /// Whether the score reached the pass threshold
    pub passed: bool,
}

impl ScoreResult {
    /// Score band used for color coding
    pub fn band(&self) -> ScoreBand {
        ScoreBand::from_score(self.score)
    }
}

/// Coarse score band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreBand {
    /// Below 70
    Low,
    /// 70 to 84
    Medium,
    /// 85 and above
    High,
}

impl ScoreBand {
    /// Band for a score
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=69 => ScoreBand::Low,
            70..=84 => ScoreBand::Medium,
            _ => ScoreBand::High,
        }
    }
}

/// Deterministic rubric scorer
#[derive(Debug, Clone, Default)]
pub struct Scorer {
    config: ScoringConfig,
}

impl Scorer {
    /// Create a scorer with the given parameters
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    /// Current parameters
    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Score a response against raw rubric parts
    pub fn score(
        &self,
        response: &str,
        expected_key_points: &[String],
        keywords: &[String],
        pass_threshold: u8,
    ) -> ScoreResult {
        self.evaluate(
            response,
            expected_key_points,
            keywords,
            pass_threshold,
            &BTreeMap::new(),
        )
    }

    /// Score a response against a scenario's rubric, including its variants
    pub fn score_scenario(&self, response: &str, scenario: &Scenario) -> ScoreResult {
        self.evaluate(
            response,
            &scenario.expected_key_points,
            &scenario.rubric.keywords,
            scenario.rubric.pass_threshold,
            &scenario.rubric.variants,
        )
    }

    fn evaluate(
        &self,
        response: &str,
        expected_key_points: &[String],
        keywords: &[String],
        pass_threshold: u8,
        variants: &BTreeMap<String, Vec<String>>,
    ) -> ScoreResult {
        let normalized = normalize(response);

        if normalized.is_empty() {
            return ScoreResult {
                score: 0,
                matched_points: Vec::new(),
                missed_points: expected_key_points.to_vec(),
                keyword_hits: Vec::new(),
                passed: false,
            };
        }

        let response_stems = significant_stems(&normalized);

        let (matched_points, missed_points): (Vec<String>, Vec<String>) = expected_key_points
            .iter()
            .cloned()
            .partition(|point| {
                self.point_matches(
                    point,
                    &normalized,
                    &response_stems,
                    variants.get(point).map(Vec::as_slice).unwrap_or(&[]),
                )
            });

        let base = base_score(matched_points.len(), expected_key_points.len());
        let keyword_hits = keyword_hits(&normalized, keywords);
        let bonus = (keyword_hits.len() as u32)
            .saturating_mul(self.config.keyword_bonus_per_hit)
            .min(self.config.keyword_bonus_cap);
        let score = (base + bonus).min(100) as u8;

        tracing::trace!(
            score,
            matched = matched_points.len(),
            missed = missed_points.len(),
            keyword_hits = keyword_hits.len(),
            "Scored response"
        );

        ScoreResult {
            score,
            matched_points,
            missed_points,
            keyword_hits,
            passed: score >= pass_threshold,
        }
    }

    /// Whether a single key point is covered by an already-normalized response
    pub fn point_matches(
        &self,
        point: &str,
        normalized_response: &str,
        response_stems: &BTreeSet<String>,
        variants: &[String],
    ) -> bool {
        let point_norm = normalize(point);

        if normalized_response.contains(&point_norm) {
            return true;
        }

        let point_stems = significant_stems(&point_norm);
        if response_within_point(&point_norm, &point_stems, normalized_response, response_stems) {
            return true;
        }

        if variants.iter().any(|v| {
            let v = normalize(v);
            !v.is_empty() && normalized_response.contains(&v)
        }) {
            return true;
        }

        if point_stems.is_empty() {
            return false;
        }
        let hits = point_stems
            .iter()
            .filter(|s| response_stems.contains(*s))
            .count();
        hits as f64 / point_stems.len() as f64 >= self.config.token_overlap
    }
}

/// Score a response with default parameters
///
/// This is the standalone scoring entry point: pure, side-effect free and
/// callable without any engine or network.
pub fn score(
    response: &str,
    expected_key_points: &[String],
    keywords: &[String],
    pass_threshold: u8,
) -> ScoreResult {
    Scorer::default().score(response, expected_key_points, keywords, pass_threshold)
}

/// A short answer quoting part of a key point, e.g. "pocket" for "no out of pocket"
///
/// Tokens must line up on word boundaries, so a stray letter inside a longer
/// word never counts.
fn response_within_point(
    point_norm: &str,
    point_stems: &BTreeSet<String>,
    normalized_response: &str,
    response_stems: &BTreeSet<String>,
) -> bool {
    if response_stems.is_empty()
        || response_stems
            .iter()
            .any(|s| s.chars().count() < MIN_REVERSE_STEM_CHARS || !point_stems.contains(s))
    {
        return false;
    }

    let token_run = |text: &str| format!(" {} ", tokens(text).collect::<Vec<_>>().join(" "));
    token_run(point_norm).contains(&token_run(normalized_response))
}

/// round(100 * matched / max(total, 1)), with an empty rubric counting as full
fn base_score(matched: usize, total: usize) -> u32 {
    if total == 0 {
        return 100;
    }
    let (m, n) = (matched as u64, total as u64);
    ((200 * m + n) / (2 * n)) as u32
}

fn keyword_hits(normalized_response: &str, keywords: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    keywords
        .iter()
        .filter(|k| {
            let k = normalize(k);
            !k.is_empty() && normalized_response.contains(&k) && seen.insert(k)
        })
        .cloned()
        .collect()
}
