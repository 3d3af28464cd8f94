//! Live response analysis
//!
//! Cheap heuristics recomputed on every keystroke while a rep types a
//! response: running rubric score, tone, confidence and word count.

use serde::{Deserialize, Serialize};

use crate::lexical::{normalize, tokens};
use crate::scenario::Scenario;
use crate::scoring::{ScoreBand, ScoreResult, Scorer};

const POSITIVE_CUES: &[&str] = &[
    "great", "excellent", "wonderful", "happy", "glad", "appreciate", "thank", "perfect",
    "absolutely", "understand", "help",
];

const NEGATIVE_CUES: &[&str] = &[
    "no", "not", "never", "can't", "won't", "don't", "bad", "unfortunately", "problem", "issue",
];

const CONFIDENT_PHRASES: &[&str] = &[
    "i can", "i will", "absolutely", "definitely", "certainly", "guarantee", "ensure",
];

const HEDGING_PHRASES: &[&str] = &[
    "maybe", "might", "perhaps", "i think", "possibly", "i guess", "kind of", "sort of",
];

/// Overall tone of a response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Positive,
    Neutral,
    Negative,
}

impl Tone {
    /// Label shown next to the tone bar
    pub fn label(&self) -> &'static str {
        match self {
            Tone::Positive => "Positive & Professional",
            Tone::Neutral => "Neutral",
            Tone::Negative => "Needs Improvement",
        }
    }
}

/// Snapshot of the live feedback panel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveFeedback {
    pub score: ScoreResult,
    pub band: ScoreBand,
    pub tone: Tone,
    /// 0-100
    pub confidence: u8,
    pub word_count: usize,
}

/// Number of whitespace-separated words
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Compare positive and negative cue counts
///
/// Each cue counts once. Cues of four or more letters also match as a word
/// prefix, so "thank" covers "thanks" and "appreciate" covers "appreciated".
pub fn analyze_tone(text: &str) -> Tone {
    let words: Vec<String> = tokens(text).collect();
    let count = |cues: &[&str]| {
        cues.iter()
            .filter(|cue| {
                words
                    .iter()
                    .any(|w| w == *cue || (cue.len() >= 4 && w.starts_with(*cue)))
            })
            .count()
    };

    let positive = count(POSITIVE_CUES);
    let negative = count(NEGATIVE_CUES);

    match positive.cmp(&negative) {
        std::cmp::Ordering::Greater => Tone::Positive,
        std::cmp::Ordering::Less => Tone::Negative,
        std::cmp::Ordering::Equal => Tone::Neutral,
    }
}

/// Estimate how assertive a response reads (0-100, base 50)
pub fn analyze_confidence(text: &str) -> u8 {
    let normalized = format!(" {} ", normalize(text));
    let mut confidence: i32 = 50;

    for phrase in CONFIDENT_PHRASES {
        if normalized.contains(&format!(" {}", phrase)) {
            confidence += 5;
        }
    }
    for phrase in HEDGING_PHRASES {
        if normalized.contains(&format!(" {}", phrase)) {
            confidence -= 5;
        }
    }

    let words = word_count(text);
    if (50..=150).contains(&words) {
        confidence += 10;
    } else if words < 30 {
        confidence -= 10;
    } else if words > 200 {
        confidence -= 5;
    }

    confidence.clamp(0, 100) as u8
}

/// Full live analysis; `None` for a blank response (panel resets)
pub fn analyze_live(text: &str, scenario: &Scenario, scorer: &Scorer) -> Option<LiveFeedback> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    let score = scorer.score_scenario(trimmed, scenario);
    Some(LiveFeedback {
        band: score.band(),
        score,
        tone: analyze_tone(trimmed),
        confidence: analyze_confidence(trimmed),
        word_count: word_count(trimmed),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Role;

    #[test]
    fn test_tone() {
        assert_eq!(
            analyze_tone("Thanks so much, I'm glad to help you with this."),
            Tone::Positive
        );
        assert_eq!(
            analyze_tone("Unfortunately that's not a problem we can fix."),
            Tone::Negative
        );
        assert_eq!(analyze_tone("The inspection takes an hour."), Tone::Neutral);
        // "know" must not count as "no"
        assert_eq!(analyze_tone("I know the roof."), Tone::Neutral);
    }

    #[test]
    fn test_confidence_short_hedged() {
        // 50 - 5 (maybe) - 5 (i think) - 10 (short)
        assert_eq!(analyze_confidence("Maybe, I think it could work"), 30);
    }

    #[test]
    fn test_confidence_assertive_mid_length() {
        let filler = "word ".repeat(55);
        let text = format!("I will absolutely get this done. {}", filler);
        // 50 + 5 (i will) + 5 (absolutely) + 10 (50-150 words)
        assert_eq!(analyze_confidence(&text), 70);
    }

    #[test]
    fn test_confidence_long_ramble() {
        let text = "word ".repeat(250);
        assert_eq!(analyze_confidence(&text), 45);
    }

    #[test]
    fn test_live_analysis() {
        let scenario = Scenario::new("s", Role::Homeowner, "Hi", &["free inspection"]);
        let scorer = Scorer::default();

        assert!(analyze_live("   ", &scenario, &scorer).is_none());

        let live = analyze_live("Happy to do a free inspection today", &scenario, &scorer).unwrap();
        assert_eq!(live.score.score, 100);
        assert_eq!(live.band, ScoreBand::High);
        assert_eq!(live.tone, Tone::Positive);
        assert_eq!(live.word_count, 7);
    }
}
