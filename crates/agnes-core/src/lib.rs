//! # Agnes Core
//!
//! Core types for the Agnes role-play trainer:
//! - [`Scenario`] - Immutable practice case with its [`Rubric`]
//! - [`RubricStore`] - Validated scenario catalog, keyed by [`Role`]
//! - [`Scorer`] - Deterministic, explainable lexical scoring of free-text responses
//! - [`analyze_live`] - Tone, confidence and running score while a response is typed
//! - [`Exam`] - Certification exam definitions and grading
//!
//! ## Quick Start
//!
//! ```rust
//! use agnes_core::score;
//!
//! let points = vec![
//!     "deductible".to_string(),
//!     "insurance covers this".to_string(),
//!     "no out of pocket".to_string(),
//! ];
//! let result = score(
//!     "Your insurance covers this and the only out of pocket is the deductible.",
//!     &points,
//!     &[],
//!     70,
//! );
//!
//! assert_eq!(result.score, 100);
//! assert!(result.passed);
//! ```

pub mod analysis;
pub mod exam;
pub mod lexical;
pub mod scenario;
pub mod scoring;
pub mod store;

pub use analysis::{analyze_confidence, analyze_live, analyze_tone, word_count, LiveFeedback, Tone};
pub use exam::{Exam, ExamError, ExamGrade, ExamItem};
pub use scenario::{Role, Rubric, Scenario, UnknownRole};
pub use scoring::{score, ScoreBand, ScoreResult, Scorer, ScoringConfig};
pub use store::{RubricStore, StoreError};
