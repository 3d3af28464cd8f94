//! Certification exam definitions and grading
//!
//! Exams arrive grouped by section (usually generated by an LLM):
//!
//! ```json
//! {
//!   "multipleChoice": [{"question": "...", "options": ["a", "b"], "answer": "a"}],
//!   "fillBlank":      [{"question": "...", "answer": "..."}],
//!   "shortAnswer":    [{"prompt": "...", "keywords": ["..."]}]
//! }
//! ```
//!
//! They are flattened into tagged [`ExamItem`]s and validated before anyone
//! can grade against them. Answers are positional over [`Exam::items`].

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::lexical::normalize;

/// Weight of auto-graded items (multiple choice + fill-in) in the overall score
const AUTO_WEIGHT: f64 = 0.8;
/// Weight of short-answer items in the overall score
const SHORT_ANSWER_WEIGHT: f64 = 0.2;

/// Errors from loading an exam
#[derive(Debug, Error)]
pub enum ExamError {
    #[error("Failed to parse exam: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid exam item {index}: {reason}")]
    Invalid { index: usize, reason: String },
    #[error("Exam has no questions")]
    Empty,
}

/// One exam question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ExamItem {
    MultipleChoice {
        question: String,
        options: Vec<String>,
        answer: String,
    },
    FillBlank {
        question: String,
        answer: String,
    },
    ShortAnswer {
        prompt: String,
        keywords: Vec<String>,
    },
}

impl ExamItem {
    fn check(&self) -> Result<(), String> {
        match self {
            ExamItem::MultipleChoice {
                question,
                options,
                answer,
            } => {
                if question.trim().is_empty() {
                    return Err("question is blank".to_string());
                }
                if options.len() < 2 {
                    return Err("multiple choice needs at least two options".to_string());
                }
                if !options.contains(answer) {
                    return Err(format!("answer '{}' is not one of the options", answer));
                }
            }
            ExamItem::FillBlank { question, answer } => {
                if question.trim().is_empty() {
                    return Err("question is blank".to_string());
                }
                if answer.trim().is_empty() {
                    return Err("answer is blank".to_string());
                }
            }
            ExamItem::ShortAnswer { prompt, keywords } => {
                if prompt.trim().is_empty() {
                    return Err("prompt is blank".to_string());
                }
                if keywords.iter().all(|k| k.trim().is_empty()) {
                    return Err("short answer needs at least one keyword".to_string());
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroupedExam {
    #[serde(default)]
    multiple_choice: Vec<RawMultipleChoice>,
    #[serde(default)]
    fill_blank: Vec<RawFillBlank>,
    #[serde(default)]
    short_answer: Vec<RawShortAnswer>,
}

#[derive(Debug, Deserialize)]
struct RawMultipleChoice {
    question: String,
    options: Vec<String>,
    answer: String,
}

#[derive(Debug, Deserialize)]
struct RawFillBlank {
    question: String,
    answer: String,
}

#[derive(Debug, Deserialize)]
struct RawShortAnswer {
    prompt: String,
    keywords: Vec<String>,
}

/// A validated exam
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Exam {
    items: Vec<ExamItem>,
}

impl Exam {
    /// Build from items, rejecting malformed ones
    pub fn new(items: Vec<ExamItem>) -> Result<Self, ExamError> {
        if items.is_empty() {
            return Err(ExamError::Empty);
        }
        for (index, item) in items.iter().enumerate() {
            item.check()
                .map_err(|reason| ExamError::Invalid { index, reason })?;
        }
        Ok(Self { items })
    }

    /// Parse the grouped JSON shape
    pub fn from_json(json: &str) -> Result<Self, ExamError> {
        let grouped: GroupedExam = serde_json::from_str(json)?;

        let items = grouped
            .multiple_choice
            .into_iter()
            .map(|q| ExamItem::MultipleChoice {
                question: q.question,
                options: q.options,
                answer: q.answer,
            })
            .chain(grouped.fill_blank.into_iter().map(|q| ExamItem::FillBlank {
                question: q.question,
                answer: q.answer,
            }))
            .chain(
                grouped
                    .short_answer
                    .into_iter()
                    .map(|q| ExamItem::ShortAnswer {
                        prompt: q.prompt,
                        keywords: q.keywords,
                    }),
            )
            .collect();

        Self::new(items)
    }

    /// Questions in answer order
    pub fn items(&self) -> &[ExamItem] {
        &self.items
    }

    /// Grade positional answers; missing answers count as blank
    pub fn grade(&self, answers: &[String]) -> ExamGrade {
        let mut grade = ExamGrade::default();
        let mut short_answer_sum = 0.0;

        for (idx, item) in self.items.iter().enumerate() {
            let given = answers.get(idx).map(String::as_str).unwrap_or("");
            match item {
                ExamItem::MultipleChoice { answer, .. } => {
                    grade.mcq_total += 1;
                    if given == answer {
                        grade.mcq_correct += 1;
                    }
                }
                ExamItem::FillBlank { answer, .. } => {
                    grade.fib_total += 1;
                    let given = given.trim().to_lowercase();
                    if !given.is_empty() && given == answer.trim().to_lowercase() {
                        grade.fib_correct += 1;
                    }
                }
                ExamItem::ShortAnswer { keywords, .. } => {
                    grade.short_answer_total += 1;
                    let text = normalize(given);
                    let keywords: Vec<String> = keywords
                        .iter()
                        .map(|k| normalize(k))
                        .filter(|k| !k.is_empty())
                        .collect();
                    let hits = keywords.iter().filter(|k| text.contains(k.as_str())).count();
                    short_answer_sum += hits as f64 / keywords.len().max(1) as f64;
                }
            }
        }

        let auto_total = grade.mcq_total + grade.fib_total;
        let auto_pct = if auto_total > 0 {
            ((grade.mcq_correct + grade.fib_correct) as f64 / auto_total as f64 * 100.0).round()
        } else {
            0.0
        };
        let sa_pct = if grade.short_answer_total > 0 {
            (short_answer_sum / grade.short_answer_total as f64 * 100.0).round()
        } else {
            0.0
        };

        grade.short_answer_pct = sa_pct as u8;
        grade.overall = (auto_pct * AUTO_WEIGHT + sa_pct * SHORT_ANSWER_WEIGHT).round() as u8;
        grade
    }
}

/// Result of grading an exam
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamGrade {
    pub mcq_correct: usize,
    pub mcq_total: usize,
    pub fib_correct: usize,
    pub fib_total: usize,
    pub short_answer_total: usize,
    /// Average keyword coverage over short answers (0-100)
    pub short_answer_pct: u8,
    /// Weighted overall score (0-100)
    pub overall: u8,
}

impl ExamGrade {
    /// Whether the overall score reaches a certification threshold
    pub fn passed(&self, threshold: u8) -> bool {
        self.overall >= threshold
    }
}

impl fmt::Display for ExamGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MCQ: {}/{}, FIB: {}/{}, SA Score: {}%. Overall: {}%.",
            self.mcq_correct,
            self.mcq_total,
            self.fib_correct,
            self.fib_total,
            self.short_answer_pct,
            self.overall
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "multipleChoice": [
            {"question": "Core values?", "options": ["Speed, Price, Volume", "Integrity, Quality, Simplicity"], "answer": "Integrity, Quality, Simplicity"},
            {"question": "Founded?", "options": ["2017", "2018", "2019"], "answer": "2019"}
        ],
        "fillBlank": [
            {"question": "Claims must be filed within the statute of ____.", "answer": "Limitations"}
        ],
        "shortAnswer": [
            {"prompt": "Why is a storm claim not an at-fault claim?", "keywords": ["act of god", "no fault", "rates"]}
        ]
    }"#;

    #[test]
    fn test_parse_flattens_sections_in_order() {
        let exam = Exam::from_json(SAMPLE).unwrap();
        assert_eq!(exam.items().len(), 4);
        assert!(matches!(exam.items()[0], ExamItem::MultipleChoice { .. }));
        assert!(matches!(exam.items()[2], ExamItem::FillBlank { .. }));
        assert!(matches!(exam.items()[3], ExamItem::ShortAnswer { .. }));
    }

    #[test]
    fn test_grade_weights_sections() {
        let exam = Exam::from_json(SAMPLE).unwrap();
        let answers = vec![
            "Integrity, Quality, Simplicity".to_string(),
            "2018".to_string(),
            "  limitations ".to_string(),
            "It's an act of God, so your rates are not singled out.".to_string(),
        ];

        let grade = exam.grade(&answers);
        assert_eq!(grade.mcq_correct, 1);
        assert_eq!(grade.fib_correct, 1);
        // auto 2/3 = 67%, short answer 2/3 = 67%
        assert_eq!(grade.short_answer_pct, 67);
        assert_eq!(grade.overall, 67);
        assert_eq!(
            grade.to_string(),
            "MCQ: 1/2, FIB: 1/1, SA Score: 67%. Overall: 67%."
        );
    }

    #[test]
    fn test_missing_answers_count_as_blank() {
        let exam = Exam::from_json(SAMPLE).unwrap();
        let grade = exam.grade(&[]);
        assert_eq!(grade.overall, 0);
        assert!(!grade.passed(80));
    }

    #[test]
    fn test_rejects_answer_outside_options() {
        let json = r#"{"multipleChoice":[{"question":"Q","options":["a","b"],"answer":"c"}]}"#;
        match Exam::from_json(json) {
            Err(ExamError::Invalid { index, reason }) => {
                assert_eq!(index, 0);
                assert!(reason.contains("not one of the options"));
            }
            other => panic!("expected invalid item, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_empty_exam() {
        assert!(matches!(Exam::from_json("{}"), Err(ExamError::Empty)));
    }
}
