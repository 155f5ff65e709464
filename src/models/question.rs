// src/models/question.rs

use serde::{Deserialize, Serialize};

/// Languages the round 2 judge accepts.
pub const SUPPORTED_LANGUAGES: [&str; 3] = ["C", "C++", "Java"];

const MIN_MCQ_OPTIONS: usize = 2;
const MAX_MCQ_OPTIONS: usize = 5;

/// A single authored question, tagged by kind.
/// Stored as a JSONB array on the quiz row; the wire shape matches the
/// authoring client (`type`, `question`, `options`, `correctAnswer`,
/// `testCases`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Question {
    #[serde(rename_all = "camelCase")]
    Mcq {
        question: String,
        /// 2 to 5 options, order preserved.
        options: Vec<String>,
        /// Must equal one option string exactly.
        correct_answer: String,
    },
    #[serde(rename_all = "camelCase")]
    Coding {
        question: String,
        language: String,
        /// Ordered, non-empty. A submission passes only if every case's
        /// output matches byte-for-byte.
        test_cases: Vec<TestCase>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    pub input: String,
    pub output: String,
}

impl Question {
    pub fn text(&self) -> &str {
        match self {
            Question::Mcq { question, .. } => question,
            Question::Coding { question, .. } => question,
        }
    }

    pub fn is_mcq(&self) -> bool {
        matches!(self, Question::Mcq { .. })
    }
}

/// Client-facing question: the MCQ answer key is stripped. Coding test
/// cases stay visible because the taking UI shows the expected output of
/// the case being run.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PublicQuestion {
    #[serde(rename_all = "camelCase")]
    Mcq { question: String, options: Vec<String> },
    #[serde(rename_all = "camelCase")]
    Coding {
        question: String,
        language: String,
        test_cases: Vec<TestCase>,
    },
}

impl From<&Question> for PublicQuestion {
    fn from(q: &Question) -> Self {
        match q {
            Question::Mcq {
                question, options, ..
            } => PublicQuestion::Mcq {
                question: question.clone(),
                options: options.clone(),
            },
            Question::Coding {
                question,
                language,
                test_cases,
            } => PublicQuestion::Coding {
                question: question.clone(),
                language: language.clone(),
                test_cases: test_cases.clone(),
            },
        }
    }
}

/// Validates one authored question against the data-model invariants.
pub fn validate_question(q: &Question) -> Result<(), validator::ValidationError> {
    match q {
        Question::Mcq {
            question,
            options,
            correct_answer,
        } => {
            if question.trim().is_empty() {
                return Err(validator::ValidationError::new("question_text_empty"));
            }
            if options.len() < MIN_MCQ_OPTIONS || options.len() > MAX_MCQ_OPTIONS {
                return Err(validator::ValidationError::new("mcq_option_count"));
            }
            if options.iter().any(|opt| opt.trim().is_empty()) {
                return Err(validator::ValidationError::new("mcq_option_empty"));
            }
            // Exact membership, no trimming: the scorer compares the same way.
            if !options.iter().any(|opt| opt == correct_answer) {
                return Err(validator::ValidationError::new("mcq_answer_not_an_option"));
            }
        }
        Question::Coding {
            question,
            language,
            test_cases,
        } => {
            if question.trim().is_empty() {
                return Err(validator::ValidationError::new("question_text_empty"));
            }
            if !SUPPORTED_LANGUAGES.contains(&language.as_str()) {
                return Err(validator::ValidationError::new("unsupported_language"));
            }
            if test_cases.is_empty() {
                return Err(validator::ValidationError::new("test_cases_empty"));
            }
            if test_cases.iter().any(|tc| tc.output.is_empty()) {
                return Err(validator::ValidationError::new("test_case_output_empty"));
            }
        }
    }
    Ok(())
}

/// Validates a full question list for a quiz payload.
pub fn validate_questions(questions: &[Question]) -> Result<(), validator::ValidationError> {
    if questions.is_empty() {
        return Err(validator::ValidationError::new("questions_empty"));
    }
    for q in questions {
        validate_question(q)?;
    }
    Ok(())
}
