// src/models/quiz.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use validator::Validate;

use crate::models::question::{Question, validate_questions};

/// Represents the 'quizzes' table in the database.
/// At most one quiz exists per (round, semester).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Quiz {
    pub id: i64,

    /// Display name, derived from the round ("Round 1 Quiz").
    pub name: String,

    /// 1 = MCQ round, 2 = coding round.
    pub round: i32,

    pub semester: i32,

    pub duration_minutes: i32,

    /// Ordered question list.
    /// Stored as a JSON array in the database.
    pub questions: Json<Vec<Question>>,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Quiz {
    pub fn display_name(round: i32) -> String {
        format!("Round {} Quiz", round)
    }
}

/// Listing row for the admin overview (question bodies omitted).
#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct QuizSummary {
    pub id: i64,
    pub name: String,
    pub round: i32,
    pub semester: i32,
    pub duration_minutes: i32,
    pub question_count: i32,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for creating a quiz.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuizRequest {
    #[validate(range(min = 1, max = 2, message = "Round must be 1 or 2."))]
    pub round: i32,
    #[validate(range(min = 1, max = 8, message = "Semester must be between 1 and 8."))]
    pub semester: i32,
    #[validate(range(min = 1, message = "Duration must be at least one minute."))]
    pub duration_minutes: i32,
    #[validate(custom(function = validate_questions))]
    pub questions: Vec<Question>,
}

impl CreateQuizRequest {
    /// Round 1 holds only MCQ questions, round 2 only coding questions.
    pub fn check_round_consistency(&self) -> Result<(), String> {
        check_round_consistency(self.round, &self.questions)
    }
}

/// DTO for updating a quiz. Fields are optional.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuizRequest {
    pub semester: Option<i32>,
    pub duration_minutes: Option<i32>,
    pub questions: Option<Vec<Question>>,
}

pub fn check_round_consistency(round: i32, questions: &[Question]) -> Result<(), String> {
    let mismatch = questions.iter().any(|q| q.is_mcq() != (round == 1));
    if mismatch {
        return Err(format!(
            "Round {} accepts only {} questions",
            round,
            if round == 1 { "multiple-choice" } else { "coding" }
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::TestCase;

    #[test]
    fn round_one_rejects_coding_questions() {
        let questions = vec![Question::Coding {
            question: "sum".to_string(),
            language: "C".to_string(),
            test_cases: vec![TestCase {
                input: "1 2".to_string(),
                output: "3".to_string(),
            }],
        }];
        assert!(check_round_consistency(1, &questions).is_err());
        assert!(check_round_consistency(2, &questions).is_ok());
    }
}
