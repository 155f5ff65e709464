// src/models/result.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'quiz_results' table in the database.
/// Exactly one row per (user, round), enforced by a UNIQUE constraint.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
    pub id: i64,
    pub user_id: i64,
    pub enrollment_number: String,
    pub semester: i32,
    pub quiz_id: i64,
    pub score: i32,
    pub total_questions: i32,
    pub round: i32,
    pub tab_switches: i32,
    /// Server-assigned completion time.
    pub completed_at: chrono::DateTime<chrono::Utc>,
}

/// Admin overview row, joined with the user's name.
#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ResultOverviewEntry {
    pub enrollment_number: String,
    pub full_name: String,
    pub semester: i32,
    pub round: i32,
    pub score: i32,
    pub total_questions: i32,
    pub tab_switches: i32,
    pub completed_at: chrono::DateTime<chrono::Utc>,
}

/// Per-question line of the finish screen.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewItem {
    pub question: String,
    /// The captured MCQ option, or "passed"/"failed" for coding questions.
    /// Absent when the question was never answered.
    pub your_answer: Option<String>,
    pub correct: bool,
    /// The MCQ answer key, or the expected output of the first test case.
    pub correct_answer: String,
}

/// Submit response. `recorded` makes the best-effort persistence contract
/// visible: the score is authoritative either way, the result row may not
/// have landed.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub score: u32,
    pub total_questions: usize,
    pub tab_switches: u32,
    pub recorded: bool,
    pub review: Vec<ReviewItem>,
}
