// src/session/score.rs

use std::collections::HashMap;

use crate::models::question::Question;
use crate::models::result::ReviewItem;
use crate::session::machine::AnswerValue;

/// Pure scorer: 1 point per correctly answered question, 0 otherwise.
/// MCQ answers must equal the answer key exactly (case-sensitive, no
/// trimming); coding questions score on the captured judge verdict.
/// Unanswered questions score 0. No partial credit, no negative marking.
pub fn score_session(questions: &[Question], answers: &HashMap<usize, AnswerValue>) -> u32 {
    questions
        .iter()
        .enumerate()
        .filter(|(index, question)| is_correct(question, answers.get(index)))
        .count() as u32
}

fn is_correct(question: &Question, answer: Option<&AnswerValue>) -> bool {
    match (question, answer) {
        (Question::Mcq { correct_answer, .. }, Some(AnswerValue::Choice(choice))) => {
            choice == correct_answer
        }
        (Question::Coding { .. }, Some(AnswerValue::CodeVerdict { passed })) => *passed,
        _ => false,
    }
}

/// Per-question breakdown for the finish screen.
pub fn build_review(
    questions: &[Question],
    answers: &HashMap<usize, AnswerValue>,
) -> Vec<ReviewItem> {
    questions
        .iter()
        .enumerate()
        .map(|(index, question)| {
            let answer = answers.get(&index);
            let your_answer = answer.map(|value| match value {
                AnswerValue::Choice(choice) => choice.clone(),
                AnswerValue::CodeVerdict { passed: true } => "passed".to_string(),
                AnswerValue::CodeVerdict { passed: false } => "failed".to_string(),
            });
            let correct_answer = match question {
                Question::Mcq { correct_answer, .. } => correct_answer.clone(),
                Question::Coding { test_cases, .. } => test_cases
                    .first()
                    .map(|tc| tc.output.clone())
                    .unwrap_or_default(),
            };
            ReviewItem {
                question: question.text().to_string(),
                your_answer,
                correct: is_correct(question, answer),
                correct_answer,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mcq(correct: &str) -> Question {
        Question::Mcq {
            question: "2+2?".to_string(),
            options: vec!["3".to_string(), "4".to_string(), "5".to_string()],
            correct_answer: correct.to_string(),
        }
    }

    #[test]
    fn exact_case_sensitive_match_only() {
        let questions = vec![mcq("Four")];
        let mut answers = HashMap::new();

        answers.insert(0, AnswerValue::Choice("four".to_string()));
        assert_eq!(score_session(&questions, &answers), 0);

        answers.insert(0, AnswerValue::Choice("Four ".to_string()));
        assert_eq!(score_session(&questions, &answers), 0);

        answers.insert(0, AnswerValue::Choice("Four".to_string()));
        assert_eq!(score_session(&questions, &answers), 1);
    }

    #[test]
    fn unanswered_questions_score_zero() {
        let questions = vec![mcq("4"), mcq("4"), mcq("4")];
        let mut answers = HashMap::new();
        answers.insert(1, AnswerValue::Choice("4".to_string()));
        assert_eq!(score_session(&questions, &answers), 1);
    }

    #[test]
    fn scoring_is_idempotent_and_order_independent() {
        let questions = vec![mcq("4"), mcq("3")];

        let mut first = HashMap::new();
        first.insert(0, AnswerValue::Choice("4".to_string()));
        first.insert(1, AnswerValue::Choice("3".to_string()));

        // same captures arriving in the opposite order
        let mut second = HashMap::new();
        second.insert(1, AnswerValue::Choice("3".to_string()));
        second.insert(0, AnswerValue::Choice("4".to_string()));

        assert_eq!(score_session(&questions, &first), 2);
        assert_eq!(score_session(&questions, &first), 2);
        assert_eq!(
            score_session(&questions, &first),
            score_session(&questions, &second)
        );
    }

    #[test]
    fn review_marks_each_line() {
        let questions = vec![mcq("4"), mcq("4")];
        let mut answers = HashMap::new();
        answers.insert(0, AnswerValue::Choice("4".to_string()));

        let review = build_review(&questions, &answers);
        assert_eq!(review.len(), 2);
        assert!(review[0].correct);
        assert_eq!(review[0].your_answer.as_deref(), Some("4"));
        assert!(!review[1].correct);
        assert_eq!(review[1].your_answer, None);
        assert_eq!(review[1].correct_answer, "4");
    }
}
