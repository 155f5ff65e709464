// src/session/machine.rs

use std::collections::HashMap;
use std::time::Instant;

use serde::Serialize;
use uuid::Uuid;

use crate::models::question::Question;
use crate::session::score;

/// Lifecycle of a running session. Start-time outcomes (blocked, quiz not
/// found) never produce a machine at all; once one exists it is Active
/// until exactly one submit or timeout finishes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Active,
    Finished,
}

/// A captured answer: the selected MCQ option string, or the judge verdict
/// for a coding question.
#[derive(Debug, Clone, PartialEq)]
pub enum AnswerValue {
    Choice(String),
    CodeVerdict { passed: bool },
}

/// Everything that can happen to an active session.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// One second elapsed.
    Tick,
    /// An answer was captured for the question at `index`.
    Answer { index: usize, value: AnswerValue },
    /// Navigation to the question at `index`.
    Goto { index: usize },
    /// The browser tab lost focus.
    FocusLost,
    /// Explicit submit.
    Submit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Submitted,
    TimedOut,
}

/// Outcome of feeding one event to the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Event absorbed; still active.
    Continued,
    /// This event caused the single Active -> Finished transition.
    Finished(FinishReason),
    /// No-op: the session is already finished, or the index was out of
    /// range. Terminal means terminal; late ticks and double submits land
    /// here.
    Ignored,
}

/// One user's in-flight quiz attempt. Lives only in memory; partial
/// progress is never persisted.
#[derive(Debug, Clone)]
pub struct QuizSession {
    pub id: Uuid,
    pub user_id: i64,
    pub enrollment_number: String,
    pub semester: i32,
    pub quiz_id: i64,
    pub quiz_name: String,
    pub round: i32,
    pub questions: Vec<Question>,
    pub current_index: usize,
    pub answers: HashMap<usize, AnswerValue>,
    pub remaining_seconds: u32,
    pub tab_switches: u32,
    pub phase: Phase,
    pub finished_at: Option<Instant>,
}

impl QuizSession {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        user_id: i64,
        enrollment_number: String,
        semester: i32,
        quiz_id: i64,
        quiz_name: String,
        round: i32,
        questions: Vec<Question>,
        duration_minutes: i32,
    ) -> Self {
        QuizSession {
            id: Uuid::new_v4(),
            user_id,
            enrollment_number,
            semester,
            quiz_id,
            quiz_name,
            round,
            questions,
            current_index: 0,
            answers: HashMap::new(),
            remaining_seconds: duration_minutes.max(0) as u32 * 60,
            tab_switches: 0,
            phase: Phase::Active,
            finished_at: None,
        }
    }

    /// Total transition function. Every event is handled in every phase;
    /// nothing panics and nothing re-enters Finished.
    pub fn handle(&mut self, event: SessionEvent) -> Transition {
        if self.phase == Phase::Finished {
            return Transition::Ignored;
        }

        match event {
            SessionEvent::Tick => {
                if self.remaining_seconds <= 1 {
                    self.remaining_seconds = 0;
                    self.finish();
                    Transition::Finished(FinishReason::TimedOut)
                } else {
                    self.remaining_seconds -= 1;
                    Transition::Continued
                }
            }
            SessionEvent::Answer { index, value } => {
                if index >= self.questions.len() {
                    return Transition::Ignored;
                }
                // Overwrites any earlier capture for the same question;
                // answers survive navigation.
                self.answers.insert(index, value);
                Transition::Continued
            }
            SessionEvent::Goto { index } => {
                if index >= self.questions.len() {
                    return Transition::Ignored;
                }
                self.current_index = index;
                Transition::Continued
            }
            SessionEvent::FocusLost => {
                // Deliberately undebounced: every loss-of-focus counts.
                self.tab_switches += 1;
                Transition::Continued
            }
            SessionEvent::Submit => {
                self.finish();
                Transition::Finished(FinishReason::Submitted)
            }
        }
    }

    pub fn score(&self) -> u32 {
        score::score_session(&self.questions, &self.answers)
    }

    pub fn answered_indexes(&self) -> Vec<usize> {
        let mut indexes: Vec<usize> = self.answers.keys().copied().collect();
        indexes.sort_unstable();
        indexes
    }

    fn finish(&mut self) {
        self.phase = Phase::Finished;
        self.finished_at = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::TestCase;

    fn mcq(text: &str, correct: &str) -> Question {
        Question::Mcq {
            question: text.to_string(),
            options: vec!["3".to_string(), "4".to_string(), "5".to_string()],
            correct_answer: correct.to_string(),
        }
    }

    fn session_with(questions: Vec<Question>, duration_minutes: i32) -> QuizSession {
        QuizSession::new(
            1,
            "210303105001".to_string(),
            3,
            10,
            "Round 1 Quiz".to_string(),
            1,
            questions,
            duration_minutes,
        )
    }

    #[test]
    fn ticks_decrement_by_one_and_time_out_exactly_once() {
        let mut s = session_with(vec![mcq("2+2?", "4")], 1);
        assert_eq!(s.remaining_seconds, 60);

        for expected in (2..60).rev() {
            assert_eq!(s.handle(SessionEvent::Tick), Transition::Continued);
            assert_eq!(s.remaining_seconds, expected);
        }

        assert_eq!(s.handle(SessionEvent::Tick), Transition::Continued);
        assert_eq!(s.remaining_seconds, 1);
        assert_eq!(
            s.handle(SessionEvent::Tick),
            Transition::Finished(FinishReason::TimedOut)
        );
        assert_eq!(s.remaining_seconds, 0);
        assert_eq!(s.phase, Phase::Finished);

        // the timer never fires twice
        assert_eq!(s.handle(SessionEvent::Tick), Transition::Ignored);
        assert_eq!(s.remaining_seconds, 0);
    }

    #[test]
    fn submit_disables_timer_driven_completion() {
        let mut s = session_with(vec![mcq("2+2?", "4")], 1);
        s.remaining_seconds = 1;
        assert_eq!(
            s.handle(SessionEvent::Submit),
            Transition::Finished(FinishReason::Submitted)
        );
        // the racing tick that would have timed out is a no-op
        assert_eq!(s.handle(SessionEvent::Tick), Transition::Ignored);
        assert_eq!(s.handle(SessionEvent::Submit), Transition::Ignored);
    }

    #[test]
    fn answers_persist_across_navigation_until_overwritten() {
        let mut s = session_with(vec![mcq("a", "4"), mcq("b", "4")], 1);

        s.handle(SessionEvent::Answer {
            index: 0,
            value: AnswerValue::Choice("3".to_string()),
        });
        s.handle(SessionEvent::Goto { index: 1 });
        s.handle(SessionEvent::Goto { index: 0 });
        assert_eq!(
            s.answers.get(&0),
            Some(&AnswerValue::Choice("3".to_string()))
        );

        s.handle(SessionEvent::Answer {
            index: 0,
            value: AnswerValue::Choice("4".to_string()),
        });
        assert_eq!(
            s.answers.get(&0),
            Some(&AnswerValue::Choice("4".to_string()))
        );
    }

    #[test]
    fn navigation_needs_no_answer_and_rejects_out_of_range() {
        let mut s = session_with(vec![mcq("a", "4"), mcq("b", "4")], 1);
        assert_eq!(s.handle(SessionEvent::Goto { index: 1 }), Transition::Continued);
        assert_eq!(s.current_index, 1);
        assert_eq!(s.handle(SessionEvent::Goto { index: 2 }), Transition::Ignored);
        assert_eq!(s.current_index, 1);
    }

    #[test]
    fn every_focus_loss_counts() {
        let mut s = session_with(vec![mcq("a", "4")], 1);
        s.handle(SessionEvent::FocusLost);
        s.handle(SessionEvent::FocusLost);
        assert_eq!(s.tab_switches, 2);

        // focus events after finishing are dropped
        s.handle(SessionEvent::Submit);
        assert_eq!(s.handle(SessionEvent::FocusLost), Transition::Ignored);
        assert_eq!(s.tab_switches, 2);
    }

    #[test]
    fn answered_correctly_then_submitted_scores_full() {
        let mut s = session_with(vec![mcq("2+2?", "4")], 1);
        s.handle(SessionEvent::Answer {
            index: 0,
            value: AnswerValue::Choice("4".to_string()),
        });
        s.handle(SessionEvent::Submit);
        assert_eq!(s.score(), 1);
    }

    #[test]
    fn timeout_with_no_answers_scores_zero() {
        let mut s = session_with(vec![mcq("2+2?", "4")], 1);
        s.remaining_seconds = 1;
        assert_eq!(
            s.handle(SessionEvent::Tick),
            Transition::Finished(FinishReason::TimedOut)
        );
        assert_eq!(s.score(), 0);
    }

    #[test]
    fn coding_answers_score_on_the_captured_verdict() {
        let coding = Question::Coding {
            question: "sum".to_string(),
            language: "C".to_string(),
            test_cases: vec![TestCase {
                input: "1 2".to_string(),
                output: "3".to_string(),
            }],
        };
        let mut s = session_with(vec![coding], 1);
        s.handle(SessionEvent::Answer {
            index: 0,
            value: AnswerValue::CodeVerdict { passed: true },
        });
        s.handle(SessionEvent::Submit);
        assert_eq!(s.score(), 1);
    }
}
