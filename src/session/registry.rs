// src/session/registry.rs

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use sqlx::PgPool;
use tokio::sync::Mutex;
use tokio::task::AbortHandle;
use uuid::Uuid;

use crate::config::{FINISHED_SESSION_TTL_SECS, SESSION_SWEEP_INTERVAL_SECS};
use crate::error::AppError;
use crate::models::question::{Question, TestCase};
use crate::models::result::{ReviewItem, SubmitResponse};
use crate::session::machine::{
    AnswerValue, FinishReason, Phase, QuizSession, SessionEvent, Transition,
};
use crate::session::score;

/// Score and review computed once at the Active -> Finished transition.
#[derive(Debug, Clone)]
struct FinalOutcome {
    score: u32,
    review: Vec<ReviewItem>,
}

struct SessionEntry {
    session: QuizSession,
    /// Outstanding one-second ticker. Cleared (and aborted) by whichever of
    /// submit, abandon, or timeout happens first.
    ticker: Option<AbortHandle>,
    outcome: Option<FinalOutcome>,
    /// Some(..) once the recorder ran; true means the row landed.
    recorded: Option<bool>,
}

/// Everything the recorder needs, snapshotted so the registry lock is not
/// held across the insert.
struct RecordJob {
    user_id: i64,
    enrollment_number: String,
    semester: i32,
    quiz_id: i64,
    score: i32,
    total_questions: i32,
    round: i32,
    tab_switches: i32,
}

impl RecordJob {
    fn from_session(session: &QuizSession, score: u32) -> Self {
        RecordJob {
            user_id: session.user_id,
            enrollment_number: session.enrollment_number.clone(),
            semester: session.semester,
            quiz_id: session.quiz_id,
            score: score as i32,
            total_questions: session.questions.len() as i32,
            round: session.round,
            tab_switches: session.tab_switches as i32,
        }
    }
}

/// Polling view of a session.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStateView {
    pub session_id: Uuid,
    pub phase: Phase,
    pub current_index: usize,
    pub remaining_seconds: u32,
    pub tab_switches: u32,
    pub total_questions: usize,
    pub answered: Vec<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recorded: Option<bool>,
}

/// In-memory table of live quiz sessions. Sessions are never persisted;
/// results are, best-effort, when a session finishes.
#[derive(Clone)]
pub struct SessionRegistry {
    pool: PgPool,
    inner: Arc<Mutex<HashMap<Uuid, SessionEntry>>>,
}

impl SessionRegistry {
    pub fn new(pool: PgPool) -> Self {
        SessionRegistry {
            pool,
            inner: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Installs a freshly started session and spawns its one-second ticker.
    pub async fn register(&self, session: QuizSession) {
        let id = session.id;
        {
            let mut map = self.inner.lock().await;
            map.insert(
                id,
                SessionEntry {
                    session,
                    ticker: None,
                    outcome: None,
                    recorded: None,
                },
            );
        }

        let registry = self.clone();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            // the first tick of a tokio interval fires immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                if !registry.tick(id).await {
                    break;
                }
            }
        });

        let mut map = self.inner.lock().await;
        if let Some(entry) = map.get_mut(&id) {
            entry.ticker = Some(handle.abort_handle());
        } else {
            handle.abort();
        }
    }

    /// One countdown step. Returns false when the ticker should stop.
    async fn tick(&self, id: Uuid) -> bool {
        let job = {
            let mut map = self.inner.lock().await;
            let Some(entry) = map.get_mut(&id) else {
                return false;
            };
            match entry.session.handle(SessionEvent::Tick) {
                Transition::Continued => return true,
                Transition::Finished(FinishReason::TimedOut) => {
                    entry.ticker.take();
                    let score = entry.session.score();
                    entry.outcome = Some(FinalOutcome {
                        score,
                        review: score::build_review(
                            &entry.session.questions,
                            &entry.session.answers,
                        ),
                    });
                    tracing::info!(
                        "Session {} timed out for user {} (round {})",
                        id,
                        entry.session.user_id,
                        entry.session.round
                    );
                    Some(RecordJob::from_session(&entry.session, score))
                }
                // submit won the race against this tick
                _ => {
                    entry.ticker.take();
                    None
                }
            }
        };

        if let Some(job) = job {
            let recorded = self.record(&job).await;
            let mut map = self.inner.lock().await;
            if let Some(entry) = map.get_mut(&id) {
                entry.recorded = Some(recorded);
            }
        }
        false
    }

    /// Captures an MCQ answer for the question at `index`.
    pub async fn submit_choice(
        &self,
        id: Uuid,
        user_id: i64,
        index: usize,
        choice: String,
    ) -> Result<(), AppError> {
        let mut map = self.inner.lock().await;
        let entry = owned_entry(&mut map, id, user_id)?;
        ensure_active(&entry.session)?;
        match entry.session.questions.get(index) {
            None => {
                return Err(AppError::BadRequest(
                    "Question index out of range".to_string(),
                ));
            }
            Some(Question::Coding { .. }) => {
                return Err(AppError::BadRequest(
                    "Coding questions are answered by running code".to_string(),
                ));
            }
            Some(Question::Mcq { .. }) => {}
        }
        entry.session.handle(SessionEvent::Answer {
            index,
            value: AnswerValue::Choice(choice),
        });
        Ok(())
    }

    /// Moves the cursor; never validates that anything was answered.
    pub async fn goto(&self, id: Uuid, user_id: i64, index: usize) -> Result<usize, AppError> {
        let mut map = self.inner.lock().await;
        let entry = owned_entry(&mut map, id, user_id)?;
        ensure_active(&entry.session)?;
        if entry.session.handle(SessionEvent::Goto { index }) == Transition::Ignored {
            return Err(AppError::BadRequest(
                "Question index out of range".to_string(),
            ));
        }
        Ok(entry.session.current_index)
    }

    /// Counts one loss-of-focus event. Events against a finished session
    /// are dropped rather than rejected.
    pub async fn focus_lost(&self, id: Uuid, user_id: i64) -> Result<u32, AppError> {
        let mut map = self.inner.lock().await;
        let entry = owned_entry(&mut map, id, user_id)?;
        entry.session.handle(SessionEvent::FocusLost);
        Ok(entry.session.tab_switches)
    }

    /// Snapshot of the coding question under the cursor, for the judge.
    pub async fn coding_task(
        &self,
        id: Uuid,
        user_id: i64,
    ) -> Result<(usize, String, Vec<TestCase>), AppError> {
        let mut map = self.inner.lock().await;
        let entry = owned_entry(&mut map, id, user_id)?;
        ensure_active(&entry.session)?;
        let index = entry.session.current_index;
        match entry.session.questions.get(index) {
            Some(Question::Coding {
                language,
                test_cases,
                ..
            }) => Ok((index, language.clone(), test_cases.clone())),
            _ => Err(AppError::BadRequest(
                "Current question is not a coding question".to_string(),
            )),
        }
    }

    /// Stores the judge verdict as the answer for `index`. Returns false
    /// when the session finished while the judge was running (the verdict
    /// is discarded; Finished is terminal).
    pub async fn record_verdict(
        &self,
        id: Uuid,
        user_id: i64,
        index: usize,
        passed: bool,
    ) -> Result<bool, AppError> {
        let mut map = self.inner.lock().await;
        let entry = owned_entry(&mut map, id, user_id)?;
        let transition = entry.session.handle(SessionEvent::Answer {
            index,
            value: AnswerValue::CodeVerdict { passed },
        });
        Ok(transition == Transition::Continued)
    }

    /// Explicit submit. Scores once, records once (best-effort), and leaves
    /// a finished entry behind for state polling until the sweeper drops
    /// it. A submit against an already-finished session returns the stored
    /// outcome without re-scoring or re-recording.
    pub async fn submit(&self, id: Uuid, user_id: i64) -> Result<SubmitResponse, AppError> {
        let (job, score, total_questions, tab_switches, review) = {
            let mut map = self.inner.lock().await;
            let entry = owned_entry(&mut map, id, user_id)?;
            match entry.session.handle(SessionEvent::Submit) {
                Transition::Finished(FinishReason::Submitted) => {
                    if let Some(ticker) = entry.ticker.take() {
                        ticker.abort();
                    }
                    let score = entry.session.score();
                    let review =
                        score::build_review(&entry.session.questions, &entry.session.answers);
                    entry.outcome = Some(FinalOutcome {
                        score,
                        review: review.clone(),
                    });
                    (
                        RecordJob::from_session(&entry.session, score),
                        score,
                        entry.session.questions.len(),
                        entry.session.tab_switches,
                        review,
                    )
                }
                // already finished (the countdown beat this request)
                _ => {
                    let outcome = entry.outcome.clone().unwrap_or_else(|| FinalOutcome {
                        score: entry.session.score(),
                        review: score::build_review(
                            &entry.session.questions,
                            &entry.session.answers,
                        ),
                    });
                    return Ok(SubmitResponse {
                        score: outcome.score,
                        total_questions: entry.session.questions.len(),
                        tab_switches: entry.session.tab_switches,
                        recorded: entry.recorded.unwrap_or(false),
                        review: outcome.review,
                    });
                }
            }
        };

        let recorded = self.record(&job).await;
        {
            let mut map = self.inner.lock().await;
            if let Some(entry) = map.get_mut(&id) {
                entry.recorded = Some(recorded);
            }
        }

        Ok(SubmitResponse {
            score,
            total_questions,
            tab_switches,
            recorded,
            review,
        })
    }

    /// Navigation away: discards session state, cancels the ticker,
    /// records nothing.
    pub async fn abandon(&self, id: Uuid, user_id: i64) -> Result<(), AppError> {
        let mut map = self.inner.lock().await;
        let owned = map
            .get(&id)
            .is_some_and(|entry| entry.session.user_id == user_id);
        if !owned {
            return Err(AppError::NotFound("Session not found".to_string()));
        }
        if let Some(entry) = map.remove(&id) {
            if let Some(ticker) = entry.ticker {
                ticker.abort();
            }
        }
        Ok(())
    }

    pub async fn state(&self, id: Uuid, user_id: i64) -> Result<SessionStateView, AppError> {
        let mut map = self.inner.lock().await;
        let entry = owned_entry(&mut map, id, user_id)?;
        Ok(SessionStateView {
            session_id: entry.session.id,
            phase: entry.session.phase,
            current_index: entry.session.current_index,
            remaining_seconds: entry.session.remaining_seconds,
            tab_switches: entry.session.tab_switches,
            total_questions: entry.session.questions.len(),
            answered: entry.session.answered_indexes(),
            score: entry.outcome.as_ref().map(|o| o.score),
            recorded: entry.recorded,
        })
    }

    /// Best-effort persistence. The UNIQUE (user_id, round) constraint
    /// plus ON CONFLICT DO NOTHING closes the two-tab race at the store;
    /// failures are logged and swallowed.
    async fn record(&self, job: &RecordJob) -> bool {
        let result = sqlx::query(
            r#"
            INSERT INTO quiz_results
                (user_id, enrollment_number, semester, quiz_id, score, total_questions, round, tab_switches)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (user_id, round) DO NOTHING
            "#,
        )
        .bind(job.user_id)
        .bind(&job.enrollment_number)
        .bind(job.semester)
        .bind(job.quiz_id)
        .bind(job.score)
        .bind(job.total_questions)
        .bind(job.round)
        .bind(job.tab_switches)
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) if done.rows_affected() > 0 => true,
            Ok(_) => {
                tracing::warn!(
                    "Result for user {} round {} already recorded, dropping duplicate",
                    job.user_id,
                    job.round
                );
                false
            }
            Err(e) => {
                tracing::error!(
                    "Failed to record result for user {} round {}: {:?}",
                    job.user_id,
                    job.round,
                    e
                );
                false
            }
        }
    }

    /// Periodically drops finished sessions after a grace period.
    pub fn spawn_sweeper(&self) -> tokio::task::JoinHandle<()> {
        let registry = self.clone();
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(Duration::from_secs(SESSION_SWEEP_INTERVAL_SECS));
            loop {
                interval.tick().await;
                registry.sweep().await;
            }
        })
    }

    async fn sweep(&self) {
        let ttl = Duration::from_secs(FINISHED_SESSION_TTL_SECS);
        let mut map = self.inner.lock().await;
        let before = map.len();
        map.retain(|_, entry| match entry.session.finished_at {
            Some(at) => at.elapsed() < ttl,
            None => true,
        });
        let dropped = before - map.len();
        if dropped > 0 {
            tracing::debug!("Swept {} finished session(s)", dropped);
        }
    }
}

fn owned_entry<'a>(
    map: &'a mut HashMap<Uuid, SessionEntry>,
    id: Uuid,
    user_id: i64,
) -> Result<&'a mut SessionEntry, AppError> {
    map.get_mut(&id)
        .filter(|entry| entry.session.user_id == user_id)
        .ok_or_else(|| AppError::NotFound("Session not found".to_string()))
}

fn ensure_active(session: &QuizSession) -> Result<(), AppError> {
    if session.phase != Phase::Active {
        return Err(AppError::Conflict("Session already finished".to_string()));
    }
    Ok(())
}
