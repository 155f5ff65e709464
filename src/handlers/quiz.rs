// src/handlers/quiz.rs

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::{
        question::PublicQuestion,
        quiz::Quiz,
        user::User,
    },
    runner::CodeRunner,
    session::{machine::QuizSession, registry::SessionRegistry, select::select_questions},
    utils::jwt::Claims,
};

#[derive(Debug, Deserialize, Validate)]
pub struct StartQuizRequest {
    #[validate(range(min = 1, max = 2, message = "Round must be 1 or 2."))]
    pub round: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionResponse {
    pub session_id: Uuid,
    pub quiz_name: String,
    pub round: i32,
    pub duration_minutes: i32,
    pub remaining_seconds: u32,
    pub total_questions: usize,
    pub questions: Vec<PublicQuestion>,
}

/// Starts a quiz session for the authenticated student.
///
/// * Entry guard: an existing result for (user, round) yields 409 and no
///   session is ever created.
/// * Missing quiz for (round, user's semester) yields 404.
/// * Otherwise draws the session's question subset and spawns the
///   countdown. Answer keys never leave the server.
pub async fn start(
    State(pool): State<PgPool>,
    State(registry): State<SessionRegistry>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<StartQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }
    let user_id = claims.user_id()?;
    if claims.role == "admin" {
        return Err(AppError::Forbidden(
            "Admin accounts cannot attempt quizzes".to_string(),
        ));
    }

    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, enrollment_number, full_name, department, semester, password, role, created_at
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::AuthError("User not found".to_string()))?;

    // Entry guard. The store-level UNIQUE constraint backs this up if two
    // tabs race past the check.
    let already_attempted =
        sqlx::query("SELECT id FROM quiz_results WHERE user_id = $1 AND round = $2")
            .bind(user_id)
            .bind(payload.round)
            .fetch_optional(&pool)
            .await?;

    if already_attempted.is_some() {
        return Err(AppError::Conflict(format!(
            "You have already attempted the Round {} quiz",
            payload.round
        )));
    }

    let quiz = sqlx::query_as::<_, Quiz>(
        r#"
        SELECT id, name, round, semester, duration_minutes, questions, created_at
        FROM quizzes
        WHERE round = $1 AND semester = $2
        "#,
    )
    .bind(payload.round)
    .bind(user.semester)
    .fetch_optional(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch quiz: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?
    .ok_or_else(|| {
        AppError::NotFound(format!(
            "A Round {} quiz for semester {} hasn't been created yet. Please check back later!",
            payload.round, user.semester
        ))
    })?;

    let target = Config::question_count_for_round(payload.round);
    let selected = select_questions(&mut rand::thread_rng(), &quiz.questions.0, target);

    let session = QuizSession::new(
        user.id,
        user.enrollment_number,
        user.semester,
        quiz.id,
        quiz.name,
        payload.round,
        selected,
        quiz.duration_minutes,
    );

    let response = StartSessionResponse {
        session_id: session.id,
        quiz_name: session.quiz_name.clone(),
        round: session.round,
        duration_minutes: quiz.duration_minutes,
        remaining_seconds: session.remaining_seconds,
        total_questions: session.questions.len(),
        questions: session.questions.iter().map(PublicQuestion::from).collect(),
    };

    tracing::info!(
        "Session {} started: user {} round {} ({} questions)",
        response.session_id,
        user.id,
        payload.round,
        response.total_questions
    );

    registry.register(session).await;

    Ok((StatusCode::CREATED, Json(response)))
}

/// Polls the session state (phase, cursor, countdown, tab switches; score
/// once finished).
pub async fn state(
    State(registry): State<SessionRegistry>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let view = registry.state(id, claims.user_id()?).await?;
    Ok(Json(view))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRequest {
    pub question_index: usize,
    pub answer: String,
}

/// Captures an MCQ answer. Overwrites any earlier capture for the same
/// question; navigation never invalidates it.
pub async fn answer(
    State(registry): State<SessionRegistry>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    registry
        .submit_choice(id, claims.user_id()?, payload.question_index, payload.answer)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionRequest {
    pub question_index: usize,
}

/// Moves the question cursor (previous/next/jump are all the same
/// operation server-side).
pub async fn position(
    State(registry): State<SessionRegistry>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<PositionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let index = registry
        .goto(id, claims.user_id()?, payload.question_index)
        .await?;
    Ok(Json(serde_json::json!({ "currentIndex": index })))
}

/// Records one loss-of-focus event reported by the client.
pub async fn focus_loss(
    State(registry): State<SessionRegistry>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let count = registry.focus_lost(id, claims.user_id()?).await?;
    Ok(Json(serde_json::json!({ "tabSwitches": count })))
}

#[derive(Debug, Deserialize)]
pub struct RunCodeRequest {
    pub code: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCaseResult {
    pub expected_output: String,
    pub actual_output: String,
    pub passed: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunCodeResponse {
    /// "Accepted" or "Wrong Answer", mirroring the judge's verdict line.
    pub status: String,
    pub passed: bool,
    /// False when the session finished while the judge was running; the
    /// verdict was discarded in that case.
    pub captured: bool,
    pub results: Vec<TestCaseResult>,
}

/// Runs submitted code for the coding question under the cursor and
/// captures the pass/fail verdict as its answer. A run passes only if the
/// output of every test case matches byte-for-byte.
pub async fn run_code(
    State(registry): State<SessionRegistry>,
    State(runner): State<Arc<dyn CodeRunner>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RunCodeRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    if payload.code.trim().is_empty() {
        return Err(AppError::BadRequest("Missing code".to_string()));
    }

    let (index, language, test_cases) = registry.coding_task(id, user_id).await?;

    let mut results = Vec::with_capacity(test_cases.len());
    let mut passed_all = true;
    for case in &test_cases {
        let run = runner.run(&language, &case.input, &payload.code).await?;
        let passed = run.output.as_deref() == Some(case.output.as_str());
        if !passed {
            passed_all = false;
        }
        results.push(TestCaseResult {
            expected_output: case.output.clone(),
            actual_output: run.output.or(run.error).unwrap_or_default(),
            passed,
        });
    }

    let captured = registry
        .record_verdict(id, user_id, index, passed_all)
        .await?;

    Ok(Json(RunCodeResponse {
        status: if passed_all {
            "Accepted".to_string()
        } else {
            "Wrong Answer".to_string()
        },
        passed: passed_all,
        captured,
        results,
    }))
}

/// Explicit submit: scores once, records the result once (best-effort) and
/// returns the finish-screen payload.
pub async fn submit(
    State(registry): State<SessionRegistry>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = registry.submit(id, claims.user_id()?).await?;
    Ok(Json(outcome))
}

/// Navigation away: discards the session without recording anything.
pub async fn abandon(
    State(registry): State<SessionRegistry>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    registry.abandon(id, claims.user_id()?).await?;
    Ok(StatusCode::NO_CONTENT)
}
