// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::{PgPool, Postgres, QueryBuilder};
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        question::{Question, validate_questions},
        quiz::{CreateQuizRequest, Quiz, QuizSummary, UpdateQuizRequest, check_round_consistency},
        result::ResultOverviewEntry,
        user::User,
    },
    utils::sanitize::sanitize_question_text,
};

/// Cleans authored question text before storage.
fn sanitize_questions(questions: Vec<Question>) -> Vec<Question> {
    questions
        .into_iter()
        .map(|q| match q {
            Question::Mcq {
                question,
                options,
                correct_answer,
            } => Question::Mcq {
                question: sanitize_question_text(&question),
                options,
                correct_answer,
            },
            Question::Coding {
                question,
                language,
                test_cases,
            } => Question::Coding {
                question: sanitize_question_text(&question),
                language,
                test_cases,
            },
        })
        .collect()
}

/// Creates the quiz for a (round, semester) pair.
/// Admin only. One quiz per pair; a second create yields 409.
pub async fn create_quiz(
    State(pool): State<PgPool>,
    Json(payload): Json<CreateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }
    payload
        .check_round_consistency()
        .map_err(AppError::BadRequest)?;

    let questions = sanitize_questions(payload.questions);
    let name = Quiz::display_name(payload.round);

    let row: (i64,) = sqlx::query_as(
        r#"
        INSERT INTO quizzes (name, round, semester, duration_minutes, questions)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(&name)
    .bind(payload.round)
    .bind(payload.semester)
    .bind(payload.duration_minutes)
    .bind(sqlx::types::Json(&questions))
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        if e.to_string().contains("unique constraint") || e.to_string().contains("23505") {
            AppError::Conflict(format!(
                "A Round {} quiz for semester {} already exists",
                payload.round, payload.semester
            ))
        } else {
            tracing::error!("Failed to create quiz: {:?}", e);
            AppError::InternalServerError(e.to_string())
        }
    })?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({"id": row.0}))))
}

/// Lists all quizzes with question counts (bodies omitted).
/// Admin only.
pub async fn list_quizzes(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let quizzes = sqlx::query_as::<_, QuizSummary>(
        r#"
        SELECT id, name, round, semester, duration_minutes,
               jsonb_array_length(questions) AS question_count,
               created_at
        FROM quizzes
        ORDER BY created_at DESC
        "#,
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list quizzes: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(quizzes))
}

/// Fetches one quiz with its full question list (answer keys included) for
/// editing. Admin only.
pub async fn get_quiz(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = sqlx::query_as::<_, Quiz>(
        r#"
        SELECT id, name, round, semester, duration_minutes, questions, created_at
        FROM quizzes
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    Ok(Json(quiz))
}

/// Updates a quiz in place. Fields are optional.
/// Admin only.
pub async fn update_quiz(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.semester.is_none()
        && payload.duration_minutes.is_none()
        && payload.questions.is_none()
    {
        return Ok(StatusCode::OK);
    }

    // The stored round decides which question kinds the update may carry.
    let existing = sqlx::query_as::<_, Quiz>(
        r#"
        SELECT id, name, round, semester, duration_minutes, questions, created_at
        FROM quizzes
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    if let Some(semester) = payload.semester {
        if !(1..=8).contains(&semester) {
            return Err(AppError::BadRequest(
                "Semester must be between 1 and 8.".to_string(),
            ));
        }
    }
    if let Some(duration) = payload.duration_minutes {
        if duration < 1 {
            return Err(AppError::BadRequest(
                "Duration must be at least one minute.".to_string(),
            ));
        }
    }

    let questions = match payload.questions {
        Some(questions) => {
            validate_questions(&questions)
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            check_round_consistency(existing.round, &questions).map_err(AppError::BadRequest)?;
            Some(sanitize_questions(questions))
        }
        None => None,
    };

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE quizzes SET ");
    let mut separated = builder.separated(", ");

    if let Some(semester) = payload.semester {
        separated.push("semester = ");
        separated.push_bind_unseparated(semester);
    }

    if let Some(duration) = payload.duration_minutes {
        separated.push("duration_minutes = ");
        separated.push_bind_unseparated(duration);
    }

    if let Some(questions) = questions {
        separated.push("questions = ");
        separated.push_bind_unseparated(serde_json::to_value(questions).unwrap_or_default());
    }

    builder.push(" WHERE id = ");
    builder.push_bind(id);

    let result = builder.build().execute(&pool).await.map_err(|e| {
        if e.to_string().contains("unique constraint") || e.to_string().contains("23505") {
            AppError::Conflict(
                "A quiz for that round and semester already exists".to_string(),
            )
        } else {
            tracing::error!("Failed to update quiz: {:?}", e);
            AppError::InternalServerError(e.to_string())
        }
    })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Quiz not found".to_string()));
    }

    Ok(StatusCode::OK)
}

/// Deletes a quiz by ID.
/// Admin only.
pub async fn delete_quiz(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM quizzes WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete quiz: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Quiz not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Lists all registered users.
/// Admin only.
pub async fn list_users(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let users = sqlx::query_as::<_, User>(
        r#"
        SELECT id, enrollment_number, full_name, department, semester, password, role, created_at
        FROM users
        ORDER BY id DESC
        "#,
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list users: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(users))
}

/// Recorded results across all users, newest first.
/// Admin only.
pub async fn list_results(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let results = sqlx::query_as::<_, ResultOverviewEntry>(
        r#"
        SELECT r.enrollment_number, u.full_name, r.semester, r.round,
               r.score, r.total_questions, r.tab_switches, r.completed_at
        FROM quiz_results r
        JOIN users u ON r.user_id = u.id
        ORDER BY r.completed_at DESC
        "#,
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list results: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(results))
}
