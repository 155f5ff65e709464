// src/handlers/results.rs

use axum::{Extension, Json, extract::State, response::IntoResponse};
use sqlx::PgPool;

use crate::{error::AppError, models::result::QuizResult, utils::jwt::Claims};

/// Lists the authenticated user's recorded results, one per round.
pub async fn my_results(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let results = sqlx::query_as::<_, QuizResult>(
        r#"
        SELECT id, user_id, enrollment_number, semester, quiz_id, score,
               total_questions, round, tab_switches, completed_at
        FROM quiz_results
        WHERE user_id = $1
        ORDER BY round
        "#,
    )
    .bind(claims.user_id()?)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch results: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(results))
}
