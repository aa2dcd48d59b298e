// src/handlers/profile.rs

use axum::{Extension, Json, extract::State, response::IntoResponse};
use mongodb::bson::doc;

use crate::{
    db::Db,
    error::AppError,
    models::{quiz_accuracy::QuizAccuracyResponse, user::MeResponse},
    utils::jwt::Claims,
};

/// Get current user's profile, streak and quiz statistics.
/// Backs the dashboard cards: current streak, quizzes completed, accuracy,
/// and the most recent attempts.
pub async fn get_me(
    State(db): State<Db>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user = db
        .users()
        .find_one(doc! { "username": &claims.username })
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    // Most recent first; the record list itself is append-only.
    let recent_quizzes: Vec<QuizAccuracyResponse> = user
        .quiz_accuracy
        .iter()
        .rev()
        .take(5)
        .map(QuizAccuracyResponse::from)
        .collect();

    Ok(Json(MeResponse {
        id: user.id,
        username: user.username,
        email: user.email,
        role: user.role,
        about: user.about,
        joined_date: user.created_at.to_chrono(),
        followers_count: user.followers_count,
        following_count: user.following_count,
        total_quizzes_completed: user.total_quizzes_completed,
        average_score: user.average_score,
        current_streak: user.current_streak,
        longest_streak: user.longest_streak,
        last_login: user.last_login.map(|d| d.to_chrono()),
        recent_quizzes,
    }))
}
