// src/handlers/quizzes.rs

use std::collections::HashMap;

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use chrono::Utc;
use mongodb::bson::{Bson, DateTime, doc, to_bson};
use serde_json::json;

use crate::{
    db::{Db, MAX_WRITE_ATTEMPTS, with_store_retry},
    error::AppError,
    handlers::courses::title_filter,
    models::{
        quiz::{Quiz, QuizResponse, ScoreResult, SubmitQuizRequest, evaluate},
        quiz_accuracy::QuizAccuracyRecord,
        user::StatsUpdate,
    },
    utils::jwt::Claims,
};

/// Fetches the quiz for a course, by course title (case-insensitive).
///
/// The quiz is assembled once from the course's lesson questions and kept in
/// the 'quizzes' collection under a stable id, so submissions can reference
/// it later. Answers are hidden by the response DTO.
pub async fn get_quiz(
    State(db): State<Db>,
    Path(course_title): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    tracing::info!("Fetching quiz for course: {}", course_title);

    let course = db
        .courses()
        .find_one(title_filter(&course_title))
        .await?
        .ok_or(AppError::NotFound("Course not found".to_string()))?;

    if let Some(quiz) = db
        .quizzes()
        .find_one(doc! { "course_id": &course.id })
        .await?
    {
        return Ok(Json(QuizResponse::from(&quiz)));
    }

    let questions: Vec<_> = course
        .lessons
        .iter()
        .flat_map(|lesson| lesson.quiz.iter().cloned())
        .collect();

    if questions.is_empty() {
        tracing::error!("No questions found for course: {}", course.title);
        return Err(AppError::NotFound(
            "No questions found for this course".to_string(),
        ));
    }

    let now = DateTime::from_chrono(Utc::now());
    let quiz = Quiz {
        id: uuid::Uuid::new_v4().to_string(),
        course_id: course.id.clone(),
        course_title: course.title.clone(),
        title: format!("{} Quiz", course.title),
        description: format!("Test your knowledge of {}", course.title),
        questions,
        created_at: now,
        updated_at: now,
    };

    if let Err(e) = db.quizzes().insert_one(&quiz).await {
        // Unique index on course_id: a concurrent fetch created it first.
        if e.to_string().contains("E11000") {
            let quiz = db
                .quizzes()
                .find_one(doc! { "course_id": &course.id })
                .await?
                .ok_or(AppError::InternalServerError(
                    "Quiz vanished after duplicate insert".to_string(),
                ))?;
            return Ok(Json(QuizResponse::from(&quiz)));
        }
        return Err(AppError::from(e));
    }

    tracing::info!("Created quiz {} for course: {}", quiz.id, course.title);

    Ok(Json(QuizResponse::from(&quiz)))
}

/// Submits a user's quiz answers and calculates the score.
///
/// * Validates the submission shape, then scores it against the stored quiz.
/// * Folds the score into the user's running average and appends the
///   accuracy record — one conditional write, retried on conflict, so
///   concurrent submissions by the same user cannot lose an increment.
pub async fn submit_quiz(
    State(db): State<Db>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SubmitQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = with_store_retry(|| async {
        db.quizzes()
            .find_one(doc! { "id": &req.quiz_id })
            .await
            .map_err(AppError::from)
    })
    .await?
    .ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    let score = evaluate(&quiz.questions, &req.answers)?;

    let stats = record_submission(&db, &claims.username, &score, &quiz, &req.answers).await?;

    Ok(Json(json!({
        "score": score.percentage,
        "correct_answers": score.correct,
        "total_questions": score.total,
        "total_quizzes_completed": stats.total_quizzes_completed,
        "average_score": stats.average_score,
    })))
}

/// Applies one scored submission to the user's aggregates.
///
/// The write is conditional on the `total_quizzes_completed` value the new
/// average was computed from; when two submissions race, the loser re-reads
/// and recomputes, so both end up reflected in the final count and average.
async fn record_submission(
    db: &Db,
    username: &str,
    score: &ScoreResult,
    quiz: &Quiz,
    answers: &HashMap<String, String>,
) -> Result<StatsUpdate, AppError> {
    let mut user = db
        .users()
        .find_one(doc! { "username": username })
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    for attempt in 1..=MAX_WRITE_ATTEMPTS {
        let stats = user.merge_submission(score.percentage);

        let record = QuizAccuracyRecord {
            id: uuid::Uuid::new_v4().to_string(),
            quiz_id: quiz.id.clone(),
            course_title: quiz.course_title.clone(),
            score: score.percentage,
            answers: answers.clone(),
            submitted_at: DateTime::from_chrono(Utc::now()),
        };
        let record = to_bson(&record)?;

        let filter = if user.total_quizzes_completed == 0 {
            // Documents from before stats existed have no counter field.
            doc! {
                "username": username,
                "total_quizzes_completed": { "$in": [0, Bson::Null] },
            }
        } else {
            doc! {
                "username": username,
                "total_quizzes_completed": user.total_quizzes_completed,
            }
        };

        let result = db
            .users()
            .update_one(
                filter,
                doc! {
                    "$set": {
                        "average_score": stats.average_score,
                        "total_quizzes_completed": stats.total_quizzes_completed,
                    },
                    "$push": { "quiz_accuracy": record },
                },
            )
            .await?;

        if result.matched_count == 1 {
            return Ok(stats);
        }

        tracing::warn!(
            "Concurrent submission detected for '{}', recomputing average (attempt {})",
            username,
            attempt
        );

        user = db
            .users()
            .find_one(doc! { "username": username })
            .await?
            .ok_or(AppError::NotFound("User not found".to_string()))?;
    }

    Err(AppError::Conflict(
        "User statistics changed concurrently too many times; please retry".to_string(),
    ))
}
