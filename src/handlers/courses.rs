// src/handlers/courses.rs

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use mongodb::bson::{Document, doc};
use serde_json::json;

use crate::{
    db::Db,
    error::AppError,
    models::course::{Course, CourseResponse, initial_courses},
};

/// Case-insensitive exact-title filter.
/// Titles come straight from the URL path, so regex metacharacters in them
/// must be escaped before being embedded in the pattern.
pub fn title_filter(title: &str) -> Document {
    let mut escaped = String::with_capacity(title.len());
    for c in title.chars() {
        if "\\^$.|?*+()[]{}".contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    doc! { "title": { "$regex": format!("^{}$", escaped), "$options": "i" } }
}

/// Lists all courses (without answer keys).
pub async fn list_courses(State(db): State<Db>) -> Result<impl IntoResponse, AppError> {
    let mut cursor = db.courses().find(doc! {}).await?;

    let mut courses: Vec<CourseResponse> = Vec::new();
    while cursor.advance().await? {
        let course: Course = cursor.deserialize_current()?;
        courses.push(CourseResponse::from(&course));
    }

    tracing::info!("Retrieved {} courses", courses.len());

    Ok(Json(courses))
}

/// Fetches a single course by title (case-insensitive).
pub async fn get_course(
    State(db): State<Db>,
    Path(title): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let course = db
        .courses()
        .find_one(title_filter(&title))
        .await?
        .ok_or(AppError::NotFound("Course not found".to_string()))?;

    Ok(Json(CourseResponse::from(&course)))
}

/// Seeds the course catalog. Does nothing if courses already exist.
pub async fn initialize_courses(State(db): State<Db>) -> Result<impl IntoResponse, AppError> {
    if db.courses().find_one(doc! {}).await?.is_some() {
        tracing::info!("Courses already exist, skipping initialization");
        return Ok(Json(json!({ "message": "Courses already initialized" })));
    }

    let courses = initial_courses();
    db.courses().insert_many(&courses).await?;

    tracing::info!("Initialized {} courses", courses.len());

    Ok(Json(json!({
        "message": format!("Successfully initialized {} courses", courses.len())
    })))
}

/// Drops and reseeds the course catalog.
pub async fn reinitialize_courses(State(db): State<Db>) -> Result<impl IntoResponse, AppError> {
    db.courses().drop().await?;
    // Course ids change on reseed, so cached per-course quizzes go stale.
    db.quizzes().drop().await?;

    let courses = initial_courses();
    db.courses().insert_many(&courses).await?;

    tracing::info!("Successfully reinitialized {} courses", courses.len());

    Ok(Json(json!({
        "message": format!("Successfully reinitialized {} courses", courses.len())
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_filter_escapes_regex_metacharacters() {
        let filter = title_filter("C++ (Advanced)");
        let inner = filter.get_document("title").unwrap();

        assert_eq!(
            inner.get_str("$regex").unwrap(),
            "^C\\+\\+ \\(Advanced\\)$"
        );
        assert_eq!(inner.get_str("$options").unwrap(), "i");
    }
}
