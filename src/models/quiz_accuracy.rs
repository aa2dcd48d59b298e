// src/models/quiz_accuracy.rs

use std::collections::HashMap;

use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

/// One scored quiz attempt, embedded in the user document.
/// Append-only: records are never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizAccuracyRecord {
    pub id: String,
    pub quiz_id: String,
    pub course_title: String,

    /// Score as a percentage in [0, 100].
    pub score: f64,

    /// The submitted answers, keyed by question index (as a string).
    pub answers: HashMap<String, String>,

    pub submitted_at: DateTime,
}

/// DTO for dashboard listings of recent attempts.
#[derive(Debug, Serialize)]
pub struct QuizAccuracyResponse {
    pub quiz_id: String,
    pub course_title: String,
    pub score: f64,
    pub submitted_at: chrono::DateTime<chrono::Utc>,
}

impl From<&QuizAccuracyRecord> for QuizAccuracyResponse {
    fn from(record: &QuizAccuracyRecord) -> Self {
        QuizAccuracyResponse {
            quiz_id: record.quiz_id.clone(),
            course_title: record.course_title.clone(),
            score: record.score,
            submitted_at: record.submitted_at.to_chrono(),
        }
    }
}
