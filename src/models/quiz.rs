// src/models/quiz.rs

use std::collections::HashMap;

use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// A single quiz question, embedded in course lessons and quiz documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub text: String,

    /// Ordered list of options shown to the user.
    pub options: Vec<String>,

    pub correct_answer: CorrectAnswer,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// Stored form of a correct answer.
///
/// Older course data stores the index of the correct option, newer data
/// stores the option text itself. Both forms deserialize here and are
/// resolved to the option string before any comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CorrectAnswer {
    Index(i64),
    Text(String),
}

impl CorrectAnswer {
    /// Resolves the stored answer to the option text it references.
    /// Returns `None` for an index with no matching option.
    pub fn resolve<'a>(&'a self, options: &'a [String]) -> Option<&'a str> {
        match self {
            CorrectAnswer::Index(i) => usize::try_from(*i)
                .ok()
                .and_then(|i| options.get(i))
                .map(String::as_str),
            CorrectAnswer::Text(text) => Some(text.as_str()),
        }
    }
}

/// Represents a document in the 'quizzes' collection.
/// One quiz per course, assembled from the course's lesson questions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quiz {
    pub id: String,
    pub course_id: String,
    pub course_title: String,
    pub title: String,
    pub description: String,
    pub questions: Vec<QuizQuestion>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

/// DTO for sending a question to the client (excludes answer and analysis).
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub text: String,
    pub options: Vec<String>,
}

impl From<&QuizQuestion> for PublicQuestion {
    fn from(q: &QuizQuestion) -> Self {
        PublicQuestion {
            text: q.text.clone(),
            options: q.options.clone(),
        }
    }
}

/// DTO for returning a quiz without its answer key.
#[derive(Debug, Serialize)]
pub struct QuizResponse {
    pub id: String,
    pub course_id: String,
    pub course_title: String,
    pub title: String,
    pub description: String,
    pub questions: Vec<PublicQuestion>,
}

impl From<&Quiz> for QuizResponse {
    fn from(quiz: &Quiz) -> Self {
        QuizResponse {
            id: quiz.id.clone(),
            course_id: quiz.course_id.clone(),
            course_title: quiz.course_title.clone(),
            title: quiz.title.clone(),
            description: quiz.description.clone(),
            questions: quiz.questions.iter().map(PublicQuestion::from).collect(),
        }
    }
}

/// DTO for submitting a quiz attempt.
#[derive(Debug, Deserialize)]
pub struct SubmitQuizRequest {
    pub quiz_id: String,

    /// User's answers map.
    /// Key: question index as a decimal string ("0", "1", ...)
    /// Value: the selected option text
    pub answers: HashMap<String, String>,
}

/// Outcome of scoring one submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreResult {
    pub correct: usize,
    pub total: usize,
    pub percentage: f64,
}

/// Scores a submission against a quiz's question list.
///
/// * `total` is the number of questions, not the number of submitted answers;
///   questions with no submitted answer count as incorrect.
/// * Answers are compared trimmed and case-insensitively, after resolving the
///   stored correct answer to its option text.
/// * A submitted index outside `[0, total)` or an unparseable key is a
///   validation error, not a wrong answer.
pub fn evaluate(
    questions: &[QuizQuestion],
    answers: &HashMap<String, String>,
) -> Result<ScoreResult, AppError> {
    if questions.is_empty() {
        return Err(AppError::BadRequest(
            "Quiz has no questions to score".to_string(),
        ));
    }
    if answers.is_empty() {
        return Err(AppError::BadRequest("No answers submitted".to_string()));
    }

    let total = questions.len();
    let mut correct = 0;

    for (key, submitted) in answers {
        let index = key.trim().parse::<usize>().map_err(|_| {
            AppError::BadRequest(format!("Invalid question index '{}'", key))
        })?;

        let question = questions.get(index).ok_or_else(|| {
            AppError::BadRequest(format!(
                "Question index {} is out of range (quiz has {} questions)",
                index, total
            ))
        })?;

        let expected = question
            .correct_answer
            .resolve(&question.options)
            .ok_or_else(|| {
                AppError::InternalServerError(format!(
                    "Question {} references a correct answer outside its options",
                    index
                ))
            })?;

        if normalize(submitted) == normalize(expected) {
            correct += 1;
        }
    }

    Ok(ScoreResult {
        correct,
        total,
        percentage: correct as f64 * 100.0 / total as f64,
    })
}

fn normalize(answer: &str) -> String {
    answer.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(text: &str, options: &[&str], correct: CorrectAnswer) -> QuizQuestion {
        QuizQuestion {
            text: text.to_string(),
            options: options.iter().map(|s| s.to_string()).collect(),
            correct_answer: correct,
            explanation: None,
        }
    }

    fn answers(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn full_score_with_mixed_answer_forms_and_case() {
        // One correct answer stored as text, one as an option index.
        let questions = vec![
            question("q0", &["A", "B"], CorrectAnswer::Text("B".to_string())),
            question("q1", &["A", "B"], CorrectAnswer::Index(0)),
        ];

        let result = evaluate(&questions, &answers(&[("0", "b"), ("1", "A")])).unwrap();

        assert_eq!(result.correct, 2);
        assert_eq!(result.total, 2);
        assert_eq!(result.percentage, 100.0);
    }

    #[test]
    fn unanswered_questions_count_as_incorrect() {
        let questions = vec![
            question("q0", &["A", "B"], CorrectAnswer::Text("A".to_string())),
            question("q1", &["A", "B"], CorrectAnswer::Text("B".to_string())),
        ];

        let result = evaluate(&questions, &answers(&[("0", "A")])).unwrap();

        assert_eq!(result.correct, 1);
        assert_eq!(result.total, 2);
        assert_eq!(result.percentage, 50.0);
    }

    #[test]
    fn whitespace_is_trimmed_on_both_sides() {
        let questions = vec![question(
            "q0",
            &["Ohm", "Volt"],
            CorrectAnswer::Text(" Ohm ".to_string()),
        )];

        let result = evaluate(&questions, &answers(&[("0", "ohm  ")])).unwrap();
        assert_eq!(result.percentage, 100.0);
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let questions = vec![question("q0", &["A"], CorrectAnswer::Index(0))];

        let err = evaluate(&questions, &answers(&[("3", "A")])).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn non_numeric_key_is_rejected() {
        let questions = vec![question("q0", &["A"], CorrectAnswer::Index(0))];

        for key in ["abc", "-1", "1.5"] {
            let err = evaluate(&questions, &answers(&[(key, "A")])).unwrap_err();
            assert!(matches!(err, AppError::BadRequest(_)), "key '{}'", key);
        }
    }

    #[test]
    fn empty_quiz_is_an_error_not_a_zero_score() {
        let err = evaluate(&[], &answers(&[("0", "A")])).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn empty_submission_is_rejected() {
        let questions = vec![question("q0", &["A"], CorrectAnswer::Index(0))];

        let err = evaluate(&questions, &HashMap::new()).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn corrupt_correct_answer_index_fails_evaluation() {
        let questions = vec![question("q0", &["A", "B"], CorrectAnswer::Index(5))];

        let err = evaluate(&questions, &answers(&[("0", "A")])).unwrap_err();
        assert!(matches!(err, AppError::InternalServerError(_)));
    }

    #[test]
    fn evaluation_is_deterministic_and_bounded() {
        let questions = vec![
            question("q0", &["A", "B"], CorrectAnswer::Index(1)),
            question("q1", &["A", "B"], CorrectAnswer::Index(0)),
            question("q2", &["A", "B"], CorrectAnswer::Text("B".to_string())),
        ];
        let submission = answers(&[("0", "A"), ("1", "A"), ("2", "b")]);

        let first = evaluate(&questions, &submission).unwrap();
        for _ in 0..10 {
            let again = evaluate(&questions, &submission).unwrap();
            assert_eq!(again, first);
        }
        assert!(first.percentage >= 0.0 && first.percentage <= 100.0);
        assert_eq!(first.correct, 2);
    }
}
