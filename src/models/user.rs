// src/models/user.rs

use chrono::Utc;
use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::AppError;
use crate::models::quiz_accuracy::{QuizAccuracyRecord, QuizAccuracyResponse};

fn default_role() -> String {
    "Student".to_string()
}

/// Represents a document in the 'users' collection.
///
/// The user document is the single owner of streak, aggregate-score and
/// social-graph state. Most fields carry serde defaults so documents written
/// by earlier versions of the data model still deserialize.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,

    /// Unique username. Also the key under which this user appears in other
    /// users' follower/following lists.
    pub username: String,

    /// Unique email address.
    pub email: String,

    /// Argon2 password hash. Never returned to clients; handlers respond
    /// with DTOs, not with this document.
    pub password: String,

    #[serde(default = "default_role")]
    pub role: String,

    #[serde(default)]
    pub about: String,

    /// Usernames following this user.
    #[serde(default)]
    pub followers: Vec<String>,

    /// Usernames this user follows.
    #[serde(default)]
    pub following: Vec<String>,

    /// Always recomputed from the set sizes, never incremented on its own.
    #[serde(default)]
    pub followers_count: i64,

    #[serde(default)]
    pub following_count: i64,

    /// Append-only history of scored quiz attempts.
    #[serde(default)]
    pub quiz_accuracy: Vec<QuizAccuracyRecord>,

    #[serde(default)]
    pub total_quizzes_completed: i64,

    /// Running average over all completed quizzes; 0 when none completed.
    #[serde(default)]
    pub average_score: f64,

    /// Append-only, one event per successful login.
    #[serde(default)]
    pub login_history: Vec<LoginEvent>,

    #[serde(default)]
    pub current_streak: i64,

    #[serde(default)]
    pub longest_streak: i64,

    #[serde(default)]
    pub last_login: Option<DateTime>,

    pub created_at: DateTime,
}

/// One login, with the streak value it produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginEvent {
    pub date: DateTime,
    pub streak_count: i64,
}

/// Streak fields recomputed for one successful login. Returned by
/// [`User::advance_streak`]; the login handler persists it conditionally.
#[derive(Debug, Clone, PartialEq)]
pub struct StreakUpdate {
    pub current_streak: i64,
    pub longest_streak: i64,
    pub last_login: DateTime,
    pub event: LoginEvent,
}

/// Aggregate fields recomputed for one recorded quiz submission.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsUpdate {
    pub total_quizzes_completed: i64,
    pub average_score: f64,
}

impl User {
    /// Builds a fresh user document with empty graph, streak and stats state.
    pub fn new(username: String, email: String, password_hash: String) -> Self {
        let now = DateTime::from_chrono(Utc::now());
        User {
            id: uuid::Uuid::new_v4().to_string(),
            username,
            email,
            password: password_hash,
            role: default_role(),
            about: String::new(),
            followers: Vec::new(),
            following: Vec::new(),
            followers_count: 0,
            following_count: 0,
            quiz_accuracy: Vec::new(),
            total_quizzes_completed: 0,
            average_score: 0.0,
            login_history: Vec::new(),
            current_streak: 0,
            longest_streak: 0,
            last_login: None,
            created_at: now,
        }
    }

    /// Derives the streak state for a login happening at `now`.
    ///
    /// Pure function over the prior streak fields; the caller persists the
    /// result. Streaks are counted in calendar days:
    /// * first ever login starts a streak of 1,
    /// * a login exactly one day after the previous extends the streak,
    /// * a login on the same day leaves it unchanged,
    /// * a gap of two or more days resets it to 1,
    /// * `now` before the recorded last login is reported as an error, never
    ///   silently corrected.
    ///
    /// Exactly one `LoginEvent` is produced per invocation.
    pub fn advance_streak(&self, now: chrono::DateTime<Utc>) -> Result<StreakUpdate, AppError> {
        let current_streak = match self.last_login {
            None => 1,
            Some(last) => {
                let days = now
                    .date_naive()
                    .signed_duration_since(last.to_chrono().date_naive())
                    .num_days();
                if days < 0 {
                    return Err(AppError::InternalServerError(format!(
                        "Login timestamp for '{}' predates the recorded last login by {} day(s)",
                        self.username, -days
                    )));
                }
                match days {
                    0 => self.current_streak,
                    1 => self.current_streak + 1,
                    _ => 1,
                }
            }
        };

        let last_login = DateTime::from_chrono(now);

        Ok(StreakUpdate {
            current_streak,
            longest_streak: self.longest_streak.max(current_streak),
            last_login,
            event: LoginEvent {
                date: last_login,
                streak_count: current_streak,
            },
        })
    }

    /// Folds one quiz percentage into the running average.
    ///
    /// Pure function; the caller persists the result with a conditional
    /// write keyed on the prior `total_quizzes_completed` so concurrent
    /// submissions cannot lose an increment.
    pub fn merge_submission(&self, percentage: f64) -> StatsUpdate {
        let completed = self.total_quizzes_completed + 1;
        let average =
            (self.average_score * self.total_quizzes_completed as f64 + percentage)
                / completed as f64;

        StatsUpdate {
            total_quizzes_completed: completed,
            average_score: average,
        }
    }
}

/// Durable record of an in-flight follow/unfollow operation.
///
/// Written before the first of the two one-document graph writes and removed
/// after the second; the reconciler re-applies any intent left behind by a
/// crash or client disconnect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowIntent {
    pub id: String,
    pub actor: String,
    pub target: String,
    pub action: FollowAction,
    pub created_at: DateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FollowAction {
    Follow,
    Unfollow,
}

impl FollowIntent {
    pub fn new(actor: &str, target: &str, action: FollowAction) -> Self {
        FollowIntent {
            id: uuid::Uuid::new_v4().to_string(),
            actor: actor.to_string(),
            target: target.to_string(),
            action,
            created_at: DateTime::from_chrono(Utc::now()),
        }
    }
}

/// DTO for creating a new user (Registration).
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(
        min = 3,
        max = 50,
        message = "Username length must be between 3 and 50 characters."
    ))]
    pub username: String,
    #[validate(email(message = "Email address is not valid."))]
    pub email: String,
    #[validate(length(
        min = 4,
        max = 128,
        message = "Password length must be between 4 and 128 characters."
    ))]
    pub password: String,
}

/// DTO for user login.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 50))]
    pub username: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

/// DTO returned after registration (excludes password hash).
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub username: String,
    pub email: String,
}

/// Public profile of any user.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub username: String,
    pub role: String,
    pub about: String,
    pub joined_date: chrono::DateTime<Utc>,
    pub followers: Vec<String>,
    pub following: Vec<String>,
    pub followers_count: i64,
    pub following_count: i64,
}

impl From<&User> for ProfileResponse {
    fn from(user: &User) -> Self {
        ProfileResponse {
            username: user.username.clone(),
            role: user.role.clone(),
            about: user.about.clone(),
            joined_date: user.created_at.to_chrono(),
            followers: user.followers.clone(),
            following: user.following.clone(),
            followers_count: user.followers_count,
            following_count: user.following_count,
        }
    }
}

/// Aggregated dashboard data for the current user.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub role: String,
    pub about: String,
    pub joined_date: chrono::DateTime<Utc>,
    pub followers_count: i64,
    pub following_count: i64,
    pub total_quizzes_completed: i64,
    pub average_score: f64,
    pub current_streak: i64,
    pub longest_streak: i64,
    pub last_login: Option<chrono::DateTime<Utc>>,
    pub recent_quizzes: Vec<QuizAccuracyResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn user_with_streak(
        last_login: Option<chrono::DateTime<Utc>>,
        current_streak: i64,
        longest_streak: i64,
    ) -> User {
        let mut user = User::new(
            "alice".to_string(),
            "alice@example.com".to_string(),
            "hash".to_string(),
        );
        user.last_login = last_login.map(DateTime::from_chrono);
        user.current_streak = current_streak;
        user.longest_streak = longest_streak;
        user
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn first_login_starts_streak_at_one() {
        let user = user_with_streak(None, 0, 0);
        let update = user.advance_streak(at(2026, 3, 1, 9)).unwrap();

        assert_eq!(update.current_streak, 1);
        assert_eq!(update.longest_streak, 1);
        assert_eq!(update.event.streak_count, 1);
    }

    #[test]
    fn consecutive_days_extend_the_streak() {
        // n logins on n consecutive days yield a streak of n.
        let mut user = user_with_streak(None, 0, 0);
        for day in 1..=7 {
            let update = user.advance_streak(at(2026, 3, day, 8)).unwrap();
            assert_eq!(update.current_streak, day as i64);

            user.last_login = Some(update.last_login);
            user.current_streak = update.current_streak;
            user.longest_streak = update.longest_streak;
        }
        assert_eq!(user.current_streak, 7);
        assert_eq!(user.longest_streak, 7);
    }

    #[test]
    fn same_day_login_keeps_streak_but_still_records_an_event() {
        let user = user_with_streak(Some(at(2026, 3, 2, 7)), 3, 5);
        // Later the same calendar day.
        let update = user.advance_streak(at(2026, 3, 2, 22)).unwrap();

        assert_eq!(update.current_streak, 3);
        assert_eq!(update.longest_streak, 5);
        assert_eq!(update.event.streak_count, 3);
    }

    #[test]
    fn midnight_boundary_counts_as_next_day() {
        let user = user_with_streak(Some(at(2026, 3, 1, 23)), 2, 2);
        let update = user.advance_streak(at(2026, 3, 2, 0)).unwrap();

        assert_eq!(update.current_streak, 3);
    }

    #[test]
    fn gap_of_two_days_resets_streak() {
        let user = user_with_streak(Some(at(2026, 3, 1, 9)), 6, 6);
        let update = user.advance_streak(at(2026, 3, 4, 9)).unwrap();

        assert_eq!(update.current_streak, 1);
        // Longest streak never decreases.
        assert_eq!(update.longest_streak, 6);
    }

    #[test]
    fn clock_skew_is_reported_not_fixed() {
        let user = user_with_streak(Some(at(2026, 3, 10, 9)), 2, 2);
        let err = user.advance_streak(at(2026, 3, 8, 9)).unwrap_err();

        assert!(matches!(err, AppError::InternalServerError(_)));
    }

    #[test]
    fn longest_streak_is_monotonic_across_a_login_sequence() {
        let mut user = user_with_streak(None, 0, 0);
        let days = [1u32, 2, 3, 7, 8, 20, 21, 22, 23];
        let mut previous_longest = 0;

        for day in days {
            let update = user.advance_streak(at(2026, 4, day, 12)).unwrap();
            assert!(update.longest_streak >= previous_longest);
            previous_longest = update.longest_streak;

            user.last_login = Some(update.last_login);
            user.current_streak = update.current_streak;
            user.longest_streak = update.longest_streak;
        }
        // Longest run in the sequence is 20..=23.
        assert_eq!(user.longest_streak, 4);
        assert_eq!(user.current_streak, 4);
    }

    #[test]
    fn merge_submission_updates_running_average() {
        let mut user = user_with_streak(None, 0, 0);
        user.total_quizzes_completed = 1;
        user.average_score = 80.0;

        let stats = user.merge_submission(100.0);

        assert_eq!(stats.total_quizzes_completed, 2);
        assert_eq!(stats.average_score, 90.0);
    }

    #[test]
    fn merge_submission_from_zero_completed() {
        let user = user_with_streak(None, 0, 0);

        let stats = user.merge_submission(60.0);

        assert_eq!(stats.total_quizzes_completed, 1);
        assert_eq!(stats.average_score, 60.0);
    }

    #[test]
    fn merged_averages_stay_in_range() {
        let mut user = user_with_streak(None, 0, 0);
        for score in [0.0, 100.0, 33.0, 50.0, 100.0, 0.0] {
            let stats = user.merge_submission(score);
            assert!(stats.average_score >= 0.0 && stats.average_score <= 100.0);
            user.total_quizzes_completed = stats.total_quizzes_completed;
            user.average_score = stats.average_score;
        }
    }

    #[test]
    fn concurrent_submissions_in_either_order_agree() {
        // Serializing two submissions (60 then 100, or 100 then 60) from a
        // fresh user must end at count 2, average 80.
        for (first, second) in [(60.0, 100.0), (100.0, 60.0)] {
            let mut user = user_with_streak(None, 0, 0);

            let s1 = user.merge_submission(first);
            user.total_quizzes_completed = s1.total_quizzes_completed;
            user.average_score = s1.average_score;

            let s2 = user.merge_submission(second);
            assert_eq!(s2.total_quizzes_completed, 2);
            assert_eq!(s2.average_score, 80.0);
        }
    }
}
