// src/db.rs

use std::future::Future;
use std::time::Duration;

use mongodb::{
    Client, Collection, Database, IndexModel,
    bson::doc,
    options::IndexOptions,
};

use crate::{
    config::Config,
    error::AppError,
    models::{
        course::Course,
        quiz::Quiz,
        user::{FollowIntent, User},
    },
};

/// How many times a transient store failure is retried before surfacing 503.
const STORE_RETRY_ATTEMPTS: u32 = 3;

/// How many times a conditional write is recomputed and retried after losing
/// a race, before the request fails with a conflict.
pub const MAX_WRITE_ATTEMPTS: u32 = 5;

/// Handle to the document store.
///
/// Owns the database connection and exposes the typed collections the
/// application works with. Constructed once at startup and injected into
/// handlers through `AppState` (no global connection state).
#[derive(Clone)]
pub struct Db {
    database: Database,
}

impl Db {
    /// Connects to the store and verifies the connection with a ping.
    pub async fn connect(config: &Config) -> Result<Self, AppError> {
        let client = Client::with_uri_str(&config.mongodb_url).await?;
        let database = client.database(&config.mongodb_db);

        // Fail fast if the server is unreachable instead of on the first query.
        database.run_command(doc! { "ping": 1 }).await?;

        Ok(Self { database })
    }

    pub fn users(&self) -> Collection<User> {
        self.database.collection("users")
    }

    pub fn courses(&self) -> Collection<Course> {
        self.database.collection("courses")
    }

    pub fn quizzes(&self) -> Collection<Quiz> {
        self.database.collection("quizzes")
    }

    pub fn follow_intents(&self) -> Collection<FollowIntent> {
        self.database.collection("follow_intents")
    }

    /// Creates the indexes the handlers rely on.
    ///
    /// Unique indexes on username/email back the duplicate checks in
    /// registration; the quiz index keeps one quiz document per course.
    pub async fn ensure_indexes(&self) -> Result<(), AppError> {
        let unique = IndexOptions::builder().unique(true).build();

        self.users()
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "username": 1 })
                    .options(unique.clone())
                    .build(),
            )
            .await?;

        self.users()
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "email": 1 })
                    .options(unique.clone())
                    .build(),
            )
            .await?;

        self.quizzes()
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "course_id": 1 })
                    .options(unique)
                    .build(),
            )
            .await?;

        self.follow_intents()
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "created_at": 1 })
                    .build(),
            )
            .await?;

        // One in-flight operation per (actor, target) pair: the intent doubles
        // as a per-pair lock, serializing opposite operations on the same edge.
        self.follow_intents()
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "actor": 1, "target": 1 })
                    .options(IndexOptions::builder().unique(true).build())
                    .build(),
            )
            .await?;

        Ok(())
    }
}

/// Runs a store operation, retrying transient failures a bounded number of
/// times with a short backoff. Terminal errors pass through untouched.
pub async fn with_store_retry<T, F, Fut>(mut op: F) -> Result<T, AppError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    let mut attempt: u32 = 0;
    loop {
        match op().await {
            Err(AppError::StoreUnavailable(msg)) if attempt + 1 < STORE_RETRY_ATTEMPTS => {
                attempt += 1;
                tracing::warn!("Store operation failed (attempt {}): {}", attempt, msg);
                tokio::time::sleep(Duration::from_millis(100 * attempt as u64)).await;
            }
            other => return other,
        }
    }
}
