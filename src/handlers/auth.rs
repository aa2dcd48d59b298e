// src/handlers/auth.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use mongodb::bson::{Bson, doc, to_bson};
use serde_json::json;
use validator::Validate;

use crate::{
    config::Config,
    db::{Db, MAX_WRITE_ATTEMPTS, with_store_retry},
    error::AppError,
    models::user::{CreateUserRequest, LoginRequest, StreakUpdate, User, UserResponse},
    utils::{
        hash::{hash_password, verify_password},
        jwt::sign_jwt,
    },
};

/// Registers a new user.
///
/// Hashes the password using Argon2 before storing it.
/// Returns 201 Created and the user object (excluding password).
pub async fn register(
    State(db): State<Db>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    // Duplicate checks up front for precise error messages; the unique
    // indexes on username/email remain the real guarantee.
    if db
        .users()
        .find_one(doc! { "email": &payload.email })
        .await?
        .is_some()
    {
        tracing::warn!("Attempt to register with existing email: {}", payload.email);
        return Err(AppError::Conflict("Email already registered".to_string()));
    }

    if db
        .users()
        .find_one(doc! { "username": &payload.username })
        .await?
        .is_some()
    {
        tracing::warn!(
            "Attempt to register with existing username: {}",
            payload.username
        );
        return Err(AppError::Conflict(format!(
            "Username '{}' already exists",
            payload.username
        )));
    }

    let hashed_password = hash_password(&payload.password)?;

    let user = User::new(payload.username, payload.email, hashed_password);

    db.users().insert_one(&user).await.map_err(|e| {
        // Duplicate key: a concurrent registration won the unique index race
        if e.to_string().contains("E11000") {
            AppError::Conflict("Username or email already registered".to_string())
        } else {
            AppError::from(e)
        }
    })?;

    tracing::info!("Successfully created user: {}", user.username);

    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            username: user.username,
            email: user.email,
        }),
    ))
}

/// Authenticates a user and returns a JWT token.
///
/// Verifies the username and password, advances the login streak (a
/// conditional write, retried against concurrent logins), and signs a JWT.
pub async fn login(
    State(db): State<Db>,
    State(config): State<Config>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let user = with_store_retry(|| async {
        db.users()
            .find_one(doc! { "username": &payload.username })
            .await
            .map_err(AppError::from)
    })
    .await?
    .ok_or(AppError::AuthError("User not found".to_string()))?;

    let is_valid = verify_password(&payload.password, &user.password)?;

    if !is_valid {
        return Err(AppError::AuthError("Invalid password".to_string()));
    }

    let id = user.id.clone();
    let username = user.username.clone();
    let streak = record_login(&db, user).await?;

    let token = sign_jwt(&id, &username, &config.jwt_secret, config.jwt_expiration)?;

    Ok(Json(json!({
        "token": token,
        "type": "Bearer",
        "current_streak": streak.current_streak,
        "longest_streak": streak.longest_streak,
    })))
}

/// Persists the advanced streak state.
///
/// The write is conditional on the `last_login` value the computation was
/// based on; if another login for the same user lands in between, the user
/// document is re-read and the streak recomputed. Exactly one login event is
/// appended per successful login.
async fn record_login(db: &Db, mut user: User) -> Result<StreakUpdate, AppError> {
    for attempt in 1..=MAX_WRITE_ATTEMPTS {
        let update = user.advance_streak(Utc::now())?;

        let filter = match user.last_login {
            Some(last) => doc! { "username": &user.username, "last_login": last },
            // Matches both a stored null and documents without the field.
            None => doc! { "username": &user.username, "last_login": Bson::Null },
        };

        let event = to_bson(&update.event)?;

        let result = db
            .users()
            .update_one(
                filter,
                doc! {
                    "$set": {
                        "current_streak": update.current_streak,
                        "longest_streak": update.longest_streak,
                        "last_login": update.last_login,
                    },
                    "$push": { "login_history": event },
                },
            )
            .await?;

        if result.matched_count == 1 {
            return Ok(update);
        }

        tracing::warn!(
            "Concurrent login detected for '{}', recomputing streak (attempt {})",
            user.username,
            attempt
        );

        user = db
            .users()
            .find_one(doc! { "username": &user.username })
            .await?
            .ok_or(AppError::NotFound("User not found".to_string()))?;
    }

    Err(AppError::Conflict(
        "Login state changed concurrently too many times; please retry".to_string(),
    ))
}
