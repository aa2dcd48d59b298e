// src/handlers/social.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use mongodb::bson::doc;
use serde_json::json;

use crate::{
    db::Db,
    error::AppError,
    models::user::{FollowAction, FollowIntent, ProfileResponse, User},
    reconcile,
    utils::jwt::Claims,
};

/// Fetches the public profile of any user.
pub async fn get_profile(
    State(db): State<Db>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let user = db
        .users()
        .find_one(doc! { "username": &username })
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    Ok(Json(ProfileResponse::from(&user)))
}

/// Follow a user.
///
/// The edge lives in two documents: the actor's `following` and the target's
/// `followers`. Each side is one idempotent atomic update (set union plus a
/// count recomputed from the set); a follow intent recorded before the first
/// write lets the background reconciler finish the pair if this request dies
/// in between.
pub async fn follow(
    State(db): State<Db>,
    Extension(claims): Extension<Claims>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let actor = claims.username;
    let target = username;

    if actor == target {
        return Err(AppError::Conflict("You cannot follow yourself".to_string()));
    }

    let (actor_user, _) = load_pair(&db, &actor, &target).await?;

    if actor_user.following.iter().any(|u| u == &target) {
        return Err(AppError::Conflict(
            "Already following this user".to_string(),
        ));
    }

    let intent = record_intent(&db, &actor, &target, FollowAction::Follow).await?;

    // Actor side, guarded so a racing identical request is detected instead
    // of silently absorbed.
    let result = db
        .users()
        .update_one(
            doc! { "username": &actor, "following": { "$ne": &target } },
            reconcile::following_update(&target, FollowAction::Follow),
        )
        .await?;

    if result.matched_count == 0 {
        clear_intent(&db, &intent).await?;
        return Err(AppError::Conflict(
            "Already following this user".to_string(),
        ));
    }

    db.users()
        .update_one(
            doc! { "username": &target },
            reconcile::followers_update(&actor, FollowAction::Follow),
        )
        .await?;

    clear_intent(&db, &intent).await?;

    tracing::info!("'{}' now follows '{}'", actor, target);

    Ok(Json(json!({ "following": true })))
}

/// Unfollow a user. Mirror image of [`follow`].
pub async fn unfollow(
    State(db): State<Db>,
    Extension(claims): Extension<Claims>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let actor = claims.username;
    let target = username;

    if actor == target {
        return Err(AppError::Conflict(
            "You cannot unfollow yourself".to_string(),
        ));
    }

    let (actor_user, _) = load_pair(&db, &actor, &target).await?;

    if !actor_user.following.iter().any(|u| u == &target) {
        return Err(AppError::Conflict("Not following this user".to_string()));
    }

    let intent = record_intent(&db, &actor, &target, FollowAction::Unfollow).await?;

    let result = db
        .users()
        .update_one(
            doc! { "username": &actor, "following": &target },
            reconcile::following_update(&target, FollowAction::Unfollow),
        )
        .await?;

    if result.matched_count == 0 {
        clear_intent(&db, &intent).await?;
        return Err(AppError::Conflict("Not following this user".to_string()));
    }

    db.users()
        .update_one(
            doc! { "username": &target },
            reconcile::followers_update(&actor, FollowAction::Unfollow),
        )
        .await?;

    clear_intent(&db, &intent).await?;

    tracing::info!("'{}' unfollowed '{}'", actor, target);

    Ok(Json(json!({ "following": false })))
}

/// Loads both ends of the edge, failing with 404 if either is missing.
async fn load_pair(db: &Db, actor: &str, target: &str) -> Result<(User, User), AppError> {
    let target_user = db
        .users()
        .find_one(doc! { "username": target })
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    let actor_user = db
        .users()
        .find_one(doc! { "username": actor })
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    Ok((actor_user, target_user))
}

/// Records the durable intent for a follow/unfollow pair of writes.
///
/// The unique (actor, target) index makes the intent double as a per-pair
/// lock: a concurrent operation on the same edge is turned away instead of
/// interleaving its two writes with ours. A stale intent (whose request died)
/// is superseded rather than honored, since the reconciler would re-apply it
/// over the newer operation otherwise.
async fn record_intent(
    db: &Db,
    actor: &str,
    target: &str,
    action: FollowAction,
) -> Result<FollowIntent, AppError> {
    let cutoff = mongodb::bson::DateTime::from_chrono(
        chrono::Utc::now() - chrono::Duration::seconds(reconcile::STALE_AFTER_SECONDS),
    );
    db.follow_intents()
        .delete_many(doc! {
            "actor": actor,
            "target": target,
            "created_at": { "$lt": cutoff },
        })
        .await?;

    let intent = FollowIntent::new(actor, target, action);
    db.follow_intents().insert_one(&intent).await.map_err(|e| {
        if e.to_string().contains("E11000") {
            AppError::Conflict(
                "Another follow operation for this user is in progress".to_string(),
            )
        } else {
            AppError::from(e)
        }
    })?;

    Ok(intent)
}

async fn clear_intent(db: &Db, intent: &FollowIntent) -> Result<(), AppError> {
    db.follow_intents()
        .delete_one(doc! { "id": &intent.id })
        .await?;
    Ok(())
}
