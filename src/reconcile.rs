// src/reconcile.rs
//
// Follow/unfollow touches two user documents. Each side is applied as its own
// idempotent atomic update; a FollowIntent document recorded before the first
// write marks the operation in flight. The background loop here re-applies any
// intent that outlives its request (crash, disconnect, store hiccup between
// the two writes), so the graph cannot stay asymmetric.

use std::time::Duration;

use chrono::Utc;
use mongodb::bson::{DateTime, Document, doc};

use crate::{
    db::Db,
    error::AppError,
    models::user::{FollowAction, FollowIntent},
};

/// How often the reconciler scans for abandoned intents.
const SWEEP_INTERVAL: Duration = Duration::from_secs(30);

/// Intents younger than this are assumed to still be in flight.
pub const STALE_AFTER_SECONDS: i64 = 60;

/// Pipeline update for the actor side of an edge change: add or remove
/// `target` in `following`, then recompute `following_count` from the set.
/// Count and set change in the same atomic update, so they cannot drift.
pub fn following_update(target: &str, action: FollowAction) -> Vec<Document> {
    let set = match action {
        FollowAction::Follow => {
            doc! { "$setUnion": [{ "$ifNull": ["$following", []] }, [target]] }
        }
        FollowAction::Unfollow => {
            doc! { "$setDifference": [{ "$ifNull": ["$following", []] }, [target]] }
        }
    };
    vec![
        doc! { "$set": { "following": set } },
        doc! { "$set": { "following_count": { "$size": "$following" } } },
    ]
}

/// Pipeline update for the target side: add or remove `actor` in `followers`,
/// then recompute `followers_count`.
pub fn followers_update(actor: &str, action: FollowAction) -> Vec<Document> {
    let set = match action {
        FollowAction::Follow => {
            doc! { "$setUnion": [{ "$ifNull": ["$followers", []] }, [actor]] }
        }
        FollowAction::Unfollow => {
            doc! { "$setDifference": [{ "$ifNull": ["$followers", []] }, [actor]] }
        }
    };
    vec![
        doc! { "$set": { "followers": set } },
        doc! { "$set": { "followers_count": { "$size": "$followers" } } },
    ]
}

/// Re-applies both sides of an intent. Safe to run any number of times.
pub async fn apply_intent(db: &Db, intent: &FollowIntent) -> Result<(), AppError> {
    db.users()
        .update_one(
            doc! { "username": &intent.actor },
            following_update(&intent.target, intent.action),
        )
        .await?;

    db.users()
        .update_one(
            doc! { "username": &intent.target },
            followers_update(&intent.actor, intent.action),
        )
        .await?;

    Ok(())
}

/// Completes all intents older than the staleness cutoff.
/// Returns how many were reconciled.
pub async fn sweep(db: &Db) -> Result<u64, AppError> {
    let cutoff = DateTime::from_chrono(Utc::now() - chrono::Duration::seconds(STALE_AFTER_SECONDS));

    let mut cursor = db
        .follow_intents()
        .find(doc! { "created_at": { "$lt": cutoff } })
        .await?;

    let mut reconciled = 0;
    while cursor.advance().await? {
        let intent: FollowIntent = cursor.deserialize_current()?;

        apply_intent(db, &intent).await?;
        db.follow_intents()
            .delete_one(doc! { "id": &intent.id })
            .await?;

        tracing::info!(
            "Reconciled abandoned {:?} intent: {} -> {}",
            intent.action,
            intent.actor,
            intent.target
        );
        reconciled += 1;
    }

    Ok(reconciled)
}

/// Background reconciliation loop, spawned at startup.
pub async fn run(db: Db) {
    let mut interval = tokio::time::interval(SWEEP_INTERVAL);
    // The first tick fires immediately; that also repairs anything left over
    // from a previous run.
    loop {
        interval.tick().await;
        match sweep(&db).await {
            Ok(0) => {}
            Ok(n) => tracing::info!("Reconciler completed {} follow intent(s)", n),
            Err(e) => tracing::warn!("Reconciler sweep failed: {}", e),
        }
    }
}
