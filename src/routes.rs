// src/routes.rs

use axum::{
    Json, Router, http::Method, middleware,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{auth, courses, profile, quizzes, social},
    state::AppState,
    utils::jwt::auth_middleware,
};

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "msg": "Welcome to the LearnHub API" }))
}

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, courses, quizzes, users).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (store handle + config).
pub fn create_router(state: AppState) -> Router {
    let origins = [state
        .config
        .cors_origin
        .parse()
        .expect("CORS_ORIGIN must be a valid origin")];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    let course_routes = Router::new()
        .route("/", get(courses::list_courses))
        .route("/initialize", post(courses::initialize_courses))
        .route("/reinitialize", post(courses::reinitialize_courses))
        .route("/{title}", get(courses::get_course));

    let quiz_routes = Router::new()
        .route("/{course_title}", get(quizzes::get_quiz))
        // Protected quiz routes
        .merge(
            Router::new()
                .route("/submit", post(quizzes::submit_quiz))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                )),
        );

    let user_routes = Router::new()
        .route("/{username}", get(social::get_profile))
        // Protected user routes
        .merge(
            Router::new()
                .route("/me", get(profile::get_me))
                .route("/{username}/follow", post(social::follow))
                .route("/{username}/unfollow", post(social::unfollow))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                )),
        );

    Router::new()
        .route("/", get(root))
        .nest("/api/auth", auth_routes)
        .nest("/api/courses", course_routes)
        .nest("/api/quizzes", quiz_routes)
        .nest("/api/users", user_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
