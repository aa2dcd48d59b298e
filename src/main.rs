// src/main.rs

use backend::config::Config;
use backend::db::Db;
use backend::routes;
use backend::state::AppState;
use backend::reconcile;
use dotenvy::dotenv;
use std::net::SocketAddr;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenv().ok();

    // Load configuration from environment
    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    // Connect to the document store with retry
    let mut retry_count = 0;
    let db = loop {
        match Db::connect(&config).await {
            Ok(db) => break db,
            Err(e) => {
                retry_count += 1;
                if retry_count > 5 {
                    panic!("Failed to connect to MongoDB after 5 retries: {}", e);
                }
                tracing::warn!(
                    "Document store not ready, retrying in 2s... (Attempt {})",
                    retry_count
                );
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
        }
    };

    tracing::info!("Document store connected...");

    // Unique indexes back the duplicate checks; created idempotently on boot
    db.ensure_indexes()
        .await
        .expect("Failed to create store indexes");
    tracing::info!("Store indexes ensured.");

    // Repairs follow/unfollow pairs abandoned mid-flight
    tokio::spawn(reconcile::run(db.clone()));

    // Create AppState
    let state = AppState {
        db,
        config: config.clone(),
    };

    // Create the Axum application router
    let app = routes::create_router(state);

    // Bind to the listening address
    let addr = SocketAddr::from(([0, 0, 0, 0], 3000));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();

    // Start the server
    axum::serve(listener, app).await.unwrap();
}
