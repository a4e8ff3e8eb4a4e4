use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use retraction_backend::api::{self, AppState};
use retraction_backend::config::Config;
use retraction_backend::engine::story::{CorrectionGenerator, StoryGenerator};
use retraction_backend::llm::{GenerationOptions, OpenAiClient};
use retraction_backend::session::SessionStore;

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok", "service": "retraction-backend" }))
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = Config::load().expect("Failed to load configuration");

    let backend = Arc::new(OpenAiClient::new(&config));
    let options = GenerationOptions::from_config(&config);
    let state = AppState {
        sessions: SessionStore::new(config.session_ttl),
        stories: StoryGenerator::new(backend.clone(), options.clone()),
        corrections: CorrectionGenerator::new(backend, options),
    };

    let mut app = Router::new()
        .route("/health", get(health_check))
        .merge(api::router(state))
        .layer(CorsLayer::permissive());

    // Serve the game page when a frontend build is configured.
    if let Some(static_dir) = &config.static_dir {
        app = app.fallback_service(ServeDir::new(static_dir));
    }

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
        .await
        .expect("Failed to bind listen port");

    tracing::info!("Retraction backend listening on port {}", config.port);
    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
