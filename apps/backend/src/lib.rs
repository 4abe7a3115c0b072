pub mod clients;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::clients::{AnkiConnectClient, JpdbClient, OpenAiClient};
use crate::config::ServiceConfig;
use crate::db::SqliteGateway;
use crate::services::lexicon::LexiconEngine;

pub use crate::state::{AppState, Collaborators};

/// Build the API router over `state`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        // Settings routes
        .route(
            "/api/settings",
            get(routes::settings::get_all).put(routes::settings::update),
        )
        .route("/api/style", put(routes::settings::update_style))
        .route("/api/styles", get(routes::settings::styles))
        // Entry routes
        .route(
            "/api/entries",
            get(routes::entries::list).post(routes::entries::create),
        )
        .route(
            "/api/entries/:id",
            get(routes::entries::get).delete(routes::entries::remove),
        )
        .route("/api/entries/:id/select", post(routes::entries::select))
        .route("/api/entries/:id/word", put(routes::entries::update_word))
        .route(
            "/api/entries/:id/definitions",
            put(routes::entries::update_definitions),
        )
        .route(
            "/api/entries/:id/definitions/:index/count",
            put(routes::entries::update_count),
        )
        .route("/api/entries/:id/clear", post(routes::entries::clear))
        .route("/api/entries/:id/autofill", post(routes::entries::autofill))
        // Generation routes
        .route(
            "/api/entries/:id/generate",
            post(routes::generation::generate),
        )
        .route("/api/entries/:id/analyze", post(routes::generation::analyze))
        .route(
            "/api/entries/:id/annotate",
            post(routes::generation::annotate),
        )
        // Sentence routes
        .route(
            "/api/entries/:id/sentences/:sid",
            put(routes::sentences::update).delete(routes::sentences::remove),
        )
        .route(
            "/api/entries/:id/sentences/:sid/export-toggle",
            post(routes::sentences::toggle_export),
        )
        // Export routes
        .route("/api/export", post(routes::export::export))
        // Flashcard store routes
        .route("/api/anki/status", get(routes::anki::status))
        .route("/api/anki/decks", get(routes::anki::decks))
        .route("/api/anki/note-types", get(routes::anki::note_types))
        .route(
            "/api/anki/note-types/:name/fields",
            get(routes::anki::fields),
        )
        .route("/api/anki/field-sources", get(routes::anki::field_sources))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServiceConfig::from_env();

    tracing::info!(path = %config.db_path.display(), "Opening state database...");
    let gateway = SqliteGateway::open(&config.db_path)?;

    let http = reqwest::Client::new();
    let collaborators = Collaborators {
        llm: Arc::new(OpenAiClient::new(http.clone(), &config.openai_base_url)),
        flashcards: Arc::new(AnkiConnectClient::new(http.clone(), &config.anki_connect_url)),
        dictionary: Arc::new(JpdbClient::new(http, &config.jpdb_base_url)),
        annotation: Arc::new(LexiconEngine::new(config.annotation_lexicon.clone())),
    };
    let state = AppState::new(Arc::new(gateway), collaborators);

    let app = router(state);
    let addr = config.addr();

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check() -> &'static str {
    "OK"
}
