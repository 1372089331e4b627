//! Recommender service shell.
//!
//! Transport, auth, and request validation live in the surrounding API
//! layer; this binary only wires the engine together and exposes health.

mod config;

use actix_web::{web, App, HttpResponse, HttpServer};
use markov_recommender::{InMemoryCatalog, InMemoryEventLog, RecommenderEngine};
use std::sync::Arc;
use tracing::info;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .json()
        .init();

    let settings = config::ServiceConfig::load()?;
    let engine = Arc::new(RecommenderEngine::new(
        settings.engine.clone(),
        Arc::new(InMemoryCatalog::new()),
        Arc::new(InMemoryEventLog::new()),
    )?);

    info!(
        host = %settings.server.host,
        port = settings.server.port,
        "Starting recommender service"
    );

    let data = web::Data::from(engine);
    HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .route("/health", web::get().to(health_check))
    })
    .bind((settings.server.host.as_str(), settings.server.port))?
    .run()
    .await?;

    Ok(())
}

async fn health_check(engine: web::Data<RecommenderEngine>) -> HttpResponse {
    let stats = engine.model_stats();
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "recommender-engine",
        "version": env!("CARGO_PKG_VERSION"),
        "states": stats.state_count,
        "transitions": stats.transition_total
    }))
}
