// src/main.rs
use actix_web::{App, HttpResponse, HttpServer, middleware, web};
use log::info;
use std::sync::Arc;

mod errors;
mod handlers;
mod models;
mod services;

use crate::handlers::{analyze_data, analyze_upload};
use crate::services::{AnalysisClient, ClientConfig, ImageProcessor, LayoutRenderer, Notifier};

#[derive(Clone)]
pub struct AppState {
    client: Arc<AnalysisClient>,
    renderer: Arc<LayoutRenderer>,
    image_processor: Arc<ImageProcessor>,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    info!("Starting figy service...");

    // Configuration is resolved here and injected; the analysis core
    // never reads the environment itself.
    let mut config =
        ClientConfig::new(std::env::var("OPENAI_API_KEY").expect("OPENAI_API_KEY must be set"));
    if let Some(max_retries) = env_u64("FIGY_MAX_RETRIES") {
        config.max_retries = max_retries as u32;
    }
    if let Some(base_ms) = env_u64("FIGY_BASE_RETRY_DELAY_MS") {
        config.base_retry_delay_ms = base_ms;
    }
    if let Some(max_ms) = env_u64("FIGY_MAX_RETRY_DELAY_MS") {
        config.max_retry_delay_ms = max_ms;
    }
    if let Some(timeout) = env_u64("FIGY_REQUEST_TIMEOUT_SECS") {
        config.request_timeout_secs = timeout;
    }

    let client = Arc::new(AnalysisClient::new(config).expect("Invalid analysis configuration"));

    // Without a plugin host attached, user notifications go to the log.
    let notify: Notifier = Arc::new(|message: &str| info!("[notify] {}", message));
    let renderer = Arc::new(LayoutRenderer::new(notify));
    let image_processor = Arc::new(ImageProcessor::new());

    let app_state = AppState {
        client,
        renderer,
        image_processor,
    };

    info!("Starting HTTP server on 0.0.0.0:8080");

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .wrap(middleware::Logger::default())
            .service(
                web::scope("/api/v1")
                    .route("/analyze", web::post().to(analyze_upload))
                    .route("/analyze-data", web::post().to(analyze_data)),
            )
            .route("/health", web::get().to(health_check))
    })
    .bind("0.0.0.0:8080")?
    .run()
    .await
}

fn env_u64(name: &str) -> Option<u64> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "figy",
        "version": "0.1.0"
    }))
}
