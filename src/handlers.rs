// src/handlers.rs
use crate::{AppState, errors::FigyError, models::AnalysisEnvelope};
use actix_multipart::Multipart;
use actix_web::{Error, HttpResponse, web};
use futures_util::TryStreamExt;
use log::error;
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub image_data: String,
}

/// Multipart upload path: the first file field is taken as the mock-up
/// image, validated and re-encoded before analysis.
pub async fn analyze_upload(
    mut payload: Multipart,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let mut image_data = Vec::new();

    while let Some(mut field) = payload.try_next().await? {
        while let Some(chunk) = field.try_next().await? {
            image_data.extend_from_slice(&chunk);
        }
        if !image_data.is_empty() {
            break;
        }
    }

    if image_data.is_empty() {
        return Err(FigyError::InvalidInput("No image file in upload".to_string()).into());
    }

    let payload_url = data.image_processor.prepare(&image_data)?;
    run_analysis(&data, &payload_url).await
}

/// JSON path for callers that already hold a base64 or data-URL
/// payload (the plugin UI sends these directly).
pub async fn analyze_data(
    body: web::Json<AnalyzeRequest>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    run_analysis(&data, &body.image_data).await
}

async fn run_analysis(data: &AppState, payload: &str) -> Result<HttpResponse, Error> {
    let analysis = match data.client.analyze(payload).await {
        Ok(analysis) => analysis,
        Err(e) => {
            error!("Analysis failed: {}", e);
            data.renderer.notify_failure(&user_message(&e));
            return Err(e.into());
        }
    };

    let nodes = data.renderer.render(&analysis);

    Ok(HttpResponse::Ok().json(AnalysisEnvelope {
        id: Uuid::new_v4(),
        created_at: chrono::Utc::now(),
        analysis,
        nodes,
    }))
}

/// Human-readable notification per error kind. The analysis core only
/// returns typed errors; translating them for the user happens here.
fn user_message(err: &FigyError) -> String {
    match err {
        FigyError::InvalidInput(_) => "Please provide a valid image".to_string(),
        FigyError::Configuration(_) => {
            "The plugin is misconfigured, check the API key".to_string()
        }
        FigyError::Unauthorized(_) => {
            "The API key was rejected, please update your credentials".to_string()
        }
        FigyError::NotFound(_) => {
            "The AI endpoint was not found, the model may be unavailable".to_string()
        }
        FigyError::RateLimited { retry_after_secs } => format!(
            "Rate limit reached, try again in {} seconds",
            retry_after_secs
        ),
        FigyError::RetryExhausted { .. } => {
            "The AI service is unavailable right now, try again later".to_string()
        }
        FigyError::MalformedResponse(_) => {
            "The AI returned an unreadable response, try again".to_string()
        }
        FigyError::Network(_) => "Network error while contacting the AI service".to_string(),
        FigyError::ImageProcessing(_) => "Could not process the uploaded image".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{AnalysisClient, ClientConfig, ImageProcessor, LayoutRenderer, Notifier};
    use actix_web::{test as actix_test, App};
    use httpmock::prelude::*;
    use std::sync::{Arc, Mutex};

    fn test_state(server: &MockServer) -> (AppState, Arc<Mutex<Vec<String>>>) {
        let config = ClientConfig {
            base_retry_delay_ms: 50,
            max_retry_delay_ms: 200,
            ..ClientConfig::new("sk-test-key")
        };
        let client = AnalysisClient::with_base_url(
            config,
            format!("{}/v1/chat/completions", server.base_url()),
        )
        .unwrap();

        let messages = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&messages);
        let notify: Notifier = Arc::new(move |msg: &str| {
            sink.lock().unwrap().push(msg.to_string());
        });

        let state = AppState {
            client: Arc::new(client),
            renderer: Arc::new(LayoutRenderer::new(notify)),
            image_processor: Arc::new(ImageProcessor::new()),
        };
        (state, messages)
    }

    fn chat_response(content: serde_json::Value) -> serde_json::Value {
        serde_json::json!({
            "choices": [ { "message": { "content": content.to_string() } } ]
        })
    }

    #[test]
    fn analyze_data_end_to_end() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(chat_response(serde_json::json!({
                    "layout": { "columns": 1, "rows": 1 },
                    "elements": [
                        { "type": "text", "text": "Hello", "x": 0, "y": 0 }
                    ]
                })));
        });

        let (state, messages) = test_state(&server);

        actix_web::rt::System::new().block_on(async move {
            let app = actix_test::init_service(
                App::new()
                    .app_data(web::Data::new(state))
                    .route("/api/v1/analyze-data", web::post().to(analyze_data)),
            )
            .await;

            let req = actix_test::TestRequest::post()
                .uri("/api/v1/analyze-data")
                .set_json(serde_json::json!({ "imageData": "aGVsbG8=" }))
                .to_request();
            let resp = actix_test::call_service(&app, req).await;
            assert!(resp.status().is_success());

            let envelope: AnalysisEnvelope = actix_test::read_body_json(resp).await;
            assert!(envelope.analysis.success);
            assert_eq!(envelope.analysis.elements.len(), 1);
            assert!(matches!(
                envelope.nodes,
                crate::models::CanvasNode::Frame { .. }
            ));
        });

        let messages = messages.lock().unwrap();
        assert_eq!(*messages, ["UI generated successfully"]);
    }

    #[test]
    fn rate_limited_upstream_maps_to_429_with_header() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(429).header("retry-after", "3600");
        });

        let (state, messages) = test_state(&server);

        actix_web::rt::System::new().block_on(async move {
            let app = actix_test::init_service(
                App::new()
                    .app_data(web::Data::new(state))
                    .route("/api/v1/analyze-data", web::post().to(analyze_data)),
            )
            .await;

            let req = actix_test::TestRequest::post()
                .uri("/api/v1/analyze-data")
                .set_json(serde_json::json!({ "imageData": "aGVsbG8=" }))
                .to_request();
            let resp = actix_test::call_service(&app, req).await;

            assert_eq!(resp.status().as_u16(), 429);
            assert_eq!(
                resp.headers().get("retry-after").unwrap().to_str().unwrap(),
                "3600"
            );
        });

        let messages = messages.lock().unwrap();
        assert_eq!(*messages, ["Rate limit reached, try again in 3600 seconds"]);
    }

    #[test]
    fn user_messages_are_distinct_per_error_kind() {
        let errors = [
            FigyError::InvalidInput("x".into()),
            FigyError::Configuration("x".into()),
            FigyError::Unauthorized("x".into()),
            FigyError::NotFound("x".into()),
            FigyError::RateLimited {
                retry_after_secs: 60,
            },
            FigyError::RetryExhausted {
                attempts: 4,
                message: "x".into(),
            },
            FigyError::MalformedResponse("x".into()),
            FigyError::Network("x".into()),
            FigyError::ImageProcessing("x".into()),
        ];

        let mut messages: Vec<String> = errors.iter().map(user_message).collect();
        assert!(messages.iter().any(|m| m.contains("60 seconds")));
        messages.sort();
        messages.dedup();
        assert_eq!(messages.len(), errors.len());
    }
}
