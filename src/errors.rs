// src/errors.rs
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FigyError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Endpoint not found: {0}")]
    NotFound(String),

    #[error("Rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Retry attempts exhausted after {attempts} tries: {message}")]
    RetryExhausted { attempts: u32, message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Image processing error: {0}")]
    ImageProcessing(String),
}

impl ResponseError for FigyError {
    fn error_response(&self) -> HttpResponse {
        match self {
            FigyError::InvalidInput(_) => HttpResponse::BadRequest().json(serde_json::json!({
                "error": "Invalid input",
                "message": self.to_string()
            })),
            FigyError::Configuration(_) => {
                HttpResponse::InternalServerError().json(serde_json::json!({
                    "error": "Configuration error",
                    "message": self.to_string()
                }))
            }
            FigyError::Unauthorized(_) => HttpResponse::BadGateway().json(serde_json::json!({
                "error": "Upstream rejected credentials",
                "message": self.to_string()
            })),
            FigyError::NotFound(_) => HttpResponse::BadGateway().json(serde_json::json!({
                "error": "Upstream endpoint not found",
                "message": self.to_string()
            })),
            FigyError::RateLimited { retry_after_secs } => {
                HttpResponse::TooManyRequests()
                    .insert_header(("retry-after", retry_after_secs.to_string()))
                    .json(serde_json::json!({
                        "error": "Rate limit exceeded",
                        "message": self.to_string(),
                        "retry_after_secs": retry_after_secs
                    }))
            }
            FigyError::RetryExhausted { .. } => {
                HttpResponse::ServiceUnavailable().json(serde_json::json!({
                    "error": "AI service unavailable",
                    "message": self.to_string()
                }))
            }
            FigyError::MalformedResponse(_) => HttpResponse::BadGateway().json(serde_json::json!({
                "error": "Malformed AI response",
                "message": self.to_string()
            })),
            FigyError::Network(_) => HttpResponse::ServiceUnavailable().json(serde_json::json!({
                "error": "Network error",
                "message": self.to_string()
            })),
            FigyError::ImageProcessing(_) => HttpResponse::BadRequest().json(serde_json::json!({
                "error": "Image processing error",
                "message": self.to_string()
            })),
        }
    }
}
