// src/services/mod.rs
pub mod analysis_client;
pub mod backoff;
pub mod image_processor;
pub mod layout_renderer;
pub mod response_parser;

pub use analysis_client::{AnalysisClient, ClientConfig};
pub use backoff::BackoffPolicy;
pub use image_processor::ImageProcessor;
pub use layout_renderer::{LayoutRenderer, Notifier};
