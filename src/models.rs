// src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Closed set of UI element categories the model may describe.
/// Free-text labels map case-insensitively; anything unrecognized
/// falls back to `Rectangle` rather than failing the whole analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Rectangle,
    Text,
    Button,
    Image,
    Frame,
}

impl ElementKind {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "text" => ElementKind::Text,
            "button" => ElementKind::Button,
            "image" => ElementKind::Image,
            "frame" => ElementKind::Frame,
            _ => ElementKind::Rectangle,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementStyle {
    pub color: String,
    pub font_size: f64,
}

impl Default for ElementStyle {
    fn default() -> Self {
        Self {
            color: "#000000".to_string(),
            font_size: 14.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiElement {
    #[serde(rename = "type")]
    pub kind: ElementKind,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub text: String,
    pub style: ElementStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutInfo {
    pub columns: u32,
    pub rows: u32,
    pub grid_spacing: f64,
    pub margin: f64,
}

impl Default for LayoutInfo {
    fn default() -> Self {
        Self {
            columns: 1,
            rows: 1,
            grid_spacing: 0.0,
            margin: 10.0,
        }
    }
}

/// Structured layout + elements description produced from an image.
/// Created fresh per request and never mutated afterwards.
/// `success == false` implies `elements` is empty and `layout` holds
/// default values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub layout: LayoutInfo,
    pub elements: Vec<UiElement>,
}

impl AnalysisResult {
    pub fn new(layout: LayoutInfo, elements: Vec<UiElement>) -> Self {
        Self {
            success: true,
            error: None,
            layout,
            elements,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
            layout: LayoutInfo::default(),
            elements: Vec::new(),
        }
    }
}

/// Normalized color, channels in 0.0..=1.0 (canvas convention).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

/// Canvas node tree the renderer hands back to the plugin host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum CanvasNode {
    #[serde(rename_all = "camelCase")]
    Frame {
        name: String,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        item_spacing: f64,
        padding: f64,
        grid_columns: u32,
        grid_rows: u32,
        fill: Option<Rgb>,
        children: Vec<CanvasNode>,
    },
    #[serde(rename_all = "camelCase")]
    Rectangle {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        fill: Rgb,
    },
    #[serde(rename_all = "camelCase")]
    Text {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        characters: String,
        fill: Rgb,
        font_size: f64,
    },
}

/// Response envelope returned by the HTTP handlers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisEnvelope {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub analysis: AnalysisResult,
    pub nodes: CanvasNode,
}
