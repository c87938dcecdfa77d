// src/services/layout_renderer.rs
//
// Collaborator that turns an `AnalysisResult` into a canvas node tree
// the plugin host can instantiate. User notifications go through an
// injected callback so the renderer has no direct UI dependency.
use crate::models::{AnalysisResult, CanvasNode, ElementKind, LayoutInfo, Rgb, UiElement};
use log::info;
use std::sync::Arc;

pub type Notifier = Arc<dyn Fn(&str) + Send + Sync>;

const FRAME_NAME: &str = "AI Generated UI";
const DEFAULT_GRID_SPACING: f64 = 20.0;
const DEFAULT_MARGIN: f64 = 10.0;

pub struct LayoutRenderer {
    notify: Notifier,
}

impl LayoutRenderer {
    pub fn new(notify: Notifier) -> Self {
        Self { notify }
    }

    /// Build the root frame for an analysis. The frame is sized to the
    /// bounding box of its elements plus margins; grid counts fall back
    /// to a near-square arrangement when the model omitted them.
    pub fn render(&self, analysis: &AnalysisResult) -> CanvasNode {
        let (columns, rows) = grid_dimensions(&analysis.layout, analysis.elements.len());

        let spacing = if analysis.layout.grid_spacing > 0.0 {
            analysis.layout.grid_spacing
        } else {
            DEFAULT_GRID_SPACING
        };
        let margin = if analysis.layout.margin > 0.0 {
            analysis.layout.margin
        } else {
            DEFAULT_MARGIN
        };

        let children: Vec<CanvasNode> = analysis.elements.iter().map(element_node).collect();

        let content_width = analysis
            .elements
            .iter()
            .map(|e| e.x + e.width)
            .fold(0.0, f64::max);
        let content_height = analysis
            .elements
            .iter()
            .map(|e| e.y + e.height)
            .fold(0.0, f64::max);

        info!(
            "Rendered {} elements into a {}x{} grid",
            children.len(),
            columns,
            rows
        );
        (self.notify)("UI generated successfully");

        CanvasNode::Frame {
            name: FRAME_NAME.to_string(),
            x: 0.0,
            y: 0.0,
            width: content_width + 2.0 * margin,
            height: content_height + 2.0 * margin,
            item_spacing: spacing,
            padding: margin,
            grid_columns: columns,
            grid_rows: rows,
            fill: None,
            children,
        }
    }

    /// Surface a terminal failure to the user. Called by the plugin
    /// glue after `analyze` rejects; the analysis core itself never
    /// notifies.
    pub fn notify_failure(&self, message: &str) {
        (self.notify)(message);
    }
}

fn grid_dimensions(layout: &LayoutInfo, total_elements: usize) -> (u32, u32) {
    let columns = if layout.columns > 0 {
        layout.columns
    } else {
        (total_elements as f64).sqrt().ceil().max(1.0) as u32
    };
    let rows = if layout.rows > 0 {
        layout.rows
    } else {
        ((total_elements as f64) / (columns as f64)).ceil().max(1.0) as u32
    };
    (columns, rows)
}

/// Per-kind node construction, one handler per `ElementKind`.
fn element_node(element: &UiElement) -> CanvasNode {
    match element.kind {
        ElementKind::Text => CanvasNode::Text {
            x: element.x,
            y: element.y,
            width: element.width,
            height: element.height,
            characters: element.text.clone(),
            fill: hex_to_rgb(&element.style.color),
            font_size: element.style.font_size,
        },
        ElementKind::Button => {
            // Buttons become a filled frame with a centered label,
            // matching how design canvases model them.
            let label = CanvasNode::Text {
                x: 8.0,
                y: 4.0,
                width: (element.width - 16.0).max(0.0),
                height: (element.height - 8.0).max(0.0),
                characters: element.text.clone(),
                fill: Rgb {
                    r: 1.0,
                    g: 1.0,
                    b: 1.0,
                },
                font_size: element.style.font_size,
            };
            CanvasNode::Frame {
                name: "Button".to_string(),
                x: element.x,
                y: element.y,
                width: element.width,
                height: element.height,
                item_spacing: 0.0,
                padding: 0.0,
                grid_columns: 1,
                grid_rows: 1,
                fill: Some(hex_to_rgb(&element.style.color)),
                children: vec![label],
            }
        }
        ElementKind::Frame => CanvasNode::Frame {
            name: "Frame".to_string(),
            x: element.x,
            y: element.y,
            width: element.width,
            height: element.height,
            item_spacing: 0.0,
            padding: 0.0,
            grid_columns: 1,
            grid_rows: 1,
            fill: Some(hex_to_rgb(&element.style.color)),
            children: Vec::new(),
        },
        ElementKind::Rectangle | ElementKind::Image => CanvasNode::Rectangle {
            x: element.x,
            y: element.y,
            width: element.width,
            height: element.height,
            fill: hex_to_rgb(&element.style.color),
        },
    }
}

/// Convert `#rgb` or `#rrggbb` to a normalized color. Anything
/// unparseable falls back to black, consistent with the lenient
/// element parsing.
pub fn hex_to_rgb(hex: &str) -> Rgb {
    let hex = hex.trim_start_matches('#');

    let expanded: String = if hex.len() == 3 {
        hex.chars().flat_map(|c| [c, c]).collect()
    } else {
        hex.to_string()
    };

    if expanded.len() != 6 {
        return Rgb {
            r: 0.0,
            g: 0.0,
            b: 0.0,
        };
    }

    match u32::from_str_radix(&expanded, 16) {
        Ok(value) => Rgb {
            r: ((value >> 16) & 0xFF) as f32 / 255.0,
            g: ((value >> 8) & 0xFF) as f32 / 255.0,
            b: (value & 0xFF) as f32 / 255.0,
        },
        Err(_) => Rgb {
            r: 0.0,
            g: 0.0,
            b: 0.0,
        },
    }
}
