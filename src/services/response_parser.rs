// src/services/response_parser.rs
//
// Turns the model's raw text into an `AnalysisResult`, defensively.
// The model is not contractually guaranteed to emit valid JSON, so the
// top-level envelope is validated strictly (both `layout` and `elements`
// must be present) while individual fields are coerced leniently:
// missing or mistyped values fall back to safe defaults instead of
// failing the whole analysis.
use crate::errors::FigyError;
use crate::models::{AnalysisResult, ElementKind, ElementStyle, LayoutInfo, UiElement};
use serde_json::Value;

pub fn parse(raw: &str) -> Result<AnalysisResult, FigyError> {
    let data: Value = serde_json::from_str(raw)
        .map_err(|e| FigyError::MalformedResponse(format!("Invalid JSON from model: {}", e)))?;

    let layout = data["layout"]
        .as_object()
        .ok_or_else(|| FigyError::MalformedResponse("Missing 'layout' object".to_string()))?;
    let elements = data["elements"]
        .as_array()
        .ok_or_else(|| FigyError::MalformedResponse("Missing 'elements' array".to_string()))?;

    let layout = parse_layout(layout);
    let elements = elements.iter().map(parse_element).collect();

    Ok(AnalysisResult::new(layout, elements))
}

fn parse_layout(layout: &serde_json::Map<String, Value>) -> LayoutInfo {
    LayoutInfo {
        columns: layout
            .get("columns")
            .and_then(Value::as_u64)
            .unwrap_or(1) as u32,
        rows: layout.get("rows").and_then(Value::as_u64).unwrap_or(1) as u32,
        grid_spacing: non_negative(layout.get("gridSpacing")).unwrap_or(0.0),
        margin: non_negative(layout.get("margin")).unwrap_or(10.0),
    }
}

fn parse_element(element: &Value) -> UiElement {
    let kind = element["type"]
        .as_str()
        .map(ElementKind::from_label)
        .unwrap_or(ElementKind::Rectangle);

    // Some model variants emit "content" instead of "text".
    let text = element["text"]
        .as_str()
        .or_else(|| element["content"].as_str())
        .unwrap_or("")
        .to_string();

    let style = &element["style"];
    let color = style["color"]
        .as_str()
        .or_else(|| style["backgroundColor"].as_str())
        .unwrap_or("#000000")
        .to_string();

    UiElement {
        kind,
        x: element["x"].as_f64().unwrap_or(0.0),
        y: element["y"].as_f64().unwrap_or(0.0),
        width: element["width"].as_f64().unwrap_or(100.0),
        height: element["height"].as_f64().unwrap_or(50.0),
        text,
        style: ElementStyle {
            color,
            font_size: style["fontSize"].as_f64().unwrap_or(14.0),
        },
    }
}

fn non_negative(value: Option<&Value>) -> Option<f64> {
    value.and_then(Value::as_f64).filter(|v| *v >= 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_payload() {
        let raw = serde_json::json!({
            "layout": { "columns": 3, "rows": 2, "gridSpacing": 16, "margin": 24 },
            "elements": [
                {
                    "type": "button",
                    "x": 10, "y": 20, "width": 120, "height": 40,
                    "text": "Submit",
                    "style": { "color": "#FF5722", "fontSize": 16 }
                },
                {
                    "type": "text",
                    "x": 10, "y": 80, "width": 200, "height": 24,
                    "text": "Welcome back",
                    "style": { "color": "#333333", "fontSize": 18 }
                }
            ]
        })
        .to_string();

        let result = parse(&raw).unwrap();
        assert!(result.success);
        assert!(result.error.is_none());
        assert_eq!(result.layout.columns, 3);
        assert_eq!(result.layout.grid_spacing, 16.0);
        assert_eq!(result.elements.len(), 2);
        assert_eq!(result.elements[0].kind, ElementKind::Button);
        assert_eq!(result.elements[0].style.color, "#FF5722");
        assert_eq!(result.elements[1].text, "Welcome back");
    }

    #[test]
    fn rejects_non_json() {
        let err = parse("Invalid JSON").unwrap_err();
        assert!(matches!(err, FigyError::MalformedResponse(_)));
    }

    #[test]
    fn rejects_missing_layout() {
        let raw = r#"{"elements": []}"#;
        let err = parse(raw).unwrap_err();
        assert!(matches!(err, FigyError::MalformedResponse(_)));
    }

    #[test]
    fn rejects_missing_elements() {
        let raw = r#"{"layout": {"columns": 2}}"#;
        let err = parse(raw).unwrap_err();
        assert!(matches!(err, FigyError::MalformedResponse(_)));
    }

    #[test]
    fn fills_field_defaults() {
        let raw = serde_json::json!({
            "layout": {},
            "elements": [ { "type": "text" }, {} ]
        })
        .to_string();

        let result = parse(&raw).unwrap();
        assert_eq!(result.layout, LayoutInfo::default());

        let first = &result.elements[0];
        assert_eq!(first.kind, ElementKind::Text);
        assert_eq!(first.x, 0.0);
        assert_eq!(first.width, 100.0);
        assert_eq!(first.height, 50.0);
        assert_eq!(first.text, "");
        assert_eq!(first.style.color, "#000000");
        assert_eq!(first.style.font_size, 14.0);

        assert_eq!(result.elements[1].kind, ElementKind::Rectangle);
    }

    #[test]
    fn unknown_type_coerces_to_rectangle() {
        let raw = serde_json::json!({
            "layout": { "columns": 1 },
            "elements": [ { "type": "invalid_type" } ]
        })
        .to_string();

        let result = parse(&raw).unwrap();
        assert_eq!(result.elements[0].kind, ElementKind::Rectangle);
    }

    #[test]
    fn negative_layout_values_fall_back() {
        let raw = serde_json::json!({
            "layout": { "columns": -4, "gridSpacing": -1, "margin": -5 },
            "elements": []
        })
        .to_string();

        let result = parse(&raw).unwrap();
        assert_eq!(result.layout.columns, 1);
        assert_eq!(result.layout.grid_spacing, 0.0);
        assert_eq!(result.layout.margin, 10.0);
    }

    #[test]
    fn content_field_accepted_as_text() {
        let raw = serde_json::json!({
            "layout": {},
            "elements": [ { "type": "text", "content": "Hello" } ]
        })
        .to_string();

        let result = parse(&raw).unwrap();
        assert_eq!(result.elements[0].text, "Hello");
    }
}
