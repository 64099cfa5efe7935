//! Parsing of the vision model's reply into a [`VisionLayout`].
//!
//! The reply is untrusted text. Models wrap JSON in code fences despite being
//! told not to, append prose after it, drop fields, send numbers as strings
//! and invent element types. The rules, in order:
//!
//! 1. Strip a leading ```` ```json ```` / ```` ``` ```` fence and a trailing
//!    ```` ``` ````.
//! 2. Parse the remainder as strict JSON.
//! 3. Failing that, parse the first balanced `{…}` span (string-aware).
//! 4. Failing that, or on an empty reply, return an **empty** layout.
//!
//! Inside a parsed object every field is defaulted and coerced so a partly
//! malformed element still becomes a usable [`VisionElement`]. Elements that
//! are not JSON objects are skipped. Parsing never fails: an empty layout is
//! how "the model found nothing usable" is reported.

use crate::model::{PercentRect, TextAlign, VisionElement, VisionLayout};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

const DEFAULT_X: f32 = 0.0;
const DEFAULT_Y: f32 = 0.0;
const DEFAULT_WIDTH: f32 = 10.0;
const DEFAULT_HEIGHT: f32 = 5.0;
const DEFAULT_FONT_SIZE: f32 = 14.0;
const DEFAULT_FONT_COLOR: &str = "#000000";
const DEFAULT_BACKGROUND: &str = "#FFFFFF";

/// Parse a raw model reply. Never fails; see the module docs.
pub fn parse_layout_reply(raw: &str) -> VisionLayout {
    let text = strip_code_fences(raw);
    if text.is_empty() {
        return VisionLayout::default();
    }

    match parse_json_value(&text) {
        Some(value) => layout_from_value(&value),
        None => {
            debug!("Vision reply is not JSON ({} chars)", raw.len());
            VisionLayout::default()
        }
    }
}

// ── Rule 1: fences ───────────────────────────────────────────────────────

static RE_FENCE_OPEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^```(?:json|JSON)?\s*\n?").unwrap());
static RE_FENCE_CLOSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n?\s*```$").unwrap());

pub fn strip_code_fences(input: &str) -> String {
    let s = input.trim();
    let s = RE_FENCE_OPEN.replace(s, "");
    let s = RE_FENCE_CLOSE.replace(&s, "");
    s.trim().to_string()
}

// ── Rules 2–3: JSON ──────────────────────────────────────────────────────

fn parse_json_value(text: &str) -> Option<Value> {
    if let Ok(v) = serde_json::from_str::<Value>(text) {
        if v.is_object() || v.is_array() {
            return Some(v);
        }
    }
    let span = first_json_object(text)?;
    serde_json::from_str::<Value>(span).ok()
}

/// The first balanced top-level `{…}` in `text`.
///
/// Braces inside JSON strings (including escaped quotes) are ignored.
pub fn first_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset + ch.len_utf8();
                    return Some(&text[start..end]);
                }
            }
            _ => {}
        }
    }
    None
}

// ── Coercion ─────────────────────────────────────────────────────────────

fn layout_from_value(value: &Value) -> VisionLayout {
    let (elements, background) = match value {
        Value::Object(obj) => (
            obj.get("elements").and_then(Value::as_array),
            string_field(obj, &["backgroundColorHex", "background_color", "backgroundColor"]),
        ),
        Value::Array(items) => (Some(items), None),
        _ => (None, None),
    };

    let elements = elements
        .map(|items| items.iter().filter_map(element_from_value).collect())
        .unwrap_or_default();

    VisionLayout {
        elements,
        background_color_hex: background.unwrap_or_else(|| DEFAULT_BACKGROUND.to_string()),
    }
}

fn element_from_value(value: &Value) -> Option<VisionElement> {
    let obj = value.as_object()?;

    let frame = PercentRect {
        x: number_field(obj, &["x"]).unwrap_or(DEFAULT_X),
        y: number_field(obj, &["y"]).unwrap_or(DEFAULT_Y),
        width: number_field(obj, &["width", "w"]).unwrap_or(DEFAULT_WIDTH),
        height: number_field(obj, &["height", "h"]).unwrap_or(DEFAULT_HEIGHT),
    };

    let kind = obj
        .get("type")
        .and_then(Value::as_str)
        .map(|s| s.trim().to_ascii_lowercase())
        .unwrap_or_default();

    let element = match kind.as_str() {
        "shape" | "rect" | "rectangle" => VisionElement::Shape {
            frame,
            fill_color_hex: string_field(
                obj,
                &[
                    "backgroundColorHex",
                    "fillColorHex",
                    "background_color",
                    "fill_color",
                    "color",
                ],
            ),
        },
        "image" | "picture" | "figure" => VisionElement::Image { frame },
        _ => VisionElement::Text {
            frame,
            content: content_field(obj),
            font_size: number_field(obj, &["fontSize", "font_size"])
                .filter(|s| *s > 0.0)
                .unwrap_or(DEFAULT_FONT_SIZE),
            color_hex: string_field(obj, &["fontColorHex", "font_color", "fontColor", "color"])
                .unwrap_or_else(|| DEFAULT_FONT_COLOR.to_string()),
            bold: bool_field(obj, "bold"),
            italic: bool_field(obj, "italic"),
            alignment: obj
                .get("alignment")
                .or_else(|| obj.get("align"))
                .and_then(Value::as_str)
                .map(TextAlign::parse)
                .unwrap_or_default(),
        },
    };
    Some(element)
}

/// Numbers, or strings holding a number (a trailing `%` is allowed).
fn number_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<f32> {
    let value = keys.iter().find_map(|k| obj.get(*k))?;
    let n = match value {
        Value::Number(n) => n.as_f64()? as f32,
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f32>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

fn string_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

fn bool_field(obj: &Map<String, Value>, key: &str) -> bool {
    match obj.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Some(Value::String(s)) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "yes" | "1"),
        _ => false,
    }
}

fn content_field(obj: &Map<String, Value>) -> String {
    match obj.get("content").or_else(|| obj.get("text")) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_json_fence() {
        let raw = "```json\n{\"elements\": []}\n```";
        assert_eq!(strip_code_fences(raw), "{\"elements\": []}");
    }

    #[test]
    fn strips_bare_fence() {
        assert_eq!(strip_code_fences("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fences("  {}  "), "{}");
    }

    #[test]
    fn empty_fenced_elements_yield_empty_layout() {
        let layout = parse_layout_reply("```json\n{\"elements\":[]}\n```");
        assert!(layout.is_empty());
        assert_eq!(layout.background_color_hex, "#FFFFFF");
    }

    #[test]
    fn empty_and_garbage_replies_are_empty() {
        assert!(parse_layout_reply("").is_empty());
        assert!(parse_layout_reply("   ").is_empty());
        assert!(parse_layout_reply("I cannot help with that.").is_empty());
        assert!(parse_layout_reply("{ unterminated").is_empty());
    }

    #[test]
    fn trailing_prose_is_ignored() {
        let raw = r##"Here is the layout: {"backgroundColorHex":"#112233","elements":[{"type":"image","x":1,"y":2,"width":3,"height":4}]} Hope this helps {not json}"##;
        let layout = parse_layout_reply(raw);
        assert_eq!(layout.background_color_hex, "#112233");
        assert_eq!(layout.elements.len(), 1);
        assert_eq!(
            layout.elements[0],
            VisionElement::Image {
                frame: PercentRect {
                    x: 1.0,
                    y: 2.0,
                    width: 3.0,
                    height: 4.0
                }
            }
        );
    }

    #[test]
    fn brace_matching_skips_braces_in_strings() {
        let raw = r#"prefix {"a": "}{ \"quoted\" }", "b": {"c": 1}} suffix"#;
        assert_eq!(
            first_json_object(raw),
            Some(r#"{"a": "}{ \"quoted\" }", "b": {"c": 1}}"#)
        );
        assert_eq!(first_json_object("no braces"), None);
    }

    #[test]
    fn missing_fields_get_defaults() {
        let layout = parse_layout_reply(r#"{"elements":[{"type":"text","content":"Hi"}]}"#);
        match &layout.elements[0] {
            VisionElement::Text {
                frame,
                font_size,
                color_hex,
                bold,
                alignment,
                ..
            } => {
                assert_eq!(frame.x, 0.0);
                assert_eq!(frame.y, 0.0);
                assert_eq!(frame.width, 10.0);
                assert_eq!(frame.height, 5.0);
                assert_eq!(*font_size, 14.0);
                assert_eq!(color_hex, "#000000");
                assert!(!bold);
                assert_eq!(*alignment, TextAlign::Left);
            }
            other => panic!("expected text, got {other:?}"),
        }
    }

    #[test]
    fn unknown_type_is_text_and_strings_coerce() {
        let raw = r#"{"elements":[{"type":"banner","text":"Sale","x":"12.5%","fontSize":"30","bold":"true","alignment":"center"}]}"#;
        let layout = parse_layout_reply(raw);
        match &layout.elements[0] {
            VisionElement::Text {
                frame,
                content,
                font_size,
                bold,
                alignment,
                ..
            } => {
                assert_eq!(content, "Sale");
                assert_eq!(frame.x, 12.5);
                assert_eq!(*font_size, 30.0);
                assert!(*bold);
                assert_eq!(*alignment, TextAlign::Center);
            }
            other => panic!("expected text, got {other:?}"),
        }
    }

    #[test]
    fn snake_case_aliases_are_accepted() {
        let raw = r##"{"background_color":"#000000","elements":[
            {"type":"text","content":"a","font_size":20,"font_color":"#FF0000"},
            {"type":"shape","background_color":"#00FF00"}]}"##;
        let layout = parse_layout_reply(raw);
        assert_eq!(layout.background_color_hex, "#000000");
        match &layout.elements[0] {
            VisionElement::Text {
                font_size,
                color_hex,
                ..
            } => {
                assert_eq!(*font_size, 20.0);
                assert_eq!(color_hex, "#FF0000");
            }
            other => panic!("expected text, got {other:?}"),
        }
        assert_eq!(
            layout.elements[1],
            VisionElement::Shape {
                frame: PercentRect {
                    x: 0.0,
                    y: 0.0,
                    width: 10.0,
                    height: 5.0
                },
                fill_color_hex: Some("#00FF00".into()),
            }
        );
    }

    #[test]
    fn shape_without_fill_has_none() {
        let layout = parse_layout_reply(r#"{"elements":[{"type":"shape","x":0,"y":0,"width":100,"height":10}]}"#);
        assert!(matches!(
            layout.elements[0],
            VisionElement::Shape {
                fill_color_hex: None,
                ..
            }
        ));
    }

    #[test]
    fn non_object_elements_are_skipped_and_order_kept() {
        let raw = r#"{"elements":[{"type":"shape"}, 42, "junk", {"type":"text","content":"t"}, {"type":"image"}]}"#;
        let layout = parse_layout_reply(raw);
        assert_eq!(layout.elements.len(), 3);
        assert!(matches!(layout.elements[0], VisionElement::Shape { .. }));
        assert!(matches!(layout.elements[1], VisionElement::Text { .. }));
        assert!(matches!(layout.elements[2], VisionElement::Image { .. }));
    }

    #[test]
    fn parsing_is_idempotent() {
        let raw = "```json\n{\"backgroundColorHex\":\"#FAFAFA\",\"elements\":[{\"type\":\"text\",\"content\":\"Line 1\\nLine 2\",\"x\":5,\"y\":5,\"width\":50,\"height\":20}]}\n```";
        assert_eq!(parse_layout_reply(raw), parse_layout_reply(raw));
    }
}
