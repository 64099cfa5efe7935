//! Extraction instruction sent to the vision model with every page.
//!
//! The reply contract is fixed: a single JSON object with geometry in
//! percentages of the slide. [`crate::pipeline::reply`] parses whatever the
//! model actually returns against this shape. Callers can override the
//! instruction via [`crate::config::ConversionConfig::instruction`]; the
//! constant here is used only when no override is provided.

/// Default instruction for turning a slide image into a layout description.
pub const DEFAULT_EXTRACTION_INSTRUCTION: &str = r##"You are an expert presentation slide analyzer. Analyze this slide image and extract ALL visual elements into a structured JSON format.

For each element, identify:
1. Text blocks: all text content with approximate position, font size, color and styling
2. Images/graphics: areas containing pictures, charts or illustrations (NOT the background)
3. Shapes: background panels, colored boxes, dividers and other decorative fills

Return a JSON object with exactly this structure:
{
  "backgroundColorHex": "#FFFFFF",
  "elements": [
    {
      "type": "text",
      "content": "the actual text content here",
      "x": 5, "y": 10, "width": 40, "height": 8,
      "fontSize": 24,
      "fontColorHex": "#333333",
      "bold": true,
      "italic": false,
      "alignment": "left"
    },
    {
      "type": "shape",
      "x": 0, "y": 0, "width": 100, "height": 15,
      "backgroundColorHex": "#2C3E50"
    },
    {
      "type": "image",
      "x": 60, "y": 20, "width": 35, "height": 60
    }
  ]
}

CRITICAL RULES:
- x, y, width and height are PERCENTAGES (0-100) of the full slide width and height
- Extract EVERY piece of visible text
- Keep multi-line text in one element, separating lines with newline characters
- Title text is usually 24-44pt, subtitles 18-24pt, body text 14-18pt, captions 10-12pt
- Colors are #RRGGBB hex
- alignment is one of "left", "center", "right"
- Order elements: shapes first (background layer), then text, then images
- Return ONLY the JSON object: no markdown fences, no explanation"##;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instruction_names_every_reply_field() {
        for key in [
            "backgroundColorHex",
            "elements",
            "fontSize",
            "fontColorHex",
            "alignment",
            "\"shape\"",
            "\"image\"",
        ] {
            assert!(
                DEFAULT_EXTRACTION_INSTRUCTION.contains(key),
                "instruction is missing {key}"
            );
        }
    }

    #[test]
    fn instruction_demands_percentages_and_order() {
        assert!(DEFAULT_EXTRACTION_INSTRUCTION.contains("PERCENTAGES"));
        assert!(DEFAULT_EXTRACTION_INSTRUCTION.contains("shapes first"));
    }
}
