//! Presentation model and its OOXML writer.
//!
//! [`build`] turns extraction output into a [`Deck`]; [`pptx`] serialises a
//! deck into a `.pptx` package. Geometry in this module is absolute EMU (see
//! [`units`]); shapes are painted in the order they appear in
//! [`Slide::shapes`].

pub mod build;
mod parts;
pub mod pptx;
pub mod units;

use crate::model::TextAlign;
use units::Rgb;

/// Absolute rectangle in EMU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i64,
    pub y: i64,
    pub cx: i64,
    pub cy: i64,
}

/// Character formatting shared by every run of a paragraph.
#[derive(Debug, Clone, PartialEq)]
pub struct RunStyle {
    /// Hundredths of a point, as `a:rPr/@sz` expects.
    pub size_hundredths: u32,
    pub color: Rgb,
    pub bold: bool,
    pub italic: bool,
    pub font_family: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Paragraph {
    pub text: String,
    pub style: RunStyle,
    pub alignment: TextAlign,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextBox {
    pub rect: Rect,
    pub paragraphs: Vec<Paragraph>,
}

/// One drawable on a slide.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Text(TextBox),
    /// Borderless rectangle; `None` fill is transparent.
    Rectangle { rect: Rect, fill: Option<Rgb> },
    /// PNG-encoded picture stretched to `rect`.
    Picture { rect: Rect, png: Vec<u8> },
}

impl Shape {
    pub fn rect(&self) -> &Rect {
        match self {
            Shape::Text(tb) => &tb.rect,
            Shape::Rectangle { rect, .. } | Shape::Picture { rect, .. } => rect,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Slide {
    /// Solid background; `None` inherits the master's (white).
    pub background: Option<Rgb>,
    pub shapes: Vec<Shape>,
}

/// A whole presentation. All slides share one canvas size.
#[derive(Debug, Clone, PartialEq)]
pub struct Deck {
    pub width_emu: i64,
    pub height_emu: i64,
    pub slides: Vec<Slide>,
}

impl Deck {
    pub fn new(width_emu: i64, height_emu: i64) -> Self {
        Self {
            width_emu,
            height_emu,
            slides: Vec::new(),
        }
    }

    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    /// Shapes across all slides.
    pub fn element_count(&self) -> usize {
        self.slides.iter().map(|s| s.shapes.len()).sum()
    }
}
