//! Text block layout shared by drawing and hit-testing.
//!
//! ## Geometry
//!
//! ```text
//! line_height  = font_size * 1.25
//! block_height = line_count * line_height
//! line_y(i)    = y - block_height / 2 + i * line_height + line_height / 2
//! ```
//!
//! The block is as wide as its widest line and is anchored at the label's x
//! according to its alignment. Each line is anchored independently with its
//! own width, so a centered block has every line centered on x.

use crate::label::Label;

use super::font::Typeface;

/// Line height as a multiple of the font size.
pub const LINE_HEIGHT_FACTOR: f32 = 1.25;

/// Outline stroke width for a font size: `max(1, size / 7) * 2`.
pub fn stroke_width(font_size: f32) -> f32 {
    (font_size / 7.0).max(1.0) * 2.0
}

/// Vertical middles of `line_count` lines centered on `y`.
pub fn line_centers(y: f32, line_count: usize, font_size: f32) -> Vec<f32> {
    let line_height = font_size * LINE_HEIGHT_FACTOR;
    let block_height = line_count as f32 * line_height;
    (0..line_count)
        .map(|i| y - block_height / 2.0 + i as f32 * line_height + line_height / 2.0)
        .collect()
}

/// One laid-out line.
#[derive(Debug, Clone, PartialEq)]
pub struct LineLayout<'a> {
    pub text: &'a str,
    /// Left edge in raster pixels.
    pub start_x: f32,
    /// Vertical middle in raster pixels.
    pub middle_y: f32,
    pub width: f32,
}

/// A label's text laid out in raster space.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock<'a> {
    pub lines: Vec<LineLayout<'a>>,
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl<'a> TextBlock<'a> {
    /// Lay out a label. Returns `None` for empty text, which is neither
    /// drawn nor hit.
    pub fn layout(label: &'a Label, typeface: &Typeface) -> Option<Self> {
        if label.text.is_empty() {
            return None;
        }

        let size = label.font_size as f32;
        let texts: Vec<&'a str> = label.text.split('\n').collect();
        let centers = line_centers(label.y, texts.len(), size);

        let lines: Vec<LineLayout<'a>> = texts
            .into_iter()
            .zip(centers)
            .map(|(text, middle_y)| {
                let width = typeface.line_width(text, size);
                LineLayout {
                    text,
                    start_x: label.align.line_start(label.x, width),
                    middle_y,
                    width,
                }
            })
            .collect();

        let width = lines.iter().map(|l| l.width).fold(0.0f32, f32::max);
        let height = lines.len() as f32 * size * LINE_HEIGHT_FACTOR;

        Some(Self {
            left: label.align.line_start(label.x, width),
            top: label.y - height / 2.0,
            width,
            height,
            lines,
        })
    }

    /// Whether a point lies within the block grown by `padding` on every side.
    pub fn contains(&self, x: f32, y: f32, padding: f32) -> bool {
        x >= self.left - padding
            && x <= self.left + self.width + padding
            && y >= self.top - padding
            && y <= self.top + self.height + padding
    }
}
