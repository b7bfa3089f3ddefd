//! TrueType label typography.
//!
//! Glyph metrics and outlines come from `ab_glyph`; outlines are converted to
//! `tiny-skia` paths so the same geometry can be stroked and filled. All
//! measurements are done in unscaled font units and multiplied by
//! `font_size / units_per_em`, so a 48px label has a 48px em square.

use ab_glyph::{Font, FontArc, GlyphId, OutlineCurve};
use std::path::Path;
use std::sync::OnceLock;
use tiny_skia::PathBuilder;

use crate::error::CanvasError;

static DEJAVU_SANS_BOLD: OnceLock<FontArc> = OnceLock::new();

fn dejavu_sans_bold() -> &'static FontArc {
    DEJAVU_SANS_BOLD.get_or_init(|| {
        FontArc::try_from_slice(include_bytes!("fonts/DejaVuSans-Bold.ttf"))
            .expect("Failed to load DejaVu Sans Bold")
    })
}

/// A font face used for measuring and drawing labels.
#[derive(Clone)]
pub struct Typeface {
    font: FontArc,
}

impl Default for Typeface {
    fn default() -> Self {
        Self::embedded()
    }
}

impl std::fmt::Debug for Typeface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Typeface")
            .field("units_per_em", &self.units_per_em())
            .finish()
    }
}

impl Typeface {
    /// The built-in bold sans face.
    pub fn embedded() -> Self {
        Self {
            font: dejavu_sans_bold().clone(),
        }
    }

    /// Load a TTF/OTF face from memory.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, CanvasError> {
        let font = FontArc::try_from_vec(data)
            .map_err(|e| CanvasError::Font(format!("Invalid font data: {}", e)))?;
        Ok(Self { font })
    }

    /// Load a TTF/OTF face from disk.
    pub fn from_file(path: &Path) -> Result<Self, CanvasError> {
        let data = std::fs::read(path)?;
        Self::from_bytes(data)
    }

    fn units_per_em(&self) -> f32 {
        self.font.units_per_em().unwrap_or(1000.0)
    }

    /// Pixels per font unit at the given font size.
    fn scale(&self, font_size: f32) -> f32 {
        font_size / self.units_per_em()
    }

    /// Glyphs of `text` with their pen positions, in font units.
    ///
    /// Returns the glyph list and the total advance.
    fn layout_unscaled(&self, text: &str) -> (Vec<(GlyphId, f32)>, f32) {
        let mut glyphs = Vec::with_capacity(text.len());
        let mut caret = 0.0f32;
        let mut previous: Option<GlyphId> = None;

        for ch in text.chars() {
            let id = self.font.glyph_id(ch);
            if let Some(prev) = previous {
                caret += self.font.kern_unscaled(prev, id);
            }
            glyphs.push((id, caret));
            caret += self.font.h_advance_unscaled(id);
            previous = Some(id);
        }

        (glyphs, caret)
    }

    /// Advance width of one line of text in pixels.
    pub fn line_width(&self, text: &str, font_size: f32) -> f32 {
        let (_, advance) = self.layout_unscaled(text);
        advance * self.scale(font_size)
    }

    /// Distance from a line's vertical middle down to its baseline.
    pub fn middle_to_baseline(&self, font_size: f32) -> f32 {
        let ascent = self.font.ascent_unscaled();
        let descent = self.font.descent_unscaled();
        (ascent + descent) / 2.0 * self.scale(font_size)
    }

    /// Outline path of one line of text.
    ///
    /// `start_x` is the left edge of the line and `middle_y` its vertical
    /// middle, both in raster pixels. Returns `None` for text with no
    /// visible glyphs (e.g. only spaces).
    pub fn line_path(
        &self,
        text: &str,
        start_x: f32,
        middle_y: f32,
        font_size: f32,
    ) -> Option<tiny_skia::Path> {
        let scale = self.scale(font_size);
        let baseline = middle_y + self.middle_to_baseline(font_size);
        let (glyphs, _) = self.layout_unscaled(text);

        let mut builder = PathBuilder::new();
        for (id, pen) in glyphs {
            let Some(outline) = self.font.outline(id) else {
                continue;
            };
            let to_px = |p: ab_glyph::Point| (start_x + (pen + p.x) * scale, baseline - p.y * scale);

            // Contours are not delimited explicitly; a curve that does not
            // start where the previous one ended opens a new contour.
            let mut last: Option<ab_glyph::Point> = None;
            for curve in &outline.curves {
                let start = match curve {
                    OutlineCurve::Line(p0, _)
                    | OutlineCurve::Quad(p0, _, _)
                    | OutlineCurve::Cubic(p0, _, _, _) => *p0,
                };
                if last != Some(start) {
                    if last.is_some() {
                        builder.close();
                    }
                    let (x, y) = to_px(start);
                    builder.move_to(x, y);
                }
                let end = match curve {
                    OutlineCurve::Line(_, p1) => {
                        let (x, y) = to_px(*p1);
                        builder.line_to(x, y);
                        *p1
                    }
                    OutlineCurve::Quad(_, c, p2) => {
                        let (cx, cy) = to_px(*c);
                        let (x, y) = to_px(*p2);
                        builder.quad_to(cx, cy, x, y);
                        *p2
                    }
                    OutlineCurve::Cubic(_, c1, c2, p3) => {
                        let (c1x, c1y) = to_px(*c1);
                        let (c2x, c2y) = to_px(*c2);
                        let (x, y) = to_px(*p3);
                        builder.cubic_to(c1x, c1y, c2x, c2y, x, y);
                        *p3
                    }
                };
                last = Some(end);
            }
            if last.is_some() {
                builder.close();
            }
        }

        builder.finish()
    }
}
