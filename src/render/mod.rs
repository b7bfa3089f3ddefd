//! # Render Pipeline
//!
//! Draws the image and every label into the raster surface.
//!
//! ## Frame Order
//!
//! ```text
//! clear → image (or #111 fill) → for each label, in collection order:
//!                                    for each line:
//!                                        stroke (black, round joins)
//!                                        fill   (white)
//! ```
//!
//! Later labels paint over earlier ones. A frame depends only on the surface
//! size, the backdrop, the labels and the typeface, so redrawing unchanged
//! state gives identical pixels.
//!
//! ## Modules
//!
//! - [`font`]: TrueType metrics and glyph outlines
//! - [`text`]: text block layout shared with hit-testing

pub mod font;
pub mod text;

pub use font::Typeface;
pub use text::{LINE_HEIGHT_FACTOR, TextBlock, line_centers, stroke_width};

use image::{DynamicImage, RgbaImage, imageops::FilterType};
use tiny_skia::{
    Color, FillRule, IntSize, LineJoin, Paint, Pixmap, PixmapPaint, Stroke, Transform,
};

use crate::error::CanvasError;
use crate::label::Label;

/// Fill drawn when no image is loaded (`#111`).
pub const PLACEHOLDER_RGB: [u8; 3] = [0x11, 0x11, 0x11];

/// Outline color of label text.
pub const STROKE_RGB: [u8; 3] = [0, 0, 0];

/// Fill color of label text.
pub const FILL_RGB: [u8; 3] = [255, 255, 255];

/// The pixel buffer a frame is drawn into (premultiplied RGBA).
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    pixmap: Pixmap,
}

impl Surface {
    pub fn new(width: u32, height: u32) -> Result<Self, CanvasError> {
        let pixmap = Pixmap::new(width, height).ok_or_else(|| {
            CanvasError::Config(format!("Invalid surface size {}x{}", width, height))
        })?;
        Ok(Self { pixmap })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Raw premultiplied RGBA bytes.
    pub fn data(&self) -> &[u8] {
        self.pixmap.data()
    }

    /// Straight-alpha RGBA of one pixel.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let c = self.pixmap.pixel(x, y)?.demultiply();
        Some([c.red(), c.green(), c.blue(), c.alpha()])
    }

    /// Copy out as a straight-alpha RGBA image.
    pub fn to_rgba_image(&self) -> RgbaImage {
        let mut data = Vec::with_capacity(self.pixmap.data().len());
        for px in self.pixmap.pixels() {
            let c = px.demultiply();
            data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
        RgbaImage::from_raw(self.width(), self.height(), data)
            .unwrap_or_else(|| RgbaImage::new(self.width(), self.height()))
    }
}

/// The loaded image, pre-scaled to the surface size.
#[derive(Debug, Clone, PartialEq)]
pub struct Backdrop {
    pixmap: Pixmap,
}

impl Backdrop {
    /// Scale `image` to exactly `width`×`height` and convert it for drawing.
    pub fn from_image(image: &DynamicImage, width: u32, height: u32) -> Result<Self, CanvasError> {
        let scaled = if image.width() == width && image.height() == height {
            image.to_rgba8()
        } else {
            image.resize_exact(width, height, FilterType::Triangle).to_rgba8()
        };

        let mut data = scaled.into_raw();
        for px in data.chunks_exact_mut(4) {
            let a = px[3] as u32;
            if a < 255 {
                for c in &mut px[..3] {
                    *c = ((*c as u32 * a + 127) / 255) as u8;
                }
            }
        }

        let size = IntSize::from_wh(width, height).ok_or_else(|| {
            CanvasError::Decode(format!("Invalid image size {}x{}", width, height))
        })?;
        let pixmap = Pixmap::from_vec(data, size)
            .ok_or_else(|| CanvasError::Decode("Image buffer size mismatch".to_string()))?;
        Ok(Self { pixmap })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }
}

/// Draw one complete frame.
pub fn draw_frame(
    surface: &mut Surface,
    backdrop: Option<&Backdrop>,
    labels: &[Label],
    typeface: &Typeface,
) {
    let pixmap = &mut surface.pixmap;
    pixmap.fill(Color::TRANSPARENT);

    match backdrop {
        Some(image) => pixmap.draw_pixmap(
            0,
            0,
            image.pixmap.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        ),
        None => {
            let [r, g, b] = PLACEHOLDER_RGB;
            pixmap.fill(Color::from_rgba8(r, g, b, 255));
        }
    }

    for label in labels {
        draw_label(pixmap, label, typeface);
    }
}

fn draw_label(pixmap: &mut Pixmap, label: &Label, typeface: &Typeface) {
    let Some(block) = TextBlock::layout(label, typeface) else {
        return;
    };
    let size = label.font_size as f32;

    let mut outline = Paint::default();
    let [r, g, b] = STROKE_RGB;
    outline.set_color_rgba8(r, g, b, 255);
    outline.anti_alias = true;

    let mut fill = Paint::default();
    let [r, g, b] = FILL_RGB;
    fill.set_color_rgba8(r, g, b, 255);
    fill.anti_alias = true;

    let stroke = Stroke {
        width: stroke_width(size),
        line_join: LineJoin::Round,
        ..Stroke::default()
    };

    for line in &block.lines {
        let Some(path) = typeface.line_path(line.text, line.start_x, line.middle_y, size) else {
            continue;
        };
        pixmap.stroke_path(&path, &outline, &stroke, Transform::identity(), None);
        pixmap.fill_path(&path, &fill, FillRule::Winding, Transform::identity(), None);
    }
}
