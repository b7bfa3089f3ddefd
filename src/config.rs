//! # Compositor Configuration
//!
//! Tunables for the canvas and the JSON composition document used by the CLI.
//!
//! ## Defaults
//!
//! | Property | Value |
//! |----------|-------|
//! | Max display width | 800 px |
//! | Surface before any image | 800×600 |
//! | Hit-test padding | 10 px |
//! | JPEG quality | 75 |
//! | Label font size | 48 px (12..=120) |
//!
//! ## Usage
//!
//! ```
//! use meme_canvas::config::CompositorConfig;
//!
//! let config = CompositorConfig::default();
//! assert_eq!(config.display_size(1600, 1200), (800, 600));
//! ```

use serde::Deserialize;
use std::path::Path;

use crate::error::CanvasError;
use crate::label::Align;

/// # Compositor Configuration
///
/// Geometry and encoding constants for one compositor instance.
///
/// ## Display Scaling
///
/// ```text
/// scale  = min(1, max_width / source_width)
/// width  = round(source_width  * scale)
/// height = round(source_height * scale)
/// ```
///
/// Only the width is capped; tall images keep their full scaled height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompositorConfig {
    /// Widest surface the compositor will create
    pub max_width: u32,

    /// Surface width before any image has been loaded
    pub initial_width: u32,

    /// Surface height before any image has been loaded
    pub initial_height: u32,

    /// Margin added on every side of a text block for hit-testing
    pub hit_padding: f32,

    /// JPEG quality used when exporting for sharing (1-100)
    pub jpeg_quality: u8,

    /// Font size given to new labels
    pub default_font_size: u32,

    /// Smallest font size a label can be set to
    pub min_font_size: u32,

    /// Largest font size a label can be set to
    pub max_font_size: u32,
}

impl CompositorConfig {
    /// Dimensions the surface takes for a source image of the given size.
    pub fn display_size(&self, source_width: u32, source_height: u32) -> (u32, u32) {
        let scale = (self.max_width as f32 / source_width.max(1) as f32).min(1.0);
        let width = (source_width as f32 * scale).round() as u32;
        let height = (source_height as f32 * scale).round() as u32;
        (width.max(1), height.max(1))
    }

    /// Clamp a requested font size into the supported range.
    pub fn clamp_font_size(&self, size: u32) -> u32 {
        size.clamp(self.min_font_size, self.max_font_size)
    }
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            max_width: 800,
            initial_width: 800,
            initial_height: 600,
            hit_padding: 10.0,
            jpeg_quality: 75,
            default_font_size: 48,
            min_font_size: 12,
            max_font_size: 120,
        }
    }
}

/// A complete meme description, loaded from JSON by the CLI.
///
/// ```json
/// {
///   "template": "drake",
///   "labels": [
///     { "text": "WRITING IT BY HAND" },
///     { "text": "HAVING A COMPOSITOR", "font_size": 40 },
///     { "text": "extra", "x": 0.25, "y": 0.5, "align": "left" }
///   ]
/// }
/// ```
///
/// Labels without `x`/`y` take the caption slots (top, bottom, center).
/// Explicit `x`/`y` are fractions of the surface size and are applied after
/// the image is loaded.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Composition {
    /// Catalog name/index, file path or URL of the template
    #[serde(default)]
    pub template: Option<String>,

    /// Local image file used instead of a template
    #[serde(default)]
    pub image: Option<String>,

    #[serde(default)]
    pub labels: Vec<LabelSpec>,
}

/// One label entry in a [`Composition`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LabelSpec {
    pub text: String,
    #[serde(default)]
    pub x: Option<f32>,
    #[serde(default)]
    pub y: Option<f32>,
    #[serde(default)]
    pub font_size: Option<u32>,
    #[serde(default)]
    pub align: Option<Align>,
}

impl Composition {
    /// Parse a composition from JSON text.
    pub fn from_json(json: &str) -> Result<Self, CanvasError> {
        serde_json::from_str(json)
            .map_err(|e| CanvasError::Config(format!("Invalid composition: {}", e)))
    }

    /// Read and parse a composition file.
    pub fn from_file(path: &Path) -> Result<Self, CanvasError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}
