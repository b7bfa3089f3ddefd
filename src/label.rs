//! # Label Store
//!
//! Ordered collection of text labels drawn over the image.
//!
//! ## Ordering
//!
//! The position of a label in the collection is its z-order. Labels are
//! painted first to last, so a later label covers an earlier one, and pointer
//! hit-testing scans last to first so the label on top wins. There is no
//! separate z-index field.
//!
//! ## Caption Slots
//!
//! ```text
//! ┌──────────────────────────┐
//! │        label 0 (8%)      │
//! │                          │
//! │    labels 2.. (50%)      │
//! │                          │
//! │        label 1 (92%)     │
//! └──────────────────────────┘
//! ```
//!
//! Every resize moves labels back into these slots, horizontally centered.

use serde::{Deserialize, Serialize};

use crate::config::CompositorConfig;

/// Unique label identifier. Never reused within a store.
pub type LabelId = u64;

/// Relative position of the top caption slot.
pub const TOP_SLOT: (f32, f32) = (0.5, 0.08);
/// Relative position of the bottom caption slot.
pub const BOTTOM_SLOT: (f32, f32) = (0.5, 0.92);
/// Relative position of every label after the first two.
pub const CENTER_SLOT: (f32, f32) = (0.5, 0.5);

/// Text shown on the label created by "add text".
pub const NEW_LABEL_TEXT: &str = "NEW TEXT";

/// Horizontal anchor of a label's text relative to its x coordinate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    /// Text starts at x.
    Left,
    /// Text is centered on x.
    #[default]
    Center,
    /// Text ends at x.
    Right,
}

impl Align {
    /// Left edge of a line of the given width anchored at `x`.
    pub fn line_start(self, x: f32, width: f32) -> f32 {
        match self {
            Align::Left => x,
            Align::Center => x - width / 2.0,
            Align::Right => x - width,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Align::Left => "left",
            Align::Center => "center",
            Align::Right => "right",
        }
    }

    /// Parse an alignment name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "left" | "l" => Some(Align::Left),
            "center" | "centre" | "c" => Some(Align::Center),
            "right" | "r" => Some(Align::Right),
            _ => None,
        }
    }
}

/// A positioned, styled text overlay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Label {
    pub id: LabelId,
    /// May contain `\n`; each line is drawn separately.
    pub text: String,
    /// Anchor x in raster pixels (see [`Align`]).
    pub x: f32,
    /// Vertical center of the text block in raster pixels.
    pub y: f32,
    pub font_size: u32,
    pub align: Align,
}

impl Label {
    /// Short text for label listings: up to 12 characters, then an ellipsis.
    pub fn chip_text(&self) -> String {
        if self.text.is_empty() {
            return "(empty)".to_string();
        }
        if self.text.chars().count() > 12 {
            let head: String = self.text.chars().take(12).collect();
            format!("{}…", head)
        } else {
            self.text.clone()
        }
    }
}

/// Partial update for a label. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelPatch {
    pub text: Option<String>,
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub font_size: Option<u32>,
    pub align: Option<Align>,
}

impl LabelPatch {
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn position(mut self, x: f32, y: f32) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    pub fn font_size(mut self, size: u32) -> Self {
        self.font_size = Some(size);
        self
    }

    pub fn align(mut self, align: Align) -> Self {
        self.align = Some(align);
        self
    }
}

/// Owned, ordered label collection with selection and caption layout.
///
/// Once seeded the store never drops below one label.
#[derive(Debug, Clone)]
pub struct LabelStore {
    labels: Vec<Label>,
    next_id: LabelId,
    active: Option<LabelId>,
    width: u32,
    height: u32,
    default_font_size: u32,
    min_font_size: u32,
    max_font_size: u32,
}

impl Default for LabelStore {
    fn default() -> Self {
        Self::new(&CompositorConfig::default())
    }
}

impl LabelStore {
    /// Create an empty store sized to the config's initial surface.
    pub fn new(config: &CompositorConfig) -> Self {
        Self {
            labels: Vec::new(),
            next_id: 0,
            active: None,
            width: config.initial_width,
            height: config.initial_height,
            default_font_size: config.default_font_size,
            min_font_size: config.min_font_size,
            max_font_size: config.max_font_size,
        }
    }

    /// Create a store holding the two default captions.
    pub fn seeded(config: &CompositorConfig) -> Self {
        let mut store = Self::new(config);
        store.seed_if_empty();
        store
    }

    /// Seed "TOP TEXT" / "BOTTOM TEXT" into an empty store.
    ///
    /// Returns false (and does nothing) when labels already exist.
    pub fn seed_if_empty(&mut self) -> bool {
        if !self.labels.is_empty() {
            return false;
        }
        let top = self.add("TOP TEXT", TOP_SLOT.0, TOP_SLOT.1);
        self.add("BOTTOM TEXT", BOTTOM_SLOT.0, BOTTOM_SLOT.1);
        self.active = Some(top.id);
        true
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Labels in paint order (bottom to top).
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Label> {
        self.labels.iter()
    }

    pub fn get(&self, id: LabelId) -> Option<&Label> {
        self.labels.iter().find(|l| l.id == id)
    }

    /// Surface size the store lays labels out against.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn active_id(&self) -> Option<LabelId> {
        self.active
    }

    pub fn active(&self) -> Option<&Label> {
        self.active.and_then(|id| self.get(id))
    }

    /// Make `id` the active label. Unknown ids are ignored.
    pub fn select(&mut self, id: LabelId) -> bool {
        if self.get(id).is_none() {
            return false;
        }
        self.active = Some(id);
        true
    }

    /// Append a label at a position relative to the current surface size.
    pub fn add(&mut self, text: &str, rel_x: f32, rel_y: f32) -> Label {
        let label = Label {
            id: self.next_id,
            text: text.to_string(),
            x: self.width as f32 * rel_x,
            y: self.height as f32 * rel_y,
            font_size: self.default_font_size,
            align: Align::Center,
        };
        self.next_id += 1;
        self.labels.push(label.clone());
        label
    }

    /// Apply a partial update. Returns false if `id` is unknown.
    pub fn update(&mut self, id: LabelId, patch: &LabelPatch) -> bool {
        let (min, max) = (self.min_font_size, self.max_font_size);
        let Some(label) = self.labels.iter_mut().find(|l| l.id == id) else {
            return false;
        };

        if let Some(text) = &patch.text {
            label.text = text.clone();
        }
        if let Some(x) = patch.x {
            label.x = x;
        }
        if let Some(y) = patch.y {
            label.y = y;
        }
        if let Some(size) = patch.font_size {
            label.font_size = size.clamp(min, max);
        }
        if let Some(align) = patch.align {
            label.align = align;
        }
        true
    }

    /// Apply a partial update to the active label.
    pub fn update_active(&mut self, patch: &LabelPatch) -> bool {
        match self.active {
            Some(id) => self.update(id, patch),
            None => false,
        }
    }

    /// Remove a label.
    ///
    /// Refused when only one label is left. Afterwards the last label in the
    /// collection becomes active.
    pub fn delete(&mut self, id: LabelId) -> bool {
        if self.labels.len() <= 1 {
            return false;
        }
        let Some(index) = self.labels.iter().position(|l| l.id == id) else {
            return false;
        };
        self.labels.remove(index);
        self.active = self.labels.last().map(|l| l.id);
        true
    }

    pub fn delete_active(&mut self) -> bool {
        match self.active {
            Some(id) => self.delete(id),
            None => false,
        }
    }

    /// Record a new surface size and move every label into its caption slot.
    pub fn relayout(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.reset_positions();
    }

    /// Move every label back into its caption slot at the current size.
    pub fn reset_positions(&mut self) {
        let (w, h) = (self.width as f32, self.height as f32);
        for (index, label) in self.labels.iter_mut().enumerate() {
            let (rx, ry) = slot_for(index);
            label.x = w * rx;
            label.y = h * ry;
        }
    }
}

/// Relative caption slot for the label at `index` in paint order.
pub fn slot_for(index: usize) -> (f32, f32) {
    match index {
        0 => TOP_SLOT,
        1 => BOTTOM_SLOT,
        _ => CENTER_SLOT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn test_seed_creates_top_and_bottom() {
        let store = LabelStore::seeded(&CompositorConfig::default());
        assert_eq!(store.len(), 2);

        let top = &store.labels()[0];
        let bottom = &store.labels()[1];
        assert_eq!(top.text, "TOP TEXT");
        assert_eq!(bottom.text, "BOTTOM TEXT");
        assert!(approx(top.x, 400.0) && approx(top.y, 48.0));
        assert!(approx(bottom.x, 400.0) && approx(bottom.y, 552.0));
        assert_eq!(store.active_id(), Some(top.id));
    }

    #[test]
    fn test_seed_only_when_empty() {
        let mut store = LabelStore::seeded(&CompositorConfig::default());
        assert!(!store.seed_if_empty());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_add_uses_relative_position_and_defaults() {
        let mut store = LabelStore::seeded(&CompositorConfig::default());
        let label = store.add("MIDDLE", 0.5, 0.5);

        assert_eq!(label.id, 2);
        assert!(approx(label.x, 400.0) && approx(label.y, 300.0));
        assert_eq!(label.font_size, 48);
        assert_eq!(label.align, Align::Center);
        assert_eq!(store.labels().last(), Some(&label));
    }

    #[test]
    fn test_ids_are_never_reused() {
        let mut store = LabelStore::seeded(&CompositorConfig::default());
        let third = store.add("X", 0.5, 0.5);
        assert!(store.delete(third.id));
        let fourth = store.add("Y", 0.5, 0.5);
        assert_eq!(fourth.id, third.id + 1);
    }

    #[test]
    fn test_update_partial_fields() {
        let mut store = LabelStore::seeded(&CompositorConfig::default());
        let id = store.labels()[0].id;
        assert!(store.update(id, &LabelPatch::default().text("HELLO").align(Align::Right)));

        let label = store.get(id).unwrap();
        assert_eq!(label.text, "HELLO");
        assert_eq!(label.align, Align::Right);
        assert_eq!(label.font_size, 48);
        assert!(approx(label.y, 48.0));
    }

    #[test]
    fn test_update_unknown_id_is_noop() {
        let mut store = LabelStore::seeded(&CompositorConfig::default());
        let before = store.labels().to_vec();
        assert!(!store.update(99, &LabelPatch::default().text("nope")));
        assert_eq!(store.labels(), before.as_slice());
    }

    #[test]
    fn test_update_clamps_font_size() {
        let mut store = LabelStore::seeded(&CompositorConfig::default());
        let id = store.labels()[0].id;
        store.update(id, &LabelPatch::default().font_size(1));
        assert_eq!(store.get(id).unwrap().font_size, 12);
        store.update(id, &LabelPatch::default().font_size(999));
        assert_eq!(store.get(id).unwrap().font_size, 120);
    }

    #[test]
    fn test_delete_refuses_last_label() {
        let mut store = LabelStore::seeded(&CompositorConfig::default());
        let first = store.labels()[0].id;
        let second = store.labels()[1].id;

        assert!(store.delete(first));
        assert_eq!(store.len(), 1);
        assert!(!store.delete(second));
        assert_eq!(store.len(), 1);
        assert_eq!(store.active_id(), Some(second));
    }

    #[test]
    fn test_delete_moves_selection_to_last() {
        let mut store = LabelStore::seeded(&CompositorConfig::default());
        let third = store.add("THIRD", 0.5, 0.5);
        store.select(store.labels()[0].id);

        assert!(store.delete_active());
        assert_eq!(store.active_id(), Some(third.id));
    }

    #[test]
    fn test_delete_unknown_id_is_noop() {
        let mut store = LabelStore::seeded(&CompositorConfig::default());
        assert!(!store.delete(42));
        assert_eq!(store.len(), 2);
        assert_eq!(store.active_id(), Some(0));
    }

    #[test]
    fn test_relayout_uses_caption_slots() {
        let mut store = LabelStore::seeded(&CompositorConfig::default());
        store.add("A", 0.1, 0.1);
        store.add("B", 0.9, 0.9);
        store.update(0, &LabelPatch::default().position(3.0, 7.0));

        store.relayout(1000, 500);

        let positions: Vec<(f32, f32)> = store.iter().map(|l| (l.x, l.y)).collect();
        let expected = [(500.0, 40.0), (500.0, 460.0), (500.0, 250.0), (500.0, 250.0)];
        for (got, want) in positions.iter().zip(expected.iter()) {
            assert!(approx(got.0, want.0) && approx(got.1, want.1), "{:?} != {:?}", got, want);
        }
        assert_eq!(store.size(), (1000, 500));
    }

    #[test]
    fn test_select_unknown_is_ignored() {
        let mut store = LabelStore::seeded(&CompositorConfig::default());
        assert!(!store.select(7));
        assert_eq!(store.active_id(), Some(0));
        assert!(store.select(1));
        assert_eq!(store.active().map(|l| l.text.as_str()), Some("BOTTOM TEXT"));
    }

    #[test]
    fn test_chip_text() {
        let mut store = LabelStore::seeded(&CompositorConfig::default());
        let label = store.add("", 0.5, 0.5);
        assert_eq!(label.chip_text(), "(empty)");
        assert_eq!(store.labels()[0].chip_text(), "TOP TEXT");

        let long = store.add("ONE DOES NOT SIMPLY", 0.5, 0.5);
        assert_eq!(long.chip_text(), "ONE DOES NOT…");
    }

    #[test]
    fn test_align_parsing_and_anchor() {
        assert_eq!(Align::from_name("LEFT"), Some(Align::Left));
        assert_eq!(Align::from_name("centre"), Some(Align::Center));
        assert_eq!(Align::from_name("diagonal"), None);

        assert!(approx(Align::Left.line_start(100.0, 40.0), 100.0));
        assert!(approx(Align::Center.line_start(100.0, 40.0), 80.0));
        assert!(approx(Align::Right.line_start(100.0, 40.0), 60.0));
    }
}
