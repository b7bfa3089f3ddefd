//! # Hit-Testing and Dragging
//!
//! Maps pointer and touch input onto labels.
//!
//! Hit boxes come from [`TextBlock`], the same layout the renderer draws,
//! grown by a fixed padding. Labels are scanned from last to first because
//! later labels are painted on top.
//!
//! ## Gesture
//!
//! ```text
//! down over label ──► DragSession { label, offset = pointer - label }
//! move            ──► label = pointer - offset        (not clamped)
//! up / leave      ──► session dropped
//! ```
//!
//! A down over empty canvas does nothing: no deselect, no session.

use crate::label::{Label, LabelId, LabelPatch, LabelStore};
use crate::render::{TextBlock, Typeface};

/// A point in raster (or client) pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// On-screen rectangle the surface is displayed in.
///
/// The element can be scaled by layout, so client coordinates must be
/// mapped back to raster pixels before hit-testing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    /// A viewport showing the raster at 1:1 at the origin.
    pub fn identity(width: u32, height: u32) -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            width: width as f32,
            height: height as f32,
        }
    }

    /// Map client coordinates into raster coordinates.
    ///
    /// Returns `None` for a collapsed (zero-sized) viewport.
    pub fn to_raster(&self, client: Point, raster_width: u32, raster_height: u32) -> Option<Point> {
        if self.width <= 0.0 || self.height <= 0.0 {
            return None;
        }
        Some(Point {
            x: (client.x - self.left) * (raster_width as f32 / self.width),
            y: (client.y - self.top) * (raster_height as f32 / self.height),
        })
    }
}

/// Input device behind a pointer event. Touch has no hover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Mouse,
    Touch,
}

/// Cursor affordance over the canvas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Cursor {
    #[default]
    Default,
    /// Hovering a draggable label
    Grab,
}

/// The label currently being dragged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    pub label_id: LabelId,
    /// Pointer position minus label position at pointer-down.
    pub offset_x: f32,
    pub offset_y: f32,
}

/// Whether a raster point falls on a label's text block (plus padding).
pub fn hit_test(label: &Label, typeface: &Typeface, padding: f32, x: f32, y: f32) -> bool {
    TextBlock::layout(label, typeface).is_some_and(|block| block.contains(x, y, padding))
}

/// The topmost label under a point.
pub fn topmost_hit<'a>(
    labels: &'a [Label],
    typeface: &Typeface,
    padding: f32,
    point: Point,
) -> Option<&'a Label> {
    labels
        .iter()
        .rev()
        .find(|label| hit_test(label, typeface, padding, point.x, point.y))
}

/// Pointer state machine: at most one drag session at a time.
#[derive(Debug, Clone, Default)]
pub struct DragController {
    session: Option<DragSession>,
    cursor: Cursor,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Start dragging the topmost label under `point` and select it.
    ///
    /// Returns false when nothing was hit; selection and any running
    /// session are left alone. A hit during a running session replaces it.
    pub fn pointer_down(
        &mut self,
        store: &mut LabelStore,
        typeface: &Typeface,
        padding: f32,
        point: Point,
    ) -> bool {
        let Some(label) = topmost_hit(store.labels(), typeface, padding, point) else {
            return false;
        };
        let session = DragSession {
            label_id: label.id,
            offset_x: point.x - label.x,
            offset_y: point.y - label.y,
        };
        store.select(session.label_id);
        self.session = Some(session);
        true
    }

    /// Move the dragged label, or update the hover cursor when idle.
    ///
    /// Returns true when a label moved.
    pub fn pointer_move(
        &mut self,
        store: &mut LabelStore,
        typeface: &Typeface,
        padding: f32,
        point: Point,
        kind: PointerKind,
    ) -> bool {
        match self.session {
            Some(session) => {
                let patch = LabelPatch::default()
                    .position(point.x - session.offset_x, point.y - session.offset_y);
                store.update(session.label_id, &patch)
            }
            None => {
                if kind == PointerKind::Mouse {
                    let over = topmost_hit(store.labels(), typeface, padding, point).is_some();
                    self.cursor = if over { Cursor::Grab } else { Cursor::Default };
                }
                false
            }
        }
    }

    /// End the drag (pointer up, touch end or pointer leaving the canvas).
    pub fn pointer_up(&mut self) {
        self.session = None;
        self.cursor = Cursor::Default;
    }
}
