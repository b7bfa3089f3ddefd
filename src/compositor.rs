//! # Canvas Compositor
//!
//! Owns every piece of canvas state: the image, the label store, the raster
//! surface and the drag controller. All changes go through `&mut Compositor`,
//! and event handlers read this state directly.
//!
//! ## Event Flow
//!
//! ```text
//! load completes ─┐
//! label edit ─────┼──► state changes ──► dirty ──► render() redraws
//! pointer drag ───┘
//!                                      export reads the rendered surface
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use meme_canvas::{Compositor, CompositorConfig};
//! use meme_canvas::label::LabelPatch;
//!
//! # async fn example(bytes: Vec<u8>) -> Result<(), meme_canvas::CanvasError> {
//! let mut canvas = Compositor::new(CompositorConfig::default())?;
//! canvas.load_from_bytes(bytes).await?;
//! canvas.update_active(&LabelPatch::default().text("ONE DOES NOT SIMPLY"));
//! let jpeg = canvas.to_encoded_blob()?;
//! # Ok(())
//! # }
//! ```

use image::DynamicImage;

use crate::config::{CompositorConfig, LabelSpec};
use crate::error::CanvasError;
use crate::export::ExportJob;
use crate::interact::{Cursor, DragController, DragSession, Point, PointerKind, Viewport};
use crate::label::{Label, LabelId, LabelPatch, LabelStore, NEW_LABEL_TEXT};
use crate::render::{self, Backdrop, Surface, Typeface};
use crate::source::{self, ImageLoader, LoadSequencer, LoadTicket, TemplateRef};

/// Dimensions of an applied image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterInfo {
    /// Surface width after display scaling
    pub width: u32,
    /// Surface height after display scaling
    pub height: u32,
    pub source_width: u32,
    pub source_height: u32,
}

/// Result of completing a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The image replaced the previous one.
    Applied(RasterInfo),
    /// A newer load was started meanwhile; nothing changed.
    Stale,
}

/// The canvas compositor.
pub struct Compositor {
    config: CompositorConfig,
    typeface: Typeface,
    labels: LabelStore,
    backdrop: Option<Backdrop>,
    surface: Surface,
    drag: DragController,
    loads: LoadSequencer,
    dirty: bool,
}

impl Compositor {
    /// Create a compositor with the default captions on an empty canvas.
    pub fn new(config: CompositorConfig) -> Result<Self, CanvasError> {
        let surface = Surface::new(config.initial_width, config.initial_height)?;
        Ok(Self {
            labels: LabelStore::seeded(&config),
            typeface: Typeface::embedded(),
            backdrop: None,
            surface,
            drag: DragController::new(),
            loads: LoadSequencer::new(),
            dirty: true,
            config,
        })
    }

    /// Use a different font for labels.
    pub fn with_typeface(mut self, typeface: Typeface) -> Self {
        self.typeface = typeface;
        self.dirty = true;
        self
    }

    pub fn config(&self) -> &CompositorConfig {
        &self.config
    }

    pub fn typeface(&self) -> &Typeface {
        &self.typeface
    }

    pub fn labels(&self) -> &LabelStore {
        &self.labels
    }

    /// Current surface size.
    pub fn size(&self) -> (u32, u32) {
        (self.surface.width(), self.surface.height())
    }

    pub fn has_image(&self) -> bool {
        self.backdrop.is_some()
    }

    pub fn cursor(&self) -> Cursor {
        self.drag.cursor()
    }

    pub fn drag_session(&self) -> Option<&DragSession> {
        self.drag.session()
    }

    // ------------------------------------------------------------------
    // Labels
    // ------------------------------------------------------------------

    /// Add a label at a relative position and make it active.
    pub fn add_label(&mut self, text: &str, rel_x: f32, rel_y: f32) -> Label {
        let label = self.labels.add(text, rel_x, rel_y);
        self.labels.select(label.id);
        self.dirty = true;
        label
    }

    /// Add a centered "NEW TEXT" label and make it active.
    pub fn add_default_label(&mut self) -> Label {
        self.add_label(NEW_LABEL_TEXT, 0.5, 0.5)
    }

    pub fn update_label(&mut self, id: LabelId, patch: &LabelPatch) -> bool {
        let changed = self.labels.update(id, patch);
        self.dirty |= changed;
        changed
    }

    pub fn update_active(&mut self, patch: &LabelPatch) -> bool {
        let changed = self.labels.update_active(patch);
        self.dirty |= changed;
        changed
    }

    pub fn delete_label(&mut self, id: LabelId) -> bool {
        let changed = self.labels.delete(id);
        self.dirty |= changed;
        changed
    }

    pub fn delete_active(&mut self) -> bool {
        let changed = self.labels.delete_active();
        self.dirty |= changed;
        changed
    }

    pub fn select(&mut self, id: LabelId) -> bool {
        self.labels.select(id)
    }

    /// Move every label back into its caption slot.
    pub fn reset_layout(&mut self) {
        self.labels.reset_positions();
        self.dirty = true;
    }

    /// Replace label texts and styles from a list of specs.
    ///
    /// Spec `i` edits label `i`, adding labels as needed; surplus labels are
    /// deleted (down to the one-label floor). Specs with explicit `x`/`y`
    /// are placed relative to the current surface, the rest keep their slot.
    pub fn apply_label_specs(&mut self, specs: &[LabelSpec]) {
        if specs.is_empty() {
            return;
        }
        let (width, height) = self.size();

        for (index, spec) in specs.iter().enumerate() {
            let id = match self.labels.labels().get(index) {
                Some(label) => label.id,
                None => {
                    let (rx, ry) = crate::label::slot_for(index);
                    self.labels.add(&spec.text, rx, ry).id
                }
            };

            let mut patch = LabelPatch::default().text(spec.text.clone());
            if let Some(size) = spec.font_size {
                patch = patch.font_size(size);
            }
            if let Some(align) = spec.align {
                patch = patch.align(align);
            }
            let current = self.labels.get(id).map(|l| (l.x, l.y)).unwrap_or_default();
            let x = spec.x.map(|rx| rx * width as f32).unwrap_or(current.0);
            let y = spec.y.map(|ry| ry * height as f32).unwrap_or(current.1);
            patch = patch.position(x, y);
            self.labels.update(id, &patch);
        }

        let surplus: Vec<LabelId> = self.labels.iter().skip(specs.len()).map(|l| l.id).collect();
        for id in surplus {
            self.labels.delete(id);
        }
        if let Some(first) = self.labels.labels().first().map(|l| l.id) {
            self.labels.select(first);
        }
        self.dirty = true;
    }

    // ------------------------------------------------------------------
    // Image loading
    // ------------------------------------------------------------------

    /// Start a load. Any load started earlier becomes stale.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.loads.issue()
    }

    /// Finish a load started with [`begin_load`](Self::begin_load).
    ///
    /// Stale tickets are dropped without touching state, whatever their
    /// result. A decode error for the current ticket is returned and the
    /// previous image stays on screen.
    pub fn complete_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<DynamicImage, CanvasError>,
    ) -> Result<LoadOutcome, CanvasError> {
        if !self.loads.is_current(ticket) {
            tracing::debug!(?ticket, "discarding stale image load");
            return Ok(LoadOutcome::Stale);
        }

        let image = result.inspect_err(|e| tracing::warn!(error = %e, "image load failed"))?;
        let (source_width, source_height) = (image.width(), image.height());
        let (width, height) = self.config.display_size(source_width, source_height);

        // Build everything before committing so a failure leaves no trace
        let backdrop = Backdrop::from_image(&image, width, height)?;
        let surface = Surface::new(width, height)?;

        self.backdrop = Some(backdrop);
        self.surface = surface;
        self.labels.relayout(width, height);
        self.dirty = true;

        tracing::info!(
            source_width,
            source_height,
            width,
            height,
            "image applied"
        );
        Ok(LoadOutcome::Applied(RasterInfo {
            width,
            height,
            source_width,
            source_height,
        }))
    }

    /// Fetch, decode and apply a template.
    pub async fn load_template(
        &mut self,
        loader: &ImageLoader,
        template: &TemplateRef,
    ) -> Result<LoadOutcome, CanvasError> {
        let ticket = self.begin_load();
        let result = loader.load_template(template).await;
        self.complete_load(ticket, result)
    }

    /// Decode and apply an uploaded image.
    pub async fn load_from_bytes(&mut self, bytes: Vec<u8>) -> Result<LoadOutcome, CanvasError> {
        let ticket = self.begin_load();
        let result = source::decode_bytes_async(bytes).await;
        self.complete_load(ticket, result)
    }

    // ------------------------------------------------------------------
    // Pointer input
    // ------------------------------------------------------------------

    fn to_raster(&self, client: Point, viewport: &Viewport) -> Option<Point> {
        viewport.to_raster(client, self.surface.width(), self.surface.height())
    }

    /// Pointer or touch down. Returns true when a drag started.
    pub fn pointer_down(&mut self, client: Point, viewport: &Viewport) -> bool {
        let Some(point) = self.to_raster(client, viewport) else {
            return false;
        };
        self.drag
            .pointer_down(&mut self.labels, &self.typeface, self.config.hit_padding, point)
    }

    /// Pointer or touch move. Returns true when a label moved.
    pub fn pointer_move(&mut self, client: Point, viewport: &Viewport, kind: PointerKind) -> bool {
        let Some(point) = self.to_raster(client, viewport) else {
            return false;
        };
        let moved = self.drag.pointer_move(
            &mut self.labels,
            &self.typeface,
            self.config.hit_padding,
            point,
            kind,
        );
        self.dirty |= moved;
        moved
    }

    /// Pointer up, touch end or pointer leaving the canvas.
    pub fn pointer_up(&mut self) {
        self.drag.pointer_up();
    }

    // ------------------------------------------------------------------
    // Rendering and export
    // ------------------------------------------------------------------

    /// The current frame, redrawn first if anything changed.
    pub fn render(&mut self) -> &Surface {
        if self.dirty {
            render::draw_frame(
                &mut self.surface,
                self.backdrop.as_ref(),
                self.labels.labels(),
                &self.typeface,
            );
            self.dirty = false;
        }
        &self.surface
    }

    /// Snapshot the current frame for encoding. `None` without an image.
    pub fn export_job(&mut self) -> Option<ExportJob> {
        if !self.has_image() {
            return None;
        }
        let quality = self.config.jpeg_quality;
        Some(ExportJob::from_surface(self.render(), quality))
    }

    /// JPEG for sharing. `Ok(None)` when there is no image to export.
    pub fn to_encoded_blob(&mut self) -> Result<Option<Vec<u8>>, CanvasError> {
        self.export_job().map(|job| job.encode_jpeg()).transpose()
    }

    /// PNG bytes for saving. `Ok(None)` when there is no image to export.
    pub fn to_png(&mut self) -> Result<Option<Vec<u8>>, CanvasError> {
        self.export_job().map(|job| job.encode_png()).transpose()
    }

    /// PNG `data:` URI for download. `Ok(None)` when there is no image.
    pub fn to_downloadable_data_uri(&mut self) -> Result<Option<String>, CanvasError> {
        self.export_job().map(|job| job.to_data_uri()).transpose()
    }
}
