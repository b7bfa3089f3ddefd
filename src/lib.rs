//! # Meme Canvas - Caption Compositor Library
//!
//! Meme Canvas draws draggable captions over an image and exports the
//! result. It provides:
//!
//! - **Labels**: an ordered caption collection with an active selection
//! - **Rendering**: black-stroked, white-filled text over a scaled backdrop
//! - **Interaction**: hit-testing and pointer/touch dragging
//! - **Sources**: template catalog, uploads and a stale-load guard
//! - **Export**: JPEG for sharing, PNG data URIs for download
//! - **Community**: the share flow and upvoted feed over pluggable backends
//!
//! ## Quick Start
//!
//! ```no_run
//! use meme_canvas::{
//!     Compositor, CompositorConfig,
//!     label::LabelPatch,
//!     source::{ImageLoader, TemplateRef, TemplateRoot},
//! };
//!
//! # async fn example() -> Result<(), meme_canvas::CanvasError> {
//! let loader = ImageLoader::new(TemplateRoot::Dir("templates".into()))?;
//! let mut canvas = Compositor::new(CompositorConfig::default())?;
//!
//! // Load "Drake" and caption it
//! canvas.load_template(&loader, &TemplateRef::parse("drake")?).await?;
//! canvas.update_active(&LabelPatch::default().text("WRITING TESTS"));
//!
//! // Export for sharing
//! if let Some(jpeg) = canvas.to_encoded_blob()? {
//!     std::fs::write("meme.jpg", jpeg)?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`compositor`] | Canvas state owner and event entry points |
//! | [`label`] | Label store, caption slots, patches |
//! | [`render`] | Surface, backdrop, text layout and drawing |
//! | [`interact`] | Hit-testing and the drag controller |
//! | [`source`] | Template catalog, fetching, decoding, load tickets |
//! | [`export`] | JPEG/PNG encoding |
//! | [`community`] | Identity, posts, blobs, share flow, feed |
//! | [`config`] | Compositor settings and composition documents |
//! | [`error`] | Error types |

pub mod community;
pub mod compositor;
pub mod config;
pub mod error;
pub mod export;
pub mod interact;
pub mod label;
pub mod render;
pub mod source;

// Re-exports for convenience
pub use compositor::{Compositor, LoadOutcome, RasterInfo};
pub use config::{Composition, CompositorConfig};
pub use error::CanvasError;
pub use export::ExportJob;
pub use label::{Align, Label, LabelId, LabelPatch, LabelStore};
