//! # Image Sources
//!
//! Fetching and decoding the image a meme is drawn on.
//!
//! ## Load Ordering
//!
//! Loads are asynchronous and can finish out of order (a large template
//! selected first may decode after a small upload selected second). Every
//! load is tagged with a [`LoadTicket`] from a [`LoadSequencer`]; only the
//! most recently issued ticket may be applied.
//!
//! ```text
//! issue() → #1  (drake.jpg, slow)
//! issue() → #2  (upload.png, fast)
//!           #2 completes → applied
//!           #1 completes → stale, dropped
//! ```

pub mod heic;
pub mod template;

pub use template::{Location, TEMPLATES, Template, TemplateRef, TemplateRoot};

use image::DynamicImage;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::CanvasError;

/// Identifies one load request. Later tickets compare greater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LoadTicket(u64);

/// Issues load tickets and tracks which one is current.
#[derive(Debug, Default)]
pub struct LoadSequencer {
    latest: u64,
}

impl LoadSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new load, superseding every earlier ticket.
    pub fn issue(&mut self) -> LoadTicket {
        self.latest += 1;
        LoadTicket(self.latest)
    }

    /// Whether `ticket` is the most recently issued one.
    pub fn is_current(&self, ticket: LoadTicket) -> bool {
        ticket.0 == self.latest
    }
}

/// Decode raw image bytes (JPEG, PNG, GIF, WebP, ... and HEIC with `heif`).
pub fn decode_bytes(bytes: &[u8]) -> Result<DynamicImage, CanvasError> {
    if heic::is_heic(bytes) {
        return heic::decode_heic(bytes);
    }
    image::load_from_memory(bytes)
        .map_err(|e| CanvasError::Decode(format!("Failed to decode image: {}", e)))
}

/// Decode on the blocking thread pool.
pub async fn decode_bytes_async(bytes: Vec<u8>) -> Result<DynamicImage, CanvasError> {
    tokio::task::spawn_blocking(move || decode_bytes(&bytes))
        .await
        .map_err(|e| CanvasError::Decode(format!("Decode task failed: {}", e)))?
}

/// Fetches and decodes template images.
///
/// Holds the HTTP client for remote templates and a cache of decoded
/// templates, so switching back to a template does not download it again.
#[derive(Clone)]
pub struct ImageLoader {
    root: TemplateRoot,
    http_client: reqwest::Client,
    cache: Arc<RwLock<HashMap<String, DynamicImage>>>,
}

impl ImageLoader {
    pub fn new(root: TemplateRoot) -> Result<Self, CanvasError> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("meme-canvas/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CanvasError::Fetch(format!("HTTP client error: {}", e)))?;
        Ok(Self {
            root,
            http_client,
            cache: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    pub fn root(&self) -> &TemplateRoot {
        &self.root
    }

    /// Fetch and decode a template.
    pub async fn load_template(&self, template: &TemplateRef) -> Result<DynamicImage, CanvasError> {
        let key = template.cache_key(&self.root);
        if let Some(key) = &key {
            let cache = self.cache.read().await;
            if let Some(image) = cache.get(key) {
                tracing::debug!(template = %key, "template cache hit");
                return Ok(image.clone());
            }
        }

        let bytes = self.fetch(&template.resolve(&self.root)?).await?;
        let image = decode_bytes_async(bytes).await?;

        if let Some(key) = key {
            self.cache.write().await.insert(key, image.clone());
        }
        Ok(image)
    }

    /// Read the raw bytes at a location.
    pub async fn fetch(&self, location: &Location) -> Result<Vec<u8>, CanvasError> {
        match location {
            Location::File(path) => tokio::fs::read(path).await.map_err(|e| {
                CanvasError::Fetch(format!("Failed to read {}: {}", path.display(), e))
            }),
            Location::Remote(url) => {
                let response = self
                    .http_client
                    .get(url)
                    .send()
                    .await
                    .map_err(|e| CanvasError::Fetch(format!("Failed to download {}: {}", url, e)))?;
                if !response.status().is_success() {
                    return Err(CanvasError::Fetch(format!(
                        "Failed to download {}: HTTP {}",
                        url,
                        response.status()
                    )));
                }
                let bytes = response
                    .bytes()
                    .await
                    .map_err(|e| CanvasError::Fetch(format!("Failed to read image data: {}", e)))?;
                Ok(bytes.to_vec())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb([10, 200, 30]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_sequencer_only_latest_is_current() {
        let mut seq = LoadSequencer::new();
        let first = seq.issue();
        assert!(seq.is_current(first));

        let second = seq.issue();
        assert!(second > first);
        assert!(!seq.is_current(first));
        assert!(seq.is_current(second));
    }

    #[test]
    fn test_decode_png() {
        let img = decode_bytes(&png_bytes(12, 7)).unwrap();
        assert_eq!((img.width(), img.height()), (12, 7));
    }

    #[test]
    fn test_decode_garbage_fails() {
        let err = decode_bytes(b"definitely not an image").unwrap_err();
        assert!(matches!(err, CanvasError::Decode(_)));
    }

    #[tokio::test]
    async fn test_decode_async() {
        let img = decode_bytes_async(png_bytes(5, 9)).await.unwrap();
        assert_eq!((img.width(), img.height()), (5, 9));
    }

    #[tokio::test]
    async fn test_load_template_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("drake.jpg"), png_bytes(20, 10)).unwrap();

        let loader = ImageLoader::new(TemplateRoot::Dir(dir.path().to_path_buf())).unwrap();
        let img = loader.load_template(&TemplateRef::Catalog(0)).await.unwrap();
        assert_eq!((img.width(), img.height()), (20, 10));

        // Served from cache once the file is gone
        std::fs::remove_file(dir.path().join("drake.jpg")).unwrap();
        let again = loader.load_template(&TemplateRef::Catalog(0)).await.unwrap();
        assert_eq!(again.width(), 20);
    }

    #[tokio::test]
    async fn test_load_missing_template_is_fetch_error() {
        let dir = tempfile::tempdir().unwrap();
        let loader = ImageLoader::new(TemplateRoot::Dir(dir.path().to_path_buf())).unwrap();
        let err = loader.load_template(&TemplateRef::Catalog(2)).await.unwrap_err();
        assert!(matches!(err, CanvasError::Fetch(_)));
    }
}
