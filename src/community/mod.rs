//! # Community
//!
//! Sharing finished memes and the public feed.
//!
//! The backends themselves (accounts, post database, file hosting) live
//! outside this crate and are reached through three async traits:
//!
//! | Trait | Responsibility |
//! |-------|----------------|
//! | [`IdentityProvider`] | Magic-code sign-in and the current user |
//! | [`PostStore`] | Post records and upvotes |
//! | [`BlobStorage`] | Uploaded image files |
//!
//! [`MemoryBackend`] implements all three in process; [`DirectoryStorage`]
//! keeps blobs in a local directory.
//!
//! ## Share Flow
//!
//! ```text
//! title ──trim──► signed in? ──► export() ──► upload memes/<ms>-<uuid>.jpg
//!                                                  │
//!                        create post ◄── download URL (or the path)
//! ```
//!
//! Nothing is uploaded unless the title, user and export are all present,
//! and a failed upload never creates a post.

mod memory;
mod storage;

pub use memory::MemoryBackend;
pub use storage::DirectoryStorage;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

use crate::error::CanvasError;
use crate::export::JPEG_MIME;

/// Opaque failure reported by a remote collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct RemoteError(pub String);

impl RemoteError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Errors from sharing and voting.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("You must be signed in to share")]
    NotSignedIn,

    #[error("A title is required")]
    EmptyTitle,

    #[error("No image to share. Select a template or upload an image first.")]
    NothingToExport,

    #[error("Export failed: {0}")]
    Export(#[from] CanvasError),

    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),
}

/// A post as submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    pub title: String,
    pub image_url: String,
    /// Milliseconds since the Unix epoch
    pub created_at: i64,
    pub author_id: String,
}

/// A stored post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub title: String,
    pub image_url: String,
    pub created_at: i64,
    pub author_id: String,
}

/// One user's upvote on one post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub id: String,
    pub post_id: String,
    pub user_id: String,
}

/// A post with its tally, as seen by the current user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedEntry {
    pub post: Post,
    pub upvote_count: usize,
    pub has_upvoted: bool,
}

/// Account state and magic-code sign-in.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The signed-in user, if any.
    async fn current_user_id(&self) -> Option<String>;

    /// Email a one-time sign-in code.
    async fn send_magic_code(&self, email: &str) -> Result<(), RemoteError>;

    /// Exchange a code for a session. Returns the user id.
    async fn sign_in(&self, email: &str, code: &str) -> Result<String, RemoteError>;

    async fn sign_out(&self) -> Result<(), RemoteError>;
}

/// Post and vote records.
#[async_trait]
pub trait PostStore: Send + Sync {
    async fn create_post(&self, post: NewPost) -> Result<Post, RemoteError>;

    /// All posts, newest first.
    async fn list_posts(&self) -> Result<Vec<Post>, RemoteError>;

    async fn add_vote(&self, post_id: &str, user_id: &str) -> Result<Vote, RemoteError>;

    async fn remove_vote(&self, vote_id: &str) -> Result<(), RemoteError>;

    async fn list_votes(&self) -> Result<Vec<Vote>, RemoteError>;
}

/// File hosting for exported images.
#[async_trait]
pub trait BlobStorage: Send + Sync {
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), RemoteError>;

    /// Public URL of an uploaded file.
    async fn download_url(&self, path: &str) -> Result<String, RemoteError>;
}

/// Storage path for a new shared image.
pub fn upload_path(created_at_ms: i64) -> String {
    format!("memes/{}-{}.jpg", created_at_ms, uuid::Uuid::new_v4().simple())
}

/// Runs the share flow against the three collaborators.
#[derive(Clone)]
pub struct Publisher {
    identity: Arc<dyn IdentityProvider>,
    posts: Arc<dyn PostStore>,
    blobs: Arc<dyn BlobStorage>,
}

impl Publisher {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        posts: Arc<dyn PostStore>,
        blobs: Arc<dyn BlobStorage>,
    ) -> Self {
        Self {
            identity,
            posts,
            blobs,
        }
    }

    /// Publish the current canvas under `title`.
    ///
    /// `export` produces the JPEG to share, or `None` when the canvas has no
    /// image. It only runs once the title and sign-in checks pass.
    pub async fn publish<F, Fut>(&self, title: &str, export: F) -> Result<Post, PublishError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<Vec<u8>>, CanvasError>>,
    {
        let title = title.trim();
        if title.is_empty() {
            return Err(PublishError::EmptyTitle);
        }
        let author_id = self
            .identity
            .current_user_id()
            .await
            .ok_or(PublishError::NotSignedIn)?;
        let bytes = export().await?.ok_or(PublishError::NothingToExport)?;

        let created_at = chrono::Utc::now().timestamp_millis();
        let path = upload_path(created_at);
        self.blobs.upload(&path, bytes, JPEG_MIME).await?;

        let image_url = match self.blobs.download_url(&path).await {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(%path, error = %e, "no download URL, storing path");
                path.clone()
            }
        };

        let post = self
            .posts
            .create_post(NewPost {
                title: title.to_string(),
                image_url,
                created_at,
                author_id,
            })
            .await?;
        tracing::info!(post_id = %post.id, %path, "meme published");
        Ok(post)
    }
}

/// Read side of the community: the feed and upvotes.
#[derive(Clone)]
pub struct Community {
    identity: Arc<dyn IdentityProvider>,
    posts: Arc<dyn PostStore>,
}

impl Community {
    pub fn new(identity: Arc<dyn IdentityProvider>, posts: Arc<dyn PostStore>) -> Self {
        Self { identity, posts }
    }

    /// Every post, newest first, with upvote tallies for the current user.
    pub async fn feed(&self) -> Result<Vec<FeedEntry>, RemoteError> {
        let user = self.identity.current_user_id().await;
        let posts = self.posts.list_posts().await?;
        let votes = self.posts.list_votes().await?;
        Ok(tally(posts, &votes, user.as_deref()))
    }

    /// Add the current user's upvote, or remove it if already present.
    ///
    /// Returns whether the post is upvoted afterwards.
    pub async fn toggle_upvote(&self, post_id: &str) -> Result<bool, PublishError> {
        let user_id = self
            .identity
            .current_user_id()
            .await
            .ok_or(PublishError::NotSignedIn)?;

        let votes = self.posts.list_votes().await?;
        let existing = votes
            .iter()
            .find(|v| v.post_id == post_id && v.user_id == user_id);

        match existing {
            Some(vote) => {
                self.posts.remove_vote(&vote.id).await?;
                tracing::debug!(%post_id, %user_id, "upvote removed");
                Ok(false)
            }
            None => {
                self.posts.add_vote(post_id, &user_id).await?;
                tracing::debug!(%post_id, %user_id, "upvote added");
                Ok(true)
            }
        }
    }
}

/// Join posts with votes. Votes on unknown posts are ignored.
pub fn tally(posts: Vec<Post>, votes: &[Vote], user_id: Option<&str>) -> Vec<FeedEntry> {
    posts
        .into_iter()
        .map(|post| {
            let mut upvote_count = 0;
            let mut has_upvoted = false;
            for vote in votes.iter().filter(|v| v.post_id == post.id) {
                upvote_count += 1;
                has_upvoted |= Some(vote.user_id.as_str()) == user_id;
            }
            FeedEntry {
                post,
                upvote_count,
                has_upvoted,
            }
        })
        .collect()
}
