use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

use super::{BlobStorage, IdentityProvider, NewPost, Post, PostStore, RemoteError, Vote};

#[derive(Debug, Default)]
struct State {
    current_user: Option<String>,
    /// email -> pending sign-in code
    codes: HashMap<String, String>,
    /// email -> user id, stable across sign-ins
    users: HashMap<String, String>,
    posts: Vec<Post>,
    votes: Vec<Vote>,
    blobs: HashMap<String, (Vec<u8>, String)>,
    fail_uploads: bool,
}

/// In-process identity, post store and blob storage.
///
/// Blob URLs use a `memory://` scheme. Sign-in codes are not delivered
/// anywhere; read them back with [`pending_code`](Self::pending_code).
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: Mutex<State>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend with `user_id` already signed in.
    pub fn signed_in(user_id: impl Into<String>) -> Self {
        Self {
            state: Mutex::new(State {
                current_user: Some(user_id.into()),
                ..State::default()
            }),
        }
    }

    /// The code last sent to `email`.
    pub async fn pending_code(&self, email: &str) -> Option<String> {
        self.state.lock().await.codes.get(email).cloned()
    }

    pub async fn blob_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.state.lock().await.blobs.keys().cloned().collect();
        paths.sort();
        paths
    }

    pub async fn blob(&self, path: &str) -> Option<Vec<u8>> {
        self.state.lock().await.blobs.get(path).map(|(bytes, _)| bytes.clone())
    }

    pub async fn blob_content_type(&self, path: &str) -> Option<String> {
        self.state.lock().await.blobs.get(path).map(|(_, ct)| ct.clone())
    }

    /// Make every following upload fail.
    pub async fn fail_uploads(&self, fail: bool) {
        self.state.lock().await.fail_uploads = fail;
    }
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[async_trait]
impl IdentityProvider for MemoryBackend {
    async fn current_user_id(&self) -> Option<String> {
        self.state.lock().await.current_user.clone()
    }

    async fn send_magic_code(&self, email: &str) -> Result<(), RemoteError> {
        let email = email.trim();
        if !email.contains('@') {
            return Err(RemoteError::new(format!("Invalid email address: {}", email)));
        }
        let code = format!("{:06}", uuid::Uuid::new_v4().as_u128() % 1_000_000);
        self.state.lock().await.codes.insert(email.to_string(), code);
        Ok(())
    }

    async fn sign_in(&self, email: &str, code: &str) -> Result<String, RemoteError> {
        let email = email.trim();
        let mut state = self.state.lock().await;
        if state.codes.get(email).map(String::as_str) != Some(code.trim()) {
            return Err(RemoteError::new("Invalid or expired code"));
        }
        state.codes.remove(email);
        let user_id = state
            .users
            .entry(email.to_string())
            .or_insert_with(new_id)
            .clone();
        state.current_user = Some(user_id.clone());
        Ok(user_id)
    }

    async fn sign_out(&self) -> Result<(), RemoteError> {
        self.state.lock().await.current_user = None;
        Ok(())
    }
}

#[async_trait]
impl PostStore for MemoryBackend {
    async fn create_post(&self, post: NewPost) -> Result<Post, RemoteError> {
        let post = Post {
            id: new_id(),
            title: post.title,
            image_url: post.image_url,
            created_at: post.created_at,
            author_id: post.author_id,
        };
        self.state.lock().await.posts.push(post.clone());
        Ok(post)
    }

    async fn list_posts(&self) -> Result<Vec<Post>, RemoteError> {
        let mut posts = self.state.lock().await.posts.clone();
        // Same-millisecond posts list the later insert first
        posts.reverse();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(posts)
    }

    async fn add_vote(&self, post_id: &str, user_id: &str) -> Result<Vote, RemoteError> {
        let vote = Vote {
            id: new_id(),
            post_id: post_id.to_string(),
            user_id: user_id.to_string(),
        };
        self.state.lock().await.votes.push(vote.clone());
        Ok(vote)
    }

    async fn remove_vote(&self, vote_id: &str) -> Result<(), RemoteError> {
        self.state.lock().await.votes.retain(|v| v.id != vote_id);
        Ok(())
    }

    async fn list_votes(&self) -> Result<Vec<Vote>, RemoteError> {
        Ok(self.state.lock().await.votes.clone())
    }
}

#[async_trait]
impl BlobStorage for MemoryBackend {
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), RemoteError> {
        let mut state = self.state.lock().await;
        if state.fail_uploads {
            return Err(RemoteError::new(format!("Upload of {} rejected", path)));
        }
        state
            .blobs
            .insert(path.to_string(), (bytes, content_type.to_string()));
        Ok(())
    }

    async fn download_url(&self, path: &str) -> Result<String, RemoteError> {
        if self.state.lock().await.blobs.contains_key(path) {
            Ok(format!("memory://{}", path))
        } else {
            Err(RemoteError::new(format!("No such file: {}", path)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_magic_code_sign_in() {
        let backend = MemoryBackend::new();
        assert_eq!(backend.current_user_id().await, None);

        backend.send_magic_code("a@example.com").await.unwrap();
        let code = backend.pending_code("a@example.com").await.unwrap();
        assert_eq!(code.len(), 6);

        assert!(backend.sign_in("a@example.com", "nope").await.is_err());
        let user = backend.sign_in("a@example.com", &code).await.unwrap();
        assert_eq!(backend.current_user_id().await, Some(user.clone()));

        // Codes are single-use
        assert!(backend.sign_in("a@example.com", &code).await.is_err());

        backend.sign_out().await.unwrap();
        assert_eq!(backend.current_user_id().await, None);

        backend.send_magic_code("a@example.com").await.unwrap();
        let code = backend.pending_code("a@example.com").await.unwrap();
        assert_eq!(backend.sign_in("a@example.com", &code).await.unwrap(), user);
    }

    #[tokio::test]
    async fn test_send_code_rejects_bad_email() {
        let backend = MemoryBackend::new();
        assert!(backend.send_magic_code("not-an-email").await.is_err());
    }

    #[tokio::test]
    async fn test_posts_newest_first() {
        let backend = MemoryBackend::new();
        for (title, created_at) in [("old", 1), ("new", 3), ("mid", 2)] {
            backend
                .create_post(NewPost {
                    title: title.to_string(),
                    image_url: String::new(),
                    created_at,
                    author_id: "u".to_string(),
                })
                .await
                .unwrap();
        }
        let titles: Vec<String> = backend
            .list_posts()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.title)
            .collect();
        assert_eq!(titles, vec!["new", "mid", "old"]);
    }

    #[tokio::test]
    async fn test_blob_url_requires_upload() {
        let backend = MemoryBackend::new();
        assert!(backend.download_url("memes/x.jpg").await.is_err());
        backend
            .upload("memes/x.jpg", vec![1, 2, 3], "image/jpeg")
            .await
            .unwrap();
        assert_eq!(
            backend.download_url("memes/x.jpg").await.unwrap(),
            "memory://memes/x.jpg"
        );
        assert_eq!(backend.blob("memes/x.jpg").await, Some(vec![1, 2, 3]));
    }
}
