//! In-memory target platform

use super::{ImportedPost, MediaStore, PlatformError, PostStore, UserDirectory, UserRef};

/// An image held by [`MemoryPlatform`]
#[derive(Debug, Clone)]
pub struct StoredImage {
    pub id: String,
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// In-memory target platform.
///
/// Records everything it is asked to create, in creation order.
#[derive(Debug, Default)]
pub struct MemoryPlatform {
    users: Vec<UserRef>,
    pub images: Vec<StoredImage>,
    pub posts: Vec<(String, ImportedPost)>,
    next_id: u64,
}

impl MemoryPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user that [`UserDirectory::find_by_email`] can return
    pub fn with_user(mut self, id: &str, email: &str) -> Self {
        self.users.push(UserRef {
            id: id.to_string(),
            email: email.to_string(),
        });
        self
    }

    fn allocate_id(&mut self) -> String {
        self.next_id += 1;
        self.next_id.to_string()
    }
}

impl UserDirectory for MemoryPlatform {
    fn find_by_email(&self, email: &str) -> Result<Option<UserRef>, PlatformError> {
        Ok(self
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }
}

impl MediaStore for MemoryPlatform {
    fn create_image(
        &mut self,
        filename: &str,
        content_type: &str,
        data: &[u8],
    ) -> Result<String, PlatformError> {
        let id = self.allocate_id();
        self.images.push(StoredImage {
            id: id.clone(),
            filename: filename.to_string(),
            content_type: content_type.to_string(),
            data: data.to_vec(),
        });
        Ok(id)
    }
}

impl PostStore for MemoryPlatform {
    fn create_post(&mut self, post: &ImportedPost) -> Result<String, PlatformError> {
        let id = self.allocate_id();
        self.posts.push((id.clone(), post.clone()));
        Ok(id)
    }
}
