//! Target platform collaborators.
//!
//! The importer never talks to Haven's storage directly. It looks users up,
//! creates media records and creates posts through the three traits below,
//! so the same pipeline runs against an on-disk target ([`DirectoryPlatform`])
//! or an in-memory one ([`MemoryPlatform`]).

mod directory;
mod memory;

pub use directory::DirectoryPlatform;
pub use memory::{MemoryPlatform, StoredImage};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// A user account on the target platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: String,
    pub email: String,
}

/// A media record created from a downloaded payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub identifier: String,
    pub filename: String,
    pub content_type: String,
}

impl ImageRecord {
    /// Path under which the platform serves the original bytes
    pub fn raw_path(&self) -> String {
        format!("/images/raw/{}/{}", self.identifier, self.filename)
    }
}

/// A post as handed to the platform for creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportedPost {
    /// Markdown with inline media tags
    pub content: String,
    pub datetime: DateTime<Utc>,
    pub author: UserRef,
}

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("I/O error at {path:?}: {source}")]
    Io {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("failed to parse users file at {path:?}: {source}")]
    UsersFile {
        #[source]
        source: toml::de::Error,
        path: PathBuf,
    },
    #[error("failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("platform rejected the record: {0}")]
    Rejected(String),
}

pub trait UserDirectory {
    fn find_by_email(&self, email: &str) -> Result<Option<UserRef>, PlatformError>;
}

pub trait MediaStore {
    /// Persist a binary payload and return the new record identifier
    fn create_image(
        &mut self,
        filename: &str,
        content_type: &str,
        data: &[u8],
    ) -> Result<String, PlatformError>;
}

pub trait PostStore {
    /// Persist a post and return the new record identifier
    fn create_post(&mut self, post: &ImportedPost) -> Result<String, PlatformError>;
}
