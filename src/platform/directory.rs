//! On-disk target platform.
//!
//! Layout under the root directory:
//!
//! ```text
//! users.toml                      [[users]] id = "1", email = "..."
//! images/raw/{id}/{filename}      original bytes
//! images/meta/{id}.json           content type and filename
//! posts/{id}.json                 the imported post
//! ```
//!
//! Nothing is written until the first record is created, so opening a
//! target for a dry run leaves it untouched.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use super::{ImportedPost, MediaStore, PlatformError, PostStore, UserDirectory, UserRef};

const USERS_FILENAME: &str = "users.toml";

#[derive(Debug, Default, Deserialize)]
struct UsersFile {
    #[serde(default)]
    users: Vec<UserRef>,
}

#[derive(Serialize)]
struct ImageMeta<'a> {
    filename: &'a str,
    content_type: &'a str,
}

#[derive(Serialize)]
struct StoredPost<'a> {
    id: &'a str,
    #[serde(flatten)]
    post: &'a ImportedPost,
}

#[derive(Debug)]
pub struct DirectoryPlatform {
    root: PathBuf,
    users: Vec<UserRef>,
    next_image_id: u64,
    next_post_id: u64,
}

impl DirectoryPlatform {
    /// Open a target directory, loading its users and continuing its id sequences
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, PlatformError> {
        let root = root.into();
        let users = load_users(&root.join(USERS_FILENAME))?;
        if users.is_empty() {
            log::warn!(
                "No users defined in {}",
                root.join(USERS_FILENAME).display()
            );
        }
        let next_image_id = highest_id(&root.join("images").join("raw"))? + 1;
        let next_post_id = highest_id(&root.join("posts"))? + 1;
        Ok(Self {
            root,
            users,
            next_image_id,
            next_post_id,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> PlatformError + '_ {
    move |source| PlatformError::Io {
        source,
        path: path.to_path_buf(),
    }
}

fn load_users(path: &Path) -> Result<Vec<UserRef>, PlatformError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let text = fs::read_to_string(path).map_err(io_error(path))?;
    let file: UsersFile = toml::from_str(&text).map_err(|source| PlatformError::UsersFile {
        source,
        path: path.to_path_buf(),
    })?;
    Ok(file.users)
}

/// Highest numeric id among the entries of `dir` (file stems or directory names)
fn highest_id(dir: &Path) -> Result<u64, PlatformError> {
    if !dir.exists() {
        return Ok(0);
    }
    let mut highest = 0;
    for entry in fs::read_dir(dir).map_err(io_error(dir))? {
        let entry = entry.map_err(io_error(dir))?;
        let path = entry.path();
        let id = path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(|s| s.parse::<u64>().ok());
        if let Some(id) = id {
            highest = highest.max(id);
        }
    }
    Ok(highest)
}

impl UserDirectory for DirectoryPlatform {
    fn find_by_email(&self, email: &str) -> Result<Option<UserRef>, PlatformError> {
        Ok(self
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }
}

impl MediaStore for DirectoryPlatform {
    fn create_image(
        &mut self,
        filename: &str,
        content_type: &str,
        data: &[u8],
    ) -> Result<String, PlatformError> {
        let id = self.next_image_id.to_string();
        let dir = self.root.join("images").join("raw").join(&id);
        fs::create_dir_all(&dir).map_err(io_error(&dir))?;

        let payload_path = dir.join(filename);
        fs::write(&payload_path, data).map_err(io_error(&payload_path))?;

        // Metadata lives outside the payload directory so no filename can collide with it
        let meta_dir = self.root.join("images").join("meta");
        fs::create_dir_all(&meta_dir).map_err(io_error(&meta_dir))?;
        let meta_path = meta_dir.join(format!("{}.json", id));
        let meta = serde_json::to_string_pretty(&ImageMeta {
            filename,
            content_type,
        })?;
        fs::write(&meta_path, meta).map_err(io_error(&meta_path))?;

        self.next_image_id += 1;
        Ok(id)
    }
}

impl PostStore for DirectoryPlatform {
    fn create_post(&mut self, post: &ImportedPost) -> Result<String, PlatformError> {
        let id = self.next_post_id.to_string();
        let dir = self.root.join("posts");
        fs::create_dir_all(&dir).map_err(io_error(&dir))?;

        let path = dir.join(format!("{}.json", id));
        let json = serde_json::to_string_pretty(&StoredPost { id: &id, post })?;
        fs::write(&path, json).map_err(io_error(&path))?;

        self.next_post_id += 1;
        Ok(id)
    }
}
