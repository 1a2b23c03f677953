//! Media download cache
//!
//! Every media URL referenced by the converted content goes through
//! [`MediaCache`]. A URL is attempted at most once per run: the outcome,
//! success or failure, is remembered and returned for every later
//! reference, and a successful download is turned into exactly one
//! [`ImageRecord`].
//!
//! Downloads land in named temporary files owned by the cache. They are
//! deleted when the cache is dropped, whether the run finished or aborted.

use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use tempfile::NamedTempFile;
use thiserror::Error;
use url::Url;

use super::report::{ImportWarning, WarningKind};
use crate::error::ImportError;
use crate::platform::{ImageRecord, MediaStore};
use crate::wxr::filename_from_url;

/// Stored name of a payload whose URL has no path segment
const FALLBACK_FILENAME: &str = "media";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("failed to write download: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Unavailable(String),
}

/// Source of media bytes
pub trait MediaFetcher {
    /// Stream the body at `url` into `sink`, returning the number of bytes written
    fn fetch(&self, url: &str, sink: &mut dyn Write) -> Result<u64, FetchError>;
}

/// [`MediaFetcher`] over blocking HTTP
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("haven-wp/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

impl MediaFetcher for HttpFetcher {
    fn fetch(&self, url: &str, sink: &mut dyn Write) -> Result<u64, FetchError> {
        let mut response = self.client.get(url).send()?.error_for_status()?;
        let written = response.copy_to(sink)?;
        sink.flush()?;
        Ok(written)
    }
}

/// A downloaded media file
#[derive(Debug)]
pub struct MediaPayload {
    file: NamedTempFile,
    /// Last path segment of the source URL
    pub filename: String,
    /// Lowercase extension with its leading dot, `""` when there is none
    pub extension: String,
}

impl MediaPayload {
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

/// Why a URL ended up in the failed state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaFailure {
    NonFetchable,
    Download(String),
}

/// Terminal state of a URL. A URL with no entry has not been attempted yet.
#[derive(Debug)]
pub enum MediaEntry {
    Downloaded(MediaPayload),
    Failed(MediaFailure),
}

/// A media record resolved for a URL, with the extension the tag builder needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedMedia {
    pub record: ImageRecord,
    pub extension: String,
}

pub struct MediaCache {
    fetcher: Box<dyn MediaFetcher>,
    entries: HashMap<String, MediaEntry>,
    records: HashMap<String, CachedMedia>,
    /// URLs in the order their first attempt happened
    order: Vec<String>,
    attempts: usize,
}

impl MediaCache {
    pub fn new(fetcher: Box<dyn MediaFetcher>) -> Self {
        Self {
            fetcher,
            entries: HashMap::new(),
            records: HashMap::new(),
            order: Vec::new(),
            attempts: 0,
        }
    }

    /// Return the payload for `url`, downloading it on first reference
    pub fn fetch(&mut self, url: &str) -> Option<&MediaPayload> {
        if !self.entries.contains_key(url) {
            let entry = self.attempt(url);
            self.entries.insert(url.to_string(), entry);
            self.order.push(url.to_string());
        }
        match self.entries.get(url) {
            Some(MediaEntry::Downloaded(payload)) => Some(payload),
            _ => None,
        }
    }

    fn attempt(&mut self, url: &str) -> MediaEntry {
        let fetchable = Url::parse(url)
            .map(|u| matches!(u.scheme(), "http" | "https"))
            .unwrap_or(false);
        if !fetchable {
            log::warn!("Skipping non-HTTP URL: {}", url);
            return MediaEntry::Failed(MediaFailure::NonFetchable);
        }

        let mut filename = filename_from_url(url);
        if filename.is_empty() {
            filename = FALLBACK_FILENAME.to_string();
        }
        let extension = extension_of(&filename);
        log::info!("Downloading: {}", filename);

        let mut file = match tempfile::Builder::new()
            .prefix("wp_import")
            .suffix(&extension)
            .tempfile()
        {
            Ok(file) => file,
            Err(e) => {
                log::warn!("Failed to download {}: {}", url, e);
                return MediaEntry::Failed(MediaFailure::Download(e.to_string()));
            }
        };

        self.attempts += 1;
        match self.fetcher.fetch(url, file.as_file_mut()) {
            Ok(bytes) => {
                log::debug!("Downloaded {} bytes from {}", bytes, url);
                MediaEntry::Downloaded(MediaPayload {
                    file,
                    filename,
                    extension,
                })
            }
            Err(e) => {
                log::warn!("Failed to download {}: {}", url, e);
                // dropping the partial file deletes it
                drop(file);
                MediaEntry::Failed(MediaFailure::Download(e.to_string()))
            }
        }
    }

    /// Resolve `url` to its media record, creating the record on first reference.
    ///
    /// Returns `Ok(None)` when the URL could not be downloaded. Errors from the
    /// media store are fatal and propagate.
    pub fn record_for(
        &mut self,
        url: &str,
        store: &mut dyn MediaStore,
    ) -> Result<Option<CachedMedia>, ImportError> {
        if let Some(found) = self.records.get(url) {
            return Ok(Some(found.clone()));
        }
        let Some(payload) = self.fetch(url) else {
            return Ok(None);
        };
        let extension = payload.extension.clone();
        let Some(record) = create_image_record(Some(payload), store)? else {
            return Ok(None);
        };
        let media = CachedMedia { record, extension };
        self.records.insert(url.to_string(), media.clone());
        Ok(Some(media))
    }

    pub fn entry(&self, url: &str) -> Option<&MediaEntry> {
        self.entries.get(url)
    }

    /// Number of distinct URLs in the downloaded state
    pub fn downloaded_count(&self) -> usize {
        self.entries
            .values()
            .filter(|e| matches!(e, MediaEntry::Downloaded(_)))
            .count()
    }

    /// Number of network fetches issued so far
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    /// Failed URLs as report warnings, in the order they were first referenced
    pub fn warnings(&self) -> Vec<ImportWarning> {
        self.order
            .iter()
            .filter_map(|url| match self.entries.get(url) {
                Some(MediaEntry::Failed(MediaFailure::NonFetchable)) => Some(ImportWarning {
                    kind: WarningKind::NonFetchableUrl,
                    subject: url.clone(),
                    message: "skipped non-HTTP URL".to_string(),
                }),
                Some(MediaEntry::Failed(MediaFailure::Download(reason))) => Some(ImportWarning {
                    kind: WarningKind::MediaDownload,
                    subject: url.clone(),
                    message: format!("download failed: {}", reason),
                }),
                _ => None,
            })
            .collect()
    }
}

/// Lowercase extension of `filename` with its leading dot
pub fn extension_of(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

/// MIME type for a media extension (with leading dot)
pub fn content_type_for(extension: &str) -> &'static str {
    match extension {
        ".jpg" | ".jpeg" => "image/jpeg",
        ".png" => "image/png",
        ".gif" => "image/gif",
        ".webp" => "image/webp",
        ".m4a" => "audio/mp4",
        ".mp3" => "audio/mpeg",
        ".mp4" => "video/mp4",
        ".mov" => "video/quicktime",
        _ => "application/octet-stream",
    }
}

/// Persist a downloaded payload as a media record.
///
/// Callers must invoke this once per distinct URL; [`MediaCache::record_for`] does.
pub fn create_image_record(
    payload: Option<&MediaPayload>,
    store: &mut dyn MediaStore,
) -> Result<Option<ImageRecord>, ImportError> {
    let Some(payload) = payload else {
        return Ok(None);
    };
    let content_type = content_type_for(&payload.extension);
    let data = std::fs::read(payload.path()).map_err(|source| ImportError::MediaRead {
        source,
        path: payload.path().to_path_buf(),
    })?;
    let identifier = store.create_image(&payload.filename, content_type, &data)?;
    log::debug!("Created media record {} for {}", identifier, payload.filename);
    Ok(Some(ImageRecord {
        identifier,
        filename: payload.filename.clone(),
        content_type: content_type.to_string(),
    }))
}
