//! WordPress eXtended RSS (WXR) export reader
//!
//! Reads the `<item>` entries of an export with `quick-xml` and keeps the
//! two kinds the importer cares about: posts and attachments. Pages, menu
//! items and every other post type are ignored.

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

use crate::error::ImportError;

#[derive(Debug, Error)]
pub enum WxrError {
    #[error("XML error at byte {position}: {message}")]
    Xml { position: u64, message: String },
    #[error("unexpected end of document inside <item>")]
    UnterminatedItem,
}

/// Publication status of a post
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostStatus {
    Published,
    Private,
    Draft,
    /// Any other status (pending, future, trash, ...) or a missing one
    Unknown(String),
}

impl PostStatus {
    fn from_wp(value: Option<&str>) -> Self {
        match value {
            Some("publish") => PostStatus::Published,
            Some("private") => PostStatus::Private,
            Some("draft") => PostStatus::Draft,
            Some(other) => PostStatus::Unknown(other.to_string()),
            None => PostStatus::Unknown(String::new()),
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostStatus::Published => write!(f, "publish"),
            PostStatus::Private => write!(f, "private"),
            PostStatus::Draft => write!(f, "draft"),
            PostStatus::Unknown(raw) if raw.is_empty() => write!(f, "unknown"),
            PostStatus::Unknown(raw) => write!(f, "{}", raw),
        }
    }
}

/// A post entry of the export
#[derive(Debug, Clone, PartialEq)]
pub struct PostEntry {
    pub post_id: Option<String>,
    pub title: String,
    pub status: PostStatus,
    /// Raw `wp:post_date`, e.g. `2021-03-04 10:20:30`
    pub source_date: Option<String>,
    /// Raw `wp:post_modified`
    pub modified_date: Option<String>,
    /// Raw `content:encoded` block markup
    pub raw_content: Option<String>,
    /// `dc:creator`, the WordPress login of the author
    pub source_author_id: String,
}

/// An attachment entry of the export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentRecord {
    pub url: String,
    pub filename: String,
}

/// Attachments of an export, keyed by URL
#[derive(Debug, Clone, Default)]
pub struct AttachmentIndex {
    by_url: HashMap<String, AttachmentRecord>,
}

impl AttachmentIndex {
    pub fn insert(&mut self, record: AttachmentRecord) {
        self.by_url.insert(record.url.clone(), record);
    }

    pub fn get(&self, url: &str) -> Option<&AttachmentRecord> {
        self.by_url.get(url)
    }

    pub fn contains(&self, url: &str) -> bool {
        self.by_url.contains_key(url)
    }

    pub fn len(&self) -> usize {
        self.by_url.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_url.is_empty()
    }
}

/// The parts of an export the importer consumes
#[derive(Debug, Clone, Default)]
pub struct WxrDocument {
    source: Option<PathBuf>,
    posts: Vec<PostEntry>,
    attachments: AttachmentIndex,
}

/// Fields collected from the direct children of one `<item>`
#[derive(Debug, Default)]
struct PartialItem {
    fields: HashMap<String, String>,
}

impl PartialItem {
    fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    fn take(&mut self, name: &str) -> Option<String> {
        self.fields.remove(name)
    }
}

const ITEM_FIELDS: &[&str] = &[
    "title",
    "guid",
    "dc:creator",
    "content:encoded",
    "wp:post_id",
    "wp:post_date",
    "wp:post_modified",
    "wp:status",
    "wp:post_type",
    "wp:attachment_url",
];

fn element_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).to_string()
}

impl WxrDocument {
    /// Read and parse an export file
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ImportError> {
        let path = path.as_ref();
        let xml = std::fs::read_to_string(path).map_err(|source| ImportError::InputUnreadable {
            source,
            path: path.to_path_buf(),
        })?;
        let mut document = Self::parse(&xml)?;
        document.source = Some(path.to_path_buf());
        Ok(document)
    }

    /// Parse an export held in memory
    pub fn parse(xml: &str) -> Result<Self, WxrError> {
        let mut reader = Reader::from_str(xml);
        let mut document = WxrDocument::default();

        let mut item: Option<PartialItem> = None;
        // Depth relative to the current <item>; 1 means a direct child
        let mut depth: usize = 0;
        let mut current_field: Option<String> = None;
        let mut text_buf = String::new();

        let xml_error = |reader: &Reader<&[u8]>, message: String| WxrError::Xml {
            position: reader.buffer_position() as u64,
            message,
        };

        loop {
            let event = reader
                .read_event()
                .map_err(|e| xml_error(&reader, e.to_string()))?;

            match event {
                Event::Start(ref e) => {
                    let name = element_name(e);
                    if item.is_some() {
                        depth += 1;
                        if depth == 1 && ITEM_FIELDS.contains(&name.as_str()) {
                            current_field = Some(name);
                            text_buf.clear();
                        }
                    } else if name == "item" {
                        item = Some(PartialItem::default());
                        depth = 0;
                    }
                }
                Event::Empty(ref e) => {
                    let name = element_name(e);
                    if let Some(ref mut item) = item {
                        if depth == 0 && ITEM_FIELDS.contains(&name.as_str()) {
                            item.fields.insert(name, String::new());
                        }
                    }
                }
                Event::Text(ref e) => {
                    if current_field.is_some() {
                        let text = e
                            .unescape()
                            .map_err(|err| xml_error(&reader, err.to_string()))?;
                        text_buf.push_str(&text);
                    }
                }
                Event::CData(ref e) => {
                    if current_field.is_some() {
                        text_buf.push_str(&String::from_utf8_lossy(e));
                    }
                }
                Event::End(ref e) => {
                    if item.is_none() {
                        continue;
                    }
                    let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                    if depth == 0 && name == "item" {
                        if let Some(finished) = item.take() {
                            document.accept(finished);
                        }
                        continue;
                    }
                    if depth == 1 {
                        if let (Some(field), Some(current)) = (current_field.take(), item.as_mut()) {
                            current.fields.insert(field, std::mem::take(&mut text_buf));
                        }
                    }
                    depth = depth.saturating_sub(1);
                }
                Event::Eof => {
                    if item.is_some() {
                        return Err(WxrError::UnterminatedItem);
                    }
                    break;
                }
                _ => {}
            }
        }

        log::debug!(
            "Parsed export: {} posts, {} attachments",
            document.posts.len(),
            document.attachments.len()
        );
        Ok(document)
    }

    fn accept(&mut self, mut item: PartialItem) {
        match item.get("wp:post_type") {
            Some("post") => {
                let status = PostStatus::from_wp(item.get("wp:status"));
                self.posts.push(PostEntry {
                    post_id: item.take("wp:post_id"),
                    title: item
                        .take("title")
                        .unwrap_or_else(|| "(untitled)".to_string()),
                    status,
                    source_date: item.take("wp:post_date"),
                    modified_date: item.take("wp:post_modified"),
                    raw_content: item.take("content:encoded"),
                    source_author_id: item.take("dc:creator").unwrap_or_default(),
                });
            }
            Some("attachment") => {
                let Some(url) = item
                    .take("wp:attachment_url")
                    .or_else(|| item.take("guid"))
                else {
                    return;
                };
                let filename = filename_from_url(&url);
                self.attachments.insert(AttachmentRecord { url, filename });
            }
            _ => {}
        }
    }

    /// Path the document was read from, if any
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Post entries in document order
    pub fn posts(&self) -> &[PostEntry] {
        &self.posts
    }

    pub fn attachments(&self) -> &AttachmentIndex {
        &self.attachments
    }
}

/// Last non-empty path segment of a URL, or the whole input when it does not parse
pub(crate) fn filename_from_url(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => parsed
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
            .unwrap_or_default()
            .to_string(),
        Err(_) => url
            .rsplit('/')
            .find(|s| !s.is_empty())
            .unwrap_or_default()
            .to_string(),
    }
}
