//! WordPress to Haven importer module
//!
//! This module turns a parsed WXR export into Haven posts and media records.
//! An import run goes through these stages:
//! - Authors: resolve the `login:email` author map against the user directory
//! - Conversion: rewrite each post body from block markup to markdown
//! - Media: download each referenced file once and create one record per URL
//! - Orchestration: order posts, skip the sample post, create the rest

mod authors;
mod converter;
mod media;
mod options;
mod orchestrator;
mod report;

pub use authors::{parse_author_map, AuthorMapping, AuthorPair};
pub use converter::{media_tag, ContentConverter, FigureKind, NodeKind, OutputBuffer};
pub use media::{
    content_type_for, create_image_record, extension_of, CachedMedia, FetchError, HttpFetcher,
    MediaCache, MediaEntry, MediaFailure, MediaFetcher, MediaPayload,
};
pub use options::{ImportOptions, DEFAULT_PLACEHOLDER_TITLE, DEFAULT_WELCOME_MARKER};
pub use orchestrator::{parse_wp_date, resolve_post_date, sorted_posts, Importer, NULL_DATE};
pub use report::{ImportReport, ImportWarning, PostAction, PostOutcome, WarningKind};
