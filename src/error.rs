//! Fatal errors of an import run.
//!
//! Anything represented here aborts the run. Recoverable problems (a media
//! download that fails, an author pair that does not resolve) are reported
//! as [`crate::importer::ImportWarning`]s instead.

use std::path::PathBuf;
use thiserror::Error;

use crate::platform::PlatformError;
use crate::wxr::WxrError;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("cannot read export file {path:?}: {source}")]
    InputUnreadable {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("malformed export document: {0}")]
    Wxr(#[from] WxrError),
    #[error(
        "an author map is required, e.g. \"alice:alice@example.com,bob:bob@example.com\""
    )]
    MissingAuthorMap,
    #[error("no users found matching the author map; create users first")]
    NoAuthorResolved,
    #[error("post \"{title}\" has an unparseable date {value:?}")]
    InvalidDate { title: String, value: String },
    #[error("failed to read downloaded media {path:?}: {source}")]
    MediaRead {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error(transparent)]
    Platform(#[from] PlatformError),
}
