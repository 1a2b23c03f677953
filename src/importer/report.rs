//! Import run report

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Type of warning during import
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningKind {
    /// Media download failed (network error, timeout, non-success status)
    MediaDownload,
    /// Media URL with a scheme other than http/https
    NonFetchableUrl,
    /// Author map entry without a `source:email` shape
    MalformedAuthorPair,
    /// Author map email with no matching user
    UnresolvedAuthor,
}

impl std::fmt::Display for WarningKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WarningKind::MediaDownload => write!(f, "media_download"),
            WarningKind::NonFetchableUrl => write!(f, "non_fetchable_url"),
            WarningKind::MalformedAuthorPair => write!(f, "malformed_author_pair"),
            WarningKind::UnresolvedAuthor => write!(f, "unresolved_author"),
        }
    }
}

/// A recoverable problem encountered during the run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportWarning {
    pub kind: WarningKind,
    /// URL, author pair or email the warning is about
    pub subject: String,
    pub message: String,
}

impl std::fmt::Display for ImportWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.subject, self.message)
    }
}

/// What happened to one post entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PostAction {
    Created { id: String },
    DryRun { content_length: usize },
    Skipped,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostOutcome {
    pub title: String,
    pub status: String,
    /// Resolved date (RFC 3339); absent for skipped posts
    pub date: Option<String>,
    pub author_email: Option<String>,
    pub action: PostAction,
}

/// Complete import report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportReport {
    /// Export file path
    pub input_file: String,
    pub dry_run: bool,
    /// Timestamp of the run
    pub timestamp: String,
    /// Duration in milliseconds
    pub duration_ms: u64,
    pub posts_found: usize,
    pub attachments_found: usize,
    pub imported: usize,
    pub skipped: usize,
    /// Distinct media URLs successfully downloaded
    pub media_downloaded: usize,
    /// Distinct media URLs that could not be downloaded
    pub media_failed: usize,
    /// Media references whose URL is not an attachment of the export
    pub external_media: usize,
    /// Count of each block kind converted
    pub feature_counts: BTreeMap<String, usize>,
    pub posts: Vec<PostOutcome>,
    pub warnings: Vec<ImportWarning>,
}

impl ImportReport {
    /// Create a new empty report
    pub fn new(input: &str, dry_run: bool) -> Self {
        Self {
            input_file: input.to_string(),
            dry_run,
            timestamp: chrono::Utc::now().to_rfc3339(),
            duration_ms: 0,
            posts_found: 0,
            attachments_found: 0,
            imported: 0,
            skipped: 0,
            media_downloaded: 0,
            media_failed: 0,
            external_media: 0,
            feature_counts: BTreeMap::new(),
            posts: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Record the outcome of one post entry
    pub fn record(&mut self, outcome: PostOutcome) {
        match outcome.action {
            PostAction::Skipped => self.skipped += 1,
            PostAction::Created { .. } | PostAction::DryRun { .. } => self.imported += 1,
        }
        self.posts.push(outcome);
    }

    /// Add a warning to the report
    pub fn add_warning(&mut self, warning: ImportWarning) {
        self.warnings.push(warning);
    }

    /// Convert to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Convert to human-readable text format
    pub fn to_text(&self) -> String {
        let mut output = String::new();

        output.push_str("WordPress Import Report\n");
        output.push_str("=======================\n");
        output.push_str(&format!("Input:  {}\n", self.input_file));
        if self.dry_run {
            output.push_str("Mode:   dry run\n");
        }
        output.push_str(&format!("Date:   {}\n", self.timestamp));
        output.push_str(&format!("Time:   {}ms\n\n", self.duration_ms));

        output.push_str("Summary\n");
        output.push_str("-------\n");
        output.push_str(&format!("Posts found:      {}\n", self.posts_found));
        output.push_str(&format!("Attachments:      {}\n", self.attachments_found));
        output.push_str(&format!("Imported:         {}\n", self.imported));
        output.push_str(&format!("Skipped:          {}\n", self.skipped));
        output.push_str(&format!("Media downloaded: {}\n", self.media_downloaded));
        output.push_str(&format!("Media failed:     {}\n", self.media_failed));
        output.push_str(&format!("External media:   {}\n\n", self.external_media));

        if !self.feature_counts.is_empty() {
            output.push_str("Conversions\n");
            output.push_str("-----------\n");
            let mut features: Vec<_> = self.feature_counts.iter().collect();
            features.sort_by(|a, b| b.1.cmp(a.1));
            for (feature, count) in features {
                output.push_str(&format!("✓ {}: {}\n", feature, count));
            }
            output.push('\n');
        }

        if !self.warnings.is_empty() {
            output.push_str("Warnings\n");
            output.push_str("--------\n");
            for warning in &self.warnings {
                output.push_str(&format!("⚠ {}\n", warning));
            }
            output.push('\n');
        }

        output.push_str("Result\n");
        output.push_str("------\n");
        if self.dry_run {
            output.push_str("ℹ Dry run, no records were created\n");
        } else if self.warnings.is_empty() {
            output.push_str("✓ Import completed successfully\n");
        } else {
            output.push_str("✓ Import completed with warnings\n");
            output.push_str("ℹ Review warnings and fix missing media or authors by hand\n");
        }

        output
    }
}
