//! Import orchestration
//!
//! Posts are processed oldest first. Each one is either skipped (the
//! WordPress sample post), reported (dry run) or converted and created.
//! Nothing here is transactional: a fatal error leaves the posts and media
//! records created so far in place.

use std::time::Instant;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use super::authors::AuthorMapping;
use super::converter::ContentConverter;
use super::media::MediaCache;
use super::options::ImportOptions;
use super::report::{ImportReport, PostAction, PostOutcome};
use crate::error::ImportError;
use crate::platform::{ImportedPost, MediaStore, PostStore};
use crate::wxr::{PostEntry, WxrDocument};

/// What WordPress writes for a date that was never set
pub const NULL_DATE: &str = "0000-00-00 00:00:00";
/// Ordering key of posts without a usable date, sorts after any real date
const UNDATED_SORT_KEY: &str = "9999";

fn usable_date(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty() && *v != NULL_DATE)
}

/// Post entries sorted by their raw post date, undated ones last
pub fn sorted_posts(posts: &[PostEntry]) -> Vec<&PostEntry> {
    let mut sorted: Vec<&PostEntry> = posts.iter().collect();
    sorted.sort_by_key(|p| usable_date(p.source_date.as_deref()).unwrap_or(UNDATED_SORT_KEY));
    sorted
}

/// Parse a WordPress date. Values without an offset are taken as UTC.
pub fn parse_wp_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Date a post is imported with: its post date, else its modified date, else `now`.
///
/// A usable but unparseable date is an error; it is not replaced by the next
/// candidate.
pub fn resolve_post_date(entry: &PostEntry, now: DateTime<Utc>) -> Result<DateTime<Utc>, ImportError> {
    let Some(raw) = usable_date(entry.source_date.as_deref())
        .or_else(|| usable_date(entry.modified_date.as_deref()))
    else {
        return Ok(now);
    };
    parse_wp_date(raw).ok_or_else(|| ImportError::InvalidDate {
        title: entry.title.clone(),
        value: raw.to_string(),
    })
}

/// Runs an import over a parsed export
pub struct Importer {
    options: ImportOptions,
}

impl Importer {
    pub fn new(options: ImportOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ImportOptions {
        &self.options
    }

    /// Whether `entry` is the untouched WordPress sample post
    pub fn is_placeholder(&self, entry: &PostEntry) -> bool {
        entry.title == self.options.placeholder_title
            && entry
                .raw_content
                .as_deref()
                .map_or(true, |c| c.contains(&self.options.welcome_marker))
    }

    /// Import every post of `document`.
    ///
    /// Returns the report on success; any error aborts the remaining posts.
    pub fn run<P>(
        &self,
        document: &WxrDocument,
        authors: &AuthorMapping,
        media: &mut MediaCache,
        platform: &mut P,
    ) -> Result<ImportReport, ImportError>
    where
        P: MediaStore + PostStore,
    {
        let start_time = Instant::now();
        let input = document
            .source()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(memory)".to_string());
        let mut report = ImportReport::new(&input, self.options.dry_run);
        report.posts_found = document.posts().len();
        report.attachments_found = document.attachments().len();
        for warning in authors.warnings() {
            report.add_warning(warning.clone());
        }

        if self.options.dry_run {
            log::info!("=== DRY RUN ===");
        }
        log::info!("Found {} attachments in export", report.attachments_found);
        log::info!("Found {} posts to import", report.posts_found);

        let mut converter = ContentConverter::new(document.attachments());

        for entry in sorted_posts(document.posts()) {
            if self.is_placeholder(entry) {
                log::info!("Skipping default WordPress post: {}", entry.title);
                report.record(PostOutcome {
                    title: entry.title.clone(),
                    status: entry.status.to_string(),
                    date: None,
                    author_email: None,
                    action: PostAction::Skipped,
                });
                continue;
            }

            let author = authors.author_for(&entry.source_author_id);
            log::info!(
                "Importing: {} [{}] by {}→{}",
                entry.title,
                entry.status,
                entry.source_author_id,
                author.email
            );

            let date = resolve_post_date(entry, Utc::now())?;

            if self.options.dry_run {
                let content_length = entry
                    .raw_content
                    .as_deref()
                    .map_or(0, |c| c.chars().count());
                log::info!("  Date: {}", date.to_rfc3339());
                log::info!("  Content length: {} chars", content_length);
                report.record(PostOutcome {
                    title: entry.title.clone(),
                    status: entry.status.to_string(),
                    date: Some(date.to_rfc3339()),
                    author_email: Some(author.email.clone()),
                    action: PostAction::DryRun { content_length },
                });
                continue;
            }

            let mut content = format!("# {}\n\n", entry.title);
            content.push_str(&converter.convert(
                entry.raw_content.as_deref().unwrap_or(""),
                media,
                platform,
            )?);

            let post = ImportedPost {
                content,
                datetime: date,
                author: author.clone(),
            };
            let id = platform.create_post(&post)?;
            log::info!("  Created post #{} ({})", id, date.format("%Y-%m-%d"));
            report.record(PostOutcome {
                title: entry.title.clone(),
                status: entry.status.to_string(),
                date: Some(date.to_rfc3339()),
                author_email: Some(author.email.clone()),
                action: PostAction::Created { id },
            });
        }

        let media_warnings = media.warnings();
        report.media_failed = media_warnings.len();
        for warning in media_warnings {
            report.add_warning(warning);
        }
        report.media_downloaded = media.downloaded_count();
        report.external_media = converter.external_media();
        report.feature_counts = converter.feature_counts().clone();
        report.duration_ms = start_time.elapsed().as_millis() as u64;

        log::info!("=== Import complete ===");
        log::info!("Imported: {}", report.imported);
        log::info!("Skipped: {}", report.skipped);
        log::info!("Media downloaded: {}", report.media_downloaded);

        Ok(report)
    }
}
