//! Import options

/// Title WordPress gives its sample post
pub const DEFAULT_PLACEHOLDER_TITLE: &str = "Hello world";
/// Text found in the body of WordPress's sample post
pub const DEFAULT_WELCOME_MARKER: &str = "Welcome to WordPress";

/// Options for an import run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOptions {
    /// Report what would be imported without creating any record
    pub dry_run: bool,
    /// Posts with exactly this title are candidates for skipping
    pub placeholder_title: String,
    /// A placeholder-titled post is skipped when its body contains this text
    pub welcome_marker: String,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            placeholder_title: DEFAULT_PLACEHOLDER_TITLE.to_string(),
            welcome_marker: DEFAULT_WELCOME_MARKER.to_string(),
        }
    }
}

impl ImportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable dry-run mode
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_placeholder(
        mut self,
        title: impl Into<String>,
        welcome_marker: impl Into<String>,
    ) -> Self {
        self.placeholder_title = title.into();
        self.welcome_marker = welcome_marker.into();
        self
    }
}
