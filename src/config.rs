//! Import configuration file
//!
//! Every field is optional; command line flags and environment variables
//! override whatever the file sets.

use serde::Deserialize;
use std::{fs, path::Path, path::PathBuf, time::Duration};
use thiserror::Error;

use crate::error::ImportError;
use crate::importer::ImportOptions;

pub const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_TARGET_DIR: &str = "haven-data";

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ImportConfig {
    #[serde(alias = "AUTHOR_MAP")]
    pub author_map: Option<String>,
    #[serde(alias = "DRY_RUN")]
    pub dry_run: Option<bool>,
    pub target_dir: Option<PathBuf>,
    pub download_timeout_secs: Option<u64>,
    pub placeholder_title: Option<String>,
    pub welcome_marker: Option<String>,
}

/// Values given on the command line or through environment variables
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub author_map: Option<String>,
    /// Only ever turns dry run on; when unset the config file decides
    pub dry_run: bool,
    pub target_dir: Option<PathBuf>,
    pub download_timeout_secs: Option<u64>,
}

/// Settings of one run after merging command line, config file and defaults
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    pub author_map: String,
    pub options: ImportOptions,
    pub target_dir: PathBuf,
    pub download_timeout: Duration,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file at {path:?}: {source}")]
    Io {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("failed to parse config file at {path:?}: {source}")]
    Parse {
        #[source]
        source: toml::de::Error,
        path: PathBuf,
    },
}

impl ImportConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            source,
            path: path.to_path_buf(),
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            source,
            path: path.to_path_buf(),
        })
    }

    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Author map with surrounding whitespace removed; blank counts as unset
    pub fn author_map(&self) -> Option<String> {
        normalize_field(self.author_map.as_deref())
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(
            self.download_timeout_secs
                .unwrap_or(DEFAULT_DOWNLOAD_TIMEOUT_SECS),
        )
    }

    /// Run options from this file, with defaults for what it leaves out
    pub fn import_options(&self) -> ImportOptions {
        let mut options = ImportOptions::default().with_dry_run(self.dry_run.unwrap_or(false));
        if let Some(title) = normalize_field(self.placeholder_title.as_deref()) {
            options.placeholder_title = title;
        }
        if let Some(marker) = normalize_field(self.welcome_marker.as_deref()) {
            options.welcome_marker = marker;
        }
        options
    }

    /// Merge `cli` over this file. An author map is required from one of them.
    pub fn merge(&self, cli: &CliOverrides) -> Result<RunSettings, ImportError> {
        let author_map = normalize_field(cli.author_map.as_deref())
            .or_else(|| self.author_map())
            .ok_or(ImportError::MissingAuthorMap)?;
        let options = self
            .import_options()
            .with_dry_run(cli.dry_run || self.dry_run.unwrap_or(false));
        let target_dir = cli
            .target_dir
            .clone()
            .or_else(|| self.target_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_TARGET_DIR));
        let download_timeout = cli
            .download_timeout_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| self.download_timeout());
        Ok(RunSettings {
            author_map,
            options,
            target_dir,
            download_timeout,
        })
    }
}

fn normalize_field(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_file_gives_defaults() {
        let config = ImportConfig::from_toml_str("").unwrap();
        assert_eq!(config, ImportConfig::default());
        assert_eq!(config.download_timeout(), Duration::from_secs(60));
        assert_eq!(config.import_options(), ImportOptions::default());
        assert_eq!(config.author_map(), None);
    }

    #[test]
    fn fields_are_read() {
        let config = ImportConfig::from_toml_str(
            r#"
author_map = " alice:alice@example.com "
dry_run = true
target_dir = "/srv/haven"
download_timeout_secs = 5
placeholder_title = "Hi there"
welcome_marker = "Thanks for trying"
"#,
        )
        .unwrap();
        assert_eq!(config.author_map().as_deref(), Some("alice:alice@example.com"));
        assert_eq!(config.target_dir, Some(PathBuf::from("/srv/haven")));
        assert_eq!(config.download_timeout(), Duration::from_secs(5));

        let options = config.import_options();
        assert!(options.dry_run);
        assert_eq!(options.placeholder_title, "Hi there");
        assert_eq!(options.welcome_marker, "Thanks for trying");
    }

    #[test]
    fn uppercase_aliases() {
        let config =
            ImportConfig::from_toml_str("AUTHOR_MAP = \"a:a@example.com\"\nDRY_RUN = true").unwrap();
        assert_eq!(config.author_map().as_deref(), Some("a:a@example.com"));
        assert_eq!(config.dry_run, Some(true));
    }

    #[test]
    fn blank_values_are_unset() {
        let config =
            ImportConfig::from_toml_str("author_map = \"  \"\nplaceholder_title = \"\"").unwrap();
        assert_eq!(config.author_map(), None);
        assert_eq!(config.import_options().placeholder_title, "Hello world");
    }

    #[test]
    fn merge_uses_defaults_without_file() {
        let cli = CliOverrides {
            author_map: Some("alice:alice@example.com".to_string()),
            ..CliOverrides::default()
        };
        let settings = ImportConfig::default().merge(&cli).unwrap();
        assert_eq!(settings.author_map, "alice:alice@example.com");
        assert_eq!(settings.options, ImportOptions::default());
        assert_eq!(settings.target_dir, PathBuf::from("haven-data"));
        assert_eq!(settings.download_timeout, Duration::from_secs(60));
    }

    #[test]
    fn merge_prefers_cli_over_file() {
        let config = ImportConfig::from_toml_str(
            r#"
author_map = "file:file@example.com"
target_dir = "/srv/file"
download_timeout_secs = 5
placeholder_title = "Hi there"
"#,
        )
        .unwrap();
        let cli = CliOverrides {
            author_map: Some("cli:cli@example.com".to_string()),
            dry_run: true,
            target_dir: Some(PathBuf::from("/srv/cli")),
            download_timeout_secs: Some(9),
        };
        let settings = config.merge(&cli).unwrap();
        assert_eq!(settings.author_map, "cli:cli@example.com");
        assert!(settings.options.dry_run);
        assert_eq!(settings.options.placeholder_title, "Hi there");
        assert_eq!(settings.target_dir, PathBuf::from("/srv/cli"));
        assert_eq!(settings.download_timeout, Duration::from_secs(9));
    }

    #[test]
    fn merge_falls_back_to_file() {
        let config = ImportConfig::from_toml_str(
            "author_map = \"file:file@example.com\"\ndry_run = true\ntarget_dir = \"/srv/file\"\ndownload_timeout_secs = 5",
        )
        .unwrap();
        // A blank command line map does not hide the file's map
        let cli = CliOverrides {
            author_map: Some("  ".to_string()),
            ..CliOverrides::default()
        };
        let settings = config.merge(&cli).unwrap();
        assert_eq!(settings.author_map, "file:file@example.com");
        assert!(settings.options.dry_run);
        assert_eq!(settings.target_dir, PathBuf::from("/srv/file"));
        assert_eq!(settings.download_timeout, Duration::from_secs(5));
    }

    #[test]
    fn merge_requires_author_map() {
        let err = ImportConfig::default()
            .merge(&CliOverrides::default())
            .unwrap_err();
        assert!(matches!(err, ImportError::MissingAuthorMap));
    }

    #[test]
    fn load_reports_io_and_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        assert!(matches!(
            ImportConfig::load(&missing),
            Err(ConfigError::Io { .. })
        ));

        let bad = dir.path().join("bad.toml");
        let mut file = std::fs::File::create(&bad).unwrap();
        writeln!(file, "dry_run = \"sometimes\"").unwrap();
        assert!(matches!(
            ImportConfig::load(&bad),
            Err(ConfigError::Parse { .. })
        ));

        let good = dir.path().join("good.toml");
        std::fs::write(&good, "download_timeout_secs = 9\n").unwrap();
        assert_eq!(
            ImportConfig::load(&good).unwrap().download_timeout(),
            Duration::from_secs(9)
        );
    }
}
