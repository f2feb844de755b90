//! Configuration management for flashscrape.
//!
//! Settings come from a TOML file: the `--config` path (or
//! `FLASHSCRAPE_CONFIG`), otherwise `<config_dir>/flashscrape/config.toml`
//! when present. Every section is optional and falls back to defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::extract::ExtractConfig;
use crate::import::ExportFormat;
use crate::providers::{BrowserEngineConfig, ProviderOptions};
use crate::quiz::QuizConfig;
use crate::sink::DEFAULT_LIST_FIELD;

/// Config file name inside the per-user config directory.
pub const CONFIG_FILENAME: &str = "config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse TOML config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Where extracted cards are written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_path")]
    pub path: PathBuf,

    /// Top-level field holding the card list.
    #[serde(default = "default_list_field")]
    pub list_field: String,
}

fn default_output_path() -> PathBuf {
    PathBuf::from("cards.json")
}

fn default_list_field() -> String {
    DEFAULT_LIST_FIELD.to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            list_field: default_list_field(),
        }
    }
}

/// Effective settings for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub provider: ProviderOptions,
    pub browser: BrowserEngineConfig,
    pub extract: ExtractConfig,
    pub output: OutputConfig,
    pub export: ExportFormat,
    pub quiz: QuizConfig,

    /// File these settings were loaded from, if any.
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Settings {
    /// Load settings.
    ///
    /// An explicit path must exist. Without one, the default location is
    /// used if it exists, otherwise built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load_from_path(path);
        }

        match default_config_path() {
            Some(path) if path.is_file() => Self::load_from_path(&path),
            _ => {
                debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load settings from a specific TOML file.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let mut settings = Self::from_toml(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        settings.source_path = Some(path.to_path_buf());
        debug!("Loaded config from {}", path.display());
        Ok(settings)
    }

    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Render the effective settings as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// `<config_dir>/flashscrape/config.toml`, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("flashscrape").join(CONFIG_FILENAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::MarkerStrategy;
    use crate::providers::Backoff;
    use std::io::Write;

    #[test]
    fn test_empty_config_uses_defaults() {
        let settings = Settings::from_toml("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.output.path, PathBuf::from("cards.json"));
        assert_eq!(settings.output.list_field, "cards");
        assert_eq!(settings.provider.max_retries, 3);
        assert_eq!(settings.extract.strategies, MarkerStrategy::defaults());
    }

    #[test]
    fn test_partial_sections() {
        let settings = Settings::from_toml(
            r#"
            [provider]
            max_retries = 5
            start_at_homepage = false

            [provider.backoff]
            kind = "linear"
            base_ms = 250

            [output]
            path = "out/set.json"
            "#,
        )
        .unwrap();

        assert_eq!(settings.provider.max_retries, 5);
        assert!(!settings.provider.start_at_homepage);
        assert_eq!(settings.provider.backoff, Backoff::Linear { base_ms: 250 });
        assert_eq!(settings.provider.homepage, "https://quizlet.com");
        assert_eq!(settings.output.path, PathBuf::from("out/set.json"));
        assert_eq!(settings.output.list_field, "cards");
        assert!(settings.browser.headless);
    }

    #[test]
    fn test_custom_strategies() {
        let settings = Settings::from_toml(
            r#"
            [extract]
            allow_empty = true

            [[extract.strategies]]
            kind = "paired_blocks"
            block = "dl > div"
            term = "dt"
            definition = "dd"
            "#,
        )
        .unwrap();

        assert!(settings.extract.allow_empty);
        assert_eq!(settings.extract.strategies.len(), 1);
        assert_eq!(settings.extract.strategies[0].label(), "paired_blocks(dl > div)");
    }

    #[test]
    fn test_quiz_section() {
        let settings = Settings::from_toml(
            r#"
            [quiz]
            answer_side = "term"
            review_missed = false
            "#,
        )
        .unwrap();
        assert_eq!(settings.quiz.answer_side, crate::quiz::AnswerSide::Term);
        assert!(!settings.quiz.review_missed);
    }

    #[test]
    fn test_load_from_path_records_source() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[browser]\nremote_url = \"ws://127.0.0.1:9222\"").unwrap();

        let settings = Settings::load(Some(file.path())).unwrap();
        assert_eq!(
            settings.browser.remote_url.as_deref(),
            Some("ws://127.0.0.1:9222")
        );
        assert_eq!(settings.source_path.as_deref(), Some(file.path()));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Settings::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_invalid_toml_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[provider\nmax_retries = ").unwrap();

        let err = Settings::load_from_path(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_to_toml_reloads() {
        let settings = Settings::default();
        let rendered = settings.to_toml().unwrap();
        assert!(rendered.contains("[provider]"));
        assert_eq!(Settings::from_toml(&rendered).unwrap(), settings);
    }
}
