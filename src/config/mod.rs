/// Configuration system for history-drill
///
/// Supports loading from multiple sources with priority:
/// CLI args > Environment variables > Config file > Defaults
use crate::error::{ConfigError, DrillError};
use crate::export::ParquetCompression;
use crate::extractor::Capability;
use crate::types::{DEFAULT_HASH_LENGTH, FULL_HASH_LENGTH};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Shortest accepted hash prefix
pub const MIN_HASH_LENGTH: usize = 7;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Which repository to analyze and how to acquire it
    #[serde(default)]
    pub repository: RepositoryConfig,

    /// What to extract and how to walk the history
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Where and how datasets are written
    #[serde(default)]
    pub export: ExportConfig,
}

/// Repository acquisition configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RepositoryConfig {
    /// Remote URL to clone
    #[serde(default)]
    pub url: String,

    /// Analyze an existing local checkout instead of cloning (not supported)
    #[serde(default)]
    pub is_local: bool,

    /// Place the temporary clone on a memory-backed filesystem when available
    #[serde(default)]
    pub use_in_memory_temp_repository: bool,

    /// Log clone progress
    #[serde(default)]
    pub print_logs: bool,
}

/// How the commit history is traversed when several extractors are registered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum WalkStrategy {
    /// One walk, each commit handed to every extractor
    #[default]
    SharedPass,
    /// One independent walk per extractor
    PerExtractor,
}

impl WalkStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SharedPass => "shared-pass",
            Self::PerExtractor => "per-extractor",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "shared-pass" => Some(Self::SharedPass),
            "per-extractor" => Some(Self::PerExtractor),
            _ => None,
        }
    }
}

/// Extraction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Length of the hex prefix stored for commit and object hashes
    #[serde(default = "default_hash_length")]
    pub hash_length: usize,

    #[serde(default)]
    pub walk_strategy: WalkStrategy,

    /// Extractors to run, in registration order
    #[serde(default = "default_extractors")]
    pub extractors: Vec<String>,
}

/// Export configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Directory receiving one Parquet file per dataset
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Directory receiving copied file contents; no copy when unset
    #[serde(default)]
    pub content_dir: Option<PathBuf>,

    #[serde(default)]
    pub compression: ParquetCompression,

    /// Write `catalog.json` next to the datasets
    #[serde(default = "default_write_catalog")]
    pub write_catalog: bool,
}

fn default_hash_length() -> usize {
    DEFAULT_HASH_LENGTH
}

fn default_extractors() -> Vec<String> {
    Capability::ALL
        .iter()
        .map(|capability| capability.as_str().to_string())
        .collect()
}

fn default_output_dir() -> PathBuf {
    crate::paths::PlatformPaths::default_output_dir()
}

fn default_write_catalog() -> bool {
    true
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            hash_length: default_hash_length(),
            walk_strategy: WalkStrategy::default(),
            extractors: default_extractors(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            content_dir: None,
            compression: ParquetCompression::default(),
            write_catalog: default_write_catalog(),
        }
    }
}

impl ExtractionConfig {
    /// Parsed extractor kinds, in configured order
    pub fn capabilities(&self) -> Result<Vec<Capability>, ConfigError> {
        self.extractors
            .iter()
            .map(|name| {
                Capability::from_name(name).ok_or_else(|| ConfigError::InvalidValue {
                    key: "extraction.extractors".to_string(),
                    reason: format!(
                        "unknown extractor '{}', expected one of: {}",
                        name,
                        Capability::ALL.map(|c| c.as_str()).join(", ")
                    ),
                })
            })
            .collect()
    }
}

impl Config {
    /// Load configuration from file
    pub fn from_file(path: &Path) -> Result<Self, DrillError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()).into());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::LoadFailed(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| ConfigError::ParseFailed(format!("Invalid TOML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default location or create default
    pub fn load_or_default() -> Result<Self, DrillError> {
        let config_path = crate::paths::PlatformPaths::default_config_path();

        if config_path.exists() {
            tracing::info!("Loading config from: {}", config_path.display());
            Self::from_file(&config_path)
        } else {
            tracing::debug!("No config file found, using defaults");
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<(), DrillError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ConfigError::SaveFailed(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SaveFailed(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| ConfigError::SaveFailed(format!("Failed to write config file: {}", e)))?;

        tracing::info!("Saved config to: {}", path.display());
        Ok(())
    }

    /// Validate configuration values.
    ///
    /// The repository URL is not required here so that a config file can
    /// leave it to the command line; [`Config::require_url`] checks it.
    pub fn validate(&self) -> Result<(), DrillError> {
        if self.repository.is_local {
            return Err(ConfigError::Unsupported(
                "local repositories (repository.is_local) are not supported".to_string(),
            )
            .into());
        }

        let hash_length = self.extraction.hash_length;
        if !(MIN_HASH_LENGTH..=FULL_HASH_LENGTH).contains(&hash_length) {
            return Err(ConfigError::InvalidValue {
                key: "extraction.hash_length".to_string(),
                reason: format!(
                    "must be between {} and {}, got {}",
                    MIN_HASH_LENGTH, FULL_HASH_LENGTH, hash_length
                ),
            }
            .into());
        }

        if self.extraction.extractors.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "extraction.extractors".to_string(),
                reason: "at least one extractor is required".to_string(),
            }
            .into());
        }
        self.extraction.capabilities()?;

        if self.export.output_dir.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "export.output_dir".to_string(),
                reason: "must not be empty".to_string(),
            }
            .into());
        }

        Ok(())
    }

    /// The repository URL, or an error when none was configured
    pub fn require_url(&self) -> Result<&str, ConfigError> {
        let url = self.repository.url.trim();
        if url.is_empty() {
            return Err(ConfigError::MissingRequired("repository.url".to_string()));
        }
        Ok(url)
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("HISTORY_DRILL_REPOSITORY_URL") {
            self.repository.url = url;
        }

        if let Some(in_memory) = env_flag("HISTORY_DRILL_IN_MEMORY") {
            self.repository.use_in_memory_temp_repository = in_memory;
        }

        if let Some(print_logs) = env_flag("HISTORY_DRILL_PRINT_LOGS") {
            self.repository.print_logs = print_logs;
        }

        if let Ok(path) = std::env::var("HISTORY_DRILL_OUTPUT_DIR") {
            self.export.output_dir = PathBuf::from(path);
        }

        if let Ok(path) = std::env::var("HISTORY_DRILL_CONTENT_DIR") {
            self.export.content_dir = Some(PathBuf::from(path));
        }

        if let Ok(hash_length) = std::env::var("HISTORY_DRILL_HASH_LENGTH")
            && let Ok(length) = hash_length.parse()
        {
            self.extraction.hash_length = length;
        }
    }

    /// Create a new Config with defaults and environment overrides
    pub fn new() -> Result<Self, DrillError> {
        let mut config = Self::load_or_default()?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Name derived from the repository URL.
    ///
    /// Last path segment without a trailing `.git`, restricted to
    /// `[A-Za-z0-9._-]`. Used to namespace outputs and temporary clones.
    pub fn repository_name(&self) -> String {
        repository_name_from_url(&self.repository.url)
    }
}

/// Derive a filesystem-safe repository name from a clone URL
pub fn repository_name_from_url(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');
    let segment = trimmed
        .rsplit(['/', ':', '\\'])
        .next()
        .unwrap_or(trimmed);
    let segment = segment.strip_suffix(".git").unwrap_or(segment);

    let name: String = segment
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if name.is_empty() || name.chars().all(|c| c == '.') {
        "repository".to_string()
    } else {
        name
    }
}

fn env_flag(key: &str) -> Option<bool> {
    let value = std::env::var(key).ok()?;
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        other => {
            tracing::warn!("Ignoring {}={}: expected a boolean", key, other);
            None
        }
    }
}
