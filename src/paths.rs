/// Platform-specific locations used by history-drill
///
/// Follows the XDG Base Directory specification on Unix-like systems.
use std::path::{Path, PathBuf};

/// Directory name used under the platform config/data roots
const APP_DIR: &str = "history-drill";

/// Platform-agnostic path utilities
pub struct PlatformPaths;

impl PlatformPaths {
    /// Get the appropriate config directory for the current platform
    ///
    /// - Windows: %APPDATA%
    /// - macOS: ~/Library/Application Support
    /// - Linux/Unix: $XDG_CONFIG_HOME or ~/.config
    pub fn config_dir() -> PathBuf {
        if cfg!(target_os = "windows") {
            std::env::var("APPDATA")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("."))
        } else if cfg!(target_os = "macos") {
            std::env::var("HOME")
                .map(|home| PathBuf::from(home).join("Library/Application Support"))
                .unwrap_or_else(|_| PathBuf::from("."))
        } else {
            std::env::var("XDG_CONFIG_HOME")
                .map(PathBuf::from)
                .or_else(|_| std::env::var("HOME").map(|home| PathBuf::from(home).join(".config")))
                .unwrap_or_else(|_| PathBuf::from("."))
        }
    }

    /// Returns: {config_dir}/history-drill
    pub fn project_config_dir() -> PathBuf {
        Self::config_dir().join(APP_DIR)
    }

    /// Returns: {config_dir}/history-drill/config.toml
    pub fn default_config_path() -> PathBuf {
        Self::project_config_dir().join("config.toml")
    }

    /// Default directory for exported datasets, relative to the working directory
    pub fn default_output_dir() -> PathBuf {
        PathBuf::from("data")
    }

    /// Catalog file written next to the exported datasets
    pub fn catalog_path(output_dir: &Path) -> PathBuf {
        output_dir.join("catalog.json")
    }

    /// A memory-backed directory for temporary clones, if the platform has one
    pub fn memory_temp_dir() -> Option<PathBuf> {
        if !cfg!(target_os = "linux") {
            return None;
        }
        let shm = PathBuf::from("/dev/shm");
        shm.is_dir().then_some(shm)
    }
}
