/// Centralized error types for history-drill using thiserror
///
/// Fatal classes (acquisition, walk, export, configuration) abort a run.
/// `ExtractionError` is the only recoverable class: the engine logs it and
/// skips the affected commit for the affected extractor.
use thiserror::Error;

/// Main error type for a drilling run
#[derive(Error, Debug)]
pub enum DrillError {
    #[error("Repository acquisition failed: {0}")]
    Acquisition(#[from] AcquisitionError),

    #[error("History walk failed: {0}")]
    Walk(#[from] WalkError),

    #[error("Export failed: {0}")]
    Export(#[from] ExportError),

    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Analysis was cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Errors raised while cloning or opening a repository and resolving HEAD
#[derive(Error, Debug)]
pub enum AcquisitionError {
    #[error("Failed to create temporary directory for '{name}': {reason}")]
    TempDirFailed { name: String, reason: String },

    #[error("Failed to clone '{url}': {reason}")]
    CloneFailed { url: String, reason: String },

    #[error("Failed to open repository at '{path}': {reason}")]
    OpenFailed { path: String, reason: String },

    #[error("Failed to resolve HEAD: {0}")]
    HeadUnresolved(String),
}

/// Errors raised while enumerating commit history
#[derive(Error, Debug)]
pub enum WalkError {
    #[error("Failed to start history walk: {0}")]
    StartFailed(String),

    #[error("Failed to read commit during walk: {0}")]
    CommitFailed(String),
}

/// Errors raised while persisting extracted records
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to create output directory '{path}': {reason}")]
    OutputDirFailed { path: String, reason: String },

    #[error("Failed to create writer for '{target}': {reason}")]
    WriterFailed { target: String, reason: String },

    #[error("Failed to build record batch for '{dataset}': {reason}")]
    BatchFailed { dataset: String, reason: String },

    #[error("Failed to write '{target}': {reason}")]
    WriteFailed { target: String, reason: String },

    #[error("Failed to write catalog: {0}")]
    CatalogFailed(String),
}

/// Per-commit failures that skip one commit for one extractor
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("Failed to enumerate tree of commit {commit}: {reason}")]
    TreeEnumeration { commit: String, reason: String },

    #[error("Failed to copy object {object} of commit {commit}: {reason}")]
    ContentCopy {
        commit: String,
        object: String,
        reason: String,
    },
}

/// Errors related to configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration file: {0}")]
    LoadFailed(String),

    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    #[error("Invalid configuration value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Unsupported configuration: {0}")]
    Unsupported(String),

    #[error("Failed to save configuration: {0}")]
    SaveFailed(String),

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),
}

/// Errors surfaced by the repository provider
#[derive(Error, Debug)]
pub enum GitError {
    #[error("Failed to open git repository: {0}")]
    OpenFailed(String),

    #[error("Failed to clone git repository: {0}")]
    CloneFailed(String),

    #[error("Failed to get git reference: {0}")]
    RefNotFound(String),

    #[error("Failed to iterate commits: {0}")]
    IterFailed(String),

    #[error("Failed to read tree: {0}")]
    TreeFailed(String),

    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    #[error("Operation was cancelled")]
    Cancelled,
}

impl From<git2::Error> for GitError {
    fn from(err: git2::Error) -> Self {
        match err.code() {
            git2::ErrorCode::NotFound => GitError::ObjectNotFound(err.message().to_string()),
            _ => GitError::IterFailed(err.message().to_string()),
        }
    }
}

impl From<anyhow::Error> for DrillError {
    fn from(err: anyhow::Error) -> Self {
        DrillError::Other(format!("{:#}", err))
    }
}

impl DrillError {
    /// Create a new error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        DrillError::Other(msg.into())
    }

    /// Whether the error aborts a run (everything except per-commit extraction failures)
    pub fn is_fatal(&self) -> bool {
        !matches!(self, DrillError::Extraction(_))
    }

    /// Check if this is a user error (bad or unsupported configuration) vs system error
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            DrillError::Config(
                ConfigError::InvalidValue { .. }
                    | ConfigError::Unsupported(_)
                    | ConfigError::MissingRequired(_)
            )
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DrillError::Config(ConfigError::Unsupported(
            "local repositories".to_string(),
        ));
        assert_eq!(
            err.to_string(),
            "Configuration error: Unsupported configuration: local repositories"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: DrillError = io_err.into();
        assert!(matches!(err, DrillError::Io(_)));
    }

    #[test]
    fn test_error_from_anyhow() {
        let anyhow_err = anyhow::anyhow!("test error");
        let err: DrillError = anyhow_err.into();
        assert!(matches!(err, DrillError::Other(_)));
    }

    #[test]
    fn test_extraction_error_is_not_fatal() {
        let err: DrillError = ExtractionError::TreeEnumeration {
            commit: "abc123".to_string(),
            reason: "missing object".to_string(),
        }
        .into();
        assert!(!err.is_fatal());

        let fatal: DrillError = WalkError::CommitFailed("corrupt".to_string()).into();
        assert!(fatal.is_fatal());
        assert!(DrillError::Cancelled.is_fatal());
    }

    #[test]
    fn test_is_user_error() {
        let user_err = DrillError::Config(ConfigError::InvalidValue {
            key: "extraction.hash_length".to_string(),
            reason: "too short".to_string(),
        });
        assert!(user_err.is_user_error());

        let system_err: DrillError = AcquisitionError::HeadUnresolved("empty".to_string()).into();
        assert!(!system_err.is_user_error());
    }

    #[test]
    fn test_acquisition_error_clone_failed() {
        let err = AcquisitionError::CloneFailed {
            url: "https://example.com/repo.git".to_string(),
            reason: "network unreachable".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to clone 'https://example.com/repo.git': network unreachable"
        );
    }

    #[test]
    fn test_export_error_writer_failed() {
        let err: DrillError = ExportError::WriterFailed {
            target: "data/commit-vertices.parquet".to_string(),
            reason: "permission denied".to_string(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Export failed: Failed to create writer for 'data/commit-vertices.parquet': permission denied"
        );
    }

    #[test]
    fn test_content_copy_error_display() {
        let err = ExtractionError::ContentCopy {
            commit: "abc123".to_string(),
            object: "def456".to_string(),
            reason: "disk full".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to copy object def456 of commit abc123: disk full"
        );
    }

    #[test]
    fn test_git_error_from_git2_not_found() {
        let git_err = git2::Error::new(
            git2::ErrorCode::NotFound,
            git2::ErrorClass::Odb,
            "object missing",
        );
        let err: GitError = git_err.into();
        assert!(matches!(err, GitError::ObjectNotFound(_)));
    }

    #[test]
    fn test_drill_error_other() {
        let err = DrillError::other("custom error message");
        assert_eq!(err.to_string(), "custom error message");
    }
}
