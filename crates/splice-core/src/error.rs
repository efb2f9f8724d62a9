//! Error types and handling for shader preprocessing operations

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for splice operations
///
/// Resolution problems for individual imports are *not* errors: they are
/// reported as [`crate::resolve::Diagnostic`] values and degrade to warning
/// comments in the emitted text. This enum covers the faults that abort an
/// artifact or a tree edit.
#[derive(Debug, Error)]
pub enum SpliceError {
    /// Configuration loading or validation errors
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// File system I/O errors
    #[error("IO error for path '{path}': {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Two queued edits touch the same text
    #[error("Conflicting edits: {message}")]
    EditConflict { message: String },

    /// An edit or lookup addressed an offset outside the tree
    #[error("Offset {offset} is outside the text (length {len})")]
    OffsetOutOfRange { offset: u32, len: u32 },

    /// Defines were requested but there is nowhere safe to put them
    #[error("Cannot inject defines into '{source_name}': no leading version directive")]
    MissingVersionDirective { source_name: String },

    /// A cancellation signal was observed mid-run
    #[error("Preprocessing of '{resource}' was cancelled")]
    Cancelled { resource: String },

    /// The preprocessor reported a protocol-level fault
    #[error("Preprocessing failed for '{resource}': {diagnostics}")]
    PreprocessError {
        resource: String,
        diagnostics: String,
    },

    /// Generic internal errors
    #[error("Internal error: {message}")]
    InternalError { message: String },
}

/// Error kind enumeration for categorizing errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    Io,
    Edit,
    Defines,
    Cancelled,
    Preprocess,
    Internal,
}

impl SpliceError {
    /// Get the error kind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            SpliceError::ConfigError { .. } => ErrorKind::Config,
            SpliceError::IoError { .. } => ErrorKind::Io,
            SpliceError::EditConflict { .. } => ErrorKind::Edit,
            SpliceError::OffsetOutOfRange { .. } => ErrorKind::Edit,
            SpliceError::MissingVersionDirective { .. } => ErrorKind::Defines,
            SpliceError::Cancelled { .. } => ErrorKind::Cancelled,
            SpliceError::PreprocessError { .. } => ErrorKind::Preprocess,
            SpliceError::InternalError { .. } => ErrorKind::Internal,
        }
    }

    /// Check if this error is recoverable (can continue processing other files)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Io | ErrorKind::Preprocess | ErrorKind::Defines
        )
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create an IO error with path context
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::IoError {
            path: path.into(),
            source,
        }
    }

    /// Create an edit conflict error
    pub fn edit_conflict(message: impl Into<String>) -> Self {
        Self::EditConflict {
            message: message.into(),
        }
    }

    /// Create a missing version directive error
    pub fn missing_version_directive(source_name: impl Into<String>) -> Self {
        Self::MissingVersionDirective {
            source_name: source_name.into(),
        }
    }

    /// Create a cancellation error
    pub fn cancelled(resource: impl ToString) -> Self {
        Self::Cancelled {
            resource: resource.to_string(),
        }
    }

    /// Create a preprocessing error from joined diagnostic text
    pub fn preprocess_error(resource: impl ToString, diagnostics: impl Into<String>) -> Self {
        Self::PreprocessError {
            resource: resource.to_string(),
            diagnostics: diagnostics.into(),
        }
    }

    /// Create an internal error
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::InternalError {
            message: message.into(),
        }
    }
}

/// Convert from std::io::Error
impl From<std::io::Error> for SpliceError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError {
            path: PathBuf::new(),
            source: err,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(SpliceError::config_error("x").kind(), ErrorKind::Config);
        assert_eq!(SpliceError::edit_conflict("x").kind(), ErrorKind::Edit);
        assert_eq!(SpliceError::cancelled("ns:a").kind(), ErrorKind::Cancelled);
        assert_eq!(
            SpliceError::missing_version_directive("main.frag").kind(),
            ErrorKind::Defines
        );
    }

    #[test]
    fn test_recoverable() {
        assert!(SpliceError::preprocess_error("ns:a", "boom").is_recoverable());
        assert!(!SpliceError::config_error("bad").is_recoverable());
        assert!(!SpliceError::cancelled("ns:a").is_recoverable());
    }

    #[test]
    fn test_display_messages() {
        let err = SpliceError::missing_version_directive("main.frag");
        assert_eq!(
            err.to_string(),
            "Cannot inject defines into 'main.frag': no leading version directive"
        );

        let err = SpliceError::OffsetOutOfRange { offset: 12, len: 4 };
        assert_eq!(err.to_string(), "Offset 12 is outside the text (length 4)");
    }
}
