use std::path::Path;
use thiserror::Error;

/// Result type alias using IfnsError
pub type Result<T> = std::result::Result<T, IfnsError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code that can be used for programmatic
/// error handling, testing, and CI log scraping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Structural/Validation
    InvalidInput,
    InvalidConfig,
    NotFound,

    // Manifest parsing
    /// Manifest bytes are not valid UTF-8 JSON, or a field has the wrong shape
    InvalidManifest,
    /// A field required by the requested operation is absent from the manifest
    MissingField,
    /// The same feature identifier appears more than once in `columns`
    DuplicateColumn,

    // QC inputs
    InvalidGlob,
    InvalidDate,

    // Integration/IO
    Io,
    Serialization,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::InvalidConfig => "ERR_INVALID_CONFIG",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::InvalidManifest => "ERR_INVALID_MANIFEST",
            ExErrorKind::MissingField => "ERR_MISSING_FIELD",
            ExErrorKind::DuplicateColumn => "ERR_DUPLICATE_COLUMN",
            ExErrorKind::InvalidGlob => "ERR_INVALID_GLOB",
            ExErrorKind::InvalidDate => "ERR_INVALID_DATE",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Carries a classification kind for programmatic handling plus optional
/// context (operation, path, entity) for operators reading CI logs.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    path: Option<String>,
    entity_id: Option<String>,
    message: String,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            path: None,
            entity_id: None,
            message: String::new(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add file path context
    pub fn with_path(mut self, path: impl AsRef<Path>) -> Self {
        self.path = Some(path.as_ref().display().to_string());
        self
    }

    /// Add entity ID context (usually a feature identifier)
    pub fn with_entity_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the path context, if any
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Get the entity ID context, if any
    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(path) = &self.path {
            write!(f, " (path: {})", path)?;
        }
        if let Some(entity_id) = &self.entity_id {
            write!(f, " (feature_id: {})", entity_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {}

// ========== End Error Facility ==========

/// Domain error taxonomy for the QC and lint layers
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IfnsError {
    /// Input file does not exist
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    /// Reading or writing a file failed
    #[error("I/O error on {path}: {message}")]
    Io { path: String, message: String },

    /// Manifest could not be parsed
    #[error("Invalid manifest {path}: {message}")]
    InvalidManifest { path: String, message: String },

    /// Manifest lacks a field the operation needs
    #[error("Manifest field missing: {field}")]
    MissingManifestField { field: String },

    /// Calendar file could not be parsed
    #[error("Invalid calendar {path}: {message}")]
    InvalidCalendar { path: String, message: String },

    /// Glob pattern failed to compile
    #[error("Invalid glob pattern {pattern:?}: {message}")]
    InvalidGlob { pattern: String, message: String },

    /// Date string is not `YYYY-MM-DD`
    #[error("Invalid date {value:?}: expected YYYY-MM-DD")]
    InvalidDate { value: String },

    /// CSV decoding or encoding failed
    #[error("CSV error: {message}")]
    Csv { message: String },

    /// Serialization error (JSON encoding/decoding)
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Run configuration failed validation
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl IfnsError {
    /// Build an `Io` error from a path and an `std::io::Error`.
    ///
    /// `NotFound` becomes [`IfnsError::FileNotFound`].
    pub fn io(path: impl AsRef<Path>, err: std::io::Error) -> Self {
        let path = path.as_ref().display().to_string();
        if err.kind() == std::io::ErrorKind::NotFound {
            IfnsError::FileNotFound { path }
        } else {
            IfnsError::Io {
                path,
                message: err.to_string(),
            }
        }
    }
}

/// Conversion from IfnsError to ExError
impl From<IfnsError> for ExError {
    fn from(err: IfnsError) -> Self {
        match err {
            IfnsError::FileNotFound { path } => ExError::new(ExErrorKind::NotFound)
                .with_path(&path)
                .with_message("file not found"),
            IfnsError::Io { path, message } => ExError::new(ExErrorKind::Io)
                .with_path(&path)
                .with_message(message),
            IfnsError::InvalidManifest { path, message } => {
                ExError::new(ExErrorKind::InvalidManifest)
                    .with_path(&path)
                    .with_message(message)
            }
            IfnsError::MissingManifestField { field } => ExError::new(ExErrorKind::MissingField)
                .with_message(format!("required field `{}` is absent", field)),
            IfnsError::InvalidCalendar { path, message } => {
                ExError::new(ExErrorKind::InvalidInput)
                    .with_path(&path)
                    .with_message(format!("invalid calendar: {}", message))
            }
            IfnsError::InvalidGlob { pattern, message } => ExError::new(ExErrorKind::InvalidGlob)
                .with_message(format!("{:?}: {}", pattern, message)),
            IfnsError::InvalidDate { value } => ExError::new(ExErrorKind::InvalidDate)
                .with_message(format!("expected YYYY-MM-DD, got {:?}", value)),
            IfnsError::Csv { message } => {
                ExError::new(ExErrorKind::Serialization).with_message(message)
            }
            IfnsError::Serialization { message } => {
                ExError::new(ExErrorKind::Serialization).with_message(message)
            }
            IfnsError::InvalidConfig { reason } => {
                ExError::new(ExErrorKind::InvalidConfig).with_message(reason)
            }
        }
    }
}

/// Conversion from serde_json::Error to IfnsError
impl From<serde_json::Error> for IfnsError {
    fn from(err: serde_json::Error) -> Self {
        IfnsError::Serialization {
            message: err.to_string(),
        }
    }
}

/// Conversion from csv::Error to IfnsError
impl From<csv::Error> for IfnsError {
    fn from(err: csv::Error) -> Self {
        IfnsError::Csv {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_codes() {
        let cases = [
            (ExErrorKind::InvalidManifest, "ERR_INVALID_MANIFEST"),
            (ExErrorKind::MissingField, "ERR_MISSING_FIELD"),
            (ExErrorKind::DuplicateColumn, "ERR_DUPLICATE_COLUMN"),
            (ExErrorKind::NotFound, "ERR_NOT_FOUND"),
            (ExErrorKind::InvalidConfig, "ERR_INVALID_CONFIG"),
            (ExErrorKind::InvalidDate, "ERR_INVALID_DATE"),
        ];
        for (kind, expected_code) in cases {
            assert_eq!(kind.code(), expected_code, "Wrong code for {:?}", kind);
        }
    }

    #[test]
    fn test_display_includes_context() {
        let err = ExError::new(ExErrorKind::DuplicateColumn)
            .with_op("load_manifest")
            .with_path("manifests/a.json")
            .with_entity_id("FEAT.RSI14")
            .with_message("column listed twice");
        let s = err.to_string();
        assert!(s.starts_with("[ERR_DUPLICATE_COLUMN]"));
        assert!(s.contains("load_manifest"));
        assert!(s.contains("manifests/a.json"));
        assert!(s.contains("FEAT.RSI14"));
    }

    #[test]
    fn test_io_not_found_maps_to_file_not_found() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = IfnsError::io("missing.csv", io);
        assert_eq!(
            err,
            IfnsError::FileNotFound {
                path: "missing.csv".to_string()
            }
        );
        let ex: ExError = err.into();
        assert_eq!(ex.kind(), ExErrorKind::NotFound);
        assert_eq!(ex.path(), Some("missing.csv"));
    }

    #[test]
    fn test_serde_json_error_converts() {
        let err: IfnsError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, IfnsError::Serialization { .. }));
        let ex: ExError = err.into();
        assert_eq!(ex.code(), "ERR_SERIALIZATION");
    }
}
