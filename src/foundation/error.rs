use std::path::PathBuf;

/// Convenience result type used across Tessera.
pub type TesseraResult<T> = Result<T, TesseraError>;

/// Top-level error taxonomy used by engine APIs.
///
/// Every variant is recoverable at the call site: batch operations record the failure for the
/// affected fragment and keep going.
#[derive(thiserror::Error, Debug)]
pub enum TesseraError {
    /// Mask polygon (or its scale) collapses to a zero-area region.
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),

    /// Source image is missing, corrupt, or unreadable.
    #[error("source unavailable '{}': {reason}", path.display())]
    SourceUnavailable {
        /// Path of the source image as requested.
        path: PathBuf,
        /// Human readable cause.
        reason: String,
    },

    /// Resampling filter configuration was rejected.
    #[error("invalid filter parameters: {0}")]
    InvalidFilterParameters(String),

    /// Invalid user-provided configuration or project data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors when serializing or deserializing project data.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TesseraError {
    /// Build a [`TesseraError::DegenerateGeometry`] value.
    pub fn degenerate(msg: impl Into<String>) -> Self {
        Self::DegenerateGeometry(msg.into())
    }

    /// Build a [`TesseraError::SourceUnavailable`] value.
    pub fn source_unavailable(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Build a [`TesseraError::InvalidFilterParameters`] value.
    pub fn invalid_filter(msg: impl Into<String>) -> Self {
        Self::InvalidFilterParameters(msg.into())
    }

    /// Build a [`TesseraError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`TesseraError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// `true` for errors that mean "no fragment produced" rather than bad configuration.
    pub fn is_skippable(&self) -> bool {
        matches!(
            self,
            Self::DegenerateGeometry(_) | Self::SourceUnavailable { .. }
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
