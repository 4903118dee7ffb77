/// Convenience result type used across framecast.
pub type PlayerResult<T> = Result<T, PlayerError>;

/// Top-level error taxonomy for the playback pipeline.
///
/// Every setup stage fails fast with one of these; the controller delivers the failure to the
/// host's `on_error` callback or, when none is installed, logs it.
#[derive(thiserror::Error, Debug)]
pub enum PlayerError {
    /// The manifest could not be fetched, parsed, or validated.
    #[error("manifest error: {0}")]
    Manifest(String),

    /// A frame asset could not be fetched, found in the archive, or decoded.
    #[error("asset error: {0}")]
    Asset(String),

    /// The audio track failed to open, buffer, or start.
    #[error("audio error: {0}")]
    Audio(String),

    /// Invalid options or command-line input.
    #[error("validation error: {0}")]
    Validation(String),

    /// The session was disposed while a stage was still running.
    #[error("session cancelled")]
    Cancelled,

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PlayerError {
    /// Build a [`PlayerError::Manifest`] value.
    pub fn manifest(msg: impl Into<String>) -> Self {
        Self::Manifest(msg.into())
    }

    /// Build a [`PlayerError::Asset`] value.
    pub fn asset(msg: impl Into<String>) -> Self {
        Self::Asset(msg.into())
    }

    /// Build a [`PlayerError::Audio`] value.
    pub fn audio(msg: impl Into<String>) -> Self {
        Self::Audio(msg.into())
    }

    /// Build a [`PlayerError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Return `true` for the internal cancellation signal.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
