//! Error types for wakegate.
//!
//! The taxonomy mirrors the stages of the capture front-end so an operator
//! can tell a hardware fault from a configuration fault:
//! - [`WakegateError::Source`] is fatal and terminates the detection session.
//! - [`WakegateError::Extraction`] is transient; the detector skips the step.
//! - [`WakegateError::TemplateLoad`] / [`WakegateError::EmptyGallery`] are
//!   fatal at startup only.
//! - [`WakegateError::Capture`] is fatal to one recording session; partial
//!   audio is discarded and scanning resumes.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WakegateError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Audio source errors (fatal for the session)
    #[error("Audio device not found: {device}")]
    AudioDeviceNotFound { device: String },

    #[error("Audio source failed: {message}")]
    Source { message: String },

    // Sliding buffer contract violation
    #[error("Chunk size mismatch: expected {expected} samples, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    // Feature extraction errors (transient, skip-and-continue)
    #[error("Feature extraction failed: {message}")]
    Extraction { message: String },

    // Template gallery errors (fatal at startup)
    #[error("Failed to load reference template {path}: {message}")]
    TemplateLoad { path: String, message: String },

    #[error("No usable reference templates found in {dir}")]
    EmptyGallery { dir: String },

    // Recording errors (fatal to the current capture session)
    #[error("Utterance capture failed: {message}")]
    Capture { message: String },

    // Dispatch errors
    #[error("Dispatch failed: {message}")]
    Dispatch { message: String },

    // Operator abort
    #[error("Interrupted")]
    Interrupted,

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, WakegateError>;

impl WakegateError {
    /// Returns true if the error is recoverable within a detection iteration.
    ///
    /// Only extraction failures qualify; everything else escapes its loop.
    pub fn is_transient(&self) -> bool {
        matches!(self, WakegateError::Extraction { .. })
    }
}
