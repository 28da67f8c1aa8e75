//! Error types for the extraction pipeline.
//!
//! Every failure a request can hit is an [`ExtractError`]. Each variant
//! belongs to exactly one [`ErrorKind`], and all kinds are terminal for the
//! request: the front end shows one message from
//! [`ExtractError::user_message`] instead of a report.
//!
//! # Example
//!
//! ```rust
//! use tagratio_core::{ErrorKind, ExtractError};
//!
//! let err = ExtractError::UnsupportedScheme { scheme: "file".to_string() };
//! assert_eq!(err.kind(), ErrorKind::UnsupportedScheme);
//! assert!(err.user_message().contains("file"));
//! ```

use std::path::PathBuf;
use thiserror::Error;

use crate::engine::EngineMode;
use crate::result::ExtractionKind;

/// Coarse classification of an [`ExtractError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The URL scheme is outside the allowed set; nothing was fetched.
    UnsupportedScheme,
    /// Resolving, connecting to or reading from the source failed.
    FetchFailure,
    /// The engine could not be started, exited non-zero or timed out.
    EngineFailure,
    /// The engine output did not have the expected shape.
    ParseFailure,
}

/// Main error type for extraction requests.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// URL scheme not in `{http, https, ftp}`.
    ///
    /// Raised before any network access happens.
    #[error("Unsupported URL scheme: \"{scheme}\"")]
    UnsupportedScheme { scheme: String },

    /// The URL could not be parsed.
    #[error("Invalid URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },

    /// HTTP transport errors from reqwest.
    #[cfg(feature = "fetch")]
    #[error("Failed to fetch \"{url}\": {source}")]
    FetchFailure {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The fetch exceeded the configured timeout.
    #[error("Fetching \"{url}\" timed out after {timeout} seconds")]
    FetchTimeout { url: String, timeout: u64 },

    /// Local input file does not exist.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Reading local input failed.
    #[error("Failed to read input: {0}")]
    Io(#[from] std::io::Error),

    /// The engine could not be started or exited with a non-zero status.
    #[error("Extraction engine failed in {mode} mode: {reason}")]
    EngineFailure { mode: EngineMode, reason: String },

    /// The engine did not finish within the configured timeout and was killed.
    #[error("Extraction engine timed out after {timeout} seconds in {mode} mode")]
    EngineTimeout { mode: EngineMode, timeout: u64 },

    /// The engine output could not be parsed.
    #[error("Failed to parse {kind} engine output: {reason}")]
    ParseFailure { kind: ExtractionKind, reason: String },

    /// A parsed result could not be serialized to JSON.
    #[error("Failed to serialize result: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl ExtractError {
    /// Which of the four request-level failure kinds this error is.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedScheme { .. } => ErrorKind::UnsupportedScheme,
            Self::InvalidUrl { .. } | Self::FetchTimeout { .. } | Self::FileNotFound(_) | Self::Io(_) => {
                ErrorKind::FetchFailure
            }
            #[cfg(feature = "fetch")]
            Self::FetchFailure { .. } => ErrorKind::FetchFailure,
            Self::EngineFailure { .. } | Self::EngineTimeout { .. } => ErrorKind::EngineFailure,
            Self::ParseFailure { .. } | Self::Serialize(_) => ErrorKind::ParseFailure,
        }
    }

    /// Message safe to show to the requester.
    ///
    /// Names the failing input (URL, scheme or engine mode) but never the
    /// wrapped diagnostic; use `Display` for logs.
    pub fn user_message(&self) -> String {
        match self {
            Self::UnsupportedScheme { scheme } => format!("The URL scheme \"{scheme}\" is not supported."),
            Self::InvalidUrl { url, .. } | Self::FetchTimeout { url, .. } => {
                format!("Failed to download from the URL \"{url}\".")
            }
            #[cfg(feature = "fetch")]
            Self::FetchFailure { url, .. } => format!("Failed to download from the URL \"{url}\"."),
            Self::FileNotFound(_) | Self::Io(_) => "Failed to read the input document.".to_string(),
            Self::EngineFailure { mode, .. } | Self::EngineTimeout { mode, .. } => {
                format!("Failed to analyze the HTML ({mode}).")
            }
            Self::ParseFailure { kind, .. } => format!("Failed to read the {kind} extraction result."),
            Self::Serialize(_) => "Failed to format the extraction result.".to_string(),
        }
    }
}

/// Result type alias for ExtractError.
pub type Result<T> = std::result::Result<T, ExtractError>;
