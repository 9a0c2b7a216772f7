//! Common error types for choromap-client
//!
//! Every network or parse failure is caught at the boundary that initiated
//! the call and converted into a terminal session state plus a user-visible
//! message; nothing propagates as a panic. No automatic retries anywhere.

use thiserror::Error;

/// Common result type for choromap-client operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy for the session/data core
#[derive(Error, Debug)]
pub enum Error {
    /// Submission rejected, either by local file-count policy or by the server
    #[error("Upload error: {0}")]
    Upload(String),

    /// Transport fault on the live progress channel
    #[error("Progress channel error: {0}")]
    Channel(String),

    /// Upstream analysis pipeline explicitly reported failure
    #[error("Analysis pipeline reported failure")]
    Pipeline,

    /// Malformed delimited result table
    #[error("Result table parse error: {0}")]
    Parse(String),

    /// Result table is well-formed but has no recognized location column
    #[error("Result table schema error: {0}")]
    Schema(String),

    /// Rehydration failed, typically because server-side results were purged
    #[error("Session expired: {0}")]
    ExpiredSession(String),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Which fault class put a session into its `Failed` state.
///
/// Kept separate from [`Error`] so a `Session` can carry a small, cloneable
/// failure tag while the full error (with its message) is surfaced to the
/// caller at the boundary that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Submission rejected or file-count policy violated
    Upload,
    /// Transport fault on the push channel; progress keeps last known values
    Channel,
    /// Pipeline reported failure; summary may still be shown
    Pipeline,
    /// Malformed table from an otherwise successful run
    Parse,
    /// Rehydration failed (server-side data purged or never existed)
    Expired,
}

impl FailureKind {
    /// User-facing explanation for this failure class.
    ///
    /// `Expired` is deliberately worded differently from generic failures so
    /// a user following a stale shared link understands what happened.
    pub fn user_message(&self) -> &'static str {
        match self {
            FailureKind::Upload => "Error uploading file(s)",
            FailureKind::Channel => "Error receiving updates",
            FailureKind::Pipeline => {
                "Image uploaded is not a valid choropleth map image. Please upload a valid image."
            }
            FailureKind::Parse => "Error reading analysis results",
            FailureKind::Expired => {
                "Your data may have been deleted from our servers due to being uploaded a long time ago, or something went wrong!"
            }
        }
    }
}

impl From<&Error> for FailureKind {
    fn from(err: &Error) -> Self {
        match err {
            Error::Upload(_) => FailureKind::Upload,
            Error::Channel(_) => FailureKind::Channel,
            Error::Pipeline => FailureKind::Pipeline,
            Error::Parse(_) | Error::Schema(_) => FailureKind::Parse,
            Error::ExpiredSession(_) => FailureKind::Expired,
            // Config/IO faults surface before a session exists; treat as upload-side
            Error::Config(_) | Error::Io(_) => FailureKind::Upload,
        }
    }
}
