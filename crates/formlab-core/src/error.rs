//! Error types for FormLab.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::defaults;

/// Result type alias using FormLab's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for FormLab operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// No analyzer exists for the requested sport/movement combination
    #[error("Unsupported movement '{movement}' for sport '{sport}'")]
    UnsupportedMovement { sport: String, movement: String },

    /// Illegal job lifecycle transition
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    /// Pose source returned no usable frames
    #[error("No pose data detected")]
    NoPoseData,

    /// Video could not be opened or decoded
    #[error("Unreadable video: {0}")]
    UnreadableVideo(String),

    /// A metric extractor failed or panicked
    #[error("Extractor error: {0}")]
    Extractor(String),

    /// Job or result persistence failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl Error {
    /// Classify this error for the job record.
    pub fn kind(&self) -> JobErrorKind {
        match self {
            Error::NoPoseData => JobErrorKind::NoPoseData,
            Error::UnreadableVideo(_) => JobErrorKind::UnreadableVideo,
            Error::Extractor(_) => JobErrorKind::ExtractorFailure,
            Error::Storage(_) | Error::Io(_) | Error::Serialization(_) => {
                JobErrorKind::StorageFailure
            }
            _ => JobErrorKind::Internal,
        }
    }

    /// Short user-facing description without the variant prefix.
    fn description(&self) -> String {
        match self {
            Error::NoPoseData => defaults::NO_POSE_DATA_MESSAGE.to_string(),
            Error::UnreadableVideo(msg) | Error::Extractor(msg) | Error::Storage(msg) => {
                msg.clone()
            }
            other => other.to_string(),
        }
    }

    /// Render the sanitized message stored on a failed job.
    pub fn job_message(&self) -> String {
        sanitize_message(self.kind(), &self.description())
    }
}

/// Classification of a failed analysis, stored alongside the job's error message.
///
/// `AtCapacity` is never stored on a job: it labels an admission rejection
/// returned to the submitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobErrorKind {
    AtCapacity,
    NoPoseData,
    UnreadableVideo,
    ExtractorFailure,
    StorageFailure,
    Internal,
}

impl JobErrorKind {
    /// Stable label used as the prefix of sanitized messages.
    pub fn label(&self) -> &'static str {
        match self {
            JobErrorKind::AtCapacity => "at_capacity",
            JobErrorKind::NoPoseData => "no_pose_data",
            JobErrorKind::UnreadableVideo => "unreadable_video",
            JobErrorKind::ExtractorFailure => "extractor_failure",
            JobErrorKind::StorageFailure => "storage_failure",
            JobErrorKind::Internal => "internal",
        }
    }
}

impl std::fmt::Display for JobErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Absolute paths with at least two segments, any path ending in a file name
/// (`x.pose.json` included), or a bare root file such as `/clip.mp4`.
static PATH_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?:[A-Za-z]:)?(?:[\\/][\w.\-]+){2,}",
        r"|\b[\w.\-]+(?:[\\/][\w.\-]+)*[\\/][\w\-]+(?:\.[\w\-]+)*\.[A-Za-z0-9]{2,4}\b",
        r"|(?:[A-Za-z]:)?[\\/][\w\-]+(?:\.[\w\-]+)*\.[A-Za-z0-9]{2,4}\b",
    ))
    .unwrap()
});

/// Build a job error message of the form `"<kind label>: <short description>"`.
///
/// Only the first line of `detail` is kept, file paths are replaced with
/// `<path>`, and the result is bounded to [`defaults::ERROR_MESSAGE_MAX_CHARS`].
pub fn sanitize_message(kind: JobErrorKind, detail: &str) -> String {
    let first_line = detail
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("");

    let scrubbed = PATH_PATTERN.replace_all(first_line, "<path>");
    let description = if scrubbed.is_empty() {
        "unexpected failure".to_string()
    } else {
        scrubbed.into_owned()
    };

    let message = format!("{}: {}", kind.label(), description);
    if message.chars().count() <= defaults::ERROR_MESSAGE_MAX_CHARS {
        return message;
    }

    debug!(
        error_kind = kind.label(),
        length = message.chars().count(),
        "Truncating job error message"
    );
    let mut truncated: String = message
        .chars()
        .take(defaults::ERROR_MESSAGE_MAX_CHARS.saturating_sub(3))
        .collect();
    truncated.push_str("...");
    truncated
}
