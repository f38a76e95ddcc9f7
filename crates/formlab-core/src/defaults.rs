//! Centralized default constants for FormLab.
//!
//! Every crate reads its thresholds and limits from here instead of
//! defining its own magic numbers. Environment overrides are applied by the
//! `from_env()` constructors of the individual config structs.

// =============================================================================
// ADMISSION
// =============================================================================

/// Maximum number of analyses allowed to run at once.
pub const MAX_CONCURRENT_ANALYSES: usize = 3;

/// Seconds after which an admitted analysis is considered abandoned and its slot reclaimed.
pub const ADMISSION_STALE_AFTER_SECS: u64 = 30 * 60;

// =============================================================================
// SCORING
// =============================================================================

/// Score reported when no metrics were produced or the computation degenerated.
pub const SCORE_FALLBACK: f64 = 70.0;

/// Lowest score reported for real (if poor) pose data.
pub const SCORE_FLOOR: f64 = 40.0;

/// Highest possible score.
pub const SCORE_CEILING: f64 = 100.0;

/// Metric score at or above which no penalty applies.
pub const SCORE_BENCHMARK: f64 = 90.0;

/// Penalty multiplier for metrics flagged critical by a movement.
pub const CRITICAL_PENALTY_MULTIPLIER: f64 = 1.5;

/// Number of 50-59 scores that triggers the critical cap.
pub const MAX_CRITICAL_FAILURES: usize = 2;

/// Number of 60-74 scores that triggers the moderate cap.
pub const MAX_MODERATE_FAILURES: usize = 3;

/// Cap applied when any metric scores below [`CATASTROPHIC_BELOW`].
pub const CAP_CATASTROPHIC: f64 = 50.0;

/// Cap applied when critical failures reach [`MAX_CRITICAL_FAILURES`].
pub const CAP_CRITICAL: f64 = 60.0;

/// Cap applied when moderate failures reach [`MAX_MODERATE_FAILURES`].
pub const CAP_MODERATE: f64 = 65.0;

/// Metric scores below this are catastrophic failures.
pub const CATASTROPHIC_BELOW: f64 = 50.0;

/// Metric scores below this (and at or above catastrophic) are critical failures.
pub const CRITICAL_BELOW: f64 = 60.0;

/// Metric scores below this (and at or above critical) are moderate failures.
pub const MODERATE_BELOW: f64 = 75.0;

/// Metric scores at or above this are listed as strengths.
pub const STRENGTH_THRESHOLD: f64 = 80.0;

/// Metric scores below this are listed as weaknesses.
pub const WEAKNESS_THRESHOLD: f64 = 60.0;

// =============================================================================
// PIPELINE PROGRESS
// =============================================================================

/// Progress when the job enters processing.
pub const PROGRESS_STARTED: u8 = 10;

/// Progress once the video handle has been validated.
pub const PROGRESS_VIDEO_READY: u8 = 20;

/// Progress once the pose source is about to run.
pub const PROGRESS_POSE_STARTED: u8 = 30;

/// Progress once pose frames have been extracted.
pub const PROGRESS_POSE_EXTRACTED: u8 = 60;

/// Progress when metric extraction starts.
pub const PROGRESS_ANALYZING: u8 = 70;

/// Progress once scoring and feedback are done, before persistence.
pub const PROGRESS_SCORED: u8 = 90;

/// Progress of a completed job.
pub const PROGRESS_COMPLETE: u8 = 100;

// =============================================================================
// POSE SOURCE
// =============================================================================

/// Timeout for an external pose-estimation command.
pub const POSE_TIMEOUT_SECS: u64 = 300;

/// Message stored on a job whose video produced no pose data.
pub const NO_POSE_DATA_MESSAGE: &str =
    "No pose data detected. Make sure a person is clearly visible in the video.";

// =============================================================================
// ERRORS
// =============================================================================

/// Maximum length of a sanitized job error message.
pub const ERROR_MESSAGE_MAX_CHARS: usize = 200;

// =============================================================================
// EVENTS
// =============================================================================

/// Capacity of the pipeline event broadcast channel.
pub const EVENT_BUS_CAPACITY: usize = 256;

// =============================================================================
// SERVER
// =============================================================================

/// Default bind host.
pub const SERVER_HOST: &str = "0.0.0.0";

/// Default bind port.
pub const SERVER_PORT: u16 = 8000;

/// API route prefix.
pub const API_PREFIX: &str = "/api/v1";

/// Directory for uploaded videos.
pub const UPLOAD_DIR: &str = "uploads";

/// Directory for persisted analysis results.
pub const RESULTS_DIR: &str = "results";

/// Maximum accepted upload size in megabytes.
pub const MAX_UPLOAD_SIZE_MB: u64 = 100;

/// Accepted video file extensions.
pub const ALLOWED_VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "webm"];

/// Origins allowed by CORS when `CORS_ORIGINS` is unset.
pub const CORS_ORIGINS: &str = "http://localhost:3000,http://localhost:3001";
