//! Structured logging field names for FormLab.
//!
//! Every name here is emitted by at least one `tracing` call site, so log
//! aggregation can query the same field across the API and the pipeline.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events (startup, job start/finish) |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-item iteration (frames, feedback items) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Correlation ID of the HTTP request. Format: UUIDv7.
pub const REQUEST_ID: &str = "request_id";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Job identifier being processed.
pub const JOB_ID: &str = "job_id";

/// Result identifier written for a completed job.
pub const RESULT_ID: &str = "result_id";

/// Sport identifier.
pub const SPORT: &str = "sport";

/// Normalized movement identifier.
pub const MOVEMENT: &str = "movement";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Job progress checkpoint.
pub const PROGRESS: &str = "progress";

/// Number of pose frames delivered to the analyzers.
pub const FRAME_COUNT: &str = "frame_count";

/// Number of metrics produced.
pub const METRIC_COUNT: &str = "metric_count";

/// Number of feedback items after cleaning.
pub const FEEDBACK_COUNT: &str = "feedback_count";

/// Final overall score.
pub const OVERALL_SCORE: &str = "overall_score";

/// Number of admission slots in use.
pub const ACTIVE_SLOTS: &str = "active_slots";

// ─── Error fields ──────────────────────────────────────────────────────────

/// Error kind label.
pub const ERROR_KIND: &str = "error_kind";

/// Every field name defined above, for schema checks and log tooling.
pub const ALL_FIELDS: &[&str] = &[
    REQUEST_ID,
    JOB_ID,
    RESULT_ID,
    SPORT,
    MOVEMENT,
    DURATION_MS,
    PROGRESS,
    FRAME_COUNT,
    METRIC_COUNT,
    FEEDBACK_COUNT,
    OVERALL_SCORE,
    ACTIVE_SLOTS,
    ERROR_KIND,
];
