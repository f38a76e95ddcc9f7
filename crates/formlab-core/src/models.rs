//! Data models for jobs, metrics, feedback, and analysis results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::defaults;
use crate::error::{Error, JobErrorKind, Result};

// =============================================================================
// JOB
// =============================================================================

/// Opaque job identifier. Generated identifiers are UUIDv7 strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Generate a new time-ordered identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Job lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Error,
}

impl JobStatus {
    /// Whether no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Error)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Error => "error",
        }
    }
}

/// Lifecycle record for one submitted video.
///
/// Fields are only changed through the transition methods, which enforce
/// `queued -> processing -> {completed, error}`, monotone progress, and the
/// presence of `result_id`/`error_message` in the terminal states.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    id: JobId,
    sport: String,
    movement: String,
    status: JobStatus,
    progress: u8,
    result_id: Option<String>,
    error_message: Option<String>,
    error_kind: Option<JobErrorKind>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Job {
    /// Create a queued job.
    pub fn new(id: JobId, sport: impl Into<String>, movement: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            sport: sport.into(),
            movement: movement.into(),
            status: JobStatus::Queued,
            progress: 0,
            result_id: None,
            error_message: None,
            error_kind: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> &JobId {
        &self.id
    }

    pub fn sport(&self) -> &str {
        &self.sport
    }

    pub fn movement(&self) -> &str {
        &self.movement
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn result_id(&self) -> Option<&str> {
        self.result_id.as_deref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn error_kind(&self) -> Option<JobErrorKind> {
        self.error_kind
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn illegal(&self, to: JobStatus) -> Error {
        Error::InvalidTransition(format!(
            "job {} cannot move from {} to {}",
            self.id,
            self.status.as_str(),
            to.as_str()
        ))
    }

    /// `queued -> processing`.
    pub fn start(&mut self) -> Result<()> {
        if self.status != JobStatus::Queued {
            return Err(self.illegal(JobStatus::Processing));
        }
        self.status = JobStatus::Processing;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Record a progress checkpoint while processing.
    ///
    /// The value is clamped to `[0, 100]` and never lowers the current
    /// progress. Returns the progress now stored.
    pub fn advance(&mut self, percent: i32) -> Result<u8> {
        if self.status != JobStatus::Processing {
            return Err(Error::InvalidTransition(format!(
                "job {} is {}, progress only moves while processing",
                self.id,
                self.status.as_str()
            )));
        }
        let clamped = percent.clamp(0, defaults::PROGRESS_COMPLETE as i32) as u8;
        if clamped > self.progress {
            self.progress = clamped;
            self.updated_at = Utc::now();
        }
        Ok(self.progress)
    }

    /// `processing -> completed`, attaching the result identifier.
    pub fn complete(&mut self, result_id: impl Into<String>) -> Result<()> {
        if self.status != JobStatus::Processing {
            return Err(self.illegal(JobStatus::Completed));
        }
        let result_id = result_id.into();
        if result_id.is_empty() {
            return Err(Error::InvalidInput(
                "completed job requires a result id".to_string(),
            ));
        }
        self.status = JobStatus::Completed;
        self.progress = defaults::PROGRESS_COMPLETE;
        self.result_id = Some(result_id);
        self.updated_at = Utc::now();
        Ok(())
    }

    /// `queued | processing -> error`.
    ///
    /// An empty message is replaced by the kind label so a failed job always
    /// carries a message.
    pub fn fail(&mut self, kind: JobErrorKind, message: impl Into<String>) -> Result<()> {
        if self.status.is_terminal() {
            return Err(self.illegal(JobStatus::Error));
        }
        let message = message.into();
        self.status = JobStatus::Error;
        self.error_message = Some(if message.trim().is_empty() {
            kind.label().to_string()
        } else {
            message
        });
        self.error_kind = Some(kind);
        self.updated_at = Utc::now();
        Ok(())
    }
}

// =============================================================================
// METRICS
// =============================================================================

/// One named 0-100 measurement of a biomechanical aspect of a movement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricScore {
    pub name: String,
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl MetricScore {
    /// Create a metric, clamping finite scores to `[0, 100]` and rounding to two decimals.
    ///
    /// Non-finite scores are kept as-is so the scoring engine can detect them.
    pub fn new(name: impl Into<String>, score: f64) -> Self {
        let score = if score.is_finite() {
            round2(score.clamp(0.0, defaults::SCORE_CEILING))
        } else {
            score
        };
        Self {
            name: name.into(),
            score,
            value: None,
            unit: None,
        }
    }

    /// Attach the raw measured value.
    pub fn with_value(mut self, value: f64) -> Self {
        self.value = Some(round2(value));
        self
    }

    /// Attach the unit of the raw value.
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }
}

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// =============================================================================
// FEEDBACK
// =============================================================================

/// Severity of a feedback item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackLevel {
    Info,
    Warning,
    Critical,
    Error,
}

impl FeedbackLevel {
    /// Sort key: lower is more severe.
    pub fn priority(&self) -> u8 {
        match self {
            FeedbackLevel::Critical | FeedbackLevel::Error => 0,
            FeedbackLevel::Warning => 1,
            FeedbackLevel::Info => 2,
        }
    }
}

/// Structured corrective advice.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Coaching {
    pub observation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drill: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cue: Option<String>,
}

impl Coaching {
    pub fn new(observation: impl Into<String>) -> Self {
        Self {
            observation: observation.into(),
            ..Self::default()
        }
    }

    pub fn impact(mut self, impact: impl Into<String>) -> Self {
        self.impact = Some(impact.into());
        self
    }

    pub fn step(mut self, step: impl Into<String>) -> Self {
        self.steps.push(step.into());
        self
    }

    pub fn drill(mut self, drill: impl Into<String>) -> Self {
        self.drill = Some(drill.into());
        self
    }

    pub fn cue(mut self, cue: impl Into<String>) -> Self {
        self.cue = Some(cue.into());
        self
    }
}

/// Payload of a feedback item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedbackContent {
    /// A single free-text message.
    Message { text: String },
    /// Observation, impact, corrective steps, drill and cue.
    Coaching(Coaching),
    /// Reinforcement of something done well.
    Positive {
        what_went_well: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cue: Option<String>,
    },
}

/// One piece of coaching feedback, optionally tied to a metric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackItem {
    pub level: FeedbackLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric: Option<String>,
    pub content: FeedbackContent,
}

impl FeedbackItem {
    /// Free-text feedback.
    pub fn message(level: FeedbackLevel, metric: Option<&str>, text: impl Into<String>) -> Self {
        Self {
            level,
            metric: metric.map(String::from),
            content: FeedbackContent::Message { text: text.into() },
        }
    }

    /// Structured corrective feedback for a metric.
    pub fn coaching(level: FeedbackLevel, metric: &str, coaching: Coaching) -> Self {
        Self {
            level,
            metric: Some(metric.to_string()),
            content: FeedbackContent::Coaching(coaching),
        }
    }

    /// Positive reinforcement for a metric, always at info level.
    pub fn positive(metric: &str, what_went_well: impl Into<String>, cue: Option<&str>) -> Self {
        Self {
            level: FeedbackLevel::Info,
            metric: Some(metric.to_string()),
            content: FeedbackContent::Positive {
                what_went_well: what_went_well.into(),
                cue: cue.map(String::from),
            },
        }
    }

    /// The metric name, or `""` when the item has none.
    pub fn metric_name(&self) -> &str {
        self.metric.as_deref().unwrap_or("")
    }

    /// The leading text a reader sees first.
    pub fn primary_text(&self) -> &str {
        match &self.content {
            FeedbackContent::Message { text } => text,
            FeedbackContent::Coaching(c) => &c.observation,
            FeedbackContent::Positive { what_went_well, .. } => what_went_well,
        }
    }

    /// Every text field joined with spaces, for pattern checks.
    pub fn rendered_text(&self) -> String {
        match &self.content {
            FeedbackContent::Message { text } => text.clone(),
            FeedbackContent::Coaching(c) => {
                let mut parts: Vec<&str> = vec![c.observation.as_str()];
                parts.extend(c.impact.as_deref());
                parts.extend(c.steps.iter().map(String::as_str));
                parts.extend(c.drill.as_deref());
                parts.extend(c.cue.as_deref());
                parts.join(" ")
            }
            FeedbackContent::Positive {
                what_went_well,
                cue,
            } => match cue {
                Some(cue) => format!("{} {}", what_went_well, cue),
                None => what_went_well.clone(),
            },
        }
    }
}

// =============================================================================
// RESULTS
// =============================================================================

/// How the overall score was reached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub score: f64,
    pub penalty_total: f64,
    pub catastrophic_failures: usize,
    pub critical_failures: usize,
    pub moderate_failures: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applied_cap: Option<f64>,
    pub used_fallback: bool,
}

/// Final scored, feedback-annotated analysis of one completed job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub id: String,
    pub job_id: JobId,
    pub sport: String,
    pub movement: String,
    pub overall_score: f64,
    pub metrics: Vec<MetricScore>,
    pub feedback: Vec<FeedbackItem>,
    /// Metric names scoring at or above the strength threshold.
    pub strengths: Vec<String>,
    /// Metric names scoring below the weakness threshold.
    pub weaknesses: Vec<String>,
    /// Number-free descriptions of the strengths.
    pub strength_notes: Vec<String>,
    /// Number-free descriptions of the weaknesses.
    pub improvement_notes: Vec<String>,
    pub score_breakdown: ScoreBreakdown,
    pub metadata: JsonValue,
    pub frames_analyzed: usize,
    pub processing_ms: u64,
    pub analyzed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn processing_job() -> Job {
        let mut job = Job::new(JobId::from("job-1"), "basketball", "free_throw");
        job.start().unwrap();
        job
    }

    // =========================================================================
    // Job transitions
    // =========================================================================

    #[test]
    fn test_new_job_is_queued() {
        let job = Job::new(JobId::generate(), "golf", "driver_swing");
        assert_eq!(job.status(), JobStatus::Queued);
        assert_eq!(job.progress(), 0);
        assert!(job.result_id().is_none());
        assert!(job.error_message().is_none());
    }

    #[test]
    fn test_generated_ids_are_unique() {
        assert_ne!(JobId::generate(), JobId::generate());
    }

    #[test]
    fn test_start_only_from_queued() {
        let mut job = processing_job();
        assert_eq!(job.status(), JobStatus::Processing);
        assert!(matches!(job.start(), Err(Error::InvalidTransition(_))));
    }

    #[test]
    fn test_advance_requires_processing() {
        let mut job = Job::new(JobId::from("j"), "golf", "chip_shot");
        assert!(job.advance(10).is_err());
    }

    #[test]
    fn test_progress_never_decreases() {
        let mut job = processing_job();
        assert_eq!(job.advance(30).unwrap(), 30);
        assert_eq!(job.advance(20).unwrap(), 30);
        assert_eq!(job.advance(60).unwrap(), 60);
    }

    #[test]
    fn test_progress_is_clamped() {
        let mut job = processing_job();
        assert_eq!(job.advance(-5).unwrap(), 0);
        assert_eq!(job.advance(250).unwrap(), 100);
    }

    #[test]
    fn test_complete_sets_result_and_full_progress() {
        let mut job = processing_job();
        job.advance(70).unwrap();
        job.complete("result-1").unwrap();
        assert_eq!(job.status(), JobStatus::Completed);
        assert_eq!(job.result_id(), Some("result-1"));
        assert_eq!(job.progress(), 100);
    }

    #[test]
    fn test_complete_requires_result_id() {
        let mut job = processing_job();
        assert!(job.complete("").is_err());
        assert_eq!(job.status(), JobStatus::Processing);
    }

    #[test]
    fn test_complete_from_queued_rejected() {
        let mut job = Job::new(JobId::from("j"), "golf", "chip_shot");
        assert!(job.complete("r").is_err());
    }

    #[test]
    fn test_fail_always_carries_message() {
        let mut job = processing_job();
        job.fail(JobErrorKind::Internal, "  ").unwrap();
        assert_eq!(job.status(), JobStatus::Error);
        assert_eq!(job.error_message(), Some("internal"));
        assert_eq!(job.error_kind(), Some(JobErrorKind::Internal));
    }

    #[test]
    fn test_fail_from_queued_allowed() {
        let mut job = Job::new(JobId::from("j"), "golf", "chip_shot");
        job.fail(JobErrorKind::NoPoseData, "no pose").unwrap();
        assert_eq!(job.status(), JobStatus::Error);
    }

    #[test]
    fn test_terminal_states_are_final() {
        let mut done = processing_job();
        done.complete("r").unwrap();
        assert!(done.fail(JobErrorKind::Internal, "late").is_err());
        assert!(done.advance(50).is_err());
        assert!(done.start().is_err());

        let mut failed = processing_job();
        failed.fail(JobErrorKind::Internal, "boom").unwrap();
        assert!(failed.complete("r").is_err());
        assert!(failed.fail(JobErrorKind::Internal, "again").is_err());
        assert_eq!(failed.error_message(), Some("boom"));
    }

    #[test]
    fn test_job_status_serializes_lowercase() {
        let job = processing_job();
        let json = serde_json::to_value(&job).unwrap();
        assert_eq!(json["status"], "processing");
        assert_eq!(json["id"], "job-1");
    }

    // =========================================================================
    // Metrics and feedback
    // =========================================================================

    #[test]
    fn test_metric_score_is_clamped() {
        assert_eq!(MetricScore::new("a", 130.0).score, 100.0);
        assert_eq!(MetricScore::new("a", -4.0).score, 0.0);
        assert_eq!(MetricScore::new("a", 72.456).score, 72.46);
    }

    #[test]
    fn test_metric_score_keeps_non_finite() {
        assert!(MetricScore::new("a", f64::NAN).score.is_nan());
    }

    #[test]
    fn test_feedback_priority_order() {
        assert!(FeedbackLevel::Critical.priority() < FeedbackLevel::Warning.priority());
        assert_eq!(
            FeedbackLevel::Critical.priority(),
            FeedbackLevel::Error.priority()
        );
        assert!(FeedbackLevel::Warning.priority() < FeedbackLevel::Info.priority());
    }

    #[test]
    fn test_coaching_rendered_text_includes_all_fields() {
        let item = FeedbackItem::coaching(
            FeedbackLevel::Warning,
            "knee_bend",
            Coaching::new("Knees too straight")
                .impact("Less power")
                .step("Sit lower")
                .drill("Wall sits")
                .cue("Load the legs"),
        );
        assert_eq!(item.primary_text(), "Knees too straight");
        let text = item.rendered_text();
        for part in ["Knees too straight", "Less power", "Sit lower", "Wall sits", "Load the legs"] {
            assert!(text.contains(part));
        }
    }

    #[test]
    fn test_feedback_content_is_tagged() {
        let item = FeedbackItem::positive("tempo", "Smooth tempo", Some("Stay smooth"));
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["content"]["type"], "positive");
        assert_eq!(json["level"], "info");
        assert_eq!(json["metric"], "tempo");
    }
}
