//! Analysis pipeline driver.
//!
//! [`AnalysisPipeline::submit`] validates the request, records a queued job,
//! takes an admission slot and spawns one tokio task per job. The task walks
//! the job through its progress milestones:
//!
//! | Progress | Step |
//! |----------|------|
//! | 10 | job started |
//! | 20 | video handle validated |
//! | 30 | pose source running |
//! | 60 | pose frames extracted |
//! | 70 | metric extraction running |
//! | 90 | scored and cleaned, persisting |
//! | 100 | completed |
//!
//! Every failure inside the task, panics included, ends as an `error`
//! transition on the job. The admission slot is released when the task ends.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use formlab_analysis::{Assessor, Movement, ScoringConfig, ScoringEngine};
use formlab_core::{
    defaults, AnalysisResult, Error, Job, JobErrorKind, JobId, PoseFrame, Result,
};

use crate::admission::{AdmissionConfig, AdmissionController, AdmissionSlot, Rejection};
use crate::pose::PoseSource;
use crate::store::{
    InMemoryJobStore, InMemoryResultStore, JobRepository, JobUpdate, ResultRepository,
};

/// Configuration for the analysis pipeline.
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub admission: AdmissionConfig,
    pub scoring: ScoringConfig,
}

impl PipelineConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// See [`AdmissionConfig::from_env`] and [`ScoringConfig::from_env`].
    pub fn from_env() -> Self {
        Self {
            admission: AdmissionConfig::from_env(),
            scoring: ScoringConfig::from_env(),
        }
    }

    pub fn with_admission(mut self, admission: AdmissionConfig) -> Self {
        self.admission = admission;
        self
    }

    pub fn with_scoring(mut self, scoring: ScoringConfig) -> Self {
        self.scoring = scoring;
        self
    }
}

/// Events emitted as jobs move through the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PipelineEvent {
    /// A job was accepted and queued.
    JobQueued {
        job_id: JobId,
        sport: String,
        movement: String,
    },
    /// A submission was turned away at the admission ceiling.
    JobRejected {
        job_id: JobId,
        active: usize,
        capacity: usize,
    },
    JobStarted { job_id: JobId },
    JobProgress { job_id: JobId, percent: u8 },
    JobCompleted {
        job_id: JobId,
        result_id: String,
        overall_score: f64,
    },
    JobFailed {
        job_id: JobId,
        kind: JobErrorKind,
        message: String,
    },
}

/// A request to analyze one video.
#[derive(Debug, Clone)]
pub struct SubmitRequest {
    /// Caller-chosen id; generated when absent.
    pub job_id: Option<JobId>,
    pub sport: String,
    pub movement: String,
    pub video_path: PathBuf,
}

impl SubmitRequest {
    pub fn new(
        sport: impl Into<String>,
        movement: impl Into<String>,
        video_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            job_id: None,
            sport: sport.into(),
            movement: movement.into(),
            video_path: video_path.into(),
        }
    }

    pub fn with_job_id(mut self, job_id: impl Into<JobId>) -> Self {
        self.job_id = Some(job_id.into());
        self
    }
}

/// Outcome of [`AnalysisPipeline::submit`].
#[derive(Debug)]
pub enum SubmitOutcome {
    Accepted(JobHandle),
    Rejected(Rejection),
}

impl SubmitOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, SubmitOutcome::Accepted(_))
    }
}

/// Handle to a submitted job's background task.
#[derive(Debug)]
pub struct JobHandle {
    job: Job,
    task: JoinHandle<()>,
}

impl JobHandle {
    pub fn job_id(&self) -> &JobId {
        self.job.id()
    }

    /// The job as it was queued.
    pub fn job(&self) -> &Job {
        &self.job
    }

    /// Wait for the background task to finish.
    pub async fn wait(self) -> Result<()> {
        self.task
            .await
            .map_err(|e| Error::Internal(format!("Job task failed: {}", e)))
    }
}

struct Inner {
    admission: Arc<AdmissionController>,
    jobs: Arc<dyn JobRepository>,
    results: Arc<dyn ResultRepository>,
    pose: Arc<dyn PoseSource>,
    assessor: Assessor,
    event_tx: broadcast::Sender<PipelineEvent>,
}

/// Admission-controlled background analysis of uploaded videos.
#[derive(Clone)]
pub struct AnalysisPipeline {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for AnalysisPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisPipeline")
            .field("pose_source", &self.inner.pose.name())
            .field("capacity", &self.inner.admission.capacity())
            .finish()
    }
}

impl AnalysisPipeline {
    pub fn new(
        config: PipelineConfig,
        jobs: Arc<dyn JobRepository>,
        results: Arc<dyn ResultRepository>,
        pose: Arc<dyn PoseSource>,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(defaults::EVENT_BUS_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                admission: Arc::new(AdmissionController::new(config.admission)),
                jobs,
                results,
                pose,
                assessor: Assessor::new(ScoringEngine::new(config.scoring)),
                event_tx,
            }),
        }
    }

    /// Pipeline with in-memory job and result stores.
    pub fn in_memory(config: PipelineConfig, pose: Arc<dyn PoseSource>) -> Self {
        Self::new(
            config,
            Arc::new(InMemoryJobStore::new()),
            Arc::new(InMemoryResultStore::new()),
            pose,
        )
    }

    /// Subscribe to pipeline events.
    pub fn events(&self) -> broadcast::Receiver<PipelineEvent> {
        self.inner.event_tx.subscribe()
    }

    pub fn admission(&self) -> &Arc<AdmissionController> {
        &self.inner.admission
    }

    pub fn pose_source(&self) -> &'static str {
        self.inner.pose.name()
    }

    /// Queue a video for analysis.
    ///
    /// Returns an error for an unknown sport or movement, a job id that
    /// already exists, or one the result store cannot persist. A full pipeline is not an error: it yields
    /// [`SubmitOutcome::Rejected`] and leaves no job behind.
    #[instrument(skip(self, request), fields(sport = %request.sport, movement = %request.movement))]
    pub async fn submit(&self, request: SubmitRequest) -> Result<SubmitOutcome> {
        let movement = Movement::resolve(&request.sport, &request.movement)?;
        let job_id = request.job_id.unwrap_or_else(JobId::generate);
        self.inner.results.validate_key(&job_id)?;
        let job = Job::new(job_id.clone(), movement.sport().as_str(), movement.id());

        self.inner.jobs.insert(job.clone()).await?;

        let slot = match self.inner.admission.acquire(&job_id) {
            Ok(slot) => slot,
            Err(rejection) => {
                self.inner.jobs.delete(&job_id).await?;
                warn!(
                    job_id = %job_id,
                    active_slots = rejection.active,
                    capacity = rejection.capacity,
                    "Pipeline at capacity, rejecting submission"
                );
                self.inner.emit(PipelineEvent::JobRejected {
                    job_id,
                    active: rejection.active,
                    capacity: rejection.capacity,
                });
                return Ok(SubmitOutcome::Rejected(rejection));
            }
        };

        info!(job_id = %job_id, "Queued analysis");
        self.inner.emit(PipelineEvent::JobQueued {
            job_id: job_id.clone(),
            sport: job.sport().to_string(),
            movement: job.movement().to_string(),
        });

        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(inner.run(job_id, movement, request.video_path, slot));

        Ok(SubmitOutcome::Accepted(JobHandle { job, task }))
    }

    pub async fn job(&self, job_id: &JobId) -> Result<Option<Job>> {
        self.inner.jobs.get(job_id).await
    }

    pub async fn jobs(&self) -> Result<Vec<Job>> {
        self.inner.jobs.list().await
    }

    /// Result of a completed job.
    pub async fn result(&self, job_id: &JobId) -> Result<Option<AnalysisResult>> {
        match self.inner.jobs.get(job_id).await? {
            Some(job) if job.result_id().is_some() => self.inner.results.get(job_id).await,
            _ => Ok(None),
        }
    }

    /// Remove a finished job and its result. Returns the removed job.
    ///
    /// Jobs still queued or processing cannot be deleted.
    #[instrument(skip(self))]
    pub async fn delete(&self, job_id: &JobId) -> Result<Option<Job>> {
        let Some(job) = self.inner.jobs.get(job_id).await? else {
            return Ok(None);
        };
        if !job.status().is_terminal() {
            return Err(Error::InvalidTransition(format!(
                "job {} is still {}",
                job_id,
                job.status().as_str()
            )));
        }
        self.inner.results.delete(job_id).await?;
        self.inner.jobs.delete(job_id).await?;
        info!(job_id = %job_id, "Deleted job");
        Ok(Some(job))
    }
}

impl Inner {
    fn emit(&self, event: PipelineEvent) {
        // No subscribers is fine.
        let _ = self.event_tx.send(event);
    }

    async fn run(
        self: Arc<Self>,
        job_id: JobId,
        movement: Movement,
        video_path: PathBuf,
        slot: AdmissionSlot,
    ) {
        let started = Instant::now();
        let worker = Arc::clone(&self);
        let id = job_id.clone();
        let outcome = tokio::spawn(async move { worker.process(&id, movement, &video_path, started).await })
            .await
            .unwrap_or_else(|e| {
                Err(if e.is_panic() {
                    Error::Internal("analysis task panicked".to_string())
                } else {
                    Error::Internal(format!("analysis task aborted: {}", e))
                })
            });

        let duration_ms = started.elapsed().as_millis() as u64;
        match outcome {
            Ok(result_id) => {
                info!(
                    job_id = %job_id,
                    sport = %movement.sport(),
                    movement = movement.id(),
                    result_id = %result_id,
                    duration_ms,
                    "Analysis completed"
                );
            }
            Err(e) => self.fail(&job_id, &e, duration_ms).await,
        }

        drop(slot);
    }

    async fn fail(&self, job_id: &JobId, err: &Error, duration_ms: u64) {
        let kind = err.kind();
        let message = err.job_message();
        match kind {
            JobErrorKind::NoPoseData | JobErrorKind::UnreadableVideo => {
                warn!(job_id = %job_id, error_kind = %kind, duration_ms, "Analysis rejected input")
            }
            _ => error!(job_id = %job_id, error_kind = %kind, error = %err, duration_ms, "Analysis failed"),
        }

        let update = JobUpdate::Fail {
            kind,
            message: message.clone(),
        };
        match self.jobs.apply(job_id, update).await {
            Ok(_) => self.emit(PipelineEvent::JobFailed {
                job_id: job_id.clone(),
                kind,
                message,
            }),
            Err(e) => error!(job_id = %job_id, error = %e, "Failed to mark job as failed"),
        }
    }

    async fn progress(&self, job_id: &JobId, percent: u8) -> Result<()> {
        let job = self.jobs.apply(job_id, JobUpdate::Progress(i32::from(percent))).await?;
        debug!(job_id = %job_id, progress = job.progress(), "Job progress");
        self.emit(PipelineEvent::JobProgress {
            job_id: job_id.clone(),
            percent: job.progress(),
        });
        Ok(())
    }

    async fn process(
        &self,
        job_id: &JobId,
        movement: Movement,
        video_path: &Path,
        started: Instant,
    ) -> Result<String> {
        self.jobs.apply(job_id, JobUpdate::Start).await?;
        self.emit(PipelineEvent::JobStarted {
            job_id: job_id.clone(),
        });
        self.progress(job_id, defaults::PROGRESS_STARTED).await?;

        check_video(video_path).await?;
        self.progress(job_id, defaults::PROGRESS_VIDEO_READY).await?;

        self.progress(job_id, defaults::PROGRESS_POSE_STARTED).await?;
        let extracted = self.pose.extract(video_path).await?;
        let extracted_count = extracted.len();
        let frames: Vec<PoseFrame> = extracted.into_iter().filter(PoseFrame::has_person).collect();
        debug!(
            job_id = %job_id,
            pose_source = self.pose.name(),
            frame_count = frames.len(),
            dropped = extracted_count - frames.len(),
            "Pose extraction finished"
        );
        if frames.is_empty() {
            return Err(Error::NoPoseData);
        }
        self.progress(job_id, defaults::PROGRESS_POSE_EXTRACTED).await?;

        self.progress(job_id, defaults::PROGRESS_ANALYZING).await?;
        let assessor = self.assessor.clone();
        let assessment = tokio::task::spawn_blocking(move || assessor.assess(movement, &frames))
            .await
            .map_err(|e| {
                if e.is_panic() {
                    Error::Extractor(format!("{} metric extraction panicked", movement))
                } else {
                    Error::Extractor(format!("{} metric extraction aborted", movement))
                }
            })?;
        self.progress(job_id, defaults::PROGRESS_SCORED).await?;

        let result = AnalysisResult {
            id: uuid::Uuid::now_v7().to_string(),
            job_id: job_id.clone(),
            sport: movement.sport().as_str().to_string(),
            movement: movement.id().to_string(),
            overall_score: assessment.overall_score,
            metrics: assessment.metrics,
            feedback: assessment.feedback,
            strengths: assessment.strengths,
            weaknesses: assessment.weaknesses,
            strength_notes: assessment.strength_notes,
            improvement_notes: assessment.improvement_notes,
            score_breakdown: assessment.breakdown,
            metadata: assessment.metadata,
            frames_analyzed: assessment.frames_analyzed,
            processing_ms: started.elapsed().as_millis() as u64,
            analyzed_at: Utc::now(),
        };
        let result_id = result.id.clone();
        let overall_score = result.overall_score;
        self.results.put(result).await?;

        self.jobs
            .apply(
                job_id,
                JobUpdate::Complete {
                    result_id: result_id.clone(),
                },
            )
            .await?;
        self.emit(PipelineEvent::JobCompleted {
            job_id: job_id.clone(),
            result_id: result_id.clone(),
            overall_score,
        });
        Ok(result_id)
    }
}

/// The video must be a non-empty regular file.
async fn check_video(path: &Path) -> Result<()> {
    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| Error::UnreadableVideo(format!("cannot open video {}: {}", path.display(), e)))?;
    if !metadata.is_file() {
        return Err(Error::UnreadableVideo(format!(
            "{} is not a file",
            path.display()
        )));
    }
    if metadata.len() == 0 {
        return Err(Error::UnreadableVideo("video file is empty".to_string()));
    }
    Ok(())
}
