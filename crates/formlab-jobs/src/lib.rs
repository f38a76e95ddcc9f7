//! # formlab-jobs
//!
//! Background analysis jobs for FormLab.
//!
//! This crate provides:
//! - Admission control with a concurrency ceiling and stale-slot reclamation
//! - Job and result stores (in-memory, plus file-backed results)
//! - Pose sources that turn a video into landmark frames
//! - The pipeline that drives each job from `queued` to `completed` or `error`
//!
//! ## Example
//!
//! ```ignore
//! use formlab_jobs::{AnalysisPipeline, PipelineConfig, PoseSourceConfig, SubmitOutcome, SubmitRequest};
//!
//! let pose = PoseSourceConfig::from_env().build()?;
//! let pipeline = AnalysisPipeline::in_memory(PipelineConfig::from_env(), pose);
//!
//! let mut events = pipeline.events();
//! match pipeline.submit(SubmitRequest::new("golf", "driver", "swing.mp4")).await? {
//!     SubmitOutcome::Accepted(handle) => handle.wait().await?,
//!     SubmitOutcome::Rejected(r) => println!("busy: {}/{}", r.active, r.capacity),
//! }
//! while let Ok(event) = events.try_recv() {
//!     println!("Event: {:?}", event);
//! }
//! ```

pub mod admission;
pub mod pipeline;
pub mod pose;
pub mod store;

pub use admission::{AdmissionConfig, AdmissionController, AdmissionSlot, Rejection};
pub use pipeline::{
    AnalysisPipeline, JobHandle, PipelineConfig, PipelineEvent, SubmitOutcome, SubmitRequest,
};
pub use pose::{
    CommandPoseSource, JsonFilePoseSource, PoseSource, PoseSourceConfig, PoseSourceKind,
    StaticPoseSource, SyntheticPoseSource,
};
pub use store::{
    FileResultStore, InMemoryJobStore, InMemoryResultStore, JobRepository, JobUpdate,
    ResultRepository,
};
