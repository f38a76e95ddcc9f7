//! Integration tests for the analysis pipeline.
//!
//! This suite validates:
//! - a clean video runs to `completed` with a bounded score and metrics
//! - a video with no detectable person ends in `error` with a no-pose message
//! - the admission ceiling turns away exactly the overflow submissions
//! - a slot reclaimed as stale does not stop its job from finishing

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use tokio::sync::Semaphore;

use formlab_analysis::synthetic;
use formlab_core::{JobErrorKind, JobStatus, PoseFrame, Result};
use formlab_jobs::{
    AdmissionConfig, AnalysisPipeline, JobHandle, PipelineConfig, PoseSource, StaticPoseSource,
    SubmitOutcome, SubmitRequest,
};

// ============================================================================
// HELPERS
// ============================================================================

/// Pose source that blocks until the test hands out permits.
struct GatedPoseSource {
    gate: Arc<Semaphore>,
    frames: Vec<PoseFrame>,
}

#[async_trait]
impl PoseSource for GatedPoseSource {
    fn name(&self) -> &'static str {
        "gated"
    }

    async fn extract(&self, _video: &Path) -> Result<Vec<PoseFrame>> {
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| formlab_core::Error::Internal(e.to_string()))?;
        permit.forget();
        Ok(self.frames.clone())
    }
}

fn video_file() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp video");
    std::io::Write::write_all(&mut file, b"fake mp4 payload").expect("write video");
    file
}

fn config(max_concurrent: usize) -> PipelineConfig {
    PipelineConfig::default()
        .with_admission(AdmissionConfig::default().with_max_concurrent(max_concurrent))
}

fn gated(max_concurrent: usize) -> (AnalysisPipeline, Arc<Semaphore>) {
    let gate = Arc::new(Semaphore::new(0));
    let source = GatedPoseSource {
        gate: Arc::clone(&gate),
        frames: synthetic::frames(40),
    };
    (
        AnalysisPipeline::in_memory(config(max_concurrent), Arc::new(source)),
        gate,
    )
}

fn expect_accepted(outcome: SubmitOutcome) -> JobHandle {
    match outcome {
        SubmitOutcome::Accepted(handle) => handle,
        SubmitOutcome::Rejected(r) => panic!("unexpected rejection: {:?}", r),
    }
}

// ============================================================================
// END TO END
// ============================================================================

#[tokio::test]
async fn test_fifty_frames_complete() {
    let pipeline = AnalysisPipeline::in_memory(
        PipelineConfig::default(),
        Arc::new(StaticPoseSource::new(synthetic::frames(50))),
    );
    let video = video_file();

    let handle = expect_accepted(
        pipeline
            .submit(SubmitRequest::new("basketball", "free_throw", video.path()))
            .await
            .unwrap(),
    );
    let job_id = handle.job_id().clone();
    handle.wait().await.unwrap();

    let job = pipeline.job(&job_id).await.unwrap().expect("job exists");
    assert_eq!(job.status(), JobStatus::Completed);
    assert_eq!(job.progress(), 100);

    let result = pipeline.result(&job_id).await.unwrap().expect("result stored");
    assert_eq!(job.result_id(), Some(result.id.as_str()));
    assert!((40.0..=100.0).contains(&result.overall_score));
    assert!(!result.metrics.is_empty());
    assert_eq!(result.frames_analyzed, 50);
    assert_eq!(result.movement, "free_throw");
    assert_eq!(pipeline.admission().active_count(), 0);
}

#[tokio::test]
async fn test_empty_frames_fail_with_no_pose_data() {
    let pipeline = AnalysisPipeline::in_memory(
        PipelineConfig::default(),
        Arc::new(StaticPoseSource::new(Vec::new())),
    );
    let video = video_file();

    let handle = expect_accepted(
        pipeline
            .submit(SubmitRequest::new("weightlifting", "deadlift", video.path()))
            .await
            .unwrap(),
    );
    let job_id = handle.job_id().clone();
    handle.wait().await.unwrap();

    let job = pipeline.job(&job_id).await.unwrap().unwrap();
    assert_eq!(job.status(), JobStatus::Error);
    assert_eq!(job.error_kind(), Some(JobErrorKind::NoPoseData));
    assert!(job.error_message().unwrap().contains("No pose data"));
    assert!(job.result_id().is_none());
    assert!(pipeline.result(&job_id).await.unwrap().is_none());
    assert_eq!(pipeline.admission().active_count(), 0);
}

// ============================================================================
// ADMISSION
// ============================================================================

#[tokio::test]
async fn test_four_concurrent_submissions_one_rejected() {
    let (pipeline, gate) = gated(3);
    let video = video_file();

    let outcomes = join_all((0..4).map(|_| {
        pipeline.submit(SubmitRequest::new("golf", "iron", video.path()))
    }))
    .await;

    let mut handles = Vec::new();
    let mut rejected = 0;
    for outcome in outcomes {
        match outcome.unwrap() {
            SubmitOutcome::Accepted(handle) => handles.push(handle),
            SubmitOutcome::Rejected(rejection) => {
                assert_eq!(rejection.capacity, 3);
                rejected += 1;
            }
        }
    }
    assert_eq!(rejected, 1);
    assert_eq!(handles.len(), 3);
    assert_eq!(pipeline.jobs().await.unwrap().len(), 3);

    gate.add_permits(3);
    for handle in handles {
        handle.wait().await.unwrap();
    }
    assert_eq!(pipeline.admission().active_count(), 0);

    let accepted = pipeline
        .submit(SubmitRequest::new("golf", "iron", video.path()))
        .await
        .unwrap();
    assert!(accepted.is_accepted());
    gate.add_permits(1);
}

#[tokio::test]
async fn test_delete_refuses_running_job() {
    let (pipeline, gate) = gated(1);
    let video = video_file();

    let handle = expect_accepted(
        pipeline
            .submit(SubmitRequest::new("soccer", "passing", video.path()))
            .await
            .unwrap(),
    );
    let job_id = handle.job_id().clone();
    assert!(pipeline.delete(&job_id).await.is_err());

    gate.add_permits(1);
    handle.wait().await.unwrap();
    assert!(pipeline.delete(&job_id).await.unwrap().is_some());
}

#[tokio::test(start_paused = true)]
async fn test_stale_slot_reclaimed_job_still_finishes() {
    let (pipeline, gate) = gated(1);
    let video = video_file();

    let first = expect_accepted(
        pipeline
            .submit(SubmitRequest::new("lacrosse", "shot", video.path()))
            .await
            .unwrap(),
    );
    let blocked = pipeline
        .submit(SubmitRequest::new("lacrosse", "shot", video.path()))
        .await
        .unwrap();
    assert!(!blocked.is_accepted());

    tokio::time::advance(Duration::from_secs(31 * 60)).await;

    let second = expect_accepted(
        pipeline
            .submit(SubmitRequest::new("lacrosse", "shot", video.path()))
            .await
            .unwrap(),
    );

    gate.add_permits(2);
    let first_id = first.job_id().clone();
    let second_id = second.job_id().clone();
    first.wait().await.unwrap();
    second.wait().await.unwrap();

    for id in [first_id, second_id] {
        let job = pipeline.job(&id).await.unwrap().unwrap();
        assert_eq!(job.status(), JobStatus::Completed);
        assert!(pipeline.result(&id).await.unwrap().is_some());
    }
    assert_eq!(pipeline.admission().active_count(), 0);
}
