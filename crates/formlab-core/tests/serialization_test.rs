//! Wire-format checks for the types the API returns.

use formlab_core::{
    Coaching, FeedbackItem, FeedbackLevel, Job, JobErrorKind, JobId, JobStatus, PoseFrame,
};
use serde_json::json;

#[test]
fn test_job_serializes_lowercase_status() {
    let mut job = Job::new(JobId::from("job-7"), "golf", "driver_swing");
    job.start().unwrap();
    job.advance(42).unwrap();

    let value = serde_json::to_value(&job).unwrap();
    assert_eq!(value["id"], "job-7");
    assert_eq!(value["status"], "processing");
    assert_eq!(value["progress"], 42);
    assert!(value["result_id"].is_null());
}

#[test]
fn test_failed_job_carries_kind() {
    let mut job = Job::new(JobId::from("job-8"), "soccer", "passing_technique");
    job.fail(JobErrorKind::NoPoseData, "no pose").unwrap();

    let value = serde_json::to_value(&job).unwrap();
    assert_eq!(value["status"], "error");
    assert_eq!(value["error_kind"], "no_pose_data");
    assert_eq!(job.status(), JobStatus::Error);
}

#[test]
fn test_feedback_tagged_by_type() {
    let item = FeedbackItem::coaching(
        FeedbackLevel::Critical,
        "depth",
        Coaching::new("Reps stop short").step("Sit lower").cue("Own the bottom"),
    );
    let value = serde_json::to_value(&item).unwrap();
    assert_eq!(value["level"], "critical");
    assert_eq!(value["metric"], "depth");
    assert_eq!(value["content"]["type"], "coaching");
    assert_eq!(value["content"]["observation"], "Reps stop short");
    assert_eq!(value["content"]["steps"], json!(["Sit lower"]));

    let back: FeedbackItem = serde_json::from_value(value).unwrap();
    assert_eq!(back, item);
}

#[test]
fn test_positive_feedback_omits_missing_cue() {
    let value = serde_json::to_value(FeedbackItem::positive("tempo", "Even tempo", None)).unwrap();
    assert_eq!(value["content"]["type"], "positive");
    assert!(value["content"].get("cue").is_none());
}

#[test]
fn test_pose_frame_accepts_mixed_landmark_shapes() {
    let frame: PoseFrame = serde_json::from_value(json!({
        "landmarks": {
            "left_shoulder": {"x": 0.4, "y": 0.3},
            "left_elbow": [0.4, 0.45, 0.1],
            "left_wrist": [0.5, 0.45]
        }
    }))
    .unwrap();

    assert_eq!(frame.landmarks.len(), 3);
    assert_eq!(frame.landmark("left_wrist").unwrap().z, 0.0);
    assert!(frame.angles.is_empty());
}
