//! Deterministic pose sequences for demos and tests.
//!
//! The figure dips and rises once, shifts its hips forward, turns them
//! slightly and raises its arms overhead, so every analyzer finds the
//! landmarks it needs.

use std::f64::consts::PI;

use formlab_core::{Landmark, PoseFrame};

/// One synthetic frame at normalized time `t` in `[0, 1]`.
pub fn frame_at(t: f64, wobble: f64) -> PoseFrame {
    let t = t.clamp(0.0, 1.0);
    let dip = (PI * t).sin();

    let hip_x = 0.5 + 0.06 * t + wobble;
    let hip_y = 0.55 + 0.08 * dip;
    let hip_half = 0.06 - 0.02 * dip;
    let shoulder_x = hip_x + 0.03;
    let shoulder_y = hip_y - 0.25;
    let knee_y = 0.72 + 0.03 * dip;
    let elbow_y = shoulder_y + 0.1 - 0.2 * t;
    let wrist_y = shoulder_y + 0.2 - 0.45 * t;

    PoseFrame::from_landmarks([
        ("nose", Landmark::new(shoulder_x, shoulder_y - 0.1, 0.0)),
        ("left_shoulder", Landmark::new(shoulder_x - 0.08, shoulder_y, 0.0)),
        ("right_shoulder", Landmark::new(shoulder_x + 0.08, shoulder_y, 0.0)),
        ("left_elbow", Landmark::new(shoulder_x - 0.1, elbow_y, 0.0)),
        ("right_elbow", Landmark::new(shoulder_x + 0.1, elbow_y, 0.0)),
        ("left_wrist", Landmark::new(shoulder_x - 0.04, wrist_y, 0.0)),
        ("right_wrist", Landmark::new(shoulder_x + 0.04, wrist_y, 0.0)),
        ("left_hip", Landmark::new(hip_x - hip_half, hip_y, 0.0)),
        ("right_hip", Landmark::new(hip_x + hip_half, hip_y, 0.0)),
        ("left_knee", Landmark::new(hip_x - 0.07, knee_y, 0.0)),
        ("right_knee", Landmark::new(hip_x + 0.07, knee_y, 0.0)),
        ("left_ankle", Landmark::new(0.42, 0.9, 0.0)),
        ("right_ankle", Landmark::new(0.58, 0.9, 0.0)),
        ("left_foot_index", Landmark::new(0.38, 0.92, 0.0)),
        ("right_foot_index", Landmark::new(0.62, 0.92, 0.0)),
    ])
}

/// `count` frames covering one full repetition.
pub fn frames(count: usize) -> Vec<PoseFrame> {
    let span = count.saturating_sub(1).max(1) as f64;
    (0..count)
        .map(|i| frame_at(i as f64 / span, 0.002 * (i as f64 * 1.7).sin()))
        .collect()
}
