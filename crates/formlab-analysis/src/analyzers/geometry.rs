//! Measurements over pose sequences shared by the movement analyzers.
//!
//! Coordinates are normalized image coordinates: `x` grows to the right and
//! `y` grows downward, so a smaller `y` is higher in the frame.

use formlab_core::{joint_angle, Landmark, PoseFrame};

// =============================================================================
// STATISTICS
// =============================================================================

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> Option<f64> {
    let avg = mean(values)?;
    let variance = values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / values.len() as f64;
    Some(variance.sqrt())
}

pub fn min(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::min)
}

pub fn max(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max)
}

/// Evaluate `f` on every frame, keeping the frames where it is measurable.
pub fn series<F>(frames: &[PoseFrame], f: F) -> Vec<f64>
where
    F: Fn(&PoseFrame) -> Option<f64>,
{
    frames.iter().filter_map(f).collect()
}

/// Spread of a point's position over the frames: sqrt(var(x) + var(y)).
pub fn position_spread<F>(frames: &[PoseFrame], point: F) -> Option<f64>
where
    F: Fn(&PoseFrame) -> Option<Landmark>,
{
    let points: Vec<Landmark> = frames.iter().filter_map(point).collect();
    let xs: Vec<f64> = points.iter().map(|p| p.x).collect();
    let ys: Vec<f64> = points.iter().map(|p| p.y).collect();
    let (sx, sy) = (std_dev(&xs)?, std_dev(&ys)?);
    Some((sx * sx + sy * sy).sqrt())
}

// =============================================================================
// WINDOWS
// =============================================================================

fn window_len(total: usize, fraction: f64) -> usize {
    if total == 0 {
        return 0;
    }
    ((total as f64 * fraction).ceil() as usize).clamp(1, total)
}

/// Leading `fraction` of the frames (at least one frame when non-empty).
pub fn head(frames: &[PoseFrame], fraction: f64) -> &[PoseFrame] {
    &frames[..window_len(frames.len(), fraction)]
}

/// Trailing `fraction` of the frames (at least one frame when non-empty).
pub fn tail(frames: &[PoseFrame], fraction: f64) -> &[PoseFrame] {
    &frames[frames.len() - window_len(frames.len(), fraction)..]
}

/// Frames between two fractional positions of the sequence.
pub fn middle(frames: &[PoseFrame], from: f64, to: f64) -> &[PoseFrame] {
    let start = ((frames.len() as f64 * from).floor() as usize).min(frames.len());
    let end = ((frames.len() as f64 * to).ceil() as usize).clamp(start, frames.len());
    if start == end && start < frames.len() {
        return &frames[start..start + 1];
    }
    &frames[start..end]
}

/// Index of the frame where `f` is smallest.
pub fn argmin<F>(frames: &[PoseFrame], f: F) -> Option<usize>
where
    F: Fn(&PoseFrame) -> Option<f64>,
{
    frames
        .iter()
        .enumerate()
        .filter_map(|(i, frame)| f(frame).map(|v| (i, v)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}

/// Index of the frame where `f` is largest.
pub fn argmax<F>(frames: &[PoseFrame], f: F) -> Option<usize>
where
    F: Fn(&PoseFrame) -> Option<f64>,
{
    frames
        .iter()
        .enumerate()
        .filter_map(|(i, frame)| f(frame).map(|v| (i, v)))
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}

// =============================================================================
// SCORE CURVES
// =============================================================================

pub fn clamp_score(score: f64) -> f64 {
    score.clamp(0.0, 100.0)
}

/// 100 inside `[lo, hi]`, losing `slope` points per unit outside it.
pub fn band_score(value: f64, lo: f64, hi: f64, slope: f64) -> f64 {
    let distance = if value < lo {
        lo - value
    } else if value > hi {
        value - hi
    } else {
        0.0
    };
    clamp_score(100.0 - distance * slope)
}

/// 100 at `ideal`, losing `slope` points per unit of deviation.
pub fn deviation_score(value: f64, ideal: f64, slope: f64) -> f64 {
    clamp_score(100.0 - (value - ideal).abs() * slope)
}

/// 100 for no movement, losing `scale` points per unit of spread.
pub fn stability_score(spread: f64, scale: f64) -> f64 {
    clamp_score(100.0 - spread * scale)
}

/// 100 at or above `target`, losing `slope` points per unit short of it.
pub fn at_least_score(value: f64, target: f64, slope: f64) -> f64 {
    if value >= target {
        100.0
    } else {
        clamp_score(100.0 - (target - value) * slope)
    }
}

// =============================================================================
// BODY GEOMETRY
// =============================================================================

/// Midpoint of a left/right landmark pair.
pub fn mid(frame: &PoseFrame, left: &str, right: &str) -> Option<Landmark> {
    let [l, r] = frame.landmarks_all([left, right])?;
    Some(l.midpoint(r))
}

/// Horizontal distance between a left/right landmark pair.
pub fn width(frame: &PoseFrame, left: &str, right: &str) -> Option<f64> {
    let [l, r] = frame.landmarks_all([left, right])?;
    Some((l.x - r.x).abs())
}

pub fn mid_hip(frame: &PoseFrame) -> Option<Landmark> {
    mid(frame, "left_hip", "right_hip")
}

pub fn mid_shoulder(frame: &PoseFrame) -> Option<Landmark> {
    mid(frame, "left_shoulder", "right_shoulder")
}

pub fn mid_wrist(frame: &PoseFrame) -> Option<Landmark> {
    mid(frame, "left_wrist", "right_wrist")
}

pub fn mid_ankle(frame: &PoseFrame) -> Option<Landmark> {
    mid(frame, "left_ankle", "right_ankle")
}

/// Torso angle from vertical in degrees, from hip midpoint to shoulder midpoint.
pub fn torso_lean(frame: &PoseFrame) -> Option<f64> {
    let (hip, shoulder) = (mid_hip(frame)?, mid_shoulder(frame)?);
    let (dx, dy) = ((shoulder.x - hip.x).abs(), (hip.y - shoulder.y).abs());
    if dx == 0.0 && dy == 0.0 {
        return None;
    }
    Some(dx.atan2(dy).to_degrees())
}

/// Mean of the left and right joint angle, or whichever side is present.
pub fn paired_angle(frame: &PoseFrame, joint: &str) -> Option<f64> {
    let left = frame.angle(&format!("left_{}", joint));
    let right = frame.angle(&format!("right_{}", joint));
    match (left, right) {
        (Some(l), Some(r)) => Some((l + r) / 2.0),
        (Some(v), None) | (None, Some(v)) => Some(v),
        (None, None) => None,
    }
}

/// Angle at the ankle between shin and foot.
pub fn ankle_angle(frame: &PoseFrame, side: &str) -> Option<f64> {
    let names = [
        format!("{}_knee", side),
        format!("{}_ankle", side),
        format!("{}_foot_index", side),
    ];
    let [knee, ankle, toe] =
        frame.landmarks_all([names[0].as_str(), names[1].as_str(), names[2].as_str()])?;
    Some(joint_angle(knee, ankle, toe))
}

/// Horizontal travel of the hip midpoint between the opening and closing windows,
/// relative to shoulder width.
pub fn weight_shift(frames: &[PoseFrame], window: f64) -> Option<f64> {
    let start = mean(&series(head(frames, window), |f| mid_hip(f).map(|p| p.x)))?;
    let end = mean(&series(tail(frames, window), |f| mid_hip(f).map(|p| p.x)))?;
    let shoulders = mean(&series(frames, |f| width(f, "left_shoulder", "right_shoulder")))?;
    if shoulders <= f64::EPSILON {
        return None;
    }
    Some((end - start).abs() / shoulders)
}

/// Spread of the hip midpoint over the closing window.
pub fn finish_balance(frames: &[PoseFrame], window: f64) -> Option<f64> {
    position_spread(tail(frames, window), mid_hip)
}

/// Share of the sequence, in percent, spent before the frame where `f` peaks low.
pub fn phase_share<F>(frames: &[PoseFrame], f: F) -> Option<f64>
where
    F: Fn(&PoseFrame) -> Option<f64>,
{
    if frames.len() < 2 {
        return None;
    }
    let idx = argmin(frames, f)?;
    Some(idx as f64 / (frames.len() - 1) as f64 * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(points: &[(&str, f64, f64)]) -> PoseFrame {
        PoseFrame::from_landmarks(
            points
                .iter()
                .map(|(name, x, y)| (name.to_string(), Landmark::new(*x, *y, 0.0))),
        )
    }

    #[test]
    fn test_statistics() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[1.0, 3.0]), Some(2.0));
        assert_eq!(std_dev(&[2.0, 2.0, 2.0]), Some(0.0));
        assert_eq!(std_dev(&[1.0, 3.0]), Some(1.0));
        assert_eq!(min(&[3.0, -1.0, 2.0]), Some(-1.0));
        assert_eq!(max(&[3.0, -1.0, 2.0]), Some(3.0));
    }

    #[test]
    fn test_windows() {
        let frames: Vec<PoseFrame> = (0..10).map(|_| PoseFrame::default()).collect();
        assert_eq!(head(&frames, 0.2).len(), 2);
        assert_eq!(tail(&frames, 0.3).len(), 3);
        assert_eq!(middle(&frames, 0.3, 0.7).len(), 4);
        assert_eq!(head(&frames[..1], 0.1).len(), 1);
        assert!(tail(&[], 0.5).is_empty());
    }

    #[test]
    fn test_score_curves() {
        assert_eq!(band_score(5.0, 0.0, 10.0, 3.0), 100.0);
        assert_eq!(band_score(12.0, 0.0, 10.0, 3.0), 94.0);
        assert_eq!(band_score(-100.0, 0.0, 10.0, 3.0), 0.0);
        assert!((deviation_score(0.2, 0.15, 500.0) - 75.0).abs() < 1e-9);
        assert!((stability_score(0.01, 1000.0) - 90.0).abs() < 1e-9);
        assert_eq!(at_least_score(0.8, 0.7, 100.0), 100.0);
        assert!((at_least_score(0.5, 0.7, 100.0) - 80.0).abs() < 1e-9);
    }

    #[test]
    fn test_torso_lean() {
        let upright = frame(&[
            ("left_hip", 0.45, 0.6),
            ("right_hip", 0.55, 0.6),
            ("left_shoulder", 0.45, 0.3),
            ("right_shoulder", 0.55, 0.3),
        ]);
        assert_eq!(torso_lean(&upright), Some(0.0));

        let leaning = frame(&[
            ("left_hip", 0.45, 0.6),
            ("right_hip", 0.55, 0.6),
            ("left_shoulder", 0.75, 0.3),
            ("right_shoulder", 0.85, 0.3),
        ]);
        assert!((torso_lean(&leaning).unwrap() - 45.0).abs() < 1e-9);
    }

    #[test]
    fn test_paired_angle_uses_available_side() {
        let mut f = PoseFrame::default();
        f.angles.insert("left_knee".into(), 100.0);
        assert_eq!(paired_angle(&f, "knee"), Some(100.0));
        f.angles.insert("right_knee".into(), 120.0);
        assert_eq!(paired_angle(&f, "knee"), Some(110.0));
        assert_eq!(paired_angle(&f, "elbow"), None);
    }

    #[test]
    fn test_weight_shift_relative_to_shoulders() {
        let at = |hip_x: f64| {
            frame(&[
                ("left_hip", hip_x - 0.05, 0.6),
                ("right_hip", hip_x + 0.05, 0.6),
                ("left_shoulder", 0.4, 0.3),
                ("right_shoulder", 0.6, 0.3),
            ])
        };
        let frames = vec![at(0.5), at(0.52), at(0.55), at(0.56)];
        let shift = weight_shift(&frames, 0.25).unwrap();
        assert!((shift - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_phase_share() {
        let frames: Vec<PoseFrame> = [0.5, 0.4, 0.2, 0.3, 0.5]
            .iter()
            .map(|y| frame(&[("nose", 0.5, *y)]))
            .collect();
        let share = phase_share(&frames, |f| f.landmark("nose").map(|p| p.y)).unwrap();
        assert_eq!(share, 50.0);
    }
}
