//! Jump shot, catch-and-shoot and free throw mechanics. Assumes a right-handed shooter.

use serde_json::json;

use formlab_core::{FeedbackLevel, PoseFrame};

use super::geometry::{
    band_score, deviation_score, max, mean, middle, paired_angle, series, stability_score,
    std_dev, tail, torso_lean, width,
};
use super::{Advice, Measure, Movement, MovementReport, ReportBuilder};

const CRITICAL: &[&str] = &["elbow_alignment", "base_stability"];

/// Ankle spacing, as a fraction of frame width, of a balanced shooting base.
const IDEAL_STANCE: f64 = 0.15;

fn ideal_knee_angle(movement: Movement) -> f64 {
    match movement {
        Movement::FreeThrow => 130.0,
        Movement::CatchAndShoot => 125.0,
        _ => 120.0,
    }
}

pub(super) fn extract(movement: Movement, frames: &[PoseFrame]) -> MovementReport {
    let ideal_knee = ideal_knee_angle(movement);
    let mut report = ReportBuilder::new(frames);

    report.record("base_stability", base_stability(frames), "frame_width", &BASE_STABILITY);
    report.record("vertical_alignment", vertical_alignment(frames), "deg", &VERTICAL_ALIGNMENT);
    report.record("knee_bend", knee_bend(frames, ideal_knee), "deg", &KNEE_BEND);
    report.record("elbow_alignment", elbow_alignment(frames), "deg", &ELBOW_ALIGNMENT);
    report.record("follow_through", follow_through(frames), "deg", &FOLLOW_THROUGH);
    report.record("release_point", release_point(frames), "frame_height", &RELEASE_POINT);
    report.record("shot_rhythm", shot_rhythm(frames), "frame_height", &SHOT_RHYTHM);

    report.meta("shooting_side", json!("right"));
    report.meta("ideal_knee_angle", json!(ideal_knee));
    report.finish(movement, CRITICAL)
}

// =============================================================================
// METRICS
// =============================================================================

fn base_stability(frames: &[PoseFrame]) -> Option<Measure> {
    let stance = mean(&series(frames, |f| width(f, "left_ankle", "right_ankle")))?;
    Some(Measure::new(deviation_score(stance, IDEAL_STANCE, 500.0), stance))
}

fn vertical_alignment(frames: &[PoseFrame]) -> Option<Measure> {
    let lean = mean(&series(frames, torso_lean))?;
    Some(Measure::new(band_score(lean, 0.0, 5.0, 3.0), lean))
}

fn knee_bend(frames: &[PoseFrame], ideal: f64) -> Option<Measure> {
    let deepest = series(frames, |f| paired_angle(f, "knee"))
        .into_iter()
        .reduce(f64::min)?;
    Some(Measure::new(deviation_score(deepest, ideal, 0.8), deepest))
}

/// Horizontal elbow offset from the shoulder during set and release, in approximate degrees.
fn elbow_alignment(frames: &[PoseFrame]) -> Option<Measure> {
    let flare = mean(&series(middle(frames, 0.3, 0.8), |f| {
        width(f, "right_elbow", "right_shoulder")
    }))?;
    let degrees = flare * 180.0;
    let score = if degrees <= 5.0 {
        100.0
    } else if degrees <= 10.0 {
        85.0
    } else if degrees <= 15.0 {
        70.0
    } else {
        (70.0 - (degrees - 15.0) * 3.0).max(0.0)
    };
    Some(Measure::new(score, degrees))
}

fn follow_through(frames: &[PoseFrame]) -> Option<Measure> {
    let extension = max(&series(tail(frames, 0.3), |f| f.angle("right_elbow")))?;
    Some(Measure::new(band_score(extension, 160.0, 180.0, 2.0), extension))
}

/// Peak height of the shooting wrist above the nose.
fn release_point(frames: &[PoseFrame]) -> Option<Measure> {
    let height = max(&series(frames, |f| {
        let [nose, wrist] = f.landmarks_all(["nose", "right_wrist"])?;
        Some(nose.y - wrist.y)
    }))?;
    Some(Measure::new(band_score(height, 0.1, 0.4, 300.0), height))
}

/// Smoothness of the shooting wrist's vertical motion.
fn shot_rhythm(frames: &[PoseFrame]) -> Option<Measure> {
    let heights = series(frames, |f| f.landmark("right_wrist").map(|w| w.y));
    if heights.len() < 3 {
        return None;
    }
    let steps: Vec<f64> = heights.windows(2).map(|w| w[1] - w[0]).collect();
    let jitter = std_dev(&steps)?;
    Some(Measure::new(stability_score(jitter, 2000.0), jitter))
}

// =============================================================================
// ADVICE
// =============================================================================

const BASE_STABILITY: Advice = Advice {
    praise: "Your feet are set shoulder-width and stay quiet through the shot",
    cue: "Balanced base",
    observation: "Your stance is too narrow or too wide for a stable shot",
    impact: "An unstable base changes your release height from shot to shot",
    steps: &[
        "Set your feet about shoulder-width apart before the catch",
        "Point your toes at the rim",
        "Land where you took off",
    ],
    drill: "Form shooting from three feet, freezing your landing for two seconds",
    severity: FeedbackLevel::Critical,
    minor: Some("Base width drifts slightly from shot to shot"),
};

const VERTICAL_ALIGNMENT: Advice = Advice {
    praise: "You rise straight up with a tall torso",
    cue: "Straight up, straight down",
    observation: "Your torso tilts away from vertical as you rise",
    impact: "Leaning shifts the ball off line and shortens your shot",
    steps: &[
        "Keep your chest over your hips through the jump",
        "Drive up through the balls of your feet",
    ],
    drill: "Wall shots: shoot with your back an inch from a wall without touching it",
    severity: FeedbackLevel::Warning,
    minor: Some("Slight lean during the jump"),
};

const KNEE_BEND: Advice = Advice {
    praise: "Good knee bend loads your legs for range",
    cue: "Sit into the shot",
    observation: "Your knee bend does not match the load this shot needs",
    impact: "Without leg drive your arms supply the power, which costs accuracy",
    steps: &[
        "Dip into the shot as the ball arrives",
        "Push through your legs before your arms extend",
    ],
    drill: "Chair shots: touch a chair with your hips, then rise into the shot",
    severity: FeedbackLevel::Warning,
    minor: Some("Knee bend is a little off the ideal depth"),
};

const ELBOW_ALIGNMENT: Advice = Advice {
    praise: "Your shooting elbow stays under the ball",
    cue: "Elbow in",
    observation: "Your shooting elbow flares out away from your body",
    impact: "A flared elbow pushes the ball sideways and causes left-right misses",
    steps: &[
        "Line up your elbow under the ball at the set point",
        "Keep your wrist, elbow and knee on one line",
    ],
    drill: "One-hand form shooting close to the rim with your guide hand behind your back",
    severity: FeedbackLevel::Critical,
    minor: Some("Shooting elbow drifts slightly outward"),
};

const FOLLOW_THROUGH: Advice = Advice {
    praise: "Full arm extension on the follow-through",
    cue: "Reach into the cookie jar",
    observation: "Your shooting arm stops short after release",
    impact: "A short finish lowers your arc and reduces backspin",
    steps: &[
        "Snap your wrist and hold the finish until the ball lands",
        "Extend your elbow fully above your eyes",
    ],
    drill: "Hold the follow-through on every make for a full second",
    severity: FeedbackLevel::Warning,
    minor: Some("Follow-through could be held longer"),
};

const RELEASE_POINT: Advice = Advice {
    praise: "High release point above your head",
    cue: "Release high",
    observation: "You release the ball at or below head height",
    impact: "A low release is easier to block and flattens the arc",
    steps: &["Bring the ball up through your shooting pocket", "Release at the top of your jump"],
    drill: "Shoot over a raised hand held by a partner",
    severity: FeedbackLevel::Warning,
    minor: None,
};

const SHOT_RHYTHM: Advice = Advice {
    praise: "Smooth, one-motion shooting rhythm",
    cue: "One smooth motion",
    observation: "Your shot has a hitch between the dip and the release",
    impact: "Stops in the motion waste energy and make the shot inconsistent",
    steps: &["Let the legs and arms move together", "Avoid pausing at the set point"],
    drill: "Rhythm shooting to a steady count of one-two",
    severity: FeedbackLevel::Warning,
    minor: None,
};

#[cfg(test)]
mod tests {
    use super::*;
    use formlab_core::Landmark;

    fn shooter(elbow_x: f64, ankle_gap: f64) -> PoseFrame {
        PoseFrame::from_landmarks([
            ("nose", Landmark::new(0.5, 0.2, 0.0)),
            ("left_shoulder", Landmark::new(0.45, 0.3, 0.0)),
            ("right_shoulder", Landmark::new(0.55, 0.3, 0.0)),
            ("right_elbow", Landmark::new(elbow_x, 0.2, 0.0)),
            ("right_wrist", Landmark::new(0.55, 0.1, 0.0)),
            ("left_hip", Landmark::new(0.46, 0.55, 0.0)),
            ("right_hip", Landmark::new(0.54, 0.55, 0.0)),
            ("left_ankle", Landmark::new(0.5 - ankle_gap / 2.0, 0.9, 0.0)),
            ("right_ankle", Landmark::new(0.5 + ankle_gap / 2.0, 0.9, 0.0)),
        ])
    }

    #[test]
    fn test_tucked_elbow_scores_full() {
        let frames = vec![shooter(0.56, 0.15); 10];
        let measure = elbow_alignment(&frames).unwrap();
        assert_eq!(measure.score, 100.0);
    }

    #[test]
    fn test_flared_elbow_is_penalized() {
        let frames = vec![shooter(0.70, 0.15); 10];
        let measure = elbow_alignment(&frames).unwrap();
        assert!(measure.value > 15.0);
        assert!(measure.score < 60.0);
    }

    #[test]
    fn test_base_stability_prefers_shoulder_width() {
        let good = base_stability(&vec![shooter(0.56, 0.15); 5]).unwrap();
        let narrow = base_stability(&vec![shooter(0.56, 0.02); 5]).unwrap();
        assert!((good.score - 100.0).abs() < 1e-9);
        assert!(narrow.score < 40.0);
    }

    #[test]
    fn test_free_throw_expects_less_knee_bend() {
        assert!(ideal_knee_angle(Movement::FreeThrow) > ideal_knee_angle(Movement::ShotOffDribble));
    }

    #[test]
    fn test_report_marks_critical_metrics() {
        let frames = vec![shooter(0.70, 0.02); 10];
        let report = extract(Movement::FreeThrow, &frames);
        assert_eq!(report.critical, CRITICAL);
        assert!(report.metrics.iter().any(|m| m.name == "elbow_alignment"));
        // No knees in these frames.
        assert!(report.metrics.iter().all(|m| m.name != "knee_bend"));
    }
}
