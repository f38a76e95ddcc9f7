//! Barbell lift technique: squats, deadlifts and the bench press.
//!
//! Each lift is analyzed around its turnaround frame (the bottom of a squat
//! or press, the lowest hinge of a deadlift).

use serde_json::json;

use formlab_core::{FeedbackLevel, PoseFrame};

use super::geometry::{
    argmax, at_least_score, band_score, head, max, mean, mid, mid_hip, mid_shoulder, mid_wrist,
    min, paired_angle, phase_share, position_spread, series, stability_score, std_dev,
    torso_lean, width,
};
use super::{Advice, Measure, Movement, MovementReport, ReportBuilder};

/// Depth targets and limits that differ between lifts.
struct LiftProfile {
    depth: f64,
    lean_limit: f64,
    tempo: (f64, f64),
}

fn profile(movement: Movement) -> LiftProfile {
    match movement {
        Movement::FrontSquat => LiftProfile {
            depth: 0.75,
            lean_limit: 30.0,
            tempo: (40.0, 70.0),
        },
        Movement::Deadlift => LiftProfile {
            depth: 0.6,
            lean_limit: 60.0,
            tempo: (30.0, 70.0),
        },
        Movement::RomanianDeadlift => LiftProfile {
            depth: 0.65,
            lean_limit: 70.0,
            tempo: (40.0, 70.0),
        },
        Movement::BenchPress => LiftProfile {
            depth: 0.5,
            lean_limit: 90.0,
            tempo: (42.0, 78.0),
        },
        _ => LiftProfile {
            depth: 0.7,
            lean_limit: 45.0,
            tempo: (40.0, 70.0),
        },
    }
}

pub(super) fn extract(movement: Movement, frames: &[PoseFrame]) -> MovementReport {
    let lift = profile(movement);
    let mut report = ReportBuilder::new(frames);
    report.meta("depth_target", json!(lift.depth));

    let critical: &'static [&'static str] = match movement {
        Movement::BenchPress => {
            report.record("back_tightness", back_tightness(frames), "frame", &BACK_TIGHTNESS);
            report.record("depth", press_depth(frames, lift.depth), "upper_arms", &DEPTH);
            report.record("bar_path", bar_path(frames), "frame_width", &BAR_PATH);
            report.record("spine_alignment", hips_on_bench(frames), "frame", &HIPS_DOWN);
            report.record("tempo", tempo(frames, lift.tempo, press_height), "pct", &TEMPO);
            report.record(
                "elbow_angle",
                bottom_angle(frames, "elbow", (75.0, 105.0)),
                "deg",
                &ELBOW_ANGLE,
            );
            &["spine_alignment", "bar_path"]
        }
        Movement::RomanianDeadlift => {
            report.record("hip_hinge", hip_hinge(frames), "ratio", &HIP_HINGE);
            standard(&mut report, frames, &lift);
            report.record("hip_angle", bottom_angle(frames, "hip", (105.0, 155.0)), "deg", &HIP_ANGLE);
            &["hip_hinge", "spine_alignment"]
        }
        Movement::Deadlift => {
            standard(&mut report, frames, &lift);
            report.record("hip_angle", bottom_angle(frames, "hip", (95.0, 145.0)), "deg", &HIP_ANGLE);
            report.record("knee_angle", bottom_angle(frames, "knee", (90.0, 130.0)), "deg", &KNEE_ANGLE);
            &["spine_alignment", "bar_path"]
        }
        Movement::FrontSquat => {
            report.record("elbow_position", elbow_position(frames), "frame_height", &ELBOW_POSITION);
            standard(&mut report, frames, &lift);
            report.record("knee_angle", bottom_angle(frames, "knee", (80.0, 110.0)), "deg", &KNEE_ANGLE);
            &["depth", "spine_alignment", "bar_path"]
        }
        _ => {
            standard(&mut report, frames, &lift);
            report.record("knee_alignment", knee_alignment(frames), "ratio", &KNEE_ALIGNMENT);
            report.record("hip_angle", bottom_angle(frames, "hip", (80.0, 120.0)), "deg", &HIP_ANGLE);
            &["depth", "knee_alignment", "spine_alignment"]
        }
    };

    if let Some(bottom) = bottom_frame(frames) {
        report.meta("turnaround_frame", json!(bottom));
    }
    report.finish(movement, critical)
}

/// Metrics shared by the squat and deadlift family.
fn standard(report: &mut ReportBuilder, frames: &[PoseFrame], lift: &LiftProfile) {
    report.record("depth", hip_depth(frames, lift.depth), "thigh_lengths", &DEPTH);
    report.record("bar_path", bar_path(frames), "frame_width", &BAR_PATH);
    report.record("spine_alignment", spine_alignment(frames, lift.lean_limit), "deg", &SPINE_ALIGNMENT);
    report.record("tempo", tempo(frames, lift.tempo, hip_height), "pct", &TEMPO);
}

// =============================================================================
// METRICS
// =============================================================================

fn hip_height(frame: &PoseFrame) -> Option<f64> {
    mid_hip(frame).map(|p| p.y)
}

fn press_height(frame: &PoseFrame) -> Option<f64> {
    mid_wrist(frame).map(|p| p.y)
}

/// Frame where the hips are lowest.
fn bottom_frame(frames: &[PoseFrame]) -> Option<usize> {
    argmax(frames, hip_height)
}

/// Hip travel from the starting position, in thigh lengths.
fn hip_depth(frames: &[PoseFrame], target: f64) -> Option<Measure> {
    let opening = head(frames, 0.1);
    let start = mean(&series(opening, hip_height))?;
    let thigh = mean(&series(opening, |f| {
        let [hip, knee] = f.landmarks_all(["left_hip", "left_knee"])?;
        Some(hip.distance_2d(knee))
    }))?;
    if thigh <= f64::EPSILON {
        return None;
    }
    let lowest = max(&series(frames, hip_height))?;
    let depth = (lowest - start).max(0.0) / thigh;
    Some(Measure::new(at_least_score(depth, target, 200.0), depth))
}

/// Bar travel in upper-arm lengths.
fn press_depth(frames: &[PoseFrame], target: f64) -> Option<Measure> {
    let heights = series(frames, press_height);
    let travel = max(&heights)? - min(&heights)?;
    let upper_arm = mean(&series(frames, |f| {
        let [shoulder, elbow] = f.landmarks_all(["left_shoulder", "left_elbow"])?;
        Some(shoulder.distance_2d(elbow))
    }))?;
    if upper_arm <= f64::EPSILON {
        return None;
    }
    let depth = travel / upper_arm;
    Some(Measure::new(at_least_score(depth, target, 200.0), depth))
}

fn bar_path(frames: &[PoseFrame]) -> Option<Measure> {
    let drift = std_dev(&series(frames, |f| mid_wrist(f).map(|p| p.x)))?;
    Some(Measure::new(stability_score(drift, 1500.0), drift))
}

fn spine_alignment(frames: &[PoseFrame], limit: f64) -> Option<Measure> {
    let lean = max(&series(frames, torso_lean))?;
    Some(Measure::new(band_score(lean, 0.0, limit, 2.5), lean))
}

fn hips_on_bench(frames: &[PoseFrame]) -> Option<Measure> {
    let spread = position_spread(frames, mid_hip)?;
    Some(Measure::new(stability_score(spread, 2000.0), spread))
}

/// Share of the rep spent before the turnaround, in percent.
fn tempo(
    frames: &[PoseFrame],
    target: (f64, f64),
    height: fn(&PoseFrame) -> Option<f64>,
) -> Option<Measure> {
    let share = phase_share(frames, |f| height(f).map(|y| -y))?;
    Some(Measure::new(band_score(share, target.0, target.1, 2.0), share))
}

/// Smallest angle of a paired joint, scored against an ideal range.
fn bottom_angle(frames: &[PoseFrame], joint: &str, range: (f64, f64)) -> Option<Measure> {
    let angle = min(&series(frames, |f| paired_angle(f, joint)))?;
    Some(Measure::new(band_score(angle, range.0, range.1, 2.0), angle))
}

/// Knee spacing relative to ankle spacing at the bottom.
fn knee_alignment(frames: &[PoseFrame]) -> Option<Measure> {
    let frame = frames.get(bottom_frame(frames)?)?;
    let ankles = width(frame, "left_ankle", "right_ankle")?;
    if ankles <= f64::EPSILON {
        return None;
    }
    let ratio = width(frame, "left_knee", "right_knee")? / ankles;
    Some(Measure::new(band_score(ratio, 0.9, 1.3, 150.0), ratio))
}

/// Elbow height above the shoulders in the front rack.
fn elbow_position(frames: &[PoseFrame]) -> Option<Measure> {
    let lift = mean(&series(frames, |f| {
        Some(mid_shoulder(f)?.y - mid(f, "left_elbow", "right_elbow")?.y)
    }))?;
    Some(Measure::new(band_score(lift, -0.02, 0.1, 400.0), lift))
}

/// Hip angle range over knee angle range; a hinge moves the hips, not the knees.
fn hip_hinge(frames: &[PoseFrame]) -> Option<Measure> {
    let hips = series(frames, |f| paired_angle(f, "hip"));
    let knees = series(frames, |f| paired_angle(f, "knee"));
    let hip_range = max(&hips)? - min(&hips)?;
    let knee_range = max(&knees)? - min(&knees)?;
    let ratio = hip_range / (knee_range + 1.0);
    Some(Measure::new(at_least_score(ratio, 2.0, 30.0), ratio))
}

fn back_tightness(frames: &[PoseFrame]) -> Option<Measure> {
    let spread = position_spread(frames, mid_shoulder)?;
    Some(Measure::new(stability_score(spread, 1500.0), spread))
}

// =============================================================================
// ADVICE
// =============================================================================

const DEPTH: Advice = Advice {
    praise: "Full range of motion on every rep",
    cue: "Own the bottom",
    observation: "Your reps stop short of full range of motion",
    impact: "Partial reps limit strength gains through the full range",
    steps: &[
        "Lower the weight until you reach the target position",
        "Reduce the load until full range feels controlled",
    ],
    drill: "Pause reps at the bottom for two seconds",
    severity: FeedbackLevel::Critical,
    minor: Some("Depth is close to the target"),
};

const KNEE_ALIGNMENT: Advice = Advice {
    praise: "Knees track in line with your feet",
    cue: "Knees out",
    observation: "Your knees cave inward at the bottom",
    impact: "Knee collapse loads the joint unevenly and leaks power",
    steps: &["Spread the floor with your feet", "Push your knees over your toes on the way up"],
    drill: "Banded squats with a mini band just above the knees",
    severity: FeedbackLevel::Critical,
    minor: Some("Knees drift slightly from your toes"),
};

const BAR_PATH: Advice = Advice {
    praise: "Straight, vertical bar path",
    cue: "Bar over midfoot",
    observation: "The bar drifts forward and back during the rep",
    impact: "A wandering bar path wastes energy and shifts load to the lower back",
    steps: &["Keep the bar over the middle of your foot", "Keep the bar close to your body"],
    drill: "Film from the side with a line drawn through midfoot",
    severity: FeedbackLevel::Warning,
    minor: Some("Bar path wavers slightly"),
};

const SPINE_ALIGNMENT: Advice = Advice {
    praise: "Neutral spine under load",
    cue: "Chest proud",
    observation: "Your torso tips too far forward under the bar",
    impact: "Excessive lean puts shear on the lower back",
    steps: &["Brace your core before each rep", "Lead with the chest out of the bottom"],
    drill: "Tempo reps with a three-second descent at a lighter load",
    severity: FeedbackLevel::Critical,
    minor: Some("Torso angle opens up a little at the bottom"),
};

const HIPS_DOWN: Advice = Advice {
    praise: "Hips stay planted on the bench",
    cue: "Glutes on the bench",
    observation: "Your hips lift off the bench during the press",
    impact: "Lifting the hips strains the lower back and shortens the press",
    steps: &["Drive through your heels toward your head", "Keep your glutes in contact with the bench"],
    drill: "Feet-up bench press at a lighter load",
    severity: FeedbackLevel::Critical,
    minor: Some("Hips shift slightly during the press"),
};

const TEMPO: Advice = Advice {
    praise: "Controlled tempo through the rep",
    cue: "Control down, drive up",
    observation: "Your lowering and lifting phases are out of balance",
    impact: "Dropping into the bottom loses tension and position",
    steps: &["Lower under control", "Drive up with intent once you reach the bottom"],
    drill: "Count three seconds down, one second up",
    severity: FeedbackLevel::Warning,
    minor: None,
};

const HIP_ANGLE: Advice = Advice {
    praise: "Good hip position at the bottom",
    cue: "Hips set",
    observation: "Your hip angle at the bottom is outside the target range",
    impact: "Poor hip position shifts work away from the glutes and hamstrings",
    steps: &["Set your hips at the start of every rep", "Match the hip depth from rep to rep"],
    drill: "Box touch reps set to the target depth",
    severity: FeedbackLevel::Warning,
    minor: Some("Hip angle is just outside the ideal range"),
};

const KNEE_ANGLE: Advice = Advice {
    praise: "Good knee bend at the bottom",
    cue: "Knees set",
    observation: "Your knee angle at the bottom is outside the target range",
    impact: "Too much or too little knee bend changes which muscles do the work",
    steps: &["Set your shins before the rep", "Keep the knee bend consistent between reps"],
    drill: "Paused reps at the target knee angle",
    severity: FeedbackLevel::Warning,
    minor: None,
};

const ELBOW_ANGLE: Advice = Advice {
    praise: "Elbows reach about ninety degrees at the bottom",
    cue: "Elbows under the bar",
    observation: "Your elbow angle at the bottom is outside the target range",
    impact: "Flared or overly tucked elbows stress the shoulder",
    steps: &["Tuck the elbows slightly", "Touch the bar at the lower chest"],
    drill: "Board presses to groove the bottom position",
    severity: FeedbackLevel::Warning,
    minor: None,
};

const ELBOW_POSITION: Advice = Advice {
    praise: "High elbows in the front rack",
    cue: "Elbows up",
    observation: "Your elbows drop in the front rack",
    impact: "Dropped elbows let the bar roll forward off the shoulders",
    steps: &["Drive the elbows up out of the bottom", "Keep the upper arms parallel to the floor"],
    drill: "Front rack holds with elbows high",
    severity: FeedbackLevel::Warning,
    minor: Some("Elbows sag a little during the rep"),
};

const HIP_HINGE: Advice = Advice {
    praise: "Clean hip hinge with soft knees",
    cue: "Hips back",
    observation: "Your knees bend too much instead of hinging at the hips",
    impact: "Squatting the movement takes load off the hamstrings",
    steps: &["Push the hips back toward the wall behind you", "Keep a soft, fixed knee bend"],
    drill: "Dowel hinge with the dowel touching head, upper back and tailbone",
    severity: FeedbackLevel::Critical,
    minor: Some("Knee bend creeps in during the hinge"),
};

const BACK_TIGHTNESS: Advice = Advice {
    praise: "Upper back stays tight and set",
    cue: "Shoulders pinned",
    observation: "Your shoulders shift on the bench during the press",
    impact: "Losing the upper-back set reduces stability and shoulder safety",
    steps: &["Pull the shoulder blades together before unracking", "Keep them pinned through every rep"],
    drill: "Band pull-aparts before pressing",
    severity: FeedbackLevel::Warning,
    minor: Some("Upper back loosens slightly"),
};
