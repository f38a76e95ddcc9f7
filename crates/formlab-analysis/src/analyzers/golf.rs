//! Full swing, chip and putting analysis for a right-handed golfer filmed face-on.

use serde_json::json;

use formlab_core::{FeedbackLevel, PoseFrame};

use super::geometry::{
    argmax, argmin, band_score, finish_balance, head, max, mean, mid_ankle, mid_hip,
    mid_shoulder, mid_wrist, phase_share, position_spread, series, stability_score, std_dev,
    tail, torso_lean, weight_shift, width,
};
use super::{Advice, Measure, Movement, MovementReport, ReportBuilder};

/// Target ranges that differ between clubs.
struct SwingProfile {
    stance: (f64, f64),
    transfer: (f64, f64),
    tempo: (f64, f64),
}

const DRIVER: SwingProfile = SwingProfile {
    stance: (1.1, 1.6),
    transfer: (0.15, 0.6),
    tempo: (60.0, 80.0),
};

const IRON: SwingProfile = SwingProfile {
    stance: (0.9, 1.4),
    transfer: (0.1, 0.5),
    tempo: (60.0, 80.0),
};

/// Chip tempo is closer to even back and through.
const CHIP_TEMPO: (f64, f64) = (40.0, 60.0);

pub(super) fn extract(movement: Movement, frames: &[PoseFrame]) -> MovementReport {
    let mut report = ReportBuilder::new(frames);
    report.meta("handedness", json!("right"));

    let critical: &'static [&'static str] = match movement {
        Movement::IronSwing => {
            report.record("ball_contact", ball_contact(frames), "shoulder_widths", &BALL_CONTACT);
            full_swing(&mut report, frames, &IRON);
            if let Some(impact) = impact_frame(frames) {
                report.meta("impact_frame", json!(impact));
            }
            &["ball_contact"]
        }
        Movement::ChipShot => {
            report.record("weight_forward", weight_forward(frames), "stance_widths", &WEIGHT_FORWARD);
            report.record("wrist_stability", wrist_stability(frames), "deg", &WRIST_STABILITY);
            report.record("balance", still_balance(frames), "frame", &BALANCE);
            report.record("tempo", tempo(frames, CHIP_TEMPO), "pct", &TEMPO);
            &["weight_forward"]
        }
        Movement::PuttingStroke => {
            report.record("shoulder_stability", shoulder_stability(frames), "frame", &SHOULDER_STABILITY);
            report.record("wrist_stability", wrist_stability(frames), "deg", &WRIST_STABILITY);
            report.record("head_stability", head_stability(frames), "frame", &HEAD_STABILITY);
            report.record("balance", still_balance(frames), "frame", &BALANCE);
            &["shoulder_stability"]
        }
        _ => {
            full_swing(&mut report, frames, &DRIVER);
            &["swing_path"]
        }
    };

    report.finish(movement, critical)
}

fn full_swing(report: &mut ReportBuilder, frames: &[PoseFrame], profile: &SwingProfile) {
    report.record("swing_path", swing_path(frames), "ratio", &SWING_PATH);
    report.record(
        "weight_transfer",
        weight_transfer(frames, profile.transfer),
        "shoulder_widths",
        &WEIGHT_TRANSFER,
    );
    report.record("balance", balance(frames), "frame", &BALANCE);
    report.record("tempo", tempo(frames, profile.tempo), "pct", &TEMPO);
    report.record("follow_through", follow_through(frames), "frame_height", &FOLLOW_THROUGH);
    report.record("stance_width", stance_width(frames, profile.stance), "shoulder_widths", &STANCE_WIDTH);
    report.record("spine_tilt", spine_tilt(frames), "deg", &SPINE_TILT);
}

// =============================================================================
// METRICS
// =============================================================================

/// Consistency of the arm radius around the shoulders, as a coefficient of variation.
fn swing_path(frames: &[PoseFrame]) -> Option<Measure> {
    let radii = series(frames, |f| Some(mid_shoulder(f)?.distance_2d(&mid_wrist(f)?)));
    let avg = mean(&radii)?;
    if avg <= f64::EPSILON {
        return None;
    }
    let variation = std_dev(&radii)? / avg;
    Some(Measure::new(stability_score(variation, 250.0), variation))
}

fn weight_transfer(frames: &[PoseFrame], target: (f64, f64)) -> Option<Measure> {
    let shift = weight_shift(frames, 0.2)?;
    Some(Measure::new(band_score(shift, target.0, target.1, 150.0), shift))
}

fn balance(frames: &[PoseFrame]) -> Option<Measure> {
    let spread = finish_balance(frames, 0.25)?;
    Some(Measure::new(stability_score(spread, 1000.0), spread))
}

/// Lower-body steadiness over the whole stroke.
fn still_balance(frames: &[PoseFrame]) -> Option<Measure> {
    let spread = position_spread(frames, mid_hip)?;
    Some(Measure::new(stability_score(spread, 1500.0), spread))
}

/// Percentage of the motion spent before the hands reach their highest point.
fn tempo(frames: &[PoseFrame], target: (f64, f64)) -> Option<Measure> {
    let share = phase_share(frames, |f| mid_wrist(f).map(|p| p.y))?;
    Some(Measure::new(band_score(share, target.0, target.1, 2.0), share))
}

fn follow_through(frames: &[PoseFrame]) -> Option<Measure> {
    let finish = max(&series(tail(frames, 0.2), |f| {
        Some(mid_shoulder(f)?.y - mid_wrist(f)?.y)
    }))?;
    Some(Measure::new(band_score(finish, 0.0, 0.5, 300.0), finish))
}

fn stance_width(frames: &[PoseFrame], target: (f64, f64)) -> Option<Measure> {
    let ratio = mean(&series(head(frames, 0.2), |f| {
        let shoulders = width(f, "left_shoulder", "right_shoulder")?;
        if shoulders <= f64::EPSILON {
            return None;
        }
        Some(width(f, "left_ankle", "right_ankle")? / shoulders)
    }))?;
    Some(Measure::new(band_score(ratio, target.0, target.1, 150.0), ratio))
}

fn spine_tilt(frames: &[PoseFrame]) -> Option<Measure> {
    let tilt = mean(&series(head(frames, 0.2), torso_lean))?;
    Some(Measure::new(band_score(tilt, 0.0, 20.0, 2.0), tilt))
}

/// Lowest hand position after the top of the backswing.
fn impact_frame(frames: &[PoseFrame]) -> Option<usize> {
    let top = argmin(frames, |f| mid_wrist(f).map(|p| p.y))?;
    let after = &frames[top..];
    argmax(after, |f| mid_wrist(f).map(|p| p.y)).map(|i| top + i)
}

/// Hands back over the body center at impact, in shoulder widths of offset.
fn ball_contact(frames: &[PoseFrame]) -> Option<Measure> {
    let frame = frames.get(impact_frame(frames)?)?;
    let shoulders = width(frame, "left_shoulder", "right_shoulder")?;
    if shoulders <= f64::EPSILON {
        return None;
    }
    let offset = (mid_wrist(frame)?.x - mid_hip(frame)?.x).abs() / shoulders;
    Some(Measure::new(band_score(offset, 0.0, 0.3, 150.0), offset))
}

/// Hip center toward the lead (left) foot, in stance widths.
fn weight_forward(frames: &[PoseFrame]) -> Option<Measure> {
    let lean = mean(&series(frames, |f| {
        let [lead, trail] = f.landmarks_all(["left_ankle", "right_ankle"])?;
        let stance = (lead.x - trail.x).abs();
        if stance <= f64::EPSILON {
            return None;
        }
        let toward_lead = (lead.x - trail.x).signum();
        Some((mid_hip(f)?.x - mid_ankle(f)?.x) * toward_lead / stance)
    }))?;
    Some(Measure::new(band_score(lean, 0.05, 0.4, 200.0), lean))
}

/// Lead-arm angle variation; the lead wrist and elbow should move as a unit.
fn wrist_stability(frames: &[PoseFrame]) -> Option<Measure> {
    let angles = series(frames, |f| f.angle("left_elbow"));
    let spread = std_dev(&angles)?;
    Some(Measure::new(stability_score(spread, 4.0), spread))
}

fn head_stability(frames: &[PoseFrame]) -> Option<Measure> {
    let spread = position_spread(frames, |f| f.landmark("nose").copied())?;
    Some(Measure::new(stability_score(spread, 2000.0), spread))
}

fn shoulder_stability(frames: &[PoseFrame]) -> Option<Measure> {
    let spread = position_spread(frames, mid_shoulder)?;
    Some(Measure::new(stability_score(spread, 1500.0), spread))
}

// =============================================================================
// ADVICE
// =============================================================================

const SWING_PATH: Advice = Advice {
    praise: "Consistent arm radius keeps the club on plane",
    cue: "Wide and connected",
    observation: "Your arms collapse and extend during the swing",
    impact: "A changing radius moves the low point and the club face",
    steps: &[
        "Keep your lead arm extended through the backswing",
        "Turn your chest instead of lifting your arms",
    ],
    drill: "Towel under both armpits for half swings",
    severity: FeedbackLevel::Critical,
    minor: Some("Arm radius varies a little during the swing"),
};

const BALL_CONTACT: Advice = Advice {
    praise: "Hands return over the ball at impact",
    cue: "Hands lead the clubhead",
    observation: "Your hands are well away from your body center at impact",
    impact: "This leads to fat and thin strikes",
    steps: &[
        "Feel the hands slightly ahead of the ball at impact",
        "Keep your chest over the ball through the strike",
    ],
    drill: "Line drill: strike a chalk line, taking turf only in front of it",
    severity: FeedbackLevel::Critical,
    minor: Some("Impact position is slightly off center"),
};

const WEIGHT_TRANSFER: Advice = Advice {
    praise: "Strong shift from trail side to lead side",
    cue: "Finish on your lead foot",
    observation: "Your weight stays on the trail side through impact",
    impact: "Hanging back costs distance and causes thin contact",
    steps: &[
        "Start the downswing by bumping your hips toward the target",
        "Finish with your trail heel off the ground",
    ],
    drill: "Step-through drill: walk your trail foot forward after each swing",
    severity: FeedbackLevel::Warning,
    minor: Some("Weight shift is slightly short of a full transfer"),
};

const BALANCE: Advice = Advice {
    praise: "Balanced, stable finish",
    cue: "Hold the finish",
    observation: "Your lower body keeps moving after the stroke",
    impact: "Losing balance makes strike and direction inconsistent",
    steps: &["Swing at a speed you can hold", "Keep your weight over the middle of your feet"],
    drill: "Hold every finish for three seconds",
    severity: FeedbackLevel::Warning,
    minor: Some("Slight sway in the finish"),
};

const TEMPO: Advice = Advice {
    praise: "Smooth tempo between backswing and downswing",
    cue: "Smooth back, accelerate through",
    observation: "Your backswing and downswing are out of proportion",
    impact: "Rushed transitions throw off sequencing",
    steps: &["Count one-two on the backswing and three at impact", "Pause briefly at the top"],
    drill: "Swing to a metronome",
    severity: FeedbackLevel::Warning,
    minor: None,
};

const FOLLOW_THROUGH: Advice = Advice {
    praise: "Full, high finish",
    cue: "Hands high at the finish",
    observation: "Your swing stops short after impact",
    impact: "Decelerating through the ball costs speed",
    steps: &["Let the arms keep swinging after impact", "Finish with your belt buckle facing the target"],
    drill: "Slow-motion swings held at the finish",
    severity: FeedbackLevel::Warning,
    minor: Some("Finish could be fuller"),
};

const STANCE_WIDTH: Advice = Advice {
    praise: "Stance width suits the club",
    cue: "Set the base first",
    observation: "Your stance width does not suit this club",
    impact: "A poor base limits rotation or stability",
    steps: &["Set your feet before you take the grip", "Widen the stance for longer clubs"],
    drill: "Alignment sticks set at the right width for each club",
    severity: FeedbackLevel::Warning,
    minor: None,
};

const SPINE_TILT: Advice = Advice {
    praise: "Centered spine at address",
    cue: "Stack over the ball",
    observation: "Your upper body leans well off center at address",
    impact: "Address tilt carries into the swing and shifts the low point",
    steps: &["Start with your sternum over the ball", "Tilt only slightly away from the target"],
    drill: "Mirror setup check before each swing",
    severity: FeedbackLevel::Warning,
    minor: None,
};

const WEIGHT_FORWARD: Advice = Advice {
    praise: "Weight stays on the lead side through the chip",
    cue: "Lead side loaded",
    observation: "Your weight drifts back during the chip",
    impact: "A back-foot weight bias causes chunked and bladed chips",
    steps: &["Set up with most of your weight on the lead foot", "Keep it there through the stroke"],
    drill: "Chip with your trail foot on its toe",
    severity: FeedbackLevel::Critical,
    minor: Some("Weight is only slightly forward"),
};

const WRIST_STABILITY: Advice = Advice {
    praise: "Firm, quiet wrists through the stroke",
    cue: "Quiet hands",
    observation: "Your lead wrist breaks down during the stroke",
    impact: "Wrist action adds loft and makes distance control harder",
    steps: &["Rock the shoulders and keep the wrists passive", "Keep the lead arm and shaft in one line"],
    drill: "Stroke with an alignment stick along the lead forearm",
    severity: FeedbackLevel::Warning,
    minor: Some("Slight wrist movement in the stroke"),
};

const HEAD_STABILITY: Advice = Advice {
    praise: "Steady head throughout the stroke",
    cue: "Listen for it to drop",
    observation: "Your head moves during the stroke",
    impact: "Head movement moves the shoulders and pulls the putter off line",
    steps: &["Keep your eyes on the spot where the ball was", "Look up only after the ball is gone"],
    drill: "Putt with a coin under the ball and watch the coin after impact",
    severity: FeedbackLevel::Warning,
    minor: Some("Small head movement during the stroke"),
};

const SHOULDER_STABILITY: Advice = Advice {
    praise: "Shoulders rock with no sway",
    cue: "Rock, don't sway",
    observation: "Your shoulders sway instead of rocking",
    impact: "Sway changes the path and face angle at contact",
    steps: &["Let the shoulders pivot around your spine", "Keep the lower body still"],
    drill: "Putter across the chest, rocking the shoulders to a mirror",
    severity: FeedbackLevel::Critical,
    minor: Some("Shoulders drift slightly during the stroke"),
};
