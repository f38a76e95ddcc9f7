//! Striking technique with the right foot, planting on the left.

use serde_json::json;

use formlab_core::{FeedbackLevel, PoseFrame};

use super::geometry::{
    ankle_angle, band_score, max, mean, middle, position_spread, series, stability_score,
    std_dev, tail, torso_lean, weight_shift,
};
use super::{Advice, Measure, Movement, MovementReport, ReportBuilder};

pub(super) fn extract(movement: Movement, frames: &[PoseFrame]) -> MovementReport {
    let mut report = ReportBuilder::new(frames);
    report.meta("kicking_foot", json!("right"));

    let critical: &'static [&'static str] = if movement == Movement::SoccerPassing {
        report.record("ankle_stability", ankle_stability(frames), "deg", &ANKLE_STABILITY);
        report.record("plant_foot", plant_foot(frames), "frame", &PLANT_FOOT);
        report.record("weight_transfer", weight_transfer(frames, (0.1, 0.6)), "shoulder_widths", &WEIGHT_TRANSFER);
        report.record("follow_through", follow_through(frames), "deg", &PASS_FOLLOW_THROUGH);
        report.record("balance", balance(frames), "frame", &BALANCE);
        &["ankle_stability"]
    } else {
        report.record("lean_forward", lean_forward(frames), "deg", &LEAN_FORWARD);
        report.record("plant_foot", plant_foot(frames), "frame", &PLANT_FOOT);
        report.record("weight_transfer", weight_transfer(frames, (0.2, 0.8)), "shoulder_widths", &WEIGHT_TRANSFER);
        report.record("follow_through", follow_through(frames), "deg", &SHOT_FOLLOW_THROUGH);
        report.record("balance", balance(frames), "frame", &BALANCE);
        &["lean_forward"]
    };

    report.finish(movement, critical)
}

// =============================================================================
// METRICS
// =============================================================================

/// Torso lean over the ball through the strike window.
fn lean_forward(frames: &[PoseFrame]) -> Option<Measure> {
    let lean = mean(&series(middle(frames, 0.4, 0.8), torso_lean))?;
    Some(Measure::new(band_score(lean, 5.0, 25.0, 3.0), lean))
}

/// Variation of the kicking ankle angle through contact.
fn ankle_stability(frames: &[PoseFrame]) -> Option<Measure> {
    let spread = std_dev(&series(middle(frames, 0.3, 0.9), |f| ankle_angle(f, "right")))?;
    Some(Measure::new(stability_score(spread, 4.0), spread))
}

fn plant_foot(frames: &[PoseFrame]) -> Option<Measure> {
    let spread = position_spread(middle(frames, 0.4, 1.0), |f| f.landmark("left_ankle").copied())?;
    Some(Measure::new(stability_score(spread, 1500.0), spread))
}

fn weight_transfer(frames: &[PoseFrame], target: (f64, f64)) -> Option<Measure> {
    let shift = weight_shift(frames, 0.2)?;
    Some(Measure::new(band_score(shift, target.0, target.1, 120.0), shift))
}

/// Kicking-leg extension after contact.
fn follow_through(frames: &[PoseFrame]) -> Option<Measure> {
    let extension = max(&series(tail(frames, 0.3), |f| f.angle("right_knee")))?;
    Some(Measure::new(band_score(extension, 150.0, 180.0, 2.0), extension))
}

fn balance(frames: &[PoseFrame]) -> Option<Measure> {
    let spread = position_spread(tail(frames, 0.3), |f| f.landmark("nose").copied())?;
    Some(Measure::new(stability_score(spread, 1000.0), spread))
}

// =============================================================================
// ADVICE
// =============================================================================

const LEAN_FORWARD: Advice = Advice {
    praise: "Chest over the ball at contact",
    cue: "Over the ball",
    observation: "You lean back as you strike the ball",
    impact: "Leaning back sends shots over the bar",
    steps: &["Keep your chest over the ball at contact", "Land on your kicking foot after the strike"],
    drill: "Volley a dropped ball into the ground just in front of the goal",
    severity: FeedbackLevel::Critical,
    minor: Some("Slightly upright at contact"),
};

const ANKLE_STABILITY: Advice = Advice {
    praise: "Locked ankle through contact",
    cue: "Lock the ankle",
    observation: "Your kicking ankle flexes at contact",
    impact: "A loose ankle sends passes off line and takes pace off the ball",
    steps: &["Point your toes up and out for the inside of the foot", "Hold the ankle firm through the pass"],
    drill: "Wall passes with a short backswing, focusing on a firm ankle",
    severity: FeedbackLevel::Critical,
    minor: Some("Ankle softens slightly at contact"),
};

const PLANT_FOOT: Advice = Advice {
    praise: "Solid plant foot beside the ball",
    cue: "Plant and strike",
    observation: "Your plant foot slides during the strike",
    impact: "A moving plant foot robs the strike of power and direction",
    steps: &["Plant beside the ball with the toe pointing at the target", "Keep the plant foot still until contact"],
    drill: "Stationary ball strikes, freezing on the plant foot",
    severity: FeedbackLevel::Warning,
    minor: Some("Plant foot shifts slightly"),
};

const WEIGHT_TRANSFER: Advice = Advice {
    praise: "Body moves through the ball",
    cue: "Through the ball",
    observation: "Your body stays behind the ball through the strike",
    impact: "Without moving through the ball, power comes only from the leg",
    steps: &["Step into the strike", "Let your hips travel toward the target"],
    drill: "Running strikes from a three-step approach",
    severity: FeedbackLevel::Warning,
    minor: Some("Weight transfer is a little short"),
};

const SHOT_FOLLOW_THROUGH: Advice = Advice {
    praise: "Full follow-through toward the target",
    cue: "Kick through the ball",
    observation: "Your kicking leg stops at contact",
    impact: "Stopping the leg early takes pace off the shot",
    steps: &["Swing the kicking leg through toward the target", "Land on the kicking foot"],
    drill: "Shoot and land drill: strike and land one step past the ball",
    severity: FeedbackLevel::Warning,
    minor: Some("Follow-through could be fuller"),
};

const PASS_FOLLOW_THROUGH: Advice = Advice {
    praise: "Smooth follow-through toward your teammate",
    cue: "Finish at the target",
    observation: "Your passing leg stops short after contact",
    impact: "A short finish makes pass weight inconsistent",
    steps: &["Point the passing foot at the target after contact"],
    drill: "Gate passing through cones at varying distances",
    severity: FeedbackLevel::Warning,
    minor: None,
};

const BALANCE: Advice = Advice {
    praise: "Balanced after the strike",
    cue: "Stay tall",
    observation: "You lose balance after contact",
    impact: "Losing balance makes the next action slower",
    steps: &["Keep your arms out for balance", "Finish over your landing foot"],
    drill: "Strike and hold on one leg for two seconds",
    severity: FeedbackLevel::Warning,
    minor: Some("Slight wobble after contact"),
};
