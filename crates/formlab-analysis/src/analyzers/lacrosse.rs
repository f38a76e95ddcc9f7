//! Overhand lacrosse shot, right-handed.

use serde_json::json;

use formlab_core::{FeedbackLevel, PoseFrame};

use super::geometry::{
    band_score, finish_balance, max, mean, min, series, stability_score, weight_shift, width,
};
use super::{Advice, Measure, Movement, MovementReport, ReportBuilder};

const CRITICAL: &[&str] = &["weight_transfer"];

pub(super) fn extract(movement: Movement, frames: &[PoseFrame]) -> MovementReport {
    let mut report = ReportBuilder::new(frames);
    report.meta("shooting_hand", json!("right"));

    report.record("weight_transfer", weight_transfer(frames), "shoulder_widths", &WEIGHT_TRANSFER);
    report.record("hip_rotation", hip_rotation(frames), "ratio", &HIP_ROTATION);
    report.record("balance", balance(frames), "frame", &BALANCE);
    report.record("follow_through", follow_through(frames), "shoulder_widths", &FOLLOW_THROUGH);

    report.finish(movement, CRITICAL)
}

fn weight_transfer(frames: &[PoseFrame]) -> Option<Measure> {
    let shift = weight_shift(frames, 0.2)?;
    Some(Measure::new(band_score(shift, 0.2, 0.8, 120.0), shift))
}

/// Change in projected hip width; hips that turn appear narrower to the camera.
fn hip_rotation(frames: &[PoseFrame]) -> Option<Measure> {
    let widths = series(frames, |f| width(f, "left_hip", "right_hip"));
    let widest = max(&widths)?;
    if widest <= f64::EPSILON {
        return None;
    }
    let turn = (widest - min(&widths)?) / widest;
    Some(Measure::new(band_score(turn, 0.25, 1.0, 200.0), turn))
}

fn balance(frames: &[PoseFrame]) -> Option<Measure> {
    let spread = finish_balance(frames, 0.25)?;
    Some(Measure::new(stability_score(spread, 1000.0), spread))
}

/// Horizontal travel of the top hand across the body.
fn follow_through(frames: &[PoseFrame]) -> Option<Measure> {
    let xs = series(frames, |f| f.landmark("right_wrist").map(|w| w.x));
    let shoulders = mean(&series(frames, |f| width(f, "left_shoulder", "right_shoulder")))?;
    if shoulders <= f64::EPSILON {
        return None;
    }
    let travel = (max(&xs)? - min(&xs)?) / shoulders;
    Some(Measure::new(band_score(travel, 1.0, 5.0, 60.0), travel))
}

const WEIGHT_TRANSFER: Advice = Advice {
    praise: "Strong step into the shot",
    cue: "Step and throw",
    observation: "Your weight stays on the back foot as you shoot",
    impact: "Shooting off the back foot costs velocity and accuracy",
    steps: &[
        "Step toward the target with your front foot",
        "Drive your back hip through as you release",
    ],
    drill: "Step-down shooting: start on the back foot and step into every shot",
    severity: FeedbackLevel::Critical,
    minor: Some("Weight transfer stops a little early"),
};

const HIP_ROTATION: Advice = Advice {
    praise: "Hips drive the shot",
    cue: "Hips then shoulders",
    observation: "Your hips stay square throughout the shot",
    impact: "Without hip rotation the arms supply all the power",
    steps: &["Turn the front shoulder toward the target on the wind-up", "Rotate hips before shoulders"],
    drill: "Kneeling shots to isolate the upper body, then standing shots adding the hips",
    severity: FeedbackLevel::Warning,
    minor: Some("Hip turn is a little limited"),
};

const BALANCE: Advice = Advice {
    praise: "Balanced, athletic finish",
    cue: "Finish strong",
    observation: "You fall away after the release",
    impact: "Falling away sends the ball high",
    steps: &["Keep your head over your front foot", "Hold the finish for a beat"],
    drill: "Shoot and freeze at the finish",
    severity: FeedbackLevel::Warning,
    minor: Some("Slight drift after release"),
};

const FOLLOW_THROUGH: Advice = Advice {
    praise: "Full follow-through across the body",
    cue: "Stick to the hip",
    observation: "Your top hand stops short after release",
    impact: "A short finish reduces stick speed at release",
    steps: &["Finish with your top hand across your front hip", "Snap the top hand down through release"],
    drill: "Follow-through to a target: touch the stick head to the opposite hip",
    severity: FeedbackLevel::Warning,
    minor: None,
};
