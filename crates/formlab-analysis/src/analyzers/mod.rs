//! Movement analyzers.
//!
//! Every supported (sport, movement) pair maps to one [`Movement`] variant
//! through a static lookup table; [`Movement::extract`] dispatches to the
//! sport module that measures it.

mod basketball;
pub mod geometry;
mod golf;
mod lacrosse;
mod soccer;
mod weightlifting;

use serde_json::{json, Map, Value as JsonValue};
use tracing::{debug, info};

use formlab_core::defaults;
use formlab_core::{
    Coaching, Error, FeedbackItem, FeedbackLevel, MetricScore, PoseFrame, Result, ScoreBreakdown,
    Sport,
};

use crate::descriptions::{improvement_note, strength_note};
use crate::feedback::{ConsolidationOptions, FeedbackPipeline};
use crate::scoring::ScoringEngine;

// =============================================================================
// MOVEMENT DISPATCH
// =============================================================================

/// Closed set of analyzed movements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Movement {
    ShotOffDribble,
    CatchAndShoot,
    FreeThrow,
    DriverSwing,
    IronSwing,
    ChipShot,
    PuttingStroke,
    BarbellSquat,
    FrontSquat,
    Deadlift,
    RomanianDeadlift,
    BenchPress,
    SoccerShooting,
    SoccerPassing,
    LacrosseShooting,
}

/// (sport, canonical movement id) to analyzer.
const MOVEMENT_TABLE: &[(Sport, &str, Movement)] = &[
    (Sport::Basketball, "shot_off_dribble", Movement::ShotOffDribble),
    (Sport::Basketball, "catch_and_shoot", Movement::CatchAndShoot),
    (Sport::Basketball, "free_throw", Movement::FreeThrow),
    (Sport::Golf, "driver_swing", Movement::DriverSwing),
    (Sport::Golf, "iron_swing", Movement::IronSwing),
    (Sport::Golf, "chip_shot", Movement::ChipShot),
    (Sport::Golf, "putting_stroke", Movement::PuttingStroke),
    (Sport::Weightlifting, "barbell_squat", Movement::BarbellSquat),
    (Sport::Weightlifting, "front_squat", Movement::FrontSquat),
    (Sport::Weightlifting, "deadlift", Movement::Deadlift),
    (Sport::Weightlifting, "romanian_deadlift", Movement::RomanianDeadlift),
    (Sport::Weightlifting, "bench_press", Movement::BenchPress),
    (Sport::Soccer, "shooting_technique", Movement::SoccerShooting),
    (Sport::Soccer, "passing_technique", Movement::SoccerPassing),
    (Sport::Lacrosse, "shooting", Movement::LacrosseShooting),
];

impl Movement {
    /// Find the analyzer for a sport and a (possibly legacy) movement id.
    pub fn lookup(sport: Sport, movement: &str) -> Option<Movement> {
        let id = sport.normalize_movement(movement);
        MOVEMENT_TABLE
            .iter()
            .find(|(s, m, _)| *s == sport && *m == id)
            .map(|(_, _, movement)| *movement)
    }

    /// Resolve caller-supplied sport and movement strings.
    pub fn resolve(sport: &str, movement: &str) -> Result<Movement> {
        let parsed: Sport = sport.parse()?;
        Self::lookup(parsed, movement).ok_or_else(|| Error::UnsupportedMovement {
            sport: parsed.as_str().to_string(),
            movement: movement.trim().to_string(),
        })
    }

    /// Every analyzer in table order.
    pub fn all() -> impl Iterator<Item = Movement> {
        MOVEMENT_TABLE.iter().map(|(_, _, m)| *m)
    }

    fn entry(&self) -> (Sport, &'static str) {
        MOVEMENT_TABLE
            .iter()
            .find(|(_, _, m)| m == self)
            .map(|(s, id, _)| (*s, *id))
            .unwrap_or((Sport::Basketball, "unknown"))
    }

    pub fn sport(&self) -> Sport {
        self.entry().0
    }

    /// Canonical movement id.
    pub fn id(&self) -> &'static str {
        self.entry().1
    }

    fn consolidation(&self) -> ConsolidationOptions {
        ConsolidationOptions {
            hip_rotation_redundant: matches!(self, Movement::LacrosseShooting),
        }
    }

    /// Measure metrics and draft feedback for this movement.
    pub fn extract(&self, frames: &[PoseFrame]) -> MovementReport {
        match self.sport() {
            Sport::Basketball => basketball::extract(*self, frames),
            Sport::Golf => golf::extract(*self, frames),
            Sport::Weightlifting => weightlifting::extract(*self, frames),
            Sport::Soccer => soccer::extract(*self, frames),
            Sport::Lacrosse => lacrosse::extract(*self, frames),
        }
    }
}

impl std::fmt::Display for Movement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.sport(), self.id())
    }
}

/// Raw output of one movement analyzer, before scoring and feedback cleanup.
#[derive(Debug, Clone)]
pub struct MovementReport {
    pub metrics: Vec<MetricScore>,
    pub feedback: Vec<FeedbackItem>,
    /// Metrics whose penalties are amplified.
    pub critical: &'static [&'static str],
    pub consolidation: ConsolidationOptions,
    pub metadata: Map<String, JsonValue>,
}

// =============================================================================
// REPORT BUILDING
// =============================================================================

/// A measured metric: score plus the raw value it came from.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Measure {
    pub score: f64,
    pub value: f64,
}

impl Measure {
    pub fn new(score: f64, value: f64) -> Self {
        Self { score, value }
    }
}

/// Coaching text for one metric.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Advice {
    pub praise: &'static str,
    pub cue: &'static str,
    pub observation: &'static str,
    pub impact: &'static str,
    pub steps: &'static [&'static str],
    pub drill: &'static str,
    pub severity: FeedbackLevel,
    /// Shown for middling scores; `None` stays silent.
    pub minor: Option<&'static str>,
}

/// Scores at or above this earn positive feedback.
const PRAISE_AT: f64 = 85.0;

/// Scores below this earn full coaching feedback.
const COACH_BELOW: f64 = 60.0;

pub(crate) struct ReportBuilder {
    metrics: Vec<MetricScore>,
    feedback: Vec<FeedbackItem>,
    metadata: Map<String, JsonValue>,
}

impl ReportBuilder {
    pub fn new(frames: &[PoseFrame]) -> Self {
        let mut metadata = Map::new();
        metadata.insert("frames_total".into(), json!(frames.len()));
        Self {
            metrics: Vec::new(),
            feedback: Vec::new(),
            metadata,
        }
    }

    /// Record a metric and its feedback. Unmeasurable metrics are left out.
    pub fn record(&mut self, name: &str, measured: Option<Measure>, unit: &str, advice: &Advice) {
        let Some(measure) = measured else {
            debug!(metric = name, "Metric not measurable, skipping");
            return;
        };
        if !measure.score.is_finite() || !measure.value.is_finite() {
            debug!(metric = name, "Metric produced a non-finite value, skipping");
            return;
        }

        let metric = MetricScore::new(name, measure.score)
            .with_value(measure.value)
            .with_unit(unit);
        let score = metric.score;
        self.metrics.push(metric);

        if score >= PRAISE_AT {
            self.feedback
                .push(FeedbackItem::positive(name, advice.praise, Some(advice.cue)));
        } else if score < COACH_BELOW {
            let mut coaching = Coaching::new(advice.observation)
                .impact(advice.impact)
                .drill(advice.drill)
                .cue(advice.cue);
            for step in advice.steps {
                coaching = coaching.step(*step);
            }
            self.feedback
                .push(FeedbackItem::coaching(advice.severity, name, coaching));
        } else if let Some(minor) = advice.minor {
            self.feedback
                .push(FeedbackItem::message(FeedbackLevel::Warning, Some(name), minor));
        }
    }

    /// Attach analyzer-specific context to the result metadata.
    pub fn meta(&mut self, key: &str, value: JsonValue) {
        self.metadata.insert(key.to_string(), value);
    }

    pub fn finish(self, movement: Movement, critical: &'static [&'static str]) -> MovementReport {
        MovementReport {
            metrics: self.metrics,
            feedback: self.feedback,
            critical,
            consolidation: movement.consolidation(),
            metadata: self.metadata,
        }
    }
}

// =============================================================================
// ASSESSMENT
// =============================================================================

/// Scored, cleaned analysis of one movement.
#[derive(Debug, Clone)]
pub struct Assessment {
    pub movement: Movement,
    pub overall_score: f64,
    pub breakdown: ScoreBreakdown,
    pub metrics: Vec<MetricScore>,
    pub feedback: Vec<FeedbackItem>,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub strength_notes: Vec<String>,
    pub improvement_notes: Vec<String>,
    pub metadata: JsonValue,
    pub frames_analyzed: usize,
}

/// Runs extraction, scoring and feedback cleanup for a movement.
#[derive(Debug, Clone, Default)]
pub struct Assessor {
    engine: ScoringEngine,
}

impl Assessor {
    pub fn new(engine: ScoringEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &ScoringEngine {
        &self.engine
    }

    pub fn assess(&self, movement: Movement, frames: &[PoseFrame]) -> Assessment {
        let report = movement.extract(frames);
        self.assess_report(movement, frames.len(), report)
    }

    /// Score and clean an already extracted report.
    pub fn assess_report(
        &self,
        movement: Movement,
        frames_analyzed: usize,
        report: MovementReport,
    ) -> Assessment {
        let breakdown = self.engine.score_metrics(&report.metrics, report.critical);
        let feedback = FeedbackPipeline::new(report.consolidation).clean(report.feedback);

        let strengths: Vec<String> = report
            .metrics
            .iter()
            .filter(|m| m.score >= defaults::STRENGTH_THRESHOLD)
            .map(|m| m.name.clone())
            .collect();
        let weaknesses: Vec<String> = report
            .metrics
            .iter()
            .filter(|m| m.score < defaults::WEAKNESS_THRESHOLD)
            .map(|m| m.name.clone())
            .collect();

        info!(
            sport = %movement.sport(),
            movement = movement.id(),
            overall_score = breakdown.score,
            metric_count = report.metrics.len(),
            feedback_count = feedback.len(),
            "Assessed movement"
        );

        let mut metadata = report.metadata;
        metadata.insert("critical_metrics".into(), json!(report.critical));

        Assessment {
            movement,
            overall_score: breakdown.score,
            strength_notes: strengths.iter().map(|m| strength_note(m)).collect(),
            improvement_notes: weaknesses.iter().map(|m| improvement_note(m)).collect(),
            breakdown,
            metrics: report.metrics,
            feedback,
            strengths,
            weaknesses,
            metadata: JsonValue::Object(metadata),
            frames_analyzed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic;
    use formlab_core::movements::catalog;
    use std::collections::HashSet;

    // =========================================================================
    // Dispatch
    // =========================================================================

    #[test]
    fn test_every_catalog_movement_has_an_analyzer() {
        for sport in catalog() {
            let parsed: Sport = sport.id.parse().unwrap();
            for movement in sport.movements {
                let analyzer = Movement::lookup(parsed, movement.id)
                    .unwrap_or_else(|| panic!("no analyzer for {}/{}", sport.id, movement.id));
                assert_eq!(analyzer.sport(), parsed);
                assert_eq!(analyzer.id(), movement.id);
            }
        }
    }

    #[test]
    fn test_every_analyzer_is_in_catalog() {
        for movement in Movement::all() {
            assert!(movement.sport().movement(movement.id()).is_some());
        }
        let unique: HashSet<_> = Movement::all().collect();
        assert_eq!(unique.len(), MOVEMENT_TABLE.len());
    }

    #[test]
    fn test_resolve_accepts_aliases() {
        assert_eq!(
            Movement::resolve("golf", "driver").unwrap(),
            Movement::DriverSwing
        );
        assert_eq!(
            Movement::resolve("Weightlifting", "back-squat").unwrap(),
            Movement::BarbellSquat
        );
        assert_eq!(
            Movement::resolve("soccer", "shooting").unwrap(),
            Movement::SoccerShooting
        );
    }

    #[test]
    fn test_resolve_errors() {
        assert!(matches!(
            Movement::resolve("cricket", "cover_drive"),
            Err(Error::InvalidInput(_))
        ));
        match Movement::resolve("golf", "free_throw") {
            Err(Error::UnsupportedMovement { sport, movement }) => {
                assert_eq!(sport, "golf");
                assert_eq!(movement, "free_throw");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    // =========================================================================
    // ReportBuilder
    // =========================================================================

    const ADVICE: Advice = Advice {
        praise: "Stable base through the shot",
        cue: "Feet quiet",
        observation: "Your feet drift during the shot",
        impact: "A moving base changes your release",
        steps: &["Set your feet first", "Stay balanced through release"],
        drill: "Form shooting close to the rim",
        severity: FeedbackLevel::Critical,
        minor: Some("Base is slightly unsettled"),
    };

    #[test]
    fn test_record_feedback_bands() {
        let mut builder = ReportBuilder::new(&[]);
        builder.record("a", Some(Measure::new(92.0, 0.1)), "ratio", &ADVICE);
        builder.record("b", Some(Measure::new(70.0, 0.2)), "ratio", &ADVICE);
        builder.record("c", Some(Measure::new(30.0, 0.5)), "ratio", &ADVICE);
        builder.record("d", None, "ratio", &ADVICE);
        let report = builder.finish(Movement::FreeThrow, &["c"]);

        assert_eq!(report.metrics.len(), 3);
        assert_eq!(report.feedback.len(), 3);
        assert_eq!(report.feedback[0].level, FeedbackLevel::Info);
        assert_eq!(report.feedback[1].level, FeedbackLevel::Warning);
        assert_eq!(report.feedback[2].level, FeedbackLevel::Critical);
        assert_eq!(report.metrics[0].unit.as_deref(), Some("ratio"));
    }

    #[test]
    fn test_record_skips_non_finite() {
        let mut builder = ReportBuilder::new(&[]);
        builder.record("a", Some(Measure::new(f64::NAN, 0.1)), "deg", &ADVICE);
        builder.record("b", Some(Measure::new(80.0, f64::INFINITY)), "deg", &ADVICE);
        let report = builder.finish(Movement::FreeThrow, &[]);
        assert!(report.metrics.is_empty());
        assert!(report.feedback.is_empty());
    }

    // =========================================================================
    // Assessor
    // =========================================================================

    #[test]
    fn test_every_movement_assesses_synthetic_frames() {
        let frames = synthetic::frames(60);
        let assessor = Assessor::default();
        for movement in Movement::all() {
            let assessment = assessor.assess(movement, &frames);
            assert!(
                (defaults::SCORE_FLOOR..=defaults::SCORE_CEILING).contains(&assessment.overall_score),
                "{} scored {}",
                movement,
                assessment.overall_score
            );
            assert!(!assessment.metrics.is_empty(), "{} produced no metrics", movement);
            assert!(assessment
                .metrics
                .iter()
                .all(|m| (0.0..=100.0).contains(&m.score)));

            let metrics: Vec<&str> = assessment
                .feedback
                .iter()
                .map(|f| f.metric_name())
                .filter(|m| !m.is_empty())
                .collect();
            let unique: HashSet<_> = metrics.iter().collect();
            assert_eq!(unique.len(), metrics.len(), "{} repeated a metric", movement);
        }
    }

    #[test]
    fn test_missing_landmarks_yield_fallback() {
        let frames = vec![PoseFrame::default(); 10];
        let assessment = Assessor::default().assess(Movement::BarbellSquat, &frames);
        assert!(assessment.metrics.is_empty());
        assert!(assessment.breakdown.used_fallback);
        assert_eq!(assessment.overall_score, defaults::SCORE_FALLBACK);
    }

    #[test]
    fn test_strengths_and_weaknesses_partition_by_threshold() {
        let mut builder = ReportBuilder::new(&[]);
        builder.record("depth", Some(Measure::new(95.0, 1.0)), "ratio", &ADVICE);
        builder.record("tempo", Some(Measure::new(70.0, 50.0)), "pct", &ADVICE);
        builder.record("bar_path", Some(Measure::new(40.0, 0.1)), "ratio", &ADVICE);
        let report = builder.finish(Movement::BarbellSquat, &["bar_path"]);

        let assessment = Assessor::default().assess_report(Movement::BarbellSquat, 3, report);
        assert_eq!(assessment.strengths, vec!["depth"]);
        assert_eq!(assessment.weaknesses, vec!["bar_path"]);
        assert_eq!(assessment.strength_notes, vec!["Excellent depth"]);
        assert_eq!(assessment.improvement_notes, vec!["Bar path needs correction"]);
        assert_eq!(assessment.breakdown.catastrophic_failures, 1);
        assert_eq!(assessment.overall_score, 50.0);
    }
}
