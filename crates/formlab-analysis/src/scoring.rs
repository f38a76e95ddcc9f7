//! Penalty-based aggregation of metric scores into one overall score.
//!
//! Every metric starts from a 90-point benchmark: anything at or above it is
//! free, anything below costs a penalty that grows by band. A handful of hard
//! caps make single disqualifying faults dominate the grade.

use tracing::{debug, warn};

use formlab_core::defaults;
use formlab_core::{round2, MetricScore, ScoreBreakdown};

/// Thresholds for the scoring engine.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringConfig {
    /// Score reported for an empty metric list or a degenerate computation.
    pub fallback: f64,
    /// Lowest score reported for real data.
    pub floor: f64,
    /// Number of 50-59 metrics that caps the score at 60.
    pub max_critical_failures: usize,
    /// Number of 60-74 metrics that caps the score at 65.
    pub max_moderate_failures: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            fallback: defaults::SCORE_FALLBACK,
            floor: defaults::SCORE_FLOOR,
            max_critical_failures: defaults::MAX_CRITICAL_FAILURES,
            max_moderate_failures: defaults::MAX_MODERATE_FAILURES,
        }
    }
}

impl ScoringConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `SCORING_FALLBACK` | `70` | Score used when nothing could be scored |
    /// | `SCORING_MAX_CRITICAL_FAILURES` | `2` | Critical failures before the 60 cap |
    /// | `SCORING_MAX_MODERATE_FAILURES` | `3` | Moderate failures before the 65 cap |
    pub fn from_env() -> Self {
        let fallback = std::env::var("SCORING_FALLBACK")
            .ok()
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|v| v.is_finite())
            .unwrap_or(defaults::SCORE_FALLBACK)
            .clamp(0.0, defaults::SCORE_CEILING);

        let max_critical_failures = std::env::var("SCORING_MAX_CRITICAL_FAILURES")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(defaults::MAX_CRITICAL_FAILURES)
            .max(1);

        let max_moderate_failures = std::env::var("SCORING_MAX_MODERATE_FAILURES")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(defaults::MAX_MODERATE_FAILURES)
            .max(1);

        Self {
            fallback,
            floor: defaults::SCORE_FLOOR,
            max_critical_failures,
            max_moderate_failures,
        }
    }

    /// Set the fallback score.
    pub fn with_fallback(mut self, fallback: f64) -> Self {
        self.fallback = fallback;
        self
    }

    /// Set the critical-failure cap threshold.
    pub fn with_max_critical_failures(mut self, max: usize) -> Self {
        self.max_critical_failures = max;
        self
    }

    /// Set the moderate-failure cap threshold.
    pub fn with_max_moderate_failures(mut self, max: usize) -> Self {
        self.max_moderate_failures = max;
        self
    }
}

/// Penalty for one metric score, rounded to two decimals.
///
/// Zero at or above 90, then linear within each band:
/// 85-90 maps to [-10, -5], 75-85 to [-25, -15], 60-75 to [-40, -30],
/// and below 60 to [-60, -45]. Critical metrics pay 1.5x.
pub fn penalty_for(score: f64, critical: bool) -> f64 {
    let penalty = if score >= defaults::SCORE_BENCHMARK {
        0.0
    } else if score >= 85.0 {
        -5.0 - ((90.0 - score) / 5.0) * 5.0
    } else if score >= 75.0 {
        -15.0 - ((85.0 - score) / 10.0) * 10.0
    } else if score >= 60.0 {
        -30.0 - ((75.0 - score) / 15.0) * 10.0
    } else {
        -45.0 - ((60.0 - score) / 60.0) * 15.0
    };

    let penalty = if critical {
        penalty * defaults::CRITICAL_PENALTY_MULTIPLIER
    } else {
        penalty
    };
    round2(penalty)
}

/// Aggregates metric scores into an overall score.
#[derive(Debug, Clone, Default)]
pub struct ScoringEngine {
    config: ScoringConfig,
}

impl ScoringEngine {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    fn fallback(&self, cap: Option<f64>) -> ScoreBreakdown {
        let score = match cap {
            Some(cap) => self.config.fallback.min(cap),
            None => self.config.fallback,
        };
        ScoreBreakdown {
            score: round2(score),
            penalty_total: 0.0,
            catastrophic_failures: 0,
            critical_failures: 0,
            moderate_failures: 0,
            applied_cap: cap,
            used_fallback: true,
        }
    }

    /// Score an ordered list of metric scores; `critical` holds indices into `scores`.
    ///
    /// Never fails: empty or non-finite input yields the fallback.
    pub fn score(&self, scores: &[f64], critical: &[usize]) -> ScoreBreakdown {
        if scores.is_empty() {
            debug!(fallback = self.config.fallback, "No metric scores, using fallback");
            return self.fallback(None);
        }

        if let Some(bad) = scores.iter().position(|s| !s.is_finite()) {
            warn!(
                index = bad,
                fallback = self.config.fallback,
                "Non-finite metric score, using fallback"
            );
            return self.fallback(None);
        }

        let mut penalty_total = 0.0;
        let (mut catastrophic, mut critical_failures, mut moderate) = (0usize, 0usize, 0usize);

        for (i, &score) in scores.iter().enumerate() {
            penalty_total += penalty_for(score, critical.contains(&i));

            if score < defaults::CATASTROPHIC_BELOW {
                catastrophic += 1;
            } else if score < defaults::CRITICAL_BELOW {
                critical_failures += 1;
            } else if score < defaults::MODERATE_BELOW {
                moderate += 1;
            }
        }

        let cap = if catastrophic >= 1 {
            Some(defaults::CAP_CATASTROPHIC)
        } else if critical_failures >= self.config.max_critical_failures {
            Some(defaults::CAP_CRITICAL)
        } else if moderate >= self.config.max_moderate_failures {
            Some(defaults::CAP_MODERATE)
        } else {
            None
        };

        let raw = defaults::SCORE_CEILING + penalty_total;
        let capped = cap.map_or(raw, |c| raw.min(c));

        let mut breakdown = if capped <= 0.0 {
            debug!(raw, "Penalties exhausted the score, using fallback");
            self.fallback(cap)
        } else {
            ScoreBreakdown {
                score: round2(capped.clamp(self.config.floor, defaults::SCORE_CEILING)),
                penalty_total: 0.0,
                catastrophic_failures: 0,
                critical_failures: 0,
                moderate_failures: 0,
                applied_cap: cap,
                used_fallback: false,
            }
        };

        breakdown.penalty_total = round2(penalty_total);
        breakdown.catastrophic_failures = catastrophic;
        breakdown.critical_failures = critical_failures;
        breakdown.moderate_failures = moderate;

        debug!(
            score = breakdown.score,
            penalty_total = breakdown.penalty_total,
            catastrophic,
            critical = critical_failures,
            moderate,
            cap = ?cap,
            "Scored metrics"
        );
        breakdown
    }

    /// Score metrics, flagging those whose name appears in `critical_names`.
    pub fn score_metrics(&self, metrics: &[MetricScore], critical_names: &[&str]) -> ScoreBreakdown {
        let scores: Vec<f64> = metrics.iter().map(|m| m.score).collect();
        let critical: Vec<usize> = metrics
            .iter()
            .enumerate()
            .filter(|(_, m)| critical_names.contains(&m.name.as_str()))
            .map(|(i, _)| i)
            .collect();
        self.score(&scores, &critical)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> ScoringEngine {
        ScoringEngine::default()
    }

    // =========================================================================
    // penalty_for
    // =========================================================================

    #[test]
    fn test_penalty_band_edges() {
        assert_eq!(penalty_for(100.0, false), 0.0);
        assert_eq!(penalty_for(90.0, false), 0.0);
        assert_eq!(penalty_for(89.99, false), -5.01);
        assert_eq!(penalty_for(85.0, false), -10.0);
        assert_eq!(penalty_for(84.99, false), -15.01);
        assert_eq!(penalty_for(75.0, false), -25.0);
        assert_eq!(penalty_for(74.99, false), -30.01);
        assert_eq!(penalty_for(60.0, false), -40.0);
        assert_eq!(penalty_for(59.99, false), -45.0);
        assert_eq!(penalty_for(0.0, false), -60.0);
    }

    #[test]
    fn test_penalty_interpolates_within_band() {
        assert_eq!(penalty_for(87.5, false), -7.5);
        assert_eq!(penalty_for(80.0, false), -20.0);
        assert_eq!(penalty_for(67.5, false), -35.0);
        assert_eq!(penalty_for(30.0, false), -52.5);
    }

    #[test]
    fn test_critical_penalty_multiplier() {
        assert_eq!(penalty_for(80.0, true), -30.0);
        assert_eq!(penalty_for(95.0, true), 0.0);
        assert_eq!(penalty_for(0.0, true), -90.0);
    }

    // =========================================================================
    // ScoringEngine
    // =========================================================================

    #[test]
    fn test_all_elite_scores_are_uncapped_100() {
        let result = engine().score(&[90.0, 95.0, 100.0, 92.5], &[0, 1]);
        assert_eq!(result.score, 100.0);
        assert_eq!(result.applied_cap, None);
        assert!(!result.used_fallback);
    }

    #[test]
    fn test_empty_list_returns_fallback() {
        let result = engine().score(&[], &[]);
        assert_eq!(result.score, 70.0);
        assert!(result.used_fallback);
    }

    #[test]
    fn test_custom_fallback() {
        let engine = ScoringEngine::new(ScoringConfig::default().with_fallback(55.0));
        assert_eq!(engine.score(&[], &[]).score, 55.0);
    }

    #[test]
    fn test_single_catastrophic_caps_at_50() {
        let result = engine().score(&[100.0, 100.0, 100.0, 100.0, 49.0], &[]);
        // 100 - 47.75 = 52.25, capped to 50
        assert_eq!(result.score, 50.0);
        assert_eq!(result.applied_cap, Some(50.0));
        assert_eq!(result.catastrophic_failures, 1);
    }

    #[test]
    fn test_catastrophic_with_exhausted_penalties_stays_capped() {
        let result = engine().score(&[0.0, 0.0], &[]);
        assert!(result.used_fallback);
        assert_eq!(result.score, 50.0);
    }

    #[test]
    fn test_two_critical_failures_cap_at_60() {
        let result = engine().score(&[55.0, 58.0, 100.0, 100.0, 100.0, 100.0], &[]);
        assert!(result.score <= 60.0);
        assert_eq!(result.critical_failures, 2);
    }

    #[test]
    fn test_critical_cap_raw_already_lower() {
        // 100 - 46.25 - 45.5 = 8.25, below the cap, clamped to the floor
        let result = engine().score(&[55.0, 58.0], &[]);
        assert_eq!(result.applied_cap, Some(60.0));
        assert_eq!(result.score, 40.0);
    }

    #[test]
    fn test_three_moderate_failures_cap_at_65() {
        let scores = [74.0, 74.0, 74.0];
        // 100 - 3 * 30.67 = 7.99, floor wins
        let result = engine().score(&scores, &[]);
        assert_eq!(result.applied_cap, Some(65.0));
        assert_eq!(result.score, 40.0);
    }

    #[test]
    fn test_moderate_cap_threshold_configurable() {
        let engine = ScoringEngine::new(ScoringConfig::default().with_max_moderate_failures(1));
        let result = engine.score(&[74.0, 100.0], &[]);
        assert_eq!(result.applied_cap, Some(65.0));
        assert_eq!(result.score, 65.0);
    }

    #[test]
    fn test_critical_threshold_configurable() {
        let engine = ScoringEngine::new(ScoringConfig::default().with_max_critical_failures(3));
        let result = engine.score(&[55.0, 58.0], &[]);
        assert_eq!(result.applied_cap, None);
    }

    #[test]
    fn test_catastrophic_takes_precedence_over_other_caps() {
        let result = engine().score(&[40.0, 55.0, 56.0, 70.0, 70.0, 70.0], &[]);
        assert_eq!(result.applied_cap, Some(50.0));
    }

    #[test]
    fn test_single_minor_deviation() {
        let result = engine().score(&[87.5], &[]);
        assert_eq!(result.score, 92.5);
        assert_eq!(result.penalty_total, -7.5);
    }

    #[test]
    fn test_critical_index_increases_penalty() {
        let plain = engine().score(&[80.0, 95.0], &[]);
        let critical = engine().score(&[80.0, 95.0], &[0]);
        assert_eq!(plain.score, 80.0);
        assert_eq!(critical.score, 70.0);
    }

    #[test]
    fn test_non_finite_score_falls_back() {
        let result = engine().score(&[90.0, f64::NAN], &[]);
        assert!(result.used_fallback);
        assert_eq!(result.score, 70.0);

        let result = engine().score(&[f64::INFINITY], &[]);
        assert_eq!(result.score, 70.0);
    }

    #[test]
    fn test_output_always_in_range_or_fallback() {
        let engine = engine();
        let grid = [0.0, 10.0, 45.0, 49.9, 50.0, 59.9, 60.0, 74.9, 75.0, 84.9, 85.0, 89.9, 90.0, 100.0];
        for &a in &grid {
            for &b in &grid {
                for &c in &grid {
                    let result = engine.score(&[a, b, c], &[1]);
                    assert!(
                        (40.0..=100.0).contains(&result.score) || result.score == 70.0,
                        "score {} out of range for {:?}",
                        result.score,
                        [a, b, c]
                    );
                    if a < 50.0 || b < 50.0 || c < 50.0 {
                        assert!(result.score <= 50.0);
                    }
                }
            }
        }
    }

    #[test]
    fn test_score_metrics_flags_by_name() {
        let metrics = vec![
            MetricScore::new("depth", 80.0),
            MetricScore::new("tempo", 95.0),
        ];
        let plain = engine().score_metrics(&metrics, &[]);
        let critical = engine().score_metrics(&metrics, &["depth"]);
        assert_eq!(plain.score, 80.0);
        assert_eq!(critical.score, 70.0);
    }
}
