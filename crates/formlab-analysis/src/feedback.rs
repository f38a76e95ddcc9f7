//! Feedback cleanup: topic consolidation, deduplication, validity filtering.
//!
//! Each pass is a pure `Vec<FeedbackItem> -> Vec<FeedbackItem>` function and
//! is idempotent. [`FeedbackPipeline::clean`] runs them in order.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, trace};

use formlab_core::FeedbackItem;

// =============================================================================
// TOPIC CONSOLIDATION
// =============================================================================

/// Canonical metric for the weight-transfer topic.
pub const WEIGHT_TRANSFER: &str = "weight_transfer";

/// Metric names that describe the same weight-transfer fault.
pub const WEIGHT_TRANSFER_FAMILY: &[&str] = &[
    WEIGHT_TRANSFER,
    "weight_shift",
    "balance_transition",
    "pressure_shift",
    "center_of_mass",
    "back_to_front_loading",
];

const HIP_ROTATION: &str = "hip_rotation";

/// Whether `metric` belongs to the weight-transfer family.
pub fn is_weight_transfer_metric(metric: &str) -> bool {
    if WEIGHT_TRANSFER_FAMILY.contains(&metric) {
        return true;
    }
    let lower = metric.to_lowercase();
    lower.contains("weight") && lower.contains("transfer")
}

/// Per-movement consolidation switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsolidationOptions {
    /// Drop `hip_rotation` items whenever a weight-transfer item is present.
    pub hip_rotation_redundant: bool,
}

/// Collapse the weight-transfer family to a single item.
///
/// The item whose metric is exactly `weight_transfer` survives, else the
/// first family item. Survivors keep their relative order.
pub fn consolidate_topics(
    items: Vec<FeedbackItem>,
    options: ConsolidationOptions,
) -> Vec<FeedbackItem> {
    let family: Vec<usize> = items
        .iter()
        .enumerate()
        .filter(|(_, item)| is_weight_transfer_metric(item.metric_name()))
        .map(|(i, _)| i)
        .collect();

    let Some(&first) = family.first() else {
        return items;
    };
    let keep = family
        .iter()
        .copied()
        .find(|&i| items[i].metric_name() == WEIGHT_TRANSFER)
        .unwrap_or(first);

    let before = items.len();
    let kept: Vec<FeedbackItem> = items
        .into_iter()
        .enumerate()
        .filter(|(i, item)| {
            let metric = item.metric_name();
            if is_weight_transfer_metric(metric) {
                *i == keep
            } else {
                !(options.hip_rotation_redundant && metric == HIP_ROTATION)
            }
        })
        .map(|(_, item)| item)
        .collect();

    debug!(
        dropped = before - kept.len(),
        "Consolidated weight-transfer feedback"
    );
    kept
}

// =============================================================================
// DEDUPLICATION
// =============================================================================

/// Titles at or below this length never count as near-duplicates.
const MIN_TITLE_LEN: usize = 5;

/// Suffixes that do not change what a title is about.
const TITLE_SUFFIXES: &[&str] = &[
    "needs work",
    "needs improvement",
    "needs attention",
    "needs refinement",
    "needs correction",
    "requires attention",
    "can improve",
    "could improve",
    "can be improved",
];

/// Normalized topic title of an item: first clause, lower-cased, no punctuation, no filler suffix.
pub fn normalize_title(item: &FeedbackItem) -> String {
    let clause = item
        .primary_text()
        .split(|c: char| matches!(c, '.' | '!' | '?' | ';' | ':' | ',' | '(' | '—'))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .unwrap_or("");

    let cleaned: String = clause
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c.is_whitespace() { c } else { ' ' })
        .collect();
    let mut title = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

    loop {
        let stripped = TITLE_SUFFIXES
            .iter()
            .find_map(|suffix| title.strip_suffix(suffix))
            .map(|rest| rest.trim_end().to_string());
        match stripped {
            Some(rest) => title = rest,
            None => break,
        }
    }
    title
}

fn titles_overlap(a: &str, b: &str) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    if a == b {
        return true;
    }
    a.chars().count() > MIN_TITLE_LEN
        && b.chars().count() > MIN_TITLE_LEN
        && (a.contains(b) || b.contains(a))
}

/// Keep the most severe item per metric, and one item per topic title for metric-less items.
///
/// Output is ordered by severity (critical/error, warning, info), stable
/// within a level.
pub fn dedupe(items: Vec<FeedbackItem>) -> Vec<FeedbackItem> {
    let mut sorted = items;
    sorted.sort_by_key(|item| item.level.priority());

    let mut seen_metrics: HashSet<String> = HashSet::new();
    let mut seen_titles: Vec<String> = Vec::new();
    let mut kept = Vec::with_capacity(sorted.len());

    for item in sorted {
        let title = normalize_title(&item);
        match item.metric.as_deref().filter(|m| !m.is_empty()) {
            Some(metric) => {
                if !seen_metrics.insert(metric.to_string()) {
                    trace!(metric, "Dropping duplicate metric feedback");
                    continue;
                }
            }
            None => {
                if seen_titles.iter().any(|seen| titles_overlap(seen, &title)) {
                    trace!(title = %title, "Dropping near-duplicate feedback title");
                    continue;
                }
            }
        }
        seen_titles.push(title);
        kept.push(item);
    }

    // Metric uniqueness must hold regardless of the title heuristic.
    let mut final_metrics: HashSet<String> = HashSet::new();
    kept.retain(|item| match item.metric.as_deref().filter(|m| !m.is_empty()) {
        Some(metric) => final_metrics.insert(metric.to_string()),
        None => true,
    });
    kept
}

// =============================================================================
// VALIDITY FILTERING
// =============================================================================

/// Texts that carry no advice.
const PLACEHOLDERS: &[&str] = &[
    "n/a",
    "na",
    "none",
    "null",
    "undefined",
    "tbd",
    "todo",
    "placeholder",
    "...",
    "-",
];

/// Vague or self-contradicting phrasings.
static VAGUE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)\beither\s+too\s+\w+(?:\s+\w+)?\s+or\s+too\s+\w+").unwrap(),
        Regex::new(r"(?i)\bbut\s+(?:it|we|the\s+\w+)\s+(?:couldn'?t|could\s+not|can'?t|cannot)\s+tell\b")
            .unwrap(),
        Regex::new(r"(?i)\b(?:couldn'?t|could\s+not|unable\s+to)\s+(?:determine|tell)\b").unwrap(),
    ]
});

/// Whether an item is specific enough to show to a user.
pub fn is_valid(item: &FeedbackItem) -> bool {
    let primary = item.primary_text().trim();
    if primary.is_empty() {
        return false;
    }
    let lowered = primary.to_lowercase();
    if PLACEHOLDERS.contains(&lowered.as_str()) {
        return false;
    }
    let rendered = item.rendered_text();
    !VAGUE_PATTERNS.iter().any(|re| re.is_match(&rendered))
}

/// Drop empty, placeholder, and vague items.
pub fn filter_invalid(items: Vec<FeedbackItem>) -> Vec<FeedbackItem> {
    items
        .into_iter()
        .filter(|item| {
            let valid = is_valid(item);
            if !valid {
                trace!(metric = item.metric_name(), "Dropping invalid feedback");
            }
            valid
        })
        .collect()
}

// =============================================================================
// PIPELINE
// =============================================================================

/// Runs consolidation, deduplication and validity filtering in order.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeedbackPipeline {
    options: ConsolidationOptions,
}

impl FeedbackPipeline {
    pub fn new(options: ConsolidationOptions) -> Self {
        Self { options }
    }

    pub fn clean(&self, items: Vec<FeedbackItem>) -> Vec<FeedbackItem> {
        let raw = items.len();
        let cleaned = filter_invalid(dedupe(consolidate_topics(items, self.options)));
        debug!(raw, cleaned = cleaned.len(), "Cleaned feedback");
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formlab_core::{Coaching, FeedbackLevel};

    fn msg(level: FeedbackLevel, metric: Option<&str>, text: &str) -> FeedbackItem {
        FeedbackItem::message(level, metric, text)
    }

    fn metrics_of(items: &[FeedbackItem]) -> Vec<&str> {
        items.iter().map(|i| i.metric_name()).collect()
    }

    // =========================================================================
    // consolidate_topics
    // =========================================================================

    #[test]
    fn test_family_membership() {
        assert!(is_weight_transfer_metric("weight_shift"));
        assert!(is_weight_transfer_metric("back_to_front_loading"));
        assert!(is_weight_transfer_metric("Weight_Transfer_Driver"));
        assert!(!is_weight_transfer_metric("hip_rotation"));
        assert!(!is_weight_transfer_metric("weight_forward"));
        assert!(!is_weight_transfer_metric(""));
    }

    #[test]
    fn test_consolidation_prefers_canonical_metric() {
        let items = vec![
            msg(FeedbackLevel::Warning, Some("weight_shift"), "Shift earlier"),
            msg(FeedbackLevel::Info, Some("tempo"), "Nice tempo"),
            msg(FeedbackLevel::Critical, Some("weight_transfer"), "Stay off the back foot"),
            msg(FeedbackLevel::Warning, Some("pressure_shift"), "Pressure stays back"),
        ];
        let out = consolidate_topics(items, ConsolidationOptions::default());
        assert_eq!(metrics_of(&out), vec!["tempo", "weight_transfer"]);
    }

    #[test]
    fn test_consolidation_falls_back_to_first_family_item() {
        let items = vec![
            msg(FeedbackLevel::Info, Some("balance"), "Balanced"),
            msg(FeedbackLevel::Warning, Some("center_of_mass"), "Center drifts"),
            msg(FeedbackLevel::Warning, Some("weight_shift"), "Shift earlier"),
        ];
        let out = consolidate_topics(items, ConsolidationOptions::default());
        assert_eq!(metrics_of(&out), vec!["balance", "center_of_mass"]);
    }

    #[test]
    fn test_hip_rotation_dropped_only_when_redundant() {
        let items = vec![
            msg(FeedbackLevel::Warning, Some("hip_rotation"), "Turn the hips"),
            msg(FeedbackLevel::Warning, Some("weight_transfer"), "Step into it"),
        ];
        let kept = consolidate_topics(items.clone(), ConsolidationOptions::default());
        assert_eq!(kept.len(), 2);

        let opts = ConsolidationOptions {
            hip_rotation_redundant: true,
        };
        let dropped = consolidate_topics(items, opts);
        assert_eq!(metrics_of(&dropped), vec!["weight_transfer"]);
    }

    #[test]
    fn test_hip_rotation_kept_without_family_item() {
        let opts = ConsolidationOptions {
            hip_rotation_redundant: true,
        };
        let items = vec![msg(FeedbackLevel::Warning, Some("hip_rotation"), "Turn the hips")];
        assert_eq!(consolidate_topics(items.clone(), opts), items);
    }

    #[test]
    fn test_consolidation_is_idempotent() {
        let opts = ConsolidationOptions {
            hip_rotation_redundant: true,
        };
        let items = vec![
            msg(FeedbackLevel::Warning, Some("weight_shift"), "a"),
            msg(FeedbackLevel::Warning, Some("hip_rotation"), "b"),
            msg(FeedbackLevel::Warning, Some("weight_transfer"), "c"),
        ];
        let once = consolidate_topics(items, opts);
        assert_eq!(consolidate_topics(once.clone(), opts), once);
    }

    // =========================================================================
    // dedupe
    // =========================================================================

    #[test]
    fn test_dedupe_keeps_most_severe_per_metric() {
        let items = vec![
            msg(FeedbackLevel::Info, Some("depth"), "Good depth"),
            msg(FeedbackLevel::Critical, Some("depth"), "Go deeper"),
            msg(FeedbackLevel::Warning, Some("tempo"), "Slow down"),
        ];
        let out = dedupe(items);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].primary_text(), "Go deeper");
        assert_eq!(out[1].metric_name(), "tempo");
    }

    #[test]
    fn test_dedupe_orders_by_severity_stably() {
        let items = vec![
            msg(FeedbackLevel::Info, Some("a"), "first info"),
            msg(FeedbackLevel::Warning, Some("b"), "first warning"),
            msg(FeedbackLevel::Error, Some("c"), "error"),
            msg(FeedbackLevel::Info, Some("d"), "second info"),
            msg(FeedbackLevel::Critical, Some("e"), "critical"),
        ];
        let out = dedupe(items);
        assert_eq!(metrics_of(&out), vec!["c", "e", "b", "a", "d"]);
    }

    #[test]
    fn test_dedupe_near_duplicate_titles() {
        let items = vec![
            msg(FeedbackLevel::Warning, None, "Elbow alignment needs work. Keep it tucked."),
            msg(FeedbackLevel::Info, None, "Elbow alignment!"),
            msg(FeedbackLevel::Warning, None, "Follow-through needs improvement"),
        ];
        let out = dedupe(items);
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].primary_text(), "Follow-through needs improvement");
    }

    #[test]
    fn test_dedupe_short_titles_not_merged_by_containment() {
        let items = vec![
            msg(FeedbackLevel::Info, None, "Hips"),
            msg(FeedbackLevel::Info, None, "Hips square to target"),
        ];
        assert_eq!(dedupe(items).len(), 2);
    }

    #[test]
    fn test_dedupe_coaching_uses_observation_as_title() {
        let items = vec![
            FeedbackItem {
                level: FeedbackLevel::Warning,
                metric: None,
                content: formlab_core::FeedbackContent::Coaching(Coaching::new(
                    "Your stance is too narrow",
                )),
            },
            msg(FeedbackLevel::Info, None, "Stance is too narrow"),
        ];
        assert_eq!(dedupe(items).len(), 1);
    }

    #[test]
    fn test_dedupe_is_idempotent() {
        let items = vec![
            msg(FeedbackLevel::Info, Some("depth"), "Good depth"),
            msg(FeedbackLevel::Warning, None, "Balance needs work"),
            msg(FeedbackLevel::Critical, Some("depth"), "Go deeper"),
            msg(FeedbackLevel::Info, None, "balance"),
            msg(FeedbackLevel::Warning, Some(""), "Generic note"),
            msg(FeedbackLevel::Info, None, "Keep your chest tall through the lift"),
            msg(FeedbackLevel::Warning, None, "Chest tall"),
        ];
        let once = dedupe(items);
        assert_eq!(dedupe(once.clone()), once);
    }

    #[test]
    fn test_dedupe_unique_metrics() {
        let items: Vec<_> = (0..10)
            .map(|i| {
                let metric = ["a", "b", "c"][i % 3];
                msg(FeedbackLevel::Warning, Some(metric), &format!("note {}", i))
            })
            .collect();
        let out = dedupe(items);
        let unique: HashSet<_> = out.iter().map(|i| i.metric_name()).collect();
        assert_eq!(unique.len(), out.len());
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn test_normalize_title_strips_suffixes_and_punctuation() {
        let item = msg(FeedbackLevel::Info, None, "Knee Bend -- requires attention; more text");
        assert_eq!(normalize_title(&item), "knee bend");
        let item = msg(FeedbackLevel::Info, None, "Tempo consistency needs work");
        assert_eq!(normalize_title(&item), "tempo consistency");
    }

    // =========================================================================
    // filter_invalid
    // =========================================================================

    #[test]
    fn test_filter_drops_empty_and_placeholders() {
        let items = vec![
            msg(FeedbackLevel::Info, Some("a"), "   "),
            msg(FeedbackLevel::Info, Some("b"), "N/A"),
            msg(FeedbackLevel::Info, Some("c"), "TODO"),
            msg(FeedbackLevel::Info, Some("d"), "Keep your head still"),
        ];
        let out = filter_invalid(items);
        assert_eq!(metrics_of(&out), vec!["d"]);
    }

    #[test]
    fn test_filter_drops_vague_patterns() {
        let items = vec![
            msg(
                FeedbackLevel::Warning,
                Some("wrist_snap"),
                "Your wrist snap is either too weak or too aggressive",
            ),
            msg(
                FeedbackLevel::Warning,
                Some("release"),
                "The release looked rushed but it couldn't tell why",
            ),
            msg(
                FeedbackLevel::Warning,
                Some("arc"),
                "We were unable to determine your shot arc",
            ),
        ];
        assert!(filter_invalid(items).is_empty());
    }

    #[test]
    fn test_filter_checks_coaching_fields() {
        let item = FeedbackItem::coaching(
            FeedbackLevel::Warning,
            "tempo",
            Coaching::new("Tempo is off").impact("It is either too fast or too slow"),
        );
        assert!(!is_valid(&item));
    }

    #[test]
    fn test_filter_keeps_specific_items() {
        let items = vec![
            msg(FeedbackLevel::Warning, Some("knee_bend"), "Bend your knees more before you rise"),
            FeedbackItem::positive("tempo", "Smooth, even tempo", Some("Stay smooth")),
            msg(FeedbackLevel::Info, Some("stance"), "Not too wide, not too narrow"),
        ];
        assert_eq!(filter_invalid(items.clone()), items);
    }

    // =========================================================================
    // FeedbackPipeline
    // =========================================================================

    #[test]
    fn test_pipeline_end_to_end() {
        let pipeline = FeedbackPipeline::new(ConsolidationOptions {
            hip_rotation_redundant: true,
        });
        let items = vec![
            msg(FeedbackLevel::Info, Some("balance"), "Good balance"),
            msg(FeedbackLevel::Warning, Some("weight_shift"), "Shift your weight forward"),
            msg(FeedbackLevel::Critical, Some("weight_transfer"), "Drive off the back foot"),
            msg(FeedbackLevel::Warning, Some("hip_rotation"), "Open the hips"),
            msg(FeedbackLevel::Warning, Some("balance"), "Finish balanced"),
            msg(FeedbackLevel::Warning, Some("wrist"), "either too stiff or too loose"),
        ];
        let out = pipeline.clean(items);
        assert_eq!(metrics_of(&out), vec!["weight_transfer", "balance"]);
        assert_eq!(out[1].primary_text(), "Finish balanced");
        assert_eq!(pipeline.clean(out.clone()), out);
    }
}
