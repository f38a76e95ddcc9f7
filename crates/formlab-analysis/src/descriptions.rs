//! Number-free descriptions of strong and weak metrics.

/// (metric, strength note, improvement note)
const DESCRIPTIONS: &[(&str, &str, &str)] = &[
    ("base_stability", "Strong base stability", "Base stability needs improvement"),
    ("vertical_alignment", "Excellent vertical alignment", "Vertical alignment needs work"),
    ("shot_rhythm", "Smooth shot rhythm", "Shot rhythm needs refinement"),
    ("elbow_alignment", "Proper elbow alignment", "Elbow alignment needs correction"),
    ("knee_bend", "Good knee bend", "Knee bend requires attention"),
    ("release_point", "High, consistent release point", "Release point needs to get higher"),
    ("depth", "Excellent depth", "Depth needs improvement"),
    ("bar_path", "Straight bar path", "Bar path needs correction"),
    ("spine_alignment", "Proper spine alignment", "Spine alignment requires attention"),
    ("tempo", "Consistent tempo", "Tempo consistency needs work"),
    ("weight_transfer", "Strong weight transfer", "Weight transfer can improve"),
    ("hip_rotation", "Excellent hip rotation", "Hip rotation needs development"),
    ("balance", "Good balance", "Balance requires attention"),
    ("follow_through", "Complete follow-through", "Follow-through needs completion"),
    ("swing_path", "On-plane swing path", "Swing path needs work"),
    ("ball_contact", "Crisp ball-first contact", "Ball contact needs work"),
    ("shoulder_stability", "Quiet, stable shoulders", "Shoulder stability needs work"),
    ("head_stability", "Steady head position", "Head stability needs work"),
    ("wrist_stability", "Firm, quiet wrists", "Wrist stability needs work"),
];

fn humanize(metric: &str) -> String {
    metric.replace('_', " ")
}

/// Short praise for a metric that scored well.
pub fn strength_note(metric: &str) -> String {
    DESCRIPTIONS
        .iter()
        .find(|(name, _, _)| *name == metric)
        .map(|(_, strength, _)| (*strength).to_string())
        .unwrap_or_else(|| format!("Strong {}", humanize(metric)))
}

/// Short note for a metric that needs work.
pub fn improvement_note(metric: &str) -> String {
    if let Some((_, _, weakness)) = DESCRIPTIONS.iter().find(|(name, _, _)| *name == metric) {
        return (*weakness).to_string();
    }
    let mut words = humanize(metric);
    if let Some(first) = words.get(0..1) {
        let upper = first.to_uppercase();
        words.replace_range(0..1, &upper);
    }
    format!("{} needs improvement", words)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_metric_descriptions() {
        assert_eq!(strength_note("depth"), "Excellent depth");
        assert_eq!(improvement_note("bar_path"), "Bar path needs correction");
    }

    #[test]
    fn test_unknown_metric_fallbacks() {
        assert_eq!(strength_note("plant_foot"), "Strong plant foot");
        assert_eq!(improvement_note("plant_foot"), "Plant foot needs improvement");
    }

    #[test]
    fn test_notes_contain_no_digits() {
        for (name, _, _) in DESCRIPTIONS {
            assert!(!strength_note(name).chars().any(|c| c.is_ascii_digit()));
            assert!(!improvement_note(name).chars().any(|c| c.is_ascii_digit()));
        }
    }
}
