//! Catalog of supported sports and movements.
//!
//! Movement identifiers are normalized (lower-case, `_`-separated, legacy
//! aliases resolved) before any lookup, so `"Back Squat"`, `"back-squat"` and
//! `"barbell_squat"` all name the same weightlifting movement.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Sports with at least one analyzed movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sport {
    Basketball,
    Golf,
    Weightlifting,
    Soccer,
    Lacrosse,
}

impl Sport {
    pub const ALL: [Sport; 5] = [
        Sport::Basketball,
        Sport::Golf,
        Sport::Weightlifting,
        Sport::Soccer,
        Sport::Lacrosse,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Sport::Basketball => "basketball",
            Sport::Golf => "golf",
            Sport::Weightlifting => "weightlifting",
            Sport::Soccer => "soccer",
            Sport::Lacrosse => "lacrosse",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Sport::Basketball => "Basketball",
            Sport::Golf => "Golf",
            Sport::Weightlifting => "Weightlifting",
            Sport::Soccer => "Soccer",
            Sport::Lacrosse => "Lacrosse",
        }
    }

    fn description(&self) -> &'static str {
        match self {
            Sport::Basketball => "Shooting form analysis",
            Sport::Golf => "Full swing, short game and putting analysis",
            Sport::Weightlifting => "Barbell lift technique analysis",
            Sport::Soccer => "Striking technique analysis",
            Sport::Lacrosse => "Shooting mechanics analysis",
        }
    }

    /// Legacy movement identifiers accepted for this sport.
    fn aliases(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            Sport::Basketball => &[("jumpshot", "shot_off_dribble"), ("jump_shot", "shot_off_dribble")],
            Sport::Golf => &[
                ("driver", "driver_swing"),
                ("fairway", "iron_swing"),
                ("iron", "iron_swing"),
                ("chip", "chip_shot"),
                ("putt", "putting_stroke"),
            ],
            Sport::Weightlifting => &[
                ("back_squat", "barbell_squat"),
                ("squat", "barbell_squat"),
                ("rdl", "romanian_deadlift"),
                ("bench", "bench_press"),
            ],
            Sport::Soccer => &[("shooting", "shooting_technique"), ("passing", "passing_technique")],
            Sport::Lacrosse => &[("shot", "shooting")],
        }
    }

    /// Movements analyzed for this sport.
    pub fn movements(&self) -> &'static [MovementInfo] {
        match self {
            Sport::Basketball => BASKETBALL,
            Sport::Golf => GOLF,
            Sport::Weightlifting => WEIGHTLIFTING,
            Sport::Soccer => SOCCER,
            Sport::Lacrosse => LACROSSE,
        }
    }

    /// Normalize a caller-supplied movement id: trim, lower-case, `-`/space to `_`, resolve aliases.
    pub fn normalize_movement(&self, raw: &str) -> String {
        let cleaned: String = raw
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c == '-' || c.is_whitespace() { '_' } else { c })
            .collect();
        self.aliases()
            .iter()
            .find(|(alias, _)| *alias == cleaned)
            .map(|(_, canonical)| (*canonical).to_string())
            .unwrap_or(cleaned)
    }

    /// Look up a movement by (possibly legacy) identifier.
    pub fn movement(&self, raw: &str) -> Option<&'static MovementInfo> {
        let id = self.normalize_movement(raw);
        self.movements().iter().find(|m| m.id == id)
    }

    /// Catalog entry for this sport.
    pub fn info(&self) -> SportInfo {
        SportInfo {
            id: self.as_str(),
            name: self.display_name(),
            description: self.description(),
            movements: self.movements(),
        }
    }
}

impl FromStr for Sport {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        Sport::ALL
            .into_iter()
            .find(|sport| sport.as_str() == lowered)
            .ok_or_else(|| Error::InvalidInput(format!("Unsupported sport: {}", s.trim())))
    }
}

impl std::fmt::Display for Sport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Catalog entry for one movement.
#[derive(Debug, Clone, Serialize)]
pub struct MovementInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub key_phases: &'static [&'static str],
}

/// Catalog entry for one sport.
#[derive(Debug, Clone, Serialize)]
pub struct SportInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub movements: &'static [MovementInfo],
}

/// Full catalog in display order.
pub fn catalog() -> Vec<SportInfo> {
    Sport::ALL.iter().map(Sport::info).collect()
}

const SHOT_PHASES: &[&str] = &["setup", "load", "release", "follow_through"];
const SWING_PHASES: &[&str] = &["setup", "backswing", "downswing", "impact", "follow_through"];
const SQUAT_PHASES: &[&str] = &["setup", "descent", "bottom", "ascent"];
const KICK_PHASES: &[&str] = &["approach", "plant_foot", "strike", "follow_through"];

static BASKETBALL: &[MovementInfo] = &[
    MovementInfo {
        id: "shot_off_dribble",
        name: "Shot Off the Dribble",
        description: "Creating and shooting a jump shot after dribbling",
        key_phases: SHOT_PHASES,
    },
    MovementInfo {
        id: "catch_and_shoot",
        name: "Catch and Shoot",
        description: "Shooting immediately after receiving a pass",
        key_phases: SHOT_PHASES,
    },
    MovementInfo {
        id: "free_throw",
        name: "Free Throw",
        description: "Shooting from the free throw line with no defenders",
        key_phases: SHOT_PHASES,
    },
];

static GOLF: &[MovementInfo] = &[
    MovementInfo {
        id: "driver_swing",
        name: "Driver Swing",
        description: "Full power drive from the tee",
        key_phases: SWING_PHASES,
    },
    MovementInfo {
        id: "iron_swing",
        name: "Iron Swing",
        description: "Iron shot with controlled trajectory",
        key_phases: SWING_PHASES,
    },
    MovementInfo {
        id: "chip_shot",
        name: "Chip Shot",
        description: "Short approach shot near the green",
        key_phases: &["setup", "backswing", "impact", "follow_through"],
    },
    MovementInfo {
        id: "putting_stroke",
        name: "Putting Stroke",
        description: "Putting stroke on the green",
        key_phases: &["setup", "backstroke", "forward_stroke", "follow_through"],
    },
];

static WEIGHTLIFTING: &[MovementInfo] = &[
    MovementInfo {
        id: "barbell_squat",
        name: "Barbell Squat",
        description: "Squat with the barbell on the upper back",
        key_phases: SQUAT_PHASES,
    },
    MovementInfo {
        id: "front_squat",
        name: "Front Squat",
        description: "Squat with the barbell racked on the front shoulders",
        key_phases: SQUAT_PHASES,
    },
    MovementInfo {
        id: "deadlift",
        name: "Deadlift",
        description: "Lift the bar from the ground to a standing position",
        key_phases: &["setup", "lift", "lockout", "lower"],
    },
    MovementInfo {
        id: "romanian_deadlift",
        name: "Romanian Deadlift",
        description: "Hip hinge with relatively straight legs",
        key_phases: &["setup", "descent", "stretch", "ascent"],
    },
    MovementInfo {
        id: "bench_press",
        name: "Bench Press",
        description: "Horizontal press on a bench",
        key_phases: SQUAT_PHASES,
    },
];

static SOCCER: &[MovementInfo] = &[
    MovementInfo {
        id: "shooting_technique",
        name: "Shooting Technique",
        description: "Shooting the ball at goal",
        key_phases: KICK_PHASES,
    },
    MovementInfo {
        id: "passing_technique",
        name: "Passing Technique",
        description: "Passing the ball to a teammate",
        key_phases: &["approach", "plant_foot", "contact", "follow_through"],
    },
];

static LACROSSE: &[MovementInfo] = &[MovementInfo {
    id: "shooting",
    name: "Shooting",
    description: "Overhand shot on goal",
    key_phases: &["cradle", "wind_up", "step", "release", "follow_through"],
}];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sport_from_str() {
        assert_eq!("golf".parse::<Sport>().unwrap(), Sport::Golf);
        assert_eq!(" Basketball ".parse::<Sport>().unwrap(), Sport::Basketball);
        assert!("curling".parse::<Sport>().is_err());
    }

    #[test]
    fn test_normalize_resolves_aliases() {
        assert_eq!(Sport::Golf.normalize_movement("driver"), "driver_swing");
        assert_eq!(Sport::Golf.normalize_movement("fairway"), "iron_swing");
        assert_eq!(
            Sport::Weightlifting.normalize_movement("Back Squat"),
            "barbell_squat"
        );
        assert_eq!(
            Sport::Basketball.normalize_movement("jumpshot"),
            "shot_off_dribble"
        );
    }

    #[test]
    fn test_normalize_canonical_is_stable() {
        for sport in Sport::ALL {
            for movement in sport.movements() {
                assert_eq!(sport.normalize_movement(movement.id), movement.id);
            }
        }
    }

    #[test]
    fn test_aliases_point_to_known_movements() {
        for sport in Sport::ALL {
            for (alias, canonical) in sport.aliases() {
                assert!(
                    sport.movement(canonical).is_some(),
                    "{} alias {} points to unknown {}",
                    sport,
                    alias,
                    canonical
                );
            }
        }
    }

    #[test]
    fn test_movement_lookup_unknown() {
        assert!(Sport::Golf.movement("free_throw").is_none());
        assert!(Sport::Basketball.movement("free-throw").is_some());
    }

    #[test]
    fn test_catalog_lists_every_sport() {
        let catalog = catalog();
        assert_eq!(catalog.len(), Sport::ALL.len());
        assert!(catalog.iter().all(|s| !s.movements.is_empty()));
    }
}
