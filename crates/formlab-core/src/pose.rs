//! Pose frames produced by a pose source.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Normalized image coordinates of one anatomical point.
///
/// Deserializes from either `{"x":..,"y":..,"z":..}` or `[x, y, z]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "LandmarkRepr")]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

impl Landmark {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Midpoint in the image plane (z averaged too).
    pub fn midpoint(&self, other: &Landmark) -> Landmark {
        Landmark::new(
            (self.x + other.x) / 2.0,
            (self.y + other.y) / 2.0,
            (self.z + other.z) / 2.0,
        )
    }

    /// Euclidean distance in the image plane.
    pub fn distance_2d(&self, other: &Landmark) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LandmarkRepr {
    Object {
        x: f64,
        y: f64,
        #[serde(default)]
        z: f64,
    },
    Tuple(f64, f64, f64),
    Pair(f64, f64),
}

impl From<LandmarkRepr> for Landmark {
    fn from(repr: LandmarkRepr) -> Self {
        match repr {
            LandmarkRepr::Object { x, y, z } | LandmarkRepr::Tuple(x, y, z) => {
                Landmark::new(x, y, z)
            }
            LandmarkRepr::Pair(x, y) => Landmark::new(x, y, 0.0),
        }
    }
}

/// Angle at `vertex` formed by `a` and `c`, in degrees, computed in the x/y plane.
///
/// Returns 0 when either arm has zero length.
pub fn joint_angle(a: &Landmark, vertex: &Landmark, c: &Landmark) -> f64 {
    let (bax, bay) = (a.x - vertex.x, a.y - vertex.y);
    let (bcx, bcy) = (c.x - vertex.x, c.y - vertex.y);
    let mag_ba = (bax * bax + bay * bay).sqrt();
    let mag_bc = (bcx * bcx + bcy * bcy).sqrt();
    if mag_ba == 0.0 || mag_bc == 0.0 {
        return 0.0;
    }
    let cos = ((bax * bcx + bay * bcy) / (mag_ba * mag_bc)).clamp(-1.0, 1.0);
    cos.acos().to_degrees()
}

/// Joint angles derived from landmarks: (angle name, first point, vertex, last point).
const DERIVED_ANGLES: &[(&str, &str, &str, &str)] = &[
    ("left_elbow", "left_shoulder", "left_elbow", "left_wrist"),
    ("right_elbow", "right_shoulder", "right_elbow", "right_wrist"),
    ("left_knee", "left_hip", "left_knee", "left_ankle"),
    ("right_knee", "right_hip", "right_knee", "right_ankle"),
    ("left_hip", "left_shoulder", "left_hip", "left_knee"),
    ("right_hip", "right_shoulder", "right_hip", "right_knee"),
];

/// Landmarks and joint angles of one video frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoseFrame {
    #[serde(default)]
    pub landmarks: BTreeMap<String, Landmark>,
    #[serde(default)]
    pub angles: BTreeMap<String, f64>,
}

impl PoseFrame {
    /// Build a frame from landmarks, deriving the standard joint angles.
    pub fn from_landmarks<I, S>(landmarks: I) -> Self
    where
        I: IntoIterator<Item = (S, Landmark)>,
        S: Into<String>,
    {
        let mut frame = Self {
            landmarks: landmarks.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            angles: BTreeMap::new(),
        };
        frame.derive_angles();
        frame
    }

    /// Whether a person was detected in this frame.
    pub fn has_person(&self) -> bool {
        !self.landmarks.is_empty()
    }

    pub fn landmark(&self, name: &str) -> Option<&Landmark> {
        self.landmarks.get(name)
    }

    /// Fetch several landmarks at once; `None` if any is missing.
    pub fn landmarks_all<const N: usize>(&self, names: [&str; N]) -> Option<[&Landmark; N]> {
        let mut found = Vec::with_capacity(N);
        for name in names {
            found.push(self.landmarks.get(name)?);
        }
        found.try_into().ok()
    }

    pub fn angle(&self, name: &str) -> Option<f64> {
        self.angles.get(name).copied()
    }

    /// Fill in elbow, knee and hip angles that are absent but computable.
    pub fn derive_angles(&mut self) {
        for (name, a, vertex, c) in DERIVED_ANGLES {
            if self.angles.contains_key(*name) {
                continue;
            }
            if let Some([a, vertex, c]) = self.landmarks_all([*a, *vertex, *c]) {
                let angle = joint_angle(a, vertex, c);
                self.angles.insert((*name).to_string(), angle);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_right_angle() {
        let a = Landmark::new(0.0, 1.0, 0.0);
        let b = Landmark::new(0.0, 0.0, 0.0);
        let c = Landmark::new(1.0, 0.0, 0.0);
        assert!((joint_angle(&a, &b, &c) - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_straight_angle() {
        let a = Landmark::new(0.0, 0.0, 0.0);
        let b = Landmark::new(0.5, 0.5, 0.0);
        let c = Landmark::new(1.0, 1.0, 0.0);
        assert!((joint_angle(&a, &b, &c) - 180.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_length_arm_is_zero() {
        let b = Landmark::new(0.3, 0.3, 0.0);
        assert_eq!(joint_angle(&b, &b, &Landmark::new(1.0, 0.0, 0.0)), 0.0);
    }

    #[test]
    fn test_angle_ignores_depth() {
        let a = Landmark::new(0.0, 1.0, 5.0);
        let b = Landmark::new(0.0, 0.0, -3.0);
        let c = Landmark::new(1.0, 0.0, 9.0);
        assert!((joint_angle(&a, &b, &c) - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_from_landmarks_derives_knee_angle() {
        let frame = PoseFrame::from_landmarks([
            ("left_hip", Landmark::new(0.5, 0.5, 0.0)),
            ("left_knee", Landmark::new(0.5, 0.7, 0.0)),
            ("left_ankle", Landmark::new(0.5, 0.9, 0.0)),
        ]);
        let knee = frame.angle("left_knee").unwrap();
        assert!((knee - 180.0).abs() < 1e-6);
        assert!(frame.angle("right_knee").is_none());
    }

    #[test]
    fn test_existing_angles_are_kept() {
        let mut frame = PoseFrame::from_landmarks([
            ("left_hip", Landmark::new(0.5, 0.5, 0.0)),
            ("left_knee", Landmark::new(0.5, 0.7, 0.0)),
            ("left_ankle", Landmark::new(0.6, 0.9, 0.0)),
        ]);
        frame.angles.insert("left_knee".to_string(), 42.0);
        frame.derive_angles();
        assert_eq!(frame.angle("left_knee"), Some(42.0));
    }

    #[test]
    fn test_empty_frame_has_no_person() {
        assert!(!PoseFrame::default().has_person());
    }

    #[test]
    fn test_landmark_deserializes_from_tuple_and_object() {
        let frame: PoseFrame = serde_json::from_str(
            r#"{"landmarks": {"nose": [0.1, 0.2, 0.3], "left_hip": {"x": 0.4, "y": 0.5}, "right_hip": [0.6, 0.7]}}"#,
        )
        .unwrap();
        assert_eq!(frame.landmark("nose"), Some(&Landmark::new(0.1, 0.2, 0.3)));
        assert_eq!(frame.landmark("left_hip"), Some(&Landmark::new(0.4, 0.5, 0.0)));
        assert_eq!(frame.landmark("right_hip"), Some(&Landmark::new(0.6, 0.7, 0.0)));
        assert!(frame.angles.is_empty());
    }

    #[test]
    fn test_landmarks_all_missing() {
        let frame = PoseFrame::from_landmarks([("nose", Landmark::new(0.5, 0.1, 0.0))]);
        assert!(frame.landmarks_all(["nose", "left_hip"]).is_none());
        assert!(frame.landmarks_all(["nose"]).is_some());
    }
}
