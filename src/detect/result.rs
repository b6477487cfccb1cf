use serde::Serialize;
use std::time::SystemTime;

/// Number of landmarks a hand detection carries.
pub const HAND_LANDMARK_COUNT: usize = 21;

/// 2D point. Pose keypoints are in pixels, face boxes in frame fractions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point2) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn midpoint(&self, other: &Point2) -> Point2 {
        Point2::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

/// Hand landmark. Depth is carried but never used for movement.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn xy(&self) -> Point2 {
        Point2::new(self.x, self.y)
    }
}

/// Named body keypoints, in the usual 17-point COCO order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum KeypointName {
    Nose,
    LeftEye,
    RightEye,
    LeftEar,
    RightEar,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

impl KeypointName {
    pub const ALL: [KeypointName; 17] = [
        KeypointName::Nose,
        KeypointName::LeftEye,
        KeypointName::RightEye,
        KeypointName::LeftEar,
        KeypointName::RightEar,
        KeypointName::LeftShoulder,
        KeypointName::RightShoulder,
        KeypointName::LeftElbow,
        KeypointName::RightElbow,
        KeypointName::LeftWrist,
        KeypointName::RightWrist,
        KeypointName::LeftHip,
        KeypointName::RightHip,
        KeypointName::LeftKnee,
        KeypointName::RightKnee,
        KeypointName::LeftAnkle,
        KeypointName::RightAnkle,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            KeypointName::Nose => "nose",
            KeypointName::LeftEye => "leftEye",
            KeypointName::RightEye => "rightEye",
            KeypointName::LeftEar => "leftEar",
            KeypointName::RightEar => "rightEar",
            KeypointName::LeftShoulder => "leftShoulder",
            KeypointName::RightShoulder => "rightShoulder",
            KeypointName::LeftElbow => "leftElbow",
            KeypointName::RightElbow => "rightElbow",
            KeypointName::LeftWrist => "leftWrist",
            KeypointName::RightWrist => "rightWrist",
            KeypointName::LeftHip => "leftHip",
            KeypointName::RightHip => "rightHip",
            KeypointName::LeftKnee => "leftKnee",
            KeypointName::RightKnee => "rightKnee",
            KeypointName::LeftAnkle => "leftAnkle",
            KeypointName::RightAnkle => "rightAnkle",
        }
    }

    /// Parse a model label. Accepts `leftEye`, `left_eye` and `LEFT_EYE`.
    pub fn from_label(label: &str) -> Option<Self> {
        let folded: String = label
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();
        Self::ALL
            .iter()
            .copied()
            .find(|name| name.as_str().to_lowercase() == folded)
    }

    /// Position in `ALL`, which is also the output order of single-pose models.
    pub fn index(&self) -> usize {
        *self as usize
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Keypoint {
    pub name: KeypointName,
    pub position: Point2,
    pub score: f64,
}

/// Single-person pose. Keypoints are addressed by name; a partial pose is valid.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Pose {
    pub keypoints: Vec<Keypoint>,
    pub score: f64,
}

impl Pose {
    pub fn keypoint(&self, name: KeypointName) -> Option<&Keypoint> {
        self.keypoints.iter().find(|kp| kp.name == name)
    }

    pub fn position(&self, name: KeypointName) -> Option<Point2> {
        self.keypoint(name).map(|kp| kp.position)
    }
}

/// Face box in fractions of the frame size.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct BoundingBox {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

impl BoundingBox {
    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    pub fn center(&self) -> Point2 {
        Point2::new(
            (self.x_min + self.x_max) / 2.0,
            (self.y_min + self.y_max) / 2.0,
        )
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Face {
    pub bounding_box: BoundingBox,
    /// Positional landmarks in upstream model order, if the model reports them.
    pub landmarks: Option<Vec<Point2>>,
    pub score: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Handedness {
    Left,
    Right,
}

impl Handedness {
    pub fn from_label(label: &str) -> Option<Self> {
        if label.eq_ignore_ascii_case("left") {
            Some(Handedness::Left)
        } else if label.eq_ignore_ascii_case("right") {
            Some(Handedness::Right)
        } else {
            None
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Hand {
    pub landmarks: Vec<Point3>,
    pub score: f64,
    pub handedness: Handedness,
}

/// Everything the three models reported for one processed frame.
///
/// Faces and hands are snapshots. They carry no identity across frames.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DetectionFrame {
    pub pose: Option<Pose>,
    pub faces: Vec<Face>,
    pub hands: Vec<Hand>,
    pub timestamp: SystemTime,
}

impl DetectionFrame {
    pub fn empty(timestamp: SystemTime) -> Self {
        Self {
            pose: None,
            faces: Vec::new(),
            hands: Vec::new(),
            timestamp,
        }
    }

    /// True when no model reported anything.
    pub fn is_empty(&self) -> bool {
        self.pose.is_none() && self.faces.is_empty() && self.hands.is_empty()
    }

    pub fn primary_face(&self) -> Option<&Face> {
        self.faces.first()
    }

    /// First hand with the given handedness.
    pub fn hand(&self, handedness: Handedness) -> Option<&Hand> {
        self.hands.iter().find(|h| h.handedness == handedness)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keypoint_labels_parse_in_both_cases() {
        assert_eq!(
            KeypointName::from_label("left_shoulder"),
            Some(KeypointName::LeftShoulder)
        );
        assert_eq!(
            KeypointName::from_label("rightAnkle"),
            Some(KeypointName::RightAnkle)
        );
        assert_eq!(KeypointName::from_label("NOSE"), Some(KeypointName::Nose));
        assert_eq!(KeypointName::from_label("tail"), None);
    }

    #[test]
    fn keypoint_index_matches_all_order() {
        for (i, name) in KeypointName::ALL.iter().enumerate() {
            assert_eq!(name.index(), i);
        }
    }

    #[test]
    fn bounding_box_geometry() {
        let bbox = BoundingBox {
            x_min: 0.2,
            y_min: 0.4,
            x_max: 0.6,
            y_max: 0.8,
        };
        assert!((bbox.area() - 0.16).abs() < 1e-12);
        let center = bbox.center();
        assert!((center.x - 0.4).abs() < 1e-12);
        assert!((center.y - 0.6).abs() < 1e-12);
    }

    #[test]
    fn hand_lookup_returns_first_match() {
        let frame = DetectionFrame {
            pose: None,
            faces: vec![],
            hands: vec![
                Hand {
                    landmarks: vec![],
                    score: 0.2,
                    handedness: Handedness::Right,
                },
                Hand {
                    landmarks: vec![],
                    score: 0.9,
                    handedness: Handedness::Right,
                },
            ],
            timestamp: SystemTime::UNIX_EPOCH,
        };
        assert_eq!(frame.hand(Handedness::Right).map(|h| h.score), Some(0.2));
        assert!(frame.hand(Handedness::Left).is_none());
        assert!(!frame.is_empty());
    }
}
