use crate::detect::{DetectionFrame, KeypointName, Point2, Pose};
use crate::metrics::geometry::nose_to_eye_center;
use crate::metrics::{fuse, round_half_up, FaceAnalysisMetrics, FacialExpression};

const VISIBLE_SCORE: f64 = 0.3;

// Positional landmark contract with the upstream face model: [3] and [4] are
// read as mouth corners, [5] as the mouth-centre proxy.
const MOUTH_CORNER_A: usize = 3;
const MOUTH_CORNER_B: usize = 4;
const MOUTH_CENTER: usize = 5;
const MIN_EXPRESSION_LANDMARKS: usize = 6;

const SURPRISED_RATIO: f64 = 0.3;
const HAPPY_RATIO: f64 = 0.1;

#[derive(Clone, Copy, Debug, PartialEq)]
struct Estimate {
    confidence: f64,
    eye_contact: f64,
    head_movement: f64,
}

/// Face analysis, fused from the primary face and the head keypoints of the pose.
/// The expression label only ever comes from the face.
pub fn face_analysis(
    current: &DetectionFrame,
    previous: Option<&DetectionFrame>,
) -> FaceAnalysisMetrics {
    let face = face_estimate(current, previous);
    let pose = current
        .pose
        .as_ref()
        .map(|pose| pose_estimate(pose, previous.and_then(|f| f.pose.as_ref())));

    let facial_expression = current
        .primary_face()
        .and_then(|face| face.landmarks.as_deref())
        .map(classify_expression)
        .unwrap_or_default();

    FaceAnalysisMetrics {
        confidence: fuse(face.map(|e| e.confidence), pose.map(|e| e.confidence)),
        eye_contact: fuse(face.map(|e| e.eye_contact), pose.map(|e| e.eye_contact)),
        head_movement: fuse(face.map(|e| e.head_movement), pose.map(|e| e.head_movement)),
        facial_expression,
    }
}

/// Classify from mouth geometry. Fewer than six landmarks reads as neutral.
pub fn classify_expression(landmarks: &[Point2]) -> FacialExpression {
    if landmarks.len() < MIN_EXPRESSION_LANDMARKS {
        return FacialExpression::Neutral;
    }
    let corner_a = landmarks[MOUTH_CORNER_A];
    let corner_b = landmarks[MOUTH_CORNER_B];
    let center = landmarks[MOUTH_CENTER];

    let mouth_width = corner_a.distance_to(&corner_b);
    let mouth_height = (center.y - (corner_a.y + corner_b.y) / 2.0).abs();

    if mouth_height > SURPRISED_RATIO * mouth_width {
        FacialExpression::Surprised
    } else if mouth_height > HAPPY_RATIO * mouth_width {
        FacialExpression::Happy
    } else {
        FacialExpression::Neutral
    }
}

fn face_estimate(current: &DetectionFrame, previous: Option<&DetectionFrame>) -> Option<Estimate> {
    let face = current.primary_face()?;
    let center = face.bounding_box.center();

    let head_movement = match previous.and_then(DetectionFrame::primary_face) {
        Some(prev) => (100.0 * center.distance_to(&prev.bounding_box.center())).min(100.0),
        None => 0.0,
    };

    Some(Estimate {
        confidence: round_half_up(100.0 * face.score),
        eye_contact: (100.0 - 200.0 * (center.x - 0.5).abs()).max(0.0),
        head_movement,
    })
}

fn pose_estimate(pose: &Pose, previous: Option<&Pose>) -> Estimate {
    let visible = [KeypointName::Nose, KeypointName::LeftEye, KeypointName::RightEye]
        .iter()
        .filter(|name| pose.keypoint(**name).is_some_and(|kp| kp.score > VISIBLE_SCORE))
        .count();

    let eye_contact = nose_to_eye_center(pose)
        .map(|d| (100.0 - 5.0 * d).max(0.0))
        .unwrap_or(0.0);

    let head_movement = match (
        pose.position(KeypointName::Nose),
        previous.and_then(|p| p.position(KeypointName::Nose)),
    ) {
        (Some(nose), Some(prev_nose)) => (10.0 * nose.distance_to(&prev_nose)).min(100.0),
        _ => 0.0,
    };

    Estimate {
        confidence: 100.0 * visible as f64 / 3.0,
        eye_contact,
        head_movement,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{BoundingBox, Face, Keypoint};
    use std::time::SystemTime;

    fn mouth(ratio: f64) -> Vec<Point2> {
        let mut points = vec![Point2::default(); 3];
        points.push(Point2::new(0.40, 0.70));
        points.push(Point2::new(0.60, 0.70));
        points.push(Point2::new(0.50, 0.70 + ratio * 0.20));
        points
    }

    fn face(x_min: f64, x_max: f64, score: f64, landmarks: Option<Vec<Point2>>) -> Face {
        Face {
            bounding_box: BoundingBox {
                x_min,
                y_min: 0.2,
                x_max,
                y_max: 0.6,
            },
            landmarks,
            score,
        }
    }

    fn kp(name: KeypointName, x: f64, y: f64, score: f64) -> Keypoint {
        Keypoint {
            name,
            position: Point2::new(x, y),
            score,
        }
    }

    fn frame(pose: Option<Pose>, faces: Vec<Face>) -> DetectionFrame {
        DetectionFrame {
            pose,
            faces,
            hands: vec![],
            timestamp: SystemTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn expression_thresholds() {
        assert_eq!(classify_expression(&mouth(0.35)), FacialExpression::Surprised);
        assert_eq!(classify_expression(&mouth(0.15)), FacialExpression::Happy);
        assert_eq!(classify_expression(&mouth(0.05)), FacialExpression::Neutral);
    }

    #[test]
    fn too_few_landmarks_is_neutral() {
        let mut points = mouth(0.5);
        points.truncate(5);
        assert_eq!(classify_expression(&points), FacialExpression::Neutral);
    }

    #[test]
    fn face_only_metrics() {
        let prev = frame(None, vec![face(0.3, 0.7, 0.9, None)]);
        let cur = frame(None, vec![face(0.4, 0.8, 0.876, Some(mouth(0.2)))]);
        let metrics = face_analysis(&cur, Some(&prev));
        assert_eq!(metrics.confidence, 88);
        // Centre x 0.6 → 100 - 20.
        assert_eq!(metrics.eye_contact, 80);
        assert_eq!(metrics.head_movement, 10);
        assert_eq!(metrics.facial_expression, FacialExpression::Happy);
    }

    #[test]
    fn pose_only_metrics() {
        let pose = |dx: f64| Pose {
            keypoints: vec![
                kp(KeypointName::Nose, 100.0 + dx, 104.0, 0.9),
                kp(KeypointName::LeftEye, 96.0, 100.0, 0.9),
                kp(KeypointName::RightEye, 104.0, 100.0, 0.2),
            ],
            score: 0.7,
        };
        let prev = frame(Some(pose(0.0)), vec![]);
        let cur = frame(Some(pose(3.0)), vec![]);
        let metrics = face_analysis(&cur, Some(&prev));
        // Two of three head keypoints visible.
        assert_eq!(metrics.confidence, 67);
        // Nose (103,104) to eye centre (100,100) is 5 → 100 - 25.
        assert_eq!(metrics.eye_contact, 75);
        assert_eq!(metrics.head_movement, 30);
        assert_eq!(metrics.facial_expression, FacialExpression::Neutral);
    }

    #[test]
    fn both_sources_average_and_expression_comes_from_face() {
        let pose = Pose {
            keypoints: vec![
                kp(KeypointName::Nose, 100.0, 100.0, 0.9),
                kp(KeypointName::LeftEye, 96.0, 100.0, 0.9),
                kp(KeypointName::RightEye, 104.0, 100.0, 0.9),
            ],
            score: 0.9,
        };
        let cur = frame(Some(pose), vec![face(0.3, 0.7, 0.8, Some(mouth(0.4)))]);
        let metrics = face_analysis(&cur, None);
        assert_eq!(metrics.confidence, 90);
        assert_eq!(metrics.eye_contact, 100);
        assert_eq!(metrics.head_movement, 0);
        assert_eq!(metrics.facial_expression, FacialExpression::Surprised);
    }

    #[test]
    fn missing_eyes_zero_pose_eye_contact() {
        let pose = Pose {
            keypoints: vec![kp(KeypointName::Nose, 10.0, 10.0, 0.9)],
            score: 0.5,
        };
        let cur = frame(Some(pose), vec![]);
        let metrics = face_analysis(&cur, None);
        assert_eq!(metrics.eye_contact, 0);
        assert_eq!(metrics.confidence, 33);
    }
}
