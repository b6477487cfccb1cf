use crate::detect::{DetectionFrame, Point2, Pose};
use crate::metrics::geometry::{count_above, mean_keypoint_displacement, nose_to_eye_center};
use crate::metrics::{fuse, round_half_up, AttentionMetrics};

/// Keypoints at or below this score are treated as not visible.
const VISIBLE_SCORE: f64 = 0.3;

const FRAME_CENTER: Point2 = Point2::new(0.5, 0.5);

/// One source's estimate of the four attention fields, before fusion.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Estimate {
    level: f64,
    focus: f64,
    engagement: f64,
    distraction: f64,
}

/// Attention from the primary face and the pose, fused field by field.
pub fn attention(current: &DetectionFrame, previous: Option<&DetectionFrame>) -> AttentionMetrics {
    let face = face_estimate(current, previous);
    let pose = current
        .pose
        .as_ref()
        .map(|pose| pose_estimate(pose, previous.and_then(|f| f.pose.as_ref())));

    AttentionMetrics {
        level: fuse(face.map(|e| e.level), pose.map(|e| e.level)),
        focus: fuse(face.map(|e| e.focus), pose.map(|e| e.focus)),
        engagement: fuse(face.map(|e| e.engagement), pose.map(|e| e.engagement)),
        distraction: fuse(face.map(|e| e.distraction), pose.map(|e| e.distraction)),
    }
}

/// Bigger and more centred faces read as more attentive. Only `faces[0]` counts.
fn face_estimate(current: &DetectionFrame, previous: Option<&DetectionFrame>) -> Option<Estimate> {
    let face = current.primary_face()?;
    let bbox = &face.bounding_box;
    let center = bbox.center();

    let size_score = (bbox.area() * 1000.0).min(100.0);
    let position_score = (100.0 - 200.0 * center.distance_to(&FRAME_CENTER)).max(0.0);
    let level = round_half_up((size_score + position_score) / 2.0);

    let distraction = match previous.and_then(DetectionFrame::primary_face) {
        Some(prev) => (100.0 * center.distance_to(&prev.bounding_box.center())).min(100.0),
        None => 0.0,
    };

    Some(Estimate {
        level,
        focus: round_half_up(level * 0.9),
        engagement: round_half_up(level * 0.8),
        distraction,
    })
}

fn pose_estimate(pose: &Pose, previous: Option<&Pose>) -> Estimate {
    let visibility = if pose.keypoints.is_empty() {
        0.0
    } else {
        100.0 * count_above(pose, VISIBLE_SCORE) as f64 / pose.keypoints.len() as f64
    };

    let focus = nose_to_eye_center(pose)
        .map(|d| (100.0 - 2.0 * d).max(0.0))
        .unwrap_or(0.0);

    let (engagement, distraction) = match previous {
        Some(prev) => {
            let movement = mean_keypoint_displacement(pose, prev, Some(VISIBLE_SCORE));
            let stability = (100.0 - 2.0 * movement).max(0.0);
            (
                0.7 * visibility + 0.3 * stability,
                (10.0 * movement).min(100.0),
            )
        }
        None => (0.7 * visibility, 0.0),
    };

    Estimate {
        level: visibility,
        focus,
        engagement,
        distraction,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{BoundingBox, Face, Keypoint, KeypointName};
    use std::time::SystemTime;

    fn face_at(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Face {
        Face {
            bounding_box: BoundingBox {
                x_min,
                y_min,
                x_max,
                y_max,
            },
            landmarks: None,
            score: 0.9,
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

    fn head_pose(dx: f64) -> Pose {
        Pose {
            keypoints: vec![
                kp(KeypointName::Nose, 100.0 + dx, 110.0, 0.9),
                kp(KeypointName::LeftEye, 95.0 + dx, 100.0, 0.9),
                kp(KeypointName::RightEye, 105.0 + dx, 100.0, 0.9),
                kp(KeypointName::RightEar, 115.0 + dx, 105.0, 0.9),
                kp(KeypointName::LeftAnkle, 0.0, 0.0, 0.1),
            ],
            score: 0.8,
        }
    }

    #[test]
    fn centred_large_face_alone() {
        // Area 0.16 saturates size; centre sits on the frame centre.
        let cur = frame(None, vec![face_at(0.3, 0.3, 0.7, 0.7)]);
        let metrics = attention(&cur, None);
        assert_eq!(metrics.level, 100);
        assert_eq!(metrics.focus, 90);
        assert_eq!(metrics.engagement, 80);
        assert_eq!(metrics.distraction, 0);
    }

    #[test]
    fn face_distraction_tracks_first_face_only() {
        let prev = frame(None, vec![face_at(0.3, 0.3, 0.7, 0.7)]);
        let cur = frame(
            None,
            vec![face_at(0.35, 0.3, 0.75, 0.7), face_at(0.0, 0.0, 0.1, 0.1)],
        );
        // Centre moved 0.05 → 5.
        assert_eq!(attention(&cur, Some(&prev)).distraction, 5);
    }

    #[test]
    fn pose_only_uses_visibility_and_head_geometry() {
        let cur = frame(Some(head_pose(0.0)), vec![]);
        let metrics = attention(&cur, None);
        // 4 of 5 keypoints visible.
        assert_eq!(metrics.level, 80);
        // Nose is 10px below eye centre.
        assert_eq!(metrics.focus, 80);
        assert_eq!(metrics.engagement, 56);
        assert_eq!(metrics.distraction, 0);
    }

    #[test]
    fn pose_movement_feeds_engagement_and_distraction() {
        let prev = frame(Some(head_pose(0.0)), vec![]);
        let cur = frame(Some(head_pose(4.0)), vec![]);
        let metrics = attention(&cur, Some(&prev));
        // Low-score ankle is ignored: movement 4, stability 92,
        // engagement 0.7*80 + 0.3*92 = 83.6
        assert_eq!(metrics.engagement, 84);
        assert_eq!(metrics.distraction, 40);
    }

    #[test]
    fn both_sources_are_averaged() {
        let cur = frame(Some(head_pose(0.0)), vec![face_at(0.3, 0.3, 0.7, 0.7)]);
        let metrics = attention(&cur, None);
        assert_eq!(metrics.level, 90);
        assert_eq!(metrics.focus, 85);
        assert_eq!(metrics.engagement, 68);
    }

    #[test]
    fn neither_source_is_zero() {
        let cur = frame(None, vec![]);
        assert_eq!(attention(&cur, None), AttentionMetrics::default());
    }

    #[test]
    fn repeated_calls_are_identical() {
        let prev = frame(Some(head_pose(1.0)), vec![face_at(0.2, 0.2, 0.5, 0.6)]);
        let cur = frame(Some(head_pose(3.0)), vec![face_at(0.25, 0.2, 0.55, 0.6)]);
        assert_eq!(attention(&cur, Some(&prev)), attention(&cur, Some(&prev)));
    }
}
