use crate::detect::{Hand, KeypointName, Point2, Pose};

/// Mean distance between same-named keypoints of two poses.
///
/// With `min_score`, a pair only counts when both keypoints score above it.
/// No matching pairs gives 0.
pub(crate) fn mean_keypoint_displacement(
    current: &Pose,
    previous: &Pose,
    min_score: Option<f64>,
) -> f64 {
    let mut total = 0.0;
    let mut count = 0usize;
    for kp in &current.keypoints {
        let Some(prev) = previous.keypoint(kp.name) else {
            continue;
        };
        if let Some(threshold) = min_score {
            if kp.score <= threshold || prev.score <= threshold {
                continue;
            }
        }
        total += kp.position.distance_to(&prev.position);
        count += 1;
    }
    if count == 0 {
        0.0
    } else {
        total / count as f64
    }
}

/// Midpoint of both eyes, when both exist.
pub(crate) fn eye_center(pose: &Pose) -> Option<Point2> {
    let left = pose.position(KeypointName::LeftEye)?;
    let right = pose.position(KeypointName::RightEye)?;
    Some(left.midpoint(&right))
}

/// Nose-to-eye-centre distance, when nose and both eyes exist.
pub(crate) fn nose_to_eye_center(pose: &Pose) -> Option<f64> {
    let nose = pose.position(KeypointName::Nose)?;
    Some(nose.distance_to(&eye_center(pose)?))
}

/// Count of keypoints scoring strictly above `threshold`.
pub(crate) fn count_above(pose: &Pose, threshold: f64) -> usize {
    pose.keypoints
        .iter()
        .filter(|kp| kp.score > threshold)
        .count()
}

/// Mean planar landmark displacement between two detections of the same hand.
///
/// `None` when the landmark counts differ or are zero. Depth is ignored.
pub(crate) fn mean_landmark_displacement(current: &Hand, previous: &Hand) -> Option<f64> {
    let n = current.landmarks.len();
    if n == 0 || n != previous.landmarks.len() {
        return None;
    }
    let total: f64 = current
        .landmarks
        .iter()
        .zip(&previous.landmarks)
        .map(|(a, b)| a.xy().distance_to(&b.xy()))
        .sum();
    Some(total / n as f64)
}
