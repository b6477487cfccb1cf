use crate::detect::{DetectionFrame, Handedness};
use crate::metrics::geometry::mean_landmark_displacement;
use crate::metrics::{percent, HandActivityMetrics};

/// A hand counts as active above this detection score.
const ACTIVE_SCORE: f64 = 0.5;

/// Hand activity. Hands are matched across frames by handedness only, first
/// match wins.
///
/// Both hands add into one movement accumulator before scaling, so gesture
/// intensity and hand movement always move together (10x and 5x respectively).
pub fn hand_activity(
    current: &DetectionFrame,
    previous: Option<&DetectionFrame>,
) -> HandActivityMetrics {
    let left = current.hand(Handedness::Left);
    let right = current.hand(Handedness::Right);

    let mut movement = 0.0;
    if let Some(previous) = previous {
        for side in [Handedness::Left, Handedness::Right] {
            let (Some(cur), Some(prev)) = (current.hand(side), previous.hand(side)) else {
                continue;
            };
            if let Some(delta) = mean_landmark_displacement(cur, prev) {
                movement += delta;
            }
        }
    }

    HandActivityMetrics {
        left_hand_active: left.is_some_and(|h| h.score > ACTIVE_SCORE),
        right_hand_active: right.is_some_and(|h| h.score > ACTIVE_SCORE),
        gesture_intensity: percent((10.0 * movement).min(100.0)),
        hand_movement: percent((5.0 * movement).min(100.0)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{Hand, Point3, HAND_LANDMARK_COUNT};
    use std::time::SystemTime;

    fn hand(handedness: Handedness, score: f64, dx: f64) -> Hand {
        Hand {
            landmarks: (0..HAND_LANDMARK_COUNT)
                .map(|i| Point3::new(i as f64 + dx, 2.0 * i as f64, 0.1 * i as f64))
                .collect(),
            score,
            handedness,
        }
    }

    fn frame(hands: Vec<Hand>) -> DetectionFrame {
        DetectionFrame {
            pose: None,
            faces: vec![],
            hands,
            timestamp: SystemTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn activity_flags_need_score_above_half() {
        let cur = frame(vec![
            hand(Handedness::Left, 0.5, 0.0),
            hand(Handedness::Right, 0.51, 0.0),
        ]);
        let metrics = hand_activity(&cur, None);
        assert!(!metrics.left_hand_active);
        assert!(metrics.right_hand_active);
        assert_eq!(metrics.gesture_intensity, 0);
        assert_eq!(metrics.hand_movement, 0);
    }

    #[test]
    fn tiny_shift_rounds_to_zero() {
        let prev = frame(vec![hand(Handedness::Left, 0.9, 0.0)]);
        let cur = frame(vec![hand(Handedness::Left, 0.9, 0.01)]);
        let metrics = hand_activity(&cur, Some(&prev));
        assert_eq!(metrics.hand_movement, 0);
        assert_eq!(metrics.gesture_intensity, 0);
    }

    #[test]
    fn both_hands_accumulate_before_scaling() {
        let prev = frame(vec![
            hand(Handedness::Left, 0.9, 0.0),
            hand(Handedness::Right, 0.9, 0.0),
        ]);
        let cur = frame(vec![
            hand(Handedness::Left, 0.9, 1.5),
            hand(Handedness::Right, 0.9, 0.5),
        ]);
        let metrics = hand_activity(&cur, Some(&prev));
        // sum = 1.5 + 0.5
        assert_eq!(metrics.gesture_intensity, 20);
        assert_eq!(metrics.hand_movement, 10);
    }

    #[test]
    fn movement_saturates_at_hundred() {
        let prev = frame(vec![hand(Handedness::Right, 0.9, 0.0)]);
        let cur = frame(vec![hand(Handedness::Right, 0.9, 40.0)]);
        let metrics = hand_activity(&cur, Some(&prev));
        assert_eq!(metrics.gesture_intensity, 100);
        assert_eq!(metrics.hand_movement, 100);
    }

    #[test]
    fn handedness_swap_is_not_matched() {
        let prev = frame(vec![hand(Handedness::Left, 0.9, 0.0)]);
        let cur = frame(vec![hand(Handedness::Right, 0.9, 5.0)]);
        assert_eq!(hand_activity(&cur, Some(&prev)).hand_movement, 0);
    }

    #[test]
    fn mismatched_landmark_counts_are_skipped() {
        let prev = frame(vec![hand(Handedness::Left, 0.9, 0.0)]);
        let mut partial = hand(Handedness::Left, 0.9, 3.0);
        partial.landmarks.truncate(5);
        let cur = frame(vec![partial]);
        assert_eq!(hand_activity(&cur, Some(&prev)).gesture_intensity, 0);
    }
}
