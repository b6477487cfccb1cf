use std::f64::consts::FRAC_PI_2;

use crate::detect::{DetectionFrame, KeypointName};
use crate::metrics::geometry::mean_keypoint_displacement;
use crate::metrics::{percent, PostureMetrics};

/// Stability reported when there is no previous pose to compare against.
const STABILITY_WITHOUT_HISTORY: f64 = 50.0;

/// Posture from the current pose, with stability against the previous pose.
///
/// The spine runs from the hip centre to the nose. Alignment and slouching are
/// both linear in its angular deviation from `π/2`. Keypoint scores are not
/// consulted here.
pub fn posture(current: &DetectionFrame, previous: Option<&DetectionFrame>) -> PostureMetrics {
    let Some(pose) = current.pose.as_ref() else {
        return PostureMetrics::default();
    };

    let spine = (
        pose.position(KeypointName::Nose),
        pose.position(KeypointName::LeftHip),
        pose.position(KeypointName::RightHip),
    );
    let (alignment, slouching) = match spine {
        (Some(nose), Some(left_hip), Some(right_hip)) => {
            let hip_center = left_hip.midpoint(&right_hip);
            let spine_angle = (nose.y - hip_center.y).atan2((nose.x - hip_center.x).abs());
            let deviation_deg = (spine_angle - FRAC_PI_2).abs().to_degrees();
            (
                (100.0 - 2.0 * deviation_deg).max(0.0),
                (2.0 * deviation_deg).min(100.0),
            )
        }
        _ => (0.0, 0.0),
    };

    let stability = match previous.and_then(|frame| frame.pose.as_ref()) {
        Some(prev) => (100.0 - mean_keypoint_displacement(pose, prev, None)).max(0.0),
        None => STABILITY_WITHOUT_HISTORY,
    };

    PostureMetrics {
        confidence: percent(pose.score * 100.0),
        stability: percent(stability),
        alignment: percent(alignment),
        slouching: percent(slouching),
    }
}
