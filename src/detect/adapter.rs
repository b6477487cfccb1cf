//! Raw model outputs → `DetectionFrame`.
//!
//! Field renaming and unit conversion only: no filtering by score, no smoothing.
//! The one conversion is the face box, which models report in pixels and the
//! metrics consume as fractions of the frame.

use std::time::SystemTime;

use crate::detect::raw::{RawDetections, RawFace, RawHand, RawPose};
use crate::detect::result::{
    BoundingBox, DetectionFrame, Face, Hand, Handedness, Keypoint, KeypointName, Point2, Point3,
    Pose,
};

/// Frame geometry the adapter needs for normalization.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameGeometry {
    pub width: u32,
    pub height: u32,
    pub timestamp: SystemTime,
}

/// Build a `DetectionFrame`. `None` means the models are not loaded yet, which
/// yields an empty frame rather than an error.
pub fn adapt(raw: Option<RawDetections>, geometry: FrameGeometry) -> DetectionFrame {
    let Some(raw) = raw else {
        return DetectionFrame::empty(geometry.timestamp);
    };
    DetectionFrame {
        pose: raw.pose.map(adapt_pose),
        faces: raw
            .faces
            .into_iter()
            .map(|face| adapt_face(face, geometry.width, geometry.height))
            .collect(),
        hands: raw.hands.into_iter().filter_map(adapt_hand).collect(),
        timestamp: geometry.timestamp,
    }
}

fn adapt_pose(raw: RawPose) -> Pose {
    let keypoints = raw
        .keypoints
        .into_iter()
        .filter_map(|kp| {
            let Some(name) = KeypointName::from_label(&kp.name) else {
                log::debug!("skipping unrecognized keypoint '{}'", kp.name);
                return None;
            };
            Some(Keypoint {
                name,
                position: Point2::new(kp.x as f64, kp.y as f64),
                score: kp.score.unwrap_or(0.0) as f64,
            })
        })
        .collect();
    Pose {
        keypoints,
        score: raw.score.unwrap_or(0.0) as f64,
    }
}

fn adapt_face(raw: RawFace, width: u32, height: u32) -> Face {
    let scale_x = if width == 0 { 0.0 } else { 1.0 / width as f64 };
    let scale_y = if height == 0 { 0.0 } else { 1.0 / height as f64 };
    let b = raw.bounding_box;
    let bounding_box = BoundingBox {
        x_min: b.x_min as f64 * scale_x,
        y_min: b.y_min as f64 * scale_y,
        x_max: (b.x_min + b.width) as f64 * scale_x,
        y_max: (b.y_min + b.height) as f64 * scale_y,
    };
    let landmarks = if raw.keypoints.is_empty() {
        None
    } else {
        Some(
            raw.keypoints
                .iter()
                .map(|p| Point2::new(p.x as f64, p.y as f64))
                .collect(),
        )
    };
    Face {
        bounding_box,
        landmarks,
        score: raw.score.unwrap_or(0.0) as f64,
    }
}

fn adapt_hand(raw: RawHand) -> Option<Hand> {
    let Some(handedness) = Handedness::from_label(&raw.handedness) else {
        log::warn!("skipping hand with handedness '{}'", raw.handedness);
        return None;
    };
    Some(Hand {
        landmarks: raw
            .keypoints
            .iter()
            .map(|p| Point3::new(p.x as f64, p.y as f64, p.z.unwrap_or(0.0) as f64))
            .collect(),
        score: raw.score.unwrap_or(0.0) as f64,
        handedness,
    })
}
