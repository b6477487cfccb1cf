//! Synthetic perception models.
//!
//! Each model hashes the frame pixels and turns the digest into small,
//! deterministic jitter around a fixed scene: one person seated facing the
//! camera, hands on the desk. Identical pixels always give identical detections.

use anyhow::{anyhow, Result};
use sha2::{Digest, Sha256};

use crate::detect::backend::{FaceModel, HandModel, PoseModel};
use crate::detect::raw::{RawBox, RawFace, RawHand, RawKeypoint, RawPoint, RawPose};
use crate::detect::result::{KeypointName, HAND_LANDMARK_COUNT};
use crate::frame::InferenceView;

fn frame_digest(view: &InferenceView<'_>) -> [u8; 32] {
    Sha256::digest(view.pixels()).into()
}

/// Maps one digest byte into `[-amplitude, amplitude]`.
fn jitter(digest: &[u8; 32], slot: usize, amplitude: f32) -> f32 {
    (digest[slot % digest.len()] as f32 / 255.0 - 0.5) * 2.0 * amplitude
}

fn require_dimensions(view: &InferenceView<'_>) -> Result<(f32, f32)> {
    if view.width() == 0 || view.height() == 0 {
        return Err(anyhow!(
            "frame has zero dimension {}x{}",
            view.width(),
            view.height()
        ));
    }
    Ok((view.width() as f32, view.height() as f32))
}

/// Upright seated pose, as (x, y, score) fractions of the frame.
const SEATED_POSE: [(f32, f32, f32); 17] = [
    (0.50, 0.25, 0.95),
    (0.47, 0.22, 0.92),
    (0.53, 0.22, 0.92),
    (0.44, 0.23, 0.70),
    (0.56, 0.23, 0.70),
    (0.36, 0.42, 0.88),
    (0.64, 0.42, 0.88),
    (0.30, 0.60, 0.75),
    (0.70, 0.60, 0.75),
    (0.38, 0.72, 0.65),
    (0.62, 0.72, 0.65),
    (0.42, 0.85, 0.55),
    (0.58, 0.85, 0.55),
    (0.42, 0.98, 0.12),
    (0.58, 0.98, 0.12),
    (0.42, 1.10, 0.05),
    (0.58, 1.10, 0.05),
];

pub struct SyntheticPoseModel {
    /// Max keypoint jitter in pixels.
    amplitude: f32,
}

impl SyntheticPoseModel {
    pub fn new() -> Self {
        Self { amplitude: 3.0 }
    }

    pub fn with_amplitude(mut self, amplitude: f32) -> Self {
        self.amplitude = amplitude;
        self
    }
}

impl Default for SyntheticPoseModel {
    fn default() -> Self {
        Self::new()
    }
}

impl PoseModel for SyntheticPoseModel {
    fn name(&self) -> &'static str {
        "synthetic-pose"
    }

    fn estimate(&mut self, view: &InferenceView<'_>) -> Result<Option<RawPose>> {
        let (w, h) = require_dimensions(view)?;
        let digest = frame_digest(view);

        let keypoints = KeypointName::ALL
            .iter()
            .zip(SEATED_POSE.iter())
            .enumerate()
            .map(|(i, (name, (fx, fy, score)))| RawKeypoint {
                name: name.as_str().to_string(),
                x: fx * w + jitter(&digest, 2 * i, self.amplitude),
                y: fy * h + jitter(&digest, 2 * i + 1, self.amplitude),
                score: Some(*score),
            })
            .collect();

        Ok(Some(RawPose {
            keypoints,
            score: Some(0.85 + jitter(&digest, 31, 0.05)),
        }))
    }
}

pub struct SyntheticFaceModel;

impl SyntheticFaceModel {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SyntheticFaceModel {
    fn default() -> Self {
        Self::new()
    }
}

impl FaceModel for SyntheticFaceModel {
    fn name(&self) -> &'static str {
        "synthetic-face"
    }

    fn detect(&mut self, view: &InferenceView<'_>) -> Result<Vec<RawFace>> {
        let (w, h) = require_dimensions(view)?;
        let digest = frame_digest(view);

        let face_w = 0.22 * w;
        let face_h = 0.28 * h;
        let x_min = 0.5 * w - face_w / 2.0 + jitter(&digest, 3, 0.01 * w);
        let y_min = 0.12 * h + jitter(&digest, 5, 0.01 * h);

        let cx = x_min + face_w / 2.0;
        let mouth_y = y_min + 0.78 * face_h;
        let half_mouth = 0.18 * face_w;
        // Mouth opening varies with the frame so every expression shows up.
        let opening = (digest[7] as f32 / 255.0) * 0.4 * (2.0 * half_mouth);

        let keypoints = vec![
            RawPoint::xy(cx - 0.2 * face_w, y_min + 0.35 * face_h),
            RawPoint::xy(cx + 0.2 * face_w, y_min + 0.35 * face_h),
            RawPoint::xy(cx, y_min + 0.55 * face_h),
            RawPoint::xy(cx - half_mouth, mouth_y),
            RawPoint::xy(cx + half_mouth, mouth_y),
            RawPoint::xy(cx, mouth_y + opening),
        ];

        Ok(vec![RawFace {
            bounding_box: RawBox {
                x_min,
                y_min,
                width: face_w,
                height: face_h,
            },
            keypoints,
            score: Some(0.9 + jitter(&digest, 9, 0.05)),
        }])
    }
}

pub struct SyntheticHandModel;

impl SyntheticHandModel {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SyntheticHandModel {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntheticHandModel {
    /// Wrist plus five fingers of four joints, fanned upward.
    fn landmarks(
        wrist_x: f32,
        wrist_y: f32,
        span: f32,
        digest: &[u8; 32],
        salt: usize,
    ) -> Vec<RawPoint> {
        let mut points = Vec::with_capacity(HAND_LANDMARK_COUNT);
        points.push(RawPoint {
            x: wrist_x,
            y: wrist_y,
            z: Some(0.0),
        });
        for finger in 0..5 {
            let dx = (finger as f32 - 2.0) * 0.25 * span;
            for joint in 1..=4 {
                let reach = joint as f32 * 0.25 * span;
                points.push(RawPoint {
                    x: wrist_x + dx * joint as f32 / 4.0 + jitter(digest, salt + finger, 1.5),
                    y: wrist_y - reach + jitter(digest, salt + finger + joint, 1.5),
                    z: Some(-0.01 * joint as f32),
                });
            }
        }
        points
    }
}

impl HandModel for SyntheticHandModel {
    fn name(&self) -> &'static str {
        "synthetic-hand"
    }

    fn detect(&mut self, view: &InferenceView<'_>) -> Result<Vec<RawHand>> {
        let (w, h) = require_dimensions(view)?;
        let digest = frame_digest(view);
        let span = 0.12 * h;

        // Image-left hand is the subject's right hand.
        let right = RawHand {
            keypoints: Self::landmarks(0.38 * w, 0.75 * h, span, &digest, 11),
            score: Some(0.8 + jitter(&digest, 19, 0.1)),
            handedness: "Right".to_string(),
        };
        let left = RawHand {
            keypoints: Self::landmarks(0.62 * w, 0.75 * h, span, &digest, 21),
            score: Some(0.5 + jitter(&digest, 29, 0.3)),
            handedness: "Left".to_string(),
        };
        Ok(vec![right, left])
    }
}
