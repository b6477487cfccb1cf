//! Raw model output shapes.
//!
//! These mirror what common pose/face/hand estimators emit, before renaming into
//! `DetectionFrame`. Field names deserialize from camelCase so outputs captured
//! from other runtimes can be replayed directly.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawKeypoint {
    pub name: String,
    /// Pixels.
    pub x: f32,
    /// Pixels.
    pub y: f32,
    pub score: Option<f32>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPose {
    pub keypoints: Vec<RawKeypoint>,
    pub score: Option<f32>,
}

/// Face box in pixels, origin top-left.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBox {
    pub x_min: f32,
    pub y_min: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPoint {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: Option<f32>,
}

impl RawPoint {
    pub const fn xy(x: f32, y: f32) -> Self {
        Self { x, y, z: None }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFace {
    #[serde(rename = "box")]
    pub bounding_box: RawBox,
    #[serde(default)]
    pub keypoints: Vec<RawPoint>,
    pub score: Option<f32>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawHand {
    pub keypoints: Vec<RawPoint>,
    pub score: Option<f32>,
    pub handedness: String,
}

/// The three model outputs for one frame.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawDetections {
    pub pose: Option<RawPose>,
    #[serde(default)]
    pub faces: Vec<RawFace>,
    #[serde(default)]
    pub hands: Vec<RawHand>,
}
