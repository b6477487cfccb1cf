//! Behavior metrics derived from detection frames.
//!
//! Every calculator is a pure function of `(current, previous)` detection frames.
//! Percentages are integers in `0..=100`, rounded half-up once at the end of each
//! formula. Boolean flags and the expression label pass through unchanged.

mod attention;
mod face;
mod geometry;
mod hands;
mod overall;
mod posture;
mod smoother;

use serde::{Deserialize, Serialize};

use crate::detect::DetectionFrame;

pub use attention::attention;
pub use face::{classify_expression, face_analysis};
pub use hands::hand_activity;
pub use overall::overall;
pub use posture::posture;
pub use smoother::{Smoother, MAX_HISTORY_LEN};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostureMetrics {
    pub confidence: u8,
    pub stability: u8,
    pub alignment: u8,
    pub slouching: u8,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttentionMetrics {
    pub level: u8,
    pub focus: u8,
    pub engagement: u8,
    pub distraction: u8,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandActivityMetrics {
    pub left_hand_active: bool,
    pub right_hand_active: bool,
    pub gesture_intensity: u8,
    pub hand_movement: u8,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacialExpression {
    #[default]
    Neutral,
    Happy,
    Surprised,
}

impl FacialExpression {
    pub fn as_str(&self) -> &'static str {
        match self {
            FacialExpression::Neutral => "neutral",
            FacialExpression::Happy => "happy",
            FacialExpression::Surprised => "surprised",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceAnalysisMetrics {
    pub confidence: u8,
    pub eye_contact: u8,
    pub head_movement: u8,
    pub facial_expression: FacialExpression,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallMetrics {
    pub confidence: u8,
    pub engagement: u8,
    pub activity: u8,
    pub stability: u8,
}

/// One frame's worth of metrics. `Default` is the all-zero/neutral baseline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsVector {
    pub posture: PostureMetrics,
    pub attention: AttentionMetrics,
    pub hand_activity: HandActivityMetrics,
    pub face_analysis: FaceAnalysisMetrics,
    pub overall: OverallMetrics,
}

impl MetricsVector {
    pub fn baseline() -> Self {
        Self::default()
    }

    /// Raw (unsmoothed) metrics for one frame.
    ///
    /// A frame with no detections at all maps to the baseline. Without this
    /// rule the overall stability term `(posture.stability + 100 - distraction) / 2`
    /// would report 50 for an empty scene.
    pub fn compute(current: &DetectionFrame, previous: Option<&DetectionFrame>) -> Self {
        if current.is_empty() {
            return Self::baseline();
        }
        let posture = posture(current, previous);
        let attention = attention(current, previous);
        let hand_activity = hand_activity(current, previous);
        let face_analysis = face_analysis(current, previous);
        let overall = overall(&posture, &attention, &hand_activity, &face_analysis);
        Self {
            posture,
            attention,
            hand_activity,
            face_analysis,
            overall,
        }
    }
}

/// Round half up (`floor(x + 0.5)`), matching the display layer's rounding.
pub(crate) fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// Round and clamp into a percentage. NaN maps to 0.
pub(crate) fn percent(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    round_half_up(value).clamp(0.0, 100.0) as u8
}

/// Fuse a face-based and a pose-based estimate of the same field.
///
/// Both present: their mean. One present: that one. Neither: 0.
pub(crate) fn fuse(face: Option<f64>, pose: Option<f64>) -> u8 {
    match (face, pose) {
        (Some(f), Some(p)) => percent((f + p) / 2.0),
        (Some(v), None) | (None, Some(v)) => percent(v),
        (None, None) => 0,
    }
}
