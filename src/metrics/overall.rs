use crate::metrics::{
    percent, AttentionMetrics, FaceAnalysisMetrics, HandActivityMetrics, OverallMetrics,
    PostureMetrics,
};

fn mean(a: u8, b: u8) -> u8 {
    percent((a as f64 + b as f64) / 2.0)
}

/// Summary group: each field is the mean of two component fields.
pub fn overall(
    posture: &PostureMetrics,
    attention: &AttentionMetrics,
    hand_activity: &HandActivityMetrics,
    face_analysis: &FaceAnalysisMetrics,
) -> OverallMetrics {
    OverallMetrics {
        confidence: mean(posture.confidence, face_analysis.confidence),
        engagement: mean(attention.engagement, hand_activity.gesture_intensity),
        activity: mean(hand_activity.hand_movement, attention.level),
        stability: mean(posture.stability, 100 - attention.distraction.min(100)),
    }
}
