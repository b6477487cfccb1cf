use std::collections::VecDeque;

use crate::metrics::{percent, MetricsVector};

/// Hard cap on smoothing history (frames).
pub const MAX_HISTORY_LEN: usize = 10;

const NUMERIC_FIELDS: usize = 17;

/// Linearly weighted moving average over the most recent metric vectors.
///
/// The i-th entry (oldest first) weighs `i + 1`, so the newest frame dominates.
/// Hand activity flags and the expression label bypass the average and are taken
/// from the newest raw vector.
pub struct Smoother {
    history: VecDeque<MetricsVector>,
    current: MetricsVector,
}

impl Smoother {
    pub fn new() -> Self {
        Self {
            history: VecDeque::with_capacity(MAX_HISTORY_LEN),
            current: MetricsVector::baseline(),
        }
    }

    /// Push one raw vector and return the newly emitted (smoothed) vector.
    pub fn push(&mut self, raw: MetricsVector) -> MetricsVector {
        while self.history.len() >= MAX_HISTORY_LEN {
            self.history.pop_front();
        }
        self.history.push_back(raw);

        let mut sums = [0.0f64; NUMERIC_FIELDS];
        let mut total_weight = 0.0;
        for (i, entry) in self.history.iter().enumerate() {
            let weight = (i + 1) as f64;
            total_weight += weight;
            for (sum, value) in sums.iter_mut().zip(numeric_fields(entry)) {
                *sum += weight * value as f64;
            }
        }

        let smoothed = sums.map(|sum| percent(sum / total_weight));
        self.current = with_numeric_fields(&raw, smoothed);
        self.current
    }

    /// Latest emitted vector.
    pub fn current(&self) -> &MetricsVector {
        &self.current
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Raw history, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &MetricsVector> + '_ {
        self.history.iter()
    }

    /// Drop all history and emit the baseline.
    pub fn reset(&mut self) {
        self.history.clear();
        self.current = MetricsVector::baseline();
    }
}

impl Default for Smoother {
    fn default() -> Self {
        Self::new()
    }
}

fn numeric_fields(m: &MetricsVector) -> [u8; NUMERIC_FIELDS] {
    [
        m.posture.confidence,
        m.posture.stability,
        m.posture.alignment,
        m.posture.slouching,
        m.attention.level,
        m.attention.focus,
        m.attention.engagement,
        m.attention.distraction,
        m.hand_activity.gesture_intensity,
        m.hand_activity.hand_movement,
        m.face_analysis.confidence,
        m.face_analysis.eye_contact,
        m.face_analysis.head_movement,
        m.overall.confidence,
        m.overall.engagement,
        m.overall.activity,
        m.overall.stability,
    ]
}

/// Copy of `template` with its numeric fields replaced, in `numeric_fields` order.
fn with_numeric_fields(template: &MetricsVector, v: [u8; NUMERIC_FIELDS]) -> MetricsVector {
    let mut m = *template;
    m.posture.confidence = v[0];
    m.posture.stability = v[1];
    m.posture.alignment = v[2];
    m.posture.slouching = v[3];
    m.attention.level = v[4];
    m.attention.focus = v[5];
    m.attention.engagement = v[6];
    m.attention.distraction = v[7];
    m.hand_activity.gesture_intensity = v[8];
    m.hand_activity.hand_movement = v[9];
    m.face_analysis.confidence = v[10];
    m.face_analysis.eye_contact = v[11];
    m.face_analysis.head_movement = v[12];
    m.overall.confidence = v[13];
    m.overall.engagement = v[14];
    m.overall.activity = v[15];
    m.overall.stability = v[16];
    m
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::FacialExpression;

    fn uniform(value: u8) -> MetricsVector {
        with_numeric_fields(&MetricsVector::baseline(), [value; NUMERIC_FIELDS])
    }

    #[test]
    fn single_entry_passes_through() {
        let mut smoother = Smoother::new();
        let out = smoother.push(uniform(42));
        assert_eq!(out, uniform(42));
        assert_eq!(smoother.len(), 1);
    }

    #[test]
    fn newest_entry_weighs_most() {
        let mut smoother = Smoother::new();
        smoother.push(uniform(0));
        let out = smoother.push(uniform(90));
        // (1*0 + 2*90) / 3
        assert_eq!(out.attention.level, 60);
        assert_eq!(out.overall.stability, 60);
    }

    #[test]
    fn history_is_bounded_to_ten_most_recent() {
        let mut smoother = Smoother::new();
        let mut out = MetricsVector::baseline();
        for i in 0..15u8 {
            out = smoother.push(uniform(i * 5));
        }
        assert_eq!(smoother.len(), MAX_HISTORY_LEN);
        let oldest = smoother.history().next().unwrap();
        assert_eq!(oldest.posture.confidence, 25);
        // Values 25..=70 step 5, weights 1..=10: 25 + 5 * (Σ i·w)/55 = 25 + 5·6.
        assert_eq!(out.posture.confidence, 55);
    }

    #[test]
    fn flags_and_expression_are_not_smoothed() {
        let mut smoother = Smoother::new();
        let mut first = uniform(10);
        first.hand_activity.left_hand_active = true;
        first.face_analysis.facial_expression = FacialExpression::Surprised;
        smoother.push(first);

        let second = uniform(10);
        let out = smoother.push(second);
        assert!(!out.hand_activity.left_hand_active);
        assert_eq!(out.face_analysis.facial_expression, FacialExpression::Neutral);
    }

    #[test]
    fn reset_restores_baseline() {
        let mut smoother = Smoother::new();
        for _ in 0..4 {
            smoother.push(uniform(77));
        }
        smoother.reset();
        assert!(smoother.is_empty());
        assert_eq!(*smoother.current(), MetricsVector::baseline());

        let out = smoother.push(uniform(20));
        assert_eq!(out, uniform(20));
    }
}
