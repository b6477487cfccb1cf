//! One owned pipeline instance: models, previous frame, smoothing history.
//!
//! `process_frame` is one full pass (detect → adapt → calculate → smooth). All
//! mutable state lives in the struct and is touched by one caller at a time, so
//! there is no locking here. The detection loop owns a `Pipeline` exclusively.

use crate::detect::{adapt, DetectionFrame, FrameGeometry, ModelSet, ModelSlot, PendingModels};
use crate::error::{PipelineError, Result};
use crate::frame::VideoFrame;
use crate::metrics::{MetricsVector, Smoother};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub frames_processed: u64,
    /// Frames whose detection failed and fell back to empty results.
    pub failed_detections: u64,
    /// Frames processed while models were still loading.
    pub frames_before_ready: u64,
}

pub struct Pipeline {
    models: ModelSlot,
    previous: Option<DetectionFrame>,
    smoother: Smoother,
    stats: PipelineStats,
}

impl Pipeline {
    /// Start loading `models` in the background. Frames processed before loading
    /// finishes produce empty detections.
    pub fn new(models: ModelSet) -> Self {
        Self::with_pending(models.load_in_background())
    }

    pub fn with_pending(pending: PendingModels) -> Self {
        Self::from_slot(ModelSlot::Loading(pending))
    }

    /// Load `models` on the calling thread before returning.
    pub fn load_blocking(mut models: ModelSet) -> Result<Self> {
        models.load()?;
        Ok(Self::from_slot(ModelSlot::Ready(models)))
    }

    fn from_slot(models: ModelSlot) -> Self {
        Self {
            models,
            previous: None,
            smoother: Smoother::new(),
            stats: PipelineStats::default(),
        }
    }

    /// Run one frame through the pipeline and return what was detected.
    ///
    /// Per-frame model failures are absorbed: the frame counts as an empty
    /// detection. Only a failed model load is returned as an error, and it is
    /// returned on every call after that.
    pub fn process_frame(&mut self, frame: &VideoFrame) -> Result<DetectionFrame> {
        self.models.poll();

        let raw = match &mut self.models {
            ModelSlot::Failed(reason) => return Err(PipelineError::model_load(reason.clone())),
            ModelSlot::Loading(_) => {
                self.stats.frames_before_ready += 1;
                None
            }
            ModelSlot::Ready(models) => match models.detect_all(&frame.inference_view()) {
                Ok(raw) => Some(raw),
                Err(e) => {
                    log::warn!("frame {}: {}; using empty detections", frame.sequence, e);
                    self.stats.failed_detections += 1;
                    Some(Default::default())
                }
            },
        };

        let detection = adapt(
            raw,
            FrameGeometry {
                width: frame.width,
                height: frame.height,
                timestamp: frame.captured_at,
            },
        );
        let raw_metrics = MetricsVector::compute(&detection, self.previous.as_ref());
        self.smoother.push(raw_metrics);
        self.previous = Some(detection.clone());
        self.stats.frames_processed += 1;
        Ok(detection)
    }

    /// Latest smoothed metrics.
    pub fn metrics(&self) -> &MetricsVector {
        self.smoother.current()
    }

    /// Clear smoothing history and emit the baseline.
    pub fn reset_metrics(&mut self) {
        self.smoother.reset();
    }

    /// Cold restart: also forget the previous frame, so the next frame has
    /// nothing to compute deltas against.
    pub fn restart(&mut self) {
        self.smoother.reset();
        self.previous = None;
    }

    pub fn history_len(&self) -> usize {
        self.smoother.len()
    }

    pub fn previous_frame(&self) -> Option<&DetectionFrame> {
        self.previous.as_ref()
    }

    pub fn is_ready(&self) -> bool {
        self.models.is_ready()
    }

    /// Load error, if model loading failed.
    pub fn failure(&self) -> Option<&str> {
        match &self.models {
            ModelSlot::Failed(reason) => Some(reason),
            _ => None,
        }
    }

    pub fn stats(&self) -> PipelineStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{SyntheticFaceModel, SyntheticHandModel, SyntheticPoseModel};

    fn synthetic() -> ModelSet {
        ModelSet::new(
            SyntheticPoseModel::new(),
            SyntheticFaceModel::new(),
            SyntheticHandModel::new(),
        )
    }

    fn frame(seq: u64) -> VideoFrame {
        let pixels = (0..64 * 48 * 3).map(|i| ((i as u64 + seq) % 256) as u8).collect();
        VideoFrame::new(pixels, 64, 48, seq)
    }

    #[test]
    fn first_frame_uses_stability_default() {
        let mut pipeline = Pipeline::load_blocking(synthetic()).unwrap();
        let detection = pipeline.process_frame(&frame(0)).unwrap();
        assert!(detection.pose.is_some());
        assert_eq!(pipeline.metrics().posture.stability, 50);
        assert_eq!(pipeline.history_len(), 1);
    }

    #[test]
    fn reset_keeps_previous_frame_but_clears_history() {
        let mut pipeline = Pipeline::load_blocking(synthetic()).unwrap();
        for seq in 0..3 {
            pipeline.process_frame(&frame(seq)).unwrap();
        }
        pipeline.reset_metrics();
        assert_eq!(*pipeline.metrics(), MetricsVector::baseline());
        assert_eq!(pipeline.history_len(), 0);
        assert!(pipeline.previous_frame().is_some());

        pipeline.restart();
        assert!(pipeline.previous_frame().is_none());
    }

    #[test]
    fn stats_count_processed_frames() {
        let mut pipeline = Pipeline::load_blocking(synthetic()).unwrap();
        for seq in 0..4 {
            pipeline.process_frame(&frame(seq)).unwrap();
        }
        let stats = pipeline.stats();
        assert_eq!(stats.frames_processed, 4);
        assert_eq!(stats.failed_detections, 0);
        assert_eq!(stats.frames_before_ready, 0);
    }
}
