use anyhow::Result;

use crate::detect::raw::{RawFace, RawHand, RawPose};
use crate::frame::InferenceView;

/// Which perception model a backend implements.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelKind {
    Pose,
    Face,
    Hand,
}

impl ModelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::Pose => "pose",
            ModelKind::Face => "face",
            ModelKind::Hand => "hand",
        }
    }
}

/// Single-person body pose estimator.
///
/// Implementations must treat the view as read-only and must not keep pixels
/// beyond the call. Returning `Ok(None)` means nobody is in frame.
pub trait PoseModel: Send {
    fn name(&self) -> &'static str;

    /// One-time initialization (weights, warm-up). Runs on the loader thread.
    fn load(&mut self) -> Result<()> {
        Ok(())
    }

    fn estimate(&mut self, view: &InferenceView<'_>) -> Result<Option<RawPose>>;
}

/// Face detector. Returns faces in model order; the first is treated as primary.
pub trait FaceModel: Send {
    fn name(&self) -> &'static str;

    fn load(&mut self) -> Result<()> {
        Ok(())
    }

    fn detect(&mut self, view: &InferenceView<'_>) -> Result<Vec<RawFace>>;
}

/// Hand landmark detector. Each hand carries 21 landmarks and a handedness label.
pub trait HandModel: Send {
    fn name(&self) -> &'static str;

    fn load(&mut self) -> Result<()> {
        Ok(())
    }

    fn detect(&mut self, view: &InferenceView<'_>) -> Result<Vec<RawHand>>;
}
