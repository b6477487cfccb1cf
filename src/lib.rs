//! Behavior Lens
//!
//! Per-frame perception-to-metrics pipeline. Three pretrained models (body pose,
//! face, hands) run on every video frame; their detections are scored by a set of
//! geometric heuristics and smoothed over a short history into a behavior metrics
//! vector (posture, attention, hand activity, face analysis, overall).
//!
//! # Architecture
//!
//! ```text
//! FrameSource → ModelSet::detect_all → adapt → DetectionFrame
//!     → calculators (vs previous frame) → raw MetricsVector
//!     → Smoother → emitted MetricsVector → LoopHandle::metrics / MetricsUpdate
//! ```
//!
//! The scoring is deterministic. Faces and hands carry no identity across
//! frames: the first face in the list, matching handedness and same-named pose
//! keypoints are the only correspondence used.
//!
//! # Module Structure
//!
//! - `frame`: owned video frames and the read-only view models receive
//! - `ingest`: frame sources (synthetic `stub://` source)
//! - `detect`: detection types, raw model outputs, model traits and loading, adapter
//! - `metrics`: metric groups, calculators, aggregator and smoother
//! - `pipeline`: one owned pipeline instance (`process_frame`, `metrics`, `reset_metrics`)
//! - `detection_loop`: cancellable loop thread with a control handle
//! - `config`: file and environment configuration
//! - `error`: typed pipeline errors

pub mod config;
pub mod detect;
pub mod detection_loop;
pub mod error;
pub mod frame;
pub mod ingest;
pub mod metrics;
pub mod pipeline;

pub use config::PipelineConfig;
pub use detect::{
    DetectionFrame, Face, FaceModel, Hand, HandModel, Handedness, ModelSet, PoseModel,
    SyntheticFaceModel, SyntheticHandModel, SyntheticPoseModel,
};
pub use detection_loop::{
    DetectionLoop, LoopConfig, LoopHandle, LoopState, LoopStats, MetricsUpdate,
};
pub use error::{PipelineError, Result};
pub use frame::{InferenceView, VideoFrame};
pub use ingest::{open_source, FrameSource, SourceConfig, SyntheticSource};
pub use metrics::{FacialExpression, MetricsVector, Smoother};
pub use pipeline::{Pipeline, PipelineStats};

/// The synthetic model set used when no real backends are configured.
pub fn synthetic_models() -> ModelSet {
    ModelSet::new(
        SyntheticPoseModel::new(),
        SyntheticFaceModel::new(),
        SyntheticHandModel::new(),
    )
}
