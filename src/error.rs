//! Error types for the detection-to-metrics pipeline.

use thiserror::Error;

/// Errors surfaced by the pipeline and the detection loop.
///
/// Only `ModelLoad` is terminal. Per-frame `Detection` failures are recovered
/// by the pipeline and never reach the loop as errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A perception model failed to initialize.
    #[error("model load failed: {0}")]
    ModelLoad(String),

    /// A perception model failed during a single frame.
    #[error("detection failed for {model}: {reason}")]
    Detection {
        /// Model that failed.
        model: &'static str,
        /// Failure description.
        reason: String,
    },

    /// The frame source could not deliver a frame.
    #[error("frame source error: {0}")]
    Source(String),

    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The detection loop is no longer running.
    #[error("detection loop stopped")]
    LoopStopped,
}

impl PipelineError {
    /// Creates a model load error.
    #[must_use]
    pub fn model_load(reason: impl Into<String>) -> Self {
        Self::ModelLoad(reason.into())
    }

    /// Creates a per-frame detection error.
    #[must_use]
    pub fn detection(model: &'static str, reason: impl Into<String>) -> Self {
        Self::Detection {
            model,
            reason: reason.into(),
        }
    }

    /// Creates a frame source error.
    #[must_use]
    pub fn source(reason: impl Into<String>) -> Self {
        Self::Source(reason.into())
    }

    /// Creates an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig(reason.into())
    }

    /// True for errors after which no further frames can be processed.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ModelLoad(_) | Self::LoopStopped)
    }
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;
