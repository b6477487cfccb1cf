//! Frame ingestion sources.
//!
//! Camera acquisition belongs to the host. The crate only carries a synthetic
//! `stub://` source so the pipeline can run end to end without hardware.
//!
//! Sources hand out owned `VideoFrame`s with strictly increasing sequence
//! numbers. They MUST NOT store frames to disk or log pixel content.

use anyhow::{anyhow, Result};

pub mod synthetic;

pub use synthetic::SyntheticSource;

/// Scheme handled by the built-in synthetic source.
pub const STUB_SCHEME: &str = "stub://";

/// Configuration shared by frame sources.
#[derive(Clone, Debug)]
pub struct SourceConfig {
    pub url: String,
    /// Target frame rate. The detection loop ticks at this rate.
    pub target_fps: u32,
    pub width: u32,
    pub height: u32,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: "stub://camera".to_string(),
            target_fps: 30,
            width: 640,
            height: 480,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SourceStats {
    pub frames_captured: u64,
    pub url: String,
}

/// A stream of video frames.
pub trait FrameSource: Send {
    fn connect(&mut self) -> Result<()>;

    /// Capture the next frame.
    fn next_frame(&mut self) -> Result<crate::frame::VideoFrame>;

    fn is_healthy(&self) -> bool;

    fn stats(&self) -> SourceStats;
}

/// Open the source named by `config.url`.
pub fn open_source(config: SourceConfig) -> Result<Box<dyn FrameSource>> {
    if config.url.starts_with(STUB_SCHEME) {
        return Ok(Box::new(SyntheticSource::new(config)?));
    }
    Err(anyhow!(
        "unsupported source url '{}': camera acquisition is provided by the host, only {} sources are built in",
        config.url,
        STUB_SCHEME
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_stub_urls_only() {
        assert!(open_source(SourceConfig::default()).is_ok());

        let err = open_source(SourceConfig {
            url: "rtsp://10.0.0.2/stream".to_string(),
            ..SourceConfig::default()
        })
        .err()
        .unwrap();
        assert!(err.to_string().contains("unsupported source url"));
    }
}
