//! Synthetic `stub://` frame source.
//!
//! Produces RGB frames whose gradient drifts a little every frame, plus a small
//! random offset, so consecutive frames hash differently and the synthetic models
//! report small movements.

use anyhow::{anyhow, Result};
use rand::Rng;

use super::{FrameSource, SourceConfig, SourceStats, STUB_SCHEME};
use crate::frame::{VideoFrame, RGB_CHANNELS};

/// Frames between scene changes.
const SCENE_PERIOD: u64 = 50;

pub struct SyntheticSource {
    config: SourceConfig,
    connected: bool,
    frame_count: u64,
    scene_state: u8,
}

impl SyntheticSource {
    pub fn new(config: SourceConfig) -> Result<Self> {
        if !config.url.starts_with(STUB_SCHEME) {
            return Err(anyhow!(
                "synthetic source requires a {} url, got '{}'",
                STUB_SCHEME,
                config.url
            ));
        }
        if config.width == 0 || config.height == 0 {
            return Err(anyhow!("synthetic source needs non-zero frame dimensions"));
        }
        Ok(Self {
            config,
            connected: false,
            frame_count: 0,
            scene_state: 0,
        })
    }

    fn generate_pixels(&mut self) -> Vec<u8> {
        if self.frame_count % SCENE_PERIOD == 0 {
            self.scene_state = self.scene_state.wrapping_add(1);
        }
        let noise: u64 = rand::thread_rng().gen_range(0..4);
        let offset = self.frame_count + self.scene_state as u64 + noise;

        let len = self.config.width as usize * self.config.height as usize * RGB_CHANNELS;
        (0..len)
            .map(|i| ((i as u64 + offset) % 256) as u8)
            .collect()
    }
}

impl FrameSource for SyntheticSource {
    fn connect(&mut self) -> Result<()> {
        self.connected = true;
        log::info!("SyntheticSource: connected to {}", self.config.url);
        Ok(())
    }

    fn next_frame(&mut self) -> Result<VideoFrame> {
        if !self.connected {
            return Err(anyhow!("source {} is not connected", self.config.url));
        }
        let pixels = self.generate_pixels();
        let frame = VideoFrame::new(
            pixels,
            self.config.width,
            self.config.height,
            self.frame_count,
        );
        self.frame_count += 1;
        Ok(frame)
    }

    fn is_healthy(&self) -> bool {
        self.connected
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frame_count,
            url: self.config.url.clone(),
        }
    }
}
