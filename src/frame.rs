//! Video frame container.
//!
//! - `VideoFrame`: owned RGB pixels plus dimensions and capture time. Bytes are private.
//! - `InferenceView`: the restricted view perception models receive.
//!
//! Frames are transient: a frame lives for one pipeline pass and its pixel memory
//! is zeroized when dropped.

use std::time::SystemTime;
use zeroize::Zeroize;

/// Bytes per pixel for frames produced by the ingestion layer (packed RGB).
pub const RGB_CHANNELS: usize = 3;

/// Owned video frame. There is no `Clone` and no byte accessor on the frame
/// itself; models read pixels through `InferenceView`.
pub struct VideoFrame {
    data: Vec<u8>,

    pub width: u32,
    pub height: u32,

    /// Wall-clock capture time, carried into the `DetectionFrame` timestamp.
    pub captured_at: SystemTime,

    /// Monotonic frame counter assigned by the source.
    pub sequence: u64,
}

impl VideoFrame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, sequence: u64) -> Self {
        Self::with_timestamp(data, width, height, sequence, SystemTime::now())
    }

    pub fn with_timestamp(
        data: Vec<u8>,
        width: u32,
        height: u32,
        sequence: u64,
        captured_at: SystemTime,
    ) -> Self {
        Self {
            data,
            width,
            height,
            captured_at,
            sequence,
        }
    }

    /// Models get a read-only view for inference.
    pub fn inference_view(&self) -> InferenceView<'_> {
        InferenceView { frame: self }
    }

    pub fn byte_len(&self) -> usize {
        self.data.len()
    }
}

impl Drop for VideoFrame {
    fn drop(&mut self) {
        self.data.zeroize();
    }
}

/// Read-only view of a frame handed to perception models.
///
/// The view is `Copy` and `Sync`, so the three models of one frame can share it
/// across threads while the frame itself stays owned by the pipeline.
#[derive(Clone, Copy)]
pub struct InferenceView<'a> {
    frame: &'a VideoFrame,
}

impl<'a> InferenceView<'a> {
    pub fn width(&self) -> u32 {
        self.frame.width
    }

    pub fn height(&self) -> u32 {
        self.frame.height
    }

    pub fn captured_at(&self) -> SystemTime {
        self.frame.captured_at
    }

    pub fn sequence(&self) -> u64 {
        self.frame.sequence
    }

    /// Packed RGB pixels. Models must treat the slice as ephemeral.
    pub fn pixels(&self) -> &'a [u8] {
        &self.frame.data
    }

    /// True when the pixel buffer matches `width * height * 3`.
    pub fn is_well_formed(&self) -> bool {
        (self.frame.width as usize)
            .checked_mul(self.frame.height as usize)
            .and_then(|v| v.checked_mul(RGB_CHANNELS))
            .is_some_and(|expected| expected == self.frame.data.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inference_view_exposes_metadata() {
        let frame = VideoFrame::new(vec![7u8; 4 * 2 * 3], 4, 2, 9);
        let view = frame.inference_view();

        assert_eq!(view.width(), 4);
        assert_eq!(view.height(), 2);
        assert_eq!(view.sequence(), 9);
        assert_eq!(view.pixels().len(), 24);
        assert!(view.is_well_formed());
    }

    #[test]
    fn short_buffer_is_not_well_formed() {
        let frame = VideoFrame::new(vec![0u8; 10], 4, 2, 0);
        assert!(!frame.inference_view().is_well_formed());
    }
}
