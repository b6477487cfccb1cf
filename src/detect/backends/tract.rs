#![cfg(feature = "backend-tract")]

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use tract_onnx::prelude::*;

use crate::detect::backend::PoseModel;
use crate::detect::raw::{RawKeypoint, RawPose};
use crate::detect::result::KeypointName;
use crate::frame::{InferenceView, RGB_CHANNELS};

type Plan = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Single-person pose model run through tract.
///
/// Expects an ONNX graph taking `[1, 3, H, W]` f32 RGB in `0..1` and producing
/// `[1, 1, 17, 3]` rows of `(y, x, score)` in frame fractions, COCO keypoint order.
/// Frames must already be `H x W`; the ingestion layer owns resizing.
pub struct TractPoseModel {
    model_path: PathBuf,
    model: Option<Plan>,
    width: u32,
    height: u32,
}

impl TractPoseModel {
    /// The graph is not read until `load`, which runs on the loader thread.
    pub fn new<P: AsRef<Path>>(model_path: P, width: u32, height: u32) -> Self {
        Self {
            model_path: model_path.as_ref().to_path_buf(),
            model: None,
            width,
            height,
        }
    }

    fn build_input(&self, view: &InferenceView<'_>) -> Result<Tensor> {
        if view.width() != self.width || view.height() != self.height {
            return Err(anyhow!(
                "frame size {}x{} does not match model input {}x{}",
                view.width(),
                view.height(),
                self.width,
                self.height
            ));
        }
        if !view.is_well_formed() {
            return Err(anyhow!(
                "expected {} RGB bytes, received {}",
                self.width as usize * self.height as usize * RGB_CHANNELS,
                view.pixels().len()
            ));
        }

        let pixels = view.pixels();
        let width = self.width as usize;
        let input = tract_ndarray::Array4::from_shape_fn(
            (1, 3, self.height as usize, width),
            |(_, channel, y, x)| {
                let idx = (y * width + x) * RGB_CHANNELS + channel;
                pixels[idx] as f32 / 255.0
            },
        );
        Ok(input.into_tensor())
    }

    fn decode(&self, outputs: TVec<TValue>) -> Result<RawPose> {
        let output = outputs
            .first()
            .ok_or_else(|| anyhow!("model produced no outputs"))?;
        let rows = output
            .to_array_view::<f32>()
            .context("model output tensor was not f32")?;
        let flat: Vec<f32> = rows.iter().copied().collect();
        if flat.len() < KeypointName::ALL.len() * 3 {
            return Err(anyhow!(
                "expected {} keypoint values, model produced {}",
                KeypointName::ALL.len() * 3,
                flat.len()
            ));
        }

        let keypoints: Vec<RawKeypoint> = KeypointName::ALL
            .iter()
            .map(|name| {
                let row = &flat[name.index() * 3..name.index() * 3 + 3];
                RawKeypoint {
                    name: name.as_str().to_string(),
                    x: row[1] * self.width as f32,
                    y: row[0] * self.height as f32,
                    score: Some(row[2]),
                }
            })
            .collect();
        let mean_score = keypoints.iter().filter_map(|kp| kp.score).sum::<f32>()
            / keypoints.len() as f32;

        Ok(RawPose {
            keypoints,
            score: Some(mean_score),
        })
    }
}

impl PoseModel for TractPoseModel {
    fn name(&self) -> &'static str {
        "tract-pose"
    }

    fn load(&mut self) -> Result<()> {
        let path = &self.model_path;
        let model = tract_onnx::onnx()
            .model_for_path(path)
            .with_context(|| format!("failed to load ONNX model from {}", path.display()))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(
                    f32::datum_type(),
                    tvec!(1, 3, self.height as usize, self.width as usize),
                ),
            )
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;
        log::info!("tract pose model loaded from {}", path.display());
        self.model = Some(model);
        Ok(())
    }

    fn estimate(&mut self, view: &InferenceView<'_>) -> Result<Option<RawPose>> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| anyhow!("tract pose model used before load"))?;
        let input = self.build_input(view)?;
        let outputs = model
            .run(tvec!(input.into()))
            .context("ONNX inference failed")?;
        self.decode(outputs).map(Some)
    }
}
