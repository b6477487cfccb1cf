use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread::{self, JoinHandle, ScopedJoinHandle};

use crate::detect::backend::{FaceModel, HandModel, ModelKind, PoseModel};
use crate::detect::raw::RawDetections;
use crate::error::{PipelineError, Result};
use crate::frame::InferenceView;

/// The three perception models driven together, one call each per frame.
pub struct ModelSet {
    pose: Box<dyn PoseModel>,
    face: Box<dyn FaceModel>,
    hand: Box<dyn HandModel>,
}

impl ModelSet {
    pub fn new<P, F, H>(pose: P, face: F, hand: H) -> Self
    where
        P: PoseModel + 'static,
        F: FaceModel + 'static,
        H: HandModel + 'static,
    {
        Self::from_boxed(Box::new(pose), Box::new(face), Box::new(hand))
    }

    pub fn from_boxed(
        pose: Box<dyn PoseModel>,
        face: Box<dyn FaceModel>,
        hand: Box<dyn HandModel>,
    ) -> Self {
        Self { pose, face, hand }
    }

    /// Backend names in pose, face, hand order.
    pub fn names(&self) -> [&'static str; 3] {
        [self.pose.name(), self.face.name(), self.hand.name()]
    }

    /// Initialize all three models concurrently.
    ///
    /// Every loader runs to completion; the first failure (pose, face, hand order)
    /// is reported.
    pub fn load(&mut self) -> Result<()> {
        let (pose, face, hand) = (&mut self.pose, &mut self.face, &mut self.hand);
        let (pose_res, face_res, hand_res) = thread::scope(|s| {
            let pose_task = s.spawn(move || pose.load());
            let face_task = s.spawn(move || face.load());
            let hand_task = s.spawn(move || hand.load());
            (
                join_model(pose_task, ModelKind::Pose),
                join_model(face_task, ModelKind::Face),
                join_model(hand_task, ModelKind::Hand),
            )
        });

        for (kind, res) in [
            (ModelKind::Pose, pose_res),
            (ModelKind::Face, face_res),
            (ModelKind::Hand, hand_res),
        ] {
            res.map_err(|e| PipelineError::model_load(format!("{} model: {:#}", kind.as_str(), e)))?;
        }
        Ok(())
    }

    /// Run the three models on one frame concurrently and wait for all of them.
    ///
    /// Any single failure fails the whole frame.
    pub fn detect_all(&mut self, view: &InferenceView<'_>) -> Result<RawDetections> {
        let view = *view;
        let (pose, face, hand) = (&mut self.pose, &mut self.face, &mut self.hand);
        let (pose_res, face_res, hand_res) = thread::scope(|s| {
            let pose_task = s.spawn(move || pose.estimate(&view));
            let face_task = s.spawn(move || face.detect(&view));
            let hand_task = s.spawn(move || hand.detect(&view));
            (
                join_model(pose_task, ModelKind::Pose),
                join_model(face_task, ModelKind::Face),
                join_model(hand_task, ModelKind::Hand),
            )
        });

        let pose = pose_res.map_err(|e| detection_error(ModelKind::Pose, e))?;
        let faces = face_res.map_err(|e| detection_error(ModelKind::Face, e))?;
        let hands = hand_res.map_err(|e| detection_error(ModelKind::Hand, e))?;
        Ok(RawDetections { pose, faces, hands })
    }

    /// Load on a background thread. The returned handle is polled without blocking.
    pub fn load_in_background(mut self) -> PendingModels {
        let (tx, rx) = mpsc::channel();
        let join = thread::spawn(move || {
            let result = self.load().map(|_| self);
            // Receiver gone means the pipeline was dropped while loading.
            let _ = tx.send(result);
        });
        PendingModels {
            rx,
            join: Some(join),
        }
    }
}

fn join_model<T>(
    task: ScopedJoinHandle<'_, anyhow::Result<T>>,
    kind: ModelKind,
) -> anyhow::Result<T> {
    task.join()
        .map_err(|_| anyhow::anyhow!("{} model thread panicked", kind.as_str()))?
}

fn detection_error(kind: ModelKind, err: anyhow::Error) -> PipelineError {
    PipelineError::detection(kind.as_str(), format!("{:#}", err))
}

/// Models still loading on a background thread.
pub struct PendingModels {
    rx: Receiver<Result<ModelSet>>,
    join: Option<JoinHandle<()>>,
}

impl PendingModels {
    /// Non-blocking check. `None` while the loader is still running.
    pub fn try_take(&mut self) -> Option<Result<ModelSet>> {
        let result = match self.rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => Err(PipelineError::model_load(
                "model loader exited without reporting",
            )),
        };
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
        Some(result)
    }

    /// Block until loading finishes.
    pub fn wait(mut self) -> Result<ModelSet> {
        let result = self.rx.recv().unwrap_or_else(|_| {
            Err(PipelineError::model_load(
                "model loader exited without reporting",
            ))
        });
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
        result
    }
}

/// Model availability as seen by the pipeline.
pub enum ModelSlot {
    Loading(PendingModels),
    Ready(ModelSet),
    /// Terminal. Carries the load error message.
    Failed(String),
}

impl ModelSlot {
    /// Advance `Loading` to `Ready` or `Failed` if the loader has finished.
    pub fn poll(&mut self) {
        let ModelSlot::Loading(pending) = self else {
            return;
        };
        match pending.try_take() {
            None => {}
            Some(Ok(models)) => {
                let [pose, face, hand] = models.names();
                log::info!("models ready: pose={} face={} hand={}", pose, face, hand);
                *self = ModelSlot::Ready(models);
            }
            Some(Err(e)) => {
                log::error!("{}", e);
                let reason = match e {
                    PipelineError::ModelLoad(reason) => reason,
                    other => other.to_string(),
                };
                *self = ModelSlot::Failed(reason);
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, ModelSlot::Ready(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::raw::{RawFace, RawHand, RawPose};
    use crate::frame::VideoFrame;
    use anyhow::anyhow;

    struct FixedPose(bool);
    struct EmptyFaces;
    struct FailingHands {
        fail_load: bool,
    }

    impl PoseModel for FixedPose {
        fn name(&self) -> &'static str {
            "fixed-pose"
        }
        fn estimate(&mut self, _view: &InferenceView<'_>) -> anyhow::Result<Option<RawPose>> {
            Ok(self.0.then(RawPose::default))
        }
    }

    impl FaceModel for EmptyFaces {
        fn name(&self) -> &'static str {
            "empty-faces"
        }
        fn detect(&mut self, _view: &InferenceView<'_>) -> anyhow::Result<Vec<RawFace>> {
            Ok(vec![])
        }
    }

    impl HandModel for FailingHands {
        fn name(&self) -> &'static str {
            "failing-hands"
        }
        fn load(&mut self) -> anyhow::Result<()> {
            if self.fail_load {
                return Err(anyhow!("weights not found"));
            }
            Ok(())
        }
        fn detect(&mut self, _view: &InferenceView<'_>) -> anyhow::Result<Vec<RawHand>> {
            Err(anyhow!("inference crashed"))
        }
    }

    #[test]
    fn load_reports_failing_model() {
        let mut models = ModelSet::new(
            FixedPose(true),
            EmptyFaces,
            FailingHands { fail_load: true },
        );
        let err = models.load().unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("hand model"));
        assert!(err.to_string().contains("weights not found"));
    }

    #[test]
    fn detect_all_fails_frame_when_one_model_fails() {
        let mut models = ModelSet::new(
            FixedPose(true),
            EmptyFaces,
            FailingHands { fail_load: false },
        );
        let frame = VideoFrame::new(vec![0u8; 12], 2, 2, 0);
        let err = models.detect_all(&frame.inference_view()).unwrap_err();
        assert!(!err.is_fatal());
        assert!(err.to_string().contains("hand"));
    }

    #[test]
    fn background_load_transitions_slot() {
        let models = ModelSet::new(
            FixedPose(false),
            EmptyFaces,
            FailingHands { fail_load: true },
        );
        let pending = models.load_in_background();
        let result = pending.wait();
        assert!(result.is_err());

        let models = ModelSet::new(
            FixedPose(false),
            EmptyFaces,
            FailingHands { fail_load: false },
        );
        let mut slot = ModelSlot::Loading(models.load_in_background());
        for _ in 0..200 {
            slot.poll();
            if !matches!(slot, ModelSlot::Loading(_)) {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
        assert!(slot.is_ready());
    }
}
