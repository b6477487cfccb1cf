mod adapter;
mod backend;
mod backends;
mod raw;
mod registry;
mod result;

pub use adapter::{adapt, FrameGeometry};
pub use backend::{FaceModel, HandModel, ModelKind, PoseModel};
pub use backends::{SyntheticFaceModel, SyntheticHandModel, SyntheticPoseModel};
#[cfg(feature = "backend-tract")]
pub use backends::TractPoseModel;
pub use raw::{RawBox, RawDetections, RawFace, RawHand, RawKeypoint, RawPoint, RawPose};
pub use registry::{ModelSet, ModelSlot, PendingModels};
pub use result::{
    BoundingBox, DetectionFrame, Face, Hand, Handedness, Keypoint, KeypointName, Point2, Point3,
    Pose, HAND_LANDMARK_COUNT,
};
