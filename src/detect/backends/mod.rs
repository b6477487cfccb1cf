pub mod synthetic;

#[cfg(feature = "backend-tract")]
pub mod tract;

pub use synthetic::{SyntheticFaceModel, SyntheticHandModel, SyntheticPoseModel};

#[cfg(feature = "backend-tract")]
pub use tract::TractPoseModel;
