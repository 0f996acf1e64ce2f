pub mod keypoint;
pub mod mask;

pub use keypoint::{Keypoint, KeypointIndex, Pose};
pub use mask::SilhouetteMask;
