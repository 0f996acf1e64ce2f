pub mod alignment;
pub mod session;

pub use alignment::{evaluate, AlignmentConfig, AlignmentState, FrameDims, GateReport};
pub use session::{CaptureConfig, CaptureSession, FrameVerdict, SessionMeasurements, ViewAngle};
