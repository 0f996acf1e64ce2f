pub mod depth;
pub mod engine;
pub mod fusion;
pub mod geometry;
pub mod record;
pub mod scale;
pub mod segments;
pub mod stats;

pub use depth::{reconcile_depths, BodyPreset, DepthRatioSet};
pub use engine::{MeasurementEngine, View};
pub use fusion::{fuse, Estimate};
pub use record::{Measurement, MeasurementSet, Source};
pub use scale::ScaleFactor;
pub use stats::{average_sessions, remove_outliers, smooth, TemporalSmoother};
