pub mod eyes;
pub mod face;
pub mod viewpoint;
pub mod window;

pub use eyes::ClosedEye;
pub use face::{FaceSample, FaceSlot};
pub use viewpoint::{TrackedViewpoint, ViewpointTracker};
pub use window::SlidingWindow;
