pub mod camera;
pub mod config;
pub mod depth;
pub mod device;
pub mod frustum;
pub mod math;
pub mod pipeline;
pub mod plane;
pub mod projection;
pub mod scene;
pub mod tracker;
