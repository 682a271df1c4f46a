pub mod capabilities;
pub mod config;
pub mod error;
pub mod geometry;
pub mod logging;
pub mod sim;
pub mod tasks {
    pub mod controller;
    pub mod corrector;
    pub mod gate;
    pub mod render_queue;
}

pub use error::{Error, Result};
pub use geometry::{Dimensions, Orientation, Transform, compute_transform};
pub use tasks::controller::PreviewController;
pub use tasks::corrector::OrientationCorrector;
pub use tasks::gate::SurfaceReadinessGate;
pub use tasks::render_queue::RenderQueue;
