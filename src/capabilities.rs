//! Narrow interfaces to the collaborators that own the surface, detect
//! rotation, and run render commands.

use std::sync::Arc;

use crate::error::Result;
use crate::geometry::{Dimensions, Orientation, Transform};

/// Work handed to the render context.
pub type RenderTask = Box<dyn FnOnce() + Send + 'static>;

pub trait OrientationListener: Send + Sync {
    fn on_orientation_changed(&self);
}

/// Reports the current screen orientation and notifies one listener on change.
pub trait OrientationSource: Send + Sync {
    fn screen_orientation(&self) -> Orientation;
    fn set_listener(&self, listener: Arc<dyn OrientationListener>);
}

pub trait SurfaceEventListener<H>: Send + Sync {
    /// Delivered the first time the surface exists.
    fn on_surface_available(&self, handle: H);

    /// Delivered whenever the surface extent changes, including the first time.
    /// Raw signed extents are validated here.
    fn on_surface_size_changed(&self, width: i64, height: i64) -> Result<()>;
}

/// The windowing collaborator that owns the drawable surface.
pub trait SurfaceEventSource<H>: Send + Sync {
    /// The surface if it already exists at the time of the call.
    fn current_surface(&self) -> Option<H>;
    fn current_size(&self) -> Dimensions;
    fn set_listener(&self, listener: Arc<dyn SurfaceEventListener<H>>);
}

/// Runs tasks later on a single logical thread, in the order they were scheduled.
pub trait RenderExecutionContext: Send + Sync {
    fn schedule(&self, task: RenderTask) -> Result<()>;
}

/// Receives transforms; only ever invoked from the render context.
pub trait TransformSink: Send + Sync {
    fn set_transform(&self, transform: Transform);
}
