//! In-process stand-ins for the windowing, rotation and render collaborators.
//!
//! The `preview-surface` binary replays scenarios with these, and tests use
//! them to drive the controller deterministically.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::capabilities::{
    OrientationListener, OrientationSource, RenderExecutionContext, RenderTask,
    SurfaceEventListener, SurfaceEventSource, TransformSink,
};
use crate::error::Result;
use crate::geometry::{Dimensions, Orientation, Transform};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Orientation source whose value is set by hand.
pub struct ScriptedOrientationSource {
    current: Mutex<Orientation>,
    listener: Mutex<Option<Arc<dyn OrientationListener>>>,
}

impl ScriptedOrientationSource {
    pub fn new(initial: Orientation) -> Self {
        Self {
            current: Mutex::new(initial),
            listener: Mutex::new(None),
        }
    }

    /// Updates the orientation and notifies the listener, if any.
    pub fn rotate(&self, orientation: Orientation) {
        *lock(&self.current) = orientation;
        debug!(%orientation, "scripted rotation");
        let listener = lock(&self.listener).clone();
        if let Some(listener) = listener {
            listener.on_orientation_changed();
        }
    }
}

impl OrientationSource for ScriptedOrientationSource {
    fn screen_orientation(&self) -> Orientation {
        *lock(&self.current)
    }

    fn set_listener(&self, listener: Arc<dyn OrientationListener>) {
        *lock(&self.listener) = Some(listener);
    }
}

/// Surface owner that creates and resizes its surface on request.
pub struct ScriptedSurfaceSource<H> {
    surface: Mutex<Option<H>>,
    size: Mutex<Dimensions>,
    listener: Mutex<Option<Arc<dyn SurfaceEventListener<H>>>>,
}

impl<H: Clone + Send + Sync + 'static> ScriptedSurfaceSource<H> {
    /// A source whose surface does not exist yet.
    pub fn pending(size: Dimensions) -> Self {
        Self {
            surface: Mutex::new(None),
            size: Mutex::new(size),
            listener: Mutex::new(None),
        }
    }

    /// A source whose surface already exists, as when a view is attached late.
    pub fn available(handle: H, size: Dimensions) -> Self {
        let source = Self::pending(size);
        *lock(&source.surface) = Some(handle);
        source
    }

    /// Delivers the availability callback followed by the initial size.
    pub fn make_available(&self, handle: H) -> Result<()> {
        *lock(&self.surface) = Some(handle.clone());
        let size = *lock(&self.size);
        let listener = lock(&self.listener).clone();
        if let Some(listener) = listener {
            listener.on_surface_available(handle);
            listener.on_surface_size_changed(i64::from(size.width), i64::from(size.height))?;
        }
        Ok(())
    }

    pub fn resize(&self, size: Dimensions) -> Result<()> {
        *lock(&self.size) = size;
        let listener = lock(&self.listener).clone();
        match listener {
            Some(listener) => {
                listener.on_surface_size_changed(i64::from(size.width), i64::from(size.height))
            }
            None => Ok(()),
        }
    }
}

impl<H: Clone + Send + Sync + 'static> SurfaceEventSource<H> for ScriptedSurfaceSource<H> {
    fn current_surface(&self) -> Option<H> {
        lock(&self.surface).clone()
    }

    fn current_size(&self) -> Dimensions {
        *lock(&self.size)
    }

    fn set_listener(&self, listener: Arc<dyn SurfaceEventListener<H>>) {
        *lock(&self.listener) = Some(listener);
    }
}

/// Transform sink that remembers everything applied to it.
#[derive(Default)]
pub struct RecordingSurface {
    applied: Mutex<Vec<Transform>>,
}

impl RecordingSurface {
    pub fn applied(&self) -> Vec<Transform> {
        lock(&self.applied).clone()
    }

    pub fn last(&self) -> Option<Transform> {
        lock(&self.applied).last().copied()
    }
}

impl TransformSink for RecordingSurface {
    fn set_transform(&self, transform: Transform) {
        lock(&self.applied).push(transform);
    }
}

/// Render context that only runs tasks when told to.
#[derive(Default)]
pub struct ManualRenderContext {
    queue: Mutex<VecDeque<RenderTask>>,
}

impl ManualRenderContext {
    pub fn pending(&self) -> usize {
        lock(&self.queue).len()
    }

    /// Runs queued tasks in FIFO order, including any scheduled while draining.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        loop {
            let Some(task) = lock(&self.queue).pop_front() else {
                return ran;
            };
            task();
            ran += 1;
        }
    }
}

impl RenderExecutionContext for ManualRenderContext {
    fn schedule(&self, task: RenderTask) -> Result<()> {
        lock(&self.queue).push_back(task);
        Ok(())
    }
}
