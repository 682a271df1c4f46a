use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::capabilities::{
    OrientationListener, OrientationSource, RenderExecutionContext, TransformSink,
};
use crate::error::Result;
use crate::geometry::{Dimensions, Transform, compute_transform};

#[derive(Debug, Default)]
struct CorrectorState {
    dimensions: Option<Dimensions>,
    transform: Transform,
}

/// Keeps the preview transform in step with screen orientation and surface size.
///
/// Recomputation happens on whichever thread delivers the notification; the
/// resulting transform is always handed to the render context for application.
pub struct OrientationCorrector {
    orientation: Arc<dyn OrientationSource>,
    render: Arc<dyn RenderExecutionContext>,
    sink: Arc<dyn TransformSink>,
    state: Mutex<CorrectorState>,
}

impl OrientationCorrector {
    pub fn new(
        orientation: Arc<dyn OrientationSource>,
        render: Arc<dyn RenderExecutionContext>,
        sink: Arc<dyn TransformSink>,
    ) -> Self {
        Self {
            orientation,
            render,
            sink,
            state: Mutex::new(CorrectorState::default()),
        }
    }

    /// Installs this corrector as the orientation source's listener.
    pub fn register(self: &Arc<Self>) {
        self.orientation
            .set_listener(Arc::clone(self) as Arc<dyn OrientationListener>);
    }

    /// Validates raw extents, caches them and reapplies the transform.
    pub fn on_surface_size_changed(&self, width: i64, height: i64) -> Result<()> {
        let dimensions = Dimensions::from_signed(width, height).inspect_err(|err| {
            warn!(width, height, error = %err, "rejecting surface size");
        })?;
        self.set_dimensions(dimensions)
    }

    pub fn set_dimensions(&self, dimensions: Dimensions) -> Result<()> {
        let mut state = self.lock();
        state.dimensions = Some(dimensions);
        self.correct(&mut state, dimensions)
    }

    /// Recomputes with the cached dimensions. Does nothing until a size is known.
    pub fn refresh(&self) -> Result<()> {
        let mut state = self.lock();
        let dimensions = state.dimensions;
        match dimensions {
            Some(dimensions) => self.correct(&mut state, dimensions),
            None => {
                debug!("surface size unknown; deferring orientation correction");
                Ok(())
            }
        }
    }

    pub fn dimensions(&self) -> Option<Dimensions> {
        self.lock().dimensions
    }

    /// The most recently computed transform, which may not have reached the
    /// surface yet.
    pub fn current_transform(&self) -> Transform {
        self.lock().transform
    }

    // Scheduling happens under the state lock so tasks reach the render queue
    // in the same order their transforms were computed.
    fn correct(&self, state: &mut CorrectorState, dimensions: Dimensions) -> Result<()> {
        let orientation = self.orientation.screen_orientation();
        let transform = compute_transform(orientation, dimensions.width, dimensions.height);
        debug!(
            %orientation,
            width = dimensions.width,
            height = dimensions.height,
            identity = transform.is_identity(),
            "preview transform recomputed",
        );
        state.transform = transform;

        let sink = Arc::clone(&self.sink);
        self.render
            .schedule(Box::new(move || sink.set_transform(transform)))
    }

    fn lock(&self) -> MutexGuard<'_, CorrectorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl OrientationListener for OrientationCorrector {
    fn on_orientation_changed(&self) {
        if let Err(err) = self.refresh() {
            warn!(error = %err, "failed to schedule orientation correction");
        }
    }
}
