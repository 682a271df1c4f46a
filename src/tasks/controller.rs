use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::capabilities::{
    OrientationSource, RenderExecutionContext, SurfaceEventListener, SurfaceEventSource,
    TransformSink,
};
use crate::error::Result;
use crate::tasks::corrector::OrientationCorrector;
use crate::tasks::gate::SurfaceReadinessGate;

/// Ties the readiness gate and the orientation corrector to one preview surface.
pub struct PreviewController<H> {
    gate: SurfaceReadinessGate<H>,
    corrector: Arc<OrientationCorrector>,
}

impl<H: Clone + Send + Sync + 'static> PreviewController<H> {
    pub fn new(
        orientation: Arc<dyn OrientationSource>,
        render: Arc<dyn RenderExecutionContext>,
        sink: Arc<dyn TransformSink>,
    ) -> Arc<Self> {
        Arc::new(Self {
            gate: SurfaceReadinessGate::new(),
            corrector: Arc::new(OrientationCorrector::new(orientation, render, sink)),
        })
    }

    pub fn gate(&self) -> &SurfaceReadinessGate<H> {
        &self.gate
    }

    pub fn corrector(&self) -> &Arc<OrientationCorrector> {
        &self.corrector
    }

    /// Registers for orientation and surface events.
    ///
    /// A surface that already exists is picked up synchronously, so the gate
    /// may be ready before this returns. The source is checked again after the
    /// listener is installed to cover a surface created in between.
    ///
    /// The listener is installed and the gate opened even when scheduling the
    /// initial correction fails; that failure is returned afterwards.
    pub fn attach(self: &Arc<Self>, source: &dyn SurfaceEventSource<H>) -> Result<()> {
        self.corrector.register();

        let mut correction = Ok(());
        if let Some(handle) = source.current_surface() {
            debug!("surface available at attach");
            correction = self.adopt_existing(handle, source);
        }

        source.set_listener(Arc::clone(self) as Arc<dyn SurfaceEventListener<H>>);

        if !self.gate.is_ready() {
            if let Some(handle) = source.current_surface() {
                debug!("surface appeared while attaching");
                correction = correction.and(self.adopt_existing(handle, source));
            }
        }
        correction
    }

    pub fn acquire(&self) -> H {
        self.gate.acquire()
    }

    pub fn acquire_cancellable(&self, cancel: &CancellationToken) -> Result<H> {
        self.gate.acquire_cancellable(cancel)
    }

    pub fn acquire_timeout(&self, timeout: Duration) -> Result<H> {
        self.gate.acquire_timeout(timeout)
    }

    fn adopt_existing(&self, handle: H, source: &dyn SurfaceEventSource<H>) -> Result<()> {
        if self.gate.signal_ready(handle) {
            info!("surface found at attach opened the gate");
        }
        self.corrector
            .set_dimensions(source.current_size())
            .inspect_err(|err| {
                warn!(error = %err, "failed to schedule initial orientation correction");
            })
    }
}

impl<H: Clone + Send + Sync + 'static> SurfaceEventListener<H> for PreviewController<H> {
    fn on_surface_available(&self, handle: H) {
        if self.gate.signal_ready(handle) {
            info!("surface available callback opened the gate");
        }
        if let Err(err) = self.corrector.refresh() {
            warn!(error = %err, "failed to schedule orientation correction");
        }
    }

    fn on_surface_size_changed(&self, width: i64, height: i64) -> Result<()> {
        self.corrector.on_surface_size_changed(width, height)
    }
}
