use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use preview_surface::capabilities::{SurfaceEventListener, SurfaceEventSource};
use preview_surface::config::RenderQueueConfig;
use preview_surface::sim::{
    ManualRenderContext, RecordingSurface, ScriptedOrientationSource, ScriptedSurfaceSource,
};
use preview_surface::{
    Dimensions, Error, Orientation, PreviewController, RenderQueue, compute_transform,
};

type Handle = u64;

struct Harness {
    orientation: Arc<ScriptedOrientationSource>,
    render: Arc<ManualRenderContext>,
    surface: Arc<RecordingSurface>,
    controller: Arc<PreviewController<Handle>>,
}

fn harness(initial: Orientation) -> Harness {
    let orientation = Arc::new(ScriptedOrientationSource::new(initial));
    let render = Arc::new(ManualRenderContext::default());
    let surface = Arc::new(RecordingSurface::default());
    let controller = PreviewController::new(orientation.clone(), render.clone(), surface.clone());
    Harness {
        orientation,
        render,
        surface,
        controller,
    }
}

#[test]
fn surface_known_at_setup_opens_gate_before_callback() {
    let hx = harness(Orientation::Deg90);
    let source = ScriptedSurfaceSource::available(7, Dimensions::new(1080, 1920));

    hx.controller.attach(&source).expect("attach");
    assert_eq!(hx.controller.gate().try_get(), Some(7));

    // The windowing system still reports availability later, with a new handle.
    source.make_available(8).expect("late availability");
    assert_eq!(hx.controller.acquire(), 7);

    hx.render.run_pending();
    assert_eq!(
        hx.surface.last(),
        Some(compute_transform(Orientation::Deg90, 1080, 1920))
    );
}

#[test]
fn waiter_blocks_until_surface_callback() {
    let hx = harness(Orientation::Deg0);
    let source = ScriptedSurfaceSource::pending(Dimensions::new(640, 480));
    hx.controller.attach(&source).expect("attach");
    assert!(!hx.controller.gate().is_ready());

    let waiter = {
        let controller = Arc::clone(&hx.controller);
        thread::spawn(move || controller.acquire())
    };
    thread::sleep(Duration::from_millis(50));
    assert!(!waiter.is_finished());

    source.make_available(42).expect("availability");
    assert_eq!(waiter.join().expect("waiter thread"), 42);
    assert_eq!(hx.corrector_dimensions(), Some(Dimensions::new(640, 480)));
}

#[test]
fn timeout_before_surface_is_not_ready() {
    let hx = harness(Orientation::Deg0);
    let source = ScriptedSurfaceSource::<Handle>::pending(Dimensions::new(640, 480));
    hx.controller.attach(&source).expect("attach");
    assert!(matches!(
        hx.controller.acquire_timeout(Duration::from_millis(20)),
        Err(Error::NotReady)
    ));
}

#[test]
fn orientation_changes_track_resizes() {
    let hx = harness(Orientation::Deg0);
    let source = ScriptedSurfaceSource::available(1, Dimensions::new(1080, 1920));
    hx.controller.attach(&source).expect("attach");

    hx.orientation.rotate(Orientation::Deg90);
    source.resize(Dimensions::new(1920, 1080)).expect("resize");
    hx.render.run_pending();

    let applied = hx.surface.applied();
    assert_eq!(applied.len(), 3);
    assert!(applied[0].is_identity());
    assert_eq!(applied[1], compute_transform(Orientation::Deg90, 1080, 1920));
    assert_eq!(applied[2], compute_transform(Orientation::Deg90, 1920, 1080));
}

#[test]
fn negative_size_from_source_is_rejected() {
    let hx = harness(Orientation::Deg90);
    let listener: Arc<dyn SurfaceEventListener<Handle>> = hx.controller.clone();
    assert!(matches!(
        listener.on_surface_size_changed(1080, -5),
        Err(Error::InvalidDimensions { width: 1080, height: -5 })
    ));
    assert_eq!(hx.render.pending(), 0);
}

#[test]
fn later_rotation_wins_on_render_thread() {
    let render = Arc::new(
        RenderQueue::spawn(&RenderQueueConfig {
            thread_name: "render-it".into(),
            capacity: Some(2),
        })
        .expect("render queue"),
    );
    let orientation = Arc::new(ScriptedOrientationSource::new(Orientation::Deg0));
    let surface = Arc::new(RecordingSurface::default());
    let controller: Arc<PreviewController<Handle>> =
        PreviewController::new(orientation.clone(), render.clone(), surface.clone());
    let source = ScriptedSurfaceSource::available(1, Dimensions::new(1080, 1920));
    controller.attach(&source).expect("attach");

    orientation.rotate(Orientation::Deg90);
    orientation.rotate(Orientation::Deg270);
    render.shutdown();

    let applied = surface.applied();
    assert_eq!(applied.len(), 3);
    assert_eq!(applied[1], compute_transform(Orientation::Deg90, 1080, 1920));
    assert_eq!(
        surface.last(),
        Some(compute_transform(Orientation::Deg270, 1080, 1920))
    );
}

#[test]
fn closed_render_queue_still_opens_gate_at_attach() {
    let render = Arc::new(
        RenderQueue::spawn(&RenderQueueConfig {
            thread_name: "render-closed".into(),
            capacity: None,
        })
        .expect("render queue"),
    );
    render.shutdown();
    let orientation = Arc::new(ScriptedOrientationSource::new(Orientation::Deg90));
    let surface = Arc::new(RecordingSurface::default());
    let controller: Arc<PreviewController<Handle>> =
        PreviewController::new(orientation, render, surface.clone());
    let source = ScriptedSurfaceSource::available(3, Dimensions::new(1080, 1920));

    assert!(matches!(
        controller.attach(&source),
        Err(Error::RenderContextClosed)
    ));
    assert_eq!(controller.gate().try_get(), Some(3));
    assert_eq!(
        controller.acquire_timeout(Duration::from_millis(20)).ok(),
        Some(3)
    );
    assert!(surface.applied().is_empty());

    // The listener was still installed, so later size changes reach the corrector.
    assert!(matches!(
        source.resize(Dimensions::new(1920, 1080)),
        Err(Error::RenderContextClosed)
    ));
    assert_eq!(
        controller.corrector().dimensions(),
        Some(Dimensions::new(1920, 1080))
    );
}

/// Creates its surface while the listener is being installed, without
/// delivering the availability callback.
struct SurfaceOnListen {
    surface: Mutex<Option<Handle>>,
    listener: Mutex<Option<Arc<dyn SurfaceEventListener<Handle>>>>,
}

impl SurfaceEventSource<Handle> for SurfaceOnListen {
    fn current_surface(&self) -> Option<Handle> {
        *self.surface.lock().unwrap()
    }

    fn current_size(&self) -> Dimensions {
        Dimensions::new(640, 480)
    }

    fn set_listener(&self, listener: Arc<dyn SurfaceEventListener<Handle>>) {
        *self.listener.lock().unwrap() = Some(listener);
        *self.surface.lock().unwrap() = Some(11);
    }
}

#[test]
fn surface_created_during_listener_install_is_picked_up() {
    let hx = harness(Orientation::Deg270);
    let source = SurfaceOnListen {
        surface: Mutex::new(None),
        listener: Mutex::new(None),
    };

    hx.controller.attach(&source).expect("attach");
    assert!(source.listener.lock().unwrap().is_some());
    assert_eq!(hx.controller.gate().try_get(), Some(11));
    assert_eq!(hx.corrector_dimensions(), Some(Dimensions::new(640, 480)));

    hx.render.run_pending();
    assert_eq!(
        hx.surface.last(),
        Some(compute_transform(Orientation::Deg270, 640, 480))
    );
}

impl Harness {
    fn corrector_dimensions(&self) -> Option<Dimensions> {
        self.controller.corrector().dimensions()
    }
}
