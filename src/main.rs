//! Replays a scripted preview session against the orientation corrector and
//! readiness gate, logging every transform the render thread applies.

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result, anyhow};
use clap::{ArgAction, Parser};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use preview_surface::config::{PreviewConfig, ScenarioStep};
use preview_surface::sim::{RecordingSurface, ScriptedOrientationSource, ScriptedSurfaceSource};
use preview_surface::{Error, PreviewController, RenderQueue, logging};

#[derive(Debug, Parser)]
#[command(
    name = "preview-surface",
    version,
    about = "Replay a camera preview orientation session"
)]
struct Args {
    /// Path to YAML config; the built-in portrait session runs when omitted
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

/// Stand-in for the windowing system's surface reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PreviewHandle(u32);

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.verbose);

    let cfg = match &args.config {
        Some(path) => PreviewConfig::from_yaml_file(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => PreviewConfig::default(),
    }
    .validated()
    .context("invalid configuration values")?;
    tracing::debug!("configuration:\n{:#?}", cfg);

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!("ctrl-c handler failed: {err}");
                return;
            }
            info!("ctrl-c received; cancelling surface wait");
            cancel.cancel();
        });
    }
    if let Some(timeout) = cfg.acquire_timeout {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            cancel.cancel();
        });
    }

    let handle = tokio::task::spawn_blocking(move || run_scenario(&cfg, &cancel))
        .await
        .context("scenario task panicked")??;
    info!(?handle, "scenario complete");
    Ok(())
}

fn run_scenario(cfg: &PreviewConfig, cancel: &CancellationToken) -> Result<PreviewHandle> {
    let render = Arc::new(RenderQueue::spawn(&cfg.render_queue).context("failed to start render queue")?);
    let orientation = Arc::new(ScriptedOrientationSource::new(
        cfg.scenario.initial_orientation,
    ));
    let recorder = Arc::new(RecordingSurface::default());

    let handle = PreviewHandle(1);
    let size = cfg.scenario.surface.dimensions();
    let source = if cfg.scenario.surface.available_at_setup {
        ScriptedSurfaceSource::available(handle, size)
    } else {
        ScriptedSurfaceSource::pending(size)
    };

    let controller: Arc<PreviewController<PreviewHandle>> =
        PreviewController::new(orientation.clone(), render.clone(), recorder.clone());
    controller
        .attach(&source)
        .context("failed to attach preview controller")?;
    info!(
        ready = controller.gate().is_ready(),
        width = size.width,
        height = size.height,
        "preview controller attached"
    );

    let waiter = {
        let controller = Arc::clone(&controller);
        let cancel = cancel.clone();
        thread::Builder::new()
            .name("surface-consumer".into())
            .spawn(move || controller.acquire_cancellable(&cancel))
            .context("failed to spawn surface consumer")?
    };

    for step in &cfg.scenario.steps {
        match *step {
            ScenarioStep::Orientation(next) => orientation.rotate(next),
            ScenarioStep::Resize(dimensions) => source
                .resize(dimensions)
                .with_context(|| format!("failed to resize surface to {dimensions:?}"))?,
            ScenarioStep::SurfaceAvailable => source
                .make_available(handle)
                .context("failed to deliver surface availability")?,
        }
    }

    let acquired = waiter
        .join()
        .map_err(|_| anyhow!("surface consumer panicked"))?;
    render.shutdown();

    for (index, transform) in recorder.applied().iter().enumerate() {
        info!(
            index,
            identity = transform.is_identity(),
            matrix = ?transform.to_row_major(),
            "applied transform"
        );
    }

    match acquired {
        Ok(handle) => Ok(handle),
        Err(Error::NotReady) => Err(anyhow!("surface never became available")),
        Err(err) => Err(err).context("failed to acquire surface"),
    }
}
