use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, ensure};
use serde::Deserialize;

use crate::geometry::{Dimensions, Orientation};

pub const DEFAULT_RENDER_THREAD_NAME: &str = "preview-render";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct PreviewConfig {
    pub render_queue: RenderQueueConfig,
    /// Upper bound on how long the runner waits for the surface.
    #[serde(with = "humantime_serde")]
    pub acquire_timeout: Option<Duration>,
    pub scenario: ScenarioConfig,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            render_queue: RenderQueueConfig::default(),
            acquire_timeout: Some(Duration::from_secs(5)),
            scenario: ScenarioConfig::default(),
        }
    }
}

impl PreviewConfig {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        serde_yaml::from_str(&s)
            .with_context(|| format!("failed to parse config at {}", path.display()))
    }

    /// Validate runtime invariants that cannot be expressed via serde defaults alone.
    pub fn validated(self) -> Result<Self> {
        ensure!(
            self.render_queue.capacity != Some(0),
            "render-queue.capacity must be greater than zero"
        );
        ensure!(
            !self.render_queue.thread_name.trim().is_empty(),
            "render-queue.thread-name must not be empty"
        );
        if let Some(timeout) = self.acquire_timeout {
            ensure!(!timeout.is_zero(), "acquire-timeout must be positive");
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct RenderQueueConfig {
    pub thread_name: String,
    /// Bounded FIFO depth; `None` means unbounded.
    pub capacity: Option<usize>,
}

impl Default for RenderQueueConfig {
    fn default() -> Self {
        Self {
            thread_name: DEFAULT_RENDER_THREAD_NAME.to_string(),
            capacity: Some(64),
        }
    }
}

/// A scripted preview session replayed by the `preview-surface` binary.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct ScenarioConfig {
    pub initial_orientation: Orientation,
    pub surface: SurfaceScenario,
    #[serde(with = "serde_yaml::with::singleton_map_recursive")]
    pub steps: Vec<ScenarioStep>,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            initial_orientation: Orientation::Deg0,
            surface: SurfaceScenario::default(),
            steps: vec![
                ScenarioStep::Orientation(Orientation::Deg90),
                ScenarioStep::Orientation(Orientation::Deg270),
            ],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct SurfaceScenario {
    pub width: u32,
    pub height: u32,
    /// Whether the surface already exists when the controller attaches.
    pub available_at_setup: bool,
}

impl SurfaceScenario {
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }
}

impl Default for SurfaceScenario {
    fn default() -> Self {
        Self {
            width: 1080,
            height: 1920,
            available_at_setup: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScenarioStep {
    Orientation(Orientation),
    Resize(Dimensions),
    SurfaceAvailable,
}
