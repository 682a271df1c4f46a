use thiserror::Error;

/// Library error type for preview surface operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The surface did not become available before the wait was cancelled or timed out.
    #[error("surface not ready")]
    NotReady,

    /// A collaborator reported a negative surface extent.
    #[error("invalid surface dimensions {width}x{height}")]
    InvalidDimensions { width: i64, height: i64 },

    /// Orientation degrees outside of 0, 90, 180 and 270.
    #[error("invalid orientation: {0} degrees")]
    InvalidOrientation(i64),

    /// The source corners span no area, so no transform can be solved from them.
    #[error("degenerate source corners")]
    DegenerateCorners,

    /// The corner correspondences cannot be expressed as an affine map.
    #[error("corner correspondences are not affine")]
    NonAffineCorners,

    /// The render execution context no longer accepts tasks.
    #[error("render context closed")]
    RenderContextClosed,

    /// Underlying IO error, e.g. failing to spawn the render thread.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
