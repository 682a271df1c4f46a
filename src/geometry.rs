//! Orientation, surface extents and the corner-mapping transform that
//! compensates for quarter-turn mismatches between surface space and screen
//! space.
//!
//! The transform is solved from corner correspondences rather than composed
//! from rotation/scale primitives. For a `W x H` surface shown at 90°:
//!
//! ```text
//!     src                 dst
//!     TL ──── TR          TR ──── BR
//!     │        │    =>    │        │
//!     BL ──── BR          TL ──── BL
//! ```

use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};

/// Discrete screen rotation relative to the sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(try_from = "i64")]
pub enum Orientation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Orientation {
    pub const fn degrees(self) -> u32 {
        match self {
            Orientation::Deg0 => 0,
            Orientation::Deg90 => 90,
            Orientation::Deg180 => 180,
            Orientation::Deg270 => 270,
        }
    }

    /// Whether width and height swap on screen, which is the only case that
    /// needs a non-identity transform.
    pub const fn needs_correction(self) -> bool {
        self.degrees() % 180 == 90
    }
}

impl TryFrom<i64> for Orientation {
    type Error = Error;

    fn try_from(degrees: i64) -> Result<Self> {
        match degrees {
            0 => Ok(Orientation::Deg0),
            90 => Ok(Orientation::Deg90),
            180 => Ok(Orientation::Deg180),
            270 => Ok(Orientation::Deg270),
            other => Err(Error::InvalidOrientation(other)),
        }
    }
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

/// Current surface extent in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Validates raw extents reported by a collaborator. Negative values
    /// violate the caller's contract and are rejected before any math runs.
    pub fn from_signed(width: i64, height: i64) -> Result<Self> {
        match (u32::try_from(width), u32::try_from(height)) {
            (Ok(width), Ok(height)) => Ok(Self { width, height }),
            _ => Err(Error::InvalidDimensions { width, height }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Source and destination corners, each ordered top-left, top-right,
/// bottom-left, bottom-right.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CornerMapping {
    pub src: [Point; 4],
    pub dst: [Point; 4],
}

/// Corner correspondences for `orientation`, or `None` when the orientation
/// needs no correction.
pub fn corner_mapping(orientation: Orientation, width: u32, height: u32) -> Option<CornerMapping> {
    if !orientation.needs_correction() {
        return None;
    }
    let w = f64::from(width);
    let h = f64::from(height);
    let src = [
        Point::new(0.0, 0.0),
        Point::new(w, 0.0),
        Point::new(0.0, h),
        Point::new(w, h),
    ];
    let dst = if orientation == Orientation::Deg90 {
        [
            Point::new(0.0, h),
            Point::new(0.0, 0.0),
            Point::new(w, h),
            Point::new(w, 0.0),
        ]
    } else {
        [
            Point::new(w, 0.0),
            Point::new(w, h),
            Point::new(0.0, 0.0),
            Point::new(0.0, h),
        ]
    };
    Some(CornerMapping { src, dst })
}

/// Derives the transform that re-orients a `width x height` surface for the
/// given screen orientation.
///
/// Orientations 0 and 180 yield the identity. A zero-sized surface cannot
/// anchor a quarter-turn mapping and also yields the identity.
pub fn compute_transform(orientation: Orientation, width: u32, height: u32) -> Transform {
    let Some(mapping) = corner_mapping(orientation, width, height) else {
        return Transform::IDENTITY;
    };
    match Transform::from_corners(&mapping) {
        Ok(transform) => transform,
        Err(err) => {
            debug!(%orientation, width, height, error = %err, "falling back to identity transform");
            Transform::IDENTITY
        }
    }
}

/// A 2-D affine map kept in homogeneous form with a shared denominator.
///
/// `x' = (m[0]·x + m[1]·y + m[2]) / det`, `y' = (m[3]·x + m[4]·y + m[5]) / det`.
/// Solving from integer corners keeps every coefficient integral, so mapping an
/// integer corner lands on its target without rounding.
#[derive(Debug, Clone, Copy)]
pub struct Transform {
    m: [f64; 6],
    det: f64,
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        m: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
        det: 1.0,
    };

    /// Solves the affine map taking `mapping.src[i]` to `mapping.dst[i]`.
    ///
    /// The first three correspondences determine the map; the fourth must agree
    /// with it.
    pub fn from_corners(mapping: &CornerMapping) -> Result<Self> {
        let [s0, s1, s2, s3] = mapping.src;
        let [d0, d1, d2, d3] = mapping.dst;

        let (u1x, u1y) = (s1.x - s0.x, s1.y - s0.y);
        let (u2x, u2y) = (s2.x - s0.x, s2.y - s0.y);
        let (v1x, v1y) = (d1.x - d0.x, d1.y - d0.y);
        let (v2x, v2y) = (d2.x - d0.x, d2.y - d0.y);

        let det = u1x * u2y - u2x * u1y;
        if det == 0.0 {
            return Err(Error::DegenerateCorners);
        }

        let a = v1x * u2y - v2x * u1y;
        let b = v2x * u1x - v1x * u2x;
        let c = v1y * u2y - v2y * u1y;
        let d = v2y * u1x - v1y * u2x;
        let tx = det * d0.x - (a * s0.x + b * s0.y);
        let ty = det * d0.y - (c * s0.x + d * s0.y);

        let transform = Transform {
            m: [a, b, tx, c, d, ty],
            det,
        };

        let mapped = transform.map_point(s3);
        if !approx_eq(mapped.x, d3.x) || !approx_eq(mapped.y, d3.y) {
            return Err(Error::NonAffineCorners);
        }
        Ok(transform)
    }

    pub fn map_point(&self, p: Point) -> Point {
        let [a, b, tx, c, d, ty] = self.m;
        Point {
            x: (a * p.x + b * p.y + tx) / self.det,
            y: (c * p.x + d * p.y + ty) / self.det,
        }
    }

    pub fn is_identity(&self) -> bool {
        *self == Transform::IDENTITY
    }

    /// Row-major 3x3 homogeneous matrix, the layout view toolkits and shaders
    /// expect.
    pub fn to_row_major(&self) -> [f32; 9] {
        let [a, b, tx, c, d, ty] = self.m.map(|v| v / self.det);
        [
            a as f32, b as f32, tx as f32, //
            c as f32, d as f32, ty as f32, //
            0.0, 0.0, 1.0,
        ]
    }
}

impl Default for Transform {
    fn default() -> Self {
        Transform::IDENTITY
    }
}

// Coefficients are compared by cross-multiplying the denominators so that
// equivalent transforms with differently scaled coefficients compare equal.
impl PartialEq for Transform {
    fn eq(&self, other: &Self) -> bool {
        self.m
            .iter()
            .zip(other.m.iter())
            .all(|(lhs, rhs)| lhs * other.det == rhs * self.det)
    }
}

fn approx_eq(lhs: f64, rhs: f64) -> bool {
    (lhs - rhs).abs() <= 1e-9 * rhs.abs().max(1.0)
}
