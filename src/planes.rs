//! Contains the PlaneMapper struct, which describes a relationship
//! between a rectangle on the integral plane with an origin at 0,0 (the
//! histogram) and a rectangle on the real plane (the flame's viewport).
use crate::error::{FlameError, Result};
use crate::genome::Viewport;
use num::Complex;

/// A point on the real plane.  A complex number already is one, so the
/// chaos game carries its trajectory around as a `Complex<f64>`.
pub type Point = Complex<f64>;

/// Describes the width and height of an integral plane that is assumed
/// to start at 0,0.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct IntegralPlane(pub usize, pub usize);

/// Describes the column, row of a pixel in the integral plane.  Row 0
/// is the `ymin` edge of the viewport.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Pixel(pub usize, pub usize);

/// Maps points on the viewport to pixels of the histogram.
#[derive(Debug)]
pub struct PlaneMapper {
    /// Width and height of the histogram.
    pub integral_plane: IntegralPlane,
    /// The real rectangle being rendered.
    pub viewport: Viewport,
    // Width and height of the viewport, precomputed for the hot loop.
    spans: (f64, f64),
}

impl PlaneMapper {
    /// Takes the histogram size and the viewport.  Fails when either
    /// rectangle is degenerate or inside out.
    pub fn new(width: usize, height: usize, viewport: Viewport) -> Result<PlaneMapper> {
        if width == 0 || height == 0 {
            return Err(FlameError::structural(
                if width == 0 { "size_x" } else { "size_y" },
                "the canvas must be at least one pixel wide and high",
            ));
        }
        if !(viewport.xmin < viewport.xmax) {
            return Err(FlameError::structural(
                "xmax",
                format!("must exceed xmin ({} <= {})", viewport.xmax, viewport.xmin),
            ));
        }
        if !(viewport.ymin < viewport.ymax) {
            return Err(FlameError::structural(
                "ymax",
                format!("must exceed ymin ({} <= {})", viewport.ymax, viewport.ymin),
            ));
        }
        Ok(PlaneMapper {
            integral_plane: IntegralPlane(width, height),
            viewport,
            spans: (
                viewport.xmax - viewport.xmin,
                viewport.ymax - viewport.ymin,
            ),
        })
    }

    /// The total number of points in the integral grid.
    pub fn len(&self) -> usize {
        self.integral_plane.0 * self.integral_plane.1
    }

    /// Describes that the integral plane is of a size.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Map a point to the pixel containing it, or `None` when it falls
    /// outside the viewport.  The left and bottom edges are inside,
    /// the right and top edges are not.
    #[inline]
    pub fn point_to_pixel(&self, point: &Point) -> Option<Pixel> {
        let IntegralPlane(width, height) = self.integral_plane;
        let left = ((point.re - self.viewport.xmin) / self.spans.0 * width as f64).floor();
        let top = ((point.im - self.viewport.ymin) / self.spans.1 * height as f64).floor();
        // written so that NaN lands outside as well
        if left >= 0.0 && left < width as f64 && top >= 0.0 && top < height as f64 {
            Some(Pixel(left as usize, top as usize))
        } else {
            None
        }
    }

    /// The linear, row-major offset of the pixel containing `point`.
    #[inline]
    pub fn point_to_offset(&self, point: &Point) -> Option<usize> {
        self.point_to_pixel(point)
            .map(|Pixel(left, top)| top * self.integral_plane.0 + left)
    }
}
