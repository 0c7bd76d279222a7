//! Fourier-grid pixel geometry.
//!
//! Images are dense half-grids: x runs over non-negative frequencies only,
//! while y (and z for 3D data) indices above `max_r` stand for negative
//! frequencies and wrap by subtracting the extent. The same `PixelGeometry`
//! drives both the linear pixel resolver used by the dense coarse loop and
//! the row-span resolver used by the job-driven fine loop.

use crate::util::{FourAlignError, FourAlignResult};

/// Extents of a Fourier-domain image plus its radial cutoff.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PixelGeometry {
    /// X extent in Fourier pixels (non-negative frequencies).
    pub x_size: usize,
    /// Y extent in Fourier pixels.
    pub y_size: usize,
    /// Z extent in Fourier pixels; 1 for 2D data.
    pub z_size: usize,
    /// Radius beyond which samples are treated as zero.
    pub max_r: usize,
}

impl PixelGeometry {
    /// Geometry for a 2D image.
    pub fn new_2d(x_size: usize, y_size: usize, max_r: usize) -> Self {
        Self {
            x_size,
            y_size,
            z_size: 1,
            max_r,
        }
    }

    /// Geometry for a 3D volume.
    pub fn new_3d(x_size: usize, y_size: usize, z_size: usize, max_r: usize) -> Self {
        Self {
            x_size,
            y_size,
            z_size,
            max_r,
        }
    }

    /// Total number of pixels.
    pub fn image_size(&self) -> usize {
        self.x_size * self.y_size * self.z_size
    }

    /// True when the data has a real z extent.
    pub fn is_3d(&self) -> bool {
        self.z_size > 1
    }

    /// Rejects empty extents.
    pub fn validate(&self) -> FourAlignResult<()> {
        if self.x_size == 0 || self.y_size == 0 || self.z_size == 0 {
            return Err(FourAlignError::InvalidGeometry {
                x_size: self.x_size,
                y_size: self.y_size,
                z_size: self.z_size,
                max_r: self.max_r,
            });
        }
        Ok(())
    }

    /// Signed Fourier coordinates of the pixel at linear index `pixel`.
    ///
    /// Indices above `max_r` along y and z wrap into negative frequencies
    /// by subtracting the extent; x never wraps on the half-grid.
    #[inline]
    pub fn coords_at(&self, pixel: usize) -> (i32, i32, i32) {
        let (x, y, z) = if self.z_size > 1 {
            let xy = self.x_size * self.y_size;
            let z = pixel / xy;
            let rest = pixel % xy;
            (rest % self.x_size, rest / self.x_size, z)
        } else {
            (pixel % self.x_size, pixel / self.x_size, 0)
        };

        let mut zi = z as i32;
        if z > self.max_r {
            zi -= self.z_size as i32;
        }
        let mut yi = y as i32;
        if y > self.max_r {
            yi -= self.y_size as i32;
        }
        (x as i32, yi, zi)
    }

    /// Row span along y for row index `iy` (fine iteration order).
    #[inline]
    pub fn row_span(&self, iy: usize) -> RowSpan {
        wrap_span(iy, self.y_size, self.max_r, self.x_size)
    }

    /// Row span along z for plane index `iz` (fine iteration order).
    #[inline]
    pub fn plane_span(&self, iz: usize) -> RowSpan {
        wrap_span(iz, self.z_size, self.max_r, self.x_size)
    }
}

/// Contiguous x-range of one grid row together with its wrapped coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RowSpan {
    /// Signed frequency coordinate of the row.
    pub coord: i32,
    /// First x index covered.
    pub x_start: usize,
    /// One past the last x index covered.
    pub x_end: usize,
}

/// Resolves row index `i` along an axis of `extent` samples.
///
/// Rows at or above `extent - max_r` wrap into negative frequencies and
/// keep the full x range. Rows strictly between `max_r` and
/// `extent - max_r` lie outside the sampled disk except for the single
/// pixel at `x = max_r`; the span collapses to that pixel and the
/// coordinate stays unwrapped.
#[inline]
pub fn wrap_span(i: usize, extent: usize, max_r: usize, x_size: usize) -> RowSpan {
    let mut span = RowSpan {
        coord: i as i32,
        x_start: 0,
        x_end: x_size,
    };
    if i > max_r {
        if i >= extent - max_r {
            span.coord = i as i32 - extent as i32;
        } else {
            span.x_start = max_r;
            span.x_end = max_r + 1;
        }
    }
    span
}
