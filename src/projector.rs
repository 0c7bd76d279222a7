//! Fourier-space reference projectors.
//!
//! A projector samples the Fourier-domain reference at a rotated
//! coordinate, producing one complex value per pixel. Three arities cover
//! the supported shapes: a 2D reference sampled in-plane, a 3D reference
//! sliced into a plane for 2D data, and a full 3D resampling for 3D data.
//! The `ReferenceSampler` adapters collapse the three into the single
//! lookup the kernel skeletons are generic over.
//!
//! `GridProjector` is the concrete backend: an interpolating sampler over
//! a dense half-grid model with Friedel symmetry for negative rotated x.

use crate::geometry::PixelGeometry;
use crate::util::{FourAlignError, FourAlignResult};

/// Row-major 3x3 rotation matrix entries.
pub type Rotation = [f32; 9];

/// Samples a Fourier-domain reference under a rotation.
///
/// Implementations must be deterministic and reentrant; coordinates whose
/// rotated image falls outside the sampled band yield `(0.0, 0.0)`.
pub trait Projector {
    /// Data-side geometry the kernels iterate over.
    fn geometry(&self) -> PixelGeometry;

    /// Samples a 2D reference; uses matrix entries 0, 1, 3, 4.
    fn project_2d(&self, x: i32, y: i32, rot: &Rotation) -> (f32, f32);

    /// Slices a 3D reference into a plane; uses entries 0, 1, 3, 4, 6, 7.
    fn project_3d_from_2d(&self, x: i32, y: i32, rot: &Rotation) -> (f32, f32);

    /// Full 3D resampling; uses all nine entries.
    fn project_3d(&self, x: i32, y: i32, z: i32, rot: &Rotation) -> (f32, f32);
}

/// One projector arity bound to a concrete variant.
///
/// The kernel skeletons call `sample` per pixel; the adapters below pick
/// the projector method matching the reference/data dimensionality.
pub trait ReferenceSampler {
    /// Data-side geometry the kernels iterate over.
    fn geometry(&self) -> PixelGeometry;

    /// Reference value at the (signed) Fourier coordinate under `rot`.
    fn sample(&self, x: i32, y: i32, z: i32, rot: &Rotation) -> (f32, f32);
}

/// 2D reference scored against 2D data.
pub struct PlaneRef<'a, P>(pub &'a P);

/// 3D reference sliced into a plane for 2D data.
pub struct SliceRef<'a, P>(pub &'a P);

/// 3D reference scored against 3D data.
pub struct VolumeRef<'a, P>(pub &'a P);

impl<P: Projector> ReferenceSampler for PlaneRef<'_, P> {
    fn geometry(&self) -> PixelGeometry {
        self.0.geometry()
    }

    #[inline]
    fn sample(&self, x: i32, y: i32, _z: i32, rot: &Rotation) -> (f32, f32) {
        self.0.project_2d(x, y, rot)
    }
}

impl<P: Projector> ReferenceSampler for SliceRef<'_, P> {
    fn geometry(&self) -> PixelGeometry {
        self.0.geometry()
    }

    #[inline]
    fn sample(&self, x: i32, y: i32, _z: i32, rot: &Rotation) -> (f32, f32) {
        self.0.project_3d_from_2d(x, y, rot)
    }
}

impl<P: Projector> ReferenceSampler for VolumeRef<'_, P> {
    fn geometry(&self) -> PixelGeometry {
        self.0.geometry()
    }

    #[inline]
    fn sample(&self, x: i32, y: i32, z: i32, rot: &Rotation) -> (f32, f32) {
        self.0.project_3d(x, y, z, rot)
    }
}

/// Dense half-grid Fourier model.
///
/// x runs over non-negative frequencies; y and z rows are offset so that
/// row 0 maps to coordinate `y_init` (resp. `z_init`), placing the origin
/// inside the grid. Taps outside the stored grid read as zero.
pub struct FourierModel {
    real: Vec<f32>,
    imag: Vec<f32>,
    x_size: usize,
    y_size: usize,
    z_size: usize,
    y_init: i32,
    z_init: i32,
}

impl FourierModel {
    /// Wraps dense model data; `real` and `imag` must both hold
    /// `x_size * y_size * z_size` samples.
    pub fn new(
        real: Vec<f32>,
        imag: Vec<f32>,
        x_size: usize,
        y_size: usize,
        z_size: usize,
        y_init: i32,
        z_init: i32,
    ) -> FourAlignResult<Self> {
        let needed = x_size * y_size * z_size;
        if real.len() != needed {
            return Err(FourAlignError::SizeMismatch {
                needed,
                got: real.len(),
                context: "model real part",
            });
        }
        if imag.len() != needed {
            return Err(FourAlignError::SizeMismatch {
                needed,
                got: imag.len(),
                context: "model imaginary part",
            });
        }
        Ok(Self {
            real,
            imag,
            x_size,
            y_size,
            z_size,
            y_init,
            z_init,
        })
    }

    /// A 2D model plane with its y origin offset.
    pub fn new_2d(
        real: Vec<f32>,
        imag: Vec<f32>,
        x_size: usize,
        y_size: usize,
        y_init: i32,
    ) -> FourAlignResult<Self> {
        Self::new(real, imag, x_size, y_size, 1, y_init, 0)
    }

    /// Single grid tap in row coordinates; zero outside the grid.
    #[inline]
    fn tap(&self, x: i32, y: i32, z: i32) -> (f32, f32) {
        if x < 0
            || y < 0
            || z < 0
            || x as usize >= self.x_size
            || y as usize >= self.y_size
            || z as usize >= self.z_size
        {
            return (0.0, 0.0);
        }
        let idx = (z as usize * self.y_size + y as usize) * self.x_size + x as usize;
        (self.real[idx], self.imag[idx])
    }

    /// Bilinear interpolation in the z = 0 plane.
    fn interp_2d(&self, xp: f32, yp: f32) -> (f32, f32) {
        let yg = yp - self.y_init as f32;
        let x0 = xp.floor();
        let y0 = yg.floor();
        let fx = xp - x0;
        let fy = yg - y0;
        let (x0, y0) = (x0 as i32, y0 as i32);

        let (r00, i00) = self.tap(x0, y0, 0);
        let (r10, i10) = self.tap(x0 + 1, y0, 0);
        let (r01, i01) = self.tap(x0, y0 + 1, 0);
        let (r11, i11) = self.tap(x0 + 1, y0 + 1, 0);

        let r0 = r00 + fx * (r10 - r00);
        let r1 = r01 + fx * (r11 - r01);
        let i0 = i00 + fx * (i10 - i00);
        let i1 = i01 + fx * (i11 - i01);
        (r0 + fy * (r1 - r0), i0 + fy * (i1 - i0))
    }

    /// Trilinear interpolation.
    fn interp_3d(&self, xp: f32, yp: f32, zp: f32) -> (f32, f32) {
        let yg = yp - self.y_init as f32;
        let zg = zp - self.z_init as f32;
        let x0 = xp.floor();
        let y0 = yg.floor();
        let z0 = zg.floor();
        let fx = xp - x0;
        let fy = yg - y0;
        let fz = zg - z0;
        let (x0, y0, z0) = (x0 as i32, y0 as i32, z0 as i32);

        let mut re = [0.0f32; 2];
        let mut im = [0.0f32; 2];
        for (dz, (re_out, im_out)) in re.iter_mut().zip(im.iter_mut()).enumerate() {
            let z = z0 + dz as i32;
            let (r00, i00) = self.tap(x0, y0, z);
            let (r10, i10) = self.tap(x0 + 1, y0, z);
            let (r01, i01) = self.tap(x0, y0 + 1, z);
            let (r11, i11) = self.tap(x0 + 1, y0 + 1, z);
            let r0 = r00 + fx * (r10 - r00);
            let r1 = r01 + fx * (r11 - r01);
            let i0 = i00 + fx * (i10 - i00);
            let i1 = i01 + fx * (i11 - i01);
            *re_out = r0 + fy * (r1 - r0);
            *im_out = i0 + fy * (i1 - i0);
        }
        (re[0] + fz * (re[1] - re[0]), im[0] + fz * (im[1] - im[0]))
    }
}

/// Interpolating projector over a [`FourierModel`].
///
/// Rotates each requested coordinate into model space, rejects points
/// beyond `max_r`, and applies Friedel symmetry (conjugate at the negated
/// coordinate) when the rotated x falls negative, so only the half-grid
/// needs to be stored.
pub struct GridProjector<'a> {
    model: &'a FourierModel,
    geometry: PixelGeometry,
}

impl<'a> GridProjector<'a> {
    /// Binds a model to the data-side geometry it will be scored against.
    pub fn new(model: &'a FourierModel, geometry: PixelGeometry) -> FourAlignResult<Self> {
        geometry.validate()?;
        Ok(Self { model, geometry })
    }

    #[inline]
    fn max_r2(&self) -> f32 {
        let r = self.geometry.max_r as f32;
        r * r
    }
}

impl Projector for GridProjector<'_> {
    fn geometry(&self) -> PixelGeometry {
        self.geometry
    }

    fn project_2d(&self, x: i32, y: i32, rot: &Rotation) -> (f32, f32) {
        let (xf, yf) = (x as f32, y as f32);
        let xp = rot[0] * xf + rot[1] * yf;
        let yp = rot[3] * xf + rot[4] * yf;
        if xp * xp + yp * yp > self.max_r2() {
            return (0.0, 0.0);
        }
        if xp < 0.0 {
            let (re, im) = self.model.interp_2d(-xp, -yp);
            (re, -im)
        } else {
            self.model.interp_2d(xp, yp)
        }
    }

    fn project_3d_from_2d(&self, x: i32, y: i32, rot: &Rotation) -> (f32, f32) {
        let (xf, yf) = (x as f32, y as f32);
        let xp = rot[0] * xf + rot[1] * yf;
        let yp = rot[3] * xf + rot[4] * yf;
        let zp = rot[6] * xf + rot[7] * yf;
        if xp * xp + yp * yp + zp * zp > self.max_r2() {
            return (0.0, 0.0);
        }
        if xp < 0.0 {
            let (re, im) = self.model.interp_3d(-xp, -yp, -zp);
            (re, -im)
        } else {
            self.model.interp_3d(xp, yp, zp)
        }
    }

    fn project_3d(&self, x: i32, y: i32, z: i32, rot: &Rotation) -> (f32, f32) {
        let (xf, yf, zf) = (x as f32, y as f32, z as f32);
        let xp = rot[0] * xf + rot[1] * yf + rot[2] * zf;
        let yp = rot[3] * xf + rot[4] * yf + rot[5] * zf;
        let zp = rot[6] * xf + rot[7] * yf + rot[8] * zf;
        if xp * xp + yp * yp + zp * zp > self.max_r2() {
            return (0.0, 0.0);
        }
        if xp < 0.0 {
            let (re, im) = self.model.interp_3d(-xp, -yp, -zp);
            (re, -im)
        } else {
            self.model.interp_3d(xp, yp, zp)
        }
    }
}
