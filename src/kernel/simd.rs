//! SIMD span helpers using the `wide` crate.
//!
//! Same signatures as `kernel::scalar`, with the inner pixel loops
//! processing 8 samples at a time as `f32x8`. Horizontal reductions use a
//! fixed lane order, so results are deterministic within a build; they may
//! differ from the scalar build in the last bits of the accumulation.

use crate::kernel::CcAcc;
use wide::f32x8;

const LANES: usize = 8;

/// Load 8 f32 values into an f32x8.
#[inline]
fn load_f32x8(slice: &[f32]) -> f32x8 {
    f32x8::from([
        slice[0], slice[1], slice[2], slice[3], slice[4], slice[5], slice[6], slice[7],
    ])
}

/// Horizontal sum of an f32x8 in lane order.
#[inline]
fn hsum(v: f32x8) -> f32 {
    let arr = v.to_array();
    arr[0] + arr[1] + arr[2] + arr[3] + arr[4] + arr[5] + arr[6] + arr[7]
}

/// Applies per-pixel 2D translation phases to a span of signal samples.
#[allow(clippy::too_many_arguments)]
pub fn shift_tile_2d(
    sin_x: &[f32],
    cos_x: &[f32],
    sin_y: &[f32],
    cos_y: &[f32],
    sig_re: &[f32],
    sig_im: &[f32],
    out_re: &mut [f32],
    out_im: &mut [f32],
) {
    let n = sig_re.len();
    let simd_end = n / LANES * LANES;

    let mut t = 0;
    while t < simd_end {
        let sx = load_f32x8(&sin_x[t..]);
        let cx = load_f32x8(&cos_x[t..]);
        let sy = load_f32x8(&sin_y[t..]);
        let cy = load_f32x8(&cos_y[t..]);
        let ss = sx * cy + cx * sy;
        let cc = cx * cy - sx * sy;
        let sr = load_f32x8(&sig_re[t..]);
        let si = load_f32x8(&sig_im[t..]);
        out_re[t..t + LANES].copy_from_slice(&(cc * sr - ss * si).to_array());
        out_im[t..t + LANES].copy_from_slice(&(cc * si + ss * sr).to_array());
        t += LANES;
    }
    while t < n {
        let ss = sin_x[t] * cos_y[t] + cos_x[t] * sin_y[t];
        let cc = cos_x[t] * cos_y[t] - sin_x[t] * sin_y[t];
        out_re[t] = cc * sig_re[t] - ss * sig_im[t];
        out_im[t] = cc * sig_im[t] + ss * sig_re[t];
        t += 1;
    }
}

/// Applies per-pixel 3D translation phases to a span of signal samples.
#[allow(clippy::too_many_arguments)]
pub fn shift_tile_3d(
    sin_x: &[f32],
    cos_x: &[f32],
    sin_y: &[f32],
    cos_y: &[f32],
    sin_z: &[f32],
    cos_z: &[f32],
    sig_re: &[f32],
    sig_im: &[f32],
    out_re: &mut [f32],
    out_im: &mut [f32],
) {
    let n = sig_re.len();
    let simd_end = n / LANES * LANES;

    let mut t = 0;
    while t < simd_end {
        let sx = load_f32x8(&sin_x[t..]);
        let cx = load_f32x8(&cos_x[t..]);
        let sy = load_f32x8(&sin_y[t..]);
        let cy = load_f32x8(&cos_y[t..]);
        let sz = load_f32x8(&sin_z[t..]);
        let cz = load_f32x8(&cos_z[t..]);
        let s1 = sx * cy + cx * sy;
        let c1 = cx * cy - sx * sy;
        let ss = s1 * cz + c1 * sz;
        let cc = c1 * cz - s1 * sz;
        let sr = load_f32x8(&sig_re[t..]);
        let si = load_f32x8(&sig_im[t..]);
        out_re[t..t + LANES].copy_from_slice(&(cc * sr - ss * si).to_array());
        out_im[t..t + LANES].copy_from_slice(&(cc * si + ss * sr).to_array());
        t += LANES;
    }
    while t < n {
        let s1 = sin_x[t] * cos_y[t] + cos_x[t] * sin_y[t];
        let c1 = cos_x[t] * cos_y[t] - sin_x[t] * sin_y[t];
        let ss = s1 * cos_z[t] + c1 * sin_z[t];
        let cc = c1 * cos_z[t] - s1 * sin_z[t];
        out_re[t] = cc * sig_re[t] - ss * sig_im[t];
        out_im[t] = cc * sig_im[t] + ss * sig_re[t];
        t += 1;
    }
}

/// Shifts one grid row: the x phase varies per pixel, the y phase is fixed.
#[allow(clippy::too_many_arguments)]
pub fn shift_row_2d(
    sin_x: &[f32],
    cos_x: &[f32],
    sin_y: f32,
    cos_y: f32,
    sig_re: &[f32],
    sig_im: &[f32],
    out_re: &mut [f32],
    out_im: &mut [f32],
) {
    let n = sig_re.len();
    let simd_end = n / LANES * LANES;
    let sy = f32x8::splat(sin_y);
    let cy = f32x8::splat(cos_y);

    let mut t = 0;
    while t < simd_end {
        let sx = load_f32x8(&sin_x[t..]);
        let cx = load_f32x8(&cos_x[t..]);
        let ss = sx * cy + cx * sy;
        let cc = cx * cy - sx * sy;
        let sr = load_f32x8(&sig_re[t..]);
        let si = load_f32x8(&sig_im[t..]);
        out_re[t..t + LANES].copy_from_slice(&(cc * sr - ss * si).to_array());
        out_im[t..t + LANES].copy_from_slice(&(cc * si + ss * sr).to_array());
        t += LANES;
    }
    while t < n {
        let ss = sin_x[t] * cos_y + cos_x[t] * sin_y;
        let cc = cos_x[t] * cos_y - sin_x[t] * sin_y;
        out_re[t] = cc * sig_re[t] - ss * sig_im[t];
        out_im[t] = cc * sig_im[t] + ss * sig_re[t];
        t += 1;
    }
}

/// Shifts one grid row of a volume: fixed y and z phases per row.
#[allow(clippy::too_many_arguments)]
pub fn shift_row_3d(
    sin_x: &[f32],
    cos_x: &[f32],
    sin_y: f32,
    cos_y: f32,
    sin_z: f32,
    cos_z: f32,
    sig_re: &[f32],
    sig_im: &[f32],
    out_re: &mut [f32],
    out_im: &mut [f32],
) {
    let n = sig_re.len();
    let simd_end = n / LANES * LANES;
    let sy = f32x8::splat(sin_y);
    let cy = f32x8::splat(cos_y);
    let sz = f32x8::splat(sin_z);
    let cz = f32x8::splat(cos_z);

    let mut t = 0;
    while t < simd_end {
        let sx = load_f32x8(&sin_x[t..]);
        let cx = load_f32x8(&cos_x[t..]);
        let s1 = sx * cy + cx * sy;
        let c1 = cx * cy - sx * sy;
        let ss = s1 * cz + c1 * sz;
        let cc = c1 * cz - s1 * sz;
        let sr = load_f32x8(&sig_re[t..]);
        let si = load_f32x8(&sig_im[t..]);
        out_re[t..t + LANES].copy_from_slice(&(cc * sr - ss * si).to_array());
        out_im[t..t + LANES].copy_from_slice(&(cc * si + ss * sr).to_array());
        t += LANES;
    }
    while t < n {
        let s1 = sin_x[t] * cos_y + cos_x[t] * sin_y;
        let c1 = cos_x[t] * cos_y - sin_x[t] * sin_y;
        let ss = s1 * cos_z + c1 * sin_z;
        let cc = c1 * cos_z - s1 * sin_z;
        out_re[t] = cc * sig_re[t] - ss * sig_im[t];
        out_im[t] = cc * sig_im[t] + ss * sig_re[t];
        t += 1;
    }
}

/// Weighted squared difference over one span.
pub fn diff2_span(
    ref_re: &[f32],
    ref_im: &[f32],
    sig_re: &[f32],
    sig_im: &[f32],
    weight: &[f32],
) -> f32 {
    let n = ref_re.len();
    let simd_end = n / LANES * LANES;

    let mut acc = f32x8::ZERO;
    let mut t = 0;
    while t < simd_end {
        let dr = load_f32x8(&ref_re[t..]) - load_f32x8(&sig_re[t..]);
        let di = load_f32x8(&ref_im[t..]) - load_f32x8(&sig_im[t..]);
        acc += (dr * dr + di * di) * load_f32x8(&weight[t..]);
        t += LANES;
    }
    let mut sum = hsum(acc);
    while t < n {
        let dr = ref_re[t] - sig_re[t];
        let di = ref_im[t] - sig_im[t];
        sum += (dr * dr + di * di) * weight[t];
        t += 1;
    }
    sum
}

/// Weighted cross-correlation and reference self-norm over one span.
pub fn cc_span(
    ref_re: &[f32],
    ref_im: &[f32],
    sig_re: &[f32],
    sig_im: &[f32],
    weight: &[f32],
) -> CcAcc {
    let n = ref_re.len();
    let simd_end = n / LANES * LANES;

    let mut weight_acc = f32x8::ZERO;
    let mut norm_acc = f32x8::ZERO;
    let mut t = 0;
    while t < simd_end {
        let rr = load_f32x8(&ref_re[t..]);
        let ri = load_f32x8(&ref_im[t..]);
        let sr = load_f32x8(&sig_re[t..]);
        let si = load_f32x8(&sig_im[t..]);
        let w = load_f32x8(&weight[t..]);
        weight_acc += (rr * sr + ri * si) * w;
        norm_acc += (rr * rr + ri * ri) * w;
        t += LANES;
    }
    let mut acc = CcAcc {
        weight: hsum(weight_acc),
        norm: hsum(norm_acc),
    };
    while t < n {
        acc.weight += (ref_re[t] * sig_re[t] + ref_im[t] * sig_im[t]) * weight[t];
        acc.norm += (ref_re[t] * ref_re[t] + ref_im[t] * ref_im[t]) * weight[t];
        t += 1;
    }
    acc
}
