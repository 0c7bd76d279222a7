//! Per-translation sin/cos lookup tables for Fourier phase shifts.
//!
//! Translating an image by `t` multiplies the Fourier sample at frequency
//! `k` by `e^{2πi·t·k/N}`. The tables store `sin` and `cos` of
//! `2π·t·k/N` for every translation and every non-negative `k`; negative
//! coordinates fold the sign at lookup (`sin(-a) = -sin(a)`,
//! `cos(-a) = cos(a)`) instead of doubling the storage. Axis phases are
//! combined with the angle-addition identities in the kernels.

use std::f32::consts::TAU;

/// Flattened `capacity x extent` sin/cos table for one axis.
///
/// Allocated once per kernel call and refilled per job in the fine search,
/// so the backing buffers are sized for the largest translation run.
pub struct PhaseTable {
    sin: Vec<f32>,
    cos: Vec<f32>,
    extent: usize,
    filled: usize,
}

impl PhaseTable {
    /// Allocates a table for up to `capacity` translations along an axis of
    /// `extent` samples.
    pub fn new(capacity: usize, extent: usize) -> Self {
        Self {
            sin: vec![0.0; capacity * extent],
            cos: vec![0.0; capacity * extent],
            extent,
            filled: 0,
        }
    }

    /// Fills one row per shift with its phase ramp.
    ///
    /// Row `i`, entry `k` holds `sin/cos(2π · shifts[i] · k / extent)`.
    pub fn fill(&mut self, shifts: &[f32]) {
        debug_assert!(shifts.len() * self.extent <= self.sin.len());
        for (i, &t) in shifts.iter().enumerate() {
            let base = i * self.extent;
            let step = TAU * t / self.extent as f32;
            for k in 0..self.extent {
                let (s, c) = (step * k as f32).sin_cos();
                self.sin[base + k] = s;
                self.cos[base + k] = c;
            }
        }
        self.filled = shifts.len();
    }

    /// Axis extent the table was built for.
    pub fn extent(&self) -> usize {
        self.extent
    }

    /// Number of translation rows currently filled.
    pub fn filled(&self) -> usize {
        self.filled
    }

    /// Sin and cos rows for translation `i`, indexed by non-negative `k`.
    #[inline]
    pub fn row(&self, i: usize) -> (&[f32], &[f32]) {
        let base = i * self.extent;
        (
            &self.sin[base..base + self.extent],
            &self.cos[base..base + self.extent],
        )
    }

    /// Phase of translation `i` at signed coordinate `k`.
    #[inline]
    pub fn at(&self, i: usize, k: i32) -> (f32, f32) {
        let (sin_row, cos_row) = self.row(i);
        if k < 0 {
            let k = (-k) as usize;
            (-sin_row[k], cos_row[k])
        } else {
            let k = k as usize;
            (sin_row[k], cos_row[k])
        }
    }
}
