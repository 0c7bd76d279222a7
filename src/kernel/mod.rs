//! Orientation/translation scoring kernels.
//!
//! Two iteration skeletons cover the four kernel variants: a dense coarse
//! pass over orientation blocks x all translations, and a job-driven fine
//! pass over precomputed (orientation, translation) runs. Both are generic
//! over a [`ScoreMetric`] (squared difference or cross-correlation) and a
//! [`ReferenceSampler`](crate::projector::ReferenceSampler) picking the
//! reference dimensionality. The entry points here validate buffers once
//! and route into the skeletons; the skeletons themselves are pure
//! accumulators over their arguments, allocate only call-local scratch,
//! and only ever ADD into the caller's output.

use crate::projector::ReferenceSampler;
use crate::trace::{kernel_event, kernel_span};
use crate::util::{FourAlignError, FourAlignResult};

pub mod coarse;
pub mod fine;
pub mod scalar;

#[cfg(feature = "simd")]
pub mod simd;

#[cfg(feature = "rayon")]
pub mod par;

#[cfg(feature = "simd")]
pub(crate) use self::simd as rows;

#[cfg(not(feature = "simd"))]
pub(crate) use self::scalar as rows;

/// Pixel tile processed per pass in the coarse skeleton.
pub const DEFAULT_BLOCK: usize = 64;

/// Orientations cached per block in the squared-difference coarse kernel.
pub const DEFAULT_EULERS_PER_BLOCK: usize = 8;

/// Which score a kernel invocation accumulates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScoringMode {
    /// Weighted squared Fourier-magnitude difference.
    SquaredDifference,
    /// Normalized cross-correlation, emitted as `-<sig,ref>/sqrt(<ref,ref>)`.
    CrossCorrelation,
}

/// Translation vectors in pixel units, one component array per axis.
///
/// `z` stays empty for 2D data and is ignored by the 2D kernels.
#[derive(Clone, Copy, Debug)]
pub struct Translations<'a> {
    /// X components.
    pub x: &'a [f32],
    /// Y components.
    pub y: &'a [f32],
    /// Z components; empty for 2D data.
    pub z: &'a [f32],
}

impl<'a> Translations<'a> {
    /// In-plane translations for 2D data.
    pub fn new_2d(x: &'a [f32], y: &'a [f32]) -> Self {
        Self { x, y, z: &[] }
    }

    /// Full 3D translations.
    pub fn new_3d(x: &'a [f32], y: &'a [f32], z: &'a [f32]) -> Self {
        Self { x, y, z }
    }

    /// Number of translations.
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// True when no translations were supplied.
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    fn validate(&self, data3d: bool) -> FourAlignResult<()> {
        if self.is_empty() {
            return Err(FourAlignError::EmptyTranslations);
        }
        if self.y.len() != self.x.len() {
            return Err(FourAlignError::TranslationAxisMismatch {
                x_len: self.x.len(),
                got: self.y.len(),
                axis: "y",
            });
        }
        if data3d && self.z.len() != self.x.len() {
            return Err(FourAlignError::TranslationAxisMismatch {
                x_len: self.x.len(),
                got: self.z.len(),
                axis: "z",
            });
        }
        Ok(())
    }
}

/// Fine-search job tables: four parallel index arrays.
///
/// `rot_idx` and `trans_idx` have one entry per scored pair; `job_idx` and
/// `job_num` have one entry per job. Job `b` pairs orientation
/// `rot_idx[job_idx[b]]` with the `job_num[b]` translations starting at
/// `trans_idx[job_idx[b]]`, and its scores land at output indices
/// `job_idx[b] + i`.
#[derive(Clone, Copy, Debug)]
pub struct JobTable<'a> {
    /// Orientation index per scored pair.
    pub rot_idx: &'a [usize],
    /// First-translation index per scored pair.
    pub trans_idx: &'a [usize],
    /// Start offset of each job in the pair arrays (and the output).
    pub job_idx: &'a [usize],
    /// Number of translations covered by each job.
    pub job_num: &'a [usize],
}

impl JobTable<'_> {
    /// Number of jobs.
    pub fn len(&self) -> usize {
        self.job_num.len()
    }

    /// True when the table holds no jobs.
    pub fn is_empty(&self) -> bool {
        self.job_num.is_empty()
    }

    /// Checks every job against the buffers it will index.
    pub fn validate(
        &self,
        orientation_num: usize,
        translation_num: usize,
        out_len: usize,
    ) -> FourAlignResult<()> {
        if self.job_idx.len() != self.job_num.len() {
            return Err(FourAlignError::SizeMismatch {
                needed: self.job_num.len(),
                got: self.job_idx.len(),
                context: "job start offsets",
            });
        }
        if self.rot_idx.len() != self.trans_idx.len() {
            return Err(FourAlignError::SizeMismatch {
                needed: self.rot_idx.len(),
                got: self.trans_idx.len(),
                context: "pair index arrays",
            });
        }
        for b in 0..self.len() {
            let head = self.job_idx[b];
            if head >= self.rot_idx.len() {
                return Err(FourAlignError::JobOutOfBounds {
                    job: b,
                    context: "job start past pair arrays",
                });
            }
            if self.rot_idx[head] >= orientation_num {
                return Err(FourAlignError::JobOutOfBounds {
                    job: b,
                    context: "orientation index",
                });
            }
            let num = self.job_num[b];
            if self.trans_idx[head] + num > translation_num {
                return Err(FourAlignError::JobOutOfBounds {
                    job: b,
                    context: "translation run",
                });
            }
            if head + num > out_len {
                return Err(FourAlignError::JobOutOfBounds {
                    job: b,
                    context: "output run",
                });
            }
        }
        Ok(())
    }
}

/// Accumulated inner product and self-norm for the cross-correlation score.
#[derive(Clone, Copy, Debug, Default)]
pub struct CcAcc {
    /// Weighted `<reference, shifted signal>` real inner product.
    pub weight: f32,
    /// Weighted reference self-norm.
    pub norm: f32,
}

impl std::ops::AddAssign for CcAcc {
    fn add_assign(&mut self, rhs: Self) {
        self.weight += rhs.weight;
        self.norm += rhs.norm;
    }
}

/// Scoring rule plugged into the coarse and fine skeletons.
pub trait ScoreMetric {
    /// Per-(orientation, translation) running state.
    type Acc: Copy + Default + std::ops::AddAssign;

    /// Weight staged per pixel for the dense coarse loop.
    fn coarse_weight(corr: f32) -> f32;

    /// Amplitude scale folded into the per-row reference and signal
    /// buffers in the fine loop.
    fn row_scale(corr: f32) -> f32;

    /// Per-pixel weight passed to `accumulate_span` in the fine loop.
    fn row_weight(corr: f32) -> f32;

    /// Folds one span of reference vs shifted-signal pixels.
    fn accumulate_span(
        ref_re: &[f32],
        ref_im: &[f32],
        sig_re: &[f32],
        sig_im: &[f32],
        weight: &[f32],
    ) -> Self::Acc;

    /// Emits the score for one output cell; `bias` is the caller-supplied
    /// offset (added by the squared-difference metric only).
    fn finalize(acc: Self::Acc, bias: f32) -> f32;
}

/// Weighted squared Fourier-magnitude difference.
///
/// The 1/2 factor lives in the staged weight (`0.5 * corr` in the coarse
/// loop, `sqrt(0.5 * corr)` folded into both amplitudes in the fine loop)
/// and is never applied again at reduction.
pub struct SquaredDifference;

impl ScoreMetric for SquaredDifference {
    type Acc = f32;

    #[inline]
    fn coarse_weight(corr: f32) -> f32 {
        0.5 * corr
    }

    #[inline]
    fn row_scale(corr: f32) -> f32 {
        (corr * 0.5).sqrt()
    }

    #[inline]
    fn row_weight(_corr: f32) -> f32 {
        1.0
    }

    #[inline]
    fn accumulate_span(
        ref_re: &[f32],
        ref_im: &[f32],
        sig_re: &[f32],
        sig_im: &[f32],
        weight: &[f32],
    ) -> f32 {
        rows::diff2_span(ref_re, ref_im, sig_re, sig_im, weight)
    }

    #[inline]
    fn finalize(acc: f32, bias: f32) -> f32 {
        acc + bias
    }
}

/// Normalized cross-correlation.
///
/// Weights are used as-is; the emitted score is `-weight/sqrt(norm)`, and
/// a zero norm flows an infinity into the output unguarded. The bias
/// parameter is accepted for interface symmetry and ignored.
pub struct CrossCorrelation;

impl ScoreMetric for CrossCorrelation {
    type Acc = CcAcc;

    #[inline]
    fn coarse_weight(corr: f32) -> f32 {
        corr
    }

    #[inline]
    fn row_scale(_corr: f32) -> f32 {
        1.0
    }

    #[inline]
    fn row_weight(corr: f32) -> f32 {
        corr
    }

    #[inline]
    fn accumulate_span(
        ref_re: &[f32],
        ref_im: &[f32],
        sig_re: &[f32],
        sig_im: &[f32],
        weight: &[f32],
    ) -> CcAcc {
        rows::cc_span(ref_re, ref_im, sig_re, sig_im, weight)
    }

    #[inline]
    fn finalize(acc: CcAcc, _bias: f32) -> f32 {
        -(acc.weight / acc.norm.sqrt())
    }
}

fn check_len(context: &'static str, needed: usize, got: usize) -> FourAlignResult<()> {
    if got != needed {
        return Err(FourAlignError::SizeMismatch {
            needed,
            got,
            context,
        });
    }
    Ok(())
}

/// Shared checks for all kernel entry points; returns the pixel count.
fn validate_common<S: ReferenceSampler>(
    sampler: &S,
    trans: Translations<'_>,
    sig_re: &[f32],
    sig_im: &[f32],
    corr: &[f32],
) -> FourAlignResult<usize> {
    let geom = sampler.geometry();
    geom.validate()?;
    trans.validate(geom.is_3d())?;
    let image_size = geom.image_size();
    check_len("signal real part", image_size, sig_re.len())?;
    check_len("signal imaginary part", image_size, sig_im.len())?;
    check_len("correlation weights", image_size, corr.len())?;
    Ok(image_size)
}

/// Checks coarse-pass buffers and returns the orientation block count.
fn validate_coarse(
    eulers_len: usize,
    eulers_per_block: usize,
    translation_num: usize,
    out_len: usize,
) -> FourAlignResult<usize> {
    let block_stride = 9 * eulers_per_block;
    if eulers_len % block_stride != 0 {
        return Err(FourAlignError::SizeMismatch {
            needed: eulers_len.div_ceil(block_stride) * block_stride,
            got: eulers_len,
            context: "euler matrices",
        });
    }
    let grid_size = eulers_len / block_stride;
    check_len(
        "score output",
        grid_size * eulers_per_block * translation_num,
        out_len,
    )?;
    Ok(grid_size)
}

/// Checks fine-pass buffers and returns the orientation count.
fn validate_fine(
    eulers_len: usize,
    trans: Translations<'_>,
    out_len: usize,
    jobs: &JobTable<'_>,
) -> FourAlignResult<usize> {
    if eulers_len % 9 != 0 {
        return Err(FourAlignError::SizeMismatch {
            needed: eulers_len.div_ceil(9) * 9,
            got: eulers_len,
            context: "euler matrices",
        });
    }
    let orientation_num = eulers_len / 9;
    jobs.validate(orientation_num, trans.len(), out_len)?;
    Ok(orientation_num)
}

/// Coarse pass with an explicit metric and tile shape.
///
/// `eulers` holds `grid_size * EPB` row-major rotation matrices; scores
/// ADD into `out[block * EPB * T + e * T + t]`.
pub fn coarse_with_shape<M, S, const BLOCK: usize, const EPB: usize>(
    sampler: &S,
    eulers: &[f32],
    trans: Translations<'_>,
    sig_re: &[f32],
    sig_im: &[f32],
    corr: &[f32],
    out: &mut [f32],
) -> FourAlignResult<()>
where
    M: ScoreMetric,
    S: ReferenceSampler,
{
    validate_common(sampler, trans, sig_re, sig_im, corr)?;
    validate_coarse(eulers.len(), EPB, trans.len(), out.len())?;
    let _span = kernel_span!(
        "coarse",
        blocks = eulers.len() / (9 * EPB),
        translations = trans.len(),
    );
    coarse::run::<M, S, BLOCK, EPB>(sampler, eulers, trans, sig_re, sig_im, corr, out);
    Ok(())
}

/// Dense squared-difference search: every orientation x every translation.
///
/// Orientations are processed [`DEFAULT_EULERS_PER_BLOCK`] at a time, so
/// the orientation count must be a multiple of it; pad the euler list or
/// use [`coarse_with_shape`] for other groupings.
pub fn diff2_coarse<S: ReferenceSampler>(
    sampler: &S,
    eulers: &[f32],
    trans: Translations<'_>,
    sig_re: &[f32],
    sig_im: &[f32],
    corr: &[f32],
    out: &mut [f32],
) -> FourAlignResult<()> {
    coarse_with_shape::<SquaredDifference, S, DEFAULT_BLOCK, DEFAULT_EULERS_PER_BLOCK>(
        sampler, eulers, trans, sig_re, sig_im, corr, out,
    )
}

/// Dense cross-correlation search, one orientation per block.
///
/// Scores ADD into `out[orientation * T + t]`. `_exp_local_sqrt_xi2` is
/// accepted for interface stability and not used.
#[allow(clippy::too_many_arguments)]
pub fn cc_coarse<S: ReferenceSampler>(
    sampler: &S,
    eulers: &[f32],
    trans: Translations<'_>,
    sig_re: &[f32],
    sig_im: &[f32],
    corr: &[f32],
    out: &mut [f32],
    _exp_local_sqrt_xi2: f32,
) -> FourAlignResult<()> {
    coarse_with_shape::<CrossCorrelation, S, DEFAULT_BLOCK, 1>(
        sampler, eulers, trans, sig_re, sig_im, corr, out,
    )
}

/// Job-driven squared-difference search.
///
/// `sum_init` is added once per emitted score; scores ADD into
/// `out[job_idx[b] + i]`.
#[allow(clippy::too_many_arguments)]
pub fn diff2_fine<S: ReferenceSampler>(
    sampler: &S,
    eulers: &[f32],
    trans: Translations<'_>,
    sig_re: &[f32],
    sig_im: &[f32],
    corr: &[f32],
    out: &mut [f32],
    sum_init: f32,
    jobs: &JobTable<'_>,
) -> FourAlignResult<()> {
    validate_common(sampler, trans, sig_re, sig_im, corr)?;
    validate_fine(eulers.len(), trans, out.len(), jobs)?;
    let _span = kernel_span!("diff2_fine", jobs = jobs.len());
    fine::run::<SquaredDifference, S>(
        sampler, eulers, trans, sig_re, sig_im, corr, out, sum_init, jobs,
    );
    Ok(())
}

/// Job-driven cross-correlation search.
///
/// `sum_init` and `_exp_local_sqrt_xi2` are accepted for interface
/// symmetry with the squared-difference path; neither enters the CC
/// accumulation, which emits `-sum/sqrt(norm)` only.
#[allow(clippy::too_many_arguments)]
pub fn cc_fine<S: ReferenceSampler>(
    sampler: &S,
    eulers: &[f32],
    trans: Translations<'_>,
    sig_re: &[f32],
    sig_im: &[f32],
    corr: &[f32],
    out: &mut [f32],
    sum_init: f32,
    _exp_local_sqrt_xi2: f32,
    jobs: &JobTable<'_>,
) -> FourAlignResult<()> {
    validate_common(sampler, trans, sig_re, sig_im, corr)?;
    validate_fine(eulers.len(), trans, out.len(), jobs)?;
    let _span = kernel_span!("cc_fine", jobs = jobs.len());
    fine::run::<CrossCorrelation, S>(
        sampler, eulers, trans, sig_re, sig_im, corr, out, sum_init, jobs,
    );
    Ok(())
}

/// Routes one coarse pass to the requested scoring mode.
#[allow(clippy::too_many_arguments)]
pub fn run_coarse<S: ReferenceSampler>(
    mode: ScoringMode,
    sampler: &S,
    eulers: &[f32],
    trans: Translations<'_>,
    sig_re: &[f32],
    sig_im: &[f32],
    corr: &[f32],
    out: &mut [f32],
) -> FourAlignResult<()> {
    match mode {
        ScoringMode::SquaredDifference => {
            diff2_coarse(sampler, eulers, trans, sig_re, sig_im, corr, out)?
        }
        ScoringMode::CrossCorrelation => {
            cc_coarse(sampler, eulers, trans, sig_re, sig_im, corr, out, 0.0)?
        }
    }
    kernel_event!("coarse_scores", cells = out.len());
    Ok(())
}

/// Routes one fine pass to the requested scoring mode.
#[allow(clippy::too_many_arguments)]
pub fn run_fine<S: ReferenceSampler>(
    mode: ScoringMode,
    sampler: &S,
    eulers: &[f32],
    trans: Translations<'_>,
    sig_re: &[f32],
    sig_im: &[f32],
    corr: &[f32],
    out: &mut [f32],
    sum_init: f32,
    jobs: &JobTable<'_>,
) -> FourAlignResult<()> {
    match mode {
        ScoringMode::SquaredDifference => diff2_fine(
            sampler, eulers, trans, sig_re, sig_im, corr, out, sum_init, jobs,
        )?,
        ScoringMode::CrossCorrelation => cc_fine(
            sampler, eulers, trans, sig_re, sig_im, corr, out, sum_init, 0.0, jobs,
        )?,
    }
    kernel_event!("fine_scores", jobs = jobs.len());
    Ok(())
}
