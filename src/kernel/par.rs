//! Block-parallel drivers (feature-gated).
//!
//! The kernels themselves are single-threaded and reentrant; parallelism
//! lives here, at the driver boundary. Work splits across orientation
//! blocks (coarse) or jobs (fine), each unit accumulating into a private
//! zeroed buffer, and the merge into the caller's output runs in fixed
//! unit order, so results are bitwise equal to the serial kernels.

use rayon::prelude::*;

use crate::kernel::{
    coarse, fine, validate_coarse, validate_common, validate_fine, CrossCorrelation, JobTable,
    ScoreMetric, SquaredDifference, Translations, DEFAULT_BLOCK, DEFAULT_EULERS_PER_BLOCK,
};
use crate::projector::ReferenceSampler;
use crate::trace::kernel_event;
use crate::util::FourAlignResult;

fn coarse_par<M, S, const BLOCK: usize, const EPB: usize>(
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
    S: ReferenceSampler + Sync,
{
    validate_common(sampler, trans, sig_re, sig_im, corr)?;
    let grid_size = validate_coarse(eulers.len(), EPB, trans.len(), out.len())?;
    let stride = EPB * trans.len();

    let blocks: Vec<Vec<f32>> = (0..grid_size)
        .into_par_iter()
        .map(|block| {
            let mut local = vec![0.0f32; stride];
            let span = &eulers[block * EPB * 9..(block + 1) * EPB * 9];
            coarse::run::<M, S, BLOCK, EPB>(
                sampler, span, trans, sig_re, sig_im, corr, &mut local,
            );
            local
        })
        .collect();

    for (block, local) in blocks.iter().enumerate() {
        let base = block * stride;
        for (dst, src) in out[base..base + stride].iter_mut().zip(local) {
            *dst += src;
        }
    }
    kernel_event!("coarse_par", blocks = grid_size);
    Ok(())
}

/// Parallel dense squared-difference search; bitwise equal to
/// [`diff2_coarse`](crate::kernel::diff2_coarse).
pub fn diff2_coarse_par<S>(
    sampler: &S,
    eulers: &[f32],
    trans: Translations<'_>,
    sig_re: &[f32],
    sig_im: &[f32],
    corr: &[f32],
    out: &mut [f32],
) -> FourAlignResult<()>
where
    S: ReferenceSampler + Sync,
{
    coarse_par::<SquaredDifference, S, DEFAULT_BLOCK, DEFAULT_EULERS_PER_BLOCK>(
        sampler, eulers, trans, sig_re, sig_im, corr, out,
    )
}

/// Parallel dense cross-correlation search; bitwise equal to
/// [`cc_coarse`](crate::kernel::cc_coarse).
#[allow(clippy::too_many_arguments)]
pub fn cc_coarse_par<S>(
    sampler: &S,
    eulers: &[f32],
    trans: Translations<'_>,
    sig_re: &[f32],
    sig_im: &[f32],
    corr: &[f32],
    out: &mut [f32],
    _exp_local_sqrt_xi2: f32,
) -> FourAlignResult<()>
where
    S: ReferenceSampler + Sync,
{
    coarse_par::<CrossCorrelation, S, DEFAULT_BLOCK, 1>(
        sampler, eulers, trans, sig_re, sig_im, corr, out,
    )
}

#[allow(clippy::too_many_arguments)]
fn fine_par<M, S>(
    sampler: &S,
    eulers: &[f32],
    trans: Translations<'_>,
    sig_re: &[f32],
    sig_im: &[f32],
    corr: &[f32],
    out: &mut [f32],
    sum_init: f32,
    jobs: &JobTable<'_>,
) -> FourAlignResult<()>
where
    M: ScoreMetric,
    S: ReferenceSampler + Sync,
{
    validate_common(sampler, trans, sig_re, sig_im, corr)?;
    validate_fine(eulers.len(), trans, out.len(), jobs)?;
    let geom = sampler.geometry();

    let scored: Vec<(usize, Vec<f32>)> = (0..jobs.len())
        .into_par_iter()
        .map(|b| {
            let mut scratch = fine::Scratch::<M>::new(&geom, jobs.job_num[b]);
            fine::score_job::<M, S>(
                sampler, eulers, trans, sig_re, sig_im, corr, jobs, b, &mut scratch,
            );
            let head = jobs.job_idx[b];
            let scores = scratch.sums[..jobs.job_num[b]]
                .iter()
                .map(|&acc| M::finalize(acc, sum_init))
                .collect();
            (head, scores)
        })
        .collect();

    for (head, scores) in &scored {
        for (i, score) in scores.iter().enumerate() {
            out[head + i] += score;
        }
    }
    kernel_event!("fine_par", jobs = jobs.len());
    Ok(())
}

/// Parallel job-driven squared-difference search; bitwise equal to
/// [`diff2_fine`](crate::kernel::diff2_fine).
#[allow(clippy::too_many_arguments)]
pub fn diff2_fine_par<S>(
    sampler: &S,
    eulers: &[f32],
    trans: Translations<'_>,
    sig_re: &[f32],
    sig_im: &[f32],
    corr: &[f32],
    out: &mut [f32],
    sum_init: f32,
    jobs: &JobTable<'_>,
) -> FourAlignResult<()>
where
    S: ReferenceSampler + Sync,
{
    fine_par::<SquaredDifference, S>(
        sampler, eulers, trans, sig_re, sig_im, corr, out, sum_init, jobs,
    )
}

/// Parallel job-driven cross-correlation search; bitwise equal to
/// [`cc_fine`](crate::kernel::cc_fine).
#[allow(clippy::too_many_arguments)]
pub fn cc_fine_par<S>(
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
) -> FourAlignResult<()>
where
    S: ReferenceSampler + Sync,
{
    fine_par::<CrossCorrelation, S>(
        sampler, eulers, trans, sig_re, sig_im, corr, out, sum_init, jobs,
    )
}
