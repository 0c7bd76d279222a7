//! Job-driven fine-search skeleton.
//!
//! Each job pairs one orientation with a contiguous run of translations.
//! The grid is walked row by row in (z, y, x) order with the polar-skip
//! rule: rows strictly between `max_r` and `extent - max_r` collapse to
//! the single pixel at `x = max_r`, and that constraint carries through
//! the projection, staging, and accumulation for the row. Scratch is
//! allocated once per call and refilled per job.

use crate::geometry::PixelGeometry;
use crate::kernel::{rows, JobTable, ScoreMetric, Translations};
use crate::projector::{ReferenceSampler, Rotation};
use crate::sincos::PhaseTable;

/// Call-scoped scratch for the fine skeleton, sized for the largest run.
pub(crate) struct Scratch<M: ScoreMetric> {
    tab_x: PhaseTable,
    tab_y: PhaseTable,
    tab_z: Option<PhaseTable>,
    run_x: Vec<f32>,
    run_y: Vec<f32>,
    run_z: Vec<f32>,
    ref_re: Vec<f32>,
    ref_im: Vec<f32>,
    row_re: Vec<f32>,
    row_im: Vec<f32>,
    row_w: Vec<f32>,
    sh_re: Vec<f32>,
    sh_im: Vec<f32>,
    pub(crate) sums: Vec<M::Acc>,
}

impl<M: ScoreMetric> Scratch<M> {
    pub(crate) fn new(geom: &PixelGeometry, capacity: usize) -> Self {
        Self {
            tab_x: PhaseTable::new(capacity, geom.x_size),
            tab_y: PhaseTable::new(capacity, geom.y_size),
            tab_z: geom
                .is_3d()
                .then(|| PhaseTable::new(capacity, geom.z_size)),
            run_x: vec![0.0; capacity],
            run_y: vec![0.0; capacity],
            run_z: vec![0.0; capacity],
            ref_re: vec![0.0; geom.x_size],
            ref_im: vec![0.0; geom.x_size],
            row_re: vec![0.0; geom.x_size],
            row_im: vec![0.0; geom.x_size],
            row_w: vec![0.0; geom.x_size],
            sh_re: vec![0.0; geom.x_size],
            sh_im: vec![0.0; geom.x_size],
            sums: vec![M::Acc::default(); capacity],
        }
    }
}

/// Accumulates raw (un-finalized) sums for job `b` into `scratch.sums`.
#[allow(clippy::too_many_arguments)]
pub(crate) fn score_job<M, S>(
    sampler: &S,
    eulers: &[f32],
    trans: Translations<'_>,
    sig_re: &[f32],
    sig_im: &[f32],
    corr: &[f32],
    jobs: &JobTable<'_>,
    b: usize,
    scratch: &mut Scratch<M>,
) where
    M: ScoreMetric,
    S: ReferenceSampler,
{
    let geom = sampler.geometry();
    let x_size = geom.x_size;
    let data3d = geom.is_3d();

    let head = jobs.job_idx[b];
    let trans_num = jobs.job_num[b];
    let trans_start = jobs.trans_idx[head];
    let rot_start = jobs.rot_idx[head] * 9;
    let rot: &Rotation = eulers[rot_start..rot_start + 9]
        .try_into()
        .expect("rotation run holds nine entries");

    // Gather this job's translations and rebuild the phase tables.
    for i in 0..trans_num {
        let itrans = trans_start + i;
        scratch.run_x[i] = trans.x[itrans];
        scratch.run_y[i] = trans.y[itrans];
        if data3d {
            scratch.run_z[i] = trans.z[itrans];
        }
    }
    scratch.tab_x.fill(&scratch.run_x[..trans_num]);
    scratch.tab_y.fill(&scratch.run_y[..trans_num]);
    if let Some(tab_z) = &mut scratch.tab_z {
        tab_z.fill(&scratch.run_z[..trans_num]);
    }

    scratch.sums[..trans_num].fill(M::Acc::default());

    let mut pixel = 0usize;
    for iz in 0..geom.z_size {
        let plane = geom.plane_span(iz);
        for iy in 0..geom.y_size {
            let row = geom.row_span(iy);
            // The narrower of the z and y constraints carries the row.
            let x_lo = plane.x_start.max(row.x_start);
            let x_hi = plane.x_end.min(row.x_end);
            let y = row.coord;
            let z = plane.coord;

            for x in x_lo..x_hi {
                let (re, im) = sampler.sample(x as i32, y, z, rot);
                scratch.ref_re[x] = re;
                scratch.ref_im[x] = im;
            }
            for x in x_lo..x_hi {
                let c = corr[pixel + x];
                let scale = M::row_scale(c);
                scratch.ref_re[x] *= scale;
                scratch.ref_im[x] *= scale;
                scratch.row_re[x] = sig_re[pixel + x] * scale;
                scratch.row_im[x] = sig_im[pixel + x] * scale;
                scratch.row_w[x] = M::row_weight(c);
            }

            for i in 0..trans_num {
                let (sin_x, cos_x) = scratch.tab_x.row(i);
                let (sy, cy) = scratch.tab_y.at(i, y);
                if let Some(tab_z) = &scratch.tab_z {
                    let (sz, cz) = tab_z.at(i, z);
                    rows::shift_row_3d(
                        &sin_x[x_lo..x_hi],
                        &cos_x[x_lo..x_hi],
                        sy,
                        cy,
                        sz,
                        cz,
                        &scratch.row_re[x_lo..x_hi],
                        &scratch.row_im[x_lo..x_hi],
                        &mut scratch.sh_re[x_lo..x_hi],
                        &mut scratch.sh_im[x_lo..x_hi],
                    );
                } else {
                    rows::shift_row_2d(
                        &sin_x[x_lo..x_hi],
                        &cos_x[x_lo..x_hi],
                        sy,
                        cy,
                        &scratch.row_re[x_lo..x_hi],
                        &scratch.row_im[x_lo..x_hi],
                        &mut scratch.sh_re[x_lo..x_hi],
                        &mut scratch.sh_im[x_lo..x_hi],
                    );
                }
                scratch.sums[i] += M::accumulate_span(
                    &scratch.ref_re[x_lo..x_hi],
                    &scratch.ref_im[x_lo..x_hi],
                    &scratch.sh_re[x_lo..x_hi],
                    &scratch.sh_im[x_lo..x_hi],
                    &scratch.row_w[x_lo..x_hi],
                );
            }

            pixel += x_size;
        }
    }
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn run<M, S>(
    sampler: &S,
    eulers: &[f32],
    trans: Translations<'_>,
    sig_re: &[f32],
    sig_im: &[f32],
    corr: &[f32],
    out: &mut [f32],
    sum_init: f32,
    jobs: &JobTable<'_>,
) where
    M: ScoreMetric,
    S: ReferenceSampler,
{
    let geom = sampler.geometry();
    let mut scratch = Scratch::<M>::new(&geom, trans.len());

    for b in 0..jobs.len() {
        score_job::<M, S>(
            sampler, eulers, trans, sig_re, sig_im, corr, jobs, b, &mut scratch,
        );
        let head = jobs.job_idx[b];
        for i in 0..jobs.job_num[b] {
            out[head + i] += M::finalize(scratch.sums[i], sum_init);
        }
    }
}
