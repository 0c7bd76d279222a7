//! Dense coarse-search skeleton.
//!
//! Scores every orientation block against every translation over all
//! pixels. Pixels are walked in `BLOCK`-sized tiles with `EPB`
//! orientations cached per block, so each projected reference tile is
//! reused across the whole translation list. Pixel coordinates, signal
//! samples, and staged weights are resolved once up front; the inner loop
//! is (translation) x (orientation) x (pixel span), with pixels innermost
//! for vectorization.

use crate::kernel::{rows, ScoreMetric, Translations};
use crate::projector::{ReferenceSampler, Rotation};
use crate::sincos::PhaseTable;

pub(crate) fn run<M, S, const BLOCK: usize, const EPB: usize>(
    sampler: &S,
    eulers: &[f32],
    trans: Translations<'_>,
    sig_re: &[f32],
    sig_im: &[f32],
    corr: &[f32],
    out: &mut [f32],
) where
    M: ScoreMetric,
    S: ReferenceSampler,
{
    let geom = sampler.geometry();
    let image_size = geom.image_size();
    let trans_num = trans.len();
    let grid_size = eulers.len() / (9 * EPB);
    let data3d = geom.is_3d();
    let pass_num = image_size.div_ceil(BLOCK);

    // Phase tables over the full translation list.
    let mut tab_x = PhaseTable::new(trans_num, geom.x_size);
    tab_x.fill(trans.x);
    let mut tab_y = PhaseTable::new(trans_num, geom.y_size);
    tab_y.fill(trans.y);
    let tab_z = data3d.then(|| {
        let mut tab = PhaseTable::new(trans_num, geom.z_size);
        tab.fill(trans.z);
        tab
    });

    // Resolve coordinates and stage signal and weights once; tiles are
    // contiguous so linear pixel index doubles as the staging index.
    let mut px = vec![0i32; pass_num * BLOCK];
    let mut py = vec![0i32; pass_num * BLOCK];
    let mut pz = vec![0i32; pass_num * BLOCK];
    let mut s_re = vec![0.0f32; pass_num * BLOCK];
    let mut s_im = vec![0.0f32; pass_num * BLOCK];
    let mut s_w = vec![0.0f32; pass_num * BLOCK];
    for pixel in 0..image_size {
        let (x, y, z) = geom.coords_at(pixel);
        px[pixel] = x;
        py[pixel] = y;
        pz[pixel] = z;
        s_re[pixel] = sig_re[pixel];
        s_im[pixel] = sig_im[pixel];
        s_w[pixel] = M::coarse_weight(corr[pixel]);
    }

    // Per-block scratch; euler rows use a 16-entry stride, the tail of
    // each row is never read.
    let mut block_eulers = [[0.0f32; 16]; EPB];
    let mut ref_re = [[0.0f32; BLOCK]; EPB];
    let mut ref_im = [[0.0f32; BLOCK]; EPB];
    let mut sh_re = [0.0f32; BLOCK];
    let mut sh_im = [0.0f32; BLOCK];
    let mut t_sin_x = [0.0f32; BLOCK];
    let mut t_cos_x = [0.0f32; BLOCK];
    let mut t_sin_y = [0.0f32; BLOCK];
    let mut t_cos_y = [0.0f32; BLOCK];
    let mut t_sin_z = [0.0f32; BLOCK];
    let mut t_cos_z = [0.0f32; BLOCK];
    let mut scores: Vec<[M::Acc; EPB]> = vec![[M::Acc::default(); EPB]; trans_num];

    for block in 0..grid_size {
        for e in 0..EPB {
            let src = (block * EPB + e) * 9;
            block_eulers[e][..9].copy_from_slice(&eulers[src..src + 9]);
        }
        for acc in scores.iter_mut() {
            *acc = [M::Acc::default(); EPB];
        }

        for pass in 0..pass_num {
            let start = pass * BLOCK;
            let len = BLOCK.min(image_size - start);

            for e in 0..EPB {
                let rot: &Rotation = block_eulers[e][..9]
                    .try_into()
                    .expect("euler scratch row holds a full rotation");
                for tid in 0..len {
                    let p = start + tid;
                    let (re, im) = sampler.sample(px[p], py[p], pz[p], rot);
                    ref_re[e][tid] = re;
                    ref_im[e][tid] = im;
                }
            }

            for i in 0..trans_num {
                for tid in 0..len {
                    let p = start + tid;
                    let (sx, cx) = tab_x.at(i, px[p]);
                    t_sin_x[tid] = sx;
                    t_cos_x[tid] = cx;
                    let (sy, cy) = tab_y.at(i, py[p]);
                    t_sin_y[tid] = sy;
                    t_cos_y[tid] = cy;
                }
                if let Some(tab_z) = &tab_z {
                    for tid in 0..len {
                        let (sz, cz) = tab_z.at(i, pz[start + tid]);
                        t_sin_z[tid] = sz;
                        t_cos_z[tid] = cz;
                    }
                    rows::shift_tile_3d(
                        &t_sin_x[..len],
                        &t_cos_x[..len],
                        &t_sin_y[..len],
                        &t_cos_y[..len],
                        &t_sin_z[..len],
                        &t_cos_z[..len],
                        &s_re[start..start + len],
                        &s_im[start..start + len],
                        &mut sh_re[..len],
                        &mut sh_im[..len],
                    );
                } else {
                    rows::shift_tile_2d(
                        &t_sin_x[..len],
                        &t_cos_x[..len],
                        &t_sin_y[..len],
                        &t_cos_y[..len],
                        &s_re[start..start + len],
                        &s_im[start..start + len],
                        &mut sh_re[..len],
                        &mut sh_im[..len],
                    );
                }

                let weights = &s_w[start..start + len];
                for e in 0..EPB {
                    let span = M::accumulate_span(
                        &ref_re[e][..len],
                        &ref_im[e][..len],
                        &sh_re[..len],
                        &sh_im[..len],
                        weights,
                    );
                    scores[i][e] += span;
                }
            }
        }

        let out_base = block * EPB * trans_num;
        for e in 0..EPB {
            for (i, acc) in scores.iter().enumerate() {
                out[out_base + e * trans_num + i] += M::finalize(acc[e], 0.0);
            }
        }
    }
}
