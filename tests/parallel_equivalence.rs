#![cfg(feature = "rayon")]

use fouralign::kernel::par::{cc_coarse_par, cc_fine_par, diff2_coarse_par, diff2_fine_par};
use fouralign::{
    cc_coarse, cc_fine, diff2_coarse, diff2_fine, JobTable, PixelGeometry, Projector, Rotation,
    SliceRef, Translations,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Projector mixing coordinates and rotation entries deterministically.
struct MixProjector {
    geom: PixelGeometry,
}

impl MixProjector {
    fn mix(&self, x: i32, y: i32, z: i32, rot: &Rotation) -> (f32, f32) {
        let re = rot[0] * x as f32 + rot[4] * y as f32 + rot[8] * z as f32;
        let im = rot[1] * x as f32 - rot[3] * y as f32;
        (0.1 * re, 0.05 * im)
    }
}

impl Projector for MixProjector {
    fn geometry(&self) -> PixelGeometry {
        self.geom
    }

    fn project_2d(&self, x: i32, y: i32, rot: &Rotation) -> (f32, f32) {
        self.mix(x, y, 0, rot)
    }

    fn project_3d_from_2d(&self, x: i32, y: i32, rot: &Rotation) -> (f32, f32) {
        self.mix(x, y, 0, rot)
    }

    fn project_3d(&self, x: i32, y: i32, z: i32, rot: &Rotation) -> (f32, f32) {
        self.mix(x, y, z, rot)
    }
}

struct Inputs {
    eulers: Vec<f32>,
    tx: Vec<f32>,
    ty: Vec<f32>,
    sig_re: Vec<f32>,
    sig_im: Vec<f32>,
    corr: Vec<f32>,
}

fn random_inputs(orientations: usize, translations: usize, size: usize, seed: u64) -> Inputs {
    let mut rng = StdRng::seed_from_u64(seed);
    Inputs {
        eulers: (0..orientations * 9).map(|_| rng.random_range(-1.0..1.0)).collect(),
        tx: (0..translations).map(|_| rng.random_range(-2.0..2.0)).collect(),
        ty: (0..translations).map(|_| rng.random_range(-2.0..2.0)).collect(),
        sig_re: (0..size).map(|_| rng.random_range(-1.0..1.0)).collect(),
        sig_im: (0..size).map(|_| rng.random_range(-1.0..1.0)).collect(),
        corr: (0..size).map(|_| rng.random_range(0.1..2.0)).collect(),
    }
}

#[test]
fn parallel_diff2_coarse_is_bitwise_equal() {
    let geom = PixelGeometry::new_2d(16, 16, 7);
    let proj = MixProjector { geom };
    let inputs = random_inputs(24, 5, geom.image_size(), 101);
    let trans = Translations::new_2d(&inputs.tx, &inputs.ty);

    let mut serial = vec![0.0f32; 24 * 5];
    diff2_coarse(
        &SliceRef(&proj),
        &inputs.eulers,
        trans,
        &inputs.sig_re,
        &inputs.sig_im,
        &inputs.corr,
        &mut serial,
    )
    .unwrap();
    let mut parallel = vec![0.0f32; 24 * 5];
    diff2_coarse_par(
        &SliceRef(&proj),
        &inputs.eulers,
        trans,
        &inputs.sig_re,
        &inputs.sig_im,
        &inputs.corr,
        &mut parallel,
    )
    .unwrap();

    assert_eq!(serial, parallel);
}

#[test]
fn parallel_cc_coarse_is_bitwise_equal() {
    let geom = PixelGeometry::new_2d(16, 16, 7);
    let proj = MixProjector { geom };
    let inputs = random_inputs(6, 4, geom.image_size(), 77);
    let trans = Translations::new_2d(&inputs.tx, &inputs.ty);

    let mut serial = vec![0.0f32; 6 * 4];
    cc_coarse(
        &SliceRef(&proj),
        &inputs.eulers,
        trans,
        &inputs.sig_re,
        &inputs.sig_im,
        &inputs.corr,
        &mut serial,
        0.0,
    )
    .unwrap();
    let mut parallel = vec![0.0f32; 6 * 4];
    cc_coarse_par(
        &SliceRef(&proj),
        &inputs.eulers,
        trans,
        &inputs.sig_re,
        &inputs.sig_im,
        &inputs.corr,
        &mut parallel,
        0.0,
    )
    .unwrap();

    assert_eq!(serial, parallel);
}

#[test]
fn parallel_diff2_fine_is_bitwise_equal() {
    let geom = PixelGeometry::new_2d(16, 16, 7);
    let proj = MixProjector { geom };
    let inputs = random_inputs(3, 6, geom.image_size(), 55);
    let trans = Translations::new_2d(&inputs.tx, &inputs.ty);
    let jobs = JobTable {
        rot_idx: &[0, 0, 1, 1, 1, 2],
        trans_idx: &[0, 1, 0, 1, 2, 3],
        job_idx: &[0, 2, 5],
        job_num: &[2, 3, 1],
    };

    let mut serial = vec![0.0f32; 6];
    diff2_fine(
        &SliceRef(&proj),
        &inputs.eulers,
        trans,
        &inputs.sig_re,
        &inputs.sig_im,
        &inputs.corr,
        &mut serial,
        0.5,
        &jobs,
    )
    .unwrap();
    let mut parallel = vec![0.0f32; 6];
    diff2_fine_par(
        &SliceRef(&proj),
        &inputs.eulers,
        trans,
        &inputs.sig_re,
        &inputs.sig_im,
        &inputs.corr,
        &mut parallel,
        0.5,
        &jobs,
    )
    .unwrap();

    assert_eq!(serial, parallel);
}

#[test]
fn parallel_cc_fine_is_bitwise_equal() {
    let geom = PixelGeometry::new_2d(16, 16, 7);
    let proj = MixProjector { geom };
    let inputs = random_inputs(3, 6, geom.image_size(), 89);
    let trans = Translations::new_2d(&inputs.tx, &inputs.ty);
    let jobs = JobTable {
        rot_idx: &[0, 0, 1, 1, 1, 2],
        trans_idx: &[0, 1, 0, 1, 2, 3],
        job_idx: &[0, 2, 5],
        job_num: &[2, 3, 1],
    };

    let mut serial = vec![0.0f32; 6];
    cc_fine(
        &SliceRef(&proj),
        &inputs.eulers,
        trans,
        &inputs.sig_re,
        &inputs.sig_im,
        &inputs.corr,
        &mut serial,
        0.5,
        0.25,
        &jobs,
    )
    .unwrap();
    let mut parallel = vec![0.0f32; 6];
    cc_fine_par(
        &SliceRef(&proj),
        &inputs.eulers,
        trans,
        &inputs.sig_re,
        &inputs.sig_im,
        &inputs.corr,
        &mut parallel,
        0.5,
        0.25,
        &jobs,
    )
    .unwrap();

    assert_eq!(serial, parallel);
}
