use fouralign::{
    cc_coarse, diff2_coarse, run_coarse, PixelGeometry, Projector, Rotation, ScoringMode,
    SliceRef, Translations,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Projector returning the same complex value everywhere.
struct ConstProjector {
    geom: PixelGeometry,
    value: (f32, f32),
}

impl Projector for ConstProjector {
    fn geometry(&self) -> PixelGeometry {
        self.geom
    }

    fn project_2d(&self, _x: i32, _y: i32, _rot: &Rotation) -> (f32, f32) {
        self.value
    }

    fn project_3d_from_2d(&self, _x: i32, _y: i32, _rot: &Rotation) -> (f32, f32) {
        self.value
    }

    fn project_3d(&self, _x: i32, _y: i32, _z: i32, _rot: &Rotation) -> (f32, f32) {
        self.value
    }
}

/// Projector whose output scales with the first rotation entry.
struct RotScaledProjector {
    geom: PixelGeometry,
}

impl Projector for RotScaledProjector {
    fn geometry(&self) -> PixelGeometry {
        self.geom
    }

    fn project_2d(&self, _x: i32, _y: i32, rot: &Rotation) -> (f32, f32) {
        (rot[0], 0.0)
    }

    fn project_3d_from_2d(&self, _x: i32, _y: i32, rot: &Rotation) -> (f32, f32) {
        (rot[0], 0.0)
    }

    fn project_3d(&self, _x: i32, _y: i32, _z: i32, rot: &Rotation) -> (f32, f32) {
        (rot[0], 0.0)
    }
}

fn identity_eulers(n: usize) -> Vec<f32> {
    let mut eulers = Vec::with_capacity(n * 9);
    for _ in 0..n {
        eulers.extend_from_slice(&[1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0]);
    }
    eulers
}

#[test]
fn unit_reference_against_zero_signal() {
    // 4x4 grid, one zero translation, unit weights: each cell holds
    // 0.5 * image_size * |1 + 0i|^2 = 8.
    let geom = PixelGeometry::new_2d(4, 4, 1);
    let proj = ConstProjector {
        geom,
        value: (1.0, 0.0),
    };
    let eulers = identity_eulers(8);
    let zeros = [0.0f32];
    let trans = Translations::new_2d(&zeros, &zeros);
    let signal = vec![0.0f32; 16];
    let corr = vec![1.0f32; 16];
    let mut out = vec![0.0f32; 8];

    diff2_coarse(&SliceRef(&proj), &eulers, trans, &signal, &signal, &corr, &mut out).unwrap();
    for &cell in &out {
        assert!((cell - 8.0).abs() < 1e-5, "cell {cell}");
    }
}

#[test]
fn matching_reference_scores_zero() {
    let geom = PixelGeometry::new_2d(4, 4, 1);
    let proj = ConstProjector {
        geom,
        value: (0.0, 0.0),
    };
    let eulers = identity_eulers(8);
    let zeros = [0.0f32];
    let trans = Translations::new_2d(&zeros, &zeros);
    let signal = vec![0.0f32; 16];
    let corr = vec![1.0f32; 16];
    let mut out = vec![0.0f32; 8];

    diff2_coarse(&SliceRef(&proj), &eulers, trans, &signal, &signal, &corr, &mut out).unwrap();
    for &cell in &out {
        assert_eq!(cell, 0.0);
    }
}

#[test]
fn output_is_an_accumulator() {
    let geom = PixelGeometry::new_2d(4, 4, 1);
    let proj = ConstProjector {
        geom,
        value: (1.0, 0.5),
    };
    let eulers = identity_eulers(8);
    let tx = [0.5f32, -1.0];
    let ty = [0.25f32, 0.75];
    let trans = Translations::new_2d(&tx, &ty);
    let mut rng = StdRng::seed_from_u64(7);
    let sig_re: Vec<f32> = (0..16).map(|_| rng.random_range(-1.0..1.0)).collect();
    let sig_im: Vec<f32> = (0..16).map(|_| rng.random_range(-1.0..1.0)).collect();
    let corr: Vec<f32> = (0..16).map(|_| rng.random_range(0.0..2.0)).collect();

    let mut once = vec![0.0f32; 16];
    diff2_coarse(&SliceRef(&proj), &eulers, trans, &sig_re, &sig_im, &corr, &mut once).unwrap();
    let mut twice = once.clone();
    diff2_coarse(&SliceRef(&proj), &eulers, trans, &sig_re, &sig_im, &corr, &mut twice).unwrap();

    for (a, b) in once.iter().zip(&twice) {
        assert!((b - 2.0 * a).abs() < 1e-4, "{b} vs 2 * {a}");
    }
}

#[test]
fn zero_translation_matches_direct_sum() {
    // With the identity shift every cell reduces to
    // 0.5 * sum_p corr[p] * |ref - sig|^2.
    let geom = PixelGeometry::new_2d(4, 4, 1);
    let value = (0.8, -0.3);
    let proj = ConstProjector { geom, value };
    let eulers = identity_eulers(8);
    let zeros = [0.0f32];
    let trans = Translations::new_2d(&zeros, &zeros);
    let mut rng = StdRng::seed_from_u64(21);
    let sig_re: Vec<f32> = (0..16).map(|_| rng.random_range(-1.0..1.0)).collect();
    let sig_im: Vec<f32> = (0..16).map(|_| rng.random_range(-1.0..1.0)).collect();
    let corr: Vec<f32> = (0..16).map(|_| rng.random_range(0.1..2.0)).collect();

    let mut expected = 0.0f32;
    for p in 0..16 {
        let dr = value.0 - sig_re[p];
        let di = value.1 - sig_im[p];
        expected += 0.5 * corr[p] * (dr * dr + di * di);
    }

    let mut out = vec![0.0f32; 8];
    diff2_coarse(&SliceRef(&proj), &eulers, trans, &sig_re, &sig_im, &corr, &mut out).unwrap();
    for &cell in &out {
        assert!((cell - expected).abs() < 1e-4, "{cell} vs {expected}");
    }
}

#[test]
fn translations_are_periodic_in_the_extents() {
    let geom = PixelGeometry::new_2d(8, 8, 3);
    let proj = ConstProjector {
        geom,
        value: (0.6, 0.2),
    };
    let eulers = identity_eulers(8);
    let mut rng = StdRng::seed_from_u64(5);
    let size = geom.image_size();
    let sig_re: Vec<f32> = (0..size).map(|_| rng.random_range(-1.0..1.0)).collect();
    let sig_im: Vec<f32> = (0..size).map(|_| rng.random_range(-1.0..1.0)).collect();
    let corr: Vec<f32> = (0..size).map(|_| rng.random_range(0.1..1.0)).collect();

    let tx = [0.5f32, -1.25, 2.0];
    let ty = [1.5f32, 0.75, -0.5];
    let tx_shifted: Vec<f32> = tx.iter().map(|t| t + 8.0).collect();
    let ty_shifted: Vec<f32> = ty.iter().map(|t| t + 8.0).collect();

    let mut base = vec![0.0f32; 8 * 3];
    diff2_coarse(
        &SliceRef(&proj),
        &eulers,
        Translations::new_2d(&tx, &ty),
        &sig_re,
        &sig_im,
        &corr,
        &mut base,
    )
    .unwrap();
    let mut shifted = vec![0.0f32; 8 * 3];
    diff2_coarse(
        &SliceRef(&proj),
        &eulers,
        Translations::new_2d(&tx_shifted, &ty_shifted),
        &sig_re,
        &sig_im,
        &corr,
        &mut shifted,
    )
    .unwrap();

    for (a, b) in base.iter().zip(&shifted) {
        // Large shifted phase arguments cost a few extra ulps per pixel.
        assert!((a - b).abs() < 5e-3 + 1e-4 * a.abs(), "{a} vs {b}");
    }
}

#[test]
fn aligned_cross_correlation_hits_minus_sqrt_image_size() {
    // Reference and signal both (1, 0): weight = norm = image_size, so the
    // score is -image_size / sqrt(image_size).
    let geom = PixelGeometry::new_2d(4, 4, 1);
    let proj = ConstProjector {
        geom,
        value: (1.0, 0.0),
    };
    let eulers = identity_eulers(3);
    let zeros = [0.0f32];
    let trans = Translations::new_2d(&zeros, &zeros);
    let sig_re = vec![1.0f32; 16];
    let sig_im = vec![0.0f32; 16];
    let corr = vec![1.0f32; 16];
    let mut out = vec![0.0f32; 3];

    cc_coarse(
        &SliceRef(&proj),
        &eulers,
        trans,
        &sig_re,
        &sig_im,
        &corr,
        &mut out,
        0.0,
    )
    .unwrap();
    for &cell in &out {
        assert!((cell + 4.0).abs() < 1e-5, "cell {cell}");
    }
}

#[test]
fn aligned_cross_correlation_is_nonpositive() {
    let geom = PixelGeometry::new_2d(8, 8, 3);
    let proj = ConstProjector {
        geom,
        value: (0.7, -0.4),
    };
    let eulers = identity_eulers(4);
    let mut rng = StdRng::seed_from_u64(99);
    let size = geom.image_size();
    // Signal equal to the reference keeps the inner product nonnegative.
    let sig_re = vec![0.7f32; size];
    let sig_im = vec![-0.4f32; size];
    let corr: Vec<f32> = (0..size).map(|_| rng.random_range(0.0..2.0)).collect();
    // Zero shifts keep the inner product nonnegative for matching inputs.
    let zeros = [0.0f32, 0.0];
    let trans = Translations::new_2d(&zeros, &zeros);
    let mut out = vec![0.0f32; 4 * 2];

    cc_coarse(
        &SliceRef(&proj),
        &eulers,
        trans,
        &sig_re,
        &sig_im,
        &corr,
        &mut out,
        0.0,
    )
    .unwrap();
    for &cell in &out {
        assert!(cell <= 0.0, "cell {cell}");
    }
}

#[test]
fn coarse_layout_is_block_euler_translation() {
    // Orientation e carries rot[0] = e, so its squared-difference row is
    // 0.5 * image_size * e^2 for the zero signal.
    let geom = PixelGeometry::new_2d(4, 4, 1);
    let proj = RotScaledProjector { geom };
    let mut eulers = vec![0.0f32; 16 * 9];
    for e in 0..16 {
        eulers[e * 9] = e as f32;
    }
    let tx = [0.0f32, 0.0];
    let ty = [0.0f32, 1.0];
    let trans = Translations::new_2d(&tx, &ty);
    let signal = vec![0.0f32; 16];
    let corr = vec![1.0f32; 16];
    let mut out = vec![0.0f32; 16 * 2];

    diff2_coarse(&SliceRef(&proj), &eulers, trans, &signal, &signal, &corr, &mut out).unwrap();
    for e in 0..16usize {
        let expected = 8.0 * (e * e) as f32;
        for t in 0..2 {
            let cell = out[e * 2 + t];
            assert!((cell - expected).abs() < 1e-3, "e {e} t {t}: {cell}");
        }
    }
}

#[test]
fn mode_dispatch_matches_direct_calls() {
    let geom = PixelGeometry::new_2d(4, 4, 1);
    let proj = ConstProjector {
        geom,
        value: (0.5, 0.5),
    };
    let eulers = identity_eulers(8);
    let tx = [0.0f32, 0.5];
    let ty = [0.5f32, 0.0];
    let trans = Translations::new_2d(&tx, &ty);
    let mut rng = StdRng::seed_from_u64(3);
    let sig_re: Vec<f32> = (0..16).map(|_| rng.random_range(-1.0..1.0)).collect();
    let sig_im: Vec<f32> = (0..16).map(|_| rng.random_range(-1.0..1.0)).collect();
    let corr = vec![1.0f32; 16];

    let mut direct = vec![0.0f32; 16];
    diff2_coarse(&SliceRef(&proj), &eulers, trans, &sig_re, &sig_im, &corr, &mut direct).unwrap();
    let mut routed = vec![0.0f32; 16];
    run_coarse(
        ScoringMode::SquaredDifference,
        &SliceRef(&proj),
        &eulers,
        trans,
        &sig_re,
        &sig_im,
        &corr,
        &mut routed,
    )
    .unwrap();
    assert_eq!(direct, routed);
}
