//! Fourier-domain alignment scoring kernels.
//!
//! fouralign implements the inner loop of a cryo-EM refinement cycle:
//! given a set of orientations (3x3 rotation matrices), a set of
//! translations, and a reference sampled through a [`Projector`], it
//! scores every requested (orientation, translation) pair against an
//! observed Fourier-domain image. Scores are either a weighted squared
//! difference or a normalized cross-correlation, over either a dense
//! coarse grid or a sparse fine job list.
//!
//! The kernels are pure accumulators: they add into a caller-owned output
//! buffer, touch only their arguments, and allocate only bounded
//! call-local scratch, so a driver may run any number of invocations in
//! parallel. Optional cargo features: `simd` (wide-vectorized inner
//! loops), `rayon` (block-parallel drivers in [`kernel::par`]), `tracing`
//! (spans around kernel entry points), and `serde` (derives on the
//! parameter types).

pub mod geometry;
pub mod kernel;
pub mod projector;
pub mod sincos;
pub mod util;

mod trace;

pub use geometry::{wrap_span, PixelGeometry, RowSpan};
pub use kernel::{
    cc_coarse, cc_fine, coarse_with_shape, diff2_coarse, diff2_fine, run_coarse, run_fine, CcAcc,
    CrossCorrelation, JobTable, ScoreMetric, ScoringMode, SquaredDifference, Translations,
    DEFAULT_BLOCK, DEFAULT_EULERS_PER_BLOCK,
};
pub use projector::{
    FourierModel, GridProjector, PlaneRef, Projector, ReferenceSampler, Rotation, SliceRef,
    VolumeRef,
};
pub use sincos::PhaseTable;
pub use util::{FourAlignError, FourAlignResult};
