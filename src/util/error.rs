//! Error types for fouralign.

use thiserror::Error;

/// Result alias for fouralign operations.
pub type FourAlignResult<T> = std::result::Result<T, FourAlignError>;

/// Errors reported by the kernel entry points.
///
/// Validation happens once at the dispatch layer; the iteration skeletons
/// assume well-formed inputs after that.
#[derive(Debug, Error)]
pub enum FourAlignError {
    /// A buffer length does not match the geometry or counts it serves.
    #[error("size mismatch for {context}: needed {needed}, got {got}")]
    SizeMismatch {
        /// Required length.
        needed: usize,
        /// Supplied length.
        got: usize,
        /// Which buffer failed the check.
        context: &'static str,
    },
    /// Image extents or the radial cutoff are unusable.
    #[error("invalid geometry: {x_size}x{y_size}x{z_size}, max_r {max_r}")]
    InvalidGeometry {
        /// X extent in Fourier pixels.
        x_size: usize,
        /// Y extent in Fourier pixels.
        y_size: usize,
        /// Z extent in Fourier pixels (1 for 2D data).
        z_size: usize,
        /// Radial cutoff in Fourier pixels.
        max_r: usize,
    },
    /// The translation list is empty.
    #[error("translation list is empty")]
    EmptyTranslations,
    /// Translation component arrays disagree in length.
    #[error("translation axes disagree: x has {x_len}, {axis} has {got}")]
    TranslationAxisMismatch {
        /// Length of the x component array.
        x_len: usize,
        /// Length of the offending axis.
        got: usize,
        /// Name of the offending axis.
        axis: &'static str,
    },
    /// A job table entry points outside the buffers it indexes.
    #[error("job {job} out of bounds: {context}")]
    JobOutOfBounds {
        /// Index of the offending job.
        job: usize,
        /// Which reference went out of bounds.
        context: &'static str,
    },
}
