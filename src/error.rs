use thiserror::Error;

/// Errors raised while validating input or building cells.
///
/// Validation errors (`InvalidDomain`, `InvalidInput`) are raised before any cell is built.
/// The geometric kinds carry the index of the site they belong to.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum TessellationError {
    /// The box is empty or inverted along an axis, or the dispersion is not positive.
    #[error("invalid domain on axis {axis}: {reason}")]
    InvalidDomain {
        /// Offending axis (0 = x, 1 = y, 2 = z); `usize::MAX` for non-axis problems.
        axis: usize,
        /// Human readable reason.
        reason: String,
    },

    /// Input shapes or values do not match the expected dimensionality.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Coincident sites, a zero-length bisector normal, or a cut that could not be resolved.
    #[error("degenerate geometry at site {site}: {reason}")]
    DegenerateGeometry {
        /// Index of the site whose cell could not be built.
        site: usize,
        /// Human readable reason.
        reason: String,
    },

    /// The neighbor search gave up before the termination bound was met.
    #[error("cell of site {site} may be incomplete: search stopped at radius {radius} but bound was {bound}")]
    IncompleteCell {
        /// Index of the affected site.
        site: usize,
        /// Outer radius of the last processed shell.
        radius: f64,
        /// Search radius still required to prove the cell complete.
        bound: f64,
    },

    /// A cell of the 2D slab pass is not a prism between the two z walls.
    #[error("cell of site {site} is not a prism: {reason}")]
    NonPrismaticCell {
        /// Index of the affected site.
        site: usize,
        /// Human readable reason.
        reason: String,
    },
}

impl TessellationError {
    /// Index of the site the error is attributed to, if any.
    pub fn site(&self) -> Option<usize> {
        match self {
            TessellationError::DegenerateGeometry { site, .. }
            | TessellationError::IncompleteCell { site, .. }
            | TessellationError::NonPrismaticCell { site, .. } => Some(*site),
            _ => None,
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TessellationError>;
