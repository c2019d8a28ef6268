use crate::error::{Result, TessellationError};
use serde::{Deserialize, Serialize};

/// Tuning knobs of the tessellation engine.
///
/// None of these affect which cells are produced for well-conditioned input, only how
/// robustly near-degenerate cuts are classified and how the neighbor search grows.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Plane-side tolerance relative to the distance between the two sites of a cut. Vertices
    /// closer than this to the cutting plane are treated as lying on it. A floor at the
    /// round-off of the box coordinates is always added.
    pub tolerance: f64,
    /// Factor by which the outer radius of the search shell grows after each shell.
    pub shell_growth: f64,
    /// Number of shells after which the search gives up and reports an incomplete cell.
    pub max_shells: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            tolerance: 1e-10,
            shell_growth: 2.0,
            max_shells: 256,
        }
    }
}

impl Settings {
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_shell_growth(mut self, shell_growth: f64) -> Self {
        self.shell_growth = shell_growth;
        self
    }

    pub fn with_max_shells(mut self, max_shells: usize) -> Self {
        self.max_shells = max_shells;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.tolerance.is_finite() && self.tolerance >= 0.0) {
            return Err(TessellationError::InvalidInput(format!(
                "tolerance must be a non-negative number, got {}",
                self.tolerance
            )));
        }
        if !(self.shell_growth.is_finite() && self.shell_growth > 1.0) {
            return Err(TessellationError::InvalidInput(format!(
                "shell growth must be larger than 1, got {}",
                self.shell_growth
            )));
        }
        if self.max_shells == 0 {
            return Err(TessellationError::InvalidInput("max_shells must be at least 1".into()));
        }
        Ok(())
    }
}
