use crate::error::{Result, TessellationError};
use serde::{Deserialize, Serialize};

/// Generic bounding box for N-dimensional space.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox<const D: usize> {
    #[serde(with = "serde_array")]
    pub min: [f64; D],
    #[serde(with = "serde_array")]
    pub max: [f64; D],
}

impl<const D: usize> BoundingBox<D> {
    pub fn new(min: [f64; D], max: [f64; D]) -> Self {
        Self { min, max }
    }

    /// Builds a box from `[min, max]` pairs, one per axis.
    pub fn from_limits(limits: &[[f64; 2]]) -> Result<Self> {
        if limits.len() != D {
            return Err(TessellationError::InvalidInput(format!(
                "expected {} [min, max] limit pairs, got {}",
                D,
                limits.len()
            )));
        }
        let mut min = [0.0; D];
        let mut max = [0.0; D];
        for (axis, pair) in limits.iter().enumerate() {
            min[axis] = pair[0];
            max[axis] = pair[1];
        }
        Ok(Self { min, max })
    }

    /// Extent along each axis.
    pub fn lengths(&self) -> [f64; D] {
        let mut out = [0.0; D];
        for axis in 0..D {
            out[axis] = self.max[axis] - self.min[axis];
        }
        out
    }

    /// Product of the axis extents.
    pub fn volume(&self) -> f64 {
        self.lengths().iter().product()
    }

    /// Checks that every axis has finite bounds with `min < max`.
    pub fn validate(&self) -> Result<()> {
        for axis in 0..D {
            let (lo, hi) = (self.min[axis], self.max[axis]);
            if !lo.is_finite() || !hi.is_finite() {
                return Err(TessellationError::InvalidDomain {
                    axis,
                    reason: format!("bounds [{}, {}] are not finite", lo, hi),
                });
            }
            if lo >= hi {
                return Err(TessellationError::InvalidDomain {
                    axis,
                    reason: format!("min {} must be smaller than max {}", lo, hi),
                });
            }
        }
        Ok(())
    }
}

/// Wall sentinels of the bounding box, numbered in the fixed order `[x-, x+, y-, y+, z-, z+]`.
///
/// The ids are negative so they never collide with site indices. The 2D front end relies on
/// `ZMin` and `ZMax` to find the two slab walls of every cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum BoxSide {
    XMin = -1,
    XMax = -2,
    YMin = -3,
    YMax = -4,
    ZMin = -5,
    ZMax = -6,
}

impl BoxSide {
    pub const ALL: [BoxSide; 6] = [
        BoxSide::XMin,
        BoxSide::XMax,
        BoxSide::YMin,
        BoxSide::YMax,
        BoxSide::ZMin,
        BoxSide::ZMax,
    ];

    /// The side for the given axis and direction.
    pub fn new(axis: usize, is_max: bool) -> BoxSide {
        BoxSide::ALL[axis * 2 + usize::from(is_max)]
    }

    /// The face id reported in [`crate::Face::adjacent_cell`].
    pub fn id(self) -> i32 {
        self as i32
    }

    /// Maps a face id back to a box side, if it is one.
    pub fn from_id(id: i32) -> Option<BoxSide> {
        BoxSide::ALL.iter().copied().find(|side| side.id() == id)
    }

    pub fn axis(self) -> usize {
        (-1 - self.id()) as usize / 2
    }

    pub fn is_max(self) -> bool {
        (-1 - self.id()) % 2 == 1
    }
}

/// The region being tessellated: an axis-aligned box, per-axis periodicity and the
/// expected neighbor distance used to size the spatial index.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    pub bounds: BoundingBox<3>,
    pub periodic: [bool; 3],
    /// Expected maximum distance between adjacent sites. Only affects performance.
    pub dispersion: f64,
}

impl Domain {
    /// Creates a non-periodic domain and validates it.
    pub fn new(bounds: BoundingBox<3>, dispersion: f64) -> Result<Self> {
        let domain = Domain {
            bounds,
            periodic: [false; 3],
            dispersion,
        };
        domain.validate()?;
        Ok(domain)
    }

    /// Sets the periodicity flags.
    pub fn with_periodic(mut self, periodic: [bool; 3]) -> Self {
        self.periodic = periodic;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.bounds.validate()?;
        if !(self.dispersion.is_finite() && self.dispersion > 0.0) {
            return Err(TessellationError::InvalidDomain {
                axis: usize::MAX,
                reason: format!("dispersion must be positive, got {}", self.dispersion),
            });
        }
        Ok(())
    }

    pub fn lengths(&self) -> [f64; 3] {
        self.bounds.lengths()
    }

    pub fn is_periodic(&self) -> bool {
        self.periodic.iter().any(|&p| p)
    }
}

/// serde has no blanket impl for const-generic arrays.
mod serde_array {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer, const D: usize>(value: &[f64; D], serializer: S) -> Result<S::Ok, S::Error> {
        value.as_slice().serialize(serializer)
    }

    pub fn deserialize<'de, De: Deserializer<'de>, const D: usize>(deserializer: De) -> Result<[f64; D], De::Error> {
        let values = Vec::<f64>::deserialize(deserializer)?;
        let len = values.len();
        values
            .try_into()
            .map_err(|_| De::Error::custom(format!("expected {} coordinates, got {}", D, len)))
    }
}
