use crate::bounds::{BoundingBox, Domain};

/// Periodic images of the domain.
///
/// On a periodic axis a site is represented by its canonical position in `[min, max)` and by
/// images shifted by whole periods. Images are addressed by an integer offset per axis, which
/// is always zero on non-periodic axes. Adjacency is always reported against the canonical
/// site index, so images never leak into the output.
#[derive(Clone, Copy, Debug)]
pub struct Periodicity {
    pub periodic: [bool; 3],
    pub min: [f64; 3],
    pub max: [f64; 3],
    pub lengths: [f64; 3],
}

impl Periodicity {
    pub fn new(domain: &Domain) -> Self {
        Periodicity {
            periodic: domain.periodic,
            min: domain.bounds.min,
            max: domain.bounds.max,
            lengths: domain.lengths(),
        }
    }

    pub fn any(&self) -> bool {
        self.periodic.iter().any(|&p| p)
    }

    /// Maps a position into the canonical box along every periodic axis.
    pub fn wrap(&self, position: [f64; 3]) -> [f64; 3] {
        let mut out = position;
        for axis in 0..3 {
            if !self.periodic[axis] {
                continue;
            }
            let mut x = self.min[axis] + (position[axis] - self.min[axis]).rem_euclid(self.lengths[axis]);
            // rem_euclid may round up to exactly one period
            if x >= self.max[axis] {
                x = self.min[axis];
            }
            out[axis] = x;
        }
        out
    }

    /// Whether the position lies inside the box along every non-periodic axis.
    pub fn contains(&self, position: &[f64; 3]) -> bool {
        (0..3).all(|axis| {
            self.periodic[axis] || (position[axis] >= self.min[axis] && position[axis] <= self.max[axis])
        })
    }

    /// Translation vector of the image with the given period offsets.
    #[inline]
    pub fn shift(&self, image: [i32; 3]) -> [f64; 3] {
        [
            image[0] as f64 * self.lengths[0],
            image[1] as f64 * self.lengths[1],
            image[2] as f64 * self.lengths[2],
        ]
    }

    /// The starting polytope for a site at `position`.
    ///
    /// Non-periodic axes are bounded by the box walls. Periodic axes get a provisional slab of
    /// one period on either side, which the site's own images always cut back to half a period.
    pub fn initial_bounds(&self, position: &[f64; 3]) -> BoundingBox<3> {
        let mut min = self.min;
        let mut max = self.max;
        for axis in 0..3 {
            if self.periodic[axis] {
                min[axis] = position[axis] - self.lengths[axis];
                max[axis] = position[axis] + self.lengths[axis];
            }
        }
        BoundingBox::new(min, max)
    }

    /// Upper bound on the distance from a site to any vertex of its finished cell.
    ///
    /// Along a non-periodic axis the cell stays inside the box; along a periodic axis the site's
    /// own images confine it to half a period.
    pub fn max_cell_radius(&self) -> f64 {
        (0..3)
            .map(|axis| {
                let extent = if self.periodic[axis] {
                    0.5 * self.lengths[axis]
                } else {
                    self.lengths[axis]
                };
                extent * extent
            })
            .sum::<f64>()
            .sqrt()
    }

    /// Radius beyond which a non-periodic domain holds no further candidates.
    pub fn covered_radius(&self) -> Option<f64> {
        if self.any() {
            return None;
        }
        Some(self.lengths.iter().map(|l| l * l).sum::<f64>().sqrt())
    }
}
