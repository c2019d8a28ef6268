use crate::bounds::Domain;
use crate::periodic::Periodicity;
use crate::tessellation::{Candidate, SpatialAlgorithm};

/// A spatial index based on a uniform grid of blocks.
///
/// This structure divides the box into a fixed number of blocks per axis and stores the
/// indices of the sites falling into each block. Shell queries walk every block that can
/// intersect the requested spherical shell. Along periodic axes the block index wraps around,
/// and blocks reached through the wrap report their sites shifted by whole periods.
#[derive(Clone, Debug)]
pub struct AlgorithmGrid {
    /// Number of blocks along each axis.
    pub grid_res: [usize; 3],
    /// Scale factor from coordinate to block index along each axis.
    pub grid_scale: [f64; 3],
    /// Maximum valid (fractional) block index along each axis.
    pub grid_limit: [f64; 3],
    /// Edge length of a block along each axis.
    pub block_size: [f64; 3],
    /// Minimum corner of the grid.
    pub min: [f64; 3],
    /// Periodic axes and periods, used to wrap block indices and shift images.
    pub periodicity: Periodicity,
    /// The blocks, each containing a list of site indices.
    pub grid_bins: Vec<Vec<usize>>,
}

impl AlgorithmGrid {
    /// Upper limit on the number of blocks, whatever the dispersion.
    pub const MAX_BLOCKS: usize = 1 << 21;

    /// Creates a new `AlgorithmGrid` with the specified number of blocks per axis.
    pub fn new(nx: usize, ny: usize, nz: usize, domain: &Domain) -> Self {
        let grid_res = [nx.max(1), ny.max(1), nz.max(1)];
        let lengths = domain.lengths();
        let mut grid_scale = [0.0; 3];
        let mut grid_limit = [0.0; 3];
        let mut block_size = [0.0; 3];
        for axis in 0..3 {
            grid_scale[axis] = grid_res[axis] as f64 / lengths[axis];
            grid_limit[axis] = grid_res[axis] as f64 - 1e-5;
            block_size[axis] = lengths[axis] / grid_res[axis] as f64;
        }

        AlgorithmGrid {
            grid_res,
            grid_scale,
            grid_limit,
            block_size,
            min: domain.bounds.min,
            periodicity: Periodicity::new(domain),
            grid_bins: vec![Vec::new(); grid_res[0] * grid_res[1] * grid_res[2]],
        }
    }

    /// Sizes the blocks from the domain's dispersion, so that a block is about as wide as the
    /// distance between neighboring sites.
    ///
    /// The block count is capped relative to the number of sites, which keeps a badly chosen
    /// dispersion from exhausting memory; it only changes how many sites a block holds.
    pub fn from_dispersion(domain: &Domain, site_count: usize) -> Self {
        let lengths = domain.lengths();
        let mut res = [1usize; 3];
        for axis in 0..3 {
            let n = (lengths[axis] / domain.dispersion).ceil();
            res[axis] = if n.is_finite() { n.clamp(1.0, 1024.0) as usize } else { 1 };
        }

        let cap = (16 * site_count).clamp(1, Self::MAX_BLOCKS);
        while res[0] * res[1] * res[2] > cap {
            let widest = (0..3).max_by_key(|&axis| res[axis]).unwrap_or(0);
            res[widest] = res[widest].div_ceil(2);
        }

        Self::new(res[0], res[1], res[2], domain)
    }

    /// Calculates the linear index of the block containing the given coordinates.
    pub fn get_bin_index(&self, pos: &[f64; 3]) -> usize {
        let [nx, ny, _] = self.grid_res;
        let mut idx = [0usize; 3];
        for axis in 0..3 {
            idx[axis] = ((pos[axis] - self.min[axis]) * self.grid_scale[axis]).clamp(0.0, self.grid_limit[axis]) as usize;
        }
        idx[0] + idx[1] * nx + idx[2] * nx * ny
    }

    pub fn total_bins(&self) -> usize {
        self.grid_bins.len()
    }

    /// Inclusive range of raw block indices along `axis` touched by `[lo, hi]`.
    ///
    /// Returns `None` when a non-periodic axis is missed entirely.
    fn block_range(&self, axis: usize, lo: f64, hi: f64) -> Option<(i64, i64)> {
        let scale = self.grid_scale[axis];
        let mut first = ((lo - self.min[axis]) * scale).floor() as i64;
        let mut last = ((hi - self.min[axis]) * scale).floor() as i64;
        if !self.periodicity.periodic[axis] {
            let n = self.grid_res[axis] as i64;
            first = first.max(0);
            last = last.min(n - 1);
            if first > last {
                return None;
            }
        }
        Some((first, last))
    }

    /// Nearest and farthest distance along `axis` from `c` to raw block `b`.
    #[inline]
    fn axis_span(&self, axis: usize, b: i64, c: f64) -> (f64, f64) {
        let size = self.block_size[axis];
        // Sites binned through the clamp may sit a hair outside their block.
        let pad = 1e-7 * size;
        let lower = self.min[axis] + b as f64 * size - pad;
        let upper = lower + size + 2.0 * pad;
        let near = (lower - c).max(c - upper).max(0.0);
        let far = (c - lower).abs().max((upper - c).abs());
        (near, far)
    }
}

impl SpatialAlgorithm for AlgorithmGrid {
    fn set_generators(&mut self, generators: &[[f64; 3]]) {
        self.grid_bins.iter_mut().for_each(|bin| bin.clear());
        for (i, pos) in generators.iter().enumerate() {
            let bin_idx = self.get_bin_index(pos);
            self.grid_bins[bin_idx].push(i);
        }
    }

    fn visit_shell<F>(
        &self,
        generators: &[[f64; 3]],
        index: usize,
        center: [f64; 3],
        r_inner: f64,
        r_outer: f64,
        mut visitor: F,
    ) where
        F: FnMut(Candidate),
    {
        let inner_sq = r_inner * r_inner;
        let outer_sq = r_outer * r_outer;

        let mut ranges = [(0i64, 0i64); 3];
        for axis in 0..3 {
            match self.block_range(axis, center[axis] - r_outer, center[axis] + r_outer) {
                Some(range) => ranges[axis] = range,
                None => return,
            }
        }

        let [nx, ny, nz] = self.grid_res.map(|n| n as i64);

        for bz in ranges[2].0..=ranges[2].1 {
            let (near_z, far_z) = self.axis_span(2, bz, center[2]);
            let near_z2 = near_z * near_z;
            if near_z2 >= outer_sq {
                continue;
            }
            for by in ranges[1].0..=ranges[1].1 {
                let (near_y, far_y) = self.axis_span(1, by, center[1]);
                let near_yz2 = near_z2 + near_y * near_y;
                if near_yz2 >= outer_sq {
                    continue;
                }
                for bx in ranges[0].0..=ranges[0].1 {
                    let (near_x, far_x) = self.axis_span(0, bx, center[0]);
                    if near_yz2 + near_x * near_x >= outer_sq {
                        continue;
                    }
                    if far_x * far_x + far_y * far_y + far_z * far_z < inner_sq {
                        continue;
                    }

                    let image = [
                        bx.div_euclid(nx) as i32,
                        by.div_euclid(ny) as i32,
                        bz.div_euclid(nz) as i32,
                    ];
                    let bin_index = (bx.rem_euclid(nx) + by.rem_euclid(ny) * nx + bz.rem_euclid(nz) * nx * ny) as usize;
                    let shift = self.periodicity.shift(image);
                    let is_home = image == [0, 0, 0];

                    for &j in &self.grid_bins[bin_index] {
                        if is_home && j == index {
                            continue;
                        }
                        let p = generators[j];
                        let position = [p[0] + shift[0], p[1] + shift[1], p[2] + shift[2]];
                        let dx = position[0] - center[0];
                        let dy = position[1] - center[1];
                        let dz = position[2] - center[2];
                        let dist_sq = dx * dx + dy * dy + dz * dz;
                        if dist_sq >= inner_sq && dist_sq < outer_sq {
                            visitor(Candidate {
                                index: j,
                                position,
                                dist_sq,
                                image,
                            });
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::BoundingBox;

    fn domain(periodic: [bool; 3]) -> Domain {
        Domain::new(BoundingBox::new([0.0; 3], [10.0; 3]), 1.0)
            .unwrap()
            .with_periodic(periodic)
    }

    #[test]
    fn test_grid_binning_indices() {
        let grid = AlgorithmGrid::new(10, 10, 10, &domain([false; 3]));

        // Point at (0.5, 0.5, 0.5) should be in the first block (0,0,0) -> index 0
        assert_eq!(grid.get_bin_index(&[0.5, 0.5, 0.5]), 0);
        // Index = x + y*nx + z*nx*ny
        assert_eq!(grid.get_bin_index(&[1.5, 0.5, 0.5]), 1);
        assert_eq!(grid.get_bin_index(&[0.5, 1.5, 0.5]), 10);
        assert_eq!(grid.get_bin_index(&[0.5, 0.5, 1.5]), 100);
        // The upper boundary belongs to the last block
        assert_eq!(grid.get_bin_index(&[10.0, 10.0, 10.0]), 999);
    }

    #[test]
    fn test_dispersion_sizing_is_capped() {
        let d = domain([false; 3]);
        let grid = AlgorithmGrid::from_dispersion(&d, 1000);
        assert_eq!(grid.grid_res, [10, 10, 10]);

        let tiny = Domain { dispersion: 1e-9, ..d };
        let grid = AlgorithmGrid::from_dispersion(&tiny, 2);
        assert!(grid.total_bins() <= 32);
        assert!(grid.total_bins() >= 1);
    }

    #[test]
    fn test_shell_query_reports_each_site_once() {
        let d = domain([false; 3]);
        let mut grid = AlgorithmGrid::new(5, 5, 5, &d);
        let generators = vec![[1.0, 1.0, 1.0], [2.0, 1.0, 1.0], [4.0, 1.0, 1.0], [9.0, 9.0, 9.0]];
        grid.set_generators(&generators);

        let mut first = Vec::new();
        grid.visit_shell(&generators, 0, generators[0], 0.0, 2.5, |c| first.push(c.index));
        first.sort();
        assert_eq!(first, vec![1]);

        let mut second = Vec::new();
        grid.visit_shell(&generators, 0, generators[0], 2.5, 20.0, |c| second.push(c.index));
        second.sort();
        assert_eq!(second, vec![2, 3]);
    }

    #[test]
    fn test_shell_query_wraps_periodic_axes() {
        let d = domain([true, false, false]);
        let mut grid = AlgorithmGrid::new(5, 5, 5, &d);
        let generators = vec![[0.5, 5.0, 5.0], [9.5, 5.0, 5.0]];
        grid.set_generators(&generators);

        let mut found = Vec::new();
        grid.visit_shell(&generators, 0, generators[0], 0.0, 1.5, |c| found.push(c));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].index, 1);
        assert_eq!(found[0].image, [-1, 0, 0]);
        assert!((found[0].position[0] + 0.5).abs() < 1e-12);
        assert!((found[0].dist_sq - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_shell_query_reports_own_images() {
        let d = domain([true, true, true]);
        let mut grid = AlgorithmGrid::new(2, 2, 2, &d);
        let generators = vec![[5.0, 5.0, 5.0]];
        grid.set_generators(&generators);

        let mut found = Vec::new();
        grid.visit_shell(&generators, 0, generators[0], 0.0, 10.5, |c| found.push(c));
        // The six face-adjacent images at distance one period
        assert_eq!(found.len(), 6);
        assert!(found.iter().all(|c| c.index == 0 && c.image != [0, 0, 0]));
    }
}
