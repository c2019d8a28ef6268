use crate::algo_grid::AlgorithmGrid;
use crate::bounds::{BoundingBox, Domain};
use crate::cell::VoronoiCell;
use crate::cell_faces::{CellFaces, CellFacesScratch};
use crate::error::{Result, TessellationError};
use crate::periodic::Periodicity;
use crate::settings::Settings;
use crate::site::{read_periodic, read_point, read_radii, Coordinates, Site};
use log::{debug, trace, warn};
use rayon::prelude::*;

/// A site (or one of its periodic images) reported by a shell query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Candidate {
    /// Canonical index of the site.
    pub index: usize,
    /// Position of the image, i.e. the canonical position shifted by `image` periods.
    pub position: [f64; 3],
    /// Squared distance from the query center.
    pub dist_sq: f64,
    /// Period offsets of the image; zero on non-periodic axes.
    pub image: [i32; 3],
}

/// Trait defining a spatial acceleration structure.
///
/// The index is filled once by `set_generators` and only read afterwards, so a single index
/// can serve every worker thread at once.
pub trait SpatialAlgorithm: Send + Sync {
    /// Rebuild the index with new generators.
    fn set_generators(&mut self, generators: &[[f64; 3]]);

    /// Visit every site or periodic image whose distance to `center` lies in `[r_inner, r_outer)`.
    ///
    /// # Arguments
    /// * `generators` - The canonical positions of all sites.
    /// * `index` - The site being processed; its own unshifted position is skipped.
    /// * `center` - The query center.
    /// * `r_inner`, `r_outer` - The shell radii. Calling again with the previous `r_outer` as
    ///   the new `r_inner` continues the search without repeating candidates.
    /// * `visitor` - A closure called once per candidate, in no particular order.
    fn visit_shell<F>(
        &self,
        generators: &[[f64; 3]],
        index: usize,
        center: [f64; 3],
        r_inner: f64,
        r_outer: f64,
        visitor: F,
    ) where
        F: FnMut(Candidate);
}

/// Round-off allowance in units of the largest coordinate's machine epsilon.
const ROUND_OFF_ULPS: f64 = 16.0;

/// Search radius beyond which no candidate can cut a cell any more.
///
/// `max_radius_sq` is the squared distance from the site to its farthest cell vertex and
/// `weight_excess` the largest amount by which another site's power weight exceeds this
/// site's. The bisector of a candidate at distance `D` lies at least
/// `D / 2 - weight_excess / (2 D)` from the site, which exceeds the cell radius `R` once
/// `D >= R + sqrt(R^2 + weight_excess)`.
pub fn cutting_bound(max_radius_sq: f64, weight_excess: f64) -> f64 {
    let r = max_radius_sq.sqrt();
    r + (max_radius_sq + weight_excess).sqrt()
}

/// A Voronoi or radical tessellation of a fixed set of sites.
///
/// Construction validates the input and fills the spatial index; afterwards the tessellation
/// is immutable and every cell can be built independently.
pub struct Tessellation<T, A = AlgorithmGrid> {
    domain: Domain,
    settings: Settings,
    periodicity: Periodicity,
    sites: Vec<Site<T>>,
    // Canonical positions, wrapped into the box on periodic axes
    generators: Vec<[f64; 3]>,
    max_radius: f64,
    // Floor of every plane-side tolerance, at the round-off of the largest coordinate
    round_off: f64,
    algorithm: A,
}

impl<T: Send + Sync> Tessellation<T, AlgorithmGrid> {
    pub fn new(domain: Domain, sites: Vec<Site<T>>) -> Result<Self> {
        Self::with_settings(domain, sites, Settings::default())
    }

    /// Uses a block grid sized from the domain's dispersion.
    pub fn with_settings(domain: Domain, sites: Vec<Site<T>>, settings: Settings) -> Result<Self> {
        domain.validate()?;
        let algorithm = AlgorithmGrid::from_dispersion(&domain, sites.len());
        Self::with_algorithm(domain, sites, settings, algorithm)
    }
}

impl<T: Send + Sync, A: SpatialAlgorithm> Tessellation<T, A> {
    pub fn with_algorithm(domain: Domain, sites: Vec<Site<T>>, settings: Settings, mut algorithm: A) -> Result<Self> {
        domain.validate()?;
        settings.validate()?;
        let periodicity = Periodicity::new(&domain);

        let mut generators = Vec::with_capacity(sites.len());
        let mut max_radius: f64 = 0.0;
        for (i, site) in sites.iter().enumerate() {
            if site.index != i {
                return Err(TessellationError::InvalidInput(format!(
                    "site at position {} carries index {}",
                    i, site.index
                )));
            }
            if site.position.iter().any(|c| !c.is_finite()) {
                return Err(TessellationError::InvalidInput(format!("site {} has a non-finite position", i)));
            }
            if !(site.radius.is_finite() && site.radius >= 0.0) {
                return Err(TessellationError::InvalidInput(format!(
                    "site {} has invalid radius {}",
                    i, site.radius
                )));
            }
            if !periodicity.contains(&site.position) {
                return Err(TessellationError::InvalidInput(format!(
                    "site {} at {:?} lies outside the non-periodic box",
                    i, site.position
                )));
            }
            generators.push(periodicity.wrap(site.position));
            max_radius = max_radius.max(site.radius);
        }
        reject_coincident(&generators)?;

        algorithm.set_generators(&generators);

        // Periodic images and initial cells reach one period past the box.
        let magnitude = (0..3)
            .map(|axis| {
                let b = &domain.bounds;
                b.min[axis].abs().max(b.max[axis].abs()) + b.max[axis] - b.min[axis]
            })
            .fold(0.0, f64::max);
        if domain.is_periodic() {
            debug!(
                "indexed {} sites in periodic box {:?}..{:?} ({:?}), cells reach at most {}",
                sites.len(),
                domain.bounds.min,
                domain.bounds.max,
                domain.periodic,
                periodicity.max_cell_radius()
            );
        } else {
            debug!(
                "indexed {} sites in box {:?}..{:?}",
                sites.len(),
                domain.bounds.min,
                domain.bounds.max
            );
        }

        Ok(Tessellation {
            domain,
            settings,
            periodicity,
            sites,
            generators,
            max_radius,
            round_off: ROUND_OFF_ULPS * f64::EPSILON * magnitude,
            algorithm,
        })
    }

    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn sites(&self) -> &[Site<T>] {
        &self.sites
    }

    pub fn count_sites(&self) -> usize {
        self.sites.len()
    }

    pub fn algorithm(&self) -> &A {
        &self.algorithm
    }

    /// Canonical position of site `i`, wrapped into the box on periodic axes.
    pub fn generator(&self, i: usize) -> Option<[f64; 3]> {
        self.generators.get(i).copied()
    }

    /// Builds the cell of a single site.
    pub fn compute_cell(&self, index: usize) -> Result<CellFaces> {
        if index >= self.sites.len() {
            return Err(TessellationError::InvalidInput(format!(
                "site index {} out of range for {} sites",
                index,
                self.sites.len()
            )));
        }
        let mut scratch = CellFacesScratch::default();
        let mut candidates = Vec::new();
        self.build_cell(index, &mut scratch, &mut candidates)
    }

    /// Builds every cell and applies `f` to it without keeping the cells around.
    ///
    /// Failures are reported per site; one failing site does not stop the others.
    pub fn map<F, R>(&self, f: F) -> Vec<Result<R>>
    where
        F: Fn(&CellFaces, &Site<T>) -> R + Sync + Send,
        R: Send,
    {
        let results: Vec<Result<R>> = (0..self.sites.len())
            .into_par_iter()
            .map_init(
                || (CellFacesScratch::default(), Vec::new()),
                |(scratch, candidates), i| {
                    self.build_cell(i, scratch, candidates)
                        .map(|cell| f(&cell, &self.sites[i]))
                },
            )
            .collect();

        let failed = results.iter().filter(|r| r.is_err()).count();
        debug!("built {} cells, {} failed", results.len() - failed, failed);
        results
    }

    /// Builds every cell, reporting failures per site.
    pub fn calculate(&self) -> Vec<Result<VoronoiCell<T>>>
    where
        T: Clone,
    {
        self.map(|cell, site| VoronoiCell::from_cell(cell, site.payload.clone()))
    }

    /// Builds every cell, failing on the first site that could not be built.
    pub fn calculate_all(&self) -> Result<Vec<VoronoiCell<T>>>
    where
        T: Clone,
    {
        self.calculate().into_iter().collect()
    }

    fn build_cell(
        &self,
        i: usize,
        scratch: &mut CellFacesScratch,
        candidates: &mut Vec<Candidate>,
    ) -> Result<CellFaces> {
        let g = self.generators[i];
        let weight = self.sites[i].weight();
        let weight_excess = (self.max_radius * self.max_radius - weight).max(0.0);
        let covered = self.periodicity.covered_radius();

        let mut cell = CellFaces::new(i, self.periodicity.initial_bounds(&g), self.round_off);
        let mut bound = cutting_bound(cell.max_radius_sq(&g), weight_excess);

        let dispersion = self.domain.dispersion;
        let mut r_inner = 0.0;
        let mut r_outer = dispersion;

        for shell in 0..self.settings.max_shells {
            candidates.clear();
            self.algorithm
                .visit_shell(&self.generators, i, g, r_inner, r_outer, |c| candidates.push(c));
            candidates.sort_unstable_by(|a, b| {
                a.dist_sq
                    .total_cmp(&b.dist_sq)
                    .then(a.index.cmp(&b.index))
                    .then(a.image.cmp(&b.image))
            });
            trace!(
                "site {} shell {} [{}, {}): {} candidates, bound {}",
                i,
                shell,
                r_inner,
                r_outer,
                candidates.len(),
                bound
            );

            for c in candidates.iter() {
                // The bound only shrinks, so everything after this is out of reach too.
                if c.dist_sq > bound * bound {
                    break;
                }
                let (point, normal) = self.bisector(i, &g, weight, c)?;
                cell.set_tolerance(self.settings.tolerance * c.dist_sq.sqrt() + self.round_off);
                let (changed, max_r2) = cell.clip_with_scratch(&point, &normal, c.index as i32, scratch, Some(&g))?;
                if changed {
                    if cell.is_empty() {
                        debug!("cell of site {} vanished behind site {}", i, c.index);
                        return Ok(cell);
                    }
                    bound = cutting_bound(max_r2, weight_excess);
                }
            }

            if r_outer > bound {
                return Ok(cell);
            }
            if covered.is_some_and(|limit| r_outer > limit) {
                return Ok(cell);
            }
            r_inner = r_outer;
            r_outer = (r_outer * self.settings.shell_growth).max(r_outer + dispersion);
        }

        warn!(
            "cell of site {} incomplete after {} shells (radius {}, bound {})",
            i, self.settings.max_shells, r_inner, bound
        );
        Err(TessellationError::IncompleteCell {
            site: i,
            radius: r_inner,
            bound,
        })
    }

    /// Plane separating site `i` from the candidate under the power distance.
    ///
    /// The plane passes through `g + t (q - g)` with normal `q - g`, where
    /// `t = 1/2 + (w_i - w_q) / (2 |q - g|^2)`.
    fn bisector(&self, i: usize, g: &[f64; 3], weight: f64, c: &Candidate) -> Result<([f64; 3], [f64; 3])> {
        let d = [c.position[0] - g[0], c.position[1] - g[1], c.position[2] - g[2]];
        if !(c.dist_sq > 0.0) {
            return Err(TessellationError::DegenerateGeometry {
                site: i,
                reason: format!("coincides with an image of site {}", c.index),
            });
        }
        let t = 0.5 + (weight - self.sites[c.index].weight()) / (2.0 * c.dist_sq);
        let point = [g[0] + t * d[0], g[1] + t * d[1], g[2] + t * d[2]];
        Ok((point, d))
    }
}

/// Rejects sites sharing a position before any cell is built.
fn reject_coincident(generators: &[[f64; 3]]) -> Result<()> {
    let mut order: Vec<usize> = (0..generators.len()).collect();
    // Adding zero folds -0.0 into 0.0 so both sort together
    let key = |i: &usize| generators[*i].map(|c| c + 0.0);
    order.sort_unstable_by(|a, b| {
        let (pa, pb) = (key(a), key(b));
        pa[0].total_cmp(&pb[0])
            .then(pa[1].total_cmp(&pb[1]))
            .then(pa[2].total_cmp(&pb[2]))
            .then(a.cmp(b))
    });
    for pair in order.windows(2) {
        if key(&pair[0]) == key(&pair[1]) {
            return Err(TessellationError::DegenerateGeometry {
                site: pair[1],
                reason: format!("coincides with site {}", pair[0]),
            });
        }
    }
    Ok(())
}

/// Computes the Voronoi (or radical, when `radii` is given) tessellation of 3D points.
///
/// # Arguments
/// * `points` - The site positions; each must have exactly three coordinates. Every point is
///   echoed back as the `original` of its cell.
/// * `limits` - Three `[min, max]` pairs describing the box.
/// * `dispersion` - Expected maximum distance between adjacent sites. Sets the block size of
///   the spatial index and has no effect on the result.
/// * `radii` - Per-site radii for the radical tessellation, or empty for all zero.
/// * `periodic` - Per-axis periodicity, or empty for a non-periodic box.
///
/// Cells are returned in input order. The call fails as a whole if any cell fails.
pub fn compute_voronoi<P>(
    points: &[P],
    limits: &[[f64; 2]],
    dispersion: f64,
    radii: &[f64],
    periodic: &[bool],
) -> Result<Vec<VoronoiCell<P>>>
where
    P: Coordinates + Clone + Send + Sync,
{
    let bounds = BoundingBox::<3>::from_limits(limits)?;
    let periodic = read_periodic::<3>(periodic)?;
    let domain = Domain::new(bounds, dispersion)?.with_periodic(periodic);
    let radii = read_radii(radii, points.len())?;

    let sites = points
        .iter()
        .enumerate()
        .map(|(i, p)| Ok(Site::with_payload(i, read_point::<3, _>(p, i)?, radii[i], p.clone())))
        .collect::<Result<Vec<_>>>()?;

    Tessellation::new(domain, sites)?.calculate_all()
}
