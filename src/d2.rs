use crate::bounds::{BoundingBox, BoxSide, Domain};
use crate::cell::{Face, VoronoiCell};
use crate::error::{Result, TessellationError};
use crate::site::{read_periodic, read_point, read_radii, Coordinates, Site};
use crate::tessellation::Tessellation;
use log::debug;
use serde::{Deserialize, Serialize};

/// Default half thickness of the slab used for 2D tessellations.
pub const DEFAULT_Z_HEIGHT: f64 = 0.5;

/// A finished 2D cell, i.e. a polygon.
///
/// `vertices` are in loop order. Each entry of `faces` is an edge given by two positions in
/// `vertices`, together with the site or wall on its other side.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VoronoiCell2D<T> {
    pub area: f64,
    pub vertices: Vec<[f64; 2]>,
    /// For each vertex, its predecessor and successor along the polygon.
    pub adjacency: Vec<[usize; 2]>,
    pub faces: Vec<Face>,
    pub original: T,
}

impl<T> VoronoiCell2D<T> {
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Distinct sites sharing an edge with this cell.
    pub fn neighbors(&self) -> Vec<usize> {
        let mut out: Vec<usize> = Vec::new();
        for face in self.faces.iter().filter(|f| !f.is_wall()) {
            let id = face.adjacent_cell as usize;
            if !out.contains(&id) {
                out.push(id);
            }
        }
        out
    }
}

/// Computes the Voronoi (or radical) tessellation of 2D points.
///
/// Each point is lifted to `z = 0` inside the slab `[-z_height, z_height]` and tessellated in
/// 3D. Every resulting cell is a prism between the two z walls, which is flattened back into
/// a polygon. Arguments match [`crate::compute_voronoi`] with two axes instead of three.
///
/// Fails as a whole if any cell fails, including cells that do not come out as prisms.
pub fn compute_2d_voronoi<P>(
    points: &[P],
    limits: &[[f64; 2]],
    dispersion: f64,
    radii: &[f64],
    periodic: &[bool],
    z_height: f64,
) -> Result<Vec<VoronoiCell2D<P>>>
where
    P: Coordinates + Clone + Send + Sync,
{
    let plane = BoundingBox::<2>::from_limits(limits)?;
    if !(z_height.is_finite() && z_height > 0.0) {
        return Err(TessellationError::InvalidDomain {
            axis: 2,
            reason: format!("slab half height must be positive, got {}", z_height),
        });
    }
    let [px, py] = read_periodic::<2>(periodic)?;
    let bounds = BoundingBox::new(
        [plane.min[0], plane.min[1], -z_height],
        [plane.max[0], plane.max[1], z_height],
    );
    let domain = Domain::new(bounds, dispersion)?.with_periodic([px, py, false]);
    let radii = read_radii(radii, points.len())?;

    let sites = points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let [x, y] = read_point::<2, _>(p, i)?;
            Ok(Site::with_payload(i, [x, y, 0.0], radii[i], ()))
        })
        .collect::<Result<Vec<_>>>()?;

    let cells = Tessellation::new(domain, sites)?.calculate_all()?;
    debug!("flattening {} slab cells of half height {}", cells.len(), z_height);

    cells
        .iter()
        .zip(points)
        .enumerate()
        .map(|(i, (cell, p))| flatten_prism(i, cell, z_height, p.clone()))
        .collect()
}

/// Turns a slab cell into the polygon it is a prism over.
///
/// The polygon is the face on the lower z wall. Every other face that is not on a z wall
/// must be a side face meeting the lower wall in exactly one edge.
fn flatten_prism<T>(site: usize, cell: &VoronoiCell<()>, z_height: f64, original: T) -> Result<VoronoiCell2D<T>> {
    if cell.is_empty() {
        return Ok(VoronoiCell2D {
            area: 0.0,
            vertices: Vec::new(),
            adjacency: Vec::new(),
            faces: Vec::new(),
            original,
        });
    }

    let not_prism = |reason: String| TessellationError::NonPrismaticCell { site, reason };
    let bottom_id = BoxSide::ZMin.id();
    let top_id = BoxSide::ZMax.id();

    let bottom = cell
        .faces
        .iter()
        .find(|f| f.adjacent_cell == bottom_id)
        .ok_or_else(|| not_prism("no face on the lower slab wall".into()))?;
    let top = cell
        .faces
        .iter()
        .find(|f| f.adjacent_cell == top_id)
        .ok_or_else(|| not_prism("no face on the upper slab wall".into()))?;

    if bottom.vertices.iter().any(|v| top.vertices.contains(v)) {
        return Err(not_prism("slab walls share a vertex".into()));
    }
    if bottom.vertices.len() != top.vertices.len() || 2 * bottom.vertices.len() != cell.vertices.len() {
        return Err(not_prism(format!(
            "{} vertices cannot form a prism over a {}-gon",
            cell.vertices.len(),
            bottom.vertices.len()
        )));
    }

    let base = &bottom.vertices;
    let mut faces = Vec::with_capacity(cell.faces.len().saturating_sub(2));
    for face in cell.faces.iter().filter(|f| f.adjacent_cell != bottom_id && f.adjacent_cell != top_id) {
        let edge: Vec<usize> = face
            .vertices
            .iter()
            .filter_map(|v| base.iter().position(|b| b == v))
            .collect();
        if edge.len() != 2 {
            return Err(not_prism(format!(
                "side face towards {} meets the lower wall in {} vertices",
                face.adjacent_cell,
                edge.len()
            )));
        }
        faces.push(Face {
            vertices: edge,
            adjacent_cell: face.adjacent_cell,
        });
    }

    let vertices = base.iter().map(|&v| [cell.vertices[v][0], cell.vertices[v][1]]).collect();
    let n = base.len();
    let adjacency = (0..n).map(|i| [(i + n - 1) % n, (i + 1) % n]).collect();

    Ok(VoronoiCell2D {
        area: cell.volume / (2.0 * z_height),
        vertices,
        adjacency,
        faces,
        original,
    })
}
