use crate::bounds::{BoundingBox, BoxSide};
use crate::error::{Result, TessellationError};

/// Position of a vertex relative to a cutting plane.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Side {
    Inside,
    On,
    Outside,
}

/// Scratch buffer to reuse allocations during clipping.
#[derive(Default, Clone)]
pub struct CellFacesScratch {
    vertices: Vec<f64>,
    face_counts: Vec<u16>,
    face_indices: Vec<u32>,
    face_neighbors: Vec<i32>,
    dists: Vec<f64>,
    sides: Vec<Side>,
    on_plane: Vec<bool>,
    old_to_new: Vec<Option<u32>>,
    intersection_map: Vec<(u64, u32)>,
    lid_segments: Vec<(u32, u32)>,
    face_buffer: Vec<u32>,
    lid_buffer: Vec<u32>,
    lid_map: Vec<u32>,
    remap: Vec<u32>,
}

impl CellFacesScratch {
    /// New vertex where the plane crosses the edge `a`-`b`, shared between the two faces of the edge.
    fn edge_point(&mut self, vertices: &[f64], a: usize, b: usize) -> u32 {
        let key = if a < b { (a as u64) << 32 | b as u64 } else { (b as u64) << 32 | a as u64 };
        if let Some(&(_, id)) = self.intersection_map.iter().find(|&&(k, _)| k == key) {
            return id;
        }

        // Interpolate from the inside end so both faces produce the same coordinates.
        let (inner, outer) = if self.sides[a] == Side::Inside { (a, b) } else { (b, a) };
        let d_in = self.dists[inner];
        let d_out = self.dists[outer];
        let t = (d_in / (d_in - d_out)).clamp(0.0, 1.0);

        let new_idx = (self.vertices.len() / 3) as u32;
        for k in 0..3 {
            let from = vertices[inner * 3 + k];
            let to = vertices[outer * 3 + k];
            self.vertices.push(from + t * (to - from));
        }
        self.on_plane.push(true);
        self.intersection_map.push((key, new_idx));
        new_idx
    }
}

/// A convex cell under construction, stored as vertex positions and face loops.
///
/// Faces are wound counter-clockwise seen from outside the cell. Every face carries the id of
/// the cell on its other side, or a negative wall id. Clipping rebuilds the arrays in the
/// scratch buffers and swaps them in, so vertex and face handles are plain indices.
#[derive(Clone, Debug)]
pub struct CellFaces {
    pub(crate) id: usize,
    // Flat array of vertices [x, y, z, x, y, z, ...]
    pub(crate) vertices: Vec<f64>,
    // Number of vertices for each face
    pub(crate) face_counts: Vec<u16>,
    // Flattened indices for all faces
    pub(crate) face_indices: Vec<u32>,
    // Neighbor ID for each face. Negative values indicate walls/boundaries.
    pub(crate) face_neighbors: Vec<i32>,
    // Absolute distance under which a vertex counts as lying on a cutting plane
    pub(crate) tolerance: f64,
}

impl CellFaces {
    /// Creates the box-shaped starting cell, one face per box side.
    pub fn new(id: usize, bounds: BoundingBox<3>, tolerance: f64) -> CellFaces {
        let [x0, y0, z0] = bounds.min;
        let [x1, y1, z1] = bounds.max;
        let vertices: Vec<f64> = vec![
            x0, y0, z0, // 0
            x1, y0, z0, // 1
            x1, y1, z0, // 2
            x0, y1, z0, // 3
            x0, y0, z1, // 4
            x1, y0, z1, // 5
            x1, y1, z1, // 6
            x0, y1, z1, // 7
        ];

        let face_indices: Vec<u32> = vec![
            0, 4, 7, 3, // x-
            1, 2, 6, 5, // x+
            0, 1, 5, 4, // y-
            2, 3, 7, 6, // y+
            3, 2, 1, 0, // z-
            4, 5, 6, 7, // z+
        ];

        CellFaces {
            id,
            vertices,
            face_counts: vec![4; 6],
            face_indices,
            face_neighbors: BoxSide::ALL.iter().map(|side| side.id()).collect(),
            tolerance,
        }
    }

    /// Sets the distance under which a vertex counts as lying on the next cutting plane.
    pub fn set_tolerance(&mut self, tolerance: f64) {
        self.tolerance = tolerance;
    }

    /// The index of the site owning this cell.
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 3
    }

    pub fn face_count(&self) -> usize {
        self.face_counts.len()
    }

    #[inline]
    pub fn vertex(&self, i: usize) -> [f64; 3] {
        [self.vertices[i * 3], self.vertices[i * 3 + 1], self.vertices[i * 3 + 2]]
    }

    pub fn vertices(&self) -> Vec<[f64; 3]> {
        (0..self.vertex_count()).map(|i| self.vertex(i)).collect()
    }

    /// Neighbor ID for each face. Negative values indicate walls/boundaries.
    pub fn face_neighbors(&self) -> &[i32] {
        &self.face_neighbors
    }

    pub fn faces(&self) -> Vec<Vec<usize>> {
        let mut faces: Vec<Vec<usize>> = Vec::with_capacity(self.face_counts.len());
        let mut offset: usize = 0;
        for &count in &self.face_counts {
            let count: usize = count as usize;
            let face: Vec<usize> = self.face_indices[offset..offset + count]
                .iter()
                .map(|&i| i as usize)
                .collect();
            faces.push(face);
            offset += count;
        }
        faces
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn volume(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        // Fan every face around its first vertex, measured from vertex 0 to keep magnitudes small.
        let o = self.vertex(0);
        let mut volume: f64 = 0.0;
        let mut index_offset: usize = 0;

        for &count in &self.face_counts {
            let count: usize = count as usize;
            let v0 = sub(self.vertex(self.face_indices[index_offset] as usize), o);
            for i in 1..count - 1 {
                let v1 = sub(self.vertex(self.face_indices[index_offset + i] as usize), o);
                let v2 = sub(self.vertex(self.face_indices[index_offset + i + 1] as usize), o);
                volume += dot(v0, cross(v1, v2));
            }
            index_offset += count;
        }

        (volume / 6.0).abs()
    }

    pub fn centroid(&self) -> [f64; 3] {
        if self.is_empty() {
            return [0.0; 3];
        }
        let o = self.vertex(0);
        let mut acc = [0.0; 3];
        let mut total_volume: f64 = 0.0;
        let mut index_offset: usize = 0;

        for &count in &self.face_counts {
            let count: usize = count as usize;
            let v0 = sub(self.vertex(self.face_indices[index_offset] as usize), o);
            for i in 1..count - 1 {
                let v1 = sub(self.vertex(self.face_indices[index_offset + i] as usize), o);
                let v2 = sub(self.vertex(self.face_indices[index_offset + i + 1] as usize), o);
                let det = dot(v0, cross(v1, v2));
                total_volume += det;
                for k in 0..3 {
                    acc[k] += det * (v0[k] + v1[k] + v2[k]);
                }
            }
            index_offset += count;
        }

        if total_volume.abs() < 1e-300 {
            return o;
        }

        let factor = 1.0 / (4.0 * total_volume);
        [o[0] + acc[0] * factor, o[1] + acc[1] * factor, o[2] + acc[2] * factor]
    }

    pub fn face_area(&self, face_index: usize) -> f64 {
        if face_index >= self.face_counts.len() {
            return 0.0;
        }
        let offset: usize = self.face_counts[..face_index].iter().map(|&c| c as usize).sum();
        let count = self.face_counts[face_index] as usize;

        let p0 = self.vertex(self.face_indices[offset] as usize);
        let mut area = 0.0;
        for i in 1..count - 1 {
            let p1 = self.vertex(self.face_indices[offset + i] as usize);
            let p2 = self.vertex(self.face_indices[offset + i + 1] as usize);
            area += 0.5 * norm(cross(sub(p1, p0), sub(p2, p0)));
        }
        area
    }

    /// Calculate the squared distance from the center to the furthest vertex.
    pub fn max_radius_sq(&self, center: &[f64; 3]) -> f64 {
        let mut max_d2 = 0.0;
        for k in 0..self.vertex_count() {
            let d2 = norm_sq(sub(self.vertex(k), *center));
            if d2 > max_d2 {
                max_d2 = d2;
            }
        }
        max_d2
    }

    /// Neighbors of every vertex, ordered by walking around the vertex through its faces.
    pub fn vertex_adjacency(&self) -> Vec<Vec<usize>> {
        let n = self.vertex_count();
        // (previous, next) vertex of every face corner
        let mut corners: Vec<Vec<(usize, usize)>> = vec![Vec::new(); n];
        for face in self.faces() {
            let len = face.len();
            for k in 0..len {
                let prev = face[(k + len - 1) % len];
                let next = face[(k + 1) % len];
                corners[face[k]].push((prev, next));
            }
        }

        corners
            .iter()
            .map(|arcs| {
                let Some(&(_, first)) = arcs.first() else {
                    return Vec::new();
                };
                let mut order = vec![first];
                let mut current = first;
                while order.len() < arcs.len() {
                    match arcs.iter().find(|&&(prev, _)| prev == current) {
                        Some(&(_, next)) if next != first => {
                            order.push(next);
                            current = next;
                        }
                        _ => break,
                    }
                }
                if order.len() == arcs.len() {
                    return order;
                }
                // Not a manifold corner; fall back to the distinct neighbors in encounter order.
                let mut distinct = Vec::with_capacity(2 * arcs.len());
                for &(prev, next) in arcs {
                    for v in [next, prev] {
                        if !distinct.contains(&v) {
                            distinct.push(v);
                        }
                    }
                }
                distinct
            })
            .collect()
    }

    /// Number of edges, counting every edge once.
    pub fn edge_count(&self) -> usize {
        self.face_counts.iter().map(|&c| c as usize).sum::<usize>() / 2
    }

    /// Checks that every directed face edge is matched by its reverse in exactly one other face.
    pub fn is_closed(&self) -> bool {
        let mut edges: Vec<(usize, usize)> = Vec::with_capacity(self.face_indices.len());
        for face in self.faces() {
            let len = face.len();
            for k in 0..len {
                edges.push((face[k], face[(k + 1) % len]));
            }
        }
        edges.sort_unstable();
        if edges.windows(2).any(|w| w[0] == w[1]) {
            return false;
        }
        edges.iter().all(|&(a, b)| edges.binary_search(&(b, a)).is_ok())
    }

    pub fn clip(&mut self, point: &[f64; 3], normal: &[f64; 3], neighbor_id: i32) -> Result<bool> {
        let mut scratch = CellFacesScratch::default();
        self.clip_with_scratch(point, normal, neighbor_id, &mut scratch, None)
            .map(|(changed, _)| changed)
    }

    /// Keeps the part of the cell on the side of the plane opposite to `normal`.
    ///
    /// Returns `(true, new_max_radius_sq)` if the cell was modified, or `(false, 0.0)` if not.
    /// The radius is measured from `generator` and is 0 when none is given or the cell vanished.
    pub fn clip_with_scratch(
        &mut self,
        point: &[f64; 3],
        normal: &[f64; 3],
        neighbor_id: i32,
        scratch: &mut CellFacesScratch,
        generator: Option<&[f64; 3]>,
    ) -> Result<(bool, f64)> {
        let len = norm(*normal);
        if !(len.is_finite() && len > 0.0) {
            return Err(self.degenerate(format!("cutting plane towards {} has no normal", neighbor_id)));
        }
        let n = [normal[0] / len, normal[1] / len, normal[2] / len];

        let num_verts = self.vertex_count();
        if num_verts == 0 {
            return Ok((false, 0.0));
        }

        // 1. Classify vertices
        scratch.dists.clear();
        scratch.sides.clear();
        let mut inside = 0usize;
        let mut outside = 0usize;
        for i in 0..num_verts {
            let d = dot(sub(self.vertex(i), *point), n);
            let side = if d > self.tolerance {
                outside += 1;
                Side::Outside
            } else if d < -self.tolerance {
                inside += 1;
                Side::Inside
            } else {
                Side::On
            };
            scratch.dists.push(d);
            scratch.sides.push(side);
        }

        if outside == 0 {
            return Ok((false, 0.0));
        }
        if inside == 0 {
            self.vertices.clear();
            self.face_counts.clear();
            self.face_indices.clear();
            self.face_neighbors.clear();
            return Ok((true, 0.0));
        }

        // 2. Keep every vertex that is not strictly outside
        scratch.vertices.clear();
        scratch.face_counts.clear();
        scratch.face_indices.clear();
        scratch.face_neighbors.clear();
        scratch.on_plane.clear();
        scratch.old_to_new.clear();
        scratch.old_to_new.resize(num_verts, None);
        scratch.intersection_map.clear();
        scratch.lid_segments.clear();

        for i in 0..num_verts {
            if scratch.sides[i] != Side::Outside {
                let new_idx = (scratch.vertices.len() / 3) as u32;
                scratch.vertices.extend_from_slice(&self.vertices[i * 3..i * 3 + 3]);
                scratch.on_plane.push(scratch.sides[i] == Side::On);
                scratch.old_to_new[i] = Some(new_idx);
            }
        }

        // 3. Clip each face
        let mut index_offset = 0;
        for (face_idx, &count) in self.face_counts.iter().enumerate() {
            let count = count as usize;
            let current = &self.face_indices[index_offset..index_offset + count];
            index_offset += count;

            scratch.face_buffer.clear();
            let mut has_inside = false;

            for i in 0..count {
                let s = current[i] as usize;
                let e = current[(i + 1) % count] as usize;
                let side_s = scratch.sides[s];
                let side_e = scratch.sides[e];

                if let Some(idx) = scratch.old_to_new[s] {
                    scratch.face_buffer.push(idx);
                    has_inside |= side_s == Side::Inside;
                }
                let crosses = matches!(
                    (side_s, side_e),
                    (Side::Inside, Side::Outside) | (Side::Outside, Side::Inside)
                );
                if crosses {
                    let idx = scratch.edge_point(&self.vertices, s, e);
                    scratch.face_buffer.push(idx);
                }
            }

            // Faces without an inside vertex lie on or beyond the plane; the lid replaces them.
            if !has_inside || scratch.face_buffer.len() < 3 {
                continue;
            }

            let len = scratch.face_buffer.len();
            for i in 0..len {
                let u = scratch.face_buffer[i];
                let v = scratch.face_buffer[(i + 1) % len];
                if scratch.on_plane[u as usize] && scratch.on_plane[v as usize] {
                    scratch.lid_segments.push((v, u)); // Reverse order for the lid face
                }
            }
            scratch.face_counts.push(len as u16);
            scratch.face_neighbors.push(self.face_neighbors[face_idx]);
            scratch.face_indices.extend_from_slice(&scratch.face_buffer);
        }

        // 4. Reconstruct the "lid" face from segments
        self.chain_lid(scratch, neighbor_id)?;
        scratch.face_counts.push(scratch.lid_buffer.len() as u16);
        scratch.face_indices.extend_from_slice(&scratch.lid_buffer);
        scratch.face_neighbors.push(neighbor_id);

        compact(scratch);

        std::mem::swap(&mut self.vertices, &mut scratch.vertices);
        std::mem::swap(&mut self.face_counts, &mut scratch.face_counts);
        std::mem::swap(&mut self.face_indices, &mut scratch.face_indices);
        std::mem::swap(&mut self.face_neighbors, &mut scratch.face_neighbors);

        let max_d2 = generator.map_or(0.0, |g| self.max_radius_sq(g));
        Ok((true, max_d2))
    }

    /// Orders the lid segments into a single loop in `scratch.lid_buffer`.
    fn chain_lid(&self, scratch: &mut CellFacesScratch, neighbor_id: i32) -> Result<()> {
        scratch.lid_buffer.clear();
        let segments = scratch.lid_segments.len();
        if segments < 3 {
            return Err(self.degenerate(format!(
                "cut towards {} leaves a lid with {} edges",
                neighbor_id, segments
            )));
        }

        scratch.lid_map.clear();
        scratch.lid_map.resize(scratch.vertices.len() / 3, u32::MAX);
        for &(u, v) in &scratch.lid_segments {
            if scratch.lid_map[u as usize] != u32::MAX {
                return Err(self.degenerate(format!("lid boundary towards {} branches", neighbor_id)));
            }
            scratch.lid_map[u as usize] = v;
        }

        let start = scratch.lid_segments[0].0;
        let mut current = start;
        loop {
            scratch.lid_buffer.push(current);
            current = scratch.lid_map[current as usize];
            if current == start {
                break;
            }
            if current == u32::MAX || scratch.lid_buffer.len() > segments {
                return Err(self.degenerate(format!("lid boundary towards {} is not closed", neighbor_id)));
            }
        }

        if scratch.lid_buffer.len() != segments {
            return Err(self.degenerate(format!(
                "lid boundary towards {} splits into several loops",
                neighbor_id
            )));
        }
        Ok(())
    }

    fn degenerate(&self, reason: String) -> TessellationError {
        TessellationError::DegenerateGeometry { site: self.id, reason }
    }
}

/// Drops vertices no face refers to and renumbers the rest.
fn compact(scratch: &mut CellFacesScratch) {
    let count = scratch.vertices.len() / 3;
    scratch.remap.clear();
    scratch.remap.resize(count, u32::MAX);
    for &i in &scratch.face_indices {
        scratch.remap[i as usize] = 0;
    }
    if scratch.remap.iter().all(|&r| r == 0) {
        return;
    }

    let mut next = 0u32;
    for i in 0..count {
        if scratch.remap[i] == 0 {
            scratch.remap[i] = next;
            if next as usize != i {
                let (dst, src) = (next as usize * 3, i * 3);
                scratch.vertices.copy_within(src..src + 3, dst);
            }
            next += 1;
        }
    }
    scratch.vertices.truncate(next as usize * 3);
    for i in scratch.face_indices.iter_mut() {
        *i = scratch.remap[*i as usize];
    }
}

#[inline]
pub(crate) fn sub(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

#[inline]
pub(crate) fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

#[inline]
pub(crate) fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

#[inline]
pub(crate) fn norm_sq(a: [f64; 3]) -> f64 {
    dot(a, a)
}

#[inline]
pub(crate) fn norm(a: [f64; 3]) -> f64 {
    norm_sq(a).sqrt()
}
