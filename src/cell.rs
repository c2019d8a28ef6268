use crate::cell_faces::{cross, dot, norm, sub, CellFaces};
use serde::{Deserialize, Serialize};

/// One face of a finished cell.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Face {
    /// Vertex indices in loop order, counter-clockwise seen from outside the cell.
    pub vertices: Vec<usize>,
    /// Index of the site on the other side, or a negative wall id.
    pub adjacent_cell: i32,
}

impl Face {
    pub fn is_wall(&self) -> bool {
        self.adjacent_cell < 0
    }
}

/// A finished Voronoi (or radical) cell.
///
/// This is a read-only snapshot of the cell built for one site. Cells of sites that were
/// swallowed entirely by heavier neighbors have zero volume and no vertices.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VoronoiCell<T> {
    pub volume: f64,
    pub vertices: Vec<[f64; 3]>,
    /// For each vertex, the vertices it shares an edge with.
    pub adjacency: Vec<Vec<usize>>,
    pub faces: Vec<Face>,
    /// The input element this cell was built for.
    pub original: T,
}

impl<T> VoronoiCell<T> {
    /// Renders a built cell. Face loops and adjacent ids are taken over unchanged.
    pub fn from_cell(cell: &CellFaces, original: T) -> Self {
        let faces = cell
            .faces()
            .into_iter()
            .zip(cell.face_neighbors())
            .map(|(vertices, &adjacent_cell)| Face {
                vertices,
                adjacent_cell,
            })
            .collect();

        VoronoiCell {
            volume: cell.volume(),
            vertices: cell.vertices(),
            adjacency: cell.vertex_adjacency(),
            faces,
            original,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(Vec::len).sum::<usize>() / 2
    }

    /// Distinct sites sharing a face with this cell, in face order.
    pub fn neighbors(&self) -> Vec<usize> {
        let mut out: Vec<usize> = Vec::new();
        for face in &self.faces {
            if face.adjacent_cell >= 0 {
                let id = face.adjacent_cell as usize;
                if !out.contains(&id) {
                    out.push(id);
                }
            }
        }
        out
    }

    pub fn face_area(&self, face_index: usize) -> f64 {
        let Some(face) = self.faces.get(face_index) else {
            return 0.0;
        };
        if face.vertices.len() < 3 {
            return 0.0;
        }
        let p0 = self.vertices[face.vertices[0]];
        let mut area = 0.0;
        for w in face.vertices[1..].windows(2) {
            let p1 = self.vertices[w[0]];
            let p2 = self.vertices[w[1]];
            area += 0.5 * norm(cross(sub(p1, p0), sub(p2, p0)));
        }
        area
    }

    pub fn centroid(&self) -> [f64; 3] {
        let Some(&o) = self.vertices.first() else {
            return [0.0; 3];
        };
        let mut acc = [0.0; 3];
        let mut total = 0.0;
        for face in self.faces.iter().filter(|f| f.vertices.len() >= 3) {
            let v0 = sub(self.vertices[face.vertices[0]], o);
            for w in face.vertices[1..].windows(2) {
                let v1 = sub(self.vertices[w[0]], o);
                let v2 = sub(self.vertices[w[1]], o);
                let det = dot(v0, cross(v1, v2));
                total += det;
                for k in 0..3 {
                    acc[k] += det * (v0[k] + v1[k] + v2[k]);
                }
            }
        }
        if total.abs() < 1e-300 {
            return o;
        }
        let factor = 1.0 / (4.0 * total);
        [o[0] + acc[0] * factor, o[1] + acc[1] * factor, o[2] + acc[2] * factor]
    }
}
