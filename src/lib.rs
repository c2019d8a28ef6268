//! # vorobox
//!
//! `vorobox` computes Voronoi and radical (Laguerre) tessellations of points inside an
//! axis-aligned box, optionally periodic along any subset of axes. Each cell is built on its
//! own by clipping the box with the bisector planes of nearby sites, so cells are computed in
//! parallel and every cell comes with its volume, vertices, vertex adjacency and faces.
//!
//! ## Features
//!
//! - **Radical tessellation**: per-site radii weight the distance as `|x - p|^2 - r^2`.
//! - **Periodic boxes**: any axis may wrap; faces against periodic images report the
//!   canonical site index.
//! - **Spatial Partitioning**: a block grid sized from the expected site spacing feeds an
//!   expanding-shell neighbor search with a provable stopping radius.
//! - **2D**: planar tessellations are computed as prisms in a thin slab and flattened.
//!
//! ## Main Interface
//!
//! [`compute_voronoi`] and [`compute_2d_voronoi`] take plain coordinates and return one cell
//! per point. The [`Tessellation`] struct gives finer control: per-site results, custom
//! [`Settings`], and [`Tessellation::map`] to reduce cells without materializing them.
//!
//! ```
//! use vorobox::compute_voronoi;
//!
//! let points = vec![[0.25, 0.5, 0.5], [0.75, 0.5, 0.5]];
//! let cells = compute_voronoi(&points, &[[0.0, 1.0]; 3], 0.5, &[], &[]).unwrap();
//! assert!((cells[0].volume - 0.5).abs() < 1e-12);
//! assert_eq!(cells[0].neighbors(), vec![1]);
//! ```

mod algo_grid;
mod bounds;
mod cell;
mod cell_faces;
mod d2;
mod error;
mod periodic;
mod settings;
mod site;
mod tessellation;

pub use algo_grid::AlgorithmGrid;
pub use bounds::BoundingBox;
pub use bounds::BoxSide;
pub use bounds::Domain;
pub use cell::Face;
pub use cell::VoronoiCell;
pub use cell_faces::CellFaces;
pub use cell_faces::CellFacesScratch;
pub use d2::compute_2d_voronoi;
pub use d2::VoronoiCell2D;
pub use d2::DEFAULT_Z_HEIGHT;
pub use error::Result;
pub use error::TessellationError;
pub use periodic::Periodicity;
pub use settings::Settings;
pub use site::Coordinates;
pub use site::Site;
pub use tessellation::compute_voronoi;
pub use tessellation::cutting_bound;
pub use tessellation::Candidate;
pub use tessellation::SpatialAlgorithm;
pub use tessellation::Tessellation;
