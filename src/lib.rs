//! # Tessel
//!
//! Minimum-weight triangulation of polygon meshes.
//!
//! Tessel stores meshes in a half-edge data structure and replaces each face
//! with more than three sides by triangles over the face's own corners. The
//! triangles are chosen by dynamic programming to minimize the sum of squared
//! triangle areas, subject to one hard constraint: a diagonal is never placed
//! where the mesh already has an edge. The output therefore stays
//! edge-manifold and free of duplicate edges.
//!
//! ## Features
//!
//! - **Half-edge data structure**: O(1) adjacency queries with type-safe indices
//! - **Flexible indexing**: Support for 16-bit, 32-bit, and 64-bit indices
//! - **Topological editing**: add and delete polygon faces, compact storage
//! - **Parallel planning**: faces are planned on the rayon thread pool
//! - **File formats**: OBJ, PLY, STL
//!
//! ## Quick Start
//!
//! ```no_run
//! use tessel::prelude::*;
//!
//! let mut mesh: HalfEdgeMesh = tessel::io::load("model.obj").unwrap();
//!
//! let report = triangulate(&mut mesh, &TriangulateOptions::default()).unwrap();
//! println!("Added {} triangles", report.triangles_added);
//!
//! tessel::io::save(&mesh, "output.stl").unwrap();
//! ```
//!
//! ## Triangulating a Single Face
//!
//! ```
//! use tessel::prelude::*;
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(1.0, 1.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! ];
//! let mut mesh: HalfEdgeMesh = build_from_polygons(&vertices, &[vec![0, 1, 2, 3]]).unwrap();
//!
//! let added = triangulate_face(&mut mesh, FaceId::new(0), &TriangulateOptions::default()).unwrap();
//! assert_eq!(added, 2);
//!
//! mesh.garbage_collection();
//! assert!(mesh.is_triangle_mesh());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod error;
pub mod io;
pub mod mesh;

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and functions:
///
/// ```
/// use tessel::prelude::*;
/// ```
pub mod prelude {
    pub use crate::algo::triangulate::{
        triangulate, triangulate_face, TriangulateOptions, TriangulationReport,
    };
    pub use crate::algo::Progress;
    pub use crate::error::{MeshError, Result};
    pub use crate::mesh::{
        build_from_polygons, build_from_triangles, to_face_vertex, EdgeId, Face, FaceId,
        HalfEdge, HalfEdgeId, HalfEdgeMesh, MeshIndex, Vertex, VertexId,
    };
}

// Re-export nalgebra types for convenience
pub use nalgebra;
