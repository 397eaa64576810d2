//! Core mesh data structures.
//!
//! This module provides the half-edge mesh representation and related types
//! for representing and editing polygon meshes.
//!
//! # Overview
//!
//! The primary type is [`HalfEdgeMesh`], which represents a polygon mesh using
//! a half-edge (doubly-connected edge list) data structure. Faces can have any
//! number of sides. Besides O(1) adjacency queries it supports the topological
//! edits needed to re-triangulate faces in place: [`HalfEdgeMesh::delete_face`],
//! [`HalfEdgeMesh::add_face`] and [`HalfEdgeMesh::garbage_collection`].
//!
//! # Index Types
//!
//! Mesh elements are identified by type-safe index wrappers:
//! - [`VertexId`] - Identifies a vertex
//! - [`HalfEdgeId`] - Identifies a half-edge
//! - [`FaceId`] - Identifies a face
//! - [`EdgeId`] - Identifies a full edge
//!
//! These indices are generic over the underlying integer type ([`MeshIndex`] trait),
//! allowing you to choose `u16`, `u32`, or `u64` based on mesh size.
//!
//! # Construction
//!
//! ```
//! use tessel::mesh::{HalfEdgeMesh, build_from_polygons};
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(1.0, 1.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! ];
//! let faces = vec![vec![0, 1, 2, 3]];
//!
//! let mesh: HalfEdgeMesh = build_from_polygons(&vertices, &faces).unwrap();
//! assert!(!mesh.is_triangle_mesh());
//! ```

mod builder;
mod edit;
mod halfedge;
mod index;

pub use builder::{build_from_polygons, build_from_quads, build_from_triangles, to_face_vertex};
pub use halfedge::{Face, FaceHalfEdgeIter, HalfEdge, HalfEdgeMesh, Vertex, VertexHalfEdgeIter};
pub use index::{EdgeId, FaceId, HalfEdgeId, MeshIndex, VertexId};
