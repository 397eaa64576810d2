//! Mesh construction utilities.
//!
//! This module provides functions for building half-edge meshes from
//! face-vertex lists as found in mesh file formats, and for converting them
//! back.

use nalgebra::Point3;

use super::halfedge::HalfEdgeMesh;
use super::index::{MeshIndex, VertexId};
use crate::error::{MeshError, Result};

/// Build a half-edge mesh from vertices and polygon faces of any degree.
///
/// # Arguments
/// * `vertices` - List of vertex positions
/// * `faces` - List of faces, each a counter-clockwise list of vertex indices
///
/// # Returns
/// A half-edge mesh, or an error if the input is invalid or not
/// edge-manifold. Vertices shared by several separate fans of faces are
/// accepted; they are reported by [`HalfEdgeMesh::is_manifold`].
///
/// # Example
/// ```
/// use tessel::mesh::{build_from_polygons, HalfEdgeMesh};
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(1.0, 1.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
///     Point3::new(2.0, 0.5, 0.0),
/// ];
/// let faces = vec![vec![0, 1, 2, 3], vec![1, 4, 2]];
///
/// let mesh: HalfEdgeMesh = build_from_polygons(&vertices, &faces).unwrap();
/// assert_eq!(mesh.num_vertices(), 5);
/// assert_eq!(mesh.num_faces(), 2);
/// ```
pub fn build_from_polygons<I: MeshIndex, F: AsRef<[usize]>>(
    vertices: &[Point3<f64>],
    faces: &[F],
) -> Result<HalfEdgeMesh<I>> {
    if faces.is_empty() {
        return Err(MeshError::EmptyMesh);
    }

    for (fi, face) in faces.iter().enumerate() {
        let face = face.as_ref();
        if let Some(&vi) = face.iter().find(|&&vi| vi >= vertices.len()) {
            return Err(MeshError::InvalidVertexIndex { face: fi, vertex: vi });
        }
        if face.len() < 3 || has_duplicates(face) {
            return Err(MeshError::DegenerateFace { face: fi });
        }
    }

    let mut mesh = HalfEdgeMesh::with_capacity(vertices.len(), faces.len());

    let vertex_ids: Vec<VertexId<I>> = vertices
        .iter()
        .map(|&pos| mesh.add_vertex(pos))
        .collect();

    let mut corners: Vec<VertexId<I>> = Vec::new();
    for (fi, face) in faces.iter().enumerate() {
        corners.clear();
        corners.extend(face.as_ref().iter().map(|&vi| vertex_ids[vi]));
        mesh.add_face(&corners).map_err(|e| MeshError::NonManifold {
            details: format!("face {}: {}", fi, e),
        })?;
    }

    Ok(mesh)
}

/// Build a half-edge mesh from vertices and triangle faces.
///
/// # Example
/// ```
/// use tessel::mesh::{build_from_triangles, HalfEdgeMesh};
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.5, 1.0, 0.0),
/// ];
/// let faces = vec![[0, 1, 2]];
///
/// let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
/// assert_eq!(mesh.num_faces(), 1);
/// assert!(mesh.is_triangle_mesh());
/// ```
pub fn build_from_triangles<I: MeshIndex>(
    vertices: &[Point3<f64>],
    faces: &[[usize; 3]],
) -> Result<HalfEdgeMesh<I>> {
    build_from_polygons(vertices, faces)
}

/// Build a half-edge mesh from vertices and quad faces (counter-clockwise).
pub fn build_from_quads<I: MeshIndex>(
    vertices: &[Point3<f64>],
    faces: &[[usize; 4]],
) -> Result<HalfEdgeMesh<I>> {
    build_from_polygons(vertices, faces)
}

fn has_duplicates(face: &[usize]) -> bool {
    face.iter()
        .enumerate()
        .any(|(i, vi)| face[i + 1..].contains(vi))
}

/// Convert a half-edge mesh back to a face-vertex representation.
///
/// Returns (vertices, faces); each face lists its vertex indices in boundary
/// order. Deleted faces are skipped.
pub fn to_face_vertex<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> (Vec<Point3<f64>>, Vec<Vec<usize>>) {
    let vertices: Vec<Point3<f64>> = mesh.vertex_ids().map(|v| *mesh.position(v)).collect();

    let faces: Vec<Vec<usize>> = mesh
        .face_ids()
        .map(|f| mesh.face_vertices(f).map(|v| v.index()).collect())
        .collect();

    (vertices, faces)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_triangles() -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
        // Two triangles sharing an edge
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, -1.0, 0.0),
        ];
        let faces = vec![[0, 1, 2], [1, 0, 3]];
        (vertices, faces)
    }

    fn mixed_strip() -> (Vec<Point3<f64>>, Vec<Vec<usize>>) {
        // Quad, pentagon and triangle in a row
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(2.5, 0.5, 0.0),
            Point3::new(2.0, 1.0, 0.0),
            Point3::new(3.0, 1.0, 0.0),
        ];
        let faces = vec![vec![0, 1, 2, 3], vec![1, 4, 5, 6, 2], vec![6, 5, 7]];
        (vertices, faces)
    }

    #[test]
    fn test_two_triangles() {
        let (vertices, faces) = two_triangles();
        let mesh: HalfEdgeMesh<u32> = build_from_triangles(&vertices, &faces).unwrap();

        assert_eq!(mesh.num_vertices(), 4);
        assert_eq!(mesh.num_faces(), 2);
        assert_eq!(mesh.num_edges(), 5);
        // 6 interior half-edges + 4 boundary half-edges
        assert_eq!(mesh.num_halfedges(), 10);
        assert!(mesh.is_valid());
        assert!(mesh.is_triangle_mesh());
    }

    #[test]
    fn test_mixed_degree() {
        let (vertices, faces) = mixed_strip();
        let mesh: HalfEdgeMesh<u32> = build_from_polygons(&vertices, &faces).unwrap();

        assert_eq!(mesh.num_faces(), 3);
        assert_eq!(mesh.num_edges(), 10);
        assert!(mesh.is_valid());

        let degrees: Vec<usize> = mesh.face_ids().map(|f| mesh.face_degree(f)).collect();
        assert_eq!(degrees, vec![4, 5, 3]);
        for v in mesh.vertex_ids() {
            assert!(mesh.is_manifold(v));
        }
    }

    #[test]
    fn test_roundtrip() {
        let (vertices, faces) = mixed_strip();
        let mesh: HalfEdgeMesh<u32> = build_from_polygons(&vertices, &faces).unwrap();

        let (out_verts, out_faces) = to_face_vertex(&mesh);

        assert_eq!(vertices.len(), out_verts.len());
        assert_eq!(faces, out_faces);
        for (v_in, v_out) in vertices.iter().zip(out_verts.iter()) {
            assert!((v_in - v_out).norm() < 1e-10);
        }
    }

    #[test]
    fn test_quads() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(2.0, 1.0, 0.0),
        ];
        let faces = vec![[0, 1, 2, 3], [1, 4, 5, 2]];
        let mesh: HalfEdgeMesh<u32> = build_from_quads(&vertices, &faces).unwrap();

        assert_eq!(mesh.num_faces(), 2);
        // 8 interior half-edges + 6 boundary half-edges
        assert_eq!(mesh.num_halfedges(), 14);
        assert!(mesh.is_valid());
        assert!(!mesh.is_triangle_mesh());
    }

    #[test]
    fn test_empty_faces() {
        let vertices = vec![Point3::new(0.0, 0.0, 0.0)];
        let faces: Vec<[usize; 3]> = Vec::new();
        let result: Result<HalfEdgeMesh<u32>> = build_from_triangles(&vertices, &faces);
        assert!(matches!(result, Err(MeshError::EmptyMesh)));
    }

    #[test]
    fn test_invalid_vertex_index() {
        let vertices = vec![Point3::new(0.0, 0.0, 0.0)];
        let faces = vec![[0, 1, 2]];

        let result: Result<HalfEdgeMesh<u32>> = build_from_triangles(&vertices, &faces);
        assert!(matches!(
            result,
            Err(MeshError::InvalidVertexIndex { face: 0, vertex: 1 })
        ));
    }

    #[test]
    fn test_degenerate_face() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        // Diagonal vertices coincide
        let faces = vec![[0, 1, 0, 3]];

        let result: Result<HalfEdgeMesh<u32>> = build_from_quads(&vertices, &faces);
        assert!(matches!(result, Err(MeshError::DegenerateFace { face: 0 })));
    }

    #[test]
    fn test_non_manifold_edge() {
        // Three triangles on one edge
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, -1.0, 0.0),
            Point3::new(0.5, 0.0, 1.0),
        ];
        let faces = vec![[0, 1, 2], [1, 0, 3], [0, 1, 4]];

        let result: Result<HalfEdgeMesh<u32>> = build_from_triangles(&vertices, &faces);
        assert!(matches!(result, Err(MeshError::NonManifold { .. })));
    }
}
