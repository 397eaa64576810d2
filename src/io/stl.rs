//! STL (stereolithography) format support.
//!
//! STL only stores triangles. Loading merges coincident corners into shared
//! vertices; saving requires a pure triangle mesh, so triangulate first.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use nalgebra::Point3;

use crate::error::{MeshError, Result};
use crate::mesh::{build_from_triangles, HalfEdgeMesh, MeshIndex};

/// Load a mesh from an STL file.
///
/// Automatically detects binary vs ASCII format. Triangles that collapse
/// after merging vertices are dropped.
///
/// # Example
///
/// ```no_run
/// use tessel::io::stl;
/// use tessel::mesh::HalfEdgeMesh;
///
/// let mesh: HalfEdgeMesh = stl::load("model.stl").unwrap();
/// ```
pub fn load<P: AsRef<Path>, I: MeshIndex>(path: P) -> Result<HalfEdgeMesh<I>> {
    let path = path.as_ref();
    let mut file = File::open(path)?;

    let stl = stl_io::read_stl(&mut file).map_err(|e| MeshError::LoadError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    // read_stl merges bit-identical corners into shared vertices
    let vertices: Vec<Point3<f64>> = stl
        .vertices
        .iter()
        .map(|v| Point3::new(v[0] as f64, v[1] as f64, v[2] as f64))
        .collect();

    let faces: Vec<[usize; 3]> = stl
        .faces
        .iter()
        .map(|tri| tri.vertices)
        .filter(|&[a, b, c]| a != b && b != c && a != c)
        .collect();

    if faces.is_empty() {
        return Err(MeshError::LoadError {
            path: path.to_path_buf(),
            message: "STL file contains no valid triangles".to_string(),
        });
    }

    build_from_triangles(&vertices, &faces)
}

/// Save a mesh to a binary STL file.
///
/// # Errors
/// [`MeshError::SaveError`] if the mesh has a face with more than three sides.
///
/// # Example
///
/// ```no_run
/// use tessel::io::stl;
/// use tessel::mesh::HalfEdgeMesh;
///
/// let mesh: HalfEdgeMesh = HalfEdgeMesh::new();
/// stl::save(&mesh, "output.stl").unwrap();
/// ```
pub fn save<P: AsRef<Path>, I: MeshIndex>(mesh: &HalfEdgeMesh<I>, path: P) -> Result<()> {
    let path = path.as_ref();
    if !mesh.is_triangle_mesh() {
        return Err(MeshError::SaveError {
            path: path.to_path_buf(),
            message: "STL can only store triangles; triangulate the mesh first".to_string(),
        });
    }

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    let vertex = |p: &Point3<f64>| stl_io::Vertex::new([p.x as f32, p.y as f32, p.z as f32]);

    let triangles: Vec<stl_io::Triangle> = mesh
        .face_ids()
        .map(|f| {
            let [v0, v1, v2] = mesh.face_triangle(f);
            let n = mesh.face_normal(f);
            stl_io::Triangle {
                normal: stl_io::Normal::new([n.x as f32, n.y as f32, n.z as f32]),
                vertices: [
                    vertex(mesh.position(v0)),
                    vertex(mesh.position(v1)),
                    vertex(mesh.position(v2)),
                ],
            }
        })
        .collect();

    stl_io::write_stl(&mut writer, triangles.iter()).map_err(|e| MeshError::SaveError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    Ok(())
}
