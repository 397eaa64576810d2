//! Wavefront OBJ format support.
//!
//! Faces of any degree are read and written as-is, so polygon meshes survive
//! a round trip. Texture coordinates, normals and materials are ignored.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use nalgebra::Point3;
use obj::{Group, IndexTuple, ObjData, Object, SimplePolygon};

use crate::error::{MeshError, Result};
use crate::mesh::{build_from_polygons, to_face_vertex, HalfEdgeMesh, MeshIndex};

/// Load a mesh from an OBJ file.
///
/// All groups of all objects are merged into one mesh.
///
/// # Example
///
/// ```no_run
/// use tessel::io::obj;
/// use tessel::mesh::HalfEdgeMesh;
///
/// let mesh: HalfEdgeMesh = obj::load("model.obj").unwrap();
/// ```
pub fn load<P: AsRef<Path>, I: MeshIndex>(path: P) -> Result<HalfEdgeMesh<I>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let data = ObjData::load_buf(BufReader::new(file)).map_err(|e| MeshError::LoadError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let vertices: Vec<Point3<f64>> = data
        .position
        .iter()
        .map(|p| Point3::new(p[0] as f64, p[1] as f64, p[2] as f64))
        .collect();

    let faces: Vec<Vec<usize>> = data
        .objects
        .iter()
        .flat_map(|object| object.groups.iter())
        .flat_map(|group| group.polys.iter())
        .map(|poly| poly.0.iter().map(|tuple| tuple.0).collect())
        .collect();

    if faces.is_empty() {
        return Err(MeshError::LoadError {
            path: path.to_path_buf(),
            message: "OBJ file contains no faces".to_string(),
        });
    }

    build_from_polygons(&vertices, &faces)
}

/// Save a mesh to an OBJ file.
///
/// # Example
///
/// ```no_run
/// use tessel::io::obj;
/// use tessel::mesh::HalfEdgeMesh;
///
/// let mesh: HalfEdgeMesh = HalfEdgeMesh::new();
/// obj::save(&mesh, "output.obj").unwrap();
/// ```
pub fn save<P: AsRef<Path>, I: MeshIndex>(mesh: &HalfEdgeMesh<I>, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    let (vertices, faces) = to_face_vertex(mesh);

    let polys = faces
        .iter()
        .map(|face| SimplePolygon(face.iter().map(|&vi| IndexTuple(vi, None, None)).collect()))
        .collect();

    let data = ObjData {
        position: vertices
            .iter()
            .map(|p| [p.x as f32, p.y as f32, p.z as f32])
            .collect(),
        objects: vec![Object {
            name: "tessel".to_string(),
            groups: vec![Group {
                name: "default".to_string(),
                index: 0,
                material: None,
                polys,
            }],
        }],
        ..Default::default()
    };

    data.write_to_buf(&mut writer).map_err(|e| MeshError::SaveError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
