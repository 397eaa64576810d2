//! Minimum-weight triangulation of polygon faces.
//!
//! Every face with more than three sides is replaced by triangles over its
//! own corners, chosen by dynamic programming to minimize the sum of squared
//! triangle areas. A diagonal is never placed where the mesh already has an
//! edge, so the result stays edge-manifold and contains no duplicate edges.
//!
//! # Algorithm
//!
//! For each face:
//! 1. Collect its boundary corners, rejecting faces with a non-manifold corner
//! 2. Fill an interval table over the corners (O(n³)), skipping any triangle
//!    whose side is an existing edge not owned by the face
//! 3. Recover the triangles from the split table and check that they can be
//!    inserted
//! 4. Delete the face and add the triangles
//!
//! Faces that cannot be triangulated are left untouched, logged, and counted
//! in the returned [`TriangulationReport`].
//!
//! # Example
//!
//! ```
//! use tessel::algo::triangulate::{triangulate, TriangulateOptions};
//! use tessel::mesh::{build_from_polygons, HalfEdgeMesh};
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(2.0, 0.0, 0.0),
//!     Point3::new(3.0, 2.0, 0.0),
//!     Point3::new(1.0, 3.0, 0.0),
//!     Point3::new(-1.0, 2.0, 0.0),
//! ];
//! let mut mesh: HalfEdgeMesh = build_from_polygons(&vertices, &[vec![0, 1, 2, 3, 4]]).unwrap();
//!
//! let report = triangulate(&mut mesh, &TriangulateOptions::default()).unwrap();
//! assert_eq!(report.triangles_added, 3);
//! assert!(mesh.is_triangle_mesh());
//! ```
//!
//! # References
//!
//! - Liepa, "Filling Holes in Meshes", SGP 2003 (interval dynamic program)

mod plan;

pub use plan::{collect_boundary, plan_face, FacePlan, Polygon, SplitTable, TriangleCost};

use log::{debug, error, info, warn};
use rayon::prelude::*;

use crate::algo::Progress;
use crate::error::{MeshError, Result};
use crate::mesh::{FaceId, HalfEdgeMesh, MeshIndex};

/// Options for polygon triangulation.
#[derive(Debug, Clone)]
pub struct TriangulateOptions {
    /// Faces with more sides than this are skipped. `None` means no limit.
    /// Must be at least 3 when set.
    pub max_face_degree: Option<usize>,

    /// Plan faces on the rayon thread pool before applying them.
    pub parallel: bool,
}

impl Default for TriangulateOptions {
    fn default() -> Self {
        Self {
            max_face_degree: None,
            parallel: true,
        }
    }
}

impl TriangulateOptions {
    /// Skip faces with more than `max` sides.
    pub fn with_max_face_degree(mut self, max: usize) -> Self {
        self.max_face_degree = Some(max);
        self
    }

    /// Enable or disable parallel planning.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Plan and apply faces one at a time.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    fn validate(&self) -> Result<()> {
        if let Some(max) = self.max_face_degree {
            if max < 3 {
                return Err(MeshError::invalid_param(
                    "max_face_degree",
                    max,
                    "must be at least 3",
                ));
            }
        }
        Ok(())
    }
}

/// Summary of a whole-mesh triangulation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriangulationReport {
    /// Faces examined.
    pub faces_visited: usize,
    /// Faces replaced by triangles.
    pub faces_triangulated: usize,
    /// Triangles created.
    pub triangles_added: usize,
    /// Faces skipped because a corner is non-manifold.
    pub skipped_non_manifold: usize,
    /// Faces skipped because every triangulation needs an existing edge.
    pub skipped_unsatisfiable: usize,
    /// Faces skipped because they exceed the degree limit.
    pub skipped_too_large: usize,
    /// Faces whose triangles could not be inserted; these are rebuilt.
    pub failed: usize,
    /// Parallel plans that went stale and were recomputed.
    pub replanned: usize,
    /// Whether every face of the final mesh is a triangle.
    pub is_triangle_mesh: bool,
}

impl TriangulationReport {
    /// Total number of faces left untriangulated.
    pub fn num_skipped(&self) -> usize {
        self.skipped_non_manifold + self.skipped_unsatisfiable + self.skipped_too_large + self.failed
    }

    fn record<I: MeshIndex>(&mut self, face: FaceId<I>, outcome: Result<usize>) {
        self.faces_visited += 1;
        match outcome {
            Ok(0) => {}
            Ok(added) => {
                self.faces_triangulated += 1;
                self.triangles_added += added;
            }
            Err(err) => {
                match err {
                    MeshError::NonManifoldPolygon { .. } => self.skipped_non_manifold += 1,
                    MeshError::UnsatisfiablePolygon { .. } => self.skipped_unsatisfiable += 1,
                    MeshError::PolygonTooLarge { .. } => self.skipped_too_large += 1,
                    _ => {
                        self.failed += 1;
                        error!("failed to triangulate {:?}: {}", face, err);
                        return;
                    }
                }
                warn!("skipping {:?}: {}", face, err);
            }
        }
    }
}

/// Triangulate a single face in place.
///
/// Returns the number of triangles added, which is 0 for a triangle and
/// `n - 2` for a face with `n` sides. On error the face keeps its corners. If
/// inserting a triangle fails ([`MeshError::ComplexVertex`],
/// [`MeshError::ComplexEdge`] or [`MeshError::PatchRelinkFailed`]), the face
/// is rebuilt under a new id.
///
/// Deleted storage is not compacted; call
/// [`HalfEdgeMesh::garbage_collection`] when done editing. The face id is
/// no longer valid after a successful call.
///
/// # Errors
/// - [`MeshError::InvalidParameter`] if the options are invalid
/// - [`MeshError::InvalidFace`] if the face is out of range or deleted
/// - [`MeshError::NonManifoldPolygon`] if a corner is non-manifold
/// - [`MeshError::PolygonTooLarge`] if the face exceeds the degree limit
/// - [`MeshError::UnsatisfiablePolygon`] if no valid triangulation exists
pub fn triangulate_face<I: MeshIndex>(
    mesh: &mut HalfEdgeMesh<I>,
    face: FaceId<I>,
    options: &TriangulateOptions,
) -> Result<usize> {
    options.validate()?;
    apply_face(mesh, face, options)
}

/// Triangulate every face of the mesh.
///
/// Faces that cannot be triangulated are skipped and counted in the report.
/// Storage is compacted at the end, so face and edge IDs change.
///
/// # Errors
/// Only [`MeshError::InvalidParameter`]; per-face failures are reported.
pub fn triangulate<I: MeshIndex>(
    mesh: &mut HalfEdgeMesh<I>,
    options: &TriangulateOptions,
) -> Result<TriangulationReport> {
    triangulate_with_progress(mesh, options, &Progress::none())
}

/// Triangulate every face of the mesh, reporting progress per face.
pub fn triangulate_with_progress<I: MeshIndex>(
    mesh: &mut HalfEdgeMesh<I>,
    options: &TriangulateOptions,
    progress: &Progress,
) -> Result<TriangulationReport> {
    options.validate()?;

    let faces: Vec<FaceId<I>> = mesh.face_ids().collect();
    let total = faces.len();
    let mut report = TriangulationReport::default();

    if options.parallel {
        let plans: Vec<Result<Option<FacePlan<I>>>> = {
            let mesh = &*mesh;
            faces
                .par_iter()
                .map(|&f| plan_face(mesh, f, options.max_face_degree))
                .collect()
        };

        for (step, (&face, planned)) in faces.iter().zip(plans).enumerate() {
            progress.report(step, total, "Triangulating faces");
            let outcome = match planned {
                Ok(Some(plan)) if !plan.is_current(mesh) => {
                    debug!("plan for {:?} went stale, replanning", face);
                    report.replanned += 1;
                    apply_face(mesh, face, options)
                }
                Ok(Some(plan)) => plan.commit(mesh),
                Ok(None) => Ok(0),
                Err(err) => Err(err),
            };
            report.record(face, outcome);
        }
    } else {
        for (step, &face) in faces.iter().enumerate() {
            progress.report(step, total, "Triangulating faces");
            let outcome = apply_face(mesh, face, options);
            report.record(face, outcome);
        }
    }
    progress.report(total, total, "Triangulating faces");

    mesh.garbage_collection();
    report.is_triangle_mesh = mesh.is_triangle_mesh();

    info!(
        "triangulated {} of {} faces ({} triangles added, {} skipped), triangle mesh: {}",
        report.faces_triangulated,
        report.faces_visited,
        report.triangles_added,
        report.num_skipped(),
        report.is_triangle_mesh
    );

    Ok(report)
}

fn apply_face<I: MeshIndex>(
    mesh: &mut HalfEdgeMesh<I>,
    face: FaceId<I>,
    options: &TriangulateOptions,
) -> Result<usize> {
    match plan_face(mesh, face, options.max_face_degree)? {
        Some(plan) => plan.commit(mesh),
        None => Ok(0),
    }
}
