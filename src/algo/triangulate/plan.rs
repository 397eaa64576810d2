//! Planning the triangulation of a single polygon face.
//!
//! A plan is computed from a read-only view of the mesh and applied later by
//! [`FacePlan::commit`]. This split lets the driver plan many faces in
//! parallel and commit them one at a time.

use log::{debug, error};
use nalgebra::DMatrix;

use crate::error::{MeshError, Result};
use crate::mesh::{FaceId, HalfEdgeId, HalfEdgeMesh, MeshIndex, VertexId};

/// The boundary of a face as parallel vertex and half-edge lists.
///
/// Corner `i` is the origin of `halfedges[i]`, starting at the face's stored
/// half-edge and following `next` around the face.
#[derive(Debug, Clone)]
pub struct Polygon<I: MeshIndex = u32> {
    /// The face this boundary belongs to.
    pub face: FaceId<I>,
    /// Corner vertices in boundary order.
    pub vertices: Vec<VertexId<I>>,
    /// Boundary half-edges; `halfedges[i]` leaves `vertices[i]`.
    pub halfedges: Vec<HalfEdgeId<I>>,
}

impl<I: MeshIndex> Polygon<I> {
    /// Number of corners.
    #[inline]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// True if the polygon has no corners.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

/// Walk the boundary of `face`, checking that every corner is manifold.
///
/// # Errors
/// [`MeshError::NonManifoldPolygon`] naming the first corner whose one-ring
/// has more than one gap.
pub fn collect_boundary<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, face: FaceId<I>) -> Result<Polygon<I>> {
    let mut vertices = Vec::new();
    let mut halfedges = Vec::new();

    for he in mesh.face_halfedges(face) {
        let v = mesh.origin(he);
        if !mesh.is_manifold(v) {
            return Err(MeshError::NonManifoldPolygon {
                face: face.index(),
                vertex: v.index(),
            });
        }
        vertices.push(v);
        halfedges.push(he);
    }

    Ok(Polygon {
        face,
        vertices,
        halfedges,
    })
}

/// True if an edge between `a` and `b` exists and is not a side of `face`.
///
/// Such an edge cannot be used as a diagonal: it would either duplicate an
/// interior edge or give a boundary edge a third incident face.
pub(crate) fn is_foreign_edge<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    face: FaceId<I>,
    a: VertexId<I>,
    b: VertexId<I>,
) -> bool {
    match mesh.find_halfedge(a, b) {
        Some(he) => mesh.face_of(he) != face && mesh.face_of(mesh.twin(he)) != face,
        None => false,
    }
}

/// Cost of candidate triangles over a polygon's corners.
///
/// The cost of triangle `(i, m, k)` is the squared norm of
/// `(p_m - p_i) x (p_k - p_i)`, i.e. four times its squared area. A triangle
/// is forbidden when any of its three sides is an edge of the mesh that does
/// not belong to the polygon.
pub struct TriangleCost<'a, I: MeshIndex = u32> {
    mesh: &'a HalfEdgeMesh<I>,
    polygon: &'a Polygon<I>,
    blocked: Vec<bool>,
}

impl<'a, I: MeshIndex> TriangleCost<'a, I> {
    /// Precompute which corner pairs are joined by a foreign edge.
    pub fn new(mesh: &'a HalfEdgeMesh<I>, polygon: &'a Polygon<I>) -> Self {
        let n = polygon.len();
        let mut blocked = vec![false; n * n];

        for i in 0..n {
            for j in (i + 1)..n {
                if is_foreign_edge(mesh, polygon.face, polygon.vertices[i], polygon.vertices[j]) {
                    blocked[i * n + j] = true;
                    blocked[j * n + i] = true;
                }
            }
        }

        Self {
            mesh,
            polygon,
            blocked,
        }
    }

    /// True if corners `i` and `j` may not be joined by a triangle side.
    #[inline]
    pub fn is_blocked(&self, i: usize, j: usize) -> bool {
        self.blocked[i * self.polygon.len() + j]
    }

    /// Cost of triangle `(i, m, k)`, or `None` if it is forbidden.
    pub fn cost(&self, i: usize, m: usize, k: usize) -> Option<f64> {
        if self.is_blocked(i, m) || self.is_blocked(m, k) || self.is_blocked(i, k) {
            return None;
        }

        let p = |c: usize| self.mesh.position(self.polygon.vertices[c]);
        let pi = p(i);
        Some((p(m) - pi).cross(&(p(k) - pi)).norm_squared())
    }
}

/// Dynamic-programming tables for minimum-weight polygon triangulation.
///
/// `weight(i, k)` is the smallest total cost of triangulating the sub-polygon
/// of corners `i..=k`; it is infinite when no allowed triangulation exists.
/// `split(i, k)` is the apex `m` of the triangle `(i, m, k)` chosen for that
/// interval, and `None` when the interval is infeasible or has fewer than
/// three corners.
#[derive(Debug, Clone)]
pub struct SplitTable {
    weight: DMatrix<f64>,
    split: DMatrix<Option<usize>>,
}

impl SplitTable {
    /// Fill the tables for a polygon of `n` corners.
    ///
    /// `cost(i, m, k)` is queried for every `i < m < k`; `None` forbids the
    /// triangle. Ties keep the smallest `m`. Runs in O(n³) time and O(n²)
    /// space.
    pub fn build<F>(n: usize, mut cost: F) -> Self
    where
        F: FnMut(usize, usize, usize) -> Option<f64>,
    {
        let mut weight = DMatrix::from_element(n, n, f64::INFINITY);
        let mut split: DMatrix<Option<usize>> = DMatrix::from_element(n, n, None);

        for i in 0..n.saturating_sub(1) {
            weight[(i, i + 1)] = 0.0;
        }

        for span in 2..n {
            for i in 0..(n - span) {
                let k = i + span;
                let mut best = f64::INFINITY;
                let mut best_m = None;

                for m in (i + 1)..k {
                    let Some(c) = cost(i, m, k) else {
                        continue;
                    };
                    let w = weight[(i, m)] + c + weight[(m, k)];
                    if w < best {
                        best = w;
                        best_m = Some(m);
                    }
                }

                weight[(i, k)] = best;
                split[(i, k)] = best_m;
            }
        }

        Self { weight, split }
    }

    /// Number of polygon corners the table was built for.
    #[inline]
    pub fn len(&self) -> usize {
        self.weight.nrows()
    }

    /// True if the table covers no corners.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Minimum weight for the interval `i..=k`.
    #[inline]
    pub fn weight(&self, i: usize, k: usize) -> f64 {
        self.weight[(i, k)]
    }

    /// Chosen apex for the interval `i..=k`.
    #[inline]
    pub fn split(&self, i: usize, k: usize) -> Option<usize> {
        self.split[(i, k)]
    }

    /// Minimum weight of the whole polygon; zero below three corners.
    pub fn total_weight(&self) -> f64 {
        match self.len() {
            n if n < 3 => 0.0,
            n => self.weight(0, n - 1),
        }
    }

    /// Recover the optimal triangles as corner index triples `(i, m, k)`.
    ///
    /// Returns `None` if the polygon has no allowed triangulation. Otherwise
    /// exactly `n - 2` triangles are returned (none for fewer than three
    /// corners), each with corners in boundary order.
    pub fn triangles(&self) -> Option<Vec<[usize; 3]>> {
        let n = self.len();
        if n < 3 {
            return Some(Vec::new());
        }

        let mut triangles = Vec::with_capacity(n - 2);
        let mut todo = vec![(0, n - 1)];

        while let Some((start, end)) = todo.pop() {
            if end - start < 2 {
                continue;
            }
            let apex = self.split(start, end)?;
            triangles.push([start, apex, end]);
            todo.push((start, apex));
            todo.push((apex, end));
        }

        Some(triangles)
    }
}

/// A computed triangulation of one face, ready to be applied.
#[derive(Debug, Clone)]
pub struct FacePlan<I: MeshIndex = u32> {
    /// The face to replace.
    pub face: FaceId<I>,
    /// Replacement triangles, oriented like the face.
    pub triangles: Vec<[VertexId<I>; 3]>,
    /// Total cost of the triangulation.
    pub weight: f64,
}

impl<I: MeshIndex> FacePlan<I> {
    /// Check that the plan can still be applied to `mesh`.
    ///
    /// A plan goes stale when an edge between two of its corners was created
    /// after it was computed, typically by triangulating a neighboring face.
    pub fn is_current(&self, mesh: &HalfEdgeMesh<I>) -> bool {
        if mesh.is_face_deleted(self.face) {
            return false;
        }

        self.triangles.iter().all(|&[a, b, c]| {
            !is_foreign_edge(mesh, self.face, a, b)
                && !is_foreign_edge(mesh, self.face, b, c)
                && !is_foreign_edge(mesh, self.face, a, c)
        })
    }

    /// Replace the face by the planned triangles.
    ///
    /// Returns the number of triangles added. If a triangle cannot be
    /// inserted, the triangles added so far are deleted and the face is put
    /// back from its corners, under a new id, before the error is returned.
    pub fn commit(&self, mesh: &mut HalfEdgeMesh<I>) -> Result<usize> {
        if !mesh.contains_face(self.face) {
            return Err(MeshError::InvalidFace {
                face: self.face.index(),
            });
        }

        let corners: Vec<VertexId<I>> = mesh.face_vertices(self.face).collect();
        mesh.delete_face(self.face);

        let mut added = Vec::with_capacity(self.triangles.len());
        for &[a, b, c] in &self.triangles {
            match mesh.add_triangle(a, b, c) {
                Ok(f) => added.push(f),
                Err(err) => {
                    for f in added.into_iter().rev() {
                        mesh.delete_face(f);
                    }
                    if let Err(restore) = mesh.add_face(&corners) {
                        error!("could not restore {:?} after failed commit: {}", self.face, restore);
                    }
                    return Err(err);
                }
            }
        }
        Ok(added.len())
    }
}

/// Compute the minimum-weight triangulation of `face` without touching the
/// mesh.
///
/// Returns `Ok(None)` for faces that are already triangles, whatever their
/// corners look like.
///
/// # Errors
/// - [`MeshError::InvalidFace`] if `face` is out of range or deleted
/// - [`MeshError::PolygonTooLarge`] if the face exceeds `max_degree`
/// - [`MeshError::NonManifoldPolygon`] if a corner is non-manifold
/// - [`MeshError::UnsatisfiablePolygon`] if every triangulation would need an
///   existing edge
pub fn plan_face<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    face: FaceId<I>,
    max_degree: Option<usize>,
) -> Result<Option<FacePlan<I>>> {
    // A deleted face still points into relinked half-edges
    if !mesh.contains_face(face) {
        return Err(MeshError::InvalidFace { face: face.index() });
    }

    let n = mesh.face_degree(face);
    if n <= 3 {
        return Ok(None);
    }

    if let Some(max) = max_degree {
        if n > max {
            return Err(MeshError::PolygonTooLarge {
                face: face.index(),
                degree: n,
                max,
            });
        }
    }

    let polygon = collect_boundary(mesh, face)?;
    let cost = TriangleCost::new(mesh, &polygon);
    let table = SplitTable::build(n, |i, m, k| cost.cost(i, m, k));
    let corners = table
        .triangles()
        .ok_or(MeshError::UnsatisfiablePolygon { face: face.index() })?;

    let v = &polygon.vertices;
    let triangles = corners
        .iter()
        .map(|&[i, m, k]| [v[i], v[m], v[k]])
        .collect();

    debug!(
        "planned {:?}: {} corners, weight {:.6}",
        face,
        n,
        table.total_weight()
    );

    Ok(Some(FacePlan {
        face,
        triangles,
        weight: table.total_weight(),
    }))
}
