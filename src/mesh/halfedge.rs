//! Half-edge mesh data structure.
//!
//! This module provides a half-edge (doubly-connected edge list) representation
//! for polygon meshes. Faces may have any number of sides, which is what the
//! triangulation algorithms in [`crate::algo`] consume.
//!
//! # Structure
//!
//! - Each edge is split into two **half-edges** pointing in opposite directions,
//!   stored next to each other (`2e` and `2e + 1`)
//! - Each half-edge knows its **twin**, **next**, **prev**, **origin vertex**
//!   and **incident face**
//! - Each vertex stores one outgoing half-edge
//! - Each face stores one half-edge on its boundary
//!
//! # Boundary Handling
//!
//! Boundary half-edges have an invalid face ID and are linked into loops with
//! `next`/`prev` like any face. A boundary vertex always stores a boundary
//! half-edge as its outgoing half-edge, so [`HalfEdgeMesh::is_boundary_vertex`]
//! is O(1).
//!
//! # Deletion
//!
//! Faces and edges are deleted lazily: they are flagged and skipped by all
//! iterators until [`HalfEdgeMesh::garbage_collection`] compacts the storage.
//! Vertices are never deleted, so vertex IDs are stable across collection.

use nalgebra::{Point3, Vector3};

use super::index::{EdgeId, FaceId, HalfEdgeId, MeshIndex, VertexId};

/// A vertex in the half-edge mesh.
#[derive(Debug, Clone)]
pub struct Vertex<I: MeshIndex = u32> {
    /// The 3D position of this vertex.
    pub position: Point3<f64>,

    /// One outgoing half-edge from this vertex.
    /// For boundary vertices, this is guaranteed to be a boundary half-edge.
    /// Invalid for isolated vertices.
    pub halfedge: HalfEdgeId<I>,
}

impl<I: MeshIndex> Vertex<I> {
    /// Create a new isolated vertex at the given position.
    pub fn new(position: Point3<f64>) -> Self {
        Self {
            position,
            halfedge: HalfEdgeId::invalid(),
        }
    }
}

/// A half-edge in the mesh.
#[derive(Debug, Clone, Copy)]
pub struct HalfEdge<I: MeshIndex = u32> {
    /// The vertex this half-edge originates from.
    pub origin: VertexId<I>,

    /// The opposite half-edge (pointing in the reverse direction).
    pub twin: HalfEdgeId<I>,

    /// The next half-edge around the face or boundary loop.
    pub next: HalfEdgeId<I>,

    /// The previous half-edge around the face or boundary loop.
    pub prev: HalfEdgeId<I>,

    /// The face this half-edge belongs to.
    /// Invalid for boundary half-edges.
    pub face: FaceId<I>,
}

impl<I: MeshIndex> HalfEdge<I> {
    /// Create an unlinked half-edge leaving `origin`.
    pub fn new(origin: VertexId<I>) -> Self {
        Self {
            origin,
            twin: HalfEdgeId::invalid(),
            next: HalfEdgeId::invalid(),
            prev: HalfEdgeId::invalid(),
            face: FaceId::invalid(),
        }
    }

    /// Check if this half-edge is on the boundary.
    #[inline]
    pub fn is_boundary(&self) -> bool {
        !self.face.is_valid()
    }
}

/// A face in the half-edge mesh.
#[derive(Debug, Clone, Copy)]
pub struct Face<I: MeshIndex = u32> {
    /// One half-edge on the boundary of this face.
    pub halfedge: HalfEdgeId<I>,
}

impl<I: MeshIndex> Face<I> {
    /// Create a new face with the given half-edge.
    pub fn new(halfedge: HalfEdgeId<I>) -> Self {
        Self { halfedge }
    }
}

/// A half-edge mesh data structure for polygon meshes.
#[derive(Debug, Clone)]
pub struct HalfEdgeMesh<I: MeshIndex = u32> {
    /// All vertices in the mesh.
    pub(crate) vertices: Vec<Vertex<I>>,

    /// All half-edges in the mesh, twins stored as consecutive pairs.
    pub(crate) halfedges: Vec<HalfEdge<I>>,

    /// All faces in the mesh, including deleted ones.
    pub(crate) faces: Vec<Face<I>>,

    /// Deletion flags, indexed by face.
    pub(crate) deleted_faces: Vec<bool>,

    /// Deletion flags, indexed by edge.
    pub(crate) deleted_edges: Vec<bool>,

    pub(crate) num_deleted_faces: usize,
    pub(crate) num_deleted_edges: usize,
}

impl<I: MeshIndex> Default for HalfEdgeMesh<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: MeshIndex> HalfEdgeMesh<I> {
    /// Create a new empty mesh.
    pub fn new() -> Self {
        Self::with_capacity(0, 0)
    }

    /// Create a mesh with pre-allocated capacity.
    pub fn with_capacity(num_vertices: usize, num_faces: usize) -> Self {
        // Euler: E ~ V + F for typical polygon meshes
        let num_edges = num_vertices + num_faces;

        Self {
            vertices: Vec::with_capacity(num_vertices),
            halfedges: Vec::with_capacity(2 * num_edges),
            faces: Vec::with_capacity(num_faces),
            deleted_faces: Vec::with_capacity(num_faces),
            deleted_edges: Vec::with_capacity(num_edges),
            num_deleted_faces: 0,
            num_deleted_edges: 0,
        }
    }

    // ==================== Accessors ====================

    /// Get the number of vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of live edges.
    #[inline]
    pub fn num_edges(&self) -> usize {
        self.deleted_edges.len() - self.num_deleted_edges
    }

    /// Get the number of live half-edges.
    #[inline]
    pub fn num_halfedges(&self) -> usize {
        2 * self.num_edges()
    }

    /// Get the number of live faces.
    #[inline]
    pub fn num_faces(&self) -> usize {
        self.faces.len() - self.num_deleted_faces
    }

    /// Whether deleted elements are waiting for [`Self::garbage_collection`].
    #[inline]
    pub fn has_garbage(&self) -> bool {
        self.num_deleted_faces > 0 || self.num_deleted_edges > 0
    }

    /// Check whether a face has been deleted.
    #[inline]
    pub fn is_face_deleted(&self, f: FaceId<I>) -> bool {
        self.deleted_faces[f.index()]
    }

    /// Check whether `f` names a face of this mesh that has not been deleted.
    #[inline]
    pub fn contains_face(&self, f: FaceId<I>) -> bool {
        f.index() < self.faces.len() && !self.deleted_faces[f.index()]
    }

    /// Check whether an edge has been deleted.
    #[inline]
    pub fn is_edge_deleted(&self, e: EdgeId<I>) -> bool {
        self.deleted_edges[e.index()]
    }

    /// Get a vertex by ID.
    #[inline]
    pub fn vertex(&self, id: VertexId<I>) -> &Vertex<I> {
        &self.vertices[id.index()]
    }

    #[inline]
    pub(crate) fn vertex_mut(&mut self, id: VertexId<I>) -> &mut Vertex<I> {
        &mut self.vertices[id.index()]
    }

    /// Get a half-edge by ID.
    #[inline]
    pub fn halfedge(&self, id: HalfEdgeId<I>) -> &HalfEdge<I> {
        &self.halfedges[id.index()]
    }

    #[inline]
    pub(crate) fn halfedge_mut(&mut self, id: HalfEdgeId<I>) -> &mut HalfEdge<I> {
        &mut self.halfedges[id.index()]
    }

    /// Get a face by ID.
    #[inline]
    pub fn face(&self, id: FaceId<I>) -> &Face<I> {
        &self.faces[id.index()]
    }

    /// Get the position of a vertex.
    #[inline]
    pub fn position(&self, v: VertexId<I>) -> &Point3<f64> {
        &self.vertex(v).position
    }

    /// Set the position of a vertex.
    #[inline]
    pub fn set_position(&mut self, v: VertexId<I>, pos: Point3<f64>) {
        self.vertex_mut(v).position = pos;
    }

    // ==================== Topology Queries ====================

    /// Get the twin (opposite) half-edge.
    #[inline]
    pub fn twin(&self, he: HalfEdgeId<I>) -> HalfEdgeId<I> {
        self.halfedge(he).twin
    }

    /// Get the next half-edge around the face.
    #[inline]
    pub fn next(&self, he: HalfEdgeId<I>) -> HalfEdgeId<I> {
        self.halfedge(he).next
    }

    /// Get the previous half-edge around the face.
    #[inline]
    pub fn prev(&self, he: HalfEdgeId<I>) -> HalfEdgeId<I> {
        self.halfedge(he).prev
    }

    /// Get the origin vertex of a half-edge.
    #[inline]
    pub fn origin(&self, he: HalfEdgeId<I>) -> VertexId<I> {
        self.halfedge(he).origin
    }

    /// Get the destination vertex of a half-edge.
    #[inline]
    pub fn dest(&self, he: HalfEdgeId<I>) -> VertexId<I> {
        self.origin(self.twin(he))
    }

    /// Get the face of a half-edge.
    #[inline]
    pub fn face_of(&self, he: HalfEdgeId<I>) -> FaceId<I> {
        self.halfedge(he).face
    }

    /// Check if a half-edge is on the boundary.
    #[inline]
    pub fn is_boundary_halfedge(&self, he: HalfEdgeId<I>) -> bool {
        self.halfedge(he).is_boundary()
    }

    /// Check if an edge (represented by one of its half-edges) is on the boundary.
    #[inline]
    pub fn is_boundary_edge(&self, he: HalfEdgeId<I>) -> bool {
        self.is_boundary_halfedge(he) || self.is_boundary_halfedge(self.twin(he))
    }

    /// Check if a vertex is on the boundary. Isolated vertices count as boundary.
    #[inline]
    pub fn is_boundary_vertex(&self, v: VertexId<I>) -> bool {
        let he = self.vertex(v).halfedge;
        !he.is_valid() || self.is_boundary_halfedge(he)
    }

    /// Check if a vertex has no incident edges.
    #[inline]
    pub fn is_isolated(&self, v: VertexId<I>) -> bool {
        !self.vertex(v).halfedge.is_valid()
    }

    /// Check if a vertex is manifold.
    ///
    /// A vertex is non-manifold when its one-ring has more than one gap, i.e.
    /// it joins several fans of faces that only touch at the vertex.
    pub fn is_manifold(&self, v: VertexId<I>) -> bool {
        self.vertex_halfedges(v)
            .filter(|&he| self.is_boundary_halfedge(he))
            .nth(1)
            .is_none()
    }

    /// Find the half-edge going from `a` to `b`, if that edge exists.
    pub fn find_halfedge(&self, a: VertexId<I>, b: VertexId<I>) -> Option<HalfEdgeId<I>> {
        self.vertex_halfedges(a).find(|&he| self.dest(he) == b)
    }

    // ==================== Iteration ====================

    /// Iterate over all vertex IDs.
    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId<I>> + '_ {
        (0..self.vertices.len()).map(VertexId::new)
    }

    /// Iterate over all live face IDs.
    pub fn face_ids(&self) -> impl Iterator<Item = FaceId<I>> + '_ {
        (0..self.faces.len())
            .filter(|&i| !self.deleted_faces[i])
            .map(FaceId::new)
    }

    /// Iterate over all live edge IDs.
    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId<I>> + '_ {
        (0..self.deleted_edges.len())
            .filter(|&i| !self.deleted_edges[i])
            .map(EdgeId::new)
    }

    /// Iterate over all live half-edge IDs.
    pub fn halfedge_ids(&self) -> impl Iterator<Item = HalfEdgeId<I>> + '_ {
        self.edge_ids().flat_map(|e| [e.halfedge(0), e.halfedge(1)])
    }

    /// Iterate over half-edges around a vertex (outgoing half-edges).
    pub fn vertex_halfedges(&self, v: VertexId<I>) -> VertexHalfEdgeIter<'_, I> {
        VertexHalfEdgeIter::new(self, v)
    }

    /// Iterate over vertices adjacent to a vertex.
    pub fn vertex_neighbors(&self, v: VertexId<I>) -> impl Iterator<Item = VertexId<I>> + '_ {
        self.vertex_halfedges(v).map(|he| self.dest(he))
    }

    /// Iterate over faces adjacent to a vertex.
    pub fn vertex_faces(&self, v: VertexId<I>) -> impl Iterator<Item = FaceId<I>> + '_ {
        self.vertex_halfedges(v)
            .map(|he| self.face_of(he))
            .filter(|f| f.is_valid())
    }

    /// Iterate over half-edges around a face.
    pub fn face_halfedges(&self, f: FaceId<I>) -> FaceHalfEdgeIter<'_, I> {
        FaceHalfEdgeIter::new(self, f)
    }

    /// Iterate over vertices of a face, in boundary order.
    pub fn face_vertices(&self, f: FaceId<I>) -> impl Iterator<Item = VertexId<I>> + '_ {
        self.face_halfedges(f).map(|he| self.origin(he))
    }

    /// Number of sides of a face.
    pub fn face_degree(&self, f: FaceId<I>) -> usize {
        self.face_halfedges(f).count()
    }

    /// Get the three vertices of a triangular face.
    pub fn face_triangle(&self, f: FaceId<I>) -> [VertexId<I>; 3] {
        let he0 = self.face(f).halfedge;
        let he1 = self.next(he0);
        let he2 = self.next(he1);
        [self.origin(he0), self.origin(he1), self.origin(he2)]
    }

    /// Check whether every live face is a triangle.
    pub fn is_triangle_mesh(&self) -> bool {
        self.face_ids().all(|f| self.face_degree(f) == 3)
    }

    // ==================== Geometry ====================

    /// Vector area of a face: normal direction, twice the area as length.
    ///
    /// Summed as a fan from the first vertex, so it is exact for planar
    /// polygons and a reasonable average for warped ones.
    pub fn face_vector_area(&self, f: FaceId<I>) -> Vector3<f64> {
        let mut verts = self.face_vertices(f).map(|v| *self.position(v));
        let Some(p0) = verts.next() else {
            return Vector3::zeros();
        };
        let rest: Vec<Point3<f64>> = verts.collect();
        rest.windows(2)
            .map(|w| (w[0] - p0).cross(&(w[1] - p0)))
            .sum()
    }

    /// Compute the unit normal of a face.
    pub fn face_normal(&self, f: FaceId<I>) -> Vector3<f64> {
        self.face_vector_area(f).normalize()
    }

    /// Compute the area of a face.
    pub fn face_area(&self, f: FaceId<I>) -> f64 {
        0.5 * self.face_vector_area(f).norm()
    }

    /// Compute the total surface area of the mesh.
    pub fn surface_area(&self) -> f64 {
        self.face_ids().map(|f| self.face_area(f)).sum()
    }

    // ==================== Construction ====================

    /// Add a new isolated vertex and return its ID.
    pub fn add_vertex(&mut self, position: Point3<f64>) -> VertexId<I> {
        let id = VertexId::new(self.vertices.len());
        self.vertices.push(Vertex::new(position));
        id
    }

    // ==================== Validation ====================

    /// Check if the mesh is valid (all connectivity is consistent).
    pub fn is_valid(&self) -> bool {
        for v in self.vertex_ids() {
            let he = self.vertex(v).halfedge;
            if !he.is_valid() {
                continue;
            }
            if self.is_edge_deleted(he.edge()) || self.origin(he) != v {
                return false;
            }
            // Boundary vertices must expose a boundary half-edge
            let any_boundary = self
                .vertex_halfedges(v)
                .any(|h| self.is_boundary_halfedge(h));
            if any_boundary && !self.is_boundary_halfedge(he) {
                return false;
            }
        }

        for he in self.halfedge_ids() {
            let h = self.halfedge(he);
            if !h.twin.is_valid() || self.twin(h.twin) != he || h.twin.edge() != he.edge() {
                return false;
            }
            if !h.next.is_valid() || !h.prev.is_valid() {
                return false;
            }
            if self.prev(h.next) != he || self.next(h.prev) != he {
                return false;
            }
            if self.origin(h.next) != self.dest(he) {
                return false;
            }
            if self.face_of(h.next) != h.face {
                return false;
            }
            if h.face.is_valid() && self.is_face_deleted(h.face) {
                return false;
            }
        }

        for f in self.face_ids() {
            let he = self.face(f).halfedge;
            if !he.is_valid() || self.face_of(he) != f {
                return false;
            }
        }

        true
    }
}

/// Iterator over half-edges around a vertex.
pub struct VertexHalfEdgeIter<'a, I: MeshIndex = u32> {
    mesh: &'a HalfEdgeMesh<I>,
    start: HalfEdgeId<I>,
    current: HalfEdgeId<I>,
    done: bool,
}

impl<'a, I: MeshIndex> VertexHalfEdgeIter<'a, I> {
    fn new(mesh: &'a HalfEdgeMesh<I>, v: VertexId<I>) -> Self {
        let start = mesh.vertex(v).halfedge;
        Self {
            mesh,
            start,
            current: start,
            done: !start.is_valid(),
        }
    }
}

impl<'a, I: MeshIndex> Iterator for VertexHalfEdgeIter<'a, I> {
    type Item = HalfEdgeId<I>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let result = self.current;

        // If he goes v -> w, twin(he) goes w -> v and next(twin(he)) leaves v again.
        self.current = self.mesh.next(self.mesh.twin(self.current));

        if self.current == self.start {
            self.done = true;
        }

        Some(result)
    }
}

/// Iterator over half-edges around a face.
pub struct FaceHalfEdgeIter<'a, I: MeshIndex = u32> {
    mesh: &'a HalfEdgeMesh<I>,
    start: HalfEdgeId<I>,
    current: HalfEdgeId<I>,
    done: bool,
}

impl<'a, I: MeshIndex> FaceHalfEdgeIter<'a, I> {
    fn new(mesh: &'a HalfEdgeMesh<I>, f: FaceId<I>) -> Self {
        let start = mesh.face(f).halfedge;
        Self {
            mesh,
            start,
            current: start,
            done: !start.is_valid(),
        }
    }
}

impl<'a, I: MeshIndex> Iterator for FaceHalfEdgeIter<'a, I> {
    type Item = HalfEdgeId<I>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let result = self.current;
        self.current = self.mesh.next(self.current);

        if self.current == self.start {
            self.done = true;
        }

        Some(result)
    }
}
