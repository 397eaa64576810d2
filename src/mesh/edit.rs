//! Topological editing of half-edge meshes.
//!
//! Faces are inserted with full boundary bookkeeping (so a face may be glued
//! onto any existing boundary), deleted lazily, and the storage is compacted
//! by [`HalfEdgeMesh::garbage_collection`].

use crate::error::{MeshError, Result};

use super::halfedge::{Face, HalfEdge, HalfEdgeMesh};
use super::index::{FaceId, HalfEdgeId, MeshIndex, VertexId};

impl<I: MeshIndex> HalfEdgeMesh<I> {
    /// Add a triangle given three vertex handles (counter-clockwise).
    pub fn add_triangle(
        &mut self,
        v0: VertexId<I>,
        v1: VertexId<I>,
        v2: VertexId<I>,
    ) -> Result<FaceId<I>> {
        self.add_face(&[v0, v1, v2])
    }

    /// Add a polygonal face given its vertices in counter-clockwise order.
    ///
    /// Existing boundary half-edges between consecutive vertices are reused;
    /// missing edges are created. The new face's stored half-edge leaves
    /// `vertices[0]`.
    ///
    /// Fails without modifying the mesh if a vertex is already surrounded by
    /// faces, if one of the required half-edges already has a face, or if the
    /// boundary around a vertex cannot be re-linked to make room.
    pub fn add_face(&mut self, vertices: &[VertexId<I>]) -> Result<FaceId<I>> {
        let n = vertices.len();
        if n < 3 {
            return Err(MeshError::DegenerateFace { face: self.faces.len() });
        }

        let mut halfedges: Vec<HalfEdgeId<I>> = Vec::with_capacity(n);
        let mut is_new = vec![false; n];
        let mut needs_adjust = vec![false; n];
        let mut next_cache: Vec<(HalfEdgeId<I>, HalfEdgeId<I>)> = Vec::with_capacity(3 * n);

        // Topology checks
        for i in 0..n {
            let ii = (i + 1) % n;
            if !self.is_boundary_vertex(vertices[i]) {
                return Err(MeshError::ComplexVertex {
                    vertex: vertices[i].index(),
                });
            }
            match self.find_halfedge(vertices[i], vertices[ii]) {
                Some(he) if !self.is_boundary_halfedge(he) => {
                    return Err(MeshError::ComplexEdge {
                        v0: vertices[i].index(),
                        v1: vertices[ii].index(),
                    });
                }
                Some(he) => halfedges.push(he),
                None => {
                    is_new[i] = true;
                    halfedges.push(HalfEdgeId::invalid());
                }
            }
        }

        // Two existing half-edges that are not consecutive: move the patch
        // between them to another gap around the shared vertex.
        for i in 0..n {
            let ii = (i + 1) % n;
            if is_new[i] || is_new[ii] {
                continue;
            }

            let inner_prev = halfedges[i];
            let inner_next = halfedges[ii];
            if self.next(inner_prev) == inner_next {
                continue;
            }

            let outer_prev = self.twin(inner_next);
            let mut boundary_prev = outer_prev;
            let mut steps = 0;
            loop {
                boundary_prev = self.twin(self.next(boundary_prev));
                if self.is_boundary_halfedge(boundary_prev) && boundary_prev != inner_prev {
                    break;
                }
                steps += 1;
                if steps > self.halfedges.len() {
                    return Err(MeshError::PatchRelinkFailed {
                        vertex: vertices[ii].index(),
                    });
                }
            }
            let boundary_next = self.next(boundary_prev);
            if boundary_next == inner_next {
                return Err(MeshError::PatchRelinkFailed {
                    vertex: vertices[ii].index(),
                });
            }

            let patch_start = self.next(inner_prev);
            let patch_end = self.prev(inner_next);

            next_cache.push((boundary_prev, patch_start));
            next_cache.push((patch_end, boundary_next));
            next_cache.push((inner_prev, inner_next));
        }

        // Nothing can fail from here on.
        for i in 0..n {
            if is_new[i] {
                halfedges[i] = self.new_edge(vertices[i], vertices[(i + 1) % n]);
            }
        }

        let face = FaceId::new(self.faces.len());
        self.faces.push(Face::new(halfedges[0]));
        self.deleted_faces.push(false);

        for i in 0..n {
            let ii = (i + 1) % n;
            let v = vertices[ii];
            let inner_prev = halfedges[i];
            let inner_next = halfedges[ii];

            match (is_new[i], is_new[ii]) {
                (false, false) => {
                    needs_adjust[ii] = self.vertex(v).halfedge == inner_next;
                }
                (prev_new, next_new) => {
                    let outer_prev = self.twin(inner_next);
                    let outer_next = self.twin(inner_prev);

                    if prev_new && !next_new {
                        let boundary_prev = self.prev(inner_next);
                        next_cache.push((boundary_prev, outer_next));
                        self.vertex_mut(v).halfedge = outer_next;
                    } else if !prev_new && next_new {
                        let boundary_next = self.next(inner_prev);
                        next_cache.push((outer_prev, boundary_next));
                        self.vertex_mut(v).halfedge = boundary_next;
                    } else if !self.vertex(v).halfedge.is_valid() {
                        self.vertex_mut(v).halfedge = outer_next;
                        next_cache.push((outer_prev, outer_next));
                    } else {
                        let boundary_next = self.vertex(v).halfedge;
                        let boundary_prev = self.prev(boundary_next);
                        next_cache.push((boundary_prev, outer_next));
                        next_cache.push((outer_prev, boundary_next));
                    }

                    next_cache.push((inner_prev, inner_next));
                }
            }

            self.halfedge_mut(halfedges[i]).face = face;
        }

        for (a, b) in next_cache {
            self.link(a, b);
        }

        for i in 0..n {
            if needs_adjust[i] {
                self.adjust_outgoing_halfedge(vertices[i]);
            }
        }

        Ok(face)
    }

    /// Delete a face, turning it into a hole.
    ///
    /// Edges that end up with no face on either side are deleted as well.
    /// Vertices are kept (possibly isolated), so their handles remain usable
    /// for re-filling the hole. Storage is reclaimed by
    /// [`Self::garbage_collection`].
    pub fn delete_face(&mut self, f: FaceId<I>) {
        if self.deleted_faces[f.index()] {
            return;
        }
        self.deleted_faces[f.index()] = true;
        self.num_deleted_faces += 1;

        let face_halfedges: Vec<HalfEdgeId<I>> = self.face_halfedges(f).collect();
        let mut dangling: Vec<HalfEdgeId<I>> = Vec::new();
        let mut vertices: Vec<VertexId<I>> = Vec::with_capacity(face_halfedges.len());

        for &he in &face_halfedges {
            self.halfedge_mut(he).face = FaceId::invalid();
            if self.is_boundary_halfedge(self.twin(he)) {
                dangling.push(he);
            }
            vertices.push(self.origin(he));
        }

        for h0 in dangling {
            let h1 = self.twin(h0);
            let v0 = self.origin(h1);
            let v1 = self.origin(h0);
            let next0 = self.next(h0);
            let prev0 = self.prev(h0);
            let next1 = self.next(h1);
            let prev1 = self.prev(h1);

            self.link(prev0, next1);
            self.link(prev1, next0);

            self.deleted_edges[h0.edge().index()] = true;
            self.num_deleted_edges += 1;

            if self.vertex(v0).halfedge == h1 {
                self.vertex_mut(v0).halfedge = if next0 == h1 {
                    HalfEdgeId::invalid()
                } else {
                    next0
                };
            }
            if self.vertex(v1).halfedge == h0 {
                self.vertex_mut(v1).halfedge = if next1 == h0 {
                    HalfEdgeId::invalid()
                } else {
                    next1
                };
            }
        }

        for v in vertices {
            self.adjust_outgoing_halfedge(v);
        }
    }

    /// Remove deleted faces and edges from storage, remapping all handles.
    ///
    /// Face and half-edge IDs obtained before the call are invalidated.
    /// Vertex IDs are unchanged.
    pub fn garbage_collection(&mut self) {
        if !self.has_garbage() {
            return;
        }

        let mut halfedge_map = vec![HalfEdgeId::<I>::invalid(); self.halfedges.len()];
        let mut halfedges = Vec::with_capacity(2 * self.num_edges());
        for (e, &deleted) in self.deleted_edges.iter().enumerate() {
            if deleted {
                continue;
            }
            for side in 0..2 {
                halfedge_map[2 * e + side] = HalfEdgeId::new(halfedges.len());
                halfedges.push(self.halfedges[2 * e + side]);
            }
        }

        let mut face_map = vec![FaceId::<I>::invalid(); self.faces.len()];
        let mut faces = Vec::with_capacity(self.num_faces());
        for (f, &deleted) in self.deleted_faces.iter().enumerate() {
            if deleted {
                continue;
            }
            face_map[f] = FaceId::new(faces.len());
            faces.push(self.faces[f]);
        }

        let remap_he = |he: HalfEdgeId<I>| {
            if he.is_valid() {
                halfedge_map[he.index()]
            } else {
                he
            }
        };
        let remap_face = |f: FaceId<I>| if f.is_valid() { face_map[f.index()] } else { f };

        for h in &mut halfedges {
            h.twin = remap_he(h.twin);
            h.next = remap_he(h.next);
            h.prev = remap_he(h.prev);
            h.face = remap_face(h.face);
        }
        for face in &mut faces {
            face.halfedge = remap_he(face.halfedge);
        }
        for vertex in &mut self.vertices {
            vertex.halfedge = remap_he(vertex.halfedge);
        }

        self.deleted_edges = vec![false; halfedges.len() / 2];
        self.deleted_faces = vec![false; faces.len()];
        self.halfedges = halfedges;
        self.faces = faces;
        self.num_deleted_edges = 0;
        self.num_deleted_faces = 0;
    }

    /// Allocate an unlinked twin pair `a -> b`, `b -> a`; returns `a -> b`.
    fn new_edge(&mut self, a: VertexId<I>, b: VertexId<I>) -> HalfEdgeId<I> {
        let h0 = HalfEdgeId::new(self.halfedges.len());
        let h1 = HalfEdgeId::new(self.halfedges.len() + 1);

        let mut forward = HalfEdge::new(a);
        forward.twin = h1;
        let mut backward = HalfEdge::new(b);
        backward.twin = h0;

        self.halfedges.push(forward);
        self.halfedges.push(backward);
        self.deleted_edges.push(false);
        h0
    }

    #[inline]
    fn link(&mut self, he: HalfEdgeId<I>, next: HalfEdgeId<I>) {
        self.halfedge_mut(he).next = next;
        self.halfedge_mut(next).prev = he;
    }

    /// Make the vertex point at a boundary half-edge if it has one.
    fn adjust_outgoing_halfedge(&mut self, v: VertexId<I>) {
        let boundary = self
            .vertex_halfedges(v)
            .find(|&he| self.is_boundary_halfedge(he));
        if let Some(he) = boundary {
            self.vertex_mut(v).halfedge = he;
        }
    }
}
