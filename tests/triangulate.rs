//! End-to-end tests for polygon triangulation.

use std::collections::HashSet;

use nalgebra::Point3;
use tessel::algo::triangulate::{collect_boundary, SplitTable, TriangleCost};
use tessel::prelude::*;

fn planar(coords: &[(f64, f64)]) -> Vec<Point3<f64>> {
    coords.iter().map(|&(x, y)| Point3::new(x, y, 0.0)).collect()
}

fn hexagon() -> Vec<Point3<f64>> {
    planar(&[
        (-4.0, -3.0),
        (3.0, -2.0),
        (3.0, -1.0),
        (0.0, 2.0),
        (-3.0, 4.0),
        (-4.0, 4.0),
    ])
}

/// Hexagon closed off by two quads sharing the interior edge 0-3.
fn pillow() -> HalfEdgeMesh {
    let faces = vec![vec![0, 1, 2, 3, 4, 5], vec![3, 2, 1, 0], vec![0, 5, 4, 3]];
    build_from_polygons(&hexagon(), &faces).unwrap()
}

/// Closed prism over an irregular n-gon.
fn prism(n: usize) -> HalfEdgeMesh {
    let mut vertices = Vec::with_capacity(2 * n);
    for z in [0.0, 1.0] {
        for i in 0..n {
            let t = i as f64 / n as f64 * std::f64::consts::TAU;
            let r = 1.0 + 0.3 * (3.7 * i as f64).sin();
            vertices.push(Point3::new(r * t.cos(), r * t.sin(), z));
        }
    }

    let mut faces: Vec<Vec<usize>> = Vec::new();
    faces.push((0..n).rev().collect());
    faces.push((n..2 * n).collect());
    for i in 0..n {
        let j = (i + 1) % n;
        faces.push(vec![i, j, n + j, n + i]);
    }
    build_from_polygons(&vertices, &faces).unwrap()
}

/// Four quads around the axis through poles 0 and 1. Every quad is cheapest
/// split along 0-1, so only the first one can have it.
fn spindle() -> HalfEdgeMesh {
    let vertices = vec![
        Point3::new(0.0, 0.0, 1.0),
        Point3::new(0.0, 0.0, -1.0),
        Point3::new(2.0, 0.0, 0.0),
        Point3::new(0.0, 2.0, 0.0),
        Point3::new(-2.0, 0.0, 0.0),
        Point3::new(0.0, -2.0, 0.0),
    ];
    let faces = vec![vec![0, 2, 1, 3], vec![0, 3, 1, 4], vec![0, 4, 1, 5], vec![0, 5, 1, 2]];
    build_from_polygons(&vertices, &faces).unwrap()
}

/// Torus on six vertices where every pair is joined by an edge. The hexagon
/// has all of its diagonals outside it.
fn complete_torus() -> HalfEdgeMesh {
    let vertices: Vec<Point3<f64>> = (0..6)
        .map(|i| {
            let t = i as f64 / 6.0 * std::f64::consts::TAU;
            Point3::new(t.cos(), t.sin(), if i % 2 == 0 { 0.25 } else { -0.25 })
        })
        .collect();
    let faces = vec![
        vec![0, 2, 1, 5, 3, 4],
        vec![0, 3, 2],
        vec![0, 1, 3],
        vec![1, 2, 4],
        vec![1, 4, 3],
        vec![2, 3, 5],
        vec![2, 5, 4],
        vec![4, 5, 0],
        vec![5, 1, 0],
    ];
    build_from_polygons(&vertices, &faces).unwrap()
}

fn edge_set(mesh: &HalfEdgeMesh) -> HashSet<(usize, usize)> {
    mesh.edge_ids()
        .map(|e| {
            let he = e.halfedge(0);
            let a = mesh.origin(he).index();
            let b = mesh.dest(he).index();
            (a.min(b), a.max(b))
        })
        .collect()
}

fn triangle_set(mesh: &HalfEdgeMesh) -> HashSet<[usize; 3]> {
    mesh.face_ids()
        .map(|f| {
            let mut t = mesh.face_triangle(f).map(|v| v.index());
            t.sort_unstable();
            t
        })
        .collect()
}

fn assert_no_duplicate_edges(mesh: &HalfEdgeMesh) {
    assert_eq!(edge_set(mesh).len(), mesh.num_edges(), "duplicate edge in mesh");
}

/// Diagonals introduced in a set of triangles over polygon corners `0..n`.
fn diagonals(triangles: &[[VertexId; 3]], n: usize) -> HashSet<(usize, usize)> {
    let mut out = HashSet::new();
    for t in triangles {
        for k in 0..3 {
            let a = t[k].index();
            let b = t[(k + 1) % 3].index();
            let (a, b) = (a.min(b), a.max(b));
            if b - a != 1 && !(a == 0 && b == n - 1) {
                out.insert((a, b));
            }
        }
    }
    out
}

fn live_triangles(mesh: &HalfEdgeMesh) -> Vec<[VertexId; 3]> {
    mesh.face_ids()
        .filter(|&f| mesh.face_degree(f) == 3)
        .map(|f| mesh.face_triangle(f))
        .collect()
}

/// Every total weight over all triangulations of corners `i..=k`.
fn all_weights(cost: &TriangleCost, i: usize, k: usize) -> Vec<f64> {
    if k - i < 2 {
        return vec![0.0];
    }
    let mut out = Vec::new();
    for m in (i + 1)..k {
        let Some(c) = cost.cost(i, m, k) else {
            continue;
        };
        for left in all_weights(cost, i, m) {
            for right in all_weights(cost, m, k) {
                out.push(left + c + right);
            }
        }
    }
    out
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
}

#[test]
fn test_triangle_is_noop() {
    let vertices = planar(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0), (2.0, 0.5)]);
    let mut mesh: HalfEdgeMesh = build_from_polygons(&vertices, &[vec![0, 1, 2, 3], vec![1, 4, 2]]).unwrap();
    let before = to_face_vertex(&mesh);
    let halfedges = mesh.num_halfedges();

    let added = triangulate_face(&mut mesh, FaceId::new(1), &TriangulateOptions::default()).unwrap();

    assert_eq!(added, 0);
    assert!(!mesh.has_garbage());
    assert_eq!(mesh.num_halfedges(), halfedges);
    assert_eq!(to_face_vertex(&mesh), before);
}

#[test]
fn test_ngon_yields_n_minus_two_triangles() {
    for n in 4..=12 {
        let vertices: Vec<Point3<f64>> = (0..n)
            .map(|i| {
                let t = i as f64 / n as f64 * std::f64::consts::TAU;
                Point3::new(t.cos(), t.sin(), 0.1 * (2.3 * i as f64).cos())
            })
            .collect();
        let face: Vec<usize> = (0..n).collect();
        let mut mesh: HalfEdgeMesh = build_from_polygons(&vertices, &[face]).unwrap();

        let added = triangulate_face(&mut mesh, FaceId::new(0), &TriangulateOptions::default()).unwrap();
        mesh.garbage_collection();

        assert_eq!(added, n - 2);
        assert_eq!(mesh.num_faces(), n - 2);
        assert_eq!(mesh.num_vertices(), n);
        assert_eq!(mesh.num_edges(), 2 * n - 3);
        assert!(mesh.is_valid());
        assert!(mesh.is_triangle_mesh());
        assert_no_duplicate_edges(&mesh);
        for f in mesh.face_ids() {
            for v in mesh.face_vertices(f) {
                assert!(v.index() < n);
            }
        }
    }
}

#[test]
fn test_table_matches_brute_force() {
    for n in 3..=8 {
        let vertices: Vec<Point3<f64>> = (0..n)
            .map(|i| {
                let t = i as f64 / n as f64 * std::f64::consts::TAU;
                let r = 1.0 + 0.3 * (3.7 * i as f64).sin();
                Point3::new(r * t.cos(), r * t.sin(), 0.2 * (2.3 * i as f64).cos())
            })
            .collect();
        let face: Vec<usize> = (0..n).collect();
        let mesh: HalfEdgeMesh = build_from_polygons(&vertices, &[face]).unwrap();

        let polygon = collect_boundary(&mesh, FaceId::new(0)).unwrap();
        let cost = TriangleCost::new(&mesh, &polygon);
        let table = SplitTable::build(n, |i, m, k| cost.cost(i, m, k));

        for i in 0..n - 1 {
            assert_eq!(table.weight(i, i + 1), 0.0);
        }

        for i in 0..n {
            for k in (i + 2)..n {
                let expected = ((i + 1)..k)
                    .filter_map(|m| {
                        cost.cost(i, m, k)
                            .map(|c| table.weight(i, m) + c + table.weight(m, k))
                    })
                    .fold(f64::INFINITY, f64::min);
                assert!(close(table.weight(i, k), expected), "n={} ({}, {})", n, i, k);

                let brute = all_weights(&cost, i, k)
                    .into_iter()
                    .fold(f64::INFINITY, f64::min);
                assert!(close(table.weight(i, k), brute), "n={} ({}, {})", n, i, k);
            }
        }
    }
}

#[test]
fn test_scenario_square_picks_lowest_split() {
    let vertices = planar(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]);
    let mut mesh: HalfEdgeMesh = build_from_polygons(&vertices, &[vec![0, 1, 2, 3]]).unwrap();

    let added = triangulate_face(&mut mesh, FaceId::new(0), &TriangulateOptions::default()).unwrap();
    mesh.garbage_collection();

    assert_eq!(added, 2);
    let triangles = live_triangles(&mesh);
    let expected: HashSet<(usize, usize)> = [(1, 3)].into_iter().collect();
    assert_eq!(diagonals(&triangles, 4), expected);
}

#[test]
fn test_scenario_pentagon_matches_all_triangulations() {
    let vertices = planar(&[(0.0, 0.0), (2.0, 0.0), (3.0, 2.0), (1.0, 3.0), (-1.0, 2.0)]);
    let mesh: HalfEdgeMesh = build_from_polygons(&vertices, &[vec![0, 1, 2, 3, 4]]).unwrap();

    let polygon = collect_boundary(&mesh, FaceId::new(0)).unwrap();
    let cost = TriangleCost::new(&mesh, &polygon);
    let table = SplitTable::build(5, |i, m, k| cost.cost(i, m, k));

    let mut weights = all_weights(&cost, 0, 4);
    weights.sort_by(|a, b| a.partial_cmp(b).unwrap());
    assert_eq!(weights.len(), 5);
    assert!(close(weights[0], 86.0));
    assert!(close(table.total_weight(), weights[0]));

    let mut mesh = mesh;
    let added = triangulate_face(&mut mesh, FaceId::new(0), &TriangulateOptions::default()).unwrap();
    assert_eq!(added, 3);
    mesh.garbage_collection();
    let area: f64 = mesh.face_ids().map(|f| 4.0 * mesh.face_area(f).powi(2)).sum();
    assert!(close(area, 86.0));
}

#[test]
fn test_scenario_hexagon_avoids_existing_edge() {
    // On its own the hexagon prefers the fan from corner 0
    let mut alone: HalfEdgeMesh = build_from_polygons(&hexagon(), &[vec![0, 1, 2, 3, 4, 5]]).unwrap();
    triangulate_face(&mut alone, FaceId::new(0), &TriangulateOptions::default()).unwrap();
    let expected: HashSet<(usize, usize)> = [(0, 2), (0, 3), (0, 4)].into_iter().collect();
    assert_eq!(diagonals(&live_triangles(&alone), 6), expected);

    // With 0-3 already an interior edge it must route around it
    let mut mesh = pillow();
    let before = edge_set(&mesh);
    assert!(before.contains(&(0, 3)));

    let added = triangulate_face(&mut mesh, FaceId::new(0), &TriangulateOptions::default()).unwrap();
    assert_eq!(added, 4);

    let new_triangles: Vec<[VertexId; 3]> = mesh
        .face_ids()
        .filter(|f| f.index() >= 3)
        .map(|f| mesh.face_triangle(f))
        .collect();
    let chosen = diagonals(&new_triangles, 6);
    let expected: HashSet<(usize, usize)> = [(0, 2), (0, 4), (2, 4)].into_iter().collect();
    assert_eq!(chosen, expected);
    assert!(chosen.is_disjoint(&before));

    mesh.garbage_collection();
    assert!(mesh.is_valid());
    assert_eq!(mesh.num_edges(), before.len() + 3);
    assert_no_duplicate_edges(&mesh);
}

#[test]
fn test_pillow_whole_mesh() {
    for options in [
        TriangulateOptions::default().sequential(),
        TriangulateOptions::default(),
    ] {
        let mut mesh = pillow();
        let report = triangulate(&mut mesh, &options).unwrap();

        assert_eq!(report.faces_visited, 3);
        assert_eq!(report.faces_triangulated, 3);
        assert_eq!(report.triangles_added, 8);
        assert_eq!(report.num_skipped(), 0);
        assert!(report.is_triangle_mesh);

        assert_eq!(mesh.num_faces(), 8);
        assert_eq!(mesh.num_edges(), 12);
        assert!(mesh.is_valid());
        assert_no_duplicate_edges(&mesh);
        for v in mesh.vertex_ids() {
            assert!(mesh.is_manifold(v));
            assert!(!mesh.is_boundary_vertex(v));
        }
    }
}

#[test]
fn test_non_manifold_vertex_is_rejected() {
    // Vertex 0 joins the quad and a separate triangle fan
    let vertices = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(1.0, 1.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
        Point3::new(-1.0, -0.5, 0.0),
        Point3::new(-0.5, -1.0, 0.0),
    ];
    let faces = vec![vec![0, 1, 2, 3], vec![0, 4, 5]];
    let mut mesh: HalfEdgeMesh = build_from_polygons(&vertices, &faces).unwrap();
    assert!(!mesh.is_manifold(VertexId::new(0)));

    let before = to_face_vertex(&mesh);
    let halfedges = mesh.num_halfedges();

    let result = triangulate_face(&mut mesh, FaceId::new(0), &TriangulateOptions::default());
    assert!(matches!(
        result,
        Err(MeshError::NonManifoldPolygon { face: 0, vertex: 0 })
    ));
    assert!(!mesh.has_garbage());
    assert_eq!(mesh.num_halfedges(), halfedges);
    assert_eq!(to_face_vertex(&mesh), before);

    let report = triangulate(&mut mesh, &TriangulateOptions::default()).unwrap();
    assert_eq!(report.skipped_non_manifold, 1);
    assert_eq!(report.faces_triangulated, 0);
    assert!(!report.is_triangle_mesh);
    assert_eq!(to_face_vertex(&mesh), before);
}

#[test]
fn test_parallel_matches_sequential() {
    let mut a = prism(7);
    let mut b = prism(7);

    let ra = triangulate(&mut a, &TriangulateOptions::default().sequential()).unwrap();
    let rb = triangulate(&mut b, &TriangulateOptions::default()).unwrap();

    // 2 heptagons and 7 quads
    assert_eq!(ra.triangles_added, 2 * 5 + 7 * 2);
    assert_eq!(ra.triangles_added, rb.triangles_added);
    assert!(ra.is_triangle_mesh && rb.is_triangle_mesh);
    assert_eq!(triangle_set(&a), triangle_set(&b));
    assert!(a.is_valid() && b.is_valid());
    assert_no_duplicate_edges(&b);
}

#[test]
fn test_stale_plans_are_replanned() {
    let mut a = spindle();
    let mut b = spindle();

    let ra = triangulate(&mut a, &TriangulateOptions::default().sequential()).unwrap();
    let rb = triangulate(&mut b, &TriangulateOptions::default()).unwrap();

    assert_eq!(ra.replanned, 0);
    assert_eq!(rb.replanned, 3);
    assert_eq!(ra.triangles_added, 8);
    assert_eq!(rb.triangles_added, 8);
    assert!(ra.is_triangle_mesh && rb.is_triangle_mesh);

    assert_eq!(triangle_set(&a), triangle_set(&b));
    assert!(a.is_valid() && b.is_valid());
    assert_no_duplicate_edges(&b);
    assert_eq!(b.num_edges(), 12);

    let edges = edge_set(&b);
    for diagonal in [(0, 1), (3, 4), (4, 5), (2, 5)] {
        assert!(edges.contains(&diagonal), "missing diagonal {:?}", diagonal);
    }
}

#[test]
fn test_unsatisfiable_face_is_skipped() {
    let mut mesh = complete_torus();
    assert_eq!(mesh.num_edges(), 15);
    for v in mesh.vertex_ids() {
        assert!(mesh.is_manifold(v));
        assert!(!mesh.is_boundary_vertex(v));
    }

    let polygon = collect_boundary(&mesh, FaceId::new(0)).unwrap();
    let cost = TriangleCost::new(&mesh, &polygon);
    for i in 0..6 {
        for j in (i + 2)..6 {
            if !(i == 0 && j == 5) {
                assert!(cost.is_blocked(i, j), "diagonal {}-{} should be blocked", i, j);
            }
        }
    }

    let before = to_face_vertex(&mesh);
    let result = triangulate_face(&mut mesh, FaceId::new(0), &TriangulateOptions::default());
    assert!(matches!(result, Err(MeshError::UnsatisfiablePolygon { face: 0 })));
    assert!(!mesh.has_garbage());
    assert_eq!(to_face_vertex(&mesh), before);

    for options in [
        TriangulateOptions::default().sequential(),
        TriangulateOptions::default(),
    ] {
        let mut mesh = complete_torus();
        let report = triangulate(&mut mesh, &options).unwrap();

        assert_eq!(report.faces_visited, 9);
        assert_eq!(report.skipped_unsatisfiable, 1);
        assert_eq!(report.num_skipped(), 1);
        assert_eq!(report.faces_triangulated, 0);
        assert_eq!(report.triangles_added, 0);
        assert!(!report.is_triangle_mesh);
        assert_eq!(to_face_vertex(&mesh), before);
        assert!(mesh.is_valid());
    }
}

#[test]
fn test_max_degree_skips_large_faces() {
    let mut mesh = prism(7);
    let report = triangulate(&mut mesh, &TriangulateOptions::default().with_max_face_degree(4)).unwrap();

    assert_eq!(report.skipped_too_large, 2);
    assert_eq!(report.faces_triangulated, 7);
    assert_eq!(report.triangles_added, 14);
    assert!(!report.is_triangle_mesh);
    assert_eq!(mesh.num_faces(), 2 + 14);
    assert!(mesh.is_valid());
}
