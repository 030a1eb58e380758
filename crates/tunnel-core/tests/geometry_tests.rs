// Host-side tests for mesh generation.

use glam::Vec3;
use tunnel_core::*;

fn assert_indices_in_range(mesh: &MeshData) {
    let n = mesh.vertices.len() as u32;
    assert!(mesh.indices.iter().all(|&i| i < n));
    assert_eq!(mesh.indices.len() % 3, 0);
}

fn assert_unit_normals(mesh: &MeshData) {
    for v in &mesh.vertices {
        let len = Vec3::from(v.normal).length();
        assert!((len - 1.0).abs() < 1e-4, "normal length {len}");
    }
}

#[test]
fn ring_torus_has_expected_counts() {
    let mesh = MeshData::ring();
    assert_eq!(mesh.vertices.len(), 17 * 33);
    assert_eq!(mesh.triangle_count(), 16 * 32 * 2);
    assert_indices_in_range(&mesh);
    assert_unit_normals(&mesh);
    for v in &mesh.vertices {
        let p = Vec3::from(v.position);
        let planar = p.truncate().length();
        assert!(planar >= RING_MAJOR_RADIUS - RING_TUBE_RADIUS - 1e-4);
        assert!(planar <= RING_MAJOR_RADIUS + RING_TUBE_RADIUS + 1e-4);
        assert!(p.z.abs() <= RING_TUBE_RADIUS + 1e-4);
    }
}

#[test]
fn cube_has_flat_faces_and_thirty_edges() {
    let mesh = MeshData::for_shape(ShapeKind::Cube);
    assert_eq!(mesh.vertices.len(), 24);
    assert_eq!(mesh.triangle_count(), 12);
    assert_indices_in_range(&mesh);
    assert_unit_normals(&mesh);
    for v in &mesh.vertices {
        let p = Vec3::from(v.position);
        assert!((p.abs().max_element() - CUBE_SIZE * 0.5).abs() < 1e-5);
        // each vertex sits on the face its normal points through
        assert!((p.dot(Vec3::from(v.normal)) - CUBE_SIZE * 0.5).abs() < 1e-5);
    }
    assert_eq!(mesh.edge_indices().len(), 30 * 2);
}

#[test]
fn sphere_vertices_lie_on_radius() {
    let mesh = MeshData::for_shape(ShapeKind::Sphere);
    assert_eq!(mesh.vertices.len(), 17 * 17);
    assert_eq!(mesh.triangle_count(), 16 * 16 * 2 - 2 * 16);
    assert_indices_in_range(&mesh);
    assert_unit_normals(&mesh);
    for v in &mesh.vertices {
        assert!((Vec3::from(v.position).length() - SPHERE_RADIUS).abs() < 1e-4);
    }
}

#[test]
fn tetrahedron_faces_point_outward() {
    let mesh = MeshData::for_shape(ShapeKind::Tetrahedron);
    assert_eq!(mesh.vertices.len(), 12);
    assert_eq!(mesh.triangle_count(), 4);
    assert_unit_normals(&mesh);
    for tri in mesh.indices.chunks_exact(3) {
        let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| Vec3::from(mesh.vertices[i as usize].position));
        let n = Vec3::from(mesh.vertices[tri[0] as usize].normal);
        assert!(n.dot(a + b + c) > 0.0);
    }
    for v in &mesh.vertices {
        assert!((Vec3::from(v.position).length() - TETRAHEDRON_RADIUS).abs() < 1e-5);
    }
    assert_eq!(mesh.edge_indices().len(), 12 * 2);
}

#[test]
fn edge_list_has_no_duplicates() {
    let mesh = MeshData::ring();
    let edges = mesh.edge_indices();
    assert_eq!(edges.len() % 2, 0);
    let mut pairs: Vec<(u32, u32)> = edges.chunks_exact(2).map(|e| (e[0], e[1])).collect();
    let n = pairs.len();
    pairs.sort();
    pairs.dedup();
    assert_eq!(pairs.len(), n);
    assert!(pairs.iter().all(|(a, b)| a < b));
}

#[test]
fn wgsl_source_declares_entry_points() {
    assert!(TUNNEL_WGSL.contains("fn vs_main"));
    assert!(TUNNEL_WGSL.contains("fn fs_main"));
    assert!(TUNNEL_WGSL.contains("fn fs_wire"));
}
