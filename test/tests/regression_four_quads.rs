/// Four quads refined with a vertex budget of eight must come out as two
/// all-triangle splits covering exactly the fan triangulation of the input.
use meshsync_shared::{MeshRefineFlags, MeshRefineSettings, Topology};
use meshsync_test::{fan_triangles, quad_grid};

fn refined_four_quads() -> (meshsync_shared::Mesh, meshsync_shared::Mesh) {
    let original = quad_grid("/quads", 2, 2);
    assert_eq!(original.indices.len(), 16);
    assert_eq!(original.counts, vec![4, 4, 4, 4]);

    let settings = MeshRefineSettings {
        flags: MeshRefineFlags::TRIANGULATE | MeshRefineFlags::SPLIT,
        split_unit: 8,
        ..MeshRefineSettings::default()
    };
    let mut refined = original.clone();
    refined.refine(&settings).unwrap();
    (original, refined)
}

#[test]
fn four_quads_make_two_triangle_splits() {
    let (_, mesh) = refined_four_quads();

    assert_eq!(mesh.splits.len(), 2);
    assert!(mesh.splits.iter().all(|split| split.vertex_count <= 8));
    assert!(mesh.counts.iter().all(|&count| count == 3));
    assert!(mesh
        .submeshes
        .iter()
        .all(|submesh| submesh.topology == Topology::Triangles));

    let vertices: i32 = mesh.splits.iter().map(|split| split.vertex_count).sum();
    assert_eq!(vertices as usize, mesh.points.len());
    let indices: i32 = mesh.splits.iter().map(|split| split.index_count).sum();
    assert_eq!(indices as usize, mesh.indices.len());
}

#[test]
fn split_indices_stay_inside_their_split() {
    let (_, mesh) = refined_four_quads();
    for split in &mesh.splits {
        let start = split.index_offset as usize;
        let end = start + split.index_count as usize;
        let first = split.vertex_offset;
        let last = split.vertex_offset + split.vertex_count;
        assert!(mesh.indices[start..end]
            .iter()
            .all(|&index| index >= first && index < last));
    }
}

#[test]
fn splits_cover_the_fan_triangulation() {
    let (original, mesh) = refined_four_quads();

    let mut expected = fan_triangles(&original.points, &original.counts, &original.indices);
    let mut actual = fan_triangles(&mesh.points, &mesh.counts, &mesh.indices);
    expected.sort();
    actual.sort();
    assert_eq!(actual.len(), 8);
    assert_eq!(actual, expected);
}
