use glam::Vec3;
use meshsync_shared::{Entity, Mesh, MeshRefineFlags, MeshRefineSettings, RefineError};

fn triangle() -> Mesh {
    let mut mesh = Mesh::new("/tri");
    mesh.points = vec![Vec3::ZERO, Vec3::X, Vec3::Y];
    mesh.counts = vec![3];
    mesh.indices = vec![0, 1, 2];
    mesh
}

fn triangulate() -> MeshRefineSettings {
    MeshRefineSettings {
        flags: MeshRefineFlags::TRIANGULATE | MeshRefineFlags::SPLIT,
        ..MeshRefineSettings::default()
    }
}

#[test]
fn test_index_out_of_range() {
    let mut mesh = triangle();
    mesh.indices[1] = 3;
    let result = mesh.refine(&triangulate());
    assert_eq!(
        result,
        Err(RefineError::IndexOutOfRange {
            corner: 1,
            index: 3,
            point_count: 3,
        })
    );
}

#[test]
fn test_negative_index() {
    let mut mesh = triangle();
    mesh.indices[0] = -1;
    assert!(matches!(
        mesh.refine(&triangulate()),
        Err(RefineError::IndexOutOfRange { index: -1, .. })
    ));
}

#[test]
fn test_negative_count() {
    let mut mesh = triangle();
    mesh.counts = vec![-3];
    assert_eq!(
        mesh.refine(&triangulate()),
        Err(RefineError::NegativeCount { face: 0 })
    );
}

#[test]
fn test_count_mismatch() {
    let mut mesh = triangle();
    mesh.counts = vec![4];
    assert_eq!(
        mesh.refine(&triangulate()),
        Err(RefineError::CountMismatch {
            counted: 4,
            indices: 3,
        })
    );
}

#[test]
fn test_empty_mesh_refines_cleanly() {
    let mut mesh = Mesh::new("/empty");
    assert!(mesh.refine(&triangulate()).is_ok());
    assert!(mesh.splits.is_empty());
    assert!(mesh.indices.is_empty());
}

#[test]
fn test_rejected_mesh_is_unchanged() {
    let mut mesh = triangle();
    mesh.indices[2] = 10;
    let before = Entity::from(mesh.clone());
    let _ = mesh.refine(&triangulate());
    assert_eq!(Entity::from(mesh), before);
}
